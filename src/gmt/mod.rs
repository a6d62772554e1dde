//! GMT vector layer reader/writer.
//!
//! A GMT file holds a single layer: a block of `#` comment lines with
//! `@`-keyed metadata, then one feature after another as `>` separated
//! vertex lists with `# @D` attribute lines.

mod batch_iterator;
mod escape;
mod feature;
mod header;
mod layer;
mod reader;
mod writer;

pub use batch_iterator::GmtFeatureBatchIterator;
pub use feature::{GmtFeature, GmtFeatureIterator};
pub use layer::GmtLayer;
