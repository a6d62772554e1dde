//! GMT vector format reader/writer.
//!
//! ## Overview
//!
//! - `GmtLayer` represents the single layer stored in a GMT file.
//! - `GmtFeature` represents a single feature in the layer.
//! - `Geometry` is the owned geometry of a feature.
//! - `Value` represents a single property value related to the feature.
//!
//! `GmtLayer` is the entry point and supports several open modes:
//!
//! - `GmtLayer::open_read_only(path)`: open an existing file without write access.
//! - `GmtLayer::open(path)`: open an existing file for reading and appending.
//! - `GmtLayer::create(path, kind, spatial_ref)`: create (or truncate) a file.
//! - `GmtLayer::new_in_memory(name, kind, spatial_ref)`: a transient in-memory layer.
//!
//! `GmtLayer::features()` streams features in file order. For large files,
//! `features_batch(batch_size)` yields them in chunks of `Vec<GmtFeature>`.
//!
//! `GmtLayer::insert` accepts any geometry that implements
//! `geo_traits::GeometryTrait<T = f64>` (for example `geo_types::Point` or `wkt::Wkt`).
//!
//! ## Short usage
//!
//! ```no_run
//! use gmt_vector::GmtLayer;
//!
//! let mut layer = GmtLayer::open_read_only("data/example.gmt")?;
//! let extent = layer.extent()?;
//! let feature = layer.features().next().expect("feature")?;
//! let _id = feature.id();
//! let _geom = feature.geometry();
//! let _name: String = feature
//!     .property("name")
//!     .ok_or("missing name")?
//!     .try_into()?;
//! # let _ = extent;
//! # Ok::<(), gmt_vector::GmtError>(())
//! ```
//!
//! ## Reader
//!
//! ```no_run
//! use gmt_vector::{GmtLayer, Value};
//! use wkt::to_wkt::write_geometry;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut layer = GmtLayer::open_read_only("data.gmt")?;
//!     let fields = layer.fields().to_vec();
//!     for feature in layer.features() {
//!         let feature = feature?;
//!
//!         // Use wkt to show the context of the geometry
//!         if let Some(geom) = feature.geometry() {
//!             let mut wkt = String::new();
//!             write_geometry(&mut wkt, &geo_types::Geometry::from(geom))?;
//!             println!("{wkt}");
//!         }
//!
//!         for field in &fields {
//!             let value = feature.property(&field.name).unwrap_or(Value::Null);
//!             println!("  {} = {:?}", field.name, value);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! If you want to process features in batches:
//!
//! ```no_run
//! use gmt_vector::GmtLayer;
//!
//! let mut layer = GmtLayer::open_read_only("data/example.gmt")?;
//! for batch in layer.features_batch(100)? {
//!     let features = batch?;
//!     for feature in features {
//!         let _id = feature.id();
//!         let _geom = feature.geometry();
//!     }
//! }
//! # Ok::<(), gmt_vector::GmtError>(())
//! ```
//!
//! Attribute values that cannot be parsed as their field type are read as
//! `Value::Null`. Convert to `Option<T>` to handle them:
//!
//! ```
//! use gmt_vector::Value;
//!
//! let value = Value::Null;
//! let maybe_i64: Option<i64> = value.try_into()?;
//! assert_eq!(maybe_i64, None);
//! # Ok::<(), gmt_vector::GmtError>(())
//! ```
//!
//! ## Writer
//!
//! Fields must be created before the first feature is written. The file's
//! `@R` region line is rewritten with the final extent when the layer is
//! closed or dropped.
//!
//! ```no_run
//! use geo_types::Point;
//! use gmt_vector::{FieldSpec, FieldType, GeometryKind, GmtLayer, SpatialRef, params};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut layer = GmtLayer::create(
//!         "points.gmt",
//!         GeometryKind::Point,
//!         Some(SpatialRef::from_epsg("4326")?),
//!     )?;
//!     layer.create_field(FieldSpec::new("name", FieldType::String), false)?;
//!     layer.create_field(FieldSpec::new("value", FieldType::Integer), false)?;
//!
//!     layer.insert(
//!         Point::new(1.0, 2.0),    // geometry: anything that implements GeometryTrait
//!         params!["alpha", 7_i64], // other properties
//!     )?;
//!
//!     layer.close()?;
//!     Ok(())
//! }
//! ```
mod error;
mod gmt;

mod conversions;
mod geometry;
mod spatial_ref;
mod types;

pub mod config;

pub use config::WriterOptions;
pub use error::{GmtError, Result};
pub use geometry::{Coord, Geometry, LineString, Polygon};
pub use gmt::{GmtFeature, GmtFeatureBatchIterator, GmtFeatureIterator, GmtLayer};
pub use spatial_ref::SpatialRef;
pub use types::{Capability, Envelope, FieldSpec, FieldType, GeometryKind, LayerDefn, Value};
