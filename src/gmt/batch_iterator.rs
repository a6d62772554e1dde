use crate::Result;
use std::io::{Read, Seek, Write};

use super::{GmtFeature, GmtLayer};

/// Iterator that yields batches of features from a layer.
///
/// Each call to `next()` returns a `Result<Vec<GmtFeature>>` containing up to
/// `batch_size` features. Created by [`GmtLayer::features_batch`].
pub struct GmtFeatureBatchIterator<'a, S: Read + Write + Seek> {
    pub(super) layer: &'a mut GmtLayer<S>,
    pub(super) batch_size: usize,
    pub(super) end_or_invalid_state: bool,
}

impl<S: Read + Write + Seek> Iterator for GmtFeatureBatchIterator<'_, S> {
    type Item = Result<Vec<GmtFeature>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end_or_invalid_state {
            return None;
        }

        let mut features = Vec::with_capacity(self.batch_size);
        while features.len() < self.batch_size {
            match self.layer.next_feature() {
                Ok(Some(feature)) => features.push(feature),
                Ok(None) => break,
                Err(e) => {
                    // A broken stream does not recover.
                    self.end_or_invalid_state = true;
                    return Some(Err(e));
                }
            }
        }

        // If the result is less than the batch size, it means it reached the end.
        if features.len() < self.batch_size {
            self.end_or_invalid_state = true;
            if features.is_empty() {
                return None;
            }
        }

        Some(Ok(features))
    }
}

#[cfg(test)]
mod tests {
    use crate::Result;
    use crate::gmt::GmtLayer;
    use crate::types::GeometryKind;
    use geo_types::Point;

    fn assert_batch_iteration(total: usize, batch_size: usize) -> Result<()> {
        let mut layer = GmtLayer::new_in_memory("batch_points", GeometryKind::Point, None)?;

        for i in 0..total {
            layer.insert(Point::new(i as f64, i as f64), [])?;
        }

        let mut counts = Vec::new();
        let mut next_id = 0;
        for batch in layer.features_batch(batch_size)? {
            let features = batch?;
            for feature in &features {
                assert_eq!(feature.id(), next_id);
                next_id += 1;
            }
            counts.push(features.len());
        }

        let total_seen: usize = counts.iter().sum();
        assert_eq!(total_seen, total);

        if total == 0 {
            assert!(counts.is_empty());
            return Ok(());
        }

        let expected_full_batches = total / batch_size;
        let expected_remainder = total % batch_size;

        for (idx, count) in counts.iter().enumerate() {
            let is_last = idx == counts.len() - 1;
            if !is_last || expected_remainder == 0 {
                assert_eq!(*count, batch_size);
            } else {
                assert_eq!(*count, expected_remainder);
            }
        }

        assert_eq!(
            counts.len(),
            expected_full_batches + if expected_remainder == 0 { 0 } else { 1 }
        );

        Ok(())
    }

    #[test]
    fn batch_iterator_handles_empty_layer() -> Result<()> {
        assert_batch_iteration(0, 3)?;
        Ok(())
    }

    #[test]
    fn batch_iterator_handles_smaller_than_batch() -> Result<()> {
        assert_batch_iteration(2, 5)?;
        Ok(())
    }

    #[test]
    fn batch_iterator_handles_exact_multiple() -> Result<()> {
        assert_batch_iteration(6, 3)?;
        Ok(())
    }

    #[test]
    fn batch_iterator_handles_remainder() -> Result<()> {
        assert_batch_iteration(7, 3)?;
        Ok(())
    }

    #[test]
    fn batch_iterator_handles_single_item_batches() -> Result<()> {
        assert_batch_iteration(4, 1)?;
        Ok(())
    }

    #[test]
    fn batch_size_must_be_positive() -> Result<()> {
        let mut layer = GmtLayer::new_in_memory("batch_points", GeometryKind::Point, None)?;
        assert!(layer.features_batch(0).is_err());
        Ok(())
    }
}
