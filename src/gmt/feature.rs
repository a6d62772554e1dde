use crate::Value;
use crate::error::{GmtError, Result};
use crate::geometry::Geometry;
use crate::spatial_ref::SpatialRef;
use crate::types::LayerDefn;
use geo_traits::GeometryTrait;
use std::io::{Read, Seek, Write};
use std::sync::Arc;

use super::GmtLayer;

/// A single feature with an owned geometry and owned properties.
#[derive(Clone, Debug)]
pub struct GmtFeature {
    pub(crate) id: i64,
    pub(crate) geometry: Option<Geometry>,
    pub(crate) properties: Vec<Value>,
    pub(crate) defn: Option<Arc<LayerDefn>>,
    pub(crate) spatial_ref: Option<Arc<SpatialRef>>,
}

impl GmtFeature {
    /// Build a detached feature, e.g. for [`GmtLayer::create_feature`].
    ///
    /// [`GmtLayer::create_feature`]: crate::GmtLayer::create_feature
    pub fn new<G, I>(geometry: &G, properties: I) -> Result<Self>
    where
        G: GeometryTrait<T = f64>,
        I: IntoIterator<Item = Value>,
    {
        Ok(Self::with_geometry(
            Some(Geometry::from_geo_traits(geometry)?),
            properties,
        ))
    }

    /// Build a detached feature from an owned geometry, or none at all.
    pub fn with_geometry<I>(geometry: Option<Geometry>, properties: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self {
            id: -1,
            geometry,
            properties: properties.into_iter().collect(),
            defn: None,
            spatial_ref: None,
        }
    }

    /// Sequential id in file order, starting at 0. Detached features have -1.
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    /// Coordinate system of the layer the feature was read from.
    pub fn spatial_ref(&self) -> Option<&SpatialRef> {
        self.spatial_ref.as_deref()
    }

    pub fn properties(&self) -> &[Value] {
        &self.properties
    }

    /// Look up a property by field name.
    pub fn property(&self, name: &str) -> Option<Value> {
        let idx = self.defn.as_ref()?.field_index(name)?;
        self.properties.get(idx).cloned()
    }

    /// Look up a property by position.
    pub fn property_at(&self, idx: usize) -> Result<&Value> {
        self.properties
            .get(idx)
            .ok_or_else(|| GmtError::MissingProperty {
                property: format!("#{idx}"),
            })
    }
}

/// Iterator over the features of a layer, in file order.
///
/// Created by [`GmtLayer::features`]. The layer's read position advances
/// as the iterator is consumed.
///
/// [`GmtLayer::features`]: crate::GmtLayer::features
pub struct GmtFeatureIterator<'a, S: Read + Write + Seek> {
    pub(crate) layer: &'a mut GmtLayer<S>,
    pub(crate) done: bool,
}

impl<S: Read + Write + Seek> Iterator for GmtFeatureIterator<'_, S> {
    type Item = Result<GmtFeature>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.layer.next_feature() {
            Ok(Some(feature)) => Some(Ok(feature)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GmtFeature;
    use crate::Result;
    use crate::Value;
    use crate::geometry::{Coord, Geometry};
    use crate::types::{FieldSpec, FieldType, LayerDefn};
    use geo_types::Point;
    use std::sync::Arc;

    #[test]
    fn looks_up_properties_by_name() -> Result<()> {
        let mut defn = LayerDefn::new("points");
        defn.push_field(FieldSpec::new("name", FieldType::String));
        defn.push_field(FieldSpec::new("count", FieldType::Integer));

        let mut feature = GmtFeature::new(&Point::new(1.0, 2.0), crate::params!["alpha", 3_i64])?;
        assert_eq!(feature.id(), -1);
        assert_eq!(feature.property("name"), None);

        feature.defn = Some(Arc::new(defn));
        let count: i64 = feature.property("count").ok_or("missing count")?.try_into()?;
        assert_eq!(count, 3);
        assert_eq!(feature.property_at(0)?, &Value::from("alpha"));
        assert!(feature.property_at(2).is_err());
        assert_eq!(feature.geometry(), Some(&Geometry::Point(Coord::xy(1.0, 2.0))));
        Ok(())
    }
}
