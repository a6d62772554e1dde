use crate::error::GmtError;
use std::collections::HashMap;

/// Attribute field types known to the layer schema.
///
/// Only `Integer`, `Real`, `String` and `DateTime` can be stored in a GMT
/// file. The others are accepted by `GmtLayer::create_field` only when
/// approximation is allowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Integer64,
    Real,
    String,
    Date,
    Time,
    DateTime,
    Binary,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Layer schema: ordered fields plus a name lookup table.
#[derive(Clone, Debug, Default)]
pub struct LayerDefn {
    pub name: String,
    fields: Vec<FieldSpec>,
    index_by_name: HashMap<String, usize>,
}

impl LayerDefn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            index_by_name: HashMap::new(),
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Position of the field named `name`, if any.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    pub(crate) fn push_field(&mut self, spec: FieldSpec) {
        // The first field wins a name lookup, like the declaration order.
        self.index_by_name
            .entry(spec.name.clone())
            .or_insert(self.fields.len());
        self.fields.push(spec);
    }
}

/// Geometry kind of a layer. `Unknown` until declared by the header or
/// fixed by the first written feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GeometryKind {
    #[default]
    Unknown,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

/// Axis-aligned bounding box in layer coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Envelope {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn from_point(x: f64, y: f64) -> Self {
        Self::new(x, x, y, y)
    }

    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

/// Grow `envelope` to include the point `(x, y)`.
pub(crate) fn merge_point(envelope: &mut Option<Envelope>, x: f64, y: f64) {
    match envelope {
        Some(existing) => {
            existing.min_x = existing.min_x.min(x);
            existing.max_x = existing.max_x.max(x);
            existing.min_y = existing.min_y.min(y);
            existing.max_y = existing.max_y.max(y);
        }
        None => *envelope = Some(Envelope::from_point(x, y)),
    }
}

pub(crate) fn merge_envelope(envelope: &mut Option<Envelope>, other: Envelope) {
    match envelope {
        Some(existing) => {
            existing.min_x = existing.min_x.min(other.min_x);
            existing.max_x = existing.max_x.max(other.max_x);
            existing.min_y = existing.min_y.min(other.min_y);
            existing.max_y = existing.max_y.max(other.max_y);
        }
        None => *envelope = Some(other),
    }
}

/// Layer capabilities that callers can query with `GmtLayer::test_capability`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    RandomRead,
    SequentialWrite,
    FastSpatialFilter,
    FastGetExtent,
    CreateField,
    ZGeometries,
}

/// Owned dynamic value of a feature property.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Value::Null,
        }
    }
}

impl TryFrom<Value> for String {
    type Error = GmtError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Text(value) => Ok(value),
            other => Err(GmtError::ValueTypeMismatch {
                expected: "text",
                actual: other.type_name(),
            }),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = GmtError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Integer(value) => Ok(value),
            other => Err(GmtError::ValueTypeMismatch {
                expected: "integer",
                actual: other.type_name(),
            }),
        }
    }
}

impl TryFrom<Value> for i32 {
    type Error = GmtError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let value: i64 = value.try_into()?;
        i32::try_from(value).map_err(|_| GmtError::ValueOutOfRange { target: "i32" })
    }
}

impl TryFrom<Value> for f64 {
    type Error = GmtError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Real(value) => Ok(value),
            Value::Integer(value) => Ok(value as f64),
            other => Err(GmtError::ValueTypeMismatch {
                expected: "real",
                actual: other.type_name(),
            }),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = GmtError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            Value::Integer(_) => Err(GmtError::ValueOutOfRange { target: "bool" }),
            other => Err(GmtError::ValueTypeMismatch {
                expected: "integer",
                actual: other.type_name(),
            }),
        }
    }
}

macro_rules! impl_try_from_value_for_option {
    ($($ty:ty),+) => {
        $(
            impl TryFrom<Value> for Option<$ty> {
                type Error = GmtError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    match value {
                        Value::Null => Ok(None),
                        other => <$ty>::try_from(other).map(Some),
                    }
                }
            }
        )+
    };
}

impl_try_from_value_for_option!(String, i64, i32, f64, bool);

/// Build a `Vec<Value>` from a fixed list of values.
///
/// `None` becomes `Value::Null`; you may need to annotate its type:
///
/// ```
/// use gmt_vector::{Value, params};
///
/// let values = params!["alpha", 7_i64, Option::<f64>::None];
/// assert_eq!(values[2], Value::Null);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::{Envelope, LayerDefn, Value, merge_point};
    use super::{FieldSpec, FieldType};
    use crate::Result;

    #[test]
    fn converts_values() -> Result<()> {
        let name: String = Value::from("alpha").try_into()?;
        assert_eq!(name, "alpha");

        let count: i64 = Value::from(3_i32).try_into()?;
        assert_eq!(count, 3);

        let ratio: f64 = Value::Integer(2).try_into()?;
        assert_eq!(ratio, 2.0);

        let active: bool = Value::from(true).try_into()?;
        assert!(active);

        let missing: Option<i64> = Value::Null.try_into()?;
        assert_eq!(missing, None);

        let err = i64::try_from(Value::from("x")).expect_err("text is not an integer");
        assert!(matches!(
            err,
            crate::GmtError::ValueTypeMismatch {
                expected: "integer",
                actual: "text"
            }
        ));
        Ok(())
    }

    #[test]
    fn params_macro_builds_values() {
        let values = crate::params!["a", 1_i64, 2.5, Option::<i64>::None];
        assert_eq!(
            values,
            vec![
                Value::Text("a".to_string()),
                Value::Integer(1),
                Value::Real(2.5),
                Value::Null
            ]
        );
        assert!(crate::params![].is_empty());
    }

    #[test]
    fn envelope_merges_points() {
        let mut envelope = None;
        merge_point(&mut envelope, 1.0, 5.0);
        merge_point(&mut envelope, -2.0, 3.0);
        assert_eq!(envelope, Some(Envelope::new(-2.0, 1.0, 3.0, 5.0)));

        let other = Envelope::new(0.0, 0.5, 4.0, 10.0);
        assert!(envelope.expect("merged").intersects(&other));
        assert!(!other.intersects(&Envelope::new(1.0, 2.0, 0.0, 1.0)));
    }

    #[test]
    fn defn_looks_up_fields_by_name() {
        let mut defn = LayerDefn::new("points");
        defn.push_field(FieldSpec::new("name", FieldType::String));
        defn.push_field(FieldSpec::new("value", FieldType::Integer));

        assert_eq!(defn.field_count(), 2);
        assert_eq!(defn.field_index("value"), Some(1));
        assert_eq!(defn.field_index("missing"), None);
    }
}
