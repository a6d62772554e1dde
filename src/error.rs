use std::error::Error;
use std::fmt;

use crate::types::{FieldType, GeometryKind};

/// Crate error type for GMT layer operations.
#[derive(Debug)]
pub enum GmtError {
    /// Wraps errors returned by the underlying stream.
    Io(std::io::Error),
    /// A write operation was attempted on a layer opened without write access.
    ReadOnly,
    /// Fields can no longer be created because the header has been written.
    FieldsLocked,
    /// A field type cannot be represented and approximation was not allowed.
    UnsupportedFieldType {
        field: String,
        field_type: FieldType,
    },
    /// The GMT format requires every feature to carry a geometry.
    MissingGeometry,
    /// The feature geometry does not match the geometry kind of the layer.
    GeometryKindMismatch {
        expected: GeometryKind,
        actual: GeometryKind,
    },
    /// A geometry type that the GMT format cannot store.
    UnsupportedGeometryType(String),
    /// A geometry without any vertex where one is required.
    EmptyGeometry,
    /// Property count did not match the layer schema.
    InvalidPropertyCount {
        expected: usize,
        got: usize,
    },
    /// Dynamic `Value` type did not match the expected conversion target.
    ValueTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    /// Numeric conversion failed because the value is out of range.
    ValueOutOfRange {
        target: &'static str,
    },
    /// Requested feature property does not exist in the feature.
    MissingProperty {
        property: String,
    },
    Message(String),
}

impl fmt::Display for GmtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::ReadOnly => write!(f, "operation not allowed on read-only layer"),
            Self::FieldsLocked => {
                write!(f, "unable to create fields after features have been created")
            }
            Self::UnsupportedFieldType { field, field_type } => {
                write!(f, "field {field} is of unsupported type {field_type:?}")
            }
            Self::MissingGeometry => {
                write!(f, "features without geometry are not supported by the GMT writer")
            }
            Self::GeometryKindMismatch { expected, actual } => write!(
                f,
                "geometry kind mismatch: layer is {expected:?}, feature is {actual:?}"
            ),
            Self::UnsupportedGeometryType(ty) => write!(f, "unsupported geometry type: {ty}"),
            Self::EmptyGeometry => write!(f, "geometry has no vertices"),
            Self::InvalidPropertyCount { expected, got } => {
                write!(f, "invalid property count: expected {expected}, got {got}")
            }
            Self::ValueTypeMismatch { expected, actual } => {
                write!(f, "expected {expected}, got {actual}")
            }
            Self::ValueOutOfRange { target } => {
                write!(f, "value out of range for {target}")
            }
            Self::MissingProperty { property } => write!(f, "missing property: {property}"),
            Self::Message(msg) => write!(f, "{msg}"),
        }
    }
}

impl Error for GmtError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GmtError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<&str> for GmtError {
    fn from(msg: &str) -> Self {
        Self::Message(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GmtError>;
