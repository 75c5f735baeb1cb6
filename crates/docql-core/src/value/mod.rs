
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number};
use std::fmt;
use time::OffsetDateTime;

///
/// CONSTANTS
///

const NANOS_PER_MILLI: i128 = 1_000_000;

/// Extended-JSON key carrying an epoch-millisecond instant.
pub const EJSON_DATE_KEY: &str = "$date";

///
/// ValueKind
///
/// Closed set of literal kinds a filter operand can take.
/// Kind comparison during operation matching is exact equality,
/// never structural compatibility.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Boolean,
    Number,
    String,
    Null,
    Date,
    SubDocument,
    Array,
    DocumentId,
    EjsonWrapper,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Null => "null",
            Self::Date => "date",
            Self::SubDocument => "sub_document",
            Self::Array => "array",
            Self::DocumentId => "document_id",
            Self::EjsonWrapper => "ejson_wrapper",
        };
        write!(f, "{label}")
    }
}

///
/// TypedValue
///
/// A filter operand together with its kind. The kind is derived from the
/// variant, so it can never disagree with the runtime shape of the value.
/// Instances are immutable once constructed; inversion produces new values.
///

#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    Bool(bool),
    Number(Number),
    Text(String),
    Null,
    /// Epoch-millisecond instant, carried as a civil timestamp.
    Date(OffsetDateTime),
    SubDocument(Map<String, serde_json::Value>),
    Array(Vec<serde_json::Value>),
    DocumentId(String),
    /// An extended-JSON wrapper object that is not a recognized date.
    Ejson(Map<String, serde_json::Value>),
}

impl TypedValue {
    /// Classify an arbitrary JSON value into its operand form.
    ///
    /// Single-key objects whose key starts with `$` are extended-JSON
    /// wrappers; `{"$date": <epoch-millis>}` becomes a [`Self::Date`].
    #[must_use]
    pub fn of(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => Self::Number(n.clone()),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Array(items) => Self::Array(items.clone()),
            serde_json::Value::Object(map) => Self::of_object(map),
        }
    }

    fn of_object(map: &Map<String, serde_json::Value>) -> Self {
        if map.len() == 1 {
            if let Some((key, value)) = map.iter().next() {
                if key == EJSON_DATE_KEY {
                    if let Some(date) = value.as_i64().and_then(Self::date_from_millis) {
                        return date;
                    }
                }
                if key.starts_with('$') {
                    return Self::Ejson(map.clone());
                }
            }
        }

        Self::SubDocument(map.clone())
    }

    /// Construct a date operand from an epoch-millisecond timestamp.
    ///
    /// Returns `None` when the instant is outside the representable range.
    #[must_use]
    pub fn date_from_millis(millis: i64) -> Option<Self> {
        let nanos = i128::from(millis) * NANOS_PER_MILLI;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .map(Self::Date)
    }

    /// Construct a document-id operand.
    pub fn document_id(id: impl Into<String>) -> Self {
        Self::DocumentId(id.into())
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Boolean,
            Self::Number(_) => ValueKind::Number,
            Self::Text(_) => ValueKind::String,
            Self::Null => ValueKind::Null,
            Self::Date(_) => ValueKind::Date,
            Self::SubDocument(_) => ValueKind::SubDocument,
            Self::Array(_) => ValueKind::Array,
            Self::DocumentId(_) => ValueKind::DocumentId,
            Self::Ejson(_) => ValueKind::EjsonWrapper,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// The instant as epoch milliseconds, for drivers binding timestamps.
    #[must_use]
    pub const fn as_epoch_millis(&self) -> Option<i64> {
        match self {
            Self::Date(dt) => {
                let nanos = dt.unix_timestamp_nanos();
                Some((nanos / NANOS_PER_MILLI) as i64)
            }
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Null => write!(f, "null"),
            Self::Date(dt) => write!(f, "{dt}"),
            Self::SubDocument(map) => write!(f, "{}", serde_json::Value::Object(map.clone())),
            Self::Array(items) => write!(f, "{}", serde_json::Value::Array(items.clone())),
            Self::DocumentId(id) => write!(f, "{id}"),
            Self::Ejson(map) => write!(f, "{}", serde_json::Value::Object(map.clone())),
        }
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
