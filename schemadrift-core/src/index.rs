// schemadrift-core/src/index.rs
// Index metadata model

use crate::error::{DriftError, Result};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// One `(field, direction-or-type)` pair of an index key pattern
///
/// `spec` is kept as the raw JSON value so numeric directions (`1`, `-1`)
/// and special index types (`"text"`, `"2dsphere"`, `"hashed"`) are both
/// representable without interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexKeyField {
    pub field: String,
    pub spec: Value,
}

impl IndexKeyField {
    pub fn new(field: impl Into<String>, spec: impl Into<Value>) -> Self {
        IndexKeyField {
            field: field.into(),
            spec: spec.into(),
        }
    }
}

/// Ordered index key pattern, e.g. `{ country: 1, city: -1 }`
///
/// Field order defines the index and is compared as a sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyPattern(Vec<IndexKeyField>);

impl KeyPattern {
    pub fn new(fields: Vec<IndexKeyField>) -> Self {
        KeyPattern(fields)
    }

    /// Build a key pattern from a key document, keeping its field order
    pub fn from_document(doc: &Map<String, Value>) -> Self {
        KeyPattern(
            doc.iter()
                .map(|(field, spec)| IndexKeyField::new(field.clone(), spec.clone()))
                .collect(),
        )
    }

    pub fn fields(&self) -> &[IndexKeyField] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_document(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|f| (f.field.clone(), f.spec.clone()))
            .collect()
    }
}

impl Serialize for KeyPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for f in &self.0 {
            map.serialize_entry(&f.field, &f.spec)?;
        }
        map.end()
    }
}

/// Shell-style rendering: `{ email: 1, "address.city": -1 }`
impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "{{}}");
        }
        write!(f, "{{ ")?;
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", render_field_name(&key.field), key.spec)?;
        }
        write!(f, " }}")
    }
}

/// Render a document field name the way the mongo shell accepts it:
/// bare when it is a plain identifier, double-quoted otherwise
pub(crate) fn render_field_name(field: &str) -> String {
    let mut chars = field.chars();
    let is_identifier = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };

    if is_identifier {
        field.to_string()
    } else {
        Value::String(field.to_string()).to_string()
    }
}

/// Normalized definition of one index on one collection
///
/// Optional properties are `None` when the listing record does not carry
/// them. Absence is meaningful: `unique: None` and `unique: Some(false)` are
/// different definitions for drift purposes.
///
/// Serializes to the creation document accepted by `createIndexes`
/// (`key`, `name`, then the present options in a fixed order).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDefinition {
    #[serde(rename = "key")]
    pub keys: KeyPattern,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sparse: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_after_seconds: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_filter_expression: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collation: Option<Value>,
}

impl IndexDefinition {
    /// Create a definition with only name and keys set
    pub fn new(name: impl Into<String>, keys: KeyPattern) -> Self {
        IndexDefinition {
            keys,
            name: name.into(),
            unique: None,
            sparse: None,
            expire_after_seconds: None,
            partial_filter_expression: None,
            collation: None,
        }
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    pub fn with_sparse(mut self, sparse: bool) -> Self {
        self.sparse = Some(sparse);
        self
    }

    pub fn with_expire_after_seconds(mut self, seconds: i32) -> Self {
        self.expire_after_seconds = Some(seconds);
        self
    }

    pub fn with_partial_filter(mut self, filter: Value) -> Self {
        self.partial_filter_expression = Some(filter);
        self
    }

    pub fn with_collation(mut self, collation: Value) -> Self {
        self.collation = Some(collation);
        self
    }

    /// Decode a raw index listing record
    ///
    /// Only `name` is mandatory. Every other field is read best-effort: a
    /// field with an unexpected shape is treated as absent.
    pub fn from_raw(record: &Value) -> Result<Self> {
        let doc = record.as_object().ok_or_else(|| {
            DriftError::InvalidIndexRecord(format!("record is not a document: {}", record))
        })?;

        let name = match doc.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(DriftError::InvalidIndexRecord(format!(
                    "'name' is not a string: {}",
                    other
                )))
            }
            None => {
                return Err(DriftError::InvalidIndexRecord(
                    "missing 'name' field".to_string(),
                ))
            }
        };

        let keys = doc
            .get("key")
            .and_then(Value::as_object)
            .map(KeyPattern::from_document)
            .unwrap_or_default();

        Ok(IndexDefinition {
            keys,
            name,
            unique: doc.get("unique").and_then(Value::as_bool),
            sparse: doc.get("sparse").and_then(Value::as_bool),
            expire_after_seconds: doc.get("expireAfterSeconds").and_then(as_i32),
            partial_filter_expression: document_field(doc, "partialFilterExpression"),
            collation: document_field(doc, "collation"),
        })
    }

    /// Creation document for this index (`key`, `name` and present options)
    pub fn to_document(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Accept any integral number that fits in 32 bits; servers report TTLs as
/// int32, int64 or double depending on how the index was created
fn as_i32(value: &Value) -> Option<i32> {
    if let Some(i) = value.as_i64() {
        return i32::try_from(i).ok();
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

fn document_field(doc: &Map<String, Value>, field: &str) -> Option<Value> {
    doc.get(field).filter(|v| v.is_object()).cloned()
}
