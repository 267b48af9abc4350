use rand::RngExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Field map of a stored document
pub type Fields = Map<String, Value>;

const DOCUMENT_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const DOCUMENT_ID_LEN: usize = 20;

/// A document read back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }

    /// Deserialize the fields into a model, injecting the document id as `id`
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        let mut fields = self.fields.clone();
        fields
            .entry("id".to_string())
            .or_insert_with(|| Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
    }
}

/// A value to write into a single field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Overwrite the field with a literal value
    Set(Value),
    /// Add a delta to the current numeric value (missing counts as zero)
    Increment(i64),
    /// Resolved by the store to its own clock at write time
    ServerTimestamp,
}

/// Sort direction for ordered queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// A set of field writes applied to one document in a single step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentWrite {
    fields: BTreeMap<String, FieldValue>,
}

impl DocumentWrite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields
            .insert(field.to_string(), FieldValue::Set(value.into()));
        self
    }

    pub fn increment(mut self, field: &str, delta: i64) -> Self {
        self.fields
            .insert(field.to_string(), FieldValue::Increment(delta));
        self
    }

    pub fn server_timestamp(mut self, field: &str) -> Self {
        self.fields
            .insert(field.to_string(), FieldValue::ServerTimestamp);
        self
    }

    /// Build a write that sets every field of a serialized object
    pub fn from_fields(fields: Fields) -> Self {
        let mut write = Self::new();
        for (key, value) in fields {
            write.fields.insert(key, FieldValue::Set(value));
        }
        write
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Apply this write on top of `existing`.
    ///
    /// With `merge` the untouched fields of the existing document survive;
    /// without it the document is replaced. Increments always start from the
    /// value the resulting document would otherwise hold, so an increment on
    /// a replaced or missing document starts from zero.
    pub fn apply(&self, existing: Option<&Fields>, merge: bool, now_millis: i64) -> Fields {
        let mut result = match existing {
            Some(fields) if merge => fields.clone(),
            _ => Fields::new(),
        };

        for (key, value) in &self.fields {
            let resolved = match value {
                FieldValue::Set(v) => v.clone(),
                FieldValue::ServerTimestamp => Value::from(now_millis),
                FieldValue::Increment(delta) => increment_value(result.get(key), *delta),
            };
            result.insert(key.clone(), resolved);
        }

        result
    }
}

fn increment_value(current: Option<&Value>, delta: i64) -> Value {
    match current {
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => {
            let base = n.as_i64().unwrap_or(i64::MAX);
            Value::from(base.saturating_add(delta))
        }
        Some(Value::Number(n)) => n
            .as_f64()
            .and_then(|f| Number::from_f64(f + delta as f64))
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(delta)),
        _ => Value::from(delta),
    }
}

/// Generate a random 20 character alphanumeric document id
pub fn generate_document_id() -> String {
    let mut rng = rand::rng();
    (0..DOCUMENT_ID_LEN)
        .map(|_| {
            let idx = rng.random_range(0..DOCUMENT_ID_ALPHABET.len());
            DOCUMENT_ID_ALPHABET[idx] as char
        })
        .collect()
}

/// Total order over JSON values used by in-process ordered queries.
/// Missing values sort first, then null, bool, number, string, anything else.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
