//! Schema-free JSON documents and sample data generation.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use searchfeed_core::IndexDocument;

use crate::error::{ClientError, Result};

/// A JSON object document keyed by one of its fields.
///
/// The key value is extracted once at construction; strings are used
/// as-is and numbers are stringified, matching how document keys appear
/// on the wire.
#[derive(Debug, Clone)]
pub struct JsonDocument {
    key: String,
    fields: Map<String, Value>,
}

impl JsonDocument {
    /// Build a document from a JSON value, taking the key from `key_field`.
    pub fn from_value(value: Value, key_field: &str) -> Result<Self> {
        let Value::Object(fields) = value else {
            return Err(ClientError::InvalidDocument(
                "expected a JSON object".into(),
            ));
        };

        let key = match fields.get(key_field) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(ClientError::MissingKeyField {
                    field: key_field.to_string(),
                })
            }
        };

        Ok(Self { key, fields })
    }

    /// The document's fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl IndexDocument for JsonDocument {
    fn key(&self) -> &str {
        &self.key
    }
}

impl Serialize for JsonDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Payload size profile for generated sample documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadProfile {
    /// Compact documents, a few short fields
    Small,
    /// Documents with a long description, roughly a kilobyte each
    Large,
}

const CATEGORIES: [&str; 4] = ["Budget", "Suite", "Resort and Spa", "Extended-Stay"];

const TAG_POOL: [&str; 6] = [
    "pool",
    "view",
    "wifi",
    "concierge",
    "restaurant",
    "parking",
];

/// Generate hotel-style sample documents for benchmarking.
///
/// Output is deterministic for a given `count` and `profile`, so
/// repeated benchmark runs upload identical payloads. The key field is
/// `id`.
pub fn generate_documents(count: usize, profile: PayloadProfile) -> Vec<JsonDocument> {
    let filler = "Located in the heart of the old town, steps from public transit, \
                  with recently renovated rooms and a rooftop terrace. ";
    let description_repeats = match profile {
        PayloadProfile::Small => 1,
        PayloadProfile::Large => 8,
    };

    (0..count)
        .map(|i| {
            let tags: Vec<&str> = (0..=(i % 3)).map(|t| TAG_POOL[(i + t) % TAG_POOL.len()]).collect();
            let doc = serde_json::json!({
                "id": format!("hotel-{i}"),
                "name": format!("Sample Hotel {i}"),
                "description": filler.repeat(description_repeats),
                "category": CATEGORIES[i % CATEGORIES.len()],
                "tags": tags,
                "parking_included": i % 2 == 0,
                "rating": (i % 50) as f64 / 10.0,
            });
            JsonDocument::from_value(doc, "id").expect("generated document has an id")
        })
        .collect()
}

/// Estimate the serialized size of a document set in megabytes.
pub fn estimate_size_mb(documents: &[JsonDocument]) -> f64 {
    let bytes: usize = documents
        .iter()
        .map(|d| serde_json::to_string(d).map(|s| s.len()).unwrap_or(0))
        .sum();
    bytes as f64 / 1_000_000.0
}
