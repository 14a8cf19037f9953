//! Feed document envelope.
//!
//! Both feeds arrive as `{ meta: { generated_at, dt, sid }, records: [...] }`.
//! Records stay untyped until the normalizer sees them.

use serde::{Deserialize, Deserializer, Serialize};

/// Accepts a string or a number and keeps it as text.
fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Int(i64),
        Float(f64),
    }

    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        let text = match v {
            StringOrNumber::String(s) => s.trim().to_string(),
            StringOrNumber::Int(i) => i.to_string(),
            StringOrNumber::Float(f) => f.to_string(),
        };
        (!text.is_empty()).then_some(text)
    }))
}

/// Feed-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMeta {
    /// Generation stamp; an unchanged value means the feed has not moved.
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub generated_at: Option<String>,
    /// Show date.
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub dt: Option<String>,
    /// Show id.
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub sid: Option<String>,
}

/// A fetched feed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedDocument {
    #[serde(default)]
    pub meta: FeedMeta,
    #[serde(default)]
    pub records: Vec<serde_json::Value>,
}

impl FeedDocument {
    /// Decode a document body. A bare JSON array is a record list without
    /// metadata, and an object with neither `meta` nor `records` is a single
    /// record.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        use serde_json::Value;

        match serde_json::from_slice::<Value>(bytes)? {
            Value::Array(records) => Ok(FeedDocument {
                meta: FeedMeta::default(),
                records,
            }),
            Value::Object(map)
                if !map.is_empty() && !map.contains_key("meta") && !map.contains_key("records") =>
            {
                Ok(FeedDocument {
                    meta: FeedMeta::default(),
                    records: vec![Value::Object(map)],
                })
            }
            envelope => serde_json::from_value(envelope),
        }
    }
}
