use serde::{Deserialize, Deserializer};

use crate::commands::PublishStep;

/// Node configuration keys and the defaults written by `cfg`.
pub const DEFAULT_CONFIG_KEYS: &[(&str, &str)] = &[
    ("cover_enable", "1"),
    ("cover_open", "0"),
    ("cover_close", "1"),
    ("cover_up_time", "25"),
    ("cover_down_time", "24"),
    ("cover_polling_time", "250"),
    ("cover_last_position", "0"),
    ("dht11_enable", "0"),
];

const WRITE_SUFFIX: &str = "cfg/write";
const READ_SUFFIX: &str = "cfg/read";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigKey {
    pub key: String,
    #[serde(deserialize_with = "scalar_to_string")]
    pub value: String,
}

impl ConfigKey {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

fn scalar_to_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Bool(bool),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Int(i) => i.to_string(),
        Scalar::Bool(b) => u8::from(b).to_string(),
    })
}

/// Provisioning sequence replayed by `cfg`: a write of the default followed
/// by a read-back, per key, in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBatch {
    keys: Vec<ConfigKey>,
}

impl ConfigBatch {
    pub fn new(keys: Vec<ConfigKey>) -> Self {
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn steps(&self) -> Vec<PublishStep> {
        self.keys
            .iter()
            .flat_map(|k| {
                [
                    PublishStep::new(WRITE_SUFFIX, format!("{}:{}", k.key, k.value)),
                    PublishStep::new(READ_SUFFIX, k.key.clone()),
                ]
            })
            .collect()
    }
}

impl Default for ConfigBatch {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_KEYS.iter().map(|(k, v)| ConfigKey::new(*k, *v)).collect())
    }
}
