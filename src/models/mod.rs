pub mod appointment;
pub mod doctor;
pub mod lookup;
pub mod patient;
pub mod visit;

pub use appointment::*;
pub use doctor::*;
pub use lookup::*;
pub use patient::*;
pub use visit::*;

use serde::{Deserialize, Deserializer};

/// Backend identifiers are opaque. The record service emits them as JSON
/// strings or numbers depending on the entity, so both decode to `String`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
    Uint(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
            RawId::Uint(n) => n.to_string(),
        }
    }
}

pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

pub(crate) fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}
