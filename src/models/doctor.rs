use serde::{Deserialize, Serialize};

/// A treating professional as held by the record service.
///
/// `name` is optional: the record service keeps doctors whose display name
/// has not been captured yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}
