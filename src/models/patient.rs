use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_id_decodes_as_text() {
        let patient: Patient = serde_json::from_str(r#"{"id": 5, "name": "Sanjay Dutt"}"#).unwrap();
        assert_eq!(patient.id, "5");
        assert_eq!(patient.name, "Sanjay Dutt");
    }

    #[test]
    fn extra_backend_fields_are_ignored() {
        let patient: Patient =
            serde_json::from_str(r#"{"id": "p-1", "name": "Ana", "dob": "1980-02-01"}"#).unwrap();
        assert_eq!(patient.id, "p-1");
    }

    #[test]
    fn missing_name_is_rejected() {
        assert!(serde_json::from_str::<Patient>(r#"{"id": "p-1"}"#).is_err());
    }
}
