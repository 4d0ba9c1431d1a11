use std::fmt;
use std::sync::Arc;

use super::{Doctor, Patient, Visit};

/// What a lookup fetches from the record service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LookupKind {
    Doctor,
    Patient,
    VisitsByPatient,
    VisitsByDoctor,
}

impl LookupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doctor => "doctor",
            Self::Patient => "patient",
            Self::VisitsByPatient => "visits_by_patient",
            Self::VisitsByDoctor => "visits_by_doctor",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One deduplicable unit of backend work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupKey {
    pub kind: LookupKind,
    pub id: String,
}

impl LookupKey {
    pub fn new(kind: LookupKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn doctor(id: impl Into<String>) -> Self {
        Self::new(LookupKind::Doctor, id)
    }

    pub fn patient(id: impl Into<String>) -> Self {
        Self::new(LookupKind::Patient, id)
    }

    pub fn visits_by_patient(id: impl Into<String>) -> Self {
        Self::new(LookupKind::VisitsByPatient, id)
    }

    pub fn visits_by_doctor(id: impl Into<String>) -> Self {
        Self::new(LookupKind::VisitsByDoctor, id)
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Decoded payload for a lookup. Visit lists are shared so fan-out to many
/// requesters does not copy them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Doctor(Doctor),
    Patient(Patient),
    Visits(Arc<Vec<Visit>>),
}

impl Record {
    /// The lookup kinds this record can answer.
    pub fn matches(&self, kind: LookupKind) -> bool {
        matches!(
            (self, kind),
            (Record::Doctor(_), LookupKind::Doctor)
                | (Record::Patient(_), LookupKind::Patient)
                | (Record::Visits(_), LookupKind::VisitsByPatient)
                | (Record::Visits(_), LookupKind::VisitsByDoctor)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_differ_by_kind_for_same_id() {
        assert_ne!(LookupKey::doctor("1"), LookupKey::patient("1"));
        assert_eq!(LookupKey::doctor("1"), LookupKey::new(LookupKind::Doctor, "1"));
    }

    #[test]
    fn display_is_kind_colon_id() {
        assert_eq!(LookupKey::visits_by_doctor("7").to_string(), "visits_by_doctor:7");
    }

    #[test]
    fn visits_record_answers_both_visit_kinds() {
        let record = Record::Visits(Arc::new(Vec::new()));
        assert!(record.matches(LookupKind::VisitsByPatient));
        assert!(record.matches(LookupKind::VisitsByDoctor));
        assert!(!record.matches(LookupKind::Doctor));
    }
}
