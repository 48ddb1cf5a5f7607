//! Required-field validation for inbound todo payloads.

use std::fmt;

use super::model::{TodoDraft, TodoPayload};

/// The kind of rule a field broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ViolationKind {
    Required,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Wire name of the offending field.
    pub field: &'static str,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::Required => write!(f, "field {} is required", self.field),
        }
    }
}

/// All violations found in one payload, in field order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<Violation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Check that title, description, status and due date are all present.
///
/// An absent, `null` or empty string counts as missing.
pub fn validate(payload: TodoPayload) -> Result<TodoDraft, ValidationErrors> {
    let title = payload.title.filter(|s| !s.is_empty());
    let description = payload.description.filter(|s| !s.is_empty());
    let status = payload.status.filter(|s| !s.is_empty());

    let mut violations = Vec::new();
    let mut require = |present: bool, field: &'static str| {
        if !present {
            violations.push(Violation {
                field,
                kind: ViolationKind::Required,
            });
        }
    };

    require(title.is_some(), "title");
    require(description.is_some(), "description");
    require(status.is_some(), "status");
    require(payload.due_date.is_some(), "duedate");

    match (title, description, status, payload.due_date) {
        (Some(title), Some(description), Some(status), Some(due_date)) => Ok(TodoDraft {
            title,
            description,
            status,
            due_date,
        }),
        _ => Err(ValidationErrors(violations)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn full_payload() -> TodoPayload {
        TodoPayload {
            id: None,
            title: Some("Buy milk".into()),
            description: Some("Two litres".into()),
            status: Some("pending".into()),
            due_date: Some(Utc::now()),
        }
    }

    #[test]
    fn complete_payload_is_valid() {
        let payload = full_payload();
        let draft = validate(payload.clone()).unwrap();
        assert_eq!(Some(draft.title), payload.title);
        assert_eq!(Some(draft.description), payload.description);
        assert_eq!(Some(draft.status), payload.status);
        assert_eq!(Some(draft.due_date), payload.due_date);
    }

    #[test]
    fn empty_payload_lists_every_field() {
        let err = validate(TodoPayload::default()).unwrap_err();
        assert_eq!(err.violations().len(), 4);
        assert!(err.violations().iter().all(|v| v.kind == ViolationKind::Required));
        assert_eq!(
            err.to_string(),
            "field title is required, field description is required, \
             field status is required, field duedate is required"
        );
    }

    #[test]
    fn every_subset_of_missing_fields_is_reported() {
        let fields = ["title", "description", "status", "duedate"];
        for mask in 1u8..16 {
            let mut payload = full_payload();
            let mut expected = Vec::new();
            for (bit, field) in fields.iter().enumerate() {
                if mask & (1 << bit) == 0 {
                    continue;
                }
                expected.push(*field);
                match *field {
                    "title" => payload.title = None,
                    "description" => payload.description = None,
                    "status" => payload.status = None,
                    _ => payload.due_date = None,
                }
            }

            let err = validate(payload).unwrap_err();
            let reported: Vec<&str> = err.violations().iter().map(|v| v.field).collect();
            assert_eq!(reported, expected, "mask {mask:#06b}");
            let text = err.to_string();
            for field in expected {
                assert!(text.contains(&format!("field {field} is required")));
            }
        }
    }

    #[test]
    fn free_form_status_is_accepted() {
        let mut payload = full_payload();
        payload.status = Some("Blocked on review".into());
        assert!(validate(payload).is_ok());
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let mut payload = full_payload();
        payload.title = Some(String::new());
        payload.status = None;
        let err = validate(payload).unwrap_err();
        assert_eq!(
            err.to_string(),
            "field title is required, field status is required"
        );
    }
}
