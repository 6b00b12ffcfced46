//! Operation semantics shared by the HTTP handlers: validation, existence checks,
//! allocation rules and the request workflow. Everything takes the store (and, where an
//! actor matters, the current user) explicitly.

pub mod accounts;
pub mod buildings;
pub mod custodians;
pub mod inventory;
pub mod requests;
pub mod rooms;
pub mod seed;

use validator::Validate;

use crate::error::{AppError, FieldErrors};

/// Runs the payload's derive validators and additionally rejects required text fields
/// that contain only whitespace.
pub(crate) fn check<T: Validate>(payload: &T, required: &[(&'static str, &str)]) -> Result<(), AppError> {
    let mut errors = match payload.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => errors.into(),
    };
    for (field, value) in required {
        if value.trim().is_empty() && !errors.contains(field) {
            errors.add(
                *field,
                format!("The {} field is required.", field.replace('_', " ")),
            );
        }
    }
    errors.into_result()
}

/// Trims optional free text, mapping blank strings to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Placement carried by an update payload. An omitted target keeps the current one, and
/// moving something that is already placed elsewhere goes through unallocate first.
pub(crate) fn placement(
    current: Option<i64>,
    requested: Option<i64>,
    conflict: impl FnOnce(i64) -> AppError,
) -> Result<Option<i64>, AppError> {
    match (current, requested) {
        (current, None) => Ok(current),
        (Some(current), Some(requested)) if current != requested => Err(conflict(current)),
        (_, requested) => Ok(requested),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BuildingPayload;

    #[test]
    fn whitespace_only_names_are_rejected() {
        let payload = BuildingPayload { name: "   ".into() };
        let err = check(&payload, &[("name", payload.name.as_str())]).unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.messages("name"), ["The name field is required."])
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn optional_text_drops_blanks() {
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(Some(" cracked ".into())), Some("cracked".into()));
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn placement_keeps_or_sets_but_never_moves() {
        let conflict = |current| AppError::Conflict(format!("placed in {current}"));
        assert_eq!(placement(Some(3), None, conflict).unwrap(), Some(3));
        assert_eq!(placement(Some(3), Some(3), conflict).unwrap(), Some(3));
        assert_eq!(placement(None, Some(4), conflict).unwrap(), Some(4));
        assert_eq!(placement(None, None, conflict).unwrap(), None);
        match placement(Some(3), Some(4), conflict) {
            Err(AppError::Conflict(message)) => assert_eq!(message, "placed in 3"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
