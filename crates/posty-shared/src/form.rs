//! Inline form errors.

use std::collections::BTreeMap;

use validator::ValidationErrors;

/// Message shown under a required field left blank.
pub const REQUIRED: &str = "This field is required.";

/// Message shown when a choice field names something that does not exist.
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Errors collected while cleaning a submitted form, keyed by field name.
///
/// Errors that belong to no single field (e.g. wrong credentials) are kept
/// separately and rendered above the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    /// Messages attached to `field`, empty if it is valid.
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn has(&self, field: &str) -> bool {
        !self.field(field).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// Fold `other` into `self`.
    pub fn merge(&mut self, other: FormErrors) {
        for (field, messages) in other.fields {
            self.fields.entry(field).or_default().extend(messages);
        }
        self.non_field.extend(other.non_field);
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                form_errors.add(field.to_string(), message);
            }
        }
        form_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct NoteForm {
        #[validate(length(min = 1, message = "This field is required."))]
        text: String,
    }

    #[test]
    fn collects_validator_messages_per_field() {
        let errors: FormErrors = NoteForm {
            text: String::new(),
        }
        .validate()
        .unwrap_err()
        .into();

        assert_eq!(errors.field("text"), [REQUIRED.to_string()]);
        assert!(errors.field("other").is_empty());
    }

    #[test]
    fn merge_and_into_result() {
        let mut a = FormErrors::new();
        assert_eq!(a.clone().into_result(), Ok(()));

        let mut b = FormErrors::new();
        b.add("group", INVALID_CHOICE);
        b.add_non_field("nope");
        a.add("group", REQUIRED);
        a.merge(b);

        assert_eq!(a.field("group").len(), 2);
        assert_eq!(a.non_field(), ["nope".to_string()]);
        assert!(a.into_result().is_err());
    }
}
