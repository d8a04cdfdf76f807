//! Contact form sanitisation and validation.

use crate::security::{is_valid_email, sanitize_form_input};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

const MAX_NAME_LEN: usize = 100;
const MAX_SUBJECT_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 2000;

/// Input length cap applied while sanitising non-message fields.
const MAX_FIELD_INPUT_LEN: usize = 200;

/// A contact form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Form field a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactField {
    Name,
    Email,
    Subject,
    Message,
}

/// Validation errors keyed by field. Empty when the form is valid.
pub type FieldErrors = BTreeMap<ContactField, &'static str>;

impl ContactForm {
    /// Returns a copy with every field passed through [`sanitize_form_input`].
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            name: sanitize_form_input(&self.name, MAX_FIELD_INPUT_LEN),
            email: sanitize_form_input(&self.email, MAX_FIELD_INPUT_LEN),
            subject: sanitize_form_input(&self.subject, MAX_FIELD_INPUT_LEN),
            message: sanitize_form_input(&self.message, MAX_MESSAGE_LEN),
        }
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns the message for each invalid field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.name.trim().is_empty() {
            errors.insert(ContactField::Name, "Name is required");
        } else if self.name.chars().count() > MAX_NAME_LEN {
            errors.insert(ContactField::Name, "Name must be less than 100 characters");
        }

        if self.email.trim().is_empty() {
            errors.insert(ContactField::Email, "Email is required");
        } else if !is_valid_email(&self.email) {
            errors.insert(ContactField::Email, "Please enter a valid email address");
        }

        if self.subject.trim().is_empty() {
            errors.insert(ContactField::Subject, "Subject is required");
        } else if self.subject.chars().count() > MAX_SUBJECT_LEN {
            errors.insert(
                ContactField::Subject,
                "Subject must be less than 200 characters",
            );
        }

        if self.message.trim().is_empty() {
            errors.insert(ContactField::Message, "Message is required");
        } else if self.message.chars().count() > MAX_MESSAGE_LEN {
            errors.insert(
                ContactField::Message,
                "Message must be less than 2000 characters",
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Logs that a submission was accepted without logging its content.
    pub fn submission_summary(&self) {
        info!(
            has_name = !self.name.is_empty(),
            has_email = !self.email.is_empty(),
            has_subject = !self.subject.is_empty(),
            message_length = self.message.chars().count(),
            "Form submitted successfully"
        );
    }
}
