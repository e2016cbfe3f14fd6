//! Mapping of server validation messages onto form fields

use serde::Serialize;
use std::fmt;

/// Input field of the login, registration and profile forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    Name,
    Email,
    Password,
}

impl FormField {
    /// Checked in this order; "Invalid email or password" lands on the email field
    const ALL: [Self; 3] = [Self::Email, Self::Password, Self::Name];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Password => "password",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error to show next to a form field, or above the whole form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FormError {
    Field { field: FormField, message: String },
    General { message: String },
}

impl FormError {
    /// Attach a server message to the field it mentions
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        match FormField::ALL
            .into_iter()
            .find(|field| lowered.contains(field.as_str()))
        {
            Some(field) => Self::Field { field, message },
            None => Self::General { message },
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    pub const fn field(&self) -> Option<FormField> {
        match self {
            Self::Field { field, .. } => Some(*field),
            Self::General { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Field { message, .. } | Self::General { message } => message,
        }
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
