//! PIN entry and confirmation.
//!
//! [`PasswordConfirmationValidator`] holds the two independently typed entries
//! and only ever yields a [`ValidatedPassword`] when both agree and the primary
//! entry matches the configured [`ValidationPattern`].

use regex::Regex;
use std::fmt;
use thiserror::Error;

/// Pattern used when the configuration does not override it.
pub const DEFAULT_PIN_PATTERN: &str = "^[0-9]+$";

/// Human-readable form of [`DEFAULT_PIN_PATTERN`].
pub const DEFAULT_PIN_PATTERN_TITLE: &str = "PIN must contain digits only";

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Invalid PIN pattern '{pattern}': {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Format rule applied to the primary entry.
///
/// The rule always has to match the whole entry, whether or not the
/// configured expression carries its own `^`/`$`.
#[derive(Debug, Clone)]
pub struct ValidationPattern {
    regex: Regex,
    source: String,
    title: String,
}

fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$"))
}

impl ValidationPattern {
    pub fn new(pattern: &str, title: impl Into<String>) -> Result<Self, PatternError> {
        let regex = anchored(pattern).map_err(|source| PatternError::Invalid {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            regex,
            source: pattern.to_string(),
            title: title.into(),
        })
    }

    pub fn digits_only() -> Self {
        Self {
            regex: anchored(DEFAULT_PIN_PATTERN).expect("default PIN pattern compiles"),
            source: DEFAULT_PIN_PATTERN.to_string(),
            title: DEFAULT_PIN_PATTERN_TITLE.to_string(),
        }
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// The expression as configured, before anchoring
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Description shown to the user when an entry does not match.
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl Default for ValidationPattern {
    fn default() -> Self {
        Self::digits_only()
    }
}

/// A password that passed the confirmation and format checks.
///
/// Only [`PasswordConfirmationValidator`] can produce one.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ValidatedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValidatedPassword(<redacted>)")
    }
}

/// Something holding credential input that must be wiped after each attempt.
pub trait CredentialEntry {
    fn clear(&mut self);
}

#[derive(Debug, Clone, Default)]
pub struct PasswordConfirmationValidator {
    pattern: ValidationPattern,
    primary: Option<String>,
    confirmation: Option<String>,
}

impl PasswordConfirmationValidator {
    pub fn new(pattern: ValidationPattern) -> Self {
        Self {
            pattern,
            primary: None,
            confirmation: None,
        }
    }

    pub fn set_primary(&mut self, value: impl Into<String>) {
        self.primary = Some(value.into());
    }

    pub fn set_confirmation(&mut self, value: impl Into<String>) {
        self.confirmation = Some(value.into());
    }

    /// Recomputed on every call from the current entries.
    pub fn validated_password(&self) -> Option<ValidatedPassword> {
        let primary = self.primary.as_deref().filter(|p| !p.is_empty())?;
        let confirmation = self.confirmation.as_deref()?;
        if primary != confirmation || !self.pattern.is_match(primary) {
            return None;
        }
        Some(ValidatedPassword(primary.to_string()))
    }

    pub fn has_validated_password(&self) -> bool {
        self.validated_password().is_some()
    }

    pub fn clear(&mut self) {
        self.primary = None;
        self.confirmation = None;
    }

    pub fn pattern(&self) -> &ValidationPattern {
        &self.pattern
    }
}

impl CredentialEntry for PasswordConfirmationValidator {
    fn clear(&mut self) {
        PasswordConfirmationValidator::clear(self);
    }
}
