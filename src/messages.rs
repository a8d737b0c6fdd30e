//! Error-code to user-facing message resolution.
//!
//! The workflow only preserves the server's code and message; turning them into
//! text is a lookup in an injected [`MessageCatalog`] with the server message as
//! the fallback.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::workflows::{ProvisioningError, SubmissionStatus};

/// Localization lookup: key to text, or nothing when no translation exists.
pub trait MessageCatalog {
    fn lookup(&self, key: &str) -> Option<String>;
}

impl MessageCatalog for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl MessageCatalog for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Code-keyed translations loaded from configuration.
///
/// The `config` crate folds keys to lowercase while loading, so keys are stored
/// lowercased and lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageTable(BTreeMap<String, String>);

impl MessageTable {
    pub fn insert(&mut self, code: &str, text: impl Into<String>) {
        self.0.insert(code.to_lowercase(), text.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for MessageTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(code, text)| (code.to_lowercase(), text))
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for MessageTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, String>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

impl MessageCatalog for MessageTable {
    fn lookup(&self, key: &str) -> Option<String> {
        self.0.get(&key.to_lowercase()).cloned()
    }
}

/// Catalog without any translations; every lookup falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranslations;

impl MessageCatalog for NoTranslations {
    fn lookup(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Localized text for `code` when the catalog has it, otherwise `fallback` verbatim.
pub fn resolve<C>(code: Option<&str>, fallback: &str, catalog: &C) -> String
where
    C: MessageCatalog + ?Sized,
{
    code.and_then(|code| catalog.lookup(code))
        .unwrap_or_else(|| fallback.to_string())
}

pub fn resolve_error<C>(error: &ProvisioningError, catalog: &C) -> String
where
    C: MessageCatalog + ?Sized,
{
    resolve(error.code.as_deref(), &error.message, catalog)
}

/// One-line status text for the presentation layer.
pub fn describe_status<C>(
    status: SubmissionStatus,
    error: Option<&ProvisioningError>,
    catalog: &C,
) -> String
where
    C: MessageCatalog + ?Sized,
{
    match (status, error) {
        (SubmissionStatus::Failed, Some(error)) => resolve_error(error, catalog),
        (SubmissionStatus::Pending, _) => "Setting the PIN on the device...".to_string(),
        _ => "Choose a PIN for the device and confirm it.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> HashMap<String, String> {
        HashMap::from([(
            "e_device_locked".to_string(),
            "The device is locked. Unplug it and try again.".to_string(),
        )])
    }

    #[test]
    fn test_known_code_uses_translation() {
        assert_eq!(
            resolve(Some("e_device_locked"), "locked", &catalog()),
            "The device is locked. Unplug it and try again."
        );
    }

    #[test]
    fn test_unknown_code_falls_back_to_message() {
        assert_eq!(resolve(Some("e_other"), "locked", &catalog()), "locked");
        assert_eq!(resolve(Some("e_device_locked"), "locked", &NoTranslations), "locked");
    }

    #[test]
    fn test_absent_code_uses_message() {
        assert_eq!(resolve(None, "unreachable", &catalog()), "unreachable");
    }

    #[test]
    fn test_message_table_ignores_code_case() {
        let table: MessageTable = [("E_LOCKED".to_string(), "Device is locked".to_string())]
            .into_iter()
            .collect();
        assert_eq!(resolve(Some("E_LOCKED"), "locked", &table), "Device is locked");
        assert_eq!(resolve(Some("e_locked"), "locked", &table), "Device is locked");
        assert_eq!(resolve(Some("E_OTHER"), "other", &table), "other");
    }

    #[test]
    fn test_failed_status_describes_resolved_error() {
        let error = ProvisioningError::rejected(Some("e_device_locked".to_string()), Some("locked".to_string()));
        let text = describe_status(SubmissionStatus::Failed, Some(&error), &catalog());
        assert_eq!(text, "The device is locked. Unplug it and try again.");

        let text = describe_status(SubmissionStatus::Pending, None, &NoTranslations);
        assert!(text.contains("Setting the PIN"));
    }
}
