//! Per-attribute validation messages.

use std::fmt;

/// Messages produced by a validation run, grouped by attribute.
///
/// Attributes appear in the order their first failure was recorded, and
/// each attribute's messages keep rule registration order. Empty means
/// valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message against an attribute.
    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        let attribute = attribute.into();
        let message = message.into();
        match self.entries.iter_mut().find(|(name, _)| *name == attribute) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((attribute, vec![message])),
        }
    }

    /// Messages recorded against an attribute.
    pub fn get(&self, attribute: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, messages)| messages.as_slice())
            .unwrap_or_default()
    }

    /// Returns true if any message names this attribute.
    pub fn contains(&self, attribute: &str) -> bool {
        !self.get(attribute).is_empty()
    }

    /// Returns true if nothing failed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of messages.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, messages)| messages.len()).sum()
    }

    /// Attributes with at least one message.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over `(attribute, messages)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }

    /// Messages prefixed with their attribute, e.g. `name can't be blank`.
    pub fn full_messages(&self) -> Vec<String> {
        self.iter()
            .flat_map(|(name, messages)| messages.iter().map(move |m| format!("{name} {m}")))
            .collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "instance is invalid");
        }
        write!(f, "{}", self.full_messages().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_attribute_in_order() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "can't be blank");
        errors.add("age", "is not a number");
        errors.add("name", "too short");

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("name"), ["can't be blank", "too short"]);
        assert_eq!(errors.attributes().collect::<Vec<_>>(), ["name", "age"]);
        assert_eq!(
            errors.to_string(),
            "name can't be blank, name too short, age is not a number"
        );
    }

    #[test]
    fn empty_errors() {
        let errors = ValidationErrors::new();
        assert!(errors.is_empty());
        assert!(errors.get("name").is_empty());
        assert!(!errors.contains("name"));
        assert_eq!(errors.to_string(), "instance is invalid");
    }
}
