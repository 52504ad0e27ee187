//! Prompt templates.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use crate::error::RegistryError;
use crate::registry::schema::ParamSpec;

/// Matches `{name}` placeholders in a template.
fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    })
}

/// A named, parameterised text template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    /// Unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Template text with `{placeholder}` parameters.
    pub template: String,
    /// Spec for each placeholder.
    pub parameters: IndexMap<String, ParamSpec>,
}

impl Prompt {
    /// Creates a prompt with no parameters.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            template: template.into(),
            parameters: IndexMap::new(),
        }
    }

    /// Declares a placeholder parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.parameters.insert(name.into(), spec);
        self
    }

    /// Returns the distinct placeholder names in template order.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for captures in placeholder_pattern().captures_iter(&self.template) {
            if let Some(name) = captures.get(1).map(|m| m.as_str()) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Checks that every placeholder is declared and every default is valid.
    ///
    /// # Errors
    ///
    /// Returns the first undeclared placeholder or invalid default.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if let Some(missing) = self
            .placeholders()
            .into_iter()
            .find(|name| !self.parameters.contains_key(*name))
        {
            return Err(RegistryError::UndeclaredPlaceholder {
                prompt: self.id.clone(),
                placeholder: missing.to_string(),
            });
        }

        self.parameters
            .iter()
            .try_for_each(|(name, spec)| spec.check_default(&self.id, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tutor() -> Prompt {
        Prompt::new(
            "math-tutor",
            "Math tutor",
            "Step-by-step maths help",
            "Explain a {difficulty} {topic} problem. Keep {topic} simple.",
        )
        .with_parameter(
            "difficulty",
            ParamSpec::string("Difficulty").with_enum(["easy", "medium", "hard"]),
        )
        .with_parameter("topic", ParamSpec::string("Topic"))
    }

    #[test]
    fn placeholders_are_distinct_and_ordered() {
        assert_eq!(tutor().placeholders(), vec!["difficulty", "topic"]);
    }

    #[test]
    fn ignores_non_identifier_braces() {
        let prompt = Prompt::new("p", "p", "", "fn main() { } and {0} and {a-b}");
        assert!(prompt.placeholders().is_empty());
        assert!(prompt.validate().is_ok());
    }

    #[test]
    fn declared_placeholders_validate() {
        assert!(tutor().validate().is_ok());
    }

    #[test]
    fn undeclared_placeholder_is_rejected() {
        let prompt = Prompt::new("sql", "SQL", "", "Write SQL for {task} using {schema}")
            .with_parameter("task", ParamSpec::string("Task"));
        assert_eq!(
            prompt.validate(),
            Err(RegistryError::UndeclaredPlaceholder {
                prompt: "sql".to_string(),
                placeholder: "schema".to_string(),
            })
        );
    }

    #[test]
    fn default_must_match_type() {
        let prompt = Prompt::new("p", "p", "", "{count}")
            .with_parameter("count", ParamSpec::integer("").with_default("ten"));
        assert!(matches!(
            prompt.validate(),
            Err(RegistryError::InvalidDefault { .. })
        ));
    }
}
