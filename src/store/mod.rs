//! File-backed prompt store.
//!
//! Prompts live in a flat JSON file:
//!
//! ```json
//! {
//!   "prompts": [
//!     { "id": "math-tutor", "name": "...", "description": "...", "prompt": "..." }
//!   ]
//! }
//! ```
//!
//! The server loads it once at start-up; the `prompts` subcommands rewrite
//! it between runs. Entries may carry an optional `parameters` map
//! describing their `{placeholder}`s.

mod defaults;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::registry::{ParamSpec, Prompt, Registry};

/// File name used when no prompt file is configured.
pub const DEFAULT_PROMPTS_FILE: &str = "prompts.json";

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("id pattern is valid"))
}

/// One prompt as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPrompt {
    /// Unique id (ASCII letters, digits, hyphens).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Template text.
    pub prompt: String,
    /// Placeholder specs.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, ParamSpec>,
}

impl StoredPrompt {
    /// Creates a stored prompt without parameters.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            prompt: prompt.into(),
            parameters: IndexMap::new(),
        }
    }
}

impl From<StoredPrompt> for Prompt {
    fn from(stored: StoredPrompt) -> Self {
        Self {
            id: stored.id,
            name: stored.name,
            description: stored.description,
            template: stored.prompt,
            parameters: stored.parameters,
        }
    }
}

/// Contents of the prompt file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptFile {
    /// Stored prompts in file order.
    #[serde(default)]
    pub prompts: Vec<StoredPrompt>,
}

impl PromptFile {
    /// The tutor prompts a fresh store is seeded with.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            prompts: defaults::tutor_prompts(),
        }
    }

    /// Looks up a prompt by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&StoredPrompt> {
        self.prompts.iter().find(|p| p.id == id)
    }

    /// Appends a prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is malformed or already present, or if
    /// the prompt would be rejected at registration.
    pub fn add(&mut self, prompt: StoredPrompt) -> Result<(), StoreError> {
        if !id_pattern().is_match(&prompt.id) {
            return Err(StoreError::InvalidId { id: prompt.id });
        }
        if self.find(&prompt.id).is_some() {
            return Err(StoreError::DuplicateId { id: prompt.id });
        }
        Prompt::from(prompt.clone()).validate()?;
        self.prompts.push(prompt);
        Ok(())
    }

    /// Removes and returns the prompt with `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if no prompt has this id.
    pub fn remove(&mut self, id: &str) -> Result<StoredPrompt, StoreError> {
        let index = self
            .prompts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| StoreError::UnknownId { id: id.to_string() })?;
        Ok(self.prompts.remove(index))
    }

    /// Registers every stored prompt and returns how many distinct ids it
    /// added to `registry`.
    ///
    /// Prompts that violate a registration invariant are skipped with a
    /// warning rather than aborting start-up. A repeated id replaces the
    /// earlier entry and is counted once.
    pub fn register_into(self, registry: &mut Registry) -> usize {
        let mut registered = HashSet::new();
        for stored in self.prompts {
            let id = stored.id.clone();
            match registry.register_prompt(stored.into()) {
                Ok(()) => {
                    if !registered.insert(id.clone()) {
                        tracing::warn!(prompt = %id, "Stored prompt id repeated, keeping the later entry");
                    }
                }
                Err(e) => tracing::warn!(prompt = %id, error = %e, "Skipping stored prompt"),
            }
        }
        registered.len()
    }
}

/// Reads and writes the prompt file.
#[derive(Debug, Clone)]
pub struct PromptStore {
    path: PathBuf,
}

impl PromptStore {
    /// Creates a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the prompt file. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<PromptFile, StoreError> {
        if !self.path.exists() {
            return Ok(PromptFile::default());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| StoreError::Read {
            path: self.path.clone(),
            source: e,
        })?;

        serde_json::from_str(&contents).map_err(|e| StoreError::Parse {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Loads the prompt file, seeding it with the default prompts if it
    /// does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or created.
    pub fn load_or_init(&self) -> Result<PromptFile, StoreError> {
        if self.path.exists() {
            return self.load();
        }

        let seeded = PromptFile::defaults();
        self.save(&seeded)?;
        tracing::info!(path = %self.path.display(), "Created prompt file with default prompts");
        Ok(seeded)
    }

    /// Writes the prompt file as pretty-printed UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub fn save(&self, data: &PromptFile) -> Result<(), StoreError> {
        let mut json =
            serde_json::to_string_pretty(data).map_err(|e| StoreError::Serialize {
                path: self.path.clone(),
                source: e,
            })?;
        json.push('\n');

        std::fs::write(&self.path, json).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rejects_malformed_ids() {
        let mut file = PromptFile::default();
        for id in ["", "has space", "under_score", "슬래시"] {
            let err = file.add(StoredPrompt::new(id, "n", "d", "p")).unwrap_err();
            assert!(matches!(err, StoreError::InvalidId { .. }), "{id}");
        }
        assert!(file.add(StoredPrompt::new("Tutor-2", "n", "d", "p")).is_ok());
    }

    #[test]
    fn add_rejects_duplicates() {
        let mut file = PromptFile::default();
        file.add(StoredPrompt::new("a", "n", "d", "p")).unwrap();
        let err = file.add(StoredPrompt::new("a", "m", "e", "q")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
        assert_eq!(file.prompts.len(), 1);
    }

    #[test]
    fn add_rejects_undeclared_placeholders() {
        let mut file = PromptFile::default();
        let err = file
            .add(StoredPrompt::new("quiz", "Quiz", "d", "Ask about {topic}"))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPrompt(_)));
        assert!(file.prompts.is_empty());
    }

    #[test]
    fn remove_returns_the_prompt() {
        let mut file = PromptFile::defaults();
        let before = file.prompts.len();
        let removed = file.remove("science-tutor").unwrap();
        assert_eq!(removed.id, "science-tutor");
        assert_eq!(file.prompts.len(), before - 1);
        assert!(matches!(
            file.remove("science-tutor"),
            Err(StoreError::UnknownId { .. })
        ));
    }

    #[test]
    fn defaults_all_register() {
        let mut registry = Registry::new();
        let file = PromptFile::defaults();
        let count = file.prompts.len();
        assert_eq!(file.register_into(&mut registry), count);
    }

    #[test]
    fn invalid_entries_are_skipped() {
        let mut registry = Registry::new();
        let file = PromptFile {
            prompts: vec![
                StoredPrompt::new("ok", "ok", "", "plain"),
                StoredPrompt::new("bad", "bad", "", "needs {topic}"),
            ],
        };
        assert_eq!(file.register_into(&mut registry), 1);
        assert!(registry.get_prompt("bad").is_none());
    }

    #[test]
    fn parameters_are_optional_on_disk() {
        let json = r#"{"prompts":[{"id":"a","name":"A","description":"d","prompt":"p"}]}"#;
        let file: PromptFile = serde_json::from_str(json).unwrap();
        assert!(file.prompts[0].parameters.is_empty());

        let written = serde_json::to_string(&file).unwrap();
        assert!(!written.contains("parameters"));
    }
}
