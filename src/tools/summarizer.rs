//! Length-bounded text summariser.

use serde_json::{json, Value};

use crate::registry::{ParamSpec, Tool, ToolError, ToolSchema, ValidatedArgs};

const ELLIPSIS: &str = "...";

/// `summarize_text`: shortens text to at most `max_length` characters.
///
/// Text that already fits is returned unchanged. Longer text is cut on a
/// character boundary and ends with `...`, counted within the limit.
pub struct Summarizer {
    schema: ToolSchema,
}

impl Summarizer {
    /// Creates the tool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: ToolSchema::new()
                .required("text", ParamSpec::string("Text to summarise"))
                .optional(
                    "max_length",
                    ParamSpec::integer("Maximum summary length in characters").with_default(100),
                ),
        }
    }
}

impl Default for Summarizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for Summarizer {
    fn name(&self) -> &str {
        "summarize_text"
    }

    fn description(&self) -> &str {
        "Summarise text to a maximum length"
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn execute(&self, args: &ValidatedArgs) -> Result<Value, ToolError> {
        let text = args.require_str("text")?;
        let max_length = args
            .i64("max_length")
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > ELLIPSIS.len())
            .ok_or_else(|| {
                ToolError::InvalidArguments(format!(
                    "max_length must be greater than {}",
                    ELLIPSIS.len()
                ))
            })?;

        let length = text.chars().count();
        let (summary, truncated) = if length <= max_length {
            (text.to_string(), false)
        } else {
            let kept: String = text.chars().take(max_length - ELLIPSIS.len()).collect();
            (format!("{kept}{ELLIPSIS}"), true)
        };

        Ok(json!({
            "summary": summary,
            "truncated": truncated,
            "original_length": length,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(arguments: &Value) -> Result<Value, ToolError> {
        let tool = Summarizer::new();
        let args = tool.schema().validate(Some(arguments)).unwrap();
        tool.execute(&args)
    }

    #[test]
    fn short_text_is_unchanged() {
        let result = run(&json!({"text": "short"})).unwrap();
        assert_eq!(result["summary"], "short");
        assert_eq!(result["truncated"], false);
    }

    #[test]
    fn long_text_is_cut_with_ellipsis() {
        let result = run(&json!({"text": "abcdefghij", "max_length": 8})).unwrap();
        assert_eq!(result["summary"], "abcde...");
        assert_eq!(result["truncated"], true);
        assert_eq!(result["original_length"], 10);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let result = run(&json!({"text": "가나다라마바사아", "max_length": 6})).unwrap();
        assert_eq!(result["summary"], "가나다...");
    }

    #[test]
    fn default_length_applies() {
        let text = "x".repeat(150);
        let result = run(&json!({ "text": text })).unwrap();
        assert_eq!(result["summary"].as_str().unwrap().chars().count(), 100);
    }

    #[test]
    fn rejects_tiny_or_negative_limits() {
        assert!(matches!(
            run(&json!({"text": "abc", "max_length": 3})),
            Err(ToolError::InvalidArguments(_))
        ));
        assert!(matches!(
            run(&json!({"text": "abc", "max_length": -5})),
            Err(ToolError::InvalidArguments(_))
        ));
    }
}
