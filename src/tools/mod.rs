//! Built-in tool catalog.
//!
//! | Tool                        | Purpose                               |
//! |-----------------------------|---------------------------------------|
//! | `search_learning_materials` | Look up subjects and topics           |
//! | `track_student_progress`    | Record a student's progress on a topic|
//! | `get_student_progress`      | Read recorded progress back           |
//! | `calculate`                 | Evaluate an arithmetic expression     |
//! | `summarize_text`            | Shorten text to a length limit        |
//!
//! Plus the `learning-materials` resource.

pub mod calculator;
pub mod summarizer;
pub mod tutor;

use std::sync::Arc;

use crate::error::RegistryError;
use crate::registry::Registry;

pub use calculator::{evaluate, CalcError, Calculator};
pub use summarizer::Summarizer;
pub use tutor::{GetProgress, ProgressBook, ProgressEntry, SearchMaterials, TrackProgress};

/// Registers every built-in tool and resource.
///
/// The progress tools share one fresh [`ProgressBook`], which is returned so
/// callers can inspect it.
///
/// # Errors
///
/// Returns an error if a tool's schema is inconsistent.
pub fn register_builtin(registry: &mut Registry) -> Result<Arc<ProgressBook>, RegistryError> {
    let book = Arc::new(ProgressBook::default());

    registry.register_tool(SearchMaterials::new())?;
    registry.register_tool(TrackProgress::new(Arc::clone(&book)))?;
    registry.register_tool(GetProgress::new(Arc::clone(&book)))?;
    registry.register_tool(Calculator::new())?;
    registry.register_tool(Summarizer::new())?;
    registry.register_resource(tutor::materials_resource());

    Ok(book)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_catalog_in_order() {
        let mut registry = Registry::new();
        register_builtin(&mut registry).unwrap();

        let names: Vec<_> = registry.list_tools().map(|t| t.name().to_string()).collect();
        assert_eq!(
            names,
            [
                "search_learning_materials",
                "track_student_progress",
                "get_student_progress",
                "calculate",
                "summarize_text",
            ]
        );
        assert!(registry.get_resource("learning-materials").is_some());
    }
}
