//! Capability registry: prompts, tools and resources by key.
//!
//! The registry is filled once at start-up and handed to the
//! [`Dispatcher`](crate::mcp::Dispatcher), which only reads it. It holds
//! three independent stores; listing follows registration order, and
//! re-registering a key replaces the entry in place (last write wins).

pub mod prompt;
pub mod resource;
pub mod schema;
pub mod tool;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::RegistryError;

pub use prompt::Prompt;
pub use resource::{Resource, ResourceContent};
pub use schema::{ParamSpec, ParamType, SchemaError, ToolSchema, ValidatedArgs};
pub use tool::{Tool, ToolError};

/// Named, typed stores of prompts, tools and resources.
#[derive(Debug, Default)]
pub struct Registry {
    prompts: IndexMap<String, Prompt>,
    tools: IndexMap<String, Arc<dyn Tool>>,
    resources: IndexMap<String, Resource>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a prompt under its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the template references an undeclared placeholder
    /// or a parameter default is invalid. Overwriting an existing id is not
    /// an error.
    pub fn register_prompt(&mut self, prompt: Prompt) -> Result<(), RegistryError> {
        prompt.validate()?;
        if self.prompts.contains_key(&prompt.id) {
            tracing::debug!(prompt = %prompt.id, "Replacing registered prompt");
        } else {
            tracing::info!(prompt = %prompt.id, "Registered prompt");
        }
        self.prompts.insert(prompt.id.clone(), prompt);
        Ok(())
    }

    /// Registers a tool under its name.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool's schema is inconsistent. Overwriting an
    /// existing name is not an error.
    pub fn register_tool<T: Tool + 'static>(&mut self, tool: T) -> Result<(), RegistryError> {
        self.register_shared_tool(Arc::new(tool))
    }

    /// Registers an already shared tool under its name.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::register_tool`].
    pub fn register_shared_tool(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        tool.schema().check_declaration(tool.name())?;
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            tracing::debug!(tool = %name, "Replacing registered tool");
        } else {
            tracing::info!(tool = %name, "Registered tool");
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Registers a resource under its id.
    pub fn register_resource(&mut self, resource: Resource) {
        if self.resources.contains_key(&resource.id) {
            tracing::debug!(resource = %resource.id, "Replacing registered resource");
        } else {
            tracing::info!(resource = %resource.id, "Registered resource");
        }
        self.resources.insert(resource.id.clone(), resource);
    }

    /// Looks up a prompt by id.
    #[must_use]
    pub fn get_prompt(&self, id: &str) -> Option<&Prompt> {
        self.prompts.get(id)
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Looks up a resource by id.
    #[must_use]
    pub fn get_resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Prompts in registration order.
    pub fn list_prompts(&self) -> impl Iterator<Item = &Prompt> {
        self.prompts.values()
    }

    /// Tools in registration order.
    pub fn list_tools(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }

    /// Resources in registration order.
    pub fn list_resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Number of registered prompts.
    #[must_use]
    pub fn prompt_count(&self) -> usize {
        self.prompts.len()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Number of registered resources.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    struct Echo {
        name: &'static str,
        schema: ToolSchema,
    }

    impl Echo {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                schema: ToolSchema::new().optional("text", ParamSpec::string("Text")),
            }
        }
    }

    impl Tool for Echo {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Echoes its arguments"
        }

        fn schema(&self) -> &ToolSchema {
            &self.schema
        }

        fn execute(&self, args: &ValidatedArgs) -> Result<Value, ToolError> {
            Ok(Value::Object(args.as_map().clone()))
        }
    }

    #[test]
    fn lists_follow_registration_order() {
        let mut registry = Registry::new();
        for id in ["zeta", "alpha", "mid"] {
            registry
                .register_prompt(Prompt::new(id, id, "", "body"))
                .unwrap();
        }
        let ids: Vec<&str> = registry.list_prompts().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn overwrite_replaces_in_place() {
        let mut registry = Registry::new();
        registry.register_prompt(Prompt::new("a", "first", "", "1")).unwrap();
        registry.register_prompt(Prompt::new("b", "b", "", "2")).unwrap();
        registry.register_prompt(Prompt::new("a", "second", "", "3")).unwrap();

        assert_eq!(registry.prompt_count(), 2);
        assert_eq!(registry.get_prompt("a").unwrap().name, "second");
        let ids: Vec<&str> = registry.list_prompts().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn stores_are_independent() {
        let mut registry = Registry::new();
        registry.register_prompt(Prompt::new("shared", "p", "", "")).unwrap();
        registry.register_tool(Echo::new("shared")).unwrap();
        registry.register_resource(Resource::text("shared", "text", "r"));

        assert!(registry.get_prompt("shared").is_some());
        assert!(registry.get_tool("shared").is_some());
        assert!(registry.get_resource("shared").is_some());
        assert!(registry.get_tool("missing").is_none());
    }

    #[test]
    fn rejects_prompt_with_undeclared_placeholder() {
        let mut registry = Registry::new();
        let err = registry
            .register_prompt(Prompt::new("p", "p", "", "Hello {who}"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UndeclaredPlaceholder { .. }));
        assert_eq!(registry.prompt_count(), 0);
    }

    #[test]
    fn registered_tool_executes() {
        let mut registry = Registry::new();
        registry.register_tool(Echo::new("echo")).unwrap();

        let tool = registry.get_tool("echo").unwrap();
        let args = tool.schema().validate(Some(&json!({"text": "hi"}))).unwrap();
        assert_eq!(tool.execute(&args).unwrap(), json!({"text": "hi"}));
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
