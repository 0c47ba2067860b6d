//! Path templates rendered with Handlebars.
//!
//! Templates use `{{name}}` placeholders. Strict mode is on, so a template that
//! references a variable missing from the context fails instead of rendering an
//! empty segment into a path.

use std::collections::BTreeMap;
use std::path::PathBuf;

use handlebars::Handlebars;

use crate::error::{Result, RunnerError};

/// Variables available to a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    values: BTreeMap<String, String>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a variable
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Renders path and argument templates
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        // Paths must come out verbatim
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Render a template string with the given variables
    pub fn render(&self, template: &str, vars: &TemplateVars) -> Result<String> {
        self.handlebars
            .render_template(template, &vars.values)
            .map_err(|e| RunnerError::Template(format!("Failed to render '{}': {}", template, e)))
    }

    /// Render a template and interpret the result as a path
    pub fn render_path(&self, template: &str, vars: &TemplateVars) -> Result<PathBuf> {
        let rendered = self.render(template, vars)?;
        if rendered.trim().is_empty() {
            return Err(RunnerError::Template(format!("'{}' rendered to an empty path", template)));
        }
        Ok(PathBuf::from(rendered))
    }
}
