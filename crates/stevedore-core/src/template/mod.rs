//! # Template Module
//!
//! A minimal text templating language for manifests.
//!
//! ## Syntax
//!
//! | Action | Meaning |
//! |--------|---------|
//! | `{{ .A.B }}` | Print a field, addressed from the current dot |
//! | `{{ . }}` / `{{ $.A }}` | Print dot / address from the root |
//! | `{{ if [not] .A }} … {{ else if .B }} … {{ else }} … {{ end }}` | Conditional block |
//! | `{{ range .List }} … {{ else }} … {{ end }}` | Loop; dot is rebound to each item |
//! | `{{/* … */}}` | Comment |
//! | `{{- … -}}` | Trim whitespace before / after the action |
//!
//! Templates can only read data. There are no functions, assignments or
//! calls into the host; the same source and data always produce the same
//! bytes.
//!
//! ## Failure
//!
//! Rendering is all or nothing: a syntax error anywhere in the source, or a
//! reference to a field that does not exist, returns an error and no text.

mod eval;
mod parser;

use crate::primitives::MAX_TEMPLATE_SIZE;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors produced while parsing or rendering a template.
///
/// Line numbers are 1-based and point at the action that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The source exceeds [`MAX_TEMPLATE_SIZE`].
    #[error("template too large: {size} bytes exceeds maximum {max} bytes")]
    TooLarge { size: usize, max: usize },

    /// The source is malformed.
    #[error("template syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A referenced field does not exist in the data.
    #[error("template error at line {line}: missing field {path}")]
    MissingField { line: usize, path: String },

    /// `range` over something that is not a list, map or null.
    #[error("template error at line {line}: cannot range over {path}")]
    NotIterable { line: usize, path: String },

    /// Printing a list or a map.
    #[error("template error at line {line}: cannot print {path}")]
    NotPrintable { line: usize, path: String },

    /// The data could not be turned into a template context.
    #[error("template context error: {0}")]
    Context(String),
}

impl TemplateError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

// =============================================================================
// TEMPLATE
// =============================================================================

/// A parsed template, reusable across renders.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<parser::Node>,
}

impl Template {
    /// Parse a template source.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        if source.len() > MAX_TEMPLATE_SIZE {
            return Err(TemplateError::TooLarge {
                size: source.len(),
                max: MAX_TEMPLATE_SIZE,
            });
        }
        Ok(Self {
            nodes: parser::parse(source)?,
        })
    }

    /// Render against a JSON data tree.
    pub fn render(&self, data: &Value) -> Result<String, TemplateError> {
        eval::evaluate(&self.nodes, data)
    }

    /// Render against any serializable value.
    pub fn render_serialize<T: Serialize>(&self, data: &T) -> Result<String, TemplateError> {
        let value =
            serde_json::to_value(data).map_err(|e| TemplateError::Context(e.to_string()))?;
        self.render(&value)
    }
}

/// Parse and render a template source against a serializable value.
///
/// Struct fields are addressed by their serialized names.
pub fn render<T: Serialize>(source: &str, data: &T) -> Result<String, TemplateError> {
    Template::parse(source)?.render_serialize(data)
}

/// Parse and render a template source against a JSON data tree.
pub fn render_value(source: &str, data: &Value) -> Result<String, TemplateError> {
    Template::parse(source)?.render(data)
}

// =============================================================================
// TESTS
// =============================================================================
