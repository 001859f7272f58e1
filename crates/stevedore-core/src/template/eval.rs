//! Evaluation of a parsed node tree against a JSON data tree.

use super::TemplateError;
use super::parser::{Anchor, FieldPath, Node};
use serde_json::Value;

/// The data visible to an action: the root and the current dot.
#[derive(Clone, Copy)]
struct Scope<'a> {
    root: &'a Value,
    dot: &'a Value,
}

impl<'a> Scope<'a> {
    fn lookup(&self, path: &FieldPath, line: usize) -> Result<&'a Value, TemplateError> {
        let mut current = match path.anchor {
            Anchor::Dot => self.dot,
            Anchor::Root => self.root,
        };
        for segment in &path.segments {
            current = current
                .as_object()
                .and_then(|fields| fields.get(segment))
                .ok_or_else(|| TemplateError::MissingField {
                    line,
                    path: path.to_string(),
                })?;
        }
        Ok(current)
    }

    fn with_dot(&self, dot: &'a Value) -> Self {
        Self {
            root: self.root,
            dot,
        }
    }
}

/// Template truthiness.
///
/// False for null, `false`, integer zero, and empty strings, lists and maps.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_u64() != Some(0) && n.as_i64() != Some(0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn print(value: &Value, path: &FieldPath, line: usize, out: &mut String) -> Result<(), TemplateError> {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(s),
        Value::Array(_) | Value::Object(_) => {
            return Err(TemplateError::NotPrintable {
                line,
                path: path.to_string(),
            });
        }
    }
    Ok(())
}

fn eval_nodes(nodes: &[Node], scope: Scope<'_>, out: &mut String) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Print { path, line } => {
                let value = scope.lookup(path, *line)?;
                print(value, path, *line, out)?;
            }
            Node::If {
                branches,
                otherwise,
            } => {
                let mut taken = None;
                for branch in branches {
                    let condition = &branch.condition;
                    let value = scope.lookup(&condition.path, condition.line)?;
                    if is_truthy(value) != condition.negate {
                        taken = Some(&branch.body);
                        break;
                    }
                }
                eval_nodes(taken.unwrap_or(otherwise), scope, out)?;
            }
            Node::Range {
                path,
                line,
                body,
                otherwise,
            } => {
                let items: Vec<&Value> = match scope.lookup(path, *line)? {
                    Value::Null => Vec::new(),
                    Value::Array(items) => items.iter().collect(),
                    Value::Object(fields) => fields.values().collect(),
                    _ => {
                        return Err(TemplateError::NotIterable {
                            line: *line,
                            path: path.to_string(),
                        });
                    }
                };
                if items.is_empty() {
                    eval_nodes(otherwise, scope, out)?;
                }
                for item in items {
                    eval_nodes(body, scope.with_dot(item), out)?;
                }
            }
        }
    }
    Ok(())
}

/// Evaluate a node tree. Returns the full output or the first error.
pub(crate) fn evaluate(nodes: &[Node], data: &Value) -> Result<String, TemplateError> {
    let mut out = String::new();
    eval_nodes(
        nodes,
        Scope {
            root: data,
            dot: data,
        },
        &mut out,
    )?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_rules() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));

        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!(["x"])));
    }
}
