//! Lexing and parsing of template sources into a node tree.
//!
//! The whole source is parsed up front, so syntax errors surface even inside
//! branches that would never be evaluated.

use super::TemplateError;
use crate::primitives::MAX_BLOCK_DEPTH;

// =============================================================================
// FIELD PATHS
// =============================================================================

/// Where a field path starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    /// `.` - the current dot (rebound inside `range`).
    Dot,
    /// `$` - the root of the data.
    Root,
}

/// A dotted field reference such as `.Spec.Replicas` or `$.Namespace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldPath {
    pub anchor: Anchor,
    pub segments: Vec<String>,
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let anchor = match self.anchor {
            Anchor::Dot => "",
            Anchor::Root => "$",
        };
        if self.segments.is_empty() {
            return f.write_str(if anchor.is_empty() { "." } else { anchor });
        }
        f.write_str(anchor)?;
        for segment in &self.segments {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_path(word: &str, line: usize) -> Result<FieldPath, TemplateError> {
    let (anchor, rest) = if let Some(rest) = word.strip_prefix('$') {
        (Anchor::Root, rest)
    } else if word.starts_with('.') {
        (Anchor::Dot, word)
    } else if is_identifier(word) {
        return Err(TemplateError::syntax(
            line,
            format!("unknown keyword '{}'", word),
        ));
    } else {
        return Err(TemplateError::syntax(
            line,
            format!("invalid field reference '{}'", word),
        ));
    };

    // "." and "$" on their own
    if rest.is_empty() || (anchor == Anchor::Dot && rest == ".") {
        return Ok(FieldPath {
            anchor,
            segments: Vec::new(),
        });
    }

    let Some(dotted) = rest.strip_prefix('.') else {
        return Err(TemplateError::syntax(
            line,
            format!("invalid field reference '{}'", word),
        ));
    };

    let mut segments = Vec::new();
    for segment in dotted.split('.') {
        if !is_identifier(segment) {
            return Err(TemplateError::syntax(
                line,
                format!("invalid field reference '{}'", word),
            ));
        }
        segments.push(segment.to_string());
    }
    Ok(FieldPath { anchor, segments })
}

// =============================================================================
// LEXER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Action { body: String, line: usize },
}

fn push_text(tokens: &mut Vec<Token>, text: &str) {
    if !text.is_empty() {
        tokens.push(Token::Text(text.to_string()));
    }
}

// Trim markers strip ASCII whitespace only; other Unicode spaces are text.
fn trim_ascii_start(text: &str) -> &str {
    text.trim_start_matches(|c: char| c.is_ascii_whitespace())
}

fn trim_ascii_end(text: &str) -> &str {
    text.trim_end_matches(|c: char| c.is_ascii_whitespace())
}

fn lex(source: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut line = 1usize;
    let mut trim_next = false;

    while let Some(start) = rest.find("{{") {
        let raw_text = &rest[..start];
        let after_open = &rest[start + 2..];
        let left_trim = after_open.starts_with('-')
            && after_open[1..].starts_with(|c: char| c.is_ascii_whitespace());

        let mut text = raw_text;
        if trim_next {
            text = trim_ascii_start(text);
        }
        if left_trim {
            text = trim_ascii_end(text);
        }
        push_text(&mut tokens, text);
        line += raw_text.matches('\n').count();
        let action_line = line;

        let inner = if left_trim { &after_open[1..] } else { after_open };

        // Comments may contain "}}", so look for the comment close first.
        let search_from = if inner.trim_start().starts_with("/*") {
            match inner.find("*/") {
                Some(end) => end + 2,
                None => return Err(TemplateError::syntax(action_line, "unclosed comment")),
            }
        } else {
            0
        };
        let Some(close) = inner[search_from..].find("}}").map(|i| i + search_from) else {
            return Err(TemplateError::syntax(action_line, "unclosed action"));
        };

        let mut body = &inner[..close];
        let right_trim = body.ends_with('-')
            && body[..body.len() - 1].ends_with(|c: char| c.is_ascii_whitespace());
        if right_trim {
            body = &body[..body.len() - 1];
        }

        line += inner[..close].matches('\n').count();
        rest = &inner[close + 2..];
        trim_next = right_trim;

        let body = body.trim();
        if body.starts_with("/*") {
            if !body.ends_with("*/") {
                return Err(TemplateError::syntax(
                    action_line,
                    "text after comment close",
                ));
            }
            continue;
        }
        if body.is_empty() {
            return Err(TemplateError::syntax(action_line, "empty action"));
        }
        tokens.push(Token::Action {
            body: body.to_string(),
            line: action_line,
        });
    }

    let tail = if trim_next { trim_ascii_start(rest) } else { rest };
    push_text(&mut tokens, tail);
    Ok(tokens)
}

// =============================================================================
// NODE TREE
// =============================================================================

/// Guard of an `if` / `else if` branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Condition {
    pub negate: bool,
    pub path: FieldPath,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Branch {
    pub condition: Condition,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Text(String),
    Print {
        path: FieldPath,
        line: usize,
    },
    If {
        branches: Vec<Branch>,
        otherwise: Vec<Node>,
    },
    Range {
        path: FieldPath,
        line: usize,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

enum Directive {
    Print(FieldPath),
    If(Condition),
    ElseIf(Condition),
    Else,
    End,
    Range(FieldPath),
}

fn parse_condition(words: &[&str], line: usize) -> Result<Condition, TemplateError> {
    match words {
        [path] => Ok(Condition {
            negate: false,
            path: parse_path(path, line)?,
            line,
        }),
        ["not", path] => Ok(Condition {
            negate: true,
            path: parse_path(path, line)?,
            line,
        }),
        [] => Err(TemplateError::syntax(line, "missing condition")),
        _ => Err(TemplateError::syntax(
            line,
            format!("unsupported condition '{}'", words.join(" ")),
        )),
    }
}

fn parse_directive(body: &str, line: usize) -> Result<Directive, TemplateError> {
    let words: Vec<&str> = body.split_whitespace().collect();
    match words.as_slice() {
        ["end"] => Ok(Directive::End),
        ["else"] => Ok(Directive::Else),
        ["else", "if", rest @ ..] => Ok(Directive::ElseIf(parse_condition(rest, line)?)),
        ["if", rest @ ..] => Ok(Directive::If(parse_condition(rest, line)?)),
        ["range", path] => Ok(Directive::Range(parse_path(path, line)?)),
        ["range", ..] => Err(TemplateError::syntax(line, "range takes exactly one field")),
        [word] => Ok(Directive::Print(parse_path(word, line)?)),
        _ => Err(TemplateError::syntax(
            line,
            format!("unexpected '{}'", body),
        )),
    }
}

/// How a node list ended.
enum Terminator {
    Eof,
    Else { line: usize },
    ElseIf(Condition),
    End { line: usize },
}

struct Parser {
    tokens: std::vec::IntoIter<Token>,
}

impl Parser {
    fn parse_list(&mut self, depth: usize) -> Result<(Vec<Node>, Terminator), TemplateError> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.next() {
            let (body, line) = match token {
                Token::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Token::Action { body, line } => (body, line),
            };

            match parse_directive(&body, line)? {
                Directive::Print(path) => nodes.push(Node::Print { path, line }),
                Directive::If(condition) => nodes.push(self.parse_if(condition, depth + 1)?),
                Directive::Range(path) => nodes.push(self.parse_range(path, line, depth + 1)?),
                Directive::Else => return Ok((nodes, Terminator::Else { line })),
                Directive::ElseIf(condition) => return Ok((nodes, Terminator::ElseIf(condition))),
                Directive::End => return Ok((nodes, Terminator::End { line })),
            }
        }

        Ok((nodes, Terminator::Eof))
    }

    fn check_depth(depth: usize, line: usize) -> Result<(), TemplateError> {
        if depth > MAX_BLOCK_DEPTH {
            return Err(TemplateError::syntax(
                line,
                format!("blocks nested deeper than {}", MAX_BLOCK_DEPTH),
            ));
        }
        Ok(())
    }

    fn parse_if(&mut self, first: Condition, depth: usize) -> Result<Node, TemplateError> {
        let opened_at = first.line;
        Self::check_depth(depth, opened_at)?;

        let mut branches = Vec::new();
        let mut condition = first;
        loop {
            let (body, terminator) = self.parse_list(depth)?;
            branches.push(Branch { condition, body });
            match terminator {
                Terminator::ElseIf(next) => condition = next,
                Terminator::End { .. } => {
                    return Ok(Node::If {
                        branches,
                        otherwise: Vec::new(),
                    });
                }
                Terminator::Else { .. } => {
                    let otherwise = self.parse_final_else(depth, opened_at, "if")?;
                    return Ok(Node::If {
                        branches,
                        otherwise,
                    });
                }
                Terminator::Eof => {
                    return Err(TemplateError::syntax(opened_at, "unclosed if"));
                }
            }
        }
    }

    fn parse_range(
        &mut self,
        path: FieldPath,
        line: usize,
        depth: usize,
    ) -> Result<Node, TemplateError> {
        Self::check_depth(depth, line)?;

        let (body, terminator) = self.parse_list(depth)?;
        let otherwise = match terminator {
            Terminator::End { .. } => Vec::new(),
            Terminator::Else { .. } => self.parse_final_else(depth, line, "range")?,
            Terminator::ElseIf(condition) => {
                return Err(TemplateError::syntax(
                    condition.line,
                    "else if inside range",
                ));
            }
            Terminator::Eof => return Err(TemplateError::syntax(line, "unclosed range")),
        };
        Ok(Node::Range {
            path,
            line,
            body,
            otherwise,
        })
    }

    /// Parse the block after a final `else`, which must end with `end`.
    fn parse_final_else(
        &mut self,
        depth: usize,
        opened_at: usize,
        block: &str,
    ) -> Result<Vec<Node>, TemplateError> {
        let (otherwise, terminator) = self.parse_list(depth)?;
        match terminator {
            Terminator::End { .. } => Ok(otherwise),
            Terminator::Else { line } => {
                Err(TemplateError::syntax(line, format!("second else in {}", block)))
            }
            Terminator::ElseIf(condition) => Err(TemplateError::syntax(
                condition.line,
                format!("else if after else in {}", block),
            )),
            Terminator::Eof => Err(TemplateError::syntax(
                opened_at,
                format!("unclosed {}", block),
            )),
        }
    }
}

/// Parse a template source into its node tree.
pub(crate) fn parse(source: &str) -> Result<Vec<Node>, TemplateError> {
    let tokens = lex(source)?;
    let mut parser = Parser {
        tokens: tokens.into_iter(),
    };

    let (nodes, terminator) = parser.parse_list(0)?;
    match terminator {
        Terminator::Eof => Ok(nodes),
        Terminator::End { line } => Err(TemplateError::syntax(line, "unexpected end")),
        Terminator::Else { line } => Err(TemplateError::syntax(line, "unexpected else")),
        Terminator::ElseIf(condition) => {
            Err(TemplateError::syntax(condition.line, "unexpected else if"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax_line(result: Result<Vec<Node>, TemplateError>) -> usize {
        match result {
            Err(TemplateError::Syntax { line, .. }) => line,
            other => unreachable!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn plain_text_is_single_node() {
        let nodes = parse("kind: Namespace\n").expect("parse");
        assert_eq!(nodes, vec![Node::Text("kind: Namespace\n".to_string())]);
    }

    #[test]
    fn field_paths_parse() {
        assert_eq!(parse_path(".", 1).expect("dot").to_string(), ".");
        assert_eq!(parse_path("$", 1).expect("root").to_string(), "$");
        assert_eq!(parse_path(".A.B", 1).expect("a.b").to_string(), ".A.B");
        assert_eq!(parse_path("$.Name", 1).expect("root").anchor, Anchor::Root);
    }

    #[test]
    fn invalid_paths_rejected() {
        assert!(parse_path(".A..B", 1).is_err());
        assert!(parse_path(".1x", 1).is_err());
        assert!(parse_path("$x", 1).is_err());
        assert!(parse_path("with", 1).is_err());
    }

    #[test]
    fn trim_markers_remove_whitespace() {
        let nodes = parse("a  \n{{- .X -}}\n  b").expect("parse");
        assert_eq!(nodes.first(), Some(&Node::Text("a".to_string())));
        assert_eq!(nodes.last(), Some(&Node::Text("b".to_string())));
    }

    #[test]
    fn trim_markers_keep_non_ascii_spaces() {
        let nodes = parse("a\u{00a0}\n{{- .X -}}\n\u{2003}b").expect("parse");
        assert_eq!(nodes.first(), Some(&Node::Text("a\u{00a0}".to_string())));
        assert_eq!(nodes.last(), Some(&Node::Text("\u{2003}b".to_string())));
    }

    #[test]
    fn comments_produce_nothing() {
        let nodes = parse("a{{/* }} inside */}}b").expect("parse");
        assert_eq!(
            nodes,
            vec![Node::Text("a".to_string()), Node::Text("b".to_string())]
        );
    }

    #[test]
    fn unclosed_action_reports_line() {
        assert_eq!(syntax_line(parse("one\ntwo {{ .X")), 2);
    }

    #[test]
    fn unclosed_if_reports_opening_line() {
        assert_eq!(syntax_line(parse("\n\n{{ if .X }}\nbody\n")), 3);
    }

    #[test]
    fn stray_end_rejected() {
        assert_eq!(syntax_line(parse("a\n{{ end }}")), 2);
    }

    #[test]
    fn second_else_rejected() {
        assert!(parse("{{if .A}}a{{else}}b{{else}}c{{end}}").is_err());
    }

    #[test]
    fn else_if_chain_parses() {
        let nodes = parse("{{if .A}}a{{else if not .B}}b{{else}}c{{end}}").expect("parse");
        match nodes.as_slice() {
            [Node::If { branches, otherwise }] => {
                assert_eq!(branches.len(), 2);
                assert!(branches[1].condition.negate);
                assert_eq!(otherwise, &vec![Node::Text("c".to_string())]);
            }
            other => unreachable!("unexpected nodes {:?}", other),
        }
    }

    #[test]
    fn empty_action_rejected() {
        assert!(parse("{{ }}").is_err());
    }

    #[test]
    fn nesting_is_bounded() {
        let depth = MAX_BLOCK_DEPTH + 1;
        let source = format!("{}x{}", "{{if .A}}".repeat(depth), "{{end}}".repeat(depth));
        assert!(parse(&source).is_err());

        let ok = format!(
            "{}x{}",
            "{{if .A}}".repeat(MAX_BLOCK_DEPTH),
            "{{end}}".repeat(MAX_BLOCK_DEPTH)
        );
        assert!(parse(&ok).is_ok());
    }
}
