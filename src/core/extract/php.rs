//! PHP extraction with tree-sitter-php.
//!
//! Recognized calls: `__('x')`, `$this->t('x')`, `$obj->t('x')`,
//! `Lang::get('x')`. The message argument may be a single- or double-quoted
//! string, a `.` concatenation or a ternary; a double-quoted string with
//! interpolated variables is never a literal.

use tree_sitter::{Language, Node};

use super::{
    Extract, ExtractError, ExtractOptions, MessageOptions, MessageSink, SourceUnit,
    tree::{self, Descend, Handler, node_text},
    value_source::{Numeric, UnresolvableReason, ValueSource},
};
use crate::{core::entry::Reference, utils::LineIndex};

/// Extracts messages from PHP sources.
#[derive(Debug, Clone)]
pub struct PhpDialect {
    options: ExtractOptions,
}

impl PhpDialect {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }
}

impl Extract for PhpDialect {
    fn extract(
        &self,
        unit: &SourceUnit<'_>,
        sink: &mut MessageSink<'_>,
    ) -> Result<(), ExtractError> {
        let language: Language = tree_sitter_php::LANGUAGE_PHP.into();
        let tree = tree::parse(&language, unit)?;
        let lines = LineIndex::new(unit.text, unit.start_line);
        tree::ensure_valid(&tree, unit, &lines)?;

        let mut walker = PhpWalker {
            unit,
            lines,
            options: &self.options,
            sink,
        };
        let table: [(&'static str, Handler<PhpWalker<'_, '_, '_>>); 4] = [
            ("function_call_expression", PhpWalker::handle_call),
            ("member_call_expression", PhpWalker::handle_call),
            ("nullsafe_member_call_expression", PhpWalker::handle_call),
            ("scoped_call_expression", PhpWalker::handle_call),
        ];
        tree::walk(tree.root_node(), &table, &mut walker)
    }
}

/// `'it\'s'` → `it's`
fn decode_single_quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && (next == '\\' || next == '\'')
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

/// `"a\tb\x41\101"` → `a<TAB>bAA`; unknown escapes stay as written.
///
/// `\x` and octal escapes produce raw bytes, so `None` when the result is
/// not UTF-8.
fn decode_double_quoted(raw: &str) -> Option<String> {
    let mut out: Vec<u8> = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut buf = [0u8; 4];
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let byte = match chars.peek().copied() {
            Some('n') => b'\n',
            Some('t') => b'\t',
            Some('r') => b'\r',
            Some('v') => 0x0B,
            Some('e') => 0x1B,
            Some('f') => 0x0C,
            Some('\\') => b'\\',
            Some('$') => b'$',
            Some('"') => b'"',
            Some('x') => {
                chars.next();
                let mut digits = String::new();
                while digits.len() < 2
                    && let Some(&d) = chars.peek()
                    && d.is_ascii_hexdigit()
                {
                    digits.push(d);
                    chars.next();
                }
                match u8::from_str_radix(&digits, 16) {
                    Ok(byte) => out.push(byte),
                    Err(_) => out.extend_from_slice(b"\\x"),
                }
                continue;
            }
            Some('0'..='7') => {
                let mut value: u32 = 0;
                let mut taken = 0;
                while taken < 3
                    && let Some(d) = chars.peek().and_then(|d| d.to_digit(8))
                {
                    value = value * 8 + d;
                    taken += 1;
                    chars.next();
                }
                // "\400" wraps to "\000"
                out.push((value & 0xFF) as u8);
                continue;
            }
            Some('u') => {
                let rest: String = chars.clone().collect();
                if let Some(end) = rest.find('}')
                    && rest.starts_with("u{")
                    && let Ok(code) = u32::from_str_radix(&rest[2..end], 16)
                    && let Some(decoded) = char::from_u32(code)
                {
                    out.extend_from_slice(decoded.encode_utf8(&mut buf).as_bytes());
                    for _ in 0..=end {
                        chars.next();
                    }
                } else {
                    out.push(b'\\');
                }
                continue;
            }
            _ => {
                out.push(b'\\');
                continue;
            }
        };
        out.push(byte);
        chars.next();
    }
    String::from_utf8(out).ok()
}

/// Text between the quotes of a string node, ignoring a binary `b` prefix.
fn string_body<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    let text = node_text(node, source);
    let text = text.strip_prefix(['b', 'B']).unwrap_or(text);
    text.get(1..text.len().saturating_sub(1)).unwrap_or_default()
}

fn analyze(node: Node<'_>, source: &str) -> ValueSource {
    match node.kind() {
        "string" => ValueSource::Literal(decode_single_quoted(string_body(node, source))),

        "encapsed_string" => {
            let mut cursor = node.walk();
            let interpolated = node
                .named_children(&mut cursor)
                .any(|c| !matches!(c.kind(), "string_content" | "escape_sequence"));
            if interpolated {
                return ValueSource::Unresolvable(UnresolvableReason::Interpolation);
            }
            match decode_double_quoted(string_body(node, source)) {
                Some(text) => ValueSource::Literal(text),
                None => ValueSource::Unresolvable(UnresolvableReason::InvalidUtf8),
            }
        }

        "parenthesized_expression" => match node.named_child(0) {
            Some(inner) => analyze(inner, source),
            None => ValueSource::unsupported("parenthesized_expression"),
        },

        "binary_expression" => {
            let operator = node.child_by_field_name("operator").map(|op| op.kind());
            match (
                operator,
                node.child_by_field_name("left"),
                node.child_by_field_name("right"),
            ) {
                (Some("."), Some(left), Some(right)) => {
                    ValueSource::concat(analyze(left, source), analyze(right, source))
                }
                _ => ValueSource::unsupported("binary_expression"),
            }
        }

        "conditional_expression" => match (
            node.child_by_field_name("body"),
            node.child_by_field_name("alternative"),
        ) {
            (Some(body), Some(alternative)) => {
                ValueSource::conditional(analyze(body, source), analyze(alternative, source))
            }
            _ => ValueSource::unsupported("short ternary"),
        },

        "variable_name" => {
            ValueSource::Unresolvable(UnresolvableReason::Identifier(node_text(node, source).to_string()))
        }
        "member_access_expression"
        | "nullsafe_member_access_expression"
        | "class_constant_access_expression"
        | "subscript_expression" => ValueSource::Unresolvable(UnresolvableReason::MemberAccess),
        "function_call_expression"
        | "member_call_expression"
        | "nullsafe_member_call_expression"
        | "scoped_call_expression" => ValueSource::Unresolvable(UnresolvableReason::Call),

        other => ValueSource::unsupported(other),
    }
}

fn numeric(node: Node<'_>) -> Numeric {
    match node.kind() {
        "integer" | "float" => Numeric::Certain,
        "string" | "encapsed_string" | "heredoc" | "nowdoc" => Numeric::Never,
        "parenthesized_expression" => node.named_child(0).map_or(Numeric::Unknown, numeric),
        "unary_op_expression" => match node.child_by_field_name("operator").map(|op| op.kind()) {
            Some("-") | Some("+") => Numeric::Certain,
            _ => Numeric::Unknown,
        },
        "binary_expression" => match node.child_by_field_name("operator").map(|op| op.kind()) {
            Some(".") => Numeric::Never,
            Some("+") | Some("-") | Some("*") | Some("/") | Some("%") | Some("**") => {
                Numeric::Certain
            }
            _ => Numeric::Unknown,
        },
        "conditional_expression" => match (
            node.child_by_field_name("body"),
            node.child_by_field_name("alternative"),
        ) {
            (Some(body), Some(alternative)) => numeric(body).either(numeric(alternative)),
            _ => Numeric::Unknown,
        },
        _ => Numeric::Unknown,
    }
}

/// Dotted callee text: `__`, `this.t`, `obj.t`, `Lang.get`.
fn callee_path(node: Node<'_>, source: &str) -> Option<String> {
    let name_of = |field: &str| {
        node.child_by_field_name(field)
            .filter(|n| matches!(n.kind(), "name" | "qualified_name"))
            .map(|n| node_text(n, source).trim_start_matches('\\').to_string())
    };

    match node.kind() {
        "function_call_expression" => name_of("function"),
        "member_call_expression" | "nullsafe_member_call_expression" => {
            let object = node.child_by_field_name("object")?;
            if object.kind() != "variable_name" {
                return None;
            }
            let object = node_text(object, source).trim_start_matches('$');
            Some(format!("{}.{}", object, name_of("name")?))
        }
        "scoped_call_expression" => Some(format!("{}.{}", name_of("scope")?, name_of("name")?)),
        _ => None,
    }
}

/// Argument expressions in order, without named-argument labels.
fn call_arguments<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let Some(arguments) = node.child_by_field_name("arguments") else {
        return Vec::new();
    };
    let mut cursor = arguments.walk();
    arguments
        .named_children(&mut cursor)
        .filter(|arg| arg.kind() == "argument")
        .filter_map(|arg| {
            let label = arg.child_by_field_name("name").map(|n| n.id());
            let mut cursor = arg.walk();
            arg.named_children(&mut cursor)
                .filter(|c| Some(c.id()) != label && c.kind() != "reference_modifier")
                .last()
        })
        .collect()
}

struct PhpWalker<'a, 'u, 's> {
    unit: &'a SourceUnit<'u>,
    lines: LineIndex,
    options: &'a ExtractOptions,
    sink: &'a mut MessageSink<'s>,
}

impl PhpWalker<'_, '_, '_> {
    fn handle_call(&mut self, node: Node<'_>) -> Result<Descend, ExtractError> {
        let source = self.unit.text;
        let Some(path) = callee_path(node, source) else {
            return Ok(Descend::Children);
        };
        let keywords: Vec<_> = self.options.keywords_for(&path).cloned().collect();
        if keywords.is_empty() {
            return Ok(Descend::Children);
        }

        let args = call_arguments(node);
        let line = self.lines.line_of(node.start_byte());
        for keyword in keywords {
            let Some(arg) = args.get(keyword.key_arg) else {
                continue;
            };
            let candidates = match analyze(*arg, source).resolve() {
                Ok(candidates) => candidates,
                Err(reason) => {
                    self.sink
                        .skip(self.unit.filename, line, node_text(node, source), reason);
                    continue;
                }
            };

            let is_plural = keyword
                .plural_arg
                .is_some_and(|pos| args.get(pos).is_some_and(|a| numeric(*a).is_plural()));
            for text in candidates {
                let options = MessageOptions {
                    is_plural,
                    ..Default::default()
                };
                self.sink
                    .add_message(Reference::at_line(self.unit.filename, line), &text, options)
                    .map_err(|source| ExtractError::Entry {
                        file: self.unit.filename.to_string(),
                        line,
                        source,
                    })?;
            }
        }
        Ok(Descend::Children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single_quoted() {
        assert_eq!(decode_single_quoted(r"it\'s a \\ path \n"), r"it's a \ path \n");
    }

    #[test]
    fn test_decode_double_quoted() {
        let decode = |raw: &str| decode_double_quoted(raw).unwrap();
        assert_eq!(decode(r#"a\tb\x41\"\$"#), "a\tbA\"$");
        assert_eq!(decode(r"\u{263A}"), "\u{263A}");
        assert_eq!(decode(r"\q"), r"\q");
    }

    #[test]
    fn test_decode_double_quoted_octal_and_bytes() {
        assert_eq!(decode_double_quoted(r"\101\60x\0").as_deref(), Some("A0x\0"));
        assert_eq!(decode_double_quoted(r"\7").as_deref(), Some("\u{7}"));
        // UTF-8 spelled out byte by byte
        assert_eq!(decode_double_quoted(r"caf\xc3\xa9").as_deref(), Some("café"));
        assert_eq!(decode_double_quoted(r"caf\303\251").as_deref(), Some("café"));
        assert_eq!(decode_double_quoted(r"\xff"), None);
        assert_eq!(decode_double_quoted(r"\351"), None);
    }
}
