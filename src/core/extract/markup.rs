//! HTML and Vue template extraction with tree-sitter-html.
//!
//! Messages come from:
//!
//! - inner text of elements named in `tagNames` or carrying an `attrNames` attribute
//! - values of `valueAttrNames` attributes
//! - a property path inside `objectAttrs` object literals
//! - keyword calls inside `exprAttrs` attribute expressions and inside
//!   marker-delimited text (`{{ t('Hello') }}`)
//!
//! `<script>` blocks are routed by `type`/`lang`: script code goes to the
//! script dialect, template types come back here, anything else is skipped.

use tracing::{debug, warn};
use tree_sitter::{Language, Node};

use super::{
    Extract, ExtractError, ExtractOptions, MessageOptions, MessageSink, ScriptSyntax, SourceUnit,
    script,
    tree::{self, Descend, Handler, node_text},
};
use crate::{core::entry::Reference, utils::LineIndex};

/// Extracts messages from markup templates.
#[derive(Debug, Clone)]
pub struct MarkupDialect {
    options: ExtractOptions,
}

impl MarkupDialect {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }
}

impl Extract for MarkupDialect {
    fn extract(
        &self,
        unit: &SourceUnit<'_>,
        sink: &mut MessageSink<'_>,
    ) -> Result<(), ExtractError> {
        extract_markup(unit, &self.options, sink)
    }
}

fn extract_markup(
    unit: &SourceUnit<'_>,
    options: &ExtractOptions,
    sink: &mut MessageSink<'_>,
) -> Result<(), ExtractError> {
    let language: Language = tree_sitter_html::LANGUAGE.into();
    let tree = tree::parse(&language, unit)?;
    let lines = LineIndex::new(unit.text, unit.start_line);

    // Markup is error-tolerant: report the first malformed spot and keep going.
    if let Some(node) = tree::first_error(tree.root_node()) {
        warn!(
            file = %unit.filename,
            line = lines.line_of(node.start_byte()),
            "malformed markup, extraction may be incomplete"
        );
    }

    let mut walker = MarkupWalker {
        unit,
        lines,
        options,
        sink,
    };
    let table: [(&'static str, Handler<MarkupWalker<'_, '_, '_>>); 5] = [
        ("document", MarkupWalker::handle_container),
        ("element", MarkupWalker::handle_element),
        ("script_element", MarkupWalker::handle_script),
        ("style_element", MarkupWalker::skip),
        ("comment", MarkupWalker::skip),
    ];
    tree::walk(tree.root_node(), &table, &mut walker)
}

/// How a `<script>` block is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptBlock {
    Script(ScriptSyntax),
    Template,
    Ignore,
}

fn classify_script(type_attr: Option<&str>, lang_attr: Option<&str>) -> ScriptBlock {
    if let Some(lang) = lang_attr {
        return ScriptSyntax::from_lang(lang).map_or(ScriptBlock::Ignore, ScriptBlock::Script);
    }
    match type_attr.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
        None
        | Some("")
        | Some("module")
        | Some("text/javascript")
        | Some("application/javascript")
        | Some("text/babel")
        | Some("text/jsx") => ScriptBlock::Script(ScriptSyntax::Js),
        Some("text/typescript") | Some("application/typescript") => {
            ScriptBlock::Script(ScriptSyntax::Ts)
        }
        Some("text/x-template") | Some("text/ng-template") | Some("text/html") => {
            ScriptBlock::Template
        }
        Some(_) => ScriptBlock::Ignore,
    }
}

/// An attribute as written in a start tag.
#[derive(Debug, Clone, Copy)]
struct Attribute<'u> {
    name: &'u str,
    value: Option<&'u str>,
    /// Byte offset of the value (or of where it would be).
    value_start: usize,
}

/// Nodes that bound a run of character data inside an element or document.
fn is_structural(kind: &str) -> bool {
    matches!(
        kind,
        "start_tag"
            | "end_tag"
            | "self_closing_tag"
            | "element"
            | "script_element"
            | "style_element"
            | "comment"
            | "doctype"
    )
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

struct MarkupWalker<'a, 'u, 's> {
    unit: &'a SourceUnit<'u>,
    lines: LineIndex,
    options: &'a ExtractOptions,
    sink: &'a mut MessageSink<'s>,
}

impl<'a, 'u, 's> MarkupWalker<'a, 'u, 's> {
    fn text(&self, node: Node<'_>) -> &'u str {
        node_text(node, self.unit.text)
    }

    fn entry_error(&self, line: usize, source: crate::core::entry::EntryError) -> ExtractError {
        ExtractError::Entry {
            file: self.unit.filename.to_string(),
            line,
            source,
        }
    }

    fn add(&mut self, offset: usize, text: &str, meta: &MessageOptions) -> Result<(), ExtractError> {
        let line = self.lines.line_of(offset);
        self.sink
            .add_message(Reference::at_line(self.unit.filename, line), text, meta.clone())
            .map_err(|source| self.entry_error(line, source))
    }

    fn attributes(&self, tag: Node<'_>) -> Vec<Attribute<'u>> {
        let mut cursor = tag.walk();
        tag.named_children(&mut cursor)
            .filter(|child| child.kind() == "attribute")
            .filter_map(|attr| {
                let mut cursor = attr.walk();
                let children: Vec<Node<'_>> = attr.named_children(&mut cursor).collect();
                let name = children.iter().find(|c| c.kind() == "attribute_name")?;
                let (value, value_start) = match children
                    .iter()
                    .find(|c| matches!(c.kind(), "attribute_value" | "quoted_attribute_value"))
                {
                    Some(value) if value.kind() == "attribute_value" => {
                        (Some(self.text(*value)), value.start_byte())
                    }
                    Some(quoted) => {
                        let mut cursor = quoted.walk();
                        let inner = quoted
                            .named_children(&mut cursor)
                            .find(|c| c.kind() == "attribute_value");
                        match inner {
                            Some(inner) => (Some(self.text(inner)), inner.start_byte()),
                            None => (Some(""), quoted.start_byte() + 1),
                        }
                    }
                    None => (None, attr.end_byte()),
                };
                Some(Attribute {
                    name: self.text(*name),
                    value,
                    value_start,
                })
            })
            .collect()
    }

    fn metadata(&self, attrs: &[Attribute<'u>]) -> MessageOptions {
        let markup = &self.options.markup;
        let find = |name: &str| attrs.iter().find(|a| a.name == name);

        let plural = find(&markup.plural_attr);
        MessageOptions {
            is_plural: plural.is_some(),
            plural_form: plural
                .and_then(|a| a.value)
                .filter(|v| !v.is_empty())
                .map(decode_entities),
            comment: find(&markup.comment_attr)
                .and_then(|a| a.value)
                .map(decode_entities),
            context: find(&markup.context_attr)
                .and_then(|a| a.value)
                .filter(|v| !v.is_empty())
                .map(decode_entities),
            allow_space_in_id: self.options.verbatim_ids,
        }
    }

    fn is_metadata_attr(&self, name: &str) -> bool {
        let markup = &self.options.markup;
        name == markup.plural_attr || name == markup.comment_attr || name == markup.context_attr
    }

    fn handle_container(&mut self, node: Node<'_>) -> Result<Descend, ExtractError> {
        self.scan_content(node);
        Ok(Descend::Children)
    }

    fn skip(&mut self, _node: Node<'_>) -> Result<Descend, ExtractError> {
        Ok(Descend::Skip)
    }

    fn handle_element(&mut self, node: Node<'_>) -> Result<Descend, ExtractError> {
        let mut cursor = node.walk();
        let Some(tag) = node
            .children(&mut cursor)
            .find(|c| matches!(c.kind(), "start_tag" | "self_closing_tag"))
        else {
            return Ok(Descend::Children);
        };

        let markup = &self.options.markup;
        let tag_name = {
            let mut cursor = tag.walk();
            tag.named_children(&mut cursor)
                .find(|c| c.kind() == "tag_name")
                .map(|n| self.text(n))
                .unwrap_or_default()
        };
        let attrs = self.attributes(tag);
        let meta = self.metadata(&attrs);

        let is_message = markup
            .tag_names
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tag_name))
            || attrs
                .iter()
                .any(|a| markup.attr_names.iter().any(|n| n == a.name));

        if is_message {
            self.inner_text_message(node, tag, &meta)?;
        }
        self.handle_attributes(&attrs, &meta)?;
        if !is_message {
            self.scan_content(node);
        }
        Ok(Descend::Children)
    }

    fn inner_text_message(
        &mut self,
        element: Node<'_>,
        tag: Node<'_>,
        meta: &MessageOptions,
    ) -> Result<(), ExtractError> {
        let mut cursor = element.walk();
        let end_tag = element
            .children(&mut cursor)
            .find(|c| c.kind() == "end_tag");

        let raw = end_tag
            .and_then(|end| self.unit.text.get(tag.end_byte()..end.start_byte()))
            .unwrap_or_default();
        let text = if self.options.verbatim_ids { raw } else { raw.trim() };
        let offset = tag.end_byte() + (raw.len() - raw.trim_start().len());

        if text.trim().is_empty() {
            let line = self.lines.line_of(tag.start_byte());
            let source = self.text(element);
            self.sink
                .skip(self.unit.filename, line, source, "element has no literal text");
            return Ok(());
        }
        self.add(offset, text, meta)
    }

    fn handle_attributes(
        &mut self,
        attrs: &[Attribute<'u>],
        meta: &MessageOptions,
    ) -> Result<(), ExtractError> {
        let options = self.options;
        for attr in attrs {
            if self.is_metadata_attr(attr.name) {
                continue;
            }
            let Some(value) = attr.value else {
                continue;
            };

            if options.markup.value_attr_names.iter().any(|n| n == attr.name) {
                let text = decode_entities(value);
                if text.is_empty() {
                    continue;
                }
                self.add(attr.value_start, &text, meta)?;
            } else if let Some(object_attr) =
                options.markup.object_attrs.iter().find(|o| o.name == attr.name)
            {
                let fragment = self
                    .unit
                    .fragment(value, self.lines.line_of(attr.value_start));
                if let Err(e) =
                    script::extract_object_attr(&fragment, object_attr, meta.clone(), self.sink)
                {
                    self.sink.skip_unit(&fragment, &e);
                }
            } else if options
                .markup
                .expr_attrs
                .iter()
                .any(|pattern| pattern.is_match(attr.name))
            {
                self.nested_expression(value, attr.value_start);
            } else {
                self.scan_markers(value, attr.value_start);
            }
        }
        Ok(())
    }

    /// Scan the raw text between `node`'s structural children.
    ///
    /// Stray `&`, `<` or `>` characters end up in their own nodes (or in none),
    /// so runs are taken as byte gaps rather than by joining `text` nodes.
    fn scan_content(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();

        let mut start = node.start_byte();
        for child in children {
            if is_structural(child.kind()) {
                self.scan_range(start, child.start_byte());
                start = child.end_byte();
            }
        }
        self.scan_range(start, node.end_byte());
    }

    fn scan_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        if let Some(text) = self.unit.text.get(start..end) {
            self.scan_markers(text, start);
        }
    }

    /// Extract from every marker-delimited expression in `text`, which starts at `base`.
    fn scan_markers(&mut self, text: &str, base: usize) {
        let options = self.options;
        for marker in &options.markup.markers {
            let mut pos = 0;
            while let Some(open) = text[pos..].find(marker.start.as_str()) {
                let expr_start = pos + open + marker.start.len();
                let Some(close) = text[expr_start..].find(marker.end.as_str()) else {
                    break;
                };
                let expr_end = expr_start + close;
                self.nested_expression(&text[expr_start..expr_end], base + expr_start);
                pos = expr_end + marker.end.len();
            }
        }
    }

    /// Markup-escaped code is decoded before it reaches the script parser.
    fn nested_expression(&mut self, code: &str, offset: usize) {
        if code.trim().is_empty() {
            return;
        }
        let code = decode_entities(code);
        let fragment = SourceUnit {
            filename: self.unit.filename,
            text: &code,
            start_line: self.lines.line_of(offset),
        };
        if let Err(e) = script::extract_expression(&fragment, self.options, self.sink) {
            self.sink.skip_unit(&fragment, &e);
        }
    }

    fn handle_script(&mut self, node: Node<'_>) -> Result<Descend, ExtractError> {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();

        let attrs = children
            .iter()
            .find(|c| c.kind() == "start_tag")
            .map(|tag| self.attributes(*tag))
            .unwrap_or_default();
        let attr = |name: &str| {
            attrs
                .iter()
                .find(|a| a.name.eq_ignore_ascii_case(name))
                .and_then(|a| a.value)
        };

        let Some(raw) = children.iter().find(|c| c.kind() == "raw_text") else {
            return Ok(Descend::Skip);
        };
        let fragment = self
            .unit
            .fragment(self.text(*raw), self.lines.line_of(raw.start_byte()));

        let result = match classify_script(attr("type"), attr("lang")) {
            ScriptBlock::Script(syntax) => {
                script::extract_module(&fragment, syntax, self.options, self.sink)
            }
            ScriptBlock::Template => extract_markup(&fragment, self.options, self.sink),
            ScriptBlock::Ignore => {
                debug!(
                    file = %self.unit.filename,
                    line = fragment.start_line,
                    "skipping script block of unsupported type"
                );
                Ok(())
            }
        };
        if let Err(e) = result {
            self.sink.skip_unit(&fragment, &e);
        }
        Ok(Descend::Skip)
    }
}
