//! Message extraction across source dialects.
//!
//! A source unit (`filename`, `text`, `start_line`) is handed to a
//! [`Dialect`], which walks it and reports every literal message through a
//! [`MessageSink`]. The sink upserts key entries into an
//! [`EntryCollection`] and collects diagnostics for call sites it had to skip.
//!
//! - `script`: JavaScript/TypeScript modules and inline expressions (swc)
//! - `markup`: HTML and Vue templates (tree-sitter-html)
//! - `php`: PHP sources (tree-sitter-php)

mod error;
pub mod keyword;
mod markup;
mod php;
mod script;
mod tree;
pub mod value_source;

#[cfg(test)]
mod tests;

pub use error::ExtractError;
pub use keyword::Keyword;
pub use markup::MarkupDialect;
pub use php::PhpDialect;
pub use script::{ScriptDialect, ScriptSyntax};

use std::{collections::HashMap, fmt};

use enum_dispatch::enum_dispatch;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    core::entry::{
        EntryCollection, EntryError, KeyEntry, KeyEntryBuilder, Reference, merge_key_entries,
    },
    utils::snippet,
};

/// One piece of source text to scan.
#[derive(Debug, Clone, Copy)]
pub struct SourceUnit<'a> {
    pub filename: &'a str,
    pub text: &'a str,
    /// 1-based line of the first character of `text` in `filename`.
    pub start_line: usize,
}

impl<'a> SourceUnit<'a> {
    pub fn new(filename: &'a str, text: &'a str) -> Self {
        Self {
            filename,
            text,
            start_line: 1,
        }
    }

    /// A fragment of this unit's file starting at `start_line`.
    pub fn fragment(&self, text: &'a str, start_line: usize) -> Self {
        Self {
            filename: self.filename,
            text,
            start_line,
        }
    }
}

/// Metadata accompanying one message sighting.
#[derive(Debug, Clone, Default)]
pub struct MessageOptions {
    pub is_plural: bool,
    /// Source text of the plural form, for dialects that carry one.
    pub plural_form: Option<String>,
    pub comment: Option<String>,
    pub context: Option<String>,
    /// Keep surrounding whitespace in key and context.
    pub allow_space_in_id: bool,
}

/// A call site or element that could not be turned into a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    pub line: usize,
    pub snippet: String,
    pub reason: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: cannot extract message from `{}` ({}), use a literal directly",
            self.file, self.line, self.snippet, self.reason
        )
    }
}

type Identity = (Option<String>, String);

/// Destination of extracted messages for one extraction pass.
pub struct MessageSink<'a> {
    dest: &'a mut EntryCollection<KeyEntry>,
    plural_forms: HashMap<Identity, String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> MessageSink<'a> {
    pub fn new(dest: &'a mut EntryCollection<KeyEntry>) -> Self {
        Self {
            dest,
            plural_forms: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Record one sighting of `text`, creating or updating its entry.
    pub fn add_message(
        &mut self,
        reference: Reference,
        text: &str,
        options: MessageOptions,
    ) -> Result<(), EntryError> {
        if text.is_empty() {
            debug!(file = %reference.file, "skipping empty message");
            return Ok(());
        }
        if !options.allow_space_in_id {
            check_trimmed("key", text)?;
            if let Some(context) = &options.context {
                check_trimmed("context", context)?;
            }
        }

        let identity: Identity = (options.context.clone(), text.to_string());
        let mut builder = match self.dest.get(options.context.as_deref(), text) {
            Some(existing) => KeyEntryBuilder::from_entry(existing)
                .with_plural_form(self.plural_forms.get(&identity).cloned()),
            None => KeyEntryBuilder::new(options.context.clone(), text),
        };

        builder.add_reference(reference);
        if let Some(comment) = options.comment.filter(|c| !c.trim().is_empty()) {
            builder.add_comment(comment);
        }
        if options.is_plural || options.plural_form.is_some() {
            builder.set_plural(options.plural_form.as_deref())?;
        }
        if let Some(form) = builder.plural_form() {
            self.plural_forms.insert(identity, form.to_string());
        }

        self.dest.set(builder.build());
        Ok(())
    }

    /// Record a skipped call site and log it.
    pub fn skip(&mut self, file: &str, line: usize, source: &str, reason: impl fmt::Display) {
        let diagnostic = Diagnostic {
            file: file.to_string(),
            line,
            snippet: snippet(source),
            reason: reason.to_string(),
        };
        warn!(
            file = %diagnostic.file,
            line = diagnostic.line,
            snippet = %diagnostic.snippet,
            "cannot extract message ({}), use a literal directly",
            diagnostic.reason
        );
        self.diagnostics.push(diagnostic);
    }

    /// Record a nested unit whose extraction failed; the enclosing unit continues.
    pub fn skip_unit(&mut self, unit: &SourceUnit<'_>, error: &ExtractError) {
        let line = error.line().unwrap_or(unit.start_line);
        warn!(file = %unit.filename, line, "skipping embedded source: {}", error);
        self.diagnostics.push(Diagnostic {
            file: unit.filename.to_string(),
            line,
            snippet: snippet(unit.text),
            reason: error.to_string(),
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

fn check_trimmed(field: &'static str, value: &str) -> Result<(), EntryError> {
    if value.trim() != value {
        return Err(EntryError::Whitespace {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// An embedded-expression delimiter pair, e.g. `{{` / `}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub start: String,
    pub end: String,
}

impl Marker {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// An attribute holding an object literal, read at the first matching path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectAttr {
    pub name: String,
    /// Candidate property paths, tried in order.
    pub paths: Vec<Vec<String>>,
}

impl ObjectAttr {
    /// `paths` are dotted, e.g. `["title", "label.text"]`.
    pub fn new(name: impl Into<String>, paths: &[&str]) -> Self {
        Self {
            name: name.into(),
            paths: paths
                .iter()
                .map(|p| p.split('.').map(str::to_string).collect())
                .collect(),
        }
    }
}

/// Which markup shapes carry messages.
#[derive(Debug, Clone)]
pub struct MarkupOptions {
    pub tag_names: Vec<String>,
    pub attr_names: Vec<String>,
    pub value_attr_names: Vec<String>,
    pub object_attrs: Vec<ObjectAttr>,
    pub expr_attrs: Vec<Regex>,
    pub markers: Vec<Marker>,
    pub plural_attr: String,
    pub comment_attr: String,
    pub context_attr: String,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            tag_names: Vec::new(),
            attr_names: Vec::new(),
            value_attr_names: Vec::new(),
            object_attrs: Vec::new(),
            expr_attrs: Vec::new(),
            markers: vec![Marker::new("{{", "}}")],
            plural_attr: "translate-plural".to_string(),
            comment_attr: "translate-comment".to_string(),
            context_attr: "translate-context".to_string(),
        }
    }
}

/// Compiled extraction options for one source group.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub keywords: Vec<Keyword>,
    pub markup: MarkupOptions,
    /// Keep whitespace around inner-text messages and allow it in ids.
    pub verbatim_ids: bool,
}

impl ExtractOptions {
    pub fn with_keywords(mut self, specs: &[&str]) -> Result<Self, ExtractError> {
        self.keywords = specs
            .iter()
            .map(|s| s.parse())
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    /// Keywords whose callee text matches `callee`.
    pub fn keywords_for<'k>(&'k self, callee: &'k str) -> impl Iterator<Item = &'k Keyword> {
        self.keywords.iter().filter(move |k| k.matches(callee))
    }
}

pub fn compile_attr_pattern(pattern: &str) -> Result<Regex, ExtractError> {
    Regex::new(pattern).map_err(|source| ExtractError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Source dialects selectable in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Js,
    Ts,
    Html,
    Vue,
    Php,
}

impl DialectKind {
    /// Default file patterns for sources of this dialect.
    pub fn default_includes(self) -> &'static [&'static str] {
        match self {
            DialectKind::Js => &["**/*.js", "**/*.jsx", "**/*.mjs"],
            DialectKind::Ts => &["**/*.ts", "**/*.tsx"],
            DialectKind::Html => &["**/*.html"],
            DialectKind::Vue => &["**/*.vue"],
            DialectKind::Php => &["**/*.php"],
        }
    }

    pub fn default_keywords(self) -> &'static [&'static str] {
        match self {
            DialectKind::Js | DialectKind::Ts => &["t", "i18n.t", "this.t", "tc:0,1"],
            DialectKind::Html => &["t"],
            DialectKind::Vue => &["$t", "t", "this.$t", "$tc:0,1", "this.$tc:0,1"],
            DialectKind::Php => &["__", "_e", "gettext", "_n:0,2", "ngettext:0,2"],
        }
    }

    /// Default options for this dialect.
    pub fn default_options(self) -> ExtractOptions {
        let keywords = self
            .default_keywords()
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        let markup = match self {
            DialectKind::Html => MarkupOptions {
                tag_names: vec!["translate".to_string()],
                attr_names: vec!["translate".to_string()],
                ..MarkupOptions::default()
            },
            DialectKind::Vue => MarkupOptions {
                tag_names: vec!["translate".to_string()],
                attr_names: vec!["v-translate".to_string()],
                expr_attrs: [r"^:", r"^@", r"^v-bind:", r"^v-on:", r"^v-(if|else-if|show|html|text)$"]
                    .iter()
                    .filter_map(|p| Regex::new(p).ok())
                    .collect(),
                ..MarkupOptions::default()
            },
            _ => MarkupOptions::default(),
        };

        ExtractOptions {
            keywords,
            markup,
            verbatim_ids: false,
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DialectKind::Js => "js",
            DialectKind::Ts => "ts",
            DialectKind::Html => "html",
            DialectKind::Vue => "vue",
            DialectKind::Php => "php",
        };
        f.write_str(name)
    }
}

/// A dialect's extraction entry point.
#[enum_dispatch]
pub trait Extract {
    fn extract(&self, unit: &SourceUnit<'_>, sink: &mut MessageSink<'_>)
    -> Result<(), ExtractError>;
}

/// Extraction strategy for one dialect, built once per run.
#[enum_dispatch(Extract)]
#[derive(Debug, Clone)]
pub enum Dialect {
    ScriptDialect,
    MarkupDialect,
    PhpDialect,
}

impl Dialect {
    pub fn new(kind: DialectKind, options: ExtractOptions) -> Self {
        match kind {
            DialectKind::Js => ScriptDialect::new(ScriptSyntax::Js, options).into(),
            DialectKind::Ts => ScriptDialect::new(ScriptSyntax::Ts, options).into(),
            DialectKind::Html | DialectKind::Vue => MarkupDialect::new(options).into(),
            DialectKind::Php => PhpDialect::new(options).into(),
        }
    }

    /// Extract one unit into `dest`.
    ///
    /// The unit is all-or-nothing: on failure `dest` is left untouched.
    /// Skipped call sites are returned as diagnostics.
    pub fn extract_into(
        &self,
        unit: &SourceUnit<'_>,
        dest: &mut EntryCollection<KeyEntry>,
    ) -> Result<Vec<Diagnostic>, ExtractError> {
        let mut scratch = EntryCollection::new();
        let mut sink = MessageSink::new(&mut scratch);
        self.extract(unit, &mut sink)?;
        let diagnostics = sink.into_diagnostics();
        merge_key_entries(dest, scratch.into_sorted());
        Ok(diagnostics)
    }
}
