//! JavaScript/TypeScript extraction with swc.
//!
//! Whole modules are parsed as programs; embedded expressions (template
//! markers, expression attributes) are wrapped in parentheses and parsed as a
//! single expression. Either way a `Visit` pass finds keyword calls and
//! evaluates their message argument into a `ValueSource`.

use std::path::Path;

use swc_common::{BytePos, FileName, GLOBALS, Globals, SourceMap, Span, Spanned};
use swc_ecma_ast::{
    BinaryOp, CallExpr, Callee, Expr, Lit, MemberProp, ObjectLit, Prop, PropName, PropOrSpread,
    UnaryOp,
};
use swc_ecma_parser::{EsSyntax, PResult, Parser, StringInput, Syntax, TsSyntax, lexer::Lexer};
use swc_ecma_visit::{Visit, VisitWith};

use super::{
    Extract, ExtractError, ExtractOptions, MessageOptions, MessageSink, ObjectAttr, SourceUnit,
    value_source::{Numeric, UnresolvableReason, ValueSource},
};
use crate::{core::entry::Reference, utils::LineIndex};

/// Script grammar flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptSyntax {
    /// ECMAScript with JSX.
    Js,
    Ts,
    Tsx,
}

impl ScriptSyntax {
    /// From a `lang` attribute or file extension.
    pub fn from_lang(lang: &str) -> Option<Self> {
        match lang.trim().to_ascii_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" | "javascript" => Some(ScriptSyntax::Js),
            "ts" | "mts" | "cts" | "typescript" => Some(ScriptSyntax::Ts),
            "tsx" => Some(ScriptSyntax::Tsx),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_lang)
    }

    fn syntax(self) -> Syntax {
        match self {
            ScriptSyntax::Js => Syntax::Es(EsSyntax {
                jsx: true,
                ..Default::default()
            }),
            ScriptSyntax::Ts => Syntax::Typescript(TsSyntax::default()),
            ScriptSyntax::Tsx => Syntax::Typescript(TsSyntax {
                tsx: true,
                ..Default::default()
            }),
        }
    }
}

/// Extracts messages from script modules.
#[derive(Debug, Clone)]
pub struct ScriptDialect {
    syntax: ScriptSyntax,
    options: ExtractOptions,
}

impl ScriptDialect {
    /// `syntax` applies to files whose extension does not name one.
    pub fn new(syntax: ScriptSyntax, options: ExtractOptions) -> Self {
        Self { syntax, options }
    }
}

impl Extract for ScriptDialect {
    fn extract(
        &self,
        unit: &SourceUnit<'_>,
        sink: &mut MessageSink<'_>,
    ) -> Result<(), ExtractError> {
        let syntax = ScriptSyntax::from_filename(unit.filename).unwrap_or(self.syntax);
        extract_module(unit, syntax, &self.options, sink)
    }
}

/// A parsed source together with the offsets needed to map spans back.
struct Parsed<T> {
    node: T,
    base: BytePos,
    source: String,
}

fn parse_source<T>(
    unit: &SourceUnit<'_>,
    source: String,
    syntax: ScriptSyntax,
    parse: impl FnOnce(&mut Parser<Lexer<'_>>) -> PResult<T>,
) -> Result<Parsed<T>, ExtractError> {
    GLOBALS.set(&Globals::new(), || {
        let source_map = SourceMap::default();
        let source_file = source_map.new_source_file(
            FileName::Real(unit.filename.into()).into(),
            source.clone(),
        );
        let base = source_file.start_pos;

        let mut parser = Parser::new(syntax.syntax(), StringInput::from(&*source_file), None);
        match parse(&mut parser) {
            Ok(node) => Ok(Parsed { node, base, source }),
            Err(e) => {
                let offset = e.span().lo.0.saturating_sub(base.0) as usize;
                let lines = LineIndex::new(&source, unit.start_line);
                Err(ExtractError::Parse {
                    file: unit.filename.to_string(),
                    line: lines.line_of(offset),
                    message: e.kind().msg().to_string(),
                })
            }
        }
    })
}

/// Extract from a whole script module.
pub(super) fn extract_module(
    unit: &SourceUnit<'_>,
    syntax: ScriptSyntax,
    options: &ExtractOptions,
    sink: &mut MessageSink<'_>,
) -> Result<(), ExtractError> {
    let parsed = parse_source(unit, unit.text.to_string(), syntax, |p| p.parse_program())?;
    let mut collector = CallCollector::new(unit, &parsed, options, sink);
    parsed.node.visit_with(&mut collector);
    collector.finish()
}

fn parse_expression(unit: &SourceUnit<'_>) -> Result<Parsed<Box<Expr>>, ExtractError> {
    parse_source(
        unit,
        format!("({})", unit.text),
        ScriptSyntax::Ts,
        |p| p.parse_expr(),
    )
}

/// Extract keyword calls from an embedded expression.
pub(super) fn extract_expression(
    unit: &SourceUnit<'_>,
    options: &ExtractOptions,
    sink: &mut MessageSink<'_>,
) -> Result<(), ExtractError> {
    let parsed = parse_expression(unit)?;
    let mut collector = CallCollector::new(unit, &parsed, options, sink);
    parsed.node.visit_with(&mut collector);
    collector.finish()
}

/// Read a message from an object literal attribute at the first matching path.
pub(super) fn extract_object_attr(
    unit: &SourceUnit<'_>,
    attr: &ObjectAttr,
    meta: MessageOptions,
    sink: &mut MessageSink<'_>,
) -> Result<(), ExtractError> {
    let parsed = parse_expression(unit)?;
    let lines = LineIndex::new(&parsed.source, unit.start_line);
    let span_text = |span: Span| span_slice(&parsed.source, parsed.base, span);
    let line_of = |span: Span| lines.line_of(span_offset(parsed.base, span.lo));

    let Expr::Object(object) = unwrap_paren(&parsed.node) else {
        sink.skip(
            unit.filename,
            unit.start_line,
            unit.text,
            format!("attribute {} is not an object literal", attr.name),
        );
        return Ok(());
    };

    let Some(value) = attr.paths.iter().find_map(|path| lookup_path(object, path)) else {
        sink.skip(
            unit.filename,
            unit.start_line,
            unit.text,
            format!("attribute {} has none of the configured properties", attr.name),
        );
        return Ok(());
    };

    let line = line_of(value.span());
    match analyze_expr(value).resolve() {
        Ok(candidates) => {
            for text in candidates {
                sink.add_message(Reference::at_line(unit.filename, line), &text, meta.clone())
                    .map_err(|source| ExtractError::Entry {
                        file: unit.filename.to_string(),
                        line,
                        source,
                    })?;
            }
        }
        Err(reason) => sink.skip(unit.filename, line, span_text(value.span()), reason),
    }
    Ok(())
}

fn span_offset(base: BytePos, pos: BytePos) -> usize {
    pos.0.saturating_sub(base.0) as usize
}

fn span_slice(source: &str, base: BytePos, span: Span) -> &str {
    source
        .get(span_offset(base, span.lo)..span_offset(base, span.hi))
        .unwrap_or_default()
}

fn unwrap_paren(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(paren) => unwrap_paren(&paren.expr),
        other => other,
    }
}

fn prop_name(name: &PropName) -> Option<&str> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.as_str()),
        PropName::Str(s) => s.value.as_str(),
        _ => None,
    }
}

fn lookup_path<'e>(object: &'e ObjectLit, path: &[String]) -> Option<&'e Expr> {
    let (first, rest) = path.split_first()?;
    let value = object.props.iter().find_map(|prop| match prop {
        PropOrSpread::Prop(prop) => match &**prop {
            Prop::KeyValue(kv) if prop_name(&kv.key) == Some(first.as_str()) => Some(&*kv.value),
            _ => None,
        },
        PropOrSpread::Spread(_) => None,
    })?;

    if rest.is_empty() {
        return Some(value);
    }
    match unwrap_paren(value) {
        Expr::Object(inner) => lookup_path(inner, rest),
        _ => None,
    }
}

/// Render a callee as dotted text: `t`, `this.t`, `i18n.t`.
fn callee_path(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(ident) => Some(ident.sym.to_string()),
        Expr::This(_) => Some("this".to_string()),
        Expr::Paren(paren) => callee_path(&paren.expr),
        Expr::Member(member) => {
            let MemberProp::Ident(prop) = &member.prop else {
                return None;
            };
            let object = callee_path(&member.obj)?;
            Some(format!("{}.{}", object, prop.sym))
        }
        _ => None,
    }
}

fn expr_type_name(expr: &Expr) -> &'static str {
    match expr {
        Expr::Array(_) => "Array",
        Expr::Arrow(_) => "Arrow",
        Expr::Assign(_) => "Assign",
        Expr::Await(_) => "Await",
        Expr::Bin(_) => "Bin",
        Expr::Fn(_) => "Fn",
        Expr::Lit(_) => "Lit",
        Expr::New(_) => "New",
        Expr::Object(_) => "Object",
        Expr::OptChain(_) => "OptChain",
        Expr::Seq(_) => "Seq",
        Expr::TaggedTpl(_) => "TaggedTpl",
        Expr::This(_) => "This",
        Expr::Unary(_) => "Unary",
        Expr::Update(_) => "Update",
        _ => "Other",
    }
}

/// Evaluate an expression into its possible literal values.
fn analyze_expr(expr: &Expr) -> ValueSource {
    match expr {
        Expr::Lit(Lit::Str(s)) => match s.value.as_str() {
            Some(v) => ValueSource::literal(v),
            None => ValueSource::unsupported("Str (non-UTF8)"),
        },

        // Only a template without `${}` is a literal.
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => tpl
            .quasis
            .first()
            .and_then(|q| q.cooked.as_ref())
            .and_then(|s| s.as_str())
            .map(ValueSource::literal)
            .unwrap_or_else(|| ValueSource::unsupported("Tpl (invalid escape)")),
        Expr::Tpl(_) => ValueSource::Unresolvable(UnresolvableReason::Interpolation),

        Expr::Paren(paren) => analyze_expr(&paren.expr),

        Expr::Bin(bin) if bin.op == BinaryOp::Add => {
            ValueSource::concat(analyze_expr(&bin.left), analyze_expr(&bin.right))
        }

        Expr::Cond(cond) => ValueSource::conditional(analyze_expr(&cond.cons), analyze_expr(&cond.alt)),

        Expr::Ident(ident) => {
            ValueSource::Unresolvable(UnresolvableReason::Identifier(ident.sym.to_string()))
        }
        Expr::Member(_) | Expr::SuperProp(_) => {
            ValueSource::Unresolvable(UnresolvableReason::MemberAccess)
        }
        Expr::Call(_) => ValueSource::Unresolvable(UnresolvableReason::Call),

        other => ValueSource::unsupported(expr_type_name(other)),
    }
}

fn numeric(expr: &Expr) -> Numeric {
    match expr {
        Expr::Lit(Lit::Num(_)) | Expr::Lit(Lit::BigInt(_)) => Numeric::Certain,
        Expr::Lit(Lit::Str(_)) | Expr::Tpl(_) => Numeric::Never,
        Expr::Paren(paren) => numeric(&paren.expr),
        Expr::Unary(unary) if matches!(unary.op, UnaryOp::Minus | UnaryOp::Plus) => {
            Numeric::Certain
        }
        Expr::Update(_) => Numeric::Certain,
        Expr::Bin(bin) => match bin.op {
            BinaryOp::Add => numeric(&bin.left).plus(numeric(&bin.right)),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Exp => {
                Numeric::Certain
            }
            _ => Numeric::Unknown,
        },
        Expr::Cond(cond) => numeric(&cond.cons).either(numeric(&cond.alt)),
        _ => Numeric::Unknown,
    }
}

/// Visits call expressions and reports keyword calls to the sink.
struct CallCollector<'a, 's> {
    filename: &'a str,
    source: &'a str,
    base: BytePos,
    lines: LineIndex,
    options: &'a ExtractOptions,
    sink: &'a mut MessageSink<'s>,
    /// First entry-model failure; aborts the unit.
    error: Option<ExtractError>,
}

impl<'a, 's> CallCollector<'a, 's> {
    fn new<T>(
        unit: &'a SourceUnit<'_>,
        parsed: &'a Parsed<T>,
        options: &'a ExtractOptions,
        sink: &'a mut MessageSink<'s>,
    ) -> Self {
        Self {
            filename: unit.filename,
            source: &parsed.source,
            base: parsed.base,
            lines: LineIndex::new(&parsed.source, unit.start_line),
            options,
            sink,
            error: None,
        }
    }

    fn finish(self) -> Result<(), ExtractError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn line(&self, pos: BytePos) -> usize {
        self.lines.line_of(span_offset(self.base, pos))
    }

    fn handle_call(&mut self, node: &CallExpr) {
        let Callee::Expr(callee) = &node.callee else {
            return;
        };
        let Some(path) = callee_path(callee) else {
            return;
        };

        let line = self.line(node.span.lo);
        let matched: Vec<_> = self.options.keywords_for(&path).cloned().collect();
        for keyword in matched {
            let Some(arg) = node.args.get(keyword.key_arg) else {
                continue;
            };

            let source = if arg.spread.is_some() {
                ValueSource::unsupported("Spread")
            } else {
                analyze_expr(&arg.expr)
            };

            let candidates = match source.resolve() {
                Ok(candidates) => candidates,
                Err(reason) => {
                    let text = span_slice(self.source, self.base, node.span);
                    self.sink.skip(self.filename, line, text, reason);
                    continue;
                }
            };

            let is_plural = keyword.plural_arg.is_some_and(|pos| {
                node.args
                    .get(pos)
                    .is_some_and(|arg| numeric(&arg.expr).is_plural())
            });

            for text in candidates {
                let options = MessageOptions {
                    is_plural,
                    ..Default::default()
                };
                if let Err(source) =
                    self.sink
                        .add_message(Reference::at_line(self.filename, line), &text, options)
                {
                    self.error = Some(ExtractError::Entry {
                        file: self.filename.to_string(),
                        line,
                        source,
                    });
                    return;
                }
            }
        }
    }
}

impl Visit for CallCollector<'_, '_> {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if self.error.is_some() {
            return;
        }
        self.handle_call(node);
        node.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(code: &str) -> Box<Expr> {
        let unit = SourceUnit::new("test.ts", code);
        parse_expression(&unit).unwrap().node
    }

    #[test]
    fn test_callee_paths() {
        let cases = [
            ("t('a')", Some("t")),
            ("this.t('a')", Some("this.t")),
            ("i18n.t('a')", Some("i18n.t")),
            ("$t('a')", Some("$t")),
            ("a[b]('a')", None),
        ];
        for (code, expected) in cases {
            let expr = parse_expr(code);
            let Expr::Call(call) = unwrap_paren(&expr) else {
                panic!("not a call: {code}");
            };
            let Callee::Expr(callee) = &call.callee else {
                panic!("no callee: {code}");
            };
            assert_eq!(callee_path(callee).as_deref(), expected, "{code}");
        }
    }

    #[test]
    fn test_analyze_literal_shapes() {
        let resolve = |code: &str| analyze_expr(unwrap_paren(&parse_expr(code))).resolve();
        assert_eq!(resolve("'a' + 'b'").unwrap(), vec!["ab"]);
        assert_eq!(resolve("`plain`").unwrap(), vec!["plain"]);
        assert_eq!(resolve("c ? 'x' : ('y')").unwrap(), vec!["x", "y"]);
        assert_eq!(
            resolve("`hi ${name}`"),
            Err(UnresolvableReason::Interpolation)
        );
        assert_eq!(
            resolve("key"),
            Err(UnresolvableReason::Identifier("key".into()))
        );
        assert_eq!(resolve("obj.key"), Err(UnresolvableReason::MemberAccess));
    }

    #[test]
    fn test_numeric_shapes() {
        let check = |code: &str| numeric(unwrap_paren(&parse_expr(code)));
        assert_eq!(check("3"), Numeric::Certain);
        assert_eq!(check("n - 1"), Numeric::Certain);
        assert_eq!(check("'3'"), Numeric::Never);
        assert_eq!(check("1 + 'a'"), Numeric::Never);
        assert_eq!(check("count"), Numeric::Unknown);
        assert_eq!(check("c ? 1 : 2"), Numeric::Certain);
    }

    #[test]
    fn test_syntax_from_filename() {
        assert_eq!(ScriptSyntax::from_filename("a/b.tsx"), Some(ScriptSyntax::Tsx));
        assert_eq!(ScriptSyntax::from_filename("a/b.mjs"), Some(ScriptSyntax::Js));
        assert_eq!(ScriptSyntax::from_filename("a/b.vue"), None);
    }
}
