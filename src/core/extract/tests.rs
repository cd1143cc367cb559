//! Tests for message extraction across dialects.

use pretty_assertions::assert_eq;

use super::*;
use crate::core::entry::EntryError;

fn run(kind: DialectKind, options: ExtractOptions, filename: &str, code: &str) -> Result<(Vec<KeyEntry>, Vec<Diagnostic>), ExtractError> {
    let dialect = Dialect::new(kind, options);
    let mut dest = EntryCollection::new();
    let diagnostics = dialect.extract_into(&SourceUnit::new(filename, code), &mut dest)?;
    Ok((dest.into_sorted(), diagnostics))
}

fn extract(kind: DialectKind, filename: &str, code: &str) -> (Vec<KeyEntry>, Vec<Diagnostic>) {
    run(kind, kind.default_options(), filename, code).unwrap()
}

fn keys(entries: &[KeyEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.key.as_str()).collect()
}

fn lines(entry: &KeyEntry) -> Vec<&str> {
    entry
        .references
        .iter()
        .filter_map(|r| r.location.as_deref())
        .collect()
}

// ============================================================
// Script
// ============================================================

#[test]
fn test_script_keyword_shapes() {
    let code = r#"
t('Hello');
i18n.t("World");
this.t(`Bye`);
other('Ignored');
"#;
    let (entries, diagnostics) = extract(DialectKind::Js, "app.js", code);
    assert_eq!(keys(&entries), vec!["Bye", "Hello", "World"]);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_script_concat_and_conditional() {
    let (entries, _) = extract(DialectKind::Js, "app.js", "t('a' + (c ? 'b' : 'c'));");
    assert_eq!(keys(&entries), vec!["ab", "ac"]);
}

#[test]
fn test_script_unresolvable_is_skipped_with_diagnostic() {
    let code = "t('ok');\nt(name);\nt(`hi ${name}`);";
    let (entries, diagnostics) = extract(DialectKind::Js, "app.js", code);
    assert_eq!(keys(&entries), vec!["ok"]);
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].line, 2);
    assert_eq!(diagnostics[0].snippet, "t(name)");
    assert!(diagnostics[0].reason.contains("name"));
    assert_eq!(diagnostics[1].line, 3);
}

#[test]
fn test_script_references_carry_lines() {
    let code = "\n\nt('x');\nfoo(t('x'));";
    let (entries, _) = extract(DialectKind::Js, "app.js", code);
    assert_eq!(entries.len(), 1);
    assert_eq!(lines(&entries[0]), vec!["3", "4"]);
    assert!(entries[0].references.iter().all(|r| r.file == "app.js"));
}

#[test]
fn test_script_start_line_offsets_references() {
    let dialect = Dialect::new(DialectKind::Js, DialectKind::Js.default_options());
    let mut dest = EntryCollection::new();
    let unit = SourceUnit {
        filename: "page.html",
        text: "\nt('x');",
        start_line: 10,
    };
    dialect.extract_into(&unit, &mut dest).unwrap();
    assert_eq!(lines(dest.get(None, "x").unwrap()), vec!["11"]);
}

#[test]
fn test_script_plural_argument() {
    let code = "tc('apple', count);\ntc('pear', 'many');\ntc('plum');";
    let (entries, _) = extract(DialectKind::Js, "app.js", code);
    let plural: Vec<(&str, bool)> = entries
        .iter()
        .map(|e| (e.key.as_str(), e.is_plural))
        .collect();
    assert_eq!(
        plural,
        vec![("apple", true), ("pear", false), ("plum", false)]
    );
}

#[test]
fn test_script_typescript() {
    let code = "const n: number = 1;\nexport function f<T>(x: T): string { return t('Typed'); }";
    let (entries, _) = extract(DialectKind::Ts, "app.ts", code);
    assert_eq!(keys(&entries), vec!["Typed"]);
}

#[test]
fn test_script_jsx() {
    let code = "export const A = () => <div title={t('Title')}>{t('Body')}</div>;";
    let (entries, _) = extract(DialectKind::Js, "app.jsx", code);
    assert_eq!(keys(&entries), vec!["Body", "Title"]);
}

#[test]
fn test_script_parse_error_aborts_unit() {
    let dialect = Dialect::new(DialectKind::Js, DialectKind::Js.default_options());
    let mut dest = EntryCollection::new();
    let result = dialect.extract_into(&SourceUnit::new("bad.js", "t('a');\nt('b'"), &mut dest);
    assert!(matches!(result, Err(ExtractError::Parse { .. })));
    assert!(dest.is_empty());
}

#[test]
fn test_script_whitespace_in_key_aborts_unit() {
    let result = run(
        DialectKind::Js,
        DialectKind::Js.default_options(),
        "app.js",
        "t(' padded');",
    );
    match result {
        Err(ExtractError::Entry {
            line,
            source: EntryError::Whitespace { field, .. },
            ..
        }) => {
            assert_eq!(line, 1);
            assert_eq!(field, "key");
        }
        other => panic!("expected whitespace error, got {other:?}"),
    }
}

#[test]
fn test_script_verbatim_ids_allow_whitespace() {
    let mut options = DialectKind::Js.default_options();
    options.verbatim_ids = true;
    let dialect = Dialect::new(DialectKind::Js, options);
    let mut dest = EntryCollection::new();
    let unit = SourceUnit::new("app.js", "t(' padded');");

    // Script calls never opt out of the whitespace rule; only markup does.
    assert!(dialect.extract_into(&unit, &mut dest).is_err());
}

#[test]
fn test_custom_keyword_positions() {
    let options = ExtractOptions::default()
        .with_keywords(&["gettext.ngettext:1,2"])
        .unwrap();
    let (entries, _) = run(
        DialectKind::Js,
        options,
        "app.js",
        "gettext.ngettext(ctx, 'One file', n);",
    )
    .unwrap();
    assert_eq!(keys(&entries), vec!["One file"]);
    assert!(entries[0].is_plural);
}

// ============================================================
// Markup
// ============================================================

#[test]
fn test_html_inner_text_and_markers() {
    let code = "<div>\n  <p translate>Hello world</p>\n  <span title=\"{{ t('Attr') }}\">{{ t('Inline') }}</span>\n</div>";
    let (entries, diagnostics) = extract(DialectKind::Html, "index.html", code);
    assert_eq!(keys(&entries), vec!["Attr", "Hello world", "Inline"]);
    assert!(diagnostics.is_empty());

    let hello = entries.iter().find(|e| e.key == "Hello world").unwrap();
    assert_eq!(lines(hello), vec!["2"]);
    let inline = entries.iter().find(|e| e.key == "Inline").unwrap();
    assert_eq!(lines(inline), vec!["3"]);
}

#[test]
fn test_html_inner_text_is_trimmed() {
    let code = "<translate>\n    Multi word\n</translate>";
    let (entries, _) = extract(DialectKind::Html, "index.html", code);
    assert_eq!(keys(&entries), vec!["Multi word"]);
    assert_eq!(lines(&entries[0]), vec!["2"]);
}

#[test]
fn test_html_sibling_metadata_attributes() {
    let code = r#"<p translate translate-context="menu" translate-comment="Top bar" translate-plural="{{n}} files">{{n}} file</p>"#;
    let (entries, _) = extract(DialectKind::Html, "index.html", code);
    assert_eq!(entries.len(), 1);

    let entry = &entries[0];
    assert_eq!(entry.context.as_deref(), Some("menu"));
    assert_eq!(entry.key, "{{n}} file");
    assert!(entry.is_plural);
    assert_eq!(
        entry.comments.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["Top bar"]
    );
}

#[test]
fn test_html_conflicting_plural_forms() {
    let code = r#"<p translate translate-plural="apples">apple</p><p translate translate-plural="applez">apple</p>"#;
    let result = run(
        DialectKind::Html,
        DialectKind::Html.default_options(),
        "index.html",
        code,
    );
    assert!(matches!(
        result,
        Err(ExtractError::Entry {
            source: EntryError::ConflictingPlural { .. },
            ..
        })
    ));
}

#[test]
fn test_html_empty_message_element_is_skipped() {
    let (entries, diagnostics) = extract(DialectKind::Html, "index.html", "<p translate>  </p>");
    assert!(entries.is_empty());
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].reason.contains("no literal text"));
}

#[test]
fn test_html_script_blocks_dispatch_by_type() {
    let code = concat!(
        "<script>t('FromScript');</script>\n",
        "<script type=\"text/ng-template\"><p translate>Nested</p></script>\n",
        "<script type=\"application/json\">{\"t\": 1}</script>\n",
        "<script lang=\"ts\">\nconst x: number = 1; t('Typed');</script>",
    );
    let (entries, diagnostics) = extract(DialectKind::Html, "index.html", code);
    assert_eq!(keys(&entries), vec!["FromScript", "Nested", "Typed"]);
    assert!(diagnostics.is_empty());

    let typed = entries.iter().find(|e| e.key == "Typed").unwrap();
    assert_eq!(lines(typed), vec!["5"]);
}

#[test]
fn test_html_broken_script_block_does_not_abort_page() {
    let code = "<p translate>Kept</p>\n<script>t('a'</script>";
    let (entries, diagnostics) = extract(DialectKind::Html, "index.html", code);
    assert_eq!(keys(&entries), vec!["Kept"]);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 2);
}

#[test]
fn test_html_value_and_object_attributes() {
    let mut options = DialectKind::Html.default_options();
    options.markup.value_attr_names = vec!["placeholder".to_string()];
    options.markup.object_attrs = vec![ObjectAttr::new("data-i18n", &["label", "title.text"])];

    let code = concat!(
        "<input placeholder=\"Search\">\n",
        "<b data-i18n=\"{ title: { text: 'Deep' } }\"></b>\n",
        "<b data-i18n=\"{ label: 'First', title: { text: 'Second' } }\"></b>\n",
        "<b data-i18n=\"{ other: 'x' }\"></b>",
    );
    let (entries, diagnostics) = run(DialectKind::Html, options, "form.html", code).unwrap();
    assert_eq!(keys(&entries), vec!["Deep", "First", "Search"]);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 4);
}

#[test]
fn test_vue_single_file_component() {
    let code = r#"<template>
  <div :title="$t('Title')" @click="go()">
    <translate>Welcome</translate>
    {{ $t('Greeting') }}
  </div>
</template>
<script>
export default { computed: { x() { return this.$t('Computed') } } }
</script>
<style>
.a { color: red; }
</style>
"#;
    let (entries, diagnostics) = extract(DialectKind::Vue, "App.vue", code);
    assert_eq!(
        keys(&entries),
        vec!["Computed", "Greeting", "Title", "Welcome"]
    );
    assert!(diagnostics.is_empty());

    let greeting = entries.iter().find(|e| e.key == "Greeting").unwrap();
    assert_eq!(lines(greeting), vec!["4"]);
    let computed = entries.iter().find(|e| e.key == "Computed").unwrap();
    assert_eq!(lines(computed), vec!["8"]);
}

#[test]
fn test_vue_plural_keyword_in_template() {
    let code = "<template><p>{{ $tc('{n} cars', count) }}</p></template>";
    let (entries, _) = extract(DialectKind::Vue, "Cars.vue", code);
    assert_eq!(keys(&entries), vec!["{n} cars"]);
    assert!(entries[0].is_plural);
}

#[test]
fn test_marker_with_bare_ampersand() {
    let code = "<div>\n<p>\n</p>\n<span>{{ t('Apple & Banana') }}</span>\n</div>";
    let (entries, diagnostics) = extract(DialectKind::Vue, "a.vue", code);
    assert_eq!(keys(&entries), vec!["Apple & Banana"]);
    assert!(!entries[0].is_plural);
    assert_eq!(lines(&entries[0]), vec!["4"]);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_marker_with_comparison_operator() {
    let code = "<p :title=\"t('Tip')\">{{ n > 1 ? t('Many') : t('One') }}</p>";
    let (entries, diagnostics) = extract(DialectKind::Vue, "a.vue", code);
    assert_eq!(keys(&entries), vec!["Many", "One", "Tip"]);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_marker_text_next_to_child_elements() {
    let code = "<div>{{ t('Before') }}<b>x</b>{{ t('After') }}<!-- {{ t('Hidden') }} --></div>";
    let (entries, _) = extract(DialectKind::Html, "index.html", code);
    assert_eq!(keys(&entries), vec!["After", "Before"]);
}

#[test]
fn test_entities_are_decoded_before_parsing_expressions() {
    let code = concat!(
        "<span title=\"{{ t(&quot;Hi&quot;) }}\"></span>\n",
        "<p>{{ t('a &amp; b') }}</p>\n",
        "<b :title=\"t(&quot;Bound&quot;)\"></b>",
    );
    let (entries, diagnostics) = extract(DialectKind::Vue, "a.vue", code);
    assert_eq!(keys(&entries), vec!["Bound", "Hi", "a & b"]);
    assert!(diagnostics.is_empty());

    let amp = entries.iter().find(|e| e.key == "a & b").unwrap();
    assert_eq!(lines(amp), vec!["2"]);
}

#[test]
fn test_extraction_is_idempotent() {
    let code = r#"<template>
  <p translate translate-context="menu">Open</p>
  <span :title="$t('Title')">{{ $tc('{n} cars', count) }} &amp; {{ t('More') }}</span>
</template>
<script>
export default { methods: { x() { return this.$t('Computed') } } }
</script>
"#;
    let first = extract(DialectKind::Vue, "App.vue", code);
    let second = extract(DialectKind::Vue, "App.vue", code);
    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
    assert_eq!(keys(&first.0), vec!["Open", "Computed", "More", "Title", "{n} cars"]);

    let dialect = Dialect::new(DialectKind::Vue, DialectKind::Vue.default_options());
    let mut dest = EntryCollection::new();
    dialect.extract_into(&SourceUnit::new("App.vue", code), &mut dest).unwrap();
    dialect.extract_into(&SourceUnit::new("App.vue", code), &mut dest).unwrap();
    assert_eq!(dest.into_sorted(), first.0);
}

// ============================================================
// PHP
// ============================================================

fn php_options() -> ExtractOptions {
    ExtractOptions::default()
        .with_keywords(&["__", "this.t", "Lang.get", "_n:0,2"])
        .unwrap()
}

#[test]
fn test_php_call_shapes() {
    let code = r#"<?php
echo __('It\'s');
echo $this->t("Tab\tbed");
echo Lang::get('a' . 'b');
echo _n('%d apple', '%d apples', $n);
echo _n('%d pear', '%d pears', 'x');
"#;
    let (entries, diagnostics) = run(DialectKind::Php, php_options(), "view.php", code).unwrap();
    assert_eq!(
        keys(&entries),
        vec!["%d apple", "%d pear", "It's", "Tab\tbed", "ab"]
    );
    assert!(diagnostics.is_empty());

    assert!(entries[0].is_plural);
    assert!(!entries[1].is_plural);
    assert_eq!(lines(&entries[2]), vec!["2"]);
}

#[test]
fn test_php_interpolation_is_not_a_literal() {
    let code = "<?php\n__(\"Hi $name\");\n__($key);\n__(true ? 'yes' : 'no');";
    let (entries, diagnostics) = run(DialectKind::Php, php_options(), "view.php", code).unwrap();
    assert_eq!(keys(&entries), vec!["no", "yes"]);
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics[0].reason.contains("interpolation"));
    assert_eq!(diagnostics[1].line, 3);
}

#[test]
fn test_php_byte_escapes() {
    let code = "<?php\n__(\"\\101pple\");\n__(\"caf\\xc3\\xa9\");\n__(\"bad \\xff\");";
    let (entries, diagnostics) = run(DialectKind::Php, php_options(), "view.php", code).unwrap();
    assert_eq!(keys(&entries), vec!["Apple", "café"]);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 4);
    assert!(diagnostics[0].reason.contains("UTF-8"));
}

#[test]
fn test_php_inline_html_is_ignored() {
    let code = "<h1>t('not php')</h1>\n<?php echo __('Title'); ?>\n<p>footer</p>";
    let (entries, _) = run(DialectKind::Php, php_options(), "page.php", code).unwrap();
    assert_eq!(keys(&entries), vec!["Title"]);
    assert_eq!(lines(&entries[0]), vec!["2"]);
}

#[test]
fn test_php_parse_error_reports_line() {
    let result = run(
        DialectKind::Php,
        php_options(),
        "bad.php",
        "<?php\n__('ok');\n__('broken'\n",
    );
    match result {
        Err(ExtractError::Parse { file, .. }) => assert_eq!(file, "bad.php"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

// ============================================================
// Sink
// ============================================================

#[test]
fn test_sink_upserts_and_checks_context_whitespace() {
    let mut dest = EntryCollection::new();
    let mut sink = MessageSink::new(&mut dest);

    sink.add_message(
        Reference::at_line("a.js", 1),
        "Open",
        MessageOptions {
            context: Some("menu".into()),
            comment: Some("File menu".into()),
            ..Default::default()
        },
    )
    .unwrap();
    sink.add_message(
        Reference::at_line("b.js", 2),
        "Open",
        MessageOptions {
            context: Some("menu".into()),
            is_plural: true,
            ..Default::default()
        },
    )
    .unwrap();
    let err = sink
        .add_message(
            Reference::at_line("c.js", 3),
            "Open",
            MessageOptions {
                context: Some("menu ".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, EntryError::Whitespace { field: "context", .. }));

    let entry = dest.get(Some("menu"), "Open").unwrap();
    assert!(entry.is_plural);
    assert_eq!(entry.references.len(), 2);
    assert_eq!(entry.comments.len(), 1);
    assert!(dest.get(None, "Open").is_none());
}

#[test]
fn test_extract_into_merges_with_existing_entries() {
    let dialect = Dialect::new(DialectKind::Js, DialectKind::Js.default_options());
    let mut dest = EntryCollection::new();
    dialect
        .extract_into(&SourceUnit::new("a.js", "t('Shared');"), &mut dest)
        .unwrap();
    dialect
        .extract_into(&SourceUnit::new("b.js", "t('Shared');"), &mut dest)
        .unwrap();

    let entry = dest.get(None, "Shared").unwrap();
    let files: Vec<&str> = entry.references.iter().map(|r| r.file.as_str()).collect();
    assert_eq!(files, vec!["a.js", "b.js"]);
}
