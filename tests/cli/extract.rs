use anyhow::Result;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use crate::{CliTest, stdout};

const CONFIG: &str = r#"{
  "domains": [{
    "name": "app",
    "outputDir": "i18n",
    "locales": ["en", "de"],
    "baseLocale": "en",
    "sources": [
      { "dialect": "js", "includes": ["src/**/*.js"] },
      { "dialect": "vue" },
      { "dialect": "php" }
    ]
  }]
}"#;

fn key_names(catalog: &Value) -> Vec<String> {
    catalog["keys"]
        .as_array()
        .map(|keys| {
            keys.iter()
                .filter_map(|k| k["key"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn project() -> Result<CliTest> {
    let test = CliTest::with_file(".msgkitrc.json", CONFIG)?;
    test.write_file(
        "src/menu.js",
        r#"export function menu(n, label) {
  return [t('Open'), t('Close'), tc('{n} files', n), t(label)];
}
"#,
    )?;
    Ok(test)
}

#[test]
fn test_extract_writes_key_catalog() -> Result<()> {
    let test = project()?;

    let output = test.run(&["extract"])?;
    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("app: 3 keys from 1 file"));
    assert!(out.contains("1 call site skipped"));

    let catalog = test.read_json("i18n/keys.json")?;
    assert_eq!(catalog["count"], 3);
    assert_eq!(key_names(&catalog), vec!["Close", "Open", "{n} files"]);

    let open = &catalog["keys"][1];
    assert_eq!(open["references"][0], json!({ "file": "src/menu.js", "location": "2" }));
    assert_eq!(catalog["keys"][2]["isPlural"], true);

    Ok(())
}

#[test]
fn test_extract_seeds_translation_catalogs() -> Result<()> {
    let test = project()?;
    test.write_file(
        "i18n/de.json",
        r#"{
  "count": 2,
  "translations": [
    { "context": null, "key": "Open", "messages": { "other": "Öffnen" }, "flag": "not_reviewed" },
    { "context": null, "key": "Stale", "messages": { "other": "Alt" }, "flag": null }
  ]
}"#,
    )?;

    let output = test.run(&["extract"])?;
    assert!(output.status.success());

    let de = test.read_json("i18n/de.json")?;
    assert_eq!(de["count"], 3);
    let translations = de["translations"].as_array().cloned().unwrap_or_default();
    let open = translations.iter().find(|t| t["key"] == "Open");
    assert_eq!(
        open.map(|t| t["messages"].clone()),
        Some(json!({ "other": "Öffnen" }))
    );
    assert_eq!(open.map(|t| t["flag"].clone()), Some(json!("not_reviewed")));
    assert!(translations.iter().all(|t| t["key"] != "Stale"));

    let files = translations.iter().find(|t| t["key"] == "{n} files");
    assert_eq!(
        files.map(|t| t["messages"].clone()),
        Some(json!({ "one": "", "other": "" }))
    );

    let en = test.read_json("i18n/en.json")?;
    assert_eq!(en["count"], 3);

    Ok(())
}

#[test]
fn test_extract_reports_unparsable_file_and_keeps_others() -> Result<()> {
    let test = project()?;
    test.write_file("src/broken.js", "t('Broken'\n")?;

    let output = test.run(&["extract"])?;
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("error: failed to parse"));
    assert!(out.contains("--> src/broken.js"));

    let catalog = test.read_json("i18n/keys.json")?;
    assert_eq!(catalog["count"], 3);

    Ok(())
}

#[test]
fn test_extract_mixed_dialects() -> Result<()> {
    let test = project()?;
    test.write_file(
        "components/App.vue",
        r#"<template>
  <div>
    <translate>Welcome</translate>
    {{ $t('Greeting') }}
  </div>
</template>
<script>
export default { computed: { x() { return this.$t('Computed') } } }
</script>
"#,
    )?;
    test.write_file("views/page.php", "<?php echo __('Page title'); ?>\n")?;

    let output = test.run(&["extract", "-v"])?;
    assert!(output.status.success());

    let catalog = test.read_json("i18n/keys.json")?;
    assert_eq!(
        key_names(&catalog),
        vec![
            "Close",
            "Computed",
            "Greeting",
            "Open",
            "Page title",
            "Welcome",
            "{n} files"
        ]
    );

    Ok(())
}

#[test]
fn test_extract_unknown_domain_is_an_error() -> Result<()> {
    let test = project()?;

    let output = test.run(&["extract", "--domain", "admin"])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(crate::stderr(&output).contains("Unknown domain"));

    Ok(())
}
