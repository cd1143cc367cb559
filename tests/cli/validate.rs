use anyhow::Result;

use crate::{CliTest, stdout};

fn config(skip_validation: bool) -> String {
    format!(
        r#"{{
  "domains": [{{
    "name": "app",
    "outputDir": "i18n",
    "locales": ["en", "de"],
    "skipValidation": {}
  }}]
}}"#,
        skip_validation
    )
}

const EN: &str = r#"{
  "count": 2,
  "translations": [
    { "context": null, "key": "Hello %s", "messages": { "other": "Hello %s" }, "flag": null },
    { "context": null, "key": "Read <b>more</b>", "messages": { "other": "Read <b>more</b>" }, "flag": null }
  ]
}"#;

fn project(skip_validation: bool, de: &str) -> Result<CliTest> {
    let test = CliTest::with_file(".msgkitrc.json", &config(skip_validation))?;
    test.write_file("i18n/en.json", EN)?;
    test.write_file("i18n/de.json", de)?;
    Ok(test)
}

const DE_VALID: &str = r#"{
  "count": 2,
  "translations": [
    { "context": null, "key": "Hello %s", "messages": { "other": "Hallo %s" }, "flag": null },
    { "context": null, "key": "Read <b>more</b>", "messages": { "other": "<b>Mehr</b> lesen" }, "flag": null }
  ]
}"#;

const DE_BROKEN: &str = r#"{
  "count": 2,
  "translations": [
    { "context": null, "key": "Hello %s", "messages": { "other": "Hallo" }, "flag": null },
    { "context": null, "key": "Read <b>more</b>", "messages": { "other": "" }, "flag": null }
  ]
}"#;

#[test]
fn test_validate_clean_catalogs() -> Result<()> {
    let test = project(false, DE_VALID)?;

    let output = test.run(&["validate"])?;
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("app: checked 2 entries in 1 locale against en"));

    Ok(())
}

#[test]
fn test_validate_reports_missing_placeholder() -> Result<()> {
    let test = project(false, DE_BROKEN)?;

    let output = test.run(&["validate"])?;
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("error: \"Hello %s\""));
    assert!(out.contains("--> de"));
    assert!(out.contains("= translation: Hallo"));
    assert!(out.contains("1 problems (1 error, 0 warnings)"));

    Ok(())
}

#[test]
fn test_skip_validation_downgrades_to_warnings() -> Result<()> {
    let test = project(true, DE_BROKEN)?;

    let output = test.run(&["validate"])?;
    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("warning: \"Hello %s\""));
    assert!(out.contains("skipValidation"));

    Ok(())
}
