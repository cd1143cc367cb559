use anyhow::{Context, Result};
use serde_json::Value;

use crate::{CliTest, stdout};

/// Validates config file structure and default values.
fn assert_config_content(content: &str) -> Result<()> {
    let parsed: Value = serde_json::from_str(content).context("Config should be valid JSON")?;

    let domain = &parsed["domains"][0];
    assert_eq!(domain["name"], "messages");
    assert_eq!(domain["baseLocale"], "en");
    assert_eq!(domain["sources"][0]["dialect"], "js");
    assert!(
        parsed["remote"].get("tokenEnv").is_some(),
        "Config should have 'remote.tokenEnv' field"
    );

    assert!(
        content.contains("  "),
        "Config should use 2-space indentation"
    );

    Ok(())
}

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.run(&["init"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("Created .msgkitrc.json"));

    let content = test.read_file(".msgkitrc.json")?;
    assert_config_content(&content)?;

    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::with_file(".msgkitrc.json", "{}")?;

    let output = test.run(&["init"])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains(".msgkitrc.json already exists"));
    assert_eq!(test.read_file(".msgkitrc.json")?, "{}");

    Ok(())
}
