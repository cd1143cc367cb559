use anyhow::Result;

use crate::{CliTest, stderr};

const CONFIG: &str = r#"{
  "domains": [{ "name": "app", "outputDir": "i18n" }],
  "remote": { "projectId": "123.abc", "tokenEnv": "APP_TOKEN" }
}"#;

#[test]
fn test_sync_requires_project() -> Result<()> {
    let test = CliTest::with_file(".msgkitrc.json", r#"{ "domains": [{ "name": "app" }] }"#)?;

    let output = test.run(&["sync"])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("'remote.projectId' is not configured"));

    Ok(())
}

#[test]
fn test_sync_requires_token() -> Result<()> {
    let test = CliTest::with_file(".msgkitrc.json", CONFIG)?;

    let output = test.run(&["sync", "--dry-run"])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("No API token: set APP_TOKEN or pass --token"));

    Ok(())
}

#[test]
fn test_sync_requires_extracted_keys() -> Result<()> {
    let test = CliTest::with_file(".msgkitrc.json", CONFIG)?;

    let output = test
        .command()
        .args(["sync", "--dry-run"])
        .env("APP_TOKEN", "secret")
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("run `msgkit extract` first"));

    Ok(())
}
