use std::{env, path::Path, time::Duration};

use anyhow::{Context, Result, bail};

use super::super::args::SyncCommand;
use super::{
    CommandResult, CommandSummary, SyncSummary,
    helper::{finish, load, read_translations},
};
use crate::config::{DomainConfig, RemoteConfig};
use crate::core::{
    catalog::{read_key_catalog, write_trans_catalog},
    entry::EntryCollection,
    sync::{
        Reconciler, SyncOptions,
        lokalise::{LokaliseConfig, LokaliseStore},
    },
};

fn resolve_token(cmd: &SyncCommand, remote: &RemoteConfig) -> Result<String> {
    let token = cmd
        .token
        .clone()
        .or_else(|| env::var(&remote.token_env).ok())
        .filter(|t| !t.trim().is_empty());
    match token {
        Some(token) => Ok(token),
        None => bail!(
            "No API token: set {} or pass --token",
            remote.token_env
        ),
    }
}

fn sync_domain(
    runtime: &tokio::runtime::Runtime,
    domain: &DomainConfig,
    root: &Path,
    remote: &RemoteConfig,
    token: &str,
    dry_run: bool,
) -> Result<SyncSummary> {
    let key_path = domain.key_catalog_path(root);
    if !key_path.exists() {
        bail!(
            "No key catalog for domain \"{}\" at {} (run `msgkit extract` first)",
            domain.name,
            key_path.display()
        );
    }
    let keys = EntryCollection::from_entries(read_key_catalog(&key_path)?);
    let mut translations = read_translations(domain, root)?;

    let store = LokaliseStore::new(LokaliseConfig {
        base_url: remote.base_url.clone(),
        token: token.to_string(),
        project: remote.project_id.clone(),
        platform: domain.platform.clone(),
    })?;

    let mut options = SyncOptions::new(domain.tag(), domain.platform.clone());
    options.dry_run = dry_run;
    options.concurrency = remote.concurrency;
    options.interval = Duration::from_millis(remote.interval_ms);
    options.pull = domain.pull.clone();
    let reconciler = Reconciler::new(store, options);

    let report = runtime
        .block_on(reconciler.run(&keys, &mut translations))
        .with_context(|| format!("Sync failed for domain \"{}\"", domain.name))?;

    if !dry_run {
        for (locale, catalog) in translations {
            write_trans_catalog(
                &domain.trans_catalog_path(root, &locale),
                &locale,
                catalog.into_sorted(),
            )
            .with_context(|| format!("Failed to write {} catalog", locale))?;
        }
    }

    Ok(SyncSummary {
        domain: domain.name.clone(),
        tag: domain.tag().to_string(),
        report,
    })
}

pub fn sync(cmd: SyncCommand) -> Result<CommandResult> {
    let loaded = load(&cmd.common)?;
    let config = &loaded.config;
    if config.remote.project_id.trim().is_empty() {
        bail!("'remote.projectId' is not configured");
    }
    let token = resolve_token(&cmd, &config.remote)?;
    let domains = config.select_domains(&cmd.common.domains)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let summaries = domains
        .into_iter()
        .map(|domain| {
            sync_domain(
                &runtime,
                domain,
                &loaded.root,
                &config.remote,
                &token,
                cmd.dry_run,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(finish(CommandSummary::Sync(summaries), 0, 0))
}
