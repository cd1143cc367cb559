use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::core::{
    extract::{DialectKind, ExtractOptions, Keyword, Marker, ObjectAttr, compile_attr_pattern},
    plural::plural_categories,
    sync::{PullPolicy, lokalise::DEFAULT_BASE_URL},
};

pub const CONFIG_FILE_NAME: &str = ".msgkitrc.json";

pub const KEY_CATALOG_FILE: &str = "keys.json";

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_domains")]
    pub domains: Vec<DomainConfig>,
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// One set of sources with its own catalogs and remote tag.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainConfig {
    pub name: String,
    /// Remote tag; defaults to the domain name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,
    #[serde(default = "default_base_locale")]
    pub base_locale: String,
    #[serde(default)]
    pub skip_validation: bool,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pull: BTreeMap<String, PullPolicy>,
}

/// Files of one dialect and how to read them.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    pub dialect: DialectKind,
    /// Globs relative to the project root; dialect defaults when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignores: Vec<String>,
    /// Replaces the dialect's keywords when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value_attr_names: Vec<String>,
    /// Attribute name to dotted property paths.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub object_attrs: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr_attrs: Option<Vec<String>>,
    /// `[start, end]` pairs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<Vec<[String; 2]>>,
    #[serde(default)]
    pub allow_space_in_id: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    /// Project id, or project name to look up.
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_domains() -> Vec<DomainConfig> {
    vec![DomainConfig::default()]
}

fn default_platform() -> String {
    "web".to_string()
}

fn default_output_dir() -> String {
    "./i18n".to_string()
}

fn default_locales() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_base_locale() -> String {
    "en".to_string()
}

fn default_sources() -> Vec<SourceConfig> {
    vec![SourceConfig::new(DialectKind::Js)]
}

fn default_token_env() -> String {
    "LOKALISE_API_TOKEN".to_string()
}

fn default_concurrency() -> usize {
    6
}

fn default_interval_ms() -> u64 {
    200
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domains: default_domains(),
            remote: RemoteConfig::default(),
        }
    }
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            name: "messages".to_string(),
            tag: None,
            platform: default_platform(),
            output_dir: default_output_dir(),
            locales: default_locales(),
            base_locale: default_base_locale(),
            skip_validation: false,
            sources: default_sources(),
            pull: BTreeMap::new(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            token_env: default_token_env(),
            concurrency: default_concurrency(),
            interval_ms: default_interval_ms(),
            base_url: default_base_url(),
        }
    }
}

impl SourceConfig {
    pub fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            includes: Vec::new(),
            ignores: Vec::new(),
            keywords: None,
            tag_names: None,
            attr_names: None,
            value_attr_names: Vec::new(),
            object_attrs: BTreeMap::new(),
            expr_attrs: None,
            markers: None,
            allow_space_in_id: false,
        }
    }

    pub fn include_patterns(&self) -> Vec<String> {
        if self.includes.is_empty() {
            self.dialect
                .default_includes()
                .iter()
                .map(|p| p.to_string())
                .collect()
        } else {
            self.includes.clone()
        }
    }

    /// Dialect defaults overlaid with the configured fields.
    pub fn extract_options(&self) -> Result<ExtractOptions> {
        let mut options = self.dialect.default_options();
        options.verbatim_ids = self.allow_space_in_id;

        if let Some(keywords) = &self.keywords {
            options.keywords = keywords
                .iter()
                .map(|k| k.parse::<Keyword>())
                .collect::<Result<_, _>>()
                .with_context(|| format!("Invalid keyword in {} source", self.dialect))?;
        }

        let markup = &mut options.markup;
        if let Some(tag_names) = &self.tag_names {
            markup.tag_names = tag_names.clone();
        }
        if let Some(attr_names) = &self.attr_names {
            markup.attr_names = attr_names.clone();
        }
        markup.value_attr_names = self.value_attr_names.clone();
        markup.object_attrs = self
            .object_attrs
            .iter()
            .map(|(name, paths)| {
                let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
                ObjectAttr::new(name.clone(), &paths)
            })
            .collect();
        if let Some(expr_attrs) = &self.expr_attrs {
            markup.expr_attrs = expr_attrs
                .iter()
                .map(|p| compile_attr_pattern(p))
                .collect::<Result<_, _>>()
                .with_context(|| format!("Invalid exprAttrs in {} source", self.dialect))?;
        }
        if let Some(markers) = &self.markers {
            markup.markers = markers
                .iter()
                .map(|[start, end]| Marker::new(start.clone(), end.clone()))
                .collect();
        }

        Ok(options)
    }

    fn validate(&self) -> Result<()> {
        for pattern in self.include_patterns().iter().chain(&self.ignores) {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern: \"{}\"", pattern))?;
        }
        if let Some(markers) = &self.markers
            && markers.iter().any(|[start, end]| start.is_empty() || end.is_empty())
        {
            bail!("Markers must not be empty in {} source", self.dialect);
        }
        self.extract_options().map(|_| ())
    }
}

impl DomainConfig {
    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(&self.name)
    }

    pub fn key_catalog_path(&self, root: &Path) -> PathBuf {
        root.join(&self.output_dir).join(KEY_CATALOG_FILE)
    }

    pub fn trans_catalog_path(&self, root: &Path, locale: &str) -> PathBuf {
        root.join(&self.output_dir).join(format!("{}.json", locale))
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Domain name must not be empty");
        }
        for locale in self.locales.iter().chain([&self.base_locale]) {
            plural_categories(locale)
                .with_context(|| format!("Invalid locale in domain \"{}\"", self.name))?;
        }
        if !self.locales.contains(&self.base_locale) {
            bail!(
                "Base locale \"{}\" of domain \"{}\" is not listed in 'locales'",
                self.base_locale,
                self.name
            );
        }
        for source in &self.sources {
            source
                .validate()
                .with_context(|| format!("Invalid source in domain \"{}\"", self.name))?;
        }
        Ok(())
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Rejects bad globs, patterns, keywords, unknown locales and duplicate
    /// domain names.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for domain in &self.domains {
            if !seen.insert(domain.name.as_str()) {
                bail!("Duplicate domain name: \"{}\"", domain.name);
            }
            domain.validate()?;
        }
        Ok(())
    }

    /// Domains selected by name; all of them when `names` is empty.
    pub fn select_domains(&self, names: &[String]) -> Result<Vec<&DomainConfig>> {
        if names.is_empty() {
            return Ok(self.domains.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                self.domains
                    .iter()
                    .find(|d| &d.name == name)
                    .with_context(|| format!("Unknown domain: \"{}\"", name))
            })
            .collect()
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// Directory relative paths resolve against.
    pub root: PathBuf,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            let root = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| start_dir.to_path_buf());
            Ok(ConfigLoadResult {
                config,
                root,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            root: start_dir.to_path_buf(),
            from_file: false,
        }),
    }
}
