//! Lokalise API v2 backend.
//!
//! Keys carry one name for every platform. Tag-scoped contexts travel in the
//! key's `context` field, tag-scoped comments in its `description`. Plural
//! translations are sent and received as a JSON object string.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{
    RemoteError,
    remote::{
        KeyPayload, RemoteKey, RemoteStore, RemoteTranslation, decode_comments, decode_contexts,
        encode_comments, encode_contexts,
    },
};
use crate::core::entry::PluralCategory;

pub const DEFAULT_BASE_URL: &str = "https://api.lokalise.com/api2/";

const TOKEN_HEADER: &str = "X-Api-Token";
const TOTAL_COUNT_HEADER: &str = "X-Pagination-Total-Count";

#[derive(Debug, Clone)]
pub struct LokaliseConfig {
    pub base_url: String,
    pub token: String,
    /// A project id, or a project name to look up.
    pub project: String,
    /// Platform whose key name is read from listings.
    pub platform: String,
}

#[derive(Debug)]
pub struct LokaliseStore {
    client: Client,
    config: LokaliseConfig,
    project_id: OnceCell<String>,
}

impl LokaliseStore {
    pub fn new(config: LokaliseConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(60))
            .user_agent(format!("msgkit/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            config,
            project_id: OnceCell::new(),
        })
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, RemoteError> {
        let base = if self.config.base_url.ends_with('/') {
            self.config.base_url.clone()
        } else {
            format!("{}/", self.config.base_url)
        };
        let url = format!("{base}{path}");
        let parsed = if params.is_empty() {
            Url::parse(&url)
        } else {
            Url::parse_with_params(&url, params)
        };
        parsed.map_err(|e| RemoteError::Protocol(format!("invalid url for {path}: {e}")))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(TOKEN_HEADER, &self.config.token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        Ok(self.authorized(request).send().await?.error_for_status()?)
    }

    /// Project id, resolved by name once per store.
    async fn project_id(&self) -> Result<&str, RemoteError> {
        let id = self
            .project_id
            .get_or_try_init(|| async {
                // Lokalise ids look like `123abc.456def`; anything else is a name.
                if self.config.project.contains('.') {
                    return Ok(self.config.project.clone());
                }
                let url = self.url(
                    "projects",
                    &[
                        ("filter_names", self.config.project.clone()),
                        ("limit", "1".to_string()),
                    ],
                )?;
                let listing: ProjectListing = self.send(self.client.get(url)).await?.json().await?;
                let project = listing
                    .projects
                    .into_iter()
                    .find(|p| p.name == self.config.project)
                    .ok_or_else(|| RemoteError::ProjectNotFound(self.config.project.clone()))?;
                info!(name = %project.name, id = %project.project_id, "resolved project");
                Ok::<_, RemoteError>(project.project_id)
            })
            .await?;
        Ok(id.as_str())
    }

    fn decode_key(&self, key: WireKey) -> Result<RemoteKey, RemoteError> {
        let key_name = match &key.key_name {
            Value::String(name) => name.clone(),
            Value::Object(names) => names
                .get(&self.config.platform)
                .or_else(|| names.get("other"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            other => {
                return Err(RemoteError::Protocol(format!(
                    "key {} has unexpected name {other}",
                    key.key_id
                )));
            }
        };

        let tags: BTreeSet<String> = key.tags.into_iter().collect();
        let mut translations = BTreeMap::new();
        for t in key.translations {
            let messages = decode_translation(&t.translation, key.is_plural);
            translations.insert(
                t.language_iso,
                RemoteTranslation {
                    messages,
                    is_reviewed: t.is_reviewed,
                    is_unverified: t.is_unverified,
                },
            );
        }

        Ok(RemoteKey {
            key_id: key.key_id,
            key_name,
            is_plural: key.is_plural,
            platforms: key.platforms.into_iter().collect(),
            contexts: decode_contexts(&key.context),
            comments: decode_comments(&key.description, &tags),
            tags,
            translations,
        })
    }
}

fn decode_translation(raw: &str, is_plural: bool) -> BTreeMap<PluralCategory, String> {
    if is_plural
        && let Ok(forms) = serde_json::from_str::<BTreeMap<String, String>>(raw)
    {
        return forms
            .into_iter()
            .filter_map(|(category, text)| PluralCategory::parse(&category).map(|c| (c, text)))
            .collect();
    }
    BTreeMap::from([(PluralCategory::Other, raw.to_string())])
}

fn encode_translation(messages: &BTreeMap<PluralCategory, String>, is_plural: bool) -> String {
    if is_plural {
        let forms: BTreeMap<&str, &String> =
            messages.iter().map(|(c, m)| (c.as_str(), m)).collect();
        return serde_json::to_string(&forms).unwrap_or_default();
    }
    messages
        .get(&PluralCategory::Other)
        .cloned()
        .unwrap_or_default()
}

fn encode_key(payload: &KeyPayload) -> WireKeyWrite {
    WireKeyWrite {
        key_id: payload.key_id,
        key_name: payload.key_name.clone(),
        is_plural: payload.is_plural,
        tags: payload.tags.iter().cloned().collect(),
        platforms: payload.platforms.iter().cloned().collect(),
        context: encode_contexts(&payload.contexts),
        description: encode_comments(&payload.comments),
        translations: payload
            .translations
            .iter()
            .map(|(locale, messages)| WireTranslationWrite {
                language_iso: locale.clone(),
                translation: encode_translation(messages, payload.is_plural),
                is_unverified: true,
            })
            .collect(),
    }
}

#[derive(Debug, Deserialize)]
struct ProjectListing {
    projects: Vec<WireProject>,
}

#[derive(Debug, Deserialize)]
struct WireProject {
    project_id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct KeyListing {
    keys: Vec<WireKey>,
}

#[derive(Debug, Deserialize)]
struct WireKey {
    key_id: u64,
    key_name: Value,
    #[serde(default)]
    is_plural: bool,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    platforms: Vec<String>,
    #[serde(default)]
    context: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    translations: Vec<WireTranslation>,
}

#[derive(Debug, Deserialize)]
struct WireTranslation {
    language_iso: String,
    #[serde(default)]
    translation: String,
    #[serde(default)]
    is_reviewed: bool,
    #[serde(default)]
    is_unverified: bool,
}

#[derive(Debug, Serialize)]
struct KeysWrite {
    keys: Vec<WireKeyWrite>,
}

#[derive(Debug, Serialize)]
struct WireKeyWrite {
    #[serde(skip_serializing_if = "Option::is_none")]
    key_id: Option<u64>,
    key_name: String,
    is_plural: bool,
    tags: Vec<String>,
    platforms: Vec<String>,
    context: String,
    description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    translations: Vec<WireTranslationWrite>,
}

#[derive(Debug, Serialize)]
struct WireTranslationWrite {
    language_iso: String,
    translation: String,
    is_unverified: bool,
}

impl RemoteStore for LokaliseStore {
    async fn count_keys(&self) -> Result<usize, RemoteError> {
        let project = self.project_id().await?;
        let url = self.url(
            &format!("projects/{project}/keys"),
            &[("limit", "1".to_string()), ("page", "1".to_string())],
        )?;
        let response = self.send(self.client.get(url)).await?;
        let total = response
            .headers()
            .get(TOTAL_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<usize>().ok())
            .ok_or_else(|| RemoteError::Protocol(format!("missing {TOTAL_COUNT_HEADER} header")))?;
        debug!(total, "counted remote keys");
        Ok(total)
    }

    async fn list_keys(&self, page: usize, limit: usize) -> Result<Vec<RemoteKey>, RemoteError> {
        let project = self.project_id().await?;
        let url = self.url(
            &format!("projects/{project}/keys"),
            &[
                ("include_translations", "1".to_string()),
                ("limit", limit.to_string()),
                ("page", page.to_string()),
            ],
        )?;
        let listing: KeyListing = self.send(self.client.get(url)).await?.json().await?;
        debug!(page, keys = listing.keys.len(), "fetched remote keys");
        listing
            .keys
            .into_iter()
            .map(|key| self.decode_key(key))
            .collect()
    }

    async fn create_keys(&self, keys: &[KeyPayload]) -> Result<(), RemoteError> {
        let project = self.project_id().await?;
        let url = self.url(&format!("projects/{project}/keys"), &[])?;
        let body = KeysWrite {
            keys: keys.iter().map(encode_key).collect(),
        };
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    async fn update_keys(&self, keys: &[KeyPayload]) -> Result<(), RemoteError> {
        let project = self.project_id().await?;
        let url = self.url(&format!("projects/{project}/keys"), &[])?;
        let body = KeysWrite {
            keys: keys.iter().map(encode_key).collect(),
        };
        self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> LokaliseStore {
        LokaliseStore::new(LokaliseConfig {
            base_url: "https://api.example.test/api2".into(),
            token: "secret".into(),
            project: "123.abc".into(),
            platform: "web".into(),
        })
        .unwrap()
    }

    #[test]
    fn test_url_joins_base_and_params() {
        let url = store()
            .url("projects/1.a/keys", &[("page", "2".to_string())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.test/api2/projects/1.a/keys?page=2"
        );
    }

    #[test]
    fn test_plural_translation_codec() {
        let messages = BTreeMap::from([
            (PluralCategory::One, "{n} Birne".to_string()),
            (PluralCategory::Other, "{n} Birnen".to_string()),
        ]);
        let encoded = encode_translation(&messages, true);
        assert_eq!(encoded, r#"{"one":"{n} Birne","other":"{n} Birnen"}"#);
        assert_eq!(decode_translation(&encoded, true), messages);
        assert_eq!(
            decode_translation("Apfel", false),
            BTreeMap::from([(PluralCategory::Other, "Apfel".to_string())])
        );
    }

    #[test]
    fn test_decode_key_picks_platform_name() {
        let wire: WireKey = serde_json::from_value(serde_json::json!({
            "key_id": 12,
            "key_name": { "ios": "open_button", "web": "Open", "other": "Open" },
            "tags": ["web"],
            "platforms": ["web", "ios"],
            "context": "{\"web\":[\"file.open\"]}",
            "description": "web: Toolbar",
            "translations": [
                { "language_iso": "de", "translation": "Öffnen", "is_reviewed": true }
            ]
        }))
        .unwrap();

        let key = store().decode_key(wire).unwrap();
        assert_eq!(key.key_name, "Open");
        assert_eq!(key.contexts["web"].len(), 1);
        assert!(key.comments["web"].contains("Toolbar"));
        assert!(key.translations["de"].is_reviewed);
        assert!(!key.translations["de"].is_unverified);
    }

    #[test]
    fn test_encode_key_marks_translations_unverified() {
        let payload = KeyPayload {
            key_name: "Apple".into(),
            tags: BTreeSet::from(["web".to_string()]),
            translations: BTreeMap::from([(
                "de".to_string(),
                BTreeMap::from([(PluralCategory::Other, "Apfel".to_string())]),
            )]),
            ..Default::default()
        };
        let json = serde_json::to_value(encode_key(&payload)).unwrap();
        assert!(json.get("key_id").is_none());
        assert_eq!(json["translations"][0]["translation"], "Apfel");
        assert_eq!(json["translations"][0]["is_unverified"], true);
    }
}
