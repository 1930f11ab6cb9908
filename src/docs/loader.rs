use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use axum::http::Uri;
use regex::Regex;

use crate::config::CollectionConfig;
use crate::docs::normalize::normalize;
use crate::docs::store::{Published, ViewStore};
use crate::docs::DocumentView;
use crate::openapi::RawDocument;
use crate::web::{simple_get, HttpClient};

const EXCERPT_CHARS: usize = 500;

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("could not fetch {locator}: {reason}")]
    Fetch { locator: String, reason: String },
    #[error("expected an OpenAPI document but received an HTML page")]
    ContentType,
    #[error("invalid YAML: {message}")]
    Parse { message: String, excerpt: String },
    #[error("not an OpenAPI document: {0}")]
    Structure(String),
}

impl LoadError {
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Fetch { .. } => "fetch",
            LoadError::ContentType => "content_type",
            LoadError::Parse { .. } => "parse",
            LoadError::Structure(_) => "structure",
        }
    }

    fn fetch(locator: &str, reason: impl ToString) -> Self {
        LoadError::Fetch {
            locator: locator.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Where a document lives: a remote URL or a file under the docs root.
#[derive(Debug, PartialEq)]
pub enum Locator {
    Remote(Uri),
    File(PathBuf),
}

impl Locator {
    pub fn resolve(locator: &str, docs_root: &Path) -> Result<Self, LoadError> {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            Uri::try_from(locator)
                .map(Locator::Remote)
                .map_err(|err| LoadError::fetch(locator, err))
        } else {
            Ok(Locator::File(docs_root.join(locator)))
        }
    }
}

/// A successfully loaded document: the text as fetched and its normalized view.
#[derive(Debug)]
pub struct Loaded {
    pub raw: String,
    pub view: DocumentView,
}

#[derive(Clone)]
pub struct Loader {
    client: HttpClient,
    docs_root: PathBuf,
}

impl Loader {
    pub fn new(client: HttpClient, docs_root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            docs_root: docs_root.into(),
        }
    }

    /// Runs the full pipeline for one collection. Nothing is returned unless
    /// every stage succeeds.
    pub async fn load(&self, collection: &CollectionConfig) -> Result<Loaded, LoadError> {
        let raw = self.fetch_document(&collection.url).await?;
        validate_content_looks_like_yaml(&raw)?;
        let doc = parse(&raw)?;
        let view = normalize(&collection.id, Some(&collection.name), &doc);

        tracing::info!(
            collection = %collection.id,
            endpoints = view.endpoints.len(),
            "loaded OpenAPI document"
        );

        Ok(Loaded { raw, view })
    }

    /// Loads `collection` under a fresh ticket from `store`, publishing the
    /// result if no newer load has started meanwhile. The caller gets its own
    /// result either way.
    pub async fn load_into(
        &self,
        store: &ViewStore,
        collection: &CollectionConfig,
    ) -> Result<Published, LoadError> {
        let ticket = store.begin(&collection.id).await;

        match self.load(collection).await {
            Ok(Loaded { raw, view }) => {
                let published = Published {
                    generation: ticket.generation,
                    view: Arc::new(view),
                    raw: raw.into(),
                };
                store
                    .publish(&ticket, published.view.clone(), published.raw.clone())
                    .await;
                Ok(published)
            }
            Err(err) => {
                tracing::warn!(
                    collection = %collection.id,
                    kind = err.kind(),
                    error = %err,
                    "could not load documentation"
                );
                if let LoadError::Parse { excerpt, .. } = &err {
                    tracing::debug!(collection = %collection.id, %excerpt, "unparsable document");
                }
                store.discard(&ticket).await;
                Err(err)
            }
        }
    }

    pub async fn fetch_document(&self, locator: &str) -> Result<String, LoadError> {
        match Locator::resolve(locator, &self.docs_root)? {
            Locator::Remote(uri) => {
                let (status, _headers, bytes) = simple_get(&self.client, &uri)
                    .await
                    .map_err(|err| LoadError::fetch(locator, err))?;

                if !status.is_success() {
                    return Err(LoadError::fetch(locator, format!("status {}", status)));
                }

                String::from_utf8(bytes.to_vec())
                    .map_err(|_| LoadError::fetch(locator, "response body is not valid UTF-8"))
            }
            Locator::File(path) => tokio::fs::read_to_string(&path)
                .await
                .map_err(|err| LoadError::fetch(locator, format!("{}: {}", path.display(), err))),
        }
    }
}

fn html_prefix() -> &'static Regex {
    static HTML: OnceLock<Regex> = OnceLock::new();
    HTML.get_or_init(|| Regex::new(r"(?i)^(<!doctype\s+html|<html)").expect("valid regex"))
}

/// Rejects HTML served in place of a document, usually a misrouted path
/// answered by an SPA fallback page.
pub fn validate_content_looks_like_yaml(raw: &str) -> Result<(), LoadError> {
    if html_prefix().is_match(raw.trim_start_matches('\u{feff}').trim()) {
        return Err(LoadError::ContentType);
    }
    Ok(())
}

pub fn parse(raw: &str) -> Result<RawDocument, LoadError> {
    let value: serde_yaml::Value = serde_yaml::from_str(raw).map_err(|err| LoadError::Parse {
        message: err.to_string(),
        excerpt: raw.chars().take(EXCERPT_CHARS).collect(),
    })?;

    RawDocument::from_value(value).map_err(LoadError::Structure)
}
