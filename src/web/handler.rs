use std::sync::Arc;

use crate::auth::{self, LoginRequest, LoginResponse};
use crate::config::{CollectionConfig, Config};
use crate::docs::loader::{LoadError, Loader};
use crate::docs::store::{Published, ViewStore};
use crate::ui::{DocsIndex, DocsLink, LoadFailure};
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
pub struct EndpointQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn login_handler(
    State(config): State<Arc<Config>>,
    Json(request): Json<LoginRequest>,
) -> (StatusCode, Json<LoginResponse>) {
    let response = auth::login(&config.auth, &request);

    if response.success {
        (StatusCode::OK, Json(response))
    } else {
        tracing::info!(email = %request.email, "rejected login");
        (StatusCode::UNAUTHORIZED, Json(response))
    }
}

pub async fn docs_index_handler(State(config): State<Arc<Config>>) -> Json<DocsIndex> {
    Json(DocsIndex {
        collections: config.collections.iter().map(DocsLink::from).collect(),
    })
}

/// Selecting a collection always triggers a fresh load.
pub async fn document_handler(
    State(config): State<Arc<Config>>,
    State(loader): State<Loader>,
    State(store): State<Arc<ViewStore>>,
    Path(id): Path<String>,
) -> Response {
    let Some(collection) = config.collection(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match loader.load_into(&store, collection).await {
        Ok(published) => Json(published.view.as_ref()).into_response(),
        Err(_) => load_failure(),
    }
}

pub async fn endpoints_handler(
    State(config): State<Arc<Config>>,
    State(loader): State<Loader>,
    State(store): State<Arc<ViewStore>>,
    Path(id): Path<String>,
    Query(query): Query<EndpointQuery>,
) -> Response {
    let Some(collection) = config.collection(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match current(&loader, &store, collection).await {
        Ok(published) => Json(published.view.filter_endpoints(&query.q)).into_response(),
        Err(_) => load_failure(),
    }
}

pub async fn endpoint_handler(
    State(config): State<Arc<Config>>,
    State(loader): State<Loader>,
    State(store): State<Arc<ViewStore>>,
    Path((id, endpoint_id)): Path<(String, String)>,
) -> Response {
    let Some(collection) = config.collection(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match current(&loader, &store, collection).await {
        Ok(published) => match published.view.select_endpoint(&endpoint_id) {
            Some(endpoint) => Json(endpoint).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        Err(_) => load_failure(),
    }
}

pub async fn raw_document_handler(
    State(config): State<Arc<Config>>,
    State(loader): State<Loader>,
    State(store): State<Arc<ViewStore>>,
    Path(id): Path<String>,
) -> Response {
    let Some(collection) = config.collection(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match current(&loader, &store, collection).await {
        Ok(published) => (
            [(CONTENT_TYPE, raw_content_type(&collection.url))],
            published.raw.to_string(),
        )
            .into_response(),
        Err(_) => load_failure(),
    }
}

/// The published view, loading the collection first if nothing is published.
async fn current(
    loader: &Loader,
    store: &ViewStore,
    collection: &CollectionConfig,
) -> Result<Published, LoadError> {
    match store.get(&collection.id).await {
        Some(published) => Ok(published),
        None => loader.load_into(store, collection).await,
    }
}

fn raw_content_type(locator: &str) -> &'static str {
    if locator.to_lowercase().ends_with(".json") {
        "application/json"
    } else {
        "application/yaml"
    }
}

fn load_failure() -> Response {
    (StatusCode::BAD_GATEWAY, Json(LoadFailure::default())).into_response()
}
