mod handler;

use std::sync::Arc;

use crate::config::Config;
use crate::docs::loader::Loader;
use crate::docs::store::ViewStore;
use crate::web::handler::{
    docs_index_handler, document_handler, endpoint_handler, endpoints_handler, login_handler,
    raw_document_handler,
};
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, Uri};
use axum::routing::{get, post};
use axum::Router;
use axum_macros::FromRef;
use hyper::client::HttpConnector;
use hyper_rustls::HttpsConnector;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

type HyperHttpsClient = hyper::client::Client<HttpsConnector<HttpConnector>, Body>;
type HyperHttpClient = hyper::client::Client<HttpConnector, Body>;

/// Outbound client for documents hosted elsewhere.
#[derive(Clone)]
pub struct HttpClient {
    https_client: HyperHttpsClient,
    http_client: HyperHttpClient,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            https_client: new_hyper_https_client(),
            http_client: Default::default(),
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn new_hyper_https_client() -> HyperHttpsClient {
    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_only()
        .enable_http1()
        .build();

    hyper::Client::builder().build(https)
}

pub async fn simple_get(
    client: &HttpClient,
    uri: &Uri,
) -> Result<(StatusCode, HeaderMap, Bytes), HttpError> {
    let request = Request::get(uri.clone()).body(Body::empty())?;

    let response = match uri.scheme_str().unwrap_or("http") {
        "http" => client.http_client.request(request).await?,
        "https" => client.https_client.request(request).await?,
        other => return Err(HttpError::UnsupportedScheme(other.to_string())),
    };

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = hyper::body::to_bytes(response.into_body()).await?;

    Ok((status, headers, bytes))
}

#[derive(thiserror::Error, Debug)]
pub enum HttpError {
    #[error("transport error: {0}")]
    Transport(#[from] hyper::Error),
    #[error("invalid request: {0}")]
    Request(#[from] axum::http::Error),
    #[error("unsupported scheme `{0}`")]
    UnsupportedScheme(String),
}

#[derive(Clone, FromRef)]
pub struct AppState {
    pub config: Arc<Config>,
    pub loader: Loader,
    pub store: Arc<ViewStore>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            loader: Loader::new(HttpClient::new(), config.docs_root.clone()),
            store: Arc::new(ViewStore::new()),
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let static_dir = &state.config.static_dir;
    let serve_dir = ServeDir::new(static_dir)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/login", post(login_handler))
        .route("/api/docs", get(docs_index_handler))
        .route("/api/docs/:id", get(document_handler))
        .route("/api/docs/:id/raw", get(raw_document_handler))
        .route("/api/docs/:id/endpoints", get(endpoints_handler))
        .route("/api/docs/:id/endpoints/:endpoint_id", get(endpoint_handler))
        .fallback_service(serve_dir)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve_with_config(state: AppState) -> Result<(), hyper::Error> {
    let addr = state.config.listen;
    let app = router(state);

    tracing::info!("SAGE console listening on {}", addr);
    axum::Server::try_bind(&addr)?
        .serve(app.into_make_service())
        .await
}
