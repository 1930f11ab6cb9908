pub mod loader;
pub mod normalize;
pub mod store;

use indexmap::IndexSet;
use serde::{Serialize, Serializer};

pub const DEFAULT_NAME: &str = "API Documentation";
pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_BASE_URL: &str = "https://api.example.com";
pub const STATUS_ACTIVE: &str = "active";

/// Methods that produce endpoints. Anything else under a path is skipped.
pub const METHODS: [&str; 5] = ["get", "post", "put", "delete", "patch"];

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub id: String,
    pub name: String,
    pub version: String,
    pub status: &'static str,
    pub description: String,
    pub base_url: String,
    pub endpoints: Vec<EndpointDescriptor>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    pub id: String,
    pub name: String,
    pub method: String,
    pub path: String,
    pub description: String,
    pub tags: IndexSet<String>,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<String>,
    pub responses: Vec<Response>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub required: bool,
    #[serde(rename = "type")]
    pub schema_type: String,
    pub description: String,
}

/// Where a parameter is sent. Locations outside OpenAPI 3 (Swagger 2 `body`,
/// `formData`) are kept verbatim in `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ParameterLocation {
    #[default]
    Query,
    Path,
    Header,
    Cookie,
    Other(String),
}

impl ParameterLocation {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "query" => Self::Query,
            "path" => Self::Path,
            "header" => Self::Header,
            "cookie" => Self::Cookie,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Query => "query",
            Self::Path => "path",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Other(raw) => raw,
        }
    }
}

impl Serialize for ParameterLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Response {
    pub code: String,
    pub description: String,
    pub example: Option<String>,
}

impl DocumentView {
    /// Endpoint with the given id, or the first endpoint when there is no
    /// match. `None` only for a view without endpoints.
    pub fn select_endpoint(&self, id: &str) -> Option<&EndpointDescriptor> {
        self.endpoints
            .iter()
            .find(|endpoint| endpoint.id == id)
            .or_else(|| self.endpoints.first())
    }

    /// Case-insensitive substring search over endpoint name and path.
    pub fn filter_endpoints(&self, query: &str) -> Vec<&EndpointDescriptor> {
        if query.is_empty() {
            return self.endpoints.iter().collect();
        }

        let query = query.to_lowercase();
        self.endpoints
            .iter()
            .filter(|endpoint| endpoint.matches(&query))
            .collect()
    }
}

impl EndpointDescriptor {
    fn matches(&self, lowercase_query: &str) -> bool {
        self.name.to_lowercase().contains(lowercase_query)
            || self.path.to_lowercase().contains(lowercase_query)
    }
}
