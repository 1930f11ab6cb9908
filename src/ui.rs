use serde::Serialize;

use crate::config::CollectionConfig;

/// Collection list shown on the documentation landing page.
#[derive(Serialize, Debug)]
pub struct DocsIndex {
    pub collections: Vec<DocsLink>,
}

#[derive(Serialize, Debug)]
pub struct DocsLink {
    pub id: String,
    pub name: String,
    pub url: String,
}

impl From<&CollectionConfig> for DocsLink {
    fn from(collection: &CollectionConfig) -> Self {
        DocsLink {
            id: collection.id.clone(),
            name: collection.name.clone(),
            url: format!("/api/docs/{}", collection.id),
        }
    }
}

/// Body of every failed documentation load. The failure kind is only logged.
#[derive(Serialize, Debug)]
pub struct LoadFailure {
    pub message: &'static str,
}

impl Default for LoadFailure {
    fn default() -> Self {
        LoadFailure {
            message: "Could not load documentation. Check the server logs for details.",
        }
    }
}
