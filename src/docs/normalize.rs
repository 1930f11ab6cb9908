use std::collections::HashSet;

use indexmap::IndexSet;
use serde_yaml::{Mapping, Value};

use crate::docs::{
    DocumentView, EndpointDescriptor, Parameter, ParameterLocation, Response, DEFAULT_BASE_URL,
    DEFAULT_NAME, DEFAULT_VERSION, METHODS, STATUS_ACTIVE,
};
use crate::openapi::{key_to_string, pretty_json, RawDocument, ValueExt};

const JSON_CONTENT: &str = "application/json";

/// Flattens every recognized operation of `doc` into a [`DocumentView`].
///
/// `name` is the configured collection name; the document title and then
/// [`DEFAULT_NAME`] are used when it is absent.
pub fn normalize(id: &str, name: Option<&str>, doc: &RawDocument) -> DocumentView {
    let mut seen_ids = HashSet::new();

    let endpoints = doc
        .paths()
        .flat_map(|(path, methods)| collect_operations(path, methods))
        .map(|mut endpoint| {
            endpoint.id = unique_id(&mut seen_ids, endpoint.id);
            endpoint
        })
        .collect();

    DocumentView {
        id: id.to_string(),
        name: name
            .or_else(|| doc.title())
            .unwrap_or(DEFAULT_NAME)
            .to_string(),
        version: doc.version().unwrap_or(DEFAULT_VERSION).to_string(),
        status: STATUS_ACTIVE,
        description: doc.description().unwrap_or_default().to_string(),
        base_url: doc.first_server_url().unwrap_or(DEFAULT_BASE_URL).to_string(),
        endpoints,
    }
}

/// Returns `id`, or `id-2`, `id-3`, ... when it has already been handed out.
fn unique_id(seen: &mut HashSet<String>, id: String) -> String {
    let mut candidate = id.clone();
    let mut suffix = 1;
    while seen.contains(&candidate) {
        suffix += 1;
        candidate = format!("{}-{}", id, suffix);
    }
    seen.insert(candidate.clone());
    candidate
}

fn collect_operations(path: String, methods: &Mapping) -> Vec<EndpointDescriptor> {
    methods
        .iter()
        .filter_map(|(method, operation)| {
            let method = key_to_string(method)?.to_lowercase();
            if !METHODS.contains(&method.as_str()) {
                return None;
            }
            Some(endpoint(&method, &path, operation))
        })
        .collect()
}

fn endpoint(method: &str, path: &str, operation: &Value) -> EndpointDescriptor {
    let id = operation
        .str_field("operationId")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}-{}", method, path.replace('/', "-")));

    let method = method.to_uppercase();

    let name = operation
        .str_field("summary")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} {}", method, path));

    EndpointDescriptor {
        id,
        name,
        method,
        path: path.to_string(),
        description: operation.str_field("description").unwrap_or_default().to_string(),
        tags: tags(operation),
        parameters: parameters(operation),
        request_body: operation
            .at(&["requestBody", "content", JSON_CONTENT, "schema", "example"])
            .and_then(pretty_json),
        responses: responses(operation),
    }
}

fn tags(operation: &Value) -> IndexSet<String> {
    operation
        .seq_field("tags")
        .into_iter()
        .flatten()
        .filter_map(|tag| tag.as_str().map(str::to_string))
        .collect()
}

fn parameters(operation: &Value) -> Vec<Parameter> {
    operation
        .seq_field("parameters")
        .into_iter()
        .flatten()
        .filter_map(parameter)
        .collect()
}

/// Any mapping entry becomes a parameter; a missing `in` means `query`.
fn parameter(raw: &Value) -> Option<Parameter> {
    raw.as_mapping()?;

    let location = raw
        .str_field("in")
        .map(ParameterLocation::parse)
        .unwrap_or_default();

    // Swagger 2 puts the type on the parameter itself.
    let schema_type = raw
        .at(&["schema", "type"])
        .and_then(Value::as_str)
        .or_else(|| raw.str_field("type"))
        .unwrap_or("string");

    Some(Parameter {
        name: raw.str_field("name").unwrap_or_default().to_string(),
        location,
        required: raw.bool_field("required").unwrap_or(false),
        schema_type: schema_type.to_string(),
        description: raw.str_field("description").unwrap_or_default().to_string(),
    })
}

fn responses(operation: &Value) -> Vec<Response> {
    operation
        .mapping_field("responses")
        .into_iter()
        .flatten()
        .filter_map(|(code, response)| {
            let code = key_to_string(code)?;
            let description = response
                .str_field("description")
                .map(str::to_string)
                .unwrap_or_else(|| format!("Response {}", code));

            Some(Response {
                example: response_example(response).and_then(pretty_json),
                code,
                description,
            })
        })
        .collect()
}

/// `examples` (first entry's value) wins over `example`, which wins over
/// `schema.example`.
fn response_example(response: &Value) -> Option<&Value> {
    let content = response.at(&["content", JSON_CONTENT])?;

    content
        .mapping_field("examples")
        .and_then(|examples| examples.values().next())
        .and_then(|first| first.field("value"))
        .or_else(|| content.field("example"))
        .or_else(|| content.at(&["schema", "example"]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> RawDocument {
        RawDocument::from_value(serde_yaml::from_str(text).unwrap()).unwrap()
    }

    #[test]
    fn defaults_for_bare_document() {
        let view = normalize("bare", None, &doc("paths: {}"));

        assert_eq!(view.name, DEFAULT_NAME);
        assert_eq!(view.version, DEFAULT_VERSION);
        assert_eq!(view.status, STATUS_ACTIVE);
        assert_eq!(view.description, "");
        assert_eq!(view.base_url, DEFAULT_BASE_URL);
        assert!(view.endpoints.is_empty());
    }

    #[test]
    fn configured_name_beats_title() {
        let raw = doc("info:\n  title: From Doc\npaths: {}");
        assert_eq!(normalize("a", Some("Configured"), &raw).name, "Configured");
        assert_eq!(normalize("a", None, &raw).name, "From Doc");
    }

    #[test]
    fn derived_id_and_name() {
        let view = normalize("a", None, &doc("paths:\n  /users/{id}:\n    get: {}"));
        let endpoint = &view.endpoints[0];

        assert_eq!(endpoint.id, "get--users-{id}");
        assert_eq!(endpoint.name, "GET /users/{id}");
        assert_eq!(endpoint.method, "GET");
    }

    #[test]
    fn uppercase_method_keys_are_recognized() {
        let view = normalize("a", None, &doc("paths:\n  /ping:\n    POST:\n      summary: Ping"));
        assert_eq!(view.endpoints.len(), 1);
        assert_eq!(view.endpoints[0].method, "POST");
        assert_eq!(view.endpoints[0].id, "post--ping");
    }

    #[test]
    fn duplicate_ids_get_suffixes() {
        let view = normalize(
            "a",
            None,
            &doc("paths:\n  /a:\n    get:\n      operationId: same\n  /b:\n    get:\n      operationId: same"),
        );
        let ids: Vec<_> = view.endpoints.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["same", "same-2"]);

        let view = normalize(
            "a",
            None,
            &doc("paths:\n  /a:\n    get:\n      operationId: same\n  /b:\n    get:\n      operationId: same\n  /c:\n    get:\n      operationId: same-2"),
        );
        let ids: Vec<_> = view.endpoints.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["same", "same-2", "same-2-2"]);
        assert_eq!(view.select_endpoint("same-2-2").unwrap().path, "/c");
    }

    #[test]
    fn tags_drop_duplicates_keep_order() {
        let view = normalize(
            "a",
            None,
            &doc("paths:\n  /a:\n    get:\n      tags: [billing, admin, billing]"),
        );
        let tags: Vec<_> = view.endpoints[0].tags.iter().cloned().collect();
        assert_eq!(tags, vec!["billing", "admin"]);
    }

    #[test]
    fn swagger_two_parameter_type() {
        let view = normalize(
            "a",
            None,
            &doc("paths:\n  /a:\n    get:\n      parameters:\n        - name: limit\n          in: query\n          type: integer"),
        );
        assert_eq!(view.endpoints[0].parameters[0].schema_type, "integer");
    }

    #[test]
    fn parameters_keep_unknown_or_missing_locations() {
        let view = normalize(
            "a",
            None,
            &doc("paths:\n  /a:\n    post:\n      parameters:\n        - name: payload\n          in: body\n        - name: nolocation\n        - name: page\n          in: query\n        - just-a-string"),
        );
        let params = &view.endpoints[0].parameters;

        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["payload", "nolocation", "page"]);
        assert_eq!(params[0].location, ParameterLocation::Other("body".to_string()));
        assert_eq!(params[1].location, ParameterLocation::Query);
        assert_eq!(params[2].location, ParameterLocation::Query);

        let json = serde_json::to_value(&params[0]).unwrap();
        assert_eq!(json["in"], "body");
        assert_eq!(json["type"], "string");
    }
}
