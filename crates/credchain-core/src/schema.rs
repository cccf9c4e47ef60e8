//! Schema resolution, recursive reference import and subject validation.
//!
//! Schema identifiers come in three shapes: the well-known JSON Schema
//! draft-07 meta-specification (served from an embedded copy, never the
//! network), ledger-qualified ids resolved through the schema service
//! collaborator, and absolute http(s) locators fetched directly. Anything
//! else is rejected up front instead of probing both paths.
use async_trait::async_trait;
use jsonschema::{Retrieve, Uri, Validator};
use lazy_static::lazy_static;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

use crate::one_or_many::OneOrMany;
use crate::vc::Credential;

/// Prefix qualifying a ledger schema id.
pub const SCHEMA_QUALIFIER: &str = "schema:credchain:";
/// Hyphenated spelling of the qualifier as it appears inside `$ref` values,
/// where colons collide with URI punctuation.
pub const SCHEMA_QUALIFIER_HYPHENATED: &str = "schema-credchain-";
/// Identifier of the embedded JSON Schema meta-specification.
pub const META_SCHEMA_URL: &str = "https://json-schema.org/draft-07/schema";

lazy_static! {
    static ref META_SCHEMA: Value = serde_json::from_str(include_str!(
        "../schemas/draft-07.schema.json"
    ))
    .expect("embedded draft-07 meta-schema is valid JSON");
}

/// The embedded copy of the draft-07 meta-specification.
pub fn meta_schema() -> &'static Value {
    &META_SCHEMA
}

/// An error relating to schema resolution or validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A locator fetch failed or returned a non-JSON body.
    #[error("Failed to fetch schema from locator: {0}.")]
    Fetch(String),
    /// The identifier is neither a locator nor a recognized ledger id.
    #[error("Unresolvable schema identifier: {0}.")]
    Resolution(String),
    /// A schema was declared but no schema service was supplied.
    #[error("A schema service is required to validate the declared credential schema.")]
    ServiceRequired,
    /// The resolved document is not usable as a schema.
    #[error("Invalid schema document: {0}.")]
    InvalidSchemaDocument(String),
    /// The subject did not conform to the resolved schema.
    #[error("Schema validation failed: {0}.")]
    Validation(String),
}

/// Fetches schema documents by ledger-qualified id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchemaService: Send + Sync {
    async fn get(&self, schema_id: &str) -> Result<Value, SchemaError>;
}

/// A schema identifier, classified before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaRef {
    MetaSchema,
    Ledger(String),
    Locator(String),
}

impl SchemaRef {
    pub fn classify(id: &str) -> Result<Self, SchemaError> {
        let trimmed = id.trim_end_matches('#');
        if trimmed == META_SCHEMA_URL || trimmed == "http://json-schema.org/draft-07/schema" {
            return Ok(SchemaRef::MetaSchema);
        }
        if let Some(rest) = id.strip_prefix(SCHEMA_QUALIFIER) {
            if !rest.is_empty() {
                return Ok(SchemaRef::Ledger(id.to_string()));
            }
        }
        if id.starts_with("http://") || id.starts_with("https://") {
            return Ok(SchemaRef::Locator(id.to_string()));
        }
        Err(SchemaError::Resolution(id.to_string()))
    }
}

/// Resolves one schema identifier to its JSON body.
pub async fn resolve_schema(
    schema_id: &str,
    service: Option<&dyn SchemaService>,
    http: &reqwest::Client,
) -> Result<Value, SchemaError> {
    match SchemaRef::classify(schema_id)? {
        SchemaRef::MetaSchema => Ok(meta_schema().clone()),
        SchemaRef::Ledger(id) => match service {
            Some(service) => {
                log::debug!("resolving ledger schema {id}");
                service.get(&id).await
            }
            None => Err(SchemaError::ServiceRequired),
        },
        SchemaRef::Locator(url) => {
            log::debug!("fetching schema from locator {url}");
            let response = http
                .get(&url)
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(|err| SchemaError::Fetch(err.to_string()))?;
            response
                .json::<Value>()
                .await
                .map_err(|err| SchemaError::Fetch(err.to_string()))
        }
    }
}

/// Working set of one schema import. Owned by a single validation call and
/// discarded with it.
#[derive(Debug, Default)]
pub struct SchemaImportState {
    resources: HashMap<String, Value>,
    queue: VecDeque<String>,
    seen: HashSet<String>,
}

impl SchemaImportState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn resource(&self, id: &str) -> Option<&Value> {
        self.resources.get(id)
    }
}

/// Registers `root` and drains its cross-reference closure into `state`.
///
/// Each popped reference is rewritten from the hyphenated ledger spelling to
/// the canonical qualified form, references under the root schema's own
/// namespace are skipped, and a reference is never re-queued once seen, so
/// the loop is finite.
pub async fn import_schema_graph(
    state: &mut SchemaImportState,
    root: &Value,
    service: Option<&dyn SchemaService>,
    http: &reqwest::Client,
) -> Result<Value, SchemaError> {
    if !root.is_object() {
        return Err(SchemaError::InvalidSchemaDocument(
            "schema root must be a JSON object".to_string(),
        ));
    }
    let mut root = root.clone();
    normalize_ledger_refs(&mut root);

    let root_id = root
        .get("$id")
        .and_then(Value::as_str)
        .map(|id| id.trim_end_matches('#').to_string())
        .unwrap_or_default();
    if !root_id.is_empty() {
        state.seen.insert(root_id.clone());
        state.resources.insert(root_id.clone(), root.clone());
    }
    collect_references(&root, &mut state.queue);

    while let Some(reference) = state.queue.pop_front() {
        let reference = normalize_reference(&reference);
        if is_internal_reference(&reference, &root_id) || state.seen.contains(&reference) {
            continue;
        }
        let mut resolved = resolve_schema(&reference, service, http).await?;
        normalize_ledger_refs(&mut resolved);
        state.seen.insert(reference.clone());
        collect_references(&resolved, &mut state.queue);
        state.resources.insert(reference, resolved);
    }
    Ok(root)
}

// Rewrites every `$ref` carrying the hyphenated ledger qualifier in place.
fn normalize_ledger_refs(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get_mut("$ref") {
                *reference = normalize_reference(reference);
            }
            for entry in map.values_mut() {
                normalize_ledger_refs(entry);
            }
        }
        Value::Array(items) => {
            for item in items {
                normalize_ledger_refs(item);
            }
        }
        _ => {}
    }
}

fn normalize_reference(reference: &str) -> String {
    match reference.strip_prefix(SCHEMA_QUALIFIER_HYPHENATED) {
        Some(rest) => format!("{SCHEMA_QUALIFIER}{rest}"),
        None => reference.to_string(),
    }
}

// Fragment-only references and references under the root schema's own id
// (its definitions namespace included) resolve inside the document.
fn is_internal_reference(reference: &str, root_id: &str) -> bool {
    if reference.starts_with('#') {
        return true;
    }
    if root_id.is_empty() {
        return false;
    }
    reference.trim_end_matches('#') == root_id || reference.starts_with(&format!("{root_id}#"))
}

fn collect_references(value: &Value, queue: &mut VecDeque<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                queue.push_back(reference.clone());
            }
            for entry in map.values() {
                collect_references(entry, queue);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, queue);
            }
        }
        _ => {}
    }
}

// Serves pre-imported resources to the validator; never touches the network.
struct ImportedSchemaRetriever {
    resources: HashMap<String, Value>,
}

impl Retrieve for ImportedSchemaRetriever {
    fn retrieve(&self, uri: &Uri<&str>) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        if let Some(value) = self.resources.get(uri_str) {
            return Ok(value.clone());
        }
        let trimmed = uri_str.trim_end_matches('#');
        if let Some(value) = self.resources.get(trimmed) {
            return Ok(value.clone());
        }
        if matches!(SchemaRef::classify(uri_str), Ok(SchemaRef::MetaSchema)) {
            return Ok(meta_schema().clone());
        }
        Err(format!("unresolved schema reference: {uri_str}").into())
    }
}

/// Compiles a draft-07 validator for the imported schema graph.
pub fn compile_validator(
    root: &Value,
    state: SchemaImportState,
) -> Result<Validator, SchemaError> {
    let mut options = jsonschema::options();
    options.with_draft(jsonschema::Draft::Draft7);
    options.with_retriever(ImportedSchemaRetriever {
        resources: state.resources,
    });
    options
        .build(root)
        .map_err(|err| SchemaError::InvalidSchemaDocument(err.to_string()))
}

/// Resolves the credential's declared schema and validates every subject
/// against it.
///
/// The `id` property is stripped from each subject copy before validation
/// unless the schema's `required` list explicitly demands it: subject ids
/// are graph references, not claims.
pub async fn validate_credential_schema(
    credential: &Credential,
    service: Option<&dyn SchemaService>,
) -> Result<(), SchemaError> {
    let declared = credential
        .credential_schema
        .as_ref()
        .ok_or_else(|| SchemaError::Resolution("credential declares no schema".to_string()))?;
    let http = reqwest::Client::new();
    let root = resolve_schema(&declared.id, service, &http).await?;

    let mut state = SchemaImportState::new();
    let root = import_schema_graph(&mut state, &root, service, &http).await?;
    let validator = compile_validator(&root, state)?;

    validate_subjects(&root, &validator, &credential.credential_subject)
}

fn validate_subjects(
    root: &Value,
    validator: &Validator,
    subjects: &OneOrMany<Value>,
) -> Result<(), SchemaError> {
    let requires_id = root
        .get("required")
        .and_then(Value::as_array)
        .map(|required| required.iter().any(|entry| entry == "id"))
        .unwrap_or(false);

    let mut violations = Vec::new();
    for subject in subjects {
        let mut instance = subject.clone();
        if !requires_id {
            if let Value::Object(map) = &mut instance {
                map.remove("id");
            }
        }
        for error in validator.iter_errors(&instance) {
            violations.push(format!("{}: {}", error.instance_path, error));
        }
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Validation(violations.join("; ")))
    }
}
