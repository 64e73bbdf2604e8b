//! Direct lambda resolver for AppSync.
//!
//! AppSync invokes the function with the parent type and field name of the
//! field being resolved; [`Resolver`] maps the pair onto the post store.
//! Batched invocations (a JSON array of events) are answered with an array
//! of results in the same order.

use std::collections::HashMap;
use std::sync::Arc;

use failure::Error as Failure;
use lambda_runtime::LambdaEvent;
use serde_derive::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{into_lambda_error, Error};
use crate::store::PostStore;

/// Header AppSync uses to carry the X-Ray trace id of a request.
pub const CORRELATION_HEADER: &str = "x-amzn-trace-id";

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolverInfo {
    pub field_name: String,
    pub parent_type_name: String,
    #[serde(default)]
    pub variables: HashMap<String, Value>,
    #[serde(default)]
    pub selection_set_list: Vec<String>,
    #[serde(default, rename = "selectionSetGraphQL")]
    pub selection_set_graphql: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolverRequest {
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub domain_name: Option<String>,
}

/// Event AppSync sends to a direct lambda resolver.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolverEvent {
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
    #[serde(default)]
    pub identity: Option<Value>,
    #[serde(default)]
    pub source: Option<Value>,
    #[serde(default)]
    pub request: ResolverRequest,
    pub info: ResolverInfo,
    #[serde(default)]
    pub stash: HashMap<String, Value>,
    #[serde(default)]
    pub prev: Option<Value>,
}

impl ResolverEvent {
    pub fn correlation_id(&self) -> Option<&str> {
        self.request
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(CORRELATION_HEADER))
            .map(|(_, value)| value.as_str())
    }

    fn argument(&self, name: &str) -> Result<String, Failure> {
        match self.arguments.get(name) {
            Some(Value::String(value)) => Ok(value.to_owned()),
            Some(other) => Err(Error::InvalidArguments(
                self.info.field_name.to_owned(),
                format!("{} must be a string, got {}", name, other),
            )
            .into()),
            None => Err(Error::InvalidArguments(
                self.info.field_name.to_owned(),
                format!("missing {}", name),
            )
            .into()),
        }
    }
}

/// Single or batched resolver invocation.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ResolverPayload {
    Batch(Vec<ResolverEvent>),
    Single(Box<ResolverEvent>),
}

/// Fields this resolver knows how to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    ListPosts,
    CreatePost,
}

impl Field {
    pub fn lookup(parent_type_name: &str, field_name: &str) -> Result<Self, Failure> {
        match (parent_type_name, field_name) {
            ("Query", "listPosts") => Ok(Field::ListPosts),
            ("Mutation", "createPost") => Ok(Field::CreatePost),
            (type_name, field_name) => {
                Err(Error::UnknownField(type_name.to_owned(), field_name.to_owned()).into())
            }
        }
    }
}

/// A field with its arguments checked, ready to run.
#[derive(Clone, Debug, PartialEq)]
enum Call {
    ListPosts,
    CreatePost { title: String, content: String },
}

/// Dispatches resolver events onto a post store.
#[derive(Clone, Debug)]
pub struct Resolver {
    store: Arc<PostStore>,
}

impl Resolver {
    pub fn new(store: Arc<PostStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &PostStore {
        &self.store
    }

    /// Checks field and arguments of an event without touching the store.
    fn prepare(&self, event: &ResolverEvent) -> Result<Call, Failure> {
        match Field::lookup(&event.info.parent_type_name, &event.info.field_name)? {
            Field::ListPosts => Ok(Call::ListPosts),
            Field::CreatePost => Ok(Call::CreatePost {
                title: event.argument("title")?,
                content: event.argument("content")?,
            }),
        }
    }

    fn run(&self, event: &ResolverEvent, call: Call) -> Result<Value, Failure> {
        let span = tracing::info_span!(
            "resolve",
            field = %format!("{}.{}", event.info.parent_type_name, event.info.field_name),
            correlation_id = event.correlation_id().unwrap_or_default(),
        );
        let _guard = span.enter();
        debug!(arguments = ?event.arguments, "resolving field");
        let value = match call {
            Call::ListPosts => serde_json::to_value(self.store.list())?,
            Call::CreatePost { title, content } => {
                let post = self.store.create(title, content);
                info!(post_id = %post.id, "post created");
                serde_json::to_value(post)?
            }
        };
        Ok(value)
    }

    /// Resolves one field.
    pub fn resolve(&self, event: &ResolverEvent) -> Result<Value, Failure> {
        let call = self.prepare(event)?;
        self.run(event, call)
    }

    /// Resolves a single event or every event of a batch, in order.
    ///
    /// A batch is checked as a whole before any event runs, so a batch with
    /// one bad event leaves the store untouched.
    pub fn resolve_payload(&self, payload: &ResolverPayload) -> Result<Value, Failure> {
        match payload {
            ResolverPayload::Single(event) => self.resolve(event),
            ResolverPayload::Batch(events) => {
                let calls = events
                    .iter()
                    .map(|event| self.prepare(event))
                    .collect::<Result<Vec<_>, _>>()?;
                events
                    .iter()
                    .zip(calls)
                    .map(|(event, call)| self.run(event, call))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
        }
    }
}

/// Lambda handler for the direct resolver function.
pub async fn resolver_handler(
    resolver: &Resolver,
    event: LambdaEvent<ResolverPayload>,
) -> Result<Value, lambda_runtime::Error> {
    resolver
        .resolve_payload(&event.payload)
        .map_err(into_lambda_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(parent_type_name: &str, field_name: &str, arguments: Value) -> ResolverEvent {
        serde_json::from_value(json!({
            "arguments": arguments,
            "identity": null,
            "source": null,
            "request": {"headers": {"X-Amzn-Trace-Id": "Root=1-abc"}},
            "info": {
                "fieldName": field_name,
                "parentTypeName": parent_type_name,
                "variables": {},
                "selectionSetList": ["id", "title", "content"],
                "selectionSetGraphQL": "{\n  id\n  title\n  content\n}"
            },
            "stash": {},
            "prev": null
        }))
        .unwrap()
    }

    fn resolver() -> Resolver {
        Resolver::new(Arc::new(PostStore::seeded()))
    }

    #[test]
    fn test_list_posts_returns_seed() {
        let value = resolver()
            .resolve(&event("Query", "listPosts", json!({})))
            .unwrap();
        let posts = value.as_array().unwrap();
        assert_eq!(posts.len(), 5);
        assert_eq!(posts[0]["title"], "First Post");
        assert_eq!(posts[0]["comments"][1]["postId"], "1");
    }

    #[test]
    fn test_create_post_appends() {
        let resolver = resolver();
        let value = resolver
            .resolve(&event(
                "Mutation",
                "createPost",
                json!({"title": "T", "content": "C"}),
            ))
            .unwrap();
        assert_eq!(value["title"], "T");
        assert_eq!(value["content"], "C");
        assert_eq!(value["comments"], json!([]));
        assert_eq!(value["id"].as_str().unwrap().len(), 8);
        assert_eq!(resolver.store().len(), 6);
    }

    #[test]
    fn test_create_post_requires_string_arguments() {
        let resolver = resolver();
        let err = resolver
            .resolve(&event("Mutation", "createPost", json!({"title": "T"})))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid arguments for createPost: missing content");
        let err = resolver
            .resolve(&event(
                "Mutation",
                "createPost",
                json!({"title": 1, "content": "C"}),
            ))
            .unwrap_err();
        assert!(err.to_string().contains("title must be a string"));
        assert_eq!(resolver.store().len(), 5);
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let err = resolver()
            .resolve(&event("Query", "getPost", json!({"id": "1"})))
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown field Query.getPost");
        // type name matters, not only the field name
        assert!(Field::lookup("Query", "createPost").is_err());
    }

    #[test]
    fn test_correlation_id_header_is_case_insensitive() {
        let event = event("Query", "listPosts", json!({}));
        assert_eq!(event.correlation_id(), Some("Root=1-abc"));
    }

    #[test]
    fn test_batch_payload_resolves_in_order() {
        let payload: ResolverPayload = serde_json::from_value(json!([
            {"info": {"fieldName": "createPost", "parentTypeName": "Mutation"},
             "arguments": {"title": "a", "content": "1"}},
            {"info": {"fieldName": "listPosts", "parentTypeName": "Query"}}
        ]))
        .unwrap();
        let value = resolver().resolve_payload(&payload).unwrap();
        let results = value.as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["title"], "a");
        assert_eq!(results[1].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_batch_with_bad_event_changes_nothing() {
        let payload: ResolverPayload = serde_json::from_value(json!([
            {"info": {"fieldName": "createPost", "parentTypeName": "Mutation"},
             "arguments": {"title": "a", "content": "1"}},
            {"info": {"fieldName": "createPost", "parentTypeName": "Mutation"},
             "arguments": {"title": "b"}}
        ]))
        .unwrap();
        let resolver = resolver();
        let err = resolver.resolve_payload(&payload).unwrap_err();
        assert_eq!(err.to_string(), "Invalid arguments for createPost: missing content");
        assert_eq!(resolver.store().len(), 5);
        assert!(resolver.store().list().iter().all(|post| post.title != "a"));
    }

    #[test]
    fn test_single_payload_is_not_wrapped() {
        let payload: ResolverPayload = serde_json::from_value(json!({
            "info": {"fieldName": "listPosts", "parentTypeName": "Query"}
        }))
        .unwrap();
        assert!(matches!(payload, ResolverPayload::Single(_)));
        let value = resolver().resolve_payload(&payload).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 5);
    }
}
