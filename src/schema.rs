use std::sync::Arc;

use juniper::{graphql_object, graphql_value, EmptySubscription, FieldError, FieldResult};

use crate::auth::Identity;
use crate::model::Post;
use crate::store::PostStore;

///
/// Context for Juniper
///
pub struct Context {
    pub store: Arc<PostStore>,
    /// author of request
    pub identity: Identity,
    /// fields the author may not resolve, as `Type.field`
    pub denied_fields: Vec<String>,
}

impl juniper::Context for Context {}

impl Context {
    pub fn new(store: Arc<PostStore>, identity: Identity, denied_fields: Vec<String>) -> Self {
        Self {
            store,
            identity,
            denied_fields,
        }
    }

    /// Fails with AppSync's `Unauthorized` error when the field is denied.
    fn check_field(&self, type_name: &str, field_name: &str) -> FieldResult<()> {
        let field = format!("{}.{}", type_name, field_name);
        if self.denied_fields.iter().any(|denied| *denied == field) {
            return Err(FieldError::new(
                format!(
                    "Not Authorized to access {} on type {}",
                    field_name, type_name
                ),
                graphql_value!({ "errorType": "Unauthorized" }),
            ));
        }
        Ok(())
    }
}

pub struct Query;

#[graphql_object(context = Context)]
impl Query {
    ///
    /// Get all posts
    ///
    fn list_posts(context: &Context) -> FieldResult<Vec<Post>> {
        context.check_field("Query", "listPosts")?;
        Ok(context.store.list())
    }
}

pub struct Mutation;

#[graphql_object(context = Context)]
impl Mutation {
    ///
    /// Create new post without comments
    ///
    fn create_post(context: &Context, title: String, content: String) -> FieldResult<Post> {
        context.check_field("Mutation", "createPost")?;
        let post = context.store.create(title, content);
        tracing::info!(post_id = %post.id, user_id = %context.identity.id, "post created");
        Ok(post)
    }
}

pub type Schema = juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

pub fn schema() -> Schema {
    Schema::new(Query, Mutation, EmptySubscription::new())
}
