use std::sync::Arc;

use appsync_posts_lambda::error::into_lambda_error;
use appsync_posts_lambda::{schema, telemetry, GraphQLHandler, PostStore, Settings};
use lambda_runtime::Error;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = Settings::from_env().map_err(into_lambda_error)?;
    telemetry::init(&settings)?;
    let store = PostStore::from_settings(&settings);
    info!(posts = store.len(), endpoint = %settings.graphql_endpoint, "post store ready");
    let handler = GraphQLHandler::new(schema(), Arc::new(store), settings.graphql_endpoint);
    lambda_runtime::run(handler).await
}
