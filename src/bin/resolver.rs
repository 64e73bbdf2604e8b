use std::sync::Arc;

use appsync_posts_lambda::error::into_lambda_error;
use appsync_posts_lambda::resolver::resolver_handler;
use appsync_posts_lambda::{telemetry, PostStore, Resolver, Settings};
use lambda_runtime::{service_fn, Error};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = Settings::from_env().map_err(into_lambda_error)?;
    telemetry::init(&settings)?;
    let store = PostStore::from_settings(&settings);
    info!(posts = store.len(), "post store ready");
    let resolver = Resolver::new(Arc::new(store));
    lambda_runtime::run(service_fn(|event| resolver_handler(&resolver, event))).await
}
