use appsync_posts_lambda::auth::authorizer_handler;
use appsync_posts_lambda::error::into_lambda_error;
use appsync_posts_lambda::{telemetry, Settings};
use lambda_runtime::{service_fn, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = Settings::from_env().map_err(into_lambda_error)?;
    telemetry::init(&settings)?;
    let ttl_override = settings.authorizer_ttl_seconds;
    lambda_runtime::run(service_fn(|event| authorizer_handler(event, ttl_override))).await
}
