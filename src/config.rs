//! Runtime settings read from the lambda environment.

use failure::Error as Failure;
use serde_derive::Deserialize;

use crate::error::Error;

/// Output format of the log subscriber.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event, for CloudWatch.
    #[default]
    Json,
    /// Human readable output for local runs.
    Pretty,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Settings {
    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Path the GraphQL IDE pages send their requests to.
    #[serde(default = "default_graphql_endpoint")]
    pub graphql_endpoint: String,
    /// Cache lifetime AppSync may apply to an authorizer decision.
    #[serde(default)]
    pub authorizer_ttl_seconds: Option<u64>,
    /// Start the post store with the demo posts.
    #[serde(default = "default_seed_posts")]
    pub seed_posts: bool,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_graphql_endpoint() -> String {
    "/graphql".into()
}

fn default_seed_posts() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            graphql_endpoint: default_graphql_endpoint(),
            authorizer_ttl_seconds: None,
            seed_posts: default_seed_posts(),
        }
    }
}

impl Settings {
    /// Reads settings from the process environment (`LOG_LEVEL`, `LOG_FORMAT`,
    /// `GRAPHQL_ENDPOINT`, `AUTHORIZER_TTL_SECONDS`, `SEED_POSTS`).
    pub fn from_env() -> Result<Self, Failure> {
        envy::from_env::<Settings>().map_err(|err| Error::InvalidConfig(err.to_string()).into())
    }

    /// Reads settings from explicit key/value pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, Failure>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Settings>(pairs)
            .map_err(|err| Error::InvalidConfig(err.to_string()).into())
    }
}
