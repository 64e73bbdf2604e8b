//! Token authorizer for AppSync's `AWS_LAMBDA` authorization mode.
//!
//! Two callers are known: token `42` is an admin, token `43` a regular user.
//! Users may query but `Mutation.createPost` is denied to them. Every other
//! token is rejected without further detail.

use std::collections::HashMap;
use std::fmt;

use failure::Error as Failure;
use lambda_runtime::LambdaEvent;
use maplit::hashmap;
use serde_derive::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Error;

/// Field denied to callers with the `user` role.
pub const CREATE_POST_FIELD: &str = "Mutation.createPost";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::User => f.write_str("user"),
        }
    }
}

/// Authenticated caller.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl Identity {
    fn new(id: &str, name: &str, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }

    /// Fields this caller may not resolve, as `Type.field`.
    pub fn denied_fields(&self) -> Vec<String> {
        match self.role {
            Role::Admin => Vec::new(),
            Role::User => vec![CREATE_POST_FIELD.to_owned()],
        }
    }

    /// Identity as it is handed to resolvers in AppSync's `resolverContext`.
    pub fn resolver_context(&self) -> HashMap<String, String> {
        hashmap! {
            "id".to_owned() => self.id.clone(),
            "name".to_owned() => self.name.clone(),
            "role".to_owned() => self.role.to_string(),
        }
    }
}

/// Looks a token up in the table of known callers.
pub fn identity_from_token(token: &str) -> Result<Identity, Failure> {
    match token {
        "42" => Ok(Identity::new("42", "Arthur Dent", Role::Admin)),
        "43" => Ok(Identity::new("43", "Ford Prefect", Role::User)),
        _ => Err(Error::InvalidToken.into()),
    }
}

/// Outcome of authorizing one request.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Allow {
        identity: Identity,
        denied_fields: Vec<String>,
    },
    Deny,
}

/// Authorizes a caller by token; a missing or unknown token is denied.
pub fn authorize(token: Option<&str>) -> Decision {
    match identity_from_token(token.unwrap_or_default()) {
        Ok(identity) => {
            info!(user_id = %identity.id, role = %identity.role, "caller authorized");
            let denied_fields = identity.denied_fields();
            Decision::Allow {
                identity,
                denied_fields,
            }
        }
        Err(err) => {
            warn!(error = %err, "caller rejected");
            Decision::Deny
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerRequestContext {
    #[serde(default)]
    pub api_id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub query_string: Option<String>,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: Option<serde_json::Value>,
}

/// Event AppSync sends to a lambda authorizer.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerRequest {
    #[serde(default)]
    pub authorization_token: Option<String>,
    #[serde(default)]
    pub request_context: AuthorizerRequestContext,
    #[serde(default)]
    pub request_headers: HashMap<String, String>,
}

/// Answer of a lambda authorizer, as AppSync expects it.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    pub is_authorized: bool,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub resolver_context: HashMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub denied_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_override: Option<u64>,
}

impl AuthorizerResponse {
    pub fn from_decision(decision: Decision, ttl_override: Option<u64>) -> Self {
        match decision {
            Decision::Allow {
                identity,
                denied_fields,
            } => Self {
                is_authorized: true,
                resolver_context: identity.resolver_context(),
                denied_fields,
                ttl_override,
            },
            Decision::Deny => Self {
                is_authorized: false,
                resolver_context: HashMap::new(),
                denied_fields: Vec::new(),
                ttl_override: None,
            },
        }
    }
}

/// Lambda handler for the AppSync authorizer. Never fails: unknown callers
/// get a deny response.
pub async fn authorizer_handler(
    event: LambdaEvent<AuthorizerRequest>,
    ttl_override: Option<u64>,
) -> Result<AuthorizerResponse, lambda_runtime::Error> {
    let (request, context) = event.into_parts();
    let span = tracing::info_span!(
        "authorize",
        request_id = %context.request_id,
        operation = request.request_context.operation_name.as_deref().unwrap_or_default(),
    );
    let decision = span.in_scope(|| authorize(request.authorization_token.as_deref()));
    Ok(AuthorizerResponse::from_decision(decision, ttl_override))
}
