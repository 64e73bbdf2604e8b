//! GraphQL over an API Gateway proxy integration.
//!
//! Runs the juniper schema directly inside the lambda and applies the same
//! token authorizer AppSync would run in front of it.

use std::convert::TryFrom;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use aws_lambda_events::encodings::Body;
use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use failure::Error as Failure;
use http::{header, header::HeaderValue, method::Method, status::StatusCode};
use juniper::{http as juniper_http, FieldError, InputValue};
use lambda_runtime::{LambdaEvent, Service};
use query_map::QueryMap;
use serde::Serialize;
use serde_derive::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::{authorize, Decision};
use crate::error::{into_lambda_error, Error};
use crate::schema::{Context, Schema};
use crate::store::PostStore;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
enum GraphQLBatchRequest {
    Single(juniper_http::GraphQLRequest),
    Batch(Vec<juniper_http::GraphQLRequest>),
}

impl GraphQLBatchRequest {
    /// Executes the request(s); the flag is false when any request failed
    /// before resolution (parse or validation error).
    fn execute(&self, root_node: &Schema, context: &Context) -> Result<(bool, String), Failure> {
        match self {
            GraphQLBatchRequest::Single(request) => {
                let response = request.execute_sync(root_node, context);
                Ok((response.is_ok(), serde_json::to_string(&response)?))
            }
            GraphQLBatchRequest::Batch(requests) => {
                let mut ok = true;
                let mut bodies = Vec::with_capacity(requests.len());
                for request in requests {
                    let response = request.execute_sync(root_node, context);
                    ok = ok && response.is_ok();
                    bodies.push(serde_json::to_value(&response)?);
                }
                Ok((ok, serde_json::to_string(&bodies)?))
            }
        }
    }

    fn operation_names(&self) -> Vec<Option<&str>> {
        match self {
            GraphQLBatchRequest::Single(req) => vec![req.operation_name()],
            GraphQLBatchRequest::Batch(reqs) => {
                reqs.iter().map(|req| req.operation_name()).collect()
            }
        }
    }
}

fn response(
    status_code: StatusCode,
    content_type: &'static str,
    body: String,
) -> ApiGatewayProxyResponse {
    let mut response = ApiGatewayProxyResponse::default();
    response.status_code = i64::from(status_code.as_u16());
    response
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response.body = Some(Body::Text(body));
    response
}

fn html(body: String) -> ApiGatewayProxyResponse {
    response(StatusCode::OK, "text/html", body)
}

fn json(status_code: StatusCode, body: String) -> ApiGatewayProxyResponse {
    response(status_code, "application/json", body)
}

/// Returns the single value of a query string parameter.
fn single_parameter(
    parameters: &QueryMap,
    key: &str,
    multiple: Error,
) -> Result<Option<String>, Failure> {
    match parameters.all(key) {
        Some(values) if values.len() > 1 => Err(multiple.into()),
        Some(values) => Ok(values.first().map(|value| (*value).to_owned())),
        None => Ok(None),
    }
}

/// Simple wrapper around an incoming GraphQL request
///
/// Built from GET query string parameters (`query`, `operation_name`,
/// `variables`) or from a POST body holding one request or a batch.
#[derive(Debug, PartialEq)]
pub struct GraphQLRequest(GraphQLBatchRequest);

impl GraphQLRequest {
    fn from_get(req: &ApiGatewayProxyRequest) -> Result<Self, Failure> {
        let parameters = &req.multi_value_query_string_parameters;
        for (key, _) in parameters.iter() {
            match key {
                "query" | "operation_name" | "variables" => {}
                _ => return Err(Error::ProhibitExtraField(key.to_owned()).into()),
            }
        }
        let query = single_parameter(parameters, "query", Error::MultipleQueryParameter)?
            .filter(|query| !query.is_empty())
            .ok_or(Error::MissingQuery)?;
        let operation_name = single_parameter(
            parameters,
            "operation_name",
            Error::MultipleOperationNameParameter,
        )?;
        let variables =
            match single_parameter(parameters, "variables", Error::MultipleVariablesParameter)? {
                Some(variables) => Some(
                    serde_json::from_str::<InputValue>(&variables)
                        .map_err(|_| Error::InvalidVariablesParameter)?,
                ),
                None => None,
            };
        Ok(Self(GraphQLBatchRequest::Single(
            juniper_http::GraphQLRequest::new(query, operation_name, variables),
        )))
    }

    fn from_post(req: &ApiGatewayProxyRequest) -> Result<Self, Failure> {
        match &req.body {
            Some(body) => match serde_json::from_str::<GraphQLBatchRequest>(body) {
                Ok(request) => Ok(Self(request)),
                Err(_) => Err(Error::InvalidBody.into()),
            },
            None => Err(Error::MissingPostBody.into()),
        }
    }

    /// Execute an incoming GraphQL query
    pub fn execute(
        &self,
        root_node: &Schema,
        context: &Context,
    ) -> Result<ApiGatewayProxyResponse, Failure> {
        let (ok, body) = self.0.execute(root_node, context)?;
        let status_code = if ok {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        };
        Ok(json(status_code, body))
    }

    /// Returns the operation names associated with this request.
    ///
    /// For batch requests there will be multiple names.
    pub fn operation_names(&self) -> Vec<Option<&str>> {
        self.0.operation_names()
    }
}

impl TryFrom<&ApiGatewayProxyRequest> for GraphQLRequest {
    type Error = Failure;

    fn try_from(req: &ApiGatewayProxyRequest) -> Result<Self, Self::Error> {
        if req.http_method == Method::GET {
            Self::from_get(req)
        } else if req.http_method == Method::POST {
            Self::from_post(req)
        } else {
            Err(Error::InvalidMethod(req.http_method.clone()).into())
        }
    }
}

/// Constructs an error response outside of the normal execution flow
pub fn error(error: FieldError) -> Result<ApiGatewayProxyResponse, Failure> {
    let response = juniper_http::GraphQLResponse::error(error);
    Ok(json(StatusCode::BAD_REQUEST, serde_json::to_string(&response)?))
}

/// Constructs a custom response outside of the normal execution flow
///
/// This is intended for highly customized integrations and should only
/// be used as a last resort.
pub fn custom<T: Serialize>(
    status_code: StatusCode,
    response: &T,
) -> Result<ApiGatewayProxyResponse, Failure> {
    Ok(json(status_code, serde_json::to_string(response)?))
}

/// The response AppSync gives callers its authorizer rejected.
pub fn unauthorized() -> Result<ApiGatewayProxyResponse, Failure> {
    custom(
        StatusCode::UNAUTHORIZED,
        &json!({
            "errors": [{
                "errorType": "UnauthorizedException",
                "message": "You are not authorized to make this call.",
            }]
        }),
    )
}

/// Generate an HTML page containing GraphiQL
pub fn graphiql_source(graphql_endpoint_url: &str) -> ApiGatewayProxyResponse {
    html(juniper_http::graphiql::graphiql_source(
        graphql_endpoint_url,
        None,
    ))
}

/// Generate an HTML page containing GraphQL Playground
pub fn playground_source(graphql_endpoint_url: &str) -> ApiGatewayProxyResponse {
    html(juniper_http::playground::playground_source(
        graphql_endpoint_url,
        None,
    ))
}

/// Aws Api Gateway GraphQL Handler for GET and POST requests
///
/// The schema and the post store are shared by every invocation the lambda
/// process serves.
#[derive(Clone)]
pub struct GraphQLHandler {
    root_node: Arc<Schema>,
    store: Arc<PostStore>,
    graphql_endpoint: Arc<str>,
}

impl GraphQLHandler {
    pub fn new<S: Into<String>>(
        root_node: Schema,
        store: Arc<PostStore>,
        graphql_endpoint: S,
    ) -> Self {
        Self {
            root_node: Arc::new(root_node),
            store,
            graphql_endpoint: Arc::from(graphql_endpoint.into()),
        }
    }

    pub fn store(&self) -> &PostStore {
        &self.store
    }

    /// Serves one API Gateway request.
    pub fn handle(&self, req: ApiGatewayProxyRequest) -> Result<ApiGatewayProxyResponse, Failure> {
        if req.http_method == Method::GET {
            let path = req.path.as_deref().unwrap_or_default();
            if path.ends_with("/playground") {
                return Ok(playground_source(&self.graphql_endpoint));
            }
            if path.ends_with("/graphiql") {
                return Ok(graphiql_source(&self.graphql_endpoint));
            }
        }

        let token = req
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let (identity, denied_fields) = match authorize(token) {
            Decision::Allow {
                identity,
                denied_fields,
            } => (identity, denied_fields),
            Decision::Deny => return unauthorized(),
        };

        let gql_req = match GraphQLRequest::try_from(&req) {
            Ok(gql_req) => gql_req,
            Err(err) => {
                warn!(error = %err, "malformed GraphQL request");
                return error(FieldError::new(err, juniper::Value::null()));
            }
        };
        debug!(operations = ?gql_req.operation_names(), user_id = %identity.id, "executing");
        let context = Context::new(Arc::clone(&self.store), identity, denied_fields);
        gql_req.execute(&self.root_node, &context)
    }
}

impl Service<LambdaEvent<ApiGatewayProxyRequest>> for GraphQLHandler {
    type Response = ApiGatewayProxyResponse;
    type Error = lambda_runtime::Error;
    type Future = Pin<Box<dyn Future<Output = Result<ApiGatewayProxyResponse, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: LambdaEvent<ApiGatewayProxyRequest>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { handler.handle(event.payload).map_err(into_lambda_error) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Query string parameters as API Gateway hands them to the lambda.
    fn query_parameters(parameters: &[(&str, &str)]) -> QueryMap {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in parameters {
            map.entry((*key).to_owned())
                .or_default()
                .push((*value).to_owned());
        }
        map.into()
    }

    fn get(parameters: &[(&str, &str)]) -> ApiGatewayProxyRequest {
        let mut req = ApiGatewayProxyRequest::default();
        req.http_method = Method::GET;
        req.multi_value_query_string_parameters = query_parameters(parameters);
        req
    }

    fn post(body: Option<&str>) -> ApiGatewayProxyRequest {
        let mut req = ApiGatewayProxyRequest::default();
        req.http_method = Method::POST;
        req.body = body.map(str::to_owned);
        req
    }

    #[test]
    fn test_get_request_with_variables() {
        let req = get(&[
            ("query", "query P($x: String) { listPosts { id } }"),
            ("operation_name", "P"),
            ("variables", r#"{"x": "y"}"#),
        ]);
        let gql_req = GraphQLRequest::try_from(&req).unwrap();
        assert_eq!(gql_req.operation_names(), vec![Some("P")]);
    }

    #[test]
    fn test_get_request_errors() {
        let err = GraphQLRequest::try_from(&get(&[])).unwrap_err();
        assert_eq!(err.to_string(), "Missing query argument");

        let err = GraphQLRequest::try_from(&get(&[("query", "{a}"), ("query", "{b}")])).unwrap_err();
        assert_eq!(err.to_string(), "Query parameter must not occur more than once");

        let err = GraphQLRequest::try_from(&get(&[("query", "{a}"), ("extra", "1")])).unwrap_err();
        assert_eq!(err.to_string(), "Prohibit extra field");

        let err =
            GraphQLRequest::try_from(&get(&[("query", "{a}"), ("variables", "{")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid variables parameter");
    }

    #[test]
    fn test_post_single_and_batch() {
        let single = GraphQLRequest::try_from(&post(Some(
            r#"{"query": "{ listPosts { id } }", "operationName": null}"#,
        )))
        .unwrap();
        assert_eq!(single.operation_names(), vec![None]);

        let batch = GraphQLRequest::try_from(&post(Some(
            r#"[{"query": "query A { listPosts { id } }", "operationName": "A"},
                {"query": "query B { listPosts { title } }", "operationName": "B"}]"#,
        )))
        .unwrap();
        assert_eq!(batch.operation_names(), vec![Some("A"), Some("B")]);
    }

    #[test]
    fn test_post_errors() {
        let err = GraphQLRequest::try_from(&post(None)).unwrap_err();
        assert_eq!(err.to_string(), "Missing post body");
        let err = GraphQLRequest::try_from(&post(Some("not json"))).unwrap_err();
        assert_eq!(err.to_string(), "Invalid body");
    }

    #[test]
    fn test_other_methods_are_rejected() {
        let mut req = post(Some("{}"));
        req.http_method = Method::DELETE;
        let err = GraphQLRequest::try_from(&req).unwrap_err();
        assert_eq!(err.to_string(), "InvalidMethod");
    }

    #[test]
    fn test_unauthorized_body() {
        let response = unauthorized().unwrap();
        assert_eq!(response.status_code, 401);
        match response.body {
            Some(Body::Text(body)) => {
                let value: serde_json::Value = serde_json::from_str(&body).unwrap();
                assert_eq!(value["errors"][0]["errorType"], "UnauthorizedException");
                assert_eq!(
                    value["errors"][0]["message"],
                    "You are not authorized to make this call."
                );
            }
            other => panic!("unexpected body {:?}", other),
        }
    }
}
