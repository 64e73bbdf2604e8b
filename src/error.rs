use failure::Fail;
use http::method::Method;

/// Errors raised by the handlers of this crate.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Invalid token")]
    InvalidToken,
    #[fail(display = "Unknown field {}.{}", _0, _1)]
    UnknownField(String, String),
    #[fail(display = "Invalid arguments for {}: {}", _0, _1)]
    InvalidArguments(String, String),
    #[fail(display = "Invalid configuration: {}", _0)]
    InvalidConfig(String),
    #[fail(display = "InvalidMethod")]
    InvalidMethod(Method),
    #[fail(display = "Missing query argument")]
    MissingQuery,
    #[fail(display = "Missing post body")]
    MissingPostBody,
    #[fail(display = "Invalid body")]
    InvalidBody,
    #[fail(display = "Prohibit extra field")]
    ProhibitExtraField(String),
    #[fail(display = "Query parameter must not occur more than once")]
    MultipleQueryParameter,
    #[fail(display = "Operation name parameter must not occur more than once")]
    MultipleOperationNameParameter,
    #[fail(display = "Variables parameter must not occur more than once")]
    MultipleVariablesParameter,
    #[fail(display = "Invalid variables parameter")]
    InvalidVariablesParameter,
}

/// Converts a `failure` error into the error type the lambda runtime reports.
pub fn into_lambda_error(err: failure::Error) -> lambda_runtime::Error {
    Box::new(err.compat())
}
