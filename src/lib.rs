/*!

# appsync_posts_lambda

A small blog API ([GraphQL][GraphQL]) served from [AWS Lambda][AWS Lambda Runtime] and guarded by a
token authorizer.

The crate ships three lambdas:

* `authorizer` - [AWS AppSync][AWS AppSync] lambda authorizer. Token `42` is an admin, token `43`
  a user who may read but not call `Mutation.createPost`; any other token is rejected.
* `resolver` - AppSync direct lambda resolver for `Query.listPosts` and `Mutation.createPost`,
  batched invocations included.
* `api_gateway` - the same API as a [Juniper][Juniper] schema behind [AWS Api Gateway][AWS Api Gateway],
  with the authorizer applied in-process.

Posts live in memory only. The store is seeded with five posts when the lambda process starts and
everything created afterwards is gone once the process is recycled.

## Configuration

Read from the environment, see [`config::Settings`]: `LOG_LEVEL`, `LOG_FORMAT` (`json` or
`pretty`), `GRAPHQL_ENDPOINT`, `AUTHORIZER_TTL_SECONDS` and `SEED_POSTS`. `RUST_LOG` overrides
`LOG_LEVEL`.

## License

This project is under the MIT license.

[AWS Api Gateway]: https://aws.amazon.com/api-gateway/
[AWS AppSync]: https://aws.amazon.com/appsync/
[AWS Lambda Runtime]: https://github.com/awslabs/aws-lambda-rust-runtime
[Juniper]: https://github.com/graphql-rust/juniper
[GraphQL]: http://graphql.org

*/

pub mod api_gateway;
pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod resolver;
pub mod schema;
pub mod store;
pub mod telemetry;

pub use api_gateway::{GraphQLHandler, GraphQLRequest};
pub use auth::{authorize, AuthorizerRequest, AuthorizerResponse, Decision, Identity, Role};
pub use config::Settings;
pub use error::Error;
pub use model::{Comment, Post};
pub use resolver::{Resolver, ResolverEvent, ResolverPayload};
pub use schema::{schema, Context, Schema};
pub use store::{generate_id, PostStore};
