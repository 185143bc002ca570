mod graphql;
mod mock;
mod normalize;
mod registry;
mod resolution_error;

pub use graphql::{GraphQLBody, GraphQLError, GraphQLReply, GraphQLRequest, GraphQLResponse};
pub use mock::{Limit, MockDefinition, MockEntry, MockRequest, MockResponse, Payload};
pub use normalize::{normalize_query, normalize_variables, QueryKey, VariablesKey};
pub use registry::{Conflict, MockRegistry, MockSummary};
pub use resolution_error::ResolutionError;
