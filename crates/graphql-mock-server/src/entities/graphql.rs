use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One logical GraphQL request as sent by a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

impl GraphQLRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            operation_name: None,
            variables: None,
        }
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// A request body: a single request or an ordered batch of them.
///
/// Batch elements that are not valid requests keep their slot as an error
/// message so the reply can still answer every element in order.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphQLBody {
    Single(GraphQLRequest),
    Batch(Vec<Result<GraphQLRequest, String>>),
}

impl GraphQLBody {
    /// Parse a raw HTTP body. Only a JSON object or an array of objects is
    /// accepted.
    pub fn parse(body: &[u8]) -> Result<Self, String> {
        let value: Value = serde_json::from_slice(body).map_err(|e| e.to_string())?;
        match value {
            Value::Array(items) => Ok(GraphQLBody::Batch(
                items.into_iter().map(Self::parse_request).collect(),
            )),
            value @ Value::Object(_) => Self::parse_request(value).map(GraphQLBody::Single),
            other => Err(format!(
                "Expected a GraphQL request object or an array of them, got {}",
                other
            )),
        }
    }

    fn parse_request(value: Value) -> Result<GraphQLRequest, String> {
        if !value.is_object() {
            return Err(format!("Expected a GraphQL request object, got {}", value));
        }
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    pub fn len(&self) -> usize {
        match self {
            GraphQLBody::Single(_) => 1,
            GraphQLBody::Batch(requests) => requests.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A GraphQL error entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

/// The outcome of one logical request, in wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQLError>>,
}

impl GraphQLResponse {
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: Some(vec![GraphQLError {
                message: message.into(),
            }]),
        }
    }

    pub fn is_error(&self) -> bool {
        self.errors.is_some()
    }
}

/// Reply mirroring the shape of the [`GraphQLBody`] it answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GraphQLReply {
    Single(GraphQLResponse),
    Batch(Vec<GraphQLResponse>),
}
