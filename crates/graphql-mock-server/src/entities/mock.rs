use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use super::VariablesKey;
use crate::error::HarnessError;

/// Number of characters of query text kept when describing a mock.
const DESCRIPTION_QUERY_CHARS: usize = 30;

/// The request shape a mock answers to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockRequest {
    #[serde(default)]
    pub query: Option<String>,
    /// Omitted variables register a wildcard matching any variables
    #[serde(default)]
    pub variables: Option<Value>,
}

impl MockRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            variables: None,
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// How many times a mock may be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    Times(u32),
    Unlimited,
}

impl Limit {
    /// Whether a mock that has been matched `used` times may match again.
    pub fn allows(&self, used: u32) -> bool {
        match self {
            Limit::Times(count) => used < *count,
            Limit::Unlimited => true,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Times(count) => write!(f, "{}", count),
            Limit::Unlimited => f.write_str("unlimited"),
        }
    }
}

/// Canned `data` returned on a match.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Same data on every match
    Single(Value),
    /// One element per match, in order; the last one repeats once exhausted
    Sequence(Vec<Value>),
}

impl Payload {
    /// Data served for the match following `used` earlier ones.
    pub fn at(&self, used: u32) -> Option<&Value> {
        match self {
            Payload::Single(data) => Some(data),
            Payload::Sequence(items) => {
                let index = (used as usize).min(items.len().saturating_sub(1));
                items.get(index)
            }
        }
    }
}

/// A registered response: the payload plus an optional explicit count.
///
/// `count: None` means the default applies (see [`MockResponse::limit`]);
/// `Some(Limit::Unlimited)` is what an explicit `count: null` deserializes to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "MockResponseRepr")]
pub struct MockResponse {
    pub payload: Payload,
    pub count: Option<Limit>,
}

impl MockResponse {
    pub fn new(data: Value) -> Self {
        Self {
            payload: Payload::Single(data),
            count: None,
        }
    }

    /// Respond with each element once, in order.
    pub fn sequence(items: impl IntoIterator<Item = Value>) -> Self {
        Self {
            payload: Payload::Sequence(items.into_iter().collect()),
            count: None,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(Limit::Times(count));
        self
    }

    pub fn unlimited(mut self) -> Self {
        self.count = Some(Limit::Unlimited);
        self
    }

    /// The effective limit: the explicit count, otherwise one use per
    /// payload (1 for a single payload, the length for a sequence).
    pub fn limit(&self) -> Result<Limit, HarnessError> {
        if let Some(count) = self.count {
            return Ok(count);
        }
        match &self.payload {
            Payload::Single(_) => Ok(Limit::Times(1)),
            Payload::Sequence(items) => sequence_limit(items.len()),
        }
    }
}

fn sequence_limit(len: usize) -> Result<Limit, HarnessError> {
    u32::try_from(len).map(Limit::Times).map_err(|_| {
        HarnessError::InvalidMock(format!(
            "response sequence of {} items is too long to count",
            len
        ))
    })
}

impl From<Value> for MockResponse {
    fn from(data: Value) -> Self {
        MockResponse::new(data)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MockResponseRepr {
    Sequence(Vec<ResponseBody>),
    Sequenced(SequencedResponse),
    Single(SingleResponse),
}

#[derive(Deserialize)]
struct ResponseBody {
    data: Value,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SequencedResponse {
    sequence: Vec<ResponseBody>,
    #[serde(default, deserialize_with = "deserialize_count")]
    count: Option<Limit>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SingleResponse {
    data: Value,
    #[serde(default, deserialize_with = "deserialize_count")]
    count: Option<Limit>,
}

/// A present `count: null` means unlimited, distinct from an absent count.
fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<Limit>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = Option::<u32>::deserialize(deserializer)?;
    Ok(Some(count.map_or(Limit::Unlimited, Limit::Times)))
}

impl From<MockResponseRepr> for MockResponse {
    fn from(repr: MockResponseRepr) -> Self {
        match repr {
            MockResponseRepr::Sequence(items) => {
                MockResponse::sequence(items.into_iter().map(|item| item.data))
            }
            MockResponseRepr::Sequenced(SequencedResponse { sequence, count }) => MockResponse {
                payload: Payload::Sequence(sequence.into_iter().map(|item| item.data).collect()),
                count,
            },
            MockResponseRepr::Single(SingleResponse { data, count }) => MockResponse {
                payload: Payload::Single(data),
                count,
            },
        }
    }
}

/// A full mock definition, as written in a mocks file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockDefinition {
    pub request: MockRequest,
    pub response: MockResponse,
}

/// A registered mock and its consumption state.
#[derive(Debug, Clone)]
pub struct MockEntry {
    query: String,
    payload: Payload,
    limit: Limit,
    uses_consumed: u32,
}

impl MockEntry {
    pub fn new(query: impl Into<String>, payload: Payload, limit: Limit) -> Self {
        Self {
            query: query.into(),
            payload,
            limit,
            uses_consumed: 0,
        }
    }

    /// Query text as it was registered, before normalization.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn limit(&self) -> Limit {
        self.limit
    }

    pub fn uses_consumed(&self) -> u32 {
        self.uses_consumed
    }

    pub fn is_exhausted(&self) -> bool {
        !self.limit.allows(self.uses_consumed)
    }

    /// Data for the next match, ignoring the limit.
    pub fn next_payload(&self) -> Option<&Value> {
        self.payload.at(self.uses_consumed)
    }

    pub(crate) fn reset_uses(&mut self) {
        self.uses_consumed = 0;
    }

    pub(crate) fn mark_consumed(&mut self) {
        self.uses_consumed += 1;
    }

    /// Leading characters of the registered query text.
    pub fn short_query(&self) -> String {
        self.query.chars().take(DESCRIPTION_QUERY_CHARS).collect()
    }

    /// Short human-readable identification, used in conflict and unused reports.
    pub fn describe(&self, variables: &VariablesKey) -> String {
        format!("{}... {}", self.short_query(), variables)
    }
}
