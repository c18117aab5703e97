use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A handle on a specific node type, written `nodeType:handle`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HandleRef {
    pub node_type: String,
    pub handle: String,
}

impl HandleRef {
    pub fn new(node_type: &str, handle: &str) -> Self {
        Self {
            node_type: node_type.to_string(),
            handle: handle.to_string(),
        }
    }
}

impl fmt::Display for HandleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node_type, self.handle)
    }
}

impl FromStr for HandleRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((node_type, handle)) if !node_type.is_empty() && !handle.is_empty() => {
                Ok(HandleRef::new(node_type, handle))
            }
            _ => Err(format!("'{}' is not a handle reference (expected 'nodeType:handle')", s)),
        }
    }
}

impl TryFrom<String> for HandleRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HandleRef> for String {
    fn from(value: HandleRef) -> Self {
        value.to_string()
    }
}

/// Whether edges leave or enter a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleDirection {
    Source,
    Target,
}

impl HandleDirection {
    pub fn name(&self) -> &'static str {
        match self {
            HandleDirection::Source => "source",
            HandleDirection::Target => "target",
        }
    }
}

/// How many edges a handle accepts. Stored as `-1` for unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ConnectionLimit {
    Unbounded,
    AtMost(usize),
}

impl ConnectionLimit {
    /// Whether one more edge fits next to `existing` ones.
    pub fn allows(&self, existing: usize) -> bool {
        match self {
            ConnectionLimit::Unbounded => true,
            ConnectionLimit::AtMost(max) => existing < *max,
        }
    }
}

impl TryFrom<i64> for ConnectionLimit {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(ConnectionLimit::Unbounded),
            n if n >= 0 => Ok(ConnectionLimit::AtMost(n as usize)),
            n => Err(format!("invalid connection limit {}", n)),
        }
    }
}

impl From<ConnectionLimit> for i64 {
    fn from(value: ConnectionLimit) -> Self {
        match value {
            ConnectionLimit::Unbounded => -1,
            ConnectionLimit::AtMost(n) => n as i64,
        }
    }
}

/// Connection rules for a single handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleRule {
    pub direction: HandleDirection,
    pub max_connections: ConnectionLimit,
    pub compatible_with: AHashSet<HandleRef>,
}

/// The handles of a node type and what each of them may connect to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleCompatibility {
    rules: AHashMap<String, HandleRule>,
}

impl HandleCompatibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an outgoing handle.
    pub fn source<I, S>(self, handle: &str, max_connections: i64, compatible_with: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with_rule(handle, HandleDirection::Source, max_connections, compatible_with)
    }

    /// Declares an incoming handle.
    pub fn target<I, S>(self, handle: &str, max_connections: i64, compatible_with: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with_rule(handle, HandleDirection::Target, max_connections, compatible_with)
    }

    fn with_rule<I, S>(
        mut self,
        handle: &str,
        direction: HandleDirection,
        max_connections: i64,
        compatible_with: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let compatible_with = compatible_with
            .into_iter()
            .filter_map(|s| s.as_ref().parse::<HandleRef>().ok())
            .collect();
        self.rules.insert(
            handle.to_string(),
            HandleRule {
                direction,
                max_connections: ConnectionLimit::try_from(max_connections)
                    .unwrap_or(ConnectionLimit::Unbounded),
                compatible_with,
            },
        );
        self
    }

    pub fn rule(&self, handle: &str) -> Option<&HandleRule> {
        self.rules.get(handle)
    }

    /// Whether `handle` lists `other` as a compatible partner.
    pub fn accepts(&self, handle: &str, other: &HandleRef) -> bool {
        self.rules
            .get(handle)
            .is_some_and(|rule| rule.compatible_with.contains(other))
    }
}
