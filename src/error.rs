use crate::schema::{HandleRef, PropertyType};
use std::fmt;
use thiserror::Error;

/// Errors raised while building or querying the node type registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Node type '{0}' is already registered")]
    DuplicateType(String),

    #[error("Node type '{0}' is not registered")]
    UnknownType(String),

    #[error("Alias '{alias}' points to unregistered node type '{target}'")]
    DanglingAlias { alias: String, target: String },

    #[error("Failed to parse node type configuration: {0}")]
    ConfigParseError(String),
}

/// Reasons an edge between two handles is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Node '{0}' does not exist in the workflow")]
    NodeNotFound(String),

    #[error("Node '{node_id}' has unregistered type '{type_name}'")]
    UnknownNodeType { node_id: String, type_name: String },

    #[error("Handle '{handle}' is not declared on node type '{node_type}'")]
    UnknownHandle { node_type: String, handle: String },

    #[error("Handle '{from}' does not accept connections from '{to}'")]
    Incompatible { from: HandleRef, to: HandleRef },

    #[error("Handle '{handle}' on node '{node_id}' already has its maximum of {max} connection(s)")]
    LimitReached {
        node_id: String,
        handle: HandleRef,
        max: usize,
    },

    #[error("Handle '{handle}' is a {actual} handle but was used as a {expected} handle")]
    WrongDirection {
        handle: HandleRef,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Errors that reject a single edit on a settings form. A rejected edit
/// leaves the draft untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Property '{0}' is not part of this node's schema")]
    UnknownProperty(String),

    #[error("Operation '{operation}' is not supported by property '{key}' of type {property_type}")]
    UnsupportedOperation {
        key: String,
        property_type: PropertyType,
        operation: &'static str,
    },

    #[error("Index {index} is out of range for '{key}' (length {len})")]
    IndexOutOfRange { key: String, index: usize, len: usize },

    #[error("A question needs at least {minimum} answers; refusing to remove another one")]
    MinimumAnswers { minimum: usize },

    #[error("A multiple-choice prompt needs at least {minimum} options; refusing to remove another one")]
    MinimumOptions { minimum: usize },

    #[error("'{field}' is not enabled on record {index} of '{key}'")]
    InactiveField {
        key: String,
        index: usize,
        field: &'static str,
    },

    #[error("Asset '{asset_id}' is not attached to '{key}'")]
    UnknownAsset { key: String, asset_id: String },

    #[error(transparent)]
    Upstream(#[from] UpstreamApiError),

    #[error("Settings are not available for this node")]
    Unavailable,

    #[error("The settings form has already been closed")]
    Closed,

    #[error("Saving is blocked: {0}")]
    SaveBlocked(String),
}

/// A problem with the draft that is shown inline next to the affected field.
///
/// Blocking warnings refuse `save` but never reject individual edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub key: String,
    /// The record the warning is about, for record-list properties.
    pub index: Option<usize>,
    pub message: String,
    pub blocking: bool,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]: {}", self.key, index, self.message),
            None => write!(f, "{}: {}", self.key, self.message),
        }
    }
}

/// Failures reported by the document and video asset collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamApiError {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Could not list assets for '{container_id}': {message}")]
    List {
        container_id: String,
        message: String,
    },

    #[error("Could not remove asset '{asset_id}': {message}")]
    Remove { asset_id: String, message: String },
}

/// Errors that can occur when converting a stored workflow document into a `WorkflowGraph`.
#[derive(Error, Debug, Clone)]
pub enum WorkflowConversionError {
    #[error("Failed to parse workflow JSON: {0}")]
    JsonParseError(String),

    #[error("Invalid workflow document: {0}")]
    ValidationError(String),
}
