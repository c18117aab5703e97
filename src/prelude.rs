//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the settei crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use settei::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let registry = RegistryBuilder::new().with_builtin_types().build()?;
//! let graph = WorkflowDocument::from_file("path/to/workflow.json")?.into_workflow()?;
//!
//! let form = SettingsForm::open_node(&registry, &graph, "quiz-1").ok_or("no such node")?;
//! println!("{}", form.render(&graph));
//! # Ok(())
//! # }
//! ```

// Registry
pub use crate::registry::{
    MenuInfo, NodeCategory, NodeTypeDefinition, NodeTypeRegistry, ProvidedOutput, RegistryBuilder,
    build_registry, builtin_node_types, requires_connections,
};

// Schema
pub use crate::schema::{
    ConnectionLimit, HandleCompatibility, HandleDirection, HandleRef, NodeSchema, PropertyDefinition,
    PropertyType,
};

// Workflow data
pub use crate::data::{DataBag, WorkflowDocument};
pub use crate::graph::{FlowEdge, FlowNode, IntoWorkflow, WorkflowGraph};

// Settings forms
pub use crate::form::{
    AssetApi, AssetDescriptor, ControlEvent, FormAction, FormHost, FormState, FormView, RecordEdit,
    SettingsForm, UploadFile,
};

// Error types
pub use crate::error::{ConnectionError, FormError, RegistryError, UpstreamApiError, ValidationWarning};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
