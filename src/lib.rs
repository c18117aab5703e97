//! # Settei - Node Registry and Settings Forms for Workflow Builders
//!
//! **Settei** is the declarative core of a visual workflow editor. Each node type is
//! described once, as data: an ordered schema of typed properties, the rules for which
//! handles may connect to which, menu metadata, and optional validity and traversal
//! capabilities. A single generic settings form then edits any node from its schema
//! alone, keeping derived fields consistent on every edit.
//!
//! ## Core Workflow
//!
//! 1.  **Build a Registry**: Use `RegistryBuilder` to collect the built-in node types,
//!     your own `NodeTypeDefinition`s, JSON schema packs and legacy type aliases.
//! 2.  **Load a Workflow**: Parse a stored canvas with `WorkflowDocument`, or implement
//!     `IntoWorkflow` for your own format.
//! 3.  **Validate**: Check edges and node wiring with `validate_connection` and
//!     `validate_graph`.
//! 4.  **Edit**: Open a `SettingsForm` on a node, apply edits, render it, and submit
//!     the finished data bag back to the graph.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use settei::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     // 1. Build the registry once at startup.
//!     let registry = RegistryBuilder::new().with_builtin_types().build()?;
//!
//!     // 2. Load a workflow exported by the editor.
//!     let document = WorkflowDocument::from_file("path/to/workflow.json")?;
//!     let mut graph = document.into_workflow()?;
//!
//!     // 3. Report wiring problems.
//!     let report = registry.validate_graph(&graph);
//!     for (edge, error) in &report.invalid_edges {
//!         println!("{} -> {}: {}", edge.source, edge.target, error);
//!     }
//!
//!     // 4. Edit a coding exercise: its parameter names follow the parameter count.
//!     let mut form = SettingsForm::open_node(&registry, &graph, "exercise-1")
//!         .ok_or("no such node")?;
//!     form.set_field("parameter_count", json!(3))?;
//!     println!("{}", form.render(&graph));
//!     form.submit(&mut graph)?;
//!
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod error;
pub mod form;
pub mod graph;
pub mod prelude;
pub mod registry;
pub mod schema;
