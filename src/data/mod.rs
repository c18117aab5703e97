pub mod bag;
pub mod model;

pub use bag::DataBag;
pub use model::WorkflowDocument;
