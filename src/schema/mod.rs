pub mod handles;
pub mod node;
pub mod property;

pub use handles::*;
pub use node::*;
pub use property::*;
