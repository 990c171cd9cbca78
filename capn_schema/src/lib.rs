//! Cap'n Proto Schema Model
//!
//! This crate contains the data model of a `CodeGeneratorRequest`: the
//! already-parsed schema graph handed to a code generator plugin. It is a
//! pure serde mirror of the request in its JSON (or YAML) rendition and
//! carries no code generation logic.

pub mod annotations;
pub mod ids;
pub mod node;
pub mod request;
pub mod types;

// Re-export commonly used types at the crate root
pub use node::*;
pub use request::*;
pub use types::*;
