pub mod annotations;
pub mod imports;
pub mod index;
pub mod names;

pub use annotations::FileOptions;
pub use imports::used_imports;
pub use index::SchemaIndex;
pub use names::NameTable;
