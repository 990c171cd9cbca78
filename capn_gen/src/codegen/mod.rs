pub mod c;
pub mod c_gen;

pub use c::{CCodeGenerator, CCodeGeneratorOptions, GeneratedFile};
