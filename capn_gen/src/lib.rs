//! C code generation for Cap'n Proto schemas.
//!
//! Turns a `CodeGeneratorRequest` into a header/source pair per requested
//! file. The generated code targets the c-capnproto runtime (`capnp_c.h`)
//! and, when a file opts in with `$C::codecgen`, also translates between
//! wire structs and separately named native structs.

pub mod codegen;
pub mod error;
pub mod layout;
pub mod schema;

pub use error::{CodegenError, CodegenResult};
