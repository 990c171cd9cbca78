pub mod buffer;
pub mod codec;
pub mod context;
pub mod dcls;
pub mod get;
pub mod helpers;
pub mod list;
pub mod scope;
pub mod set;
pub mod structs;
pub mod types;
pub mod union;

// Re-export main public functions
pub use buffer::CodeBuf;
pub use codec::emit_struct_helpers;
pub use context::{FileContext, MemberSlot};
pub use dcls::{DeclaredType, emit_codec_declarations, emit_external_declarations, emit_forward_declarations};
pub use structs::emit_struct;
pub use types::{emit_const, emit_enum};
