pub mod scratch;
pub mod slot;
pub mod value;

pub use scratch::{BlobError, CapnPtr, ScratchSegment};
pub use slot::{CaseClass, SlotLayout, SlotWidth};
pub use value::{MaterializedValue, ValueDecoder, ValueDescriptor};
