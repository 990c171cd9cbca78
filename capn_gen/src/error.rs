use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the generator.
pub type CodegenResult<T> = Result<T, CodegenError>;

/// Fatal generation errors. None of them is retried: the run aborts and the
/// schema or its annotations have to be fixed.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// A required id reference does not resolve to any node.
    #[error("can't find node with id {id:#x} ({context})")]
    UnknownIdentifier { id: u64, context: String },

    /// A single-valued annotation repeats, or an annotation carries the wrong value kind.
    #[error("{owner}: {reason}")]
    SchemaAnnotationConflict { owner: String, reason: String },

    /// A default or constant value could not be copied into the scratch segment.
    #[error("failed to materialize value '{symbol}': {reason}")]
    ValueMaterializationFailed { symbol: String, reason: String },

    /// A generated artifact could not be written.
    #[error("failed to write {}: {source}", path.display())]
    OutputWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A field's code order does not fit the field list of its struct.
    #[error("{owner}: unexpectedly large code order {order} >= {count} for field '{field}'")]
    FieldOrderOutOfRange {
        owner: String,
        field: String,
        order: u16,
        count: usize,
    },

    /// A referenced node could not be attributed to any file.
    #[error("unable to determine the owning file of node {id:#x} ({display_name})")]
    UnknownOwningFile { id: u64, display_name: String },
}

impl CodegenError {
    pub fn unknown_id(id: u64, context: impl Into<String>) -> Self {
        CodegenError::UnknownIdentifier {
            id,
            context: context.into(),
        }
    }

    pub fn annotation_conflict(owner: impl Into<String>, reason: impl Into<String>) -> Self {
        CodegenError::SchemaAnnotationConflict {
            owner: owner.into(),
            reason: reason.into(),
        }
    }

    pub fn materialization(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        CodegenError::ValueMaterializationFailed {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}
