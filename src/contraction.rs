use thiserror::Error;

use crate::qft::{IndexKind, IndexValue};

pub mod trace;
pub mod wick;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractionError {
    #[error("Trace over {traced:?} splits into {pieces} chains along {kind}")]
    Disconnected {
        traced: Vec<IndexKind>,
        kind: IndexKind,
        pieces: usize,
    },
    #[error("Index value {value:?} of {kinds:?} can be continued in more than one way")]
    Ambiguous {
        kinds: Vec<IndexKind>,
        value: Vec<IndexValue>,
    },
}
