use thiserror::Error;

use crate::types::RecordIndex;

/// Error raised when a SMILES string cannot be read into a molecule.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SmilesError {
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { position: usize, ch: char },
    #[error("unknown element '{symbol}' at position {position}")]
    UnknownElement { position: usize, symbol: String },
    #[error("bracket atom opened at position {position} is not closed")]
    UnclosedBracket { position: usize },
    #[error("unbalanced parenthesis at position {position}")]
    UnbalancedParenthesis { position: usize },
    #[error("ring bond {digit} is never closed")]
    UnclosedRing { digit: u16 },
    #[error("ring bond {digit} at position {position} joins an atom to itself or duplicates a bond")]
    InvalidRingBond { position: usize, digit: u16 },
    #[error("ring bond {digit} uses conflicting bond symbols")]
    ConflictingRingBond { digit: u16 },
    #[error("bond at position {position} has no atom to attach to")]
    DanglingBond { position: usize },
    #[error("unsupported chirality specification at position {position}")]
    UnsupportedChirality { position: usize },
    #[error("explicit valence {valence} for atom {atom} ({symbol}) exceeds the permitted maximum")]
    InvalidValence {
        atom: usize,
        symbol: &'static str,
        valence: u32,
    },
    #[error("atom {atom} is marked aromatic but is not in a ring")]
    NonRingAromatic { atom: usize },
}

/// Error type for split configuration, input validation, and structure failures.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(
        "dataset has {records} records but {encodings} structure encodings were supplied"
    )]
    LengthMismatch { records: usize, encodings: usize },
    #[error("failed to derive a scaffold for record {index} ('{smiles}'): {source}")]
    StructureParse {
        index: RecordIndex,
        smiles: String,
        #[source]
        source: SmilesError,
    },
    #[error("splitter produced an inconsistent assignment: {0}")]
    InconsistentAssignment(String),
}

impl SplitError {
    /// True for caller configuration mistakes, false for data-quality failures.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SplitError::InvalidArgument(_) | SplitError::LengthMismatch { .. }
        )
    }
}
