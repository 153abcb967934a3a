use phf::phf_set;
use thiserror::Error;

/// One-letter codes accepted in input sequences (`X` marks an unknown residue).
static AMINO_ACIDS: phf::Set<char> = phf_set! {
    'A', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'V', 'W', 'Y', 'X',
};

/// Description reserved for short components that skip alignment searches.
const PEPTIDE_DESCRIPTION: &str = "Peptide";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SequenceError {
    #[error("Record '{description}' has an empty sequence")]
    Empty { description: String },

    #[error("Record '{description}' contains invalid residue character '{residue}'")]
    InvalidResidue { description: String, residue: char },
}

/// One unique protein sequence in a folding job.
///
/// Identity is the `(description, sequence)` pair; records repeating both
/// collapse into a single component with a raised [`multiplicity`](Self::multiplicity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    description: String,
    sequence: String,
    multiplicity: usize,
}

impl Component {
    /// Validates the sequence alphabet and builds a component with multiplicity 1.
    pub fn new(
        description: impl Into<String>,
        sequence: impl Into<String>,
    ) -> Result<Self, SequenceError> {
        let description = description.into();
        let sequence: String = sequence.into();

        if sequence.is_empty() {
            return Err(SequenceError::Empty { description });
        }
        if let Some(residue) = sequence.chars().find(|c| !AMINO_ACIDS.contains(c)) {
            return Err(SequenceError::InvalidResidue {
                description,
                residue,
            });
        }

        Ok(Self {
            description,
            sequence,
            multiplicity: 1,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// How many copies of this sequence the assembly carries (homo-oligomer count).
    pub fn multiplicity(&self) -> usize {
        self.multiplicity
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Peptide components contribute sequence to the assembly but are excluded
    /// from alignment and template searches.
    pub fn is_peptide(&self) -> bool {
        self.description == PEPTIDE_DESCRIPTION
    }

    pub(crate) fn raise_multiplicity(&mut self) {
        self.multiplicity += 1;
    }
}
