use super::component::{Component, SequenceError};
use crate::core::io::fasta::FastaRecord;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum JobError {
    #[error("Input contains no sequence records")]
    NoRecords,

    #[error("Records named '{description}' share a description but differ in sequence")]
    ConflictingDescription { description: String },

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// Oligomeric composition of an assembled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composition {
    /// A single component, single copy.
    Monomer,
    /// A single component present in more than one copy.
    Homomer,
    /// More than one distinct component.
    Heteromer,
}

impl std::fmt::Display for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Composition::Monomer => "monomer",
            Composition::Homomer => "homomer",
            Composition::Heteromer => "heteromer",
        };
        write!(f, "{label}")
    }
}

/// An assembled folding job: the ordered set of unique components and the
/// composition tag derived from them. Never mutated after assembly.
#[derive(Debug, Clone)]
pub struct Job {
    name: String,
    components: Vec<Component>,
    composition: Composition,
}

impl Job {
    /// Assembles a job from raw input records.
    ///
    /// The component description is the first whitespace-delimited token of the
    /// record header. Records repeating an existing `(description, sequence)`
    /// pair raise that component's multiplicity; a repeated description with a
    /// diverging sequence is rejected as a modeling error.
    pub fn assemble(name: impl Into<String>, records: &[FastaRecord]) -> Result<Self, JobError> {
        if records.is_empty() {
            return Err(JobError::NoRecords);
        }

        let mut components: Vec<Component> = Vec::new();
        for record in records {
            let description = record
                .header
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();

            match components
                .iter_mut()
                .find(|c| c.description() == description)
            {
                Some(existing) if existing.sequence() == record.sequence => {
                    existing.raise_multiplicity();
                }
                Some(_) => {
                    return Err(JobError::ConflictingDescription { description });
                }
                None => {
                    components.push(Component::new(description, record.sequence.clone())?);
                }
            }
        }

        let composition = match (components.len(), components[0].multiplicity()) {
            (1, 1) => Composition::Monomer,
            (1, _) => Composition::Homomer,
            _ => Composition::Heteromer,
        };

        Ok(Self {
            name: name.into(),
            components,
            composition,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn composition(&self) -> Composition {
        self.composition
    }

    /// Components that participate in alignment and template searches.
    pub fn searchable_components(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(|c| !c.is_peptide())
    }

    /// The full assembly sequence: each component repeated by its multiplicity,
    /// in input order.
    pub fn assembly_sequence(&self) -> String {
        let mut sequence = String::with_capacity(self.total_length());
        for component in &self.components {
            for _ in 0..component.multiplicity() {
                sequence.push_str(component.sequence());
            }
        }
        sequence
    }

    /// Per-chain lengths of the expanded assembly, in assembly order.
    pub fn chain_lengths(&self) -> Vec<usize> {
        self.components
            .iter()
            .flat_map(|c| std::iter::repeat_n(c.len(), c.multiplicity()))
            .collect()
    }

    pub fn total_length(&self) -> usize {
        self.components
            .iter()
            .map(|c| c.len() * c.multiplicity())
            .sum()
    }
}
