//! File formats exchanged with the external collaborators: FASTA sequence
//! records, alignment/template artifact probing, and machine-readable run
//! summaries.

pub mod artifacts;
pub mod fasta;
pub mod summary;
