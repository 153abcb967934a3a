//! # Engine Module
//!
//! The stateful orchestration layer of plexfold. It decides *what* to run,
//! *when* to stop, and *what* to keep — the underlying inference itself is an
//! external collaborator reached through the traits in [`runners`].
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) — folding parameters, presets, and builder
//!   validation
//! - **Cache Resolution** ([`cache`]) — the MSA library: marker-validated
//!   lookups and atomic artifact publishing
//! - **Run Versioning** ([`versioning`]) — safe re-execution into a non-empty
//!   output directory
//! - **Recycling** ([`recycle`]) — the per-candidate iterative-refinement
//!   state machine with convergence-based early stop
//! - **Sampling** ([`sampling`]) — the model × seed grid with per-cell
//!   failure isolation
//! - **Selection** ([`selection`]) — region-aware candidate ranking
//! - **Progress Monitoring** ([`progress`]) — callback-based progress events
//! - **Error Handling** ([`error`]) — engine-specific error taxonomy

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod recycle;
pub mod runners;
pub mod sampling;
pub mod selection;
pub mod versioning;
