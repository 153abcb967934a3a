//! High-level entry points tying the engine and core layers into complete
//! folding procedures.

pub mod fold;
