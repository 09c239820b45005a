//! Evaluation engine.
//!
//! Wires the data sources into the pure signal layer: one assessor call
//! is one complete fetch→compute→classify evaluation.

pub mod assessor;
