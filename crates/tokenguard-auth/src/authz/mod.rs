//! Code-based authorization.

pub mod evaluator;

pub use evaluator::{CodeKind, CodeRequirement, Evaluator, JoinMode};
