//! Domain model for cats, missions and mission targets.
//!
//! # Responsibility
//! - Define canonical records returned by repositories and services.
//! - Define input shapes and their normalization/validation rules.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that is never reused.
//! - `Mission::status` is derived by the engine; callers never set it.
//! - `Target::is_completed` is monotonic.

pub mod cat;
pub mod mission;
pub mod validation;
