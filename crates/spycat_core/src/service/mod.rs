//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the engine operations: cat registry,
//!   mission lifecycle, target ledger and assignment coordination.
//! - Normalize inputs and translate repository errors into `CoreError`.
//! - Emit one log event per mutating operation.
//!
//! # Invariants
//! - Service APIs never bypass repository transactions.
//! - Network I/O (breed lookup) happens before any write transaction opens.

pub mod assignment_service;
pub mod cat_service;
pub mod mission_service;
pub mod target_service;
