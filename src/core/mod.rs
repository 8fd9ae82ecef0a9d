//! Core business logic - framework-agnostic store and engine operations.
//!
//! Every function in these modules takes the database handle and the
//! caller's [`context::RequestContext`] explicitly; nothing reads ambient
//! state. The API layer is a thin mapping from HTTP onto these calls.

/// Allocation engine - category distribution and payment attribution
pub mod allocation;
/// Budget category store
pub mod category;
/// Request-scoped authorization context
pub mod context;
/// Income event store
pub mod income;
/// Offset pagination shared by list operations
pub mod pagination;
/// Payment store
pub mod payment;
/// Recurrence date computation
pub mod recurrence;
/// Read-only reporting rollups
pub mod report;
