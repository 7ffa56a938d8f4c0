// datacheck-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts the engine needs from the outside world (query executor, clock).
pub mod ports;

// 2. Domain
// Result model, rule model, SQL fragments. Depends on nothing but the ports.
pub mod domain;

// 3. Infrastructure (Adapters)
// DuckDB executor, YAML configuration, report writers.
pub mod infrastructure;

// 4. Application (Use Cases)
// Evaluators, checker orchestration, run use case.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::DataCheckError;
