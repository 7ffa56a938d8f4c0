// datacheck-core/src/ports/mod.rs

pub mod clock;
pub mod executor;

pub use clock::{Clock, FixedClock, SystemClock};
pub use executor::{QueryExecutor, Row, Value};

#[cfg(test)]
pub(crate) mod testing;
