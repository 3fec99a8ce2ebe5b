#![forbid(unsafe_code)]

pub mod audit;
pub mod catalog;
pub mod common;
pub mod orgroles;

pub use common::{ContractViolation, MonotonicTimeNs, ReasonCodeId, SchemaVersion, Validate};
