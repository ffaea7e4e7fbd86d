//! hostrelay application layer: ports and the per-query use cases.
pub mod ports;
pub mod use_cases;
