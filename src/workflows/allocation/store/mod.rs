//! Snapshot gateways: the CSV directory layout used by the `bto` binary and an
//! in-memory store for tests and the demo walkthrough.

pub mod csv;
pub mod memory;

pub use self::csv::CsvGateway;
pub use memory::MemoryGateway;
