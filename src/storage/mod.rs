pub mod json_backend;
pub mod memory;

pub use json_backend::JsonLedgerStore;
pub use memory::MemoryLedgerStore;
