// Adapters layer: concrete implementations of the domain ports (stores, attendee sources).

pub mod file_store;
pub mod memory_store;
pub mod roster;
pub mod spond;
