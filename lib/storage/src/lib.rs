//! # reviewdex Storage
//!
//! Where review records come from and go back to. The core never touches
//! storage directly; callers load a snapshot through a [`RecordStore`],
//! work on it in memory, and save it back.

pub mod json_file;
pub mod memory;
pub mod store;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use store::RecordStore;
