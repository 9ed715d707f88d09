pub mod engine;
pub mod file;
pub mod memory;

pub use engine::{SnapshotStore, StoreStatus};
pub use file::FileStore;
pub use memory::Memory;
