mod constraint;
mod database;
mod session;
mod table;

pub use database::{Database, DatabaseMeta, SNAPSHOT_KEY};
pub use session::Session;
pub use table::Table;
