pub mod cfg;
pub mod db_error;
pub mod sql;
pub mod storage;
pub mod store;
pub mod types;
pub mod utils;

pub use sql::{Executor, Parser, QueryOutcome};
pub use store::{Database, Session};

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
