mod timestamp;
pub use timestamp::*;

mod format;
pub use format::*;
