//! # Built-in subscribers
//!
//! - [`LogWriter`]: logs every lifecycle notification through `tracing`.

mod log;

pub use log::LogWriter;
