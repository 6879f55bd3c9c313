pub mod console_logger;
pub mod file_logger;
pub mod multi_logger;
pub mod navigation_data;
pub mod noop_logger;

pub use console_logger::*;
pub use file_logger::*;
pub use multi_logger::*;
pub use navigation_data::*;
pub use noop_logger::*;
