pub mod command;
pub mod host;
pub mod report;

pub use command::*;
pub use host::*;
pub use report::*;
