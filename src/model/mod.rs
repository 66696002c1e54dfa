pub mod config;
pub mod overrides;
pub mod report;
pub mod task;
pub mod works;

pub use config::*;
pub use overrides::*;
pub use report::*;
pub use task::*;
pub use works::*;
