pub mod aggregate;
pub mod calendar_ops;
pub mod priority;
pub mod search;
pub mod works;
