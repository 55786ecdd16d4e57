pub mod app;
pub mod checkpoint;
pub mod core;
pub mod manager;
pub mod queue;
