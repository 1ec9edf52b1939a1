pub mod board;
pub mod bootstrap;
pub mod commands;
pub mod engine;
pub mod queue;
pub mod scheduler;
