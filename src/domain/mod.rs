pub mod ids;
pub mod models;
pub mod pomodoro;
pub mod time_format;
