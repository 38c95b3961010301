pub mod app;
pub mod commands;
pub mod render;

pub use app::App;
pub use commands::Command;
