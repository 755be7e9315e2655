mod app;
pub mod config;
mod effects;
pub mod logging;
mod oneshot;
mod ui;

pub use app::run_app;
pub use oneshot::run_oneshot;
