pub mod config;
pub mod errors;
pub mod gate;
pub mod logging;
pub mod orchestrator;
pub mod parser;
pub mod plan;
pub mod step;
pub mod stream;
pub mod tool;
pub mod ui;
