pub mod app;
pub mod assets;
pub mod browser;
pub mod cli;
pub mod config;
pub mod git;
pub mod server;
pub mod session;
pub mod state;
pub mod theme;
