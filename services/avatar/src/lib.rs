pub mod config;
pub mod headless;
