pub mod config;
pub mod deps;
pub mod download;
pub mod logging;
pub mod progress;
pub mod yt;
