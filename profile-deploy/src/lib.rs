pub mod cli;
pub mod load_config;
pub mod oss;

pub use cli::{run, Cli, Commands};
