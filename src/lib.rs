pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod fsio;
pub mod logging;
pub mod vault;
