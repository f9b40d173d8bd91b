//! Command handlers -- one module per subcommand

pub mod audit;
pub mod check;
pub mod config;
