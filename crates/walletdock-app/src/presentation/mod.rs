pub mod bootstrap;
pub mod cli;
pub mod error;
