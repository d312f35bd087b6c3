pub mod config;
pub mod startup;
