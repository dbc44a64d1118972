pub mod app;
pub mod chart;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod output;
pub mod table;
pub mod utils;
pub mod view;

#[cfg(test)]
mod tests;
