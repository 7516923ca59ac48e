//! Large-trader open-interest concentration for single-stock futures.
//!
//! Scrapes the exchange's large-trader report per contract, normalizes the
//! "all contracts" row and keeps a rolling seven-day history in one JSON file.

pub mod config;
pub mod error;
pub mod exchange;
pub mod fetcher;
pub mod history;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod schema;
pub mod text;
