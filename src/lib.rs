//! Taskboard Server Library
//!
//! Task lists with per-user completion stats and a leaderboard, backed by
//! SQLite and served over a JSON API.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod leaderboard;
pub mod service;
pub mod stats;
pub mod subscriptions;
pub mod types;
pub mod window;
