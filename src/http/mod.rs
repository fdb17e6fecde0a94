//! HTTP API for the taskboard server.

mod server;

pub use server::{ApiServer, start_server};
