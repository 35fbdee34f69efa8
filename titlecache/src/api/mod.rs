//! HTTP front end for the title cache

pub mod routes;
pub mod server;

pub use server::{ApiServer, ApiServerConfig};
