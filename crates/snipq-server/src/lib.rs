//! Local HTTP API exposing the snipq expansion engine to UI processes.

pub mod api;
pub mod server;

pub use server::{get_api_server_port, port_is_available, routes, start_api_server};
