pub mod http_server;
pub mod utils;

pub use http_server::{routes, start_api_server};
pub use utils::{get_api_server_port, port_is_available, save_api_port};
