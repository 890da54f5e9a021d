//! Utilities for managing the API server.

use snipq_core::{get_config_dir, get_port_file_path, Result, SnipqError};
use std::fs;
use std::io::Write;
use std::net::TcpListener;

/// Read the port a running API server recorded
pub fn get_api_server_port() -> Result<u16> {
    let port_file_path = get_port_file_path();
    if !port_file_path.exists() {
        return Err(SnipqError::Other(
            "API server port information not found".to_string(),
        ));
    }

    fs::read_to_string(port_file_path)?
        .trim()
        .parse::<u16>()
        .map_err(|_| SnipqError::Other("Invalid port stored in configuration".to_string()))
}

/// Check if a port is available by trying to bind to it
pub fn port_is_available(port: u16) -> bool {
    TcpListener::bind(format!("127.0.0.1:{}", port)).is_ok()
}

/// Save the API port to a configuration file
pub fn save_api_port(port: u16) -> Result<()> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    let mut file = fs::File::create(get_port_file_path())?;
    write!(file, "{}", port)?;

    Ok(())
}
