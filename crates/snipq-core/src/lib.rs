pub mod boundary;
pub mod clipboard;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod index;
pub mod models;
pub mod storage;
pub mod template;
pub mod trigger;
pub mod variables;

// Re-export common items for convenience
pub use boundary::Capture;
pub use clipboard::{get_clipboard_text, system_context};
pub use config::{get_config_dir, get_port_file_path, get_vault_file_path, Settings};
pub use engine::{ExpandContext, ExpansionService, Snapshot};
pub use error::{ExpandError, Result, SnipqError};
pub use history::HistoryEntry;
pub use models::{Group, ParamValue, Params, Rendered, Snippet, VaultInfo};
pub use storage::{load_vault, Vault};
pub use trigger::params_from_json;
pub use variables::VariableContext;
