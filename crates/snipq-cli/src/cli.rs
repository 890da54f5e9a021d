use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = "snipq - A text snippet expansion engine",
    long_about = "snipq resolves short triggers like :ty?lang=vi into full text, filling placeholders from parameters, defaults and context."
)]
pub struct Snipq {
    #[clap(
        long,
        global = true,
        help = "Path to the vault file (defaults to $SNIPQ_VAULT or ~/.snipq/vault.json)"
    )]
    pub vault: Option<PathBuf>,

    #[clap(subcommand)]
    pub commands: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Expand a trigger and print the output with its cursor offset
    Expand {
        #[clap(help = "Raw trigger text, e.g. ':hello?name=John'")]
        trigger: String,

        #[clap(long, help = "Foreground application identifier")]
        app: Option<String>,

        #[clap(long, help = "Text around the trigger, enables boundary checks")]
        surrounding: Option<String>,

        #[clap(long, help = "Character offset of the trigger inside --surrounding")]
        offset: Option<usize>,

        #[clap(long, value_name = "BOOL", help = "Override the strictBoundaries setting")]
        strict_boundaries: Option<bool>,
    },
    /// Render a trigger without boundary checks or history
    Preview {
        #[clap(help = "Raw trigger text")]
        trigger: String,
    },
    /// List groups in display order
    Groups,
    /// List the snippets of a group
    Snippets {
        #[clap(help = "Group id")]
        group_id: String,
    },
    /// Find snippets whose name, trigger or tags contain a query
    Search {
        #[clap(help = "Case-insensitive text to look for")]
        query: String,
    },
    /// Show vault counts
    Info,
    /// Validate the vault file
    Check,
    /// Start the local API server
    Serve {
        #[clap(long, short, default_value = "3000", help = "Port to listen on")]
        port: u16,
    },
    /// Show the port of the running API server
    Port,
}
