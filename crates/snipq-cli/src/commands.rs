use crate::cli::{Commands, Snipq};
use snipq_core::{
    get_vault_file_path, load_vault, system_context, Capture, ExpandContext, ExpansionService,
    Result, SnipqError,
};
use snipq_server::{get_api_server_port, port_is_available, start_api_server};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub fn handle_command(args: Snipq) -> Result<()> {
    let vault_path = args.vault.unwrap_or_else(get_vault_file_path);
    debug!(vault = %vault_path.display(), "Using vault");

    match args.commands {
        Commands::Expand {
            trigger,
            app,
            surrounding,
            offset,
            strict_boundaries,
        } => {
            let mut context = ExpandContext::new(system_context(app.as_deref()));
            context.capture = surrounding.map(|surrounding| Capture {
                surrounding,
                offset,
            });
            context.strict_boundaries = strict_boundaries;
            handle_expand(&vault_path, &trigger, &context)
        }
        Commands::Preview { trigger } => {
            let context = ExpandContext::new(system_context(None));
            let output = load_service(&vault_path)?.preview(&trigger, &context)?;
            println!("{}", output);
            Ok(())
        }
        Commands::Groups => handle_groups(&vault_path),
        Commands::Snippets { group_id } => handle_snippets(&vault_path, &group_id),
        Commands::Search { query } => handle_search(&vault_path, &query),
        Commands::Info => {
            let info = load_service(&vault_path)?.vault_info();
            println!("Vault:    {}", vault_path.display());
            println!("Groups:   {}", info.groups);
            println!("Snippets: {}", info.snippets);
            Ok(())
        }
        Commands::Check => {
            let vault = load_vault(&vault_path)?;
            println!(
                "Vault OK: {} groups, {} snippets",
                vault.groups.len(),
                vault.snippets.len()
            );
            Ok(())
        }
        Commands::Serve { port } => handle_serve_command(vault_path, port),
        Commands::Port => handle_port_command(),
    }
}

fn load_service(vault_path: &Path) -> Result<ExpansionService> {
    ExpansionService::new(load_vault(vault_path)?)
}

fn handle_expand(vault_path: &Path, trigger: &str, context: &ExpandContext) -> Result<()> {
    let rendered = load_service(vault_path)?.expand(trigger, context)?;
    println!("{}", rendered.output);
    eprintln!(
        "snippet: {}  cursor: {}",
        rendered.used_snippet, rendered.cursor_offset
    );
    Ok(())
}

fn handle_groups(vault_path: &Path) -> Result<()> {
    let groups = load_service(vault_path)?.groups();
    if groups.is_empty() {
        println!("No groups found.");
    }
    for group in groups {
        let state = if group.enabled { "" } else { " (disabled)" };
        println!("{:<16} {}{}", group.id, group.name, state);
    }
    Ok(())
}

fn handle_snippets(vault_path: &Path, group_id: &str) -> Result<()> {
    let snippets = load_service(vault_path)?.snippets(group_id);
    if snippets.is_empty() {
        println!("No snippets in group '{}'.", group_id);
    }
    for snippet in snippets {
        println!("{:<16} {}", snippet.trigger, snippet.name);
    }
    Ok(())
}

fn handle_search(vault_path: &Path, query: &str) -> Result<()> {
    let snippets = load_service(vault_path)?.search(query);
    if snippets.is_empty() {
        println!("No snippets match '{}'.", query);
    }
    for snippet in snippets {
        println!("{:<16} {:<24} [{}]", snippet.trigger, snippet.name, snippet.group_id);
    }
    Ok(())
}

fn handle_port_command() -> Result<()> {
    match get_api_server_port() {
        Ok(port) => {
            println!("snipq API server is running on port {}", port);
            println!("API available at: http://localhost:{}/api", port);
        }
        Err(e) => {
            debug!(error = %e, "No recorded API port");
            println!("snipq API server port information not found.");
            println!("Start it with 'snipq serve'.");
        }
    }
    Ok(())
}

fn handle_serve_command(vault_path: PathBuf, port: u16) -> Result<()> {
    if !port_is_available(port) {
        return Err(SnipqError::Other(format!("Port {} is already in use", port)));
    }
    let service = Arc::new(load_service(&vault_path)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    // Block the current thread with the server
    runtime.block_on(async {
        println!("Starting API server on port {}...", port);
        start_api_server(service, vault_path, port).await
    })
}
