//! HTTP server implementation for the snipq API.

use crate::api::{
    clear_history_handler, expand_handler, get_groups, get_history, get_snippets,
    get_vault_info, preview_handler, reload_handler, search_snippets, ExpandRequest,
    PreviewRequest, SearchQuery, SnippetsQuery,
};
use crate::server::utils::save_api_port;

use snipq_core::{ExpansionService, Result, SnipqError};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use warp::Filter;

fn with_service(
    service: Arc<ExpansionService>,
) -> impl Filter<Extract = (Arc<ExpansionService>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&service))
}

/// All API routes, without CORS or binding
pub fn routes(
    service: Arc<ExpansionService>,
    vault_path: PathBuf,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let groups_route = warp::path!("api" / "groups")
        .and(warp::get())
        .and(with_service(service.clone()))
        .map(|service: Arc<ExpansionService>| warp::reply::json(&get_groups(&service)));

    let snippets_route = warp::path!("api" / "snippets")
        .and(warp::get())
        .and(warp::query::<SnippetsQuery>())
        .and(with_service(service.clone()))
        .map(|query: SnippetsQuery, service: Arc<ExpansionService>| {
            warp::reply::json(&get_snippets(&service, &query.group_id))
        });

    let search_route = warp::path!("api" / "search")
        .and(warp::get())
        .and(warp::query::<SearchQuery>())
        .and(with_service(service.clone()))
        .map(|query: SearchQuery, service: Arc<ExpansionService>| {
            warp::reply::json(&search_snippets(&service, &query.q))
        });

    let expand_route = warp::path!("api" / "expand")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .map(|body: ExpandRequest, service: Arc<ExpansionService>| {
            warp::reply::json(&expand_handler(&service, body))
        });

    let preview_route = warp::path!("api" / "preview")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .map(|body: PreviewRequest, service: Arc<ExpansionService>| {
            warp::reply::json(&preview_handler(&service, body))
        });

    let vault_route = warp::path!("api" / "vault")
        .and(warp::get())
        .and(with_service(service.clone()))
        .map(|service: Arc<ExpansionService>| warp::reply::json(&get_vault_info(&service)));

    let history_route = warp::path!("api" / "history")
        .and(warp::get())
        .and(with_service(service.clone()))
        .map(|service: Arc<ExpansionService>| warp::reply::json(&get_history(&service)));

    let clear_history_route = warp::path!("api" / "history")
        .and(warp::delete())
        .and(with_service(service.clone()))
        .map(|service: Arc<ExpansionService>| {
            warp::reply::json(&clear_history_handler(&service))
        });

    let reload_route = warp::path!("api" / "reload")
        .and(warp::post())
        .and(with_service(service))
        .map(move |service: Arc<ExpansionService>| {
            warp::reply::json(&reload_handler(&service, &vault_path))
        });

    // Health check endpoint
    let health_route = warp::path!("health").map(|| "snipq API is running");

    groups_route
        .or(snippets_route)
        .or(search_route)
        .or(expand_route)
        .or(preview_route)
        .or(vault_route)
        .or(history_route)
        .or(clear_history_route)
        .or(reload_route)
        .or(health_route)
}

/// Start the HTTP API server on the specified port
pub async fn start_api_server(
    service: Arc<ExpansionService>,
    vault_path: PathBuf,
    port: u16,
) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    // Save the port to file so clients can find it
    save_api_port(port)?;

    println!("┌─────────────────────────────────────────┐");
    println!("│          snipq API Server               │");
    println!("├─────────────────────────────────────────┤");
    println!("│ Status: Running                         │");
    println!("│ Port:   {:<31} │", port);
    println!("│ URL:    http://localhost:{:<14} │", port);
    println!("└─────────────────────────────────────────┘");

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["Content-Type"])
        .allow_methods(vec!["GET", "POST", "DELETE"]);

    let server = warp::serve(routes(service, vault_path).with(cors))
        .try_bind_with_graceful_shutdown(addr, async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received shutdown signal, stopping API server");
        });

    match server {
        Ok((addr, server)) => {
            info!(%addr, "API server started");
            server.await;
            Ok(())
        }
        Err(e) => Err(SnipqError::Other(format!(
            "Failed to bind to port {}: {}",
            port, e
        ))),
    }
}
