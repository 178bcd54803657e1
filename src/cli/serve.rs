//! HTTP API server command

use super::helpers::Context;
use pathwise_core::{
    api::{ApiServer, ApiServerConfig},
    error::{PathwiseError, Result},
};
use std::net::SocketAddr;
use tracing::debug;

pub async fn handle(ctx: &Context, addr: Option<String>) -> Result<()> {
    let addr = addr.unwrap_or_else(|| ctx.config.api.addr.clone());
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| PathwiseError::validation(format!("Invalid address '{}': {}", addr, e)))?;

    debug!("Starting HTTP API server...");
    let app = ctx.open_app(true).await?;

    println!();
    println!("PathWise API Server");
    println!();
    println!("   Address:   http://{}", socket_addr);
    println!("   Predictor: {}", app.config.predictor.base_url);
    println!();
    println!("   Endpoints:");
    println!("   - GET  /health - Health check");
    println!("   - POST /auth/register, /auth/login, /auth/logout");
    println!("   - GET  /events - Server-Sent Events stream (per user)");
    println!("   - GET  /dashboard, /progress, /roadmap, /paths");
    println!("   - GET  /goals, /community/questions, /mentors");
    println!();

    let server = ApiServer::new(app, ApiServerConfig { addr: socket_addr });
    server.serve().await?;
    Ok(())
}
