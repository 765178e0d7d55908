//! Server mode
//!
//! Starts the HTTP server (redirects + health) and the background checker,
//! then waits for Ctrl+C.

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::services::{AppStartTime, health_routes, redirect_routes};
use crate::checker::{StatusRepository, UrlRepository};
use crate::config::get_config;
use crate::runtime::lifetime::{self, startup::StartupContext};

pub async fn run_server() -> Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };
    let config = get_config();

    let StartupContext { storage, checker } = lifetime::startup::prepare_server_startup().await?;

    let urls: Arc<dyn UrlRepository> = storage.clone();
    let statuses: Arc<dyn StatusRepository> = storage.clone();
    let scheduler = checker.as_ref().map(|handle| handle.scheduler());

    let server = HttpServer::new(move || {
        let app = App::new()
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(urls.clone()))
            .app_data(web::Data::new(statuses.clone()))
            .app_data(web::Data::new(app_start_time.clone()));

        let app = match &scheduler {
            Some(scheduler) => app.app_data(web::Data::new(scheduler.clone())),
            None => app,
        };

        app.service(health_routes()).service(redirect_routes())
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .workers(config.server.cpu_count.max(1))
    .disable_signals();

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();
    let server_handle = server.handle();

    // Wait for server or shutdown signal
    tokio::select! {
        res = server => {
            res.context("HTTP server terminated")?;
        }
        _ = lifetime::shutdown::wait_for_signal() => {
            server_handle.stop(true).await;
        }
    }

    lifetime::shutdown::stop_checker(checker).await;
    warn!("Graceful shutdown completed");
    Ok(())
}
