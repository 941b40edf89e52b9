use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::app::AppContext;
use crate::configs::Settings;

pub mod app;
pub mod configs;
pub mod devices;
pub mod errors;
pub mod handles;
pub mod models;
pub mod repositories;
pub mod services;

#[cfg(any(test, feature = "mock"))]
pub mod tests;

pub async fn run(settings: &Arc<Settings>) -> anyhow::Result<()> {
    let context = AppContext::new(settings).await.context("failed to open storage")?;
    context.seed_devices(&settings.devices).await?;

    let (shutdown_sender, shutdown) = watch::channel(false);

    let polling = context.polling_service.clone();
    let polling_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { polling.run(shutdown).await }
    });

    let automation = context.automation_service.clone();
    let automation_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { automation.run(shutdown).await }
    });

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
            return;
        }

        tracing::info!("shutdown requested");
        shutdown_sender.send_replace(true);
    });

    let ip_addr = settings.server.host.parse::<IpAddr>()?;

    let address = SocketAddr::from((ip_addr, settings.server.port));

    let listener = TcpListener::bind(&address).await?;

    tracing::info!("listening on {:?}", address);

    let mut server_shutdown = shutdown;
    axum::serve(listener, context.router())
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    polling_task.await?;
    automation_task.await?;

    Ok(())
}
