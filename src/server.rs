use std::io::{Error, ErrorKind};
use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;

use tokio::signal::unix::{signal, SignalKind};

use chrono::Utc;
use log::{error, info};

use crate::api::{routes, AppState};

pub async fn run() -> std::io::Result<()> {
    // @NOTE: server configuration
    let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("SERVER_PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse::<u16>()
        .map_err(|_| Error::new(ErrorKind::InvalidInput, "Invalid SERVER_PORT"))?;
    let concurrent = std::env::var("SERVER_CONCURRENT")
        .unwrap_or_else(|_| "1".to_string())
        .parse::<usize>()
        .map_err(|_| Error::new(ErrorKind::InvalidInput, "Invalid SERVER_CONCURRENT"))?;

    // @NOTE: monitoring
    let prometheus = PrometheusMetricsBuilder::new("sitecms")
        .endpoint("/metrics")
        .build()
        .map_err(|e| {
            Error::new(
                ErrorKind::Other,
                format!("Failed to build prometheus metrics: {:?}", e),
            )
        })?;

    // @NOTE: store appstate
    let appstate = Arc::new(AppState::new().await?);

    // @NOTE: spawn new http server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(prometheus.clone())
            .wrap(Logger::default())
            .app_data(Data::new(appstate.clone()))
            .configure(routes)
    })
    .workers(concurrent)
    .bind((host.as_str(), port))
    .map_err(|e| {
        Error::new(
            ErrorKind::AddrInUse,
            format!("Failed to bind to {}:{}: {}", host, port, e),
        )
    })?
    .shutdown_timeout(30)
    .disable_signals()
    .run();

    let handler = server.handle();

    info!(
        "Server started at {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
    );

    // @NOTE: graceful shutdown
    actix_rt::spawn(async move {
        let (mut sigint, mut sigterm) = match (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
        ) {
            (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
            (Err(error), _) | (_, Err(error)) => {
                error!("Failed to install signal handlers: {}", error);
                return;
            }
        };

        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }

        info!("Shutting down...");
        handler.stop(true).await;
    });

    // @NOTE: wait for everything to finish
    let ok = server.await;

    info!("Server is downed gracefully...");
    ok
}
