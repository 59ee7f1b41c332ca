use std::sync::Arc;

use anyhow::Result;
use foodcourtio_identity::AccessResolver;
use foodcourtio_notification::NotificationFanout;
use foodcourtio_order::OrderEngine;
use foodcourtio_payment::PaymentBroker;
use foodcourtio_payment::adapter::{PspAAdapter, PspBAdapter};
use foodcourtio_store::{Dispatcher, start_ticker};
use foodcourtio_workforce::{MissedShiftSweeper, ShiftReminder, WorkforceLedger};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::RateLimiter;
use crate::routes::AppState;

pub async fn serve(
    config: crate::config::Config,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<()> {
    tracing::info!("starting foodcourtio server...");

    let host = host_override.unwrap_or(config.server.host.to_owned());
    let port = port_override.unwrap_or(config.server.port);

    let write_pool = crate::db::create_write_pool(&config.database.url).await?;
    let read_pool =
        crate::db::create_read_pool(&config.database.url, config.database.max_read_connections)
            .await?;

    let psp_a = PspAAdapter::new(
        &config.providers.psp_a.base_url,
        config.providers.psp_a.secret.clone(),
    )?;
    let psp_b = PspBAdapter::new(
        &config.providers.psp_b.base_url,
        config.providers.psp_b.shop_id.clone(),
        config.providers.psp_b.secret.clone(),
    )?;

    let payments = PaymentBroker::new(write_pool.clone(), config.providers.currency.clone())
        .with_adapter(Arc::new(psp_a))
        .with_adapter(Arc::new(psp_b));
    let orders = OrderEngine::new(write_pool.clone(), Arc::new(payments.clone()));
    let workforce = WorkforceLedger::new(write_pool.clone());
    let access = AccessResolver::new(read_pool.clone());

    tracing::info!("starting outbox dispatcher...");
    let dispatcher = Dispatcher::new(read_pool.clone(), write_pool.clone())
        .subscribe(Arc::new(NotificationFanout::new(write_pool.clone())))
        .spawn();

    tracing::info!("starting scheduled task ticker...");
    let mut ticker = start_ticker(vec![
        Arc::new(MissedShiftSweeper::new(write_pool.clone())),
        Arc::new(ShiftReminder::new(write_pool.clone())),
    ])
    .await?;
    ticker.start().await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        read_db: read_pool.clone(),
        write_db: write_pool.clone(),
        access,
        orders,
        payments,
        workforce,
        rate_limiter: Arc::new(RateLimiter::new(config.rate_limit_per_minute)),
    };

    let app = crate::routes::router(state)
        .layer(CompressionLayer::new().br(true).gzip(true))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("server listening on {}", listener.local_addr()?);

    let shutdown_signal = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("received Ctrl+C signal");
            },
            _ = terminate => {
                tracing::info!("received SIGTERM signal");
            },
        }

        tracing::info!("starting graceful shutdown...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    tracing::info!("shutting down background workers...");

    ticker.shutdown().await?;
    if let Err(err) = dispatcher.shutdown().await {
        tracing::error!(err = %err, "dispatcher shutdown failed");
    }

    tracing::info!("closing database pools...");
    read_pool.close().await;
    write_pool.close().await;

    tracing::info!("graceful shutdown complete");

    Ok(())
}
