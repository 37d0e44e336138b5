use anyhow::Context;
use todolist_service::{
    application::todo_service::TodoServiceImpl,
    config::AppConfig,
    domain::repository::TodoRepository,
    http::routing::{self, health, todos},
    infrastructure::sqlite_repo::SqliteTodoRepository,
    logging::init_tracing,
};
use tokio::{net::TcpListener, sync::watch, task::JoinHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    init_tracing(&cfg.log_level);

    let repo = SqliteTodoRepository::connect(&cfg.database_url, cfg.db_max_connections).await?;
    repo.init().await?;
    let service = TodoServiceImpl::new(repo.clone());
    let router = routing::app(
        health::router(health::ServiceInfo { build_env: cfg.build_env.clone() }),
        todos::router(todos::AppState { service }),
    );

    let listener = TcpListener::bind(cfg.bind_addr())
        .await
        .with_context(|| format!("failed to listen on {}", cfg.bind_addr()))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let mut server: JoinHandle<std::io::Result<()>> = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.changed().await;
            })
            .await
    });

    let finished = tokio::select! {
        res = &mut server => Some(res),
        () = shutdown_signal() => None,
    };
    match finished {
        Some(res) => report(res),
        None => {
            let _ = stop_tx.send(true);
            let drained = tokio::time::timeout(cfg.shutdown_timeout, &mut server).await;
            match drained {
                Ok(res) => report(res),
                Err(_) => {
                    tracing::warn!(timeout = ?cfg.shutdown_timeout, "in-flight requests did not drain in time");
                    server.abort();
                }
            }
        }
    }

    repo.close().await;
    tracing::info!("server exited");
    Ok(())
}

fn report(res: Result<std::io::Result<()>, tokio::task::JoinError>) {
    match res {
        Ok(Ok(())) => tracing::info!("server stopped"),
        Ok(Err(err)) => tracing::error!("server error: {err}"),
        Err(err) => tracing::error!("server task failed: {err}"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::warn!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown");
}
