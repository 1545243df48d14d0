/// Servidor de ferramentas do Slack Lists
///
/// - `GET /health`: liveness
/// - `GET /status`: configuração efetiva (sem token)
/// - `GET /tools`: nomes das ferramentas
/// - `POST /tools/{nome}`: executa uma ferramenta com argumentos JSON
use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use slack_lists_middleware::{config::Settings, utils::logging::*, AppState};

mod handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 🔧 Carregar variáveis de ambiente do arquivo .env (se existir)
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    // Carregar configurações
    let settings = Settings::new().context("Failed to load settings")?;

    // RUST_LOG tem precedência sobre LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if dotenv_loaded {
        log_info("✅ Arquivo .env carregado com sucesso");
    }
    log_config_loaded(&std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()));

    if settings.slack.default_list_id.is_none() {
        log_warning("⚠️ DEFAULT_LIST_ID não configurado - ferramentas exigirão list_id");
    }

    let state = match AppState::new(settings.clone()) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            log_error(&format!("❌ Falha ao inicializar cliente Slack Lists: {}", e));
            return Err(e).context("Failed to initialize Slack Lists client");
        }
    };

    let app = handlers::router(state);

    let port = settings.server.port;
    let listener = TcpListener::bind(format!("{}:{}", settings.server.host, port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    log_server_startup(port);
    log_server_ready(&settings.server.host, port);

    // Graceful shutdown com signal handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info("🛑 Server shut down gracefully");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error(&format!("failed to install Ctrl+C handler: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log_error(&format!("failed to install signal handler: {}", e));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
