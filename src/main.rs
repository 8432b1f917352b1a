use anyhow::Result;
use tokio::signal;
use tracing::{error, info, warn};
use dotenvy::dotenv;

use maintenance_tracker::config::{DatabaseConfig, EnvironmentConfig};
use maintenance_tracker::database::DatabaseConnection;
use maintenance_tracker::routes::build_app;
use maintenance_tracker::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .init();

    info!("🔧 Vehicle Maintenance Tracker - API");
    info!("====================================");
    info!("🌍 Entorno: {}", config.environment);
    if config.is_production() && config.cors_origins.is_empty() {
        warn!("⚠️ CORS_ORIGINS vacío en producción: se aceptan todos los orígenes");
    }

    // Inicializar base de datos
    let db_connection = match DatabaseConnection::new(&DatabaseConfig::from(&config)).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {:#}", e);
            return Err(e);
        }
    };

    let addr = config.server_url();
    let app = build_app(AppState::new(db_connection.pool().clone(), config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("👤 Auth:");
    info!("   POST /api/auth/register | /login | /token/refresh | /logout");
    info!("   GET|PUT|PATCH /api/auth/profile");
    info!("   PUT|PATCH /api/auth/change-password");
    info!("   DELETE /api/auth/delete-account");
    info!("🚗 Vehículos:");
    info!("   GET|POST /api/vehicles");
    info!("   GET|PUT|PATCH|DELETE /api/vehicles/:id");
    info!("   GET|POST /api/vehicles/:id/images");
    info!("🛠️ Mantenimiento:");
    info!("   /api/maintenance/maintenance-types");
    info!("   /api/maintenance/records (+ /upcoming, /:id/create-reminder)");
    info!("   /api/maintenance/reminders (+ /upcoming, /:id/mark-completed)");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
