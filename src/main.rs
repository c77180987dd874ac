use std::net::SocketAddr;

use anyhow::Context;
use hs_projects::config::{self, AdminAccount, Settings};
use hs_projects::members::SqliteMemberDirectory;
use hs_projects::models::member::NewMember;
use hs_projects::{create_app, db, docs, sessions};
use sqlx::SqlitePool;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    let _log_guard = init_tracing()?;

    let settings = Settings::from_env()?;
    let pool = db::init(&settings.database_url).await?;

    if let Some(admin) = settings.admin.as_ref() {
        bootstrap_admin(&pool, admin).await?;
    }
    let purged = sessions::purge_expired(&pool).await?;
    if purged > 0 {
        tracing::info!(purged, "expired sessions removed");
    }

    let app = create_app(pool, &settings).await?;
    let openapi = docs::build_openapi(settings.port, settings.tls.is_some(), &settings.session.cookie_name)?;
    let app = app.merge(docs::swagger_routes(openapi)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));

    match settings.tls.as_ref() {
        Some(tls) => {
            let config = axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .with_context(|| format!("failed to load TLS material from {}", tls.cert.display()))?;
            tracing::info!("listening on https://{}", addr);
            axum_server::bind_rustls(addr, config)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!("listening on http://{}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}

async fn bootstrap_admin(pool: &SqlitePool, admin: &AdminAccount) -> anyhow::Result<()> {
    let directory = SqliteMemberDirectory::new(pool.clone());
    let created = directory
        .ensure_member(&NewMember {
            username: admin.username.clone(),
            name: admin.username.clone(),
            course: String::new(),
            email: String::new(),
            join_date: chrono::Utc::now().date_naive(),
            tags: admin.tags.clone(),
            password: admin.password.clone(),
        })
        .await
        .context("failed to bootstrap admin account")?;

    if created {
        tracing::info!(username = %admin.username, "admin account created");
    }
    Ok(())
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() -> anyhow::Result<Option<WorkerGuard>> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let (file_layer, guard) = match config::logs_dir() {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(&dir, "hs-projects.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let fallback = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
