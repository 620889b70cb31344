use anyhow::Context;
use std::sync::Arc;
use storage::Database;
use tokio::net::TcpListener;
use tokio::signal;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod routes;
mod state;

use config::Config;
use features::uploads::client::{ImageHost, ImageKitClient};
use middleware::auth::SessionKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::contests::handlers::list_contests,
        features::contests::handlers::list_localities,
        features::contests::handlers::get_contest_by_slug,
        features::contests::handlers::get_contest,
        features::contests::handlers::list_my_contests,
        features::contests::handlers::create_contest,
        features::contests::handlers::update_contest,
        features::contests::handlers::delete_contest,
        features::auth::handlers::register,
        features::auth::handlers::login,
        features::auth::handlers::current_session,
        features::auth::handlers::oauth_sign_in,
        features::uploads::handlers::upload_image,
    ),
    components(
        schemas(
            storage::dto::contest::CreateContestRequest,
            storage::dto::contest::UpdateContestRequest,
            storage::dto::contest::ContestResponse,
            storage::dto::user::RegisterRequest,
            storage::dto::user::LoginRequest,
            storage::dto::user::OAuthSignInRequest,
            storage::dto::user::UserResponse,
            storage::dto::user::SessionResponse,
            storage::models::SocialMedia,
            storage::models::LocalityCount,
            storage::models::Role,
            storage::models::AuthProvider,
            features::uploads::client::UploadedImage,
        )
    ),
    tags(
        (name = "contests", description = "Contest catalog and organizer dashboard"),
        (name = "auth", description = "Accounts and sessions"),
        (name = "uploads", description = "Image uploads"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting Concursuri de Dans API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    if config.oauth_bridge_secret.is_none() {
        tracing::warn!("OAUTH_BRIDGE_SECRET not set, OAuth sign-in is disabled");
    }

    let images: Option<Arc<dyn ImageHost>> = match &config.imagekit {
        Some(imagekit) => {
            let client =
                ImageKitClient::new(imagekit).context("Failed to create ImageKit client")?;
            tracing::info!("Image uploads enabled");
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("IMAGEKIT_PRIVATE_KEY not set, image uploads are disabled");
            None
        }
    };

    let state = AppState {
        contests: Arc::new(db.contests()),
        users: Arc::new(db.users()),
        sessions: SessionKeys::new(&config.session_secret, config.session_ttl),
        oauth_bridge_secret: config.oauth_bridge_secret.as_deref().map(Arc::from),
        images,
    };

    let app = routes::create_router(state).merge(
        SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    let bind_address = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
