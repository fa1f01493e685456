use sprintsync::auth::password::hash_password;
use sprintsync::auth::repo::User;
use sprintsync::{app, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "sprintsync=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    // Bootstrap admin account when configured
    if let (Some(username), Some(password)) = (
        app_state.config.admin_username.as_deref(),
        app_state.config.admin_password.as_deref(),
    ) {
        let hash = hash_password(password)?;
        User::ensure_admin(&app_state.db, username, &hash).await?;
    }

    let app = app::build_app(app_state);
    app::serve(app).await
}
