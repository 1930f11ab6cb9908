use chrono::Utc;
use sage_console::config::{next_reload, Config};
use sage_console::web::{serve_with_config, AppState};
use tokio::time::{sleep, Duration};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let collector = tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(collector)?;

    let config = Config::load()?;
    let state = AppState::new(config);

    reload_all(&state).await;

    if let Some(reload_cron) = state.config.reload_cron.clone() {
        spawn_reload_cron(reload_cron, state.clone());
    }

    serve_with_config(state).await?;
    Ok(())
}

async fn reload_all(state: &AppState) {
    let mut failed = 0;
    for collection in state.config.collections.iter() {
        if state.loader.load_into(&state.store, collection).await.is_err() {
            failed += 1;
        }
    }

    tracing::info!(
        collections = state.config.collections.len(),
        failed,
        "loaded OpenAPI documents"
    );
}

fn spawn_reload_cron(reload_cron: String, state: AppState) {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = match next_reload(&reload_cron, &now) {
                Ok(next) => next,
                Err(err) => {
                    tracing::error!("scheduled reload stopped: {}", err);
                    return;
                }
            };

            sleep((next - now).to_std().unwrap_or_default()).await;

            tracing::info!("Start reloading OpenAPI documents");
            reload_all(&state).await;

            sleep(Duration::from_secs(1)).await;
        }
    });
}
