pub mod adapters;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod store;
pub mod utils;

use std::fs;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

pub use adapters::{Backend, HttpBackend};
pub use error::{Error, Result};
pub use store::{AppState, Store, SyncOptions};

use models::{ToastKind, UserRole};
use storage::LocalStorage;
use utils::format::{format_currency, format_date, time_remaining};

/// Headless dashboard session.
///
/// Restores the previous session (or signs in with `FLOWSPACE_EMAIL` and
/// `FLOWSPACE_PASSWORD`), loads the dashboard, then keeps the background
/// watchers running and logging toasts until Ctrl-C.
pub async fn run() -> Result<()> {
    let settings = storage::load_settings()?;
    let data_dir = settings
        .data_dir
        .clone()
        .ok_or_else(|| Error::Config("No data directory configured".to_string()))?;
    fs::create_dir_all(&data_dir).map_err(|source| Error::File {
        path: data_dir.clone(),
        source,
    })?;

    let _log_guard = utils::logging::init_logging(&data_dir.join("logs"));
    info!("Flowspace client starting against {}", settings.api_base_url);

    let local = Arc::new(LocalStorage::open(&data_dir)?);
    let backend = HttpBackend::new(
        &settings.api_base_url,
        settings.request_timeout(),
        Some(local.clone()),
    )?;
    let store = Store::new(
        Arc::new(backend),
        SyncOptions::from(&settings),
        Some(local),
    );

    let mut toasts = store.toaster().subscribe();
    let toast_task = tokio::spawn(async move {
        loop {
            match toasts.recv().await {
                Ok(toast) => match toast.kind {
                    ToastKind::Error => eprintln!("[error] {}", toast.message),
                    _ => println!("[{:?}] {}", toast.kind, toast.message),
                },
                Err(RecvError::Lagged(n)) => warn!("Dropped {} toasts", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // A restored snapshot carries its own theme and takes precedence
    store.set_theme(settings.theme).await;
    let user = match store.restore_session().await {
        Ok(Some(user)) => user,
        Ok(None) => sign_in_from_env(&store).await?,
        Err(e) => {
            warn!("Falling back to a fresh sign-in: {}", e);
            sign_in_from_env(&store).await?
        }
    };
    info!("Signed in as {} ({})", user.name, user.role.label());

    store.load_workspace().await.ok();
    store.load_projects().await.ok();
    if user.role == UserRole::Admin {
        store.load_users().await.ok();
    }
    log_dashboard(&store).await;

    let watchers = store.start_watchers().await;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
    }
    info!("Shutting down");

    watchers.stop();
    store.persist().await;
    toast_task.abort();
    Ok(())
}

async fn sign_in_from_env(store: &Store) -> Result<models::User> {
    let email = std::env::var("FLOWSPACE_EMAIL").ok();
    let password = std::env::var("FLOWSPACE_PASSWORD").ok();
    match (email, password) {
        (Some(email), Some(password)) => store.login(&email, &password).await,
        _ => Err(Error::Config(
            "No saved session; set FLOWSPACE_EMAIL and FLOWSPACE_PASSWORD".to_string(),
        )),
    }
}

async fn log_dashboard(store: &Store) {
    let summary = store.dashboard_summary().await;
    info!(
        "{} projects: {} pending, {} active, {} done",
        summary.total, summary.pending, summary.active, summary.done
    );

    let finance = store.finance_summary().await;
    info!(
        "Paid {}, awaiting clearance {}",
        format_currency(finance.total_paid),
        format_currency(finance.pending_clearance)
    );

    let now = chrono::Utc::now();
    store
        .read(|state| {
            for project in crate::store::selectors::visible_projects(state) {
                info!(
                    "  [{}] {} due {} ({}) {}",
                    project.status.label(),
                    project.title,
                    format_date(&project.deadline),
                    time_remaining(&project.deadline, &now),
                    format_currency(project.amount)
                );
            }
        })
        .await;
}
