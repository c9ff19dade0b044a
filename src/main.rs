use std::{env, sync::Arc};

use taskboard::{
    ApiClient, ClientError, Identity, NotificationFeed, Prefs, PushChannel, Session, Settings,
    StaticIdentity,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const TOKEN_ENV: &str = "TASKBOARD_TOKEN";
const UID_ENV: &str = "TASKBOARD_UID";

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskboard=info")),
        )
        .init();

    // ── Settings ───────────────────────────────────────────────
    let settings = Settings::load().unwrap_or_else(|e| {
        warn!(error = %e, "using default settings");
        Settings::default()
    });
    info!(environment = ?settings.environment, "settings loaded");

    // ── Session ────────────────────────────────────────────────
    let session = Session::new();
    let api = ApiClient::from_settings(&settings, session.clone())?;
    info!(base = %api.base(), "api client ready");

    match env::var(TOKEN_ENV) {
        Ok(token) => {
            let identity = Identity {
                uid: env::var(UID_ENV).unwrap_or_else(|_| "cli".to_string()),
                display_name: None,
                email: None,
            };
            session.establish(identity, Arc::new(StaticIdentity::new(token)));
            match api.users().current().await {
                Ok(user) => {
                    info!(name = %user.name, email = %user.email, "signed in");
                    session.set_user(Some(user));
                }
                Err(e) => warn!(error = %e, "could not load profile"),
            }
        }
        Err(_) => {
            warn!("{TOKEN_ENV} not set, running signed out");
            session.resolve_signed_out();
        }
    }

    // ── Preferences ────────────────────────────────────────────
    match Prefs::open(&settings.prefs_path).and_then(|p| p.sidebar_open()) {
        Ok(open) => info!(sidebar_open = open, "preferences loaded"),
        Err(e) => warn!(error = %e, "preferences unavailable"),
    }

    // ── Notifications ──────────────────────────────────────────
    let feed = NotificationFeed::new();
    let channel = PushChannel::for_api(&api, feed.clone(), settings.reconnect_delay())?
        .connect_timeout(settings.request_timeout())
        .spawn();

    let mut updates = feed.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            match state.items.first() {
                Some(newest) => info!(unread = state.unread, newest = %newest.content, "notifications"),
                None => info!(unread = state.unread, "notifications"),
            }
        }
    });

    // ── Run until Ctrl-C ───────────────────────────────────────
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c");
    }
    info!("shutting down");
    channel.shutdown().await;
    Ok(())
}
