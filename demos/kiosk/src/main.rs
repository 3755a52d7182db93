//! Kiosk demo: a terminal stand-in for an idle-logout screen.
//!
//! Runs a coordinator with a 2-minute idle timeout and a 1-minute
//! warning lead. Press Enter to simulate user interaction; leave it
//! alone to watch the warning and expiry fire. Session state persists
//! to a file in the temp directory, so restarting the demo inside the
//! idle window resumes the running session.
//!
//! ```text
//! RUST_LOG=debug cargo run -p kiosk
//! ```

use std::time::Duration;

use chrono::Utc;
use idlewatch::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Session authority stub: always agrees with the configured timeout.
///
/// A real deployment points this at the backend's session endpoint.
struct LocalAuthority {
    idle_timeout: Duration,
}

impl SessionAuthority for LocalAuthority {
    async fn check_session(&self) -> Result<AuthorityResponse, SyncError> {
        Ok(AuthorityResponse {
            success: true,
            session: Some(RemoteSessionView {
                expires_at: Utc::now()
                    + chrono::Duration::from_std(self.idle_timeout)
                        .unwrap_or(chrono::Duration::zero()),
            }),
            message: None,
        })
    }
}

/// Prints lifecycle signals to the console.
struct ConsoleEvents;

impl SessionEvents for ConsoleEvents {
    fn on_warning(&self, minutes_remaining: u32) {
        println!(">>> idle warning: about {minutes_remaining} minute(s) until sign-out");
    }

    fn on_expired(&self) {
        println!(">>> session expired — signing out");
    }

    fn on_renewed(&self) {
        println!(">>> session extended");
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), IdlewatchError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = SessionConfig::new(2, 1);

    let handle = CoordinatorBuilder::new()
        .sync_config(SyncConfig {
            heartbeat_interval: Duration::from_secs(30),
            ..Default::default()
        })
        .spawn(
            JsonFileStorage::new(std::env::temp_dir()),
            LocalAuthority {
                idle_timeout: config.idle_timeout(),
            },
            ConsoleEvents,
        );

    // A persisted, unexpired session resumes; otherwise start fresh.
    if handle.is_active().await? {
        let remaining = handle.time_remaining().await?.unwrap_or_default();
        println!(
            "resumed persisted session ({}s of idle budget left)",
            remaining.as_secs()
        );
    } else {
        handle.begin(config).await?;
        println!(
            "session started: {}-minute idle timeout, warning {} minute(s) early",
            config.idle_timeout_minutes, config.warning_lead_minutes
        );
    }

    println!("press Enter to simulate activity, Ctrl-C to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(_)) => {
                    handle.record_activity(ActivityKind::KeyPress);
                    if let Some(remaining) = handle.time_remaining().await? {
                        println!("activity ({}s of idle budget left)", remaining.as_secs());
                    } else {
                        println!("no active session — restart the demo to begin again");
                    }
                }
                _ => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!("\nshutting down (session left persisted)");
                handle.shutdown().await?;
                break;
            }
        }
    }

    Ok(())
}
