//! Outbound notifications, decoupled from request handling.
//!
//! Handlers enqueue onto a bounded channel and move on; a worker task owns
//! the actual delivery. A slow or failing send can therefore never affect
//! the latency or status of the request that triggered it, and a full
//! queue drops the notification instead of applying backpressure.

use tokio::sync::{broadcast, mpsc};

use crate::config::EmailConfig;

/// A queued outbound notification.
#[derive(Debug, Clone)]
pub enum Notification {
    Welcome { email: String, name: String },
}

/// Handle used by request handlers to enqueue notifications.
#[derive(Clone)]
pub struct Mailer {
    tx: mpsc::Sender<Notification>,
}

impl Mailer {
    /// Queue a welcome email, fire-and-forget.
    pub fn send_welcome(&self, email: &str, name: &str) {
        let notification = Notification::Welcome {
            email: email.to_string(),
            name: name.to_string(),
        };
        if let Err(e) = self.tx.try_send(notification) {
            tracing::warn!(error = %e, "Notification queue full, dropping welcome email");
        }
    }
}

/// Spawn the delivery worker and return the enqueue handle.
///
/// The worker drains the queue until shutdown is signalled.
pub fn spawn_mailer(config: &EmailConfig, mut shutdown: broadcast::Receiver<()>) -> Mailer {
    let (tx, mut rx) = mpsc::channel::<Notification>(config.queue_capacity);
    let from_address = config.from_address.clone();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                maybe = rx.recv() => {
                    match maybe {
                        Some(notification) => deliver(&from_address, notification).await,
                        None => break,
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Mail worker stopping");
                    break;
                }
            }
        }
    });

    Mailer { tx }
}

async fn deliver(from_address: &str, notification: Notification) {
    match notification {
        Notification::Welcome { email, name } => {
            // Delivery is a log line here; a real transport would slot in
            // without the handlers noticing.
            tracing::info!(
                from = from_address,
                to = %email,
                user = %name,
                "Welcome email sent"
            );
        }
    }
}
