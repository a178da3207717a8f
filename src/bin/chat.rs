//! Terminal chat client
//!
//! Reads one utterance per line from stdin and prints bot replies as they
//! arrive. Sends typed while a reply is pending are dropped.

use chat_relay::runtime::{ClientConfig, HttpRelayClient, SessionEvent, SessionHandle};
use chat_relay::view;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long to let a pending exchange finish after stdin closes
const DRAIN_TIMEOUT: Duration = Duration::from_secs(90);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout carries only the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_relay=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env();
    let relay = HttpRelayClient::new(&config.relay_url)?;
    let handle = SessionHandle::spawn(config.session_context(), relay);
    tracing::info!(
        session_id = %handle.session_id(),
        relay = %config.relay_url,
        "Session started"
    );

    let mut events = handle.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match (&event, view::render_event(&event)) {
                    (SessionEvent::Failure { .. }, Some(line)) => eprintln!("{line}"),
                    (_, Some(line)) => println!("{line}"),
                    (_, None) => {}
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Renderer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        handle.submit(line).await?;
    }

    // Let the last exchange land before tearing down
    if tokio::time::timeout(DRAIN_TIMEOUT, handle.settle())
        .await
        .is_err()
    {
        tracing::warn!("Exchange still pending at exit, abandoning it");
    }

    handle.shutdown().await;
    let _ = printer.await;
    Ok(())
}
