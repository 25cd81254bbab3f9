//! Terminal host for the page assistant widget
//!
//! Mounts the widget for a page URL, delivers stdin lines as widget events,
//! and prints new chat bubbles as they arrive.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use page_assistant::config::{self, WidgetConfig};
use page_assistant::host::{self, HostCommand};
use page_assistant::transport::HttpTransport;
use page_assistant::widget::{WidgetEvent, WidgetShell};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "page_assistant=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = WidgetConfig::from_env()?;
    let transport = Arc::new(HttpTransport::new(config.backend.url.clone()));

    let arg = std::env::args().nth(1);
    if arg.as_deref() == Some("status") {
        let connected = transport.check_status().await;
        println!("{}", if connected { "Connected" } else { "Not Connected" });
        return Ok(());
    }

    let page_url = arg.or_else(|| config.page_url.clone()).ok_or_else(|| {
        anyhow::anyhow!(
            "usage: page-assistant <page-url> | status (or set {})",
            config::PAGE_URL_VAR
        )
    })?;

    let (completions_tx, mut completions) = mpsc::unbounded_channel();
    let mut shell = WidgetShell::initialize(&config, &page_url, transport, completions_tx);

    tracing::info!("🔥 Chat widget ready, backend at {}", config.backend.url);
    println!("{}", host::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printed = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match host::parse_line(&line) {
                    HostCommand::Quit => break,
                    HostCommand::PrintHtml => println!("{}", shell.html()),
                    HostCommand::Invalid(msg) => eprintln!("{msg}"),
                    HostCommand::Events(events) => {
                        for event in events {
                            shell.handle(event);
                        }
                    }
                }
            }
            Some(completion) = completions.recv() => {
                shell.handle(WidgetEvent::Completed(completion));
            }
        }

        let messages = shell.history().messages();
        for message in &messages[printed..] {
            println!("[{}] {}", message.role.as_str(), message.content);
        }
        printed = messages.len();
    }

    Ok(())
}
