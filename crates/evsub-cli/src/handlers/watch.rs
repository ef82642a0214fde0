//! `evsub watch`: print the latest payload until told to stop.

use std::future;
use std::sync::Arc;

use evsub_core::SubscriptionConfig;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, warn};

use crate::bootstrap::{CliConfig, transport_options};
use crate::commands::WatchArgs;
use crate::control::ControlCommand;
use crate::error::CliError;
use crate::session::{Flow, WatchSession};

/// Placeholder printed when the payload is reset.
pub const NO_PAYLOAD: &str = "<none>";

/// Execute the watch command.
pub async fn execute(config: &CliConfig, args: WatchArgs) -> Result<(), CliError> {
    let transport = config.build_transport()?;
    let options = transport_options(&args).map(Arc::new);
    let subscription = SubscriptionConfig::new(args.locator)
        .with_event_type(args.event)
        .with_optional_transport_options(options)
        .with_enabled(!args.disabled);

    let mut session = WatchSession::new(transport, subscription);
    let mut payloads = session.hook().watch();
    let mut errors = session.hook().errors();

    session.start();
    if !args.interactive {
        if let Some(error) = session.hook().last_error() {
            return Err(error.into());
        }
    }
    print_payload(payloads.borrow_and_update().as_deref());

    let mut lines = args
        .interactive
        .then(|| BufReader::new(tokio::io::stdin()).lines());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = payloads.changed() => {
                if changed.is_err() {
                    break;
                }
                print_payload(payloads.borrow_and_update().as_deref());
            }
            changed = errors.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(error) = errors.borrow_and_update().as_ref() {
                    eprintln!("error: {error}");
                }
            }
            line = next_line(&mut lines) => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ControlCommand>() {
                    Ok(ControlCommand::Status) => println!("{}", session.status()),
                    Ok(command) => {
                        if session.apply(&command) == Flow::Quit {
                            return Ok(());
                        }
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                break;
            }
        }
    }

    session.teardown();
    Ok(())
}

/// Next stdin line, or never when not interactive.
async fn next_line(
    lines: &mut Option<Lines<BufReader<Stdin>>>,
) -> std::io::Result<Option<String>> {
    match lines {
        Some(lines) => lines.next_line().await,
        None => future::pending().await,
    }
}

fn print_payload(payload: Option<&str>) {
    println!("{}", payload.unwrap_or(NO_PAYLOAD));
}
