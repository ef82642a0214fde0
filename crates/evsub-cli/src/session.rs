//! A running `watch`: one hook plus the configuration the user is editing.

use std::fmt::Write as _;
use std::sync::Arc;

use evsub_core::{StreamTransport, SubscriptionConfig, SubscriptionHook};
use tracing::debug;

use crate::control::ControlCommand;
use crate::handlers::watch::NO_PAYLOAD;

/// Whether the watch loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading.
    Continue,
    /// The hook is torn down; exit.
    Quit,
}

/// Hook and current configuration, edited by control commands.
pub struct WatchSession<T: StreamTransport> {
    hook: SubscriptionHook<T>,
    config: SubscriptionConfig<T::Options>,
}

impl<T> WatchSession<T>
where
    T: StreamTransport,
    T::Options: Clone,
{
    /// Create a session. Nothing is opened until [`start`](Self::start).
    pub fn new(transport: Arc<T>, config: SubscriptionConfig<T::Options>) -> Self {
        Self {
            hook: SubscriptionHook::new(transport),
            config,
        }
    }

    /// Apply the initial configuration.
    pub fn start(&mut self) -> Option<String> {
        self.hook.subscribe(&self.config)
    }

    /// Apply one control command.
    pub fn apply(&mut self, command: &ControlCommand) -> Flow {
        match command {
            ControlCommand::Url(locator) => self.config.locator.clone_from(locator),
            ControlCommand::Event(event_type) => self.config.event_type = Some(event_type.clone()),
            ControlCommand::Enable => self.config.enabled = true,
            ControlCommand::Disable => self.config.enabled = false,
            ControlCommand::Reload => {
                // Same content, new identity.
                self.config.transport_options =
                    self.config.transport_options.as_deref().cloned().map(Arc::new);
                if self.config.transport_options.is_none() {
                    self.hook.teardown();
                }
            }
            ControlCommand::Status => return Flow::Continue,
            ControlCommand::Quit => {
                self.hook.teardown();
                return Flow::Quit;
            }
        }

        debug!(%command, "Applying control command");
        self.hook.subscribe(&self.config);
        Flow::Continue
    }

    /// One-line description of the session.
    pub fn status(&self) -> String {
        let mut line = format!(
            "{} locator={} event={} enabled={} payload={}",
            self.hook.state(),
            self.config.locator,
            self.config.event_type(),
            self.config.enabled,
            self.hook.latest().as_deref().unwrap_or(NO_PAYLOAD),
        );
        if let Some(error) = self.hook.last_error() {
            let _ = write!(line, " last_error=\"{error}\"");
        }
        line
    }

    /// Release the connection.
    pub fn teardown(&mut self) {
        self.hook.teardown();
    }

    /// The underlying hook.
    pub const fn hook(&self) -> &SubscriptionHook<T> {
        &self.hook
    }
}
