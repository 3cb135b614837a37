//! Connection supervision and the reconnect loop.
//!
//! ```text
//!   start ──▶ Connecting ──connect──▶ Connected
//!                 │                      │
//!            retry fires        disconnect(server) ──▶ Retrying ──retry fires──▶ Retrying
//!                 ▼                      │                  │
//!              Retrying       disconnect(other) ──▶ Idle    └──connect──▶ Connected
//! ```
//!
//! Only a server-initiated disconnect arms the retry timer. Every other
//! disconnect is left to the channel library's own recovery. When
//! `retry.watchStartup` is on, [`Supervisor::start`] also arms the timer so a
//! first connection that never completes is retried.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uib_core::{LogKind, PropertyKey};

use crate::backoff::Backoff;
use crate::context::Context;
use crate::router;
use crate::timer::{self, PendingRetry, RetryTimer};
use crate::transport::{DisconnectReason, EventReceiver, TransportEvent};

/// Where the supervisor is in the connection lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Not started, or disconnected and waiting on the channel library.
    Idle,
    /// Opened, waiting for the first connect.
    Connecting,
    /// Connected.
    Connected,
    /// Running the manual reconnect loop.
    Retrying,
}

impl ConnectionState {
    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Retrying => "retrying",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why [`Supervisor::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    /// The cancellation token fired.
    Cancelled,
    /// Every [`EventSender`](crate::EventSender) was dropped.
    EventsClosed,
}

/// Owns the retry timer and reacts to transport events.
///
/// Either hand it to [`run`](Self::run), or call [`start`](Self::start),
/// [`handle_event`](Self::handle_event) and [`fire_if_due`](Self::fire_if_due)
/// from your own loop.
pub struct Supervisor {
    ctx: Arc<Context>,
    backoff: Backoff,
    timer: RetryTimer,
    attempts: u32,
}

impl Supervisor {
    pub(crate) fn new(ctx: Arc<Context>) -> Self {
        let backoff = Backoff::from_settings(&ctx.settings.retry);
        Self {
            ctx,
            backoff,
            timer: RetryTimer::new(),
            attempts: 0,
        }
    }

    /// Open the transport and, if configured, arm the startup watchdog.
    pub fn start(&mut self) {
        self.ctx.set_state(ConnectionState::Connecting);
        self.open();
        if self.ctx.settings.retry.watch_startup {
            self.schedule_reconnect(self.backoff.initial());
        }
    }

    /// React to one transport event.
    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connect => self.on_connect(),
            TransportEvent::Disconnect(reason) => self.on_disconnect(&reason),
            TransportEvent::Message { channel, payload } => {
                router::route_inbound(&self.ctx, &channel, payload);
            }
        }
    }

    /// Arm the retry timer for `delay`, cancelling any pending attempt.
    pub fn schedule_reconnect(&mut self, delay: Duration) {
        let (armed, replaced) = self.timer.arm(delay);
        self.ctx
            .store
            .write_quiet(PropertyKey::TimerId, json!(armed.id));
        if let Some(old) = replaced {
            self.ctx.log.log(
                LogKind::Log,
                format!("reconnect timer {} replaced by {}", old.id, armed.id),
            );
        }
        self.ctx.log.log(
            LogKind::Log,
            format!(
                "reconnect scheduled - delay: {}ms, factor: {}, attempt: {}",
                delay.as_millis(),
                self.backoff.factor(),
                self.attempts + 1
            ),
        );
    }

    /// Run the pending attempt if its deadline has passed. Returns whether
    /// an attempt ran.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.timer.take_due(now) {
            Some(due) => {
                self.on_retry_fired(due);
                true
            }
            None => false,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.ctx.state()
    }

    /// The pending reconnect attempt, if any.
    pub fn pending_retry(&self) -> Option<PendingRetry> {
        self.timer.pending()
    }

    /// Reconnect attempts since the last successful connect.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Drive the supervisor until `cancel` fires or the event channel
    /// closes. Calls [`start`](Self::start) first.
    ///
    /// Events are handled before a retry deadline that is ready at the same
    /// moment, so a connect always wins against a due retry.
    pub async fn run(mut self, mut events: EventReceiver, cancel: CancellationToken) -> SupervisorExit {
        self.start();
        let exit = loop {
            let deadline = self.timer.deadline();
            tokio::select! {
                biased;
                () = cancel.cancelled() => break SupervisorExit::Cancelled,
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break SupervisorExit::EventsClosed,
                },
                () = timer::wait_until(deadline) => {
                    let _ = self.fire_if_due(Instant::now());
                }
            }
        };

        if self.timer.cancel().is_some() {
            self.ctx.store.write_quiet(PropertyKey::TimerId, Value::Null);
        }
        self.ctx
            .log
            .log(LogKind::Log, format!("supervisor stopped: {exit:?}"));
        exit
    }

    fn open(&self) {
        let options = self.ctx.connect_options();
        self.ctx.log.log(
            LogKind::Log,
            format!("connecting - namespace: {}, path: {}", options.namespace, options.path),
        );
        if let Err(err) = self.ctx.transport.open(&options) {
            self.ctx.log.log(LogKind::Error, format!("open failed: {err}"));
        }
    }

    fn on_connect(&mut self) {
        self.ctx.log.log(
            LogKind::Log,
            format!("SOCKET CONNECTED - namespace: {}", self.ctx.namespace),
        );
        self.ctx.store.set_internal(PropertyKey::IoConnected, json!(true));
        if let Some(cancelled) = self.timer.cancel() {
            self.ctx.log.log(
                LogKind::Log,
                format!("reconnect timer {} cancelled", cancelled.id),
            );
        }
        self.ctx.store.write_quiet(PropertyKey::TimerId, Value::Null);
        self.attempts = 0;
        self.ctx.set_state(ConnectionState::Connected);
    }

    fn on_disconnect(&mut self, reason: &DisconnectReason) {
        self.ctx.log.log(
            LogKind::Log,
            format!(
                "SOCKET DISCONNECTED - namespace: {}, reason: {reason}",
                self.ctx.namespace
            ),
        );
        self.ctx.store.set_internal(PropertyKey::IoConnected, json!(false));
        if reason.is_server_initiated() {
            self.ctx.set_state(ConnectionState::Retrying);
            self.schedule_reconnect(self.backoff.initial());
        } else if self.timer.is_armed() {
            // A pending attempt stays armed.
            self.ctx.set_state(ConnectionState::Retrying);
        } else {
            self.ctx.set_state(ConnectionState::Idle);
        }
    }

    fn on_retry_fired(&mut self, due: PendingRetry) {
        self.attempts = self.attempts.saturating_add(1);
        self.ctx.log.log(
            LogKind::Log,
            format!(
                "reconnect attempt {} - delay: {}ms",
                self.attempts,
                due.delay.as_millis()
            ),
        );
        self.ctx.store.write_quiet(PropertyKey::TimerId, Value::Null);
        self.ctx.transport.close();
        self.open();
        self.ctx.set_state(ConnectionState::Retrying);
        self.schedule_reconnect(self.backoff.next_after(due.delay));
    }
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("state", &self.state())
            .field("backoff", &self.backoff)
            .field("timer", &self.timer)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}
