//! # uib-runtime
//!
//! Client runtime for a uibuilder page: keeps one bidirectional channel to the
//! server, mirrors its state and traffic into observable named properties, and
//! supervises reconnection when the server drops the session.
//!
//! # Architecture
//!
//! ```text
//!   Transport ──events──▶ Supervisor ──▶ router ──▶ PropertyStore ──▶ Listeners
//!       ▲                    │ RetryTimer                 ▲
//!       └──── emit ──────────┴────────── UiBuilder ───────┘
//! ```
//!
//! | Module       | Responsibility                                           |
//! |--------------|----------------------------------------------------------|
//! | `listeners`  | Ordered change callbacks per property, fault-isolated    |
//! | `store`      | Named property values, protected-name guard, counters    |
//! | `backoff`    | Geometric reconnect delays with optional cap             |
//! | `timer`      | The single pending reconnect attempt                     |
//! | `supervisor` | Connection state machine and event loop                  |
//! | `router`     | Inbound normalization, script/style injection, `send`    |
//! | `client`     | [`UiBuilder`], the public facade                         |
//! | `transport`  | [`Transport`] trait and the events it produces           |
//! | `document`   | [`Document`] trait for injected script/style blocks      |
//! | `testing`    | Recording doubles for both traits                        |
//!
//! # Usage
//!
//! ```ignore
//! let (events_tx, events_rx) = uib_runtime::event_channel();
//! let transport = Arc::new(MyTransport::new(events_tx));
//! let (ui, supervisor) = UiBuilder::new(
//!     ClientSettings::default(),
//!     "/uibuilder/app/",
//!     transport,
//!     Arc::new(NoopDocument),
//! );
//! let cancel = CancellationToken::new();
//! tokio::spawn(supervisor.run(events_rx, cancel.clone()));
//!
//! ui.on_change("msg", |msg| println!("new msg: {msg}"));
//! ui.send(json!({"payload": "hello"}));
//! ```

#![deny(unsafe_code)]

pub mod backoff;
pub mod client;
mod context;
pub mod document;
pub mod errors;
pub mod listeners;
pub mod namespace;
mod router;
pub mod store;
pub mod supervisor;
pub mod testing;
pub mod timer;
pub mod transport;

pub use backoff::Backoff;
pub use client::{Introspection, UiBuilder};
pub use document::{Document, NoopDocument};
pub use errors::TransportError;
pub use listeners::Listeners;
pub use namespace::derive_namespace;
pub use store::PropertyStore;
pub use supervisor::{ConnectionState, Supervisor, SupervisorExit};
pub use timer::{PendingRetry, RetryTimer};
pub use transport::{
    ConnectOptions, DisconnectReason, EventReceiver, EventSender, Transport, TransportEvent,
    event_channel,
};
