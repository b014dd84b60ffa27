//! Core input-capture / routing / encryption pipeline for the evkvm software
//! KVM switch, plus the subscriber-side decrypt / replay engine.
//!
//! This crate is the library the two binaries (`evkvm-server`, the
//! publisher; `evkvm-client`, the subscriber) link against. It owns no
//! process lifecycle of its own: each binary installs a logger, parses its
//! CLI, loads whatever configuration it needs, and calls into
//! [`publisher::run`] or [`subscriber::run`].

pub mod config;
pub mod crypto;
pub mod event;
pub mod hotkeys;
pub mod motion;
pub mod platform;
pub mod publisher;
pub mod routing;
pub mod subscriber;
pub mod transport;

pub use config::{ConfigError, PublisherConfig};
pub use crypto::CryptoError;
pub use event::EventRecord;
pub use hotkeys::{HotkeyAction, HotkeyTable};
pub use routing::{Destination, RoutingState, Subscriber};
