//! # Session Peer Library
//!
//! The non-authoritative side of a multiplayer session. A peer joins a host,
//! takes the id the host assigns and mirrors the host's client roster.
//!
//! ## Lifecycle
//!
//! 1. The local client starts under the unknown id and announces itself
//!    with `Join`, retried until the host answers.
//! 2. `Accepted` renumbers the local client to the assigned id.
//! 3. Every `RosterUpdate` is reconciled into the local roster: missing
//!    clients are removed, known ones keep their runtime state, new ones
//!    are added.
//! 4. `ClientRemoved` drops a client at the point the host applied the
//!    removal. If the removed client is us, the session ends.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Unit slots per client, released together with their owner.
//!
//! ### Session Module (`session`)
//! Packet handling against the local roster, with no I/O.
//!
//! ### Network Module (`network`)
//! UDP socket, heartbeats and the receive loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use peer::network::Peer;
//! use roster::LocalConfig;
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut peer = Peer::new(
//!         "127.0.0.1:8080",
//!         LocalConfig::with_names("Ann", "annie"),
//!         Duration::from_secs(1),
//!         0,
//!     )
//!     .await?;
//!
//!     peer.run(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```

pub mod game;
pub mod network;
pub mod session;
