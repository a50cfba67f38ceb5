//! # Session Host Library
//!
//! The authoritative side of a multiplayer session. The host keeps the
//! canonical client roster, admits and removes peers, and broadcasts the
//! roster to everyone whenever it changes.
//!
//! ## Core Responsibilities
//!
//! ### Admission
//! Peers join with a `Join` packet carrying their identity. The host assigns
//! an id (or honours the requested one if it is free), binds the peer's
//! address to a network endpoint and answers with `Accepted` or `Rejected`.
//!
//! ### Synchronized Removal
//! Leaving, idle and kicked peers are never dropped on the spot. The host
//! queues a `ClientRemove` control command, applies it at the start of the
//! next tick and announces it with `ClientRemoved`, so every peer removes
//! the client at the same logical point.
//!
//! ### Roster Broadcasting
//! After any change the full roster snapshot is sent as `RosterUpdate`.
//! Peers reconcile their own roster against it.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Host-side units, released when their owner leaves.
//!
//! ### Session Module (`session`)
//! Packet handling and the per-tick roster work, with no I/O.
//!
//! ### Network Module (`network`)
//! UDP socket, receiver and sender tasks and the tick loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use host::network::Server;
//! use roster::LocalConfig;
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         Duration::from_millis(50), // 20Hz
//!         16,
//!         Duration::from_secs(5),
//!         LocalConfig::with_names("Host", ""),
//!     )
//!     .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod network;
pub mod session;
