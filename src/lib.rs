//! Manual test client for websocket echo servers.
//!
//! One connection, one sequential flow: connect, serialize a payload as raw text, JSON or
//! YAML, send it, and optionally wait for the echo, either once or in an interactive loop
//! that ends when the peer closes the session.
//!
//! ```no_run
//! use ws_echo::{ClientConfig, Session};
//!
//! let config = ClientConfig::hello("ws://localhost:8080", "Hello, Server!")?;
//! let stdin = std::io::stdin();
//! Session::new(config, stdin.lock(), std::io::stdout()).run()?;
//! # Ok::<(), ws_echo::Error>(())
//! ```
#![deny(
    missing_docs,
    missing_copy_implementations,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_must_use,
    unused_mut,
    unused_imports,
    unused_import_braces
)]

pub mod client;
pub mod config;
pub mod encoding;
pub mod error;
pub mod session;
pub mod source;

pub use crate::{
    client::{parse_url, Connection, Reply},
    config::ClientConfig,
    encoding::{Encoding, Payload},
    error::{Error, Result},
    session::{run_stdio, Session},
    source::Source,
};
