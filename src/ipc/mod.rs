//! IPC listener that accepts commands over a Unix socket.
//!
//! The UI shell (or a debugging script) connects to the socket and sends
//! newline-delimited JSON commands.

pub mod listener;
