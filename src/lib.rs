//! Sling library
//!
//! Consent-gated single-file transfer over one TCP connection

pub mod cli;
pub mod consent;
pub mod handshake;
pub mod logger;
pub mod net;
pub mod progress;
pub mod protocol;
pub mod transfer;
pub mod verify;
