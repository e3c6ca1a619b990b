//! Consent negotiation: one token crosses the wire before any payload byte

use crate::consent::ConsentProvider;
use crate::protocol::{classify_token, HandshakeOutcome, TOKEN_LEN, TOKEN_PROCEED, TOKEN_REFUSED};
use anyhow::{Context, Result};
use std::io::{self, Read, Write};
use std::net::SocketAddr;

/// Receiver side: consult the consent provider and tell the peer the outcome.
/// Returns `Refused` when the operator declined; the caller keeps listening.
pub fn negotiate<C: Write>(
    conn: &mut C,
    peer: SocketAddr,
    consent: &dyn ConsentProvider,
) -> Result<HandshakeOutcome> {
    if consent.allow_connection(peer)? {
        conn.write_all(TOKEN_PROCEED).context("send consent token")?;
        Ok(HandshakeOutcome::Proceed)
    } else {
        conn.write_all(TOKEN_REFUSED).context("send refusal token")?;
        Ok(HandshakeOutcome::Refused)
    }
}

/// Sender side: read the fixed-length consent token and classify it.
/// A short read or peer disconnect counts as a protocol violation, not an
/// I/O failure.
pub fn await_decision<C: Read>(conn: &mut C) -> Result<HandshakeOutcome> {
    let mut token = [0u8; TOKEN_LEN];
    match conn.read_exact(&mut token) {
        Ok(()) => Ok(classify_token(&token)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Ok(HandshakeOutcome::ProtocolViolation)
        }
        Err(e) => Err(e).context("read consent token"),
    }
}
