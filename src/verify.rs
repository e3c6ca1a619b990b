//! Completion check: byte counts must agree, then a short acknowledgment

use crate::protocol::{ACK_LEN, TOKEN_ACK};
use anyhow::{Context, Result};
use std::io::{Read, Write};

/// Receiver side: tell the peer the stream was consumed.
pub fn send_ack<C: Write>(conn: &mut C) -> Result<()> {
    conn.write_all(TOKEN_ACK).context("send acknowledgment")?;
    conn.flush().context("send acknowledgment")?;
    Ok(())
}

/// Sender side: read the receiver's acknowledgment. A short read, an I/O
/// failure, or any token other than `ACK` all mean the same thing to the
/// caller, so this collapses to a bool.
pub fn read_ack<C: Read>(conn: &mut C) -> bool {
    let mut buf = [0u8; ACK_LEN];
    match conn.read_exact(&mut buf) {
        Ok(()) => buf == *TOKEN_ACK,
        Err(_) => false,
    }
}
