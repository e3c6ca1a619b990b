//! Framed transfer engine: a size preamble, then a chunked byte stream
//!
//! Both loops move `CHUNK_SIZE` bytes at a time and report running totals to
//! the progress sink after every chunk. There is no retry anywhere: a failed
//! or short transfer is terminal for the connection.

use crate::progress::Progress;
use crate::protocol::{decode_size, encode_size, CHUNK_SIZE, PREAMBLE_LEN};
use anyhow::{Context, Result};
use std::io::{self, Read, Write};

/// Stream `size` bytes from `source` into `conn`, preamble first.
/// Returns the byte count actually read from the source.
pub fn send_stream<R, W>(
    conn: &mut W,
    source: &mut R,
    size: u64,
    progress: &dyn Progress,
) -> Result<u64>
where
    R: Read,
    W: Write,
{
    conn.write_all(&encode_size(size))
        .context("lost connection to remote machine")?;

    let mut buf = [0u8; CHUNK_SIZE];
    let mut sent: u64 = 0;
    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("read source file"),
        };
        conn.write_all(&buf[..n])
            .context("lost connection to remote machine")?;
        sent += n as u64;
        progress.update(sent, size);
    }
    progress.finish();
    Ok(sent)
}

/// Read the size preamble, then drain the stream into `dest` until EOF.
/// Returns `(bytes_received, declared_size)`; the caller decides whether a
/// shortfall is an error.
pub fn receive_stream<R, W>(
    conn: &mut R,
    dest: &mut W,
    progress: &dyn Progress,
) -> Result<(u64, u64)>
where
    R: Read,
    W: Write,
{
    let mut preamble = [0u8; PREAMBLE_LEN];
    conn.read_exact(&mut preamble)
        .context("lost connection to remote machine")?;
    let declared = decode_size(preamble);

    let mut buf = [0u8; CHUNK_SIZE];
    let mut received: u64 = 0;
    loop {
        let n = match conn.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("lost connection to remote machine"),
        };
        dest.write_all(&buf[..n]).context("failed to write file")?;
        received += n as u64;
        progress.update(received, declared);
    }
    dest.flush().context("failed to write file")?;
    progress.finish();
    Ok((received, declared))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgress;
    use std::io::Cursor;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<(u64, u64)>>);

    impl Recorder {
        fn new() -> Self {
            Recorder(Mutex::new(Vec::new()))
        }
    }

    impl Progress for Recorder {
        fn update(&self, bytes: u64, total: u64) {
            self.0.lock().unwrap().push((bytes, total));
        }
        fn finish(&self) {}
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_send_writes_preamble_then_payload() {
        for len in [0usize, 1, 1024, 1025, 4096] {
            let data = pattern(len);
            let mut source = Cursor::new(data.clone());
            let mut wire = Vec::new();
            let sent =
                send_stream(&mut wire, &mut source, len as u64, &NullProgress).unwrap();
            assert_eq!(sent, len as u64);
            assert_eq!(&wire[..PREAMBLE_LEN], &encode_size(len as u64));
            assert_eq!(&wire[PREAMBLE_LEN..], &data[..]);
        }
    }

    #[test]
    fn test_receive_chunk_boundaries_are_exact() {
        // Exact multiple of the chunk size, one over, and empty
        for len in [0usize, 1024, 1025] {
            let data = pattern(len);
            let mut wire = Vec::from(encode_size(len as u64));
            wire.extend_from_slice(&data);
            let mut conn = Cursor::new(wire);
            let mut dest = Vec::new();
            let (received, declared) =
                receive_stream(&mut conn, &mut dest, &NullProgress).unwrap();
            assert_eq!(received, len as u64);
            assert_eq!(declared, len as u64);
            assert_eq!(dest, data);
        }
    }

    #[test]
    fn test_receive_reports_shortfall_counts() {
        // Peer declared 4096 bytes but the stream ends after 1000
        let mut wire = Vec::from(encode_size(4096));
        wire.extend_from_slice(&pattern(1000));
        let mut conn = Cursor::new(wire);
        let mut dest = Vec::new();
        let (received, declared) =
            receive_stream(&mut conn, &mut dest, &NullProgress).unwrap();
        assert_eq!(received, 1000);
        assert_eq!(declared, 4096);
    }

    #[test]
    fn test_receive_truncated_preamble_is_an_error() {
        let mut conn = Cursor::new(vec![0u8; 3]);
        let mut dest = Vec::new();
        assert!(receive_stream(&mut conn, &mut dest, &NullProgress).is_err());
    }

    #[test]
    fn test_progress_is_monotonic_and_bounded() {
        let data = pattern(5000);
        let mut source = Cursor::new(data);
        let mut wire = Vec::new();
        let recorder = Recorder::new();
        send_stream(&mut wire, &mut source, 5000, &recorder).unwrap();

        let seen = recorder.0.lock().unwrap();
        assert!(!seen.is_empty());
        let mut last = 0u64;
        for &(bytes, total) in seen.iter() {
            assert_eq!(total, 5000);
            assert!(bytes >= last);
            assert!(bytes <= total);
            last = bytes;
        }
        assert_eq!(last, 5000);
    }
}
