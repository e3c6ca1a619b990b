//! Connection setup and the per-role transfer drivers
//!
//! The receiver binds and accepts one connection at a time: accept ->
//! handshake -> (on consent) transfer -> verify. A refused connection closes
//! and the accept loop continues; a completed or fatally failed transfer ends
//! the run. The sender dials, awaits the consent token, then streams.

use crate::cli::{RecvOpts, SendOpts};
use crate::consent::ConsentProvider;
use crate::handshake;
use crate::logger::{Logger, TransferRecord, TransferStatus};
use crate::progress::Progress;
use crate::protocol::HandshakeOutcome;
use crate::transfer;
use crate::verify;
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::net::{Shutdown, TcpListener, TcpStream};

// Socket tuning: disable Nagle, enable keepalive for long blocking transfers
#[allow(unused_variables)]
fn tune_socket(stream: &TcpStream) {
    let _ = stream.set_nodelay(true);
    #[cfg(unix)]
    {
        use std::os::fd::AsRawFd;
        let fd = stream.as_raw_fd();
        unsafe {
            let keepalive: libc::c_int = 1;
            let _ = libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_KEEPALIVE,
                &keepalive as *const _ as *const libc::c_void,
                std::mem::size_of_val(&keepalive) as libc::socklen_t,
            );
        }
    }
}

/// Receiver entry: bind the configured port and run the accept loop.
pub fn serve(
    opts: &RecvOpts,
    consent: &dyn ConsentProvider,
    progress: &dyn Progress,
    logger: &dyn Logger,
) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", opts.port))
        .with_context(|| format!("failed to bind port {}", opts.port))?;
    serve_on(listener, opts, consent, progress, logger)
}

/// Accept loop on an already-bound listener. Split from `serve` so tests can
/// bind an ephemeral port first.
pub fn serve_on(
    listener: TcpListener,
    opts: &RecvOpts,
    consent: &dyn ConsentProvider,
    progress: &dyn Progress,
    logger: &dyn Logger,
) -> Result<()> {
    let path = opts.file.as_path();

    // Overwrite gate before the destination is ever opened for writing
    if path.exists() && !consent.allow_overwrite(path)? {
        return Ok(());
    }
    let mut dest = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    if opts.verbose {
        let local = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        eprintln!("slingd listening on {}", local);
    }

    loop {
        let (mut stream, peer) = match listener.accept() {
            Ok(conn) => conn,
            Err(e) => {
                eprintln!("accept error: {}", e);
                continue;
            }
        };
        tune_socket(&stream);
        if opts.verbose {
            eprintln!("connection from {}", peer);
        }

        if handshake::negotiate(&mut stream, peer, consent)? == HandshakeOutcome::Refused {
            if opts.verbose {
                eprintln!("refused connection from {}", peer);
            }
            logger.record(&TransferRecord::new(
                "receive",
                peer.to_string(),
                path,
                0,
                0,
                TransferStatus::Refused,
            ));
            continue;
        }

        let (received, declared) =
            match transfer::receive_stream(&mut stream, &mut dest, progress) {
                Ok(counts) => counts,
                Err(e) => {
                    logger.record(&TransferRecord::new(
                        "receive",
                        peer.to_string(),
                        path,
                        0,
                        0,
                        TransferStatus::Failed,
                    ));
                    return Err(e);
                }
            };

        // A count mismatch still acknowledges: the peer learns the stream was
        // consumed, then this side reports the shortfall
        let acked = verify::send_ack(&mut stream);

        if received != declared {
            logger.record(&TransferRecord::new(
                "receive",
                peer.to_string(),
                path,
                received,
                declared,
                TransferStatus::Failed,
            ));
            bail!(
                "lost connection to remote machine ({} of {} bytes received)",
                received,
                declared
            );
        }
        acked?;

        logger.record(&TransferRecord::new(
            "receive",
            peer.to_string(),
            path,
            received,
            declared,
            TransferStatus::Completed,
        ));
        if opts.verbose {
            eprintln!("received {} bytes into {}", received, path.display());
        }
        return Ok(());
    }
}

/// Sender entry: dial the receiver, await consent, stream the file, then
/// check the acknowledgment.
pub fn push(opts: &SendOpts, progress: &dyn Progress, logger: &dyn Logger) -> Result<()> {
    let path = opts.file.as_path();
    let mut source = File::open(path)
        .with_context(|| format!("failed to read {} or file not found", path.display()))?;
    let size = source.metadata().context("stat source file")?.len();

    let mut stream = TcpStream::connect((opts.destination.as_str(), opts.port))
        .with_context(|| {
            format!(
                "failed to establish connection to {}:{}",
                opts.destination, opts.port
            )
        })?;
    tune_socket(&stream);
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    if opts.verbose {
        eprintln!("connected to {}, awaiting consent", peer);
    }

    match handshake::await_decision(&mut stream)? {
        HandshakeOutcome::Proceed => {}
        HandshakeOutcome::Refused => {
            logger.record(&TransferRecord::new(
                "send",
                peer,
                path,
                0,
                size,
                TransferStatus::Refused,
            ));
            bail!("connection refused by remote machine");
        }
        HandshakeOutcome::ProtocolViolation => {
            logger.record(&TransferRecord::new(
                "send",
                peer,
                path,
                0,
                size,
                TransferStatus::Failed,
            ));
            bail!("protocol violation");
        }
    }
    if opts.verbose {
        eprintln!("consent granted, sending {} bytes", size);
    }

    let sent = match transfer::send_stream(&mut stream, &mut source, size, progress) {
        Ok(n) => n,
        Err(e) => {
            logger.record(&TransferRecord::new(
                "send",
                peer,
                path,
                0,
                size,
                TransferStatus::Failed,
            ));
            return Err(e);
        }
    };
    // Half-close tells the receiver the stream is exhausted while keeping the
    // read side open for the acknowledgment
    stream
        .shutdown(Shutdown::Write)
        .context("half-close after payload")?;

    if sent != size || !verify::read_ack(&mut stream) {
        logger.record(&TransferRecord::new(
            "send",
            peer,
            path,
            sent,
            size,
            TransferStatus::Failed,
        ));
        bail!("lost connection to remote machine");
    }

    logger.record(&TransferRecord::new(
        "send",
        peer,
        path,
        sent,
        size,
        TransferStatus::Completed,
    ));
    if opts.verbose {
        eprintln!("sent {} bytes, transfer acknowledged", sent);
    }
    Ok(())
}
