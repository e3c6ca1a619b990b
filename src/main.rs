//! sling - send one file to a waiting slingd over TCP

use anyhow::{ensure, Result};

use sling::cli::{self, SendOpts};
use sling::logger::{JsonlLogger, Logger, NoopLogger};
use sling::net;
use sling::progress::{NullProgress, Progress, ProgressBarSink};

fn main() -> Result<()> {
    // Set up Ctrl-C handler
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted by user. Exiting (Ctrl-C)...");
        std::process::exit(130);
    })
    .expect("Error setting Ctrl-C handler");

    let opts: SendOpts = cli::parse_or_exit();
    ensure!(opts.port != 0, "invalid port number");

    // Choose logger once; zero overhead with NoopLogger
    let logger: Box<dyn Logger> = if let Some(ref p) = opts.log_file {
        match JsonlLogger::new(p) {
            Ok(l) => Box::new(l),
            Err(_) => Box::new(NoopLogger),
        }
    } else {
        Box::new(NoopLogger)
    };

    let progress: Box<dyn Progress> = if opts.quiet {
        Box::new(NullProgress)
    } else {
        Box::new(ProgressBarSink::new())
    };

    net::push(&opts, progress.as_ref(), logger.as_ref())
}
