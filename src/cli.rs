//! Clap option structs for both binaries, plus the shared exit-code policy

use crate::protocol::DEFAULT_PORT;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;

/// Options for slingd, the receiving end
#[derive(Clone, Debug, Parser)]
#[command(
    name = "slingd",
    author,
    version,
    about = "receives files from remote machines over a TCP connection"
)]
pub struct RecvOpts {
    /// Listen for transfers on <PORT>
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Suppress the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    /// Explain what is being done
    #[arg(short, long)]
    pub verbose: bool,

    /// Overwrite files and accept connections without prompts
    #[arg(short, long)]
    pub force: bool,

    /// Write JSONL log entries to file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Destination path for the received file
    pub file: PathBuf,
}

/// Options for sling, the sending end
#[derive(Clone, Debug, Parser)]
#[command(
    name = "sling",
    author,
    version,
    about = "sends files to remote machines over a TCP connection"
)]
pub struct SendOpts {
    /// Connect to <PORT> on the remote machine
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Suppress the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    /// Explain what is being done
    #[arg(short, long)]
    pub verbose: bool,

    /// Write JSONL log entries to file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Address of the receiving machine
    pub destination: String,

    /// File to send
    pub file: PathBuf,
}

/// Parse argv with the usage-error exit code pinned to 1.
/// `--help`/`--version` still exit 0; every malformed invocation exits 1
/// with usage on stderr.
pub fn parse_or_exit<T: Parser>() -> T {
    match T::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => std::process::exit(0),
                _ => std::process::exit(1),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recv_defaults() {
        let opts = RecvOpts::try_parse_from(["slingd", "dest.bin"]).unwrap();
        assert_eq!(opts.port, 45639);
        assert!(!opts.quiet);
        assert!(!opts.verbose);
        assert!(!opts.force);
        assert_eq!(opts.file, PathBuf::from("dest.bin"));
    }

    #[test]
    fn test_recv_flags() {
        let opts =
            RecvOpts::try_parse_from(["slingd", "-p", "8080", "-q", "-f", "dest.bin"]).unwrap();
        assert_eq!(opts.port, 8080);
        assert!(opts.quiet);
        assert!(opts.force);
    }

    #[test]
    fn test_recv_requires_the_file_argument() {
        assert!(RecvOpts::try_parse_from(["slingd"]).is_err());
        assert!(RecvOpts::try_parse_from(["slingd", "a", "b"]).is_err());
    }

    #[test]
    fn test_send_positionals() {
        let opts =
            SendOpts::try_parse_from(["sling", "--port", "4000", "10.0.0.2", "a.tar"]).unwrap();
        assert_eq!(opts.port, 4000);
        assert_eq!(opts.destination, "10.0.0.2");
        assert_eq!(opts.file, PathBuf::from("a.tar"));
    }

    #[test]
    fn test_send_requires_both_positionals() {
        assert!(SendOpts::try_parse_from(["sling", "10.0.0.2"]).is_err());
        assert!(SendOpts::try_parse_from(["sling"]).is_err());
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(SendOpts::try_parse_from(["sling", "--frob", "10.0.0.2", "a"]).is_err());
    }
}
