//! Operator consent: interactive y/n prompts and force mode behind one trait

use anyhow::{bail, Context, Result};
use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::path::Path;

/// Decides whether a connection may proceed and whether an existing
/// destination may be overwritten. Force mode and the interactive prompt
/// share this interface so the transfer drivers never look at a flag.
pub trait ConsentProvider {
    fn allow_connection(&self, peer: SocketAddr) -> Result<bool>;
    fn allow_overwrite(&self, path: &Path) -> Result<bool>;
}

/// Always proceeds; selected by `--force`.
pub struct ForceConsent;

impl ConsentProvider for ForceConsent {
    fn allow_connection(&self, _peer: SocketAddr) -> Result<bool> {
        Ok(true)
    }
    fn allow_overwrite(&self, _path: &Path) -> Result<bool> {
        Ok(true)
    }
}

/// Blocking console prompt, re-asked until the operator answers y or n.
pub struct PromptConsent;

impl PromptConsent {
    fn ask(&self, question: &str) -> Result<bool> {
        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            print!("{} (y/n) ", question);
            io::stdout().flush().context("flush prompt")?;
            line.clear();
            let n = stdin
                .lock()
                .read_line(&mut line)
                .context("read confirmation")?;
            if n == 0 {
                bail!("stdin closed while awaiting confirmation");
            }
            if let Some(answer) = parse_answer(&line) {
                return Ok(answer);
            }
        }
    }
}

impl ConsentProvider for PromptConsent {
    fn allow_connection(&self, peer: SocketAddr) -> Result<bool> {
        self.ask(&format!("received a connection from {}. proceed?", peer.ip()))
    }

    fn allow_overwrite(&self, path: &Path) -> Result<bool> {
        self.ask(&format!("{} already exists. overwrite?", path.display()))
    }
}

fn parse_answer(line: &str) -> Option<bool> {
    match line.trim() {
        "y" | "Y" | "yes" | "YES" => Some(true),
        "n" | "N" | "no" | "NO" => Some(false),
        _ => None,
    }
}
