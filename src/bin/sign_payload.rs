//! CLI tool for signing webhook payloads
//!
//! Computes the `X-Hub-Signature` header GitHub would send for a payload,
//! so the bridge can be exercised locally with curl.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;

use pivotal_bridge::github::signature::{sign, SIGNATURE_HEADER};

#[derive(Parser)]
#[command(name = "sign-payload")]
#[command(about = "Sign a webhook payload with the shared secret")]
struct Cli {
    /// Payload file (JSON as GitHub would deliver it)
    #[arg(short, long)]
    payload: String,

    /// Shared secret, defaults to $SECRET_TOKEN
    #[arg(short, long, env = "SECRET_TOKEN")]
    secret: String,

    /// Print a ready-to-run curl command against this bridge URL
    #[arg(short, long)]
    url: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let body = fs::read(&cli.payload)
        .with_context(|| format!("failed to read payload {}", cli.payload))?;
    let signature = sign(&cli.secret, &body)?;

    match cli.url {
        Some(url) => println!(
            "curl -X POST '{}/github' -H 'Content-Type: application/json' -H 'X-GitHub-Event: pull_request' -H '{}: {}' --data-binary @{}",
            url.trim_end_matches('/'),
            SIGNATURE_HEADER,
            signature,
            cli.payload
        ),
        None => println!("{}: {}", SIGNATURE_HEADER, signature),
    }

    Ok(())
}
