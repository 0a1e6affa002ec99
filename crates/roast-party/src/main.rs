//! ROAST Party CLI
//!
//! Local driver for the threshold signer:
//! - deal key shares for a fresh signing group
//! - run a complete ROAST signing request in-process, optionally with
//!   injected Byzantine behaviour
//! - verify BIP-340 signatures

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use roast_core::{
    dealer,
    roast::{run_signing, Behaviour},
    Bip340Ciphersuite, GroupInfo, KeyShare, SignerIndex,
};
use tracing::{info, Level};

/// ROAST Party - BIP-340 threshold signing runner
#[derive(Parser)]
#[command(name = "roast-party")]
#[command(about = "Threshold Schnorr (FROST+ROAST) signing over secp256k1")]
#[command(version)]
struct Cli {
    /// Data directory for group info and key shares
    #[arg(short, long, env = "ROAST_DEST", default_value = "./data")]
    dest: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deal key shares for a new signing group
    Keygen {
        /// Number of members
        #[arg(short = 'n', long)]
        group_size: usize,

        /// Signing threshold (t-of-n)
        #[arg(short = 't', long)]
        threshold: usize,
    },

    /// Run a signing request over the stored group
    Sign {
        /// Message to sign, hex encoded, any length
        #[arg(short, long)]
        message: String,

        /// Members that never answer commit requests (comma-separated)
        #[arg(long, value_delimiter = ',')]
        absent: Vec<SignerIndex>,

        /// Members that commit but never sign (comma-separated)
        #[arg(long, value_delimiter = ',')]
        silent: Vec<SignerIndex>,

        /// Members that return garbage shares (comma-separated)
        #[arg(long, value_delimiter = ',')]
        corrupt: Vec<SignerIndex>,
    },

    /// Verify a BIP-340 signature
    Verify {
        /// X-only public key, 32 bytes hex
        #[arg(short, long)]
        public_key: String,

        /// Message, hex encoded
        #[arg(short, long)]
        message: String,

        /// Signature, 64 bytes hex
        #[arg(short, long)]
        signature: String,
    },

    /// Show the stored group info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen {
            group_size,
            threshold,
        } => run_keygen(&cli.dest, group_size, threshold),
        Commands::Sign {
            ref message,
            ref absent,
            ref silent,
            ref corrupt,
        } => run_sign(&cli.dest, message, absent, silent, corrupt).await,
        Commands::Verify {
            ref public_key,
            ref message,
            ref signature,
        } => run_verify(public_key, message, signature),
        Commands::Info => show_info(&cli.dest),
    }
}

fn run_keygen(dest: &PathBuf, group_size: usize, threshold: usize) -> Result<()> {
    std::fs::create_dir_all(dest)?;

    info!(group_size, threshold, "dealing key shares");
    let (group, key_shares) = dealer::generate_group(group_size, threshold)?;

    let group_path = dest.join("group.json");
    std::fs::write(&group_path, serde_json::to_string_pretty(&group)?)?;

    for share in &key_shares {
        let share_path = dest.join(format!("keyshare.{}.json", share.signer_index));
        std::fs::write(&share_path, serde_json::to_string_pretty(share)?)?;
    }

    info!(
        public_key = hex::encode(&group.public_key),
        path = ?group_path,
        "group dealt and saved"
    );
    println!("Group public key (x-only): {}", hex::encode(&group.public_key[1..33]));

    Ok(())
}

async fn run_sign(
    dest: &PathBuf,
    message: &str,
    absent: &[SignerIndex],
    silent: &[SignerIndex],
    corrupt: &[SignerIndex],
) -> Result<()> {
    let message = hex::decode(message).context("message must be hex encoded")?;

    let group = load_group(dest)?;
    let key_shares = load_key_shares(dest, &group)?;

    let mut behaviours: BTreeMap<SignerIndex, Behaviour> = BTreeMap::new();
    for &index in absent {
        behaviours.insert(index, Behaviour::WithholdsCommit);
    }
    for &index in silent {
        behaviours.insert(index, Behaviour::WithholdsShare);
    }
    for &index in corrupt {
        behaviours.insert(index, Behaviour::CorruptsShare);
    }

    info!(
        group_size = group.group_size,
        threshold = group.threshold,
        byzantine = behaviours.len(),
        "starting signing request"
    );

    let signature = run_signing(Bip340Ciphersuite, &group, key_shares, &message, &behaviours)
        .await
        .context("signing request failed")?;

    let bytes = signature.to_bytes();
    println!("Signature: {}", hex::encode(bytes));
    println!("  r: {}", hex::encode(&bytes[..32]));
    println!("  s: {}", hex::encode(&bytes[32..]));

    Ok(())
}

fn run_verify(public_key: &str, message: &str, signature: &str) -> Result<()> {
    let public_key: [u8; 32] = hex::decode(public_key)
        .context("public key must be hex encoded")?
        .try_into()
        .map_err(|_| anyhow::anyhow!("public key must be 32 bytes"))?;
    let message = hex::decode(message).context("message must be hex encoded")?;
    let signature: [u8; 64] = hex::decode(signature)
        .context("signature must be hex encoded")?
        .try_into()
        .map_err(|_| anyhow::anyhow!("signature must be 64 bytes"))?;

    match Bip340Ciphersuite.verify(&public_key, &message, &signature) {
        Ok(()) => {
            println!("Signature is valid");
            Ok(())
        }
        Err(error) => bail!("signature is invalid: {error}"),
    }
}

fn show_info(dest: &PathBuf) -> Result<()> {
    let group = load_group(dest)?;

    println!("Signing group:");
    println!("  Members: {}", group.group_size);
    println!("  Threshold: {}", group.threshold);
    println!(
        "  Public key (x-only): {}",
        hex::encode(&group.public_key[1..33]),
    );
    println!("  Public shares: {}", group.public_shares.len());

    Ok(())
}

fn load_group(dest: &PathBuf) -> Result<GroupInfo> {
    let path = dest.join("group.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("no group info at {}; run keygen first", path.display()))?;
    Ok(serde_json::from_str(&json)?)
}

fn load_key_shares(dest: &PathBuf, group: &GroupInfo) -> Result<Vec<KeyShare>> {
    let mut shares = Vec::with_capacity(group.group_size);
    for index in 1..=group.group_size as u64 {
        let path = dest.join(format!("keyshare.{index}.json"));
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("missing key share {}", path.display()))?;
        shares.push(serde_json::from_str(&json)?);
    }
    Ok(shares)
}
