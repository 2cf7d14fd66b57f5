//! ciphercore: command-line tool for account keys and message envelopes.
//!
//! Account key records and envelopes are JSON files in the same shape the
//! message store persists them.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use ciphercore_crypto::{
    hash_password, open, protect, rewrap, seal, unlock, AccountKeyRecord, CryptoError,
    CryptoPolicy, Keypair, MessageEnvelope,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ciphercore")]
#[command(author, version, about = "Key custody and message envelopes for CipherCore")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a keypair and write its password-protected account record
    Keygen {
        /// Password protecting the private key
        #[arg(short, long)]
        password: String,

        /// Output file for the account key record
        #[arg(short, long, default_value = "account.json")]
        output: PathBuf,
    },

    /// Print the public key of an account record
    PublicKey {
        /// Path to the account key record
        #[arg(short, long)]
        account: PathBuf,
    },

    /// Encrypt and sign a message for a recipient
    Seal {
        /// Sender's account key record
        #[arg(short, long)]
        sender: PathBuf,

        /// Sender's password
        #[arg(short, long)]
        password: String,

        /// Recipient's account key record
        #[arg(short, long)]
        recipient: PathBuf,

        /// File holding the message plaintext
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the envelope
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Decrypt a message and verify its hash and signature
    Open {
        /// Envelope file
        #[arg(short, long)]
        envelope: PathBuf,

        /// Receiver's account key record
        #[arg(short, long)]
        receiver: PathBuf,

        /// Receiver's password
        #[arg(short, long)]
        password: String,

        /// Sender's account key record (for signature verification)
        #[arg(short, long)]
        sender: PathBuf,

        /// Output file for the plaintext
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Re-protect an account record under the current policy
    Rewrap {
        /// Path to the account key record (rewritten in place)
        #[arg(short, long)]
        account: PathBuf,

        /// Account password
        #[arg(short, long)]
        password: String,
    },

    /// Hash a login password (Argon2id PHC string)
    HashPassword {
        #[arg(short, long)]
        password: String,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // integrity failures must not reveal which check rejected the input
            match e.downcast_ref::<CryptoError>() {
                Some(crypto) => eprintln!("Error: {}", crypto.public_message()),
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ciphercore=info,ciphercore_crypto=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let policy = CryptoPolicy::from_env()?;

    match cli.command {
        Commands::Keygen { password, output } => cmd_keygen(&password, &output, &policy),
        Commands::PublicKey { account } => cmd_public_key(&account),
        Commands::Seal {
            sender,
            password,
            recipient,
            input,
            output,
        } => cmd_seal(&sender, &password, &recipient, &input, &output),
        Commands::Open {
            envelope,
            receiver,
            password,
            sender,
            output,
        } => cmd_open(&envelope, &receiver, &password, &sender, &output),
        Commands::Rewrap { account, password } => cmd_rewrap(&account, &password, &policy),
        Commands::HashPassword { password } => {
            let output = serde_json::json!({ "password_hash": hash_password(&password)? });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}

fn load_record(path: &Path) -> anyhow::Result<AccountKeyRecord> {
    AccountKeyRecord::load(path)
        .with_context(|| format!("reading account record {}", path.display()))
}

fn cmd_keygen(password: &str, output: &Path, policy: &CryptoPolicy) -> anyhow::Result<()> {
    let keypair = Keypair::generate(policy)?;
    let record = protect(&keypair, password, policy)?;
    record.save(output)?;

    tracing::info!(
        fingerprint = %keypair.public.fingerprint(),
        rsa_bits = keypair.public.bits(),
        "Account keypair generated"
    );

    let output = serde_json::json!({
        "account_path": output.to_string_lossy(),
        "fingerprint": keypair.public.fingerprint(),
        "kdf_iterations": record.kdf_iterations,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn cmd_public_key(account: &Path) -> anyhow::Result<()> {
    let record = load_record(account)?;
    let public = record.public_key()?;

    let output = serde_json::json!({
        "fingerprint": public.fingerprint(),
        "bits": public.bits(),
        "public_key": record.public_key_pem,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn cmd_seal(
    sender_path: &Path,
    password: &str,
    recipient_path: &Path,
    input: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    let sender = load_record(sender_path)?;
    let recipient = load_record(recipient_path)?;
    let plaintext = std::fs::read(input)?;

    let sender_private = unlock(&sender, password)?;
    let envelope = seal(&plaintext, &sender_private, &recipient.public_key()?)?;

    std::fs::write(output, serde_json::to_string_pretty(&envelope)?)?;

    let summary = serde_json::json!({
        "input": input.to_string_lossy(),
        "output": output.to_string_lossy(),
        "input_size": plaintext.len(),
        "ciphertext_size": envelope.ciphertext.len(),
        "recipient": recipient.public_key()?.fingerprint(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

fn cmd_open(
    envelope_path: &Path,
    receiver_path: &Path,
    password: &str,
    sender_path: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    let envelope: MessageEnvelope =
        serde_json::from_str(&std::fs::read_to_string(envelope_path)?)?;
    let receiver = load_record(receiver_path)?;
    let sender = load_record(sender_path)?;

    let receiver_private = unlock(&receiver, password).map_err(|e| match e {
        CryptoError::AuthenticationFailure => CryptoError::KeyUnwrapFailure,
        other => other,
    })?;
    let opened = open(&envelope, &receiver_private, &sender.public_key()?)?;

    std::fs::write(output, &opened.plaintext)?;

    if let Some(warning) = opened.warning() {
        tracing::warn!(warning, "Message integrity warning");
    }

    let summary = serde_json::json!({
        "output": output.to_string_lossy(),
        "output_size": opened.plaintext.len(),
        "hash_valid": opened.hash_valid,
        "signature_valid": opened.signature_valid,
        "warning": opened.warning(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

fn cmd_rewrap(account: &Path, password: &str, policy: &CryptoPolicy) -> anyhow::Result<()> {
    let record = load_record(account)?;

    let rewrapped = record.needs_rewrap(policy);
    let kdf_iterations = if rewrapped {
        rewrap(&record, password, policy)?.save(account)?;
        policy.kdf_iterations
    } else {
        record.kdf_iterations
    };

    let output = serde_json::json!({
        "account_path": account.to_string_lossy(),
        "rewrapped": rewrapped,
        "kdf_iterations": kdf_iterations,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
