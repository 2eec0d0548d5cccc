// Copyright (c) 2026 Routstr contributors. MIT License.
// See LICENSE for details.

//! # routstr-keytool
//!
//! Operator tooling for the routstr server key. Generates keys, prints the
//! node's public identity, and signs or verifies exactly the way the request
//! gate does, so a client integration can be checked from a shell.
//!
//! Subcommands:
//!
//! - `keygen`  - write a fresh key file
//! - `pubkey`  - print the node's public key and npub
//! - `digest`  - SHA-256 a message
//! - `sign`    - sign with the server key
//! - `verify`  - check a signature, exit status 1 when it does not verify
//! - `attest`  - emit a JSON attestation
//! - `version` - print build information

mod cli;
mod logging;
mod secrets;

use anyhow::{bail, Context, Result};
use clap::Parser;

use routstr_auth::config::{
    DIGEST_ALGORITHM, DIGEST_VERSION, SCHNORR_ALGORITHM, SIGNING_ALGORITHM,
};
use routstr_auth::crypto::{
    digest, sign_recoverable, verify, verify_schnorr, Digest, PrivateKey, PublicKey,
    SchnorrSignature, Signature,
};
use routstr_auth::ServerSigner;

use cli::{
    AttestArgs, Commands, KeygenArgs, KeySource, KeytoolCli, MessageInput, SignArgs,
    SignatureFormat, VerifyArgs,
};

fn main() -> Result<()> {
    let cli = KeytoolCli::parse();
    logging::init_logging(&cli.log_level.to_lowercase(), cli.log_format.into());

    match cli.command {
        Commands::Keygen(args) => keygen(args),
        Commands::Pubkey(source) => print_public_key(&source),
        Commands::Digest(args) => {
            println!("{}", resolve_digest(&args.input)?);
            Ok(())
        }
        Commands::Sign(args) => sign_input(args),
        Commands::Verify(args) => {
            if verify_input(&args)? {
                println!("valid");
                Ok(())
            } else {
                // A bad signature is an answer, not a failure of the tool.
                println!("invalid");
                std::process::exit(1);
            }
        }
        Commands::Attest(args) => attest(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Generates a key, writes it with owner-only permissions, prints the public side.
fn keygen(args: KeygenArgs) -> Result<()> {
    let key = PrivateKey::generate();
    secrets::write_key_file(&args.output, &key, args.force)?;

    let public_key = key.public_key();
    tracing::info!(
        path = %args.output.display(),
        public_key = %public_key,
        "server key generated"
    );
    println!("key file: {}", args.output.display());
    println!("pubkey:   {}", public_key.to_hex());
    println!("npub:     {}", public_key.to_npub());
    Ok(())
}

fn print_public_key(source: &KeySource) -> Result<()> {
    let public_key = secrets::load_key(source)?.public_key();
    println!("compressed:   {}", public_key.to_hex());
    println!("uncompressed: {}", hex::encode(public_key.to_uncompressed()));
    println!("x-only:       {}", hex::encode(public_key.x_only()));
    println!("npub:         {}", public_key.to_npub());
    Ok(())
}

fn sign_input(args: SignArgs) -> Result<()> {
    let d = resolve_digest(&args.input)?;
    let key = secrets::load_key(&args.key)?;

    let encoded = match args.format {
        SignatureFormat::Recoverable => sign_recoverable(&key, &d)
            .context("signing failed")?
            .to_hex(),
        format => {
            let signer = ServerSigner::new(key);
            match format {
                SignatureFormat::Schnorr => signer.sign_schnorr(&d)?.to_hex(),
                SignatureFormat::Der => hex::encode(signer.sign_digest(&d)?.to_der()),
                _ => signer.sign_digest(&d)?.to_hex(),
            }
        }
    };

    tracing::debug!(digest = %d, format = ?args.format, "signed");
    println!("{}", encoded);
    Ok(())
}

fn verify_input(args: &VerifyArgs) -> Result<bool> {
    let d = resolve_digest(&args.input)?;
    let public_key = parse_public_key_arg(&args.pubkey)?;

    if args.schnorr {
        let signature =
            SchnorrSignature::from_hex(&args.signature).context("malformed Schnorr signature")?;
        return Ok(verify_schnorr(&public_key.x_only(), &d, &signature)?);
    }

    let signature = Signature::from_hex(&args.signature).context("malformed signature")?;
    Ok(verify(&public_key, &d, &signature))
}

fn attest(args: AttestArgs) -> Result<()> {
    let signer = ServerSigner::new(secrets::load_key(&args.key)?);
    let attestation = signer.attest(args.message.as_bytes())?;
    println!("{}", serde_json::to_string_pretty(&attestation)?);
    Ok(())
}

/// Turns whichever message form was given into the digest that gets signed.
fn resolve_digest(input: &MessageInput) -> Result<Digest> {
    if let Some(message) = input.message.as_deref() {
        return Ok(digest(message.as_bytes()));
    }
    if let Some(message_hex) = input.message_hex.as_deref() {
        let bytes = hex::decode(message_hex.trim()).context("--message-hex is not valid hex")?;
        return Ok(digest(&bytes));
    }
    if let Some(digest_hex) = input.digest.as_deref() {
        return Digest::from_hex(digest_hex.trim()).context("--digest is not a 32-byte hex digest");
    }
    bail!("one of --message, --message-hex or --digest is required")
}

/// Accepts `npub1...`, 32-byte x-only hex, or SEC1 hex.
fn parse_public_key_arg(s: &str) -> Result<PublicKey> {
    let s = s.trim();
    if s.starts_with("npub1") {
        return PublicKey::from_npub(s).context("invalid npub");
    }
    let bytes = hex::decode(s).context("public key is not valid hex")?;
    let public_key = if bytes.len() == 32 {
        PublicKey::from_x_only(&bytes)
    } else {
        PublicKey::from_sec1_bytes(&bytes)
    };
    public_key.context("invalid public key")
}

fn print_version() {
    println!("routstr-keytool {}", env!("CARGO_PKG_VERSION"));
    println!("signing   {}", SIGNING_ALGORITHM);
    println!("schnorr   {}", SCHNORR_ALGORITHM);
    println!("digest    {} (v{})", DIGEST_ALGORITHM, DIGEST_VERSION);
}
