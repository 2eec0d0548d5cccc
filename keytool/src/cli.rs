//! # CLI Interface
//!
//! Command-line surface of `routstr-keytool`, via `clap` derive. The server
//! secret comes from `--key`/`NSEC` or `--key-file`/`ROUTSTR_KEY_FILE`,
//! the same places the routstr service reads it from.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use routstr_auth::config::{SECRET_KEY_ENV, SECRET_KEY_FILE_ENV};

/// Key management and signing for a routstr node.
#[derive(Parser, Debug)]
#[command(
    name = "routstr-keytool",
    about = "Key management and request signing for a routstr node",
    version,
    propagate_version = true
)]
pub struct KeytoolCli {
    /// Log output format.
    #[arg(long, global = true, value_enum, env = "ROUTSTR_LOG_FORMAT", default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a new server key and write it to a file (mode 0600).
    Keygen(KeygenArgs),
    /// Print the server's public key in every supported encoding.
    Pubkey(KeySource),
    /// Print the SHA-256 digest of a message.
    Digest(MessageArgs),
    /// Sign a message (or a pre-computed digest) with the server key.
    Sign(SignArgs),
    /// Verify a signature. Exits with status 1 when it does not verify.
    Verify(VerifyArgs),
    /// Produce a JSON attestation for a message.
    Attest(AttestArgs),
    /// Print version information and exit.
    Version,
}

/// Where the server secret comes from. Both may be set; the inline key
/// wins.
#[derive(Args, Debug, Clone)]
pub struct KeySource {
    /// Server secret, hex or `nsec1...`.
    ///
    /// **Avoid on shared machines**: it ends up in shell history and `ps`.
    #[arg(long, env = SECRET_KEY_ENV, hide_env_values = true)]
    pub key: Option<String>,

    /// File holding the server secret, hex or `nsec1...`.
    #[arg(long, env = SECRET_KEY_FILE_ENV)]
    pub key_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Where to write the new key.
    #[arg(long, short = 'o', default_value = "routstr.key")]
    pub output: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

/// A message given inline, as hex, or as a digest.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct MessageInput {
    /// UTF-8 message.
    #[arg(long, short = 'm')]
    pub message: Option<String>,

    /// Hex-encoded message bytes.
    #[arg(long)]
    pub message_hex: Option<String>,

    /// Hex-encoded 32-byte SHA-256 digest, for pre-hashed input.
    #[arg(long)]
    pub digest: Option<String>,
}

#[derive(Args, Debug)]
pub struct MessageArgs {
    #[command(flatten)]
    pub input: MessageInput,
}

#[derive(Args, Debug)]
pub struct SignArgs {
    #[command(flatten)]
    pub key: KeySource,

    #[command(flatten)]
    pub input: MessageInput,

    /// Output encoding.
    #[arg(long, value_enum, default_value_t = SignatureFormat::Compact)]
    pub format: SignatureFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SignatureFormat {
    /// 64-byte `r || s`.
    Compact,
    /// ASN.1 DER.
    Der,
    /// 65 bytes: recovery id then `r || s`.
    Recoverable,
    /// BIP-340 Schnorr under the nostr identity.
    Schnorr,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Signer public key: SEC1 hex (compressed or uncompressed) or `npub1...`.
    #[arg(long)]
    pub pubkey: String,

    /// Hex signature (compact, DER, recoverable, or Schnorr with `--schnorr`).
    #[arg(long)]
    pub signature: String,

    /// Treat the signature as BIP-340 Schnorr.
    #[arg(long)]
    pub schnorr: bool,

    #[command(flatten)]
    pub input: MessageInput,
}

#[derive(Args, Debug)]
pub struct AttestArgs {
    #[command(flatten)]
    pub key: KeySource,

    /// UTF-8 message to attest.
    #[arg(long, short = 'm')]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        KeytoolCli::command().debug_assert();
    }

    #[test]
    fn test_sign_requires_exactly_one_input() {
        assert!(KeytoolCli::try_parse_from(["routstr-keytool", "sign", "--key", "01"]).is_err());
        assert!(KeytoolCli::try_parse_from([
            "routstr-keytool",
            "sign",
            "-m",
            "a",
            "--digest",
            "00"
        ])
        .is_err());
    }

    #[test]
    fn test_parse_verify() {
        let cli = KeytoolCli::try_parse_from([
            "routstr-keytool",
            "verify",
            "--pubkey",
            "02aa",
            "--signature",
            "bb",
            "-m",
            "hello",
        ])
        .unwrap();
        match cli.command {
            Commands::Verify(args) => {
                assert_eq!(args.input.message.as_deref(), Some("hello"));
                assert!(!args.schnorr);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
