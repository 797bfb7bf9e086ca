use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use simple_authn::{Algorithm, Claims, Host, Key};
use tracing_subscriber::EnvFilter;

/// Claims that the `--payload` argument may not override.
const ENVELOPE_CLAIMS: [&str; 4] = ["iat", "nbf", "exp", "iss"];

#[derive(Debug, Parser)]
#[command(name = "authn", about = "Issue and verify short-lived authentication tokens")]
struct Arguments {
    /// The key: PEM or JWK text for EdDSA/ECDSA, or any shared secret for HMAC
    #[arg(long, env = "AUTHN_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Read the key from a file
    #[arg(long, conflicts_with = "key")]
    key_file: Option<PathBuf>,

    /// The signature algorithm. Inferred from the key if not given.
    #[arg(long, value_parser = parse_algorithm)]
    alg: Option<Algorithm>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Issue a token and print it
    Sign {
        /// Token lifetime in seconds
        #[arg(long, default_value_t = 120)]
        expires: u64,

        /// The token issuer
        #[arg(long)]
        issuer: Option<String>,

        /// Extra claims, as a JSON object
        #[arg(long)]
        payload: Option<String>,
    },
    /// Verify a token and print its payload
    Verify {
        /// Accept tokens issued at most this many seconds ago
        #[arg(long, default_value_t = 30)]
        validity: u32,

        /// The token to verify
        token: String,
    },
    /// Print the algorithm that would be used for the key
    Infer,
}

fn parse_algorithm(s: &str) -> Result<Algorithm, String> {
    s.parse().map_err(|_| format!("unknown algorithm {s:?}"))
}

fn main() -> Result<()> {
    // initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Arguments::parse();

    match &args.command {
        Command::Sign {
            expires,
            issuer,
            payload,
        } => {
            let key = load_key(&args)?;
            let mut claims = Claims::new(Duration::from_secs(*expires));
            if let Some(issuer) = issuer {
                claims = claims.with_issuer(issuer);
            }
            let payload = make_payload(claims, payload.as_deref())?;
            let token = simple_authn::issue(&key, &payload).context("failed to create token")?;
            println!("{token}");
        }
        Command::Verify { validity, token } => {
            let key = load_key(&args)?;
            let host = Host::new(&key, *validity)?;
            let payload: Value = host.verify(token).context("token rejected")?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Infer => {
            let text = key_text(&args)?;
            println!("{}", Algorithm::infer(&text));
        }
    }
    Ok(())
}

/// Fetch the key text from the command line, environment, or a file.
fn key_text(args: &Arguments) -> Result<String> {
    if let Some(key) = &args.key {
        return Ok(key.clone());
    }
    let Some(path) = &args.key_file else {
        return Err(simple_authn::Error::MissingKey)
            .context("set AUTHN_KEY, or pass --key or --key-file");
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    // Editors like to add a trailing newline to secrets.
    Ok(text.trim_end_matches(|c| c == '\r' || c == '\n').to_owned())
}

fn load_key(args: &Arguments) -> Result<Key> {
    let text = key_text(args)?;
    let alg = args.alg.unwrap_or_else(|| Algorithm::infer(&text));
    tracing::debug!("using {alg} key");
    Key::new(alg, &text).with_context(|| format!("failed to load {alg} key"))
}

/// Merge extra JSON claims into the envelope.
fn make_payload(claims: Claims, extra: Option<&str>) -> Result<Value> {
    let mut payload = serde_json::to_value(claims)?;
    let Some(extra) = extra else {
        return Ok(payload);
    };

    let extra: Map<String, Value> =
        serde_json::from_str(extra).context("payload must be a JSON object")?;
    let Value::Object(fields) = &mut payload else {
        bail!("claims did not serialize to an object");
    };
    for (name, value) in extra {
        if ENVELOPE_CLAIMS.contains(&name.as_str()) {
            bail!("payload may not set the {name:?} claim");
        }
        fields.insert(name, value);
    }
    Ok(payload)
}
