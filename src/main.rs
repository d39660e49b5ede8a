// ABOUTME: Entry point for the rwinrm CLI application.
// ABOUTME: Parses arguments, then either generates a client certificate or runs one remote command.

mod cli;

use clap::Parser;
use cli::Cli;
use rwinrm::certgen::{self, ArtifactPaths, CertRequest};
use rwinrm::config::{Options, Profile};
use rwinrm::diagnostics::{Diagnostics, Warning};
use rwinrm::error::{LOCAL_FAILURE_EXIT, Result};
use rwinrm::interrupt::InterruptGuard;
use rwinrm::session::{self, InputMode, Streams};
use rwinrm::shell::PowerShellConnector;
use rwinrm::types::KeySize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(LOCAL_FAILURE_EXIT);
        }
    };

    // Logs go to stderr; stdout belongs to the remote command.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut diag = Diagnostics::default();
    let result = if cli.gencert {
        gencert(&cli, &mut diag).map(|()| 0)
    } else {
        remote(&cli, &mut diag).await
    };

    for warning in diag.warnings() {
        eprintln!("Warning: {}", warning.message);
    }

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if e.is_cancelled() {
                tracing::debug!("run ended by interrupt");
            }
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

fn gencert(cli: &Cli, diag: &mut Diagnostics) -> Result<()> {
    let text = cli.certsize.as_deref().unwrap_or_default();
    let key_size = KeySize::parse_lenient(text);
    if !text.trim().is_empty() && text.parse::<KeySize>().is_err() {
        diag.warn(Warning::key_size_fallback(format!(
            "unrecognized key size '{text}', using {key_size} bits"
        )));
    }

    let request = CertRequest::new(key_size)
        .common_name(cli.common_name.as_str())
        .valid_days(cli.valid_days);
    let artifact = certgen::generate(&request)?;

    let paths = ArtifactPaths {
        certificate: cli.cert_out.clone(),
        private_key: cli.key_out.clone(),
    };
    certgen::write_artifacts(&artifact, &paths)
}

async fn remote(cli: &Cli, diag: &mut Diagnostics) -> Result<i32> {
    let mut options: Options = cli.options();
    if let Some(path) = &cli.config {
        options = options.with_profile(Profile::load(path)?);
    }
    let invocation = options.into_invocation()?;

    let cancel = CancellationToken::new();
    let guard = InterruptGuard::install(cancel.clone());

    let connector = PowerShellConnector::new(&invocation.pwsh);
    let result = session::run(
        &connector,
        &invocation.connection,
        invocation.credentials,
        &invocation.command,
        Streams::process(InputMode::detect()),
        &cancel,
        diag,
    )
    .await;

    if guard.interrupted() {
        tracing::warn!("interrupted");
    }
    drop(guard);
    result
}
