// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Flags mirror the classic winrm client; unset options fall back to profile then defaults.

use clap::Parser;
use rwinrm::config::{AuthMode, Options, parse_timeout};
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "rwinrm")]
#[command(about = "Run a command on a remote Windows host over WinRM")]
#[command(version)]
pub struct Cli {
    /// Remote host to connect to [default: localhost]
    #[arg(long)]
    pub hostname: Option<String>,

    /// User to authenticate as [default: vagrant]
    #[arg(long)]
    pub username: Option<String>,

    /// Password for the user [default: vagrant]
    #[arg(long, env = "WINRM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// The password is base64 encoded
    #[arg(long)]
    pub encoded: bool,

    /// Authenticate with NTLM instead of Basic
    #[arg(long)]
    pub ntlm: bool,

    /// WinRM port [default: 5985]
    #[arg(long)]
    pub port: Option<u16>,

    /// Use TLS
    #[arg(long)]
    pub https: bool,

    /// Skip server certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// PEM file with the CA that signed the server certificate
    #[arg(long, value_name = "PATH")]
    pub cacert: Option<PathBuf>,

    /// Connection timeout such as 30s or 1m; 0s waits indefinitely [default: 0s]
    #[arg(long, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// YAML profile with connection settings
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// PowerShell executable used for remoting [default: pwsh]
    #[arg(long, value_name = "PROGRAM")]
    pub pwsh: Option<PathBuf>,

    /// Generate an x509 client certificate and key instead of running a command
    #[arg(long)]
    pub gencert: bool,

    /// RSA key size for --gencert: 512, 1024, 2048 or 4096 [default: 2048]
    #[arg(long, value_name = "BITS")]
    pub certsize: Option<String>,

    /// Where --gencert writes the certificate
    #[arg(long, value_name = "PATH", default_value = "cert.cer")]
    pub cert_out: PathBuf,

    /// Where --gencert writes the private key
    #[arg(long, value_name = "PATH", default_value = "priv.pem")]
    pub key_out: PathBuf,

    /// Subject common name for --gencert
    #[arg(long, default_value = "winrm client cert")]
    pub common_name: String,

    /// Certificate validity in days for --gencert
    #[arg(long, default_value_t = 365)]
    pub valid_days: u64,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to run on the remote host
    pub command: Option<String>,
}

impl Cli {
    /// Connection options as given on the command line.
    pub fn options(&self) -> Options {
        Options {
            hostname: self.hostname.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone().map(SecretString::from),
            encoded_password: self.encoded,
            auth: self.ntlm.then_some(AuthMode::Ntlm),
            https: self.https,
            insecure: self.insecure,
            cacert: self.cacert.clone(),
            timeout: self.timeout,
            pwsh: self.pwsh.clone(),
            command: self.command.clone(),
        }
    }
}
