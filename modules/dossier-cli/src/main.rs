use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dossier_common::Config;

mod cmd;

const LOG_TARGETS: &[&str] = &[
    "dossier",
    "urlscan_client",
    "crtsh_client",
    "virustotal_client",
    "whoxy_client",
    "wayback_client",
];

#[derive(Parser)]
#[command(name = "dossier")]
#[command(about = "Screenshots, WHOIS and reputation lookups for suspicious domains")]
#[command(version)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill in missing screenshots in the record store from urlscan.io
    Screenshots(cmd::screenshots::ScreenshotsArgs),

    /// Run every recon lookup against each domain in the target list
    Scan {
        /// Target list, one domain per line
        #[arg(long)]
        input: Option<PathBuf>,

        /// Directory for the per-domain JSON files
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Phishing blocklist checks
    #[command(subcommand)]
    Blocklist(cmd::recon::BlocklistCommand),

    /// A, MX, TXT and NS records
    Dns { domain: String },

    /// Subdomains from certificate transparency logs
    Crtsh { domain: String },

    /// VirusTotal domain report
    Virustotal { domain: String },

    /// WHOIS record for a domain
    Whois { domain: String },

    /// Domains registered by an email, name or company
    Reverse(cmd::whois::ReverseArgs),

    /// Reverse WHOIS for every email in a file
    BulkEmail(cmd::whois::BulkEmailArgs),

    /// Wayback Machine lookups
    #[command(subcommand)]
    Wayback(cmd::wayback::WaybackCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = Config::from_env();
    config.log_redacted();

    match cli.command {
        Commands::Screenshots(args) => cmd::screenshots::run(&config, args).await,
        Commands::Scan { input, output } => cmd::recon::scan(&config, input, output).await,
        Commands::Blocklist(command) => cmd::recon::blocklist(&config, command).await,
        Commands::Dns { domain } => cmd::recon::dns(&domain).await,
        Commands::Crtsh { domain } => cmd::recon::crtsh(&domain).await,
        Commands::Virustotal { domain } => cmd::recon::virustotal(&config, &domain).await,
        Commands::Whois { domain } => cmd::whois::whois(&config, &domain).await,
        Commands::Reverse(args) => cmd::whois::reverse(&config, args).await,
        Commands::BulkEmail(args) => cmd::whois::bulk_email(&config, args).await,
        Commands::Wayback(command) => cmd::wayback::run(command).await,
    }
}

/// Logs go to stderr so JSON printed on stdout can be piped.
fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let mut filter = EnvFilter::from_default_env();
    for target in LOG_TARGETS {
        filter = filter.add_directive(format!("{target}={level}").parse()?);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
