//! drive_keeper CLI - replace Drive files owned by others with owned copies.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use drive_keeper::driver::{self, Config, Mode};
use drive_keeper::folder_ref::parse_folder_ref;
use drive_keeper::{logging, DriveError, RetryPolicy, Wildcard};

/// Time a cancelled run gets to stop on its own before it is abandoned.
const CANCEL_GRACE: Duration = Duration::from_secs(2);

/// Take ownership of Drive files owned by other accounts.
#[derive(Parser)]
#[command(name = "drive_keeper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Email of the principal to authorize as and to match owners against.
    #[arg(short = 'a', long, env = "DRIVE_KEEPER_PRINCIPAL")]
    principal: String,

    /// Client secrets JSON, absolute or relative to the resource directories.
    #[arg(short = 'c', long, env = "DRIVE_KEEPER_CLIENT_SECRET")]
    client_secret: PathBuf,

    /// Directory where OAuth tokens are persisted.
    #[arg(short = 'd', long, env = "DRIVE_KEEPER_CREDENTIAL_STORE")]
    credential_store: PathBuf,

    /// Directory searched first for relative resources.
    #[arg(long, env = "DRIVE_KEEPER_RESOURCES")]
    resources: Option<PathBuf>,

    /// Retries for calls rejected by quota limits.
    #[arg(long, default_value_t = 0)]
    max_retries: u32,

    /// Abort the run after this many seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Log filter (e.g. info, debug, drive_keeper=trace). Falls back to RUST_LOG, then info.
    #[arg(long, env = "DRIVE_KEEPER_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename each foreign file to backupxx_<name> and copy it back as <name>.
    Rename {
        /// Only files whose name starts with <prefix>, written as "<prefix>~".
        #[arg(short = 'w', long, default_value = "")]
        wildcard: String,
    },

    /// Copy each foreign file into a new Backup_<yyyyMMddHHmm> folder.
    Mirror {
        /// Folder URL or ID to create the backup under, instead of the discovered top.
        #[arg(long)]
        root: Option<String>,

        /// Fail unless every file resolves to the same top folder.
        #[arg(long, conflicts_with = "root")]
        strict_root: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayVersion => e.exit(),
        Err(e) => {
            // Help exits 1 like any usage error.
            let _ = e.print();
            std::process::exit(1);
        }
    };

    logging::init(cli.log_level.as_deref());

    let client_secret = driver::resolve_resource(&cli.client_secret, cli.resources.as_deref())
        .with_context(|| format!("Failed to locate client secret {:?}", cli.client_secret))?;

    let mode = match cli.command {
        Commands::Rename { wildcard } => Mode::RenameInPlace {
            wildcard: Wildcard::parse(&wildcard),
        },
        Commands::Mirror { root, strict_root } => {
            let root = root
                .map(|r| parse_folder_ref(&r).with_context(|| format!("Invalid root folder: {}", r)))
                .transpose()?;
            Mode::Mirror { root, strict_root }
        }
    };

    let config = Config {
        principal: cli.principal,
        client_secret,
        credential_store: cli.credential_store,
        mode,
        retry: RetryPolicy {
            max_retries: cli.max_retries,
            ..RetryPolicy::default()
        },
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping before the next operation");
                cancel.cancel();
            }
        });
    }
    if let Some(secs) = cli.timeout {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!(secs, "Timeout reached, stopping before the next operation");
            cancel.cancel();
        });
    }

    let run = driver::run(&config, &cancel);
    let report = match driver::with_cancellation(run, &cancel, CANCEL_GRACE).await {
        Ok(report) => report,
        Err(DriveError::Cancelled) => {
            // A prompt may still hold stdin; leave without waiting on it.
            eprintln!("Error: {} run cancelled", config.mode.name());
            std::process::exit(1);
        }
        Err(e) => return Err(e).with_context(|| format!("{} run failed", config.mode.name())),
    };

    if report.listed == 0 {
        println!("No files found.");
        return Ok(());
    }

    if let Some(folder) = &report.backup_folder {
        println!("Backup folder: {} ({})", folder.name, folder.id);
    }
    println!("Done: {}.", report);

    if !report.failures.is_empty() {
        println!("Failed files:");
        for failure in &report.failures {
            println!("  {}\t{}\t{}", failure.id, failure.name, failure.error);
        }
    }

    let stranded: Vec<_> = report.needs_reconciliation().collect();
    if !stranded.is_empty() {
        println!(
            "{} file(s) were renamed but not copied; restore their names by hand.",
            stranded.len()
        );
    }

    Ok(())
}
