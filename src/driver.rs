//! Orchestration of one maintenance run.

use std::env;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::Authenticator;
use crate::classify::{Classifier, Wildcard};
use crate::client::DriveClient;
use crate::credential_store::CredentialStore;
use crate::enumerator::{enumerate, SharedFilter};
use crate::error::{DriveError, Result};
use crate::executor::{mirror_folder_name, mirror_to_backup, rename_in_place, RunReport};
use crate::folder_ref::ROOT_ALIAS;
use crate::gateway::{DriveGateway, RetryPolicy, Retrying};
use crate::graph::Graph;

/// Directory searched beside the executable for relative resources.
const RESOURCE_DIR_NAME: &str = "resources";

/// Which transformation a run applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Rename foreign originals aside and copy them back under their name.
    RenameInPlace { wildcard: Wildcard },
    /// Copy foreign files into a new `Backup_<stamp>` folder.
    Mirror {
        /// Use this folder instead of discovering the top.
        root: Option<String>,
        /// Require every record to share one top.
        strict_root: bool,
    },
}

impl Mode {
    fn shared_filter(&self) -> SharedFilter {
        match self {
            Mode::RenameInPlace { .. } => SharedFilter::Exclude,
            Mode::Mirror { .. } => SharedFilter::Keep,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::RenameInPlace { .. } => "rename",
            Mode::Mirror { .. } => "mirror",
        }
    }
}

/// Validated settings for a run.
#[derive(Debug, Clone)]
pub struct Config {
    pub principal: String,
    pub client_secret: PathBuf,
    pub credential_store: PathBuf,
    pub mode: Mode,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let principal = self.principal.trim();
        if principal.is_empty() || !principal.contains('@') {
            return Err(DriveError::Config(format!(
                "Principal must be an email address, got {:?}",
                self.principal
            )));
        }
        if !self.client_secret.is_file() {
            return Err(DriveError::Config(format!(
                "Client secret {} not found",
                self.client_secret.display()
            )));
        }
        Ok(())
    }
}

/// Find a client-secret resource. Absolute paths are taken as given;
/// relative ones are looked up in `resource_dir`, then in `resources/`
/// beside the executable, then in the current directory.
pub fn resolve_resource(path: &Path, resource_dir: Option<&Path>) -> Result<PathBuf> {
    if path.is_absolute() {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(DriveError::Config(format!(
                "Resource {} not found",
                path.display()
            )))
        };
    }

    let beside_exe = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(RESOURCE_DIR_NAME)));

    let candidates = resource_dir
        .map(Path::to_path_buf)
        .into_iter()
        .chain(beside_exe)
        .chain(env::current_dir().ok())
        .map(|dir| dir.join(path));

    for candidate in candidates {
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(DriveError::Config(format!(
        "Resource {} not found in the resource directories",
        path.display()
    )))
}

/// Build the live gateway and run.
pub async fn run(config: &Config, cancel: &CancellationToken) -> Result<RunReport> {
    config.validate()?;

    let store = CredentialStore::open(&config.credential_store)?;
    let auth = Authenticator::from_file(&config.client_secret, store, config.principal.trim())?;
    let gateway = Retrying::new(DriveClient::new(auth), config.retry);

    run_with_gateway(&gateway, config, Local::now(), cancel).await
}

/// Enumerate, build the graph and dispatch to the configured mode.
///
/// `now` stamps the mirror backup folder.
pub async fn run_with_gateway<G: DriveGateway + ?Sized>(
    gateway: &G,
    config: &Config,
    now: DateTime<Local>,
    cancel: &CancellationToken,
) -> Result<RunReport> {
    info!(mode = config.mode.name(), principal = %config.principal, "Starting run");

    let snapshot = enumerate(gateway, config.mode.shared_filter(), cancel).await?;
    if snapshot.is_empty() {
        info!("No files found");
        return Ok(RunReport::default());
    }

    let graph = Graph::build(snapshot);
    if graph.is_empty() {
        info!(dropped = graph.dropped(), "No files found");
        return Ok(RunReport::default());
    }
    info!(
        records = graph.len(),
        dropped = graph.dropped(),
        backup_folders = graph.backup_folders().len(),
        "Built graph"
    );

    let mut report = match &config.mode {
        Mode::RenameInPlace { wildcard } => {
            let classifier = Classifier::new(&config.principal, wildcard.clone());
            rename_in_place(gateway, &graph, &classifier, cancel).await?
        }
        Mode::Mirror { root, strict_root } => {
            let top = match root {
                Some(root) => resolve_root(gateway, &graph, root).await?,
                None if *strict_root => graph.common_top()?,
                None => graph.top_parent()?,
            };
            info!(top = %top, "Top parent");

            let classifier = Classifier::new(&config.principal, Wildcard::default());
            let folder_name = mirror_folder_name(&now);
            mirror_to_backup(gateway, &graph, &classifier, &top, &folder_name, cancel).await?
        }
    };

    report.listed = graph.len();
    info!(%report, "Run complete");
    Ok(report)
}

/// Turn a `--root` override into a folder id present in the graph's
/// parent links. The My Drive alias is looked up, since listings carry the
/// real root id. The chain above the root must end, or the walk below it
/// would never finish.
async fn resolve_root<G: DriveGateway + ?Sized>(
    gateway: &G,
    graph: &Graph,
    root: &str,
) -> Result<String> {
    let id = if root == ROOT_ALIAS {
        let resolved = gateway.get_file(ROOT_ALIAS).await?.id;
        debug!(alias = ROOT_ALIAS, id = %resolved, "Resolved root alias");
        resolved
    } else {
        root.to_string()
    };
    graph.walk_to_top(&id)?;
    Ok(id)
}

/// Drive `work` to completion unless `cancel` fires and `work` then fails
/// to finish within `grace`. Covers awaits that never observe the token,
/// such as the consent prompt or a stalled request.
pub async fn with_cancellation<F, T>(
    work: F,
    cancel: &CancellationToken,
    grace: Duration,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        result = work => result,
        _ = async {
            cancel.cancelled().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(?grace, "Run did not stop after cancellation, abandoning it");
            Err(DriveError::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(principal: &str, client_secret: PathBuf) -> Config {
        Config {
            principal: principal.to_string(),
            client_secret,
            credential_store: PathBuf::from("unused"),
            mode: Mode::Mirror {
                root: None,
                strict_root: false,
            },
            retry: RetryPolicy::default(),
        }
    }

    #[test]
    fn test_validate_rejects_bad_principal() {
        let temp = TempDir::new().unwrap();
        let secret = temp.path().join("client_secret.json");
        fs::write(&secret, "{}").unwrap();

        assert!(config("a@x.org", secret.clone()).validate().is_ok());
        assert!(matches!(
            config("nobody", secret).validate(),
            Err(DriveError::Config(_))
        ));
    }

    #[test]
    fn test_validate_requires_client_secret() {
        let temp = TempDir::new().unwrap();
        let err = config("a@x.org", temp.path().join("missing.json"))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_resolve_resource_prefers_resource_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("client_secret.json"), "{}").unwrap();

        let resolved =
            resolve_resource(Path::new("client_secret.json"), Some(temp.path())).unwrap();
        assert_eq!(resolved, temp.path().join("client_secret.json"));
    }

    #[test]
    fn test_resolve_resource_missing() {
        let temp = TempDir::new().unwrap();
        let err = resolve_resource(Path::new("nope-7f3a.json"), Some(temp.path())).unwrap_err();
        assert!(matches!(err, DriveError::Config(_)));

        let absolute = temp.path().join("absent.json");
        assert!(resolve_resource(&absolute, None).is_err());
    }

    #[test]
    fn test_mode_shared_filter() {
        let rename = Mode::RenameInPlace {
            wildcard: Wildcard::default(),
        };
        assert_eq!(rename.shared_filter(), SharedFilter::Exclude);
        assert_eq!(rename.name(), "rename");
    }

    #[tokio::test]
    async fn test_cancellation_abandons_stuck_work() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = with_cancellation(
            std::future::pending::<Result<()>>(),
            &cancel,
            Duration::from_millis(10),
        )
        .await;
        assert!(matches!(result, Err(DriveError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellation_lets_finished_work_through() {
        let cancel = CancellationToken::new();

        let result = with_cancellation(async { Ok(7) }, &cancel, Duration::ZERO).await;
        assert_eq!(result.unwrap(), 7);
    }
}
