//! Package scanning: remote listings to download tasks

use crate::rules::PackageRule;
use crate::selector::{select_changes_since, select_snapshot};
use std::fmt;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use xfmirror_config::{AreaConfig, CategoryToggles};
use xfmirror_transport::RemoteSession;
use xfmirror_types::{DownloadTask, Error, FileCategory, Result};

/// Something worth logging about a package that is not an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanNote {
    /// The package directory is empty
    EmptyPackage,
    /// No full flag file was listed
    NoFlag,
    /// No full snapshot was found
    NoSnapshot,
    /// No change files were listed
    NoChanges,
    /// Change files exist but there is no snapshot to apply them to
    ChangesWithoutSnapshot,
}

impl fmt::Display for ScanNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::EmptyPackage => "package is empty",
            Self::NoFlag => "there is no full flag",
            Self::NoSnapshot => "there is no full snapshot",
            Self::NoChanges => "there are no change files",
            Self::ChangesWithoutSnapshot => "change files skipped, no snapshot to apply them to",
        };
        f.write_str(text)
    }
}

/// Selection result for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePlan {
    /// Rule the package was scanned under
    pub rule: PackageRule,
    /// Selected files, in emission order
    pub tasks: Vec<DownloadTask>,
    /// Informational notes
    pub notes: Vec<ScanNote>,
}

/// Turn one package listing into download tasks
///
/// Emission order is flag, snapshot parts in name order, then change files
/// in listing order. Disabled categories are left out of the tasks but
/// still take part in selection.
pub fn plan_package(
    area: &AreaConfig,
    package: &str,
    files: &[String],
    categories: &CategoryToggles,
) -> PackagePlan {
    let rule = PackageRule::for_package(area, package);
    let mut plan = PackagePlan {
        rule,
        tasks: Vec::new(),
        notes: Vec::new(),
    };

    if files.is_empty() {
        plan.notes.push(ScanNote::EmptyPackage);
        return plan;
    }

    let task = |name: &str, category| DownloadTask::new(&area.name, package, name, category);

    match rule {
        PackageRule::Config => {
            if let Some(latest) = files.iter().max() {
                if categories.config {
                    plan.tasks.push(task(latest, FileCategory::Config));
                }
            }
        }
        PackageRule::Installer => {
            if categories.installer {
                plan.tasks
                    .extend(files.iter().map(|f| task(f, FileCategory::Installer)));
            }
        }
        PackageRule::Standard(convention) => {
            match files.iter().filter(|f| convention.is_flag(f)).max() {
                Some(flag) if categories.flag => plan.tasks.push(task(flag, FileCategory::Flag)),
                Some(_) => {}
                None => plan.notes.push(ScanNote::NoFlag),
            }

            let fulls: Vec<&str> = files
                .iter()
                .map(String::as_str)
                .filter(|f| convention.is_full(f))
                .collect();
            let snapshot = select_snapshot(&fulls);
            if snapshot.is_empty() {
                plan.notes.push(ScanNote::NoSnapshot);
            } else if categories.full {
                plan.tasks
                    .extend(snapshot.iter().map(|f| task(f, FileCategory::Full)));
            }

            let changes: Vec<&str> = files
                .iter()
                .map(String::as_str)
                .filter(|f| convention.is_change(f))
                .collect();
            if changes.is_empty() {
                plan.notes.push(ScanNote::NoChanges);
            } else if snapshot.is_empty() {
                plan.notes.push(ScanNote::ChangesWithoutSnapshot);
            } else if categories.change {
                plan.tasks.extend(
                    select_changes_since(&snapshot, &changes)
                        .iter()
                        .map(|f| task(f, FileCategory::Change)),
                );
            }
        }
    }

    plan
}

/// Whether scanning may touch the local filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMode {
    /// Create each package's local directory under the destination root
    Prepare(PathBuf),
    /// Touch nothing locally
    Dry,
}

/// Result of scanning every configured area
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// All selected tasks in scan order
    pub tasks: Vec<DownloadTask>,
    /// Packages listed and planned
    pub packages_scanned: usize,
    /// Packages skipped after a listing error
    pub packages_skipped: usize,
    /// Areas missing from the remote root or not listable
    pub areas_skipped: Vec<String>,
}

/// Scans configured areas over a single session
pub struct PackageScanner<'a> {
    areas: &'a [AreaConfig],
    categories: CategoryToggles,
    mode: ScanMode,
}

impl<'a> PackageScanner<'a> {
    /// Create a new scanner
    pub fn new(areas: &'a [AreaConfig], categories: CategoryToggles, mode: ScanMode) -> Self {
        Self {
            areas,
            categories,
            mode,
        }
    }

    /// Scan every area present on the remote
    ///
    /// Only a failure to list the remote root is returned as an error.
    /// Area and package listing failures are logged and skipped.
    pub async fn scan(
        &self,
        session: &mut dyn RemoteSession,
        token: &CancellationToken,
    ) -> Result<ScanOutcome> {
        let root = session
            .list_dir("/")
            .await
            .map_err(|e| Error::connection(format!("Failed to list remote root: {}", e)))?;

        let mut outcome = ScanOutcome::default();
        for area in self.areas {
            if token.is_cancelled() {
                warn!("Scan interrupted before area {}", area.name);
                break;
            }

            if !root.iter().any(|name| name == &area.name) {
                if area.optional {
                    info!("Area {} is not present on the remote, skipping", area.name);
                } else {
                    warn!("Area {} is not present on the remote", area.name);
                }
                outcome.areas_skipped.push(area.name.clone());
                continue;
            }

            info!("Move to {}", area.name);
            let packages = match session.list_dir(&format!("/{}", area.name)).await {
                Ok(packages) => packages,
                Err(e) => {
                    warn!("Skipping area {}: {}", area.name, e);
                    outcome.areas_skipped.push(area.name.clone());
                    continue;
                }
            };

            for wanted in &area.packages {
                if !packages.contains(wanted) {
                    warn!("Package {}/{} is not present on the remote", area.name, wanted);
                }
            }

            for package in packages.iter().filter(|p| area.allows(p)) {
                if token.is_cancelled() {
                    break;
                }
                match self.scan_package(session, area, package).await {
                    Ok(plan) => {
                        outcome.packages_scanned += 1;
                        outcome.tasks.extend(plan.tasks);
                    }
                    Err(e) => {
                        warn!("Skipping package {}/{}: {}", area.name, package, e);
                        outcome.packages_skipped += 1;
                    }
                }
            }
        }

        info!(
            "File scanning done: {} tasks from {} packages ({} skipped)",
            outcome.tasks.len(),
            outcome.packages_scanned,
            outcome.packages_skipped
        );
        Ok(outcome)
    }

    /// List and plan a single package
    pub async fn scan_package(
        &self,
        session: &mut dyn RemoteSession,
        area: &AreaConfig,
        package: &str,
    ) -> Result<PackagePlan> {
        let remote_dir = format!("/{}/{}", area.name, package);
        info!("Move to {}/{}", area.name, package);

        let files = session
            .list_dir(&remote_dir)
            .await
            .map_err(|e| Error::listing(remote_dir.clone(), e.to_string()))?;

        if let ScanMode::Prepare(destination) = &self.mode {
            let local_dir = destination.join(&area.name).join(package);
            if let Err(e) = tokio::fs::create_dir_all(&local_dir).await {
                warn!("Failed to create {}: {}", local_dir.display(), e);
            }
        }

        let plan = plan_package(area, package, &files, &self.categories);
        for note in &plan.notes {
            info!("{}/{}: {}", area.name, package, note);
        }
        debug!(
            "{}/{} ({}) selected {} of {} files",
            area.name,
            package,
            plan.rule,
            plan.tasks.len(),
            files.len()
        );
        Ok(plan)
    }
}
