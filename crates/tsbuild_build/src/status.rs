//! Up-to-date classification: the status sum type and the classifier.
//!
//! The classifier computes, for one parsed project, how its inputs, outputs,
//! and upstream projects relate in time. Results are memoized per project in
//! the [`SolutionBuilder`]'s status map and evicted by watch invalidation.

use std::path::PathBuf;
use std::time::SystemTime;

use tsbuild_common::{is_declaration_file, maximum_time, newer, ProjectId, MISSING_FILE_TIME};
use tsbuild_config::{output_files_for_project, ParsedProject};

use crate::builder::SolutionBuilder;
use crate::config_cache::ConfigEntry;

/// A file name paired with its modification time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileStamp {
    /// Absolute file path.
    pub path: PathBuf,
    /// Modification time at classification.
    pub time: SystemTime,
}

/// Timestamp details carried by the two up-to-date variants.
///
/// Classifier-produced statuses populate every field; the status stored
/// after a successful build only knows the declaration-change time (and
/// forces downstream reclassification through the `None`s).
#[derive(Clone, Debug, Default)]
pub struct UpToDateInfo {
    /// The newest input file and its time.
    pub newest_input: Option<FileStamp>,
    /// The oldest output file and its time.
    pub oldest_output: Option<FileStamp>,
    /// The newest output file and its time.
    pub newest_output: Option<FileStamp>,
    /// The newest time at which any declaration output's content changed.
    pub newest_declaration_change: Option<SystemTime>,
}

/// The detailed up-to-date status of one project.
#[derive(Clone, Debug)]
pub enum UpToDateStatus {
    /// The project cannot be built (missing input, configuration failure, or
    /// a failed earlier build stage).
    Unbuildable {
        /// Human-readable reason.
        reason: String,
    },
    /// The project has no outputs; it exists only to aggregate references.
    ContainerOnly,
    /// Every output is newer than every input and every upstream output.
    UpToDate(UpToDateInfo),
    /// Outputs are older than an upstream's, but the only upstream change
    /// was declaration content already reflected here; a timestamp refresh
    /// suffices.
    UpToDateWithUpstreamTypes(UpToDateInfo),
    /// An expected output does not exist.
    OutputMissing {
        /// The first missing output file.
        missing_output: PathBuf,
    },
    /// An output is older than one of the project's own inputs.
    OutOfDateWithSelf {
        /// The stale output file.
        oldest_output: PathBuf,
        /// The newer input file.
        newer_input: PathBuf,
    },
    /// An output is older than an upstream project's outputs.
    OutOfDateWithUpstream {
        /// The stale output file.
        oldest_output: PathBuf,
        /// The upstream project's configuration path.
        upstream: PathBuf,
    },
    /// An upstream project is itself out of date.
    UpstreamOutOfDate {
        /// The upstream project's configuration path.
        upstream: PathBuf,
    },
    /// An upstream project cannot be built, blocking this one.
    UpstreamBlocked {
        /// The upstream project's configuration path.
        upstream: PathBuf,
    },
}

impl UpToDateStatus {
    /// Returns `true` for the plain [`UpToDate`](Self::UpToDate) variant.
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, UpToDateStatus::UpToDate(_))
    }

    /// The newest input time, for the variants that carry one.
    pub fn newest_input_time(&self) -> Option<SystemTime> {
        match self {
            UpToDateStatus::UpToDate(info) | UpToDateStatus::UpToDateWithUpstreamTypes(info) => {
                info.newest_input.as_ref().map(|s| s.time)
            }
            _ => None,
        }
    }

    /// The newest declaration-content change time, for the variants that
    /// carry one.
    pub fn newest_declaration_change(&self) -> Option<SystemTime> {
        match self {
            UpToDateStatus::UpToDate(info) | UpToDateStatus::UpToDateWithUpstreamTypes(info) => {
                info.newest_declaration_change
            }
            _ => None,
        }
    }

    /// Renders the verbose explanation for this status of project `name`.
    pub fn explain(&self, name: &str) -> String {
        match self {
            UpToDateStatus::Unbuildable { reason } => {
                format!("Project '{name}' cannot be built: {reason}")
            }
            UpToDateStatus::ContainerOnly => {
                format!("Project '{name}' has no outputs to build")
            }
            UpToDateStatus::UpToDate(info) => match (&info.newest_input, &info.oldest_output) {
                (Some(input), Some(output)) => format!(
                    "Project '{name}' is up to date because newest input '{}' is older than oldest output '{}'",
                    input.path.display(),
                    output.path.display()
                ),
                _ => format!("Project '{name}' is up to date"),
            },
            UpToDateStatus::UpToDateWithUpstreamTypes(_) => format!(
                "Project '{name}' is up to date with declaration files from its dependencies"
            ),
            UpToDateStatus::OutputMissing { missing_output } => format!(
                "Project '{name}' is out of date because output file '{}' does not exist",
                missing_output.display()
            ),
            UpToDateStatus::OutOfDateWithSelf {
                oldest_output,
                newer_input,
            } => format!(
                "Project '{name}' is out of date because output '{}' is older than input '{}'",
                oldest_output.display(),
                newer_input.display()
            ),
            UpToDateStatus::OutOfDateWithUpstream {
                oldest_output,
                upstream,
            } => format!(
                "Project '{name}' is out of date because output '{}' is older than project '{}'",
                oldest_output.display(),
                upstream.display()
            ),
            UpToDateStatus::UpstreamOutOfDate { upstream } => format!(
                "Project '{name}' is out of date because its dependency '{}' is out of date",
                upstream.display()
            ),
            UpToDateStatus::UpstreamBlocked { upstream } => format!(
                "Project '{name}' can't be built because its dependency '{}' has errors",
                upstream.display()
            ),
        }
    }
}

impl SolutionBuilder<'_> {
    /// Returns the memoized status of a project, classifying it on miss.
    pub fn project_status(&mut self, id: ProjectId) -> UpToDateStatus {
        if let Some(status) = self.statuses.get(&id) {
            return status.clone();
        }
        let status = self.compute_status(id);
        self.statuses.insert(id, status.clone());
        status
    }

    fn compute_status(&mut self, id: ProjectId) -> UpToDateStatus {
        let project = match self.config_cache.acquire(&self.registry, id) {
            ConfigEntry::Failed(_) => {
                let path = self.registry.config_path(id);
                return UpToDateStatus::Unbuildable {
                    reason: format!("failed to read configuration {}", path.display()),
                };
            }
            ConfigEntry::Parsed(project) => project.clone(),
        };
        self.classify(&project)
    }

    /// The classifier proper: a single pass over inputs and outputs, then
    /// the upstream checks, then the priority decision.
    fn classify(&mut self, project: &ParsedProject) -> UpToDateStatus {
        let outputs = output_files_for_project(project);
        if outputs.is_empty() {
            return UpToDateStatus::ContainerOnly;
        }

        // Newest input. Any missing input makes the project unbuildable.
        let mut newest_input: Option<FileStamp> = None;
        for input in &project.file_names {
            if !self.host.file_exists(input) {
                return UpToDateStatus::Unbuildable {
                    reason: format!("{} does not exist", input.display()),
                };
            }
            let time = self.host.modified_time(input).unwrap_or(MISSING_FILE_TIME);
            if newest_input.as_ref().map_or(true, |n| time > n.time) {
                newest_input = Some(FileStamp {
                    path: input.clone(),
                    time,
                });
            }
        }

        // Output scan. A missing or stale output stops the scan but does not
        // return yet; an upstream problem has higher priority.
        let mut oldest_output: Option<FileStamp> = None;
        let mut newest_output: Option<FileStamp> = None;
        let mut missing_output: Option<PathBuf> = None;
        let mut stale_output: Option<PathBuf> = None;
        let mut newest_declaration_change: Option<SystemTime> = None;
        for output in &outputs {
            if !self.host.file_exists(output) {
                missing_output = Some(output.clone());
                break;
            }
            let time = self.host.modified_time(output).unwrap_or(MISSING_FILE_TIME);
            if oldest_output.as_ref().map_or(true, |o| time < o.time) {
                oldest_output = Some(FileStamp {
                    path: output.clone(),
                    time,
                });
            }
            if newest_output.as_ref().map_or(true, |o| time > o.time) {
                newest_output = Some(FileStamp {
                    path: output.clone(),
                    time,
                });
            }
            if is_declaration_file(output) {
                let changed = self
                    .unchanged_outputs
                    .get(output)
                    .copied()
                    .unwrap_or(time);
                newest_declaration_change =
                    Some(newest_declaration_change.map_or(changed, |c| newer(c, changed)));
            }
            // Staleness stops the scan only after this output's time has
            // entered the aggregates; the upstream checks below compare
            // against the true oldest output.
            if let Some(n) = &newest_input {
                if time < n.time {
                    stale_output = Some(output.clone());
                    break;
                }
            }
        }

        // Upstream checks. When no output time was recorded (the first
        // output was already missing), treat the oldest as infinitely new
        // so the time shortcuts keep applying.
        let oldest_output_time = oldest_output
            .as_ref()
            .map(|s| s.time)
            .unwrap_or_else(maximum_time);
        let mut pseudo_up_to_date = false;
        let mut upstream_changed: Option<PathBuf> = None;
        for reference in &project.references {
            let child = self.registry.intern_path(&reference.path);
            let ref_status = self.project_status(child);

            if matches!(ref_status, UpToDateStatus::Unbuildable { .. }) {
                return UpToDateStatus::UpstreamBlocked {
                    upstream: reference.path.clone(),
                };
            }
            if !ref_status.is_up_to_date() {
                return UpToDateStatus::UpstreamOutOfDate {
                    upstream: reference.path.clone(),
                };
            }
            // An upstream whose newest input predates our oldest output
            // cannot make us stale.
            if let Some(ref_input) = ref_status.newest_input_time() {
                if ref_input <= oldest_output_time {
                    continue;
                }
            }
            // Only declaration content changed upstream, and we built after
            // that change: a timestamp refresh is enough.
            if let Some(decl_change) = ref_status.newest_declaration_change() {
                if decl_change <= oldest_output_time {
                    pseudo_up_to_date = true;
                    upstream_changed = Some(reference.path.clone());
                    continue;
                }
            }
            return UpToDateStatus::OutOfDateWithUpstream {
                oldest_output: oldest_output
                    .as_ref()
                    .map(|s| s.path.clone())
                    .unwrap_or_default(),
                upstream: reference.path.clone(),
            };
        }

        if let Some(missing_output) = missing_output {
            return UpToDateStatus::OutputMissing { missing_output };
        }
        if let Some(stale) = stale_output {
            return UpToDateStatus::OutOfDateWithSelf {
                oldest_output: stale,
                newer_input: newest_input
                    .as_ref()
                    .map(|s| s.path.clone())
                    .unwrap_or_default(),
            };
        }
        // Prepend bundles embed upstream bytes; a timestamp touch is not
        // enough to absorb even a declaration-only upstream change.
        if pseudo_up_to_date && project.uses_prepend() {
            return UpToDateStatus::OutOfDateWithUpstream {
                oldest_output: oldest_output
                    .as_ref()
                    .map(|s| s.path.clone())
                    .unwrap_or_default(),
                upstream: upstream_changed.unwrap_or_default(),
            };
        }

        let info = UpToDateInfo {
            newest_input,
            oldest_output,
            newest_output,
            newest_declaration_change,
        };
        if pseudo_up_to_date {
            UpToDateStatus::UpToDateWithUpstreamTypes(info)
        } else {
            UpToDateStatus::UpToDate(info)
        }
    }
}
