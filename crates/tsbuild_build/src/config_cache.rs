//! Lazy, memoizing cache of parsed project configurations.

use std::collections::HashMap;

use tsbuild_common::{absolute_path, ProjectId, ProjectRegistry};
use tsbuild_config::{load_project, ParsedProject};
use tsbuild_diagnostics::{Category, Diagnostic, DiagnosticCode};
use tsbuild_host::BuildHost;

/// Code for a root project name that resolves to no configuration file.
pub const PROJECT_NOT_FOUND: DiagnosticCode = DiagnosticCode::new(Category::Config, 103);

/// A cached configuration: either the parsed project or the single
/// unrecoverable diagnostic the parse produced.
#[derive(Debug, Clone)]
pub enum ConfigEntry {
    /// The configuration parsed successfully.
    Parsed(ParsedProject),
    /// The configuration could not be read or parsed.
    Failed(Diagnostic),
}

/// Memoizes configuration parses keyed by project identifier.
///
/// On miss the external parser runs once; whatever it produced (project or
/// fatal diagnostic) is cached until the entry is invalidated by a watch
/// event on the configuration file.
pub struct ConfigCache {
    entries: HashMap<ProjectId, ConfigEntry>,
}

impl ConfigCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the cached entry for `id`, parsing the configuration on miss.
    pub fn acquire(&mut self, registry: &ProjectRegistry, id: ProjectId) -> &ConfigEntry {
        self.entries.entry(id).or_insert_with(|| {
            match load_project(registry.config_path(id)) {
                Ok(parsed) => ConfigEntry::Parsed(parsed),
                Err(diag) => ConfigEntry::Failed(diag),
            }
        })
    }

    /// Returns the parsed project for `id`, parsing on miss; `None` if the
    /// configuration failed to parse.
    pub fn parsed(&mut self, registry: &ProjectRegistry, id: ProjectId) -> Option<&ParsedProject> {
        match self.acquire(registry, id) {
            ConfigEntry::Parsed(p) => Some(p),
            ConfigEntry::Failed(_) => None,
        }
    }

    /// Mutable access to an already-cached parsed project, for partial
    /// reloads that refresh the expanded file list in place.
    pub fn parsed_mut(&mut self, id: ProjectId) -> Option<&mut ParsedProject> {
        match self.entries.get_mut(&id) {
            Some(ConfigEntry::Parsed(p)) => Some(p),
            _ => None,
        }
    }

    /// Returns the stored parse failure for `id`, if any.
    pub fn failure(&self, id: ProjectId) -> Option<&Diagnostic> {
        match self.entries.get(&id) {
            Some(ConfigEntry::Failed(diag)) => Some(diag),
            _ => None,
        }
    }

    /// Evicts the entry for `id`; the next access re-parses.
    pub fn invalidate(&mut self, id: ProjectId) {
        self.entries.remove(&id);
    }
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves a user-typed project name to an identifier.
///
/// Accepts either a configuration file path or a project directory
/// containing `tsconfig.json`. Reports `File not found` when neither exists.
pub fn resolve_project_name(
    host: &dyn BuildHost,
    registry: &ProjectRegistry,
    name: &str,
) -> Result<ProjectId, Diagnostic> {
    let direct = absolute_path(&host.current_dir(), name);
    if host.file_exists(&direct) {
        return Ok(registry.intern(name));
    }
    let nested = direct.join("tsconfig.json");
    if host.file_exists(&nested) {
        return Ok(registry.intern_path(&nested));
    }
    Err(Diagnostic::error(
        PROJECT_NOT_FOUND,
        format!("File '{name}' not found"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;
    use tsbuild_host::SystemHost;

    fn fixture(tmp: &TempDir) -> (SystemHost, ProjectRegistry) {
        let host = SystemHost::with_current_dir(tmp.path());
        let registry = ProjectRegistry::new(
            host.current_dir(),
            host.use_case_sensitive_file_names(),
        );
        (host, registry)
    }

    #[test]
    fn acquire_parses_once_and_memoizes() {
        let tmp = TempDir::new().unwrap();
        let (_host, registry) = fixture(&tmp);
        let config = tmp.path().join("tsconfig.json");
        fs::write(&config, r#"{ "files": [] }"#).unwrap();

        let id = registry.intern_path(&config);
        let mut cache = ConfigCache::new();
        assert!(matches!(
            cache.acquire(&registry, id),
            ConfigEntry::Parsed(_)
        ));

        // Delete the file; the memoized entry must still answer.
        fs::remove_file(&config).unwrap();
        assert!(cache.parsed(&registry, id).is_some());
    }

    #[test]
    fn parse_failure_cached_and_retrievable() {
        let tmp = TempDir::new().unwrap();
        let (_host, registry) = fixture(&tmp);
        let config = tmp.path().join("tsconfig.json");
        fs::write(&config, "{ broken").unwrap();

        let id = registry.intern_path(&config);
        let mut cache = ConfigCache::new();
        assert!(cache.parsed(&registry, id).is_none());
        assert!(cache.failure(id).is_some());
    }

    #[test]
    fn invalidate_forces_reparse() {
        let tmp = TempDir::new().unwrap();
        let (_host, registry) = fixture(&tmp);
        let config = tmp.path().join("tsconfig.json");
        fs::write(&config, "{ broken").unwrap();

        let id = registry.intern_path(&config);
        let mut cache = ConfigCache::new();
        assert!(cache.parsed(&registry, id).is_none());

        fs::write(&config, r#"{ "files": [] }"#).unwrap();
        cache.invalidate(id);
        assert!(cache.parsed(&registry, id).is_some());
        assert!(cache.failure(id).is_none());
    }

    #[test]
    fn resolve_direct_config_file() {
        let tmp = TempDir::new().unwrap();
        let (host, registry) = fixture(&tmp);
        fs::write(tmp.path().join("tsconfig.json"), "{}").unwrap();

        let id = resolve_project_name(&host, &registry, "tsconfig.json").unwrap();
        assert!(registry
            .config_path(id)
            .ends_with(Path::new("tsconfig.json")));
    }

    #[test]
    fn resolve_project_directory() {
        let tmp = TempDir::new().unwrap();
        let (host, registry) = fixture(&tmp);
        fs::create_dir_all(tmp.path().join("core")).unwrap();
        fs::write(tmp.path().join("core/tsconfig.json"), "{}").unwrap();

        let id = resolve_project_name(&host, &registry, "core").unwrap();
        assert!(registry
            .config_path(id)
            .ends_with(Path::new("core/tsconfig.json")));
    }

    #[test]
    fn resolve_missing_reports_not_found() {
        let tmp = TempDir::new().unwrap();
        let (host, registry) = fixture(&tmp);
        let err = resolve_project_name(&host, &registry, "nope").unwrap_err();
        assert_eq!(err.code, PROJECT_NOT_FOUND);
        assert_eq!(err.message, "File 'nope' not found");
    }

    #[test]
    fn two_spellings_share_an_entry() {
        let tmp = TempDir::new().unwrap();
        let (host, registry) = fixture(&tmp);
        fs::create_dir_all(tmp.path().join("core")).unwrap();
        fs::write(tmp.path().join("core/tsconfig.json"), "{}").unwrap();

        let a = resolve_project_name(&host, &registry, "core").unwrap();
        let b = resolve_project_name(&host, &registry, "./core/tsconfig.json").unwrap();
        assert_eq!(a, b);
    }
}
