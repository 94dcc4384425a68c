//! Manifest persistence and recovery.

use super::{json_depth, BackReference, Manifest, ManifestTemplate};
use crate::config::PipelineConfig;
use crate::context::RunContext;
use crate::errors::ManifestError;
use crate::incidents::{codes, IncidentReport};
use crate::stages::StageDefinition;
use crate::utils::{now_utc, sortable_timestamp};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Creates, saves and recovers manifests.
///
/// Every failure is registered as an incident on the run context; no
/// operation returns an error, and nothing here raises a Fatal incident.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    dir: PathBuf,
    max_age: Duration,
    max_depth: usize,
    templates: HashMap<String, ManifestTemplate>,
}

impl ManifestStore {
    /// Creates a store over `dir` with default limits (24 hours, depth 32).
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_age: Duration::from_secs(24 * 3600),
            max_depth: 32,
            templates: HashMap::new(),
        }
    }

    /// Creates a store from the pipeline configuration.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            dir: config.manifest_dir.clone(),
            max_age: config.max_manifest_age(),
            max_depth: config.max_json_depth,
            templates: config.manifest_templates.clone(),
        }
    }

    /// Sets the maximum age of discoverable manifests.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Sets the maximum nesting depth of saved manifests.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the manifest directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads the input manifest of the active stage.
    ///
    /// Returns `None` if no stage is active, the stage declares no input, or
    /// nothing usable was found.
    pub fn get(&self, ctx: &mut RunContext, explicit_path: Option<&Path>) -> Option<Manifest> {
        let manifest_type = ctx.current_stage()?.input_from.clone()?;
        self.find(ctx, &manifest_type, explicit_path)
    }

    /// Finds the latest manifest of `manifest_type`.
    ///
    /// Lookup order: the in-memory cache, then `explicit_path`, then the
    /// newest file named `<Type>_*` in the manifest directory that is
    /// younger than the maximum age. Unreadable or mismatched candidates are
    /// reported and skipped. Loaded manifests are cached.
    pub fn find(
        &self,
        ctx: &mut RunContext,
        manifest_type: &str,
        explicit_path: Option<&Path>,
    ) -> Option<Manifest> {
        if let Some(cached) = ctx.cached_manifest(manifest_type) {
            debug!(manifest_type, "Manifest served from cache");
            return Some(cached.clone());
        }

        let found = explicit_path
            .and_then(|path| self.load_reporting(ctx, path, manifest_type))
            .or_else(|| self.discover(ctx, manifest_type))?;

        ctx.register(
            IncidentReport::code(codes::MANIFEST_LOADED)
                .with_detail(found.save_name.clone().unwrap_or_default())
                .with_context_entry("type", manifest_type),
        );
        ctx.manifests
            .insert(manifest_type.to_string(), found.clone());
        Some(found)
    }

    /// Creates the output manifest skeleton for `definition`.
    #[must_use]
    pub fn create(&self, ctx: &RunContext, definition: &StageDefinition) -> Manifest {
        let manifest_type = definition.output_type();
        let mut manifest = Manifest::new(manifest_type);
        if let Some(template) = self.templates.get(manifest_type) {
            manifest = manifest.with_template(template);
        }
        manifest.input_manifest = ctx.manifest_in().and_then(|m| m.save_name.clone());
        manifest.save_path = Some(self.dir.clone());
        manifest
    }

    /// Persists `manifest` as `<Type>_<yyyyMMdd_HHmmss>.json`.
    ///
    /// An empty type is replaced by the active stage's name. On success the
    /// manifest's `SaveName` and `SavePath` are set and the file path is
    /// returned.
    pub fn save(&self, ctx: &mut RunContext, manifest: &mut Manifest) -> Option<PathBuf> {
        if manifest.manifest_type.is_empty() {
            manifest.manifest_type = ctx.producing_stage_name();
        }
        let removed = manifest.strip_back_references();
        if removed > 0 {
            debug!(manifest_type = %manifest.manifest_type, removed, "Stripped back-references");
        }

        match self.write(manifest) {
            Ok(path) => {
                ctx.register(
                    IncidentReport::code(codes::MANIFEST_SAVED)
                        .with_detail(path.display().to_string())
                        .with_context_entry("type", manifest.manifest_type.as_str()),
                );
                Some(path)
            }
            Err(err @ ManifestError::DepthExceeded { .. }) => {
                ctx.register(
                    IncidentReport::code(codes::MANIFEST_DEPTH_EXCEEDED)
                        .with_detail(err.to_string())
                        .with_context_entry("type", manifest.manifest_type.as_str()),
                );
                None
            }
            Err(err) => {
                ctx.register(
                    IncidentReport::code(codes::MANIFEST_SAVE_FAILED)
                        .with_detail(err.to_string())
                        .with_context_entry("type", manifest.manifest_type.as_str()),
                );
                None
            }
        }
    }

    fn write(&self, manifest: &mut Manifest) -> Result<PathBuf, ManifestError> {
        let serialize_error = |source| ManifestError::Serialize {
            manifest_type: manifest.manifest_type.clone(),
            source,
        };

        let depth = json_depth(&serde_json::to_value(&*manifest).map_err(serialize_error)?);
        if depth > self.max_depth {
            return Err(ManifestError::DepthExceeded {
                manifest_type: manifest.manifest_type.clone(),
                depth,
                limit: self.max_depth,
            });
        }

        let save_name = format!(
            "{}_{}",
            manifest.manifest_type,
            sortable_timestamp(&now_utc())
        );
        let path = self.dir.join(format!("{save_name}.json"));
        let mut document = manifest.clone();
        document.save_name = Some(save_name);
        document.save_path = Some(self.dir.clone());

        let text = serde_json::to_string_pretty(&document).map_err(|source| {
            ManifestError::Serialize {
                manifest_type: document.manifest_type.clone(),
                source,
            }
        })?;
        std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::write(&path, text))
            .map_err(|source| ManifestError::Write {
                path: path.clone(),
                source,
            })?;

        *manifest = document;
        Ok(path)
    }

    fn load_reporting(
        &self,
        ctx: &mut RunContext,
        path: &Path,
        manifest_type: &str,
    ) -> Option<Manifest> {
        match Self::read(path, manifest_type) {
            Ok(manifest) => Some(manifest),
            Err(err) => {
                report_read_error(ctx, &err);
                None
            }
        }
    }

    fn discover(&self, ctx: &mut RunContext, manifest_type: &str) -> Option<Manifest> {
        let candidates = match self.candidates(manifest_type) {
            Ok(candidates) => candidates,
            Err(err) => {
                report_read_error(ctx, &err);
                return None;
            }
        };

        let now = SystemTime::now();
        let (fresh, stale): (Vec<_>, Vec<_>) = candidates.into_iter().partition(|(_, modified)| {
            now.duration_since(*modified).unwrap_or(Duration::ZERO) <= self.max_age
        });
        if !stale.is_empty() {
            ctx.register(
                IncidentReport::code(codes::MANIFEST_STALE)
                    .with_detail(format!(
                        "{} '{manifest_type}' manifest(s) older than {} hours ignored",
                        stale.len(),
                        self.max_age.as_secs() / 3600
                    ))
                    .with_context_entry("type", manifest_type),
            );
        }

        fresh
            .into_iter()
            .find_map(|(path, _)| self.load_reporting(ctx, &path, manifest_type))
    }

    /// Lists `<Type>_*.json` files, newest first.
    fn candidates(&self, manifest_type: &str) -> Result<Vec<(PathBuf, SystemTime)>, ManifestError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ManifestError::ListDir {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let prefix = Manifest::file_prefix(manifest_type);
        let mut candidates: Vec<(PathBuf, SystemTime)> = entries
            .filter_map(Result::ok)
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with(&prefix)
                    && Path::new(name.as_ref())
                        .extension()
                        .is_some_and(|ext| ext == "json")
            })
            .filter_map(|entry| {
                let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
                Some((entry.path(), modified))
            })
            .collect();

        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(candidates)
    }

    fn read(path: &Path, expected_type: &str) -> Result<Manifest, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Manifest =
            serde_json::from_str(&text).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if manifest.manifest_type != expected_type {
            return Err(ManifestError::TypeMismatch {
                path: path.to_path_buf(),
                expected: expected_type.to_string(),
                found: manifest.manifest_type,
            });
        }
        Ok(manifest)
    }
}

fn report_read_error(ctx: &mut RunContext, err: &ManifestError) {
    let code = match err {
        ManifestError::Read { .. } => codes::MANIFEST_READ_FAILED,
        ManifestError::Parse { .. } => codes::MANIFEST_PARSE_FAILED,
        ManifestError::TypeMismatch { .. } => codes::MANIFEST_TYPE_MISMATCH,
        ManifestError::ListDir { .. } => codes::MANIFEST_DIR_UNREADABLE,
        ManifestError::DepthExceeded { .. } => codes::MANIFEST_DEPTH_EXCEEDED,
        ManifestError::Serialize { .. } | ManifestError::Write { .. } => {
            codes::MANIFEST_SAVE_FAILED
        }
    };
    ctx.register(IncidentReport::code(code).with_detail(err.to_string()));
}
