//! Apply manifests: the durable record of what an apply wrote.
//!
//! The presence of `scaffold_apply_<scaffold_id>.json` is the idempotency
//! guard. Manifests are published without replacement and never rewritten.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::constants::{DOC_EXT, MANIFEST_PREFIX};
use crate::fs::{node_exists, publish_new, sha256_hex_of};
use crate::types::errors::{Error, ErrorKind, Result};
use crate::types::{ApplyManifest, IntegrityReport, PlanPath, SafeId};

#[derive(Clone, Debug)]
pub struct ManifestStore {
    dir: PathBuf,
    durable: bool,
}

impl ManifestStore {
    pub fn new(dir: impl Into<PathBuf>, durable: bool) -> Self {
        Self {
            dir: dir.into(),
            durable,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic document path for `scaffold_id`.
    pub fn path_for(&self, scaffold_id: &str) -> Result<PathBuf> {
        let id = SafeId::parse(scaffold_id)?;
        Ok(self
            .dir
            .join(format!("{MANIFEST_PREFIX}{id}.{DOC_EXT}")))
    }

    /// Whether a manifest exists for `scaffold_id`. Only presence is checked.
    pub fn was_applied(&self, scaffold_id: &str) -> Result<bool> {
        Ok(node_exists(&self.path_for(scaffold_id)?))
    }

    /// Publish `manifest` and return its path.
    ///
    /// # Errors
    ///
    /// `Policy` when a manifest for the same scaffold id already exists
    /// (including one published concurrently); `Io` on any write failure.
    pub fn write(&self, manifest: &ApplyManifest) -> Result<PathBuf> {
        let path = self.path_for(&manifest.scaffold_id)?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::io(format!("create {}", self.dir.display()), &e))?;
        let doc = serde_json::to_vec_pretty(manifest)?;
        match publish_new(&path, &doc, self.durable) {
            Ok(()) => Ok(path),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(Error::new(
                ErrorKind::Policy,
                format!(
                    "manifest for scaffold {} already exists at {}",
                    manifest.scaffold_id,
                    path.display()
                ),
            )),
            Err(e) => Err(Error::io(format!("publish {}", path.display()), &e)),
        }
    }

    /// Load the manifest for `scaffold_id`, or `None` when it was never applied.
    pub fn load(&self, scaffold_id: &str) -> Result<Option<ApplyManifest>> {
        let path = self.path_for(scaffold_id)?;
        match fs::read(&path) {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(format!("read {}", path.display()), &e)),
        }
    }

    /// Re-hash every file named in `manifest` and report drift. Never corrects anything.
    pub fn validate_integrity(&self, manifest: &ApplyManifest) -> IntegrityReport {
        let mut report = IntegrityReport::default();
        for f in &manifest.files {
            let abs = match PlanPath::parse(&f.path) {
                Ok(rel) => rel.under(&manifest.target_directory),
                Err(_) => {
                    report.missing_files.push(f.path.clone());
                    continue;
                }
            };
            match sha256_hex_of(&abs) {
                Ok(h) if h == f.sha256 => {}
                Ok(_) => report.hash_mismatches.push(f.path.clone()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    report.missing_files.push(f.path.clone());
                }
                // present but unreadable content cannot be vouched for
                Err(_) => report.hash_mismatches.push(f.path.clone()),
            }
        }
        report.valid = report.missing_files.is_empty() && report.hash_mismatches.is_empty();
        report
    }
}
