use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::errors::{Error, ErrorKind, Result};
use super::safepath::PlanPath;

/// One entry of an externally produced plan.
///
/// Paths are relative to the target directory and are validated only when the
/// plan is applied (see [`Plan::validate`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlanItem {
    Dir {
        path: String,
    },
    File {
        path: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        executable: bool,
    },
}

impl PlanItem {
    pub fn dir(path: impl Into<String>) -> Self {
        PlanItem::Dir { path: path.into() }
    }

    pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
        PlanItem::File {
            path: path.into(),
            content: content.into(),
            executable: false,
        }
    }

    pub fn executable(path: impl Into<String>, content: impl Into<String>) -> Self {
        PlanItem::File {
            path: path.into(),
            content: content.into(),
            executable: true,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            PlanItem::Dir { path } | PlanItem::File { path, .. } => path,
        }
    }
}

/// Ordered list of directories and files to materialize. Owned by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    pub items: Vec<PlanItem>,
}

impl Plan {
    pub fn new(items: Vec<PlanItem>) -> Self {
        Self { items }
    }

    pub fn files_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i, PlanItem::File { .. }))
            .count()
    }

    pub fn directories_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i, PlanItem::Dir { .. }))
            .count()
    }

    /// Validate every path and reject ambiguous plans (the same path declared
    /// twice as a file, or as both a file and a directory).
    pub fn validate(&self) -> Result<ValidatedPlan> {
        let mut dirs: Vec<PlanPath> = Vec::new();
        let mut files: Vec<PlannedFile> = Vec::new();
        let mut dir_set: BTreeSet<PlanPath> = BTreeSet::new();
        let mut file_set: BTreeSet<PlanPath> = BTreeSet::new();
        for item in &self.items {
            match item {
                PlanItem::Dir { path } => {
                    let p = PlanPath::parse(path)?;
                    if file_set.contains(&p) {
                        return Err(conflicting_kinds(&p));
                    }
                    if dir_set.insert(p.clone()) {
                        dirs.push(p);
                    }
                }
                PlanItem::File {
                    path,
                    content,
                    executable,
                } => {
                    let p = PlanPath::parse(path)?;
                    if dir_set.contains(&p) {
                        return Err(conflicting_kinds(&p));
                    }
                    if !file_set.insert(p.clone()) {
                        return Err(Error::new(
                            ErrorKind::Policy,
                            format!("plan declares file more than once: {p}"),
                        ));
                    }
                    files.push(PlannedFile {
                        path: p,
                        content: content.clone(),
                        executable: *executable,
                    });
                }
            }
        }
        // A file may not sit where another entry needs a parent directory.
        let entries = dirs.iter().chain(files.iter().map(|f| &f.path));
        for p in entries {
            if let Some(anc) = p.ancestors().into_iter().find(|a| file_set.contains(a)) {
                return Err(Error::new(
                    ErrorKind::Policy,
                    format!("plan uses file {anc} as a parent directory of {p}"),
                ));
            }
        }
        Ok(ValidatedPlan { dirs, files })
    }
}

fn conflicting_kinds(p: &PlanPath) -> Error {
    Error::new(
        ErrorKind::Policy,
        format!("plan declares {p} as both a file and a directory"),
    )
}

/// A validated file entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedFile {
    pub path: PlanPath,
    pub content: String,
    pub executable: bool,
}

/// A plan whose paths have all been checked; produced by [`Plan::validate`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidatedPlan {
    /// Plan-declared directories in declaration order (deduplicated).
    pub dirs: Vec<PlanPath>,
    /// Files in declaration order.
    pub files: Vec<PlannedFile>,
}

impl ValidatedPlan {
    /// Plan-declared directories followed by every file-parent directory not
    /// already listed, each ancestor before its descendants.
    pub fn all_dirs(&self) -> Vec<PlanPath> {
        let mut seen: BTreeSet<PlanPath> = BTreeSet::new();
        let mut out: Vec<PlanPath> = Vec::new();
        let declared = self.dirs.iter().flat_map(|d| {
            let mut chain = d.ancestors();
            chain.push(d.clone());
            chain
        });
        let parents = self.files.iter().flat_map(|f| f.path.ancestors());
        for d in declared.chain(parents) {
            if seen.insert(d.clone()) {
                out.push(d);
            }
        }
        out
    }
}
