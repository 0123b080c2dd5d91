use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{Error, ErrorKind, Result};

/// A plan-relative path that is guaranteed to stay under whatever root it is
/// joined onto: relative, non-empty, no `..`, no root or prefix components.
///
/// The stored form is normalized (`./a/./b` becomes `a/b`) and always uses `/`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlanPath {
    rel: String,
}

impl PlanPath {
    /// Validate and normalize a candidate relative path.
    pub fn parse(candidate: &str) -> Result<Self> {
        let p = Path::new(candidate);
        if p.is_absolute() {
            return Err(Error::new(
                ErrorKind::InvalidPath,
                format!("plan path must be relative: {candidate}"),
            ));
        }
        let mut parts: Vec<String> = Vec::new();
        for seg in p.components() {
            match seg {
                Component::CurDir => {}
                Component::Normal(s) => {
                    let s = s.to_str().ok_or_else(|| {
                        Error::new(ErrorKind::InvalidPath, "plan path is not valid UTF-8")
                    })?;
                    parts.push(s.to_string());
                }
                Component::ParentDir => {
                    return Err(Error::new(
                        ErrorKind::Policy,
                        format!("plan path escapes target (dotdot): {candidate}"),
                    ));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::new(
                        ErrorKind::InvalidPath,
                        format!("unsupported component in plan path: {candidate}"),
                    ));
                }
            }
        }
        if parts.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidPath,
                format!("plan path is empty: {candidate:?}"),
            ));
        }
        Ok(Self {
            rel: parts.join("/"),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.rel
    }

    /// Join onto a root directory.
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(&self.rel)
    }

    /// Every proper ancestor, outermost first: `a/b/c` yields `a`, `a/b`.
    pub fn ancestors(&self) -> Vec<PlanPath> {
        let parts: Vec<&str> = self.rel.split('/').collect();
        (1..parts.len())
            .map(|n| PlanPath {
                rel: parts[..n].join("/"),
            })
            .collect()
    }
}

impl fmt::Display for PlanPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rel)
    }
}

impl TryFrom<String> for PlanPath {
    type Error = Error;
    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<PlanPath> for String {
    fn from(p: PlanPath) -> Self {
        p.rel
    }
}

/// An identifier that is safe to embed in a single file name
/// (scaffold ids, checkpoint ids).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SafeId(String);

impl SafeId {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() || raw.len() > 200 {
            return Err(Error::new(
                ErrorKind::InvalidPath,
                format!("id must be 1..=200 characters: {raw:?}"),
            ));
        }
        if raw.starts_with('.') {
            return Err(Error::new(
                ErrorKind::InvalidPath,
                format!("id must not start with '.': {raw:?}"),
            ));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(Error::new(
                ErrorKind::InvalidPath,
                format!("id may only contain [A-Za-z0-9._-]: {raw:?}"),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SafeId {
    type Error = Error;
    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<SafeId> for String {
    fn from(id: SafeId) -> Self {
        id.0
    }
}
