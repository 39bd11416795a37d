use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::foundation::error::{ViewerError, ViewerResult};

/// Which of a node's two assets an operation concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    /// The node's image.
    Image,
    /// The node's sound.
    Audio,
}

impl AssetKind {
    /// Both kinds, in the order they are loaded and reported.
    pub const ALL: [AssetKind; 2] = [AssetKind::Image, AssetKind::Audio];

    /// Subdirectory of the asset root holding files of this kind.
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetKind::Image => "images",
            AssetKind::Audio => "sounds",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Image => f.write_str("image"),
            AssetKind::Audio => f.write_str("audio"),
        }
    }
}

/// Where raw asset bytes come from.
///
/// Implementations are called from loader worker threads.
pub trait AssetSource: Send + Sync + 'static {
    /// Fetch the undecoded bytes of `file_name`.
    fn fetch(&self, kind: AssetKind, file_name: &str) -> anyhow::Result<Vec<u8>>;
}

/// Reads `images/<file>` and `sounds/<file>` below a root directory.
#[derive(Clone, Debug)]
pub struct DirAssetSource {
    root: PathBuf,
}

impl DirAssetSource {
    /// Source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory used when resolving file names.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of an asset file.
    pub fn path_for(&self, kind: AssetKind, file_name: &str) -> ViewerResult<PathBuf> {
        let norm = normalize_rel_path(file_name)?;
        Ok(self.root.join(kind.dir_name()).join(Path::new(&norm)))
    }
}

impl AssetSource for DirAssetSource {
    fn fetch(&self, kind: AssetKind, file_name: &str) -> anyhow::Result<Vec<u8>> {
        let path = self.path_for(kind, file_name)?;
        std::fs::read(&path).with_context(|| format!("read {kind} bytes from '{}'", path.display()))
    }
}

/// Normalize and validate asset-relative file names.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> ViewerResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ViewerError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(ViewerError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ViewerError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ViewerError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
