//! Deciding which changed paths are worth processing
//!
//! A path passes when all of these hold:
//! 1. It is a regular file (directories and vanished paths are dropped)
//! 2. Its extension is in the configured allowlist
//! 3. It is not under a built-in ignored directory or an editor temp file
//! 4. It is not matched by the root's `.gitignore` (optional)

use anyhow::Result;
use helper_core::Config;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Component, Path, PathBuf};

/// Directories that never contain files worth annotating
const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".jj",
    ".hg",
    ".svn",
    ".ai_helper",
    "node_modules",
    "target",
    "__pycache__",
    ".venv",
    "venv",
    ".idea",
    ".tox",
    ".mypy_cache",
];

/// Path filter for one watched root
pub struct PathFilter {
    /// Watched root directory
    root: PathBuf,

    /// Extensions without the leading dot
    extensions: Vec<String>,

    /// Gitignore patterns (optional)
    gitignore: Option<Gitignore>,
}

impl PathFilter {
    /// Build the filter for `root`
    pub fn load(root: &Path, config: &Config) -> Result<Self> {
        let gitignore = if config.respect_gitignore {
            let gitignore_path = root.join(".gitignore");
            if gitignore_path.exists() {
                let mut builder = GitignoreBuilder::new(root);
                if let Some(err) = builder.add(&gitignore_path) {
                    tracing::warn!("Partially invalid .gitignore: {}", err);
                }
                Some(builder.build()?)
            } else {
                None
            }
        } else {
            None
        };

        Ok(Self {
            root: root.to_path_buf(),
            extensions: config.extensions.clone(),
            gitignore,
        })
    }

    /// Whether a change to `path` should be processed
    pub fn allows(&self, path: &Path) -> bool {
        path.is_file() && self.has_watched_extension(path) && !self.is_ignored(path)
    }

    /// Extension allowlist check only
    pub fn has_watched_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|w| w == ext))
            .unwrap_or(false)
    }

    /// Whether `path` is ignored by built-in rules or `.gitignore`.
    ///
    /// Accepts absolute paths under the root or paths relative to it.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        if is_builtin_ignored(relative) {
            return true;
        }

        if let Some(ref gitignore) = self.gitignore {
            if relative.is_relative() {
                let is_dir = self.root.join(relative).is_dir();
                if gitignore
                    .matched_path_or_any_parents(relative, is_dir)
                    .is_ignore()
                {
                    return true;
                }
            }
        }

        false
    }

    /// Whether a directory should be pruned from a tree walk
    pub fn prunes_dir(&self, dir: &Path) -> bool {
        dir != self.root && self.is_ignored(dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Built-in directory and editor temp file rules
fn is_builtin_ignored(path: &Path) -> bool {
    let in_ignored_dir = path.components().any(|c| match c {
        Component::Normal(name) => name
            .to_str()
            .map_or(false, |name| IGNORED_DIRS.contains(&name)),
        _ => false,
    });
    if in_ignored_dir {
        return true;
    }

    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    // Vim/Emacs backup files (~)
    if filename.ends_with('~') {
        return true;
    }

    // Emacs auto-save (#*#) and lock files (.#*)
    if (filename.starts_with('#') && filename.ends_with('#')) || filename.starts_with(".#") {
        return true;
    }

    // MacOS resource forks
    filename.starts_with("._")
}
