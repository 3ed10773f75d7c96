//! Registration of garbage-collection roots for discovered build
//! recipes.

use std::io;
use std::path::{Path, PathBuf};

/// Where to register permanent GC roots, if anywhere.
///
/// The registry directory is explicit configuration threaded through
/// the walker; when it is absent, registration is a no-op and discovery
/// proceeds (the CLI surfaces a single startup warning in that case).
#[derive(Clone, Debug, Default)]
pub struct GcRootsDir {
    dir: Option<PathBuf>,
}

impl GcRootsDir {
    pub fn new(dir: Option<PathBuf>) -> Self {
        GcRootsDir { dir }
    }

    pub fn disabled() -> Self {
        GcRootsDir { dir: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// Registers a recipe path as a permanent root, keyed by the
    /// recipe's base name. Idempotent: an existing root marker (even a
    /// dangling one) is left untouched, so recipes shared between jobs
    /// register cleanly. I/O failures are fatal to the run.
    pub fn register(&self, drv_path: &str) -> io::Result<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let Some(name) = Path::new(drv_path).file_name() else {
            return Ok(());
        };

        let root = dir.join(name);
        // symlink_metadata rather than exists(): the marker points at a
        // recipe that may not exist yet, and a dangling link still
        // counts as registered.
        if root.symlink_metadata().is_ok() {
            return Ok(());
        }
        symlink(drv_path, &root)
    }
}

#[cfg(unix)]
fn symlink(target: &str, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(target: &str, link: &Path) -> io::Result<()> {
    std::fs::write(link, target)
}
