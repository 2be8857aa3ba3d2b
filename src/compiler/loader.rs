use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};

pub const LOAD_ERROR_MESSAGE: &str = "The Sass Playground does not support loading stylesheets.";

/// Filesystem handed to grass. The playground compiles a single buffer, so
/// every resolution attempt is refused and remembered; the backend turns a
/// failed compile that touched the loader into [`LOAD_ERROR_MESSAGE`].
#[derive(Debug, Default)]
pub struct PlaygroundLoader {
    attempts: RefCell<Vec<PathBuf>>,
}

impl PlaygroundLoader {
    pub fn attempted(&self) -> bool {
        !self.attempts.borrow().is_empty()
    }

    pub fn attempts(&self) -> Vec<PathBuf> {
        self.attempts.borrow().clone()
    }

    fn record(&self, path: &Path) {
        tracing::debug!(path = %path.display(), "refused stylesheet load");
        self.attempts.borrow_mut().push(path.to_path_buf());
    }
}

impl grass::Fs for PlaygroundLoader {
    fn is_dir(&self, path: &Path) -> bool {
        self.record(path);
        false
    }

    fn is_file(&self, path: &Path) -> bool {
        self.record(path);
        false
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.record(path);
        Err(io::Error::new(io::ErrorKind::Unsupported, LOAD_ERROR_MESSAGE))
    }
}
