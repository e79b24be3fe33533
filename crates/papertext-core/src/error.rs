//! Common error type for opening and reading archives

use std::path::PathBuf;

/// Error from opening or decoding a single archive.
///
/// `Missing` is the only recoverable kind: the archive was listed but is gone
/// by the time it is opened. Everything else is a fatal I/O or codec error.
#[derive(Debug)]
pub enum ArchiveError {
    Missing(PathBuf),
    Io(std::io::Error),
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(path) => write!(f, "File missing: {}", path.display()),
            Self::Io(e) => write!(f, "IO: {e}"),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Missing(_) => None,
            Self::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl ArchiveError {
    /// Classify an open error: `NotFound` becomes `Missing`, anything else stays fatal.
    pub fn on_open(path: &std::path::Path, e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            Self::Missing(path.to_path_buf())
        } else {
            Self::Io(e)
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use std::path::Path;

    #[test]
    fn not_found_is_missing() {
        let err = ArchiveError::on_open(
            Path::new("/data/7.json.xz"),
            std::io::Error::new(ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_missing());
        assert_eq!(format!("{err}"), "File missing: /data/7.json.xz");
    }

    #[test]
    fn permission_denied_is_fatal() {
        let err = ArchiveError::on_open(
            Path::new("/data/7.json.xz"),
            std::io::Error::new(ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_missing());
        assert!(format!("{err}").starts_with("IO:"));
    }

    #[test]
    fn from_io_error() {
        let err: ArchiveError = std::io::Error::other("codec").into();
        assert!(!err.is_missing());
        assert!(std::error::Error::source(&err).is_some());
    }
}
