//! Helpers for archive paths.

/// Paths requested for one restore.
///
/// Converts from a single path or from any list of paths, so callers can
/// pass either. Backslashes are normalized to forward slashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePaths(Vec<String>);

impl FilePaths {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            paths
                .into_iter()
                .map(|p| normalize_separators(p.as_ref()))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for FilePaths {
    fn from(path: &str) -> Self {
        Self::new([path])
    }
}

impl From<String> for FilePaths {
    fn from(path: String) -> Self {
        Self::new([path])
    }
}

impl From<&String> for FilePaths {
    fn from(path: &String) -> Self {
        Self::new([path])
    }
}

impl<S: AsRef<str>> From<Vec<S>> for FilePaths {
    fn from(paths: Vec<S>) -> Self {
        Self::new(paths)
    }
}

impl<S: AsRef<str>> From<&[S]> for FilePaths {
    fn from(paths: &[S]) -> Self {
        Self::new(paths)
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for FilePaths {
    fn from(paths: [S; N]) -> Self {
        Self::new(paths)
    }
}

/// Replace Windows separators with forward slashes.
pub(crate) fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Join `segment` onto `base` the way posix paths join.
///
/// An absolute segment replaces the base.
pub(crate) fn posix_join(base: &str, segment: &str) -> String {
    if segment.starts_with('/') || base.is_empty() {
        segment.to_string()
    } else if base.ends_with('/') {
        format!("{}{}", base, segment)
    } else {
        format!("{}/{}", base, segment)
    }
}
