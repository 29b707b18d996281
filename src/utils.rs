use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};

pub fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }

    Ok(Some(builder.build()?))
}

/// Include/exclude filter over paths relative to a scan root.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            include: build_globset(include)?,
            exclude: build_globset(exclude)?,
        })
    }

    /// No include patterns means everything is included.
    pub fn accepts(&self, relative: &Path) -> bool {
        let included = self
            .include
            .as_ref()
            .is_none_or(|set| set.is_match(relative));
        let excluded = self
            .exclude
            .as_ref()
            .is_some_and(|set| set.is_match(relative));
        included && !excluded
    }
}

/// Shorten long names for progress messages.
pub fn ellipsize(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut shortened: String = input.chars().take(keep).collect();
    shortened.push_str("...");
    shortened
}

pub fn file_hint(path: &Path) -> String {
    path.file_name()
        .and_then(|os| os.to_str())
        .map(|name| ellipsize(name, 40))
        .unwrap_or_default()
}

/// `root.join(relative)` that keeps `root` itself when `relative` is empty.
pub fn rebase(root: &Path, relative: &Path) -> PathBuf {
    if relative.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patterns_build_nothing() {
        assert!(build_globset(&[]).unwrap().is_none());
    }

    #[test]
    fn invalid_glob_is_an_error() {
        assert!(build_globset(&["[unclosed".to_string()]).is_err());
    }

    #[test]
    fn filter_combines_include_and_exclude() {
        let filter = PathFilter::new(
            &["*.bundle".to_string()],
            &["*-textassets-*".to_string()],
        )
        .unwrap();
        assert!(filter.accepts(Path::new("spine-2024-01-01.bundle")));
        assert!(!filter.accepts(Path::new("spine-2024-01-01.bundle.bak")));
        assert!(!filter.accepts(Path::new("ui-textassets-2024-01-01.bundle")));

        let everything = PathFilter::default();
        assert!(everything.accepts(Path::new("anything.bin")));
    }

    #[test]
    fn ellipsize_keeps_short_names() {
        assert_eq!(ellipsize("short", 10), "short");
        assert_eq!(ellipsize("abcdefghijkl", 8), "abcde...");
    }
}
