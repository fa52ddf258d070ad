use super::error::Result;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Create parent directories for a path when missing.
pub fn make_parent_dirs<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Detect whether a path uses a gzip-compatible extension.
pub fn is_gzipped<P: AsRef<Path>>(path: P) -> bool {
    matches!(
        path.as_ref().extension().unwrap_or_else(|| OsStr::new("")),
        ext if ext == "gz" || ext == "gzip" || ext == "bgzf"
    )
}

/// Ensure an output path ends with a gzip-compatible extension.
///
/// Paths already ending in `.gz`, `.gzip`, or `.bgzf` are returned unchanged;
/// otherwise `.gz` is appended to the file name.
pub fn ensure_gz_path(path: &Path) -> PathBuf {
    if is_gzipped(path) {
        return path.to_path_buf();
    }

    let mut adjusted = path.to_path_buf();
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        adjusted.set_file_name(format!("{}.gz", name));
    } else {
        adjusted.set_extension("gz");
    }
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gz_suffix_is_appended_once() {
        assert_eq!(
            ensure_gz_path(Path::new("out/sample.vcf")),
            PathBuf::from("out/sample.vcf.gz")
        );
        assert_eq!(
            ensure_gz_path(Path::new("out/sample.vcf.gz")),
            PathBuf::from("out/sample.vcf.gz")
        );
    }

    #[test]
    fn creates_missing_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("file.txt");
        make_parent_dirs(&nested).unwrap();
        assert!(nested.parent().unwrap().is_dir());
    }
}
