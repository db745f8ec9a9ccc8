//! Expansion of command line paths into feature file paths.

use std::path::{Path, PathBuf};

use karma_bdd::runner::is_feature_file;
use walkdir::WalkDir;

/// Expand directories into the `.feature` files beneath them.
///
/// File arguments are passed through untouched so the runner can decide
/// whether they are features. Files found under a directory are sorted.
pub(crate) fn expand_paths(paths: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let mut expanded = Vec::new();
    for path in paths {
        if path.is_dir() {
            expanded.extend(collect_feature_files(path)?);
        } else {
            expanded.push(path.clone());
        }
    }
    Ok(expanded)
}

fn collect_feature_files(base: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(base).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.loop_ancestor().is_some() => continue,
            Err(err) => {
                let message = err.to_string();
                return Err(err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other(message)));
            }
        };
        if entry.file_type().is_file() && is_feature_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    tracing::debug!(count = files.len(), base = %base.display(), "discovered features");
    Ok(files)
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn directories_expand_recursively_and_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).expect("create nested");
        fs::write(nested.join("b.feature"), "").expect("write b");
        fs::write(dir.path().join("a.feature"), "").expect("write a");
        fs::write(dir.path().join("steps.rs"), "").expect("write steps");

        let expanded = expand_paths(&[dir.path().to_path_buf()]).expect("expand");
        assert_eq!(
            expanded,
            [dir.path().join("a.feature"), nested.join("b.feature")]
        );
    }

    #[test]
    fn files_pass_through_untouched() {
        let paths = [PathBuf::from("karma.conf.js")];
        let expanded = expand_paths(&paths).expect("expand");
        assert_eq!(expanded, paths);
    }
}
