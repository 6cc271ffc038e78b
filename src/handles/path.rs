//! Canonical lock-registry keys.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` to the key every lock registry uses for it.
///
/// The path is made absolute, the deepest existing ancestor is resolved
/// through symlinks, and the remaining components are normalized lexically.
/// Two spellings of the same file (relative vs absolute, `./`, `..`, a
/// symlinked directory) produce the same key even before the file exists.
///
/// Falls back to the path as given if the current directory is unavailable.
pub fn canonical_path(path: &Path) -> PathBuf {
    let absolute = match std::path::absolute(path) {
        Ok(absolute) => absolute,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "could not make path absolute");
            return path.to_path_buf();
        }
    };

    let components: Vec<Component<'_>> = absolute.components().collect();

    for split in (1..=components.len()).rev() {
        let prefix: PathBuf = components[..split].iter().collect();
        if let Ok(mut resolved) = prefix.canonicalize() {
            for component in &components[split..] {
                push_lexical(&mut resolved, component);
            }
            return resolved;
        }
    }

    let mut resolved = PathBuf::new();
    for component in &components {
        push_lexical(&mut resolved, component);
    }
    resolved
}

fn push_lexical(path: &mut PathBuf, component: &Component<'_>) {
    match component {
        Component::CurDir => {}
        Component::ParentDir => {
            path.pop();
        }
        other => path.push(other.as_os_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn existing_file_resolves_to_canonical_form() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("state.json");
        fs::write(&file, "{}").unwrap();

        assert_eq!(canonical_path(&file), file.canonicalize().unwrap());
    }

    #[test]
    fn missing_file_keeps_resolved_parent() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();

        let spelled = temp_dir.path().join("sub").join("..").join("./new.json");
        assert_eq!(canonical_path(&spelled), root.join("new.json"));
    }

    #[test]
    fn different_spellings_share_one_key() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("data")).unwrap();

        let direct = temp_dir.path().join("data").join("a.json");
        let roundabout = temp_dir.path().join("data").join(".").join("a.json");
        assert_eq!(canonical_path(&direct), canonical_path(&roundabout));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_resolves_to_target() {
        let temp_dir = TempDir::new().unwrap();
        let real = temp_dir.path().join("real");
        fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, temp_dir.path().join("link")).unwrap();

        assert_eq!(
            canonical_path(&temp_dir.path().join("link").join("a.json")),
            canonical_path(&real.join("a.json"))
        );
    }

    #[test]
    fn result_is_absolute() {
        assert!(canonical_path(Path::new("relative/file.txt")).is_absolute());
    }
}
