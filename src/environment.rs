//! Locating a virtual environment and naming the kernel built from it.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::AddError;

/// Directory of named virtualenvs, as used by virtualenvwrapper
pub const WORKON_HOME: &str = "WORKON_HOME";

/// Appended to every kernel name so it can't collide with non-venv kernels
pub const KERNEL_SUFFIX: &str = "-venv";

/// Collects environment variables into a map, skipping any pair that is not
/// valid Unicode.
pub fn snapshot<I>(vars: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                log::debug!("Skipping non-unicode environment variable {:?}", key);
                None
            }
        })
        .collect()
}

/// Drops trailing path separators, keeping a bare root intact.
pub fn strip_trailing_separators(reference: &str) -> &str {
    let stripped = reference.trim_end_matches(std::path::is_separator);
    if stripped.is_empty() && !reference.is_empty() {
        &reference[..1]
    } else {
        stripped
    }
}

/// Finds the environment directory for `reference`.
///
/// The literal path wins. Only when it doesn't exist is the reference looked
/// up under `WORKON_HOME`.
pub fn resolve(reference: &str, os_environ: &HashMap<String, String>) -> Result<PathBuf, AddError> {
    let reference = strip_trailing_separators(reference);
    let literal = PathBuf::from(reference);
    if literal.is_dir() {
        return Ok(literal);
    }

    if let Some(workon_home) = os_environ.get(WORKON_HOME) {
        let candidate = Path::new(workon_home).join(reference);
        log::debug!("{} not found, trying {}", reference, candidate.display());
        if candidate.is_dir() {
            return Ok(candidate);
        }
    }

    Err(AddError::EnvironmentNotFound {
        reference: reference.to_string(),
    })
}

/// The interpreter inside an environment
#[cfg(not(windows))]
pub fn interpreter(environment: &Path) -> PathBuf {
    environment.join("bin").join("python")
}

#[cfg(windows)]
pub fn interpreter(environment: &Path) -> PathBuf {
    environment.join("Scripts").join("python.exe")
}

/// Where `ipykernel install --prefix <environment>` writes the kernel spec
pub fn kernel_spec_dir(environment: &Path, kernel_name: &str) -> PathBuf {
    environment
        .join("share")
        .join("jupyter")
        .join("kernels")
        .join(kernel_name)
}

/// Names handed to `ipykernel install`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelNames {
    /// `<name>-venv`, the directory name of the kernel spec
    pub kernel_name: String,
    /// Shown in Jupyter's kernel picker
    pub display_name: String,
}

impl KernelNames {
    pub fn new(name: Option<&str>, environment: &Path) -> Self {
        let env_name = match name.filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => basename(environment),
        };

        Self {
            kernel_name: format!("{env_name}{KERNEL_SUFFIX}"),
            display_name: env_name,
        }
    }
}

// `.` and `..` have no file name of their own, so ask the filesystem
fn basename(environment: &Path) -> String {
    environment
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .or_else(|| {
            environment
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        })
        .unwrap_or_else(|| environment.to_string_lossy().to_string())
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::ffi::OsString;
    use std::fs;
    use std::path::Path;

    use super::{
        KernelNames, WORKON_HOME, kernel_spec_dir, resolve, snapshot, strip_trailing_separators,
    };
    use crate::error::AddError;

    #[test]
    fn test_strip_trailing_separators() {
        assert_eq!(strip_trailing_separators("/tmp/env/"), "/tmp/env");
        assert_eq!(strip_trailing_separators("/tmp/env///"), "/tmp/env");
        assert_eq!(strip_trailing_separators("env"), "env");
        assert_eq!(strip_trailing_separators("/"), "/");
    }

    #[test]
    fn test_default_names_come_from_basename() {
        let names = KernelNames::new(None, Path::new("/tmp/x/an-awesome-env"));
        assert_eq!(names.kernel_name, "an-awesome-env-venv");
        assert_eq!(names.display_name, "an-awesome-env");
    }

    #[test]
    fn test_explicit_name_overrides_basename() {
        let names = KernelNames::new(Some("science"), Path::new("/tmp/x/an-awesome-env"));
        assert_eq!(names.kernel_name, "science-venv");
        assert_eq!(names.display_name, "science");
    }

    #[test]
    fn test_empty_name_falls_back_to_basename() {
        let names = KernelNames::new(Some(""), Path::new("/tmp/x/best-env"));
        assert_eq!(names.display_name, "best-env");
    }

    #[test]
    fn test_resolve_literal_path() {
        let dir = tempfile::tempdir().unwrap();
        let reference = format!("{}/", dir.path().display());

        let resolved = resolve(&reference, &HashMap::new()).unwrap();
        assert_eq!(resolved, dir.path());
    }

    #[test]
    fn test_resolve_under_workon_home() {
        let home = tempfile::tempdir().unwrap();
        fs::create_dir(home.path().join("best-env")).unwrap();
        let os_environ = HashMap::from([(
            WORKON_HOME.to_string(),
            home.path().display().to_string(),
        )]);

        let resolved = resolve("best-env", &os_environ).unwrap();
        assert_eq!(resolved, home.path().join("best-env"));
    }

    #[test]
    fn test_relative_path_wins_over_workon_home() {
        // Relative to the test's working directory, so the join can't collapse
        let local = tempfile::tempdir_in(".").unwrap();
        let home = tempfile::tempdir().unwrap();
        let shadow = home.path().join(local.path().file_name().unwrap());
        fs::create_dir(&shadow).unwrap();
        let os_environ = HashMap::from([(
            WORKON_HOME.to_string(),
            home.path().display().to_string(),
        )]);
        let reference = local.path().display().to_string();
        assert!(local.path().is_relative());

        let resolved = resolve(&reference, &os_environ).unwrap();
        assert_eq!(resolved, local.path());
        assert_ne!(resolved, shadow);
    }

    #[test]
    fn test_snapshot_keeps_unicode_pairs() {
        let vars = vec![
            (OsString::from(WORKON_HOME), OsString::from("/envs")),
            (OsString::from("HOME"), OsString::from("/root")),
        ];

        let map = snapshot(vars);
        assert_eq!(map.len(), 2);
        assert_eq!(map[WORKON_HOME], "/envs");
    }

    #[cfg(unix)]
    #[test]
    fn test_snapshot_skips_non_unicode_pairs() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![
            (OsString::from("UNRELATED"), OsString::from_vec(vec![0xff, 0xfe])),
            (OsString::from_vec(vec![0xff]), OsString::from("value")),
            (OsString::from(WORKON_HOME), OsString::from("/envs")),
        ];

        let map = snapshot(vars);
        assert_eq!(map.len(), 1);
        assert_eq!(map[WORKON_HOME], "/envs");
    }

    #[test]
    fn test_unresolved_reference_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-env");

        let result = resolve(&missing.display().to_string(), &HashMap::new());
        match result {
            Err(AddError::EnvironmentNotFound { reference }) => {
                assert!(reference.ends_with("no-such-env"));
            }
            other => panic!("Expected EnvironmentNotFound, got: {:?}", other),
        }
    }

    #[test]
    fn test_kernel_spec_dir_layout() {
        let dir = kernel_spec_dir(Path::new("/tmp/x/env"), "env-venv");
        assert_eq!(dir, Path::new("/tmp/x/env/share/jupyter/kernels/env-venv"));
    }
}
