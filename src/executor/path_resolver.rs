use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Regular file with at least one execute bit set.
pub fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

pub struct PathResolver;

impl PathResolver {
    /// Finds `command` on `search_path`, first match wins. Names containing a
    /// slash are taken as paths and only checked for executability.
    pub fn resolve(&self, command: &str, search_path: &[PathBuf]) -> Option<PathBuf> {
        if command.is_empty() {
            return None;
        }
        if command.contains('/') {
            let path = Path::new(command);
            return is_executable(path).then(|| path.to_path_buf());
        }

        search_path
            .iter()
            .map(|dir| dir.join(command))
            .find(|candidate| is_executable(candidate))
    }
}
