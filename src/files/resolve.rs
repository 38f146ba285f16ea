use std::path::{Component, Path, PathBuf};

/// Joins a static-route capture onto its root directory.
///
/// Returns `None` for an empty capture (which would name the directory
/// itself) and for captures that try to climb out of `root`.
pub fn resolve(root: &Path, capture: &str) -> Option<PathBuf> {
    let relative = capture.trim_matches('/');
    if relative.is_empty() {
        return None;
    }

    let relative = Path::new(relative);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return None;
    }

    Some(root.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_relative_captures() {
        assert_eq!(
            resolve(Path::new("public"), "css/site.css"),
            Some(PathBuf::from("public/css/site.css"))
        );
    }

    #[test]
    fn empty_and_escaping_captures_are_rejected() {
        assert_eq!(resolve(Path::new("public"), ""), None);
        assert_eq!(resolve(Path::new("public"), "/"), None);
        assert_eq!(resolve(Path::new("public"), "../secret"), None);
        assert_eq!(resolve(Path::new("public"), "a/../../b"), None);
    }
}
