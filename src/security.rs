// src/security.rs
use path_absolutize::Absolutize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// `candidate` がプロジェクトルート `root` の内側にあるかを判定する。
///
/// 1. 両方を字句的に絶対パス化し、`root` と一致するか `root` 配下かを比べる
///    (`../` での脱出や `/a/project-secret` のような前方一致を弾く)
/// 2. ディスク上に存在する一番近い祖先をシンボリックリンク解決して、同じ比較をもう一度行う
///
/// 物理パスの解決に失敗した場合は内側とみなさない。
pub fn is_contained(candidate: &Path, root: &Path) -> bool {
    let (Ok(candidate), Ok(root)) = (candidate.absolutize(), root.absolutize()) else {
        return false;
    };
    if !is_within(&candidate, &root) {
        return false;
    }
    is_physically_within(&candidate, &root)
}

/// 判定に通れば字句的に正規化した絶対パスを返す
pub fn ensure_contained(candidate: &Path, root: &Path) -> Result<PathBuf> {
    if !is_contained(candidate, root) {
        return Err(Error::SecurityViolation(candidate.to_path_buf()));
    }
    Ok(candidate.absolutize()?.to_path_buf())
}

// Path::starts_with はコンポーネント単位で比較する
fn is_within(candidate: &Path, root: &Path) -> bool {
    candidate == root || candidate.starts_with(root)
}

fn is_physically_within(candidate: &Path, root: &Path) -> bool {
    // 壊れたリンクも「存在する」側に数えるため symlink_metadata を使う
    let Some(existing) = candidate
        .ancestors()
        .find(|p| fs::symlink_metadata(p).is_ok())
    else {
        return false;
    };
    match (fs::canonicalize(existing), fs::canonicalize(root)) {
        (Ok(physical), Ok(physical_root)) => is_within(&physical, &physical_root),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("project");
        fs::create_dir_all(root.join("src")).unwrap();
        (dir, root)
    }

    #[test]
    fn accepts_root_and_children() {
        let (_dir, root) = project();
        assert!(is_contained(&root, &root));
        assert!(is_contained(&root.join("src"), &root));
        assert!(is_contained(&root.join("src/app.routes.ts"), &root));
    }

    #[test]
    fn rejects_parent_traversal() {
        let (_dir, root) = project();
        assert!(!is_contained(&root.join("../secret.txt"), &root));
        assert!(!is_contained(&root.join("src/../../etc/passwd"), &root));
    }

    #[test]
    fn accepts_traversal_that_stays_inside() {
        let (_dir, root) = project();
        assert!(is_contained(&root.join("src/../src/main.ts"), &root));
    }

    #[test]
    fn rejects_sibling_prefix_collision() {
        let (dir, root) = project();
        let sibling = dir.path().join("project-secret");
        fs::create_dir_all(&sibling).unwrap();
        assert!(!is_contained(&sibling.join("x"), &root));
        assert!(!is_contained(&root.join("../project-secret/x"), &root));
    }

    #[test]
    fn rejects_absolute_outside_path() {
        let (_dir, root) = project();
        assert!(!is_contained(Path::new("/etc/passwd"), &root));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlink_pointing_outside() {
        let (dir, root) = project();
        let outside = dir.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("secret.txt"), "secret").unwrap();

        let link = root.join("link-to-secret.txt");
        std::os::unix::fs::symlink(outside.join("secret.txt"), &link).unwrap();
        assert!(!is_contained(&link, &root));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_missing_file_below_symlinked_directory() {
        let (dir, root) = project();
        let outside = dir.path().join("outside");
        fs::create_dir_all(&outside).unwrap();

        let link = root.join("linked");
        std::os::unix::fs::symlink(&outside, &link).unwrap();
        assert!(!is_contained(&link.join("not-yet.ts"), &root));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_broken_symlink() {
        let (dir, root) = project();
        let link = root.join("dangling");
        std::os::unix::fs::symlink(dir.path().join("gone"), &link).unwrap();
        assert!(!is_contained(&link, &root));
    }

    #[cfg(unix)]
    #[test]
    fn accepts_symlink_that_stays_inside() {
        let (_dir, root) = project();
        fs::write(root.join("src/real.ts"), "").unwrap();
        let link = root.join("alias.ts");
        std::os::unix::fs::symlink(root.join("src/real.ts"), &link).unwrap();
        assert!(is_contained(&link, &root));
    }

    #[test]
    fn ensure_contained_reports_violation() {
        let (_dir, root) = project();
        let err = ensure_contained(&root.join("../secret"), &root).unwrap_err();
        assert!(matches!(err, Error::SecurityViolation(_)));
    }
}
