//! Checks that src/ and tests/unit/ mirror each other and that test files hold tests

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::{Path, PathBuf};
    use walkdir::WalkDir;

    const SRC_DIR: &str = "src";
    const UNIT_DIR: &str = "tests/unit";
    const TESTS_DIR: &str = "tests";

    /// Rust files and directories under `root`, relative to it
    fn mirror_entries(root: &Path) -> BTreeSet<PathBuf> {
        WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| {
                entry.file_type().is_dir()
                    || entry.path().extension().is_some_and(|ext| ext == "rs")
            })
            .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
            .collect()
    }

    // Module wiring and entry points carry no logic of their own
    fn is_wiring(relative: &Path) -> bool {
        relative
            .file_name()
            .is_some_and(|name| name == "mod.rs" || name == "main.rs" || name == "lib.rs")
    }

    fn report(title: &str, entries: &[&PathBuf]) -> String {
        let lines: Vec<String> = entries
            .iter()
            .map(|entry| format!("  - {}", entry.display()))
            .collect();
        format!("{title}:\n{}", lines.join("\n"))
    }

    // Tests that every source file has a unit test file at the same relative path
    #[test]
    fn test_all_src_files_have_unit_tests() {
        let src = mirror_entries(Path::new(SRC_DIR));
        let unit = mirror_entries(Path::new(UNIT_DIR));
        assert!(!src.is_empty(), "No sources found under {SRC_DIR}");

        let missing: Vec<&PathBuf> = src
            .iter()
            .filter(|path| !is_wiring(path) && !unit.contains(*path))
            .collect();

        assert!(
            missing.is_empty(),
            "{}",
            report("Source entries without a tests/unit counterpart", &missing)
        );
    }

    // Tests that no unit test file outlives the source it covered
    #[test]
    fn test_all_unit_tests_have_src_counterparts() {
        let src = mirror_entries(Path::new(SRC_DIR));
        let unit = mirror_entries(Path::new(UNIT_DIR));

        let orphaned: Vec<&PathBuf> = unit
            .iter()
            .filter(|path| !is_wiring(path) && !src.contains(*path))
            .collect();

        assert!(
            orphaned.is_empty(),
            "{}",
            report("Unit test entries without a src counterpart", &orphaned)
        );
    }

    // A top-level file whose stem names a sibling directory only declares modules
    fn is_harness_root(path: &Path) -> bool {
        path.parent() == Some(Path::new(TESTS_DIR)) && path.with_extension("").is_dir()
    }

    // Tests that every test file other than module wiring declares a #[test]
    #[test]
    fn test_all_test_files_contain_tests() {
        let empty: Vec<PathBuf> = WalkDir::new(TESTS_DIR)
            .into_iter()
            .filter_map(Result::ok)
            .map(walkdir::DirEntry::into_path)
            .filter(|path| path.extension().is_some_and(|ext| ext == "rs"))
            .filter(|path| !is_harness_root(path) && !is_wiring(path))
            .filter(|path| {
                fs::read_to_string(path).is_ok_and(|content| !content.contains("#[test]"))
            })
            .collect();

        assert!(
            empty.is_empty(),
            "{}",
            report(
                "Test files without any #[test] function",
                &empty.iter().collect::<Vec<_>>()
            )
        );
    }
}
