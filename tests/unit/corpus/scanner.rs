//! Tests for annotation discovery and per-file label records

#[cfg(test)]
mod tests {
    use labeldup::corpus::scanner::{AnnotationRecord, CorpusScanner, is_annotation};
    use labeldup::io::error::ErrorCategory;
    use labeldup::ReplicationError;
    use serde_json::json;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_annotation(dir: &Path, stem: &str, labels: &[&str]) -> PathBuf {
        let shapes: Vec<_> = labels
            .iter()
            .map(|label| json!({"label": label, "points": [[0.0, 0.0], [4.0, 4.0]], "shape_type": "rectangle"}))
            .collect();
        let document = json!({"version": "5.2.1", "shapes": shapes, "imagePath": format!("{stem}.jpg")});
        let path = dir.join(format!("{stem}.json"));
        fs::write(&path, serde_json::to_vec_pretty(&document).unwrap()).unwrap();
        path
    }

    // Tests that a missing root is a config error raised before scanning
    #[test]
    fn test_missing_root_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let err = CorpusScanner::new(temp_dir.path().join("absent")).unwrap_err();

        assert!(matches!(err, ReplicationError::MissingRoot { .. }));
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    // Tests that a regular file is not accepted as a corpus root
    #[test]
    fn test_file_root_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file = write_annotation(temp_dir.path(), "a", &["cat"]);

        assert!(CorpusScanner::new(file).is_err());
    }

    // Tests recursive discovery in sorted order, ignoring non-annotation files
    #[test]
    fn test_annotation_paths_recursive_and_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("b_dir").join("deeper");
        fs::create_dir_all(&nested).unwrap();

        write_annotation(temp_dir.path(), "z", &["cat"]);
        write_annotation(temp_dir.path(), "a", &["cat"]);
        write_annotation(&nested, "m", &["dog"]);
        fs::write(temp_dir.path().join("a.jpg"), b"img").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"x").unwrap();

        let scanner = CorpusScanner::new(temp_dir.path()).unwrap();
        let names: Vec<String> = scanner
            .annotation_paths()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.json", "m.json", "z.json"]);
    }

    // Tests that the path sequence can be restarted from scratch
    #[test]
    fn test_annotation_paths_restartable() {
        let temp_dir = TempDir::new().unwrap();
        write_annotation(temp_dir.path(), "a", &["cat"]);
        let scanner = CorpusScanner::new(temp_dir.path()).unwrap();

        assert_eq!(scanner.annotation_paths().count(), 1);

        write_annotation(temp_dir.path(), "b", &["cat"]);
        assert_eq!(scanner.annotation_paths().count(), 2);
    }

    // Tests that upper-case extensions are discovered too
    #[test]
    fn test_is_annotation_case_insensitive() {
        assert!(is_annotation(Path::new("x/a.json")));
        assert!(is_annotation(Path::new("x/a.JSON")));
        assert!(!is_annotation(Path::new("x/a.jpg")));
        assert!(!is_annotation(Path::new("x/json")));
    }

    // Tests per-label instance counting, including empty and missing labels
    #[test]
    fn test_record_counts_labels() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mixed.json");
        let document = json!({
            "shapes": [
                {"label": "cat"},
                {"label": "cat"},
                {"label": "dog"},
                {"label": ""},
                {"points": []}
            ],
            "imagePath": "mixed.png"
        });
        fs::write(&path, document.to_string()).unwrap();

        let record = AnnotationRecord::load(&path).unwrap();

        assert_eq!(record.base_name(), "mixed");
        assert_eq!(record.path(), path.as_path());
        assert_eq!(record.instances_of("cat"), 2);
        assert_eq!(record.instances_of("dog"), 1);
        assert_eq!(record.instances_of("bird"), 0);
        assert_eq!(record.labels().collect::<Vec<_>>(), vec!["cat", "dog"]);
    }

    // Tests that scan skips malformed files and keeps going
    #[test]
    fn test_scan_skips_malformed() {
        let temp_dir = TempDir::new().unwrap();
        write_annotation(temp_dir.path(), "a", &["cat"]);
        fs::write(temp_dir.path().join("b.json"), b"{ not json").unwrap();
        fs::write(temp_dir.path().join("c.json"), b"[1, 2, 3]").unwrap();
        write_annotation(temp_dir.path(), "d", &["dog"]);

        let scanner = CorpusScanner::new(temp_dir.path()).unwrap();

        let errors: Vec<ReplicationError> = scanner.records().filter_map(Result::err).collect();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.category() == ErrorCategory::Parse));

        let bases: Vec<String> = scanner.scan().map(|r| r.base_name().to_string()).collect();
        assert_eq!(bases, vec!["a", "d"]);
    }
}
