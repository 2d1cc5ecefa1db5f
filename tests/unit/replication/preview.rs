//! Tests for projected label totals

#[cfg(test)]
mod tests {
    use labeldup::corpus::scanner::CorpusScanner;
    use labeldup::replication::multiplier::{CopyMultiplierMap, LabelSelection};
    use labeldup::replication::preview::{LabelProjection, preview};
    use labeldup::replication::settings::ReplicationSettings;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_pair(dir: &Path, stem: &str, labels: &[&str], image: Option<&str>) {
        let shapes: Vec<_> = labels.iter().map(|label| json!({"label": label})).collect();
        let document = json!({"shapes": shapes, "imagePath": format!("{stem}.png")});
        fs::write(dir.join(format!("{stem}.json")), document.to_string()).unwrap();
        if let Some(extension) = image {
            fs::write(dir.join(format!("{stem}.{extension}")), b"img").unwrap();
        }
    }

    fn settings(labels: &[&str], default: usize, overrides: &[(&str, usize)]) -> ReplicationSettings {
        let mut multipliers = CopyMultiplierMap::with_default(default).unwrap();
        for (label, copies) in overrides {
            multipliers.set(label, *copies).unwrap();
        }
        ReplicationSettings::new(LabelSelection::new(labels.iter().copied()).unwrap(), multipliers)
    }

    // Tests that co-occurring labels grow by the file's multiplier
    #[test]
    fn test_projection_follows_file_multiplier() {
        let temp_dir = TempDir::new().unwrap();
        write_pair(temp_dir.path(), "a", &["A", "A", "B"], Some("jpg"));
        write_pair(temp_dir.path(), "b", &["A"], Some("png"));
        write_pair(temp_dir.path(), "c", &["C"], Some("png"));

        let scanner = CorpusScanner::new(temp_dir.path()).unwrap();
        let report = preview(&scanner, &settings(&["A", "B"], 1, &[("A", 2), ("B", 4)]));

        let a = report.projection("A").unwrap();
        assert_eq!((a.current, a.multiplier, a.projected), (3, 2, 2 * 4 + 2));
        let b = report.projection("B").unwrap();
        assert_eq!((b.current, b.multiplier, b.projected), (1, 4, 4));
        assert!(report.projection("C").is_none());

        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.files_matched, 2);
        assert_eq!(report.total_current(), 4);
        assert_eq!(report.total_projected(), 14);
    }

    // Tests that files the executor would skip project nothing
    #[test]
    fn test_missing_companion_and_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        write_pair(temp_dir.path(), "a", &["A"], Some("png"));
        write_pair(temp_dir.path(), "b", &["A"], None);
        write_pair(temp_dir.path(), "c", &["A"], Some("gif"));
        fs::write(temp_dir.path().join("d.json"), b"{").unwrap();

        let scanner = CorpusScanner::new(temp_dir.path()).unwrap();
        let report = preview(&scanner, &settings(&["A"], 3, &[]));

        let a = report.projection("A").unwrap();
        assert_eq!(a.current, 3);
        assert_eq!(a.projected, 3);
        assert_eq!(report.files_matched, 3);
        assert_eq!(report.files_without_companion, 2);
        assert_eq!(report.files_unreadable, 1);
        assert_eq!(report.files_scanned, 4);
        assert_eq!(report.default_multiplier, 3);
    }

    // Tests that verification makes undecodable images count as missing
    #[test]
    fn test_verification_applies_to_projection() {
        let temp_dir = TempDir::new().unwrap();
        write_pair(temp_dir.path(), "a", &["A"], Some("png"));
        image::RgbImage::new(1, 1)
            .save(temp_dir.path().join("b.png"))
            .unwrap();
        write_pair(temp_dir.path(), "b", &["A"], None);

        let scanner = CorpusScanner::new(temp_dir.path()).unwrap();
        let report = preview(
            &scanner,
            &settings(&["A"], 2, &[]).with_image_verification(true),
        );

        assert_eq!(report.projection("A").unwrap().projected, 2);
        assert_eq!(report.files_without_companion, 1);
    }

    // Tests growth percentages, including labels with no instances
    #[test]
    fn test_growth_percent() {
        let projection = LabelProjection {
            label: "A".to_string(),
            current: 4,
            multiplier: 3,
            projected: 10,
        };
        assert!((projection.growth_percent().unwrap() - 150.0).abs() < 1e-9);

        let empty = LabelProjection {
            label: "B".to_string(),
            current: 0,
            multiplier: 1,
            projected: 0,
        };
        assert!(empty.growth_percent().is_none());
    }

    // Tests the rendered table
    #[test]
    fn test_display_table() {
        let temp_dir = TempDir::new().unwrap();
        write_pair(temp_dir.path(), "a", &["A", "A"], Some("png"));

        let scanner = CorpusScanner::new(temp_dir.path()).unwrap();
        let report = preview(&scanner, &settings(&["A"], 2, &[]));
        let text = report.to_string();

        assert!(text.starts_with("label"));
        assert!(text.contains("100.0%"));
        assert!(text.contains("selected instances:         2 -> 4"));
        assert!(!text.contains("unreadable"));
    }

    // Tests that replicas of same-named files only count where they survive
    #[test]
    fn test_shared_base_name_projects_survivors() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("a");
        let second = temp_dir.path().join("b");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        write_pair(&first, "img", &["A", "A"], Some("png"));
        write_pair(&second, "img", &["A"], Some("png"));

        let scanner = CorpusScanner::new(temp_dir.path()).unwrap();
        let report = preview(&scanner, &settings(&["A"], 2, &[]));

        let a = report.projection("A").unwrap();
        assert_eq!(a.current, 3);
        assert_eq!(a.projected, 2);
        assert_eq!(report.replicas_overwritten, 2);
        assert!(report.to_string().contains("replicas overwritten:       2"));
    }

    // Tests that a later file with fewer copies only replaces the low indices
    #[test]
    fn test_shared_base_name_partial_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("a");
        let second = temp_dir.path().join("b");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        write_pair(&first, "img", &["A"], Some("png"));
        write_pair(&second, "img", &["B"], Some("png"));

        let scanner = CorpusScanner::new(temp_dir.path()).unwrap();
        let report = preview(&scanner, &settings(&["A", "B"], 1, &[("A", 4), ("B", 1)]));

        assert_eq!(report.projection("A").unwrap().projected, 3);
        assert_eq!(report.projection("B").unwrap().projected, 1);
        assert_eq!(report.replicas_overwritten, 1);
    }

    // Tests that huge multipliers saturate instead of overflowing
    #[test]
    fn test_large_multiplier_saturates() {
        let temp_dir = TempDir::new().unwrap();
        write_pair(temp_dir.path(), "a", &["A"], Some("png"));
        write_pair(temp_dir.path(), "b", &["A"], Some("png"));

        let scanner = CorpusScanner::new(temp_dir.path()).unwrap();
        let report = preview(&scanner, &settings(&["A"], usize::MAX, &[]));

        let a = report.projection("A").unwrap();
        assert_eq!(a.current, 2);
        assert_eq!(a.projected, usize::MAX);
        assert_eq!(report.total_projected(), usize::MAX);
        assert!(a.growth_percent().is_some_and(f64::is_finite));
        assert!(report.to_string().contains("selected instances"));
    }
}
