//! Tests for companion image lookup and decode verification

#[cfg(test)]
mod tests {
    use labeldup::io::error::ErrorCategory;
    use labeldup::io::image::{locate_companion, resolve_companion, verify_image};
    use labeldup::ReplicationError;
    use std::fs;
    use tempfile::TempDir;

    // Tests that the first extension in lookup order wins
    #[test]
    fn test_locate_companion_prefers_earlier_extension() {
        let temp_dir = TempDir::new().unwrap();
        let annotation = temp_dir.path().join("part.json");
        fs::write(temp_dir.path().join("part.png"), b"png").unwrap();
        fs::write(temp_dir.path().join("part.jpg"), b"jpg").unwrap();

        let image = locate_companion(&annotation).unwrap();
        assert_eq!(image, temp_dir.path().join("part.jpg"));
    }

    // Tests lookup of a later extension when earlier ones are absent
    #[test]
    fn test_locate_companion_later_extension() {
        let temp_dir = TempDir::new().unwrap();
        let annotation = temp_dir.path().join("part.json");
        fs::write(temp_dir.path().join("part.webp"), b"webp").unwrap();

        assert_eq!(
            locate_companion(&annotation).unwrap(),
            temp_dir.path().join("part.webp")
        );
    }

    // Tests that unsupported extensions and directories are not companions
    #[test]
    fn test_locate_companion_missing() {
        let temp_dir = TempDir::new().unwrap();
        let annotation = temp_dir.path().join("part.json");
        fs::write(temp_dir.path().join("part.gif"), b"gif").unwrap();
        fs::create_dir(temp_dir.path().join("part.png")).unwrap();

        let err = locate_companion(&annotation).unwrap_err();
        assert!(matches!(err, ReplicationError::MissingCompanion { .. }));
        assert_eq!(err.category(), ErrorCategory::MissingCompanion);
    }

    // Tests that a real image decodes and garbage does not
    #[test]
    fn test_verify_image() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.png");
        image::RgbImage::new(3, 2).save(&good).unwrap();
        let bad = temp_dir.path().join("bad.png");
        fs::write(&bad, b"definitely not a png").unwrap();

        assert_eq!(verify_image(&good).unwrap(), (3, 2));

        let err = verify_image(&bad).unwrap_err();
        assert!(matches!(err, ReplicationError::ImageVerify { .. }));
        assert_eq!(err.category(), ErrorCategory::Copy);
    }

    // Tests that verification is only applied when requested
    #[test]
    fn test_resolve_companion_verification_toggle() {
        let temp_dir = TempDir::new().unwrap();
        let annotation = temp_dir.path().join("part.json");
        fs::write(temp_dir.path().join("part.png"), b"not an image").unwrap();

        assert!(resolve_companion(&annotation, false).is_ok());
        assert!(resolve_companion(&annotation, true).is_err());
    }
}
