//! Tests for mirror root folder references.

use drive_keeper::folder_ref::parse_folder_ref;

mod folder_urls {
    use super::*;

    #[test]
    fn basic_folder_url() {
        let url = "https://drive.google.com/drive/folders/1abc123XYZ-_def456";
        assert_eq!(parse_folder_ref(url).unwrap(), "1abc123XYZ-_def456");
    }

    #[test]
    fn folder_url_with_user() {
        let url = "https://drive.google.com/drive/u/3/folders/1abc123XYZ";
        assert_eq!(parse_folder_ref(url).unwrap(), "1abc123XYZ");
    }

    #[test]
    fn folder_url_with_query_params() {
        let url = "https://drive.google.com/drive/folders/1abc123XYZ?usp=sharing";
        assert_eq!(parse_folder_ref(url).unwrap(), "1abc123XYZ");
    }

    #[test]
    fn open_url() {
        let url = "https://drive.google.com/open?id=1abc123XYZ";
        assert_eq!(parse_folder_ref(url).unwrap(), "1abc123XYZ");
    }
}

mod my_drive {
    use super::*;

    #[test]
    fn my_drive_url_maps_to_root_alias() {
        assert_eq!(
            parse_folder_ref("https://drive.google.com/drive/my-drive").unwrap(),
            "root"
        );
        assert_eq!(
            parse_folder_ref("https://drive.google.com/drive/u/0/my-drive?usp=x").unwrap(),
            "root"
        );
    }

    #[test]
    fn root_alias() {
        assert_eq!(parse_folder_ref("root").unwrap(), "root");
        assert_eq!(parse_folder_ref(" Root ").unwrap(), "root");
    }
}

mod raw_ids {
    use super::*;

    #[test]
    fn id_with_underscore_and_hyphen() {
        assert_eq!(parse_folder_ref("abc-123_XYZ").unwrap(), "abc-123_XYZ");
    }

    #[test]
    fn id_with_whitespace_trimmed() {
        assert_eq!(parse_folder_ref("\t1abc123XYZ\n").unwrap(), "1abc123XYZ");
    }
}

mod invalid_inputs {
    use super::*;
    use drive_keeper::DriveError;

    #[test]
    fn empty_or_blank() {
        assert!(parse_folder_ref("").is_err());
        assert!(parse_folder_ref("   ").is_err());
    }

    #[test]
    fn foreign_url() {
        let err = parse_folder_ref("https://example.com/folder/123").unwrap_err();
        assert!(matches!(err, DriveError::InvalidUrlOrId(_)));
    }

    #[test]
    fn id_with_spaces() {
        assert!(parse_folder_ref("abc 123").is_err());
    }
}
