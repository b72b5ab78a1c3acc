use super::*;

fn fake_face(family: &str) -> FontFace {
    FontFace {
        family: family.to_string(),
        bytes: Arc::new(vec![0u8; 4]),
        index: 0,
    }
}

#[test]
fn empty_set_has_no_faces() {
    let set = FontSet::empty();
    assert!(set.is_empty());
    assert!(set.face(FontRole::Bold).is_none());
    assert!(set.face(FontRole::Regular).is_none());
}

#[test]
fn missing_role_borrows_the_other_face() {
    let set = FontSet {
        bold: None,
        regular: Some(fake_face("Body")),
    };
    assert_eq!(set.face(FontRole::Bold).map(|f| f.family.as_str()), Some("Body"));

    let set = FontSet {
        bold: Some(fake_face("Heavy")),
        regular: None,
    };
    assert_eq!(
        set.face(FontRole::Regular).map(|f| f.family.as_str()),
        Some("Heavy")
    );
}

#[test]
fn unreadable_font_file_is_a_validation_error() {
    let err = load_font_file(Path::new("/definitely/not/a/font.ttf")).unwrap_err();
    assert!(matches!(err, CardError::Validation(_)));
}

#[test]
fn garbage_bytes_contain_no_faces() {
    assert!(face_from_bytes(b"not a font".to_vec()).is_err());
}

#[test]
fn font_config_parses_partial_json() {
    let cfg: FontConfig = serde_json::from_str(r#"{ "family": "Inter" }"#).unwrap();
    assert_eq!(cfg.family.as_deref(), Some("Inter"));
    assert!(cfg.bold_path.is_none());
}
