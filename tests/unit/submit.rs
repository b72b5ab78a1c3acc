use super::*;
use crate::export::ExportPayload;
use crate::foundation::core::RenderScale;

fn artifact() -> ExportArtifact {
    ExportArtifact {
        filename: "ariaNightshade.png".into(),
        width: 725,
        height: 1040,
        scale: RenderScale::new(2.5).unwrap(),
        payload: ExportPayload::Png(vec![0x89, b'P', b'N', b'G']),
    }
}

fn inputs(print: &str) -> CardInputs {
    CardInputs {
        character_name: "Aria Nightshade".into(),
        series_title: "Starbound Chronicles".into(),
        print_number: print.into(),
        show_image: true,
    }
}

#[test]
fn builds_payload_and_parts() {
    let up = OriginalUpload {
        filename: "aria.jpg".into(),
        content_type: "image/jpeg".into(),
        bytes: vec![1, 2, 3],
    };
    let sub = prepare_submission(
        &inputs(""),
        ColorRgb::new(0x12, 0x34, 0x56),
        &artifact(),
        Some(&up),
        1_700_000_000,
    )
    .unwrap();

    assert_eq!(sub.payload.title, "Aria Nightshade");
    assert_eq!(sub.payload.series, "Starbound Chronicles");
    assert_eq!(sub.payload.submitted, "<t:1700000000:R>");
    assert_eq!(sub.payload.accent_color, 0x123456);
    assert_eq!(sub.parts.len(), 2);
    assert_eq!(sub.parts[0].field, "file");
    assert_eq!(sub.parts[0].filename, "ariaNightshade.png");
    assert_eq!(sub.parts[1].field, "original");

    let json: serde_json::Value = serde_json::from_str(&sub.payload_json().unwrap()).unwrap();
    assert_eq!(json["accent_color"], 0x123456);
}

#[test]
fn upload_part_is_optional() {
    let sub = prepare_submission(&inputs("  "), ColorRgb::new(1, 2, 3), &artifact(), None, 5).unwrap();
    assert_eq!(sub.parts.len(), 1);
}

#[test]
fn print_number_rejects_locally() {
    let err = prepare_submission(&inputs("007/150"), ColorRgb::new(1, 2, 3), &artifact(), None, 5)
        .unwrap_err();
    assert!(matches!(err, CardError::Rejected(_)));
}
