use super::*;

#[test]
fn short_values_are_unchanged() {
    assert_eq!(truncate_for_display("", VISIBLE_LIMIT), "");
    assert_eq!(truncate_for_display("Aria Nightshade", VISIBLE_LIMIT), "Aria Nightshade");
    let exactly = "a".repeat(VISIBLE_LIMIT);
    assert_eq!(truncate_for_display(&exactly, VISIBLE_LIMIT), exactly);
}

#[test]
fn long_values_are_cut_trimmed_and_marked() {
    assert_eq!(
        truncate_for_display("Starbound Chronicles", VISIBLE_LIMIT),
        "Starbound Chronicl.."
    );
    assert_eq!(
        truncate_for_display("Omniscient Reader's Viewpoint", VISIBLE_LIMIT),
        "Omniscient Reader'.."
    );
    // The 18th character is a space; trimming removes it before the marker.
    assert_eq!(
        truncate_for_display("Seventeen chars!! more", VISIBLE_LIMIT),
        "Seventeen chars!!.."
    );
}

#[test]
fn truncation_counts_characters_not_bytes() {
    let name = "ÅÄÖåäöÅÄÖåäöÅÄÖåäöX";
    let cut = truncate_for_display(name, VISIBLE_LIMIT);
    assert_eq!(cut.chars().count(), VISIBLE_LIMIT + 2);
    assert!(cut.ends_with(".."));
}

#[test]
fn display_helpers_never_mutate_storage() {
    let inputs = CardInputs {
        character_name: "Aria Nightshade".into(),
        series_title: "Starbound Chronicles".into(),
        print_number: "007/150".into(),
        show_image: true,
    };
    assert_eq!(inputs.display_name(), "Aria Nightshade");
    assert_eq!(inputs.display_series(), "Starbound Chronicl..");
    assert_eq!(inputs.series_title, "Starbound Chronicles");
}

#[test]
fn length_warnings_flag_only_long_fields() {
    let inputs = CardInputs {
        character_name: "Aria Nightshade".into(),
        series_title: "Starbound Chronicles".into(),
        ..CardInputs::default()
    };
    let w = inputs.length_warnings();
    assert_eq!(w.character_name, None);
    assert_eq!(w.series_title, Some(CUT_WARNING));
}
