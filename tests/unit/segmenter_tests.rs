/*!
 * Tests for the segmenter and the placeholder codec working on whole documents
 */

use mdxlate::placeholder::{self, PlaceholderMap, is_placeholder_key};
use mdxlate::segmenter::{self, Segment, Segmenter, join, translatable_text};
use crate::common;

#[test]
fn test_segment_with_sample_chapter_should_be_lossless() {
    let chapter = common::sample_chapter();
    let segments = segmenter::segment(chapter);
    assert_eq!(join(&segments), chapter);
}

#[test]
fn test_segment_with_sample_chapter_should_expose_only_prose() {
    let prose = translatable_text(&segmenter::segment(common::sample_chapter()));

    assert!(prose.contains("Hello"));
    assert!(prose.contains("world"));
    for protected in ["title:", "import", "<Cite", "const", "# "] {
        assert!(!prose.contains(protected), "{:?} leaked into {:?}", protected, prose);
    }
}

#[test]
fn test_segment_with_nested_same_name_tags_should_protect_outermost() {
    let text = "A <Footnote>x <Footnote>y</Footnote> z</Footnote> B";
    let segments = segmenter::segment(text);
    assert_eq!(
        segments,
        vec![
            Segment::translate("A "),
            Segment::protect("<Footnote>x <Footnote>y</Footnote> z</Footnote>"),
            Segment::translate(" B"),
        ]
    );
}

#[test]
fn test_segment_with_gt_inside_attribute_should_not_close_tag() {
    let text = r#"See <Cite id="a>b" page="2"/> here"#;
    let segments = segmenter::segment(text);
    assert_eq!(segments[1], Segment::protect(r#"<Cite id="a>b" page="2"/>"#));
}

#[test]
fn test_segment_with_tilde_fence_should_need_matching_length() {
    let text = "~~~~\ncode\n~~~\nstill code\n~~~~\nprose";
    let segments = segmenter::segment(text);
    assert_eq!(segments[0], Segment::protect("~~~~\ncode\n~~~\nstill code\n~~~~"));
    assert_eq!(segments[1], Segment::translate("\nprose"));
}

#[test]
fn test_segmenter_with_unterminated_expression_should_warn() {
    let result = Segmenter::default().segment_with_warnings("Text {open");
    assert_eq!(result.segments.last().unwrap(), &Segment::protect("{open"));
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].to_string().contains("byte 5"));
}

#[test]
fn test_placeholder_round_trip_should_restore_input() {
    let corpus = [
        common::sample_chapter(),
        "no elements at all",
        "<Cite id=\"a\"/><Cite id=\"a\"/>",
        "⟦MDX_3⟧ literal and <Footnote>note</Footnote>",
        "<Cite id=\"x\" unterminated",
    ];
    for text in corpus {
        let extraction = placeholder::extract(text);
        assert_eq!(
            placeholder::restore(&extraction.sanitized, &extraction.placeholders),
            text,
            "round trip for {:?}",
            text
        );
    }
}

#[test]
fn test_placeholder_keys_should_be_unique_per_original() {
    let extraction = placeholder::extract("<Cite id=\"a\"/> <Cite id=\"b\"/> <Footnote>c</Footnote>");
    let originals: Vec<&str> = extraction.placeholders.iter().map(|(_, v)| v).collect();
    assert_eq!(originals.len(), 3);
    assert!(extraction.placeholders.iter().all(|(k, _)| is_placeholder_key(k)));
}

#[test]
fn test_restore_with_unknown_key_should_echo_it() {
    let mut map = PlaceholderMap::new();
    map.insert("⟦MDX_1⟧", "<Cite id=\"x\"/>");
    assert_eq!(
        placeholder::restore("⟦MDX_1⟧ ⟦MDX_2⟧", &map),
        "<Cite id=\"x\"/> ⟦MDX_2⟧"
    );
}

#[test]
fn test_placeholder_map_should_serialize_as_plain_object() {
    let extraction = placeholder::extract("<Cite id=\"x\"/>");
    let json = serde_json::to_string(&extraction.placeholders).unwrap();
    assert_eq!(json, r#"{"⟦MDX_1⟧":"<Cite id=\"x\"/>"}"#);

    let back: PlaceholderMap = serde_json::from_str(&json).unwrap();
    assert_eq!(back, extraction.placeholders);
}
