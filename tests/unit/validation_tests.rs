/*!
 * Tests for the Arabic coverage heuristic
 */

use mdxlate::validation::{ArabicValidator, has_enough_arabic};

#[test]
fn test_has_enough_arabic_with_empty_text_should_be_false() {
    assert!(!has_enough_arabic(""));
    assert!(!ArabicValidator::default().accepts(""));
}

#[test]
fn test_has_enough_arabic_with_arabic_sentence_should_be_true() {
    assert!(has_enough_arabic("مرحبا بالعالم، هذه قرية قديمة."));
}

#[test]
fn test_has_enough_arabic_with_english_sentence_should_be_false() {
    assert!(!has_enough_arabic("Hello world, this is an old village."));
}

#[test]
fn test_has_enough_arabic_at_exact_threshold_should_accept() {
    // 3 Arabic codepoints out of 20
    let text = "بتثabcdefghijklmnopq";
    assert_eq!(text.chars().count(), 20);
    assert!(has_enough_arabic(text));
}

#[test]
fn test_has_enough_arabic_just_below_threshold_should_reject() {
    // 3 Arabic codepoints out of 21
    assert!(!has_enough_arabic("بتثabcdefghijklmnopqr"));
}

#[test]
fn test_arabic_validator_with_custom_threshold_should_apply_it() {
    let strict = ArabicValidator::new(0.9);
    let text = "مرحبا <Cite id=\"x\"/>";

    assert_eq!(strict.threshold, 0.9);
    assert!(!strict.accepts(text));
    assert!(ArabicValidator::default().accepts(text));
    assert!(strict.coverage(text) > 0.15);
}

#[test]
fn test_arabic_validator_with_presentation_forms_should_count_them() {
    // Lam-alef ligature forms from Presentation Forms-B
    assert!(has_enough_arabic("\u{FEFB}\u{FEFC}"));
}
