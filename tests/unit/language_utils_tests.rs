/*!
 * Tests for language tag utilities
 */

use reelingo::language_utils::{
    Language, get_language_name, language_tags_match, normalize_to_part3, primary_subtag, validate_language_tag,
};

#[test]
fn test_primary_subtag_should_lowercase_and_strip_region() {
    assert_eq!(primary_subtag("hi-IN"), "hi");
    assert_eq!(primary_subtag("PT_br"), "pt");
    assert_eq!(primary_subtag(" fr "), "fr");
}

#[test]
fn test_validate_should_accept_common_tag_forms() {
    for tag in ["en", "eng", "hi-IN", "ta-IN", "fre", "od-IN"] {
        assert!(validate_language_tag(tag).is_ok(), "{} should be valid", tag);
    }
    for tag in ["", "xx", "toolong-IN"] {
        assert!(validate_language_tag(tag).is_err(), "{} should be invalid", tag);
    }
}

#[test]
fn test_tags_should_match_across_code_forms() {
    assert!(language_tags_match("hi-IN", "hin"));
    assert!(language_tags_match("fr", "fre"));
    assert!(!language_tags_match("hi-IN", "bn-IN"));
    assert!(!language_tags_match("xx", "xx"));
}

#[test]
fn test_names_should_resolve_through_iso_639() {
    assert_eq!(get_language_name("hi-IN").unwrap(), "Hindi");
    assert_eq!(normalize_to_part3("de").unwrap(), "deu");
    assert_eq!(Language::from_tag("fr").unwrap(), Language::new("fr", "French"));
}
