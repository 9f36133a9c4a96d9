use packjson_core::{status_of, str_error, Document, ParseErrorKind, ParseStatus};

/// Parse `json`, expecting failure, and return the kind and position.
fn fail(json: &str) -> (ParseErrorKind, usize) {
    match Document::parse_str(json) {
        Ok(doc) => panic!("expected {json:?} to fail, got {:?}", doc.root()),
        Err(err) => (err.kind, err.position),
    }
}

fn assert_kind(json: &str, kind: ParseErrorKind) {
    assert_eq!(fail(json).0, kind, "wrong error kind for {json:?}");
}

// ============================================================================
// Positions called out by the error model
// ============================================================================

#[test]
fn missing_value_points_at_closing_brace() {
    assert_eq!(fail(r#"{"a":}"#), (ParseErrorKind::UnexpectedCharacter, 5));
}

#[test]
fn missing_closing_bracket() {
    assert_eq!(fail("[1,2"), (ParseErrorKind::MismatchBracket, 4));
}

#[test]
fn leading_zero_is_bad_number() {
    assert_eq!(fail("01"), (ParseErrorKind::BadNumber, 1));
}

#[test]
fn double_fraction_is_bad_number() {
    assert_eq!(fail("1.2.3"), (ParseErrorKind::BadNumber, 3));
}

#[test]
fn truncated_literal_is_unknown_identifier() {
    assert_eq!(fail(r#"{"a": tru}"#), (ParseErrorKind::UnknownIdentifier, 6));
}

#[test]
fn short_unicode_escape_is_bad_string() {
    assert_eq!(fail(r#""\u12""#), (ParseErrorKind::BadString, 5));
    assert_kind(r#""\u""#, ParseErrorKind::BadString);
    assert_kind(r#""\uZZZZ""#, ParseErrorKind::BadString);
}

// ============================================================================
// BadNumber
// ============================================================================

#[test]
fn malformed_numbers() {
    for json in ["-", "-a", "1.", "1.e5", "1e", "1e+", "1E-", "00", "-01", "1x", "2true", "[1.5.]"] {
        assert_kind(json, ParseErrorKind::BadNumber);
    }
}

#[test]
fn bad_number_inside_container() {
    assert_eq!(fail("[1, 2, 3.]"), (ParseErrorKind::BadNumber, 9));
}

// ============================================================================
// BadString
// ============================================================================

#[test]
fn unterminated_string() {
    assert_eq!(fail(r#""abc"#), (ParseErrorKind::BadString, 4));
    assert_kind(r#"["abc"#, ParseErrorKind::BadString);
    assert_kind(r#"{"key"#, ParseErrorKind::BadString);
}

#[test]
fn unknown_escape() {
    assert_eq!(fail(r#""a\qb""#), (ParseErrorKind::BadString, 3));
    assert_kind(r#""\x41""#, ParseErrorKind::BadString);
}

#[test]
fn raw_control_character() {
    assert_eq!(fail("\"a\nb\""), (ParseErrorKind::BadString, 2));
    assert_kind("\"tab\there\"", ParseErrorKind::BadString);
}

#[test]
fn unpaired_surrogates() {
    assert_kind(r#""\ud83d""#, ParseErrorKind::BadString);
    assert_kind(r#""\ud83dx""#, ParseErrorKind::BadString);
    assert_kind(r#""\ud83d\u0041""#, ParseErrorKind::BadString);
    assert_eq!(fail(r#""ab\ude00""#), (ParseErrorKind::BadString, 3));
}

#[test]
fn invalid_utf8_in_string() {
    let err = Document::parse(b"\"ab\xFF\"").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::BadString);
    assert_eq!(err.position, 3);

    let err = Document::parse(b"\"\\n\xC3\"").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::BadString);
}

#[test]
fn nul_inside_string_ends_the_text() {
    let err = Document::parse(b"\"abc\0def\"").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::BadString);
    assert_eq!(err.position, 4);
}

// ============================================================================
// UnknownIdentifier
// ============================================================================

#[test]
fn unknown_identifiers() {
    for json in ["nul", "True", "NULL", "nan", "Infinity", "truex", "[falsey]", "undefined"] {
        assert_kind(json, ParseErrorKind::UnknownIdentifier);
    }
}

// ============================================================================
// Overflow / Underflow
// ============================================================================

#[test]
fn huge_exponent_overflows() {
    assert_eq!(fail("1e400"), (ParseErrorKind::Overflow, 0));
    assert_eq!(fail("[-1e400]"), (ParseErrorKind::Overflow, 1));
    assert_kind("1.8e308", ParseErrorKind::Overflow);
    let digits = format!("1e{}", "9".repeat(300));
    assert_kind(&digits, ParseErrorKind::Overflow);
}

#[test]
fn tiny_exponent_underflows() {
    assert_eq!(fail("1e-400"), (ParseErrorKind::Underflow, 0));
    assert_kind("-2.5e-999", ParseErrorKind::Underflow);
    let digits = format!("1e-{}", "9".repeat(300));
    assert_kind(&digits, ParseErrorKind::Underflow);
}

#[test]
fn many_mantissa_digits_stay_finite() {
    let long = format!("0.{}1", "0".repeat(300));
    let doc = Document::parse_str(&long).unwrap();
    assert!(doc.root().as_number().unwrap() > 0.0);
}

// ============================================================================
// MismatchBracket
// ============================================================================

#[test]
fn wrong_closing_bracket() {
    assert_eq!(fail("[1}"), (ParseErrorKind::MismatchBracket, 2));
    assert_eq!(fail(r#"{"a":1]"#), (ParseErrorKind::MismatchBracket, 6));
}

#[test]
fn unmatched_closer_at_top_level() {
    assert_eq!(fail("]"), (ParseErrorKind::MismatchBracket, 0));
    assert_eq!(fail("  }"), (ParseErrorKind::MismatchBracket, 2));
}

#[test]
fn input_ends_inside_container() {
    assert_kind("[", ParseErrorKind::MismatchBracket);
    assert_kind("[1,", ParseErrorKind::MismatchBracket);
    assert_kind("{", ParseErrorKind::MismatchBracket);
    assert_kind(r#"{"a""#, ParseErrorKind::MismatchBracket);
    assert_kind(r#"{"a":"#, ParseErrorKind::MismatchBracket);
    assert_kind(r#"{"a":1"#, ParseErrorKind::MismatchBracket);
    assert_kind("[[[]]", ParseErrorKind::MismatchBracket);
}

#[test]
fn trailing_content() {
    assert_eq!(fail("[1] [2]"), (ParseErrorKind::MismatchBracket, 4));
    assert_eq!(fail("1 2"), (ParseErrorKind::MismatchBracket, 2));
    assert_eq!(fail("[]]"), (ParseErrorKind::MismatchBracket, 2));
    assert_kind(r#"{} x"#, ParseErrorKind::MismatchBracket);
}

// ============================================================================
// UnexpectedCharacter
// ============================================================================

#[test]
fn empty_input() {
    assert_eq!(fail(""), (ParseErrorKind::UnexpectedCharacter, 0));
    assert_eq!(fail("   \n"), (ParseErrorKind::UnexpectedCharacter, 4));
}

#[test]
fn trailing_commas() {
    assert_eq!(fail("[1,]"), (ParseErrorKind::UnexpectedCharacter, 3));
    assert_eq!(fail(r#"{"a":1,}"#), (ParseErrorKind::UnexpectedCharacter, 7));
}

#[test]
fn missing_separators() {
    assert_eq!(fail("[1 2]"), (ParseErrorKind::UnexpectedCharacter, 3));
    assert_eq!(fail(r#"{"a" 1}"#), (ParseErrorKind::UnexpectedCharacter, 5));
    assert_eq!(fail(r#"{"a":1 "b":2}"#), (ParseErrorKind::UnexpectedCharacter, 7));
}

#[test]
fn non_string_keys() {
    assert_eq!(fail("{1:2}"), (ParseErrorKind::UnexpectedCharacter, 1));
    assert_kind("{a:1}", ParseErrorKind::UnexpectedCharacter);
    assert_kind("{,}", ParseErrorKind::UnexpectedCharacter);
}

#[test]
fn stray_characters() {
    for json in [".5", "+1", "'single'", "[,1]", "@", "[1:2]", r#"{"a"::1}"#] {
        assert_kind(json, ParseErrorKind::UnexpectedCharacter);
    }
}

// ============================================================================
// Status codes and messages
// ============================================================================

#[test]
fn every_status_has_a_distinct_message() {
    let messages: Vec<&str> = ParseStatus::ALL.iter().map(|&s| str_error(s)).collect();
    for (i, a) in messages.iter().enumerate() {
        assert!(!a.is_empty());
        for b in &messages[i + 1..] {
            assert_ne!(a, b);
        }
    }
    assert_eq!(str_error(ParseStatus::Ok), "ok");
    assert_eq!(str_error(ParseStatus::BadNumber), "bad number");
}

#[test]
fn status_of_results() {
    assert_eq!(status_of(&Document::parse_str("[1]")), ParseStatus::Ok);
    assert_eq!(status_of(&Document::parse_str("[1")), ParseStatus::MismatchBracket);
    assert_eq!(status_of(&Document::parse_str("1e999")), ParseStatus::Overflow);
    assert!(ParseStatus::Ok.is_ok());
    assert!(!ParseStatus::BadString.is_ok());
}

#[test]
fn error_kind_maps_to_status() {
    let err = Document::parse_str(r#"{"a": tru}"#).unwrap_err();
    assert_eq!(err.status(), ParseStatus::UnknownIdentifier);
    assert_eq!(ParseStatus::from(ParseErrorKind::Underflow), ParseStatus::Underflow);
    assert_eq!(ParseErrorKind::Overflow.to_string(), ParseStatus::Overflow.to_string());
}

#[test]
fn error_display_includes_position() {
    let err = Document::parse_str(r#"{"a":}"#).unwrap_err();
    assert_eq!(err.to_string(), "unexpected character at byte 5");
}

#[test]
fn error_is_std_error() {
    fn takes_error(_: &dyn std::error::Error) {}
    let err = Document::parse_str("nope").unwrap_err();
    takes_error(&err);
}
