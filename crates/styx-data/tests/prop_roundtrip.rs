/// Property-based tests for the value codec and reference algebra.
///
/// Strategies generate arbitrary scalar text (including characters that force
/// quoting and escaping), nested complex values keyed by scalars or by small
/// complex values, and references built from such segments.
use proptest::prelude::*;
use styx_data::{generate, parse, Complex, Pair, Reference, Value};

// ============================================================================
// Strategies
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9_]{1,12}",
        "[a-zA-Z0-9 :,{}<>/\\.\"\\\\-]{0,16}",
        Just(String::new()),
        Just(".".to_string()),
        Just("..".to_string()),
        Just("line1\nline2".to_string()),
        Just("caf\u{e9}".to_string()),
        Just("\u{4f60}\u{597d}".to_string()),
        Just("bell\u{7}".to_string()),
        any::<String>(),
    ]
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    arb_text().prop_map(Value::Scalar)
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(4, 48, 6, |inner| {
        let key = prop_oneof![
            4 => arb_scalar(),
            1 => inner.clone(),
        ];
        prop::collection::vec((key, inner), 0..6).prop_map(|pairs| {
            Value::Complex(
                pairs
                    .into_iter()
                    .map(|(k, v)| Pair::new(k, v))
                    .collect::<Complex>(),
            )
        })
    })
}

fn arb_reference() -> impl Strategy<Value = Reference> {
    prop::collection::vec(arb_value(), 0..5).prop_map(Reference::from_segments)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn compact_roundtrip(value in arb_value()) {
        let text = generate(&value, false);
        prop_assert_eq!(parse(&text).unwrap(), value);
    }

    #[test]
    fn indented_roundtrip(value in arb_value()) {
        let text = generate(&value, true);
        prop_assert_eq!(parse(&text).unwrap(), value);
    }

    #[test]
    fn generate_parse_generate_is_stable(value in arb_value()) {
        let once = generate(&value, false);
        let twice = generate(&parse(&once).unwrap(), false);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn parent_of_child_is_self(reference in arb_reference(), segment in arb_value()) {
        prop_assert_eq!(reference.child(segment).parent(), Some(reference));
    }

    #[test]
    fn child_of_parent_is_self(reference in arb_reference()) {
        if let (Some(parent), Some(last)) = (reference.parent(), reference.last_segment()) {
            prop_assert_eq!(parent.child(last.clone()), reference.clone());
        } else {
            prop_assert!(reference.is_root());
        }
    }

    #[test]
    fn literal_roundtrip(reference in arb_reference()) {
        let text = reference.to_string();
        prop_assert_eq!(Reference::parse(&text).unwrap(), reference);
    }

    #[test]
    fn path_roundtrip(reference in arb_reference()) {
        let path = reference.to_path();
        prop_assert_eq!(Reference::from_path(&path).unwrap(), reference);
    }
}
