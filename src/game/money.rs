//! Money helpers: cent rounding and display formatting.

/// Round to 2 decimal places.
pub fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Format an amount for display.
///
/// Below 1000 the value is shown with a dollar sign and at most two decimals
/// (`$12.5`). Thousands and millions use a `k` / `mil` suffix with two
/// decimals, dropping an exact `.00` (`1.50k`, `2mil`).
pub fn format_money(n: f64) -> String {
    if n >= 1_000_000.0 {
        return with_suffix(n / 1_000_000.0, "mil");
    }
    if n >= 1000.0 {
        return with_suffix(n / 1000.0, "k");
    }
    format!("${}", round_cents(n))
}

fn with_suffix(scaled: f64, suffix: &str) -> String {
    let s = format!("{scaled:.2}");
    let s = s.strip_suffix(".00").unwrap_or(&s);
    format!("{s}{suffix}")
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_round_cents_within_half_cent(v in 0.0f64..1e9) {
            prop_assert!((round_cents(v) - v).abs() <= 0.005 + 1e-6);
        }

        #[test]
        fn prop_format_money_no_panic(n in 0.0f64..1e12) {
            let s = format_money(n);
            prop_assert!(!s.is_empty());
        }

        #[test]
        fn prop_small_amounts_start_with_dollar(n in 0.0f64..999.99) {
            prop_assert!(format_money(n).starts_with('$'));
        }

        #[test]
        fn prop_suffixed_never_ends_in_zero_cents(n in 1000.0f64..1e10) {
            let s = format_money(n);
            prop_assert!(!s.contains(".00"), "got: {}", s);
        }
    }
}
