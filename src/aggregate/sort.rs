//! Display ordering for distinct field values.

use std::cmp::Ordering;

use crate::model::SortPolicy;

/// Order `values` in place according to `policy`.
pub fn sort_values(policy: SortPolicy, values: &mut [String]) {
    match policy {
        SortPolicy::Alphabetical => values.sort_by_cached_key(|v| (v.to_lowercase(), v.clone())),
        SortPolicy::Sizing => values.sort_by(|a, b| {
            sizing_key(a)
                .total_cmp(&sizing_key(b))
                .then_with(|| alphabetical(a, b))
        }),
        SortPolicy::Pricing => values.sort_by(|a, b| {
            let (ga, na) = pricing_key(a);
            let (gb, nb) = pricing_key(b);
            ga.cmp(&gb)
                .then_with(|| na.total_cmp(&nb))
                .then_with(|| alphabetical(a, b))
        }),
    }
}

fn alphabetical(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Numeric position of a headcount band such as "51-100" or "101+".
///
/// Uses the leading number before a dash, else the first run of digits
/// anywhere; labels without digits sort last.
pub fn sizing_key(label: &str) -> f64 {
    let label = label.trim();
    let digits_end = label
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(label.len());
    if digits_end > 0 && label[digits_end..].starts_with('-') {
        if let Ok(n) = label[..digits_end].parse::<f64>() {
            return n;
        }
    }
    first_digit_run(label).unwrap_or(f64::INFINITY)
}

/// First run of plain ASCII digits in `s`.
fn first_digit_run(s: &str) -> Option<f64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// `(group, amount)` for a pricing tier label.
///
/// Groups: FREE, "≤"/"<=" tiers, priced tiers, CONSUMPTION, anything
/// unparseable, END_OF_LIFE.
pub fn pricing_key(label: &str) -> (u8, f64) {
    let trimmed = label.trim();
    let word = trimmed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_uppercase();
    let amount = first_number(trimmed);
    match word.as_str() {
        "FREE" => return (0, 0.0),
        "CONSUMPTION" => return (3, 0.0),
        "END_OF_LIFE" => return (5, 0.0),
        _ => {}
    }
    if trimmed.starts_with('≤') || trimmed.starts_with("<=") {
        return (1, amount.unwrap_or(0.0));
    }
    match amount {
        Some(n) => (2, n),
        None => (4, 0.0),
    }
}

/// First run of digits (thousands separators and decimals allowed) in `s`.
fn first_number(s: &str) -> Option<f64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let run: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != ',')
        .collect();
    run.trim_end_matches('.').parse().ok()
}
