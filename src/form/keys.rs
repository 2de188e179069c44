use std::{collections::BTreeSet, sync::LazyLock};

use regex::Regex;

use crate::domain::FieldKind;

static LEADING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+").expect("static regex"));

/// Next free key for `kind`: the tag followed by the smallest positive
/// number not already taken by a key of the same tag.
pub fn next_field_key<'a>(kind: FieldKind, existing: impl IntoIterator<Item = &'a str>) -> String {
    let tag = kind.tag();
    let taken = numeric_suffixes(tag, existing);
    format!("{tag}{}", first_gap(&taken))
}

/// Next free `Form<n>` name.
pub fn next_form_name<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
    let taken: BTreeSet<u64> = existing
        .into_iter()
        .filter_map(|name| name.strip_prefix("Form"))
        .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|rest| rest.parse().ok())
        .collect();
    format!("Form{}", first_gap(&taken))
}

fn numeric_suffixes<'a>(tag: &str, existing: impl IntoIterator<Item = &'a str>) -> BTreeSet<u64> {
    existing
        .into_iter()
        .filter_map(|key| key.strip_prefix(tag))
        .filter_map(|rest| LEADING_DIGITS.find(rest))
        .filter_map(|digits| digits.as_str().parse().ok())
        .collect()
}

fn first_gap(taken: &BTreeSet<u64>) -> u64 {
    let mut candidate = 1;
    for &used in taken.range(1..) {
        if used != candidate {
            break;
        }
        candidate += 1;
    }
    candidate
}
