//! Column sorting shared by the list views.
//!
//! Rules are applied one after another, each one re-sorting the whole list
//! with a stable sort. The last rule therefore dominates and earlier rules only
//! survive inside its ties.

use std::{borrow::Cow, cmp::Ordering};

use chrono::{DateTime, Utc};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortRule<F> {
    pub field: F,
    pub descending: bool,
}

impl<F> SortRule<F> {
    pub fn ascending(field: F) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub fn descending(field: F) -> Self {
        Self {
            field,
            descending: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortValue<'a> {
    Missing,
    Text(Cow<'a, str>),
    Number(f64),
    Time(DateTime<Utc>),
    Flag(bool),
}

impl SortValue<'_> {
    /// Native ordering for like values. A missing value, or a pair of unlike
    /// values, is neither less nor greater than the other side.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            // UTF-16 code unit order, as the browser table sorts.
            (Self::Text(a), Self::Text(b)) => a.encode_utf16().cmp(b.encode_utf16()),
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            (Self::Flag(a), Self::Flag(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl<'a> From<Option<&'a str>> for SortValue<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(Self::Missing, |text| Self::Text(Cow::Borrowed(text)))
    }
}

impl From<Option<u64>> for SortValue<'_> {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Self::Missing, |n| Self::Number(n as f64))
    }
}

impl From<Option<DateTime<Utc>>> for SortValue<'_> {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Missing, Self::Time)
    }
}

pub trait Sortable {
    type Field: Copy + Eq + std::fmt::Debug;

    fn sort_value(&self, field: Self::Field) -> SortValue<'_>;
}

pub fn apply_sorting<'a, T: Sortable>(items: &'a [T], rules: &[SortRule<T::Field>]) -> Vec<&'a T> {
    debug!(?rules, rows = items.len(), "applying sorting");
    let mut rows = items.iter().collect::<Vec<_>>();
    for rule in rules {
        rows = stable_sort_by(rows, &|a: &&T, b: &&T| {
            let ordering = a.sort_value(rule.field).compare(&b.sort_value(rule.field));
            if rule.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
    rows
}

/// Column header click: unsorted → ascending (appended) → descending → removed.
pub fn toggle_sort<F: Copy + Eq>(rules: &[SortRule<F>], field: F) -> Vec<SortRule<F>> {
    if !rules.iter().any(|rule| rule.field == field) {
        let mut next = rules.to_vec();
        next.push(SortRule::ascending(field));
        return next;
    }

    rules
        .iter()
        .filter_map(|rule| {
            if rule.field != field {
                Some(*rule)
            } else if rule.descending {
                None
            } else {
                Some(SortRule::descending(field))
            }
        })
        .collect()
}

/// Keeps the first rule for each field.
pub fn dedup_rules<F: Copy + Eq>(rules: Vec<SortRule<F>>) -> Vec<SortRule<F>> {
    let mut unique: Vec<SortRule<F>> = Vec::with_capacity(rules.len());
    for rule in rules {
        if !unique.iter().any(|kept| kept.field == rule.field) {
            unique.push(rule);
        }
    }
    unique
}

/// Top-down merge sort. Tolerates comparators that are not total orders,
/// which `slice::sort_by` does not promise to.
fn stable_sort_by<T>(mut items: Vec<T>, cmp: &impl Fn(&T, &T) -> Ordering) -> Vec<T> {
    if items.len() <= 1 {
        return items;
    }

    let right = items.split_off(items.len() / 2);
    let left = stable_sort_by(items, cmp);
    let right = stable_sort_by(right, cmp);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(r, l) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Col {
        Name,
        Score,
    }

    #[derive(Debug)]
    struct Row {
        name: &'static str,
        score: Option<u64>,
    }

    impl Sortable for Row {
        type Field = Col;

        fn sort_value(&self, field: Col) -> SortValue<'_> {
            match field {
                Col::Name => Some(self.name).into(),
                Col::Score => self.score.into(),
            }
        }
    }

    fn names(rows: &[&Row]) -> Vec<&'static str> {
        rows.iter().map(|row| row.name).collect()
    }

    #[test]
    fn three_clicks_restore_original_rules() {
        let start = vec![SortRule::ascending(Col::Score)];
        let once = toggle_sort(&start, Col::Name);
        assert_eq!(
            once,
            vec![SortRule::ascending(Col::Score), SortRule::ascending(Col::Name)]
        );
        let twice = toggle_sort(&once, Col::Name);
        assert_eq!(
            twice,
            vec![SortRule::ascending(Col::Score), SortRule::descending(Col::Name)]
        );
        let thrice = toggle_sort(&twice, Col::Name);
        assert_eq!(thrice, start);
    }

    #[test]
    fn toggling_keeps_other_rule_positions() {
        let rules = vec![SortRule::ascending(Col::Name), SortRule::ascending(Col::Score)];
        let next = toggle_sort(&rules, Col::Name);
        assert_eq!(
            next,
            vec![SortRule::descending(Col::Name), SortRule::ascending(Col::Score)]
        );
    }

    #[test]
    fn last_rule_dominates_and_earlier_order_survives_ties() {
        let items = vec![
            Row { name: "c", score: Some(1) },
            Row { name: "a", score: Some(2) },
            Row { name: "b", score: Some(1) },
        ];
        let rules = vec![SortRule::ascending(Col::Name), SortRule::descending(Col::Score)];
        let sorted = apply_sorting(&items, &rules);
        assert_eq!(names(&sorted), vec!["a", "b", "c"]);

        let rules = vec![SortRule::descending(Col::Name), SortRule::ascending(Col::Score)];
        let sorted = apply_sorting(&items, &rules);
        assert_eq!(names(&sorted), vec!["c", "b", "a"]);
    }

    #[test]
    fn missing_values_compare_equal_and_do_not_panic() {
        let items = (0..64)
            .map(|i| Row {
                name: "x",
                score: if i % 3 == 0 { None } else { Some(64 - i) },
            })
            .collect::<Vec<_>>();
        let sorted = apply_sorting(&items, &[SortRule::ascending(Col::Score)]);
        assert_eq!(sorted.len(), items.len());
        assert_eq!(SortValue::Missing.compare(&SortValue::Number(1.0)), Ordering::Equal);
        assert_eq!(SortValue::Number(1.0).compare(&SortValue::Missing), Ordering::Equal);
    }

    #[test]
    fn text_orders_by_utf16_code_units() {
        let items = vec![
            Row { name: "\u{FF61}", score: None },
            Row { name: "\u{1F600}", score: None },
        ];
        let sorted = apply_sorting(&items, &[SortRule::ascending(Col::Name)]);
        assert_eq!(names(&sorted), vec!["\u{1F600}", "\u{FF61}"]);
    }

    #[test]
    fn no_rules_keeps_source_order() {
        let items = vec![
            Row { name: "b", score: None },
            Row { name: "a", score: None },
        ];
        assert_eq!(names(&apply_sorting(&items, &[])), vec!["b", "a"]);
    }

    #[test]
    fn dedup_keeps_first_rule_per_field() {
        let rules = dedup_rules(vec![
            SortRule::descending(Col::Name),
            SortRule::ascending(Col::Score),
            SortRule::ascending(Col::Name),
        ]);
        assert_eq!(
            rules,
            vec![SortRule::descending(Col::Name), SortRule::ascending(Col::Score)]
        );
    }
}
