//! Group top-level `@media` rules.
//!
//! Every top-level `@media` rule is moved to the end of the stylesheet and
//! rules with an identical query are merged. Queries that only set a
//! minimum width come first (ascending), then those that only set a
//! maximum width (descending), then everything else in order of first
//! appearance.

use lightningcss::media_query::{
    MediaCondition, MediaFeatureComparison, MediaFeatureName, MediaFeatureValue, MediaFeatureId,
    MediaList, Operator, QueryFeature,
};
use lightningcss::rules::media::MediaRule;
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::values::length::{Length, LengthValue};
use std::cmp::Ordering;

const EM_PX: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum QueryKind {
    Min(f32),
    Max(f32),
    Other,
}

fn classify(query: &MediaList<'_>) -> QueryKind {
    let [media] = query.media_queries.as_slice() else {
        return QueryKind::Other;
    };
    if media.qualifier.is_some() {
        return QueryKind::Other;
    }
    let Some(condition) = &media.condition else {
        return QueryKind::Other;
    };

    let mut widths = Vec::new();
    if !collect_widths(condition, &mut widths) {
        return QueryKind::Other;
    }

    let Some(&(first_min, first_px)) = widths.first() else {
        return QueryKind::Other;
    };
    if widths.iter().any(|&(min, _)| min != first_min) {
        return QueryKind::Other;
    }
    if first_min {
        QueryKind::Min(first_px)
    } else {
        QueryKind::Max(first_px)
    }
}

/// Collect `(is_min, px)` for every width feature under `and` conditions.
/// Returns false when the condition holds something it cannot order by.
fn collect_widths(condition: &MediaCondition<'_>, out: &mut Vec<(bool, f32)>) -> bool {
    match condition {
        MediaCondition::Feature(QueryFeature::Range {
            name: MediaFeatureName::Standard(MediaFeatureId::Width),
            operator,
            value: MediaFeatureValue::Length(length),
        }) => {
            let Some(px) = length_px(length) else {
                return false;
            };
            let is_min = match operator {
                MediaFeatureComparison::GreaterThan | MediaFeatureComparison::GreaterThanEqual => true,
                MediaFeatureComparison::LessThan | MediaFeatureComparison::LessThanEqual => false,
                MediaFeatureComparison::Equal => return false,
            };
            out.push((is_min, px));
            true
        }
        // Other features (orientation, hover, ...) do not affect the order.
        MediaCondition::Feature(_) => true,
        MediaCondition::Operation { operator: Operator::And, conditions } => {
            conditions.iter().all(|c| collect_widths(c, out))
        }
        _ => false,
    }
}

fn length_px(length: &Length) -> Option<f32> {
    match length {
        Length::Value(LengthValue::Em(v)) | Length::Value(LengthValue::Rem(v)) => Some(v * EM_PX),
        other => other.to_px(),
    }
}

fn rank(kind: QueryKind) -> u8 {
    match kind {
        QueryKind::Min(_) => 0,
        QueryKind::Max(_) => 1,
        QueryKind::Other => 2,
    }
}

fn compare(a: QueryKind, b: QueryKind) -> Ordering {
    match (a, b) {
        (QueryKind::Min(x), QueryKind::Min(y)) => x.total_cmp(&y),
        (QueryKind::Max(x), QueryKind::Max(y)) => y.total_cmp(&x),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Move and merge the top-level `@media` rules of `rules`.
pub fn group_media_queries(rules: &mut CssRuleList<'_>) {
    let mut rest = Vec::with_capacity(rules.0.len());
    let mut groups: Vec<MediaRule<'_>> = Vec::new();

    for rule in rules.0.drain(..) {
        match rule {
            CssRule::Media(media) => match groups.iter_mut().find(|g| g.query == media.query) {
                Some(group) => group.rules.0.extend(media.rules.0),
                None => groups.push(media),
            },
            other => rest.push(other),
        }
    }

    // Stable sort keeps first-appearance order among equals.
    groups.sort_by(|a, b| compare(classify(&a.query), classify(&b.query)));

    rest.extend(groups.into_iter().map(CssRule::Media));
    rules.0 = rest;
}
