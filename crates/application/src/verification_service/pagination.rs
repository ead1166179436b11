use std::cmp::Ordering;
use std::collections::BTreeSet;

use veriqry_domain::{FetchedPage, PageEnvelope};

use crate::comparator::compare_values;

use super::Outcome;

/// Returns whether the path names a collection endpoint: exactly two path
/// segments after the API root.
pub(crate) fn is_collection_path(path: &str, api_root: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let root = api_root.trim_matches('/');
    let trimmed = path.trim_matches('/');

    let remainder = if root.is_empty() {
        trimmed
    } else if let Some(rest) = trimmed.strip_prefix(root)
        && (rest.is_empty() || rest.starts_with('/'))
    {
        rest
    } else {
        return false;
    };

    remainder
        .split('/')
        .filter(|segment| !segment.is_empty())
        .count()
        == 2
}

/// Checks the per-page invariant against the response's pagination envelope.
pub(crate) fn check_envelope(raw_body: &[u8], record_count: usize, outcome: &mut Outcome) {
    let Some(envelope) = PageEnvelope::locate(raw_body) else {
        outcome.issue("collection response is missing the integer pagination envelope");
        return;
    };

    let expected = envelope.page_size.min(envelope.total);
    let returned = u64::try_from(record_count).unwrap_or(u64::MAX);
    if returned != expected {
        outcome.issue(format!(
            "page {} returned {returned} records, expected min(pageSize, total) = {expected}",
            envelope.page
        ));
    }
}

/// Checks a full fixed-size traversal of every page.
pub(crate) fn check_traversal(
    pages: &[FetchedPage],
    page_size: u64,
    expected_total: u64,
    sort_field: &str,
    outcome: &mut Outcome,
) {
    if page_size == 0 {
        outcome.issue("traversal page size must be greater than zero");
        return;
    }

    let accumulated: u64 = pages
        .iter()
        .map(|page| u64::try_from(page.records.len()).unwrap_or(u64::MAX))
        .sum();
    if accumulated != expected_total {
        outcome.issue(format!(
            "full traversal accumulated {accumulated} records, the reported entity total is {expected_total}"
        ));
    }

    let expected_pages = expected_total.div_ceil(page_size);
    let walked_pages = u64::try_from(pages.len()).unwrap_or(u64::MAX);
    if walked_pages != expected_pages {
        outcome.issue(format!(
            "full traversal walked {walked_pages} pages, expected ceil({expected_total} / {page_size}) = {expected_pages}"
        ));
    }

    let mut seen = BTreeSet::new();
    let mut previous: Option<(usize, &serde_json::Value)> = None;
    let mut missing_reported = false;
    let mut duplicate_reported = false;
    let mut order_reported = false;

    for (global_index, record) in pages.iter().flat_map(|page| page.records.iter()).enumerate() {
        let Some(value) = record.field(sort_field) else {
            if !missing_reported {
                outcome.issue(format!(
                    "record {global_index} is missing sort key '{sort_field}' during full traversal"
                ));
                missing_reported = true;
            }
            continue;
        };

        if !seen.insert(value.to_string()) && !duplicate_reported {
            outcome.issue(format!(
                "duplicate sort key value {value} at record {global_index} during full traversal"
            ));
            duplicate_reported = true;
        }

        if let Some((previous_index, previous_value)) = previous
            && !order_reported
            && compare_values(previous_value, value, sort_field, None) != Ordering::Less
        {
            // Strict increase must hold across page boundaries, not merely
            // within each page.
            outcome.issue(format!(
                "sort key '{sort_field}' is not strictly increasing between records {previous_index} and {global_index}"
            ));
            order_reported = true;
        }

        previous = Some((global_index, value));
    }
}
