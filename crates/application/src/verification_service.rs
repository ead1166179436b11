use std::collections::BTreeMap;

use serde_json::Value;
use veriqry_domain::{
    EntitySchema, FetchedPage, FilterSpec, NotificationLog, Record, SortSpec, Verdict, ViewSpec,
};

mod filter;
mod pagination;
mod sort;
mod view;

#[cfg(test)]
mod tests;

/// Inputs for one listing verification test case.
///
/// Everything here was already fetched by the transport collaborator; the
/// service itself performs no I/O.
#[derive(Debug, Clone, Default)]
pub struct ListingCase {
    /// Records returned by the listing endpoint.
    pub records: Vec<Record>,
    /// The sort parameters the request carried.
    pub sort: SortSpec,
    /// The filter parameters the request carried.
    pub filter: FilterSpec,
    /// The view parameters the request carried.
    pub view: ViewSpec,
    /// Declared field types, when a schema collaborator supplied them.
    pub schema: Option<EntitySchema>,
    /// Notifications/warnings the API attached to the response.
    pub notifications: NotificationLog,
    /// The raw response body, used to locate the pagination envelope.
    pub raw_body: Option<Vec<u8>>,
    /// The request path, used to decide pagination applicability.
    pub request_path: Option<String>,
}

/// Stateless verification engine composing the validators per test case.
///
/// Constructed per call site; holds no mutable state, so concurrent
/// verification of unrelated test cases is safe by construction.
#[derive(Debug, Clone)]
pub struct VerificationService {
    api_root: String,
}

impl VerificationService {
    /// Creates a verification service for an API mounted at `api_root`.
    #[must_use]
    pub fn new(api_root: impl Into<String>) -> Self {
        Self {
            api_root: api_root.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Verifies one listing response against its request parameters.
    ///
    /// All recoverable problems become issue strings; the returned verdict
    /// is always complete. A failing verdict carries at least one issue.
    #[must_use]
    pub fn verify_listing(&self, case: &ListingCase) -> Verdict {
        let mut outcome = Outcome::default();

        sort::check_sort_order(
            &case.records,
            &case.sort,
            case.schema.as_ref(),
            &case.notifications,
            &mut outcome,
        );
        filter::check_filters(
            &case.records,
            &case.filter,
            case.schema.as_ref(),
            &case.notifications,
            &mut outcome,
        );
        view::collect_view_fields(&case.records, &case.view, &case.notifications, &mut outcome);

        if let (Some(raw_body), Some(path)) = (case.raw_body.as_deref(), case.request_path.as_deref())
            && pagination::is_collection_path(path, self.api_root.as_str())
        {
            pagination::check_envelope(raw_body, case.records.len(), &mut outcome);
        }

        outcome.finish()
    }

    /// Verifies a full paged traversal fetched by the paging collaborator.
    ///
    /// Proves the accumulated count matches the independently reported
    /// total, the page count matches `ceil(total / page_size)`, and the
    /// sort key is present, unique, and strictly increasing across the
    /// entire traversal rather than merely within each page.
    #[must_use]
    pub fn verify_traversal(
        &self,
        pages: &[FetchedPage],
        page_size: u64,
        expected_total: u64,
        sort_field: &str,
    ) -> Verdict {
        let mut outcome = Outcome::default();
        pagination::check_traversal(pages, page_size, expected_total, sort_field, &mut outcome);
        outcome.finish()
    }
}

/// Accumulates issues and extracted fields while a test case is scanned.
#[derive(Debug, Default)]
pub(crate) struct Outcome {
    issues: Vec<String>,
    fields: BTreeMap<String, Vec<Value>>,
}

impl Outcome {
    pub(crate) fn issue(&mut self, message: impl Into<String>) {
        self.issues.push(message.into());
    }

    pub(crate) fn record_field(&mut self, key: impl Into<String>, values: Vec<Value>) {
        self.fields.insert(key.into(), values);
    }

    pub(crate) fn finish(self) -> Verdict {
        Verdict::new(self.issues, self.fields)
    }
}
