use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Record;

/// The integer pagination envelope a collection response must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope {
    /// Current page number, 1-based.
    pub page: u64,
    /// Requested page size.
    pub page_size: u64,
    /// Total matching records across all pages.
    pub total: u64,
    /// Total page count declared by the service.
    pub total_pages: u64,
}

impl PageEnvelope {
    /// Locates the `pagination` object inside a raw response body.
    ///
    /// Returns `None` when the body is not JSON, carries no `pagination`
    /// key, or the object is not a complete integer envelope.
    #[must_use]
    pub fn locate(raw_body: &[u8]) -> Option<Self> {
        let body: Value = serde_json::from_slice(raw_body).ok()?;
        let envelope = body.get("pagination")?;
        serde_json::from_value(envelope.clone()).ok()
    }
}

/// One fetched page of a full traversal, already decoded by the transport
/// collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// Records returned for this page.
    pub records: Vec<Record>,
    /// The page's pagination envelope.
    pub envelope: PageEnvelope,
}

#[cfg(test)]
mod tests {
    use super::PageEnvelope;

    #[test]
    fn locates_camel_case_envelope() {
        let body = br#"{"data": [], "pagination": {"page": 1, "pageSize": 8, "total": 23, "totalPages": 3}}"#;
        let envelope = PageEnvelope::locate(body);
        assert_eq!(
            envelope,
            Some(PageEnvelope {
                page: 1,
                page_size: 8,
                total: 23,
                total_pages: 3,
            })
        );
    }

    #[test]
    fn missing_or_partial_envelope_is_none() {
        assert_eq!(PageEnvelope::locate(br#"{"data": []}"#), None);
        assert_eq!(PageEnvelope::locate(b"not json"), None);
        assert_eq!(
            PageEnvelope::locate(br#"{"pagination": {"page": 1, "pageSize": 8}}"#),
            None
        );
    }
}
