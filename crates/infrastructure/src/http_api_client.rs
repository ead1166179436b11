use async_trait::async_trait;
use http::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;
use veriqry_application::{CrudProbe, EntityCatalog, PrincipalDirectory, RoleDirectory};
use veriqry_core::{AppError, AppResult};
use veriqry_domain::{
    CrudOperation, ExpandedPermissions, FetchedPage, NotificationLog, PageEnvelope, RawPermissions,
    Record,
};

/// One fetched listing response, decoded for the verification service.
#[derive(Debug, Clone)]
pub struct ListingResponse {
    /// The request path (with query) the listing was fetched from.
    pub request_path: String,
    /// Decoded records from the response's `data` array.
    pub records: Vec<Record>,
    /// The raw response body, kept for pagination-envelope location.
    pub raw_body: Vec<u8>,
    /// The response's notification/warning channel.
    pub notifications: NotificationLog,
}

/// HTTP adapter for the transport and permission-verifier collaborators.
///
/// Any I/O or decoding failure maps to [`AppError::Transport`] so the
/// affected verification aborts as inconclusive instead of producing a
/// partial score. The client performs no retries.
pub struct HttpApiClient {
    http_client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
    probe_record_id: String,
}

impl HttpApiClient {
    /// Creates a client for an API mounted at `base_url` (including the
    /// API root segment, e.g. `http://127.0.0.1:3001/api`).
    ///
    /// Update and delete probes target a per-client disposable record
    /// identifier, so probe traffic never touches real fixture rows.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        bearer_token: Option<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            bearer_token,
            probe_record_id: format!("contract-probe-{}", Uuid::new_v4()),
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json(&self, path: &str) -> AppResult<Value> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .authorized(self.http_client.get(url))
            .send()
            .await
            .map_err(|error| AppError::Transport(format!("failed to call '{path}': {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_owned());
            return Err(AppError::Transport(format!(
                "'{path}' returned status {}: {body}",
                status.as_u16()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|error| AppError::Transport(format!("'{path}' returned invalid JSON: {error}")))
    }

    /// Fetches one listing response with its raw body and notifications.
    pub async fn fetch_listing(&self, path_and_query: &str) -> AppResult<ListingResponse> {
        let url = format!("{}{path_and_query}", self.base_url);
        debug!(path = %path_and_query, "fetching listing");

        let response = self
            .authorized(self.http_client.get(url))
            .send()
            .await
            .map_err(|error| {
                AppError::Transport(format!("failed to call '{path_and_query}': {error}"))
            })?;

        let status = response.status();
        let raw_body = response
            .bytes()
            .await
            .map_err(|error| {
                AppError::Transport(format!(
                    "failed to read body of '{path_and_query}': {error}"
                ))
            })?
            .to_vec();

        if !status.is_success() {
            return Err(AppError::Transport(format!(
                "'{path_and_query}' returned status {}",
                status.as_u16()
            )));
        }

        let body: Value = serde_json::from_slice(&raw_body).map_err(|error| {
            AppError::Transport(format!(
                "'{path_and_query}' returned invalid JSON: {error}"
            ))
        })?;

        let items = match body.get("data") {
            Some(Value::Array(items)) => items.clone(),
            _ => body.as_array().cloned().unwrap_or_default(),
        };
        let mut records = Vec::with_capacity(items.len());
        for item in items {
            match Record::new(item) {
                Ok(record) => records.push(record),
                Err(error) => {
                    warn!(path = %path_and_query, error = %error, "skipping malformed record");
                }
            }
        }

        let notifications = NotificationLog::from_response_value(
            body.get("notifications")
                .or_else(|| body.get("warnings"))
                .cloned(),
        );

        Ok(ListingResponse {
            request_path: path_and_query.to_owned(),
            records,
            raw_body,
            notifications,
        })
    }

    /// Walks every page of a collection at a fixed size, feeding the
    /// full-traversal consistency check.
    pub async fn walk_pages(
        &self,
        collection_path: &str,
        page_size: u64,
    ) -> AppResult<Vec<FetchedPage>> {
        let mut pages = Vec::new();
        let mut page_number = 1_u64;

        loop {
            let separator = if collection_path.contains('?') { '&' } else { '?' };
            let path =
                format!("{collection_path}{separator}page={page_number}&pageSize={page_size}");
            let listing = self.fetch_listing(path.as_str()).await?;

            let Some(envelope) = PageEnvelope::locate(&listing.raw_body) else {
                return Err(AppError::Transport(format!(
                    "page {page_number} of '{collection_path}' has no pagination envelope to continue the traversal"
                )));
            };

            let total_pages = envelope.total_pages;
            pages.push(FetchedPage {
                records: listing.records,
                envelope,
            });

            if page_number >= total_pages {
                break;
            }
            page_number += 1;
        }

        debug!(path = %collection_path, pages = pages.len(), "walked collection");
        Ok(pages)
    }

    /// Fetches the expanded permissions the service advertises for a
    /// principal.
    pub async fn fetch_expanded_permissions(
        &self,
        principal: &str,
    ) -> AppResult<ExpandedPermissions> {
        let body = self
            .get_json(format!("/identity/{principal}/permissions").as_str())
            .await?;
        let document = body.get("data").unwrap_or(&body);

        serde_json::from_value(document.clone()).map_err(|error| {
            AppError::Transport(format!(
                "advertised permissions for '{principal}' are malformed: {error}"
            ))
        })
    }
}

#[async_trait]
impl EntityCatalog for HttpApiClient {
    async fn list_entity_names(&self) -> AppResult<Vec<String>> {
        let body = self.get_json("/metadata/entities").await?;
        let items = body
            .get("data")
            .and_then(Value::as_array)
            .or_else(|| body.as_array())
            .cloned()
            .unwrap_or_default();

        let names = items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(name.clone()),
                Value::Object(object) => object
                    .get("logicalName")
                    .or_else(|| object.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                _ => None,
            })
            .collect();

        Ok(names)
    }
}

#[async_trait]
impl PrincipalDirectory for HttpApiClient {
    async fn resolve_role(&self, principal: &str) -> AppResult<String> {
        let body = self
            .get_json(format!("/identity/{principal}").as_str())
            .await?;
        let document = body.get("data").unwrap_or(&body);

        document
            .get("role")
            .or_else(|| document.get("roleId"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| {
                AppError::NotFound(format!("principal '{principal}' has no role binding"))
            })
    }
}

#[async_trait]
impl RoleDirectory for HttpApiClient {
    async fn fetch_raw_permissions(&self, role: &str) -> AppResult<RawPermissions> {
        let body = self.get_json(format!("/roles/{role}").as_str()).await?;
        let document = body.get("data").unwrap_or(&body);
        let permissions = document.get("permissions").unwrap_or(document);

        RawPermissions::from_value(permissions)
    }
}

#[async_trait]
impl CrudProbe for HttpApiClient {
    async fn probe(&self, entity: &str, operation: CrudOperation) -> AppResult<StatusCode> {
        let collection = format!("{}/data/{entity}", self.base_url);
        let member = format!("{collection}/{}", self.probe_record_id);
        let marker = Uuid::new_v4().to_string();

        let builder = match operation {
            CrudOperation::Create => self
                .http_client
                .post(collection)
                .json(&serde_json::json!({ "probeId": marker })),
            CrudOperation::Read => self.http_client.get(collection),
            CrudOperation::Update => self
                .http_client
                .patch(member)
                .json(&serde_json::json!({ "probeId": marker })),
            CrudOperation::Delete => self.http_client.delete(member),
        };

        let response = self.authorized(builder).send().await.map_err(|error| {
            AppError::Transport(format!(
                "{} probe on '{entity}' failed: {error}",
                operation.as_str()
            ))
        })?;

        debug!(
            entity = %entity,
            operation = %operation.as_str(),
            status = response.status().as_u16(),
            "crud probe completed"
        );
        Ok(response.status())
    }
}
