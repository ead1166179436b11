//! Veriqry contract-verification runner.
//!
//! Loads a batch of test cases from a JSON file, fetches each response
//! from the target API, and verifies the response against the parameters
//! that produced it. Exits non-zero when any verification fails.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;
use veriqry_application::{ListingCase, PermissionVerifier, VerificationService};
use veriqry_core::{AppError, AppResult};
use veriqry_domain::{
    EntitySchema, FieldFilter, FieldType, FilterCondition, FilterSpec, SortKey, SortSpec, Verdict,
    ViewEntry, ViewSpec,
};
use veriqry_infrastructure::HttpApiClient;

#[derive(Debug, Clone)]
struct RunnerConfig {
    api_base_url: String,
    api_root: String,
    bearer_token: Option<String>,
    cases_file: String,
    timeout_seconds: u64,
}

impl RunnerConfig {
    fn load() -> AppResult<Self> {
        let api_base_url = env::var("VERIQRY_API_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3001/api".to_owned())
            .trim_end_matches('/')
            .to_owned();
        let api_root = Url::parse(api_base_url.as_str())
            .map_err(|error| {
                AppError::Validation(format!("invalid VERIQRY_API_BASE_URL '{api_base_url}': {error}"))
            })?
            .path()
            .to_owned();
        let bearer_token = env::var("VERIQRY_BEARER_TOKEN")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        let cases_file = required_env("VERIQRY_CASES_FILE")?;
        let timeout_seconds = parse_env_u64("VERIQRY_HTTP_TIMEOUT_SECONDS", 15)?;

        Ok(Self {
            api_base_url,
            api_root,
            bearer_token,
            cases_file,
            timeout_seconds,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CaseFileConfig {
    #[serde(default)]
    listings: Vec<ListingCaseConfig>,
    #[serde(default)]
    traversals: Vec<TraversalCaseConfig>,
    #[serde(default)]
    permissions: Vec<PermissionCaseConfig>,
}

#[derive(Debug, Deserialize)]
struct ListingCaseConfig {
    path: String,
    #[serde(default)]
    sort: Vec<SortKeyConfig>,
    #[serde(default)]
    filter: Vec<FieldFilterConfig>,
    #[serde(default)]
    view: Vec<ViewEntryConfig>,
    #[serde(default)]
    schema: Option<SchemaConfig>,
}

#[derive(Debug, Deserialize)]
struct SortKeyConfig {
    field: String,
    #[serde(default)]
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FieldFilterConfig {
    field: String,
    conditions: Vec<FilterConditionConfig>,
}

#[derive(Debug, Deserialize)]
struct FilterConditionConfig {
    operator: String,
    value: Value,
}

#[derive(Debug, Deserialize)]
struct ViewEntryConfig {
    entity: String,
    fields: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SchemaConfig {
    entity: String,
    fields: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TraversalCaseConfig {
    path: String,
    page_size: u64,
    expected_total: u64,
    sort_field: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PermissionCaseConfig {
    principal: String,
    probe_entity: String,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = RunnerConfig::load()?;
    let cases = load_cases(config.cases_file.as_str())?;
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let api_client = Arc::new(HttpApiClient::new(
        http_client,
        config.api_base_url.clone(),
        config.bearer_token.clone(),
    ));
    let verification_service = VerificationService::new(config.api_root.clone());

    info!(
        api_base_url = %config.api_base_url,
        listings = cases.listings.len(),
        traversals = cases.traversals.len(),
        permissions = cases.permissions.len(),
        "veriqry-runner started"
    );

    let mut total = 0_usize;
    let mut failed = 0_usize;

    for listing in &cases.listings {
        total += 1;
        match run_listing_case(&verification_service, &api_client, &config, listing).await {
            Ok(verdict) => report_verdict(format!("listing {}", listing.path).as_str(), &verdict, &mut failed),
            Err(error) => {
                failed += 1;
                warn!(case = %listing.path, error = %error, "listing verification inconclusive");
            }
        }
    }

    for traversal in &cases.traversals {
        total += 1;
        match api_client
            .walk_pages(traversal.path.as_str(), traversal.page_size)
            .await
        {
            Ok(pages) => {
                let verdict = verification_service.verify_traversal(
                    &pages,
                    traversal.page_size,
                    traversal.expected_total,
                    traversal.sort_field.as_str(),
                );
                report_verdict(format!("traversal {}", traversal.path).as_str(), &verdict, &mut failed);
            }
            Err(error) => {
                failed += 1;
                warn!(case = %traversal.path, error = %error, "traversal verification inconclusive");
            }
        }
    }

    // CRUD probes mutate shared fixtures, so permission cases run strictly
    // one after another even if listing cases are ever parallelized.
    let permission_verifier = PermissionVerifier::new(
        api_client.clone(),
        api_client.clone(),
        api_client.clone(),
        api_client.clone(),
    );
    for case in &cases.permissions {
        total += 1;
        match run_permission_case(&permission_verifier, &api_client, case).await {
            Ok(verdict) => report_verdict(
                format!("permissions {}", case.principal).as_str(),
                &verdict,
                &mut failed,
            ),
            Err(error) => {
                failed += 1;
                warn!(case = %case.principal, error = %error, "permission verification inconclusive");
            }
        }
    }

    if failed > 0 {
        return Err(AppError::Validation(format!(
            "{failed} of {total} verifications failed"
        )));
    }

    info!(total, "all verifications passed");
    Ok(())
}

async fn run_listing_case(
    verification_service: &VerificationService,
    api_client: &HttpApiClient,
    config: &RunnerConfig,
    case: &ListingCaseConfig,
) -> AppResult<Verdict> {
    let response = api_client.fetch_listing(case.path.as_str()).await?;

    let listing = ListingCase {
        records: response.records,
        sort: SortSpec::new(
            case.sort
                .iter()
                .map(|key| SortKey::new(key.field.clone(), key.direction.clone()))
                .collect(),
        ),
        filter: FilterSpec::new(
            case.filter
                .iter()
                .map(|field| {
                    FieldFilter::new(
                        field.field.clone(),
                        field
                            .conditions
                            .iter()
                            .map(|condition| {
                                FilterCondition::new(
                                    condition.operator.clone(),
                                    condition.value.clone(),
                                )
                            })
                            .collect(),
                    )
                })
                .collect(),
        ),
        view: ViewSpec::new(
            case.view
                .iter()
                .map(|entry| ViewEntry::new(entry.entity.clone(), entry.fields.clone()))
                .collect(),
        ),
        schema: case.schema.as_ref().map(build_schema).transpose()?,
        notifications: response.notifications,
        raw_body: Some(response.raw_body),
        request_path: Some(format!("{}{}", config.api_root, response.request_path)),
    };

    Ok(verification_service.verify_listing(&listing))
}

async fn run_permission_case(
    permission_verifier: &PermissionVerifier,
    api_client: &HttpApiClient,
    case: &PermissionCaseConfig,
) -> AppResult<Verdict> {
    let observed = api_client
        .fetch_expanded_permissions(case.principal.as_str())
        .await?;

    permission_verifier
        .verify(
            case.principal.as_str(),
            &observed,
            case.probe_entity.as_str(),
        )
        .await
}

fn build_schema(config: &SchemaConfig) -> AppResult<EntitySchema> {
    let mut fields = BTreeMap::new();
    for (field, field_type) in &config.fields {
        fields.insert(field.clone(), FieldType::from_str(field_type.as_str())?);
    }

    EntitySchema::new(config.entity.clone(), fields)
}

fn report_verdict(case: &str, verdict: &Verdict, failed: &mut usize) {
    if verdict.passed() {
        info!(case = %case, "verification passed");
        return;
    }

    *failed += 1;
    for issue in verdict.issues() {
        warn!(case = %case, issue = %issue, "verification issue");
    }
}

fn load_cases(path: &str) -> AppResult<CaseFileConfig> {
    let raw = std::fs::read(path).map_err(|error| {
        AppError::Validation(format!("failed to read cases file '{path}': {error}"))
    })?;

    serde_json::from_slice(&raw).map_err(|error| {
        AppError::Validation(format!("cases file '{path}' is malformed: {error}"))
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
