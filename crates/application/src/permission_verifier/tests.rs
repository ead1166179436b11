use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use veriqry_core::{AppError, AppResult};
use veriqry_domain::{CrudOperation, ExpandedPermissions, RawPermissions};

use super::PermissionVerifier;
use crate::verifier_ports::{CrudProbe, EntityCatalog, PrincipalDirectory, RoleDirectory};

struct FakeCatalog {
    entities: Vec<String>,
}

#[async_trait]
impl EntityCatalog for FakeCatalog {
    async fn list_entity_names(&self) -> AppResult<Vec<String>> {
        Ok(self.entities.clone())
    }
}

struct FailingCatalog;

#[async_trait]
impl EntityCatalog for FailingCatalog {
    async fn list_entity_names(&self) -> AppResult<Vec<String>> {
        Err(AppError::Transport("entity catalog unreachable".to_owned()))
    }
}

struct FakePrincipals {
    role: String,
}

#[async_trait]
impl PrincipalDirectory for FakePrincipals {
    async fn resolve_role(&self, _principal: &str) -> AppResult<String> {
        Ok(self.role.clone())
    }
}

struct FakeRoles {
    permissions: RawPermissions,
}

#[async_trait]
impl RoleDirectory for FakeRoles {
    async fn fetch_raw_permissions(&self, _role: &str) -> AppResult<RawPermissions> {
        Ok(self.permissions.clone())
    }
}

/// Probe whose observed statuses follow a behavior permission document,
/// which may deliberately differ from the role's raw document.
struct FakeProbe {
    behavior: RawPermissions,
}

#[async_trait]
impl CrudProbe for FakeProbe {
    async fn probe(&self, entity: &str, operation: CrudOperation) -> AppResult<StatusCode> {
        let permission = self.behavior.effective_for(entity);
        Ok(PermissionVerifier::expected_probe_status(
            operation, permission,
        ))
    }
}

fn raw(entries: &[(&str, &str)]) -> RawPermissions {
    RawPermissions::from_entries(
        entries
            .iter()
            .map(|(entity, letters)| ((*entity).to_owned(), (*letters).to_owned())),
    )
}

fn entities(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

fn build_verifier(
    catalog: Vec<String>,
    role_permissions: RawPermissions,
    probe_behavior: RawPermissions,
) -> PermissionVerifier {
    PermissionVerifier::new(
        Arc::new(FakeCatalog { entities: catalog }),
        Arc::new(FakePrincipals {
            role: "analyst".to_owned(),
        }),
        Arc::new(FakeRoles {
            permissions: role_permissions,
        }),
        Arc::new(FakeProbe {
            behavior: probe_behavior,
        }),
    )
}

#[tokio::test]
async fn matching_expansion_and_probes_pass() {
    let role = raw(&[("User", "cru"), ("*", "r")]);
    let verifier = build_verifier(entities(&["User", "Account", "Event"]), role.clone(), role.clone());
    let observed = role.expand(&entities(&["User", "Account", "Event"]));

    let verdict = verifier.verify("alice", &observed, "User").await;

    match verdict {
        Ok(verdict) => {
            assert!(verdict.passed(), "issues: {:?}", verdict.issues());
        }
        Err(error) => panic!("verification must complete: {error}"),
    }
}

#[tokio::test]
async fn missing_dashboard_entity_is_reported() {
    let role = raw(&[("User", "cru"), ("*", "r")]);
    let verifier = build_verifier(entities(&["User", "Account"]), role.clone(), role.clone());

    let mut observed = role.expand(&entities(&["User", "Account"]));
    observed = ExpandedPermissions::new(
        observed
            .dashboard()
            .iter()
            .filter(|entity| entity.as_str() != "Account")
            .cloned()
            .collect(),
        observed
            .entity()
            .iter()
            .filter(|(entity, _)| entity.as_str() != "Account")
            .map(|(entity, letters)| (entity.clone(), letters.clone()))
            .collect(),
        Vec::new(),
    );

    let verdict = verifier.verify("alice", &observed, "User").await;

    match verdict {
        Ok(verdict) => {
            assert!(!verdict.passed());
            assert!(
                verdict
                    .issues()
                    .iter()
                    .any(|issue| issue.contains("missing entity 'Account'"))
            );
        }
        Err(error) => panic!("verification must complete: {error}"),
    }
}

#[tokio::test]
async fn entity_permission_mismatch_is_reported() {
    let role = raw(&[("User", "cru")]);
    let verifier = build_verifier(entities(&["User"]), role.clone(), role.clone());

    let observed = raw(&[("User", "r")]).expand(&entities(&["User"]));

    let verdict = verifier.verify("alice", &observed, "User").await;

    match verdict {
        Ok(verdict) => {
            assert!(
                verdict
                    .issues()
                    .iter()
                    .any(|issue| issue.contains("expected permission 'cru', got 'r'"))
            );
        }
        Err(error) => panic!("verification must complete: {error}"),
    }
}

#[tokio::test]
async fn probe_status_mismatch_is_reported_by_operation() {
    let role = raw(&[("User", "cru"), ("*", "r")]);
    // The live endpoint behaves as if Account were creatable.
    let behavior = raw(&[("User", "cru"), ("Account", "crud"), ("*", "r")]);
    let verifier = build_verifier(entities(&["User", "Account"]), role.clone(), behavior);
    let observed = role.expand(&entities(&["User", "Account"]));

    let verdict = verifier.verify("alice", &observed, "Account").await;

    match verdict {
        Ok(verdict) => {
            assert!(!verdict.passed());
            assert!(
                verdict
                    .issues()
                    .iter()
                    .any(|issue| issue.contains("probe create on 'Account'")
                        && issue.contains("expected status 403, got 201"))
            );
            assert!(
                verdict
                    .issues()
                    .iter()
                    .any(|issue| issue.contains("probe delete on 'Account'")
                        && issue.contains("expected status 403, got 200"))
            );
        }
        Err(error) => panic!("verification must complete: {error}"),
    }
}

#[tokio::test]
async fn reports_length_mismatch_is_reported() {
    let role = raw(&[("User", "r")]);
    let verifier = build_verifier(entities(&["User"]), role.clone(), role.clone());

    let expanded = role.expand(&entities(&["User"]));
    let observed = ExpandedPermissions::new(
        expanded.dashboard().clone(),
        expanded.entity().clone(),
        vec!["weekly-summary".to_owned()],
    );

    let verdict = verifier.verify("alice", &observed, "User").await;

    match verdict {
        Ok(verdict) => {
            assert!(
                verdict
                    .issues()
                    .iter()
                    .any(|issue| issue.contains("reports length mismatch: expected 0, got 1"))
            );
        }
        Err(error) => panic!("verification must complete: {error}"),
    }
}

#[tokio::test]
async fn transport_failure_aborts_without_partial_verdict() {
    let role = raw(&[("User", "r")]);
    let verifier = PermissionVerifier::new(
        Arc::new(FailingCatalog),
        Arc::new(FakePrincipals {
            role: "analyst".to_owned(),
        }),
        Arc::new(FakeRoles {
            permissions: role.clone(),
        }),
        Arc::new(FakeProbe {
            behavior: role.clone(),
        }),
    );
    let observed = role.expand(&entities(&["User"]));

    let verdict = verifier.verify("alice", &observed, "User").await;

    assert!(matches!(verdict, Err(AppError::Transport(_))));
}

#[test]
fn expected_probe_statuses_follow_crud_letters() {
    assert_eq!(
        PermissionVerifier::expected_probe_status(CrudOperation::Create, Some("cru")),
        StatusCode::CREATED
    );
    assert_eq!(
        PermissionVerifier::expected_probe_status(CrudOperation::Read, Some("r")),
        StatusCode::OK
    );
    assert_eq!(
        PermissionVerifier::expected_probe_status(CrudOperation::Delete, Some("cru")),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        PermissionVerifier::expected_probe_status(CrudOperation::Update, None),
        StatusCode::FORBIDDEN
    );
}
