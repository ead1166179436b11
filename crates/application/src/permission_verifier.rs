use std::collections::BTreeMap;
use std::sync::Arc;

use http::StatusCode;
use veriqry_core::AppResult;
use veriqry_domain::{CrudOperation, ExpandedPermissions, Verdict};

use crate::verifier_ports::{CrudProbe, EntityCatalog, PrincipalDirectory, RoleDirectory};

#[cfg(test)]
mod tests;

/// Verifies a principal's advertised per-entity CRUD permissions against
/// an independently recomputed expansion of its role.
///
/// The service trusts none of the target's own expansion: it re-derives
/// the expected dashboard and entity map from the role's raw permission
/// document and diffs the result against what the service advertised,
/// then probes one representative entity with live CRUD calls.
#[derive(Clone)]
pub struct PermissionVerifier {
    catalog: Arc<dyn EntityCatalog>,
    principals: Arc<dyn PrincipalDirectory>,
    roles: Arc<dyn RoleDirectory>,
    probe: Arc<dyn CrudProbe>,
}

impl PermissionVerifier {
    /// Creates a permission verifier from its collaborator ports.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn EntityCatalog>,
        principals: Arc<dyn PrincipalDirectory>,
        roles: Arc<dyn RoleDirectory>,
        probe: Arc<dyn CrudProbe>,
    ) -> Self {
        Self {
            catalog,
            principals,
            roles,
            probe,
        }
    }

    /// Returns the status a probe must observe for an operation under the
    /// given effective permission string.
    #[must_use]
    pub fn expected_probe_status(
        operation: CrudOperation,
        permission: Option<&str>,
    ) -> StatusCode {
        let allowed = permission.is_some_and(|letters| operation.permitted_by(letters));
        match (operation, allowed) {
            (CrudOperation::Create, true) => StatusCode::CREATED,
            (_, true) => StatusCode::OK,
            (_, false) => StatusCode::FORBIDDEN,
        }
    }

    /// Verifies the observed expansion for one principal.
    ///
    /// The four steps run strictly in order because each depends on the
    /// previous result: entity catalog, role binding, raw permission
    /// document, then the diff and probes. Any collaborator failure
    /// aborts the verification with a transport error rather than
    /// producing a partial verdict: a verification whose expected
    /// baseline could not be computed is inconclusive, not passing.
    pub async fn verify(
        &self,
        principal: &str,
        observed: &ExpandedPermissions,
        probe_entity: &str,
    ) -> AppResult<Verdict> {
        let entity_names = self.catalog.list_entity_names().await?;
        let role = self.principals.resolve_role(principal).await?;
        let raw_permissions = self.roles.fetch_raw_permissions(role.as_str()).await?;
        let expected = raw_permissions.expand(&entity_names);

        let mut issues = Vec::new();

        for entity in expected.dashboard().difference(observed.dashboard()) {
            issues.push(format!(
                "dashboard is missing entity '{entity}' granted by role '{role}'"
            ));
        }
        for entity in observed.dashboard().difference(expected.dashboard()) {
            issues.push(format!(
                "dashboard advertises entity '{entity}' that role '{role}' does not grant"
            ));
        }

        for (entity, expected_letters) in expected.entity() {
            match observed.entity_permission(entity) {
                Some(actual) if actual == expected_letters => {}
                Some(actual) => issues.push(format!(
                    "entity '{entity}': expected permission '{expected_letters}', got '{actual}'"
                )),
                None => issues.push(format!(
                    "entity '{entity}': expected permission '{expected_letters}', got none"
                )),
            }
        }
        for (entity, actual) in observed.entity() {
            if !expected.entity().contains_key(entity) {
                issues.push(format!(
                    "entity '{entity}' advertises permission '{actual}' that role '{role}' does not grant"
                ));
            }
        }

        if expected.reports().len() != observed.reports().len() {
            issues.push(format!(
                "reports length mismatch: expected {}, got {}",
                expected.reports().len(),
                observed.reports().len()
            ));
        }

        let probe_permission = expected.entity_permission(probe_entity);
        for operation in CrudOperation::ALL {
            let expected_status = Self::expected_probe_status(operation, probe_permission);
            let actual_status = self.probe.probe(probe_entity, operation).await?;
            if actual_status != expected_status {
                issues.push(format!(
                    "probe {} on '{probe_entity}': expected status {}, got {}",
                    operation.as_str(),
                    expected_status.as_u16(),
                    actual_status.as_u16()
                ));
            }
        }

        Ok(Verdict::new(issues, BTreeMap::new()))
    }
}
