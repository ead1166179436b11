//! Verification services and ports.

#![forbid(unsafe_code)]

mod comparator;
mod field_extract;
mod permission_verifier;
mod verification_service;
mod verifier_ports;

pub use comparator::{compare_values, values_match_eq};
pub use field_extract::{FieldEntry, extract_field, extract_nested_field};
pub use permission_verifier::PermissionVerifier;
pub use verification_service::{ListingCase, VerificationService};
pub use verifier_ports::{CrudProbe, EntityCatalog, PrincipalDirectory, RoleDirectory};
