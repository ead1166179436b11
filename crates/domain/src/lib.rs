//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod notification;
mod pagination;
mod permissions;
mod record;
mod request;
mod schema;
mod verdict;

pub use notification::{Notification, NotificationLog};
pub use pagination::{FetchedPage, PageEnvelope};
pub use permissions::{CrudOperation, ExpandedPermissions, RawPermissions, WILDCARD_ENTITY};
pub use record::Record;
pub use request::{
    FieldFilter, FilterCondition, FilterOperator, FilterSpec, SortDirection, SortKey, SortSpec,
    ViewEntry, ViewSpec,
};
pub use schema::{EntitySchema, FieldType};
pub use verdict::Verdict;
