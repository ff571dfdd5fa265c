//! Per-entity services over the shared attribute store.
//!
//! Every write runs in one transaction: base row, then one reconcile
//! pass per attribute kind, then the ACL replacement, then the
//! memberships the entity owns. The response view is re-fetched inside
//! the same transaction. Reads never open a transaction.
//!
//! Concurrent updates to the same entity are last-writer-wins at the row
//! level; there is no version column. Two diffs computed against stale
//! reads can interleave. Known limitation.

use std::collections::HashMap;

use sea_orm::{ConnectionTrait, DatabaseConnection};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::model::{
    AttributeSet, CounterValue, DescriptionValue, EntityKind, FileValue, Method, PermissionInput,
    PermissionView, PointValue, StringValue,
};
use crate::infra::storage::attrs;

mod blocks;
mod elements;
mod files;
mod groups;
mod points;
mod sections;
mod users;

pub use blocks::BlockWrite;
pub use elements::ElementWrite;
pub use files::FileWrite;
pub use groups::GroupWrite;
pub use points::PointWrite;
pub use sections::SectionWrite;
pub use users::{AuthenticatedUser, Registration, UserWrite};

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    /// Group granted an ALL entry on every created resource.
    pub admin_group: String,
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            admin_group: "admins".to_owned(),
            default_limit: 50,
            max_limit: 200,
        }
    }
}

/// The catalog service. One instance per process; per-entity operations
/// live in sibling files, one `impl` block each.
pub struct Catalog {
    db: DatabaseConnection,
    cfg: CatalogConfig,
}

impl Catalog {
    #[must_use]
    pub fn new(db: DatabaseConnection, cfg: CatalogConfig) -> Self {
        Self { db, cfg }
    }

    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub(crate) fn cfg(&self) -> &CatalogConfig {
        &self.cfg
    }

    /// Caller-submitted ACL plus the admin `ALL` entry injected on every
    /// create path. Updates replace the list verbatim, without
    /// injection.
    pub(crate) fn acl_for_create(&self, submitted: &[PermissionInput]) -> Vec<PermissionInput> {
        let admin = PermissionInput {
            group_id: Some(self.cfg.admin_group.clone()),
            method: Method::All,
        };
        let mut entries = submitted.to_vec();
        if !entries.contains(&admin) {
            entries.push(admin);
        }
        entries
    }
}

/// Validate a caller-supplied id or mint a server-side one.
pub(crate) fn prepare_id(submitted: Option<String>) -> Result<String, DomainError> {
    match submitted {
        Some(id) => {
            let id = id.trim().to_owned();
            if id.is_empty() {
                Err(DomainError::wrong_data("id", "must not be empty"))
            } else {
                Ok(id)
            }
        }
        None => Ok(Uuid::now_v7().to_string()),
    }
}

// ============================================================================
// View assembly
// ============================================================================

fn string_value(m: crate::infra::storage::entity::attr_string::Model) -> StringValue {
    StringValue {
        id: m.id,
        attribute_id: m.attribute_id,
        language_id: m.language_id,
        value: m.value,
    }
}

fn description_value(
    m: crate::infra::storage::entity::attr_description::Model,
) -> DescriptionValue {
    DescriptionValue {
        id: m.id,
        attribute_id: m.attribute_id,
        language_id: m.language_id,
        value: m.value,
    }
}

fn point_value(m: crate::infra::storage::entity::attr_point::Model) -> PointValue {
    PointValue {
        id: m.id,
        attribute_id: m.attribute_id,
        point_id: m.point_id,
    }
}

fn counter_value(m: crate::infra::storage::entity::attr_counter::Model) -> CounterValue {
    CounterValue {
        id: m.id,
        attribute_id: m.attribute_id,
        point_id: m.point_id,
        measure_id: m.measure_id,
        count: m.count,
    }
}

fn file_value(m: crate::infra::storage::entity::attr_file::Model) -> FileValue {
    FileValue {
        id: m.id,
        attribute_id: m.attribute_id,
        file_id: m.file_id,
    }
}

fn permission_view(m: crate::infra::storage::entity::acl_entry::Model) -> PermissionView {
    PermissionView {
        group: m.group_id,
        method: Method::parse(&m.method).unwrap_or(Method::Read),
    }
}

/// Load the grouped attribute rows of one entity.
pub(crate) async fn load_attribute_set<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    id: &str,
) -> Result<AttributeSet, DomainError> {
    Ok(AttributeSet {
        strings: attrs::load_strings(conn, kind, id)
            .await?
            .into_iter()
            .map(string_value)
            .collect(),
        descriptions: attrs::load_descriptions(conn, kind, id)
            .await?
            .into_iter()
            .map(description_value)
            .collect(),
        points: attrs::load_points(conn, kind, id)
            .await?
            .into_iter()
            .map(point_value)
            .collect(),
        counters: attrs::load_counters(conn, kind, id)
            .await?
            .into_iter()
            .map(counter_value)
            .collect(),
        files: attrs::load_files(conn, kind, id)
            .await?
            .into_iter()
            .map(file_value)
            .collect(),
    })
}

pub(crate) async fn load_permission_views<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    id: &str,
) -> Result<Vec<PermissionView>, DomainError> {
    let ids = [id.to_owned()];
    let map = attrs::acl_by_parent(conn, kind, &ids).await?;
    Ok(map
        .into_values()
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(permission_view)
        .collect())
}

/// Batched attribute sets for a list page, keyed by entity id. Entities
/// without rows get the empty set.
pub(crate) async fn load_attribute_sets<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    ids: &[String],
) -> Result<HashMap<String, AttributeSet>, DomainError> {
    let mut out: HashMap<String, AttributeSet> = ids
        .iter()
        .map(|id| (id.clone(), AttributeSet::default()))
        .collect();

    for (parent, rows) in attrs::strings_by_parent(conn, kind, ids).await? {
        if let Some(set) = out.get_mut(&parent) {
            set.strings = rows.into_iter().map(string_value).collect();
        }
    }
    for (parent, rows) in attrs::descriptions_by_parent(conn, kind, ids).await? {
        if let Some(set) = out.get_mut(&parent) {
            set.descriptions = rows.into_iter().map(description_value).collect();
        }
    }
    for (parent, rows) in attrs::points_by_parent(conn, kind, ids).await? {
        if let Some(set) = out.get_mut(&parent) {
            set.points = rows.into_iter().map(point_value).collect();
        }
    }
    for (parent, rows) in attrs::counters_by_parent(conn, kind, ids).await? {
        if let Some(set) = out.get_mut(&parent) {
            set.counters = rows.into_iter().map(counter_value).collect();
        }
    }
    for (parent, rows) in attrs::files_by_parent(conn, kind, ids).await? {
        if let Some(set) = out.get_mut(&parent) {
            set.files = rows.into_iter().map(file_value).collect();
        }
    }
    Ok(out)
}

pub(crate) async fn load_permission_view_map<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    ids: &[String],
) -> Result<HashMap<String, Vec<PermissionView>>, DomainError> {
    let mut out: HashMap<String, Vec<PermissionView>> =
        ids.iter().map(|id| (id.clone(), Vec::new())).collect();
    for (parent, rows) in attrs::acl_by_parent(conn, kind, ids).await? {
        if let Some(views) = out.get_mut(&parent) {
            *views = rows.into_iter().map(permission_view).collect();
        }
    }
    Ok(out)
}

#[cfg(test)]
mod service_test;
