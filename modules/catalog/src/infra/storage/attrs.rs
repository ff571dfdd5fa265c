//! Attribute store: loads stored attribute rows and applies
//! reconciliation plans on the caller-supplied connection (a transaction
//! for every write path).
//!
//! These functions are the only writers of the shared attribute and ACL
//! tables. Deletes are batched by id, updates touch only the changed
//! payload columns, inserts are batched. Any error aborts the enclosing
//! transaction together with the base-row write.

use std::collections::HashMap;

use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::model::{
    CounterInput, DescriptionInput, EntityKind, FileInput, PermissionInput, PointInput, StringInput,
};
use crate::domain::permission::AclEntry;
use crate::domain::sync::{counter_key, reconcile, text_key};

use super::entity::{
    acl_entry, attr_counter, attr_description, attr_file, attr_point, attr_string, element_block,
    element_section, user_group,
};

// ============================================================================
// Strings
// ============================================================================

pub async fn load_strings<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    parent: &str,
) -> Result<Vec<attr_string::Model>, DomainError> {
    Ok(attr_string::Entity::find()
        .filter(attr_string::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_string::Column::ParentId.eq(parent))
        .order_by_asc(attr_string::Column::Id)
        .all(conn)
        .await?)
}

pub async fn sync_strings<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    parent: &str,
    desired: &[StringInput],
) -> Result<(), DomainError> {
    let existing = load_strings(conn, kind, parent).await?;
    let plan = reconcile(
        existing,
        desired.to_vec(),
        |r| text_key(&r.attribute_id, r.language_id.as_deref()),
        |i| text_key(&i.attribute_id, i.language_id.as_deref()),
        |r, i| r.value != i.value,
    );

    if !plan.delete.is_empty() {
        attr_string::Entity::delete_many()
            .filter(attr_string::Column::Id.is_in(plan.delete.iter().map(|r| r.id)))
            .exec(conn)
            .await?;
    }
    for (row, input) in plan.update {
        let m = attr_string::ActiveModel {
            id: Unchanged(row.id),
            value: Set(input.value),
            ..Default::default()
        };
        m.update(conn).await?;
    }
    if !plan.insert.is_empty() {
        let rows = plan.insert.into_iter().map(|i| attr_string::ActiveModel {
            id: Set(Uuid::now_v7()),
            owner_kind: Set(kind.as_str().to_owned()),
            parent_id: Set(parent.to_owned()),
            attribute_id: Set(i.attribute_id),
            language_id: Set(i.language_id),
            value: Set(i.value),
        });
        attr_string::Entity::insert_many(rows).exec(conn).await?;
    }
    Ok(())
}

// ============================================================================
// Descriptions
// ============================================================================

pub async fn load_descriptions<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    parent: &str,
) -> Result<Vec<attr_description::Model>, DomainError> {
    Ok(attr_description::Entity::find()
        .filter(attr_description::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_description::Column::ParentId.eq(parent))
        .order_by_asc(attr_description::Column::Id)
        .all(conn)
        .await?)
}

pub async fn sync_descriptions<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    parent: &str,
    desired: &[DescriptionInput],
) -> Result<(), DomainError> {
    let existing = load_descriptions(conn, kind, parent).await?;
    let plan = reconcile(
        existing,
        desired.to_vec(),
        |r| text_key(&r.attribute_id, r.language_id.as_deref()),
        |i| text_key(&i.attribute_id, i.language_id.as_deref()),
        |r, i| r.value != i.value,
    );

    if !plan.delete.is_empty() {
        attr_description::Entity::delete_many()
            .filter(attr_description::Column::Id.is_in(plan.delete.iter().map(|r| r.id)))
            .exec(conn)
            .await?;
    }
    for (row, input) in plan.update {
        let m = attr_description::ActiveModel {
            id: Unchanged(row.id),
            value: Set(input.value),
            ..Default::default()
        };
        m.update(conn).await?;
    }
    if !plan.insert.is_empty() {
        let rows = plan
            .insert
            .into_iter()
            .map(|i| attr_description::ActiveModel {
                id: Set(Uuid::now_v7()),
                owner_kind: Set(kind.as_str().to_owned()),
                parent_id: Set(parent.to_owned()),
                attribute_id: Set(i.attribute_id),
                language_id: Set(i.language_id),
                value: Set(i.value),
            });
        attr_description::Entity::insert_many(rows)
            .exec(conn)
            .await?;
    }
    Ok(())
}

// ============================================================================
// Points
// ============================================================================

pub async fn load_points<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    parent: &str,
) -> Result<Vec<attr_point::Model>, DomainError> {
    Ok(attr_point::Entity::find()
        .filter(attr_point::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_point::Column::ParentId.eq(parent))
        .order_by_asc(attr_point::Column::Id)
        .all(conn)
        .await?)
}

pub async fn sync_points<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    parent: &str,
    desired: &[PointInput],
) -> Result<(), DomainError> {
    let existing = load_points(conn, kind, parent).await?;
    let plan = reconcile(
        existing,
        desired.to_vec(),
        |r| (r.attribute_id.clone(), r.point_id.clone()),
        |i| (i.attribute_id.clone(), i.point_id.clone()),
        |_, _| false,
    );

    if !plan.delete.is_empty() {
        attr_point::Entity::delete_many()
            .filter(attr_point::Column::Id.is_in(plan.delete.iter().map(|r| r.id)))
            .exec(conn)
            .await?;
    }
    if !plan.insert.is_empty() {
        let rows = plan.insert.into_iter().map(|i| attr_point::ActiveModel {
            id: Set(Uuid::now_v7()),
            owner_kind: Set(kind.as_str().to_owned()),
            parent_id: Set(parent.to_owned()),
            attribute_id: Set(i.attribute_id),
            point_id: Set(i.point_id),
        });
        attr_point::Entity::insert_many(rows).exec(conn).await?;
    }
    Ok(())
}

// ============================================================================
// Counters
// ============================================================================

pub async fn load_counters<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    parent: &str,
) -> Result<Vec<attr_counter::Model>, DomainError> {
    Ok(attr_counter::Entity::find()
        .filter(attr_counter::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_counter::Column::ParentId.eq(parent))
        .order_by_asc(attr_counter::Column::Id)
        .all(conn)
        .await?)
}

pub async fn sync_counters<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    parent: &str,
    desired: &[CounterInput],
) -> Result<(), DomainError> {
    let existing = load_counters(conn, kind, parent).await?;
    let plan = reconcile(
        existing,
        desired.to_vec(),
        |r| counter_key(&r.attribute_id, r.point_id.as_deref()),
        |i| counter_key(&i.attribute_id, i.point_id.as_deref()),
        |r, i| r.count != i.count || r.measure_id != i.measure_id,
    );

    if !plan.delete.is_empty() {
        attr_counter::Entity::delete_many()
            .filter(attr_counter::Column::Id.is_in(plan.delete.iter().map(|r| r.id)))
            .exec(conn)
            .await?;
    }
    for (row, input) in plan.update {
        let m = attr_counter::ActiveModel {
            id: Unchanged(row.id),
            measure_id: Set(input.measure_id),
            count: Set(input.count),
            ..Default::default()
        };
        m.update(conn).await?;
    }
    if !plan.insert.is_empty() {
        let rows = plan.insert.into_iter().map(|i| attr_counter::ActiveModel {
            id: Set(Uuid::now_v7()),
            owner_kind: Set(kind.as_str().to_owned()),
            parent_id: Set(parent.to_owned()),
            attribute_id: Set(i.attribute_id),
            point_id: Set(i.point_id),
            measure_id: Set(i.measure_id),
            count: Set(i.count),
        });
        attr_counter::Entity::insert_many(rows).exec(conn).await?;
    }
    Ok(())
}

// ============================================================================
// Files
// ============================================================================

pub async fn load_files<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    parent: &str,
) -> Result<Vec<attr_file::Model>, DomainError> {
    Ok(attr_file::Entity::find()
        .filter(attr_file::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_file::Column::ParentId.eq(parent))
        .order_by_asc(attr_file::Column::Id)
        .all(conn)
        .await?)
}

pub async fn sync_files<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    parent: &str,
    desired: &[FileInput],
) -> Result<(), DomainError> {
    let existing = load_files(conn, kind, parent).await?;
    let plan = reconcile(
        existing,
        desired.to_vec(),
        |r| (r.attribute_id.clone(), r.file_id.clone()),
        |i| (i.attribute_id.clone(), i.file_id.clone()),
        |_, _| false,
    );

    if !plan.delete.is_empty() {
        attr_file::Entity::delete_many()
            .filter(attr_file::Column::Id.is_in(plan.delete.iter().map(|r| r.id)))
            .exec(conn)
            .await?;
    }
    if !plan.insert.is_empty() {
        let rows = plan.insert.into_iter().map(|i| attr_file::ActiveModel {
            id: Set(Uuid::now_v7()),
            owner_kind: Set(kind.as_str().to_owned()),
            parent_id: Set(parent.to_owned()),
            attribute_id: Set(i.attribute_id),
            file_id: Set(i.file_id),
        });
        attr_file::Entity::insert_many(rows).exec(conn).await?;
    }
    Ok(())
}

// ============================================================================
// ACL
// ============================================================================

pub async fn load_acl<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    parent: &str,
) -> Result<Vec<AclEntry>, DomainError> {
    let rows = acl_entry::Entity::find()
        .filter(acl_entry::Column::OwnerKind.eq(kind.as_str()))
        .filter(acl_entry::Column::ParentId.eq(parent))
        .order_by_asc(acl_entry::Column::Id)
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(acl_entry_from_row).collect())
}

fn acl_entry_from_row(row: acl_entry::Model) -> AclEntry {
    AclEntry {
        group_id: row.group_id,
        // Unknown method strings cannot appear: only replace_acl writes
        // this table and it serializes the typed enum.
        method: crate::domain::model::Method::parse(&row.method)
            .unwrap_or(crate::domain::model::Method::Read),
    }
}

/// Replace the resource's ACL with the submitted list, verbatim.
///
/// No diffing: row ids change on every call and entries not resubmitted
/// are gone. This is the documented contract of permission updates, not
/// an optimization shortcut.
pub async fn replace_acl<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    parent: &str,
    entries: &[PermissionInput],
) -> Result<(), DomainError> {
    acl_entry::Entity::delete_many()
        .filter(acl_entry::Column::OwnerKind.eq(kind.as_str()))
        .filter(acl_entry::Column::ParentId.eq(parent))
        .exec(conn)
        .await?;

    if !entries.is_empty() {
        let rows = entries.iter().map(|e| acl_entry::ActiveModel {
            id: Set(Uuid::now_v7()),
            owner_kind: Set(kind.as_str().to_owned()),
            parent_id: Set(parent.to_owned()),
            group_id: Set(e.group_id.clone()),
            method: Set(e.method.as_str().to_owned()),
        });
        acl_entry::Entity::insert_many(rows).exec(conn).await?;
    }
    Ok(())
}

// ============================================================================
// Join-table memberships
// ============================================================================

pub async fn load_element_blocks<C: ConnectionTrait>(
    conn: &C,
    element_id: &str,
) -> Result<Vec<String>, DomainError> {
    let rows = element_block::Entity::find()
        .filter(element_block::Column::ElementId.eq(element_id))
        .order_by_asc(element_block::Column::Id)
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|r| r.block_id).collect())
}

pub async fn sync_element_blocks<C: ConnectionTrait>(
    conn: &C,
    element_id: &str,
    desired: &[String],
) -> Result<(), DomainError> {
    let existing = element_block::Entity::find()
        .filter(element_block::Column::ElementId.eq(element_id))
        .order_by_asc(element_block::Column::Id)
        .all(conn)
        .await?;
    let plan = reconcile(
        existing,
        desired.to_vec(),
        |r| r.block_id.clone(),
        Clone::clone,
        |_, _| false,
    );

    if !plan.delete.is_empty() {
        element_block::Entity::delete_many()
            .filter(element_block::Column::Id.is_in(plan.delete.iter().map(|r| r.id)))
            .exec(conn)
            .await?;
    }
    if !plan.insert.is_empty() {
        let rows = plan.insert.into_iter().map(|block_id| element_block::ActiveModel {
            id: Set(Uuid::now_v7()),
            element_id: Set(element_id.to_owned()),
            block_id: Set(block_id),
        });
        element_block::Entity::insert_many(rows).exec(conn).await?;
    }
    Ok(())
}

pub async fn load_element_sections<C: ConnectionTrait>(
    conn: &C,
    element_id: &str,
) -> Result<Vec<String>, DomainError> {
    let rows = element_section::Entity::find()
        .filter(element_section::Column::ElementId.eq(element_id))
        .order_by_asc(element_section::Column::Id)
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|r| r.section_id).collect())
}

pub async fn sync_element_sections<C: ConnectionTrait>(
    conn: &C,
    element_id: &str,
    desired: &[String],
) -> Result<(), DomainError> {
    let existing = element_section::Entity::find()
        .filter(element_section::Column::ElementId.eq(element_id))
        .order_by_asc(element_section::Column::Id)
        .all(conn)
        .await?;
    let plan = reconcile(
        existing,
        desired.to_vec(),
        |r| r.section_id.clone(),
        Clone::clone,
        |_, _| false,
    );

    if !plan.delete.is_empty() {
        element_section::Entity::delete_many()
            .filter(element_section::Column::Id.is_in(plan.delete.iter().map(|r| r.id)))
            .exec(conn)
            .await?;
    }
    if !plan.insert.is_empty() {
        let rows = plan
            .insert
            .into_iter()
            .map(|section_id| element_section::ActiveModel {
                id: Set(Uuid::now_v7()),
                element_id: Set(element_id.to_owned()),
                section_id: Set(section_id),
            });
        element_section::Entity::insert_many(rows).exec(conn).await?;
    }
    Ok(())
}

pub async fn load_user_groups<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
) -> Result<Vec<String>, DomainError> {
    let rows = user_group::Entity::find()
        .filter(user_group::Column::UserId.eq(user_id))
        .order_by_asc(user_group::Column::Id)
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|r| r.group_id).collect())
}

pub async fn sync_user_groups<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    desired: &[String],
) -> Result<(), DomainError> {
    let existing = user_group::Entity::find()
        .filter(user_group::Column::UserId.eq(user_id))
        .order_by_asc(user_group::Column::Id)
        .all(conn)
        .await?;
    let plan = reconcile(
        existing,
        desired.to_vec(),
        |r| r.group_id.clone(),
        Clone::clone,
        |_, _| false,
    );

    if !plan.delete.is_empty() {
        user_group::Entity::delete_many()
            .filter(user_group::Column::Id.is_in(plan.delete.iter().map(|r| r.id)))
            .exec(conn)
            .await?;
    }
    if !plan.insert.is_empty() {
        let rows = plan.insert.into_iter().map(|group_id| user_group::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id.to_owned()),
            group_id: Set(group_id),
        });
        user_group::Entity::insert_many(rows).exec(conn).await?;
    }
    Ok(())
}

// ============================================================================
// Cascade deletion
// ============================================================================

/// Delete every attribute and ACL row owned by one entity. The shared
/// tables carry no foreign key to a single base table, so the cascade is
/// performed here, inside the transaction that deletes the base row.
pub async fn delete_owned<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    parent: &str,
) -> Result<(), DomainError> {
    attr_string::Entity::delete_many()
        .filter(attr_string::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_string::Column::ParentId.eq(parent))
        .exec(conn)
        .await?;
    attr_description::Entity::delete_many()
        .filter(attr_description::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_description::Column::ParentId.eq(parent))
        .exec(conn)
        .await?;
    attr_point::Entity::delete_many()
        .filter(attr_point::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_point::Column::ParentId.eq(parent))
        .exec(conn)
        .await?;
    attr_counter::Entity::delete_many()
        .filter(attr_counter::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_counter::Column::ParentId.eq(parent))
        .exec(conn)
        .await?;
    attr_file::Entity::delete_many()
        .filter(attr_file::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_file::Column::ParentId.eq(parent))
        .exec(conn)
        .await?;
    acl_entry::Entity::delete_many()
        .filter(acl_entry::Column::OwnerKind.eq(kind.as_str()))
        .filter(acl_entry::Column::ParentId.eq(parent))
        .exec(conn)
        .await?;
    Ok(())
}

// ============================================================================
// Batched loads for list pages
// ============================================================================

pub async fn strings_by_parent<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    ids: &[String],
) -> Result<HashMap<String, Vec<attr_string::Model>>, DomainError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = attr_string::Entity::find()
        .filter(attr_string::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_string::Column::ParentId.is_in(ids.iter().map(String::as_str)))
        .order_by_asc(attr_string::Column::Id)
        .all(conn)
        .await?;
    let mut map: HashMap<String, Vec<attr_string::Model>> = HashMap::new();
    for row in rows {
        map.entry(row.parent_id.clone()).or_default().push(row);
    }
    Ok(map)
}

pub async fn descriptions_by_parent<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    ids: &[String],
) -> Result<HashMap<String, Vec<attr_description::Model>>, DomainError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = attr_description::Entity::find()
        .filter(attr_description::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_description::Column::ParentId.is_in(ids.iter().map(String::as_str)))
        .order_by_asc(attr_description::Column::Id)
        .all(conn)
        .await?;
    let mut map: HashMap<String, Vec<attr_description::Model>> = HashMap::new();
    for row in rows {
        map.entry(row.parent_id.clone()).or_default().push(row);
    }
    Ok(map)
}

pub async fn points_by_parent<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    ids: &[String],
) -> Result<HashMap<String, Vec<attr_point::Model>>, DomainError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = attr_point::Entity::find()
        .filter(attr_point::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_point::Column::ParentId.is_in(ids.iter().map(String::as_str)))
        .order_by_asc(attr_point::Column::Id)
        .all(conn)
        .await?;
    let mut map: HashMap<String, Vec<attr_point::Model>> = HashMap::new();
    for row in rows {
        map.entry(row.parent_id.clone()).or_default().push(row);
    }
    Ok(map)
}

pub async fn counters_by_parent<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    ids: &[String],
) -> Result<HashMap<String, Vec<attr_counter::Model>>, DomainError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = attr_counter::Entity::find()
        .filter(attr_counter::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_counter::Column::ParentId.is_in(ids.iter().map(String::as_str)))
        .order_by_asc(attr_counter::Column::Id)
        .all(conn)
        .await?;
    let mut map: HashMap<String, Vec<attr_counter::Model>> = HashMap::new();
    for row in rows {
        map.entry(row.parent_id.clone()).or_default().push(row);
    }
    Ok(map)
}

pub async fn files_by_parent<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    ids: &[String],
) -> Result<HashMap<String, Vec<attr_file::Model>>, DomainError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = attr_file::Entity::find()
        .filter(attr_file::Column::OwnerKind.eq(kind.as_str()))
        .filter(attr_file::Column::ParentId.is_in(ids.iter().map(String::as_str)))
        .order_by_asc(attr_file::Column::Id)
        .all(conn)
        .await?;
    let mut map: HashMap<String, Vec<attr_file::Model>> = HashMap::new();
    for row in rows {
        map.entry(row.parent_id.clone()).or_default().push(row);
    }
    Ok(map)
}

pub async fn acl_by_parent<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    ids: &[String],
) -> Result<HashMap<String, Vec<acl_entry::Model>>, DomainError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = acl_entry::Entity::find()
        .filter(acl_entry::Column::OwnerKind.eq(kind.as_str()))
        .filter(acl_entry::Column::ParentId.is_in(ids.iter().map(String::as_str)))
        .order_by_asc(acl_entry::Column::Id)
        .all(conn)
        .await?;
    let mut map: HashMap<String, Vec<acl_entry::Model>> = HashMap::new();
    for row in rows {
        map.entry(row.parent_id.clone()).or_default().push(row);
    }
    Ok(map)
}

pub async fn element_blocks_by_element<C: ConnectionTrait>(
    conn: &C,
    ids: &[String],
) -> Result<HashMap<String, Vec<String>>, DomainError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = element_block::Entity::find()
        .filter(element_block::Column::ElementId.is_in(ids.iter().map(String::as_str)))
        .order_by_asc(element_block::Column::Id)
        .all(conn)
        .await?;
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for row in rows {
        map.entry(row.element_id).or_default().push(row.block_id);
    }
    Ok(map)
}

pub async fn element_sections_by_element<C: ConnectionTrait>(
    conn: &C,
    ids: &[String],
) -> Result<HashMap<String, Vec<String>>, DomainError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = element_section::Entity::find()
        .filter(element_section::Column::ElementId.is_in(ids.iter().map(String::as_str)))
        .order_by_asc(element_section::Column::Id)
        .all(conn)
        .await?;
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for row in rows {
        map.entry(row.element_id).or_default().push(row.section_id);
    }
    Ok(map)
}

pub async fn user_groups_by_user<C: ConnectionTrait>(
    conn: &C,
    ids: &[String],
) -> Result<HashMap<String, Vec<String>>, DomainError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = user_group::Entity::find()
        .filter(user_group::Column::UserId.is_in(ids.iter().map(String::as_str)))
        .order_by_asc(user_group::Column::Id)
        .all(conn)
        .await?;
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for row in rows {
        map.entry(row.user_id).or_default().push(row.group_id);
    }
    Ok(map)
}

/// Drop membership rows that reference a deleted block/section/group from
/// the side that does not own them.
pub async fn delete_references_to<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    id: &str,
) -> Result<(), DomainError> {
    match kind {
        EntityKind::Block => {
            element_block::Entity::delete_many()
                .filter(element_block::Column::BlockId.eq(id))
                .exec(conn)
                .await?;
        }
        EntityKind::Section => {
            element_section::Entity::delete_many()
                .filter(element_section::Column::SectionId.eq(id))
                .exec(conn)
                .await?;
        }
        EntityKind::Group => {
            user_group::Entity::delete_many()
                .filter(user_group::Column::GroupId.eq(id))
                .exec(conn)
                .await?;
        }
        EntityKind::Element => {
            element_block::Entity::delete_many()
                .filter(element_block::Column::ElementId.eq(id))
                .exec(conn)
                .await?;
            element_section::Entity::delete_many()
                .filter(element_section::Column::ElementId.eq(id))
                .exec(conn)
                .await?;
        }
        EntityKind::User => {
            user_group::Entity::delete_many()
                .filter(user_group::Column::UserId.eq(id))
                .exec(conn)
                .await?;
        }
        EntityKind::Point | EntityKind::File => {}
    }
    Ok(())
}
