//! SeaORM entities.
//!
//! Base tables carry one row per addressable resource; the shared
//! attribute and ACL tables carry one row per fact, keyed by
//! `(owner_kind, parent_id)` instead of one table per (entity, kind)
//! pair.

use sea_orm::EntityTrait;

use crate::domain::model::EntityKind;

pub mod access_rule;
pub mod acl_entry;
pub mod attr_counter;
pub mod attr_description;
pub mod attr_file;
pub mod attr_point;
pub mod attr_string;
pub mod block;
pub mod element;
pub mod element_block;
pub mod element_section;
pub mod file;
pub mod group;
pub mod point;
pub mod section;
pub mod user;
pub mod user_group;

/// Contract implemented by every base entity so the query compiler and
/// the guard can address it generically.
///
/// Declares which kind tag the entity writes into the shared tables and
/// which columns carry the id and the native timestamps.
pub trait CatalogEntity: EntityTrait<Model: Send + Sync> {
    const KIND: EntityKind;

    fn id_col() -> Self::Column;
    fn created_at_col() -> Self::Column;
    fn updated_at_col() -> Self::Column;

    /// The id of a fetched row, used to batch attribute loads per page.
    fn model_id(model: &Self::Model) -> &str;
}

impl CatalogEntity for block::Entity {
    const KIND: EntityKind = EntityKind::Block;

    fn id_col() -> Self::Column {
        block::Column::Id
    }
    fn created_at_col() -> Self::Column {
        block::Column::CreatedAt
    }
    fn updated_at_col() -> Self::Column {
        block::Column::UpdatedAt
    }
    fn model_id(model: &Self::Model) -> &str {
        &model.id
    }
}

impl CatalogEntity for element::Entity {
    const KIND: EntityKind = EntityKind::Element;

    fn id_col() -> Self::Column {
        element::Column::Id
    }
    fn created_at_col() -> Self::Column {
        element::Column::CreatedAt
    }
    fn updated_at_col() -> Self::Column {
        element::Column::UpdatedAt
    }
    fn model_id(model: &Self::Model) -> &str {
        &model.id
    }
}

impl CatalogEntity for section::Entity {
    const KIND: EntityKind = EntityKind::Section;

    fn id_col() -> Self::Column {
        section::Column::Id
    }
    fn created_at_col() -> Self::Column {
        section::Column::CreatedAt
    }
    fn updated_at_col() -> Self::Column {
        section::Column::UpdatedAt
    }
    fn model_id(model: &Self::Model) -> &str {
        &model.id
    }
}

impl CatalogEntity for point::Entity {
    const KIND: EntityKind = EntityKind::Point;

    fn id_col() -> Self::Column {
        point::Column::Id
    }
    fn created_at_col() -> Self::Column {
        point::Column::CreatedAt
    }
    fn updated_at_col() -> Self::Column {
        point::Column::UpdatedAt
    }
    fn model_id(model: &Self::Model) -> &str {
        &model.id
    }
}

impl CatalogEntity for user::Entity {
    const KIND: EntityKind = EntityKind::User;

    fn id_col() -> Self::Column {
        user::Column::Id
    }
    fn created_at_col() -> Self::Column {
        user::Column::CreatedAt
    }
    fn updated_at_col() -> Self::Column {
        user::Column::UpdatedAt
    }
    fn model_id(model: &Self::Model) -> &str {
        &model.id
    }
}

impl CatalogEntity for group::Entity {
    const KIND: EntityKind = EntityKind::Group;

    fn id_col() -> Self::Column {
        group::Column::Id
    }
    fn created_at_col() -> Self::Column {
        group::Column::CreatedAt
    }
    fn updated_at_col() -> Self::Column {
        group::Column::UpdatedAt
    }
    fn model_id(model: &Self::Model) -> &str {
        &model.id
    }
}

impl CatalogEntity for file::Entity {
    const KIND: EntityKind = EntityKind::File;

    fn id_col() -> Self::Column {
        file::Column::Id
    }
    fn created_at_col() -> Self::Column {
        file::Column::CreatedAt
    }
    fn updated_at_col() -> Self::Column {
        file::Column::UpdatedAt
    }
    fn model_id(model: &Self::Model) -> &str {
        &model.id
    }
}
