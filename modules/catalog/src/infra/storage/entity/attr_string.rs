use sea_orm::entity::prelude::*;

/// Short localized text attribute row, shared across all entity kinds.
/// Rows with the same `(parent, attribute, language)` are reconciled
/// positionally in load order.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "attr_strings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_kind: String,
    pub parent_id: String,
    pub attribute_id: String,
    pub language_id: Option<String>,
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
