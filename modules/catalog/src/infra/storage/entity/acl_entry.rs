use sea_orm::entity::prelude::*;

/// One ACL row. A null `group_id` applies to every caller; `method` is
/// READ, WRITE, DELETE or ALL. Replaced wholesale on every entity update.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "acl_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_kind: String,
    pub parent_id: String,
    pub group_id: Option<String>,
    pub method: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
