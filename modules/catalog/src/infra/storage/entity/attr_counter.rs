use sea_orm::entity::prelude::*;

/// Numeric measurement row. At most one row per
/// `(parent, attribute, point)`; `measure_id` names the unit.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "attr_counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_kind: String,
    pub parent_id: String,
    pub attribute_id: String,
    pub point_id: Option<String>,
    pub measure_id: Option<String>,
    #[sea_orm(column_type = "Double")]
    pub count: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
