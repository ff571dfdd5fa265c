//! Compiles untyped list parameters into relational predicates.
//!
//! Pipeline order is an invariant: visibility → attribute filters →
//! sort → offset/limit. The page window is applied over the already
//! scoped and filtered set, and the reported total is counted before the
//! window, so page boundaries always agree with what the caller is
//! allowed to see.

use sea_orm::sea_query::{Alias, Condition, Expr, JoinType, NullOrdering, Order, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityName, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, Select,
};

use crate::domain::error::DomainError;
use crate::domain::model::{EntityKind, FilterSet, ListParams, Method, SortDir, SortKey};

use super::entity::{CatalogEntity, access_rule, acl_entry, attr_counter, attr_point, attr_string};

fn base_table<E: CatalogEntity>() -> Alias {
    Alias::new(E::default().table_name())
}

/// The READ-visibility predicate for list queries: a correlated EXISTS
/// against the ACL table, so ACL fan-out can never duplicate result rows.
pub fn visible_condition<E: CatalogEntity>(groups: &[String]) -> Condition {
    let acl = Alias::new("acl_vis");
    let mut sub = Query::select();
    sub.expr(Expr::value(1))
        .from_as(acl_entry::Entity, acl.clone())
        .cond_where(
            Condition::all()
                .add(Expr::col((acl.clone(), acl_entry::Column::OwnerKind)).eq(E::KIND.as_str()))
                .add(
                    Expr::col((acl.clone(), acl_entry::Column::ParentId))
                        .equals((base_table::<E>(), E::id_col())),
                )
                .add(
                    Expr::col((acl.clone(), acl_entry::Column::Method))
                        .is_in([Method::Read.as_str(), Method::All.as_str()]),
                )
                .add(
                    Condition::any()
                        .add(Expr::col((acl.clone(), acl_entry::Column::GroupId)).is_null())
                        .add(
                            Expr::col((acl, acl_entry::Column::GroupId))
                                .is_in(groups.iter().map(String::as_str)),
                        ),
                ),
        );
    Condition::all().add(Expr::exists(sub))
}

/// Add one uniquely-aliased INNER JOIN per filter descriptor. Descriptors
/// combine as a logical AND; an empty filter set adds nothing.
pub fn apply_filters<E: CatalogEntity>(mut select: Select<E>, filters: &FilterSet) -> Select<E> {
    if filters.is_empty() {
        return select;
    }

    let stmt = QueryTrait::query(&mut select);

    for (i, f) in filters.strings.iter().enumerate() {
        let a = Alias::new(format!("fs{i}"));
        let mut cond = Condition::all()
            .add(Expr::col((a.clone(), attr_string::Column::OwnerKind)).eq(E::KIND.as_str()))
            .add(
                Expr::col((a.clone(), attr_string::Column::ParentId))
                    .equals((base_table::<E>(), E::id_col())),
            )
            .add(
                Expr::col((a.clone(), attr_string::Column::AttributeId))
                    .eq(f.attribute_id.as_str()),
            );
        if let Some(lang) = &f.language_id {
            cond = cond.add(Expr::col((a.clone(), attr_string::Column::LanguageId)).eq(lang.as_str()));
        }
        if let Some(value) = &f.value {
            cond = cond.add(Expr::col((a.clone(), attr_string::Column::Value)).eq(value.as_str()));
        }
        if let Some(like) = &f.like {
            cond = cond.add(Expr::col((a.clone(), attr_string::Column::Value)).like(format!("%{like}%")));
        }
        stmt.join_as(JoinType::InnerJoin, attr_string::Entity, a, cond);
    }

    for (i, f) in filters.points.iter().enumerate() {
        let a = Alias::new(format!("fp{i}"));
        let cond = Condition::all()
            .add(Expr::col((a.clone(), attr_point::Column::OwnerKind)).eq(E::KIND.as_str()))
            .add(
                Expr::col((a.clone(), attr_point::Column::ParentId))
                    .equals((base_table::<E>(), E::id_col())),
            )
            .add(Expr::col((a.clone(), attr_point::Column::AttributeId)).eq(f.attribute_id.as_str()))
            .add(Expr::col((a.clone(), attr_point::Column::PointId)).eq(f.point_id.as_str()));
        stmt.join_as(JoinType::InnerJoin, attr_point::Entity, a, cond);
    }

    for (i, f) in filters.counters.iter().enumerate() {
        let a = Alias::new(format!("fc{i}"));
        let mut cond = Condition::all()
            .add(Expr::col((a.clone(), attr_counter::Column::OwnerKind)).eq(E::KIND.as_str()))
            .add(
                Expr::col((a.clone(), attr_counter::Column::ParentId))
                    .equals((base_table::<E>(), E::id_col())),
            )
            .add(
                Expr::col((a.clone(), attr_counter::Column::AttributeId))
                    .eq(f.attribute_id.as_str()),
            );
        if let Some(eq) = f.eq {
            cond = cond.add(Expr::col((a.clone(), attr_counter::Column::Count)).eq(eq));
        }
        if let Some(min) = f.min {
            cond = cond.add(Expr::col((a.clone(), attr_counter::Column::Count)).gte(min));
        }
        if let Some(max) = f.max {
            cond = cond.add(Expr::col((a.clone(), attr_counter::Column::Count)).lte(max));
        }
        stmt.join_as(JoinType::InnerJoin, attr_counter::Entity, a, cond);
    }

    select
}

/// Apply the sort key. Attribute sorts use a LEFT JOIN so entities
/// lacking the attribute still appear; their position is pinned with
/// NULLS LAST rather than left to the store's default. The entity id is
/// always appended as a tiebreaker so page windows are stable.
pub fn apply_sort<E: CatalogEntity>(
    mut select: Select<E>,
    sort: Option<&(SortKey, SortDir)>,
) -> Select<E> {
    fn order_of(dir: SortDir) -> Order {
        match dir {
            SortDir::Asc => Order::Asc,
            SortDir::Desc => Order::Desc,
        }
    }

    match sort {
        None => {
            select = select.order_by(E::created_at_col(), Order::Asc);
        }
        Some((SortKey::CreatedAt, dir)) => {
            select = select.order_by(E::created_at_col(), order_of(*dir));
        }
        Some((SortKey::UpdatedAt, dir)) => {
            select = select.order_by(E::updated_at_col(), order_of(*dir));
        }
        Some((
            SortKey::StringAttr {
                attribute_id,
                language_id,
            },
            dir,
        )) => {
            let a = Alias::new("sort_s");
            let mut cond = Condition::all()
                .add(Expr::col((a.clone(), attr_string::Column::OwnerKind)).eq(E::KIND.as_str()))
                .add(
                    Expr::col((a.clone(), attr_string::Column::ParentId))
                        .equals((base_table::<E>(), E::id_col())),
                )
                .add(
                    Expr::col((a.clone(), attr_string::Column::AttributeId))
                        .eq(attribute_id.as_str()),
                );
            if let Some(lang) = language_id {
                cond = cond
                    .add(Expr::col((a.clone(), attr_string::Column::LanguageId)).eq(lang.as_str()));
            }
            let stmt = QueryTrait::query(&mut select);
            stmt.join_as(JoinType::LeftJoin, attr_string::Entity, a.clone(), cond);
            stmt.order_by_with_nulls(
                (a, attr_string::Column::Value),
                order_of(*dir),
                NullOrdering::Last,
            );
        }
    }

    select.order_by(E::id_col(), Order::Asc)
}

pub struct PageResult<M> {
    pub rows: Vec<M>,
    pub total: u64,
}

/// Run the full list pipeline for one entity type.
pub async fn fetch_page<E, C>(
    conn: &C,
    groups: &[String],
    params: &ListParams,
    default_limit: u64,
    max_limit: u64,
) -> Result<PageResult<E::Model>, DomainError>
where
    E: CatalogEntity,
    C: ConnectionTrait,
{
    let select = E::find().filter(visible_condition::<E>(groups));
    let select = apply_filters(select, &params.filters);

    // Total before the page window, after visibility and filters.
    let total = select.clone().count(conn).await?;

    let select = apply_sort(select, params.sort.as_ref());
    let limit = params.limit.unwrap_or(default_limit).min(max_limit);
    let offset = params.offset.unwrap_or(0);

    let rows = select.offset(offset).limit(limit).all(conn).await?;
    Ok(PageResult { rows, total })
}

/// Method-level access: does any rule grant (entity kind, method) to the
/// caller's groups or to everyone.
pub async fn method_access_allowed<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    method: Method,
    groups: &[String],
) -> Result<bool, DomainError> {
    let count = access_rule::Entity::find()
        .filter(
            Condition::all()
                .add(access_rule::Column::Entity.eq(kind.as_str()))
                .add(access_rule::Column::Method.is_in([method.as_str(), Method::All.as_str()]))
                .add(
                    Condition::any()
                        .add(access_rule::Column::GroupId.is_null())
                        .add(access_rule::Column::GroupId.is_in(groups.iter().map(String::as_str))),
                ),
        )
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Existence probe for the guard's second step.
pub async fn entity_exists<E, C>(conn: &C, id: &str) -> Result<bool, DomainError>
where
    E: CatalogEntity,
    C: ConnectionTrait,
{
    let count = E::find()
        .filter(Expr::col((base_table::<E>(), E::id_col())).eq(id))
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Fetch one base row by id, without any permission scoping.
pub async fn find_by_id<E, C>(conn: &C, id: &str) -> Result<Option<E::Model>, DomainError>
where
    E: CatalogEntity,
    C: ConnectionTrait,
{
    Ok(E::find()
        .filter(Expr::col((base_table::<E>(), E::id_col())).eq(id))
        .one(conn)
        .await?)
}
