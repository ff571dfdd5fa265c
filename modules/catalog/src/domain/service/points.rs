use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter, TransactionTrait};
use time::OffsetDateTime;
use tracing::instrument;
use trellis_session::Caller;

use crate::domain::error::DomainError;
use crate::domain::guard;
use crate::domain::model::{
    AttributesInput, EntityKind, EntityView, ListParams, Method, PageView, PermissionInput,
    PointScalar,
};
use crate::infra::storage::entity::point;
use crate::infra::storage::{attrs, query};

use super::blocks::sync_attribute_kinds;
use super::{
    Catalog, load_attribute_set, load_attribute_sets, load_permission_view_map,
    load_permission_views, prepare_id,
};

const KIND: EntityKind = EntityKind::Point;

/// Point bodies carry the directory position alongside the usual
/// attribute and permission lists.
#[derive(Clone, Debug, Default)]
pub struct PointWrite {
    pub parent_id: Option<String>,
    pub attributes: AttributesInput,
    pub permissions: Vec<PermissionInput>,
}

fn scalar(m: &point::Model) -> PointScalar {
    PointScalar {
        id: m.id.clone(),
        parent_id: m.parent_id.clone(),
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

impl Catalog {
    #[instrument(skip(self, caller, params))]
    pub async fn list_points(
        &self,
        caller: &Caller,
        params: ListParams,
    ) -> Result<PageView<PointScalar>, DomainError> {
        guard::check_method_access(self.db(), KIND, Method::Read, caller).await?;

        let page = query::fetch_page::<point::Entity, _>(
            self.db(),
            &caller.groups,
            &params,
            self.cfg().default_limit,
            self.cfg().max_limit,
        )
        .await?;

        let ids: Vec<String> = page.rows.iter().map(|m| m.id.clone()).collect();
        let mut attr_sets = load_attribute_sets(self.db(), KIND, &ids).await?;
        let mut perms = load_permission_view_map(self.db(), KIND, &ids).await?;

        let data = page
            .rows
            .iter()
            .map(|m| EntityView {
                scalar: scalar(m),
                attributes: attr_sets.remove(&m.id).unwrap_or_default(),
                permissions: perms.remove(&m.id).unwrap_or_default(),
            })
            .collect();

        Ok(PageView {
            data,
            count: page.total,
        })
    }

    #[instrument(skip(self, caller), fields(point_id = %id))]
    pub async fn get_point(
        &self,
        caller: &Caller,
        id: &str,
    ) -> Result<EntityView<PointScalar>, DomainError> {
        guard::authorize::<point::Entity, _>(self.db(), id, Method::Read, caller).await?;

        let model = query::find_by_id::<point::Entity, _>(self.db(), id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, id))?;
        point_view(self.db(), &model).await
    }

    #[instrument(skip(self, caller, body))]
    pub async fn create_point(
        &self,
        caller: &Caller,
        id: Option<String>,
        body: PointWrite,
    ) -> Result<EntityView<PointScalar>, DomainError> {
        guard::check_method_access(self.db(), KIND, Method::Write, caller).await?;
        let id = prepare_id(id)?;
        if query::entity_exists::<point::Entity, _>(self.db(), &id).await? {
            return Err(DomainError::wrong_data("id", format!("{KIND} {id} already exists")));
        }
        self.check_point_parent(&body).await?;

        let txn = self.db().begin().await?;
        let now = OffsetDateTime::now_utc();
        point::ActiveModel {
            id: Set(id.clone()),
            parent_id: Set(body.parent_id.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        self.sync_point_payload(&txn, &id, &body, true).await?;

        let model = query::find_by_id::<point::Entity, _>(&txn, &id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, &id))?;
        let view = point_view(&txn, &model).await?;
        txn.commit().await?;

        tracing::info!(point_id = %id, "point created");
        Ok(view)
    }

    #[instrument(skip(self, caller, body), fields(point_id = %id))]
    pub async fn update_point(
        &self,
        caller: &Caller,
        id: &str,
        body: PointWrite,
    ) -> Result<EntityView<PointScalar>, DomainError> {
        guard::authorize::<point::Entity, _>(self.db(), id, Method::Write, caller).await?;
        self.check_point_parent(&body).await?;

        let txn = self.db().begin().await?;
        point::ActiveModel {
            id: Unchanged(id.to_owned()),
            parent_id: Set(body.parent_id.clone()),
            updated_at: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        self.sync_point_payload(&txn, id, &body, false).await?;

        let model = query::find_by_id::<point::Entity, _>(&txn, id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, id))?;
        let view = point_view(&txn, &model).await?;
        txn.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, caller), fields(point_id = %id))]
    pub async fn delete_point(&self, caller: &Caller, id: &str) -> Result<(), DomainError> {
        guard::authorize::<point::Entity, _>(self.db(), id, Method::Delete, caller).await?;

        let txn = self.db().begin().await?;
        attrs::delete_owned(&txn, KIND, id).await?;
        point::Entity::delete_many()
            .filter(point::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!(point_id = %id, "point deleted");
        Ok(())
    }

    /// A submitted directory parent must exist; dangling tree edges are
    /// rejected before the transaction opens.
    async fn check_point_parent(&self, body: &PointWrite) -> Result<(), DomainError> {
        if let Some(parent) = &body.parent_id
            && !query::entity_exists::<point::Entity, _>(self.db(), parent).await?
        {
            return Err(DomainError::not_found(KIND, parent));
        }
        Ok(())
    }

    async fn sync_point_payload(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
        body: &PointWrite,
        create: bool,
    ) -> Result<(), DomainError> {
        sync_attribute_kinds(txn, KIND, id, &body.attributes).await?;
        let acl = if create {
            self.acl_for_create(&body.permissions)
        } else {
            body.permissions.clone()
        };
        attrs::replace_acl(txn, KIND, id, &acl).await
    }
}

async fn point_view<C: ConnectionTrait>(
    conn: &C,
    m: &point::Model,
) -> Result<EntityView<PointScalar>, DomainError> {
    Ok(EntityView {
        scalar: scalar(m),
        attributes: load_attribute_set(conn, KIND, &m.id).await?,
        permissions: load_permission_views(conn, KIND, &m.id).await?,
    })
}
