use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter, TransactionTrait};
use time::OffsetDateTime;
use tracing::instrument;
use trellis_session::Caller;

use crate::domain::error::DomainError;
use crate::domain::guard;
use crate::domain::model::{
    AttributesInput, EntityKind, EntityView, GroupScalar, ListParams, Method, PageView,
    PermissionInput,
};
use crate::infra::storage::entity::group;
use crate::infra::storage::{attrs, query};

use super::blocks::sync_attribute_kinds;
use super::{
    Catalog, load_attribute_set, load_attribute_sets, load_permission_view_map,
    load_permission_views, prepare_id,
};

const KIND: EntityKind = EntityKind::Group;

#[derive(Clone, Debug, Default)]
pub struct GroupWrite {
    pub title: String,
    pub attributes: AttributesInput,
    pub permissions: Vec<PermissionInput>,
}

fn scalar(m: &group::Model) -> GroupScalar {
    GroupScalar {
        id: m.id.clone(),
        title: m.title.clone(),
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

impl Catalog {
    #[instrument(skip(self, caller, params))]
    pub async fn list_groups(
        &self,
        caller: &Caller,
        params: ListParams,
    ) -> Result<PageView<GroupScalar>, DomainError> {
        guard::check_method_access(self.db(), KIND, Method::Read, caller).await?;

        let page = query::fetch_page::<group::Entity, _>(
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

    #[instrument(skip(self, caller), fields(group_id = %id))]
    pub async fn get_group(
        &self,
        caller: &Caller,
        id: &str,
    ) -> Result<EntityView<GroupScalar>, DomainError> {
        guard::authorize::<group::Entity, _>(self.db(), id, Method::Read, caller).await?;

        let model = query::find_by_id::<group::Entity, _>(self.db(), id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, id))?;
        group_view(self.db(), &model).await
    }

    #[instrument(skip(self, caller, body), fields(title = %body.title))]
    pub async fn create_group(
        &self,
        caller: &Caller,
        id: Option<String>,
        body: GroupWrite,
    ) -> Result<EntityView<GroupScalar>, DomainError> {
        guard::check_method_access(self.db(), KIND, Method::Write, caller).await?;
        validate_title(&body.title)?;
        let id = prepare_id(id)?;
        if query::entity_exists::<group::Entity, _>(self.db(), &id).await? {
            return Err(DomainError::wrong_data("id", format!("{KIND} {id} already exists")));
        }

        let txn = self.db().begin().await?;
        let now = OffsetDateTime::now_utc();
        group::ActiveModel {
            id: Set(id.clone()),
            title: Set(body.title.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        self.sync_group_payload(&txn, &id, &body, true).await?;

        let model = query::find_by_id::<group::Entity, _>(&txn, &id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, &id))?;
        let view = group_view(&txn, &model).await?;
        txn.commit().await?;

        tracing::info!(group_id = %id, "group created");
        Ok(view)
    }

    #[instrument(skip(self, caller, body), fields(group_id = %id))]
    pub async fn update_group(
        &self,
        caller: &Caller,
        id: &str,
        body: GroupWrite,
    ) -> Result<EntityView<GroupScalar>, DomainError> {
        guard::authorize::<group::Entity, _>(self.db(), id, Method::Write, caller).await?;
        validate_title(&body.title)?;

        let txn = self.db().begin().await?;
        group::ActiveModel {
            id: Unchanged(id.to_owned()),
            title: Set(body.title.clone()),
            updated_at: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        self.sync_group_payload(&txn, id, &body, false).await?;

        let model = query::find_by_id::<group::Entity, _>(&txn, id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, id))?;
        let view = group_view(&txn, &model).await?;
        txn.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, caller), fields(group_id = %id))]
    pub async fn delete_group(&self, caller: &Caller, id: &str) -> Result<(), DomainError> {
        guard::authorize::<group::Entity, _>(self.db(), id, Method::Delete, caller).await?;

        let txn = self.db().begin().await?;
        attrs::delete_owned(&txn, KIND, id).await?;
        attrs::delete_references_to(&txn, KIND, id).await?;
        group::Entity::delete_many()
            .filter(group::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!(group_id = %id, "group deleted");
        Ok(())
    }

    async fn sync_group_payload(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
        body: &GroupWrite,
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

fn validate_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::wrong_data("title", "must not be empty"));
    }
    Ok(())
}

async fn group_view<C: ConnectionTrait>(
    conn: &C,
    m: &group::Model,
) -> Result<EntityView<GroupScalar>, DomainError> {
    Ok(EntityView {
        scalar: scalar(m),
        attributes: load_attribute_set(conn, KIND, &m.id).await?,
        permissions: load_permission_views(conn, KIND, &m.id).await?,
    })
}
