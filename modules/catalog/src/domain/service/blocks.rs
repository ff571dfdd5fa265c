use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter, TransactionTrait};
use time::OffsetDateTime;
use tracing::instrument;
use trellis_session::Caller;

use crate::domain::error::DomainError;
use crate::domain::guard;
use crate::domain::model::{
    AttributesInput, BlockScalar, EntityKind, EntityView, ListParams, Method, PageView,
    PermissionInput,
};
use crate::infra::storage::entity::block;
use crate::infra::storage::{attrs, query};

use super::{
    Catalog, load_attribute_set, load_attribute_sets, load_permission_view_map,
    load_permission_views, prepare_id,
};

const KIND: EntityKind = EntityKind::Block;

/// Desired state carried by block create and update bodies.
#[derive(Clone, Debug, Default)]
pub struct BlockWrite {
    pub attributes: AttributesInput,
    pub permissions: Vec<PermissionInput>,
}

fn scalar(m: &block::Model) -> BlockScalar {
    BlockScalar {
        id: m.id.clone(),
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

impl Catalog {
    #[instrument(skip(self, caller, params))]
    pub async fn list_blocks(
        &self,
        caller: &Caller,
        params: ListParams,
    ) -> Result<PageView<BlockScalar>, DomainError> {
        guard::check_method_access(self.db(), KIND, Method::Read, caller).await?;

        let page = query::fetch_page::<block::Entity, _>(
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

    #[instrument(skip(self, caller), fields(block_id = %id))]
    pub async fn get_block(
        &self,
        caller: &Caller,
        id: &str,
    ) -> Result<EntityView<BlockScalar>, DomainError> {
        guard::authorize::<block::Entity, _>(self.db(), id, Method::Read, caller).await?;

        let model = query::find_by_id::<block::Entity, _>(self.db(), id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, id))?;
        block_view(self.db(), &model).await
    }

    #[instrument(skip(self, caller, body))]
    pub async fn create_block(
        &self,
        caller: &Caller,
        id: Option<String>,
        body: BlockWrite,
    ) -> Result<EntityView<BlockScalar>, DomainError> {
        guard::check_method_access(self.db(), KIND, Method::Write, caller).await?;
        let id = prepare_id(id)?;
        if query::entity_exists::<block::Entity, _>(self.db(), &id).await? {
            return Err(DomainError::wrong_data("id", format!("{KIND} {id} already exists")));
        }

        let txn = self.db().begin().await?;
        let now = OffsetDateTime::now_utc();
        block::ActiveModel {
            id: Set(id.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        self.sync_block_payload(&txn, &id, &body, true).await?;

        let model = query::find_by_id::<block::Entity, _>(&txn, &id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, &id))?;
        let view = block_view(&txn, &model).await?;
        txn.commit().await?;

        tracing::info!(block_id = %id, "block created");
        Ok(view)
    }

    #[instrument(skip(self, caller, body), fields(block_id = %id))]
    pub async fn update_block(
        &self,
        caller: &Caller,
        id: &str,
        body: BlockWrite,
    ) -> Result<EntityView<BlockScalar>, DomainError> {
        guard::authorize::<block::Entity, _>(self.db(), id, Method::Write, caller).await?;

        let txn = self.db().begin().await?;
        block::ActiveModel {
            id: Unchanged(id.to_owned()),
            updated_at: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        self.sync_block_payload(&txn, id, &body, false).await?;

        let model = query::find_by_id::<block::Entity, _>(&txn, id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, id))?;
        let view = block_view(&txn, &model).await?;
        txn.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, caller), fields(block_id = %id))]
    pub async fn delete_block(&self, caller: &Caller, id: &str) -> Result<(), DomainError> {
        guard::authorize::<block::Entity, _>(self.db(), id, Method::Delete, caller).await?;

        let txn = self.db().begin().await?;
        attrs::delete_owned(&txn, KIND, id).await?;
        attrs::delete_references_to(&txn, KIND, id).await?;
        block::Entity::delete_many()
            .filter(block::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!(block_id = %id, "block deleted");
        Ok(())
    }

    async fn sync_block_payload(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
        body: &BlockWrite,
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

async fn block_view<C: ConnectionTrait>(
    conn: &C,
    m: &block::Model,
) -> Result<EntityView<BlockScalar>, DomainError> {
    Ok(EntityView {
        scalar: scalar(m),
        attributes: load_attribute_set(conn, KIND, &m.id).await?,
        permissions: load_permission_views(conn, KIND, &m.id).await?,
    })
}

/// One reconcile pass per attribute kind, in a fixed order, on the
/// caller's transaction. Shared by every entity service.
pub(super) async fn sync_attribute_kinds<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    id: &str,
    input: &AttributesInput,
) -> Result<(), DomainError> {
    attrs::sync_strings(conn, kind, id, &input.strings).await?;
    attrs::sync_descriptions(conn, kind, id, &input.descriptions).await?;
    attrs::sync_points(conn, kind, id, &input.points).await?;
    attrs::sync_counters(conn, kind, id, &input.counters).await?;
    attrs::sync_files(conn, kind, id, &input.files).await?;
    Ok(())
}
