use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter, TransactionTrait};
use time::OffsetDateTime;
use tracing::instrument;
use trellis_session::Caller;

use crate::domain::error::DomainError;
use crate::domain::guard;
use crate::domain::model::{
    AttributesInput, ElementScalar, EntityKind, EntityView, ListParams, Method, PageView,
    PermissionInput,
};
use crate::infra::storage::entity::{block, element, section};
use crate::infra::storage::{attrs, query};

use super::blocks::sync_attribute_kinds;
use super::{
    Catalog, load_attribute_set, load_attribute_sets, load_permission_view_map,
    load_permission_views, prepare_id,
};

const KIND: EntityKind = EntityKind::Element;

/// Element bodies additionally carry the block and section memberships
/// the element owns.
#[derive(Clone, Debug, Default)]
pub struct ElementWrite {
    pub attributes: AttributesInput,
    pub permissions: Vec<PermissionInput>,
    pub blocks: Vec<String>,
    pub sections: Vec<String>,
}

fn scalar(m: &element::Model, blocks: Vec<String>, sections: Vec<String>) -> ElementScalar {
    ElementScalar {
        id: m.id.clone(),
        created_at: m.created_at,
        updated_at: m.updated_at,
        blocks,
        sections,
    }
}

impl Catalog {
    #[instrument(skip(self, caller, params))]
    pub async fn list_elements(
        &self,
        caller: &Caller,
        params: ListParams,
    ) -> Result<PageView<ElementScalar>, DomainError> {
        guard::check_method_access(self.db(), KIND, Method::Read, caller).await?;

        let page = query::fetch_page::<element::Entity, _>(
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
        let mut blocks = attrs::element_blocks_by_element(self.db(), &ids).await?;
        let mut sections = attrs::element_sections_by_element(self.db(), &ids).await?;

        let data = page
            .rows
            .iter()
            .map(|m| EntityView {
                scalar: scalar(
                    m,
                    blocks.remove(&m.id).unwrap_or_default(),
                    sections.remove(&m.id).unwrap_or_default(),
                ),
                attributes: attr_sets.remove(&m.id).unwrap_or_default(),
                permissions: perms.remove(&m.id).unwrap_or_default(),
            })
            .collect();

        Ok(PageView {
            data,
            count: page.total,
        })
    }

    #[instrument(skip(self, caller), fields(element_id = %id))]
    pub async fn get_element(
        &self,
        caller: &Caller,
        id: &str,
    ) -> Result<EntityView<ElementScalar>, DomainError> {
        guard::authorize::<element::Entity, _>(self.db(), id, Method::Read, caller).await?;

        let model = query::find_by_id::<element::Entity, _>(self.db(), id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, id))?;
        element_view(self.db(), &model).await
    }

    #[instrument(skip(self, caller, body))]
    pub async fn create_element(
        &self,
        caller: &Caller,
        id: Option<String>,
        body: ElementWrite,
    ) -> Result<EntityView<ElementScalar>, DomainError> {
        guard::check_method_access(self.db(), KIND, Method::Write, caller).await?;
        let id = prepare_id(id)?;
        if query::entity_exists::<element::Entity, _>(self.db(), &id).await? {
            return Err(DomainError::wrong_data("id", format!("{KIND} {id} already exists")));
        }
        self.check_element_references(caller, &body).await?;

        let txn = self.db().begin().await?;
        let now = OffsetDateTime::now_utc();
        element::ActiveModel {
            id: Set(id.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        self.sync_element_payload(&txn, &id, &body, true).await?;

        let model = query::find_by_id::<element::Entity, _>(&txn, &id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, &id))?;
        let view = element_view(&txn, &model).await?;
        txn.commit().await?;

        tracing::info!(element_id = %id, "element created");
        Ok(view)
    }

    #[instrument(skip(self, caller, body), fields(element_id = %id))]
    pub async fn update_element(
        &self,
        caller: &Caller,
        id: &str,
        body: ElementWrite,
    ) -> Result<EntityView<ElementScalar>, DomainError> {
        guard::authorize::<element::Entity, _>(self.db(), id, Method::Write, caller).await?;
        self.check_element_references(caller, &body).await?;

        let txn = self.db().begin().await?;
        element::ActiveModel {
            id: Unchanged(id.to_owned()),
            updated_at: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        self.sync_element_payload(&txn, id, &body, false).await?;

        let model = query::find_by_id::<element::Entity, _>(&txn, id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, id))?;
        let view = element_view(&txn, &model).await?;
        txn.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, caller), fields(element_id = %id))]
    pub async fn delete_element(&self, caller: &Caller, id: &str) -> Result<(), DomainError> {
        guard::authorize::<element::Entity, _>(self.db(), id, Method::Delete, caller).await?;

        let txn = self.db().begin().await?;
        attrs::delete_owned(&txn, KIND, id).await?;
        attrs::delete_references_to(&txn, KIND, id).await?;
        element::Entity::delete_many()
            .filter(element::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!(element_id = %id, "element deleted");
        Ok(())
    }

    /// Input-level permission: editing an element that is placed into a
    /// block or section requires WRITE on each referenced container.
    async fn check_element_references(
        &self,
        caller: &Caller,
        body: &ElementWrite,
    ) -> Result<(), DomainError> {
        for block_id in &body.blocks {
            guard::check_reference::<block::Entity, _>(self.db(), block_id, caller).await?;
        }
        for section_id in &body.sections {
            guard::check_reference::<section::Entity, _>(self.db(), section_id, caller).await?;
        }
        Ok(())
    }

    async fn sync_element_payload(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
        body: &ElementWrite,
        create: bool,
    ) -> Result<(), DomainError> {
        sync_attribute_kinds(txn, KIND, id, &body.attributes).await?;
        attrs::sync_element_blocks(txn, id, &body.blocks).await?;
        attrs::sync_element_sections(txn, id, &body.sections).await?;
        let acl = if create {
            self.acl_for_create(&body.permissions)
        } else {
            body.permissions.clone()
        };
        attrs::replace_acl(txn, KIND, id, &acl).await
    }
}

async fn element_view<C: ConnectionTrait>(
    conn: &C,
    m: &element::Model,
) -> Result<EntityView<ElementScalar>, DomainError> {
    let blocks = attrs::load_element_blocks(conn, &m.id).await?;
    let sections = attrs::load_element_sections(conn, &m.id).await?;
    Ok(EntityView {
        scalar: scalar(m, blocks, sections),
        attributes: load_attribute_set(conn, KIND, &m.id).await?,
        permissions: load_permission_views(conn, KIND, &m.id).await?,
    })
}
