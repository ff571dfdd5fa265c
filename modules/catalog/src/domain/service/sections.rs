use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter, TransactionTrait};
use time::OffsetDateTime;
use tracing::instrument;
use trellis_session::Caller;

use crate::domain::error::DomainError;
use crate::domain::guard;
use crate::domain::model::{
    AttributesInput, EntityKind, EntityView, ListParams, Method, PageView, PermissionInput,
    SectionScalar,
};
use crate::infra::storage::entity::section;
use crate::infra::storage::{attrs, query};

use super::blocks::sync_attribute_kinds;
use super::{
    Catalog, load_attribute_set, load_attribute_sets, load_permission_view_map,
    load_permission_views, prepare_id,
};

const KIND: EntityKind = EntityKind::Section;

#[derive(Clone, Debug, Default)]
pub struct SectionWrite {
    pub attributes: AttributesInput,
    pub permissions: Vec<PermissionInput>,
}

fn scalar(m: &section::Model) -> SectionScalar {
    SectionScalar {
        id: m.id.clone(),
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

impl Catalog {
    #[instrument(skip(self, caller, params))]
    pub async fn list_sections(
        &self,
        caller: &Caller,
        params: ListParams,
    ) -> Result<PageView<SectionScalar>, DomainError> {
        guard::check_method_access(self.db(), KIND, Method::Read, caller).await?;

        let page = query::fetch_page::<section::Entity, _>(
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

    #[instrument(skip(self, caller), fields(section_id = %id))]
    pub async fn get_section(
        &self,
        caller: &Caller,
        id: &str,
    ) -> Result<EntityView<SectionScalar>, DomainError> {
        guard::authorize::<section::Entity, _>(self.db(), id, Method::Read, caller).await?;

        let model = query::find_by_id::<section::Entity, _>(self.db(), id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, id))?;
        section_view(self.db(), &model).await
    }

    #[instrument(skip(self, caller, body))]
    pub async fn create_section(
        &self,
        caller: &Caller,
        id: Option<String>,
        body: SectionWrite,
    ) -> Result<EntityView<SectionScalar>, DomainError> {
        guard::check_method_access(self.db(), KIND, Method::Write, caller).await?;
        let id = prepare_id(id)?;
        if query::entity_exists::<section::Entity, _>(self.db(), &id).await? {
            return Err(DomainError::wrong_data("id", format!("{KIND} {id} already exists")));
        }

        let txn = self.db().begin().await?;
        let now = OffsetDateTime::now_utc();
        section::ActiveModel {
            id: Set(id.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        self.sync_section_payload(&txn, &id, &body, true).await?;

        let model = query::find_by_id::<section::Entity, _>(&txn, &id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, &id))?;
        let view = section_view(&txn, &model).await?;
        txn.commit().await?;

        tracing::info!(section_id = %id, "section created");
        Ok(view)
    }

    #[instrument(skip(self, caller, body), fields(section_id = %id))]
    pub async fn update_section(
        &self,
        caller: &Caller,
        id: &str,
        body: SectionWrite,
    ) -> Result<EntityView<SectionScalar>, DomainError> {
        guard::authorize::<section::Entity, _>(self.db(), id, Method::Write, caller).await?;

        let txn = self.db().begin().await?;
        section::ActiveModel {
            id: Unchanged(id.to_owned()),
            updated_at: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        self.sync_section_payload(&txn, id, &body, false).await?;

        let model = query::find_by_id::<section::Entity, _>(&txn, id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, id))?;
        let view = section_view(&txn, &model).await?;
        txn.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, caller), fields(section_id = %id))]
    pub async fn delete_section(&self, caller: &Caller, id: &str) -> Result<(), DomainError> {
        guard::authorize::<section::Entity, _>(self.db(), id, Method::Delete, caller).await?;

        let txn = self.db().begin().await?;
        attrs::delete_owned(&txn, KIND, id).await?;
        attrs::delete_references_to(&txn, KIND, id).await?;
        section::Entity::delete_many()
            .filter(section::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!(section_id = %id, "section deleted");
        Ok(())
    }

    async fn sync_section_payload(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
        body: &SectionWrite,
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

async fn section_view<C: ConnectionTrait>(
    conn: &C,
    m: &section::Model,
) -> Result<EntityView<SectionScalar>, DomainError> {
    Ok(EntityView {
        scalar: scalar(m),
        attributes: load_attribute_set(conn, KIND, &m.id).await?,
        permissions: load_permission_views(conn, KIND, &m.id).await?,
    })
}
