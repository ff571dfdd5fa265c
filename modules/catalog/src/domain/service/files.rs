use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter, TransactionTrait};
use time::OffsetDateTime;
use tracing::instrument;
use trellis_session::Caller;

use crate::domain::error::DomainError;
use crate::domain::guard;
use crate::domain::model::{
    AttributesInput, EntityKind, EntityView, FileScalar, ListParams, Method, PageView,
    PermissionInput,
};
use crate::infra::storage::entity::file;
use crate::infra::storage::{attrs, query};

use super::blocks::sync_attribute_kinds;
use super::{
    Catalog, load_attribute_set, load_attribute_sets, load_permission_view_map,
    load_permission_views, prepare_id,
};

const KIND: EntityKind = EntityKind::File;

/// File bodies carry metadata only; the bytes live in external storage.
#[derive(Clone, Debug, Default)]
pub struct FileWrite {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub size: Option<i64>,
    pub attributes: AttributesInput,
    pub permissions: Vec<PermissionInput>,
}

fn scalar(m: &file::Model) -> FileScalar {
    FileScalar {
        id: m.id.clone(),
        file_name: m.file_name.clone(),
        mime_type: m.mime_type.clone(),
        size: m.size,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

impl Catalog {
    #[instrument(skip(self, caller, params))]
    pub async fn list_files(
        &self,
        caller: &Caller,
        params: ListParams,
    ) -> Result<PageView<FileScalar>, DomainError> {
        guard::check_method_access(self.db(), KIND, Method::Read, caller).await?;

        let page = query::fetch_page::<file::Entity, _>(
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

    #[instrument(skip(self, caller), fields(file_id = %id))]
    pub async fn get_file(
        &self,
        caller: &Caller,
        id: &str,
    ) -> Result<EntityView<FileScalar>, DomainError> {
        guard::authorize::<file::Entity, _>(self.db(), id, Method::Read, caller).await?;

        let model = query::find_by_id::<file::Entity, _>(self.db(), id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, id))?;
        file_view(self.db(), &model).await
    }

    #[instrument(skip(self, caller, body), fields(file_name = %body.file_name))]
    pub async fn create_file(
        &self,
        caller: &Caller,
        id: Option<String>,
        body: FileWrite,
    ) -> Result<EntityView<FileScalar>, DomainError> {
        guard::check_method_access(self.db(), KIND, Method::Write, caller).await?;
        validate_file_name(&body.file_name)?;
        let id = prepare_id(id)?;
        if query::entity_exists::<file::Entity, _>(self.db(), &id).await? {
            return Err(DomainError::wrong_data("id", format!("{KIND} {id} already exists")));
        }

        let txn = self.db().begin().await?;
        let now = OffsetDateTime::now_utc();
        file::ActiveModel {
            id: Set(id.clone()),
            file_name: Set(body.file_name.clone()),
            mime_type: Set(body.mime_type.clone()),
            size: Set(body.size),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        self.sync_file_payload(&txn, &id, &body, true).await?;

        let model = query::find_by_id::<file::Entity, _>(&txn, &id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, &id))?;
        let view = file_view(&txn, &model).await?;
        txn.commit().await?;

        tracing::info!(file_id = %id, "file registered");
        Ok(view)
    }

    #[instrument(skip(self, caller, body), fields(file_id = %id))]
    pub async fn update_file(
        &self,
        caller: &Caller,
        id: &str,
        body: FileWrite,
    ) -> Result<EntityView<FileScalar>, DomainError> {
        guard::authorize::<file::Entity, _>(self.db(), id, Method::Write, caller).await?;
        validate_file_name(&body.file_name)?;

        let txn = self.db().begin().await?;
        file::ActiveModel {
            id: Unchanged(id.to_owned()),
            file_name: Set(body.file_name.clone()),
            mime_type: Set(body.mime_type.clone()),
            size: Set(body.size),
            updated_at: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        self.sync_file_payload(&txn, id, &body, false).await?;

        let model = query::find_by_id::<file::Entity, _>(&txn, id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, id))?;
        let view = file_view(&txn, &model).await?;
        txn.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, caller), fields(file_id = %id))]
    pub async fn delete_file(&self, caller: &Caller, id: &str) -> Result<(), DomainError> {
        guard::authorize::<file::Entity, _>(self.db(), id, Method::Delete, caller).await?;

        let txn = self.db().begin().await?;
        attrs::delete_owned(&txn, KIND, id).await?;
        file::Entity::delete_many()
            .filter(file::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!(file_id = %id, "file deleted");
        Ok(())
    }

    async fn sync_file_payload(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
        body: &FileWrite,
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

fn validate_file_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::wrong_data("fileName", "must not be empty"));
    }
    Ok(())
}

async fn file_view<C: ConnectionTrait>(
    conn: &C,
    m: &file::Model,
) -> Result<EntityView<FileScalar>, DomainError> {
    Ok(EntityView {
        scalar: scalar(m),
        attributes: load_attribute_set(conn, KIND, &m.id).await?,
        permissions: load_permission_views(conn, KIND, &m.id).await?,
    })
}
