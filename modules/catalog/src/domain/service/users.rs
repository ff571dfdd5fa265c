use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait};
use time::OffsetDateTime;
use tracing::instrument;
use trellis_session::Caller;

use crate::domain::error::DomainError;
use crate::domain::guard;
use crate::domain::model::{
    AttributesInput, EntityKind, EntityView, ListParams, Method, PageView, PermissionInput,
    UserScalar,
};
use crate::infra::storage::entity::{group, user};
use crate::infra::storage::{attrs, query};

use super::blocks::sync_attribute_kinds;
use super::{
    Catalog, load_attribute_set, load_attribute_sets, load_permission_view_map,
    load_permission_views, prepare_id,
};

const KIND: EntityKind = EntityKind::User;

/// Admin-side user bodies. `password` is optional: absent means "keep
/// the stored hash" on update and "no password login" on create.
#[derive(Clone, Debug, Default)]
pub struct UserWrite {
    pub login: String,
    pub password: Option<String>,
    pub groups: Vec<String>,
    pub attributes: AttributesInput,
    pub permissions: Vec<PermissionInput>,
}

/// Self-service registration. Requires both credentials.
#[derive(Clone, Debug)]
pub struct Registration {
    pub id: Option<String>,
    pub login: String,
    pub password: String,
}

/// Outcome of a successful login; the group set is minted into the
/// session token here and never re-read per request.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
    pub login: String,
    pub groups: Vec<String>,
}

fn scalar(m: &user::Model, groups: Vec<String>) -> UserScalar {
    UserScalar {
        id: m.id.clone(),
        login: m.login.clone(),
        created_at: m.created_at,
        updated_at: m.updated_at,
        groups,
    }
}

fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::database(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

impl Catalog {
    #[instrument(skip(self, caller, params))]
    pub async fn list_users(
        &self,
        caller: &Caller,
        params: ListParams,
    ) -> Result<PageView<UserScalar>, DomainError> {
        guard::check_method_access(self.db(), KIND, Method::Read, caller).await?;

        let page = query::fetch_page::<user::Entity, _>(
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
        let mut memberships = attrs::user_groups_by_user(self.db(), &ids).await?;

        let data = page
            .rows
            .iter()
            .map(|m| EntityView {
                scalar: scalar(m, memberships.remove(&m.id).unwrap_or_default()),
                attributes: attr_sets.remove(&m.id).unwrap_or_default(),
                permissions: perms.remove(&m.id).unwrap_or_default(),
            })
            .collect();

        Ok(PageView {
            data,
            count: page.total,
        })
    }

    #[instrument(skip(self, caller), fields(user_id = %id))]
    pub async fn get_user(
        &self,
        caller: &Caller,
        id: &str,
    ) -> Result<EntityView<UserScalar>, DomainError> {
        guard::authorize::<user::Entity, _>(self.db(), id, Method::Read, caller).await?;

        let model = query::find_by_id::<user::Entity, _>(self.db(), id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, id))?;
        user_view(self.db(), &model).await
    }

    #[instrument(skip(self, caller, body), fields(login = %body.login))]
    pub async fn create_user(
        &self,
        caller: &Caller,
        id: Option<String>,
        body: UserWrite,
    ) -> Result<EntityView<UserScalar>, DomainError> {
        guard::check_method_access(self.db(), KIND, Method::Write, caller).await?;
        validate_login(&body.login)?;
        let id = prepare_id(id)?;
        if query::entity_exists::<user::Entity, _>(self.db(), &id).await? {
            return Err(DomainError::wrong_data("id", format!("{KIND} {id} already exists")));
        }
        if login_taken(self.db(), &body.login, None).await? {
            return Err(DomainError::wrong_data("login", "already taken"));
        }
        self.check_group_references(caller, &body.groups).await?;

        let password_hash = body.password.as_deref().map(hash_password).transpose()?;

        let txn = self.db().begin().await?;
        let now = OffsetDateTime::now_utc();
        user::ActiveModel {
            id: Set(id.clone()),
            login: Set(body.login.clone()),
            password_hash: Set(password_hash),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        self.sync_user_payload(&txn, &id, &body, true).await?;

        let model = query::find_by_id::<user::Entity, _>(&txn, &id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, &id))?;
        let view = user_view(&txn, &model).await?;
        txn.commit().await?;

        tracing::info!(user_id = %id, "user created");
        Ok(view)
    }

    #[instrument(skip(self, caller, body), fields(user_id = %id))]
    pub async fn update_user(
        &self,
        caller: &Caller,
        id: &str,
        body: UserWrite,
    ) -> Result<EntityView<UserScalar>, DomainError> {
        guard::authorize::<user::Entity, _>(self.db(), id, Method::Write, caller).await?;
        validate_login(&body.login)?;
        if login_taken(self.db(), &body.login, Some(id)).await? {
            return Err(DomainError::wrong_data("login", "already taken"));
        }
        self.check_group_references(caller, &body.groups).await?;

        let txn = self.db().begin().await?;
        let mut am = user::ActiveModel {
            id: Unchanged(id.to_owned()),
            login: Set(body.login.clone()),
            updated_at: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        };
        if let Some(password) = body.password.as_deref() {
            am.password_hash = Set(Some(hash_password(password)?));
        }
        am.update(&txn).await?;

        self.sync_user_payload(&txn, id, &body, false).await?;

        let model = query::find_by_id::<user::Entity, _>(&txn, id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, id))?;
        let view = user_view(&txn, &model).await?;
        txn.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, caller), fields(user_id = %id))]
    pub async fn delete_user(&self, caller: &Caller, id: &str) -> Result<(), DomainError> {
        guard::authorize::<user::Entity, _>(self.db(), id, Method::Delete, caller).await?;

        let txn = self.db().begin().await?;
        attrs::delete_owned(&txn, KIND, id).await?;
        attrs::delete_references_to(&txn, KIND, id).await?;
        user::Entity::delete_many()
            .filter(user::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Self-service registration: no method-access guard, both
    /// credentials required, default ACL only (the admin entry).
    #[instrument(skip(self, registration), fields(login = %registration.login))]
    pub async fn register_user(
        &self,
        registration: Registration,
    ) -> Result<EntityView<UserScalar>, DomainError> {
        validate_login(&registration.login)?;
        if registration.password.trim().is_empty() {
            return Err(DomainError::wrong_data("password", "must not be empty"));
        }
        let id = prepare_id(registration.id)?;
        if query::entity_exists::<user::Entity, _>(self.db(), &id).await? {
            return Err(DomainError::wrong_data("id", format!("{KIND} {id} already exists")));
        }
        if login_taken(self.db(), &registration.login, None).await? {
            return Err(DomainError::wrong_data("login", "already taken"));
        }

        let password_hash = hash_password(&registration.password)?;

        let txn = self.db().begin().await?;
        let now = OffsetDateTime::now_utc();
        user::ActiveModel {
            id: Set(id.clone()),
            login: Set(registration.login.clone()),
            password_hash: Set(Some(password_hash)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        attrs::replace_acl(&txn, KIND, &id, &self.acl_for_create(&[])).await?;

        let model = query::find_by_id::<user::Entity, _>(&txn, &id)
            .await?
            .ok_or_else(|| DomainError::not_found(KIND, &id))?;
        let view = user_view(&txn, &model).await?;
        txn.commit().await?;

        tracing::info!(user_id = %id, "user registered");
        Ok(view)
    }

    /// Verify credentials and flatten the group memberships for the
    /// session token. Never discloses which part of the credentials
    /// failed.
    #[instrument(skip(self, password), fields(login = %login))]
    pub async fn authenticate(
        &self,
        login: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, DomainError> {
        let found = user::Entity::find()
            .filter(user::Column::Login.eq(login))
            .one(self.db())
            .await?;

        let Some(model) = found else {
            tracing::debug!("login rejected: unknown login");
            return Err(DomainError::InvalidCredentials);
        };
        let Some(hash) = model.password_hash.as_deref() else {
            tracing::debug!("login rejected: user has no password");
            return Err(DomainError::InvalidCredentials);
        };
        if !verify_password(password, hash) {
            tracing::debug!("login rejected: bad password");
            return Err(DomainError::InvalidCredentials);
        }

        let groups = attrs::load_user_groups(self.db(), &model.id).await?;
        Ok(AuthenticatedUser {
            id: model.id,
            login: model.login,
            groups,
        })
    }

    /// Assigning a user into a group edits that group's membership, so
    /// the caller needs WRITE on each referenced group.
    async fn check_group_references(
        &self,
        caller: &Caller,
        groups: &[String],
    ) -> Result<(), DomainError> {
        for group_id in groups {
            guard::check_reference::<group::Entity, _>(self.db(), group_id, caller).await?;
        }
        Ok(())
    }

    async fn sync_user_payload(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
        body: &UserWrite,
        create: bool,
    ) -> Result<(), DomainError> {
        sync_attribute_kinds(txn, KIND, id, &body.attributes).await?;
        attrs::sync_user_groups(txn, id, &body.groups).await?;
        let acl = if create {
            self.acl_for_create(&body.permissions)
        } else {
            body.permissions.clone()
        };
        attrs::replace_acl(txn, KIND, id, &acl).await
    }
}

fn validate_login(login: &str) -> Result<(), DomainError> {
    if login.trim().is_empty() {
        return Err(DomainError::wrong_data("login", "must not be empty"));
    }
    Ok(())
}

async fn login_taken<C: ConnectionTrait>(
    conn: &C,
    login: &str,
    exclude_id: Option<&str>,
) -> Result<bool, DomainError> {
    let mut q = user::Entity::find().filter(user::Column::Login.eq(login));
    if let Some(id) = exclude_id {
        q = q.filter(user::Column::Id.ne(id));
    }
    Ok(q.count(conn).await? > 0)
}

async fn user_view<C: ConnectionTrait>(
    conn: &C,
    m: &user::Model,
) -> Result<EntityView<UserScalar>, DomainError> {
    let groups = attrs::load_user_groups(conn, &m.id).await?;
    Ok(EntityView {
        scalar: scalar(m, groups),
        attributes: load_attribute_set(conn, KIND, &m.id).await?,
        permissions: load_permission_views(conn, KIND, &m.id).await?,
    })
}
