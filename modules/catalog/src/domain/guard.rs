//! Ordered authorization checks run before business logic.
//!
//! The order is part of the contract: method-level access, then
//! existence, then the per-resource ACL. Existence is checked before the
//! ACL, so a 404 never mutates into a 403 depending on who asks — the
//! flip side is that resource existence is revealed to callers without
//! read permission. That ordering is inherited behavior, kept on
//! purpose.

use sea_orm::ConnectionTrait;
use trellis_session::Caller;

use crate::infra::storage::entity::CatalogEntity;
use crate::infra::storage::{attrs, query};

use super::error::DomainError;
use super::model::{EntityKind, Method};
use super::permission::can_access;

/// Step 1: does any access rule give the caller's groups this
/// (entity kind, method) at all. Independent of the addressed resource.
pub async fn check_method_access<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    method: Method,
    caller: &Caller,
) -> Result<(), DomainError> {
    if query::method_access_allowed(conn, kind, method, &caller.groups).await? {
        Ok(())
    } else {
        tracing::debug!(entity = %kind, method = %method, "method-level access refused");
        Err(DomainError::access_denied(kind, method))
    }
}

/// Steps 2 and 3: the addressed resource must exist, and its ACL must
/// grant the required method to the caller.
pub async fn check_resource<E, C>(
    conn: &C,
    id: &str,
    method: Method,
    caller: &Caller,
) -> Result<(), DomainError>
where
    E: CatalogEntity,
    C: ConnectionTrait,
{
    if !query::entity_exists::<E, C>(conn, id).await? {
        return Err(DomainError::not_found(E::KIND, id));
    }

    let entries = attrs::load_acl(conn, E::KIND, id).await?;
    if can_access(&entries, &caller.groups, method) {
        Ok(())
    } else {
        tracing::debug!(entity = %E::KIND, method = %method, id, "resource permission refused");
        Err(DomainError::permission_denied(E::KIND, method, id))
    }
}

/// The full chain for one addressed resource.
pub async fn authorize<E, C>(
    conn: &C,
    id: &str,
    method: Method,
    caller: &Caller,
) -> Result<(), DomainError>
where
    E: CatalogEntity,
    C: ConnectionTrait,
{
    check_method_access(conn, E::KIND, method, caller).await?;
    check_resource::<E, C>(conn, id, method, caller).await
}

/// Step 4: a write body referencing another resource must hold WRITE on
/// that resource too (a child edit respects the parent's ACL).
pub async fn check_reference<E, C>(conn: &C, id: &str, caller: &Caller) -> Result<(), DomainError>
where
    E: CatalogEntity,
    C: ConnectionTrait,
{
    check_resource::<E, C>(conn, id, Method::Write, caller).await
}
