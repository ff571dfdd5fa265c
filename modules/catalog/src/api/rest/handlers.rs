//! HTTP handlers. Thin: decode, delegate to the catalog service, map the
//! result. All authorization happens behind the service boundary.

use std::sync::Arc;

use axum::extract::{Path, RawQuery};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use http::{HeaderValue, StatusCode, header::SET_COOKIE};
use serde_json::json;
use trellis_session::{Caller, SessionLayerState};

use crate::domain::error::DomainError;
use crate::domain::model::{
    BlockScalar, ElementScalar, EntityView, FileScalar, GroupScalar, PageView, PointScalar,
    SectionScalar, UserScalar,
};
use crate::domain::service::Catalog;

use super::dto::{
    BlockBody, ElementBody, FileBody, GroupBody, LoginBody, PointBody, RegisterBody, SectionBody,
    UserBody,
};
use super::error::{ApiError, ApiResult};
use super::query::parse_list_params;

// ==================== Block handlers ====================

pub(crate) async fn list_blocks(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<PageView<BlockScalar>>> {
    let params = parse_list_params(query.as_deref().unwrap_or(""))?;
    Ok(Json(svc.list_blocks(&caller, params).await?))
}

pub(crate) async fn get_block(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<Json<EntityView<BlockScalar>>> {
    Ok(Json(svc.get_block(&caller, &id).await?))
}

pub(crate) async fn create_block(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Json(body): Json<BlockBody>,
) -> ApiResult<impl IntoResponse> {
    let (id, write) = body.into_write();
    let view = svc.create_block(&caller, id, write).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn update_block(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
    Json(body): Json<BlockBody>,
) -> ApiResult<Json<EntityView<BlockScalar>>> {
    let (_, write) = body.into_write();
    Ok(Json(svc.update_block(&caller, &id, write).await?))
}

pub(crate) async fn delete_block(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    svc.delete_block(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Element handlers ====================

pub(crate) async fn list_elements(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<PageView<ElementScalar>>> {
    let params = parse_list_params(query.as_deref().unwrap_or(""))?;
    Ok(Json(svc.list_elements(&caller, params).await?))
}

pub(crate) async fn get_element(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<Json<EntityView<ElementScalar>>> {
    Ok(Json(svc.get_element(&caller, &id).await?))
}

pub(crate) async fn create_element(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Json(body): Json<ElementBody>,
) -> ApiResult<impl IntoResponse> {
    let (id, write) = body.into_write();
    let view = svc.create_element(&caller, id, write).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn update_element(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
    Json(body): Json<ElementBody>,
) -> ApiResult<Json<EntityView<ElementScalar>>> {
    let (_, write) = body.into_write();
    Ok(Json(svc.update_element(&caller, &id, write).await?))
}

pub(crate) async fn delete_element(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    svc.delete_element(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Section handlers ====================

pub(crate) async fn list_sections(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<PageView<SectionScalar>>> {
    let params = parse_list_params(query.as_deref().unwrap_or(""))?;
    Ok(Json(svc.list_sections(&caller, params).await?))
}

pub(crate) async fn get_section(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<Json<EntityView<SectionScalar>>> {
    Ok(Json(svc.get_section(&caller, &id).await?))
}

pub(crate) async fn create_section(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Json(body): Json<SectionBody>,
) -> ApiResult<impl IntoResponse> {
    let (id, write) = body.into_write();
    let view = svc.create_section(&caller, id, write).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn update_section(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
    Json(body): Json<SectionBody>,
) -> ApiResult<Json<EntityView<SectionScalar>>> {
    let (_, write) = body.into_write();
    Ok(Json(svc.update_section(&caller, &id, write).await?))
}

pub(crate) async fn delete_section(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    svc.delete_section(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Point handlers ====================

pub(crate) async fn list_points(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<PageView<PointScalar>>> {
    let params = parse_list_params(query.as_deref().unwrap_or(""))?;
    Ok(Json(svc.list_points(&caller, params).await?))
}

pub(crate) async fn get_point(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<Json<EntityView<PointScalar>>> {
    Ok(Json(svc.get_point(&caller, &id).await?))
}

pub(crate) async fn create_point(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Json(body): Json<PointBody>,
) -> ApiResult<impl IntoResponse> {
    let (id, write) = body.into_write();
    let view = svc.create_point(&caller, id, write).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn update_point(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
    Json(body): Json<PointBody>,
) -> ApiResult<Json<EntityView<PointScalar>>> {
    let (_, write) = body.into_write();
    Ok(Json(svc.update_point(&caller, &id, write).await?))
}

pub(crate) async fn delete_point(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    svc.delete_point(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== User handlers ====================

pub(crate) async fn list_users(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<PageView<UserScalar>>> {
    let params = parse_list_params(query.as_deref().unwrap_or(""))?;
    Ok(Json(svc.list_users(&caller, params).await?))
}

pub(crate) async fn get_user(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<Json<EntityView<UserScalar>>> {
    Ok(Json(svc.get_user(&caller, &id).await?))
}

pub(crate) async fn create_user(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Json(body): Json<UserBody>,
) -> ApiResult<impl IntoResponse> {
    let (id, write) = body.into_write();
    let view = svc.create_user(&caller, id, write).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn update_user(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
    Json(body): Json<UserBody>,
) -> ApiResult<Json<EntityView<UserScalar>>> {
    let (_, write) = body.into_write();
    Ok(Json(svc.update_user(&caller, &id, write).await?))
}

pub(crate) async fn delete_user(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    svc.delete_user(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Group handlers ====================

pub(crate) async fn list_groups(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<PageView<GroupScalar>>> {
    let params = parse_list_params(query.as_deref().unwrap_or(""))?;
    Ok(Json(svc.list_groups(&caller, params).await?))
}

pub(crate) async fn get_group(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<Json<EntityView<GroupScalar>>> {
    Ok(Json(svc.get_group(&caller, &id).await?))
}

pub(crate) async fn create_group(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Json(body): Json<GroupBody>,
) -> ApiResult<impl IntoResponse> {
    let (id, write) = body.into_write();
    let view = svc.create_group(&caller, id, write).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn update_group(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
    Json(body): Json<GroupBody>,
) -> ApiResult<Json<EntityView<GroupScalar>>> {
    let (_, write) = body.into_write();
    Ok(Json(svc.update_group(&caller, &id, write).await?))
}

pub(crate) async fn delete_group(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    svc.delete_group(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== File handlers ====================

pub(crate) async fn list_files(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<PageView<FileScalar>>> {
    let params = parse_list_params(query.as_deref().unwrap_or(""))?;
    Ok(Json(svc.list_files(&caller, params).await?))
}

pub(crate) async fn get_file(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<Json<EntityView<FileScalar>>> {
    Ok(Json(svc.get_file(&caller, &id).await?))
}

pub(crate) async fn create_file(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Json(body): Json<FileBody>,
) -> ApiResult<impl IntoResponse> {
    let (id, write) = body.into_write();
    let view = svc.create_file(&caller, id, write).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn update_file(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
    Json(body): Json<FileBody>,
) -> ApiResult<Json<EntityView<FileScalar>>> {
    let (_, write) = body.into_write();
    Ok(Json(svc.update_file(&caller, &id, write).await?))
}

pub(crate) async fn delete_file(
    caller: Caller,
    Extension(svc): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    svc.delete_file(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Auth handlers ====================

pub(crate) async fn register(
    Extension(svc): Extension<Arc<Catalog>>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<impl IntoResponse> {
    let view = svc.register_user(body.into()).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn login(
    Extension(svc): Extension<Arc<Catalog>>,
    Extension(session): Extension<SessionLayerState>,
    Json(body): Json<LoginBody>,
) -> ApiResult<Response> {
    let auth = svc.authenticate(&body.login, &body.password).await?;
    let token = session
        .keys
        .sign(&auth.id, &auth.login, auth.groups.clone())
        .map_err(|e| ApiError(DomainError::database(format!("token signing failed: {e}"))))?;
    let cookie = session.cookies.issue(&token, session.keys.ttl_secs());

    let mut response = Json(json!({
        "id": auth.id,
        "login": auth.login,
        "groups": auth.groups,
    }))
    .into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    Ok(response)
}

pub(crate) async fn logout(Extension(session): Extension<SessionLayerState>) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    if let Ok(value) = HeaderValue::from_str(&session.cookies.clear()) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}
