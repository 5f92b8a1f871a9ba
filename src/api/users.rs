use actix_web::{web, HttpResponse};
use serde_json::Value;

use crate::database::{InsertOutcome, UpdateOutcome};
use crate::middleware::Identity;
use crate::models::{has_admin_role, AdminStatus, ElevateAdminRequest, Role, UserProfile};
use crate::state::AppState;
use crate::utils::error::{AppError, ErrorBody};

/// POST /users - Stores a user document as sent (role stripped)
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "User inserted", body = InsertOutcome),
        (status = 400, description = "Payload is not a user object", body = ErrorBody)
    )
)]
pub async fn create_user(
    state: web::Data<AppState>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let profile = UserProfile::from_json(payload.into_inner())?;
    log::info!("📝 POST /users - email: {}", profile.email);

    let result = state.users.insert(profile.document).await?;

    log::info!("✅ User inserted: {}", result.inserted_id);
    Ok(HttpResponse::Ok().json(result))
}

/// PUT /users - Login-time sync, one record per email
#[utoipa::path(
    put,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "User inserted or updated", body = UpdateOutcome),
        (status = 400, description = "Payload is not a user object", body = ErrorBody)
    )
)]
pub async fn upsert_user(
    state: web::Data<AppState>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let profile = UserProfile::from_json(payload.into_inner())?;
    log::info!("🔄 PUT /users - email: {}", profile.email);

    let result = state
        .users
        .upsert_by_email(&profile.email, profile.document)
        .await?;

    log::info!(
        "✅ User synced: matched={} upserted={}",
        result.matched_count,
        result.upserted_count
    );
    Ok(HttpResponse::Ok().json(result))
}

/// GET /users/{email} - Whether the user holds the admin role
#[utoipa::path(
    get,
    path = "/users/{email}",
    tag = "Users",
    params(("email" = String, Path, description = "User email")),
    responses(
        (status = 200, description = "Admin flag", body = AdminStatus)
    )
)]
pub async fn get_admin_status(
    state: web::Data<AppState>,
    email: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    log::info!("👤 GET /users/{}", email);

    let admin = state
        .users
        .find_by_email(&email)
        .await?
        .map(|user| has_admin_role(&user))
        .unwrap_or(false);

    Ok(HttpResponse::Ok().json(AdminStatus { admin }))
}

/// PUT /users/admin - Grants the admin role; only admins may call it
#[utoipa::path(
    put,
    path = "/users/admin",
    tag = "Users",
    request_body = ElevateAdminRequest,
    responses(
        (status = 200, description = "Role granted", body = UpdateOutcome),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Requester is not an admin", body = ErrorBody),
        (status = 404, description = "Target user does not exist", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn make_admin(
    identity: Identity,
    state: web::Data<AppState>,
    request: web::Json<ElevateAdminRequest>,
) -> Result<HttpResponse, AppError> {
    let target = request.email.trim();
    if target.is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }

    log::info!("🛡️  PUT /users/admin - {} -> {}", identity.email(), target);

    let requester = state.users.find_by_email(identity.email()).await?;
    if !requester.as_ref().map(has_admin_role).unwrap_or(false) {
        log::warn!("⚠️  {} tried to grant admin without the admin role", identity.email());
        return Err(AppError::Forbidden(
            "only admins can grant the admin role".to_string(),
        ));
    }

    let result = state.users.set_role(target, Role::Admin).await?;
    if result.matched_count == 0 {
        return Err(AppError::NotFound(format!("user {} does not exist", target)));
    }

    log::info!("✅ {} is now an admin", target);
    Ok(HttpResponse::Ok().json(result))
}
