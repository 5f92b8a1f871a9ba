use mongodb::bson::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::{
    error::AppError,
    json::{expect_object, object_to_document, required_str},
};

/// Roles a stored user can hold. Users without a role field are regular patients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
        }
    }
}

/// Keys a client may never write through the user endpoints.
const PROTECTED_FIELDS: [&str; 2] = ["_id", "role"];

/// A validated user payload: the email key plus opaque profile fields.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub email: String,
    pub document: Document,
}

impl UserProfile {
    pub fn from_json(payload: Value) -> Result<Self, AppError> {
        let mut object = expect_object(payload, "user")?;
        let email = required_str(&mut object, "email")?;

        for field in PROTECTED_FIELDS {
            if object.remove(field).is_some() {
                log::warn!("⚠️  Ignoring protected field '{}' in user payload for {}", field, email);
            }
        }

        Ok(Self {
            email,
            document: object_to_document(object)?,
        })
    }
}

/// True only when the stored user document carries `role: "admin"`.
pub fn has_admin_role(user: &Document) -> bool {
    user.get_str("role")
        .map(|role| role == Role::Admin.as_str())
        .unwrap_or(false)
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AdminStatus {
    pub admin: bool,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ElevateAdminRequest {
    pub email: String,
}
