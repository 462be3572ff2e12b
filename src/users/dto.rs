use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo_types::Role;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for re-sending the verification email.
#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

/// Generic `{message, success}` envelope for register/verify responses.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub success: bool,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

/// Profile returned from the protected `/users/me` route.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_shape() {
        let response = LoginResponse {
            success: true,
            message: "Login successful".into(),
            token: "jwt-goes-here".into(),
            user: PublicUser {
                id: Uuid::new_v4(),
                name: "A".into(),
                role: Role::User,
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["token"], "jwt-goes-here");
        assert_eq!(json["user"]["role"], "user");
        assert!(json["user"]["id"].is_string());
    }

    #[test]
    fn register_request_deserializes() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"name":"A","email":"a@x.com","password":"p1"}"#).unwrap();
        assert_eq!(req.name, "A");
        assert_eq!(req.email, "a@x.com");
    }
}
