use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct User {
    pub email: String,
    pub name: String,
    pub role: String,
}

/// Exact comparison against the single configured account. No session or
/// token is issued on success.
pub fn login(auth: &AuthConfig, request: &LoginRequest) -> LoginResponse {
    if request.email == auth.email && request.password == auth.password {
        LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            user: Some(User {
                email: auth.email.clone(),
                name: auth.name.clone(),
                role: auth.role.clone(),
            }),
        }
    } else {
        LoginResponse {
            success: false,
            message: "Invalid email or password".to_string(),
            user: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn exact_match_succeeds() {
        let auth = AuthConfig::default();
        let response = login(&auth, &request(&auth.email, &auth.password));

        assert!(response.success);
        assert_eq!(response.user.unwrap().email, auth.email);
    }

    #[test]
    fn comparison_is_exact() {
        let auth = AuthConfig::default();

        assert!(!login(&auth, &request(&auth.email.to_uppercase(), &auth.password)).success);
        assert!(!login(&auth, &request(&auth.email, "")).success);
        assert!(login(&auth, &request(&format!(" {}", auth.email), &auth.password)).user.is_none());
    }
}
