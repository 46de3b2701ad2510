use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest};
use crate::{
    entity::users::{self, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

const TOKEN_TTL_HOURS: i64 = 8;
const ROLES: [&str; 2] = ["user", "admin"];

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let username = payload.username.trim();
    let password = payload.password.trim();
    let role = payload
        .role
        .as_deref()
        .map(|r| r.trim().to_lowercase())
        .unwrap_or_else(|| "user".to_string());

    if username.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }
    if !ROLES.contains(&role.as_str()) {
        return Err(AppError::BadRequest("Invalid role".to_string()));
    }

    let exists = Users::find()
        .filter(UserCol::Username.eq(username))
        .one(&state.orm)
        .await?
        .is_some();
    if exists {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        password_hash: Set(hash_password(password)?),
        role: Set(role),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "user registered");
    Ok(ApiResponse::success(
        "Registered successfully",
        User::from(user),
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let username = payload.username.trim();
    let password = payload.password.trim();

    let user = Users::find()
        .filter(UserCol::Username.eq(username))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) if verify_password(password, &u.password_hash)? => u,
        _ => {
            return Err(AppError::Unauthorized(
                "Invalid username or password".into(),
            ));
        }
    };

    let token = issue_token(&state.config.jwt_secret, &user)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            access_token: token,
            user: User::from(user),
        },
        Some(Meta::empty()),
    ))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn verify_password(password: &str, stored: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(stored)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(secret: &str, user: &users::Model) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        username: user.username.clone(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            username: "ferris".into(),
            password_hash: String::new(),
            role: role.into(),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn token_round_trips_claims() {
        let user = user("admin");
        let token = issue_token("secret", &user).unwrap();
        let claims = decode_token("secret", &token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.username, "ferris");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token("secret", &user("user")).unwrap();
        assert!(decode_token("other", &token).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }
}
