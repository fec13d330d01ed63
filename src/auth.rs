use spin_sdk::http::{Request, Response};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use crate::config::{jwt_secret, token_expiration_secs};
use crate::core::db;
use crate::core::errors::{field_error, ApiError};
use crate::core::helpers::{store, validate_email, verify_password};
use crate::models::models::{Account, Claims};

/// Signed bearer token carrying the account id, valid for
/// `token_expiration_secs()` from now.
pub fn issue_token(account_id: &str) -> anyhow::Result<String> {
    let exp = chrono::Utc::now().timestamp() + token_expiration_secs();
    let claims = Claims {
        sub: account_id.to_string(),
        exp: exp as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret().as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to sign token: {}", e))
}

/// Verifies signature and expiry; returns the embedded account id.
pub fn decode_token(token: &str) -> Option<String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret().as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims.sub)
}

pub fn validate_token(req: &Request) -> Option<String> {
    let auth_header = req.header("Authorization")?.as_str().unwrap_or_default();
    if !auth_header.starts_with("Bearer ") {
        return None;
    }
    let token = auth_header.strip_prefix("Bearer ").unwrap();
    decode_token(token)
}

fn account_json(account: &Account) -> serde_json::Value {
    // Public fields only - the password hash never leaves the store.
    serde_json::json!({
        "id": account.id,
        "name": account.name,
        "email": account.email,
        "avatar": account.avatar,
        "created_at": account.created_at,
    })
}

pub fn login(req: Request) -> anyhow::Result<Response> {
    let creds: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or_default();
    let email = creds["email"].as_str().unwrap_or_default();
    let password = creds["password"].as_str().unwrap_or_default();

    let mut errors = Vec::new();
    if !validate_email(email) {
        errors.push(field_error("email", "Please include a valid email"));
    }
    if password.is_empty() {
        errors.push(field_error("password", "Password is required"));
    }
    if !errors.is_empty() {
        return Ok(ApiError::Validation(errors).into());
    }

    let store = store();
    let account = match db::find_account_by_email(&store, email)? {
        Some(account) => account,
        None => return Ok(ApiError::InvalidCredentials.into()),
    };

    if !verify_password(password, &account.password) {
        return Ok(ApiError::InvalidCredentials.into());
    }

    let token = issue_token(&account.id)?;
    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .body(serde_json::to_vec(&serde_json::json!({ "token": token }))?)
        .build())
}

/// GET /api/auth - resolves the bearer token back to its account.
pub fn current_account(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let store = store();
    match db::get_account(&store, &user_id)? {
        Some(account) => Ok(Response::builder()
            .status(200)
            .header("Content-Type", "application/json")
            .body(serde_json::to_vec(&account_json(&account))?)
            .build()),
        None => Ok(ApiError::NotFound("Account not found".to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_resolves_same_account() {
        let token = issue_token("11111111-1111-4111-8111-111111111111").unwrap();
        assert_eq!(
            decode_token(&token).as_deref(),
            Some("11111111-1111-4111-8111-111111111111")
        );
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = issue_token("11111111-1111-4111-8111-111111111111").unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(decode_token(&tampered).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        use jsonwebtoken::{encode, EncodingKey, Header};
        let claims = crate::models::models::Claims {
            sub: "someone".to_string(),
            exp: (chrono::Utc::now().timestamp() - 600) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(crate::config::jwt_secret().as_bytes()),
        )
        .unwrap();
        assert!(decode_token(&token).is_none());
    }

    #[test]
    fn account_json_has_no_password() {
        let account = Account {
            id: "id".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "$argon2id$hash".to_string(),
            avatar: "https://www.gravatar.com/avatar/x".to_string(),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
        };
        let json = account_json(&account);
        assert!(json.get("password").is_none());
        assert_eq!(json["name"], "Alice");
    }
}
