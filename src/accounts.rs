use spin_sdk::http::{Request, Response};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use crate::auth::issue_token;
use crate::config::MIN_PASSWORD_LENGTH;
use crate::core::db;
use crate::core::errors::{field_error, ApiError};
use crate::core::helpers::{hash_password, now_iso, sanitize_text, store, validate_email};
use crate::models::models::Account;

/// Deterministic avatar URL derived from the email, captured once at signup.
pub fn gravatar_url(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{:x}?s=200&d=mm",
        hasher.finalize()
    )
}

pub fn register(req: Request) -> anyhow::Result<Response> {
    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or_default();
    let name = body["name"].as_str().unwrap_or_default();
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push(field_error("name", "Name is required"));
    }
    if !validate_email(email) {
        errors.push(field_error("email", "Please include a valid email"));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        errors.push(field_error(
            "password",
            "Please enter a password with 6 or more characters",
        ));
    }
    if !errors.is_empty() {
        return Ok(ApiError::Validation(errors).into());
    }

    let store = store();
    if db::find_account_by_email(&store, email)?.is_some() {
        return Ok(ApiError::Validation(vec![field_error("email", "User already exists")]).into());
    }

    let account = Account {
        id: Uuid::new_v4().to_string(),
        name: sanitize_text(name),
        email: email.to_string(),
        password: hash_password(password)?,
        avatar: gravatar_url(email),
        created_at: now_iso(),
    };
    db::insert_account(&store, &account)?;

    let token = issue_token(&account.id)?;
    Ok(Response::builder()
        .status(201)
        .header("Content-Type", "application/json")
        .body(serde_json::to_vec(&serde_json::json!({ "token": token }))?)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravatar_is_deterministic_and_normalizes() {
        let a = gravatar_url("Alice@Example.com ");
        let b = gravatar_url("alice@example.com");
        assert_eq!(a, b);
        assert!(a.starts_with("https://www.gravatar.com/avatar/"));
    }

    #[test]
    fn different_emails_get_different_avatars() {
        assert_ne!(gravatar_url("alice@example.com"), gravatar_url("bob@example.com"));
    }
}
