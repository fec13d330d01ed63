use spin_sdk::http::Response;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub param: String,
    pub msg: String,
}

pub fn field_error(param: &str, msg: &str) -> FieldError {
    FieldError {
        param: param.to_string(),
        msg: msg.to_string(),
    }
}

#[derive(Debug)]
pub enum ApiError {
    Validation(Vec<FieldError>),
    InvalidCredentials,
    Unauthorized,
    Forbidden,
    NotFound(String),
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(errors) => {
                let msgs: Vec<&str> = errors.iter().map(|e| e.msg.as_str()).collect();
                write!(f, "Validation failed: {}", msgs.join(", "))
            }
            ApiError::InvalidCredentials => write!(f, "Invalid credentials"),
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl From<ApiError> for Response {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Validation(errors) => Response::builder()
                .status(400)
                .header("Content-Type", "application/json")
                .body(serde_json::to_vec(&serde_json::json!({"errors": errors})).unwrap())
                .build(),
            // Same body for unknown email and wrong password, so the endpoint
            // cannot be used to enumerate accounts.
            ApiError::InvalidCredentials => Response::builder()
                .status(400)
                .header("Content-Type", "application/json")
                .body(
                    serde_json::to_vec(
                        &serde_json::json!({"errors": [{"msg": "Invalid credentials"}]}),
                    )
                    .unwrap(),
                )
                .build(),
            ApiError::Unauthorized => Response::builder()
                .status(401)
                .header("Content-Type", "application/json")
                .body(serde_json::to_vec(&serde_json::json!({"error": "Unauthorized"})).unwrap())
                .build(),
            ApiError::Forbidden => Response::builder()
                .status(403)
                .header("Content-Type", "application/json")
                .body(serde_json::to_vec(&serde_json::json!({"error": "Forbidden"})).unwrap())
                .build(),
            ApiError::NotFound(msg) => Response::builder()
                .status(404)
                .header("Content-Type", "application/json")
                .body(serde_json::to_vec(&serde_json::json!({"error": msg})).unwrap())
                .build(),
            // The detail is kept for Display/logging only; the response body
            // never carries internal messages.
            ApiError::Internal(_) => Response::builder()
                .status(500)
                .header("Content-Type", "application/json")
                .body(serde_json::to_vec(&serde_json::json!({"error": "Server error"})).unwrap())
                .build(),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> u16 {
        let resp: Response = err.into();
        *resp.status()
    }

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(status_of(ApiError::Validation(vec![field_error("email", "bad")])), 400);
        assert_eq!(status_of(ApiError::InvalidCredentials), 400);
        assert_eq!(status_of(ApiError::Unauthorized), 401);
        assert_eq!(status_of(ApiError::Forbidden), 403);
        assert_eq!(status_of(ApiError::NotFound("x".to_string())), 404);
        assert_eq!(status_of(ApiError::Internal("boom".to_string())), 500);
    }

    #[test]
    fn internal_detail_stays_out_of_the_body() {
        let resp: Response = ApiError::Internal("connection refused at 10.0.0.3".to_string()).into();
        let body = String::from_utf8(resp.body().to_vec()).unwrap();
        assert!(!body.contains("10.0.0.3"));
        assert!(body.contains("Server error"));
    }

    #[test]
    fn validation_body_carries_field_detail() {
        let resp: Response =
            ApiError::Validation(vec![field_error("status", "Status is required")]).into();
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["errors"][0]["param"], "status");
        assert_eq!(body["errors"][0]["msg"], "Status is required");
    }
}
