use spin_sdk::http::{Request, Response};
#[cfg(target_arch = "wasm32")]
use spin_sdk::{http::IntoResponse, http_component};

pub mod accounts;
pub mod auth;
pub mod config;
pub mod posts;
pub mod profiles;

pub mod core {
    pub mod db;
    pub mod errors;
    pub mod helpers;
}

pub mod models {
    pub mod models;
}

use crate::core::errors::ApiError;

/// Flat router over the three resource families. Handlers pull path
/// parameters out of the request themselves.
pub fn route(req: Request) -> anyhow::Result<Response> {
    let path = req.path().to_string();
    let method = req.method().to_string();

    match (method.as_str(), path.as_str()) {
        ("POST", "/api/users") => accounts::register(req),
        ("POST", "/api/auth/login") => auth::login(req),
        ("GET", "/api/auth") => auth::current_account(req),

        ("GET", "/api/profile/me") => profiles::get_my_profile(req),
        ("POST", "/api/profile") => profiles::upsert_profile(req),
        ("GET", "/api/profile") => profiles::list_profiles(req),
        ("DELETE", "/api/profile") => profiles::delete_account(req),
        ("PUT", "/api/profile/experience") => profiles::add_experience(req),
        ("PUT", "/api/profile/education") => profiles::add_education(req),
        ("DELETE", p) if p.starts_with("/api/profile/experience/") => {
            profiles::delete_experience(req)
        }
        ("DELETE", p) if p.starts_with("/api/profile/education/") => {
            profiles::delete_education(req)
        }
        ("GET", p) if p.starts_with("/api/profile/user/") => profiles::get_profile_by_user(p),
        ("GET", p) if p.starts_with("/api/profile/github/") => profiles::github_repos(p),

        ("POST", "/api/posts") => posts::create_post(req),
        ("GET", "/api/posts") => posts::list_posts(req),
        ("PUT", p) if p.starts_with("/api/posts/like/") => posts::toggle_like(req),
        ("POST", p) if p.starts_with("/api/posts/") && p.ends_with("/comment") => {
            posts::add_comment(req)
        }
        ("DELETE", p) if p.starts_with("/api/posts/") && p.contains("/comment/") => {
            posts::delete_comment(req)
        }
        ("DELETE", p) if p.starts_with("/api/posts/") => posts::delete_post(req),
        ("GET", p) if p.starts_with("/api/posts/") => posts::get_post(req),

        _ => Ok(ApiError::NotFound("No route found".to_string()).into()),
    }
}

#[cfg(target_arch = "wasm32")]
#[http_component]
fn handle(req: Request) -> anyhow::Result<impl IntoResponse> {
    route(req)
}
