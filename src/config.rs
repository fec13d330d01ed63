pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_POST_LENGTH: usize = 5000;
pub const MAX_BIO_LENGTH: usize = 500;

pub const ACCOUNTS_LIST_KEY: &str = "accounts_list";
pub const PROFILES_LIST_KEY: &str = "profiles_list";
pub const POSTS_LIST_KEY: &str = "posts_list";

pub fn jwt_secret() -> String {
    std::env::var("DEVCONNECT_JWT_SECRET")
        .unwrap_or_else(|_| "devconnect-dev-secret".to_string())
}

pub fn token_expiration_secs() -> i64 {
    std::env::var("DEVCONNECT_TOKEN_EXPIRATION_SECS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(10000)
}

pub fn github_client_id() -> Option<String> {
    std::env::var("DEVCONNECT_GITHUB_CLIENT_ID").ok().filter(|v| !v.is_empty())
}

pub fn github_client_secret() -> Option<String> {
    std::env::var("DEVCONNECT_GITHUB_CLIENT_SECRET").ok().filter(|v| !v.is_empty())
}
