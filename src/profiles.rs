use spin_sdk::http::{Method, Request, Response};
use uuid::Uuid;
use crate::auth::validate_token;
use crate::config::{github_client_id, github_client_secret, MAX_BIO_LENGTH};
use crate::core::db;
use crate::core::errors::{field_error, ApiError, FieldError};
use crate::core::helpers::{now_iso, sanitize_text, store, validate_uuid};
use crate::models::models::{Account, Education, Experience, Profile, SocialLinks};

/// Comma-separated skills string into a trimmed ordered list.
pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Removes the entry whose id matches, keeping relative order of the rest.
/// Returns false (and leaves the list untouched) when no entry matches.
pub fn excise_by_id<T>(entries: &mut Vec<T>, id: &str, id_of: fn(&T) -> &str) -> bool {
    let before = entries.len();
    entries.retain(|entry| id_of(entry) != id);
    entries.len() != before
}

/// Profile with the owning account's name/avatar joined in, the shape every
/// read endpoint returns.
fn profile_json(profile: &Profile, account: Option<&Account>) -> anyhow::Result<serde_json::Value> {
    let mut json = serde_json::to_value(profile)?;
    if let Some(account) = account {
        json["user"] = serde_json::json!({
            "id": account.id,
            "name": account.name,
            "avatar": account.avatar,
        });
    }
    Ok(json)
}

fn profile_response(profile: &Profile, account: Option<&Account>) -> anyhow::Result<Response> {
    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .body(serde_json::to_vec(&profile_json(profile, account)?)?)
        .build())
}

pub fn get_my_profile(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let store = store();
    match db::get_profile(&store, &user_id)? {
        Some(profile) => {
            let account = db::get_account(&store, &user_id)?;
            profile_response(&profile, account.as_ref())
        }
        None => Ok(ApiError::NotFound("There is no profile for this user".to_string()).into()),
    }
}

pub fn upsert_profile(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or_default();
    let status = body["status"].as_str().unwrap_or_default();
    let skills = body["skills"].as_str().unwrap_or_default();

    let mut errors = Vec::new();
    if status.trim().is_empty() {
        errors.push(field_error("status", "Status is required"));
    }
    if skills.trim().is_empty() {
        errors.push(field_error("skills", "Skills is required"));
    }
    if !errors.is_empty() {
        return Ok(ApiError::Validation(errors).into());
    }

    let store = store();
    // Merge-upsert: absent fields keep their stored values.
    let mut profile = match db::get_profile(&store, &user_id)? {
        Some(existing) => existing,
        None => Profile {
            user: user_id.clone(),
            company: None,
            website: None,
            location: None,
            bio: None,
            status: String::new(),
            github_username: None,
            skills: Vec::new(),
            social: SocialLinks::default(),
            experience: Vec::new(),
            education: Vec::new(),
            created_at: now_iso(),
        },
    };

    profile.status = status.to_string();
    profile.skills = parse_skills(skills);

    if let Some(v) = body["company"].as_str() {
        profile.company = Some(v.to_string());
    }
    if let Some(v) = body["website"].as_str() {
        profile.website = Some(v.to_string());
    }
    if let Some(v) = body["location"].as_str() {
        profile.location = Some(v.to_string());
    }
    if let Some(v) = body["bio"].as_str() {
        if v.len() > MAX_BIO_LENGTH {
            return Ok(ApiError::Validation(vec![field_error(
                "bio",
                "Bio too long (max 500 chars)",
            )])
            .into());
        }
        let sanitized = sanitize_text(v);
        profile.bio = if sanitized.is_empty() { None } else { Some(sanitized) };
    }
    if let Some(v) = body["github_username"].as_str() {
        profile.github_username = Some(v.to_string());
    }
    if let Some(v) = body["youtube"].as_str() {
        profile.social.youtube = Some(v.to_string());
    }
    if let Some(v) = body["twitter"].as_str() {
        profile.social.twitter = Some(v.to_string());
    }
    if let Some(v) = body["facebook"].as_str() {
        profile.social.facebook = Some(v.to_string());
    }
    if let Some(v) = body["linkedin"].as_str() {
        profile.social.linkedin = Some(v.to_string());
    }
    if let Some(v) = body["instagram"].as_str() {
        profile.social.instagram = Some(v.to_string());
    }

    db::put_profile(&store, &profile)?;

    let account = db::get_account(&store, &user_id)?;
    profile_response(&profile, account.as_ref())
}

pub fn list_profiles(_req: Request) -> anyhow::Result<Response> {
    let store = store();
    let profiles = db::list_profiles(&store)?;

    let mut out = Vec::new();
    for profile in &profiles {
        let account = db::get_account(&store, &profile.user)?;
        out.push(profile_json(profile, account.as_ref())?);
    }

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .body(serde_json::to_vec(&out)?)
        .build())
}

pub fn get_profile_by_user(path: &str) -> anyhow::Result<Response> {
    let user_id = path.trim_start_matches("/api/profile/user/");

    // Malformed ids are indistinguishable from missing profiles on purpose.
    if user_id.is_empty() || !validate_uuid(user_id) {
        return Ok(ApiError::NotFound("Profile not found".to_string()).into());
    }

    let store = store();
    match db::get_profile(&store, user_id)? {
        Some(profile) => {
            let account = db::get_account(&store, user_id)?;
            profile_response(&profile, account.as_ref())
        }
        None => Ok(ApiError::NotFound("Profile not found".to_string()).into()),
    }
}

/// Removes the caller's profile and account together.
pub fn delete_account(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let store = store();
    // TODO: also remove this account's posts; they currently outlive the
    // account with a stale author snapshot.
    db::delete_profile(&store, &user_id)?;
    db::delete_account(&store, &user_id)?;

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .body(serde_json::to_vec(&serde_json::json!({"msg": "User deleted"}))?)
        .build())
}

fn require_profile(
    store: &spin_sdk::key_value::Store,
    user_id: &str,
) -> anyhow::Result<Result<Profile, ApiError>> {
    match db::get_profile(store, user_id)? {
        Some(profile) => Ok(Ok(profile)),
        None => Ok(Err(ApiError::NotFound(
            "There is no profile for this user".to_string(),
        ))),
    }
}

pub fn add_experience(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or_default();
    let mut errors: Vec<FieldError> = Vec::new();
    let title = require_str(&body, "title", "Title is required", &mut errors);
    let company = require_str(&body, "company", "Company is required", &mut errors);
    let from = require_str(&body, "from", "From date is required", &mut errors);
    if !errors.is_empty() {
        return Ok(ApiError::Validation(errors).into());
    }

    let store = store();
    let mut profile = match require_profile(&store, &user_id)? {
        Ok(profile) => profile,
        Err(err) => return Ok(err.into()),
    };

    let entry = Experience {
        id: Uuid::new_v4().to_string(),
        title,
        company,
        location: body["location"].as_str().map(str::to_string),
        from,
        to: body["to"].as_str().map(str::to_string),
        current: body["current"].as_bool().unwrap_or(false),
        description: body["description"].as_str().map(str::to_string),
    };
    profile.experience.insert(0, entry); // most recent first
    db::put_profile(&store, &profile)?;

    profile_response(&profile, db::get_account(&store, &user_id)?.as_ref())
}

pub fn delete_experience(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let exp_id = req.path().split('/').last().unwrap_or("").to_string();
    let store = store();
    let mut profile = match require_profile(&store, &user_id)? {
        Ok(profile) => profile,
        Err(err) => return Ok(err.into()),
    };

    if !excise_by_id(&mut profile.experience, &exp_id, |e| &e.id) {
        return Ok(ApiError::NotFound("Experience entry not found".to_string()).into());
    }
    db::put_profile(&store, &profile)?;

    profile_response(&profile, db::get_account(&store, &user_id)?.as_ref())
}

pub fn add_education(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or_default();
    let mut errors: Vec<FieldError> = Vec::new();
    let school = require_str(&body, "school", "School is required", &mut errors);
    let degree = require_str(&body, "degree", "Degree is required", &mut errors);
    let field_of_study =
        require_str(&body, "field_of_study", "Field of study is required", &mut errors);
    let from = require_str(&body, "from", "From date is required", &mut errors);
    if !errors.is_empty() {
        return Ok(ApiError::Validation(errors).into());
    }

    let store = store();
    let mut profile = match require_profile(&store, &user_id)? {
        Ok(profile) => profile,
        Err(err) => return Ok(err.into()),
    };

    let entry = Education {
        id: Uuid::new_v4().to_string(),
        school,
        degree,
        field_of_study,
        from,
        to: body["to"].as_str().map(str::to_string),
        current: body["current"].as_bool().unwrap_or(false),
        description: body["description"].as_str().map(str::to_string),
    };
    profile.education.insert(0, entry);
    db::put_profile(&store, &profile)?;

    profile_response(&profile, db::get_account(&store, &user_id)?.as_ref())
}

pub fn delete_education(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let edu_id = req.path().split('/').last().unwrap_or("").to_string();
    let store = store();
    let mut profile = match require_profile(&store, &user_id)? {
        Ok(profile) => profile,
        Err(err) => return Ok(err.into()),
    };

    if !excise_by_id(&mut profile.education, &edu_id, |e| &e.id) {
        return Ok(ApiError::NotFound("Education entry not found".to_string()).into());
    }
    db::put_profile(&store, &profile)?;

    profile_response(&profile, db::get_account(&store, &user_id)?.as_ref())
}

fn require_str(
    body: &serde_json::Value,
    param: &'static str,
    msg: &str,
    errors: &mut Vec<FieldError>,
) -> String {
    let value = body[param].as_str().unwrap_or_default();
    if value.trim().is_empty() {
        errors.push(field_error(param, msg));
    }
    value.to_string()
}

/// Builds the upstream repo-listing URL for a username; service credentials
/// are appended when configured.
pub fn github_repos_url(username: &str) -> String {
    let mut url = format!(
        "https://api.github.com/users/{}/repos?per_page=5&sort=created:asc",
        urlencoding::encode(username)
    );
    if let (Some(id), Some(secret)) = (github_client_id(), github_client_secret()) {
        url.push_str(&format!("&client_id={}&client_secret={}", id, secret));
    }
    url
}

/// Pass-through proxy to the GitHub repo listing; no business logic beyond
/// status mapping.
pub fn github_repos(path: &str) -> anyhow::Result<Response> {
    let username = path.trim_start_matches("/api/profile/github/");
    if username.is_empty() {
        return Ok(ApiError::NotFound("No Github profile found".to_string()).into());
    }

    let url = github_repos_url(username);
    let upstream = Request::builder()
        .method(Method::Get)
        .uri(&url)
        .header("User-Agent", "devconnect")
        .body(Vec::<u8>::new())
        .build();

    let result: Result<Response, _> =
        spin_sdk::http::run(spin_sdk::http::send::<_, Response>(upstream));
    let resp = match result {
        Ok(resp) => resp,
        Err(e) => return Ok(ApiError::Internal(e.to_string()).into()),
    };

    if *resp.status() != 200 {
        return Ok(ApiError::NotFound("No Github profile found".to_string()).into());
    }

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .body(resp.body().to_vec())
        .build())
}
