use spin_sdk::http::{Request, Response};
use uuid::Uuid;
use crate::auth::validate_token;
use crate::config::MAX_POST_LENGTH;
use crate::core::db;
use crate::core::errors::{field_error, ApiError};
use crate::core::helpers::{now_iso, sanitize_text, store, validate_uuid};
use crate::models::models::{Comment, Like, Post};

/// Membership-keyed toggle: removes the caller's like when present, otherwise
/// prepends one. Returns true when the post ends up liked.
pub fn toggle_like_entry(likes: &mut Vec<Like>, user_id: &str) -> bool {
    if likes.iter().any(|like| like.user == user_id) {
        likes.retain(|like| like.user != user_id);
        false
    } else {
        likes.insert(0, Like { user: user_id.to_string() });
        true
    }
}

fn json_response(status: u16, body: &impl serde::Serialize) -> anyhow::Result<Response> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_vec(body)?)
        .build())
}

pub fn create_post(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or_default();
    let text = body["text"].as_str().unwrap_or_default();
    if text.trim().is_empty() {
        return Ok(ApiError::Validation(vec![field_error("text", "Text is required")]).into());
    }
    if text.len() > MAX_POST_LENGTH {
        return Ok(ApiError::Validation(vec![field_error("text", "Text is too long")]).into());
    }

    let store = store();
    let account = match db::get_account(&store, &user_id)? {
        Some(account) => account,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let post = Post {
        id: Uuid::new_v4().to_string(),
        user: user_id,
        text: sanitize_text(text),
        // Author snapshot; never refreshed if the account changes later.
        name: account.name,
        avatar: account.avatar,
        likes: Vec::new(),
        comments: Vec::new(),
        created_at: now_iso(),
    };
    db::insert_post(&store, &post)?;

    json_response(201, &post)
}

pub fn list_posts(req: Request) -> anyhow::Result<Response> {
    if validate_token(&req).is_none() {
        return Ok(ApiError::Unauthorized.into());
    }

    let store = store();
    let posts = db::list_posts(&store)?; // newest first
    json_response(200, &posts)
}

pub fn get_post(req: Request) -> anyhow::Result<Response> {
    if validate_token(&req).is_none() {
        return Ok(ApiError::Unauthorized.into());
    }

    let post_id = req.path().split('/').last().unwrap_or("");
    if post_id.is_empty() || !validate_uuid(post_id) {
        return Ok(ApiError::NotFound("Post not found".to_string()).into());
    }

    let store = store();
    match db::get_post(&store, post_id)? {
        Some(post) => json_response(200, &post),
        None => Ok(ApiError::NotFound("Post not found".to_string()).into()),
    }
}

pub fn delete_post(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let post_id = req.path().split('/').last().unwrap_or("");
    if post_id.is_empty() || !validate_uuid(post_id) {
        return Ok(ApiError::NotFound("Post not found".to_string()).into());
    }

    let store = store();
    let post = match db::get_post(&store, post_id)? {
        Some(post) => post,
        None => return Ok(ApiError::NotFound("Post not found".to_string()).into()),
    };

    if post.user != user_id {
        return Ok(ApiError::Forbidden.into());
    }

    db::delete_post(&store, post_id)?;
    json_response(200, &serde_json::json!({"msg": "Post removed"}))
}

pub fn toggle_like(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let post_id = req.path().split('/').last().unwrap_or("");
    if post_id.is_empty() || !validate_uuid(post_id) {
        return Ok(ApiError::NotFound("Post not found".to_string()).into());
    }

    let store = store();
    let mut post = match db::get_post(&store, post_id)? {
        Some(post) => post,
        None => return Ok(ApiError::NotFound("Post not found".to_string()).into()),
    };

    toggle_like_entry(&mut post.likes, &user_id);
    db::put_post(&store, &post)?;

    json_response(200, &post.likes)
}

pub fn add_comment(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    // /api/posts/:id/comment
    let segments: Vec<&str> = req.path().split('/').collect();
    let post_id = segments.get(3).copied().unwrap_or("");
    if post_id.is_empty() || !validate_uuid(post_id) {
        return Ok(ApiError::NotFound("Post not found".to_string()).into());
    }

    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or_default();
    let text = body["text"].as_str().unwrap_or_default();
    if text.trim().is_empty() {
        return Ok(ApiError::Validation(vec![field_error("text", "Text is required")]).into());
    }

    let store = store();
    let account = match db::get_account(&store, &user_id)? {
        Some(account) => account,
        None => return Ok(ApiError::Unauthorized.into()),
    };
    let mut post = match db::get_post(&store, post_id)? {
        Some(post) => post,
        None => return Ok(ApiError::NotFound("Post not found".to_string()).into()),
    };

    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        user: user_id,
        text: sanitize_text(text),
        name: account.name,
        avatar: account.avatar,
        created_at: now_iso(),
    };
    post.comments.insert(0, comment); // newest first
    db::put_post(&store, &post)?;

    json_response(200, &post.comments)
}

pub fn delete_comment(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    // /api/posts/:id/comment/:comment_id
    let segments: Vec<&str> = req.path().split('/').collect();
    let post_id = segments.get(3).copied().unwrap_or("");
    let comment_id = segments.get(5).copied().unwrap_or("");
    if post_id.is_empty() || !validate_uuid(post_id) {
        return Ok(ApiError::NotFound("Post not found".to_string()).into());
    }

    let store = store();
    let mut post = match db::get_post(&store, post_id)? {
        Some(post) => post,
        None => return Ok(ApiError::NotFound("Post not found".to_string()).into()),
    };

    let comment = match post.comments.iter().find(|c| c.id == comment_id) {
        Some(comment) => comment,
        None => return Ok(ApiError::NotFound("Comment does not exist".to_string()).into()),
    };
    if comment.user != user_id {
        return Ok(ApiError::Forbidden.into());
    }

    // Removal is keyed on the comment's own id, so an author with several
    // comments on the post only ever loses the targeted one.
    post.comments.retain(|c| c.id != comment_id);
    db::put_post(&store, &post)?;

    json_response(200, &post.comments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, user: &str) -> Comment {
        Comment {
            id: id.to_string(),
            user: user.to_string(),
            text: "hi".to_string(),
            name: "N".to_string(),
            avatar: "a".to_string(),
            created_at: now_iso(),
        }
    }

    #[test]
    fn like_toggle_adds_at_front_then_removes() {
        let mut likes = vec![Like { user: "bob".to_string() }];

        assert!(toggle_like_entry(&mut likes, "alice"));
        assert_eq!(likes.len(), 2);
        assert_eq!(likes[0].user, "alice");

        assert!(!toggle_like_entry(&mut likes, "alice"));
        assert_eq!(likes.len(), 1);
        assert_eq!(likes[0].user, "bob");
    }

    #[test]
    fn like_then_unlike_is_identity() {
        let original = vec![Like { user: "x".to_string() }, Like { user: "y".to_string() }];
        let mut likes = original.clone();
        toggle_like_entry(&mut likes, "alice");
        toggle_like_entry(&mut likes, "alice");
        assert!(likes == original);
    }

    #[test]
    fn comment_removal_targets_the_exact_id() {
        // Same author twice; removing the second comment must not touch the first.
        let mut comments = vec![
            comment("c3", "alice"),
            comment("c2", "alice"),
            comment("c1", "bob"),
        ];
        comments.retain(|c| c.id != "c2");
        let ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c1"]);
    }
}
