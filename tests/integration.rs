// End-to-end tests against a running server (spin up, or the native adapter
// binary, on port 3000). Ignored by default for the same reason the load
// tests are: they need that server to exist first.
//
//   cargo run &
//   cargo test -- --ignored

use serde_json::json;
use std::sync::Mutex;

const BASE_URL: &str = "http://127.0.0.1:3000";
static TEST_LOCK: Mutex<()> = Mutex::new(());

fn lock_test() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap()
}

async fn register_and_login(client: &reqwest::Client, password: &str) -> (String, String, String) {
    let email = format!("user_{}@example.com", uuid::Uuid::new_v4());
    let resp = client
        .post(&format!("{}/api/users", BASE_URL))
        .json(&json!({
            "name": "Test User",
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), 201);
    let body = resp.json::<serde_json::Value>().await.unwrap();
    let token = body["token"].as_str().expect("token missing").to_string();

    // Resolve the token back to the account id
    let me = client
        .get(&format!("{}/api/auth", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to probe auth");
    assert_eq!(me.status(), 200);
    let me = me.json::<serde_json::Value>().await.unwrap();
    let account_id = me["id"].as_str().unwrap().to_string();

    (token, account_id, email)
}

#[ignore]
#[tokio::test]
async fn signup_then_login_resolves_same_account() {
    let _lock = lock_test();
    let client = reqwest::Client::new();

    let (_, account_id, email) = register_and_login(&client, "secret1").await;

    let login = client
        .post(&format!("{}/api/auth/login", BASE_URL))
        .json(&json!({"email": email, "password": "secret1"}))
        .send()
        .await
        .expect("Failed to login");
    assert_eq!(login.status(), 200);
    let token = login.json::<serde_json::Value>().await.unwrap()["token"]
        .as_str()
        .unwrap()
        .to_string();

    let me = client
        .get(&format!("{}/api/auth", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), 200);
    let me = me.json::<serde_json::Value>().await.unwrap();
    assert_eq!(me["id"], account_id.as_str());
    assert_eq!(me["email"], email.as_str());
    assert!(me.get("password").is_none(), "password hash leaked: {:?}", me);
}

#[ignore]
#[tokio::test]
async fn wrong_password_and_unknown_email_look_identical() {
    let _lock = lock_test();
    let client = reqwest::Client::new();

    let (_, _, email) = register_and_login(&client, "secret1").await;

    let wrong_password = client
        .post(&format!("{}/api/auth/login", BASE_URL))
        .json(&json!({"email": email, "password": "nope123"}))
        .send()
        .await
        .unwrap();
    let unknown_email = client
        .post(&format!("{}/api/auth/login", BASE_URL))
        .json(&json!({"email": "ghost@example.com", "password": "nope123"}))
        .send()
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), 400);
    assert_eq!(unknown_email.status(), 400);
    let a = wrong_password.json::<serde_json::Value>().await.unwrap();
    let b = unknown_email.json::<serde_json::Value>().await.unwrap();
    assert_eq!(a, b, "credential failures must not distinguish the cause");
}

#[ignore]
#[tokio::test]
async fn profile_upsert_merges_and_parses_skills() {
    let _lock = lock_test();
    let client = reqwest::Client::new();
    let (token, account_id, _) = register_and_login(&client, "secret1").await;

    let created = client
        .post(&format!("{}/api/profile", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "status": "dev",
            "skills": "node, react , css",
            "company": "Acme"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 200);
    let profile = created.json::<serde_json::Value>().await.unwrap();
    assert_eq!(profile["skills"], json!(["node", "react", "css"]));
    assert_eq!(profile["company"], "Acme");

    // Partial body: company must survive the second upsert
    let updated = client
        .post(&format!("{}/api/profile", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({"status": "senior dev", "skills": "go,rust"}))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), 200);
    let profile = updated.json::<serde_json::Value>().await.unwrap();
    assert_eq!(profile["status"], "senior dev");
    assert_eq!(profile["skills"], json!(["go", "rust"]));
    assert_eq!(profile["company"], "Acme");

    let by_user = client
        .get(&format!("{}/api/profile/user/{}", BASE_URL, account_id))
        .send()
        .await
        .unwrap();
    assert_eq!(by_user.status(), 200);

    let missing = client
        .get(&format!("{}/api/profile/user/not-a-uuid", BASE_URL))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[ignore]
#[tokio::test]
async fn experience_add_then_delete_by_id() {
    let _lock = lock_test();
    let client = reqwest::Client::new();
    let (token, _, _) = register_and_login(&client, "secret1").await;

    client
        .post(&format!("{}/api/profile", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({"status": "dev", "skills": "rust"}))
        .send()
        .await
        .unwrap();

    for title in ["first", "second", "third"] {
        let resp = client
            .put(&format!("{}/api/profile/experience", BASE_URL))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({"title": title, "company": "Acme", "from": "2020-01-01"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let profile = client
        .get(&format!("{}/api/profile/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    let experience = profile["experience"].as_array().unwrap();
    assert_eq!(experience.len(), 3);
    // Prepend order: newest first
    assert_eq!(experience[0]["title"], "third");
    let middle_id = experience[1]["id"].as_str().unwrap().to_string();

    let deleted = client
        .delete(&format!("{}/api/profile/experience/{}", BASE_URL, middle_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 200);
    let profile = deleted.json::<serde_json::Value>().await.unwrap();
    let titles: Vec<&str> = profile["experience"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["third", "first"]);

    let missing = client
        .delete(&format!("{}/api/profile/experience/{}", BASE_URL, uuid::Uuid::new_v4()))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[ignore]
#[tokio::test]
async fn post_delete_requires_ownership() {
    let _lock = lock_test();
    let client = reqwest::Client::new();
    let (owner_token, _, _) = register_and_login(&client, "secret1").await;
    let (intruder_token, _, _) = register_and_login(&client, "secret2").await;

    let post = client
        .post(&format!("{}/api/posts", BASE_URL))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&json!({"text": "mine"}))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    let post_id = post["id"].as_str().unwrap().to_string();

    let forbidden = client
        .delete(&format!("{}/api/posts/{}", BASE_URL, post_id))
        .header("Authorization", format!("Bearer {}", intruder_token))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    // Post must be unchanged
    let still_there = client
        .get(&format!("{}/api/posts/{}", BASE_URL, post_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .send()
        .await
        .unwrap();
    assert_eq!(still_there.status(), 200);

    let removed = client
        .delete(&format!("{}/api/posts/{}", BASE_URL, post_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status(), 200);

    let gone = client
        .get(&format!("{}/api/posts/{}", BASE_URL, post_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);
}

#[ignore]
#[tokio::test]
async fn alice_and_bob_full_scenario() {
    let _lock = lock_test();
    let client = reqwest::Client::new();

    // alice signs up, logs in, builds a profile, posts
    let (alice_token, _, _) = register_and_login(&client, "secret1").await;
    let profile = client
        .post(&format!("{}/api/profile", BASE_URL))
        .header("Authorization", format!("Bearer {}", alice_token))
        .json(&json!({"status": "dev", "skills": "go,rust"}))
        .send()
        .await
        .unwrap();
    assert_eq!(profile.status(), 200);

    let post = client
        .post(&format!("{}/api/posts", BASE_URL))
        .header("Authorization", format!("Bearer {}", alice_token))
        .json(&json!({"text": "hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(post.status(), 201);
    let post = post.json::<serde_json::Value>().await.unwrap();
    let post_id = post["id"].as_str().unwrap().to_string();

    // bob likes and comments
    let (bob_token, bob_id, _) = register_and_login(&client, "secret2").await;
    let likes = client
        .put(&format!("{}/api/posts/like/{}", BASE_URL, post_id))
        .header("Authorization", format!("Bearer {}", bob_token))
        .send()
        .await
        .unwrap();
    assert_eq!(likes.status(), 200);
    let likes = likes.json::<serde_json::Value>().await.unwrap();
    assert_eq!(likes.as_array().unwrap().len(), 1);
    assert_eq!(likes[0]["user"], bob_id.as_str());

    let comments = client
        .post(&format!("{}/api/posts/{}/comment", BASE_URL, post_id))
        .header("Authorization", format!("Bearer {}", bob_token))
        .json(&json!({"text": "nice"}))
        .send()
        .await
        .unwrap();
    assert_eq!(comments.status(), 200);
    let comments = comments.json::<serde_json::Value>().await.unwrap();
    let comment_id = comments[0]["id"].as_str().unwrap().to_string();

    // alice cannot delete bob's comment
    let forbidden = client
        .delete(&format!("{}/api/posts/{}/comment/{}", BASE_URL, post_id, comment_id))
        .header("Authorization", format!("Bearer {}", alice_token))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    // bob deletes his own comment
    let remaining = client
        .delete(&format!("{}/api/posts/{}/comment/{}", BASE_URL, post_id, comment_id))
        .header("Authorization", format!("Bearer {}", bob_token))
        .send()
        .await
        .unwrap();
    assert_eq!(remaining.status(), 200);
    let remaining = remaining.json::<serde_json::Value>().await.unwrap();
    assert_eq!(remaining.as_array().unwrap().len(), 0);

    // final state: empty comment list, one like
    let post = client
        .get(&format!("{}/api/posts/{}", BASE_URL, post_id))
        .header("Authorization", format!("Bearer {}", bob_token))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(post["comments"].as_array().unwrap().len(), 0);
    assert_eq!(post["likes"].as_array().unwrap().len(), 1);
}
