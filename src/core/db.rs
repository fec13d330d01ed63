use spin_sdk::key_value::Store;
use crate::config::{ACCOUNTS_LIST_KEY, PROFILES_LIST_KEY, POSTS_LIST_KEY};
use crate::models::models::{Account, Post, Profile};

// Collection layout:
// account:{id}    + accounts_list (Vec of account ids)
// profile:{uid}   + profiles_list (Vec of owning account ids)
// post:{id}       + posts_list    (Vec of post ids, newest first)

pub fn account_key(id: &str) -> String {
    format!("account:{}", id)
}

pub fn profile_key(user_id: &str) -> String {
    format!("profile:{}", user_id)
}

pub fn post_key(id: &str) -> String {
    format!("post:{}", id)
}

// === Accounts ===

pub fn get_account(store: &Store, id: &str) -> anyhow::Result<Option<Account>> {
    Ok(store.get_json(&account_key(id))?)
}

pub fn find_account_by_email(store: &Store, email: &str) -> anyhow::Result<Option<Account>> {
    let ids: Vec<String> = store.get_json(ACCOUNTS_LIST_KEY)?.unwrap_or_default();
    for id in ids {
        if let Some(account) = get_account(store, &id)? {
            if account.email == email {
                return Ok(Some(account));
            }
        }
    }
    Ok(None)
}

pub fn insert_account(store: &Store, account: &Account) -> anyhow::Result<()> {
    store.set_json(&account_key(&account.id), account)?;
    let mut ids: Vec<String> = store.get_json(ACCOUNTS_LIST_KEY)?.unwrap_or_default();
    ids.push(account.id.clone());
    store.set_json(ACCOUNTS_LIST_KEY, &ids)?;
    Ok(())
}

pub fn delete_account(store: &Store, id: &str) -> anyhow::Result<()> {
    store.delete(&account_key(id))?;
    let mut ids: Vec<String> = store.get_json(ACCOUNTS_LIST_KEY)?.unwrap_or_default();
    ids.retain(|existing| existing != id);
    store.set_json(ACCOUNTS_LIST_KEY, &ids)?;
    Ok(())
}

// === Profiles ===

pub fn get_profile(store: &Store, user_id: &str) -> anyhow::Result<Option<Profile>> {
    Ok(store.get_json(&profile_key(user_id))?)
}

pub fn put_profile(store: &Store, profile: &Profile) -> anyhow::Result<()> {
    let key = profile_key(&profile.user);
    let is_new = store.get_json::<Profile>(&key)?.is_none();
    store.set_json(&key, profile)?;

    if is_new {
        let mut ids: Vec<String> = store.get_json(PROFILES_LIST_KEY)?.unwrap_or_default();
        ids.push(profile.user.clone());
        store.set_json(PROFILES_LIST_KEY, &ids)?;
    }
    Ok(())
}

pub fn delete_profile(store: &Store, user_id: &str) -> anyhow::Result<()> {
    store.delete(&profile_key(user_id))?;
    let mut ids: Vec<String> = store.get_json(PROFILES_LIST_KEY)?.unwrap_or_default();
    ids.retain(|existing| existing != user_id);
    store.set_json(PROFILES_LIST_KEY, &ids)?;
    Ok(())
}

pub fn list_profiles(store: &Store) -> anyhow::Result<Vec<Profile>> {
    let ids: Vec<String> = store.get_json(PROFILES_LIST_KEY)?.unwrap_or_default();
    let mut profiles = Vec::new();
    for user_id in ids {
        if let Some(profile) = get_profile(store, &user_id)? {
            profiles.push(profile);
        }
    }
    Ok(profiles)
}

// === Posts ===

pub fn get_post(store: &Store, id: &str) -> anyhow::Result<Option<Post>> {
    Ok(store.get_json(&post_key(id))?)
}

pub fn put_post(store: &Store, post: &Post) -> anyhow::Result<()> {
    Ok(store.set_json(&post_key(&post.id), post)?)
}

pub fn insert_post(store: &Store, post: &Post) -> anyhow::Result<()> {
    put_post(store, post)?;
    let mut ids: Vec<String> = store.get_json(POSTS_LIST_KEY)?.unwrap_or_default();
    ids.insert(0, post.id.clone()); // prepend newest
    store.set_json(POSTS_LIST_KEY, &ids)?;
    Ok(())
}

pub fn delete_post(store: &Store, id: &str) -> anyhow::Result<()> {
    store.delete(&post_key(id))?;
    let mut ids: Vec<String> = store.get_json(POSTS_LIST_KEY)?.unwrap_or_default();
    ids.retain(|existing| existing != id);
    store.set_json(POSTS_LIST_KEY, &ids)?;
    Ok(())
}

pub fn list_posts(store: &Store) -> anyhow::Result<Vec<Post>> {
    let ids: Vec<String> = store.get_json(POSTS_LIST_KEY)?.unwrap_or_default();
    let mut posts = Vec::new();
    for id in ids {
        if let Some(post) = get_post(store, &id)? {
            posts.push(post);
        }
    }
    // The id list is already newest-first, but sort explicitly so posts
    // survive list rebuilds in any order.
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(posts)
}
