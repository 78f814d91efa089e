use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::{broadcast, RwLock};

use crate::copyright::CopyrightClaim;
use crate::{Post, User};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreEvent {
    pub scope: String,
    pub id: String,
    pub op: String,
}

impl StoreEvent {
    pub fn new(scope: &str, id: &str, op: &str) -> Self {
        Self {
            scope: scope.to_string(),
            id: id.to_string(),
            op: op.to_string(),
        }
    }
}

// JSON-file-backed document store. Each entity collection persists as one
// pretty-printed file, rewritten whole via tmp + rename. Subscribers get a
// change-event feed in place of the hosted database's realtime listeners.
pub struct DocumentStore {
    dir: PathBuf,
    posts: RwLock<HashMap<String, Post>>,
    users: RwLock<HashMap<String, User>>,
    claims: RwLock<HashMap<String, CopyrightClaim>>,
    events: broadcast::Sender<StoreEvent>,
}

impl DocumentStore {
    pub async fn open(dir: PathBuf) -> Result<Self, String> {
        let posts = load_collection(&dir.join("posts.json")).await?;
        let users = load_collection(&dir.join("users.json")).await?;
        let claims = load_collection(&dir.join("claims.json")).await?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            dir,
            posts: RwLock::new(posts),
            users: RwLock::new(users),
            claims: RwLock::new(claims),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }

    pub async fn list_posts(&self) -> Vec<Post> {
        let guard = self.posts.read().await;
        guard.values().cloned().collect()
    }

    pub async fn get_post(&self, post_id: &str) -> Option<Post> {
        let guard = self.posts.read().await;
        guard.get(post_id).cloned()
    }

    pub async fn list_users(&self) -> Vec<User> {
        let guard = self.users.read().await;
        guard.values().cloned().collect()
    }

    pub async fn get_user(&self, user_id: &str) -> Option<User> {
        let guard = self.users.read().await;
        guard.get(user_id).cloned()
    }

    pub async fn list_claims(&self) -> Vec<CopyrightClaim> {
        let guard = self.claims.read().await;
        guard.values().cloned().collect()
    }

    pub async fn get_claim(&self, claim_id: &str) -> Option<CopyrightClaim> {
        let guard = self.claims.read().await;
        guard.get(claim_id).cloned()
    }

    pub async fn mutate_posts<T>(
        &self,
        mutate: impl FnOnce(&mut HashMap<String, Post>) -> T,
    ) -> Result<T, String> {
        let mut guard = self.posts.write().await;
        let result = mutate(&mut guard);
        persist_collection(&self.dir, "posts.json", &*guard).await?;
        Ok(result)
    }

    pub async fn mutate_users<T>(
        &self,
        mutate: impl FnOnce(&mut HashMap<String, User>) -> T,
    ) -> Result<T, String> {
        let mut guard = self.users.write().await;
        let result = mutate(&mut guard);
        persist_collection(&self.dir, "users.json", &*guard).await?;
        Ok(result)
    }

    pub async fn mutate_claims<T>(
        &self,
        mutate: impl FnOnce(&mut HashMap<String, CopyrightClaim>) -> T,
    ) -> Result<T, String> {
        let mut guard = self.claims.write().await;
        let result = mutate(&mut guard);
        persist_collection(&self.dir, "claims.json", &*guard).await?;
        Ok(result)
    }

    // Multi-entity writes (claim approval, retraction) apply under all three
    // write locks and persist together, so a crash cannot leave an approved
    // claim without its strike. Lock order is posts, users, claims.
    pub async fn transact<T>(
        &self,
        mutate: impl FnOnce(
            &mut HashMap<String, Post>,
            &mut HashMap<String, User>,
            &mut HashMap<String, CopyrightClaim>,
        ) -> T,
    ) -> Result<T, String> {
        let mut posts = self.posts.write().await;
        let mut users = self.users.write().await;
        let mut claims = self.claims.write().await;
        let result = mutate(&mut posts, &mut users, &mut claims);
        persist_collection(&self.dir, "posts.json", &*posts).await?;
        persist_collection(&self.dir, "users.json", &*users).await?;
        persist_collection(&self.dir, "claims.json", &*claims).await?;
        Ok(result)
    }
}

async fn load_collection<T: DeserializeOwned>(path: &Path) -> Result<HashMap<String, T>, String> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let data = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    if data.trim().is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str(&data).map_err(|err| format!("failed to parse {}: {}", path.display(), err))
}

async fn persist_collection<T: Serialize>(
    dir: &Path,
    file_name: &str,
    collection: &HashMap<String, T>,
) -> Result<(), String> {
    ensure_dir(dir).await?;
    let path = dir.join(file_name);
    let payload = serde_json::to_string_pretty(collection)
        .map_err(|err| format!("failed to serialize {}: {}", file_name, err))?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, payload)
        .await
        .map_err(|err| format!("failed to write {}: {}", file_name, err))?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|err| format!("failed to finalize {}: {}", file_name, err))?;
    Ok(())
}

async fn ensure_dir(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|err| format!("failed to create data dir: {}", err))
}
