//! Persistence seam for worlds, documents and message history.
//!
//! The engine only ever talks to the [`WorldStore`] trait; the two
//! implementations here cover tests and single-process deployments. A
//! relational backend slots in behind the same trait.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

use crate::types::{Role, StoredMessage, User, World};
use crate::world::WorldState;

const DEFAULT_WORLD_NAME: &str = "Living World";

/// Storage operations consumed by the turn engine.
///
/// `commit_turn` exists so the document replacement and the
/// user/assistant message pair land as a unit; implementations must
/// make the three writes atomic with respect to each other.
#[async_trait]
pub trait WorldStore: Send + Sync {
    /// Fetch a user by id, or create a fresh one when the id is absent
    /// or unknown
    async fn get_or_create_user(&self, user_id: Option<Uuid>) -> Result<User>;

    /// Fetch a world by id for this user, falling back to the user's
    /// most recent world, then to creating a new one
    async fn get_or_create_world(&self, user_id: Uuid, world_id: Option<Uuid>) -> Result<World>;

    /// Load the world's document, creating the initial snapshot on
    /// first use. Older document shapes come back with absent fields
    /// filled by their defaults.
    async fn load_or_init_state(&self, world_id: Uuid) -> Result<WorldState>;

    /// Replace the document wholesale; there are no partial updates
    async fn replace_state(&self, world_id: Uuid, state: &WorldState) -> Result<()>;

    async fn append_message(
        &self,
        world_id: Uuid,
        role: Role,
        content: &str,
    ) -> Result<StoredMessage>;

    /// The last `limit` messages in chronological order
    async fn recent_messages(&self, world_id: Uuid, limit: usize) -> Result<Vec<StoredMessage>>;

    /// Atomically persist the updated document plus the turn's message
    /// pair (user first, then assistant)
    async fn commit_turn(
        &self,
        world_id: Uuid,
        state: &WorldState,
        user_text: &str,
        reply_text: &str,
    ) -> Result<(StoredMessage, StoredMessage)>;
}

// ============================================================
// IN-MEMORY STORE
// ============================================================

#[derive(Default)]
struct MemoryInner {
    users: HashMap<Uuid, User>,
    worlds: Vec<World>,
    states: HashMap<Uuid, WorldState>,
    messages: HashMap<Uuid, Vec<StoredMessage>>,
}

/// Process-local store for tests and demos. One mutex guards all
/// tables, so every operation, `commit_turn` included, is atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorldStore for MemoryStore {
    async fn get_or_create_user(&self, user_id: Option<Uuid>) -> Result<User> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(id) = user_id {
            if let Some(user) = inner.users.get(&id) {
                return Ok(user.clone());
            }
        }
        let user = User::new();
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_or_create_world(&self, user_id: Uuid, world_id: Option<Uuid>) -> Result<World> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(id) = world_id {
            if let Some(world) = inner
                .worlds
                .iter()
                .find(|w| w.id == id && w.user_id == user_id)
            {
                return Ok(world.clone());
            }
        }
        // Most recent world for the user, then create
        if let Some(world) = inner.worlds.iter().rev().find(|w| w.user_id == user_id) {
            return Ok(world.clone());
        }
        let world = World::new(user_id, DEFAULT_WORLD_NAME);
        inner.worlds.push(world.clone());
        Ok(world)
    }

    async fn load_or_init_state(&self, world_id: Uuid) -> Result<WorldState> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner
            .states
            .entry(world_id)
            .or_insert_with(WorldState::initial)
            .clone())
    }

    async fn replace_state(&self, world_id: Uuid, state: &WorldState) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.states.insert(world_id, state.clone());
        Ok(())
    }

    async fn append_message(
        &self,
        world_id: Uuid,
        role: Role,
        content: &str,
    ) -> Result<StoredMessage> {
        let mut inner = self.inner.lock().unwrap();
        let message = StoredMessage::new(world_id, role, content);
        inner
            .messages
            .entry(world_id)
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn recent_messages(&self, world_id: Uuid, limit: usize) -> Result<Vec<StoredMessage>> {
        let inner = self.inner.lock().unwrap();
        let messages = inner.messages.get(&world_id).cloned().unwrap_or_default();
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    async fn commit_turn(
        &self,
        world_id: Uuid,
        state: &WorldState,
        user_text: &str,
        reply_text: &str,
    ) -> Result<(StoredMessage, StoredMessage)> {
        let mut inner = self.inner.lock().unwrap();
        inner.states.insert(world_id, state.clone());
        let user_message = StoredMessage::new(world_id, Role::User, user_text);
        let reply_message = StoredMessage::new(world_id, Role::Assistant, reply_text);
        let log = inner.messages.entry(world_id).or_default();
        log.push(user_message.clone());
        log.push(reply_message.clone());
        Ok((user_message, reply_message))
    }
}

// ============================================================
// FILE-BACKED STORE
// ============================================================

/// JSON-on-disk store for single-process deployments.
///
/// Layout under the root directory: `users.json`, `worlds.json`, and
/// per world `worlds/<id>/state.json` plus an append-only
/// `worlds/<id>/messages.jsonl`. One store-level mutex serializes all
/// writes; the document is written to a temp file and renamed into
/// place.
pub struct FileStore {
    root: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("worlds"))?;
        Ok(Self {
            root,
            guard: Mutex::new(()),
        })
    }

    fn users_path(&self) -> PathBuf {
        self.root.join("users.json")
    }

    fn worlds_path(&self) -> PathBuf {
        self.root.join("worlds.json")
    }

    fn world_dir(&self, world_id: Uuid) -> PathBuf {
        self.root.join("worlds").join(world_id.to_string())
    }

    fn state_path(&self, world_id: Uuid) -> PathBuf {
        self.world_dir(world_id).join("state.json")
    }

    fn messages_path(&self, world_id: Uuid) -> PathBuf {
        self.world_dir(world_id).join("messages.jsonl")
    }

    fn read_users(&self) -> Result<HashMap<Uuid, User>> {
        let path = self.users_path();
        if !path.exists() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn write_users(&self, users: &HashMap<Uuid, User>) -> Result<()> {
        fs::write(self.users_path(), serde_json::to_string_pretty(users)?)?;
        Ok(())
    }

    fn read_worlds(&self) -> Result<Vec<World>> {
        let path = self.worlds_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn write_worlds(&self, worlds: &[World]) -> Result<()> {
        fs::write(self.worlds_path(), serde_json::to_string_pretty(worlds)?)?;
        Ok(())
    }

    fn read_messages(&self, world_id: Uuid) -> Result<Vec<StoredMessage>> {
        let path = self.messages_path(world_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut messages = Vec::new();
        for line in fs::read_to_string(path)?.lines() {
            if line.trim().is_empty() {
                continue;
            }
            messages.push(serde_json::from_str(line)?);
        }
        Ok(messages)
    }

    fn append_message_line(&self, message: &StoredMessage) -> Result<()> {
        use std::io::Write;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.messages_path(message.world_id))?;
        writeln!(file, "{}", serde_json::to_string(message)?)?;
        Ok(())
    }

    fn write_state(&self, world_id: Uuid, state: &WorldState) -> Result<()> {
        fs::create_dir_all(self.world_dir(world_id))?;
        let path = self.state_path(world_id);
        let temp = path.with_extension("json.tmp");
        fs::write(&temp, serde_json::to_string_pretty(state)?)?;
        fs::rename(temp, path)?;
        Ok(())
    }

    fn read_state(&self, world_id: Uuid) -> Result<Option<WorldState>> {
        let path = self.state_path(world_id);
        if !path.exists() {
            return Ok(None);
        }
        // Absent fields fill from the initial snapshot via serde defaults
        let mut state: WorldState = serde_json::from_str(&fs::read_to_string(path)?)?;
        state.normalize_time();
        Ok(Some(state))
    }
}

#[async_trait]
impl WorldStore for FileStore {
    async fn get_or_create_user(&self, user_id: Option<Uuid>) -> Result<User> {
        let _guard = self.guard.lock().unwrap();
        let mut users = self.read_users()?;
        if let Some(id) = user_id {
            if let Some(user) = users.get(&id) {
                return Ok(user.clone());
            }
        }
        let user = User::new();
        users.insert(user.id, user.clone());
        self.write_users(&users)?;
        Ok(user)
    }

    async fn get_or_create_world(&self, user_id: Uuid, world_id: Option<Uuid>) -> Result<World> {
        let _guard = self.guard.lock().unwrap();
        let mut worlds = self.read_worlds()?;
        if let Some(id) = world_id {
            if let Some(world) = worlds.iter().find(|w| w.id == id && w.user_id == user_id) {
                return Ok(world.clone());
            }
        }
        if let Some(world) = worlds.iter().rev().find(|w| w.user_id == user_id) {
            return Ok(world.clone());
        }
        let world = World::new(user_id, DEFAULT_WORLD_NAME);
        worlds.push(world.clone());
        self.write_worlds(&worlds)?;
        fs::create_dir_all(self.world_dir(world.id))?;
        Ok(world)
    }

    async fn load_or_init_state(&self, world_id: Uuid) -> Result<WorldState> {
        let _guard = self.guard.lock().unwrap();
        if let Some(state) = self.read_state(world_id)? {
            return Ok(state);
        }
        let state = WorldState::initial();
        self.write_state(world_id, &state)?;
        Ok(state)
    }

    async fn replace_state(&self, world_id: Uuid, state: &WorldState) -> Result<()> {
        let _guard = self.guard.lock().unwrap();
        self.write_state(world_id, state)
    }

    async fn append_message(
        &self,
        world_id: Uuid,
        role: Role,
        content: &str,
    ) -> Result<StoredMessage> {
        let _guard = self.guard.lock().unwrap();
        fs::create_dir_all(self.world_dir(world_id))?;
        let message = StoredMessage::new(world_id, role, content);
        self.append_message_line(&message)?;
        Ok(message)
    }

    async fn recent_messages(&self, world_id: Uuid, limit: usize) -> Result<Vec<StoredMessage>> {
        let _guard = self.guard.lock().unwrap();
        let messages = self.read_messages(world_id)?;
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    async fn commit_turn(
        &self,
        world_id: Uuid,
        state: &WorldState,
        user_text: &str,
        reply_text: &str,
    ) -> Result<(StoredMessage, StoredMessage)> {
        let _guard = self.guard.lock().unwrap();
        fs::create_dir_all(self.world_dir(world_id))?;
        self.write_state(world_id, state)?;
        let user_message = StoredMessage::new(world_id, Role::User, user_text);
        let reply_message = StoredMessage::new(world_id, Role::Assistant, reply_text);
        self.append_message_line(&user_message)?;
        self.append_message_line(&reply_message)?;
        Ok((user_message, reply_message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_reuses_known_users_and_worlds() {
        let store = MemoryStore::new();

        let user = store.get_or_create_user(None).await.unwrap();
        let again = store.get_or_create_user(Some(user.id)).await.unwrap();
        assert_eq!(user.id, again.id);

        let unknown = store.get_or_create_user(Some(Uuid::new_v4())).await.unwrap();
        assert_ne!(unknown.id, user.id);

        let world = store.get_or_create_world(user.id, None).await.unwrap();
        // Unknown world id falls back to the user's most recent world
        let fallback = store
            .get_or_create_world(user.id, Some(Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(world.id, fallback.id);
    }

    #[tokio::test]
    async fn memory_store_initializes_state_once() {
        let store = MemoryStore::new();
        let world_id = Uuid::new_v4();

        let first = store.load_or_init_state(world_id).await.unwrap();
        assert_eq!(first, WorldState::initial());

        let mut updated = first.clone();
        updated.push_key_moment("a quiet breakfast");
        store.replace_state(world_id, &updated).await.unwrap();

        let loaded = store.load_or_init_state(world_id).await.unwrap();
        assert_eq!(loaded, updated);
    }

    #[tokio::test]
    async fn recent_messages_returns_chronological_tail() {
        let store = MemoryStore::new();
        let world_id = Uuid::new_v4();
        for i in 0..5 {
            store
                .append_message(world_id, Role::User, &format!("m{}", i))
                .await
                .unwrap();
        }
        let tail = store.recent_messages(world_id, 2).await.unwrap();
        let contents: Vec<&str> = tail.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m4"]);
    }

    #[tokio::test]
    async fn commit_turn_writes_pair_and_state_together() {
        let store = MemoryStore::new();
        let world_id = Uuid::new_v4();
        let mut state = WorldState::initial();
        state.push_key_moment("first turn");

        store
            .commit_turn(world_id, &state, "hello", "Elin: \"Right.\"")
            .await
            .unwrap();

        let messages = store.recent_messages(world_id, 10).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(store.load_or_init_state(world_id).await.unwrap(), state);
    }

    #[tokio::test]
    async fn file_store_round_trips_a_world() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        let user = store.get_or_create_user(None).await.unwrap();
        let world = store.get_or_create_world(user.id, None).await.unwrap();

        let mut state = store.load_or_init_state(world.id).await.unwrap();
        state.push_key_moment("moved the sofa twice");
        store
            .commit_turn(world.id, &state, "hi", "Elin: \"Mm.\"")
            .await
            .unwrap();

        // A second store over the same directory sees everything
        let reopened = FileStore::new(dir.path()).unwrap();
        let same_user = reopened.get_or_create_user(Some(user.id)).await.unwrap();
        assert_eq!(same_user.id, user.id);
        let same_world = reopened
            .get_or_create_world(user.id, Some(world.id))
            .await
            .unwrap();
        assert_eq!(same_world.id, world.id);

        let loaded = reopened.load_or_init_state(world.id).await.unwrap();
        assert_eq!(loaded, state);

        let messages = reopened.recent_messages(world.id, 10).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Elin: \"Mm.\"");
    }
}
