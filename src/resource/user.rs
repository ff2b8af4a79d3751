//! User resource

use super::base::{Loadable, ResourceBase};
use super::decoder::Decoded;
use super::dto::{KeyDto, UserDto};
use super::link::{Link, Parameters};
use super::ssh_key::{KeyCache, SshKey, SshPublicKey};
use crate::error::{ClientError, Result};
use crate::rest::executor::RequestExecutor;
use std::sync::Arc;
use tokio::sync::Mutex;

const LINK_LIST_KEYS: &str = "LIST_KEYS";
const LINK_ADD_KEY: &str = "ADD_KEY";

struct UserState {
    base: ResourceBase,
    login: String,
}

/// The account the client is authenticated as
#[derive(Clone)]
pub struct User {
    state: Arc<Mutex<UserState>>,
    keys: Arc<KeyCache>,
}

impl User {
    /// `fetched_with` is the link the user was loaded through; it rediscovers
    /// the user's links after a refresh.
    pub(crate) fn from_decoded(
        executor: RequestExecutor,
        decoded: Decoded<UserDto>,
        fetched_with: Option<Link>,
    ) -> Self {
        let label = format!("user {}", decoded.dto.login);
        let state = UserState {
            base: ResourceBase::loaded(&label, executor, decoded.links).or_bootstrap(fetched_with),
            login: decoded.dto.login,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            keys: Arc::new(Mutex::new(Loadable::Unloaded)),
        }
    }

    pub async fn login(&self) -> String {
        self.state.lock().await.login.clone()
    }

    pub async fn link(&self, name: &str) -> Result<Option<Link>> {
        let mut state = self.state.lock().await;
        Ok(state.base.link(name).await?.cloned())
    }

    async fn load_keys(&self) -> Result<Vec<SshKey>> {
        let mut state = self.state.lock().await;
        let envelope = state.base.perform(LINK_LIST_KEYS, Parameters::new()).await?;
        let executor = state.base.executor().clone();
        drop(state);

        let keys = envelope
            .into_list::<KeyDto>()?
            .into_iter()
            .map(|decoded| {
                SshKey::from_decoded(executor.clone(), decoded, Arc::downgrade(&self.keys))
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!("Loaded {} ssh keys", keys.len());
        Ok(keys)
    }

    /// All keys, loaded once and then served from the cache
    pub async fn ssh_keys(&self) -> Result<Vec<SshKey>> {
        let mut cache = self.keys.lock().await;
        let keys = match &mut *cache {
            Loadable::Loaded(keys) => keys,
            Loadable::Unloaded => {
                let loaded = self.load_keys().await?;
                cache.set(loaded)
            }
        };
        Ok(keys.clone())
    }

    /// The key with the given name, if the account has one
    pub async fn ssh_key(&self, name: &str) -> Result<Option<SshKey>> {
        for key in self.ssh_keys().await? {
            if key.has_name(name).await {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }

    /// Register a new key. Fails locally when a key with `name` is known.
    pub async fn add_ssh_key(&self, name: &str, key: &SshPublicKey) -> Result<SshKey> {
        let mut cache = self.keys.lock().await;
        let keys = match &mut *cache {
            Loadable::Loaded(keys) => keys,
            Loadable::Unloaded => {
                let loaded = self.load_keys().await?;
                cache.set(loaded)
            }
        };

        for existing in keys.iter() {
            if existing.has_name(name).await {
                return Err(ClientError::already_exists(format!(
                    "SSH key {} already exists",
                    name
                )));
            }
        }

        let mut state = self.state.lock().await;
        let params = Parameters::new()
            .with("name", name)
            .with("type", key.key_type.as_str())
            .with("content", key.content.as_str());
        let envelope = state.base.perform(LINK_ADD_KEY, params).await?;
        let executor = state.base.executor().clone();
        drop(state);

        let decoded = envelope.into_resource::<KeyDto>()?;
        let created = SshKey::from_decoded(executor, decoded, Arc::downgrade(&self.keys))?;
        keys.push(created.clone());
        tracing::info!("Added ssh key {}", name);
        Ok(created)
    }

    /// Forget links and cached keys
    pub async fn refresh(&self) {
        self.state.lock().await.base.refresh();
        self.keys.lock().await.reset();
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.state.try_lock() {
            Ok(state) => f.debug_struct("User").field("login", &state.login).finish(),
            Err(_) => f.write_str("User { <busy> }"),
        }
    }
}
