//! SSH key resource
//!
//! Public keys registered with the user's account. A key is identified by
//! its name; its type and content can be updated in place.

use super::base::{Loadable, ResourceBase};
use super::decoder::Decoded;
use super::dto::KeyDto;
use super::link::{Link, Parameters};
use crate::error::{ClientError, Result};
use crate::rest::executor::RequestExecutor;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;

const LINK_UPDATE: &str = "UPDATE";
const LINK_DELETE: &str = "DELETE";

/// Cache of keys owned by a user
pub(crate) type KeyCache = Mutex<Loadable<Vec<SshKey>>>;

/// Algorithm of a public key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SshKeyType {
    SshRsa,
    SshDss,
}

impl SshKeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SshKeyType::SshRsa => "ssh-rsa",
            SshKeyType::SshDss => "ssh-dss",
        }
    }
}

impl FromStr for SshKeyType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ssh-rsa" => Ok(SshKeyType::SshRsa),
            "ssh-dss" => Ok(SshKeyType::SshDss),
            other => Err(ClientError::UnknownKeyType(other.to_string())),
        }
    }
}

impl fmt::Display for SshKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key type and base64 content, as found in an `authorized_keys` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshPublicKey {
    pub key_type: SshKeyType,
    pub content: String,
}

impl SshPublicKey {
    pub fn new(key_type: SshKeyType, content: &str) -> Self {
        Self {
            key_type,
            content: content.to_string(),
        }
    }

    /// Parse `<type> <content> [comment]`
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let key_type: SshKeyType = parts
            .next()
            .ok_or_else(|| ClientError::InvalidPublicKey("empty key".to_string()))?
            .parse()?;
        let content = parts
            .next()
            .ok_or_else(|| ClientError::InvalidPublicKey("key has no content".to_string()))?;

        Ok(Self::new(key_type, content))
    }
}

struct KeyState {
    base: ResourceBase,
    name: String,
    key_type: Option<SshKeyType>,
    public_key: String,
}

/// A public key registered with the user's account
///
/// Clones share state: destroying one clone invalidates all of them.
#[derive(Clone)]
pub struct SshKey {
    state: Arc<Mutex<KeyState>>,
    owner: Weak<KeyCache>,
}

impl SshKey {
    pub(crate) fn from_decoded(
        executor: RequestExecutor,
        decoded: Decoded<KeyDto>,
        owner: Weak<KeyCache>,
    ) -> Result<Self> {
        let key_type = decoded.dto.key_type.parse()?;
        let label = format!("ssh key {}", decoded.dto.name);
        let state = KeyState {
            base: ResourceBase::loaded(&label, executor, decoded.links),
            name: decoded.dto.name,
            key_type: Some(key_type),
            public_key: decoded.dto.content,
        };
        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            owner,
        })
    }

    pub fn same_handle(&self, other: &SshKey) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) async fn has_name(&self, name: &str) -> bool {
        let state = self.state.lock().await;
        !state.base.is_destroyed() && state.name == name
    }

    pub async fn name(&self) -> Result<String> {
        let state = self.state.lock().await;
        state.base.ensure_alive()?;
        Ok(state.name.clone())
    }

    pub async fn key_type(&self) -> Result<SshKeyType> {
        let state = self.state.lock().await;
        state.base.ensure_alive()?;
        state
            .key_type
            .ok_or_else(|| ClientError::ResourceDestroyed(state.base.label().to_string()))
    }

    pub async fn public_key(&self) -> Result<String> {
        let state = self.state.lock().await;
        state.base.ensure_alive()?;
        Ok(state.public_key.clone())
    }

    pub async fn is_destroyed(&self) -> bool {
        self.state.lock().await.base.is_destroyed()
    }

    pub async fn link(&self, name: &str) -> Result<Option<Link>> {
        let mut state = self.state.lock().await;
        Ok(state.base.link(name).await?.cloned())
    }

    pub async fn set_key_type(&self, key_type: SshKeyType) -> Result<()> {
        let content = self.public_key().await?;
        self.update(key_type, &content).await
    }

    pub async fn set_public_key(&self, content: &str) -> Result<()> {
        let key_type = self.key_type().await?;
        self.update(key_type, content).await
    }

    async fn update(&self, key_type: SshKeyType, content: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let params = Parameters::new()
            .with("content", content)
            .with("type", key_type.as_str());
        let envelope = state.base.perform(LINK_UPDATE, params).await?;

        match envelope.into_optional_resource::<KeyDto>()? {
            Some(decoded) => {
                state.key_type = Some(decoded.dto.key_type.parse()?);
                state.public_key = decoded.dto.content;
                state.base.replace_links(decoded.links);
            }
            None => {
                state.key_type = Some(key_type);
                state.public_key = content.to_string();
            }
        }
        Ok(())
    }

    /// Remove the key from the account
    pub async fn destroy(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.base.perform(LINK_DELETE, Parameters::new()).await?;
            state.base.invalidate();
            state.name.clear();
            state.key_type = None;
            state.public_key.clear();
        }

        if let Some(owner) = self.owner.upgrade() {
            let mut cache = owner.lock().await;
            if let Some(keys) = cache.get_mut() {
                keys.retain(|k| !k.same_handle(self));
            }
        }
        Ok(())
    }

    /// Forget the link map; the next lookup fetches it again.
    ///
    /// Only the links are re-derived. The type and content keep the values
    /// last applied by a list, add or update; refresh the owning
    /// [`User`](super::user::User) for fresh fields.
    pub async fn refresh(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.base.ensure_alive()?;
        state.base.refresh();
        Ok(())
    }
}

impl fmt::Debug for SshKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_lock() {
            Ok(state) => f
                .debug_struct("SshKey")
                .field("name", &state.name)
                .field("key_type", &state.key_type)
                .field("destroyed", &state.base.is_destroyed())
                .finish(),
            Err(_) => f.write_str("SshKey { <busy> }"),
        }
    }
}
