//! Domain resource

use super::base::{Loadable, ResourceBase};
use super::decoder::Decoded;
use super::dto::DomainDto;
use super::link::{Link, Parameters};
use crate::error::Result;
use crate::rest::executor::RequestExecutor;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;

const LINK_UPDATE: &str = "UPDATE";
const LINK_DELETE: &str = "DELETE";

/// Cache of domains owned by the API root
pub(crate) type DomainCache = Mutex<Loadable<Vec<Domain>>>;

struct DomainState {
    base: ResourceBase,
    id: String,
    suffix: Option<String>,
}

impl DomainState {
    fn apply(&mut self, decoded: Decoded<DomainDto>) {
        self.id = decoded.dto.id;
        self.suffix = decoded.dto.suffix;
        self.base.set_label(&format!("domain {}", self.id));
        self.base.replace_links(decoded.links);
    }
}

/// A namespace that groups applications
///
/// Clones share state: destroying one clone invalidates all of them.
#[derive(Clone)]
pub struct Domain {
    state: Arc<Mutex<DomainState>>,
    owner: Weak<DomainCache>,
}

impl Domain {
    pub(crate) fn from_decoded(
        executor: RequestExecutor,
        decoded: Decoded<DomainDto>,
        owner: Weak<DomainCache>,
    ) -> Self {
        let label = format!("domain {}", decoded.dto.id);
        let state = DomainState {
            base: ResourceBase::loaded(&label, executor, decoded.links),
            id: decoded.dto.id,
            suffix: decoded.dto.suffix,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            owner,
        }
    }

    /// Whether both handles refer to the same domain object
    pub fn same_handle(&self, other: &Domain) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) async fn has_id(&self, id: &str) -> bool {
        let state = self.state.lock().await;
        !state.base.is_destroyed() && state.id == id
    }

    pub async fn id(&self) -> Result<String> {
        let state = self.state.lock().await;
        state.base.ensure_alive()?;
        Ok(state.id.clone())
    }

    pub async fn suffix(&self) -> Result<Option<String>> {
        let state = self.state.lock().await;
        state.base.ensure_alive()?;
        Ok(state.suffix.clone())
    }

    pub async fn is_destroyed(&self) -> bool {
        self.state.lock().await.base.is_destroyed()
    }

    /// Look up an operation the server currently permits on this domain
    pub async fn link(&self, name: &str) -> Result<Option<Link>> {
        let mut state = self.state.lock().await;
        Ok(state.base.link(name).await?.cloned())
    }

    /// Change the domain's id on the server
    pub async fn rename(&self, new_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let envelope = state
            .base
            .perform(LINK_UPDATE, Parameters::new().with("id", new_id))
            .await?;

        match envelope.into_optional_resource::<DomainDto>()? {
            Some(decoded) => state.apply(decoded),
            None => {
                state.id = new_id.to_string();
                state.base.set_label(&format!("domain {}", new_id));
            }
        }
        tracing::info!("Domain renamed to {}", state.id);
        Ok(())
    }

    /// Delete the domain on the server
    pub async fn destroy(&self) -> Result<()> {
        self.delete(Parameters::new()).await
    }

    /// Delete the domain even if it still holds applications
    pub async fn force_destroy(&self) -> Result<()> {
        self.delete(Parameters::new().with("force", true)).await
    }

    async fn delete(&self, params: Parameters) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.base.perform(LINK_DELETE, params).await?;
            state.base.invalidate();
            state.id.clear();
            state.suffix = None;
        }

        // the owner lock is only taken once the domain lock is released
        if let Some(owner) = self.owner.upgrade() {
            let mut cache = owner.lock().await;
            if let Some(domains) = cache.get_mut() {
                domains.retain(|d| !d.same_handle(self));
            }
        }
        Ok(())
    }

    /// Forget the link map; the next lookup fetches it again.
    ///
    /// Only the links are re-derived. `id` and `suffix` keep the values last
    /// applied by a list, create or rename; refresh the owning [`Api`] for
    /// fresh fields.
    ///
    /// [`Api`]: super::api::Api
    pub async fn refresh(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.base.ensure_alive()?;
        state.base.refresh();
        Ok(())
    }
}

impl std::fmt::Debug for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.state.try_lock() {
            Ok(state) => f
                .debug_struct("Domain")
                .field("id", &state.id)
                .field("suffix", &state.suffix)
                .field("destroyed", &state.base.is_destroyed())
                .finish(),
            Err(_) => f.write_str("Domain { <busy> }"),
        }
    }
}
