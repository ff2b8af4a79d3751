//! API root
//!
//! Entry point of the resource graph. The root discovers its links with a
//! bootstrap `GET /api` and owns the cached user and domain list.

use super::base::{Loadable, ResourceBase};
use super::domain::{Domain, DomainCache};
use super::dto::{DomainDto, UserDto};
use super::link::{HttpMethod, Link, Parameters};
use super::user::User;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::rest::executor::RequestExecutor;
use crate::rest::transport::{Credentials, HttpTransport};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Path of the bootstrap request, relative to the service root
pub const API_PATH: &str = "/api";

const LINK_GET_USER: &str = "GET_USER";
const LINK_LIST_DOMAINS: &str = "LIST_DOMAINS";
const LINK_ADD_DOMAIN: &str = "ADD_DOMAIN";

struct ApiState {
    base: ResourceBase,
    user: Loadable<User>,
}

/// Root of the control-plane resource graph
///
/// Nothing is fetched until the first operation needs a link.
#[derive(Clone)]
pub struct Api {
    state: Arc<Mutex<ApiState>>,
    domains: Arc<DomainCache>,
}

impl Api {
    /// Create an unloaded root on top of `executor`
    pub fn new(executor: RequestExecutor) -> Self {
        let bootstrap = Link::new("API", HttpMethod::Get, API_PATH);
        let state = ApiState {
            base: ResourceBase::unloaded("api", executor, bootstrap),
            user: Loadable::Unloaded,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            domains: Arc::new(Mutex::new(Loadable::Unloaded)),
        }
    }

    /// Wire up an HTTP transport from `config`
    pub fn connect(config: &ClientConfig, credentials: Option<Credentials>) -> Result<Self> {
        let base_url = config.base_url()?;
        let transport = HttpTransport::new(&config.user_agent, config.timeout(), credentials)?;
        tracing::info!("Connecting to {}", base_url);
        Ok(Self::new(RequestExecutor::new(base_url, Arc::new(transport))))
    }

    /// Look up an operation the server currently permits on the root
    pub async fn link(&self, name: &str) -> Result<Option<Link>> {
        let mut state = self.state.lock().await;
        Ok(state.base.link(name).await?.cloned())
    }

    pub async fn has_link(&self, name: &str) -> Result<bool> {
        Ok(self.link(name).await?.is_some())
    }

    /// The authenticated user, fetched once
    pub async fn user(&self) -> Result<User> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.user.get() {
            return Ok(user.clone());
        }

        let envelope = state.base.perform(LINK_GET_USER, Parameters::new()).await?;
        let decoded = envelope.into_resource::<UserDto>()?;
        let fetched_with = state.base.link(LINK_GET_USER).await?.cloned();
        let user = User::from_decoded(state.base.executor().clone(), decoded, fetched_with);
        state.user.set(user.clone());
        Ok(user)
    }

    async fn load_domains(&self) -> Result<Vec<Domain>> {
        let mut state = self.state.lock().await;
        let envelope = state
            .base
            .perform(LINK_LIST_DOMAINS, Parameters::new())
            .await?;
        let executor = state.base.executor().clone();
        drop(state);

        let domains: Vec<Domain> = envelope
            .into_list::<DomainDto>()?
            .into_iter()
            .map(|decoded| {
                Domain::from_decoded(executor.clone(), decoded, Arc::downgrade(&self.domains))
            })
            .collect();
        tracing::debug!("Loaded {} domains", domains.len());
        Ok(domains)
    }

    /// All domains in server order, loaded once and then served from the cache
    pub async fn domains(&self) -> Result<Vec<Domain>> {
        let mut cache = self.domains.lock().await;
        let domains = match &mut *cache {
            Loadable::Loaded(domains) => domains,
            Loadable::Unloaded => {
                let loaded = self.load_domains().await?;
                cache.set(loaded)
            }
        };
        Ok(domains.clone())
    }

    /// The domain with the given id; `None` when there is none
    pub async fn domain(&self, id: &str) -> Result<Option<Domain>> {
        for domain in self.domains().await? {
            if domain.has_id(id).await {
                return Ok(Some(domain));
            }
        }
        Ok(None)
    }

    /// Create a domain. Fails without a round trip when `id` is already known.
    pub async fn create_domain(&self, id: &str) -> Result<Domain> {
        let mut cache = self.domains.lock().await;
        let domains = match &mut *cache {
            Loadable::Loaded(domains) => domains,
            Loadable::Unloaded => {
                let loaded = self.load_domains().await?;
                cache.set(loaded)
            }
        };

        for existing in domains.iter() {
            if existing.has_id(id).await {
                return Err(ClientError::already_exists(format!(
                    "Domain {} already exists",
                    id
                )));
            }
        }

        let mut state = self.state.lock().await;
        let envelope = state
            .base
            .perform(LINK_ADD_DOMAIN, Parameters::new().with("id", id))
            .await?;
        let executor = state.base.executor().clone();
        drop(state);

        let decoded = envelope.into_resource::<DomainDto>()?;
        let domain = Domain::from_decoded(executor, decoded, Arc::downgrade(&self.domains));
        domains.push(domain.clone());
        tracing::info!("Created domain {}", id);
        Ok(domain)
    }

    /// Forget links, the user and the domain list
    pub async fn refresh(&self) {
        {
            let mut state = self.state.lock().await;
            state.base.refresh();
            state.user.reset();
        }
        self.domains.lock().await.reset();
    }
}
