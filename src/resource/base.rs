//! Resource Base
//!
//! Behavior every resource shares: owning a link map, loading it lazily with
//! a bootstrap request, and performing named operations through it.

use super::decoder::Envelope;
use super::link::{Link, LinkMap, Parameters};
use crate::error::{ClientError, Result};
use crate::rest::executor::RequestExecutor;

/// Link fetched to discover a child resource's own operations
pub const SELF_LINK: &str = "GET";

/// A value that is either not fetched yet or fetched.
///
/// "Fetched but empty" is `Loaded` with an empty value, never `Unloaded`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loadable<T> {
    Unloaded,
    Loaded(T),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Unloaded
    }
}

impl<T> Loadable<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Loadable::Loaded(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            Loadable::Unloaded => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            Loadable::Unloaded => None,
        }
    }

    /// Store a value and return a reference to it
    pub fn set(&mut self, value: T) -> &mut T {
        *self = Loadable::Loaded(value);
        match self {
            Loadable::Loaded(value) => value,
            Loadable::Unloaded => unreachable!("value was just stored"),
        }
    }

    /// Forget the value; the next access reloads it
    pub fn reset(&mut self) {
        *self = Loadable::Unloaded;
    }
}

/// Shared state of every resource object
pub struct ResourceBase {
    label: String,
    executor: RequestExecutor,
    bootstrap: Option<Link>,
    links: Loadable<LinkMap>,
    destroyed: bool,
}

impl ResourceBase {
    /// A resource whose links are discovered with `bootstrap` on first use
    pub fn unloaded(label: &str, executor: RequestExecutor, bootstrap: Link) -> Self {
        Self {
            label: label.to_string(),
            executor,
            bootstrap: Some(bootstrap),
            links: Loadable::Unloaded,
            destroyed: false,
        }
    }

    /// A resource built from a parent's payload; no bootstrap is needed.
    ///
    /// Its own `GET` link, when offered, becomes the bootstrap used after
    /// a refresh.
    pub fn loaded(label: &str, executor: RequestExecutor, links: LinkMap) -> Self {
        Self {
            label: label.to_string(),
            executor,
            bootstrap: links.get(SELF_LINK).cloned(),
            links: Loadable::Loaded(links),
            destroyed: false,
        }
    }

    /// Use `link` to rediscover the links when the payload offered no `GET`
    pub fn or_bootstrap(mut self, link: Option<Link>) -> Self {
        if self.bootstrap.is_none() {
            self.bootstrap = link;
        }
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub fn is_loaded(&self) -> bool {
        self.links.is_loaded()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Fail with `ResourceDestroyed` once the handle was invalidated
    pub fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            return Err(ClientError::ResourceDestroyed(self.label.clone()));
        }
        Ok(())
    }

    async fn ensure_loaded(&mut self) -> Result<&LinkMap> {
        self.ensure_alive()?;

        if !self.links.is_loaded() {
            let Some(bootstrap) = self.bootstrap.clone() else {
                return Err(ClientError::LinkUnavailable {
                    resource: self.label.clone(),
                    link: SELF_LINK.to_string(),
                });
            };

            tracing::info!("Loading links for {} via {}", self.label, bootstrap.href());
            let envelope = self.executor.execute(&bootstrap, &Parameters::new()).await?;
            let links = envelope.links()?;
            tracing::debug!("{} offers {} links", self.label, links.len());
            if let Some(own) = links.get(SELF_LINK) {
                self.bootstrap = Some(own.clone());
            }
            self.links.set(links);
        }

        match self.links.get() {
            Some(links) => Ok(links),
            None => Err(ClientError::LinkUnavailable {
                resource: self.label.clone(),
                link: SELF_LINK.to_string(),
            }),
        }
    }

    /// Look up a link by name, loading the link map first if needed.
    ///
    /// `None` means the server does not currently permit the operation.
    pub async fn link(&mut self, name: &str) -> Result<Option<&Link>> {
        Ok(self.ensure_loaded().await?.get(name))
    }

    pub async fn has_link(&mut self, name: &str) -> Result<bool> {
        Ok(self.link(name).await?.is_some())
    }

    /// Resolve `name` and execute it with `params`
    pub async fn perform(&mut self, name: &str, params: Parameters) -> Result<Envelope> {
        let link = match self.link(name).await? {
            Some(link) => link.clone(),
            None => {
                return Err(ClientError::LinkUnavailable {
                    resource: self.label.clone(),
                    link: name.to_string(),
                })
            }
        };
        self.executor.execute(&link, &params).await
    }

    /// Replace the link map with one that arrived in a response
    pub fn replace_links(&mut self, links: LinkMap) {
        if let Some(own) = links.get(SELF_LINK) {
            self.bootstrap = Some(own.clone());
        }
        self.links.set(links);
    }

    /// Revert to Unloaded; the next lookup issues a new bootstrap request.
    ///
    /// The bootstrap response only supplies links; resource fields are left
    /// to the owning resource.
    pub fn refresh(&mut self) {
        tracing::info!("Refreshing {}", self.label);
        self.links.reset();
    }

    /// Mark the handle destroyed; every later operation fails
    pub fn invalidate(&mut self) {
        tracing::info!("{} destroyed", self.label);
        self.destroyed = true;
        self.links.reset();
        self.bootstrap = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::link::{HttpMethod, ParameterType};
    use crate::rest::transport::{Transport, TransportError, TransportRequest, TransportResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use url::Url;

    const ROOT: &str = r#"{
        "type": "links",
        "status": "ok",
        "data": {
            "LIST_DOMAINS": {"method": "GET", "href": "https://broker/rest/domains"},
            "ADD_DOMAIN": {"method": "POST", "href": "https://broker/rest/domains",
                           "required_params": [{"name": "id", "type": "string"}]}
        }
    }"#;

    struct CountingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn send(
            &self,
            request: TransportRequest,
        ) -> std::result::Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.url.path().ends_with("/api") {
                Ok(TransportResponse::new(200, ROOT))
            } else {
                Ok(TransportResponse::new(200, r#"{"type":"domains","data":[]}"#))
            }
        }
    }

    fn base() -> (ResourceBase, Arc<CountingTransport>) {
        let transport = Arc::new(CountingTransport {
            calls: AtomicUsize::new(0),
        });
        let executor = RequestExecutor::new(
            Url::parse("https://broker/rest").unwrap(),
            transport.clone(),
        );
        let bootstrap = Link::new("API", HttpMethod::Get, "/api");
        (ResourceBase::unloaded("api", executor, bootstrap), transport)
    }

    #[test]
    fn test_loadable_states() {
        let mut value: Loadable<Vec<u8>> = Loadable::default();
        assert!(!value.is_loaded());
        assert!(value.get().is_none());

        value.set(Vec::new());
        assert!(value.is_loaded());
        assert_eq!(value.get(), Some(&Vec::new()));

        value.get_mut().unwrap().push(1);
        assert_eq!(value, Loadable::Loaded(vec![1]));

        value.reset();
        assert_eq!(value, Loadable::Unloaded);
    }

    #[tokio::test]
    async fn test_bootstrap_happens_once() {
        let (mut base, transport) = base();
        assert!(!base.is_loaded());

        assert!(base.link("LIST_DOMAINS").await.unwrap().is_some());
        assert!(base.link("ADD_DOMAIN").await.unwrap().is_some());
        assert!(base.is_loaded());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_absent_link_is_none_not_error() {
        let (mut base, _) = base();
        assert!(base.link("DELETE").await.unwrap().is_none());
        assert!(!base.has_link("DELETE").await.unwrap());
    }

    #[tokio::test]
    async fn test_perform_absent_link_fails() {
        let (mut base, _) = base();
        let err = base.perform("DELETE", Parameters::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::LinkUnavailable { ref link, .. } if link == "DELETE"));
    }

    #[tokio::test]
    async fn test_refresh_triggers_new_bootstrap() {
        let (mut base, transport) = base();
        base.link("LIST_DOMAINS").await.unwrap();
        base.refresh();
        assert!(!base.is_loaded());
        base.link("LIST_DOMAINS").await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_loaded_resource_skips_bootstrap() {
        let transport = Arc::new(CountingTransport {
            calls: AtomicUsize::new(0),
        });
        let executor = RequestExecutor::new(
            Url::parse("https://broker/rest").unwrap(),
            transport.clone(),
        );
        let links: LinkMap = vec![
            Link::new("DELETE", HttpMethod::Delete, "/domains/alpha")
                .with_optional("force", ParameterType::Boolean),
        ]
        .into_iter()
        .collect();

        let mut base = ResourceBase::loaded("domain alpha", executor, links);
        assert!(base.link("DELETE").await.unwrap().is_some());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);

        // no GET link was offered, so nothing can rediscover the links
        base.refresh();
        assert!(matches!(
            base.link("DELETE").await,
            Err(ClientError::LinkUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_fallback_bootstrap_after_refresh() {
        let transport = Arc::new(CountingTransport {
            calls: AtomicUsize::new(0),
        });
        let executor = RequestExecutor::new(
            Url::parse("https://broker/rest").unwrap(),
            transport.clone(),
        );
        let mut base = ResourceBase::loaded("api", executor, LinkMap::new())
            .or_bootstrap(Some(Link::new("API", HttpMethod::Get, "/api")));

        assert!(base.link("LIST_DOMAINS").await.unwrap().is_none());
        base.refresh();
        assert!(base.link("LIST_DOMAINS").await.unwrap().is_some());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidated_resource_rejects_everything() {
        let (mut base, transport) = base();
        base.invalidate();
        assert!(matches!(
            base.link("LIST_DOMAINS").await,
            Err(ClientError::ResourceDestroyed(_))
        ));
        assert!(matches!(
            base.perform("LIST_DOMAINS", Parameters::new()).await,
            Err(ClientError::ResourceDestroyed(_))
        ));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
