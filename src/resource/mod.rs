//! Resource abstraction layer
//!
//! Every server-side entity is a resource object built on [`base::ResourceBase`]:
//! it holds the link map the server advertised for it, loads that map lazily,
//! and performs operations by link name.
//!
//! # Architecture
//!
//! - [`link`] - Link descriptors, link maps and typed parameters
//! - [`decoder`] - Response envelopes narrowed to typed DTOs plus their links
//! - [`dto`] - Immutable snapshots of server state
//! - [`base`] - Lazy link loading and the `perform` primitive
//! - [`api`], [`user`], [`domain`], [`ssh_key`] - Typed resource objects
//!
//! # Example
//!
//! ```ignore
//! use openshift_client::{Api, ClientConfig, Credentials};
//!
//! async fn example() -> openshift_client::Result<()> {
//!     let config = ClientConfig::load();
//!     let api = Api::connect(&config, Some(Credentials::new("dev@example.com", "secret")))?;
//!     let domain = api.create_domain("alpha").await?;
//!     assert!(api.domain("alpha").await?.is_some());
//!     domain.destroy().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod base;
pub mod decoder;
pub mod domain;
pub mod dto;
pub mod link;
pub mod ssh_key;
pub mod user;

pub use api::Api;
pub use base::{Loadable, ResourceBase};
pub use decoder::{Decoded, Envelope, Message, ResponseDecoder};
pub use domain::Domain;
pub use dto::{DomainDto, KeyDto, ResourceDto, ResourceKind, UserDto};
pub use link::{HttpMethod, Link, LinkMap, LinkParameter, ParameterType, ParameterValue, Parameters};
pub use ssh_key::{SshKey, SshKeyType, SshPublicKey};
pub use user::User;
