//! Client library for the OpenShift REST control plane
//!
//! Server-side entities (the API root, the user, domains, SSH keys) are
//! modelled as local resource objects. Each resource discovers what it may do
//! from the links the server advertises, executes typed requests through
//! those links, and caches derived collections until they are refreshed.
//!
//! All operations are `async` and complete one round trip each; the crate
//! never spawns tasks and never retries on its own.

pub mod config;
pub mod error;
pub mod logging;
pub mod resource;
pub mod rest;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use resource::{
    Api, Domain, HttpMethod, Link, LinkMap, Loadable, ParameterType, ParameterValue, Parameters,
    SshKey, SshKeyType, SshPublicKey, User,
};
pub use rest::executor::RequestExecutor;
pub use rest::payload::{JsonParser, PayloadParser};
pub use rest::transport::{
    Credentials, HttpTransport, Transport, TransportError, TransportRequest, TransportResponse,
};
