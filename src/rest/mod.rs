//! REST plumbing
//!
//! This module moves requests between resource objects and the control
//! plane: describing a request from a link, sending it, and turning the raw
//! payload into a node tree.
//!
//! # Module Structure
//!
//! - [`executor`] - Parameter validation, request building, failure classification
//! - [`transport`] - The transport trait and its reqwest implementation
//! - [`payload`] - Parsing raw payloads into `serde_json::Value` trees
//!
//! # Example
//!
//! ```ignore
//! use openshift_client::rest::{executor::RequestExecutor, transport::HttpTransport};
//! use std::{sync::Arc, time::Duration};
//!
//! async fn example() -> openshift_client::Result<()> {
//!     let transport = HttpTransport::new("openshift-client", Duration::from_secs(60), None)?;
//!     let base = url::Url::parse("https://openshift.redhat.com/broker/rest").unwrap();
//!     let executor = RequestExecutor::new(base, Arc::new(transport));
//!     Ok(())
//! }
//! ```

pub mod executor;
pub mod payload;
pub mod transport;
