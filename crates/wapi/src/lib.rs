//! # wapi
//!
//! Blocking client for DDI appliance REST APIs (Infoblox WAPI style) where
//! objects are addressed by opaque references instead of natural keys.
//!
//! This crate provides functionality for:
//! - Listing extensible attribute definitions, networks and network views
//! - Resolving a natural key (name, CIDR + view) to its current reference
//! - Creating attribute definitions and networks
//! - Deleting objects by reference
//!
//! ## Example
//!
//! ```no_run
//! use wapi::{Client, Credentials, Endpoint, View};
//!
//! let endpoint = Endpoint::new("192.0.2.10", Credentials::new("admin", "secret"));
//! let client = Client::connect(&endpoint, View::All).expect("bad endpoint");
//!
//! // Resolve, then act on the fresh reference
//! if let Some(reference) = client.resolve_attribute_definition("Owner").unwrap() {
//!     client.delete(&reference).unwrap();
//! }
//! ```
//!
//! ## References
//!
//! References change whenever the appliance modifies an object. The client
//! never caches them: every mutation of an existing object is preceded by a
//! fresh exact-match lookup.

#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::{
    AttributeDefinition, AttributeFilter, AttributeType, Credentials, DEFAULT_WAPI_VERSION,
    Endpoint, ExtAttrValue, Network, NetworkFilter, NetworkView, NewAttributeDefinition,
    NewNetwork, ObjectRef, View,
};

use backend::Backend;
pub use backend::MockBackend;
use backend::http::HttpBackend;

/// High-level client for one appliance and one network view.
pub struct Client {
    backend: Box<dyn Backend>,
    view: View,
}

impl Client {
    /// Connect to an appliance over HTTPS.
    pub fn connect(endpoint: &Endpoint, view: View) -> Result<Self> {
        Ok(Self {
            backend: Box::new(HttpBackend::new(endpoint)?),
            view,
        })
    }

    /// Create a client with a custom backend (useful for testing).
    #[must_use]
    pub fn with_backend(backend: Box<dyn Backend>, view: View) -> Self {
        Self { backend, view }
    }

    /// The network view this client is scoped to.
    #[must_use]
    pub fn view(&self) -> &View {
        &self.view
    }

    /// Switch to another network view for subsequent calls.
    pub fn set_view(&mut self, view: View) {
        log::debug!("Switching network view to {view}");
        self.view = view;
    }

    // =========================================================================
    // Attribute definitions
    // =========================================================================

    /// List attribute definitions matching a filter.
    pub fn list_attribute_definitions(
        &self,
        filter: &AttributeFilter,
    ) -> Result<Vec<AttributeDefinition>> {
        self.backend.list_attribute_definitions(filter)
    }

    /// List every attribute definition.
    pub fn attribute_definitions(&self) -> Result<Vec<AttributeDefinition>> {
        self.list_attribute_definitions(&AttributeFilter::default())
    }

    /// Resolve a definition name to its current reference.
    ///
    /// Returns `Ok(None)` when no definition has that name. When the appliance
    /// returns several, the first one wins.
    pub fn resolve_attribute_definition(&self, name: &str) -> Result<Option<ObjectRef>> {
        let matches = self.list_attribute_definitions(&AttributeFilter::name(name))?;
        if matches.len() > 1 {
            log::debug!(
                "{} definitions named '{}', using the first",
                matches.len(),
                name
            );
        }
        Ok(matches.into_iter().next().map(|d| d.reference))
    }

    /// Create an attribute definition, scoped to the client's view.
    ///
    /// Not idempotent: creating an existing name fails or duplicates,
    /// depending on the appliance.
    pub fn create_attribute_definition(
        &self,
        definition: &NewAttributeDefinition,
    ) -> Result<ObjectRef> {
        let reference = self
            .backend
            .create_attribute_definition(definition, &self.view)?;
        log::info!("created attribute definition {}", definition.name);
        Ok(reference)
    }

    // =========================================================================
    // Networks
    // =========================================================================

    /// List networks matching a filter.
    pub fn list_networks(&self, filter: &NetworkFilter) -> Result<Vec<Network>> {
        self.backend.list_networks(filter)
    }

    /// List networks in the client's view, optionally narrowed to one CIDR.
    pub fn networks(&self, cidr: Option<&str>) -> Result<Vec<Network>> {
        self.list_networks(&NetworkFilter {
            network: cidr.map(str::to_string),
            view: self.view.clone(),
        })
    }

    /// Resolve a CIDR to its current reference.
    ///
    /// `view` overrides the client's view for this lookup.
    pub fn resolve_network(&self, cidr: &str, view: Option<&View>) -> Result<Option<ObjectRef>> {
        let view = view.unwrap_or(&self.view).clone();
        let matches = self.list_networks(&NetworkFilter::cidr(cidr, view))?;
        if matches.len() > 1 {
            log::debug!("{} networks for {}, using the first", matches.len(), cidr);
        }
        Ok(matches.into_iter().next().map(|n| n.reference))
    }

    /// Create a network. The client's view is used when the payload has none.
    pub fn create_network(&self, network: &NewNetwork) -> Result<ObjectRef> {
        let mut payload = network.clone();
        if payload.network_view.is_none() {
            payload.network_view = self.view.as_param().map(str::to_string);
        }
        let reference = self.backend.create_network(&payload)?;
        log::info!("created network {}", payload.network);
        Ok(reference)
    }

    // =========================================================================
    // Views and deletion
    // =========================================================================

    /// List all network views (never scoped).
    pub fn network_views(&self) -> Result<Vec<NetworkView>> {
        self.backend.list_network_views()
    }

    /// Delete an object by a freshly resolved reference.
    pub fn delete(&self, reference: &ObjectRef) -> Result<ObjectRef> {
        let deleted = self.backend.delete(reference)?;
        log::info!("deleted {}", reference);
        Ok(deleted)
    }
}
