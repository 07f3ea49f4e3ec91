//! Backend trait and implementations for talking to the appliance.
//!
//! [`http::HttpBackend`] speaks WAPI over HTTPS. [`MockBackend`] keeps objects
//! in memory and is used for testing without network access:
//!
//! ```
//! use wapi::backend::{Backend, MockBackend};
//! use wapi::AttributeFilter;
//!
//! let mock = MockBackend::new();
//! mock.add_attribute_definition("env");
//!
//! let defs = mock.list_attribute_definitions(&AttributeFilter::name("env")).unwrap();
//! assert_eq!(defs.len(), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{
    AttributeDefinition, AttributeFilter, AttributeType, NetworkFilter, Network, NetworkView,
    NewAttributeDefinition, NewNetwork, ObjectRef, View,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Backend trait for appliance object collections.
///
/// Every method is a single request. Resolution and batching live in
/// [`crate::Client`].
pub trait Backend: Send + Sync {
    /// `GET /extensibleattributedef`
    fn list_attribute_definitions(&self, filter: &AttributeFilter) -> Result<Vec<AttributeDefinition>>;

    /// `POST /extensibleattributedef`, scoped by `view` when it is not `All`.
    fn create_attribute_definition(
        &self,
        definition: &NewAttributeDefinition,
        view: &View,
    ) -> Result<ObjectRef>;

    /// `GET /network`
    fn list_networks(&self, filter: &NetworkFilter) -> Result<Vec<Network>>;

    /// `POST /network`
    fn create_network(&self, network: &NewNetwork) -> Result<ObjectRef>;

    /// `GET /networkview`, never scoped.
    fn list_network_views(&self) -> Result<Vec<NetworkView>>;

    /// `DELETE /<reference>`
    fn delete(&self, reference: &ObjectRef) -> Result<ObjectRef>;
}

#[derive(Debug, Default)]
struct MockState {
    definitions: Vec<AttributeDefinition>,
    networks: Vec<Network>,
    views: Vec<NetworkView>,
    next_id: u64,
    calls: Vec<String>,
    unreachable: bool,
    fail_list: Option<(u16, String)>,
    fail_create: HashSet<String>,
    fail_resolve: HashSet<String>,
    fail_delete: HashSet<String>,
}

impl MockState {
    fn next_ref(&mut self, object_type: &str, key: &str) -> ObjectRef {
        self.next_id += 1;
        ObjectRef::new(format!("{}/ZG5z{:04}:{}", object_type, self.next_id, key))
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable {
            return Err(Error::transport("connection refused"));
        }
        Ok(())
    }
}

/// In-memory appliance for tests.
///
/// Exact-match filters behave like the real API, references are generated on
/// insert, and failures can be injected per natural key. Every request is
/// appended to a call log so tests can assert on the request sequence.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock pre-populated with attribute definitions.
    #[must_use]
    pub fn with_attribute_definitions<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for name in names {
            mock.add_attribute_definition(name);
        }
        mock
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only happens after a test already panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add an attribute definition. Duplicate names are allowed on purpose.
    pub fn add_attribute_definition(&self, name: impl Into<String>) -> ObjectRef {
        let name = name.into();
        let mut state = self.lock();
        let reference = state.next_ref("extensibleattributedef", &name);
        state.definitions.push(AttributeDefinition {
            reference: reference.clone(),
            name,
            attribute_type: AttributeType::String,
            comment: None,
        });
        reference
    }

    /// Add a network to a view (`None` for the default view).
    pub fn add_network(&self, cidr: impl Into<String>, view: Option<&str>) -> ObjectRef {
        let cidr = cidr.into();
        let view = view.unwrap_or("default").to_string();
        let mut state = self.lock();
        let reference = state.next_ref("network", &format!("{}/{}", cidr, view));
        state.networks.push(Network {
            reference: reference.clone(),
            network: cidr,
            network_view: Some(view),
            comment: None,
        });
        reference
    }

    /// Add a network view.
    pub fn add_network_view(&self, name: impl Into<String>, is_default: bool) {
        let name = name.into();
        let mut state = self.lock();
        let reference = state.next_ref("networkview", &name);
        state.views.push(NetworkView {
            reference,
            name,
            is_default,
        });
    }

    /// Make every request fail with a transport error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    /// Make unfiltered list requests fail with the given status and body.
    pub fn fail_list(&self, status: u16, body: impl Into<String>) {
        self.lock().fail_list = Some((status, body.into()));
    }

    /// Make creation of `name` fail.
    pub fn fail_create(&self, name: impl Into<String>) {
        self.lock().fail_create.insert(name.into());
    }

    /// Make exact-match lookups of `key` (name or CIDR) fail.
    pub fn fail_resolve(&self, key: impl Into<String>) {
        self.lock().fail_resolve.insert(key.into());
    }

    /// Make deletion of the object with natural key `key` fail.
    pub fn fail_delete(&self, key: impl Into<String>) {
        self.lock().fail_delete.insert(key.into());
    }

    /// Names of the attribute definitions currently stored.
    #[must_use]
    pub fn attribute_names(&self) -> Vec<String> {
        self.lock()
            .definitions
            .iter()
            .map(|d| d.name.clone())
            .collect()
    }

    /// CIDRs of the networks currently stored.
    #[must_use]
    pub fn network_cidrs(&self) -> Vec<String> {
        self.lock()
            .networks
            .iter()
            .map(|n| n.network.clone())
            .collect()
    }

    /// Networks currently stored.
    #[must_use]
    pub fn networks(&self) -> Vec<Network> {
        self.lock().networks.clone()
    }

    /// Requests seen so far, e.g. `GET extensibleattributedef?name=env`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }
}

fn describe(method: &str, object: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        format!("{} {}", method, object)
    } else {
        let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        format!("{} {}?{}", method, object, query.join("&"))
    }
}

impl Backend for MockBackend {
    fn list_attribute_definitions(&self, filter: &AttributeFilter) -> Result<Vec<AttributeDefinition>> {
        let mut state = self.lock();
        let call = describe("GET", "extensibleattributedef", &filter.params());
        state.calls.push(call);
        state.check_reachable()?;

        match &filter.name {
            Some(name) => {
                if state.fail_resolve.contains(name) {
                    return Err(Error::rejected(500, format!("lookup of {} failed", name)));
                }
                Ok(state
                    .definitions
                    .iter()
                    .filter(|d| &d.name == name)
                    .cloned()
                    .collect())
            }
            None => {
                if let Some((status, body)) = &state.fail_list {
                    return Err(Error::rejected(*status, body.clone()));
                }
                Ok(state.definitions.clone())
            }
        }
    }

    fn create_attribute_definition(
        &self,
        definition: &NewAttributeDefinition,
        view: &View,
    ) -> Result<ObjectRef> {
        let mut state = self.lock();
        let params: Vec<(&str, String)> = view
            .as_param()
            .map(|v| ("network_view", v.to_string()))
            .into_iter()
            .collect();
        let call = describe("POST", "extensibleattributedef", &params);
        state.calls.push(format!("{} name={}", call, definition.name));
        state.check_reachable()?;

        if state.fail_create.contains(&definition.name) {
            return Err(Error::rejected(
                400,
                format!("AdmConDataError: invalid name {}", definition.name),
            ));
        }

        let reference = state.next_ref("extensibleattributedef", &definition.name);
        state.definitions.push(AttributeDefinition {
            reference: reference.clone(),
            name: definition.name.clone(),
            attribute_type: definition.attribute_type,
            comment: Some(definition.comment.clone()),
        });
        Ok(reference)
    }

    fn list_networks(&self, filter: &NetworkFilter) -> Result<Vec<Network>> {
        let mut state = self.lock();
        let call = describe("GET", "network", &filter.params());
        state.calls.push(call);
        state.check_reachable()?;

        if let Some(cidr) = &filter.network
            && state.fail_resolve.contains(cidr)
        {
            return Err(Error::rejected(500, format!("lookup of {} failed", cidr)));
        }

        Ok(state
            .networks
            .iter()
            .filter(|n| filter.network.as_ref().is_none_or(|cidr| &n.network == cidr))
            .filter(|n| match filter.view.as_param() {
                Some(view) => n.network_view.as_deref() == Some(view),
                None => true,
            })
            .cloned()
            .collect())
    }

    fn create_network(&self, network: &NewNetwork) -> Result<ObjectRef> {
        let mut state = self.lock();
        state.calls.push(format!("POST network network={}", network.network));
        state.check_reachable()?;

        if state.fail_create.contains(&network.network) {
            return Err(Error::rejected(400, format!("invalid network {}", network.network)));
        }

        let view = network
            .network_view
            .clone()
            .unwrap_or_else(|| "default".to_string());
        let reference = state.next_ref("network", &format!("{}/{}", network.network, view));
        state.networks.push(Network {
            reference: reference.clone(),
            network: network.network.clone(),
            network_view: Some(view),
            comment: Some(network.comment.clone()),
        });
        Ok(reference)
    }

    fn list_network_views(&self) -> Result<Vec<NetworkView>> {
        let mut state = self.lock();
        state.calls.push("GET networkview".to_string());
        state.check_reachable()?;
        Ok(state.views.clone())
    }

    fn delete(&self, reference: &ObjectRef) -> Result<ObjectRef> {
        let mut state = self.lock();
        state.calls.push(format!("DELETE {}", reference));
        state.check_reachable()?;

        let definition = state
            .definitions
            .iter()
            .position(|d| &d.reference == reference);
        if let Some(index) = definition {
            if state.fail_delete.contains(&state.definitions[index].name) {
                return Err(Error::rejected(403, "Write permission denied"));
            }
            state.definitions.remove(index);
            return Ok(reference.clone());
        }

        let network = state.networks.iter().position(|n| &n.reference == reference);
        if let Some(index) = network {
            if state.fail_delete.contains(&state.networks[index].network) {
                return Err(Error::rejected(403, "Write permission denied"));
            }
            state.networks.remove(index);
            return Ok(reference.clone());
        }

        Err(Error::rejected(
            404,
            format!("AdmConProtoError: Reference {} not found", reference),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_backend_new() {
        let mock = MockBackend::new();
        let defs = mock.list_attribute_definitions(&AttributeFilter::default()).unwrap();
        assert!(defs.is_empty());
    }

    #[test]
    fn test_mock_exact_match_filter() {
        let mock = MockBackend::with_attribute_definitions(["env", "Env", "owner"]);
        let defs = mock.list_attribute_definitions(&AttributeFilter::name("env")).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "env");
    }

    #[test]
    fn test_mock_create_then_list() {
        let mock = MockBackend::new();
        let reference = mock
            .create_attribute_definition(&NewAttributeDefinition::string("owner"), &View::All)
            .unwrap();
        assert_eq!(reference.object_type(), "extensibleattributedef");
        assert_eq!(mock.attribute_names(), vec!["owner".to_string()]);
    }

    #[test]
    fn test_mock_create_failure() {
        let mock = MockBackend::new();
        mock.fail_create("bad name");
        let err = mock
            .create_attribute_definition(&NewAttributeDefinition::string("bad name"), &View::All)
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(mock.attribute_names().is_empty());
    }

    #[test]
    fn test_mock_delete_unknown_reference() {
        let mock = MockBackend::new();
        let err = mock.delete(&ObjectRef::new("network/gone:10.0.0.0/8/default")).unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_mock_network_view_scoping() {
        let mock = MockBackend::new();
        mock.add_network("10.0.0.0/16", Some("prod"));
        mock.add_network("10.0.0.0/16", Some("lab"));

        let all = mock
            .list_networks(&NetworkFilter::cidr("10.0.0.0/16", View::All))
            .unwrap();
        assert_eq!(all.len(), 2);

        let lab = mock
            .list_networks(&NetworkFilter::cidr("10.0.0.0/16", View::Named("lab".into())))
            .unwrap();
        assert_eq!(lab.len(), 1);
        assert_eq!(lab[0].network_view.as_deref(), Some("lab"));
    }

    #[test]
    fn test_mock_unreachable() {
        let mock = MockBackend::new();
        mock.set_unreachable(true);
        let err = mock.list_network_views().unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_mock_call_log() {
        let mock = MockBackend::new();
        let _ = mock.list_attribute_definitions(&AttributeFilter::name("env"));
        let _ = mock.list_networks(&NetworkFilter::cidr("10.0.0.0/8", View::Named("prod".into())));
        assert_eq!(
            mock.calls(),
            vec![
                "GET extensibleattributedef?name=env".to_string(),
                "GET network?network=10.0.0.0/8&network_view=prod".to_string(),
            ]
        );
    }
}
