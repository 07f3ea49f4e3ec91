//! WAPI over HTTPS.
//!
//! Requests use basic authentication against
//! `https://{host}/wapi/v{version}`. Non-2xx answers are turned into
//! [`Error::Rejected`] with the response body kept for diagnostics.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{
    AttributeDefinition, AttributeFilter, Endpoint, Network, NetworkFilter, NetworkView,
    NewAttributeDefinition, NewNetwork, ObjectRef, View,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use ureq::http::Response;
use ureq::tls::TlsConfig;

/// HTTPS backend for a single appliance.
///
/// The underlying agent keeps a connection pool, so one backend should be
/// reused for a whole run.
pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
    authorization: String,
}

impl HttpBackend {
    /// Create a backend for the given endpoint.
    pub fn new(endpoint: &Endpoint) -> Result<Self> {
        if endpoint.host.trim().is_empty() {
            return Err(Error::InvalidEndpoint("host is empty".to_string()));
        }
        if endpoint.credentials.username.is_empty() {
            return Err(Error::InvalidEndpoint("admin name is empty".to_string()));
        }

        if !endpoint.verify_tls {
            log::warn!(
                "TLS certificate verification is disabled for {}",
                endpoint.host
            );
        }

        let tls = TlsConfig::builder()
            .disable_verification(!endpoint.verify_tls)
            .build();
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(endpoint.timeout))
            .tls_config(tls)
            .build()
            .into();

        Ok(Self {
            agent,
            base_url: endpoint.base_url(),
            authorization: basic_auth(
                &endpoint.credentials.username,
                &endpoint.credentials.password,
            ),
        })
    }

    /// Get the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of an object collection, or of a single object by reference.
    fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = self.object_url(path);
        log::debug!("GET {} {:?}", url, params);

        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json");
        for (key, value) in params {
            request = request.query(*key, value);
        }
        read_json(request.call()?)
    }

    fn post<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        body: &B,
    ) -> Result<T> {
        let url = self.object_url(path);
        log::debug!("POST {} {:?}", url, params);

        let mut request = self
            .agent
            .post(&url)
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json");
        for (key, value) in params {
            request = request.query(*key, value);
        }
        read_json(request.send_json(body)?)
    }
}

impl Backend for HttpBackend {
    fn list_attribute_definitions(&self, filter: &AttributeFilter) -> Result<Vec<AttributeDefinition>> {
        self.get("extensibleattributedef", &filter.params())
    }

    fn create_attribute_definition(
        &self,
        definition: &NewAttributeDefinition,
        view: &View,
    ) -> Result<ObjectRef> {
        let params = scope_params(view);
        self.post("extensibleattributedef", &params, definition)
    }

    fn list_networks(&self, filter: &NetworkFilter) -> Result<Vec<Network>> {
        self.get("network", &filter.params())
    }

    fn create_network(&self, network: &NewNetwork) -> Result<ObjectRef> {
        self.post("network", &[], network)
    }

    fn list_network_views(&self) -> Result<Vec<NetworkView>> {
        self.get("networkview", &[])
    }

    fn delete(&self, reference: &ObjectRef) -> Result<ObjectRef> {
        let url = self.object_url(reference.as_str());
        log::debug!("DELETE {}", url);

        let response = self
            .agent
            .delete(&url)
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json")
            .call()?;
        read_json(response)
    }
}

fn scope_params(view: &View) -> Vec<(&'static str, String)> {
    view.as_param()
        .map(|v| ("network_view", v.to_string()))
        .into_iter()
        .collect()
}

fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

fn read_json<T: DeserializeOwned>(mut response: Response<ureq::Body>) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.body_mut().read_to_string().unwrap_or_default();
        return Err(Error::rejected(status.as_u16(), body.trim()));
    }

    let text = response.body_mut().read_to_string()?;
    Ok(serde_json::from_str(&text)?)
}
