//! Core types for appliance objects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default WAPI version used when none is configured.
pub const DEFAULT_WAPI_VERSION: &str = "2.13.1";

/// Opaque object reference assigned by the appliance.
///
/// References change when objects are modified, so they are resolved right
/// before they are used and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectRef(String);

impl ObjectRef {
    /// Wrap a raw reference string.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// The raw reference, as used in the request path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Object type prefix (`network`, `extensibleattributedef`, ...).
    #[must_use]
    pub fn object_type(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Network view (partition) that scopes address-space queries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    /// No scoping: the parameter is left out of requests.
    #[default]
    All,
    /// A named network view.
    Named(String),
}

impl View {
    /// Value of the `network_view` request parameter, if any.
    #[must_use]
    pub fn as_param(&self) -> Option<&str> {
        match self {
            View::All => None,
            View::Named(name) => Some(name),
        }
    }

    /// Whether this is the unscoped default.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, View::All)
    }
}

impl From<&str> for View {
    fn from(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            View::All
        } else {
            View::Named(s.to_string())
        }
    }
}

impl FromStr for View {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(View::from(s))
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::All => f.write_str("All"),
            View::Named(name) => f.write_str(name),
        }
    }
}

/// Extensible attribute value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributeType {
    #[default]
    String,
    Integer,
    Email,
    Url,
    Date,
    Enum,
    /// Any type this client does not know about.
    #[serde(other)]
    Other,
}

impl AttributeType {
    /// Wire name of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Integer => "INTEGER",
            Self::Email => "EMAIL",
            Self::Url => "URL",
            Self::Date => "DATE",
            Self::Enum => "ENUM",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STRING" => Ok(Self::String),
            "INTEGER" => Ok(Self::Integer),
            "EMAIL" => Ok(Self::Email),
            "URL" => Ok(Self::Url),
            "DATE" => Ok(Self::Date),
            "ENUM" => Ok(Self::Enum),
            other => Err(format!(
                "unknown attribute type '{other}' (expected STRING, INTEGER, EMAIL, URL, DATE or ENUM)"
            )),
        }
    }
}

/// Extensible attribute definition as returned by the appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Opaque reference.
    #[serde(rename = "_ref")]
    pub reference: ObjectRef,
    /// Natural key.
    pub name: String,
    /// Value type.
    #[serde(rename = "type", default)]
    pub attribute_type: AttributeType,
    /// Free-text comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Payload for creating an attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAttributeDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    pub comment: String,
}

impl NewAttributeDefinition {
    /// Comment stamped on definitions created by this tool.
    pub const DEFAULT_COMMENT: &'static str = "Created by ddictl";

    /// A STRING definition with the default comment.
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_type: AttributeType::String,
            comment: Self::DEFAULT_COMMENT.to_string(),
        }
    }
}

/// Filter for listing attribute definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeFilter {
    /// Exact name match.
    pub name: Option<String>,
}

impl AttributeFilter {
    /// Exact-match filter on the definition name.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Request parameters for this filter.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        self.name
            .iter()
            .map(|name| ("name", name.clone()))
            .collect()
    }
}

/// Network object as returned by the appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    #[serde(rename = "_ref")]
    pub reference: ObjectRef,
    /// CIDR, e.g. `10.0.0.0/16`.
    pub network: String,
    #[serde(default)]
    pub network_view: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Payload for creating a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNetwork {
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_view: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comment: String,
    /// Extensible attribute values keyed by definition name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extattrs: BTreeMap<String, ExtAttrValue>,
}

/// Wire form of one extensible attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtAttrValue {
    pub value: String,
}

/// Filter for listing networks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkFilter {
    /// Exact CIDR match.
    pub network: Option<String>,
    /// Partition scope.
    pub view: View,
}

impl NetworkFilter {
    /// Exact-match filter on CIDR within a view.
    pub fn cidr(cidr: impl Into<String>, view: View) -> Self {
        Self {
            network: Some(cidr.into()),
            view,
        }
    }

    /// Request parameters for this filter.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(network) = &self.network {
            params.push(("network", network.clone()));
        }
        if let Some(view) = self.view.as_param() {
            params.push(("network_view", view.to_string()));
        }
        params
    }
}

/// Network view as returned by the appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkView {
    #[serde(rename = "_ref")]
    pub reference: ObjectRef,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Basic-auth credentials. The password is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Connection settings for one appliance.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Grid master host name or address.
    pub host: String,
    /// WAPI version, e.g. `2.13.1`.
    pub wapi_version: String,
    pub credentials: Credentials,
    /// Verify the server certificate.
    pub verify_tls: bool,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            host: host.into(),
            wapi_version: DEFAULT_WAPI_VERSION.to_string(),
            credentials,
            verify_tls: true,
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn wapi_version(mut self, version: impl Into<String>) -> Self {
        self.wapi_version = version.into();
        self
    }

    #[must_use]
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL of the API, e.g. `https://10.0.0.1/wapi/v2.13.1`.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self
            .host
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        format!(
            "https://{}/wapi/v{}",
            host,
            self.wapi_version.trim_start_matches('v')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_from_str() {
        assert_eq!("All".parse::<View>().unwrap(), View::All);
        assert_eq!("all".parse::<View>().unwrap(), View::All);
        assert_eq!("".parse::<View>().unwrap(), View::All);
        assert_eq!(
            "prod".parse::<View>().unwrap(),
            View::Named("prod".to_string())
        );
    }

    #[test]
    fn test_view_param() {
        assert_eq!(View::All.as_param(), None);
        assert_eq!(View::Named("default".into()).as_param(), Some("default"));
        assert_eq!(View::All.to_string(), "All");
    }

    #[test]
    fn test_network_filter_params_omit_all_view() {
        let filter = NetworkFilter::cidr("10.0.0.0/16", View::All);
        assert_eq!(filter.params(), vec![("network", "10.0.0.0/16".to_string())]);

        let filter = NetworkFilter::cidr("10.0.0.0/16", View::Named("prod".into()));
        assert_eq!(
            filter.params(),
            vec![
                ("network", "10.0.0.0/16".to_string()),
                ("network_view", "prod".to_string())
            ]
        );
    }

    #[test]
    fn test_attribute_filter_params() {
        assert!(AttributeFilter::default().params().is_empty());
        assert_eq!(
            AttributeFilter::name("env").params(),
            vec![("name", "env".to_string())]
        );
    }

    #[test]
    fn test_attribute_definition_deserialize() {
        let json = r#"[
            {"_ref": "extensibleattributedef/b25l:Owner", "name": "Owner", "type": "STRING", "comment": "team"},
            {"_ref": "extensibleattributedef/b25m:Site", "name": "Site", "type": "ENUM"},
            {"_ref": "extensibleattributedef/b25n:Odd", "name": "Odd", "type": "IPV4ADDRESS"}
        ]"#;
        let defs: Vec<AttributeDefinition> = serde_json::from_str(json).unwrap();
        assert_eq!(defs.len(), 3);
        assert_eq!(defs[0].attribute_type, AttributeType::String);
        assert_eq!(defs[0].comment.as_deref(), Some("team"));
        assert_eq!(defs[1].attribute_type, AttributeType::Enum);
        assert_eq!(defs[1].comment, None);
        assert_eq!(defs[2].attribute_type, AttributeType::Other);
        assert_eq!(defs[0].reference.object_type(), "extensibleattributedef");
    }

    #[test]
    fn test_new_attribute_definition_serialize() {
        let payload = NewAttributeDefinition::string("env");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "env", "type": "STRING", "comment": "Created by ddictl"})
        );
    }

    #[test]
    fn test_new_network_serialize_skips_empty() {
        let payload = NewNetwork {
            network: "10.1.0.0/16".to_string(),
            network_view: None,
            comment: String::new(),
            extattrs: BTreeMap::new(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, serde_json::json!({"network": "10.1.0.0/16"}));
    }

    #[test]
    fn test_attribute_type_from_str() {
        assert_eq!("string".parse::<AttributeType>().unwrap(), AttributeType::String);
        assert_eq!("ENUM".parse::<AttributeType>().unwrap(), AttributeType::Enum);
        assert!("blob".parse::<AttributeType>().is_err());
    }

    #[test]
    fn test_credentials_debug_masks_password() {
        let creds = Credentials::new("admin", "s3cret");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_endpoint_base_url() {
        let endpoint = Endpoint::new("10.0.0.1", Credentials::new("a", "b"));
        assert_eq!(endpoint.base_url(), "https://10.0.0.1/wapi/v2.13.1");

        let endpoint = Endpoint::new("https://gm.example.com/", Credentials::new("a", "b"))
            .wapi_version("v2.12");
        assert_eq!(endpoint.base_url(), "https://gm.example.com/wapi/v2.12");
    }
}
