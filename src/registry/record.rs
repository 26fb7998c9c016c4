//! Published service record model.

use serde::{Deserialize, Serialize};

/// Record type for plain HTTP endpoints, the only type this gateway consumes.
pub const HTTP_ENDPOINT: &str = "http-endpoint";

/// Capability metadata attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecordMetadata {
    /// Logical API identity used as the routing prefix key. All instances
    /// serving the same API share this value.
    #[serde(rename = "api.name")]
    pub api_name: String,
}

/// One published backend service instance.
///
/// `name` may collide across instances of the same service; the registry
/// tells them apart by `registration_id`, assigned on publish.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceRecord {
    pub name: String,
    pub host: String,
    pub port: u16,

    /// Mount point of the backend's HTTP surface, usually `/`.
    pub root_path: String,

    #[serde(rename = "type")]
    pub record_type: String,

    pub metadata: RecordMetadata,

    /// Assigned by the registry on publish; required for unpublish.
    pub registration_id: Option<String>,
}

impl ServiceRecord {
    /// Describe an HTTP endpoint mounted at `/`.
    pub fn http_endpoint(name: &str, host: &str, port: u16, api_name: &str) -> Self {
        Self {
            name: name.to_string(),
            host: host.to_string(),
            port,
            root_path: "/".to_string(),
            record_type: HTTP_ENDPOINT.to_string(),
            metadata: RecordMetadata {
                api_name: api_name.to_string(),
            },
            registration_id: None,
        }
    }

    pub fn is_http_endpoint(&self) -> bool {
        self.record_type == HTTP_ENDPOINT
    }

    /// `host:port` of the backend.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
