//! Plugin request descriptors.
//!
//! Maps plugin or schema names onto the named HTTP client that serves
//! them. The manifest flag is read exactly once per call, before the
//! input is looked at.

use bytes::Bytes;
use tracing::{debug, warn};
use twinprobe_core::plugin_client_name;
use twinprobe_health::SharedHealthFlag;

use crate::error::{RequestError, RequestResult};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// One outbound plugin request, routed by `target_client_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub target_client_name: String,
    pub payload: Bytes,
    pub content_type: &'static str,
    /// Never absent; empty when the caller supplied none.
    pub correlation_id: String,
}

#[derive(Debug, Clone)]
pub struct PluginRequestBuilder {
    manifest: SharedHealthFlag,
}

impl PluginRequestBuilder {
    pub fn new(manifest: SharedHealthFlag) -> Self {
        Self { manifest }
    }

    /// One descriptor per identifier, in input order, with empty payloads.
    pub fn build<I, S>(
        &self,
        identifiers: I,
        correlation_id: Option<&str>,
    ) -> RequestResult<Vec<RequestDescriptor>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_manifest_healthy()?;

        let correlation_id = correlation_id.unwrap_or_default();
        let out: Vec<RequestDescriptor> = identifiers
            .into_iter()
            .map(|id| descriptor(id.as_ref(), Bytes::new(), correlation_id))
            .collect();

        debug!(count = out.len(), "built plugin requests");
        Ok(out)
    }

    /// One descriptor per `(name, schema)` pair; the payload is the
    /// schema serialized as JSON.
    pub fn build_schemas<I, S>(
        &self,
        schemas: I,
        correlation_id: Option<&str>,
    ) -> RequestResult<Vec<RequestDescriptor>>
    where
        I: IntoIterator<Item = (S, serde_json::Value)>,
        S: AsRef<str>,
    {
        self.ensure_manifest_healthy()?;

        let correlation_id = correlation_id.unwrap_or_default();
        let out: Vec<RequestDescriptor> = schemas
            .into_iter()
            .map(|(name, schema)| {
                descriptor(name.as_ref(), Bytes::from(schema.to_string()), correlation_id)
            })
            .collect();

        debug!(count = out.len(), "built plugin schema requests");
        Ok(out)
    }

    fn ensure_manifest_healthy(&self) -> RequestResult<()> {
        if self.manifest.read() {
            Ok(())
        } else {
            warn!("refusing to build plugin requests: manifest is unhealthy");
            Err(RequestError::DependencyConflict)
        }
    }
}

fn descriptor(name: &str, payload: Bytes, correlation_id: &str) -> RequestDescriptor {
    RequestDescriptor {
        target_client_name: plugin_client_name(name),
        payload,
        content_type: JSON_CONTENT_TYPE,
        correlation_id: correlation_id.to_string(),
    }
}
