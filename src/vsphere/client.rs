//! vSphere VI/JSON API Client
//!
//! This module speaks the vim25 object model over HTTP+JSON (`/sdk/vim25/{release}`),
//! available on vCenter 8.0 U1 and newer.
//!
//! # Architecture
//!
//! - **Service content**: `GET ServiceInstance/ServiceInstance/content` yields the
//!   root folder, property collector, view manager and session manager references
//! - **Authentication**: `SessionManager.Login`; the returned `vmware-api-session-id`
//!   header authenticates every following request
//! - **Bulk retrieval**: a recursive `ContainerView` over the root folder walked by
//!   `PropertyCollector.RetrievePropertiesEx`, paged with `ContinueRetrievePropertiesEx`
//! - **Single object**: `RetrievePropertiesEx` over one object reference
//!
//! # Example
//!
//! ```no_run
//! use vsphere_exporter::config::VsphereConfig;
//! use vsphere_exporter::vsphere::{InventoryApi, InventorySession, VsphereClient};
//! use vsphere_exporter::vsphere::types::HostSystem;
//! use secrecy::SecretString;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = VsphereConfig {
//!     url: "https://vcenter.local".to_string(),
//!     username: "monitoring@vsphere.local".to_string(),
//!     password: SecretString::from("secret".to_string()),
//!     verify_ssl: false,
//!     api_release: "8.0.1.0".to_string(),
//! };
//!
//! let client = VsphereClient::new(config, std::time::Duration::from_secs(30))?;
//! let session = client.open_session().await?;
//! let hosts: Vec<HostSystem> = session
//!     .retrieve_all("HostSystem", &["name", "parent", "summary"])
//!     .await?;
//! session.close().await;
//! # Ok(())
//! # }
//! ```

use crate::config::VsphereConfig;
use crate::error::{ExporterError, Result};
use crate::vsphere::session::{InventoryApi, InventorySession};
use crate::vsphere::types::{ManagedObjectReference, ObjectContent, RetrieveResult, ServiceContent};
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const SESSION_HEADER: &str = "vmware-api-session-id";

/// Client for the vSphere VI/JSON API
///
/// Holds the HTTP connection pool and endpoint configuration. Each call to
/// [`InventoryApi::open_session`] logs in anew; sessions are never shared
/// between collectors.
pub struct VsphereClient {
    http: reqwest::Client,
    config: Arc<VsphereConfig>,
    base_url: String,
}

impl VsphereClient {
    pub fn new(config: VsphereConfig, timeout: Duration) -> Result<Self> {
        if !(config.url.starts_with("https://") || config.url.starts_with("http://")) {
            return Err(ExporterError::Config(format!(
                "vsphere.url must be an http(s) URL, got {:?}",
                config.url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            // Self-signed vCenter certificates are common
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;

        let base_url = format!(
            "{}/sdk/vim25/{}",
            config.url.trim_end_matches('/'),
            config.api_release
        );

        Ok(Self {
            http,
            config: Arc::new(config),
            base_url,
        })
    }

    async fn service_content(&self) -> Result<ServiceContent> {
        let url = format!("{}/ServiceInstance/ServiceInstance/content", self.base_url);
        debug!("Fetching service content from {}", url);

        let response = self.http.get(&url).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn login(&self, content: &ServiceContent) -> Result<String> {
        let url = method_url(&self.base_url, &content.session_manager, "Login");
        let body = json!({
            "userName": self.config.username,
            "password": self.config.password.expose_secret(),
        });

        let response = self.http.post(&url).json(&body).send().await?;
        let rejected = matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        );
        let response = match check_status(response).await {
            Ok(response) => response,
            // Bad credentials surface as an InvalidLogin fault
            Err(ExporterError::VsphereApi(msg)) if rejected || msg.contains("InvalidLogin") => {
                return Err(ExporterError::Auth(format!(
                    "vCenter rejected credentials for {}",
                    self.config.username
                )));
            }
            Err(e) => return Err(e),
        };

        response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                ExporterError::Auth(format!("Login response carried no {} header", SESSION_HEADER))
            })
    }
}

impl InventoryApi for VsphereClient {
    type Session = VsphereSession;

    fn endpoint(&self) -> &str {
        &self.config.url
    }

    async fn open_session(&self) -> Result<VsphereSession> {
        debug!("Connecting to {}", self.config.url);
        let content = self.service_content().await?;
        let session_id = self.login(&content).await?;
        info!("Authenticated to vCenter {}", self.config.url);

        Ok(VsphereSession {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            session_id,
            content,
            closed: false,
        })
    }
}

/// An authenticated VI/JSON session
///
/// Call [`InventorySession::close`] to log out. A session dropped without being
/// closed (for instance when its scrape timed out) logs out in the background.
pub struct VsphereSession {
    http: reqwest::Client,
    base_url: String,
    session_id: String,
    content: ServiceContent,
    closed: bool,
}

impl VsphereSession {
    async fn invoke(
        &self,
        target: &ManagedObjectReference,
        method: &str,
        body: Value,
    ) -> Result<Option<Value>> {
        let url = method_url(&self.base_url, target, method);
        let response = self
            .http
            .post(&url)
            .header(SESSION_HEADER, &self.session_id)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        // Void methods and empty results come back without a body
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Value>(&text)? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    async fn retrieve_contents(&self, spec: Value) -> Result<Vec<ObjectContent>> {
        let collector = &self.content.property_collector;
        let mut objects = Vec::new();

        let mut page = self
            .invoke(
                collector,
                "RetrievePropertiesEx",
                json!({
                    "specSet": [spec],
                    "options": { "_typeName": "RetrieveOptions" },
                }),
            )
            .await?;

        while let Some(value) = page.take() {
            let result: RetrieveResult = serde_json::from_value(value)?;
            objects.extend(result.objects);

            if let Some(token) = result.token {
                page = self
                    .invoke(
                        collector,
                        "ContinueRetrievePropertiesEx",
                        json!({ "token": token }),
                    )
                    .await?;
            }
        }

        Ok(objects)
    }

    async fn create_container_view(&self, object_type: &str) -> Result<ManagedObjectReference> {
        let view = self
            .invoke(
                &self.content.view_manager,
                "CreateContainerView",
                json!({
                    "container": self.content.root_folder,
                    "type": [object_type],
                    "recursive": true,
                }),
            )
            .await?
            .ok_or_else(|| {
                ExporterError::VsphereApi("CreateContainerView returned no view".to_string())
            })?;
        Ok(serde_json::from_value(view)?)
    }

    async fn destroy_view(&self, view: &ManagedObjectReference) {
        if let Err(e) = self.invoke(view, "DestroyView", json!({})).await {
            warn!("Failed to destroy container view {}: {}", view, e);
        }
    }
}

impl InventorySession for VsphereSession {
    async fn retrieve_all<T>(&self, object_type: &str, properties: &[&str]) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        let view = self.create_container_view(object_type).await?;

        let spec = json!({
            "_typeName": "PropertyFilterSpec",
            "propSet": [{
                "_typeName": "PropertySpec",
                "type": object_type,
                "pathSet": properties,
            }],
            "objectSet": [{
                "_typeName": "ObjectSpec",
                "obj": view,
                "skip": true,
                "selectSet": [{
                    "_typeName": "TraversalSpec",
                    "name": "traverseEntities",
                    "type": "ContainerView",
                    "path": "view",
                    "skip": false,
                }],
            }],
        });

        let contents = self.retrieve_contents(spec).await;
        self.destroy_view(&view).await;

        contents?
            .into_iter()
            .map(|content| serde_json::from_value(flatten_object(content)).map_err(Into::into))
            .collect()
    }

    async fn retrieve_one<T>(
        &self,
        reference: &ManagedObjectReference,
        properties: &[&str],
    ) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let spec = json!({
            "_typeName": "PropertyFilterSpec",
            "propSet": [{
                "_typeName": "PropertySpec",
                "type": reference.kind,
                "pathSet": properties,
            }],
            "objectSet": [{
                "_typeName": "ObjectSpec",
                "obj": reference,
                "skip": false,
            }],
        });

        let content = self
            .retrieve_contents(spec)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ExporterError::VsphereApi(format!("Object {} not found", reference)))?;

        Ok(serde_json::from_value(flatten_object(content))?)
    }

    async fn close(mut self) {
        let url = method_url(&self.base_url, &self.content.session_manager, "Logout");
        logout(&self.http, &url, &self.session_id).await;
        self.closed = true;
    }
}

impl Drop for VsphereSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Aborted scrape: release the server-side session without blocking
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let http = self.http.clone();
            let url = method_url(&self.base_url, &self.content.session_manager, "Logout");
            let session_id = std::mem::take(&mut self.session_id);
            handle.spawn(async move {
                logout(&http, &url, &session_id).await;
            });
        } else {
            debug!("VsphereSession dropped outside a runtime; session left to expire");
        }
    }
}

async fn logout(http: &reqwest::Client, url: &str, session_id: &str) {
    let result = http
        .post(url)
        .header(SESSION_HEADER, session_id)
        .send()
        .await
        .and_then(|response| response.error_for_status());
    match result {
        Ok(_) => debug!("vCenter session logged out"),
        Err(e) => warn!("Logout error: {}", e),
    }
}

fn method_url(base_url: &str, target: &ManagedObjectReference, method: &str) -> String {
    format!("{}/{}/{}/{}", base_url, target.kind, target.value, method)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ExporterError::VsphereApi(format!("{}: {}", status, body)))
}

/// Turn an `ObjectContent` into `{"self": obj, "<property>": value, ...}`
///
/// VI/JSON boxes primitives and arrays held in `anyType` slots as
/// `{"_typeName": ..., "_value": ...}`; those are unwrapped.
pub fn flatten_object(content: ObjectContent) -> Value {
    let mut object = Map::with_capacity(content.prop_set.len() + 1);
    object.insert("self".to_string(), json!(content.obj));
    for property in content.prop_set {
        object.insert(property.name, unbox(property.val));
    }
    Value::Object(object)
}

fn unbox(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 2 && map.contains_key("_typeName") => {
            match map.remove("_value") {
                Some(inner) => inner,
                None => Value::Object(map),
            }
        }
        other => other,
    }
}
