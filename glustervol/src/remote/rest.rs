//! Client for the glusterfs-rest management API.
//!
//! Every endpoint answers with an envelope `{"ok": bool, "data": .., "error": ..}`.
//! A transport failure, a non-2xx status or `"ok": false` all become
//! [`VolumeError::Remote`] carrying the server's message when it sent one.

use std::path::PathBuf;

use glustervol_shared::errors::{VolumeError, VolumeResult};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{RemoteVolume, RemoteVolumeService};
use crate::options::RestOptions;

const VOLUMES_PATH: &str = "api/1.0/volumes";
const VOLUME_PATH: &str = "api/1.0/volume";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

/// Blocking REST client. Must not be created or dropped on an async runtime
/// thread.
#[derive(Debug, Clone)]
pub struct RestVolumeClient {
    client: Client,
    address: String,
    base: PathBuf,
}

impl RestVolumeClient {
    pub fn new(options: &RestOptions) -> VolumeResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| VolumeError::Config(format!("failed to build rest client: {}", e)))?;

        Ok(Self {
            client,
            address: options.address.trim_end_matches('/').to_string(),
            base: options.base.clone(),
        })
    }

    fn volumes_url(&self) -> String {
        format!("{}/{}", self.address, VOLUMES_PATH)
    }

    fn volume_url(&self, name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.address,
            VOLUME_PATH,
            urlencoding::encode(name)
        )
    }

    /// `server:<base>/<name>` for every server, comma separated.
    fn bricks(&self, name: &str, servers: &[String]) -> String {
        let brick_dir = self.base.join(name);
        servers
            .iter()
            .map(|server| format!("{}:{}", server, brick_dir.display()))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> VolumeResult<Option<T>> {
        let response = request
            .send()
            .map_err(|e| VolumeError::Remote(format!("{}: {}", action, e)))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| VolumeError::Remote(format!("{}: {}", action, e)))?;

        match serde_json::from_str::<ApiResponse<T>>(&body) {
            Ok(api) if status.is_success() && api.ok => Ok(api.data),
            Ok(api) => {
                let message = api
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| status.to_string());
                Err(VolumeError::Remote(format!("{}: {}", action, message)))
            }
            Err(e) if status.is_success() => Err(VolumeError::Remote(format!(
                "{}: invalid response: {}",
                action, e
            ))),
            Err(_) => Err(VolumeError::Remote(format!("{}: {}", action, status))),
        }
    }

    fn stop(&self, name: &str) -> VolumeResult<()> {
        let url = format!("{}/stop", self.volume_url(name));
        self.send::<serde_json::Value>(self.client.put(url), "stop volume")?;
        Ok(())
    }
}

impl RemoteVolumeService for RestVolumeClient {
    fn exists(&self, name: &str) -> VolumeResult<bool> {
        Ok(self.list()?.iter().any(|v| v.name == name))
    }

    fn create(&self, name: &str, servers: &[String]) -> VolumeResult<()> {
        let params = [
            ("bricks", self.bricks(name, servers)),
            ("replica", servers.len().to_string()),
        ];
        tracing::debug!(volume = name, bricks = %params[0].1, "Creating remote volume");
        self.send::<serde_json::Value>(
            self.client.post(self.volume_url(name)).form(&params),
            "create volume",
        )?;
        Ok(())
    }

    /// Stops the volume, then deletes it.
    fn delete(&self, name: &str) -> VolumeResult<()> {
        self.stop(name)?;
        self.send::<serde_json::Value>(self.client.delete(self.volume_url(name)), "delete volume")?;
        Ok(())
    }

    fn list(&self) -> VolumeResult<Vec<RemoteVolume>> {
        let volumes = self
            .send::<Vec<RemoteVolume>>(self.client.get(self.volumes_url()), "list volumes")?
            .unwrap_or_default();
        Ok(volumes)
    }
}
