//! Plugin protocol dispatch.
//!
//! Maps each volume plugin endpoint onto the matching [`VolumeDriver`]
//! operation. Failures never escape as Rust errors: they are rendered into
//! the response's `Err` field, which is what the orchestrator expects.

use std::sync::Arc;

use glustervol_shared::constants::endpoints;
use glustervol_shared::errors::{VolumeError, VolumeResult};
use glustervol_shared::protocol::{
    ActivateResponse, CapabilitiesResponse, CreateRequest, ErrorResponse, GetResponse,
    ListResponse, MountRequest, MountpointResponse, NameRequest,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::driver::VolumeDriver;

#[derive(Clone)]
pub struct PluginHandler {
    driver: Arc<VolumeDriver>,
}

impl PluginHandler {
    pub fn new(driver: Arc<VolumeDriver>) -> Self {
        Self { driver }
    }

    /// Handle one request and produce its JSON response.
    pub fn handle(&self, endpoint: &str, body: Value) -> Value {
        match self.dispatch(endpoint, body) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "Request rejected");
                error_value(&e)
            }
        }
    }

    fn dispatch(&self, endpoint: &str, body: Value) -> VolumeResult<Value> {
        match endpoint {
            endpoints::ACTIVATE => encode(&ActivateResponse {
                implements: vec![endpoints::VOLUME_DRIVER.to_string()],
            }),
            endpoints::CREATE => {
                let request: CreateRequest = decode(body)?;
                encode(&ErrorResponse {
                    err: error_text(self.driver.create(&request.name)),
                })
            }
            endpoints::REMOVE => {
                let request: NameRequest = decode(body)?;
                encode(&ErrorResponse {
                    err: error_text(self.driver.remove(&request.name)),
                })
            }
            endpoints::MOUNT => {
                let request: MountRequest = decode(body)?;
                tracing::debug!(volume = %request.name, id = %request.id, "Mount request");
                encode(&mountpoint_response(self.driver.mount(&request.name)))
            }
            endpoints::UNMOUNT => {
                let request: MountRequest = decode(body)?;
                tracing::debug!(volume = %request.name, id = %request.id, "Unmount request");
                encode(&ErrorResponse {
                    err: error_text(self.driver.unmount(&request.name)),
                })
            }
            endpoints::PATH => {
                let request: NameRequest = decode(body)?;
                encode(&mountpoint_response(Ok(self.driver.path(&request.name))))
            }
            endpoints::GET => {
                let request: NameRequest = decode(body)?;
                let response = match self.driver.get(&request.name) {
                    Ok(volume) => GetResponse {
                        volume: Some(volume),
                        err: String::new(),
                    },
                    Err(e) => GetResponse {
                        volume: None,
                        err: e.to_string(),
                    },
                };
                encode(&response)
            }
            endpoints::LIST => {
                let response = match self.driver.list() {
                    Ok(volumes) => ListResponse {
                        volumes,
                        err: String::new(),
                    },
                    Err(e) => ListResponse {
                        volumes: Vec::new(),
                        err: e.to_string(),
                    },
                };
                encode(&response)
            }
            endpoints::CAPABILITIES => encode(&CapabilitiesResponse {
                capabilities: self.driver.capabilities(),
            }),
            other => Err(VolumeError::Protocol(format!("unknown endpoint {}", other))),
        }
    }
}

fn mountpoint_response(result: VolumeResult<std::path::PathBuf>) -> MountpointResponse {
    match result {
        Ok(path) => MountpointResponse {
            mountpoint: Some(path),
            err: String::new(),
        },
        Err(e) => MountpointResponse {
            mountpoint: None,
            err: e.to_string(),
        },
    }
}

fn error_text(result: VolumeResult<()>) -> String {
    result.err().map(|e| e.to_string()).unwrap_or_default()
}

fn error_value(error: &VolumeError) -> Value {
    serde_json::json!({ "Err": error.to_string() })
}

fn decode<T: DeserializeOwned>(body: Value) -> VolumeResult<T> {
    serde_json::from_value(body).map_err(|e| VolumeError::Protocol(format!("invalid body: {}", e)))
}

fn encode<T: Serialize>(response: &T) -> VolumeResult<Value> {
    serde_json::to_value(response)
        .map_err(|e| VolumeError::Protocol(format!("failed to encode response: {}", e)))
}
