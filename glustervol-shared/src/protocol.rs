//! Volume plugin protocol messages.
//!
//! Field names follow the orchestrator's PascalCase JSON convention. Every
//! response carries an optional `Err`; an empty or missing `Err` means success.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Whether a volume is usable only on the host that created it or cluster-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Local,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Capability {
    pub scope: Scope,
}

/// Public description of a volume.
///
/// `mountpoint` is only set when the volume is known to this host's mount
/// table; volumes reported by the remote service alone carry a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VolumeInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mountpoint: Option<PathBuf>,
}

impl VolumeInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mountpoint: None,
        }
    }

    pub fn mounted(name: impl Into<String>, mountpoint: PathBuf) -> Self {
        Self {
            name: name.into(),
            mountpoint: Some(mountpoint),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRequest {
    pub name: String,
    /// Driver options; accepted and ignored.
    #[serde(default)]
    pub opts: Option<HashMap<String, String>>,
}

/// Request carrying only a volume name (Remove, Path, Get).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NameRequest {
    pub name: String,
}

/// Mount and Unmount requests; `ID` identifies the calling container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountRequest {
    pub name: String,
    #[serde(default, rename = "ID")]
    pub id: String,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub err: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountpointResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mountpoint: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub err: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<VolumeInfo>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub err: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListResponse {
    #[serde(default)]
    pub volumes: Vec<VolumeInfo>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub err: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapabilitiesResponse {
    pub capabilities: Capability,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivateResponse {
    pub implements: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mount_request_field_names() {
        let req: MountRequest =
            serde_json::from_value(json!({"Name": "data", "ID": "c0ffee"})).unwrap();
        assert_eq!(req.name, "data");
        assert_eq!(req.id, "c0ffee");

        // ID is optional for older orchestrators
        let req: MountRequest = serde_json::from_value(json!({"Name": "data"})).unwrap();
        assert!(req.id.is_empty());
    }

    #[test]
    fn test_success_response_omits_err() {
        let value = serde_json::to_value(MountpointResponse {
            mountpoint: Some(PathBuf::from("/mnt/v/data")),
            err: String::new(),
        })
        .unwrap();
        assert_eq!(value, json!({"Mountpoint": "/mnt/v/data"}));

        let value = serde_json::to_value(ErrorResponse::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_remote_only_volume_has_no_mountpoint() {
        let value = serde_json::to_value(VolumeInfo::named("data")).unwrap();
        assert_eq!(value, json!({"Name": "data"}));
    }

    #[test]
    fn test_capabilities_scope_is_lowercase() {
        let value = serde_json::to_value(CapabilitiesResponse {
            capabilities: Capability {
                scope: Scope::Global,
            },
        })
        .unwrap();
        assert_eq!(value, json!({"Capabilities": {"Scope": "global"}}));
    }
}
