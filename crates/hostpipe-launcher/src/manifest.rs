use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::name::is_valid_host_name;

/// How the host talks to us. Only stdio pipes exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostType {
    Stdio,
}

/// A native host manifest, as stored in `<search_dir>/<name>.json`.
///
/// ```json
/// {
///   "name": "com.example.echo",
///   "description": "Echo host",
///   "path": "/usr/local/bin/echo-host",
///   "type": "stdio",
///   "allowed_origins": ["app://example/"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostManifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub host_type: HostType,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl HostManifest {
    /// Parse and validate a manifest expected to describe `expected_name`.
    ///
    /// Errors are human-readable reasons, reported through
    /// [`LaunchError::InvalidManifest`](crate::LaunchError::InvalidManifest).
    pub fn parse(bytes: &[u8], expected_name: &str) -> Result<Self, String> {
        let manifest: Self =
            serde_json::from_slice(bytes).map_err(|err| format!("malformed manifest: {err}"))?;
        manifest.validate(expected_name)?;
        Ok(manifest)
    }

    fn validate(&self, expected_name: &str) -> Result<(), String> {
        if !is_valid_host_name(&self.name) {
            return Err(format!("invalid host name {:?}", self.name));
        }
        if self.name != expected_name {
            return Err(format!(
                "manifest name {:?} does not match requested host {expected_name:?}",
                self.name
            ));
        }
        if self.path.as_os_str().is_empty() {
            return Err("empty host path".to_string());
        }
        Ok(())
    }

    /// Whether `origin` is listed in `allowed_origins` (exact match).
    pub fn allows_origin(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }

    /// Host executable path; relative paths are taken relative to the manifest's directory.
    pub fn resolve_path(&self, manifest_dir: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            manifest_dir.join(&self.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "name": "com.example.echo",
        "description": "Echo host",
        "path": "/opt/echo/echo-host",
        "type": "stdio",
        "allowed_origins": ["app://one/", "app://two/"]
    }"#;

    #[test]
    fn parses_valid_manifest() {
        let manifest = HostManifest::parse(MANIFEST.as_bytes(), "com.example.echo").unwrap();
        assert_eq!(manifest.host_type, HostType::Stdio);
        assert_eq!(manifest.description, "Echo host");
        assert!(manifest.allows_origin("app://two/"));
        assert!(!manifest.allows_origin("app://two"));
        assert!(!manifest.allows_origin("app://three/"));
    }

    #[test]
    fn rejects_name_mismatch() {
        let err = HostManifest::parse(MANIFEST.as_bytes(), "com.example.other").unwrap_err();
        assert!(err.contains("does not match"), "{err}");
    }

    #[test]
    fn rejects_unknown_type() {
        let json = MANIFEST.replace("\"stdio\"", "\"socket\"");
        let err = HostManifest::parse(json.as_bytes(), "com.example.echo").unwrap_err();
        assert!(err.starts_with("malformed manifest"), "{err}");
    }

    #[test]
    fn rejects_empty_path() {
        let json = MANIFEST.replace("/opt/echo/echo-host", "");
        let err = HostManifest::parse(json.as_bytes(), "com.example.echo").unwrap_err();
        assert_eq!(err, "empty host path");
    }

    #[test]
    fn rejects_garbage() {
        assert!(HostManifest::parse(b"not json", "com.example.echo").is_err());
    }

    #[test]
    fn missing_origins_allow_nobody() {
        let json = r#"{"name":"h","path":"/bin/h","type":"stdio"}"#;
        let manifest = HostManifest::parse(json.as_bytes(), "h").unwrap();
        assert!(manifest.allowed_origins.is_empty());
        assert!(!manifest.allows_origin(""));
    }

    #[test]
    fn relative_path_resolves_against_manifest_dir() {
        let json = r#"{"name":"h","path":"bin/host","type":"stdio"}"#;
        let manifest = HostManifest::parse(json.as_bytes(), "h").unwrap();
        assert_eq!(
            manifest.resolve_path(Path::new("/etc/hosts.d")),
            PathBuf::from("/etc/hosts.d/bin/host")
        );
    }
}
