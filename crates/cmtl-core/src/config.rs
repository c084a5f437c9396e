//! Configuration types and resolution for the CMTL launcher.
//!
//! The launcher keeps its tool registry in a JSON file next to the binary
//! (`config.json` by default). Resolution always produces a usable
//! [`LauncherConfig`]: missing files are created from the built-in defaults,
//! existing files are merged key-by-key with the defaults so newly shipped
//! tools appear without clobbering user edits, and unparseable files fall back
//! to in-memory defaults while being left untouched on disk.

use crate::error::{LauncherError, Result};
use crate::registry::{CommandSpec, ToolSource};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Key used by older config files for the external tool table.
const LEGACY_TOOLS_KEY: &str = "tools";

/// External tool budget when the config leaves it at zero.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// Internal probe budget when the config leaves it at zero.
pub const DEFAULT_PROBE_TIMEOUT_SECONDS: u64 = 120;

/// Resolved launcher configuration.
///
/// Constructed once at startup and passed explicitly to the launcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Human readable project title shown by the front-ends.
    pub project_name: String,

    /// Target used when the caller does not supply one.
    pub default_target: String,

    /// Wall-clock budget for external tools, in seconds; 0 means the default.
    pub timeout_seconds: u64,

    /// Wall-clock budget for internal probes, in seconds; 0 means the default.
    pub probe_timeout_seconds: u64,

    /// Pause between invocations during a full run, in milliseconds.
    pub run_delay_ms: u64,

    /// Internal probe routines keyed by probe id.
    pub internal_tools: IndexMap<String, CommandSpec>,

    /// Third-party executables keyed by display name.
    pub external_tools: IndexMap<String, CommandSpec>,

    /// Explicit executable paths keyed by tool name.
    pub tool_paths: IndexMap<String, String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        let internal_tools = [
            ("port_scanner", vec!["cmtl-probe", "port-scan"]),
            ("ping_sweeper", vec!["cmtl-probe", "ping-sweep"]),
            ("banner_grabber", vec!["cmtl-probe", "banner-grab"]),
            ("subdomain_finder", vec!["cmtl-probe", "subdomain-find"]),
            ("packet_sniffer", vec!["tcpdump", "-n", "-c"]),
        ];

        let external_tools = [
            ("Nmap", vec!["nmap", "-sV", "{target}"]),
            ("Zenmap", vec!["zenmap"]),
            ("Angry IP Scanner", vec!["ipscan"]),
            ("Advanced IP Scanner", vec!["advanced_ip_scanner"]),
            ("LanSpy", vec!["lanspy"]),
            ("OpenVAS", vec!["gvm-start"]),
            ("Nessus", vec!["nessus"]),
            ("QualysGuard", vec![]),
            ("Acunetix", vec!["acunetix"]),
            ("Metasploit", vec!["msfconsole"]),
            ("Burp Suite", vec!["burpsuite"]),
            ("Sparta", vec!["sparta"]),
            ("Faraday", vec!["faraday-client"]),
            ("Wireshark", vec!["wireshark"]),
            ("Maltego", vec!["maltego"]),
            ("NetworkMiner", vec!["NetworkMiner"]),
            ("Kismet", vec!["kismet"]),
            ("Ettercap", vec!["ettercap"]),
            ("OWASP ZAP", vec!["zap.sh"]),
            (
                "Magnet AXIOM",
                vec![r"C:\Program Files\Magnet Forensics\Magnet AXIOM\AXIOM.exe"],
            ),
        ];

        Self {
            project_name: "CyberSec Multi Tool Launcher (CMTL)".to_string(),
            default_target: "192.168.1.1".to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            probe_timeout_seconds: DEFAULT_PROBE_TIMEOUT_SECONDS,
            run_delay_ms: 500,
            internal_tools: internal_tools
                .into_iter()
                .map(|(name, argv)| (name.to_string(), CommandSpec::vector(argv)))
                .collect(),
            external_tools: external_tools
                .into_iter()
                .map(|(name, argv)| (name.to_string(), CommandSpec::vector(argv)))
                .collect(),
            tool_paths: IndexMap::new(),
        }
    }
}

impl LauncherConfig {
    /// Resolves the configuration stored at `path`.
    ///
    /// Never fails:
    /// - no file: the defaults are written to `path` (parents created) and returned
    /// - a file: it is merged with the defaults and returned; the file is not rewritten
    /// - an unparseable file: a warning is logged and the defaults are returned
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn resolve(path: &Path) -> Self {
        if !path.exists() {
            let defaults = Self::default();
            if let Err(e) = defaults.save(path) {
                tracing::warn!(error = %e, "failed to write default config");
            } else {
                tracing::info!("wrote default config");
            }
            return defaults;
        }

        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse config, using defaults");
                Self::default()
            }
        }
    }

    /// Loads an existing config file and fills in missing defaults.
    ///
    /// # Errors
    ///
    /// Returns `LauncherError::Io` if the file cannot be read, or
    /// `LauncherError::ConfigCorrupt` if it is not a JSON object that
    /// deserialises into a configuration after merging.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let corrupt = |reason: String| LauncherError::ConfigCorrupt {
            path: path.to_path_buf(),
            reason,
        };

        let mut document = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => map,
            Ok(other) => return Err(corrupt(format!("expected a JSON object, found {other}"))),
            Err(e) => return Err(corrupt(e.to_string())),
        };

        upgrade_legacy_keys(&mut document);
        merge_defaults(&mut document, &Self::default_document()?);

        serde_json::from_value(Value::Object(document)).map_err(|e| corrupt(e.to_string()))
    }

    /// Writes the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Built-in defaults as a JSON object.
    pub fn default_document() -> Result<Map<String, Value>> {
        match serde_json::to_value(Self::default())? {
            Value::Object(map) => Ok(map),
            _ => Err(LauncherError::Anyhow(anyhow::anyhow!(
                "default config did not serialise to an object"
            ))),
        }
    }

    /// Effective timeout for a tool source, in seconds.
    pub fn timeout_for(&self, source: ToolSource) -> u64 {
        match source {
            ToolSource::Internal if self.probe_timeout_seconds == 0 => {
                DEFAULT_PROBE_TIMEOUT_SECONDS
            }
            ToolSource::Internal => self.probe_timeout_seconds,
            ToolSource::External if self.timeout_seconds == 0 => DEFAULT_TIMEOUT_SECONDS,
            ToolSource::External => self.timeout_seconds,
        }
    }
}

/// Inserts every default key missing from `document`.
///
/// When both sides hold an object under the same key the merge recurses, so
/// new entries of nested tables (tools, path overrides) are added while the
/// user's existing entries keep their values and order.
pub fn merge_defaults(document: &mut Map<String, Value>, defaults: &Map<String, Value>) {
    for (key, default) in defaults {
        match (document.get_mut(key), default) {
            (None, _) => {
                document.insert(key.clone(), default.clone());
            }
            (Some(Value::Object(nested)), Value::Object(default_nested)) => {
                merge_defaults(nested, default_nested);
            }
            (Some(_), _) => {}
        }
    }
}

/// Renames the single `tools` table of older files to `external_tools`.
fn upgrade_legacy_keys(document: &mut Map<String, Value>) {
    if !document.contains_key("external_tools")
        && let Some(tools) = document.remove(LEGACY_TOOLS_KEY)
    {
        document.insert("external_tools".to_string(), tools);
    } else {
        document.remove(LEGACY_TOOLS_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_should_build_default_registry() {
        let config = LauncherConfig::default();
        assert_eq!(config.timeout_seconds, 300);
        assert!(config.probe_timeout_seconds < config.timeout_seconds);
        assert_eq!(config.internal_tools.len(), 5);
        assert_eq!(config.external_tools.len(), 20);
        assert!(config.external_tools["QualysGuard"].is_missing());
    }

    #[test]
    fn test_should_insert_missing_top_level_keys() {
        let mut document = object(json!({"default_target": "10.0.0.1"}));
        let defaults = object(json!({"default_target": "192.168.1.1", "timeout_seconds": 300}));

        merge_defaults(&mut document, &defaults);

        assert_eq!(document["default_target"], json!("10.0.0.1"));
        assert_eq!(document["timeout_seconds"], json!(300));
    }

    #[test]
    fn test_should_merge_nested_tables_one_level_down() {
        let mut document = object(json!({
            "external_tools": {"Nmap": ["/usr/local/bin/nmap"], "Custom": ["custom"]}
        }));
        let defaults = object(json!({
            "external_tools": {"Nmap": ["nmap"], "Wireshark": ["wireshark"]}
        }));

        merge_defaults(&mut document, &defaults);

        let tools = document["external_tools"].as_object().unwrap();
        assert_eq!(tools["Nmap"], json!(["/usr/local/bin/nmap"]));
        assert_eq!(tools["Custom"], json!(["custom"]));
        assert_eq!(tools["Wireshark"], json!(["wireshark"]));
        let keys: Vec<&String> = tools.keys().collect();
        assert_eq!(keys, vec!["Nmap", "Custom", "Wireshark"]);
    }

    #[test]
    fn test_should_keep_user_value_when_shapes_differ() {
        let mut document = object(json!({"tool_paths": "oops"}));
        let defaults = object(json!({"tool_paths": {}}));

        merge_defaults(&mut document, &defaults);

        assert_eq!(document["tool_paths"], json!("oops"));
    }

    #[test]
    fn test_should_upgrade_legacy_tools_key() {
        let mut document = object(json!({"tools": {"Nmap": ["nmap"]}}));
        upgrade_legacy_keys(&mut document);
        assert!(!document.contains_key("tools"));
        assert_eq!(document["external_tools"], json!({"Nmap": ["nmap"]}));

        let mut document = object(json!({"tools": {"A": ["a"]}, "external_tools": {"B": ["b"]}}));
        upgrade_legacy_keys(&mut document);
        assert!(!document.contains_key("tools"));
        assert_eq!(document["external_tools"], json!({"B": ["b"]}));
    }

    #[test]
    fn test_should_pick_timeout_by_source() {
        let config = LauncherConfig::default();
        assert_eq!(config.timeout_for(ToolSource::External), 300);
        assert_eq!(config.timeout_for(ToolSource::Internal), 120);
    }

    #[test]
    fn test_should_treat_zero_timeout_as_default() {
        let config = LauncherConfig {
            timeout_seconds: 0,
            probe_timeout_seconds: 0,
            ..LauncherConfig::default()
        };
        assert_eq!(config.timeout_for(ToolSource::External), DEFAULT_TIMEOUT_SECONDS);
        assert_eq!(
            config.timeout_for(ToolSource::Internal),
            DEFAULT_PROBE_TIMEOUT_SECONDS
        );

        let config = LauncherConfig {
            timeout_seconds: 7,
            ..LauncherConfig::default()
        };
        assert_eq!(config.timeout_for(ToolSource::External), 7);
    }
}
