//! Tool registry and command specifications.
//!
//! A tool is described declaratively by a [`CommandSpec`]. Specs arrive from
//! JSON in loosely-typed shapes (string, list, `null`, anything else) and are
//! normalised here once, at load time, into a tagged variant. The
//! [`ToolRegistry`] is built from the resolved configuration and is never
//! mutated afterwards.

use crate::availability;
use crate::config::LauncherConfig;
use crate::error::{LauncherError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Placeholder token replaced with the run target in command templates.
pub const TARGET_PLACEHOLDER: &str = "{target}";

/// Declarative description of how to invoke a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// No local launcher (cloud-only product). Not an error.
    Missing,

    /// A single command line, tokenised on whitespace.
    Single(String),

    /// Executable locator followed by fixed arguments.
    Vector(Vec<String>),

    /// Any other JSON shape; kept verbatim so it round-trips to disk.
    Invalid(Value),
}

impl CommandSpec {
    /// Creates a vector spec from string-like tokens.
    pub fn vector<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.is_empty() {
            Self::Missing
        } else {
            Self::Vector(tokens)
        }
    }

    /// Normalises a raw JSON value into a spec.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Self::Missing,
            Value::String(s) if s.trim().is_empty() => Self::Missing,
            Value::String(s) => Self::Single(s),
            Value::Array(items) if items.is_empty() => Self::Missing,
            Value::Array(items) => {
                let tokens: Option<Vec<String>> = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect();
                match tokens {
                    Some(tokens) => Self::Vector(tokens),
                    None => Self::Invalid(Value::Array(items)),
                }
            }
            other => Self::Invalid(other),
        }
    }

    /// Returns `true` if the spec has no local launcher.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Canonical argument vector, or `None` for `Missing` and `Invalid` specs.
    pub fn argv(&self) -> Option<Vec<String>> {
        match self {
            Self::Missing | Self::Invalid(_) => None,
            Self::Single(line) => Some(line.split_whitespace().map(str::to_string).collect()),
            Self::Vector(tokens) => Some(tokens.clone()),
        }
    }

    /// Checks whether the executable locator of this spec can be invoked.
    pub fn is_available(&self) -> bool {
        availability::is_available(self.argv().as_deref())
    }
}

impl<'de> Deserialize<'de> for CommandSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

impl Serialize for CommandSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Missing => Vec::<String>::new().serialize(serializer),
            Self::Single(line) => line.serialize(serializer),
            Self::Vector(tokens) => tokens.serialize(serializer),
            Self::Invalid(raw) => raw.serialize(serializer),
        }
    }
}

/// Where a tool comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolSource {
    /// Bundled probe routine, run as its own process.
    Internal,

    /// Third-party executable.
    External,
}

impl ToolSource {
    /// Returns the string representation of the source.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolSource::Internal => "internal",
            ToolSource::External => "external",
        }
    }
}

impl fmt::Display for ToolSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positional argument layout of an internal probe, selected by probe id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    /// `port_scanner`: `<target>`
    PortScan,

    /// `ping_sweeper`: `<subnet-prefix> <start> <end>`
    PingSweep,

    /// `banner_grabber`: `<target> <port>`
    BannerGrab,

    /// `subdomain_finder`: `<domain>`
    SubdomainFind,

    /// `packet_sniffer`: `<count>`
    PacketSniff,

    /// Any other probe id: `<target>`
    Generic,
}

impl ProbeKind {
    /// Default first host of a ping sweep.
    pub const SWEEP_START: u8 = 1;

    /// Default last host of a ping sweep.
    pub const SWEEP_END: u8 = 20;

    /// Default banner port.
    pub const BANNER_PORT: u16 = 80;

    /// Default packet capture count.
    pub const SNIFF_COUNT: u32 = 10;

    /// Maps a probe id (the internal registry key) to its layout.
    pub fn from_id(id: &str) -> Self {
        match id.to_lowercase().replace(' ', "_").as_str() {
            "port_scanner" => Self::PortScan,
            "ping_sweeper" => Self::PingSweep,
            "banner_grabber" => Self::BannerGrab,
            "subdomain_finder" => Self::SubdomainFind,
            "packet_sniffer" => Self::PacketSniff,
            _ => Self::Generic,
        }
    }

    /// Positional arguments carrying the run target into the probe.
    pub fn positional_args(&self, target: &str) -> Vec<String> {
        match self {
            Self::PortScan | Self::SubdomainFind | Self::Generic => vec![target.to_string()],
            Self::PingSweep => vec![
                subnet_prefix(target),
                Self::SWEEP_START.to_string(),
                Self::SWEEP_END.to_string(),
            ],
            Self::BannerGrab => vec![target.to_string(), Self::BANNER_PORT.to_string()],
            Self::PacketSniff => vec![Self::SNIFF_COUNT.to_string()],
        }
    }
}

/// Derives a `/24` sweep prefix by dropping the last octet.
///
/// `192.168.1.1` becomes `192.168.1.`.
pub fn subnet_prefix(target: &str) -> String {
    let octets: Vec<&str> = target.split('.').take(3).collect();
    format!("{}.", octets.join("."))
}

/// Replaces every `{target}` placeholder in the argument vector.
pub fn substitute_target(argv: &[String], target: &str) -> Vec<String> {
    argv.iter()
        .map(|token| token.replace(TARGET_PLACEHOLDER, target))
        .collect()
}

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEntry {
    /// Display name, unique within its source.
    pub name: String,

    /// Internal probe or external tool.
    pub source: ToolSource,

    /// How to invoke it.
    pub spec: CommandSpec,

    /// Explicit executable path replacing the spec's first token.
    pub path_override: Option<String>,
}

impl ToolEntry {
    /// Canonical argv after applying the path override, without target data.
    ///
    /// Without an override, a bare executable name missing from `PATH` is
    /// replaced by the binary of that name installed beside the running one.
    pub fn base_argv(&self) -> Result<Vec<String>> {
        let mut argv = match &self.spec {
            CommandSpec::Missing => return Err(LauncherError::NoLauncher(self.name.clone())),
            CommandSpec::Invalid(raw) => {
                return Err(LauncherError::InvalidCommandDefinition {
                    tool: self.name.clone(),
                    reason: format!("unsupported command shape: {raw}"),
                });
            }
            spec => spec.argv().unwrap_or_default(),
        };

        if argv.is_empty() {
            return Err(LauncherError::InvalidCommandDefinition {
                tool: self.name.clone(),
                reason: "command has no tokens".to_string(),
            });
        }

        if let Some(path) = &self.path_override {
            argv[0] = path.clone();
        } else if let Some(bundled) = availability::bundled_fallback(&argv[0]) {
            argv[0] = bundled.to_string_lossy().into_owned();
        }

        Ok(argv)
    }

    /// Full argv for a run against `target`.
    ///
    /// Internal probes receive their positional arguments unless the spec
    /// already carries a `{target}` placeholder.
    pub fn command_for(&self, target: &str) -> Result<Vec<String>> {
        let argv = self.base_argv()?;
        let templated = argv.iter().any(|token| token.contains(TARGET_PLACEHOLDER));
        let mut argv = substitute_target(&argv, target);
        if self.source == ToolSource::Internal && !templated {
            argv.extend(ProbeKind::from_id(&self.name).positional_args(target));
        }
        Ok(argv)
    }

    /// Availability of the effective executable locator.
    pub fn is_available(&self) -> bool {
        match self.base_argv() {
            Ok(argv) => availability::is_available(Some(argv.as_slice())),
            Err(_) => false,
        }
    }
}

/// Immutable, ordered registry: internal probes first, then external tools.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
}

impl ToolRegistry {
    /// Builds the registry from a resolved configuration.
    ///
    /// An external tool sharing its name with an internal probe stays listed
    /// but can only be reached through the full run; a warning names it.
    pub fn from_config(config: &LauncherConfig) -> Self {
        for name in shadowed_names(config) {
            tracing::warn!(
                tool = %name,
                "external tool shares its name with an internal probe; lookups by name resolve to the probe"
            );
        }

        let internal = config
            .internal_tools
            .iter()
            .map(|(name, spec)| (ToolSource::Internal, name, spec));
        let external = config
            .external_tools
            .iter()
            .map(|(name, spec)| (ToolSource::External, name, spec));

        let entries = internal
            .chain(external)
            .map(|(source, name, spec)| ToolEntry {
                name: name.clone(),
                source,
                spec: spec.clone(),
                path_override: config
                    .tool_paths
                    .get(name)
                    .filter(|path| !path.trim().is_empty())
                    .cloned(),
            })
            .collect();

        Self { entries }
    }

    /// All entries in registration order.
    pub fn entries(&self) -> &[ToolEntry] {
        &self.entries
    }

    /// Looks up a tool by name; internal probes shadow external tools.
    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Tool names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// External tool names that an internal probe of the same name shadows.
pub fn shadowed_names(config: &LauncherConfig) -> Vec<String> {
    config
        .external_tools
        .keys()
        .filter(|name| config.internal_tools.contains_key(name.as_str()))
        .cloned()
        .collect()
}
