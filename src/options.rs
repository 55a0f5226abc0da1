//! Network options
//!
//! Named, typed options forwarded verbatim to the engine before the network
//! starts. The runtime never interprets them; it only maps each option to its
//! engine code and parameter.
//!
//! ## Option Codes
//! - 30..=33: trace output
//! - 40: knob (`key=value`)
//! - 41..=47: TLS
//! - 48..=51: fault injection (buggify)
//! - 60..=63: multi-version client
//! - 70..=71: client statistics and profiling

use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, Result};

/// Parameter carried by an option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    None,
    Int(i64),
    Str(String),
}

/// Parameter type expected by an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    None,
    Int,
    Str,
}

/// A network option with its parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkOption {
    /// Enable trace output to the given directory (empty: working directory)
    TraceEnable(String),
    /// Roll trace files after this many bytes
    TraceRollSize(i64),
    /// Delete old trace files beyond this total size
    TraceMaxLogsSize(i64),
    /// Value of the `LogGroup` attribute in trace events
    TraceLogGroup(String),
    /// Tuning knob, `key=value`
    Knob(String),
    TlsPlugin(String),
    TlsCertPath(String),
    TlsKeyPath(String),
    /// Peer verification pattern
    TlsVerifyPeers(String),
    BuggifyEnable,
    BuggifyDisable,
    /// Percentage of buggify sections activated
    BuggifySectionActivatedProbability(i64),
    /// Percentage of activated sections that fire
    BuggifySectionFiredProbability(i64),
    DisableMultiVersionClientApi,
    ExternalClientLibrary(String),
    ExternalClientDirectory(String),
    DisableClientStatisticsLogging,
    EnableSlowTaskProfiling,
}

impl NetworkOption {
    /// Engine option code
    pub fn code(&self) -> i32 {
        match self {
            NetworkOption::TraceEnable(_) => 30,
            NetworkOption::TraceRollSize(_) => 31,
            NetworkOption::TraceMaxLogsSize(_) => 32,
            NetworkOption::TraceLogGroup(_) => 33,
            NetworkOption::Knob(_) => 40,
            NetworkOption::TlsPlugin(_) => 41,
            NetworkOption::TlsCertPath(_) => 43,
            NetworkOption::TlsKeyPath(_) => 46,
            NetworkOption::TlsVerifyPeers(_) => 47,
            NetworkOption::BuggifyEnable => 48,
            NetworkOption::BuggifyDisable => 49,
            NetworkOption::BuggifySectionActivatedProbability(_) => 50,
            NetworkOption::BuggifySectionFiredProbability(_) => 51,
            NetworkOption::DisableMultiVersionClientApi => 60,
            NetworkOption::ExternalClientLibrary(_) => 62,
            NetworkOption::ExternalClientDirectory(_) => 63,
            NetworkOption::DisableClientStatisticsLogging => 70,
            NetworkOption::EnableSlowTaskProfiling => 71,
        }
    }

    /// Option name as accepted by `parse`
    pub fn name(&self) -> &'static str {
        match self {
            NetworkOption::TraceEnable(_) => "trace_enable",
            NetworkOption::TraceRollSize(_) => "trace_roll_size",
            NetworkOption::TraceMaxLogsSize(_) => "trace_max_logs_size",
            NetworkOption::TraceLogGroup(_) => "trace_log_group",
            NetworkOption::Knob(_) => "knob",
            NetworkOption::TlsPlugin(_) => "tls_plugin",
            NetworkOption::TlsCertPath(_) => "tls_cert_path",
            NetworkOption::TlsKeyPath(_) => "tls_key_path",
            NetworkOption::TlsVerifyPeers(_) => "tls_verify_peers",
            NetworkOption::BuggifyEnable => "buggify_enable",
            NetworkOption::BuggifyDisable => "buggify_disable",
            NetworkOption::BuggifySectionActivatedProbability(_) => {
                "buggify_section_activated_probability"
            }
            NetworkOption::BuggifySectionFiredProbability(_) => "buggify_section_fired_probability",
            NetworkOption::DisableMultiVersionClientApi => "disable_multi_version_client_api",
            NetworkOption::ExternalClientLibrary(_) => "external_client_library",
            NetworkOption::ExternalClientDirectory(_) => "external_client_directory",
            NetworkOption::DisableClientStatisticsLogging => "disable_client_statistics_logging",
            NetworkOption::EnableSlowTaskProfiling => "enable_slow_task_profiling",
        }
    }

    /// Parameter forwarded to the engine
    pub fn value(&self) -> OptionValue {
        match self {
            NetworkOption::TraceEnable(s)
            | NetworkOption::TraceLogGroup(s)
            | NetworkOption::Knob(s)
            | NetworkOption::TlsPlugin(s)
            | NetworkOption::TlsCertPath(s)
            | NetworkOption::TlsKeyPath(s)
            | NetworkOption::TlsVerifyPeers(s)
            | NetworkOption::ExternalClientLibrary(s)
            | NetworkOption::ExternalClientDirectory(s) => OptionValue::Str(s.clone()),
            NetworkOption::TraceRollSize(n)
            | NetworkOption::TraceMaxLogsSize(n)
            | NetworkOption::BuggifySectionActivatedProbability(n)
            | NetworkOption::BuggifySectionFiredProbability(n) => OptionValue::Int(*n),
            NetworkOption::BuggifyEnable
            | NetworkOption::BuggifyDisable
            | NetworkOption::DisableMultiVersionClientApi
            | NetworkOption::DisableClientStatisticsLogging
            | NetworkOption::EnableSlowTaskProfiling => OptionValue::None,
        }
    }

    pub fn param_type(&self) -> ParamType {
        match self.value() {
            OptionValue::None => ParamType::None,
            OptionValue::Int(_) => ParamType::Int,
            OptionValue::Str(_) => ParamType::Str,
        }
    }

    /// Whether the engine defines an option with this code
    pub fn is_known_code(code: i32) -> bool {
        matches!(code, 30..=33 | 40 | 41 | 43 | 46..=51 | 60 | 62 | 63 | 70 | 71)
    }

    /// Build an option from its name and textual parameter
    ///
    /// Names are case-insensitive and accept `-` for `_`.
    pub fn parse(name: &str, value: Option<&str>) -> Result<Self> {
        let name = name.trim().to_ascii_lowercase().replace('-', "_");

        let option = match name.as_str() {
            "trace_enable" => NetworkOption::TraceEnable(value.unwrap_or("").to_string()),
            "trace_roll_size" => NetworkOption::TraceRollSize(int_param(&name, value)?),
            "trace_max_logs_size" => NetworkOption::TraceMaxLogsSize(int_param(&name, value)?),
            "trace_log_group" => NetworkOption::TraceLogGroup(str_param(&name, value)?),
            "knob" => {
                let knob = str_param(&name, value)?;
                if !knob.contains('=') {
                    return Err(BridgeError::InvalidOption(format!(
                        "knob '{}' must be key=value",
                        knob
                    )));
                }
                NetworkOption::Knob(knob)
            }
            "tls_plugin" => NetworkOption::TlsPlugin(str_param(&name, value)?),
            "tls_cert_path" => NetworkOption::TlsCertPath(str_param(&name, value)?),
            "tls_key_path" => NetworkOption::TlsKeyPath(str_param(&name, value)?),
            "tls_verify_peers" => NetworkOption::TlsVerifyPeers(str_param(&name, value)?),
            "buggify_enable" => NetworkOption::BuggifyEnable,
            "buggify_disable" => NetworkOption::BuggifyDisable,
            "buggify_section_activated_probability" => {
                NetworkOption::BuggifySectionActivatedProbability(percent_param(&name, value)?)
            }
            "buggify_section_fired_probability" => {
                NetworkOption::BuggifySectionFiredProbability(percent_param(&name, value)?)
            }
            "disable_multi_version_client_api" => NetworkOption::DisableMultiVersionClientApi,
            "external_client_library" => {
                NetworkOption::ExternalClientLibrary(str_param(&name, value)?)
            }
            "external_client_directory" => {
                NetworkOption::ExternalClientDirectory(str_param(&name, value)?)
            }
            "disable_client_statistics_logging" => NetworkOption::DisableClientStatisticsLogging,
            "enable_slow_task_profiling" => NetworkOption::EnableSlowTaskProfiling,
            _ => {
                return Err(BridgeError::InvalidOption(format!(
                    "unknown option '{}'",
                    name
                )))
            }
        };

        if option.param_type() == ParamType::None && value.is_some() {
            return Err(BridgeError::InvalidOption(format!(
                "option '{}' takes no value",
                name
            )));
        }

        Ok(option)
    }
}

/// Parses `name` or `name=value`
impl FromStr for NetworkOption {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((name, value)) => NetworkOption::parse(name, Some(value)),
            None => NetworkOption::parse(s, None),
        }
    }
}

impl fmt::Display for NetworkOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            OptionValue::None => write!(f, "{}", self.name()),
            OptionValue::Int(n) => write!(f, "{}={}", self.name(), n),
            OptionValue::Str(s) => write!(f, "{}={}", self.name(), s),
        }
    }
}

fn str_param(name: &str, value: Option<&str>) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(BridgeError::InvalidOption(format!(
            "option '{}' requires a value",
            name
        ))),
    }
}

fn int_param(name: &str, value: Option<&str>) -> Result<i64> {
    let raw = str_param(name, value)?;
    raw.trim().parse::<i64>().map_err(|_| {
        BridgeError::InvalidOption(format!("option '{}' expects an integer, got '{}'", name, raw))
    })
}

fn percent_param(name: &str, value: Option<&str>) -> Result<i64> {
    let n = int_param(name, value)?;
    if !(0..=100).contains(&n) {
        return Err(BridgeError::InvalidOption(format!(
            "option '{}' expects 0..=100, got {}",
            name, n
        )));
    }
    Ok(n)
}
