//! Logical-role to physical-device resolution
//!
//! Stored profiles name devices the way an operator typed them months
//! ago; enumerated device names drift with driver reinstalls and
//! firmware updates. Resolution therefore runs an ordered chain of
//! matching rules, from exact identity down to token-level fuzzing.
//! Explicit caller intent always outranks stored configuration, and
//! exact identity outranks fuzzy guesses, so a customer receipt can
//! never silently land on the kitchen device.
//!
//! The whole pipeline is pure over its inputs; the live device list is
//! supplied by the caller.

use crate::config::PrinterProfile;
use crate::devices::PrinterDevice;
use crate::error::{EngineError, EngineResult};
use crate::receipt::PrinterRole;
use serde::Serialize;
use tracing::{debug, warn};

/// Which matching rule produced a resolution, kept for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    Substring,
    ModelTag,
    TokenFuzzy,
}

/// A profile joined with the concrete device it resolved to
///
/// Recomputed on every dispatch; never cached, since physical device
/// lists change under us.
#[derive(Debug, Clone)]
pub struct ResolvedPrinter {
    pub device: PrinterDevice,
    /// Absent when an explicit device name was accepted directly
    pub profile: Option<PrinterProfile>,
    pub strategy: MatchStrategy,
    pub available: bool,
}

/// Non-physical entries that enumeration may report ("save as file"
/// style pseudo-devices) and that must never receive a receipt.
pub fn is_pseudo_device(name: &str) -> bool {
    let n = name.to_lowercase();
    n.contains("pdf")
        || n.contains("xps")
        || n.contains("onenote")
        || n.contains("fax")
        || n.contains("save as file")
        || n == "nul"
}

/// Resolve a role (or an explicit device name) against the live device list
///
/// Precedence, first match wins:
/// 1. explicit name: exact (case-sensitive), then case-insensitive
///    substring in either direction; a miss falls through to profiles
/// 2. each enabled profile for the role, in stored order, trying
///    exact, substring, model-tag, then token-fuzzy matching
pub fn resolve(
    role: PrinterRole,
    explicit: Option<&str>,
    devices: &[PrinterDevice],
    profiles: &[PrinterProfile],
) -> EngineResult<ResolvedPrinter> {
    let physical: Vec<&PrinterDevice> = devices
        .iter()
        .filter(|d| !is_pseudo_device(&d.name))
        .collect();

    if let Some(wanted) = explicit {
        if let Some(device) = match_exact(wanted, &physical) {
            return Ok(resolved(device, None, MatchStrategy::Exact));
        }
        if let Some(device) = match_substring(wanted, &physical) {
            return Ok(resolved(device, None, MatchStrategy::Substring));
        }
        warn!(
            device = wanted,
            %role,
            "explicit device not enumerated, falling back to role profiles"
        );
    }

    for profile in profiles.iter().filter(|p| p.enabled && p.role == role) {
        if let Some(device) = match_exact(&profile.name, &physical) {
            return Ok(resolved(device, Some(profile.clone()), MatchStrategy::Exact));
        }
        if let Some(device) = match_substring(&profile.name, &physical) {
            return Ok(resolved(
                device,
                Some(profile.clone()),
                MatchStrategy::Substring,
            ));
        }
        if let Some(model) = profile.model.as_deref() {
            if let Some(device) = match_model_tag(model, &physical) {
                return Ok(resolved(
                    device,
                    Some(profile.clone()),
                    MatchStrategy::ModelTag,
                ));
            }
        }
        if let Some(device) = match_token_fuzzy(&profile.name, &physical) {
            return Ok(resolved(
                device,
                Some(profile.clone()),
                MatchStrategy::TokenFuzzy,
            ));
        }
        debug!(profile = %profile.name, %role, "profile matched no enumerated device");
    }

    Err(EngineError::PrinterNotFound { role })
}

fn resolved(
    device: &PrinterDevice,
    profile: Option<PrinterProfile>,
    strategy: MatchStrategy,
) -> ResolvedPrinter {
    debug!(device = %device.name, ?strategy, "printer resolved");
    ResolvedPrinter {
        available: device.online,
        device: device.clone(),
        profile,
        strategy,
    }
}

fn match_exact<'d>(wanted: &str, devices: &[&'d PrinterDevice]) -> Option<&'d PrinterDevice> {
    devices.iter().find(|d| d.name == wanted).copied()
}

/// Case-insensitive substring in either direction
fn match_substring<'d>(wanted: &str, devices: &[&'d PrinterDevice]) -> Option<&'d PrinterDevice> {
    let wanted_lower = wanted.to_lowercase();
    devices
        .iter()
        .find(|d| {
            let name_lower = d.name.to_lowercase();
            name_lower.contains(&wanted_lower) || wanted_lower.contains(&name_lower)
        })
        .copied()
}

/// Tag against device name or reported model, case-insensitive
fn match_model_tag<'d>(tag: &str, devices: &[&'d PrinterDevice]) -> Option<&'d PrinterDevice> {
    let tag_lower = tag.to_lowercase();
    devices
        .iter()
        .find(|d| {
            d.name.to_lowercase().contains(&tag_lower)
                || d.model
                    .as_deref()
                    .is_some_and(|m| m.to_lowercase().contains(&tag_lower))
        })
        .copied()
}

/// Any configured-name token of 3+ chars appearing in a device name
fn match_token_fuzzy<'d>(wanted: &str, devices: &[&'d PrinterDevice]) -> Option<&'d PrinterDevice> {
    let tokens: Vec<String> = wanted
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|t| t.len() >= 3)
        .map(|t| t.to_lowercase())
        .collect();

    if tokens.is_empty() {
        return None;
    }

    devices
        .iter()
        .find(|d| {
            let name_lower = d.name.to_lowercase();
            tokens.iter().any(|t| name_lower.contains(t))
        })
        .copied()
}
