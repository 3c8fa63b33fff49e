// Validated identifiers interpolated into remote commands

use serde::Serialize;
use std::fmt;

use crate::error::{ProbeError, Result};

/// Longest identifier accepted (systemd caps unit names at 256 bytes)
pub const MAX_IDENTIFIER_LEN: usize = 256;

/// Allow-list for anything spliced unquoted into a shell command
///
/// Accepts `[A-Za-z0-9@._:+-]`, rejects a leading `-` so the value can never
/// be read as an option by `systemctl` or `killall`.
fn validate(kind: &str, raw: &str) -> Result<()> {
    if raw.is_empty() {
        return Err(ProbeError::invalid_argument(format!("{kind} must not be empty")));
    }
    if raw.len() > MAX_IDENTIFIER_LEN {
        return Err(ProbeError::invalid_argument(format!(
            "{kind} exceeds {MAX_IDENTIFIER_LEN} bytes"
        )));
    }
    if raw.starts_with('-') {
        return Err(ProbeError::invalid_argument(format!(
            "{kind} must not start with '-': {raw:?}"
        )));
    }
    if let Some(bad) = raw
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | ':' | '+' | '-')))
    {
        return Err(ProbeError::invalid_argument(format!(
            "{kind} contains disallowed character {bad:?}: {raw:?}"
        )));
    }
    Ok(())
}

/// systemd unit name, e.g. `sshd.service`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn parse(raw: &str) -> Result<Self> {
        validate("service name", raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process name matched by `killall`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DaemonName(String);

impl DaemonName {
    pub fn parse(raw: &str) -> Result<Self> {
        validate("daemon name", raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DaemonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a whole batch up front so nothing is sent when any entry is bad
pub fn parse_all<T, S: AsRef<str>>(
    kind: &str,
    raw: &[S],
    parse: impl Fn(&str) -> Result<T>,
) -> Result<Vec<T>> {
    if raw.is_empty() {
        return Err(ProbeError::invalid_argument(format!("{kind} list is empty")));
    }
    raw.iter().map(|s| parse(s.as_ref())).collect()
}
