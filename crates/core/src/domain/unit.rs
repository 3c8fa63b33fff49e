// systemd unit listing parser
//
// `systemctl list-units` prints one header line, the unit rows, and a
// seven line legend/footer:
//
//   UNIT            LOAD   ACTIVE SUB     DESCRIPTION
// ● foo.service     loaded failed failed  Foo daemon
//   bar.service     loaded active running Bar daemon
//
//   LOAD   = Reflects whether the unit definition was properly loaded.
//   ACTIVE = The high-level unit activation state, i.e. generalization of SUB.
//   SUB    = The low-level unit activation state, values depend on unit type.
//
//   2 loaded units listed.
//   To show all installed unit files use 'systemctl list-unit-files'.

use serde::Serialize;

use super::identifier::ServiceName;
use crate::error::Result;

/// Non-data lines at the top of `systemctl list-units` output
pub const HEADER_LINES: usize = 1;

/// Non-data lines at the bottom of `systemctl list-units` output
pub const FOOTER_LINES: usize = 7;

/// `--state=` filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    Failed,
    Loaded,
    Active,
    Inactive,
    Other(ServiceName),
}

impl UnitState {
    /// Any other state literal (`running`, `exited`, ...), allow-listed
    pub fn other(raw: &str) -> Result<Self> {
        Ok(match raw {
            "failed" => UnitState::Failed,
            "loaded" => UnitState::Loaded,
            "active" => UnitState::Active,
            "inactive" => UnitState::Inactive,
            _ => UnitState::Other(ServiceName::parse(raw)?),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            UnitState::Failed => "failed",
            UnitState::Loaded => "loaded",
            UnitState::Active => "active",
            UnitState::Inactive => "inactive",
            UnitState::Other(raw) => raw.as_str(),
        }
    }
}

/// One data row of `systemctl list-units`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceUnit {
    pub name: String,
    pub load: Option<String>,
    pub active: Option<String>,
    pub sub: Option<String>,
    pub description: Option<String>,
}

impl ServiceUnit {
    fn has_state(&self, state: &str) -> bool {
        [&self.load, &self.active, &self.sub]
            .iter()
            .any(|s| s.as_deref() == Some(state))
    }

    pub fn is_service(&self) -> bool {
        self.name.ends_with(".service")
    }
}

/// Classify one line as a unit row
///
/// The unit name is the first token holding an alphabetic character, which
/// skips the `●` marker column. Names made only of digits are not recognised.
pub fn parse_row(line: &str) -> Option<ServiceUnit> {
    // echoed command line from interactive shells
    if line.contains("systemctl") {
        return None;
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let idx = tokens
        .iter()
        .position(|t| t.chars().any(char::is_alphabetic))?;

    let column = |offset: usize| tokens.get(idx + offset).map(|s| s.to_string());
    let description = tokens
        .get(idx + 4..)
        .filter(|rest| !rest.is_empty())
        .map(|rest| rest.join(" "));

    Some(ServiceUnit {
        name: tokens[idx].to_string(),
        load: column(1),
        active: column(2),
        sub: column(3),
        description,
    })
}

/// Lines between the header and the footer
///
/// Exactly HEADER_LINES and FOOTER_LINES are dropped, whatever they contain.
pub fn strip_frame(output: &str) -> Vec<&str> {
    let lines: Vec<&str> = output.trim_end().lines().collect();
    if lines.len() <= HEADER_LINES + FOOTER_LINES {
        return Vec::new();
    }
    lines[HEADER_LINES..lines.len() - FOOTER_LINES].to_vec()
}

/// Unit rows of a framed `systemctl list-units` listing
pub fn parse_unit_table(output: &str) -> Vec<ServiceUnit> {
    strip_frame(output).into_iter().filter_map(parse_row).collect()
}

/// Names of service units reported in `failed` state
pub fn parse_failed_services(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(parse_row)
        .filter(|u| u.is_service() && u.has_state("failed"))
        .map(|u| u.name)
        .collect()
}

/// `None` for an empty listing, never `Some(vec![])`
pub fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
