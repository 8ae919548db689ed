// ── Filtering ──
//
// Selectors are either `all` or one concrete value. A selector string that
// names no known value is treated as `all`, so a bad filter never hides
// entries from the timeline.

use std::fmt;
use std::str::FromStr;

use crate::types::{Incident, IncidentContext, IncidentType};

pub const ALL_SELECTOR: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<T> {
    All,
    Only(T),
}

/// Type and context selectors, both of which must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IncidentFilter {
    pub kind: Selector<IncidentType>,
    pub context: Selector<IncidentContext>,
}

// ── Public API ──

impl<T> Default for Selector<T> {
    fn default() -> Self {
        Selector::All
    }
}

impl<T: PartialEq> Selector<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(wanted) => wanted == value,
        }
    }
}

impl<T: FromStr> Selector<T> {
    /// Parse a selector, falling back to `All` for unrecognized input.
    pub fn parse_lenient(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() || input.eq_ignore_ascii_case(ALL_SELECTOR) {
            return Selector::All;
        }
        match input.parse::<T>() {
            Ok(value) => Selector::Only(value),
            Err(_) => {
                log::warn!("unrecognized filter value {:?}, showing all", input);
                Selector::All
            }
        }
    }
}

impl IncidentFilter {
    pub fn new(kind: Selector<IncidentType>, context: Selector<IncidentContext>) -> Self {
        Self { kind, context }
    }

    /// Build a filter from raw selector strings.
    pub fn from_selectors(kind: &str, context: &str) -> Self {
        Self {
            kind: Selector::parse_lenient(kind),
            context: Selector::parse_lenient(context),
        }
    }

    pub fn matches(&self, incident: &Incident) -> bool {
        self.kind.matches(&incident.kind) && self.context.matches(&incident.context)
    }

    /// Matching incidents in their original order.
    pub fn apply<'a>(&self, incidents: &'a [Incident]) -> Vec<&'a Incident> {
        incidents.iter().filter(|i| self.matches(i)).collect()
    }
}

impl<T: fmt::Display> fmt::Display for Selector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => f.write_str(ALL_SELECTOR),
            Selector::Only(value) => write!(f, "{}", value),
        }
    }
}

// ── Tests ──
