// ── Insights ──
//
// Derived statistics over the incident list. One left-to-right pass fills
// insertion-ordered frequency maps; modes are then read off those maps,
// with ties going to the key that entered the map first.

use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;
use serde::Serialize;

use crate::types::{Incident, IncidentContext, IncidentType};

/// Counts keyed in first-seen order.
pub type FrequencyMap<K> = IndexMap<K, usize>;

/// Mean severity held as whole tenths, rounded half away from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AverageSeverity {
    tenths: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub average_severity: AverageSeverity,
    pub type_counts: FrequencyMap<IncidentType>,
    pub context_counts: FrequencyMap<IncidentContext>,
    pub person_counts: FrequencyMap<String>,
    pub most_common_type: (IncidentType, usize),
    pub most_common_context: (IncidentContext, usize),
    pub most_common_person: Option<(String, usize)>,
    pub positive_count: usize,
}

// ── Public API ──

/// Summarize the incident list. Returns `None` for an empty list.
pub fn compute_insights(incidents: &[Incident]) -> Option<Insights> {
    if incidents.is_empty() {
        return None;
    }

    let mut type_counts: FrequencyMap<IncidentType> = IndexMap::new();
    let mut context_counts: FrequencyMap<IncidentContext> = IndexMap::new();
    let mut person_counts: FrequencyMap<String> = IndexMap::new();
    let mut total_severity: u64 = 0;
    let mut positive_count = 0;

    for incident in incidents {
        *type_counts.entry(incident.kind).or_insert(0) += 1;
        *context_counts.entry(incident.context).or_insert(0) += 1;
        if let Some(person) = incident.person_label() {
            match person_counts.get_mut(person) {
                Some(count) => *count += 1,
                None => {
                    person_counts.insert(person.to_string(), 1);
                }
            }
        }
        total_severity += u64::from(incident.severity.get());
        if incident.kind == IncidentType::Positive {
            positive_count += 1;
        }
    }

    // Non-empty input guarantees at least one type and one context key.
    let most_common_type = mode(&type_counts)?;
    let most_common_context = mode(&context_counts)?;
    let most_common_person = mode(&person_counts);

    Some(Insights {
        average_severity: AverageSeverity::from_total(total_severity, incidents.len() as u64),
        type_counts,
        context_counts,
        person_counts,
        most_common_type,
        most_common_context,
        most_common_person,
        positive_count,
    })
}

/// The entry with the strictly highest count. On a tie the entry inserted
/// first wins, since a later entry must exceed the current best to replace it.
pub fn mode<K: Clone + Eq + Hash>(counts: &FrequencyMap<K>) -> Option<(K, usize)> {
    let mut best: Option<(&K, usize)> = None;
    for (key, &count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((key, count)),
        }
    }
    best.map(|(key, count)| (key.clone(), count))
}

impl AverageSeverity {
    /// `total / count` rounded to one decimal. `count` must be non-zero.
    fn from_total(total: u64, count: u64) -> Self {
        // round(total * 10 / count) for non-negative integers, halves rounding up
        let tenths = (total * 20 + count) / (count * 2);
        Self {
            tenths: tenths as u32,
        }
    }

    pub fn tenths(self) -> u32 {
        self.tenths
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.tenths) / 10.0
    }
}

impl fmt::Display for AverageSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tenths / 10, self.tenths % 10)
    }
}

impl Serialize for AverageSeverity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Tests ──
