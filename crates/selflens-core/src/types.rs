// ── Types ──
//
// Field names on the wire follow the journal's persisted format:
// `id`, `person`, `type`, `context`, `severity`, `emotions`, `date`,
// `timestamp`, `notes`. Existing dumps load unchanged.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SelfLensError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum IncidentType {
    Gaslighting,
    Betrayal,
    Gossip,
    Rude,
    Manipulation,
    Positive,
    BoundaryViolation,
    Microaggression,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IncidentContext {
    Work,
    Family,
    Friends,
    Romantic,
    Strangers,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Sad,
    Scared,
    Exhausted,
    Confused,
    Relieved,
    Grateful,
}

/// Severity score, always within 1..=10.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "i64", into = "u8")]
pub struct Severity(u8);

/// Emotions felt during an incident. No duplicates; equality ignores order,
/// but selection order is kept for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Emotion>", into = "Vec<Emotion>")]
pub struct EmotionSet(Vec<Emotion>);

/// Creation-time identifier in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct IncidentId(pub i64);

/// A single logged experience.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Incident {
    pub id: IncidentId,
    #[serde(
        default,
        serialize_with = "blank_if_none",
        deserialize_with = "none_if_blank"
    )]
    pub person: Option<String>,
    #[serde(rename = "type")]
    pub kind: IncidentType,
    pub context: IncidentContext,
    pub severity: Severity,
    #[serde(default)]
    pub emotions: EmotionSet,
    #[serde(rename = "date")]
    pub occurred_on: NaiveDate,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        serialize_with = "blank_if_none",
        deserialize_with = "none_if_blank"
    )]
    pub notes: Option<String>,
}

/// The new-incident form before it is committed to the journal.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentDraft {
    pub person: Option<String>,
    pub kind: IncidentType,
    pub context: IncidentContext,
    pub severity: Severity,
    pub emotions: EmotionSet,
    pub occurred_on: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Profile {
    pub username: String,
    /// Avatar image URL.
    pub avatar: String,
    pub name: String,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

// ── Helpers ──

static LAST_ISSUED_ID: AtomicI64 = AtomicI64::new(0);

fn blank_if_none<S>(value: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

fn none_if_blank<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(non_blank(value))
}

/// Collapse empty labels to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl IncidentType {
    pub const ALL: [IncidentType; 9] = [
        IncidentType::Gaslighting,
        IncidentType::Betrayal,
        IncidentType::Gossip,
        IncidentType::Rude,
        IncidentType::Manipulation,
        IncidentType::Positive,
        IncidentType::BoundaryViolation,
        IncidentType::Microaggression,
        IncidentType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentType::Gaslighting => "gaslighting",
            IncidentType::Betrayal => "betrayal",
            IncidentType::Gossip => "gossip",
            IncidentType::Rude => "rude",
            IncidentType::Manipulation => "manipulation",
            IncidentType::Positive => "positive",
            IncidentType::BoundaryViolation => "boundary-violation",
            IncidentType::Microaggression => "microaggression",
            IncidentType::Other => "other",
        }
    }
}

impl IncidentContext {
    pub const ALL: [IncidentContext; 6] = [
        IncidentContext::Work,
        IncidentContext::Family,
        IncidentContext::Friends,
        IncidentContext::Romantic,
        IncidentContext::Strangers,
        IncidentContext::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentContext::Work => "work",
            IncidentContext::Family => "family",
            IncidentContext::Friends => "friends",
            IncidentContext::Romantic => "romantic",
            IncidentContext::Strangers => "strangers",
            IncidentContext::Other => "other",
        }
    }
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Sad,
        Emotion::Scared,
        Emotion::Exhausted,
        Emotion::Confused,
        Emotion::Relieved,
        Emotion::Grateful,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Sad => "sad",
            Emotion::Scared => "scared",
            Emotion::Exhausted => "exhausted",
            Emotion::Confused => "confused",
            Emotion::Relieved => "relieved",
            Emotion::Grateful => "grateful",
        }
    }
}

impl Severity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: i64) -> Result<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(SelfLensError::InvalidSeverity(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<i64> for Severity {
    type Error = SelfLensError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.0
    }
}

impl EmotionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an emotion. Returns `false` if it was already present.
    pub fn insert(&mut self, emotion: Emotion) -> bool {
        if self.contains(emotion) {
            return false;
        }
        self.0.push(emotion);
        true
    }

    pub fn remove(&mut self, emotion: Emotion) -> bool {
        let before = self.0.len();
        self.0.retain(|e| *e != emotion);
        self.0.len() != before
    }

    /// Select the emotion if absent, deselect it if present.
    pub fn toggle(&mut self, emotion: Emotion) {
        if !self.remove(emotion) {
            self.0.push(emotion);
        }
    }

    pub fn contains(&self, emotion: Emotion) -> bool {
        self.0.contains(&emotion)
    }

    pub fn iter(&self) -> impl Iterator<Item = Emotion> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Join emotion names in selection order.
    pub fn join(&self, separator: &str) -> String {
        self.0
            .iter()
            .map(|e| e.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl PartialEq for EmotionSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|e| other.contains(*e))
    }
}

impl Eq for EmotionSet {}

impl TryFrom<Vec<Emotion>> for EmotionSet {
    type Error = SelfLensError;

    fn try_from(emotions: Vec<Emotion>) -> Result<Self> {
        let mut set = EmotionSet::new();
        for emotion in emotions {
            if !set.insert(emotion) {
                return Err(SelfLensError::DuplicateEmotion(emotion.to_string()));
            }
        }
        Ok(set)
    }
}

impl From<EmotionSet> for Vec<Emotion> {
    fn from(set: EmotionSet) -> Self {
        set.0
    }
}

impl FromIterator<Emotion> for EmotionSet {
    fn from_iter<I: IntoIterator<Item = Emotion>>(iter: I) -> Self {
        let mut set = EmotionSet::new();
        for emotion in iter {
            set.insert(emotion);
        }
        set
    }
}

impl IncidentId {
    /// Issue an id from the creation time. Ids are strictly increasing
    /// within a process even when the clock stalls or goes backwards.
    pub fn generate(created_at: DateTime<Utc>) -> Self {
        let candidate = created_at.timestamp_millis();
        let mut last = LAST_ISSUED_ID.load(Ordering::Relaxed);
        loop {
            let next = candidate.max(last + 1);
            match LAST_ISSUED_ID.compare_exchange_weak(
                last,
                next,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Self(next),
                Err(actual) => last = actual,
            }
        }
    }
}

impl IncidentDraft {
    /// An empty form dated `occurred_on`, with the form's default choices.
    pub fn new(occurred_on: NaiveDate) -> Self {
        Self {
            person: None,
            kind: IncidentType::Gaslighting,
            context: IncidentContext::Other,
            severity: Severity::default(),
            emotions: EmotionSet::new(),
            occurred_on,
            notes: None,
        }
    }

    pub fn toggle_emotion(&mut self, emotion: Emotion) {
        self.emotions.toggle(emotion);
    }

    /// Commit the draft, assigning an id and creation timestamp.
    pub fn into_incident(self, created_at: DateTime<Utc>) -> Incident {
        Incident {
            id: IncidentId::generate(created_at),
            person: non_blank(self.person),
            kind: self.kind,
            context: self.context,
            severity: self.severity,
            emotions: self.emotions,
            occurred_on: self.occurred_on,
            created_at,
            notes: non_blank(self.notes),
        }
    }
}

impl Default for IncidentDraft {
    fn default() -> Self {
        Self::new(Utc::now().date_naive())
    }
}

impl Incident {
    /// The person label, if present and non-empty.
    pub fn person_label(&self) -> Option<&str> {
        self.person.as_deref().filter(|p| !p.is_empty())
    }
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

// ── Parsing and Display ──

impl FromStr for IncidentType {
    type Err = SelfLensError;

    fn from_str(s: &str) -> Result<Self> {
        IncidentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SelfLensError::UnknownType(s.to_string()))
    }
}

impl FromStr for IncidentContext {
    type Err = SelfLensError;

    fn from_str(s: &str) -> Result<Self> {
        IncidentContext::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| SelfLensError::UnknownContext(s.to_string()))
    }
}

impl FromStr for Emotion {
    type Err = SelfLensError;

    fn from_str(s: &str) -> Result<Self> {
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| SelfLensError::UnknownEmotion(s.to_string()))
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for IncidentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_json() -> &'static str {
        r#"{
            "person": "Sam",
            "type": "boundary-violation",
            "context": "family",
            "severity": 7,
            "emotions": ["angry", "exhausted"],
            "date": "2026-03-14",
            "notes": "",
            "id": 1773446400000,
            "timestamp": "2026-03-14T00:00:00.000Z"
        }"#
    }

    #[test]
    fn test_parse_persisted_incident() {
        let incident: Incident = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(incident.id, IncidentId(1_773_446_400_000));
        assert_eq!(incident.person.as_deref(), Some("Sam"));
        assert_eq!(incident.kind, IncidentType::BoundaryViolation);
        assert_eq!(incident.context, IncidentContext::Family);
        assert_eq!(incident.severity.get(), 7);
        assert!(incident.emotions.contains(Emotion::Angry));
        assert_eq!(incident.occurred_on, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(incident.notes, None);
    }

    #[test]
    fn test_blank_person_serializes_as_empty_string() {
        let mut incident: Incident = serde_json::from_str(sample_json()).unwrap();
        incident.person = None;
        let value = serde_json::to_value(&incident).unwrap();
        assert_eq!(value["person"], "");
        assert_eq!(value["notes"], "");
        assert_eq!(value["type"], "boundary-violation");
    }

    #[test]
    fn test_severity_out_of_range_is_rejected() {
        assert!(Severity::new(0).is_err());
        assert!(Severity::new(11).is_err());
        assert_eq!(Severity::new(10).unwrap().get(), 10);

        let json = sample_json().replace("\"severity\": 7", "\"severity\": 12");
        let err = serde_json::from_str::<Incident>(&json).unwrap_err();
        assert!(err.to_string().contains("severity"));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let json = sample_json().replace("boundary-violation", "annoying");
        assert!(serde_json::from_str::<Incident>(&json).is_err());
    }

    #[test]
    fn test_duplicate_emotions_are_rejected() {
        let json = sample_json().replace(r#"["angry", "exhausted"]"#, r#"["sad", "sad"]"#);
        let err = serde_json::from_str::<Incident>(&json).unwrap_err();
        assert!(err.to_string().contains("twice"));
    }

    #[test]
    fn test_emotion_set_ignores_order_for_equality() {
        let a: EmotionSet = [Emotion::Sad, Emotion::Angry].into_iter().collect();
        let b: EmotionSet = [Emotion::Angry, Emotion::Sad].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.join("; "), "sad; angry");
    }

    #[test]
    fn test_toggle_emotion() {
        let mut draft = IncidentDraft::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        draft.toggle_emotion(Emotion::Scared);
        draft.toggle_emotion(Emotion::Relieved);
        draft.toggle_emotion(Emotion::Scared);
        assert_eq!(draft.emotions.iter().collect::<Vec<_>>(), vec![Emotion::Relieved]);
    }

    #[test]
    fn test_draft_defaults() {
        let draft = IncidentDraft::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(draft.kind, IncidentType::Gaslighting);
        assert_eq!(draft.context, IncidentContext::Other);
        assert_eq!(draft.severity.get(), 5);
        assert!(draft.emotions.is_empty());
    }

    #[test]
    fn test_ids_never_collide_within_process() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let first = IncidentId::generate(at);
        let second = IncidentId::generate(at);
        let third = IncidentId::generate(at);
        assert!(second > first);
        assert!(third > second);
    }

    #[test]
    fn test_draft_normalizes_blank_labels() {
        let mut draft = IncidentDraft::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        draft.person = Some(String::new());
        draft.notes = Some("kept".to_string());
        let incident = draft.into_incident(Utc::now());
        assert_eq!(incident.person, None);
        assert_eq!(incident.person_label(), None);
        assert_eq!(incident.notes.as_deref(), Some("kept"));
    }

    #[test]
    fn test_enum_names_round_trip() {
        for kind in IncidentType::ALL {
            assert_eq!(kind.as_str().parse::<IncidentType>().unwrap(), kind);
        }
        for context in IncidentContext::ALL {
            assert_eq!(context.as_str().parse::<IncidentContext>().unwrap(), context);
        }
        for emotion in Emotion::ALL {
            assert_eq!(emotion.as_str().parse::<Emotion>().unwrap(), emotion);
        }
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::default(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled().as_str(), "dark");
    }
}
