// ── Export Formats ──
//
// Two outputs:
// - a JSON backup holding the profile and the full incident list
// - a CSV sheet, every cell quoted, embedded quotes doubled

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Incident, Profile};

pub const BACKUP_FILE_NAME: &str = "selflens_backup.json";
pub const CSV_FILE_NAME: &str = "selflens_export.csv";

const CSV_HEADERS: [&str; 7] = [
    "Date", "Person", "Type", "Context", "Severity", "Emotions", "Notes",
];
const EMOTION_SEPARATOR: &str = "; ";

/// The whole journal as a single document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JournalDocument {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub incidents: Vec<Incident>,
}

// ── Public API ──

/// Serialize a document as pretty-printed JSON.
pub fn to_json(document: &JournalDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Parse a document produced by [`to_json`].
pub fn from_json(input: &str) -> Result<JournalDocument> {
    Ok(serde_json::from_str(input)?)
}

/// Render incidents as CSV in list order. Rows are `\n`-separated with no
/// trailing newline.
pub fn to_csv(incidents: &[Incident]) -> String {
    let mut lines = Vec::with_capacity(incidents.len() + 1);
    lines.push(CSV_HEADERS.join(","));

    for incident in incidents {
        let cells = [
            incident.occurred_on.format("%Y-%m-%d").to_string(),
            incident.person.clone().unwrap_or_default(),
            incident.kind.to_string(),
            incident.context.to_string(),
            incident.severity.to_string(),
            incident.emotions.join(EMOTION_SEPARATOR),
            incident.notes.clone().unwrap_or_default(),
        ];
        let row: Vec<String> = cells.iter().map(|cell| quote(cell)).collect();
        lines.push(row.join(","));
    }

    lines.join("\n")
}

// ── Helpers ──

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Emotion, EmotionSet, IncidentContext, IncidentId, IncidentType, Severity};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn sample_incidents() -> Vec<Incident> {
        vec![
            Incident {
                id: IncidentId(1_767_261_600_000),
                person: Some("Sam".to_string()),
                kind: IncidentType::Gaslighting,
                context: IncidentContext::Family,
                severity: Severity::new(8).unwrap(),
                emotions: [Emotion::Confused, Emotion::Angry].into_iter().collect(),
                occurred_on: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                created_at: Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap(),
                notes: Some("said \"that never happened\"".to_string()),
            },
            Incident {
                id: IncidentId(1_767_175_200_000),
                person: None,
                kind: IncidentType::Positive,
                context: IncidentContext::Work,
                severity: Severity::new(2).unwrap(),
                emotions: EmotionSet::new(),
                occurred_on: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
                created_at: Utc.with_ymd_and_hms(2025, 12, 31, 10, 0, 0).unwrap(),
                notes: None,
            },
        ]
    }

    #[test]
    fn test_csv_export() {
        let csv = to_csv(&sample_incidents());
        insta::assert_snapshot!(csv, @r#"
        Date,Person,Type,Context,Severity,Emotions,Notes
        "2026-01-01","Sam","gaslighting","family","8","confused; angry","said ""that never happened"""
        "2025-12-31","","positive","work","2","",""
        "#);
    }

    #[test]
    fn test_csv_of_empty_list_is_header_only() {
        assert_eq!(to_csv(&[]), "Date,Person,Type,Context,Severity,Emotions,Notes");
    }

    #[test]
    fn test_csv_quotes_every_text_cell() {
        let mut incidents = sample_incidents();
        incidents[1].person = Some("the \"boss\"".to_string());
        let csv = to_csv(&incidents[1..]);
        assert!(csv.contains(r#""the ""boss""","positive""#));
    }

    #[test]
    fn test_json_round_trip() {
        let document = JournalDocument {
            profile: Profile {
                username: "lens".to_string(),
                avatar: "https://example.com/a.png".to_string(),
                name: "Robin".to_string(),
                notes: "trying to notice patterns".to_string(),
            },
            incidents: sample_incidents(),
        };

        let json = to_json(&document).unwrap();
        let parsed = from_json(&json).unwrap();
        assert_eq!(parsed, document);
        assert_eq!(parsed.incidents[0].emotions.join(", "), "confused, angry");
    }

    #[test]
    fn test_json_missing_sections_default() {
        let parsed = from_json("{}").unwrap();
        assert_eq!(parsed, JournalDocument::default());
    }

    #[test]
    fn test_json_rejects_garbage() {
        assert!(from_json("not json").is_err());
    }
}
