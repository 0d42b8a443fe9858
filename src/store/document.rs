// 📄 Stored guest documents + legacy migration
//
// Older RSVPs were one document per event ("rsvpType" + "attendance") with a
// single optional companion ("hasCompanion", "companionName", ...). They are
// read into the current two-event, companion-list shape here, so the merge
// algorithm only ever sees lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::guest::{Attendance, BusChoice, Event, GuestRecord, Person};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestDocument {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceremony_attendance: Option<Attendance>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub celebration_attendance: Option<Attendance>,

    #[serde(default)]
    pub has_intolerance: bool,

    #[serde(default)]
    pub intolerance_type: Option<String>,

    #[serde(default)]
    pub companions: Vec<Person>,

    #[serde(default)]
    pub children_detail: Vec<Person>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bus: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    // ========================================================================
    // LEGACY FIELDS (kept on imported documents, never produced by from_record)
    // ========================================================================
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsvp_type: Option<Event>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance: Option<Attendance>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_companion: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion_has_intolerance: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion_intolerance_type: Option<String>,
}

impl GuestDocument {
    /// Current-shape document for a record.
    pub fn from_record(record: &GuestRecord) -> Self {
        GuestDocument {
            name: record.name.clone(),
            ceremony_attendance: Some(record.ceremony_attendance),
            celebration_attendance: Some(record.celebration_attendance),
            has_intolerance: record.has_intolerance,
            intolerance_type: Some(record.intolerance_type.clone()),
            companions: record.companions.clone(),
            children_detail: record.children_detail.clone(),
            children: Some(record.children.clone()).filter(|c| !c.is_empty()),
            bus: record.bus.map(|b| bus_code(b).to_string()),
            comment: Some(record.comment.clone()).filter(|c| !c.is_empty()),
            ..Default::default()
        }
    }

    /// Migrate (if needed) into a `GuestRecord`.
    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> GuestRecord {
        let mut ceremony = self.ceremony_attendance.unwrap_or_default();
        let mut celebration = self.celebration_attendance.unwrap_or_default();

        // One-event legacy answer
        if let (Some(event), Some(answer)) = (self.rsvp_type, self.attendance) {
            match event {
                Event::Ceremony if !ceremony.is_set() => ceremony = answer,
                Event::Celebration if !celebration.is_set() => celebration = answer,
                _ => {}
            }
        }

        // Single legacy companion folded into the list
        let mut companions = self.companions;
        let legacy_name = self
            .companion_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        if let Some(name) = legacy_name {
            if self.has_companion.unwrap_or(true) {
                let companion = Person {
                    name: name.to_string(),
                    has_intolerance: self.companion_has_intolerance.unwrap_or(false),
                    intolerance_type: self.companion_intolerance_type.unwrap_or_default(),
                };
                let key = companion.key();
                if !companions.iter().any(|c| c.key() == key) {
                    companions.insert(0, companion);
                }
            }
        }

        GuestRecord {
            id,
            name: self.name.trim().to_string(),
            ceremony_attendance: ceremony,
            celebration_attendance: celebration,
            has_intolerance: self.has_intolerance,
            intolerance_type: self.intolerance_type.unwrap_or_default(),
            companions,
            children_detail: self.children_detail,
            children: self.children.unwrap_or_default(),
            bus: self.bus.as_deref().and_then(parse_bus),
            comment: self.comment.unwrap_or_default(),
            created_at,
        }
    }
}

/// Accepts both the current codes and the original Spanish ones.
pub fn parse_bus(code: &str) -> Option<BusChoice> {
    match code.trim().to_lowercase().as_str() {
        "none" => Some(BusChoice::None),
        "outbound" | "ida" => Some(BusChoice::Outbound),
        "return" | "vuelta" => Some(BusChoice::Return),
        "both" | "ambos" => Some(BusChoice::Both),
        _ => None,
    }
}

fn bus_code(bus: BusChoice) -> &'static str {
    match bus {
        BusChoice::None => "none",
        BusChoice::Outbound => "outbound",
        BusChoice::Return => "return",
        BusChoice::Both => "both",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guest::GuestInput;

    #[test]
    fn test_legacy_document_migrates_to_list_shape() {
        let json = r#"{
            "rsvpType": "celebration",
            "name": "Ana Gomez Ruiz",
            "attendance": "yes",
            "hasIntolerance": true,
            "intoleranceType": "Gluten",
            "hasCompanion": true,
            "companionName": "Luis Ruiz",
            "companionHasIntolerance": true,
            "companionIntoleranceType": "Marisco",
            "children": "2 niños",
            "bus": "ambos"
        }"#;

        let doc: GuestDocument = serde_json::from_str(json).unwrap();
        let record = doc.into_record("legacy-1".to_string(), Utc::now());

        assert_eq!(record.celebration_attendance, Attendance::Yes);
        assert_eq!(record.ceremony_attendance, Attendance::Unset);
        assert_eq!(record.companions.len(), 1);
        assert_eq!(record.companions[0].name, "Luis Ruiz");
        assert!(record.companions[0].has_intolerance);
        assert_eq!(record.companions[0].intolerance_type, "Marisco");
        assert_eq!(record.intolerance_type, "Gluten");
        assert_eq!(record.children, "2 niños");
        assert_eq!(record.bus, Some(BusChoice::Both));
    }

    #[test]
    fn test_declined_legacy_companion_is_ignored() {
        let json = r#"{"name": "Maria Pelaez", "hasCompanion": false, "companionName": "Old Name"}"#;

        let doc: GuestDocument = serde_json::from_str(json).unwrap();
        let record = doc.into_record("legacy-2".to_string(), Utc::now());

        assert!(record.companions.is_empty());
    }

    #[test]
    fn test_current_shape_survives_document_round() {
        let input = GuestInput::new("Ana Gomez Ruiz")
            .with_attendance(Event::Ceremony, Attendance::Yes)
            .with_companion(Person::with_intolerance("Luis Ruiz", "lactose"));
        let mut record = GuestRecord::from_input("r1".to_string(), input, Utc::now());
        record.bus = Some(BusChoice::Outbound);

        let json = serde_json::to_string(&GuestDocument::from_record(&record)).unwrap();
        assert!(!json.contains("rsvpType"));

        let doc: GuestDocument = serde_json::from_str(&json).unwrap();
        let back = doc.into_record(record.id.clone(), record.created_at);

        assert_eq!(back, record);
    }
}
