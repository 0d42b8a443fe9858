// 💌 Guest Records - one household per RSVP entry
//
// Identity = store-assigned id (never changes)
// Values   = attendance, companions, children, bus, comment (merged over time)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::normalize::normalize_name;

// ============================================================================
// EVENTS & ANSWERS
// ============================================================================

/// The two events a guest can RSVP to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Event {
    Ceremony,
    Celebration,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Ceremony => "ceremony",
            Event::Celebration => "celebration",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Event {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ceremony" => Ok(Event::Ceremony),
            "celebration" => Ok(Event::Celebration),
            other => Err(format!("unknown event: {}", other)),
        }
    }
}

/// Attendance answer for a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attendance {
    #[default]
    Unset,
    Yes,
    No,
}

impl Attendance {
    pub fn is_set(&self) -> bool {
        *self != Attendance::Unset
    }

    pub fn is_yes(&self) -> bool {
        *self == Attendance::Yes
    }
}

/// Shuttle bus preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusChoice {
    None,
    Outbound,
    Return,
    Both,
}

impl BusChoice {
    pub fn takes_outbound(&self) -> bool {
        matches!(self, BusChoice::Outbound | BusChoice::Both)
    }

    pub fn takes_return(&self) -> bool {
        matches!(self, BusChoice::Return | BusChoice::Both)
    }
}

// ============================================================================
// PERSON (companion / child sub-record)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub name: String,

    #[serde(default)]
    pub has_intolerance: bool,

    #[serde(default)]
    pub intolerance_type: String,
}

impl Person {
    pub fn new(name: &str) -> Self {
        Person {
            name: name.to_string(),
            has_intolerance: false,
            intolerance_type: String::new(),
        }
    }

    pub fn with_intolerance(name: &str, intolerance_type: &str) -> Self {
        Person {
            name: name.to_string(),
            has_intolerance: true,
            intolerance_type: intolerance_type.to_string(),
        }
    }

    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }
}

// ============================================================================
// GUEST INPUT (candidate payload, no identity yet)
// ============================================================================

/// What the RSVP form submits: a guest record without `id` / `created_at`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestInput {
    pub name: String,

    #[serde(default)]
    pub ceremony_attendance: Attendance,

    #[serde(default)]
    pub celebration_attendance: Attendance,

    #[serde(default)]
    pub has_intolerance: bool,

    #[serde(default)]
    pub intolerance_type: String,

    #[serde(default)]
    pub companions: Vec<Person>,

    #[serde(default)]
    pub children_detail: Vec<Person>,

    #[serde(default)]
    pub bus: Option<BusChoice>,

    #[serde(default)]
    pub comment: String,
}

impl GuestInput {
    pub fn new(name: &str) -> Self {
        GuestInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn attendance(&self, event: Event) -> Attendance {
        match event {
            Event::Ceremony => self.ceremony_attendance,
            Event::Celebration => self.celebration_attendance,
        }
    }

    pub fn with_attendance(mut self, event: Event, attendance: Attendance) -> Self {
        match event {
            Event::Ceremony => self.ceremony_attendance = attendance,
            Event::Celebration => self.celebration_attendance = attendance,
        }
        self
    }

    pub fn with_companion(mut self, companion: Person) -> Self {
        self.companions.push(companion);
        self
    }

    pub fn with_child(mut self, child: Person) -> Self {
        self.children_detail.push(child);
        self
    }

    /// The submitter as a sub-record, carrying their own intolerance data.
    pub fn as_person(&self) -> Person {
        Person {
            name: self.name.trim().to_string(),
            has_intolerance: self.has_intolerance,
            intolerance_type: self.intolerance_type.clone(),
        }
    }
}

// ============================================================================
// GUEST RECORD (persisted household)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestRecord {
    /// Store-assigned identity - NEVER changes
    pub id: String,

    pub name: String,
    pub ceremony_attendance: Attendance,
    pub celebration_attendance: Attendance,
    pub has_intolerance: bool,
    pub intolerance_type: String,
    pub companions: Vec<Person>,
    pub children_detail: Vec<Person>,

    /// Free-text children summary kept for older dashboards
    pub children: String,

    pub bus: Option<BusChoice>,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl GuestRecord {
    /// Build a fresh record from a candidate payload.
    pub fn from_input(id: String, input: GuestInput, created_at: DateTime<Utc>) -> Self {
        let children = children_summary(input.children_detail.len());
        GuestRecord {
            id,
            name: input.name.trim().to_string(),
            ceremony_attendance: input.ceremony_attendance,
            celebration_attendance: input.celebration_attendance,
            has_intolerance: input.has_intolerance,
            intolerance_type: input.intolerance_type,
            companions: input.companions,
            children_detail: input.children_detail,
            children,
            bus: input.bus,
            comment: input.comment,
            created_at,
        }
    }

    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn attendance(&self, event: Event) -> Attendance {
        match event {
            Event::Ceremony => self.ceremony_attendance,
            Event::Celebration => self.celebration_attendance,
        }
    }

    /// Every normalized name this household owns: primary, companions, children.
    pub fn owned_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(1 + self.companions.len() + self.children_detail.len());
        names.push(self.key());
        names.extend(self.companions.iter().map(Person::key));
        names.extend(self.children_detail.iter().map(Person::key));
        names.retain(|n| !n.is_empty());
        names
    }

    pub fn owns(&self, key: &str) -> bool {
        !key.is_empty() && self.owned_names().iter().any(|n| n == key)
    }

    /// Number of people in the household (primary + companions + children).
    pub fn headcount(&self) -> usize {
        1 + self.companions.len() + self.children_detail.len()
    }

    /// Apply a partial update. `id` and `created_at` are never touched.
    pub fn apply(&mut self, patch: &GuestPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(a) = patch.ceremony_attendance {
            self.ceremony_attendance = a;
        }
        if let Some(a) = patch.celebration_attendance {
            self.celebration_attendance = a;
        }
        if let Some(flag) = patch.has_intolerance {
            self.has_intolerance = flag;
        }
        if let Some(kind) = &patch.intolerance_type {
            self.intolerance_type = kind.clone();
        }
        if let Some(companions) = &patch.companions {
            self.companions = companions.clone();
        }
        if let Some(children) = &patch.children_detail {
            self.children_detail = children.clone();
        }
        if let Some(summary) = &patch.children {
            self.children = summary.clone();
        }
        if let Some(bus) = patch.bus {
            self.bus = bus;
        }
        if let Some(comment) = &patch.comment {
            self.comment = comment.clone();
        }
    }
}

// ============================================================================
// GUEST PATCH (partial update)
// ============================================================================

/// Partial record sent to `GuestStore::update`. `None` leaves a field as is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ceremony_attendance: Option<Attendance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub celebration_attendance: Option<Attendance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_intolerance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intolerance_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companions: Option<Vec<Person>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children_detail: Option<Vec<Person>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<String>,
    /// `Some(None)` clears the bus choice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus: Option<Option<BusChoice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl GuestPatch {
    pub fn is_empty(&self) -> bool {
        *self == GuestPatch::default()
    }
}

/// Count-based summary written into the legacy `children` field.
pub fn children_summary(count: usize) -> String {
    match count {
        0 => String::new(),
        1 => "1 child".to_string(),
        n => format!("{} children", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> GuestRecord {
        let input = GuestInput::new("Ana Gómez Ruiz")
            .with_attendance(Event::Ceremony, Attendance::Yes)
            .with_companion(Person::new("Luis Ruiz"))
            .with_child(Person::with_intolerance("Pablo Gómez", "lactose"));
        GuestRecord::from_input("r1".to_string(), input, Utc::now())
    }

    #[test]
    fn test_owned_names_cover_household() {
        let record = sample_record();

        assert_eq!(
            record.owned_names(),
            vec!["ana gomez ruiz", "luis ruiz", "pablo gomez"]
        );
        assert!(record.owns("luis ruiz"));
        assert!(!record.owns("maria pelaez"));
        assert!(!record.owns(""));
        assert_eq!(record.headcount(), 3);
        assert_eq!(record.children, "1 child");
    }

    #[test]
    fn test_apply_patch_keeps_identity() {
        let mut record = sample_record();
        let created_at = record.created_at;

        record.apply(&GuestPatch {
            celebration_attendance: Some(Attendance::No),
            comment: Some("See you there".to_string()),
            ..Default::default()
        });

        assert_eq!(record.id, "r1");
        assert_eq!(record.created_at, created_at);
        assert_eq!(record.celebration_attendance, Attendance::No);
        assert_eq!(record.ceremony_attendance, Attendance::Yes);
        assert_eq!(record.comment, "See you there");
    }

    #[test]
    fn test_input_deserializes_from_form_json() {
        let json = r#"{
            "name": "Maria Pelaez",
            "celebrationAttendance": "yes",
            "companions": [{"name": "Ana Gomez Ruiz"}],
            "bus": "both"
        }"#;

        let input: GuestInput = serde_json::from_str(json).unwrap();

        assert_eq!(input.celebration_attendance, Attendance::Yes);
        assert_eq!(input.ceremony_attendance, Attendance::Unset);
        assert_eq!(input.companions.len(), 1);
        assert!(!input.companions[0].has_intolerance);
        assert_eq!(input.bus, Some(BusChoice::Both));
    }

    #[test]
    fn test_event_parsing() {
        assert_eq!("Ceremony".parse::<Event>(), Ok(Event::Ceremony));
        assert_eq!(" celebration ".parse::<Event>(), Ok(Event::Celebration));
        assert!("party".parse::<Event>().is_err());
    }
}
