// 📊 Dashboard counters computed from a directory snapshot

use serde::{Deserialize, Serialize};

use crate::guest::{Event, GuestRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStats {
    /// Number of records
    pub households: usize,

    /// People (primary + companions + children) confirmed per event
    pub ceremony_guests: usize,
    pub celebration_guests: usize,

    /// Bus seats, counted for households coming to the celebration
    pub bus_outbound: usize,
    pub bus_return: usize,

    /// People with a dietary intolerance among confirmed households
    pub intolerances: usize,

    /// Children listed across all households
    pub children: usize,
}

impl DirectoryStats {
    pub fn from_records(records: &[GuestRecord]) -> Self {
        let mut stats = DirectoryStats {
            households: records.len(),
            ..Default::default()
        };

        for record in records {
            let heads = record.headcount();
            let at_ceremony = record.attendance(Event::Ceremony).is_yes();
            let at_celebration = record.attendance(Event::Celebration).is_yes();

            if at_ceremony {
                stats.ceremony_guests += heads;
            }
            if at_celebration {
                stats.celebration_guests += heads;
                if let Some(bus) = record.bus {
                    if bus.takes_outbound() {
                        stats.bus_outbound += heads;
                    }
                    if bus.takes_return() {
                        stats.bus_return += heads;
                    }
                }
            }
            if at_ceremony || at_celebration {
                stats.intolerances += usize::from(record.has_intolerance)
                    + record.companions.iter().filter(|p| p.has_intolerance).count()
                    + record.children_detail.iter().filter(|p| p.has_intolerance).count();
            }

            stats.children += record.children_detail.len();
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guest::{Attendance, BusChoice, GuestInput, Person};
    use chrono::Utc;

    #[test]
    fn test_counts_people_not_records() {
        let mut ana = GuestRecord::from_input(
            "r1".to_string(),
            GuestInput::new("Ana Gomez Ruiz")
                .with_attendance(Event::Ceremony, Attendance::Yes)
                .with_attendance(Event::Celebration, Attendance::Yes)
                .with_companion(Person::with_intolerance("Luis Ruiz", "gluten"))
                .with_child(Person::new("Pablo Gomez")),
            Utc::now(),
        );
        ana.bus = Some(BusChoice::Outbound);

        let mut maria = GuestRecord::from_input(
            "r2".to_string(),
            GuestInput::new("Maria Pelaez").with_attendance(Event::Celebration, Attendance::No),
            Utc::now(),
        );
        maria.has_intolerance = true;
        maria.bus = Some(BusChoice::Both);

        let stats = DirectoryStats::from_records(&[ana, maria]);

        assert_eq!(stats.households, 2);
        assert_eq!(stats.ceremony_guests, 3);
        assert_eq!(stats.celebration_guests, 3);
        assert_eq!(stats.bus_outbound, 3);
        assert_eq!(stats.bus_return, 0);
        assert_eq!(stats.intolerances, 1);
        assert_eq!(stats.children, 1);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(DirectoryStats::default()).unwrap();

        assert_eq!(json["celebrationGuests"], 0);
        assert_eq!(json["busOutbound"], 0);
        assert!(json.get("celebration_guests").is_none());
    }

    #[test]
    fn test_empty_directory() {
        assert_eq!(DirectoryStats::from_records(&[]), DirectoryStats::default());
    }
}
