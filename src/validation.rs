// 📐 Candidate Validation - reject malformed RSVPs before touching the store

use serde::{Deserialize, Serialize};

use crate::guest::{Event, GuestInput, Person};

// ============================================================================
// VALIDATION ISSUE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub type ValidationResult = Result<(), Vec<ValidationIssue>>;

/// Minimum characters in the primary name (after trimming)
const MIN_NAME_CHARS: usize = 2;

// ============================================================================
// VALIDATOR
// ============================================================================

/// Check a candidate submitted for `event`. All issues are collected.
pub fn validate_candidate(input: &GuestInput, event: Event) -> ValidationResult {
    let mut errors = Vec::new();

    let name = input.name.trim();
    if name.chars().count() < MIN_NAME_CHARS {
        errors.push(ValidationIssue::new("name", "Please tell us your name"));
    } else if name.split_whitespace().count() < 2 {
        errors.push(ValidationIssue::new(
            "name",
            "First name and surname are required",
        ));
    }

    if !input.attendance(event).is_set() {
        let field = match event {
            Event::Ceremony => "ceremonyAttendance",
            Event::Celebration => "celebrationAttendance",
        };
        errors.push(ValidationIssue::new(field, "We need to know if you are coming"));
    }

    if input.has_intolerance && input.intolerance_type.trim().is_empty() {
        errors.push(ValidationIssue::new(
            "intoleranceType",
            "Please tell us which intolerance you have",
        ));
    }

    check_people(&input.companions, "companions", &mut errors);
    check_people(&input.children_detail, "childrenDetail", &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_people(people: &[Person], field: &str, errors: &mut Vec<ValidationIssue>) {
    for (i, person) in people.iter().enumerate() {
        if person.name.trim().is_empty() {
            errors.push(ValidationIssue::new(
                format!("{}[{}].name", field, i),
                "Name is required",
            ));
        }
        if person.has_intolerance && person.intolerance_type.trim().is_empty() {
            errors.push(ValidationIssue::new(
                format!("{}[{}].intoleranceType", field, i),
                "Please tell us which intolerance applies",
            ));
        }
    }
}
