// 🔍 Identity Resolution - decide which household a new RSVP belongs to
//
// Three outcomes, computed from one directory snapshot:
//   Create         → nobody in the directory owns this name
//   UpdateSelf     → the candidate is already the primary of a record
//   MergeIntoHead  → the candidate belongs inside another household
//
// Pure: no store access. The directory dispatches on the result.

use serde::{Deserialize, Serialize};

use crate::guest::{GuestInput, GuestRecord};

// ============================================================================
// RESOLUTION
// ============================================================================

/// How a family head was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadMatch {
    /// The candidate listed an existing primary registrant as their companion
    Reverse,

    /// The candidate is already listed as a companion/child of that record
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Create,
    UpdateSelf {
        id: String,
    },
    MergeIntoHead {
        head_id: String,
        /// Standalone record of the candidate, folded into the head then deleted
        salvage_from: Option<String>,
        via: HeadMatch,
    },
}

impl Resolution {
    /// Id of the record the submission will be written into, if any.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Resolution::Create => None,
            Resolution::UpdateSelf { id } => Some(id),
            Resolution::MergeIntoHead { head_id, .. } => Some(head_id),
        }
    }

    pub fn is_update(&self) -> bool {
        !matches!(self, Resolution::Create)
    }
}

/// Resolution plus any inconsistencies noticed in the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionReport {
    pub resolution: Resolution,
    pub warnings: Vec<String>,
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolve `candidate` against a full directory snapshot.
///
/// When several records match the same rule the first one in snapshot order
/// wins and a warning names the others.
pub fn resolve(candidate: &GuestInput, directory: &[GuestRecord]) -> ResolutionReport {
    let candidate_key = candidate.key();
    let mut warnings = Vec::new();

    let companion_keys: Vec<String> = candidate
        .companions
        .iter()
        .map(|c| c.key())
        .filter(|k| !k.is_empty() && *k != candidate_key)
        .collect();

    // Reverse match: one of my companions is already a primary registrant
    let reverse_matches: Vec<&GuestRecord> = directory
        .iter()
        .filter(|g| {
            let key = g.key();
            !key.is_empty() && companion_keys.contains(&key)
        })
        .collect();

    // Self match: somebody already owns my name
    let self_matches: Vec<&GuestRecord> = directory
        .iter()
        .filter(|g| g.owns(&candidate_key))
        .collect();

    if reverse_matches.len() > 1 {
        warnings.push(ambiguity_warning(
            "companions of this RSVP head several households",
            &reverse_matches,
        ));
    }
    if self_matches.len() > 1 {
        warnings.push(ambiguity_warning(
            &format!("{} appears in several households", candidate.name.trim()),
            &self_matches,
        ));
    }

    let head = reverse_matches.first().copied();
    let own = self_matches.first().copied();

    let resolution = match (head, own) {
        (None, None) => Resolution::Create,

        (None, Some(own)) if own.key() == candidate_key => Resolution::UpdateSelf {
            id: own.id.clone(),
        },

        (None, Some(household)) => Resolution::MergeIntoHead {
            head_id: household.id.clone(),
            salvage_from: None,
            via: HeadMatch::Member,
        },

        (Some(head), own) => {
            let salvage_from = match own {
                Some(own) if own.id != head.id && own.key() == candidate_key => {
                    Some(own.id.clone())
                }
                Some(other) if other.id != head.id => {
                    warnings.push(format!(
                        "{} is also listed in the household of {}",
                        candidate.name.trim(),
                        other.name
                    ));
                    None
                }
                _ => None,
            };

            Resolution::MergeIntoHead {
                head_id: head.id.clone(),
                salvage_from,
                via: HeadMatch::Reverse,
            }
        }
    };

    ResolutionReport {
        resolution,
        warnings,
    }
}

fn ambiguity_warning(what: &str, matches: &[&GuestRecord]) -> String {
    let names: Vec<String> = matches
        .iter()
        .map(|g| format!("{} ({})", g.name, g.id))
        .collect();
    format!("{}: {}; using the first", what, names.join(", "))
}

// ============================================================================
// TESTS
// ============================================================================
