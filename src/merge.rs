// 🧬 Household Merge - fold a submission into an existing record
//
// Rules:
// - companions / children: append-only union keyed by normalized name
// - attendance: a stored "yes" is never overwritten
// - bus: only filled when the record has none yet
// - primary scalars (comment, intolerance): only from the household's own primary
//
// Produces a plan (merged record + patch + notices); persistence is the caller's job.

use crate::guest::{children_summary, Attendance, Event, GuestInput, GuestPatch, GuestRecord, Person};
use crate::normalize::normalize_name;
use crate::resolution::HeadMatch;

// ============================================================================
// MERGE KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    /// The target is the candidate's own primary record
    OwnRecord,

    /// The candidate joins somebody else's household
    IntoHead(HeadMatch),

    /// An administrator folds a duplicate record into this one
    Absorb,
}

// ============================================================================
// MERGE PLAN
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    /// Target record as it will look after the update
    pub merged: GuestRecord,

    /// Fields that differ from the stored target
    pub patch: GuestPatch,

    /// Human-readable notices for the submitter
    pub notices: Vec<String>,

    pub added_companions: usize,
    pub added_children: usize,
}

impl MergePlan {
    /// True when the merge brought in no new companions or children.
    pub fn adds_nobody(&self) -> bool {
        self.added_companions == 0 && self.added_children == 0
    }
}

/// Plan the merge of `candidate` into `target`.
///
/// `salvage` is the candidate's standalone record that will be deleted after
/// the update; its attendance, bus and people are folded in first.
/// `directory` is the snapshot used to spot people registered elsewhere.
pub fn plan_merge(
    target: &GuestRecord,
    candidate: &GuestInput,
    kind: MergeKind,
    salvage: Option<&GuestRecord>,
    directory: &[GuestRecord],
) -> MergePlan {
    let mut merged = target.clone();
    let mut notices = Vec::new();
    let candidate_key = candidate.key();
    let household_key = target.key();

    // Records other than the ones being merged
    let skip_ids: Vec<&str> = std::iter::once(target.id.as_str())
        .chain(salvage.map(|s| s.id.as_str()))
        .collect();
    let others: Vec<&GuestRecord> = directory
        .iter()
        .filter(|g| !skip_ids.contains(&g.id.as_str()))
        .collect();

    if let Some(standalone) = salvage {
        salvage_into(&mut merged, standalone);
    }

    // 1. Companions
    let before_companions = merged.companions.len();
    for companion in &candidate.companions {
        let key = companion.key();
        if key == candidate_key {
            continue;
        }
        if let Some(person) =
            admit(&household_key, companion, &merged.companions, &others, &mut notices)
        {
            merged.companions.push(person);
        }
    }

    // 2. The submitter joins the household
    let joined = match kind {
        MergeKind::OwnRecord => None,
        MergeKind::IntoHead(HeadMatch::Reverse) => Some(format!(
            "{} had already confirmed, so {} was added to that household instead of a new one",
            target.name,
            candidate.name.trim()
        )),
        MergeKind::IntoHead(HeadMatch::Member) => Some(format!(
            "{} was already part of the confirmation of {}; the answers were added to it",
            candidate.name.trim(),
            target.name
        )),
        MergeKind::Absorb => Some(format!(
            "The confirmation of {} was merged into the one of {}",
            candidate.name.trim(),
            target.name
        )),
    };
    if let Some(notice) = joined {
        let submitter = candidate.as_person();
        if let Some(existing) = find_person_mut(&mut merged.companions, &candidate_key) {
            refresh_intolerance(existing, &submitter);
        } else if let Some(existing) = find_person_mut(&mut merged.children_detail, &candidate_key) {
            refresh_intolerance(existing, &submitter);
        } else if !submitter.name.is_empty() {
            merged.companions.push(submitter);
        }
        notices.push(notice);
    }
    let added_companions = merged.companions.len() - before_companions;

    // 3. Children
    let before_children = merged.children_detail.len();
    for child in &candidate.children_detail {
        if child.key() == candidate_key {
            continue;
        }
        if let Some(person) =
            admit(&household_key, child, &merged.children_detail, &others, &mut notices)
        {
            merged.children_detail.push(person);
        }
    }
    let added_children = merged.children_detail.len() - before_children;
    merged.children = if merged.children_detail.is_empty() {
        target.children.clone()
    } else {
        children_summary(merged.children_detail.len())
    };

    // 4. Attendance: write-once-yes
    for event in [Event::Ceremony, Event::Celebration] {
        let merged_value = merge_attendance(merged.attendance(event), candidate.attendance(event));
        set_attendance(&mut merged, event, merged_value);
    }

    // 5. Bus: first answer sticks
    if merged.bus.is_none() {
        merged.bus = candidate.bus;
    }

    // 6. Primary scalars only from the primary themselves
    if kind == MergeKind::OwnRecord {
        merged.has_intolerance = candidate.has_intolerance;
        merged.intolerance_type = candidate.intolerance_type.clone();
        if !candidate.comment.trim().is_empty() {
            merged.comment = candidate.comment.clone();
        }
    }

    let patch = diff(target, &merged);

    MergePlan {
        merged,
        patch,
        notices,
        added_companions,
        added_children,
    }
}

/// Companion and child lists of a brand-new household, run through the same
/// admission rules a merge uses.
pub fn plan_new_household(
    candidate: &GuestInput,
    directory: &[GuestRecord],
) -> (GuestInput, Vec<String>) {
    let household_key = candidate.key();
    let others: Vec<&GuestRecord> = directory.iter().collect();
    let mut notices = Vec::new();

    let mut companions = Vec::new();
    for companion in &candidate.companions {
        if let Some(person) = admit(&household_key, companion, &companions, &others, &mut notices) {
            companions.push(person);
        }
    }
    let mut children = Vec::new();
    for child in &candidate.children_detail {
        if let Some(person) = admit(&household_key, child, &children, &others, &mut notices) {
            children.push(person);
        }
    }

    let tidy = GuestInput {
        companions,
        children_detail: children,
        ..candidate.clone()
    };
    (tidy, notices)
}

/// Keep a stored "yes"; otherwise take the candidate's answer if it gave one.
pub fn merge_attendance(stored: Attendance, incoming: Attendance) -> Attendance {
    if stored.is_yes() || !incoming.is_set() {
        stored
    } else {
        incoming
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Decide whether `person` may be appended to `list`, emitting notices.
fn admit(
    household_key: &str,
    person: &Person,
    list: &[Person],
    others: &[&GuestRecord],
    notices: &mut Vec<String>,
) -> Option<Person> {
    let key = person.key();
    if key.is_empty() || key == household_key {
        return None;
    }
    if list.iter().any(|p| p.key() == key) {
        return None;
    }

    if let Some(owner) = others.iter().find(|g| g.key() == key) {
        notices.push(format!(
            "{} already has their own confirmation, so they were not added again",
            owner.name
        ));
        return None;
    }
    if let Some(owner) = others.iter().find(|g| g.owns(&key)) {
        notices.push(format!(
            "{} was already part of the confirmation of {}",
            person.name.trim(),
            owner.name
        ));
    }

    Some(Person {
        name: person.name.trim().to_string(),
        ..person.clone()
    })
}

/// Fold a standalone record that is about to be deleted into the head.
fn salvage_into(head: &mut GuestRecord, standalone: &GuestRecord) {
    for event in [Event::Ceremony, Event::Celebration] {
        if !head.attendance(event).is_set() {
            set_attendance(head, event, standalone.attendance(event));
        }
    }
    if head.bus.is_none() {
        head.bus = standalone.bus;
    }

    let head_key = head.key();
    for person in &standalone.companions {
        let key = person.key();
        if key != head_key && !head.companions.iter().any(|p| p.key() == key) {
            head.companions.push(person.clone());
        }
    }
    for person in &standalone.children_detail {
        let key = person.key();
        if key != head_key && !head.children_detail.iter().any(|p| p.key() == key) {
            head.children_detail.push(person.clone());
        }
    }
}

fn find_person_mut<'a>(people: &'a mut [Person], key: &str) -> Option<&'a mut Person> {
    people.iter_mut().find(|p| normalize_name(&p.name) == key)
}

fn refresh_intolerance(existing: &mut Person, submitted: &Person) {
    existing.has_intolerance = submitted.has_intolerance;
    existing.intolerance_type = submitted.intolerance_type.clone();
}

fn set_attendance(record: &mut GuestRecord, event: Event, value: Attendance) {
    match event {
        Event::Ceremony => record.ceremony_attendance = value,
        Event::Celebration => record.celebration_attendance = value,
    }
}

/// Patch holding every field of `after` that differs from `before`.
pub fn diff(before: &GuestRecord, after: &GuestRecord) -> GuestPatch {
    fn changed<T: PartialEq + Clone>(a: &T, b: &T) -> Option<T> {
        if a != b {
            Some(b.clone())
        } else {
            None
        }
    }

    GuestPatch {
        name: changed(&before.name, &after.name),
        ceremony_attendance: changed(&before.ceremony_attendance, &after.ceremony_attendance),
        celebration_attendance: changed(
            &before.celebration_attendance,
            &after.celebration_attendance,
        ),
        has_intolerance: changed(&before.has_intolerance, &after.has_intolerance),
        intolerance_type: changed(&before.intolerance_type, &after.intolerance_type),
        companions: changed(&before.companions, &after.companions),
        children_detail: changed(&before.children_detail, &after.children_detail),
        children: changed(&before.children, &after.children),
        bus: changed(&before.bus, &after.bus),
        comment: changed(&before.comment, &after.comment),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guest::BusChoice;
    use chrono::Utc;

    fn record(id: &str, input: GuestInput) -> GuestRecord {
        GuestRecord::from_input(id.to_string(), input, Utc::now())
    }

    fn ana() -> GuestRecord {
        record(
            "r1",
            GuestInput::new("Ana Gomez Ruiz")
                .with_attendance(Event::Ceremony, Attendance::Yes)
                .with_companion(Person::new("Luis Ruiz")),
        )
    }

    #[test]
    fn test_attendance_yes_is_write_once() {
        assert_eq!(merge_attendance(Attendance::Yes, Attendance::No), Attendance::Yes);
        assert_eq!(merge_attendance(Attendance::Yes, Attendance::Unset), Attendance::Yes);
        assert_eq!(merge_attendance(Attendance::No, Attendance::Yes), Attendance::Yes);
        assert_eq!(merge_attendance(Attendance::No, Attendance::Unset), Attendance::No);
        assert_eq!(merge_attendance(Attendance::Unset, Attendance::No), Attendance::No);
    }

    #[test]
    fn test_companion_union_is_deduplicated() {
        let target = ana();
        let candidate = GuestInput::new("Ana Gomez Ruiz")
            .with_companion(Person::new("luis  RUÍZ"))
            .with_companion(Person::new("Carmen Ruiz"))
            .with_companion(Person::new("Carmen Ruiz"));

        let plan = plan_merge(&target, &candidate, MergeKind::OwnRecord, None, &[target.clone()]);

        let names: Vec<&str> = plan.merged.companions.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Luis Ruiz", "Carmen Ruiz"]);
        assert_eq!(plan.added_companions, 1);
        assert!(plan.notices.is_empty());
    }

    #[test]
    fn test_primary_is_never_own_companion() {
        let target = ana();
        let candidate = GuestInput::new("Maria Pelaez").with_companion(Person::new("Ana Gomez Ruiz"));

        let plan = plan_merge(
            &target,
            &candidate,
            MergeKind::IntoHead(HeadMatch::Reverse),
            None,
            &[target.clone()],
        );

        let names: Vec<&str> = plan.merged.companions.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Luis Ruiz", "Maria Pelaez"]);
        assert_eq!(plan.notices.len(), 1);
    }

    #[test]
    fn test_member_refreshes_own_intolerance_only() {
        let target = ana();
        let mut candidate = GuestInput::new("Luis Ruiz")
            .with_attendance(Event::Celebration, Attendance::Yes);
        candidate.has_intolerance = true;
        candidate.intolerance_type = "gluten".to_string();
        candidate.comment = "Looking forward!".to_string();

        let plan = plan_merge(
            &target,
            &candidate,
            MergeKind::IntoHead(HeadMatch::Member),
            None,
            &[target.clone()],
        );

        assert_eq!(plan.merged.companions.len(), 1);
        assert!(plan.merged.companions[0].has_intolerance);
        assert_eq!(plan.merged.companions[0].intolerance_type, "gluten");
        assert!(!plan.merged.has_intolerance);
        assert_eq!(plan.merged.comment, "");
        assert_eq!(plan.merged.celebration_attendance, Attendance::Yes);
        assert!(plan.notices[0].contains("already part of the confirmation of Ana Gomez Ruiz"));
    }

    #[test]
    fn test_own_record_overwrites_primary_scalars() {
        let target = ana();
        let mut candidate = GuestInput::new("Ana Gomez Ruiz");
        candidate.has_intolerance = true;
        candidate.intolerance_type = "shellfish".to_string();
        candidate.comment = "Vegan menu please".to_string();

        let plan = plan_merge(&target, &candidate, MergeKind::OwnRecord, None, &[target.clone()]);

        assert!(plan.merged.has_intolerance);
        assert_eq!(plan.patch.intolerance_type.as_deref(), Some("shellfish"));
        assert_eq!(plan.patch.comment.as_deref(), Some("Vegan menu please"));
        assert_eq!(plan.patch.companions, None);
    }

    #[test]
    fn test_bus_only_filled_when_unset() {
        let mut target = ana();
        let mut candidate = GuestInput::new("Ana Gomez Ruiz");
        candidate.bus = Some(BusChoice::Return);

        let plan = plan_merge(&target, &candidate, MergeKind::OwnRecord, None, &[]);
        assert_eq!(plan.merged.bus, Some(BusChoice::Return));

        target.bus = Some(BusChoice::Outbound);
        let plan = plan_merge(&target, &candidate, MergeKind::OwnRecord, None, &[]);
        assert_eq!(plan.merged.bus, Some(BusChoice::Outbound));
        assert_eq!(plan.patch.bus, None);
    }

    #[test]
    fn test_companion_registered_elsewhere() {
        let target = ana();
        let maria = record("r2", GuestInput::new("Maria Pelaez"));
        let pedro = record(
            "r3",
            GuestInput::new("Pedro Lopez").with_companion(Person::new("Sara Lopez")),
        );
        let candidate = GuestInput::new("Ana Gomez Ruiz")
            .with_companion(Person::new("Maria Pelaez"))
            .with_companion(Person::new("Sara Lopez"));
        let directory = vec![target.clone(), maria, pedro];

        let plan = plan_merge(&target, &candidate, MergeKind::OwnRecord, None, &directory);

        let names: Vec<&str> = plan.merged.companions.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Luis Ruiz", "Sara Lopez"]);
        assert_eq!(plan.notices.len(), 2);
        assert!(plan.notices[0].contains("Maria Pelaez already has their own confirmation"));
        assert!(plan.notices[1].contains("Sara Lopez was already part of the confirmation of Pedro Lopez"));
    }

    #[test]
    fn test_salvage_fills_only_unset_fields() {
        let mut head = ana();
        head.celebration_attendance = Attendance::Unset;
        let mut standalone = record(
            "r2",
            GuestInput::new("Maria Pelaez")
                .with_attendance(Event::Ceremony, Attendance::No)
                .with_attendance(Event::Celebration, Attendance::Yes)
                .with_child(Person::new("Lucas Pelaez")),
        );
        standalone.bus = Some(BusChoice::Both);
        let candidate =
            GuestInput::new("Maria Pelaez").with_companion(Person::new("Ana Gomez Ruiz"));
        let directory = vec![head.clone(), standalone.clone()];

        let plan = plan_merge(
            &head,
            &candidate,
            MergeKind::IntoHead(HeadMatch::Reverse),
            Some(&standalone),
            &directory,
        );

        assert_eq!(plan.merged.ceremony_attendance, Attendance::Yes);
        assert_eq!(plan.merged.celebration_attendance, Attendance::Yes);
        assert_eq!(plan.merged.bus, Some(BusChoice::Both));
        assert_eq!(plan.merged.children_detail.len(), 1);
        assert_eq!(plan.merged.children, "1 child");
        assert!(plan.merged.companions.iter().any(|p| p.name == "Maria Pelaez"));
    }

    #[test]
    fn test_new_household_lists_are_cleaned() {
        let pedro = record(
            "r3",
            GuestInput::new("Pedro Lopez").with_companion(Person::new("Sara Lopez")),
        );
        let candidate = GuestInput::new("Ana Gomez Ruiz")
            .with_companion(Person::new("Ana Gómez Ruiz"))
            .with_companion(Person::new("Luis Ruiz"))
            .with_companion(Person::new("luis ruiz"))
            .with_companion(Person::new("Sara Lopez"))
            .with_child(Person::new("Pablo Gomez"))
            .with_child(Person::new("PABLO GÓMEZ"));

        let (tidy, notices) = plan_new_household(&candidate, &[pedro]);

        let names: Vec<&str> = tidy.companions.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Luis Ruiz", "Sara Lopez"]);
        assert_eq!(tidy.children_detail, vec![Person::new("Pablo Gomez")]);
        assert_eq!(tidy.name, candidate.name);
        assert_eq!(
            notices,
            vec!["Sara Lopez was already part of the confirmation of Pedro Lopez".to_string()]
        );
    }

    #[test]
    fn test_admin_fold_has_its_own_notice() {
        let target = ana();
        let source = GuestInput::new("Luis Ruiz").with_attendance(Event::Celebration, Attendance::Yes);

        let plan = plan_merge(&target, &source, MergeKind::Absorb, None, &[target.clone()]);

        assert_eq!(plan.merged.companions.len(), 1);
        assert_eq!(plan.merged.celebration_attendance, Attendance::Yes);
        assert_eq!(
            plan.notices,
            vec!["The confirmation of Luis Ruiz was merged into the one of Ana Gomez Ruiz".to_string()]
        );
    }

    #[test]
    fn test_reverse_diff_restores_target() {
        let target = ana();
        let mut standalone = record(
            "r2",
            GuestInput::new("Maria Pelaez").with_child(Person::new("Lucas Pelaez")),
        );
        standalone.bus = Some(BusChoice::Both);
        let candidate =
            GuestInput::new("Maria Pelaez").with_companion(Person::new("Ana Gomez Ruiz"));

        let plan = plan_merge(
            &target,
            &candidate,
            MergeKind::IntoHead(HeadMatch::Reverse),
            Some(&standalone),
            &[target.clone(), standalone.clone()],
        );
        let mut restored = plan.merged.clone();
        restored.apply(&diff(&plan.merged, &target));

        assert_eq!(plan.patch.bus, Some(Some(BusChoice::Both)));
        assert_eq!(restored, target);
    }

    #[test]
    fn test_children_union_recomputes_summary() {
        let target = record(
            "r1",
            GuestInput::new("Ana Gomez Ruiz").with_child(Person::new("Pablo Gomez")),
        );
        let candidate = GuestInput::new("Ana Gomez Ruiz")
            .with_child(Person::new("Pablo Gómez"))
            .with_child(Person::with_intolerance("Irene Gomez", "nuts"));

        let plan = plan_merge(&target, &candidate, MergeKind::OwnRecord, None, &[target.clone()]);

        assert_eq!(plan.merged.children_detail.len(), 2);
        assert_eq!(plan.added_children, 1);
        assert_eq!(plan.patch.children.as_deref(), Some("2 children"));
        assert!(plan.merged.children_detail[1].has_intolerance);
    }
}
