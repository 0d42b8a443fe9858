// 🏡 Guest Directory - the RSVP entry point
//
// Every submission is one round: read the full snapshot → resolve → merge →
// write. At most one update (or insert) and one delete per submission.
// Every store call is bounded by the configured timeout.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{DirectoryConfig, DuplicatePolicy};
use crate::error::{DirectoryError, StoreError};
use crate::guest::{Event, GuestInput, GuestPatch, GuestRecord};
use crate::merge::{diff, plan_merge, plan_new_household, MergeKind};
use crate::normalize::normalize_name;
use crate::resolution::{resolve, Resolution};
use crate::stats::DirectoryStats;
use crate::store::GuestStore;
use crate::validation::validate_candidate;

/// What the submission UI gets back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub id: String,
    pub is_update: bool,
    pub warnings: Vec<String>,
}

#[derive(Clone)]
pub struct GuestDirectory {
    store: Arc<dyn GuestStore>,
    config: DirectoryConfig,
}

impl GuestDirectory {
    pub fn new(store: Arc<dyn GuestStore>, config: DirectoryConfig) -> Self {
        GuestDirectory { store, config }
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Run one store call under the configured timeout.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, DirectoryError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let limit = self.config.store_timeout();
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result.map_err(|e| {
                warn!(operation, error = %e, "store call failed");
                DirectoryError::from(e)
            }),
            Err(_) => {
                warn!(operation, ?limit, "store call timed out");
                Err(DirectoryError::timeout(operation, limit))
            }
        }
    }

    async fn snapshot(&self) -> Result<Vec<GuestRecord>, DirectoryError> {
        self.bounded("list_all", self.store.list_all()).await
    }

    /// Delete `doomed` once `head_id` holds its data. If the delete fails the
    /// head is patched back so the directory ends as it started.
    async fn delete_or_restore(
        &self,
        doomed: &str,
        head_id: &str,
        restore: GuestPatch,
    ) -> Result<(), DirectoryError> {
        let failure = match self.bounded("delete", self.store.delete(doomed)).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        match self.bounded("update", self.store.update(head_id, restore)).await {
            Ok(()) => warn!(%doomed, %head_id, "delete failed; household restored"),
            Err(e) => error!(
                %doomed,
                %head_id,
                error = %e,
                "delete failed and household could not be restored"
            ),
        }
        Err(failure)
    }

    // ========================================================================
    // SUBMISSION
    // ========================================================================

    /// Record an RSVP for `event`, creating or merging into a household.
    #[instrument(
        name = "guest_directory.submit_rsvp",
        skip(self, candidate),
        fields(name = %candidate.name.trim(), event = %event)
    )]
    pub async fn submit_rsvp(
        &self,
        candidate: GuestInput,
        event: Event,
    ) -> Result<SubmitOutcome, DirectoryError> {
        validate_candidate(&candidate, event).map_err(DirectoryError::Validation)?;

        let directory = self.snapshot().await?;
        let report = resolve(&candidate, &directory);
        debug!(resolution = ?report.resolution, "resolved submission");
        for warning in &report.warnings {
            warn!(%warning, "inconsistent guest directory");
        }
        let mut warnings = report.warnings;

        match report.resolution {
            Resolution::Create => {
                let (household, notices) = plan_new_household(&candidate, &directory);
                let id = self.bounded("insert", self.store.insert(household)).await?;
                info!(%id, "created guest record");
                warnings.extend(notices);
                Ok(SubmitOutcome {
                    id,
                    is_update: false,
                    warnings,
                })
            }

            Resolution::UpdateSelf { id } => {
                let target = find(&directory, &id)?;
                let plan = plan_merge(target, &candidate, MergeKind::OwnRecord, None, &directory);

                let reconfirming = target.attendance(event).is_yes()
                    && candidate.attendance(event).is_yes()
                    && plan.adds_nobody();
                if reconfirming && self.config.duplicate_policy == DuplicatePolicy::Reject {
                    info!(%id, "duplicate confirmation rejected");
                    return Err(DirectoryError::duplicate_confirmation(
                        target.name.clone(),
                        event,
                    ));
                }

                self.bounded("update", self.store.update(&id, plan.patch)).await?;
                info!(%id, "updated own guest record");
                warnings.extend(plan.notices);
                Ok(SubmitOutcome {
                    id,
                    is_update: true,
                    warnings,
                })
            }

            Resolution::MergeIntoHead {
                head_id,
                salvage_from,
                via,
            } => {
                let head = find(&directory, &head_id)?;
                let salvage = match salvage_from.as_deref() {
                    Some(id) => Some(find(&directory, id)?),
                    None => None,
                };
                let plan = plan_merge(
                    head,
                    &candidate,
                    MergeKind::IntoHead(via),
                    salvage,
                    &directory,
                );

                let restore = diff(&plan.merged, head);
                self.bounded("update", self.store.update(&head_id, plan.patch))
                    .await?;
                info!(%head_id, ?via, "merged submission into household");

                // Only after the head holds the salvaged data
                if let Some(standalone) = salvage {
                    self.delete_or_restore(&standalone.id, &head_id, restore)
                        .await?;
                    warn!(
                        removed = %standalone.id,
                        into = %head_id,
                        "standalone record folded into household and deleted"
                    );
                }

                warnings.extend(plan.notices);
                Ok(SubmitOutcome {
                    id: head_id,
                    is_update: true,
                    warnings,
                })
            }
        }
    }

    // ========================================================================
    // LOOKUP
    // ========================================================================

    /// Record owning `name` that already answered for `event`.
    #[instrument(name = "guest_directory.find_existing_for_event", skip(self))]
    pub async fn find_existing_for_event(
        &self,
        name: &str,
        event: Event,
    ) -> Result<Option<GuestRecord>, DirectoryError> {
        let key = normalize_name(name);
        if key.is_empty() {
            return Ok(None);
        }

        let directory = self.snapshot().await?;
        Ok(directory
            .into_iter()
            .find(|g| g.owns(&key) && g.attendance(event).is_set()))
    }

    // ========================================================================
    // ADMIN
    // ========================================================================

    /// Fold `source_id` into `target_id` using the household merge rules,
    /// then delete the source.
    #[instrument(name = "guest_directory.merge_records", skip(self))]
    pub async fn merge_records(
        &self,
        source_id: &str,
        target_id: &str,
    ) -> Result<(), DirectoryError> {
        if source_id == target_id {
            return Err(DirectoryError::validation(
                "sourceId",
                "Cannot merge a record into itself",
            ));
        }

        let directory = self.snapshot().await?;
        let source = find(&directory, source_id)?;
        let target = find(&directory, target_id)?;

        let others: Vec<GuestRecord> = directory
            .iter()
            .filter(|g| g.id != source.id)
            .cloned()
            .collect();
        let candidate = input_from_record(source);
        let mut plan = plan_merge(target, &candidate, MergeKind::Absorb, None, &others);
        if target.comment.trim().is_empty() && !source.comment.trim().is_empty() {
            plan.merged.comment = source.comment.clone();
            plan.patch.comment = Some(source.comment.clone());
        }

        let restore = diff(&plan.merged, target);
        self.bounded("update", self.store.update(target_id, plan.patch))
            .await?;
        self.delete_or_restore(source_id, target_id, restore).await?;

        for notice in &plan.notices {
            info!(%notice, "merge notice");
        }
        info!(%source_id, %target_id, "merged duplicate records");
        Ok(())
    }

    /// Every record, newest first.
    pub async fn list_guests(&self) -> Result<Vec<GuestRecord>, DirectoryError> {
        self.snapshot().await
    }

    #[instrument(name = "guest_directory.delete_guest", skip(self))]
    pub async fn delete_guest(&self, id: &str) -> Result<(), DirectoryError> {
        self.bounded("delete", self.store.delete(id)).await?;
        info!(%id, "deleted guest record");
        Ok(())
    }

    pub async fn stats(&self) -> Result<DirectoryStats, DirectoryError> {
        let directory = self.snapshot().await?;
        Ok(DirectoryStats::from_records(&directory))
    }
}

fn find<'a>(directory: &'a [GuestRecord], id: &str) -> Result<&'a GuestRecord, DirectoryError> {
    directory
        .iter()
        .find(|g| g.id == id)
        .ok_or_else(|| DirectoryError::NotFound(id.to_string()))
}

/// A stored household replayed as if it were a new submission.
fn input_from_record(record: &GuestRecord) -> GuestInput {
    GuestInput {
        name: record.name.clone(),
        ceremony_attendance: record.ceremony_attendance,
        celebration_attendance: record.celebration_attendance,
        has_intolerance: record.has_intolerance,
        intolerance_type: record.intolerance_type.clone(),
        companions: record.companions.clone(),
        children_detail: record.children_detail.clone(),
        bus: record.bus,
        comment: record.comment.clone(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
