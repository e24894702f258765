use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::actor::{ActorId, CompanyId};
use super::machine::MachineId;

pub type ControlListId = u64;

/// Lifecycle status of a control list.
///
/// `Draft → Pending → Approved | Rejected`; the terminal states are never
/// left. Resubmission after rejection means creating a new list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl ListStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ListStatus::Approved | ListStatus::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ListStatus::Draft => "draft",
            ListStatus::Pending => "pending",
            ListStatus::Approved => "approved",
            ListStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ListStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recorded outcome of a single check item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Pass,
    Fail,
    Unanswered,
}

/// One entry of the inspection checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckItem {
    pub title: String,
    pub outcome: ItemOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CheckItem {
    pub fn new(title: impl Into<String>, outcome: ItemOutcome) -> Self {
        Self {
            title: title.into(),
            outcome,
            note: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.outcome != ItemOutcome::Unanswered
    }
}

/// Item tallies computed at submission time and frozen thereafter. Later
/// item edits never retroactively alter a decided list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCounts {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
}

impl ItemCounts {
    pub fn from_items(items: &[CheckItem]) -> Self {
        let mut counts = Self {
            total: items.len() as u32,
            ..Self::default()
        };
        for item in items {
            match item.outcome {
                ItemOutcome::Pass => counts.passed += 1,
                ItemOutcome::Fail => counts.failed += 1,
                ItemOutcome::Unanswered => {}
            }
        }
        counts
    }

    pub fn unanswered(&self) -> u32 {
        self.total - self.passed - self.failed
    }
}

/// A periodic inspection checklist an operator completes against a machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlList {
    pub id: ControlListId,
    pub uuid: Uuid,
    pub title: String,
    pub company_id: CompanyId,
    pub machine_id: MachineId,
    /// The operator assigned to complete this checklist.
    pub operator_id: ActorId,
    pub items: Vec<CheckItem>,
    pub status: ListStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<ActorId>,
    pub decision_note: Option<String>,
    /// Frozen at submission; zeroed while in draft.
    pub counts: ItemCounts,
    /// Optimistic-concurrency version, bumped on every committed write.
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl ControlList {
    pub fn new(
        id: ControlListId,
        title: impl Into<String>,
        company_id: CompanyId,
        machine_id: MachineId,
        operator_id: ActorId,
        items: Vec<CheckItem>,
    ) -> Self {
        Self {
            id,
            uuid: Uuid::new_v4(),
            title: title.into(),
            company_id,
            machine_id,
            operator_id,
            items,
            status: ListStatus::Draft,
            submitted_at: None,
            decided_at: None,
            decided_by: None,
            decision_note: None,
            counts: ItemCounts::default(),
            version: 0,
            created_at: Utc::now(),
        }
    }

    /// Checks the status/timestamp presence invariants. Holds after every
    /// committed operation; asserted throughout the test suite.
    pub fn invariants_hold(&self) -> bool {
        let submitted_ok = self.submitted_at.is_some() == (self.status != ListStatus::Draft);
        let decided_ok = (self.decided_at.is_some() && self.decided_by.is_some())
            == self.status.is_terminal();
        let counts_ok = self.counts.passed + self.counts.failed + self.counts.unanswered()
            == self.counts.total;
        submitted_ok && decided_ok && counts_ok
    }
}
