//! Business rule validation, independent of actor identity.
//!
//! All checks on a payload run to completion and their failures are
//! collected into one [`Violations`] set, so a caller can fix every field
//! in a single round-trip.

use chrono::Utc;

use crate::config::DecisionPolicy;
use crate::domain::{ControlList, MachinePayload};
use crate::error::Violations;
use crate::workflow::Decision;

const MIN_ENGINE_POWER: f64 = 1.0;
const MIN_WEIGHT: f64 = 0.1;
const MIN_FUEL_CAPACITY: f64 = 1.0;

/// Submission rules: a checklist must have items and every item must carry
/// a recorded outcome.
pub fn validate_submission(list: &ControlList) -> Result<(), Violations> {
    let mut violations = Violations::new();

    if list.items.is_empty() {
        violations.push("items", "checklist has no items");
    }

    for (index, item) in list.items.iter().enumerate() {
        if !item.is_answered() {
            violations.push(
                format!("items[{index}]"),
                format!("item '{}' has no recorded outcome", item.title),
            );
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Machine creation/update rules. `serial_taken` is the storage
/// collaborator's answer for the (case-sensitive) serial number, excluding
/// the machine being updated.
pub fn validate_machine(payload: &MachinePayload, serial_taken: bool) -> Result<(), Violations> {
    let mut violations = Violations::new();

    if payload.name.trim().is_empty() {
        violations.push("name", "name is required");
    }
    if payload.model.trim().is_empty() {
        violations.push("model", "model is required");
    }
    if payload.serial_number.trim().is_empty() {
        violations.push("serial_number", "serial number is required");
    } else if serial_taken {
        violations.push("serial_number", "serial number is already in use");
    }

    let today = Utc::now().date_naive();
    if let Some(produced) = payload.production_date
        && produced > today
    {
        violations.push("production_date", "production date cannot be in the future");
    }
    if let (Some(produced), Some(installed)) = (payload.production_date, payload.installation_date)
        && installed < produced
    {
        violations.push(
            "installation_date",
            "installation date must be on or after production date",
        );
    }

    let specs = &payload.specifications;
    if let Some(power) = specs.engine_power
        && power < MIN_ENGINE_POWER
    {
        violations.push("specifications.engine_power", "engine power must be at least 1 HP");
    }
    if let Some(weight) = specs.weight
        && weight < MIN_WEIGHT
    {
        violations.push("specifications.weight", "weight must be at least 0.1 t");
    }
    if let Some(fuel) = specs.fuel_capacity
        && fuel < MIN_FUEL_CAPACITY
    {
        violations.push(
            "specifications.fuel_capacity",
            "fuel capacity must be at least 1 L",
        );
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Decision-note policy. Rejections explain failed items, so a note is
/// required when the (configurable) policy demands one; approvals may
/// carry a note but never need it.
pub fn validate_decision_note(
    decision: Decision,
    note: Option<&str>,
    policy: &DecisionPolicy,
) -> Result<(), Violations> {
    let mut violations = Violations::new();

    if decision == Decision::Rejected
        && policy.require_rejection_note
        && note.is_none_or(|n| n.trim().is_empty())
    {
        violations.push("note", "a rejection requires a non-empty note");
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CheckItem, ItemOutcome, MachineType};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn empty_checklist_is_rejected() {
        let list = ControlList::new(7, "Daily check", 10, 42, 3, vec![]);
        let violations = validate_submission(&list).unwrap_err();
        assert!(violations.contains_field("items"));
    }

    #[test]
    fn unanswered_items_are_all_reported() {
        let list = ControlList::new(
            7,
            "Daily check",
            10,
            42,
            3,
            vec![
                CheckItem::new("Oil level", ItemOutcome::Pass),
                CheckItem::new("Brakes", ItemOutcome::Unanswered),
                CheckItem::new("Tracks", ItemOutcome::Unanswered),
            ],
        );
        let violations = validate_submission(&list).unwrap_err();
        assert_eq!(violations.0.len(), 2);
        assert!(violations.contains_field("items[1]"));
        assert!(violations.contains_field("items[2]"));
    }

    #[test]
    fn fully_answered_checklist_passes() {
        let list = ControlList::new(
            7,
            "Daily check",
            10,
            42,
            3,
            vec![
                CheckItem::new("Oil level", ItemOutcome::Pass),
                CheckItem::new("Brakes", ItemOutcome::Fail),
            ],
        );
        assert!(validate_submission(&list).is_ok());
    }

    #[test]
    fn installation_before_production_is_invalid() {
        let mut payload = MachinePayload::new("M1", MachineType::Excavator, "CAT 320", "SN-100");
        payload.production_date = Some(date("2024-01-01"));
        payload.installation_date = Some(date("2023-12-01"));

        let violations = validate_machine(&payload, false).unwrap_err();
        assert!(violations.contains_field("installation_date"));
        assert!(!violations.contains_field("production_date"));
    }

    #[test]
    fn future_production_date_is_invalid() {
        let mut payload = MachinePayload::new("M1", MachineType::Excavator, "CAT 320", "SN-100");
        payload.production_date = Some(Utc::now().date_naive() + chrono::Days::new(30));
        let violations = validate_machine(&payload, false).unwrap_err();
        assert!(violations.contains_field("production_date"));
    }

    #[test]
    fn duplicate_serial_is_reported() {
        let payload = MachinePayload::new("M1", MachineType::Excavator, "CAT 320", "SN-100");
        let violations = validate_machine(&payload, true).unwrap_err();
        assert!(violations.contains_field("serial_number"));
    }

    #[test]
    fn specification_bounds_are_enforced_together() {
        let mut payload = MachinePayload::new("M1", MachineType::Loader, "L90", "SN-200");
        payload.specifications.engine_power = Some(0.5);
        payload.specifications.weight = Some(0.05);
        payload.specifications.fuel_capacity = Some(0.0);

        let violations = validate_machine(&payload, false).unwrap_err();
        assert_eq!(violations.0.len(), 3);
        assert!(violations.contains_field("specifications.engine_power"));
        assert!(violations.contains_field("specifications.weight"));
        assert!(violations.contains_field("specifications.fuel_capacity"));
    }

    #[test]
    fn boundary_specification_values_pass() {
        let mut payload = MachinePayload::new("M1", MachineType::Loader, "L90", "SN-200");
        payload.specifications.engine_power = Some(1.0);
        payload.specifications.weight = Some(0.1);
        payload.specifications.fuel_capacity = Some(1.0);
        assert!(validate_machine(&payload, false).is_ok());
    }

    #[test]
    fn all_failures_reported_at_once() {
        let mut payload = MachinePayload::new("", MachineType::Other, "", "");
        payload.specifications.weight = Some(0.0);
        let violations = validate_machine(&payload, false).unwrap_err();
        assert!(violations.contains_field("name"));
        assert!(violations.contains_field("model"));
        assert!(violations.contains_field("serial_number"));
        assert!(violations.contains_field("specifications.weight"));
    }

    #[test]
    fn rejection_without_note_fails_under_policy() {
        let policy = DecisionPolicy {
            require_rejection_note: true,
        };
        let violations = validate_decision_note(Decision::Rejected, None, &policy).unwrap_err();
        assert!(violations.contains_field("note"));

        let blank = validate_decision_note(Decision::Rejected, Some("  "), &policy).unwrap_err();
        assert!(blank.contains_field("note"));
    }

    #[test]
    fn rejection_with_note_passes() {
        let policy = DecisionPolicy {
            require_rejection_note: true,
        };
        assert!(validate_decision_note(Decision::Rejected, Some("brakes failed"), &policy).is_ok());
    }

    #[test]
    fn approval_never_requires_a_note() {
        let policy = DecisionPolicy {
            require_rejection_note: true,
        };
        assert!(validate_decision_note(Decision::Approved, None, &policy).is_ok());
        assert!(validate_decision_note(Decision::Approved, Some("good work"), &policy).is_ok());
    }

    #[test]
    fn note_policy_can_be_disabled() {
        let policy = DecisionPolicy {
            require_rejection_note: false,
        };
        assert!(validate_decision_note(Decision::Rejected, None, &policy).is_ok());
    }
}
