//! Channel-agnostic message rendering.
//!
//! A [`DomainEvent`] becomes a [`MessageDescriptor`]: a subject line plus
//! structured body fields. Transport-specific formatting (HTML mail, SMS
//! text, push payload) is the delivery collaborator's concern.

use serde::{Deserialize, Serialize};

use crate::domain::DomainEvent;

/// Marker prefixed to subjects of emergency notifications.
pub const URGENCY_MARKER: &str = "[URGENT]";

/// Rendered notification content, independent of any transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub subject: String,
    /// Ordered label/value pairs; transports lay these out as they wish.
    pub body: Vec<(String, String)>,
}

fn field(label: &str, value: impl ToString) -> (String, String) {
    (label.to_string(), value.to_string())
}

/// Pure function from event to message descriptor.
pub fn render(event: &DomainEvent) -> MessageDescriptor {
    match event {
        DomainEvent::ControlListSubmitted {
            list_id,
            list_title,
            machine_id,
            total_items,
            passed_items,
            failed_items,
            ..
        } => MessageDescriptor {
            subject: format!("Control list awaiting review: {list_title}"),
            body: vec![
                field("Control list", format!("#{list_id} {list_title}")),
                field("Machine", format!("#{machine_id}")),
                field("Items", *total_items),
                field("Passed", *passed_items),
                field("Failed", *failed_items),
            ],
        },
        DomainEvent::ControlListApproved {
            list_id,
            list_title,
            note,
            ..
        } => MessageDescriptor {
            subject: format!("Control list approved: {list_title}"),
            body: with_note(
                vec![field("Control list", format!("#{list_id} {list_title}"))],
                note,
            ),
        },
        DomainEvent::ControlListRejected {
            list_id,
            list_title,
            note,
            ..
        } => MessageDescriptor {
            subject: format!("Control list rejected: {list_title}"),
            body: with_note(
                vec![field("Control list", format!("#{list_id} {list_title}"))],
                note,
            ),
        },
        DomainEvent::MachineStatusChanged {
            machine_id,
            machine_name,
            old_status,
            new_status,
            ..
        } => MessageDescriptor {
            subject: format!("Machine status changed: {machine_name} is now {new_status}"),
            body: vec![
                field("Machine", format!("#{machine_id} {machine_name}")),
                field("Previous status", old_status),
                field("New status", new_status),
            ],
        },
        DomainEvent::EmergencyAlertRaised {
            alert_type,
            message,
            machine_id,
            ..
        } => {
            let mut body = vec![
                field("Alert type", alert_type),
                field("Message", message),
            ];
            if let Some(id) = machine_id {
                body.push(field("Machine", format!("#{id}")));
            }
            MessageDescriptor {
                subject: format!("{URGENCY_MARKER} Emergency alert: {alert_type}"),
                body,
            }
        }
    }
}

fn with_note(
    mut body: Vec<(String, String)>,
    note: &Option<String>,
) -> Vec<(String, String)> {
    if let Some(note) = note {
        body.push(field("Note", note));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn emergency_subject_carries_urgency_marker() {
        let event = DomainEvent::EmergencyAlertRaised {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            company_id: 10,
            alert_type: "fire".into(),
            message: "Fire near bay 3".into(),
            machine_id: Some(42),
            raised_by: 1,
        };
        let msg = render(&event);
        assert!(msg.subject.starts_with(URGENCY_MARKER));
        assert!(msg.body.iter().any(|(label, value)| label == "Machine" && value == "#42"));
    }

    #[test]
    fn rejection_note_is_included() {
        let event = DomainEvent::ControlListRejected {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            list_id: 7,
            list_title: "Daily check".into(),
            company_id: 10,
            operator_id: 3,
            decided_by: 5,
            note: Some("brakes failed inspection".into()),
        };
        let msg = render(&event);
        assert_eq!(msg.subject, "Control list rejected: Daily check");
        assert!(msg
            .body
            .iter()
            .any(|(label, value)| label == "Note" && value == "brakes failed inspection"));
    }

    #[test]
    fn approval_without_note_omits_note_field() {
        let event = DomainEvent::ControlListApproved {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            list_id: 7,
            list_title: "Daily check".into(),
            company_id: 10,
            operator_id: 3,
            decided_by: 5,
            note: None,
        };
        let msg = render(&event);
        assert!(msg.body.iter().all(|(label, _)| label != "Note"));
    }

    #[test]
    fn status_change_shows_old_and_new() {
        use crate::domain::MachineStatus;
        let event = DomainEvent::MachineStatusChanged {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            machine_id: 42,
            machine_name: "EX-1".into(),
            company_id: 10,
            old_status: MachineStatus::Active,
            new_status: MachineStatus::OutOfService,
        };
        let msg = render(&event);
        assert_eq!(
            msg.subject,
            "Machine status changed: EX-1 is now out_of_service"
        );
        assert!(msg
            .body
            .iter()
            .any(|(label, value)| label == "Previous status" && value == "active"));
    }

    #[test]
    fn submission_reports_item_counts() {
        let event = DomainEvent::ControlListSubmitted {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            list_id: 7,
            list_title: "Daily check".into(),
            company_id: 10,
            machine_id: 42,
            operator_id: 3,
            total_items: 5,
            passed_items: 4,
            failed_items: 1,
        };
        let msg = render(&event);
        assert!(msg.body.iter().any(|(label, value)| label == "Passed" && value == "4"));
        assert!(msg.body.iter().any(|(label, value)| label == "Failed" && value == "1"));
    }
}
