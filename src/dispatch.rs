//! Notification dispatch: turns committed domain events into queued
//! notification jobs.
//!
//! Dispatch is fire-and-forget from the workflow's point of view. It runs
//! strictly after the triggering transition commits and its failures never
//! roll the transition back. Duplicate notifications are tolerable, lost
//! state transitions are not, so delivery is at-least-once and dispatch is
//! idempotent per event deduplication key.

use std::collections::HashSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::delivery::DeliveryChannel;
use crate::domain::{ActorId, CompanyId, DomainEvent, MachineStatus};
use crate::error::WorkflowError;
use crate::message::{self, MessageDescriptor};

/// Delivery priority, mapped by the transport onto its own queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    High,
}

/// Which transport family a job targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelTag {
    Email,
    Sms,
    Push,
}

/// A queued unit of outbound communication. The core's responsibility ends
/// once a job is handed to the delivery channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationJob {
    pub dedup_key: String,
    pub recipients: Vec<String>,
    pub message: MessageDescriptor,
    pub priority: Priority,
    pub channel: ChannelTag,
}

/// Recipient resolution, answered by the external directory collaborator
/// (role and subscription lookups live outside this core).
pub trait Directory: Send + Sync {
    /// Addresses of all supervisor-capable actors scoped to a company.
    fn scoped_supervisors(&self, company_id: CompanyId) -> Result<Vec<String>, WorkflowError>;
    /// Address of a single actor.
    fn actor_address(&self, actor_id: ActorId) -> Result<String, WorkflowError>;
}

impl<D: Directory + ?Sized> Directory for std::sync::Arc<D> {
    fn scoped_supervisors(&self, company_id: CompanyId) -> Result<Vec<String>, WorkflowError> {
        (**self).scoped_supervisors(company_id)
    }

    fn actor_address(&self, actor_id: ActorId) -> Result<String, WorkflowError> {
        (**self).actor_address(actor_id)
    }
}

pub struct NotificationDispatcher<D, C> {
    directory: D,
    channel: C,
    /// Designated on-call address, always included on emergency alerts.
    on_call_address: String,
    seen: Mutex<HashSet<String>>,
}

impl<D: Directory, C: DeliveryChannel> NotificationDispatcher<D, C> {
    pub fn new(directory: D, channel: C, on_call_address: impl Into<String>) -> Self {
        Self {
            directory,
            channel,
            on_call_address: on_call_address.into(),
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Builds and enqueues the notification jobs for an event. Dispatching
    /// the same logical event twice is a no-op: the deduplication key has
    /// already been recorded and an empty job list comes back.
    pub fn dispatch(&self, event: &DomainEvent) -> Result<Vec<NotificationJob>, WorkflowError> {
        let dedup_key = event.dedup_key();
        {
            let mut seen = self
                .seen
                .lock()
                .map_err(|_| WorkflowError::Server("dispatcher dedup set poisoned".into()))?;
            if !seen.insert(dedup_key.clone()) {
                debug!(%dedup_key, "event already dispatched, skipping");
                return Ok(Vec::new());
            }
        }

        let recipients = self.resolve_recipients(event)?;
        if recipients.is_empty() {
            debug!(%dedup_key, "no recipients resolved, nothing to queue");
            return Ok(Vec::new());
        }

        let job = NotificationJob {
            dedup_key: dedup_key.clone(),
            recipients,
            message: message::render(event),
            priority: priority_for(event),
            channel: ChannelTag::Email,
        };

        self.channel
            .enqueue(job.clone())
            .map_err(|e| WorkflowError::ExternalService(e.to_string()))?;

        info!(
            %dedup_key,
            event_id = %event.event_id(),
            kind = event.kind_name(),
            recipients = job.recipients.len(),
            priority = ?job.priority,
            "notification queued"
        );
        Ok(vec![job])
    }

    fn resolve_recipients(&self, event: &DomainEvent) -> Result<Vec<String>, WorkflowError> {
        match event {
            DomainEvent::ControlListSubmitted { company_id, .. }
            | DomainEvent::MachineStatusChanged { company_id, .. } => {
                self.directory.scoped_supervisors(*company_id)
            }
            DomainEvent::ControlListApproved { operator_id, .. }
            | DomainEvent::ControlListRejected { operator_id, .. } => {
                Ok(vec![self.directory.actor_address(*operator_id)?])
            }
            DomainEvent::EmergencyAlertRaised { company_id, .. } => {
                let mut recipients = self.directory.scoped_supervisors(*company_id)?;
                if !recipients.contains(&self.on_call_address) {
                    recipients.push(self.on_call_address.clone());
                }
                Ok(recipients)
            }
        }
    }
}

fn priority_for(event: &DomainEvent) -> Priority {
    match event {
        DomainEvent::EmergencyAlertRaised { .. } => Priority::High,
        DomainEvent::MachineStatusChanged { new_status, .. }
            if *new_status == MachineStatus::OutOfService =>
        {
            Priority::High
        }
        _ => Priority::Normal,
    }
}
