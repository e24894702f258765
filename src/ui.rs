//! Terminal output for the demo — colored summaries via `console`.

use console::Style;

use crate::dispatch::{NotificationJob, Priority};
use crate::error::WorkflowError;
use crate::workflow::TransitionReceipt;

/// Styled printer for workflow outcomes.
pub struct Output {
    green: Style,
    red: Style,
    yellow: Style,
    cyan: Style,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan(),
        }
    }

    pub fn step(&self, label: &str) {
        println!("\n{}", self.cyan.apply_to(format!("── {label} ──")));
    }

    pub fn transition(&self, receipt: &TransitionReceipt) {
        println!(
            "  {} control list #{} is now {}",
            self.green.apply_to("✓"),
            receipt.list.id,
            receipt.list.status
        );
        if !receipt.dispatch_ok {
            println!(
                "  {} notification dispatch failed (transition stands)",
                self.yellow.apply_to("!")
            );
        }
    }

    /// Prints an error the scenario expected to see. Recoverable failures
    /// (validation, conflict, rate limit) render softer than hard denials.
    pub fn expected_failure(&self, err: &WorkflowError) {
        let style = if err.is_caller_recoverable() {
            &self.yellow
        } else {
            &self.red
        };
        println!("  {} {err}", style.apply_to("✗"));
    }

    pub fn job(&self, job: &NotificationJob) {
        let marker = match job.priority {
            Priority::High => self.red.apply_to("HIGH  ").to_string(),
            Priority::Normal => self.yellow.apply_to("normal").to_string(),
        };
        println!(
            "  [{marker}] {} → {}",
            job.message.subject,
            job.recipients.join(", ")
        );
    }
}
