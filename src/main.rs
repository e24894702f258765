mod authz;
mod cli;
mod config;
mod delivery;
mod dispatch;
mod domain;
mod error;
mod message;
mod rate_limit;
mod store;
mod ui;
mod validate;
mod workflow;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::authz::RoleScopeGate;
use crate::cli::{Cli, Command};
use crate::config::CheckgateConfig;
use crate::delivery::QueuedDelivery;
use crate::dispatch::NotificationDispatcher;
use crate::domain::{
    Actor, CheckItem, ControlList, ItemOutcome, MachinePayload, MachineStatus, MachineType, Role,
};
use crate::rate_limit::RateLimiter;
use crate::store::MemoryStore;
use crate::ui::Output;
use crate::workflow::{Decision, EmergencyAlert, WorkflowEngine};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Demo => run_demo().await,
        Command::CheckConfig { file } => {
            let config = CheckgateConfig::load_from(Path::new(&file))?;
            println!("{config:#?}");
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Scripted end-to-end walk through the approval workflow: registration,
/// submission, a few expected failures, a decision, a status change and an
/// emergency alert, then a drain of the delivery queue.
async fn run_demo() -> Result<()> {
    let config = CheckgateConfig::load()?;
    let out = Output::new();

    let store = Arc::new(MemoryStore::new());
    store.seed_actor(Actor::new(1, "U1", "u1@acme.test", Role::Operator, 10));
    store.seed_actor(Actor::new(2, "S2", "s2@acme.test", Role::Supervisor, 10));
    store.seed_actor(
        Actor::new(3, "S1", "s1@other.test", Role::Supervisor, 20).with_scope(vec![20]),
    );

    let (channel, worker) = QueuedDelivery::new();
    let dispatcher = NotificationDispatcher::new(
        Arc::clone(&store),
        channel,
        config.on_call_address.clone(),
    );
    let engine = WorkflowEngine::new(
        Arc::clone(&store),
        RoleScopeGate,
        dispatcher,
        RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window()),
        config.decision_policy.clone(),
    );

    out.step("Register machine");
    let mut payload = MachinePayload::new("EX-1", MachineType::Excavator, "CAT 320", "SN-100");
    payload.production_date = Some("2023-06-01".parse()?);
    payload.installation_date = Some("2023-08-15".parse()?);
    let machine = engine.create_machine(2, payload)?;
    println!("  machine #{} registered ({})", machine.id, machine.serial_number);

    store.seed_list(ControlList::new(
        7,
        "Daily excavator inspection",
        10,
        machine.id,
        1,
        vec![
            CheckItem::new("Oil level", ItemOutcome::Pass),
            CheckItem::new("Hydraulics", ItemOutcome::Pass),
            CheckItem::new("Brakes", ItemOutcome::Fail),
            CheckItem::new("Tracks", ItemOutcome::Pass),
            CheckItem::new("Cabin safety", ItemOutcome::Pass),
        ],
    ));

    out.step("Operator submits checklist");
    match engine.submit_control_list(7, 1) {
        Ok(receipt) => out.transition(&receipt),
        Err(e) => out.expected_failure(&e),
    }

    out.step("Out-of-scope supervisor tries to approve");
    match engine.decide_control_list(7, 3, Decision::Approved, None) {
        Ok(receipt) => out.transition(&receipt),
        Err(e) => out.expected_failure(&e),
    }

    out.step("Supervisor rejects without a note");
    match engine.decide_control_list(7, 2, Decision::Rejected, None) {
        Ok(receipt) => out.transition(&receipt),
        Err(e) => out.expected_failure(&e),
    }

    out.step("Supervisor rejects with a note");
    match engine.decide_control_list(
        7,
        2,
        Decision::Rejected,
        Some("Brakes failed inspection, ground the machine".into()),
    ) {
        Ok(receipt) => out.transition(&receipt),
        Err(e) => out.expected_failure(&e),
    }

    out.step("Machine taken out of service");
    let mut payload = MachinePayload::new("EX-1", MachineType::Excavator, "CAT 320", "SN-100");
    payload.status = Some(MachineStatus::OutOfService);
    match engine.update_machine(machine.id, 2, payload) {
        Ok(receipt) => println!(
            "  machine #{} is now {}",
            receipt.machine.id, receipt.machine.status
        ),
        Err(e) => out.expected_failure(&e),
    }

    out.step("Emergency alert");
    match engine.raise_emergency_alert(
        1,
        EmergencyAlert {
            alert_type: "fire".into(),
            message: "Fire near bay 3".into(),
            machine_id: Some(machine.id),
        },
    ) {
        Ok(_) => println!("  alert queued"),
        Err(e) => out.expected_failure(&e),
    }

    // Dropping the engine closes the queue so the drain below terminates.
    drop(engine);

    out.step("Delivery queue");
    for job in worker.drain().await {
        out.job(&job);
    }

    Ok(())
}
