use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::actor::CompanyId;

pub type MachineId = u64;

/// Equipment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineType {
    Excavator,
    Bulldozer,
    Crane,
    Loader,
    Grader,
    Compactor,
    Drill,
    Pump,
    Generator,
    Other,
}

/// Operational status of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineStatus {
    Active,
    Inactive,
    Maintenance,
    OutOfService,
}

impl MachineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MachineStatus::Active => "active",
            MachineStatus::Inactive => "inactive",
            MachineStatus::Maintenance => "maintenance",
            MachineStatus::OutOfService => "out_of_service",
        }
    }
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric specification set. Each value has a minimum bound enforced by
/// the validator: engine power >= 1 HP, weight >= 0.1 t, fuel >= 1 L.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Specifications {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_capacity: Option<f64>,
}

/// A registered piece of equipment. Referenced by control lists; mutated
/// only through the workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub uuid: Uuid,
    pub company_id: CompanyId,
    pub name: String,
    pub machine_type: MachineType,
    pub model: String,
    /// Globally unique, case-sensitive exact match.
    pub serial_number: String,
    pub manufacturer: Option<String>,
    pub production_date: Option<NaiveDate>,
    pub installation_date: Option<NaiveDate>,
    pub specifications: Specifications,
    pub status: MachineStatus,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl Machine {
    pub fn from_payload(id: MachineId, company_id: CompanyId, payload: MachinePayload) -> Self {
        Self {
            id,
            uuid: Uuid::new_v4(),
            company_id,
            name: payload.name,
            machine_type: payload.machine_type,
            model: payload.model,
            serial_number: payload.serial_number,
            manufacturer: payload.manufacturer,
            production_date: payload.production_date,
            installation_date: payload.installation_date,
            specifications: payload.specifications,
            status: payload.status.unwrap_or(MachineStatus::Active),
            location: payload.location,
            notes: payload.notes,
            version: 0,
            created_at: Utc::now(),
        }
    }

    /// Applies an update payload in place, leaving identity and version
    /// untouched (version is bumped by the store at commit).
    pub fn apply_payload(&mut self, payload: MachinePayload) {
        self.name = payload.name;
        self.machine_type = payload.machine_type;
        self.model = payload.model;
        self.serial_number = payload.serial_number;
        self.manufacturer = payload.manufacturer;
        self.production_date = payload.production_date;
        self.installation_date = payload.installation_date;
        self.specifications = payload.specifications;
        if let Some(status) = payload.status {
            self.status = status;
        }
        self.location = payload.location;
        self.notes = payload.notes;
    }
}

/// Inbound create/update payload for a machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachinePayload {
    pub name: String,
    pub machine_type: MachineType,
    pub model: String,
    pub serial_number: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub production_date: Option<NaiveDate>,
    #[serde(default)]
    pub installation_date: Option<NaiveDate>,
    #[serde(default)]
    pub specifications: Specifications,
    #[serde(default)]
    pub status: Option<MachineStatus>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl MachinePayload {
    pub fn new(
        name: impl Into<String>,
        machine_type: MachineType,
        model: impl Into<String>,
        serial_number: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            machine_type,
            model: model.into(),
            serial_number: serial_number.into(),
            manufacturer: None,
            production_date: None,
            installation_date: None,
            specifications: Specifications::default(),
            status: None,
            location: None,
            notes: None,
        }
    }
}
