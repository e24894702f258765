//! Storage collaborator seam.
//!
//! The workflow engine only needs versioned reads plus compare-and-set
//! commits; real persistence lives behind this trait. [`MemoryStore`] is
//! the in-process implementation used by the demo and the test suite, and
//! it doubles as the recipient directory the dispatcher queries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::dispatch::Directory;
use crate::domain::{
    Actor, ActorId, CompanyId, ControlList, ControlListId, Machine, MachineId,
};
use crate::error::WorkflowError;

/// Versioned reads and CAS writes over the workflow's two owned entities.
pub trait WorkflowStore: Send + Sync {
    fn control_list(&self, id: ControlListId) -> Result<ControlList, WorkflowError>;
    fn machine(&self, id: MachineId) -> Result<Machine, WorkflowError>;
    fn actor(&self, id: ActorId) -> Result<Actor, WorkflowError>;

    /// Case-sensitive exact-match lookup, optionally ignoring one machine
    /// (the one being updated).
    fn serial_taken(
        &self,
        serial: &str,
        exclude: Option<MachineId>,
    ) -> Result<bool, WorkflowError>;

    /// Commits `list` if the stored version still equals `expected_version`,
    /// bumping the version; otherwise fails with `Conflict` and leaves the
    /// record untouched.
    fn commit_list(
        &self,
        list: ControlList,
        expected_version: u64,
    ) -> Result<ControlList, WorkflowError>;

    /// CAS commit for machines; inserts when the id is new.
    fn commit_machine(
        &self,
        machine: Machine,
        expected_version: u64,
    ) -> Result<Machine, WorkflowError>;

    /// Allocates the next machine id for a create operation.
    fn allocate_machine_id(&self) -> Result<MachineId, WorkflowError>;
}

impl<S: WorkflowStore + ?Sized> WorkflowStore for Arc<S> {
    fn control_list(&self, id: ControlListId) -> Result<ControlList, WorkflowError> {
        (**self).control_list(id)
    }

    fn machine(&self, id: MachineId) -> Result<Machine, WorkflowError> {
        (**self).machine(id)
    }

    fn actor(&self, id: ActorId) -> Result<Actor, WorkflowError> {
        (**self).actor(id)
    }

    fn serial_taken(
        &self,
        serial: &str,
        exclude: Option<MachineId>,
    ) -> Result<bool, WorkflowError> {
        (**self).serial_taken(serial, exclude)
    }

    fn commit_list(
        &self,
        list: ControlList,
        expected_version: u64,
    ) -> Result<ControlList, WorkflowError> {
        (**self).commit_list(list, expected_version)
    }

    fn commit_machine(
        &self,
        machine: Machine,
        expected_version: u64,
    ) -> Result<Machine, WorkflowError> {
        (**self).commit_machine(machine, expected_version)
    }

    fn allocate_machine_id(&self) -> Result<MachineId, WorkflowError> {
        (**self).allocate_machine_id()
    }
}

#[derive(Default)]
struct Inner {
    lists: HashMap<ControlListId, ControlList>,
    machines: HashMap<MachineId, Machine>,
    actors: HashMap<ActorId, Actor>,
    next_machine_id: MachineId,
}

/// In-memory store. A single mutex serializes all writes, which is what
/// gives the CAS commits their at-most-one-winner guarantee.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, WorkflowError> {
        self.inner
            .lock()
            .map_err(|_| WorkflowError::Server("store mutex poisoned".into()))
    }

    pub fn seed_actor(&self, actor: Actor) {
        if let Ok(mut inner) = self.lock() {
            inner.actors.insert(actor.id, actor);
        }
    }

    pub fn seed_list(&self, list: ControlList) {
        if let Ok(mut inner) = self.lock() {
            inner.lists.insert(list.id, list);
        }
    }

    pub fn seed_machine(&self, machine: Machine) {
        if let Ok(mut inner) = self.lock() {
            inner.next_machine_id = inner.next_machine_id.max(machine.id);
            inner.machines.insert(machine.id, machine);
        }
    }

}

impl WorkflowStore for MemoryStore {
    fn control_list(&self, id: ControlListId) -> Result<ControlList, WorkflowError> {
        self.lock()?
            .lists
            .get(&id)
            .cloned()
            .ok_or(WorkflowError::NotFound {
                entity: "control list",
                id,
            })
    }

    fn machine(&self, id: MachineId) -> Result<Machine, WorkflowError> {
        self.lock()?
            .machines
            .get(&id)
            .cloned()
            .ok_or(WorkflowError::NotFound {
                entity: "machine",
                id,
            })
    }

    fn actor(&self, id: ActorId) -> Result<Actor, WorkflowError> {
        self.lock()?
            .actors
            .get(&id)
            .cloned()
            .ok_or(WorkflowError::NotFound { entity: "actor", id })
    }

    fn serial_taken(
        &self,
        serial: &str,
        exclude: Option<MachineId>,
    ) -> Result<bool, WorkflowError> {
        Ok(self
            .lock()?
            .machines
            .values()
            .any(|m| m.serial_number == serial && Some(m.id) != exclude))
    }

    fn commit_list(
        &self,
        mut list: ControlList,
        expected_version: u64,
    ) -> Result<ControlList, WorkflowError> {
        let mut inner = self.lock()?;
        let current = inner.lists.get(&list.id).map(|l| l.version);
        match current {
            Some(version) if version == expected_version => {
                list.version = expected_version + 1;
                inner.lists.insert(list.id, list.clone());
                Ok(list)
            }
            Some(_) => Err(WorkflowError::Conflict(format!(
                "control list {} was modified concurrently",
                list.id
            ))),
            None => Err(WorkflowError::NotFound {
                entity: "control list",
                id: list.id,
            }),
        }
    }

    fn commit_machine(
        &self,
        mut machine: Machine,
        expected_version: u64,
    ) -> Result<Machine, WorkflowError> {
        let mut inner = self.lock()?;
        let current = inner.machines.get(&machine.id).map(|m| m.version);
        match current {
            None if expected_version == 0 => {
                machine.version = 1;
                inner.machines.insert(machine.id, machine.clone());
                Ok(machine)
            }
            Some(version) if version == expected_version => {
                machine.version = expected_version + 1;
                inner.machines.insert(machine.id, machine.clone());
                Ok(machine)
            }
            Some(_) => Err(WorkflowError::Conflict(format!(
                "machine {} was modified concurrently",
                machine.id
            ))),
            None => Err(WorkflowError::NotFound {
                entity: "machine",
                id: machine.id,
            }),
        }
    }

    fn allocate_machine_id(&self) -> Result<MachineId, WorkflowError> {
        let mut inner = self.lock()?;
        inner.next_machine_id += 1;
        Ok(inner.next_machine_id)
    }
}

impl Directory for MemoryStore {
    fn scoped_supervisors(&self, company_id: CompanyId) -> Result<Vec<String>, WorkflowError> {
        let inner = self.lock()?;
        let mut addresses: Vec<String> = inner
            .actors
            .values()
            .filter(|a| a.supervises(company_id))
            .map(|a| a.email.clone())
            .collect();
        addresses.sort();
        Ok(addresses)
    }

    fn actor_address(&self, actor_id: ActorId) -> Result<String, WorkflowError> {
        let inner = self.lock()?;
        inner
            .actors
            .get(&actor_id)
            .map(|a| a.email.clone())
            .ok_or(WorkflowError::NotFound {
                entity: "actor",
                id: actor_id,
            })
    }
}
