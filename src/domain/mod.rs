pub mod actor;
pub mod control_list;
pub mod event;
pub mod machine;

pub use actor::{Actor, ActorId, CompanyId, Role};
pub use control_list::{
    CheckItem, ControlList, ControlListId, ItemCounts, ItemOutcome, ListStatus,
};
pub use event::DomainEvent;
pub use machine::{Machine, MachineId, MachinePayload, MachineStatus, MachineType, Specifications};
