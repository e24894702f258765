use serde::{Deserialize, Serialize};

pub type ActorId = u64;
pub type CompanyId = u64;

/// Role names as resolved by the external identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Operator,
    Supervisor,
    Admin,
}

impl Role {
    /// Roles permitted to approve or reject submissions within their scope.
    pub fn is_supervisor_capable(self) -> bool {
        matches!(self, Role::Supervisor | Role::Admin)
    }
}

/// An already-authenticated actor. Role and managed scope arrive resolved
/// from the identity collaborator; this core treats them as opaque input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub company_id: CompanyId,
    /// Companies this actor supervises. Ignored for admins, whose scope is
    /// unbounded.
    pub managed_companies: Vec<CompanyId>,
}

impl Actor {
    pub fn new(
        id: ActorId,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        company_id: CompanyId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            role,
            company_id,
            managed_companies: vec![company_id],
        }
    }

    pub fn with_scope(mut self, companies: Vec<CompanyId>) -> Self {
        self.managed_companies = companies;
        self
    }

    /// True when this actor may supervise work belonging to `company_id`.
    pub fn supervises(&self, company_id: CompanyId) -> bool {
        self.role.is_supervisor_capable()
            && (self.role == Role::Admin || self.managed_companies.contains(&company_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_is_not_supervisor_capable() {
        assert!(!Role::Operator.is_supervisor_capable());
        assert!(Role::Supervisor.is_supervisor_capable());
        assert!(Role::Admin.is_supervisor_capable());
    }

    #[test]
    fn supervisor_scope_is_bounded_by_managed_companies() {
        let s = Actor::new(1, "S1", "s1@acme.test", Role::Supervisor, 10);
        assert!(s.supervises(10));
        assert!(!s.supervises(20));

        let wide = s.clone().with_scope(vec![10, 20]);
        assert!(wide.supervises(20));
    }

    #[test]
    fn admin_scope_is_unbounded() {
        let admin = Actor::new(2, "A1", "a1@acme.test", Role::Admin, 10).with_scope(vec![]);
        assert!(admin.supervises(10));
        assert!(admin.supervises(999));
    }

    #[test]
    fn operator_never_supervises() {
        let op = Actor::new(3, "U1", "u1@acme.test", Role::Operator, 10);
        assert!(!op.supervises(10));
    }
}
