#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Supervisor = 2,
    Employee = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Supervisor),
            3 => Some(Role::Employee),
            _ => None,
        }
    }

    /// Supervisors and admins sign off on leave requests.
    pub fn can_approve(self) -> bool {
        matches!(self, Role::Admin | Role::Supervisor)
    }
}
