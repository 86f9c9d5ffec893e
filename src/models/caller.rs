use serde::{Deserialize, Serialize};

/// Closed set of account roles. Kept as an enum so tenant-bypass is a
/// single capability flag instead of string comparisons at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    PropertyOwner,
    LawEnforcement,
    SuperAdmin,
}

impl Role {
    /// Roles exempt from tenant scoping: they see and touch every
    /// tenant's records.
    pub fn bypasses_tenant_scope(&self) -> bool {
        matches!(self, Role::LawEnforcement | Role::SuperAdmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::PropertyOwner => "property_owner",
            Role::LawEnforcement => "law_enforcement",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "property_owner" => Ok(Role::PropertyOwner),
            "law_enforcement" => Ok(Role::LawEnforcement),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Resolved caller identity, supplied by the session layer. The core
/// never re-derives identity; every repository and policy call takes
/// this explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub id: String,
    pub role: Role,
    pub tenant_id: Option<String>,
}

impl Caller {
    pub fn new(id: impl Into<String>, role: Role, tenant_id: Option<&str>) -> Self {
        Self {
            id: id.into(),
            role,
            tenant_id: tenant_id.map(|t| t.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_bypass_flag() {
        assert!(!Role::PropertyOwner.bypasses_tenant_scope());
        assert!(Role::LawEnforcement.bypasses_tenant_scope());
        assert!(Role::SuperAdmin.bypasses_tenant_scope());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::PropertyOwner, Role::LawEnforcement, Role::SuperAdmin] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert!(Role::from_str("admin").is_err());
    }
}
