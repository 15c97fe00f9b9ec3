use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::token::{TokenError, UserClaims};

/// Account role. Strings outside the known set become `Unknown`, which no gate admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Customer,
    Staff,
    Admin,
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Staff => "staff",
            Role::Admin => "admin",
            Role::Unknown => "unknown",
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "customer" => Role::Customer,
            "staff" => Role::Staff,
            "admin" => Role::Admin,
            _ => Role::Unknown,
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalKind {
    Customer(i64),
    Staff(i64),
}

/// The identity a request was authenticated as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub kind: PrincipalKind,
    pub name: String,
    pub email: String,
    pub role: Option<Role>,
}

impl Principal {
    pub fn id(&self) -> i64 {
        match self.kind {
            PrincipalKind::Customer(id) | PrincipalKind::Staff(id) => id,
        }
    }

    pub fn to_claims(&self) -> UserClaims {
        let (cust_id, staff_id) = match self.kind {
            PrincipalKind::Customer(id) => (Some(id), None),
            PrincipalKind::Staff(id) => (None, Some(id)),
        };
        UserClaims {
            cust_id,
            staff_id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    pub fn to_json(&self) -> Value {
        let claims = self.to_claims();
        json!({
            "custId": claims.cust_id,
            "staffId": claims.staff_id,
            "name": claims.name,
            "email": claims.email,
            "role": self.role.map(|r| r.as_str()),
        })
    }
}

impl TryFrom<UserClaims> for Principal {
    type Error = TokenError;

    /// Exactly one of `custId` / `staffId` must be present
    fn try_from(claims: UserClaims) -> Result<Self, Self::Error> {
        let kind = match (claims.cust_id, claims.staff_id) {
            (Some(id), None) => PrincipalKind::Customer(id),
            (None, Some(id)) => PrincipalKind::Staff(id),
            (Some(_), Some(_)) => {
                return Err(TokenError::InvalidClaims("both custId and staffId are set".to_string()))
            }
            (None, None) => {
                return Err(TokenError::InvalidClaims("neither custId nor staffId is set".to_string()))
            }
        };

        Ok(Principal {
            kind,
            name: claims.name,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Authorization layered on an already resolved principal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleGate {
    StaffOrAbove,
    AdminOnly,
}

impl RoleGate {
    pub fn permits(self, role: Option<Role>) -> bool {
        let Some(role) = role else {
            return false;
        };

        match self {
            RoleGate::StaffOrAbove => match role {
                Role::Staff | Role::Admin => true,
                Role::Customer | Role::Unknown => false,
            },
            RoleGate::AdminOnly => match role {
                Role::Admin => true,
                Role::Customer | Role::Staff | Role::Unknown => false,
            },
        }
    }
}
