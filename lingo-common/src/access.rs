//! Roles, capabilities and the route access policy
//!
//! All authorization decisions go through [`has_permission`]. The capability
//! table in [`Capability::permitted_roles`] is the only place that says which
//! role may do what; the route policy only maps path prefixes onto
//! capabilities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User role stored in `users.role`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Premium,
    Instructor,
    Admin,
}

impl Role {
    /// Every role, lowest privilege first
    pub const ALL: [Role; 4] = [Role::User, Role::Premium, Role::Instructor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Premium => "premium",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "premium" => Ok(Role::Premium),
            "instructor" => Ok(Role::Instructor),
            "admin" => Ok(Role::Admin),
            other => Err(crate::Error::UnknownRole(other.to_string())),
        }
    }
}

/// Named capability checked by route guards and handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    Dashboard,
    CoursesRead,
    CoursesWrite,
    CoursesDelete,
    UsersRead,
    UsersWrite,
    UsersDelete,
    PremiumFeatures,
    AiChatbot,
    AdminPanel,
    Analytics,
}

impl Capability {
    /// Roles allowed to exercise this capability
    pub fn permitted_roles(&self) -> &'static [Role] {
        use Role::*;
        match self {
            Capability::Dashboard | Capability::CoursesRead => &[User, Premium, Instructor, Admin],
            Capability::CoursesWrite | Capability::Analytics => &[Instructor, Admin],
            Capability::PremiumFeatures | Capability::AiChatbot => &[Premium, Instructor, Admin],
            Capability::CoursesDelete
            | Capability::UsersRead
            | Capability::UsersWrite
            | Capability::UsersDelete
            | Capability::AdminPanel => &[Admin],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Dashboard => "DASHBOARD",
            Capability::CoursesRead => "COURSES_READ",
            Capability::CoursesWrite => "COURSES_WRITE",
            Capability::CoursesDelete => "COURSES_DELETE",
            Capability::UsersRead => "USERS_READ",
            Capability::UsersWrite => "USERS_WRITE",
            Capability::UsersDelete => "USERS_DELETE",
            Capability::PremiumFeatures => "PREMIUM_FEATURES",
            Capability::AiChatbot => "AI_CHATBOT",
            Capability::AdminPanel => "ADMIN_PANEL",
            Capability::Analytics => "ANALYTICS",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `role` may exercise `capability`
pub fn has_permission(role: Role, capability: Capability) -> bool {
    capability.permitted_roles().contains(&role)
}

/// Path prefix to capability. First match wins.
const ROUTE_POLICY: &[(&str, Capability)] = &[
    ("/dashboard", Capability::Dashboard),
    ("/profile", Capability::Dashboard),
    ("/chatbot", Capability::AiChatbot),
    ("/admin", Capability::AdminPanel),
    ("/instructor", Capability::CoursesWrite),
    ("/api/admin", Capability::AdminPanel),
    ("/api/instructor", Capability::CoursesWrite),
    ("/api/analytics", Capability::Analytics),
    ("/api/user-progress", Capability::Dashboard),
    ("/api/user", Capability::Dashboard),
    ("/api/quiz-results", Capability::Dashboard),
    ("/api/learned-vocabulary", Capability::Dashboard),
];

/// Capability guarding `path`, if any
pub fn required_capability(path: &str) -> Option<Capability> {
    ROUTE_POLICY
        .iter()
        .find(|(prefix, _)| path_has_prefix(path, prefix))
        .map(|(_, capability)| *capability)
}

/// Segment-aware prefix match: `/admin` covers `/admin` and `/admin/x`
/// but not `/administrator`.
fn path_has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Outcome of checking a request path against the route policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Path is not guarded, or the caller's role is permitted
    Allow,
    /// API path, no authenticated caller
    Unauthorized,
    /// API path, caller's role not permitted
    Forbidden {
        capability: Capability,
        required: &'static [Role],
        current: Role,
    },
    /// Page path, no authenticated caller: send to the login page
    RedirectToLogin { location: String },
    /// Page path, caller's role not permitted
    RedirectToUnauthorized,
}

/// Decide what to do with a request for `path` made by a caller with `role`
/// (`None` when not authenticated)
pub fn evaluate(path: &str, role: Option<Role>) -> AccessDecision {
    let Some(capability) = required_capability(path) else {
        return AccessDecision::Allow;
    };
    let is_api = path_has_prefix(path, "/api");

    match role {
        None if is_api => AccessDecision::Unauthorized,
        None => AccessDecision::RedirectToLogin {
            location: format!("/login?redirect={}", encode_query_value(path)),
        },
        Some(role) if has_permission(role, capability) => AccessDecision::Allow,
        Some(role) if is_api => AccessDecision::Forbidden {
            capability,
            required: capability.permitted_roles(),
            current: role,
        },
        Some(_) => AccessDecision::RedirectToUnauthorized,
    }
}

fn encode_query_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
