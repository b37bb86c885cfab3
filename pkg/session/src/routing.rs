//! Post-login destination routing.
//!
//! A linear fallback chain, decided once per successful login. The
//! decision is returned as data; the gateway turns it into an HTTP
//! redirect.

use async_trait::async_trait;

use crate::claims::{self, Role};
use crate::token::ClaimsMap;

/// Best-effort lookup of the canonical profile id for a freshly issued
/// token.
///
/// A single attempt with no retry; every failure mode (network error,
/// non-2xx response, response without an id) collapses to `None`, which
/// sends the router to its next fallback tier.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn lookup_profile_id(&self, token: &str) -> Option<i64>;
}

/// Where a user lands right after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Admin,
    Technician(i64),
    TechnicianHome,
    Dashboard,
}

impl Destination {
    /// Renders the destination as a request path.
    pub fn path(&self) -> String {
        match self {
            Self::Admin => "/admin".to_string(),
            Self::Technician(id) => format!("/techniciens/{id}"),
            Self::TechnicianHome => "/technicien".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
        }
    }
}

/// Decides the post-login destination for a normalized role.
///
/// Admins go straight to the admin console and the profile lookup is never
/// attempted. Technicians are routed to their profile page: the canonical
/// id from the backend wins, then an id derived from the token claims,
/// then the generic technician landing page. Everyone else lands on the
/// dashboard.
pub async fn decide_destination<P>(
    role: Role,
    claims: Option<&ClaimsMap>,
    token: &str,
    profiles: &P,
) -> Destination
where
    P: ProfileLookup + ?Sized,
{
    match role {
        Role::Admin => Destination::Admin,
        Role::Technicien => {
            if let Some(id) = profiles.lookup_profile_id(token).await {
                return Destination::Technician(id);
            }
            if let Some(id) = claims.and_then(claims::extract_id) {
                return Destination::Technician(id);
            }
            Destination::TechnicianHome
        }
        Role::User => Destination::Dashboard,
    }
}
