//! Dashboard authorization gate.
//!
//! A valid session token only establishes identity. Access to dashboard
//! content additionally requires the linked profile to carry the
//! `is_team_member` or `is_developer` flag. Any failure to produce an
//! eligible profile, including a profile-fetch error, is a denial rather
//! than a server error, and nothing is cached between requests.

use crate::db::profile_repo;
use crate::error::{AppError, Result};
use crate::models::Profile;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

pub struct AuthGate {
    pool: PgPool,
}

impl AuthGate {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Return the caller's profile if it is dashboard-eligible.
    pub async fn authorize(&self, user_id: Uuid) -> Result<Profile> {
        let profile = match profile_repo::find_by_user_id(&self.pool, user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Profile fetch failed during authorization");
                return Err(AppError::Forbidden(
                    "Your profile could not be verified for dashboard access".to_string(),
                ));
            }
        };

        match profile {
            Some(p) if Self::is_eligible(&p) => Ok(p),
            Some(_) => Err(AppError::Forbidden(
                "This dashboard is restricted to Stoutly team members".to_string(),
            )),
            None => Err(AppError::Forbidden(
                "No profile is linked to this account".to_string(),
            )),
        }
    }

    pub fn is_eligible(profile: &Profile) -> bool {
        profile.is_team_member || profile.is_developer
    }
}
