use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::config::StorageConfig;
use crate::error::Result;
use crate::middleware::UserId;
use crate::services::auth_gate::AuthGate;
use crate::services::avatar::resolve_avatar;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    username: String,
    avatar_url: String,
    is_team_member: bool,
    is_developer: bool,
}

/// The caller's profile, resolved avatar, and eligibility flags. An
/// ineligible caller gets the 403 denial from the gate instead.
pub async fn me(
    user_id: UserId,
    gate: web::Data<AuthGate>,
    storage: web::Data<StorageConfig>,
) -> Result<HttpResponse> {
    let profile = gate.authorize(user_id.0).await?;

    let avatar_url = resolve_avatar(
        profile.avatar_id.as_deref(),
        &profile.username,
        &storage.public_base_url,
    );

    Ok(HttpResponse::Ok().json(MeResponse {
        username: profile.username,
        avatar_url,
        is_team_member: profile.is_team_member,
        is_developer: profile.is_developer,
    }))
}
