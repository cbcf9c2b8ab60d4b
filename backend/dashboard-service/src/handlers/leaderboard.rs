use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::middleware::UserId;
use crate::services::auth_gate::AuthGate;
use crate::services::leaderboard::LeaderboardService;

/// Generate the weekly leaderboard social post.
pub async fn generate_post(
    user_id: UserId,
    gate: web::Data<AuthGate>,
    service: web::Data<LeaderboardService>,
) -> Result<HttpResponse> {
    gate.authorize(user_id.0).await?;
    let post = service.generate_post().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "post": post })))
}
