use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::error::Result;
use crate::middleware::UserId;
use crate::models::{HistoryEntry, PintOfTheWeekResult};
use crate::services::auth_gate::AuthGate;
use crate::services::graphic::GraphicRenderer;
use crate::services::history::{HistoryStore, RedisBackend};
use crate::services::pint_of_week::{GeminiWinnerChooser, PgCandidateSource, PintOfTheWeekProtocol};

pub type AppPintProtocol =
    PintOfTheWeekProtocol<PgCandidateSource, GeminiWinnerChooser, GraphicRenderer>;
pub type AppHistoryStore = HistoryStore<RedisBackend>;

/// Run the full Pint of the Week selection. Results are ephemeral; only
/// an explicit history save persists anything.
pub async fn run(
    user_id: UserId,
    gate: web::Data<AuthGate>,
    protocol: web::Data<AppPintProtocol>,
) -> Result<HttpResponse> {
    gate.authorize(user_id.0).await?;
    let result = protocol.run().await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Saved results, most recent first.
pub async fn list_history(
    user_id: UserId,
    gate: web::Data<AuthGate>,
    history: web::Data<AppHistoryStore>,
) -> Result<HttpResponse> {
    gate.authorize(user_id.0).await?;
    let entries = history.list().await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// Persist a completed run as an immutable history snapshot.
pub async fn save_history(
    user_id: UserId,
    result: web::Json<PintOfTheWeekResult>,
    gate: web::Data<AuthGate>,
    history: web::Data<AppHistoryStore>,
) -> Result<HttpResponse> {
    gate.authorize(user_id.0).await?;

    let result = result.into_inner();
    let entry = HistoryEntry {
        analysis: result.analysis_text,
        social_score: result.social_score,
        winner: result.winner,
        sharable_image_data: result.sharable_image_data,
        date: Utc::now(),
    };

    let entries = history.save(entry).await?;
    Ok(HttpResponse::Ok().json(entries))
}
