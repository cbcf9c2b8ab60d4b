use actix_web::{web, HttpResponse};
use tracing::debug;

use crate::error::Result;
use crate::middleware::UserId;
use crate::models::FeedResponse;
use crate::services::auth_gate::AuthGate;
use crate::services::feed::{FeedSnapshot, FeedStore, PgFeedSource};

pub type AppFeedStore = FeedStore<PgFeedSource>;

fn to_response(snapshot: FeedSnapshot) -> HttpResponse {
    HttpResponse::Ok().json(FeedResponse {
        items: snapshot.items.as_ref().clone(),
        has_more: snapshot.has_more,
    })
}

/// Current feed snapshot; performs the initial load if the caller has no
/// feed state yet.
pub async fn get_feed(
    user_id: UserId,
    gate: web::Data<AuthGate>,
    store: web::Data<AppFeedStore>,
) -> Result<HttpResponse> {
    gate.authorize(user_id.0).await?;

    let snapshot = match store.snapshot(user_id.0) {
        Some(snapshot) => snapshot,
        None => {
            debug!(user_id = %user_id.0, "No feed state; running initial load");
            store.refresh(user_id.0).await?
        }
    };

    Ok(to_response(snapshot))
}

/// Re-fetch page 0 and replace the snapshot.
pub async fn refresh_feed(
    user_id: UserId,
    gate: web::Data<AuthGate>,
    store: web::Data<AppFeedStore>,
) -> Result<HttpResponse> {
    gate.authorize(user_id.0).await?;
    let snapshot = store.refresh(user_id.0).await?;
    Ok(to_response(snapshot))
}

/// Fetch the next page and fold it into the snapshot.
pub async fn load_more(
    user_id: UserId,
    gate: web::Data<AuthGate>,
    store: web::Data<AppFeedStore>,
) -> Result<HttpResponse> {
    gate.authorize(user_id.0).await?;
    let snapshot = store.load_more(user_id.0).await?;
    Ok(to_response(snapshot))
}
