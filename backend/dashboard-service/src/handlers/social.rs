use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::middleware::UserId;
use crate::models::ContentItem;
use crate::services::auth_gate::AuthGate;
use crate::services::social::SocialAngleService;

/// Generate a social-media angle for one content item. AI failures come
/// back as distinguishable errors; the operator re-triggers explicitly.
pub async fn social_angle(
    user_id: UserId,
    item: web::Json<ContentItem>,
    gate: web::Data<AuthGate>,
    service: web::Data<SocialAngleService>,
) -> Result<HttpResponse> {
    gate.authorize(user_id.0).await?;
    let analysis = service.social_angle(&item).await?;
    Ok(HttpResponse::Ok().json(analysis))
}
