//! Pint of the Week winner resolution.
//!
//! The weekly run is an explicit sequence of named steps:
//!
//! `fetch candidates -> request AI choice -> validate choice -> render graphic`
//!
//! Each step can fail terminally with its own failure kind: no eligible
//! candidates, an AI transport/shape failure, a choice that does not
//! resolve to a real candidate, or a rendering failure. A hallucinated
//! winner id is rejected outright and never silently replaced with a
//! fallback choice. Recovery is always a fresh explicit run.

use crate::db::rating_repo;
use crate::error::{AppError, Result};
use crate::models::{PintChoice, PintOfTheWeekResult, Rating};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use gemini_client::{GeminiClient, GeminiError};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const CANDIDATE_WINDOW_DAYS: i64 = 7;

/// Candidate fields the AI actually needs for the decision; heavy fields
/// (photo URL, coordinates, avatar) are stripped before the request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub id: Uuid,
    pub username: Option<String>,
    pub pub_name: Option<String>,
    pub quality: i16,
    pub price: Option<i16>,
    pub message: String,
    pub like_count: i32,
    pub comment_count: i32,
}

impl From<&Rating> for CandidateSummary {
    fn from(rating: &Rating) -> Self {
        Self {
            id: rating.id,
            username: rating.author.as_ref().map(|a| a.username.clone()),
            pub_name: rating.pub_ref.as_ref().map(|p| p.name.clone()),
            quality: rating.quality,
            price: rating.price,
            message: rating.message.clone(),
            like_count: rating.like_count,
            comment_count: rating.comment_count,
        }
    }
}

/// Source of the eligible-candidate set.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn recent_photo_candidates(&self) -> Result<Vec<Rating>>;
}

/// The AI decision seam.
#[async_trait]
pub trait WinnerChooser: Send + Sync {
    async fn choose(&self, candidates: &[CandidateSummary]) -> Result<PintChoice>;
}

/// The graphic-rendering seam.
#[async_trait]
pub trait CardRenderer: Send + Sync {
    async fn render(&self, winner: &Rating) -> Result<String>;
}

pub struct PgCandidateSource {
    pool: PgPool,
}

impl PgCandidateSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateSource for PgCandidateSource {
    async fn recent_photo_candidates(&self) -> Result<Vec<Rating>> {
        let since = Utc::now() - Duration::days(CANDIDATE_WINDOW_DAYS);
        Ok(rating_repo::recent_with_images(&self.pool, since).await?)
    }
}

pub struct GeminiWinnerChooser {
    gemini: Arc<GeminiClient>,
}

impl GeminiWinnerChooser {
    pub fn new(gemini: Arc<GeminiClient>) -> Self {
        Self { gemini }
    }
}

#[async_trait]
impl WinnerChooser for GeminiWinnerChooser {
    async fn choose(&self, candidates: &[CandidateSummary]) -> Result<PintChoice> {
        let prompt = build_choice_prompt(candidates)?;
        let choice: PintChoice = self.gemini.generate_typed(&prompt, choice_schema()).await?;

        if choice.social_score > 100 {
            return Err(GeminiError::SchemaMismatch(format!(
                "socialScore {} is outside 0-100",
                choice.social_score
            ))
            .into());
        }

        Ok(choice)
    }
}

/// Response schema for the winner-selection request, mirrored by
/// `PintChoice`.
pub fn choice_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "id": {
                "type": "STRING",
                "description": "The id of the winning rating, copied exactly from the candidate list."
            },
            "analysis": {
                "type": "STRING",
                "description": "Why this pint wins the week: what makes the photo and review stand out."
            },
            "socialScore": {
                "type": "INTEGER",
                "description": "How well this would perform on social media, from 0 to 100."
            }
        },
        "required": ["id", "analysis", "socialScore"]
    })
}

pub fn build_choice_prompt(candidates: &[CandidateSummary]) -> Result<String> {
    let data = serde_json::to_string_pretty(candidates)?;
    Ok(format!(
        "You are a sharp social media manager for 'Stoutly', a social network for \
        Guinness lovers. Below are this week's pint ratings that include a photo. \
        Pick the single best 'Pint of the Week': weigh the quality and value scores, \
        how compelling the review reads, and the engagement counts.\n\n\
        Candidates (JSON):\n{data}\n\n\
        Respond with the winning candidate's id copied exactly from the list, your \
        analysis of why it wins, and a 0-100 social score."
    ))
}

/// Confirm the AI's reference resolves to a real candidate.
///
/// The returned id must match an element of the same candidate set that
/// was sent; anything else is a hard validation failure, never a
/// substitution.
pub fn validate_choice(candidates: &[Rating], choice: &PintChoice) -> Result<Rating> {
    candidates
        .iter()
        .find(|r| r.id == choice.id)
        .cloned()
        .ok_or_else(|| {
            AppError::AiChoice(format!(
                "The AI selected rating {} which is not in the candidate set",
                choice.id
            ))
        })
}

pub struct PintOfTheWeekProtocol<C, W, R> {
    candidates: C,
    chooser: W,
    renderer: R,
}

impl<C, W, R> PintOfTheWeekProtocol<C, W, R>
where
    C: CandidateSource,
    W: WinnerChooser,
    R: CardRenderer,
{
    pub fn new(candidates: C, chooser: W, renderer: R) -> Self {
        Self {
            candidates,
            chooser,
            renderer,
        }
    }

    /// Drive one full run. Any step error is terminal for this run.
    pub async fn run(&self) -> Result<PintOfTheWeekResult> {
        info!("Pint of the Week: fetching candidates");
        let candidates = self.candidates.recent_photo_candidates().await?;
        if candidates.is_empty() {
            return Err(AppError::NotFound(
                "No ratings with images found in the last 7 days to analyze".to_string(),
            ));
        }

        info!(candidates = candidates.len(), "Pint of the Week: awaiting AI choice");
        let summaries: Vec<CandidateSummary> =
            candidates.iter().map(CandidateSummary::from).collect();
        let choice = self.chooser.choose(&summaries).await?;

        info!(chosen = %choice.id, score = choice.social_score, "Pint of the Week: validating choice");
        let winner = validate_choice(&candidates, &choice)?;

        info!(winner = %winner.id, "Pint of the Week: rendering graphic");
        let sharable_image_data = self.renderer.render(&winner).await?;

        Ok(PintOfTheWeekResult {
            winning_rating_id: winner.id,
            winner,
            analysis_text: choice.analysis,
            social_score: choice.social_score,
            sharable_image_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate(id: Uuid) -> Rating {
        Rating {
            id,
            created_at: Utc::now(),
            quality: 5,
            price: Some(4),
            exact_price: None,
            message: "a perfect dome".into(),
            image_url: Some("https://cdn.stoutly.co.uk/p.jpg".into()),
            like_count: 20,
            comment_count: 4,
            is_private: false,
            pub_ref: None,
            author: None,
        }
    }

    #[test]
    fn known_id_resolves_to_the_candidate() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let candidates: Vec<Rating> = ids.iter().map(|&id| candidate(id)).collect();
        let choice = PintChoice {
            id: ids[1],
            analysis: "stunning".into(),
            social_score: 88,
        };
        assert_eq!(validate_choice(&candidates, &choice).unwrap().id, ids[1]);
    }

    #[test]
    fn unknown_id_fails_without_defaulting() {
        let candidates: Vec<Rating> = (0..3).map(|_| candidate(Uuid::new_v4())).collect();
        let choice = PintChoice {
            id: Uuid::new_v4(),
            analysis: "stunning".into(),
            social_score: 88,
        };
        let err = validate_choice(&candidates, &choice).unwrap_err();
        assert!(matches!(err, AppError::AiChoice(_)));
    }

    #[test]
    fn summary_strips_heavy_fields() {
        let rating = candidate(Uuid::new_v4());
        let summary = CandidateSummary::from(&rating);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("imageUrl").is_none());
        assert!(json.get("image_url").is_none());
        assert_eq!(json["quality"], 5);
    }

    #[test]
    fn choice_prompt_embeds_candidate_ids() {
        let rating = candidate(Uuid::new_v4());
        let prompt = build_choice_prompt(&[CandidateSummary::from(&rating)]).unwrap();
        assert!(prompt.contains(&rating.id.to_string()));
    }
}
