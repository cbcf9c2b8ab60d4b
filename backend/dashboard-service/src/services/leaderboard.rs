//! Weekly leaderboard summary.
//!
//! Aggregates the last seven days of contributor and new-member stats and
//! asks Gemini for a freeform social post celebrating them.

use crate::db::{profile_repo, rating_repo};
use crate::error::{AppError, Result};
use crate::models::LeaderboardStats;
use chrono::{Duration, Utc};
use gemini_client::GeminiClient;
use sqlx::PgPool;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

const TOP_CONTRIBUTOR_LIMIT: i64 = 10;

pub struct LeaderboardService {
    pool: PgPool,
    gemini: Arc<GeminiClient>,
}

impl LeaderboardService {
    pub fn new(pool: PgPool, gemini: Arc<GeminiClient>) -> Self {
        Self { pool, gemini }
    }

    pub async fn weekly_stats(&self) -> Result<LeaderboardStats> {
        let since = Utc::now() - Duration::days(7);

        let (top_contributors, new_member_count) = tokio::try_join!(
            rating_repo::top_contributors(&self.pool, since, TOP_CONTRIBUTOR_LIMIT),
            profile_repo::count_new_members(&self.pool, since),
        )?;

        Ok(LeaderboardStats {
            top_contributors,
            new_member_count,
        })
    }

    /// Generate the weekly leaderboard social post.
    pub async fn generate_post(&self) -> Result<String> {
        let stats = self.weekly_stats().await?;
        if stats.top_contributors.is_empty() {
            return Err(AppError::NotFound(
                "No user activity found in the last 7 days".to_string(),
            ));
        }

        info!(
            contributors = stats.top_contributors.len(),
            new_members = stats.new_member_count,
            "Generating leaderboard post"
        );

        let prompt = build_prompt(&stats);
        let post = self.gemini.generate_text(&prompt).await?;
        Ok(post)
    }
}

pub fn build_prompt(stats: &LeaderboardStats) -> String {
    let mut board = String::new();
    for (rank, c) in stats.top_contributors.iter().enumerate() {
        let _ = writeln!(
            board,
            "{}. {} - {} ratings",
            rank + 1,
            c.username,
            c.rating_count
        );
    }

    format!(
        "You are the social media voice of 'Stoutly', a social network for Guinness \
        lovers. Write a short, upbeat social media post celebrating this week's most \
        active members. Mention a few usernames, keep it under 120 words, and finish \
        with 2-3 hashtags including #Stoutly.\n\n\
        This week's top contributors:\n{board}\n\
        New members who joined this week: {}",
        stats.new_member_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Contributor;

    #[test]
    fn prompt_lists_contributors_in_rank_order() {
        let stats = LeaderboardStats {
            top_contributors: vec![
                Contributor {
                    username: "maeve".into(),
                    rating_count: 14,
                },
                Contributor {
                    username: "seamus".into(),
                    rating_count: 9,
                },
            ],
            new_member_count: 42,
        };
        let prompt = build_prompt(&stats);
        assert!(prompt.contains("1. maeve - 14 ratings"));
        assert!(prompt.contains("2. seamus - 9 ratings"));
        assert!(prompt.contains("joined this week: 42"));
    }
}
