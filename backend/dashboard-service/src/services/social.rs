//! Per-item social-angle generation.
//!
//! Builds the witty-social-media-manager prompt around one content item,
//! requests JSON constrained to the `SocialAnalysis` schema, and validates
//! the shape before returning. A malformed or incomplete response is a
//! recoverable failure the operator can re-trigger; nothing is partially
//! populated and nothing is retried here.

use crate::error::Result;
use crate::models::{ContentItem, SocialAnalysis};
use gemini_client::{GeminiClient, GeminiError};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

const PROMPT_INTRO: &str = "You are a witty and sharp social media manager for 'Stoutly', \
a social network for Guinness lovers. Your goal is to find user-generated content that \
would perform well on platforms like Instagram and X (Twitter).";

pub struct SocialAngleService {
    gemini: Arc<GeminiClient>,
}

impl SocialAngleService {
    pub fn new(gemini: Arc<GeminiClient>) -> Self {
        Self { gemini }
    }

    pub async fn social_angle(&self, item: &ContentItem) -> Result<SocialAnalysis> {
        let prompt = build_prompt(item);
        info!(item_id = %item.id(), is_rating = item.is_rating(), "Requesting social angle");

        let analysis: SocialAnalysis = self
            .gemini
            .generate_typed(&prompt, analysis_schema())
            .await?;

        if analysis.hashtags.is_empty() {
            return Err(
                GeminiError::SchemaMismatch("hashtags array is empty".to_string()).into(),
            );
        }

        Ok(analysis)
    }
}

/// Response schema for the social-angle request, mirrored by
/// `SocialAnalysis`.
pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "analysis": {
                "type": "STRING",
                "description": "A brief analysis of why this content is good for social media. Be enthusiastic and specific."
            },
            "caption": {
                "type": "STRING",
                "description": "A catchy and engaging social media caption based on the content."
            },
            "hashtags": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "An array of 3-5 relevant hashtags, including #Stoutly and #Guinness."
            }
        },
        "required": ["analysis", "caption", "hashtags"]
    })
}

pub fn build_prompt(item: &ContentItem) -> String {
    let username = item
        .author()
        .map(|a| a.username.as_str())
        .unwrap_or("An anonymous user");

    match item {
        ContentItem::Rating(rating) => {
            let pub_name = rating
                .pub_ref
                .as_ref()
                .map(|p| p.name.as_str())
                .unwrap_or("An unknown pub");
            format!(
                "{PROMPT_INTRO}\n\n\
                Analyze the following Guinness rating:\n\
                - User: {username}\n\
                - Pub: {pub_name}\n\
                - Rating: {}/5\n\
                - Review: \"{}\"\n\n\
                Based on this, generate a social media post idea. Focus on what makes \
                this review compelling, funny, or authentic.",
                rating.quality, rating.message
            )
        }
        ContentItem::Post(post) => format!(
            "{PROMPT_INTRO}\n\n\
            Analyze the following user post:\n\
            - User: {username}\n\
            - Post: \"{}\"\n\n\
            Based on this, generate a social media post idea. Look for humor, passion, \
            or a great story.",
            post.content
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Post, Profile, PubRef, Rating};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_rating() -> ContentItem {
        ContentItem::Rating(Rating {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            quality: 5,
            price: Some(4),
            exact_price: None,
            message: "Best pour in Dublin".into(),
            image_url: None,
            like_count: 3,
            comment_count: 0,
            is_private: false,
            pub_ref: Some(PubRef {
                name: "The Long Hall".into(),
                lng: -6.26,
                lat: 53.34,
                country_code: "IE".into(),
            }),
            author: Some(Profile {
                username: "maeve".into(),
                avatar_id: None,
                is_team_member: false,
                is_developer: false,
            }),
        })
    }

    #[test]
    fn rating_prompt_embeds_pub_score_and_review() {
        let prompt = build_prompt(&sample_rating());
        assert!(prompt.contains("The Long Hall"));
        assert!(prompt.contains("5/5"));
        assert!(prompt.contains("Best pour in Dublin"));
        assert!(prompt.contains("maeve"));
    }

    #[test]
    fn post_prompt_handles_anonymous_author() {
        let item = ContentItem::Post(Post {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            content: "Splitting the G tonight".into(),
            like_count: 0,
            comment_count: 0,
            author: None,
        });
        let prompt = build_prompt(&item);
        assert!(prompt.contains("An anonymous user"));
        assert!(prompt.contains("Splitting the G tonight"));
    }

    #[test]
    fn schema_requires_all_three_fields() {
        let schema = analysis_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, vec!["analysis", "caption", "hashtags"]);
    }
}
