/// Data models for the Stoutly dashboard service
///
/// The feed is a merged, time-ordered stream of two row shapes: `Rating`
/// (a scored review of a pint at a pub, optionally with a photo) and
/// `Post` (a free-text update). A `ContentItem` is exactly one of the two,
/// discriminated structurally by the presence of the `quality` field.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user profile as seen by the dashboard. Owned by the external
/// user-management service; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub username: String,
    pub avatar_id: Option<String>,
    #[serde(default)]
    pub is_team_member: bool,
    #[serde(default)]
    pub is_developer: bool,
}

/// Denormalized venue reference attached to a rating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PubRef {
    pub name: String,
    pub lng: f64,
    pub lat: f64,
    pub country_code: String,
}

/// A scored pint review. `quality` and `price` are on the canonical 0-5
/// scale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub quality: i16,
    pub price: Option<i16>,
    pub exact_price: Option<f64>,
    pub message: String,
    pub image_url: Option<String>,
    pub like_count: i32,
    pub comment_count: i32,
    pub is_private: bool,
    #[serde(rename = "pub")]
    pub pub_ref: Option<PubRef>,
    pub author: Option<Profile>,
}

/// A free-text user update with no associated rating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub like_count: i32,
    pub comment_count: i32,
    pub author: Option<Profile>,
}

/// One feed entry. Untagged: a JSON object with a `quality` field is a
/// rating, anything else matching the post shape is a post, so exactly one
/// variant ever holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ContentItem {
    Rating(Rating),
    Post(Post),
}

impl ContentItem {
    pub fn id(&self) -> Uuid {
        match self {
            ContentItem::Rating(r) => r.id,
            ContentItem::Post(p) => p.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            ContentItem::Rating(r) => r.created_at,
            ContentItem::Post(p) => p.created_at,
        }
    }

    pub fn author(&self) -> Option<&Profile> {
        match self {
            ContentItem::Rating(r) => r.author.as_ref(),
            ContentItem::Post(p) => p.author.as_ref(),
        }
    }

    pub fn is_rating(&self) -> bool {
        matches!(self, ContentItem::Rating(_))
    }
}

/// AI-suggested social-media angle for a single content item. Ephemeral;
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocialAnalysis {
    pub analysis: String,
    pub caption: String,
    pub hashtags: Vec<String>,
}

/// The AI's weekly-winner choice, as returned by Gemini. `id` must resolve
/// to a member of the candidate set it was derived from before anything
/// downstream may trust it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PintChoice {
    pub id: Uuid,
    pub analysis: String,
    pub social_score: u8,
}

/// Completed Pint of the Week run: the validated winner, the analysis, and
/// the rendered shareable graphic (base64 PNG).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PintOfTheWeekResult {
    pub winning_rating_id: Uuid,
    pub winner: Rating,
    pub analysis_text: String,
    pub social_score: u8,
    pub sharable_image_data: String,
}

/// One saved history snapshot. Opaque and immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub analysis: String,
    pub social_score: u8,
    pub winner: Rating,
    pub sharable_image_data: String,
    pub date: DateTime<Utc>,
}

/// Weekly leaderboard statistics fed into the summary prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardStats {
    pub top_contributors: Vec<Contributor>,
    pub new_member_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub username: String,
    pub rating_count: i64,
}

/// The merged feed as returned to the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub items: Vec<ContentItem>,
    pub has_more: bool,
}
