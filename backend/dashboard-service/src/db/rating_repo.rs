use crate::models::{Contributor, Profile, PubRef, Rating};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const RATING_SELECT: &str = r#"
    SELECT r.id, r.created_at, r.quality, r.price, r.exact_price, r.message,
           r.image_url, r.like_count, r.comment_count, r.is_private,
           pb.name AS pub_name, pb.lng AS pub_lng, pb.lat AS pub_lat,
           pb.country_code AS pub_country_code,
           pr.username AS author_username, pr.avatar_id AS author_avatar_id,
           pr.is_team_member AS author_is_team_member,
           pr.is_developer AS author_is_developer
    FROM ratings r
    LEFT JOIN pubs pb ON pb.id = r.pub_id
    LEFT JOIN profiles pr ON pr.id = r.user_id
"#;

/// Flat row shape for a rating with its joined pub and author columns.
#[derive(sqlx::FromRow)]
struct RatingRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    quality: i16,
    price: Option<i16>,
    exact_price: Option<f64>,
    message: String,
    image_url: Option<String>,
    like_count: i32,
    comment_count: i32,
    is_private: bool,
    pub_name: Option<String>,
    pub_lng: Option<f64>,
    pub_lat: Option<f64>,
    pub_country_code: Option<String>,
    author_username: Option<String>,
    author_avatar_id: Option<String>,
    author_is_team_member: Option<bool>,
    author_is_developer: Option<bool>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        let pub_ref = match (row.pub_name, row.pub_lng, row.pub_lat, row.pub_country_code) {
            (Some(name), Some(lng), Some(lat), Some(country_code)) => Some(PubRef {
                name,
                lng,
                lat,
                country_code,
            }),
            _ => None,
        };

        let author = row.author_username.map(|username| Profile {
            username,
            avatar_id: row.author_avatar_id,
            is_team_member: row.author_is_team_member.unwrap_or(false),
            is_developer: row.author_is_developer.unwrap_or(false),
        });

        Rating {
            id: row.id,
            created_at: row.created_at,
            quality: row.quality,
            price: row.price,
            exact_price: row.exact_price,
            message: row.message,
            image_url: row.image_url,
            like_count: row.like_count,
            comment_count: row.comment_count,
            is_private: row.is_private,
            pub_ref,
            author,
        }
    }
}

/// Fetch one page of ratings, newest first.
pub async fn fetch_page(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Rating>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RatingRow>(&format!(
        "{RATING_SELECT} ORDER BY r.created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Rating::from).collect())
}

/// Ratings since `since` that carry a photo: the Pint of the Week
/// candidate set.
pub async fn recent_with_images(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<Vec<Rating>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RatingRow>(&format!(
        r#"{RATING_SELECT}
        WHERE r.created_at >= $1 AND r.image_url IS NOT NULL
        ORDER BY r.created_at DESC"#
    ))
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Rating::from).collect())
}

/// Top contributors by rating count since `since`.
pub async fn top_contributors(
    pool: &PgPool,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Contributor>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT pr.username, COUNT(*) AS rating_count
        FROM ratings r
        JOIN profiles pr ON pr.id = r.user_id
        WHERE r.created_at >= $1
        GROUP BY pr.username
        ORDER BY rating_count DESC, pr.username ASC
        LIMIT $2
        "#,
    )
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(username, rating_count)| Contributor {
            username,
            rating_count,
        })
        .collect())
}
