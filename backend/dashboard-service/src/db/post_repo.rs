use crate::models::{Post, Profile};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    content: String,
    like_count: i32,
    comment_count: i32,
    author_username: Option<String>,
    author_avatar_id: Option<String>,
    author_is_team_member: Option<bool>,
    author_is_developer: Option<bool>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let author = row.author_username.map(|username| Profile {
            username,
            avatar_id: row.author_avatar_id,
            is_team_member: row.author_is_team_member.unwrap_or(false),
            is_developer: row.author_is_developer.unwrap_or(false),
        });

        Post {
            id: row.id,
            created_at: row.created_at,
            content: row.content,
            like_count: row.like_count,
            comment_count: row.comment_count,
            author,
        }
    }
}

/// Fetch one page of posts, newest first.
pub async fn fetch_page(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Post>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT p.id, p.created_at, p.content, p.like_count, p.comment_count,
               pr.username AS author_username, pr.avatar_id AS author_avatar_id,
               pr.is_team_member AS author_is_team_member,
               pr.is_developer AS author_is_developer
        FROM posts p
        LEFT JOIN profiles pr ON pr.id = p.user_id
        ORDER BY p.created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Post::from).collect())
}
