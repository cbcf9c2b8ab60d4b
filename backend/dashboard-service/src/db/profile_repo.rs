use crate::models::Profile;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Find a user's profile by their auth user id.
pub async fn find_by_user_id(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<Profile>, sqlx::Error> {
    let row = sqlx::query_as::<_, (String, Option<String>, bool, bool)>(
        r#"
        SELECT username, avatar_id, is_team_member, is_developer
        FROM profiles
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(username, avatar_id, is_team_member, is_developer)| Profile {
            username,
            avatar_id,
            is_team_member,
            is_developer,
        },
    ))
}

/// Count profiles created since `since` (the "new members this week" stat).
pub async fn count_new_members(pool: &PgPool, since: DateTime<Utc>) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM profiles WHERE created_at >= $1")
            .bind(since)
            .fetch_one(pool)
            .await?;

    Ok(count)
}
