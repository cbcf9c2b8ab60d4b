/// Stoutly Dashboard Service Library
///
/// Backend for the internal moderation and social-media dashboard of the
/// Stoutly pub-rating app: the merged ratings/posts content feed, AI
/// social-angle suggestions, the weekly Pint of the Week selection with a
/// shareable graphic, and the leaderboard summary post.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `models`: Feed, analysis, and history data structures
/// - `services`: Business logic (feed, auth gate, AI flows, rendering)
/// - `db`: Read-only repositories over the Stoutly tables
/// - `middleware`: Bearer-token auth and request timing
/// - `error`: Error types and handling
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
