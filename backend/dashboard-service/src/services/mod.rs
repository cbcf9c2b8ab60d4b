/// Business logic layer
///
/// - `auth_gate`: dashboard-eligibility decisions from profile flags
/// - `avatar`: avatar_id fall-through resolution
/// - `feed`: content feed pagination, merge, and snapshot store
/// - `social`: per-item social-angle generation
/// - `leaderboard`: weekly stats and summary-post generation
/// - `pint_of_week`: winner-resolution protocol
/// - `history`: capped Redis-backed result history
/// - `graphic`: shareable-graphic rendering
pub mod auth_gate;
pub mod avatar;
pub mod feed;
pub mod graphic;
pub mod history;
pub mod leaderboard;
pub mod pint_of_week;
pub mod social;
