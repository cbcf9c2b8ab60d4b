/// HTTP request handlers
///
/// Every content route re-derives dashboard eligibility through the auth
/// gate before doing any work; identity alone is not enough.
pub mod feed;
pub mod leaderboard;
pub mod pint_of_week;
pub mod session;
pub mod social;
