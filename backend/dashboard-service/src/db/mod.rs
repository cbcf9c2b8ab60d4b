/// Database access layer
///
/// Read-only repositories over the Stoutly tables. Each query expands the
/// joined profile (and pub, for ratings) into the domain model, with a
/// missing relation becoming `None` rather than an error.
pub mod post_repo;
pub mod profile_repo;
pub mod rating_repo;
