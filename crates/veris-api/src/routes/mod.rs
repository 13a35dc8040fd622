//! # HTTP Route Modules
//!
//! Each module owns one slice of the API surface and exposes a
//! `router()` constructor merged in `crate::app`.

pub mod events;
pub mod scores;
pub mod sync;

use serde::Deserialize;
use utoipa::IntoParams;
use veris_core::{Framework, Scope, UserId};

use crate::error::AppError;

/// Common query parameters identifying a scoring scope.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ScopeQuery {
    /// Owning user.
    pub user_id: String,
    /// Optional framework narrowing; absent means all frameworks.
    #[serde(default)]
    pub framework_id: Option<String>,
}

impl ScopeQuery {
    pub fn resolve(&self) -> Result<Scope, AppError> {
        resolve_scope(&self.user_id, self.framework_id.as_deref())
    }
}

/// Resolve raw request identifiers into a validated [`Scope`].
///
/// An invalid user id is a 422; a framework outside the catalog is a 404
/// because the caller referenced a scope that cannot exist.
pub fn resolve_scope(user_id: &str, framework_id: Option<&str>) -> Result<Scope, AppError> {
    let user_id = UserId::new(user_id)?;
    let framework = match framework_id {
        None => None,
        Some(raw) => Some(
            Framework::parse(raw)
                .ok_or_else(|| AppError::ScopeNotFound(format!("unknown framework: {raw}")))?,
        ),
    };
    Ok(Scope::new(user_id, framework))
}
