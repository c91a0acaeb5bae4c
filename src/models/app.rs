//! Registered companion (slave) apps and user permissions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A registered companion app. Slave apps identify themselves by
/// `package_id` when claiming a one-time code.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct App {
    pub app_id: Uuid,
    pub app_name: String,
    pub package_id: String,
    pub deep_link_scheme: String,
    pub created_utc: DateTime<Utc>,
}

impl App {
    pub fn new(app_name: String, package_id: String, deep_link_scheme: String) -> Self {
        Self {
            app_id: Uuid::new_v4(),
            app_name,
            package_id,
            deep_link_scheme,
            created_utc: Utc::now(),
        }
    }
}

/// Grant allowing a user to obtain tokens scoped to an app.
#[derive(Debug, Clone, FromRow)]
pub struct AppPermission {
    pub permission_id: Uuid,
    pub user_id: Uuid,
    pub app_id: Uuid,
}

impl AppPermission {
    pub fn new(user_id: Uuid, app_id: Uuid) -> Self {
        Self {
            permission_id: Uuid::new_v4(),
            user_id,
            app_id,
        }
    }
}
