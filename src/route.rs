use std::fmt;

use uuid::Uuid;

/// Where the front-end should go next. Produced by error dispositions and
/// notification targets; the client never routes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Projects,
    Project(Uuid),
    Task { project_id: Uuid, task_id: Uuid },
    Notifications,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/".to_string(),
            Route::Projects => "/projects".to_string(),
            Route::Project(id) => format!("/projects/{id}"),
            Route::Task { project_id, task_id } => {
                format!("/projects/{project_id}/tasks/{task_id}")
            }
            Route::Notifications => "/notifications".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
