//! Wire types shared with the REST backend and the push channel.
//!
//! Everything is camelCase JSON. Timestamps are RFC 3339; due dates may come
//! back either as a full timestamp or as a bare `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ClientError;

/// Format-check an identifier taken from a route or form. Existence is the
/// backend's business.
pub fn parse_id(what: &'static str, raw: &str) -> Result<Uuid, ClientError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ClientError::InvalidId {
        what,
        value: raw.to_string(),
    })
}

// ── Users & members ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[serde(rename = "firebaseUID", default, skip_serializing_if = "Option::is_none")]
    pub firebase_uid: Option<String>,
    pub name: String,
    pub email: String,
}

/// Sent once, on first sign-in, to create the backend profile.
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest {
    #[serde(rename = "firebaseUID")]
    pub firebase_uid: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Editor,
    Viewer,
}

impl MemberRole {
    /// Viewers are read-only: no task or settings mutations.
    pub fn can_write(self) -> bool {
        !matches!(self, MemberRole::Viewer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: MemberRole,
}

// ── Tasks ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub task_number: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub assigned_to: Option<ProjectMember>,
    #[serde(default, with = "lenient_date")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<ProjectMember>,
    #[serde(default)]
    pub updated_by: Option<ProjectMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for a task, i.e. the task editor's form.
///
/// `assignedTo` always goes out, as `null` when unassigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskForm {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

impl TaskForm {
    pub fn new(title: impl Into<String>) -> Self {
        TaskForm {
            title: title.into(),
            ..TaskForm::default()
        }
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.title.trim().is_empty() {
            return Err(ClientError::InvalidInput("Task title is required".into()));
        }
        Ok(())
    }
}

impl From<&Task> for TaskForm {
    fn from(task: &Task) -> Self {
        TaskForm {
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            assigned_to: task.assigned_to.as_ref().map(|m| m.id),
            due_date: task.due_date.map(|d| d.date_naive()),
        }
    }
}

// ── Projects ───────────────────────────────────────────────────

/// The project aggregate: metadata, members, invitations and tasks as
/// returned by one `GET /projects/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub description: String,
    pub created_by: User,
    #[serde(default)]
    pub invitations: Vec<Invitation>,
    #[serde(default)]
    pub project_members: Vec<ProjectMember>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub tasks_completed: u32,
    #[serde(default)]
    pub total_tasks: u32,
    #[serde(default)]
    pub active_tasks_assigned_to_user_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn member(&self, member_id: Uuid) -> Option<&ProjectMember> {
        self.project_members.iter().find(|m| m.id == member_id)
    }

    pub fn member_for_user(&self, user_id: Uuid) -> Option<&ProjectMember> {
        self.project_members.iter().find(|m| m.user_id == user_id)
    }

    pub fn tasks_with_status(&self, status: TaskStatus) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.status == status)
    }
}

/// Minimal project info shown on the join page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
}

/// Short project code, exactly three ASCII alphanumerics, upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectKey(String);

impl ProjectKey {
    pub const LEN: usize = 3;

    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let key = raw.trim().to_ascii_uppercase();
        if key.len() != Self::LEN {
            return Err(ClientError::InvalidInput(format!(
                "Key must be exactly {} characters long",
                Self::LEN
            )));
        }
        if !key.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ClientError::InvalidInput(
                "Key must only contain letters and digits".into(),
            ));
        }
        Ok(ProjectKey(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProjectKey {
    type Error = ClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ProjectKey::parse(&value)
    }
}

impl From<ProjectKey> for String {
    fn from(key: ProjectKey) -> Self {
        key.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    pub key: ProjectKey,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateProject {
    pub name: String,
    pub description: String,
}

// ── Comments ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub task_id: Uuid,
    /// Project member id of the author.
    pub created_by: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_edited(&self) -> bool {
        self.created_at != self.updated_at
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentDraft {
    pub comment: String,
}

// ── Invitations ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub invited_by: Uuid,
    pub invited_user_id: Uuid,
    pub project_id: Uuid,
    #[serde(default)]
    pub project_name: String,
    pub status: InvitationStatus,
    pub invited_at: DateTime<Utc>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub invited_user_id: Uuid,
    pub project_id: Uuid,
}

/// The invited user's answer. Pending is not an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationAnswer {
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    pub status: InvitationAnswer,
    pub project_id: Uuid,
}

// ── Notifications ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    TaskAssigned,
    ProjectInvitation,
    CommentAdded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Read,
    Unread,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub task_id: Option<Uuid>,
    #[serde(default)]
    pub invitation_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub content: String,
    pub status: NotificationStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.status == NotificationStatus::Unread
    }
}

// ── Dashboard ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTask {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub project_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub projects: Vec<ProjectSummary>,
    #[serde(default)]
    pub tasks: Vec<DashboardTask>,
}

// ── Serde helpers ──────────────────────────────────────────────

/// Accepts RFC 3339, a bare date (midnight UTC), `""` or `null`.
mod lenient_date {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => s.serialize_str(&dt.to_rfc3339()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(d)?;
        let Some(raw) = raw.filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(dt.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(|date| date.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc()))
            .map_err(serde::de::Error::custom)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_json() -> serde_json::Value {
        json!({
            "id": "6b3c18d4-2a1d-4f2b-9d4c-0a0c3f0f2f10",
            "projectId": "a8c2f1f0-8b8f-4a62-9d3a-8c1d7b4c2a01",
            "taskNumber": 7,
            "title": "Fix the thing",
            "status": "in-progress",
            "priority": "critical",
            "dueDate": "2026-02-11T15:30:00Z",
            "createdAt": "2026-02-01T09:00:00Z",
            "updatedAt": "2026-02-01T09:00:00Z"
        })
    }

    #[test]
    fn task_parses_wire_enums() {
        let task: Task = serde_json::from_value(task_json()).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.priority, TaskPriority::Critical);
        assert_eq!(task.task_number, 7);
        assert!(task.assigned_to.is_none());
        assert!(task.description.is_none());
    }

    #[test]
    fn new_form_defaults_to_todo_medium() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
        let form = TaskForm::new("x");
        assert_eq!((form.status, form.priority), (TaskStatus::Todo, TaskPriority::Medium));
    }

    #[test]
    fn due_date_accepts_bare_date_and_empty() {
        let mut v = task_json();
        v["dueDate"] = json!("2026-02-11");
        let task: Task = serde_json::from_value(v.clone()).unwrap();
        assert_eq!(
            task.due_date.unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2026, 2, 11).unwrap()
        );

        v["dueDate"] = json!("");
        let task: Task = serde_json::from_value(v.clone()).unwrap();
        assert!(task.due_date.is_none());

        v["dueDate"] = json!(null);
        let task: Task = serde_json::from_value(v).unwrap();
        assert!(task.due_date.is_none());
    }

    #[test]
    fn form_sends_explicit_null_assignee() {
        let form = TaskForm {
            status: TaskStatus::InProgress,
            ..TaskForm::new("Fix bug")
        };
        let v = serde_json::to_value(&form).unwrap();
        assert_eq!(v["status"], "in-progress");
        assert_eq!(v["priority"], "medium");
        assert!(v.get("assignedTo").unwrap().is_null());
        assert!(v.get("description").is_none());
    }

    #[test]
    fn form_from_task_truncates_due_date() {
        let task: Task = serde_json::from_value(task_json()).unwrap();
        let form = TaskForm::from(&task);
        assert_eq!(form.due_date, NaiveDate::from_ymd_opt(2026, 2, 11));
        assert_eq!(form.assigned_to, None);
    }

    #[test]
    fn project_key_rules() {
        assert_eq!(ProjectKey::parse("abc").unwrap().as_str(), "ABC");
        assert_eq!(ProjectKey::parse(" k9x ").unwrap().as_str(), "K9X");
        assert!(ProjectKey::parse("AB").is_err());
        assert!(ProjectKey::parse("ABCD").is_err());
        assert!(ProjectKey::parse("A-B").is_err());
    }

    #[test]
    fn comment_edited_is_derived() {
        let mut c: Comment = serde_json::from_value(json!({
            "id": "6b3c18d4-2a1d-4f2b-9d4c-0a0c3f0f2f10",
            "projectId": "a8c2f1f0-8b8f-4a62-9d3a-8c1d7b4c2a01",
            "taskId": "2e6a7c11-8c39-4d5f-9a0e-6e1a4c7f3b22",
            "createdBy": "d0b74f7e-3c2a-4a58-8b21-5e9d2a1c4f33",
            "comment": "looks good",
            "createdAt": "2026-02-01T09:00:00Z",
            "updatedAt": "2026-02-01T09:00:00Z"
        }))
        .unwrap();
        assert!(!c.is_edited());
        c.updated_at = c.updated_at + chrono::Duration::minutes(5);
        assert!(c.is_edited());
    }

    #[test]
    fn notification_type_field() {
        let n: Notification = serde_json::from_value(json!({
            "id": "n1",
            "type": "comment_added",
            "status": "unread",
            "content": "Ada commented on FOO-3"
        }))
        .unwrap();
        assert_eq!(n.kind, NotificationType::CommentAdded);
        assert!(n.is_unread());
    }

    #[test]
    fn viewer_cannot_write() {
        assert!(MemberRole::Owner.can_write());
        assert!(MemberRole::Editor.can_write());
        assert!(!MemberRole::Viewer.can_write());
    }
}
