//! Data model for the persisted JSON document.

use serde::{Deserialize, Deserializer, Serialize};

/// An account holder. Created at registration, never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Auto-incremented unique id.
    pub id: i64,
    /// Login email, unique among all users.
    pub email: String,
    /// Salted bcrypt hash of the password.
    pub password: String,
    /// Display name.
    pub name: String,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
}

/// A student record, owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    /// Auto-incremented id, unique across all students system-wide.
    pub id: i64,
    /// Id of the owning [`User`]. Only the owner can see or modify
    /// the record through the API.
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    /// Globally unique across all students, regardless of owner.
    /// Checked only at creation.
    pub student_number: String,
    pub address: Option<String>,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
    /// Last-modification timestamp (ISO 8601).
    pub updated_at: String,
}

/// The entire persisted dataset: one JSON document with top-level
/// `users` and `students` arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub students: Vec<Student>,
}

/// Fields for creating a new student. The id, owner, and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub student_number: String,
    pub address: Option<String>,
}

/// Partial update for a student record.
///
/// `first_name`, `last_name`, `email`, and `date_of_birth` replace the
/// stored value only when provided and non-empty. `phone` and `address`
/// are tri-state: absent keeps the stored value, an explicit JSON `null`
/// clears it, and a string sets it. The outer `Option` distinguishes
/// "absent" from "null" via [`double_option`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
}

impl StudentUpdate {
    /// True when no field is present at all (a no-op update).
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.date_of_birth.is_none()
            && self.phone.is_none()
            && self.address.is_none()
    }
}

/// Deserializes a field so that a present-but-null value becomes
/// `Some(None)` instead of collapsing into `None`. Combined with
/// `#[serde(default)]`, an absent field stays `None`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
