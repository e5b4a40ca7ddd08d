//! Library member model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::text_column;

/// Member status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Suspended,
    Inactive,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Suspended => "suspended",
            MemberStatus::Inactive => "inactive",
        }
    }
}

impl Default for MemberStatus {
    fn default() -> Self {
        MemberStatus::Active
    }
}

impl std::str::FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(MemberStatus::Active),
            "suspended" => Ok(MemberStatus::Suspended),
            "inactive" => Ok(MemberStatus::Inactive),
            _ => Err(format!("Invalid member status: {}", s)),
        }
    }
}

text_column!(MemberStatus);

/// Member model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i32,
    pub name: String,
    /// Unique, stored lower-cased
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub status: MemberStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Whether this record belongs to the account with the given email
    pub fn is_owned_by(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }

    pub fn apply_update(&mut self, update: UpdateMember) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = normalize_email(&email);
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(address) = update.address {
            self.address = Some(address);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(note) = update.note {
            self.note = Some(note);
        }
    }
}

/// Emails are compared case-insensitively and stored lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create member request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMember {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: Option<MemberStatus>,
    pub note: Option<String>,
}

/// Update member request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMember {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: Option<MemberStatus>,
    pub note: Option<String>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn member(id: i32, email: &str) -> Member {
        let now = Utc::now();
        Member {
            id,
            name: "Claude Dupont".to_string(),
            email: email.to_string(),
            phone: "0612345678".to_string(),
            address: None,
            status: MemberStatus::Active,
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_ownership_is_case_insensitive() {
        let m = member(1, "claude.dupont@email.com");
        assert!(m.is_owned_by("Claude.Dupont@Email.com"));
        assert!(!m.is_owned_by("someone@email.com"));
    }

    #[test]
    fn test_update_normalizes_email() {
        let mut m = member(1, "a@b.fr");
        m.apply_update(UpdateMember {
            email: Some("  New@Example.ORG ".to_string()),
            status: Some(MemberStatus::Suspended),
            ..Default::default()
        });
        assert_eq!(m.email, "new@example.org");
        assert_eq!(m.status, MemberStatus::Suspended);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Suspended".parse::<MemberStatus>(), Ok(MemberStatus::Suspended));
        assert!("banned".parse::<MemberStatus>().is_err());
    }
}
