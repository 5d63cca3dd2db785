use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// National identification number.
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub dues_plan: String,
    pub medical_notes: Option<String>,
    pub comments: Option<String>,
    /// Encoded JPEG thumbnail.
    #[serde(skip)]
    pub photo: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }

    pub fn initials(&self) -> String {
        let initials: String = self
            .name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .collect::<String>()
            .to_uppercase();
        if initials.is_empty() { "?".to_string() } else { initials }
    }
}

/// Every editable field of a member, as submitted by a form, the JSON API or
/// a CSV row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub emergency_contact_name: Option<String>,
    #[serde(default)]
    pub emergency_contact_phone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub dues_plan: String,
    #[serde(default)]
    pub medical_notes: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

impl MemberDetails {
    /// Trim every field and turn blank optional fields into `None`.
    pub fn normalized(self) -> Self {
        Self {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            phone: clean_optional(self.phone),
            emergency_contact_name: clean_optional(self.emergency_contact_name),
            emergency_contact_phone: clean_optional(self.emergency_contact_phone),
            birth_date: self.birth_date,
            dues_plan: self.dues_plan.trim().to_string(),
            medical_notes: clean_optional(self.medical_notes),
            comments: clean_optional(self.comments),
        }
    }

    /// Checks required fields. Expects normalized input.
    pub fn validate(&self, min_id_digits: usize) -> Result<()> {
        validate_member_id(&self.id, min_id_digits)?;
        if self.name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        if self.dues_plan.is_empty() {
            return Err(AppError::Validation("Dues plan is required".to_string()));
        }
        if let Some(birth_date) = self.birth_date {
            if birth_date > Utc::now().date_naive() {
                return Err(AppError::Validation(
                    "Birth date cannot be in the future".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CreateMemberRequest {
    pub details: MemberDetails,
    /// Raw uploaded image bytes, not yet thumbnailed.
    pub photo: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct UpdateMemberRequest {
    /// `details.id` is the member's ID after the update. It may only differ
    /// from the current ID when renaming is enabled.
    pub details: MemberDetails,
    pub photo: PhotoUpdate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PhotoUpdate {
    #[default]
    Keep,
    Replace(Vec<u8>),
    Remove,
}

impl PhotoUpdate {
    /// A new upload wins over the remove checkbox.
    pub fn from_form(upload: Option<Vec<u8>>, remove: bool) -> Self {
        match upload {
            Some(bytes) if !bytes.is_empty() => PhotoUpdate::Replace(bytes),
            _ if remove => PhotoUpdate::Remove,
            _ => PhotoUpdate::Keep,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletionSummary {
    pub member_id: String,
    pub member_name: String,
    pub payments_deleted: u64,
}

/// Rows written by a roster import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounts {
    pub created: usize,
    pub updated: usize,
}

pub fn validate_member_id(id: &str, min_digits: usize) -> Result<()> {
    if id.is_empty() {
        return Err(AppError::Validation("ID number is required".to_string()));
    }
    if !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(format!(
            "ID number must contain only digits: {}",
            id
        )));
    }
    if id.len() < min_digits {
        return Err(AppError::Validation(format!(
            "ID number must have at least {} digits",
            min_digits
        )));
    }
    Ok(())
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_member_id() {
        assert!(validate_member_id("12345678", 7).is_ok());
        assert!(validate_member_id("1234567", 7).is_ok());
        assert!(validate_member_id("123456", 7).is_err());
        assert!(validate_member_id("", 7).is_err());
        assert!(validate_member_id("1234-567", 7).is_err());
        assert!(validate_member_id("12345a78", 7).is_err());
    }

    #[test]
    fn test_normalized_trims_and_drops_blanks() {
        let details = MemberDetails {
            id: " 12345678 ".into(),
            name: "  Juan Pérez ".into(),
            phone: Some("   ".into()),
            comments: Some(" mornings ".into()),
            dues_plan: " Open - $2000 ".into(),
            ..Default::default()
        }
        .normalized();

        assert_eq!(details.id, "12345678");
        assert_eq!(details.name, "Juan Pérez");
        assert_eq!(details.phone, None);
        assert_eq!(details.comments.as_deref(), Some("mornings"));
        assert_eq!(details.dues_plan, "Open - $2000");
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let details = MemberDetails {
            id: "12345678".into(),
            name: "   ".into(),
            dues_plan: "Open - $2000".into(),
            ..Default::default()
        }
        .normalized();

        assert!(matches!(details.validate(7), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_photo_update_policy() {
        assert_eq!(PhotoUpdate::from_form(None, false), PhotoUpdate::Keep);
        assert_eq!(PhotoUpdate::from_form(None, true), PhotoUpdate::Remove);
        assert_eq!(PhotoUpdate::from_form(Some(vec![]), true), PhotoUpdate::Remove);
        assert_eq!(
            PhotoUpdate::from_form(Some(vec![1, 2]), true),
            PhotoUpdate::Replace(vec![1, 2])
        );
    }
}
