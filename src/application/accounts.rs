//! Account payloads and the checks shared by self-registration and admin-managed accounts.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::application::error::ServiceError;
use crate::application::password;
use crate::application::reference::check_location;
use crate::application::repos::{AccountChanges, NewAccount, ReferenceRepo};
use crate::application::resources::non_blank;
use crate::domain::entities::AccountProfile;
use crate::domain::principal::ROLE_ALUMNI;
use crate::domain::types::VerificationStatus;
use crate::domain::validation::{Rule, ValidationErrors};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountInput {
    pub nim: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub place_date_of_birth: Option<String>,
    pub enrollment_year: Option<i32>,
    pub graduation_year: Option<i32>,
    pub instance: Option<String>,
    pub position: Option<String>,
    pub verification_file_url: Option<String>,
    pub profile_picture_url: Option<String>,
    pub role_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub faculty_id: Option<Uuid>,
    pub major_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountPatch {
    pub nim: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub place_date_of_birth: Option<String>,
    pub enrollment_year: Option<i32>,
    pub graduation_year: Option<i32>,
    pub instance: Option<String>,
    pub position: Option<String>,
    pub verification_file_url: Option<String>,
    pub profile_picture_url: Option<String>,
    pub verification_status: Option<VerificationStatus>,
    pub role_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub faculty_id: Option<Uuid>,
    pub major_id: Option<Uuid>,
}

/// Who is creating the account, which decides the initial status and whether a role may be
/// chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enrollment {
    /// Self-registration: always the default role, pending until an admin verifies the
    /// uploaded document.
    Registration,
    /// Created by an admin: verified immediately, role may be chosen.
    Directory,
}

fn check_identity(errors: &mut ValidationErrors, input: &AccountInput) {
    errors.min_chars("nim", &input.nim, 5);
    errors.min_chars("name", &input.name, 3);
    errors.email("email", &input.email);
    errors.min_chars("password", &input.password, 5);
    errors.min_chars("phone_number", &input.phone_number, 10);
    match input.enrollment_year {
        Some(year) => errors.year("enrollment_year", year),
        None => errors.push("enrollment_year", Rule::Required),
    }
    match input.graduation_year {
        Some(year) => errors.year("graduation_year", year),
        None => errors.push("graduation_year", Rule::Required),
    }
    for (field, value) in [
        ("province_id", input.province_id),
        ("city_id", input.city_id),
        ("faculty_id", input.faculty_id),
        ("major_id", input.major_id),
    ] {
        if value.is_none() {
            errors.push(field, Rule::Required);
        }
    }
}

fn check_patch_fields(errors: &mut ValidationErrors, patch: &AccountPatch) {
    errors.min_chars_opt("nim", patch.nim.as_deref(), 5);
    errors.min_chars_opt("name", patch.name.as_deref(), 3);
    if let Some(email) = patch.email.as_deref() {
        errors.email("email", email);
    }
    errors.min_chars_opt("password", patch.password.as_deref(), 5);
    errors.min_chars_opt("phone_number", patch.phone_number.as_deref(), 10);
    if let Some(year) = patch.enrollment_year {
        errors.year("enrollment_year", year);
    }
    if let Some(year) = patch.graduation_year {
        errors.year("graduation_year", year);
    }
}

/// Turns account payloads into store writes after checking references against lookup tables.
#[derive(Clone)]
pub struct AccountFactory {
    refs: Arc<dyn ReferenceRepo>,
}

impl AccountFactory {
    pub fn new(refs: Arc<dyn ReferenceRepo>) -> Self {
        Self { refs }
    }

    pub async fn prepare(
        &self,
        input: AccountInput,
        enrollment: Enrollment,
    ) -> Result<NewAccount, ServiceError> {
        let mut errors = ValidationErrors::new();
        check_identity(&mut errors, &input);
        let verification_file_url = non_blank(input.verification_file_url.clone());
        if enrollment == Enrollment::Registration && verification_file_url.is_none() {
            errors.push("verification_file_url", Rule::Required);
        }
        errors.into_result()?;

        let (Some(province_id), Some(city_id), Some(faculty_id), Some(major_id)) = (
            input.province_id,
            input.city_id,
            input.faculty_id,
            input.major_id,
        ) else {
            return Err(ServiceError::invalid("province_id", Rule::Required));
        };

        let mut errors = ValidationErrors::new();
        check_location(self.refs.as_ref(), province_id, city_id, &mut errors).await?;
        self.check_academics(Some(faculty_id), Some(major_id), &mut errors)
            .await?;
        let requested_role = match enrollment {
            Enrollment::Registration => None,
            Enrollment::Directory => input.role_id,
        };
        let role_id = self.resolve_role(requested_role, &mut errors).await?;
        errors.into_result()?;
        let role_id = role_id.ok_or_else(|| ServiceError::invalid("role_id", Rule::DefaultRoleMissing))?;

        let status = match enrollment {
            Enrollment::Registration => VerificationStatus::Pending,
            Enrollment::Directory => VerificationStatus::Verified,
        };

        Ok(NewAccount {
            nim: input.nim.trim().to_string(),
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            password_hash: password::hash(input.password.clone()).await?,
            phone_number: input.phone_number.trim().to_string(),
            place_date_of_birth: non_blank(input.place_date_of_birth),
            enrollment_year: input.enrollment_year.unwrap_or_default(),
            graduation_year: input.graduation_year.unwrap_or_default(),
            instance: non_blank(input.instance),
            position: non_blank(input.position),
            verification_file_url,
            profile_picture_url: non_blank(input.profile_picture_url),
            verification_status: status,
            role_id,
            province_id,
            city_id,
            faculty_id,
            major_id,
        })
    }

    /// Validates a partial update against `current` and hashes a new password if present.
    pub async fn changes(
        &self,
        patch: AccountPatch,
        current: &AccountProfile,
    ) -> Result<AccountChanges, ServiceError> {
        let mut errors = ValidationErrors::new();
        check_patch_fields(&mut errors, &patch);
        errors.into_result()?;

        let mut errors = ValidationErrors::new();
        if patch.province_id.is_some() || patch.city_id.is_some() {
            check_location(
                self.refs.as_ref(),
                patch.province_id.unwrap_or(current.province_id),
                patch.city_id.unwrap_or(current.city_id),
                &mut errors,
            )
            .await?;
        }
        self.check_academics(patch.faculty_id, patch.major_id, &mut errors)
            .await?;
        if let Some(role_id) = patch.role_id
            && self.refs.role(role_id).await?.is_none()
        {
            errors.push("role_id", Rule::Exists);
        }
        errors.into_result()?;

        let password_hash = match patch.password.as_deref() {
            Some(plain) => Some(password::hash(plain.to_string()).await?),
            None => None,
        };

        Ok(AccountChanges {
            nim: patch.nim.map(|v| v.trim().to_string()),
            name: patch.name.map(|v| v.trim().to_string()),
            email: patch.email.map(|v| v.trim().to_lowercase()),
            password_hash,
            phone_number: patch.phone_number.map(|v| v.trim().to_string()),
            place_date_of_birth: patch.place_date_of_birth,
            enrollment_year: patch.enrollment_year,
            graduation_year: patch.graduation_year,
            instance: patch.instance,
            position: patch.position,
            verification_file_url: patch.verification_file_url,
            profile_picture_url: patch.profile_picture_url,
            verification_status: patch.verification_status,
            role_id: patch.role_id,
            province_id: patch.province_id,
            city_id: patch.city_id,
            faculty_id: patch.faculty_id,
            major_id: patch.major_id,
        })
    }

    async fn check_academics(
        &self,
        faculty_id: Option<Uuid>,
        major_id: Option<Uuid>,
        errors: &mut ValidationErrors,
    ) -> Result<(), ServiceError> {
        if let Some(faculty_id) = faculty_id
            && self.refs.faculty(faculty_id).await?.is_none()
        {
            errors.push("faculty_id", Rule::Exists);
        }
        if let Some(major_id) = major_id
            && self.refs.major(major_id).await?.is_none()
        {
            errors.push("major_id", Rule::Exists);
        }
        Ok(())
    }

    /// Explicit role when it exists, otherwise the default alumni role. A missing default
    /// role is reported on `role_id`.
    async fn resolve_role(
        &self,
        requested: Option<Uuid>,
        errors: &mut ValidationErrors,
    ) -> Result<Option<Uuid>, ServiceError> {
        if let Some(role_id) = requested {
            if self.refs.role(role_id).await?.is_some() {
                return Ok(Some(role_id));
            }
            errors.push("role_id", Rule::Exists);
            return Ok(None);
        }
        match self.refs.role_by_name(ROLE_ALUMNI).await? {
            Some(role) => Ok(Some(role.id)),
            None => {
                errors.push("role_id", Rule::DefaultRoleMissing);
                Ok(None)
            }
        }
    }
}
