//! Shared domain enumerations aligned with persisted database enums.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "verification_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "PENDING",
            VerificationStatus::Verified => "VERIFIED",
            VerificationStatus::Rejected => "REJECTED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "job_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Freelance,
}

impl JobType {
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::FullTime => "FULL_TIME",
            JobType::PartTime => "PART_TIME",
            JobType::Contract => "CONTRACT",
            JobType::Internship => "INTERNSHIP",
            JobType::Freelance => "FREELANCE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "product_category", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    Produk,
    Jasa,
}

impl ProductCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductCategory::Produk => "PRODUK",
            ProductCategory::Jasa => "JASA",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialize_with_wire_names() {
        assert_eq!(
            serde_json::to_string(&JobType::FullTime).unwrap(),
            "\"FULL_TIME\""
        );
        assert_eq!(
            serde_json::to_string(&ProductCategory::Jasa).unwrap(),
            "\"JASA\""
        );
        let status: VerificationStatus = serde_json::from_str("\"REJECTED\"").unwrap();
        assert_eq!(status, VerificationStatus::Rejected);
        assert_eq!(status.as_str(), "REJECTED");
    }

    #[test]
    fn unknown_job_type_is_rejected() {
        assert!(serde_json::from_str::<JobType>("\"LOKER\"").is_err());
    }
}
