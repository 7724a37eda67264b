//! Lookup tables (roles, regions, faculties, fields) and the cross-field checks built on them.

use std::sync::Arc;

use uuid::Uuid;

use crate::application::error::{Entity, ServiceError};
use crate::application::repos::{ReferenceRepo, RepoError};
use crate::cache::CacheAside;
use crate::domain::entities::{
    CityRecord, FacultyRecord, LookupRecord, MajorRecord, ProvinceRecord, RoleRecord,
};
use crate::domain::validation::{Rule, ValidationErrors};

const NAMESPACE: &str = "reference";

/// Verifies that `city_id` exists and lies in `province_id`, recording violations on the
/// request fields.
pub async fn check_location(
    refs: &dyn ReferenceRepo,
    province_id: Uuid,
    city_id: Uuid,
    errors: &mut ValidationErrors,
) -> Result<(), RepoError> {
    if refs.province(province_id).await?.is_none() {
        errors.push("province_id", Rule::Exists);
    }
    match refs.city(city_id).await? {
        None => errors.push("city_id", Rule::Exists),
        Some(city) if city.province_id != province_id => {
            errors.push("city_id", Rule::CityProvinceMismatch)
        }
        Some(_) => {}
    }
    Ok(())
}

/// Read-only access to reference data with item-lifetime caching.
#[derive(Clone)]
pub struct ReferenceService {
    repo: Arc<dyn ReferenceRepo>,
    cache: CacheAside,
}

impl ReferenceService {
    pub fn new(repo: Arc<dyn ReferenceRepo>, cache: CacheAside) -> Self {
        Self { repo, cache }
    }

    pub fn repo(&self) -> Arc<dyn ReferenceRepo> {
        self.repo.clone()
    }

    pub async fn roles(&self) -> Result<Vec<RoleRecord>, ServiceError> {
        self.cache
            .value(NAMESPACE, "reference:roles".to_string(), || async {
                self.repo.roles().await.map_err(ServiceError::from)
            })
            .await
    }

    pub async fn provinces(&self) -> Result<Vec<ProvinceRecord>, ServiceError> {
        self.cache
            .value(NAMESPACE, "reference:provinces".to_string(), || async {
                self.repo.provinces().await.map_err(ServiceError::from)
            })
            .await
    }

    pub async fn cities(&self, province_id: Uuid) -> Result<Vec<CityRecord>, ServiceError> {
        let key = format!("reference:provinces:{province_id}:cities");
        self.cache
            .value(NAMESPACE, key, || async {
                if self.repo.province(province_id).await?.is_none() {
                    return Err(ServiceError::NotFound(Entity::Province));
                }
                Ok(self.repo.cities(province_id).await?)
            })
            .await
    }

    pub async fn faculties(&self) -> Result<Vec<FacultyRecord>, ServiceError> {
        self.cache
            .value(NAMESPACE, "reference:faculties".to_string(), || async {
                self.repo.faculties().await.map_err(ServiceError::from)
            })
            .await
    }

    pub async fn majors(&self, faculty_id: Uuid) -> Result<Vec<MajorRecord>, ServiceError> {
        let key = format!("reference:faculties:{faculty_id}:majors");
        self.cache
            .value(NAMESPACE, key, || async {
                if self.repo.faculty(faculty_id).await?.is_none() {
                    return Err(ServiceError::NotFound(Entity::Faculty));
                }
                Ok(self.repo.majors(faculty_id).await?)
            })
            .await
    }

    pub async fn job_fields(&self) -> Result<Vec<LookupRecord>, ServiceError> {
        self.cache
            .value(NAMESPACE, "reference:job_fields".to_string(), || async {
                self.repo.job_fields().await.map_err(ServiceError::from)
            })
            .await
    }

    pub async fn collaboration_fields(&self) -> Result<Vec<LookupRecord>, ServiceError> {
        self.cache
            .value(
                NAMESPACE,
                "reference:collaboration_fields".to_string(),
                || async {
                    self.repo
                        .collaboration_fields()
                        .await
                        .map_err(ServiceError::from)
                },
            )
            .await
    }
}
