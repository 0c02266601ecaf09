use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::country;

use crate::country::domain::{CountryPayload, FlagUpload};
use crate::country::repository::CountryRepository;
use crate::errors::ServiceError;
use crate::storage::FlagStore;
use crate::validation::{self, NAME_TAKEN};

pub const COUNTRY_NOT_FOUND: &str = "Pays non trouvé";
pub const COUNTRY_DELETED: &str = "Pays supprimé avec succès";
pub const FLAG_UPDATED: &str = "Drapeau mis à jour avec succès";
pub const FLAG_NOT_FOUND: &str = "Drapeau non trouvé";

fn not_found() -> ServiceError {
    ServiceError::NotFound(COUNTRY_NOT_FOUND.into())
}

fn flag_not_found() -> ServiceError {
    ServiceError::NotFound(FLAG_NOT_FOUND.into())
}

/// Application service for the country resource. Validates input against the
/// rule tables, enforces name uniqueness against the repository, and
/// orchestrates flag storage alongside persistence.
pub struct CountryService {
    repo: Arc<dyn CountryRepository>,
    flags: Arc<dyn FlagStore>,
}

impl CountryService {
    pub fn new(repo: Arc<dyn CountryRepository>, flags: Arc<dyn FlagStore>) -> Self {
        Self { repo, flags }
    }

    pub async fn list(&self) -> Result<Vec<country::Model>, ServiceError> {
        self.repo.list().await
    }

    #[instrument(skip(self, payload))]
    pub async fn create(&self, payload: CountryPayload) -> Result<country::Model, ServiceError> {
        let mut violations = validation::validate(validation::CREATE_RULES, |f| payload.field(f));
        if let Some(name) = payload.name.as_deref() {
            if self.repo.find_by_name(name).await?.is_some() {
                violations.add("name", NAME_TAKEN);
            }
        }
        if !violations.is_empty() {
            return Err(ServiceError::Validation(violations));
        }

        let new = payload
            .into_new()
            .ok_or_else(|| ServiceError::Db("validated payload missing required field".into()))?;
        let created = self.repo.insert(new).await?;
        info!(id = %created.id, name = %created.name, "country_created");
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<country::Model, ServiceError> {
        self.repo.find(id).await?.ok_or_else(not_found)
    }

    #[instrument(skip(self, payload))]
    pub async fn update(&self, id: Uuid, payload: CountryPayload) -> Result<country::Model, ServiceError> {
        let existing = self.repo.find(id).await?.ok_or_else(not_found)?;

        let mut violations = validation::validate(validation::UPDATE_RULES, |f| payload.field(f));
        // Uniqueness excludes the record's own current name.
        if let Some(name) = payload.name.as_deref() {
            if let Some(other) = self.repo.find_by_name(name).await? {
                if other.id != existing.id {
                    violations.add("name", NAME_TAKEN);
                }
            }
        }
        if !violations.is_empty() {
            return Err(ServiceError::Validation(violations));
        }

        let updated = self
            .repo
            .update(id, &payload)
            .await
            .map_err(|e| match e {
                ServiceError::NotFound(_) => not_found(),
                other => other,
            })?;
        info!(id = %updated.id, "country_updated");
        Ok(updated)
    }

    /// Removes the record only; an associated flag file stays in storage.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(not_found());
        }
        info!(id = %id, "country_deleted");
        Ok(())
    }

    /// Replace the country's flag: validate the upload, best-effort delete the
    /// previously stored file, save the new one under a generated path, and
    /// persist the resolved public URL.
    #[instrument(skip(self, upload))]
    pub async fn update_flag(&self, id: Uuid, upload: FlagUpload) -> Result<String, ServiceError> {
        let country = self.repo.find(id).await?.ok_or_else(not_found)?;

        let ext = validation::validate_flag_upload(
            upload.file_name.as_deref(),
            upload.content_type.as_deref(),
            upload.bytes.len(),
        )
        .map_err(ServiceError::Validation)?;

        if let Some(old_url) = country.flag_url.as_deref() {
            if let Some(basename) = old_url.rsplit('/').next() {
                let old_path = format!("flags/{}", basename);
                if self.flags.exists(&old_path).await {
                    if let Err(e) = self.flags.delete(&old_path).await {
                        warn!(id = %id, path = %old_path, error = %e, "failed to delete previous flag file");
                    }
                }
            }
        }

        let path = self.flags.save(&ext, &upload.bytes).await?;
        let url = self.flags.url(&path);
        self.repo
            .set_flag_url(id, &url)
            .await
            .map_err(|e| match e {
                ServiceError::NotFound(_) => not_found(),
                other => other,
            })?;
        info!(id = %id, url = %url, "flag_updated");
        Ok(url)
    }

    /// Current flag URL; absent record or absent flag both read as missing.
    pub async fn get_flag(&self, id: Uuid) -> Result<String, ServiceError> {
        let country = self.repo.find(id).await?.ok_or_else(flag_not_found)?;
        country.flag_url.ok_or_else(flag_not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::repository::memory::MemoryCountryRepository;
    use crate::storage::memory::MemoryFlagStore;

    fn service_with_store() -> (CountryService, Arc<MemoryFlagStore>) {
        let repo = Arc::new(MemoryCountryRepository::new());
        let flags = Arc::new(MemoryFlagStore::new());
        (CountryService::new(repo, flags.clone()), flags)
    }

    fn service() -> CountryService {
        service_with_store().0
    }

    fn wakanda() -> CountryPayload {
        CountryPayload {
            name: Some("Wakanda".into()),
            capital: Some("Birnin Zana".into()),
            population: Some(6_000_000),
            region: Some("Africa".into()),
            ..Default::default()
        }
    }

    fn png_upload(len: usize) -> FlagUpload {
        FlagUpload {
            file_name: Some("flag.png".into()),
            content_type: Some("image/png".into()),
            bytes: vec![0u8; len],
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_equal_record() {
        let svc = service();
        let created = svc.create(wakanda()).await.expect("create");
        assert!(created.flag_url.is_none());

        let fetched = svc.get(created.id).await.expect("get");
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Wakanda");
        assert_eq!(fetched.population, 6_000_000);
    }

    #[tokio::test]
    async fn create_reports_every_missing_field() {
        let svc = service();
        let err = svc.create(CountryPayload::default()).await.expect_err("invalid");
        let ServiceError::Validation(violations) = err else {
            panic!("expected validation error");
        };
        assert!(violations.contains("name"));
        assert!(violations.contains("capital"));
        assert!(violations.contains("population"));
        assert!(violations.contains("region"));
    }

    #[tokio::test]
    async fn duplicate_name_rejected_on_second_create() {
        let svc = service();
        svc.create(wakanda()).await.expect("first");
        let err = svc.create(wakanda()).await.expect_err("duplicate");
        let ServiceError::Validation(violations) = err else {
            panic!("expected validation error");
        };
        assert!(violations.contains("name"));
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let svc = service();
        let created = svc.create(wakanda()).await.expect("create");

        let changes = CountryPayload {
            population: Some(7_000_000),
            motto: Some("Wakanda forever".into()),
            ..Default::default()
        };
        let updated = svc.update(created.id, changes).await.expect("update");
        assert_eq!(updated.population, 7_000_000);
        assert_eq!(updated.motto.as_deref(), Some("Wakanda forever"));
        assert_eq!(updated.name, "Wakanda");
        assert_eq!(updated.capital, "Birnin Zana");
    }

    #[tokio::test]
    async fn update_negative_population_rejected_and_record_unchanged() {
        let svc = service();
        let created = svc.create(wakanda()).await.expect("create");

        let changes = CountryPayload { population: Some(-1), ..Default::default() };
        let err = svc.update(created.id, changes).await.expect_err("invalid");
        let ServiceError::Validation(violations) = err else {
            panic!("expected validation error");
        };
        assert!(violations.contains("population"));

        let stored = svc.get(created.id).await.expect("get");
        assert_eq!(stored.population, 6_000_000);
    }

    #[tokio::test]
    async fn update_keeping_own_name_is_allowed() {
        let svc = service();
        let created = svc.create(wakanda()).await.expect("create");

        let changes = CountryPayload {
            name: Some("Wakanda".into()),
            capital: Some("New Birnin Zana".into()),
            ..Default::default()
        };
        let updated = svc.update(created.id, changes).await.expect("self-name update");
        assert_eq!(updated.capital, "New Birnin Zana");
    }

    #[tokio::test]
    async fn update_to_another_records_name_conflicts() {
        let svc = service();
        svc.create(wakanda()).await.expect("first");
        let other = svc
            .create(CountryPayload {
                name: Some("Latveria".into()),
                capital: Some("Doomstadt".into()),
                population: Some(500_000),
                region: Some("Europe".into()),
                ..Default::default()
            })
            .await
            .expect("second");

        let changes = CountryPayload { name: Some("Wakanda".into()), ..Default::default() };
        let err = svc.update(other.id, changes).await.expect_err("conflict");
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let svc = service();
        let created = svc.create(wakanda()).await.expect("create");
        svc.delete(created.id).await.expect("delete");

        let err = svc.get(created.id).await.expect_err("gone");
        let ServiceError::NotFound(msg) = err else {
            panic!("expected not found");
        };
        assert_eq!(msg, COUNTRY_NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_country_operations_are_not_found() {
        let svc = service();
        let id = Uuid::new_v4();
        assert!(matches!(svc.get(id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete(id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            svc.update(id, CountryPayload::default()).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            svc.update_flag(id, png_upload(10)).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn flag_upload_sets_url_and_get_flag_returns_it() {
        let (svc, store) = service_with_store();
        let created = svc.create(wakanda()).await.expect("create");

        let url = svc.update_flag(created.id, png_upload(1024)).await.expect("upload");
        assert!(url.starts_with("/storage/flags/"));
        assert!(url.ends_with(".png"));
        assert_eq!(store.len().await, 1);

        let fetched = svc.get_flag(created.id).await.expect("get flag");
        assert_eq!(fetched, url);

        let record = svc.get(created.id).await.expect("get");
        assert_eq!(record.flag_url.as_deref(), Some(url.as_str()));
    }

    #[tokio::test]
    async fn flag_replacement_deletes_previous_file() {
        let (svc, store) = service_with_store();
        let created = svc.create(wakanda()).await.expect("create");

        let first = svc.update_flag(created.id, png_upload(10)).await.expect("first");
        let second = svc.update_flag(created.id, png_upload(20)).await.expect("second");
        assert_ne!(first, second);
        // The replaced file is gone; only the new one remains.
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn oversize_flag_rejected_and_url_unchanged() {
        let (svc, store) = service_with_store();
        let created = svc.create(wakanda()).await.expect("create");

        let err = svc
            .update_flag(created.id, png_upload(2049 * 1024))
            .await
            .expect_err("too large");
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(store.is_empty().await);

        let record = svc.get(created.id).await.expect("get");
        assert!(record.flag_url.is_none());
    }

    #[tokio::test]
    async fn get_flag_without_upload_is_not_found() {
        let svc = service();
        let created = svc.create(wakanda()).await.expect("create");
        let err = svc.get_flag(created.id).await.expect_err("no flag");
        let ServiceError::NotFound(msg) = err else {
            panic!("expected not found");
        };
        assert_eq!(msg, FLAG_NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_leaves_flag_file_in_storage() {
        let (svc, store) = service_with_store();
        let created = svc.create(wakanda()).await.expect("create");
        svc.update_flag(created.id, png_upload(10)).await.expect("upload");
        svc.delete(created.id).await.expect("delete");
        // Record removal does not cascade to the stored file.
        assert_eq!(store.len().await, 1);
    }
}
