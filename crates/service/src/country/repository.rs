use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use models::country;

use crate::country::domain::{CountryPayload, NewCountry};
use crate::errors::ServiceError;
use crate::validation::{Violations, NAME_TAKEN};

/// Persistence abstraction for country records. Takes and returns plain
/// records; the service layer owns validation and response shaping.
#[async_trait]
pub trait CountryRepository: Send + Sync {
    /// All records in insertion order.
    async fn list(&self) -> Result<Vec<country::Model>, ServiceError>;
    async fn find(&self, id: Uuid) -> Result<Option<country::Model>, ServiceError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<country::Model>, ServiceError>;
    async fn insert(&self, new: NewCountry) -> Result<country::Model, ServiceError>;
    /// Apply the supplied fields only; absent fields keep their prior values.
    async fn update(&self, id: Uuid, changes: &CountryPayload) -> Result<country::Model, ServiceError>;
    async fn set_flag_url(&self, id: Uuid, flag_url: &str) -> Result<country::Model, ServiceError>;
    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;
}

/// The unique index on `name` is the atomic uniqueness guarantee; a racing
/// insert surfaces here as a driver error that must keep its 422 shape.
fn map_db_err(e: sea_orm::DbErr) -> ServiceError {
    let msg = e.to_string();
    if msg.contains("duplicate key") || msg.contains("unique constraint") {
        let mut violations = Violations::new();
        violations.add("name", NAME_TAKEN);
        ServiceError::Validation(violations)
    } else {
        ServiceError::Db(msg)
    }
}

/// SeaORM-backed repository implementation.
pub struct SeaOrmCountryRepository {
    pub db: DatabaseConnection,
}

#[async_trait]
impl CountryRepository for SeaOrmCountryRepository {
    async fn list(&self) -> Result<Vec<country::Model>, ServiceError> {
        country::Entity::find()
            .order_by_asc(country::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn find(&self, id: Uuid) -> Result<Option<country::Model>, ServiceError> {
        country::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<country::Model>, ServiceError> {
        country::Entity::find()
            .filter(country::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn insert(&self, new: NewCountry) -> Result<country::Model, ServiceError> {
        let now = Utc::now().into();
        let am = country::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new.name),
            capital: Set(new.capital),
            population: Set(new.population),
            region: Set(new.region),
            flag_url: Set(new.flag_url),
            motto: Set(new.motto),
            language: Set(new.language),
            description: Set(new.description),
            created_at: Set(now),
            updated_at: Set(now),
        };
        am.insert(&self.db).await.map_err(map_db_err)
    }

    async fn update(&self, id: Uuid, changes: &CountryPayload) -> Result<country::Model, ServiceError> {
        let mut am: country::ActiveModel = country::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .ok_or_else(|| ServiceError::NotFound("country".into()))?
            .into();

        if let Some(name) = &changes.name {
            am.name = Set(name.clone());
        }
        if let Some(capital) = &changes.capital {
            am.capital = Set(capital.clone());
        }
        if let Some(population) = changes.population {
            am.population = Set(population);
        }
        if let Some(region) = &changes.region {
            am.region = Set(region.clone());
        }
        if let Some(flag_url) = &changes.flag_url {
            am.flag_url = Set(Some(flag_url.clone()));
        }
        if let Some(motto) = &changes.motto {
            am.motto = Set(Some(motto.clone()));
        }
        if let Some(language) = &changes.language {
            am.language = Set(Some(language.clone()));
        }
        if let Some(description) = &changes.description {
            am.description = Set(Some(description.clone()));
        }
        am.updated_at = Set(Utc::now().into());
        am.update(&self.db).await.map_err(map_db_err)
    }

    async fn set_flag_url(&self, id: Uuid, flag_url: &str) -> Result<country::Model, ServiceError> {
        let mut am: country::ActiveModel = country::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .ok_or_else(|| ServiceError::NotFound("country".into()))?
            .into();
        am.flag_url = Set(Some(flag_url.to_string()));
        am.updated_at = Set(Utc::now().into());
        am.update(&self.db).await.map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = country::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }
}

/// In-memory repository for tests and examples. Enforces the same name
/// uniqueness the database index provides, so callers see identical
/// conflict behavior.
pub mod memory {
    use super::*;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct MemoryCountryRepository {
        rows: RwLock<Vec<country::Model>>,
    }

    impl MemoryCountryRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    fn name_conflict() -> ServiceError {
        let mut violations = Violations::new();
        violations.add("name", NAME_TAKEN);
        ServiceError::Validation(violations)
    }

    #[async_trait]
    impl CountryRepository for MemoryCountryRepository {
        async fn list(&self) -> Result<Vec<country::Model>, ServiceError> {
            Ok(self.rows.read().await.clone())
        }

        async fn find(&self, id: Uuid) -> Result<Option<country::Model>, ServiceError> {
            Ok(self.rows.read().await.iter().find(|m| m.id == id).cloned())
        }

        async fn find_by_name(&self, name: &str) -> Result<Option<country::Model>, ServiceError> {
            Ok(self.rows.read().await.iter().find(|m| m.name == name).cloned())
        }

        async fn insert(&self, new: NewCountry) -> Result<country::Model, ServiceError> {
            let mut rows = self.rows.write().await;
            if rows.iter().any(|m| m.name == new.name) {
                return Err(name_conflict());
            }
            let now = Utc::now().into();
            let model = country::Model {
                id: Uuid::new_v4(),
                name: new.name,
                capital: new.capital,
                population: new.population,
                region: new.region,
                flag_url: new.flag_url,
                motto: new.motto,
                language: new.language,
                description: new.description,
                created_at: now,
                updated_at: now,
            };
            rows.push(model.clone());
            Ok(model)
        }

        async fn update(&self, id: Uuid, changes: &CountryPayload) -> Result<country::Model, ServiceError> {
            let mut rows = self.rows.write().await;
            if let Some(name) = &changes.name {
                if rows.iter().any(|m| m.name == *name && m.id != id) {
                    return Err(name_conflict());
                }
            }
            let row = rows
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| ServiceError::NotFound("country".into()))?;
            if let Some(name) = &changes.name {
                row.name = name.clone();
            }
            if let Some(capital) = &changes.capital {
                row.capital = capital.clone();
            }
            if let Some(population) = changes.population {
                row.population = population;
            }
            if let Some(region) = &changes.region {
                row.region = region.clone();
            }
            if let Some(flag_url) = &changes.flag_url {
                row.flag_url = Some(flag_url.clone());
            }
            if let Some(motto) = &changes.motto {
                row.motto = Some(motto.clone());
            }
            if let Some(language) = &changes.language {
                row.language = Some(language.clone());
            }
            if let Some(description) = &changes.description {
                row.description = Some(description.clone());
            }
            row.updated_at = Utc::now().into();
            Ok(row.clone())
        }

        async fn set_flag_url(&self, id: Uuid, flag_url: &str) -> Result<country::Model, ServiceError> {
            let mut rows = self.rows.write().await;
            let row = rows
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| ServiceError::NotFound("country".into()))?;
            row.flag_url = Some(flag_url.to_string());
            row.updated_at = Utc::now().into();
            Ok(row.clone())
        }

        async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
            let mut rows = self.rows.write().await;
            let before = rows.len();
            rows.retain(|m| m.id != id);
            Ok(rows.len() < before)
        }
    }
}
