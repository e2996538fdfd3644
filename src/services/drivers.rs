use crate::{
    entities::driver::{self, Entity as DriverEntity},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateDriverRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateDriverRequest {
    #[validate(length(min = 1, max = 200, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DriverResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn model_to_response(model: driver::Model) -> DriverResponse {
    DriverResponse {
        id: model.id,
        name: model.name,
        phone: model.phone,
        license_number: model.license_number,
        is_active: model.is_active,
        created_at: model.created_at,
    }
}

#[derive(Clone)]
pub struct DriverService {
    db: Arc<DatabaseConnection>,
}

impl DriverService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request))]
    pub async fn create_driver(
        &self,
        request: CreateDriverRequest,
    ) -> Result<DriverResponse, ServiceError> {
        request.validate()?;

        let model = driver::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            phone: Set(request.phone),
            license_number: Set(request.license_number),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        info!(driver_id = %model.id, "driver created");
        Ok(model_to_response(model))
    }

    #[instrument(skip(self))]
    pub async fn get_driver(&self, driver_id: Uuid) -> Result<DriverResponse, ServiceError> {
        let driver = DriverEntity::find_by_id(driver_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Driver {} not found", driver_id)))?;
        Ok(model_to_response(driver))
    }

    #[instrument(skip(self))]
    pub async fn list_drivers(
        &self,
        active_only: bool,
    ) -> Result<Vec<DriverResponse>, ServiceError> {
        let mut query = DriverEntity::find().order_by_asc(driver::Column::Name);
        if active_only {
            query = query.filter(driver::Column::IsActive.eq(true));
        }
        let drivers = query.all(&*self.db).await?;
        Ok(drivers.into_iter().map(model_to_response).collect())
    }

    #[instrument(skip(self, request), fields(driver_id = %driver_id))]
    pub async fn update_driver(
        &self,
        driver_id: Uuid,
        request: UpdateDriverRequest,
    ) -> Result<DriverResponse, ServiceError> {
        request.validate()?;

        let driver = DriverEntity::find_by_id(driver_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Driver {} not found", driver_id)))?;

        let mut active: driver::ActiveModel = driver.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(license_number) = request.license_number {
            active.license_number = Set(Some(license_number));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }

        let updated = active.update(&*self.db).await?;
        Ok(model_to_response(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_requires_name() {
        let request = CreateDriverRequest {
            name: String::new(),
            phone: None,
            license_number: None,
        };
        assert!(request.validate().is_err());
    }
}
