use crate::{
    entities::customer::{self, CustomerStatus, Entity as CustomerEntity},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: Option<CustomerStatus>,
    pub credit_limit: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 200, message = "Name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: Option<CustomerStatus>,
    pub credit_limit: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerFilter {
    pub status: Option<String>,
    /// Case-insensitive substring match on the customer name.
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: String,
    pub credit_limit: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerListResponse {
    pub customers: Vec<CustomerResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

fn model_to_response(model: customer::Model) -> CustomerResponse {
    CustomerResponse {
        id: model.id,
        name: model.name,
        email: model.email,
        phone: model.phone,
        address: model.address,
        status: model.status,
        credit_limit: model.credit_limit,
        notes: model.notes,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<CustomerResponse, ServiceError> {
        request.validate()?;
        let now = Utc::now();

        let model = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            status: Set(request.status.unwrap_or(CustomerStatus::Active).to_string()),
            credit_limit: Set(request.credit_limit.unwrap_or(Decimal::ZERO)),
            notes: Set(request.notes),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.db)
        .await?;

        info!(customer_id = %model.id, "customer created");
        Ok(model_to_response(model))
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<CustomerResponse, ServiceError> {
        let customer = CustomerEntity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", customer_id))
            })?;
        Ok(model_to_response(customer))
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        filter: CustomerFilter,
        page: u64,
        per_page: u64,
    ) -> Result<CustomerListResponse, ServiceError> {
        let mut query = CustomerEntity::find().order_by_asc(customer::Column::Name);

        if let Some(status) = &filter.status {
            query = query.filter(customer::Column::Status.eq(status.clone()));
        }
        if let Some(search) = &filter.search {
            let trimmed = search.trim();
            if !trimmed.is_empty() {
                query = query.filter(customer::Column::Name.contains(trimmed));
            }
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(CustomerListResponse {
            customers: customers.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self, request), fields(customer_id = %customer_id))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<CustomerResponse, ServiceError> {
        request.validate()?;

        let customer = CustomerEntity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", customer_id))
            })?;

        let mut active: customer::ActiveModel = customer.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(email) = request.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = request.address {
            active.address = Set(Some(address));
        }
        if let Some(status) = request.status {
            active.status = Set(status.to_string());
        }
        if let Some(credit_limit) = request.credit_limit {
            active.credit_limit = Set(credit_limit);
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await?;
        Ok(model_to_response(updated))
    }

    /// Customers are never hard-deleted (orders and invoices reference
    /// them); deletion marks the account inactive.
    #[instrument(skip(self))]
    pub async fn deactivate_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<CustomerResponse, ServiceError> {
        let customer = CustomerEntity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", customer_id))
            })?;

        let mut active: customer::ActiveModel = customer.into();
        active.status = Set(CustomerStatus::Inactive.to_string());
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        info!(customer_id = %customer_id, "customer deactivated");
        Ok(model_to_response(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_requires_name() {
        let request = CreateCustomerRequest {
            name: String::new(),
            email: None,
            phone: None,
            address: None,
            status: None,
            credit_limit: None,
            notes: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn create_request_rejects_bad_email() {
        let request = CreateCustomerRequest {
            name: "Riverside Cafe".to_string(),
            email: Some("not-an-email".to_string()),
            phone: None,
            address: None,
            status: None,
            credit_limit: None,
            notes: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(CustomerStatus::Vip.to_string(), "vip");
        assert_eq!("inactive".parse::<CustomerStatus>().unwrap(), CustomerStatus::Inactive);
    }
}
