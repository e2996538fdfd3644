use crate::{
    entities::{
        delivery::{self, DeliveryStatus, Entity as DeliveryEntity},
        driver::Entity as DriverEntity,
        order::Entity as OrderEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateDeliveryRequest {
    pub order_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub scheduled_date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateDeliveryStatusRequest {
    pub status: DeliveryStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AssignDriverRequest {
    pub driver_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeliveryFilter {
    pub status: Option<String>,
    pub driver_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub status: String,
    pub scheduled_date: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryListResponse {
    pub deliveries: Vec<DeliveryResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

fn model_to_response(model: delivery::Model) -> DeliveryResponse {
    DeliveryResponse {
        id: model.id,
        order_id: model.order_id,
        driver_id: model.driver_id,
        status: model.status,
        scheduled_date: model.scheduled_date,
        delivered_at: model.delivered_at,
        notes: model.notes,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[derive(Clone)]
pub struct DeliveryService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
}

impl DeliveryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_delivery(
        &self,
        request: CreateDeliveryRequest,
    ) -> Result<DeliveryResponse, ServiceError> {
        request.validate()?;

        OrderEntity::find_by_id(request.order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", request.order_id))
            })?;

        if let Some(driver_id) = request.driver_id {
            DriverEntity::find_by_id(driver_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!("Unknown driver {}", driver_id))
                })?;
        }

        let now = Utc::now();
        let model = delivery::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(request.order_id),
            driver_id: Set(request.driver_id),
            status: Set(DeliveryStatus::Scheduled.to_string()),
            scheduled_date: Set(request.scheduled_date),
            delivered_at: Set(None),
            notes: Set(request.notes),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.db)
        .await?;

        info!(delivery_id = %model.id, order_id = %model.order_id, "delivery scheduled");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::DeliveryScheduled(model.id)).await {
                warn!(error = %e, delivery_id = %model.id, "failed to send delivery scheduled event");
            }
        }

        Ok(model_to_response(model))
    }

    #[instrument(skip(self))]
    pub async fn get_delivery(&self, delivery_id: Uuid) -> Result<DeliveryResponse, ServiceError> {
        let delivery = DeliveryEntity::find_by_id(delivery_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Delivery {} not found", delivery_id))
            })?;
        Ok(model_to_response(delivery))
    }

    #[instrument(skip(self))]
    pub async fn list_deliveries(
        &self,
        filter: DeliveryFilter,
        page: u64,
        per_page: u64,
    ) -> Result<DeliveryListResponse, ServiceError> {
        let mut query = DeliveryEntity::find().order_by_desc(delivery::Column::ScheduledDate);

        if let Some(status) = &filter.status {
            query = query.filter(delivery::Column::Status.eq(status.clone()));
        }
        if let Some(driver_id) = filter.driver_id {
            query = query.filter(delivery::Column::DriverId.eq(driver_id));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let deliveries = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(DeliveryListResponse {
            deliveries: deliveries.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Move a delivery along the fulfillment path. Reaching `delivered`
    /// stamps `delivered_at`.
    #[instrument(skip(self, request), fields(delivery_id = %delivery_id, new_status = %request.status))]
    pub async fn update_status(
        &self,
        delivery_id: Uuid,
        request: UpdateDeliveryStatusRequest,
    ) -> Result<DeliveryResponse, ServiceError> {
        let delivery = DeliveryEntity::find_by_id(delivery_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Delivery {} not found", delivery_id))
            })?;

        let now = Utc::now();
        let completed = request.status == DeliveryStatus::Delivered;

        let mut active: delivery::ActiveModel = delivery.into();
        active.status = Set(request.status.to_string());
        active.updated_at = Set(Some(now));
        if completed {
            active.delivered_at = Set(Some(now));
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        let updated = active.update(&*self.db).await?;

        if completed {
            if let Some(event_sender) = &self.event_sender {
                if let Err(e) = event_sender.send(Event::DeliveryCompleted(delivery_id)).await {
                    warn!(error = %e, delivery_id = %delivery_id, "failed to send delivery completed event");
                }
            }
        }

        Ok(model_to_response(updated))
    }

    #[instrument(skip(self, request), fields(delivery_id = %delivery_id))]
    pub async fn assign_driver(
        &self,
        delivery_id: Uuid,
        request: AssignDriverRequest,
    ) -> Result<DeliveryResponse, ServiceError> {
        let delivery = DeliveryEntity::find_by_id(delivery_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Delivery {} not found", delivery_id))
            })?;

        let driver = DriverEntity::find_by_id(request.driver_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Unknown driver {}", request.driver_id))
            })?;

        if !driver.is_active {
            return Err(ServiceError::InvalidOperation(format!(
                "Driver {} is inactive",
                driver.name
            )));
        }

        let mut active: delivery::ActiveModel = delivery.into();
        active.driver_id = Set(Some(request.driver_id));
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        Ok(model_to_response(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_status_round_trips() {
        assert_eq!(DeliveryStatus::OutForDelivery.to_string(), "out_for_delivery");
        assert_eq!(
            "delivered".parse::<DeliveryStatus>().unwrap(),
            DeliveryStatus::Delivered
        );
    }
}
