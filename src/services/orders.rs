use crate::{
    entities::{
        inventory_movement::{self, MovementReason},
        order::{self, Entity as OrderEntity, OrderStatus},
        order_item::{self, Entity as OrderItemEntity},
        product::{self, Entity as ProductEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,

    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<CreateOrderItem>,

    pub route_code: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderItem {
    pub product_id: Uuid,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,

    /// Overrides the product's sale price when set.
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    pub route_code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub status: String,
    pub route_code: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Populated on single-order reads; empty in listings.
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("ORD-{}-{:04}", now.format("%Y%m%d"), suffix)
}

fn item_to_response(model: order_item::Model) -> OrderItemResponse {
    OrderItemResponse {
        id: model.id,
        product_id: model.product_id,
        sku: model.sku,
        name: model.name,
        quantity: model.quantity,
        unit_price: model.unit_price,
        total_price: model.total_price,
    }
}

fn model_to_response(model: order::Model, items: Vec<order_item::Model>) -> OrderResponse {
    OrderResponse {
        id: model.id,
        order_number: model.order_number,
        customer_id: model.customer_id,
        status: model.status,
        route_code: model.route_code,
        delivery_date: model.delivery_date,
        total_amount: model.total_amount,
        notes: model.notes,
        created_at: model.created_at,
        updated_at: model.updated_at,
        items: items.into_iter().map(item_to_response).collect(),
    }
}

/// Order lifecycle service.
///
/// Creation and cancellation adjust product stock and append to the
/// inventory ledger inside one transaction, so an order's rows, its stock
/// decrements and the ledger entries land (or fail) together.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        // Resolve each line's product and price it.
        let mut priced_items = Vec::with_capacity(request.items.len());
        let mut total_amount = Decimal::ZERO;
        for line in &request.items {
            line.validate()?;
            let product = ProductEntity::find_by_id(line.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "items reference an unknown product ({})",
                        line.product_id
                    ))
                })?;

            if !product.is_active {
                return Err(ServiceError::ValidationError(format!(
                    "product {} is inactive",
                    product.sku
                )));
            }

            let unit_price = line.unit_price.unwrap_or(product.sale_price);
            let total_price = unit_price * Decimal::from(line.quantity);
            total_amount += total_price;
            priced_items.push((product, line.quantity, unit_price, total_price));
        }

        let order_model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(generate_order_number(now)),
            customer_id: Set(request.customer_id),
            status: Set(OrderStatus::Pending.to_string()),
            route_code: Set(request.route_code),
            delivery_date: Set(request.delivery_date),
            total_amount: Set(total_amount),
            notes: Set(request.notes),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await?;

        let mut item_models = Vec::with_capacity(priced_items.len());
        for (product, quantity, unit_price, total_price) in &priced_items {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product.id),
                sku: Set(product.sku.clone()),
                name: Set(product.name.clone()),
                quantity: Set(*quantity),
                unit_price: Set(*unit_price),
                total_price: Set(*total_price),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            item_models.push(item);

            // Stock may go negative; backorders are recorded, not refused.
            apply_stock_delta(
                &txn,
                product.id,
                -quantity,
                MovementReason::Sale,
                Some(order_id),
                None,
                now,
            )
            .await?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, total = %total_amount, "order created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCreated(order_id)).await {
                warn!(error = %e, order_id = %order_id, "failed to send order created event");
            }
        }

        Ok(model_to_response(order_model, item_models))
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        Ok(model_to_response(order, items))
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        filter: OrderFilter,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let mut query = OrderEntity::find().order_by_desc(order::Column::CreatedAt);

        if let Some(status) = &filter.status {
            query = query.filter(order::Column::Status.eq(status.clone()));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(order::Column::CustomerId.eq(customer_id));
        }
        if let Some(route) = &filter.route_code {
            query = query.filter(order::Column::RouteCode.eq(route.clone()));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(OrderListResponse {
            orders: orders
                .into_iter()
                .map(|o| model_to_response(o, Vec::new()))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    /// Update an order's fulfillment status. A transition to `cancelled`
    /// goes through [`Self::cancel_order`] so the restock always happens.
    #[instrument(skip(self, request), fields(order_id = %order_id, new_status = %request.status))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderResponse, ServiceError> {
        if request.status == OrderStatus::Cancelled {
            return self.cancel_order(order_id, request.notes).await;
        }

        let db = &*self.db;
        let now = Utc::now();

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.status == OrderStatus::Cancelled.to_string() {
            return Err(ServiceError::InvalidOperation(
                "Cancelled orders cannot change status".to_string(),
            ));
        }

        let old_status = order.status.clone();
        let mut active: order::ActiveModel = order.into();
        active.status = Set(request.status.to_string());
        active.updated_at = Set(Some(now));
        if request.status == OrderStatus::Delivered {
            active.delivery_date = Set(Some(now));
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }

        let updated = active.update(db).await?;

        info!(order_id = %order_id, old_status = %old_status, new_status = %updated.status, "order status updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::OrderStatusChanged {
                    order_id,
                    old_status,
                    new_status: updated.status.clone(),
                })
                .await
            {
                warn!(error = %e, order_id = %order_id, "failed to send status changed event");
            }
        }

        Ok(model_to_response(updated, Vec::new()))
    }

    /// Cancel an order, restoring the stock its items decremented.
    ///
    /// Idempotent: cancelling an already-cancelled order returns it
    /// unchanged and writes nothing to the ledger.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "failed to start cancel transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.status == OrderStatus::Cancelled.to_string() {
            txn.rollback().await?;
            info!(order_id = %order_id, "order already cancelled; no-op");
            return Ok(model_to_response(order, Vec::new()));
        }

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&txn)
            .await?;

        for item in &items {
            apply_stock_delta(
                &txn,
                item.product_id,
                item.quantity,
                MovementReason::Cancel,
                Some(order_id),
                None,
                now,
            )
            .await?;
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Cancelled.to_string());
        active.updated_at = Set(Some(now));
        if let Some(reason) = reason {
            active.notes = Set(Some(reason));
        }
        let cancelled = active.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "failed to commit cancellation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, restocked_items = items.len(), "order cancelled");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCancelled(order_id)).await {
                warn!(error = %e, order_id = %order_id, "failed to send order cancelled event");
            }
        }

        Ok(model_to_response(cancelled, items))
    }
}

/// Apply a signed stock delta to a product and append the matching ledger
/// row. Runs on the caller's transaction.
pub(crate) async fn apply_stock_delta<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    delta: i32,
    reason: MovementReason,
    order_id: Option<Uuid>,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let product = ProductEntity::find_by_id(product_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

    let new_stock = product.stock + delta;
    let mut active: product::ActiveModel = product.into();
    active.stock = Set(new_stock);
    active.updated_at = Set(Some(now));
    active.update(conn).await?;

    inventory_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        order_id: Set(order_id),
        quantity: Set(delta),
        reason: Set(reason.to_string()),
        note: Set(note),
        created_at: Set(now),
    }
    .insert(conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_number_embeds_date() {
        let now = Utc::now();
        let number = generate_order_number(now);
        assert!(number.starts_with(&format!("ORD-{}", now.format("%Y%m%d"))));
    }

    #[test]
    fn model_to_response_carries_items() {
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let order = order::Model {
            id: order_id,
            order_number: "ORD-20260302-0001".to_string(),
            customer_id: Uuid::new_v4(),
            status: OrderStatus::Pending.to_string(),
            route_code: Some("NORTH".to_string()),
            delivery_date: None,
            total_amount: dec!(39.80),
            notes: None,
            created_at: now,
            updated_at: Some(now),
        };
        let items = vec![order_item::Model {
            id: Uuid::new_v4(),
            order_id,
            product_id: Uuid::new_v4(),
            sku: "SKU-19L".to_string(),
            name: "19L Bottle".to_string(),
            quantity: 4,
            unit_price: dec!(9.95),
            total_price: dec!(39.80),
            created_at: now,
        }];

        let response = model_to_response(order, items);
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].total_price, dec!(39.80));
        assert_eq!(response.status, "pending");
        assert_eq!(response.route_code.as_deref(), Some("NORTH"));
    }

    #[test]
    fn create_request_rejects_empty_items() {
        let request = CreateOrderRequest {
            customer_id: Uuid::new_v4(),
            items: vec![],
            route_code: None,
            delivery_date: None,
            notes: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn order_line_rejects_zero_quantity() {
        let line = CreateOrderItem {
            product_id: Uuid::new_v4(),
            quantity: 0,
            unit_price: None,
        };
        assert!(line.validate().is_err());

        let line = CreateOrderItem {
            product_id: Uuid::new_v4(),
            quantity: 3,
            unit_price: None,
        };
        assert!(line.validate().is_ok());
    }
}
