use crate::{
    entities::{
        inventory_movement::{self, Entity as MovementEntity, MovementReason},
        product::{self, Entity as ProductEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::orders::apply_stock_delta,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 64, message = "SKU is required"))]
    pub sku: String,
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 32, message = "Unit is required"))]
    pub unit: String,
    pub cost_price: Decimal,
    pub sale_price: Decimal,
    pub stock: Option<i32>,
    pub reorder_level: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub cost_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub reorder_level: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RestockRequest {
    #[validate(range(min = 1, message = "Restock quantity must be at least 1"))]
    pub quantity: i32,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductFilter {
    /// Case-insensitive substring match on name or SKU.
    pub search: Option<String>,
    pub active_only: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub cost_price: Decimal,
    pub sale_price: Decimal,
    pub stock: i32,
    pub reorder_level: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovementResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub order_id: Option<Uuid>,
    pub quantity: i32,
    pub reason: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn model_to_response(model: product::Model) -> ProductResponse {
    ProductResponse {
        id: model.id,
        sku: model.sku,
        name: model.name,
        description: model.description,
        unit: model.unit,
        cost_price: model.cost_price,
        sale_price: model.sale_price,
        stock: model.stock,
        reorder_level: model.reorder_level,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn movement_to_response(model: inventory_movement::Model) -> MovementResponse {
    MovementResponse {
        id: model.id,
        product_id: model.product_id,
        order_id: model.order_id,
        quantity: model.quantity,
        reason: model.reason,
        note: model.note,
        created_at: model.created_at,
    }
}

/// Product catalog and stock operations. Manual restocks go through the
/// same ledger as order-driven movements.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;

        let existing = ProductEntity::find()
            .filter(product::Column::Sku.eq(request.sku.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "SKU {} already exists",
                request.sku
            )));
        }

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(request.sku),
            name: Set(request.name),
            description: Set(request.description),
            unit: Set(request.unit),
            cost_price: Set(request.cost_price),
            sale_price: Set(request.sale_price),
            stock: Set(request.stock.unwrap_or(0)),
            reorder_level: Set(request.reorder_level.unwrap_or(0)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = %model.id, sku = %model.sku, "product created");
        Ok(model_to_response(model))
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductResponse, ServiceError> {
        let product = ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        Ok(model_to_response(product))
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        page: u64,
        per_page: u64,
    ) -> Result<ProductListResponse, ServiceError> {
        let mut query = ProductEntity::find().order_by_asc(product::Column::Sku);

        if filter.active_only.unwrap_or(false) {
            query = query.filter(product::Column::IsActive.eq(true));
        }
        if let Some(search) = &filter.search {
            let trimmed = search.trim();
            if !trimmed.is_empty() {
                query = query.filter(
                    Condition::any()
                        .add(product::Column::Name.contains(trimmed))
                        .add(product::Column::Sku.contains(trimmed)),
                );
            }
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(ProductListResponse {
            products: products.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Products at or below their reorder level, most depleted first.
    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<ProductResponse>, ServiceError> {
        let products = ProductEntity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(Expr::col(product::Column::Stock).lte(Expr::col(product::Column::ReorderLevel)))
            .order_by_asc(product::Column::Stock)
            .all(&*self.db)
            .await?;
        Ok(products.into_iter().map(model_to_response).collect())
    }

    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;

        let product = ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let mut active: product::ActiveModel = product.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(unit) = request.unit {
            active.unit = Set(unit);
        }
        if let Some(cost_price) = request.cost_price {
            active.cost_price = Set(cost_price);
        }
        if let Some(sale_price) = request.sale_price {
            active.sale_price = Set(sale_price);
        }
        if let Some(reorder_level) = request.reorder_level {
            active.reorder_level = Set(reorder_level);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await?;
        Ok(model_to_response(updated))
    }

    /// Manual replenishment: bumps stock and appends a `restock` ledger row
    /// in one transaction.
    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn restock(
        &self,
        product_id: Uuid,
        request: RestockRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "failed to start restock transaction");
            ServiceError::DatabaseError(e)
        })?;

        apply_stock_delta(
            &txn,
            product_id,
            request.quantity,
            MovementReason::Restock,
            None,
            request.note.clone(),
            now,
        )
        .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, product_id = %product_id, "failed to commit restock");
            ServiceError::DatabaseError(e)
        })?;

        info!(product_id = %product_id, quantity = request.quantity, "product restocked");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::StockAdjusted {
                    product_id,
                    quantity: request.quantity,
                    reason: MovementReason::Restock.to_string(),
                })
                .await
            {
                warn!(error = %e, product_id = %product_id, "failed to send stock adjusted event");
            }
        }

        self.get_product(product_id).await
    }

    /// The product's slice of the inventory ledger, newest first.
    #[instrument(skip(self))]
    pub async fn movements(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<MovementResponse>, ServiceError> {
        // 404 for unknown products rather than an empty ledger.
        ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let movements = MovementEntity::find()
            .filter(inventory_movement::Column::ProductId.eq(product_id))
            .order_by_desc(inventory_movement::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(movements.into_iter().map(movement_to_response).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restock_request_rejects_non_positive_quantity() {
        let request = RestockRequest {
            quantity: 0,
            note: None,
        };
        assert!(request.validate().is_err());

        let request = RestockRequest {
            quantity: 24,
            note: Some("weekly truck".to_string()),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn movement_reason_round_trips() {
        assert_eq!(MovementReason::Restock.to_string(), "restock");
        assert_eq!("sale".parse::<MovementReason>().unwrap(), MovementReason::Sale);
        assert_eq!("cancel".parse::<MovementReason>().unwrap(), MovementReason::Cancel);
    }
}
