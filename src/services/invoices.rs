use crate::{
    entities::{
        invoice::{self, Entity as InvoiceEntity, InvoiceStatus},
        invoice_item::{self, Entity as InvoiceItemEntity},
        order::{Entity as OrderEntity, OrderStatus},
        order_item::{self, Entity as OrderItemEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// The invariant every write path maintains: balance never goes below zero,
/// overpayment leaves it at zero.
pub fn balance_for(total: Decimal, paid: Decimal) -> Decimal {
    (total - paid).max(Decimal::ZERO)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateInvoiceRequest {
    pub order_id: Uuid,
    /// Days until the invoice falls due (default 14).
    pub due_in_days: Option<i64>,
    pub discount_amount: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateInvoiceStatusRequest {
    pub status: InvoiceStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InvoiceFilter {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceItemResponse {
    pub id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub order_id: Option<Uuid>,
    pub status: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
    pub due_date: Option<DateTime<Utc>>,
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Populated on single-invoice reads; empty in listings.
    pub items: Vec<InvoiceItemResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

fn generate_invoice_number(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("INV-{}-{:04}", now.format("%Y%m%d"), suffix)
}

fn item_to_response(model: invoice_item::Model) -> InvoiceItemResponse {
    InvoiceItemResponse {
        id: model.id,
        description: model.description,
        quantity: model.quantity,
        unit_price: model.unit_price,
        total_price: model.total_price,
    }
}

fn model_to_response(model: invoice::Model, items: Vec<invoice_item::Model>) -> InvoiceResponse {
    InvoiceResponse {
        id: model.id,
        invoice_number: model.invoice_number,
        customer_id: model.customer_id,
        order_id: model.order_id,
        status: model.status,
        subtotal: model.subtotal,
        tax_amount: model.tax_amount,
        discount_amount: model.discount_amount,
        total: model.total,
        paid_amount: model.paid_amount,
        balance: model.balance,
        due_date: model.due_date,
        pdf_url: model.pdf_url,
        created_at: model.created_at,
        updated_at: model.updated_at,
        items: items.into_iter().map(item_to_response).collect(),
    }
}

/// Invoicing over orders: one invoice per order, line items copied from the
/// order, totals derived with the configured tax rate.
#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
    tax_rate: Decimal,
}

impl InvoiceService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Option<Arc<EventSender>>,
        tax_rate: f64,
    ) -> Self {
        Self {
            db,
            event_sender,
            tax_rate: Decimal::from_f64_retain(tax_rate).unwrap_or(Decimal::ZERO),
        }
    }

    /// Raise an invoice for an order. Each order carries at most one
    /// invoice; a second attempt conflicts.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_for_order(
        &self,
        request: CreateInvoiceRequest,
    ) -> Result<InvoiceResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db;
        let now = Utc::now();
        let invoice_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "failed to start invoice transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(request.order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", request.order_id))
            })?;

        if order.status == OrderStatus::Cancelled.to_string() {
            return Err(ServiceError::InvalidOperation(
                "Cancelled orders cannot be invoiced".to_string(),
            ));
        }

        let existing = InvoiceEntity::find()
            .filter(invoice::Column::OrderId.eq(order.id))
            .one(&txn)
            .await?;
        if let Some(existing) = existing {
            return Err(ServiceError::Conflict(format!(
                "Order {} already has invoice {}",
                order.id, existing.invoice_number
            )));
        }

        let order_items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(&txn)
            .await?;

        let subtotal: Decimal = order_items.iter().map(|i| i.total_price).sum();
        let discount = request.discount_amount.unwrap_or(Decimal::ZERO).max(Decimal::ZERO);
        let tax_amount = ((subtotal - discount).max(Decimal::ZERO) * self.tax_rate).round_dp(2);
        let total = (subtotal - discount + tax_amount).max(Decimal::ZERO);
        let due_date = now + Duration::days(request.due_in_days.unwrap_or(14));

        let invoice_model = invoice::ActiveModel {
            id: Set(invoice_id),
            invoice_number: Set(generate_invoice_number(now)),
            customer_id: Set(order.customer_id),
            order_id: Set(Some(order.id)),
            status: Set(InvoiceStatus::Pending.to_string()),
            subtotal: Set(subtotal),
            tax_amount: Set(tax_amount),
            discount_amount: Set(discount),
            total: Set(total),
            paid_amount: Set(Decimal::ZERO),
            balance: Set(balance_for(total, Decimal::ZERO)),
            due_date: Set(Some(due_date)),
            pdf_url: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await?;

        let mut item_models = Vec::with_capacity(order_items.len());
        for item in order_items {
            let model = invoice_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                invoice_id: Set(invoice_id),
                description: Set(format!("{} ({})", item.name, item.sku)),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                total_price: Set(item.total_price),
            }
            .insert(&txn)
            .await?;
            item_models.push(model);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, invoice_id = %invoice_id, "failed to commit invoice creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(invoice_id = %invoice_id, order_id = %order.id, total = %total, "invoice created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::InvoiceCreated(invoice_id)).await {
                warn!(error = %e, invoice_id = %invoice_id, "failed to send invoice created event");
            }
        }

        Ok(model_to_response(invoice_model, item_models))
    }

    #[instrument(skip(self))]
    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<InvoiceResponse, ServiceError> {
        let invoice = InvoiceEntity::find_by_id(invoice_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;

        let items = InvoiceItemEntity::find()
            .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
            .all(&*self.db)
            .await?;

        Ok(model_to_response(invoice, items))
    }

    #[instrument(skip(self))]
    pub async fn list_invoices(
        &self,
        filter: InvoiceFilter,
        page: u64,
        per_page: u64,
    ) -> Result<InvoiceListResponse, ServiceError> {
        let mut query = InvoiceEntity::find().order_by_desc(invoice::Column::CreatedAt);

        if let Some(status) = &filter.status {
            query = query.filter(invoice::Column::Status.eq(status.clone()));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(invoice::Column::CustomerId.eq(customer_id));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let invoices = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(InvoiceListResponse {
            invoices: invoices
                .into_iter()
                .map(|i| model_to_response(i, Vec::new()))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    /// Record a payment. The balance is reclamped and the invoice flips to
    /// `paid` once nothing is outstanding.
    #[instrument(skip(self, request), fields(invoice_id = %invoice_id))]
    pub async fn record_payment(
        &self,
        invoice_id: Uuid,
        request: RecordPaymentRequest,
    ) -> Result<InvoiceResponse, ServiceError> {
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "amount: Payment amount must be positive".to_string(),
            ));
        }

        let invoice = InvoiceEntity::find_by_id(invoice_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;

        if invoice.status == InvoiceStatus::Cancelled.to_string() {
            return Err(ServiceError::InvalidOperation(
                "Cancelled invoices cannot take payments".to_string(),
            ));
        }

        let total = invoice.total;
        let paid = invoice.paid_amount + request.amount;
        let balance = balance_for(total, paid);

        let mut active: invoice::ActiveModel = invoice.into();
        active.paid_amount = Set(paid);
        active.balance = Set(balance);
        if balance.is_zero() {
            active.status = Set(InvoiceStatus::Paid.to_string());
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        info!(invoice_id = %invoice_id, paid = %paid, balance = %balance, "payment recorded");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::InvoicePaymentRecorded {
                    invoice_id,
                    amount: request.amount.to_string(),
                })
                .await
            {
                warn!(error = %e, invoice_id = %invoice_id, "failed to send payment event");
            }
        }

        Ok(model_to_response(updated, Vec::new()))
    }

    /// Force a status transition (overdue sweep, cancellation). The balance
    /// invariant is reasserted on every write.
    #[instrument(skip(self, request), fields(invoice_id = %invoice_id, new_status = %request.status))]
    pub async fn update_status(
        &self,
        invoice_id: Uuid,
        request: UpdateInvoiceStatusRequest,
    ) -> Result<InvoiceResponse, ServiceError> {
        let invoice = InvoiceEntity::find_by_id(invoice_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;

        let balance = balance_for(invoice.total, invoice.paid_amount);
        let mut active: invoice::ActiveModel = invoice.into();
        active.status = Set(request.status.to_string());
        active.balance = Set(balance);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        Ok(model_to_response(updated, Vec::new()))
    }

    /// Memoize the retrieval URL of the latest rendered PDF.
    pub(crate) async fn set_pdf_url(
        &self,
        invoice_id: Uuid,
        url: String,
    ) -> Result<(), ServiceError> {
        let invoice = InvoiceEntity::find_by_id(invoice_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;

        let mut active: invoice::ActiveModel = invoice.into();
        active.pdf_url = Set(Some(url));
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn balance_is_clamped_at_zero() {
        assert_eq!(balance_for(dec!(100), dec!(0)), dec!(100));
        assert_eq!(balance_for(dec!(100), dec!(40)), dec!(60));
        assert_eq!(balance_for(dec!(100), dec!(100)), dec!(0));
        // Overpayment never drives the balance negative.
        assert_eq!(balance_for(dec!(100), dec!(150)), dec!(0));
    }

    #[test]
    fn invoice_number_embeds_date() {
        let now = Utc::now();
        let number = generate_invoice_number(now);
        assert!(number.starts_with(&format!("INV-{}", now.format("%Y%m%d"))));
    }

    #[test]
    fn tax_rate_survives_conversion() {
        let service = InvoiceService::new(
            Arc::new(DatabaseConnection::Disconnected),
            None,
            0.08,
        );
        assert_eq!(service.tax_rate.round_dp(2), dec!(0.08));
    }
}
