pub mod range;

pub use range::{resolve_range, ReportRange};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{
        customer::{self, Entity as CustomerEntity},
        delivery::{self, DeliveryStatus, Entity as DeliveryEntity},
        invoice::{self, Entity as InvoiceEntity, InvoiceStatus},
        order::{self, Entity as OrderEntity, OrderStatus},
        order_item::{self, Entity as OrderItemEntity},
        product::{self, Entity as ProductEntity},
    },
    errors::ServiceError,
};

/// How many entries the top-products / top-customers lists carry.
const TOP_LIST_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Kpis {
    pub revenue: Decimal,
    pub orders: u64,
    pub customers: u64,
    pub average_order_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Growth {
    pub revenue_pct: f64,
    pub orders_pct: f64,
    pub previous_revenue: Decimal,
    pub previous_orders: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimeseriesPoint {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub orders: u64,
    pub customers: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopCustomer {
    pub customer_id: Uuid,
    pub name: Option<String>,
    pub revenue: Decimal,
    pub invoices: u64,
    pub orders: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChannelSlice {
    /// Route code, or `unassigned` for orders without one.
    pub route: String,
    pub orders: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub orders: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsReport {
    pub range: ReportRange,
    pub kpis: Kpis,
    pub growth: Growth,
    pub timeseries: Vec<TimeseriesPoint>,
    pub top_products: Vec<TopProduct>,
    pub top_customers: Vec<TopCustomer>,
    pub channels: Vec<ChannelSlice>,
    pub status_breakdown: Vec<StatusCount>,
}

/// Sum of invoice totals. Callers pass only revenue-qualifying invoices.
pub fn sum_revenue(invoices: &[invoice::Model]) -> Decimal {
    invoices.iter().map(|inv| inv.total).sum()
}

/// Period-over-period growth in percent.
///
/// A previous period of zero cannot be divided by: a positive current
/// period reports as 100% growth, an equally empty one as 0%.
pub fn growth_pct(previous: Decimal, current: Decimal) -> f64 {
    if previous.is_zero() {
        if current > Decimal::ZERO {
            return 100.0;
        }
        return 0.0;
    }
    ((current - previous) / previous * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(0.0)
}

/// Zero-filled per-day buckets across the window: revenue from same-day
/// invoices, order and distinct-customer counts from same-day orders.
pub fn build_timeseries(
    range: &ReportRange,
    orders: &[order::Model],
    invoices: &[invoice::Model],
) -> Vec<TimeseriesPoint> {
    let mut revenue_by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    let mut orders_by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    let mut customers_by_day: BTreeMap<NaiveDate, HashSet<Uuid>> = BTreeMap::new();

    for inv in invoices {
        let day = inv.created_at.date_naive();
        *revenue_by_day.entry(day).or_insert(Decimal::ZERO) += inv.total;
    }
    for ord in orders {
        let day = ord.created_at.date_naive();
        *orders_by_day.entry(day).or_insert(0) += 1;
        customers_by_day.entry(day).or_default().insert(ord.customer_id);
    }

    range
        .days()
        .map(|date| TimeseriesPoint {
            date,
            revenue: revenue_by_day.get(&date).copied().unwrap_or(Decimal::ZERO),
            orders: orders_by_day.get(&date).copied().unwrap_or(0),
            customers: customers_by_day.get(&date).map(|s| s.len() as u64).unwrap_or(0),
        })
        .collect()
}

/// Order items grouped by product, sorted by revenue, capped at ten.
pub fn top_products(items: &[order_item::Model]) -> Vec<TopProduct> {
    let mut by_product: HashMap<Uuid, TopProduct> = HashMap::new();

    for item in items {
        let entry = by_product.entry(item.product_id).or_insert_with(|| TopProduct {
            product_id: item.product_id,
            sku: item.sku.clone(),
            name: item.name.clone(),
            quantity: 0,
            revenue: Decimal::ZERO,
        });
        entry.quantity += i64::from(item.quantity);
        entry.revenue += item.total_price;
    }

    let mut ranked: Vec<TopProduct> = by_product.into_values().collect();
    ranked.sort_by(|a, b| b.revenue.cmp(&a.revenue).then(a.sku.cmp(&b.sku)));
    ranked.truncate(TOP_LIST_LIMIT);
    ranked
}

/// Invoices grouped by customer, cross-referenced with the customer's
/// in-window order count. Sorted by revenue, capped at ten. Names are
/// hydrated by the service afterwards.
pub fn top_customers(
    invoices: &[invoice::Model],
    orders: &[order::Model],
) -> Vec<TopCustomer> {
    let mut order_counts: HashMap<Uuid, u64> = HashMap::new();
    for ord in orders {
        *order_counts.entry(ord.customer_id).or_insert(0) += 1;
    }

    let mut by_customer: HashMap<Uuid, TopCustomer> = HashMap::new();
    for inv in invoices {
        let entry = by_customer.entry(inv.customer_id).or_insert_with(|| TopCustomer {
            customer_id: inv.customer_id,
            name: None,
            revenue: Decimal::ZERO,
            invoices: 0,
            orders: order_counts.get(&inv.customer_id).copied().unwrap_or(0),
        });
        entry.revenue += inv.total;
        entry.invoices += 1;
    }

    let mut ranked: Vec<TopCustomer> = by_customer.into_values().collect();
    ranked.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then(a.customer_id.cmp(&b.customer_id))
    });
    ranked.truncate(TOP_LIST_LIMIT);
    ranked
}

/// Orders grouped by route code, revenue joined from each order's invoice
/// where one exists. Routeless orders land in an `unassigned` bucket.
pub fn channel_breakdown(
    orders: &[order::Model],
    invoices: &[invoice::Model],
) -> Vec<ChannelSlice> {
    let invoice_by_order: HashMap<Uuid, Decimal> = invoices
        .iter()
        .filter_map(|inv| inv.order_id.map(|oid| (oid, inv.total)))
        .collect();

    let mut by_route: BTreeMap<String, ChannelSlice> = BTreeMap::new();
    for ord in orders {
        let route = ord
            .route_code
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "unassigned".to_string());
        let entry = by_route.entry(route.clone()).or_insert_with(|| ChannelSlice {
            route,
            orders: 0,
            revenue: Decimal::ZERO,
        });
        entry.orders += 1;
        if let Some(total) = invoice_by_order.get(&ord.id) {
            entry.revenue += *total;
        }
    }

    let mut slices: Vec<ChannelSlice> = by_route.into_values().collect();
    slices.sort_by(|a, b| b.revenue.cmp(&a.revenue).then(a.route.cmp(&b.route)));
    slices
}

/// Histogram of orders per status. Every status appears, zero-filled.
pub fn status_breakdown(orders: &[order::Model]) -> Vec<StatusCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for ord in orders {
        *counts.entry(ord.status.as_str()).or_insert(0) += 1;
    }

    OrderStatus::iter()
        .map(|status| {
            let key = status.to_string();
            let orders = counts.get(key.as_str()).copied().unwrap_or(0);
            StatusCount { status: key, orders }
        })
        .collect()
}

/// Assemble the full report from the windowed result sets. Pure; the
/// service is responsible for fetching and for name hydration.
pub fn build_report(
    range: ReportRange,
    orders: &[order::Model],
    invoices: &[invoice::Model],
    items: &[order_item::Model],
    previous_revenue: Decimal,
    previous_orders: u64,
) -> AnalyticsReport {
    let revenue = sum_revenue(invoices);
    let order_count = orders.len() as u64;
    let customer_count = orders
        .iter()
        .map(|o| o.customer_id)
        .collect::<HashSet<_>>()
        .len() as u64;
    let average_order_value = if order_count > 0 {
        revenue / Decimal::from(order_count)
    } else {
        Decimal::ZERO
    };

    AnalyticsReport {
        range,
        kpis: Kpis {
            revenue,
            orders: order_count,
            customers: customer_count,
            average_order_value,
        },
        growth: Growth {
            revenue_pct: growth_pct(previous_revenue, revenue),
            orders_pct: growth_pct(Decimal::from(previous_orders), Decimal::from(order_count)),
            previous_revenue,
            previous_orders,
        },
        timeseries: build_timeseries(&range, orders, invoices),
        top_products: top_products(items),
        top_customers: top_customers(invoices, orders),
        channels: channel_breakdown(orders, invoices),
        status_breakdown: status_breakdown(orders),
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SalesOverview {
    pub orders_today: u64,
    pub revenue_today: Decimal,
    pub orders_last_7: u64,
    pub revenue_last_7: Decimal,
    pub orders_last_30: u64,
    pub revenue_last_30: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryOverview {
    pub total_products: u64,
    pub low_stock: u64,
    pub out_of_stock: u64,
    /// On-hand stock valued at cost; backordered (negative) stock counts as zero.
    pub stock_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryOverview {
    pub scheduled: u64,
    pub out_for_delivery: u64,
    pub delivered_today: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReceivablesOverview {
    pub open_invoices: u64,
    pub outstanding_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardMetrics {
    pub sales: SalesOverview,
    pub inventory: InventoryOverview,
    pub deliveries: DeliveryOverview,
    pub receivables: ReceivablesOverview,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Read-side reporting over orders, invoices and stock. Fetches the
/// windowed rows and reduces them in memory; there is no write path here.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<DatabaseConnection>,
}

impl AnalyticsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn qualifying_statuses() -> Vec<String> {
        InvoiceStatus::QUALIFYING.iter().map(|s| s.to_string()).collect()
    }

    /// Build the analytics report for a resolved window.
    #[instrument(skip(self))]
    pub async fn report(&self, range: ReportRange) -> Result<AnalyticsReport, ServiceError> {
        let db = &*self.db;

        let orders = OrderEntity::find()
            .filter(order::Column::CreatedAt.between(range.start, range.end))
            .all(db)
            .await?;

        let invoices = InvoiceEntity::find()
            .filter(invoice::Column::CreatedAt.between(range.start, range.end))
            .filter(invoice::Column::Status.is_in(Self::qualifying_statuses()))
            .all(db)
            .await?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = if order_ids.is_empty() {
            Vec::new()
        } else {
            OrderItemEntity::find()
                .filter(order_item::Column::OrderId.is_in(order_ids))
                .all(db)
                .await?
        };

        let previous = range.previous();
        let previous_orders = OrderEntity::find()
            .filter(order::Column::CreatedAt.between(previous.start, previous.end))
            .count(db)
            .await?;
        let previous_invoices = InvoiceEntity::find()
            .filter(invoice::Column::CreatedAt.between(previous.start, previous.end))
            .filter(invoice::Column::Status.is_in(Self::qualifying_statuses()))
            .all(db)
            .await?;

        let mut report = build_report(
            range,
            &orders,
            &invoices,
            &items,
            sum_revenue(&previous_invoices),
            previous_orders,
        );

        let customer_ids: Vec<Uuid> = report
            .top_customers
            .iter()
            .map(|c| c.customer_id)
            .collect();
        if !customer_ids.is_empty() {
            let names: HashMap<Uuid, String> = CustomerEntity::find()
                .filter(customer::Column::Id.is_in(customer_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect();
            for top in &mut report.top_customers {
                top.name = names.get(&top.customer_id).cloned();
            }
        }

        Ok(report)
    }

    /// Headline metrics for the dashboard landing page.
    #[instrument(skip(self))]
    pub async fn dashboard_metrics(&self) -> Result<DashboardMetrics, ServiceError> {
        let db = &*self.db;
        let now = Utc::now();

        let today_range = ReportRange {
            start: range::start_of_day(now.date_naive()),
            end: range::end_of_day(now.date_naive()),
        };
        let last_7 = resolve_range(Some("last_7"), None, None, now);
        let last_30 = resolve_range(Some("last_30"), None, None, now);

        let sales = SalesOverview {
            orders_today: self.count_orders(&today_range).await?,
            revenue_today: self.sum_window_revenue(&today_range).await?,
            orders_last_7: self.count_orders(&last_7).await?,
            revenue_last_7: self.sum_window_revenue(&last_7).await?,
            orders_last_30: self.count_orders(&last_30).await?,
            revenue_last_30: self.sum_window_revenue(&last_30).await?,
        };

        let total_products = ProductEntity::find()
            .filter(product::Column::IsActive.eq(true))
            .count(db)
            .await?;
        let low_stock = ProductEntity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(Expr::col(product::Column::Stock).lte(Expr::col(product::Column::ReorderLevel)))
            .count(db)
            .await?;
        let out_of_stock = ProductEntity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::Stock.lte(0))
            .count(db)
            .await?;
        let stock_value: Decimal = ProductEntity::find()
            .filter(product::Column::IsActive.eq(true))
            .all(db)
            .await?
            .iter()
            .map(|p| p.cost_price * Decimal::from(p.stock.max(0)))
            .sum();

        let deliveries = DeliveryOverview {
            scheduled: DeliveryEntity::find()
                .filter(delivery::Column::Status.eq(DeliveryStatus::Scheduled.to_string()))
                .count(db)
                .await?,
            out_for_delivery: DeliveryEntity::find()
                .filter(delivery::Column::Status.eq(DeliveryStatus::OutForDelivery.to_string()))
                .count(db)
                .await?,
            delivered_today: DeliveryEntity::find()
                .filter(delivery::Column::Status.eq(DeliveryStatus::Delivered.to_string()))
                .filter(delivery::Column::DeliveredAt.gte(today_range.start))
                .count(db)
                .await?,
        };

        let open_statuses = vec![
            InvoiceStatus::Pending.to_string(),
            InvoiceStatus::Overdue.to_string(),
        ];
        let open_invoices = InvoiceEntity::find()
            .filter(invoice::Column::Status.is_in(open_statuses.clone()))
            .count(db)
            .await?;
        let outstanding_balance: Decimal = InvoiceEntity::find()
            .filter(invoice::Column::Status.is_in(open_statuses))
            .all(db)
            .await?
            .iter()
            .map(|inv| inv.balance)
            .sum();

        Ok(DashboardMetrics {
            sales,
            inventory: InventoryOverview {
                total_products,
                low_stock,
                out_of_stock,
                stock_value,
            },
            deliveries,
            receivables: ReceivablesOverview {
                open_invoices,
                outstanding_balance,
            },
            generated_at: now,
        })
    }

    async fn count_orders(&self, range: &ReportRange) -> Result<u64, ServiceError> {
        Ok(OrderEntity::find()
            .filter(order::Column::CreatedAt.between(range.start, range.end))
            .count(&*self.db)
            .await?)
    }

    async fn sum_window_revenue(&self, range: &ReportRange) -> Result<Decimal, ServiceError> {
        let invoices = InvoiceEntity::find()
            .filter(invoice::Column::CreatedAt.between(range.start, range.end))
            .filter(invoice::Column::Status.is_in(Self::qualifying_statuses()))
            .all(&*self.db)
            .await?;
        Ok(sum_revenue(&invoices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn window(from: (i32, u32, u32), to: (i32, u32, u32)) -> ReportRange {
        ReportRange {
            start: range::start_of_day(NaiveDate::from_ymd_opt(from.0, from.1, from.2).unwrap()),
            end: range::end_of_day(NaiveDate::from_ymd_opt(to.0, to.1, to.2).unwrap()),
        }
    }

    fn make_order(
        created_at: DateTime<Utc>,
        customer_id: Uuid,
        status: OrderStatus,
        route: Option<&str>,
        total: Decimal,
    ) -> order::Model {
        order::Model {
            id: Uuid::new_v4(),
            order_number: format!("ORD-{}", Uuid::new_v4().simple()),
            customer_id,
            status: status.to_string(),
            route_code: route.map(str::to_string),
            delivery_date: None,
            total_amount: total,
            notes: None,
            created_at,
            updated_at: None,
        }
    }

    fn make_invoice(
        created_at: DateTime<Utc>,
        customer_id: Uuid,
        order_id: Option<Uuid>,
        status: InvoiceStatus,
        total: Decimal,
    ) -> invoice::Model {
        invoice::Model {
            id: Uuid::new_v4(),
            invoice_number: format!("INV-{}", Uuid::new_v4().simple()),
            customer_id,
            order_id,
            status: status.to_string(),
            subtotal: total,
            tax_amount: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            total,
            paid_amount: Decimal::ZERO,
            balance: total,
            due_date: None,
            pdf_url: None,
            created_at,
            updated_at: None,
        }
    }

    fn make_item(order_id: Uuid, product_id: Uuid, sku: &str, qty: i32, price: Decimal) -> order_item::Model {
        order_item::Model {
            id: Uuid::new_v4(),
            order_id,
            product_id,
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            quantity: qty,
            unit_price: price,
            total_price: price * Decimal::from(qty),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn growth_table_matches_contract() {
        assert_eq!(growth_pct(Decimal::ZERO, dec!(1000)), 100.0);
        assert_eq!(growth_pct(Decimal::ZERO, Decimal::ZERO), 0.0);
        assert_eq!(growth_pct(dec!(200), dec!(300)), 50.0);
        assert_eq!(growth_pct(dec!(400), dec!(100)), -75.0);
    }

    #[test]
    fn aov_is_zero_guarded() {
        let range = window((2026, 3, 1), (2026, 3, 7));
        let report = build_report(range, &[], &[], &[], Decimal::ZERO, 0);
        assert_eq!(report.kpis.average_order_value, Decimal::ZERO);
        assert_eq!(report.kpis.revenue, Decimal::ZERO);
    }

    #[test]
    fn timeseries_sums_match_kpis() {
        let range = window((2026, 3, 1), (2026, 3, 7));
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let orders = vec![
            make_order(at(2026, 3, 2, 9), alice, OrderStatus::Delivered, Some("R1"), dec!(120)),
            make_order(at(2026, 3, 2, 15), bob, OrderStatus::Pending, None, dec!(80)),
            make_order(at(2026, 3, 5, 11), alice, OrderStatus::Scheduled, Some("R1"), dec!(60)),
        ];
        let invoices = vec![
            make_invoice(at(2026, 3, 2, 10), alice, Some(orders[0].id), InvoiceStatus::Paid, dec!(120)),
            make_invoice(at(2026, 3, 2, 16), bob, Some(orders[1].id), InvoiceStatus::Pending, dec!(80)),
            make_invoice(at(2026, 3, 5, 12), alice, Some(orders[2].id), InvoiceStatus::Overdue, dec!(60)),
        ];

        let report = build_report(range, &orders, &invoices, &[], Decimal::ZERO, 0);

        assert_eq!(report.timeseries.len(), 7);
        let ts_revenue: Decimal = report.timeseries.iter().map(|p| p.revenue).sum();
        let ts_orders: u64 = report.timeseries.iter().map(|p| p.orders).sum();
        assert_eq!(ts_revenue, report.kpis.revenue);
        assert_eq!(ts_orders, report.kpis.orders);

        // Distinct customers on March 2nd: alice and bob.
        let march_2 = &report.timeseries[1];
        assert_eq!(march_2.customers, 2);
        assert_eq!(march_2.orders, 2);
        assert_eq!(march_2.revenue, dec!(200));

        // Empty days are zero-filled, not missing.
        let march_3 = &report.timeseries[2];
        assert_eq!(march_3.revenue, Decimal::ZERO);
        assert_eq!(march_3.orders, 0);

        assert_eq!(report.kpis.customers, 2);
        assert_eq!(report.kpis.average_order_value, dec!(260) / dec!(3));
    }

    #[test]
    fn prior_window_of_zero_reports_hundred_percent_growth() {
        // A week with two orders worth 1000 total on its sixth day, after a
        // completely empty prior week.
        let range = window((2026, 3, 9), (2026, 3, 15));
        let customer = Uuid::new_v4();
        let orders = vec![
            make_order(at(2026, 3, 14, 9), customer, OrderStatus::Delivered, None, dec!(600)),
            make_order(at(2026, 3, 14, 10), customer, OrderStatus::Delivered, None, dec!(400)),
        ];
        let invoices = vec![
            make_invoice(at(2026, 3, 14, 9), customer, Some(orders[0].id), InvoiceStatus::Paid, dec!(600)),
            make_invoice(at(2026, 3, 14, 10), customer, Some(orders[1].id), InvoiceStatus::Paid, dec!(400)),
        ];

        let report = build_report(range, &orders, &invoices, &[], Decimal::ZERO, 0);
        assert_eq!(report.kpis.revenue, dec!(1000));
        assert_eq!(report.growth.revenue_pct, 100.0);
        assert_eq!(report.growth.orders_pct, 100.0);
    }

    #[test]
    fn top_products_sorted_desc_and_capped() {
        let order_id = Uuid::new_v4();
        let mut items = Vec::new();
        for i in 0..15 {
            let product = Uuid::new_v4();
            // Revenues 10, 20, ..., 150.
            items.push(make_item(order_id, product, &format!("SKU-{i:02}"), 1, Decimal::from((i + 1) * 10)));
        }

        let ranked = top_products(&items);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].revenue, dec!(150));
        for pair in ranked.windows(2) {
            assert!(pair[0].revenue >= pair[1].revenue);
        }
    }

    #[test]
    fn top_products_merge_quantities_per_product() {
        let product = Uuid::new_v4();
        let items = vec![
            make_item(Uuid::new_v4(), product, "SKU-19L", 2, dec!(8)),
            make_item(Uuid::new_v4(), product, "SKU-19L", 3, dec!(8)),
        ];

        let ranked = top_products(&items);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].quantity, 5);
        assert_eq!(ranked[0].revenue, dec!(40));
    }

    #[test]
    fn top_customers_cross_reference_order_counts() {
        let range_day = at(2026, 3, 2, 9);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let orders = vec![
            make_order(range_day, alice, OrderStatus::Delivered, None, dec!(50)),
            make_order(range_day, alice, OrderStatus::Pending, None, dec!(70)),
            make_order(range_day, bob, OrderStatus::Pending, None, dec!(500)),
        ];
        let invoices = vec![
            make_invoice(range_day, alice, Some(orders[0].id), InvoiceStatus::Paid, dec!(50)),
            make_invoice(range_day, alice, Some(orders[1].id), InvoiceStatus::Pending, dec!(70)),
            make_invoice(range_day, bob, Some(orders[2].id), InvoiceStatus::Paid, dec!(500)),
        ];

        let ranked = top_customers(&invoices, &orders);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].customer_id, bob);
        assert_eq!(ranked[0].revenue, dec!(500));
        assert_eq!(ranked[0].orders, 1);
        assert_eq!(ranked[1].customer_id, alice);
        assert_eq!(ranked[1].invoices, 2);
        assert_eq!(ranked[1].orders, 2);
    }

    #[test]
    fn channels_bucket_unrouted_orders_separately() {
        let day = at(2026, 3, 2, 9);
        let customer = Uuid::new_v4();
        let orders = vec![
            make_order(day, customer, OrderStatus::Delivered, Some("NORTH"), dec!(100)),
            make_order(day, customer, OrderStatus::Delivered, Some("NORTH"), dec!(150)),
            make_order(day, customer, OrderStatus::Pending, None, dec!(75)),
            make_order(day, customer, OrderStatus::Pending, Some("  "), dec!(25)),
        ];
        let invoices = vec![
            make_invoice(day, customer, Some(orders[0].id), InvoiceStatus::Paid, dec!(100)),
            make_invoice(day, customer, Some(orders[1].id), InvoiceStatus::Paid, dec!(150)),
            make_invoice(day, customer, Some(orders[2].id), InvoiceStatus::Pending, dec!(75)),
            // No invoice for the fourth order: it still counts, revenue 0.
        ];

        let slices = channel_breakdown(&orders, &invoices);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].route, "NORTH");
        assert_eq!(slices[0].orders, 2);
        assert_eq!(slices[0].revenue, dec!(250));
        assert_eq!(slices[1].route, "unassigned");
        assert_eq!(slices[1].orders, 2);
        assert_eq!(slices[1].revenue, dec!(75));
    }

    #[test]
    fn status_breakdown_zero_fills_every_status() {
        let day = at(2026, 3, 2, 9);
        let customer = Uuid::new_v4();
        let orders = vec![
            make_order(day, customer, OrderStatus::Pending, None, dec!(10)),
            make_order(day, customer, OrderStatus::Pending, None, dec!(10)),
            make_order(day, customer, OrderStatus::Cancelled, None, dec!(10)),
        ];

        let breakdown = status_breakdown(&orders);
        assert_eq!(breakdown.len(), 5);

        let by_status: HashMap<&str, u64> = breakdown
            .iter()
            .map(|s| (s.status.as_str(), s.orders))
            .collect();
        assert_eq!(by_status["pending"], 2);
        assert_eq!(by_status["cancelled"], 1);
        assert_eq!(by_status["delivered"], 0);
        assert_eq!(by_status["scheduled"], 0);
        assert_eq!(by_status["out_for_delivery"], 0);
    }
}
