pub mod analytics;
pub mod common;
pub mod customers;
pub mod dashboard;
pub mod deliveries;
pub mod drivers;
pub mod invoices;
pub mod orders;
pub mod products;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::invoice_pdf::PdfStorage;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub customers: Arc<crate::services::customers::CustomerService>,
    pub products: Arc<crate::services::products::ProductService>,
    pub orders: Arc<crate::services::orders::OrderService>,
    pub invoices: Arc<crate::services::invoices::InvoiceService>,
    pub deliveries: Arc<crate::services::deliveries::DeliveryService>,
    pub drivers: Arc<crate::services::drivers::DriverService>,
    pub analytics: Arc<crate::services::analytics::AnalyticsService>,
    pub invoice_pdf: Arc<crate::services::invoice_pdf::InvoicePdfService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        pdf_storage: PdfStorage,
        config: &AppConfig,
    ) -> Self {
        Self {
            customers: Arc::new(crate::services::customers::CustomerService::new(
                db_pool.clone(),
            )),
            products: Arc::new(crate::services::products::ProductService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            orders: Arc::new(crate::services::orders::OrderService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            invoices: Arc::new(crate::services::invoices::InvoiceService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
                config.default_tax_rate,
            )),
            deliveries: Arc::new(crate::services::deliveries::DeliveryService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            drivers: Arc::new(crate::services::drivers::DriverService::new(db_pool.clone())),
            analytics: Arc::new(crate::services::analytics::AnalyticsService::new(
                db_pool.clone(),
            )),
            invoice_pdf: Arc::new(crate::services::invoice_pdf::InvoicePdfService::new(
                db_pool,
                pdf_storage,
                Some(event_sender),
            )),
        }
    }
}
