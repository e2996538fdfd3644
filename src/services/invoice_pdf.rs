use crate::{
    config::AppConfig,
    entities::{
        customer::{self, Entity as CustomerEntity},
        invoice::{self, Entity as InvoiceEntity},
        invoice_item::{self, Entity as InvoiceItemEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoicePdfResponse {
    /// Retrieval URL: presigned and time-limited on S3, a static path locally.
    pub url: String,
}

/// Where rendered invoices are persisted. Chosen once at startup: S3 when a
/// bucket is configured, the local filesystem otherwise.
#[derive(Clone)]
pub enum PdfStorage {
    S3 {
        client: aws_sdk_s3::Client,
        bucket: String,
        prefix: String,
        url_ttl: Duration,
    },
    Local {
        dir: PathBuf,
        public_base: String,
    },
}

impl PdfStorage {
    pub async fn from_config(cfg: &AppConfig) -> Result<Self, ServiceError> {
        if let Some(bucket) = &cfg.pdf_s3_bucket {
            let aws_cfg = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            info!(bucket = %bucket, "invoice PDFs stored in S3");
            Ok(Self::S3 {
                client: aws_sdk_s3::Client::new(&aws_cfg),
                bucket: bucket.clone(),
                prefix: cfg.pdf_s3_prefix.trim_matches('/').to_string(),
                url_ttl: Duration::from_secs(cfg.pdf_url_ttl_secs),
            })
        } else {
            let dir = PathBuf::from(&cfg.pdf_local_dir);
            std::fs::create_dir_all(&dir).map_err(|e| {
                ServiceError::StorageError(format!(
                    "cannot create PDF directory {}: {e}",
                    dir.display()
                ))
            })?;
            info!(dir = %dir.display(), "invoice PDFs stored on local disk");
            Ok(Self::Local {
                dir,
                public_base: cfg.pdf_public_base.trim_end_matches('/').to_string(),
            })
        }
    }

    /// Persist the rendered bytes and return the retrieval URL. Re-persisting
    /// the same invoice overwrites the previous object.
    pub async fn persist(&self, invoice_id: Uuid, bytes: Vec<u8>) -> Result<String, ServiceError> {
        match self {
            Self::S3 {
                client,
                bucket,
                prefix,
                url_ttl,
            } => {
                let key = format!("{prefix}/{invoice_id}.pdf");

                client
                    .put_object()
                    .bucket(bucket)
                    .key(&key)
                    .content_type("application/pdf")
                    .body(ByteStream::from(bytes))
                    .send()
                    .await
                    .map_err(|e| {
                        error!(error = %e, key = %key, "S3 upload failed");
                        ServiceError::StorageError(format!("S3 upload failed: {e}"))
                    })?;

                let presigning = PresigningConfig::expires_in(*url_ttl).map_err(|e| {
                    ServiceError::StorageError(format!("invalid presigning TTL: {e}"))
                })?;

                let presigned = client
                    .get_object()
                    .bucket(bucket)
                    .key(&key)
                    .presigned(presigning)
                    .await
                    .map_err(|e| {
                        error!(error = %e, key = %key, "failed to presign PDF URL");
                        ServiceError::StorageError(format!("presign failed: {e}"))
                    })?;

                Ok(presigned.uri().to_string())
            }
            Self::Local { dir, public_base } => {
                let file_name = format!("{invoice_id}.pdf");
                let path = dir.join(&file_name);
                tokio::fs::write(&path, bytes).await.map_err(|e| {
                    error!(error = %e, path = %path.display(), "failed to write PDF");
                    ServiceError::StorageError(format!("write failed: {e}"))
                })?;
                Ok(format!("{public_base}/{file_name}"))
            }
        }
    }
}

/// Lay out a single-page A4 invoice and return the PDF bytes.
///
/// Everything happens in memory; nothing is acquired that needs explicit
/// teardown on the error path.
pub fn render_invoice_pdf(
    invoice: &invoice::Model,
    customer: &customer::Model,
    items: &[invoice_item::Model],
) -> Result<Vec<u8>, ServiceError> {
    let pdf_err = |e: printpdf::Error| ServiceError::PdfError(e.to_string());

    let (doc, page, layer) = PdfDocument::new(
        format!("Invoice {}", invoice.invoice_number),
        Mm(210.0),
        Mm(297.0),
        "invoice",
    );
    let layer = doc.get_page(page).get_layer(layer);

    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_err)?;

    let left = 20.0;
    let right_col = 150.0;
    let mut y = 272.0;

    layer.use_text("HydroPak Water Delivery", 18.0, Mm(left), Mm(y), &bold);
    y -= 8.0;
    layer.use_text(
        format!("Invoice {}", invoice.invoice_number),
        12.0,
        Mm(left),
        Mm(y),
        &regular,
    );
    layer.use_text(
        format!("Issued {}", invoice.created_at.format("%Y-%m-%d")),
        10.0,
        Mm(right_col),
        Mm(y),
        &regular,
    );
    if let Some(due) = invoice.due_date {
        y -= 5.0;
        layer.use_text(
            format!("Due {}", due.format("%Y-%m-%d")),
            10.0,
            Mm(right_col),
            Mm(y),
            &regular,
        );
    }

    y -= 14.0;
    layer.use_text("Bill to", 11.0, Mm(left), Mm(y), &bold);
    y -= 6.0;
    layer.use_text(customer.name.as_str(), 10.0, Mm(left), Mm(y), &regular);
    for line in [customer.address.as_deref(), customer.email.as_deref()]
        .into_iter()
        .flatten()
    {
        y -= 5.0;
        layer.use_text(line, 10.0, Mm(left), Mm(y), &regular);
    }

    y -= 12.0;
    layer.use_text("Description", 10.0, Mm(left), Mm(y), &bold);
    layer.use_text("Qty", 10.0, Mm(120.0), Mm(y), &bold);
    layer.use_text("Unit", 10.0, Mm(140.0), Mm(y), &bold);
    layer.use_text("Amount", 10.0, Mm(170.0), Mm(y), &bold);
    y -= 6.0;

    let bottom_margin = 60.0;
    let mut remaining = items.len();
    for item in items {
        if y < bottom_margin {
            layer.use_text(
                format!("(+{} more items)", remaining),
                9.0,
                Mm(left),
                Mm(y),
                &regular,
            );
            y -= 6.0;
            break;
        }
        layer.use_text(item.description.as_str(), 10.0, Mm(left), Mm(y), &regular);
        layer.use_text(item.quantity.to_string(), 10.0, Mm(120.0), Mm(y), &regular);
        layer.use_text(item.unit_price.to_string(), 10.0, Mm(140.0), Mm(y), &regular);
        layer.use_text(item.total_price.to_string(), 10.0, Mm(170.0), Mm(y), &regular);
        y -= 6.0;
        remaining -= 1;
    }

    y -= 6.0;
    let total_line = |label: &str, value: String, font: &printpdf::IndirectFontRef, y: f32| {
        layer.use_text(label, 10.0, Mm(140.0), Mm(y), font);
        layer.use_text(value, 10.0, Mm(170.0), Mm(y), font);
    };
    total_line("Subtotal", invoice.subtotal.to_string(), &regular, y);
    y -= 5.0;
    total_line("Discount", invoice.discount_amount.to_string(), &regular, y);
    y -= 5.0;
    total_line("Tax", invoice.tax_amount.to_string(), &regular, y);
    y -= 6.0;
    total_line("Total", invoice.total.to_string(), &bold, y);
    y -= 5.0;
    total_line("Paid", invoice.paid_amount.to_string(), &regular, y);
    y -= 5.0;
    total_line("Balance due", invoice.balance.to_string(), &bold, y);

    layer.use_text(
        "Thank you for choosing HydroPak.",
        9.0,
        Mm(left),
        Mm(20.0),
        &regular,
    );

    doc.save_to_bytes().map_err(pdf_err)
}

/// Renders invoice PDFs and persists them through the configured backend,
/// memoizing the retrieval URL on the invoice row. Regeneration re-renders
/// and overwrites; there is no content addressing.
#[derive(Clone)]
pub struct InvoicePdfService {
    db: Arc<DatabaseConnection>,
    storage: PdfStorage,
    event_sender: Option<Arc<EventSender>>,
}

impl InvoicePdfService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: PdfStorage,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db,
            storage,
            event_sender,
        }
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn generate(&self, invoice_id: Uuid) -> Result<InvoicePdfResponse, ServiceError> {
        let db = &*self.db;

        let invoice = InvoiceEntity::find_by_id(invoice_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;

        let customer = CustomerEntity::find_by_id(invoice.customer_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", invoice.customer_id))
            })?;

        let items = InvoiceItemEntity::find()
            .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
            .all(db)
            .await?;

        let bytes = render_invoice_pdf(&invoice, &customer, &items)?;
        let url = self.storage.persist(invoice_id, bytes).await?;

        // Memoize on the invoice row so listings can link without re-rendering.
        let mut active: invoice::ActiveModel = invoice.into();
        active.pdf_url = Set(Some(url.clone()));
        active.updated_at = Set(Some(chrono::Utc::now()));
        active.update(db).await?;

        info!(invoice_id = %invoice_id, "invoice PDF generated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::InvoicePdfGenerated {
                    invoice_id,
                    url: url.clone(),
                })
                .await
            {
                warn!(error = %e, invoice_id = %invoice_id, "failed to send pdf generated event");
            }
        }

        Ok(InvoicePdfResponse { url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn sample_invoice() -> (invoice::Model, customer::Model, Vec<invoice_item::Model>) {
        let now = Utc::now();
        let invoice_id = Uuid::new_v4();
        let customer_id = Uuid::new_v4();

        let invoice = invoice::Model {
            id: invoice_id,
            invoice_number: "INV-20260302-0042".to_string(),
            customer_id,
            order_id: Some(Uuid::new_v4()),
            status: "pending".to_string(),
            subtotal: dec!(59.70),
            tax_amount: dec!(4.78),
            discount_amount: dec!(0),
            total: dec!(64.48),
            paid_amount: dec!(0),
            balance: dec!(64.48),
            due_date: Some(now),
            pdf_url: None,
            created_at: now,
            updated_at: None,
        };
        let customer = customer::Model {
            id: customer_id,
            name: "Riverside Cafe".to_string(),
            email: Some("orders@riverside.example".to_string()),
            phone: None,
            address: Some("14 Quay Street".to_string()),
            status: "active".to_string(),
            credit_limit: dec!(500),
            notes: None,
            created_at: now,
            updated_at: None,
        };
        let items = vec![invoice_item::Model {
            id: Uuid::new_v4(),
            invoice_id,
            description: "19L Bottle (SKU-19L)".to_string(),
            quantity: 6,
            unit_price: dec!(9.95),
            total_price: dec!(59.70),
        }];

        (invoice, customer, items)
    }

    #[test]
    fn rendered_pdf_has_pdf_header() {
        let (invoice, customer, items) = sample_invoice();
        let bytes = render_invoice_pdf(&invoice, &customer, &items).expect("render");
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn rendering_survives_many_line_items() {
        let (invoice, customer, mut items) = sample_invoice();
        let template = items[0].clone();
        for _ in 0..80 {
            let mut item = template.clone();
            item.id = Uuid::new_v4();
            items.push(item);
        }
        // Overflowing items are summarized rather than clipped off the page.
        let bytes = render_invoice_pdf(&invoice, &customer, &items).expect("render");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn local_storage_writes_and_links() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let storage = PdfStorage::Local {
            dir: tmp.path().to_path_buf(),
            public_base: "/static/invoices".to_string(),
        };

        let invoice_id = Uuid::new_v4();
        let url = storage
            .persist(invoice_id, b"%PDF-1.3 test".to_vec())
            .await
            .expect("persist");

        assert_eq!(url, format!("/static/invoices/{invoice_id}.pdf"));
        let on_disk = tmp.path().join(format!("{invoice_id}.pdf"));
        assert!(on_disk.exists());

        // Regeneration overwrites in place.
        storage
            .persist(invoice_id, b"%PDF-1.3 second".to_vec())
            .await
            .expect("persist again");
        let contents = std::fs::read(on_disk).unwrap();
        assert_eq!(contents, b"%PDF-1.3 second");
    }
}
