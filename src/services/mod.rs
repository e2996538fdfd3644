pub mod analytics;
pub mod customers;
pub mod deliveries;
pub mod drivers;
pub mod invoice_pdf;
pub mod invoices;
pub mod orders;
pub mod products;
