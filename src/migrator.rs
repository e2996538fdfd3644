use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_customers_table::Migration),
            Box::new(m20250601_000002_create_products_table::Migration),
            Box::new(m20250601_000003_create_orders_table::Migration),
            Box::new(m20250601_000004_create_order_items_table::Migration),
            Box::new(m20250601_000005_create_invoices_table::Migration),
            Box::new(m20250601_000006_create_invoice_items_table::Migration),
            Box::new(m20250601_000007_create_drivers_table::Migration),
            Box::new(m20250601_000008_create_deliveries_table::Migration),
            Box::new(m20250601_000009_create_inventory_movements_table::Migration),
            Box::new(m20250601_000010_create_users_table::Migration),
        ]
    }
}

mod m20250601_000001_create_customers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000001_create_customers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::Email).string())
                        .col(ColumnDef::new(Customers::Phone).string())
                        .col(ColumnDef::new(Customers::Address).string())
                        .col(ColumnDef::new(Customers::Status).string().not_null())
                        .col(
                            ColumnDef::new(Customers::CreditLimit)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::Notes).text())
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_status")
                        .table(Customers::Table)
                        .col(Customers::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Customers {
        Table,
        Id,
        Name,
        Email,
        Phone,
        Address,
        Status,
        CreditLimit,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250601_000002_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000002_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Description).text())
                        .col(ColumnDef::new(Products::Unit).string().not_null())
                        .col(
                            ColumnDef::new(Products::CostPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::SalePrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::Stock).integer().not_null())
                        .col(ColumnDef::new(Products::ReorderLevel).integer().not_null())
                        .col(ColumnDef::new(Products::IsActive).boolean().not_null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
        Sku,
        Name,
        Description,
        Unit,
        CostPrice,
        SalePrice,
        Stock,
        ReorderLevel,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250601_000003_create_orders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000003_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(ColumnDef::new(Orders::RouteCode).string())
                        .col(ColumnDef::new(Orders::DeliveryDate).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::Notes).text())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_customer")
                                .from(Orders::Table, Orders::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_created_at")
                        .table(Orders::Table)
                        .col(Orders::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_customer_id")
                        .table(Orders::Table)
                        .col(Orders::CustomerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        CustomerId,
        Status,
        RouteCode,
        DeliveryDate,
        TotalAmount,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Customers {
        Table,
        Id,
    }
}

mod m20250601_000004_create_order_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000004_create_order_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::Sku).string().not_null())
                        .col(ColumnDef::new(OrderItems::Name).string().not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::TotalPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_product")
                                .from(OrderItems::Table, OrderItems::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        Sku,
        Name,
        Quantity,
        UnitPrice,
        TotalPrice,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
    }
}

mod m20250601_000005_create_invoices_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000005_create_invoices_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Invoices::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Invoices::InvoiceNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Invoices::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Invoices::OrderId).uuid().unique_key())
                        .col(ColumnDef::new(Invoices::Status).string().not_null())
                        .col(
                            ColumnDef::new(Invoices::Subtotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::TaxAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::DiscountAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Invoices::Total).decimal_len(12, 2).not_null())
                        .col(
                            ColumnDef::new(Invoices::PaidAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::Balance)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Invoices::DueDate).timestamp_with_time_zone())
                        .col(ColumnDef::new(Invoices::PdfUrl).text())
                        .col(
                            ColumnDef::new(Invoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Invoices::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_customer")
                                .from(Invoices::Table, Invoices::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_order")
                                .from(Invoices::Table, Invoices::OrderId)
                                .to(Orders::Table, Orders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_created_at")
                        .table(Invoices::Table)
                        .col(Invoices::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_status")
                        .table(Invoices::Table)
                        .col(Invoices::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Invoices {
        Table,
        Id,
        InvoiceNumber,
        CustomerId,
        OrderId,
        Status,
        Subtotal,
        TaxAmount,
        DiscountAmount,
        Total,
        PaidAmount,
        Balance,
        DueDate,
        PdfUrl,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Customers {
        Table,
        Id,
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
    }
}

mod m20250601_000006_create_invoice_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000006_create_invoice_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InvoiceItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InvoiceItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InvoiceItems::InvoiceId).uuid().not_null())
                        .col(ColumnDef::new(InvoiceItems::Description).string().not_null())
                        .col(ColumnDef::new(InvoiceItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(InvoiceItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceItems::TotalPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoice_items_invoice")
                                .from(InvoiceItems::Table, InvoiceItems::InvoiceId)
                                .to(Invoices::Table, Invoices::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InvoiceItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum InvoiceItems {
        Table,
        Id,
        InvoiceId,
        Description,
        Quantity,
        UnitPrice,
        TotalPrice,
    }

    #[derive(Iden)]
    enum Invoices {
        Table,
        Id,
    }
}

mod m20250601_000007_create_drivers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000007_create_drivers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Drivers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Drivers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Drivers::Name).string().not_null())
                        .col(ColumnDef::new(Drivers::Phone).string())
                        .col(ColumnDef::new(Drivers::LicenseNumber).string())
                        .col(ColumnDef::new(Drivers::IsActive).boolean().not_null())
                        .col(
                            ColumnDef::new(Drivers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Drivers::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Drivers {
        Table,
        Id,
        Name,
        Phone,
        LicenseNumber,
        IsActive,
        CreatedAt,
    }
}

mod m20250601_000008_create_deliveries_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000008_create_deliveries_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Deliveries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Deliveries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Deliveries::OrderId).uuid().not_null())
                        .col(ColumnDef::new(Deliveries::DriverId).uuid())
                        .col(ColumnDef::new(Deliveries::Status).string().not_null())
                        .col(
                            ColumnDef::new(Deliveries::ScheduledDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Deliveries::DeliveredAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(Deliveries::Notes).text())
                        .col(
                            ColumnDef::new(Deliveries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Deliveries::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_deliveries_order")
                                .from(Deliveries::Table, Deliveries::OrderId)
                                .to(Orders::Table, Orders::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_deliveries_driver")
                                .from(Deliveries::Table, Deliveries::DriverId)
                                .to(Drivers::Table, Drivers::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Deliveries::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Deliveries {
        Table,
        Id,
        OrderId,
        DriverId,
        Status,
        ScheduledDate,
        DeliveredAt,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
    }

    #[derive(Iden)]
    enum Drivers {
        Table,
        Id,
    }
}

mod m20250601_000009_create_inventory_movements_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000009_create_inventory_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::OrderId).uuid())
                        .col(
                            ColumnDef::new(InventoryMovements::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::Reason).string().not_null())
                        .col(ColumnDef::new(InventoryMovements::Note).text())
                        .col(
                            ColumnDef::new(InventoryMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_movements_product")
                                .from(InventoryMovements::Table, InventoryMovements::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_movements_product_id")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryMovements::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum InventoryMovements {
        Table,
        Id,
        ProductId,
        OrderId,
        Quantity,
        Reason,
        Note,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
    }
}

mod m20250601_000010_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000010_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(ColumnDef::new(Users::IsActive).boolean().not_null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
        Email,
        PasswordHash,
        Name,
        Role,
        IsActive,
        CreatedAt,
    }
}
