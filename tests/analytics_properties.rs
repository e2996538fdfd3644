//! Property tests for the pure reporting arithmetic.

use chrono::{NaiveDate, TimeZone, Utc};
use hydropak_api::entities::{invoice, order};
use hydropak_api::services::analytics::{
    build_report, growth_pct, range::end_of_day, range::start_of_day, ReportRange,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

fn window(days: i64) -> ReportRange {
    let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    ReportRange {
        start: start_of_day(start),
        end: end_of_day(start + chrono::Duration::days(days - 1)),
    }
}

fn order_on(day_offset: i64, customer: Uuid, total: Decimal) -> order::Model {
    let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap() + chrono::Duration::days(day_offset);
    order::Model {
        id: Uuid::new_v4(),
        order_number: format!("ORD-{}", Uuid::new_v4().simple()),
        customer_id: customer,
        status: "pending".to_string(),
        route_code: None,
        delivery_date: None,
        total_amount: total,
        notes: None,
        created_at: Utc
            .from_utc_datetime(&date.and_hms_opt(10, 0, 0).unwrap()),
        updated_at: None,
    }
}

fn invoice_on(day_offset: i64, customer: Uuid, order_id: Uuid, total: Decimal) -> invoice::Model {
    let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap() + chrono::Duration::days(day_offset);
    invoice::Model {
        id: Uuid::new_v4(),
        invoice_number: format!("INV-{}", Uuid::new_v4().simple()),
        customer_id: customer,
        order_id: Some(order_id),
        status: "pending".to_string(),
        subtotal: total,
        tax_amount: Decimal::ZERO,
        discount_amount: Decimal::ZERO,
        total,
        paid_amount: Decimal::ZERO,
        balance: total,
        due_date: None,
        pdf_url: None,
        created_at: Utc
            .from_utc_datetime(&date.and_hms_opt(11, 0, 0).unwrap()),
        updated_at: None,
    }
}

proptest! {
    /// The time series always reconciles with the headline KPIs, whatever
    /// the day distribution of orders and invoices.
    #[test]
    fn timeseries_sums_equal_kpis(
        entries in prop::collection::vec((0i64..14, 1u32..5000), 0..40)
    ) {
        let range = window(14);
        let customer = Uuid::new_v4();

        let mut orders = Vec::new();
        let mut invoices = Vec::new();
        for (day, cents) in entries {
            let total = Decimal::new(i64::from(cents), 2);
            let order = order_on(day, customer, total);
            invoices.push(invoice_on(day, customer, order.id, total));
            orders.push(order);
        }

        let report = build_report(range, &orders, &invoices, &[], Decimal::ZERO, 0);

        let ts_revenue: Decimal = report.timeseries.iter().map(|p| p.revenue).sum();
        let ts_orders: u64 = report.timeseries.iter().map(|p| p.orders).sum();
        prop_assert_eq!(ts_revenue, report.kpis.revenue);
        prop_assert_eq!(ts_orders, report.kpis.orders);
        prop_assert_eq!(report.timeseries.len(), 14);
    }

    /// aov * orders == revenue whenever there are orders; aov is zero otherwise.
    #[test]
    fn aov_zero_guard_holds(
        entries in prop::collection::vec((0i64..7, 1u32..5000), 0..20)
    ) {
        let range = window(7);
        let customer = Uuid::new_v4();

        let mut orders = Vec::new();
        let mut invoices = Vec::new();
        for (day, cents) in &entries {
            let total = Decimal::new(i64::from(*cents), 2);
            let order = order_on(*day, customer, total);
            invoices.push(invoice_on(*day, customer, order.id, total));
            orders.push(order);
        }

        let report = build_report(range, &orders, &invoices, &[], Decimal::ZERO, 0);

        if report.kpis.orders == 0 {
            prop_assert_eq!(report.kpis.average_order_value, Decimal::ZERO);
        } else {
            prop_assert_eq!(
                report.kpis.average_order_value,
                report.kpis.revenue / Decimal::from(report.kpis.orders)
            );
        }
    }

    /// Growth follows the three-branch contract for all inputs.
    #[test]
    fn growth_contract_holds(prev in 0u32..100_000, cur in 0u32..100_000) {
        let prev_d = Decimal::new(i64::from(prev), 2);
        let cur_d = Decimal::new(i64::from(cur), 2);
        let pct = growth_pct(prev_d, cur_d);

        if prev == 0 && cur > 0 {
            prop_assert_eq!(pct, 100.0);
        } else if prev == 0 {
            prop_assert_eq!(pct, 0.0);
        } else {
            let expected = (f64::from(cur) - f64::from(prev)) / f64::from(prev) * 100.0;
            prop_assert!((pct - expected).abs() < 1e-6);
        }
    }

    /// Top lists never exceed ten entries and are sorted descending.
    #[test]
    fn top_customers_sorted_and_capped(
        customers in prop::collection::vec(1u32..5000, 0..30)
    ) {
        let range = window(7);

        let mut orders = Vec::new();
        let mut invoices = Vec::new();
        for cents in customers {
            let customer = Uuid::new_v4();
            let total = Decimal::new(i64::from(cents), 2);
            let order = order_on(0, customer, total);
            invoices.push(invoice_on(0, customer, order.id, total));
            orders.push(order);
        }

        let report = build_report(range, &orders, &invoices, &[], Decimal::ZERO, 0);

        prop_assert!(report.top_customers.len() <= 10);
        for pair in report.top_customers.windows(2) {
            prop_assert!(pair[0].revenue >= pair[1].revenue);
        }
    }
}
