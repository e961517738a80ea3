//! Fixtures shared by the unit tests in this crate.

use chrono::{DateTime, Utc};

use crate::{Database, DbConfig};
use toko_core::{
    Actor, Cashier, CheckoutLine, CheckoutOptions, CheckoutReceipt, CheckoutRequest, Customer,
    Money, NewProduct, OrderType, PaymentOption, Product, Supplier,
};

pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub(crate) async fn new_product(db: &Database, sku: &str, price: i64, stock: i64) -> Product {
    db.products()
        .insert(&NewProduct {
            sku: sku.to_string(),
            name: format!("Produk {sku}"),
            unit: "pcs".to_string(),
            image: None,
            price: Money::from_rupiah(price),
            initial_stock: stock,
        })
        .await
        .unwrap()
}

/// One customer and one active cashier.
pub(crate) async fn seed_people(db: &Database) -> (Customer, Cashier) {
    let customer = db
        .customers()
        .insert("Dewi Lestari", Some("0812-3456-7890"), Some("Jl. Anggrek 12"))
        .await
        .unwrap();
    let cashier = db.cashiers().insert("Agus").await.unwrap();
    (customer, cashier)
}

pub(crate) async fn new_supplier(db: &Database) -> Supplier {
    db.suppliers().insert("CV Sumber Rejeki", None).await.unwrap()
}

pub(crate) async fn stock_of(db: &Database, product_id: &str) -> i64 {
    db.products().stock_of(product_id).await.unwrap().unwrap()
}

/// Places an online transfer order for `customer` with explicit items.
pub(crate) async fn customer_order(
    db: &Database,
    customer: &Customer,
    order_type: OrderType,
    items: &[(&str, i64)],
) -> CheckoutReceipt {
    let mut options = CheckoutOptions::new(order_type, PaymentOption::Transfer);
    if order_type == OrderType::Delivery {
        options = options.with_address("Jl. Anggrek 12");
    }

    db.checkout()
        .checkout(&CheckoutRequest {
            actor: Actor::Customer(customer.id.clone()),
            items: items
                .iter()
                .map(|(id, qty)| CheckoutLine::new(*id, *qty))
                .collect(),
            options,
        })
        .await
        .unwrap()
}

/// Moves an invoice's creation time into the past.
pub(crate) async fn backdate_invoice(db: &Database, invoice_id: &str, created_at: DateTime<Utc>) {
    sqlx::query("UPDATE invoices SET created_at = ?2 WHERE id = ?1")
        .bind(invoice_id)
        .bind(created_at)
        .execute(db.pool())
        .await
        .unwrap();
}
