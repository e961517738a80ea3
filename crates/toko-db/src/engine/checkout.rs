//! # Checkout Engine
//!
//! Turns a cart (or an explicit list of items) into an invoice.
//!
//! ## One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout_cart(actor, options)        checkout(request)                 │
//! │       │                                    │                            │
//! │       ▼                                    ▼                            │
//! │  DELETE cart RETURNING lines          normalize request items           │
//! │       │                                    │                            │
//! │       └──────────────┬─────────────────────┘                            │
//! │                      ▼                                                  │
//! │  for each line:  UPDATE products SET current_stock = current_stock - q │
//! │                  WHERE id = ? AND current_stock >= q                    │
//! │                  0 rows → InsufficientStock, ROLLBACK everything        │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  resolve customer / cashier                                             │
//! │  INSERT invoice, invoice_details (name, unit, image, price snapshot)    │
//! │  INSERT pickup_/delivery_statuses + order_status_logs (prev = NULL)     │
//! │  INSERT payments                 (counter sales only)                   │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │                   COMMIT                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two checkouts racing for the last unit both run the conditional UPDATE;
//! SQLite serializes the writers and the second one sees 0 rows affected.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::cart::{clear_cart, drain_cart, ensure_owner};
use crate::repository::invoice::{generate_invoice_number, insert_detail, insert_invoice};
use crate::repository::order_status::{append_log, insert_status};
use crate::repository::payment::upsert_payment;
use crate::repository::people::{fetch_cashier, fetch_customer};
use crate::repository::product::{fetch_product, try_decrement_stock};
use toko_core::validation::{normalize_checkout_lines, validate_address, validate_required};
use toko_core::{
    Actor, CheckoutLine, CheckoutOptions, CheckoutReceipt, CheckoutRequest, CoreError, Invoice,
    InvoiceDetail, Money, Product, ValidationError, WALK_IN_CUSTOMER_NAME,
};

#[derive(Debug, Clone)]
pub struct CheckoutEngine {
    pool: SqlitePool,
}

impl CheckoutEngine {
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutEngine { pool }
    }

    /// Checks out the given items for `request.actor`.
    ///
    /// The actor's cart is emptied as part of the same transaction.
    ///
    /// ## Errors
    /// * `EmptyCart` - no items
    /// * `Validation` - bad quantity, missing delivery address
    /// * `InsufficientStock` - any line; nothing is written
    /// * `ProductNotFound` - unknown or inactive product
    /// * `CustomerNotFound` / `CashierNotFound` - unknown actor or named customer
    pub async fn checkout(&self, request: &CheckoutRequest) -> DbResult<CheckoutReceipt> {
        let lines = normalize_checkout_lines(&request.items)?;
        let address = validate_address(request.options.shipping_option, request.options.address.as_deref())?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let reserved = reserve_stock(&mut tx, &lines, now).await?;
        clear_cart(&mut tx, &request.actor).await?;
        let receipt = write_invoice(
            &mut tx,
            &request.actor,
            &request.options,
            address.as_deref(),
            &reserved,
            now,
        )
        .await?;

        tx.commit().await?;
        log_receipt(&request.actor, &receipt, reserved.len());
        Ok(receipt)
    }

    /// Checks out everything in the actor's cart.
    ///
    /// Same errors as [`checkout`](Self::checkout). On any error the cart is
    /// left as it was.
    pub async fn checkout_cart(
        &self,
        actor: &Actor,
        options: &CheckoutOptions,
    ) -> DbResult<CheckoutReceipt> {
        let address = validate_address(options.shipping_option, options.address.as_deref())?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let drained = drain_cart(&mut tx, actor).await?;
        if drained.is_empty() {
            // unknown owner beats empty cart
            ensure_owner(&mut tx, actor).await?;
        }
        let lines = normalize_checkout_lines(&drained)?;

        let reserved = reserve_stock(&mut tx, &lines, now).await?;
        let receipt =
            write_invoice(&mut tx, actor, options, address.as_deref(), &reserved, now).await?;

        tx.commit().await?;
        log_receipt(actor, &receipt, reserved.len());
        Ok(receipt)
    }
}

fn log_receipt(actor: &Actor, receipt: &CheckoutReceipt, lines: usize) {
    info!(
        %actor,
        invoice_id = %receipt.invoice_id,
        invoice_number = %receipt.invoice_number,
        order_type = %receipt.order_type,
        status = %receipt.status,
        total = receipt.total.rupiah(),
        lines,
        "Checkout committed"
    );
}

// =============================================================================
// Steps
// =============================================================================

/// Takes every line off the shelf, in order. Returns each line with the
/// product as it was right after its decrement.
async fn reserve_stock(
    conn: &mut SqliteConnection,
    lines: &[CheckoutLine],
    now: DateTime<Utc>,
) -> DbResult<Vec<(CheckoutLine, Product)>> {
    let mut reserved = Vec::with_capacity(lines.len());

    for line in lines {
        if !try_decrement_stock(conn, &line.product_id, line.quantity, now).await? {
            let error = match fetch_product(conn, &line.product_id).await? {
                Some(product) if product.is_active => CoreError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    requested: line.quantity,
                    available: product.current_stock,
                },
                _ => CoreError::ProductNotFound(line.product_id.clone()),
            };
            debug!(product_id = %line.product_id, "Stock reservation refused");
            return Err(error.into());
        }

        let product = fetch_product(conn, &line.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
        reserved.push((line.clone(), product));
    }

    Ok(reserved)
}

/// Who the invoice is for and who rang it up.
struct Parties {
    customer_id: Option<String>,
    customer_name: String,
    customer_contact: Option<String>,
    cashier_id: Option<String>,
    cashier_name: Option<String>,
}

async fn resolve_parties(
    conn: &mut SqliteConnection,
    actor: &Actor,
    options: &CheckoutOptions,
) -> DbResult<Parties> {
    match actor {
        Actor::Customer(id) => {
            let customer = fetch_customer(conn, id)
                .await?
                .ok_or_else(|| CoreError::CustomerNotFound(id.clone()))?;
            Ok(Parties {
                customer_id: Some(customer.id),
                customer_name: customer.name,
                customer_contact: options.customer_contact.clone().or(customer.contact),
                cashier_id: None,
                cashier_name: None,
            })
        }
        Actor::Cashier(id) => {
            let cashier = fetch_cashier(conn, id)
                .await?
                .ok_or_else(|| CoreError::CashierNotFound(id.clone()))?;

            let (customer_id, customer_name, contact) = match options.customer_id.as_deref() {
                Some(customer_id) => {
                    let customer = fetch_customer(conn, customer_id)
                        .await?
                        .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))?;
                    (Some(customer.id), customer.name, customer.contact)
                }
                None => {
                    let name = match options.customer_name.as_deref().map(str::trim) {
                        Some(name) if !name.is_empty() => {
                            validate_required("customer_name", name, 200)?
                        }
                        _ => WALK_IN_CUSTOMER_NAME.to_string(),
                    };
                    (None, name, None)
                }
            };

            Ok(Parties {
                customer_id,
                customer_name,
                customer_contact: options.customer_contact.clone().or(contact),
                cashier_id: Some(cashier.id),
                cashier_name: Some(cashier.name),
            })
        }
    }
}

async fn write_invoice(
    conn: &mut SqliteConnection,
    actor: &Actor,
    options: &CheckoutOptions,
    address: Option<&str>,
    reserved: &[(CheckoutLine, Product)],
    now: DateTime<Utc>,
) -> DbResult<CheckoutReceipt> {
    let parties = resolve_parties(conn, actor, options).await?;

    let total = Money::checked_total(
        reserved
            .iter()
            .map(|(line, product)| (product.price, line.quantity)),
    )
    .ok_or_else(ValidationError::total_out_of_range)?;

    let invoice = Invoice {
        id: Uuid::new_v4().to_string(),
        invoice_number: generate_invoice_number(now),
        customer_id: parties.customer_id,
        customer_name: parties.customer_name,
        customer_contact: parties.customer_contact,
        order_type: options.shipping_option,
        payment_option: options.payment_option,
        cashier_id: parties.cashier_id,
        cashier_name: parties.cashier_name,
        total,
        created_at: now,
    };
    insert_invoice(conn, &invoice).await?;

    for (line, product) in reserved {
        let detail = InvoiceDetail {
            id: Uuid::new_v4().to_string(),
            invoice_id: invoice.id.clone(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            product_unit: product.unit.clone(),
            product_image: product.image.clone(),
            quantity: line.quantity,
            unit_price: product.price,
        };
        insert_detail(conn, &detail).await?;
    }

    let status = invoice.order_type.initial_status(actor.kind());
    let cashier_id = invoice.cashier_id.as_deref();

    insert_status(conn, &invoice.id, invoice.order_type, status, address, cashier_id, now).await?;
    append_log(conn, &invoice.id, invoice.order_type, None, status, cashier_id, now).await?;

    // Counter sales are settled in cash on the spot.
    if cashier_id.is_some() && total.is_positive() {
        upsert_payment(conn, &invoice.id, total, None, now).await?;
    }

    Ok(CheckoutReceipt {
        invoice_id: invoice.id,
        invoice_number: invoice.invoice_number,
        order_type: invoice.order_type,
        status,
        total,
    })
}
