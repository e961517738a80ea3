//! # Supply Receiving
//!
//! Records goods received from a supplier and puts them on the shelf.
//!
//! ## Line Total
//! ```text
//! quantity × unit_cost  ──►  StackedDiscount::parse("10+5").apply(..)
//!
//!   200 000 × 0.90 = 180 000
//!   180 000 × 0.95 = 171 000      (not 200 000 × 0.85 = 170 000)
//! ```
//! Each step rounds half-up to whole rupiah.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::invoice::generate_invoice_number;
use crate::repository::product::increment_stock;
use crate::repository::supplier::{insert_supply_invoice, insert_supply_line};
use toko_core::validation::{validate_price, validate_quantity, validate_required};
use toko_core::{
    CoreError, Money, StackedDiscount, SupplyInvoice, SupplyInvoiceLine, SupplyInvoiceRequest,
    ValidationError,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyReceipt {
    pub invoice: SupplyInvoice,
    pub lines: Vec<SupplyInvoiceLine>,
}

#[derive(Debug, Clone)]
pub struct SupplyEngine {
    pool: SqlitePool,
}

impl SupplyEngine {
    pub fn new(pool: SqlitePool) -> Self {
        SupplyEngine { pool }
    }

    /// Records a supplier invoice and adds every line's quantity to stock.
    ///
    /// ## Errors
    /// * `SupplierNotFound`, `ProductNotFound`
    /// * `InvalidDiscount` - unparseable discount string
    /// * `Validation` - no lines, bad quantity, cost outside `0..=MAX_PRICE`
    ///   or a total that overflows
    pub async fn create_supply_invoice(
        &self,
        request: &SupplyInvoiceRequest,
    ) -> DbResult<SupplyReceipt> {
        if request.lines.is_empty() {
            return Err(ValidationError::required("lines").into());
        }

        let mut priced = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            validate_quantity(line.quantity)?;
            validate_price(line.unit_cost.rupiah())?;
            let discount = StackedDiscount::parse(&line.discount)?;
            let gross = line
                .unit_cost
                .checked_multiply_quantity(line.quantity)
                .ok_or_else(ValidationError::total_out_of_range)?;
            let line_total = discount.apply(gross);
            priced.push((line, discount, line_total));
        }

        // Rows are never deleted (products are only deactivated), so checking
        // them before the transaction is safe. Inactive products are still
        // received: delivered goods go on the books whether or not the product
        // is currently listed.
        if self.supplier_missing(&request.supplier_id).await? {
            return Err(CoreError::SupplierNotFound(request.supplier_id.clone()).into());
        }
        for line in &request.lines {
            if self.product_missing(&line.product_id).await? {
                return Err(CoreError::ProductNotFound(line.product_id.clone()).into());
            }
        }

        let now = Utc::now();
        let invoice = SupplyInvoice {
            id: Uuid::new_v4().to_string(),
            supplier_id: request.supplier_id.clone(),
            invoice_number: match request.invoice_number.as_deref() {
                Some(number) if !number.trim().is_empty() => {
                    validate_required("invoice_number", number, 100)?
                }
                _ => generate_invoice_number(now),
            },
            total: Money::checked_total(priced.iter().map(|(_, _, total)| (*total, 1)))
                .ok_or_else(ValidationError::total_out_of_range)?,
            supplied_at: now,
        };

        let mut tx = self.pool.begin().await?;
        insert_supply_invoice(&mut tx, &invoice).await?;

        let mut lines = Vec::with_capacity(priced.len());
        for (request_line, discount, line_total) in priced {
            let line = SupplyInvoiceLine {
                id: Uuid::new_v4().to_string(),
                supply_invoice_id: invoice.id.clone(),
                product_id: request_line.product_id.clone(),
                quantity: request_line.quantity,
                unit_cost: request_line.unit_cost,
                discount: discount.to_string(),
                line_total,
            };
            insert_supply_line(&mut tx, &line).await?;
            increment_stock(&mut tx, &line.product_id, line.quantity, now).await?;
            lines.push(line);
        }

        tx.commit().await?;

        info!(
            supply_invoice_id = %invoice.id,
            supplier_id = %invoice.supplier_id,
            lines = lines.len(),
            total = invoice.total.rupiah(),
            "Supply invoice received"
        );

        Ok(SupplyReceipt { invoice, lines })
    }

    async fn supplier_missing(&self, id: &str) -> DbResult<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM suppliers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_none())
    }

    async fn product_missing(&self, id: &str) -> DbResult<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_none())
    }
}
