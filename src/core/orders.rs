use crate::config::MailConfig;
use crate::core::Mailer;
use crate::domain::model::{EmailMessage, Order, OrderReceipt, PaymentMethod};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{validate_email, validate_non_empty_string};
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::BTreeMap;

pub struct OrderManager<M: Mailer> {
    pool: SqlitePool,
    mailer: M,
    mail: MailConfig,
}

impl<M: Mailer> OrderManager<M> {
    pub fn new(pool: SqlitePool, mailer: M, mail: MailConfig) -> Self {
        Self { pool, mailer, mail }
    }

    /// Validates, records and confirms an order.
    ///
    /// Validation runs before a connection is taken from the pool. The order
    /// row, its items and the inventory changes are written in one
    /// transaction, so a failure part-way leaves nothing behind. The
    /// confirmation email goes out only after commit; a mail failure is
    /// reported through [`OrderReceipt::confirmation_sent`].
    pub async fn process_order(&self, order: &Order) -> Result<OrderReceipt> {
        let method = validate_order(order)?;
        let quantities = merge_quantities(order);

        tracing::info!("🛒 Processing order {} ({} line items)", order.id, quantities.len());

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, payment_method, customer_email, status, created_at) \
             VALUES (?, ?, ?, 'confirmed', ?)",
        )
        .bind(&order.id)
        .bind(method.as_str())
        .bind(&order.user_email)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::DuplicateOrder(order.id.clone())
            }
            other => AppError::from(other),
        })?;

        for (sku, quantity) in &quantities {
            sqlx::query("INSERT INTO order_items (order_id, sku, quantity) VALUES (?, ?, ?)")
                .bind(&order.id)
                .bind(sku.as_str())
                .bind(*quantity)
                .execute(&mut *tx)
                .await?;
            reserve_stock(&mut tx, sku, *quantity).await?;
        }

        authorize_payment(order, method);

        tx.commit().await?;
        tracing::info!("Updated inventory for order {}", order.id);

        let confirmation_sent = self.send_confirmation(order).await;

        Ok(OrderReceipt {
            order_id: order.id.clone(),
            payment_method: method,
            line_items: quantities.len(),
            units: order.total_units(),
            confirmation_sent,
        })
    }

    /// Sets the stock level for `sku`, creating the inventory entry if needed.
    pub async fn set_stock(&self, sku: &str, quantity: u32) -> Result<()> {
        validate_non_empty_string("sku", sku)?;
        sqlx::query(
            "INSERT INTO inventory (sku, stock) VALUES (?, ?) \
             ON CONFLICT (sku) DO UPDATE SET stock = excluded.stock",
        )
        .bind(sku)
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;
        tracing::info!("📦 Stock for {} set to {}", sku, quantity);
        Ok(())
    }

    pub async fn stock_level(&self, sku: &str) -> Result<Option<i64>> {
        let stock = sqlx::query_scalar::<_, i64>("SELECT stock FROM inventory WHERE sku = ?")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;
        Ok(stock)
    }

    async fn send_confirmation(&self, order: &Order) -> bool {
        let message = EmailMessage {
            to: order.user_email.clone(),
            subject: self.mail.confirmation_subject.clone(),
            body: format!("Your order #{} is confirmed.", order.id),
        };

        match self.mailer.send(&message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "⚠️ Order {} committed but confirmation email failed: {}",
                    order.id,
                    e
                );
                false
            }
        }
    }
}

fn validate_order(order: &Order) -> Result<PaymentMethod> {
    if order.items.is_empty() {
        return Err(AppError::EmptyOrder);
    }
    validate_non_empty_string("order id", &order.id)?;
    if let Some(item) = order.items.iter().find(|item| item.quantity == 0) {
        return Err(AppError::validation(format!(
            "quantity for {} must be at least 1",
            item.sku
        )));
    }
    for item in &order.items {
        validate_non_empty_string("sku", &item.sku)?;
    }
    validate_email(&order.user_email)?;
    order.payment_type.parse()
}

/// Folds repeated SKUs into one quantity each.
fn merge_quantities(order: &Order) -> BTreeMap<String, i64> {
    let mut merged = BTreeMap::new();
    for item in &order.items {
        *merged.entry(item.sku.clone()).or_insert(0) += i64::from(item.quantity);
    }
    merged
}

async fn reserve_stock(
    tx: &mut Transaction<'_, Sqlite>,
    sku: &str,
    quantity: i64,
) -> Result<()> {
    let sql = "UPDATE inventory SET stock = stock - ? WHERE sku = ? AND stock >= ?";
    let updated = sqlx::query(sql)
        .bind(quantity)
        .bind(sku)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;

    if updated.rows_affected() == 1 {
        return Ok(());
    }

    let available = sqlx::query_scalar::<_, i64>("SELECT stock FROM inventory WHERE sku = ?")
        .bind(sku)
        .fetch_optional(&mut **tx)
        .await?;

    Err(match available {
        None => AppError::UnknownSku(sku.to_string()),
        Some(available) => AppError::InsufficientStock {
            sku: sku.to_string(),
            requested: quantity,
            available,
        },
    })
}

fn authorize_payment(order: &Order, method: PaymentMethod) {
    // 付款供應商整合尚未接上，只記錄分派結果
    match method {
        PaymentMethod::CreditCard => {
            tracing::info!("💳 Processing credit card payment for order {}", order.id)
        }
        PaymentMethod::PayPal => {
            tracing::info!("🅿️ Redirecting order {} to PayPal", order.id)
        }
    }
}
