//! PostgreSQL sinks: the `orders`, `trades`, and `order_events` tables.
//!
//! Queries use `sqlx::query`/`query_as` against a plain string, not the
//! `query!` macro — there is no live database to check against at build
//! time, and every other service in the fleet connects the same way.

use fb_core::model::order::{Direction, Offset, OrderEventType, OrderStatus};
use fb_core::model::trade::Trade;
use fb_core::model::Order;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::StorageError;

pub struct DbClient {
    pool: PgPool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderRow {
    order_id: String,
    volume_orign: i64,
    volume_left: i64,
    status: String,
}

impl DbClient {
    pub async fn connect(config: &fb_core::config::DatabaseConfig) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.connection_string())
            .await?;
        Ok(Self { pool })
    }

    /// Shared handle for adapters, like the universe loader, that need
    /// direct pool access rather than the order/trade-specific methods.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                order_id TEXT PRIMARY KEY,
                instrument_id TEXT NOT NULL,
                direction TEXT NOT NULL,
                order_offset TEXT NOT NULL,
                volume_orign BIGINT NOT NULL,
                limit_price NUMERIC,
                portfolio_id TEXT NOT NULL,
                origin_timestamp BIGINT NOT NULL,
                exchange_order_id TEXT NOT NULL DEFAULT '',
                exchange_id TEXT NOT NULL DEFAULT '',
                volume_left BIGINT NOT NULL,
                last_msg TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                is_dead BOOLEAN NOT NULL DEFAULT FALSE,
                is_online BOOLEAN NOT NULL DEFAULT FALSE,
                is_error BOOLEAN NOT NULL DEFAULT FALSE,
                trade_price NUMERIC NOT NULL DEFAULT 0,
                exchange_trading_date TEXT NOT NULL DEFAULT '',
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                trade_id TEXT PRIMARY KEY,
                order_id TEXT NOT NULL REFERENCES orders(order_id),
                exchange_trade_id TEXT NOT NULL,
                exchange_id TEXT NOT NULL,
                instrument_id TEXT NOT NULL,
                direction TEXT NOT NULL,
                order_offset TEXT NOT NULL,
                price NUMERIC NOT NULL,
                volume BIGINT NOT NULL,
                commission NUMERIC NOT NULL,
                trade_date_time BIGINT NOT NULL,
                seqno BIGINT NOT NULL,
                portfolio_id TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS order_events (
                id BIGSERIAL PRIMARY KEY,
                order_id TEXT NOT NULL,
                event_type TEXT NOT NULL,
                volume_left BIGINT NOT NULL,
                recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a brand-new order row. Called once from the Submitter after
    /// a successful broker call.
    pub async fn insert_order(&self, order: &Order) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                order_id, instrument_id, direction, order_offset, volume_orign,
                limit_price, portfolio_id, origin_timestamp, exchange_order_id,
                exchange_id, volume_left, last_msg, status, is_dead, is_online,
                is_error, trade_price, exchange_trading_date
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18
            )
            "#,
        )
        .bind(&order.order_id)
        .bind(&order.instrument_id)
        .bind(direction_str(order.direction))
        .bind(offset_str(order.offset))
        .bind(order.volume_orign)
        .bind(order.limit_price)
        .bind(&order.portfolio_id)
        .bind(order.origin_timestamp)
        .bind(&order.exchange_order_id)
        .bind(&order.exchange_id)
        .bind(order.volume_left)
        .bind(&order.last_msg)
        .bind(status_str(order.status))
        .bind(order.is_dead)
        .bind(order.is_online)
        .bind(order.is_error)
        .bind(order.trade_price)
        .bind(&order.exchange_trading_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Applies an order update using the idempotent-monotonic rule: a
    /// backward transition from partial-fill to canceled is rejected
    /// (message reordering), and `volume_left` never increases.
    pub async fn update_order(&self, order: &Order) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, OrderRow>(
            "SELECT order_id, volume_orign, volume_left, status FROM orders WHERE order_id = $1 FOR UPDATE",
        )
        .bind(&order.order_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (volume_left, status) = match existing {
            Some(row) => {
                let old_status = parse_status(&row.status);
                let old_event = fb_core::model::order::classify_order_event(
                    old_status,
                    row.volume_orign,
                    row.volume_left,
                );
                let new_event = order.event_type();
                if old_event == OrderEventType::PartialFill && new_event == OrderEventType::Canceled
                {
                    (row.volume_left, row.status)
                } else {
                    (
                        row.volume_left.min(order.volume_left),
                        status_str(order.status).to_string(),
                    )
                }
            }
            None => (order.volume_left, status_str(order.status).to_string()),
        };

        sqlx::query(
            r#"
            UPDATE orders SET
                exchange_order_id = $2,
                exchange_id = $3,
                volume_left = $4,
                last_msg = $5,
                status = $6,
                is_dead = $7,
                is_online = $8,
                is_error = $9,
                trade_price = $10,
                exchange_trading_date = $11,
                updated_at = NOW()
            WHERE order_id = $1
            "#,
        )
        .bind(&order.order_id)
        .bind(&order.exchange_order_id)
        .bind(&order.exchange_id)
        .bind(volume_left)
        .bind(&order.last_msg)
        .bind(&status)
        .bind(order.is_dead)
        .bind(order.is_online)
        .bind(order.is_error)
        .bind(order.trade_price)
        .bind(&order.exchange_trading_date)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO order_events (order_id, event_type, volume_left) VALUES ($1, $2, $3)",
        )
        .bind(&order.order_id)
        .bind(event_type_str(order.event_type()))
        .bind(order.volume_left)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Inserts a fill, deduping on `trade_id` via `ON CONFLICT DO NOTHING`.
    pub async fn insert_trade(&self, trade: &Trade) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO trades (
                trade_id, order_id, exchange_trade_id, exchange_id, instrument_id,
                direction, order_offset, price, volume, commission, trade_date_time,
                seqno, portfolio_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (trade_id) DO NOTHING
            "#,
        )
        .bind(&trade.trade_id)
        .bind(&trade.order_id)
        .bind(&trade.exchange_trade_id)
        .bind(&trade.exchange_id)
        .bind(&trade.instrument_id)
        .bind(direction_str(trade.direction))
        .bind(offset_str(trade.offset))
        .bind(trade.price)
        .bind(trade.volume)
        .bind(trade.commission)
        .bind(trade.trade_date_time)
        .bind(trade.seqno)
        .bind(&trade.portfolio_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn direction_str(direction: Direction) -> &'static str {
    match direction {
        Direction::Buy => "BUY",
        Direction::Sell => "SELL",
    }
}

fn offset_str(offset: Offset) -> &'static str {
    match offset {
        Offset::Open => "OPEN",
        Offset::Close => "CLOSE",
        Offset::Closetoday => "CLOSETODAY",
    }
}

fn status_str(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Alive => "ALIVE",
        OrderStatus::Finished => "FINISHED",
    }
}

fn parse_status(value: &str) -> OrderStatus {
    match value {
        "FINISHED" => OrderStatus::Finished,
        _ => OrderStatus::Alive,
    }
}

fn event_type_str(event_type: OrderEventType) -> &'static str {
    match event_type {
        OrderEventType::New => "NEW",
        OrderEventType::PartialFill => "PARTIAL_FILL",
        OrderEventType::CompleteFill => "COMPLETE_FILL",
        OrderEventType::Canceled => "CANCELED",
    }
}
