use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{Order, OrderSide, User};
use crate::error::{DcaError, Result};
use crate::persistence::OrderRepository;

/// `orders.reprices` is an INTEGER column
fn reprices_to_column(reprices: u32) -> Result<i32> {
    i32::try_from(reprices)
        .map_err(|_| DcaError::Internal(format!("reprice count {} overflows", reprices)))
}

fn reprices_from_column(reprices: i32) -> Result<u32> {
    u32::try_from(reprices)
        .map_err(|_| DcaError::Internal(format!("corrupt reprice count {} in orders", reprices)))
}

/// PostgreSQL storage adapter (schema `crypto_dca`)
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a PostgreSQL store from an existing connection pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn order_from_row(row: &PgRow) -> Result<Order> {
        let side: String = row.get("side");
        let reprices: i32 = row.get("reprices");

        Ok(Order {
            id: Some(row.get("order_id")),
            user_id: row.get("user_id"),
            symbol: row.get("symbol"),
            side: OrderSide::try_from(side.as_str()).map_err(DcaError::Internal)?,
            price: row.get("price"),
            quantity: row.get("quantity"),
            multiplier: row.get("multiplier"),
            reprices: reprices_from_column(reprices)?,
            status: row.get("status"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    #[instrument(skip(self))]
    async fn add_user(&self, user: &User) -> Result<Uuid> {
        let row = sqlx::query(
            r#"
            INSERT INTO crypto_dca.users (name)
            VALUES ($1)
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    async fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name FROM crypto_dca.users WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| User {
            id: Some(r.get("id")),
            name: r.get("name"),
        }))
    }

    #[instrument(skip(self, order), fields(symbol = %order.symbol, status = %order.status))]
    async fn add_order(&self, order: &Order) -> Result<Uuid> {
        let reprices = reprices_to_column(order.reprices)?;

        let row = sqlx::query(
            r#"
            INSERT INTO crypto_dca.orders
                (user_id, symbol, side, price, quantity, multiplier, reprices, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(order.user_id)
        .bind(&order.symbol)
        .bind(order.side.as_str())
        .bind(order.price)
        .bind(order.quantity)
        .bind(order.multiplier)
        .bind(reprices)
        .bind(&order.status)
        .bind(order.created_at)
        .fetch_one(&self.pool)
        .await?;

        let id: Uuid = row.get("id");
        debug!("Recorded order {}", id);
        Ok(id)
    }

    /// Reads `last_orders`, which the insert trigger keeps current
    async fn get_last_order(
        &self,
        user_id: Uuid,
        symbol: &str,
        side: OrderSide,
    ) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT order_id, user_id, symbol, side, price, quantity,
                   multiplier, reprices, status, created_at
            FROM crypto_dca.last_orders
            WHERE user_id = $1 AND symbol = $2 AND side = $3
            "#,
        )
        .bind(user_id)
        .bind(symbol)
        .bind(side.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::order_from_row).transpose()
    }
}
