use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Order, OrderSide, User};
use crate::error::Result;

/// Storage for accounts and their completed DCA orders
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a user, returning the generated id
    async fn add_user(&self, user: &User) -> Result<Uuid>;

    async fn get_user_by_name(&self, name: &str) -> Result<Option<User>>;

    /// Insert an order, returning the generated id
    async fn add_order(&self, order: &Order) -> Result<Uuid>;

    /// Most recent order for this user/symbol/side
    async fn get_last_order(
        &self,
        user_id: Uuid,
        symbol: &str,
        side: OrderSide,
    ) -> Result<Option<Order>>;

    /// Look up `name`, creating the user on first use
    async fn get_or_create_user(&self, name: &str) -> Result<Uuid> {
        if let Some(id) = self.get_user_by_name(name).await?.and_then(|u| u.id) {
            return Ok(id);
        }
        self.add_user(&User::new(name)).await
    }
}
