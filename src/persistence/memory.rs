use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::OrderRepository;
use crate::domain::{Order, OrderSide, User};
use crate::error::Result;

/// Process-local repository, for dry runs without a database and for tests
#[derive(Debug, Default)]
pub struct MemoryRepository {
    users: RwLock<Vec<User>>,
    orders: RwLock<Vec<Order>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }
}

#[async_trait]
impl OrderRepository for MemoryRepository {
    async fn add_user(&self, user: &User) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let mut stored = user.clone();
        stored.id = Some(id);
        self.users.write().await.push(stored);
        Ok(id)
    }

    async fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.name == name).cloned())
    }

    async fn add_order(&self, order: &Order) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let mut stored = order.clone();
        stored.id = Some(id);
        self.orders.write().await.push(stored);
        Ok(id)
    }

    async fn get_last_order(
        &self,
        user_id: Uuid,
        symbol: &str,
        side: OrderSide,
    ) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .iter()
            .filter(|o| o.user_id == user_id && o.symbol == symbol && o.side == side)
            .max_by_key(|o| o.created_at)
            .cloned())
    }
}
