use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockscan_core::{Entity, OrderId, SessionId, Sku};

/// Order line status. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineStatus {
    #[default]
    Pending,
    Done,
}

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Done,
}

/// Order line: product and quantity to take off the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub sku: Sku,
    pub qty_asked: u32,
    #[serde(default)]
    pub qty_picked: u32,
    #[serde(default)]
    pub status: LineStatus,
}

impl OrderItem {
    pub fn new(sku: impl Into<Sku>, qty_asked: u32) -> Self {
        Self {
            sku: sku.into(),
            qty_asked,
            qty_picked: 0,
            status: LineStatus::Pending,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == LineStatus::Done
    }

    /// Mark the whole asked quantity as picked.
    pub(crate) fn fulfil(&mut self) {
        self.qty_picked = self.qty_asked;
        self.status = LineStatus::Done;
    }
}

/// Exclusivity lease on an order, held by at most one session of this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Lease {
    pub held: bool,
    #[serde(default)]
    pub holder: Option<SessionId>,
    #[serde(default)]
    pub acquired_at: Option<DateTime<Utc>>,
}

impl Lease {
    pub(crate) fn acquire(&mut self, holder: SessionId, at: DateTime<Utc>) {
        self.held = true;
        self.holder = Some(holder);
        self.acquired_at = Some(at);
    }

    pub(crate) fn release(&mut self) {
        *self = Lease::default();
    }

    pub fn is_held_by(&self, session: SessionId) -> bool {
        self.held && self.holder == Some(session)
    }
}

/// Customer order to pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub client: String,
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub lock: Lease,
}

impl Order {
    pub fn new(id: impl Into<OrderId>, client: impl Into<String>, items: Vec<OrderItem>) -> Self {
        Self {
            id: id.into(),
            client: client.into(),
            items,
            status: OrderStatus::Pending,
            lock: Lease::default(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == OrderStatus::Done
    }

    pub fn pending_lines(&self) -> usize {
        self.items.iter().filter(|item| !item.is_done()).count()
    }

    pub fn is_fully_picked(&self) -> bool {
        self.pending_lines() == 0
    }

    /// Done lines as a percentage, rounded to the nearest integer.
    pub fn progress(&self) -> u8 {
        let total = self.items.len();
        if total == 0 {
            return 100;
        }
        let done = total - self.pending_lines();
        ((done * 200 + total) / (total * 2)) as u8
    }

    /// Lines in display order: pending first, done last, otherwise as stored.
    pub fn display_items(&self) -> Vec<&OrderItem> {
        let mut items: Vec<&OrderItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.is_done());
        items
    }

    /// Structural checks applied when orders enter the orchestrator.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("order id cannot be empty".to_string());
        }
        if self.items.is_empty() {
            return Err("order has no lines".to_string());
        }
        if self.items.iter().any(|item| item.qty_asked == 0) {
            return Err("qty_asked must be positive".to_string());
        }
        if self.is_done() && !self.is_fully_picked() {
            return Err("done order has pending lines".to_string());
        }
        Ok(())
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order::new(
            "CMD-8025",
            "M. MARTIN",
            vec![
                OrderItem::new("1.3/4 NOIR", 5),
                OrderItem::new("1.2 NOIR", 2),
                OrderItem::new("1.1/4 GALVA", 50),
            ],
        )
    }

    #[test]
    fn display_puts_done_lines_last_and_keeps_order_otherwise() {
        let mut order = order();
        order.items[0].fulfil();

        let skus: Vec<&str> = order.display_items().iter().map(|i| i.sku.as_str()).collect();
        assert_eq!(skus, vec!["1.2 NOIR", "1.1/4 GALVA", "1.3/4 NOIR"]);
        // Stored order is untouched.
        assert_eq!(order.items[0].sku.as_str(), "1.3/4 NOIR");
    }

    #[test]
    fn progress_counts_done_lines() {
        let mut order = order();
        assert_eq!(order.progress(), 0);
        order.items[1].fulfil();
        assert_eq!(order.progress(), 33);
        order.items[0].fulfil();
        order.items[2].fulfil();
        assert_eq!(order.progress(), 100);
        assert!(order.is_fully_picked());
    }

    #[test]
    fn fulfil_picks_the_asked_quantity() {
        let mut item = OrderItem::new("A1", 7);
        item.fulfil();
        assert_eq!(item.qty_picked, 7);
        assert!(item.is_done());
    }

    #[test]
    fn validation_rejects_malformed_orders() {
        assert!(order().validate().is_ok());
        assert!(Order::new("CMD-1", "X", vec![]).validate().is_err());
        assert!(Order::new("CMD-1", "X", vec![OrderItem::new("A", 0)]).validate().is_err());

        let mut done_but_pending = order();
        done_but_pending.status = OrderStatus::Done;
        assert!(done_but_pending.validate().is_err());
    }

    #[test]
    fn legacy_order_json_deserializes_with_defaults() {
        let json = r#"{
            "id": "CMD-8024",
            "client": "SARL DUPONT",
            "status": "pending",
            "items": [{"sku": "1.1 GALVA", "qty_asked": 20, "qty_picked": 0, "status": "pending"}]
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert!(!order.lock.held);
        assert_eq!(order.items[0].qty_asked, 20);
    }
}
