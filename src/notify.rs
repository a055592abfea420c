use std::sync::Arc;

use async_trait::async_trait;

use crate::models::OrderDetail;

/// Outbound order-confirmation collaborator. Implementations must be cheap to
/// call from request handlers; delivery happens off the caller's path.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn send(&self, order: &OrderDetail) -> anyhow::Result<()>;
}

/// Default sender: renders the confirmation and writes it to the log stream.
/// Swap in an SMTP- or webhook-backed implementation behind the same trait.
pub struct LogNotifier;

#[async_trait]
impl OrderNotifier for LogNotifier {
    async fn send(&self, order: &OrderDetail) -> anyhow::Result<()> {
        tracing::info!(
            order_id = %order.id,
            recipient = %order.cart.user.email,
            body = %order_summary(order),
            "order notification"
        );
        Ok(())
    }
}

/// Fire-and-forget dispatch. Failures are logged and never reach the caller.
pub fn dispatch(notifier: Arc<dyn OrderNotifier>, order: OrderDetail) {
    tokio::spawn(async move {
        if let Err(err) = notifier.send(&order).await {
            tracing::warn!(order_id = %order.id, error = %err, "order notification failed");
        }
    });
}

pub fn order_summary(order: &OrderDetail) -> String {
    let mut lines: Vec<String> = order
        .cart
        .lines
        .iter()
        .map(|line| format!("{} x {}", line.article.name, line.quantity))
        .collect();
    lines.push(format!("total: {} EUR", order.total));
    format!("Order {} ({}): {}", order.id, order.status, lines.join(", "))
}
