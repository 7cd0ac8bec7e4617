//! CreateOrderHandler - Command handler for creating a one-off payment order.

use std::sync::Arc;

use crate::domain::subscription::SettlementError;
use crate::ports::{CreateOrderRequest, SettlementGateway};

/// Command to create a payable order at the gateway.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub plan_id: String,
    pub amount: String,
    pub currency: String,
}

/// Result of order creation.
#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub order_id: String,
    pub status: String,
}

/// Handler for creating one-off payment orders.
///
/// The order only exists at the gateway until it is captured; nothing
/// is written to the entitlement store here.
pub struct CreateOrderHandler {
    gateway: Arc<dyn SettlementGateway>,
}

impl CreateOrderHandler {
    pub fn new(gateway: Arc<dyn SettlementGateway>) -> Self {
        Self { gateway }
    }

    pub async fn handle(&self, cmd: CreateOrderCommand) -> Result<CreateOrderResult, SettlementError> {
        // 1. Validate the payable amount
        if cmd.amount.trim().is_empty() {
            return Err(SettlementError::validation("amount", "cannot be empty"));
        }

        // 2. Create the order at the gateway
        let order = self
            .gateway
            .create_order(CreateOrderRequest {
                amount: cmd.amount,
                currency: cmd.currency,
                plan_id: cmd.plan_id,
            })
            .await?;

        Ok(CreateOrderResult {
            order_id: order.order_id,
            status: order.status,
        })
    }
}
