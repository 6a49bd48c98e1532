//! Scripted [`VenueAdapter`] implementation for tests.
//!
//! Each call to `place_order` pops the next [`PlaceScript`] from a queue
//! (defaulting to a full fill when exhausted) and fills at the current
//! quote view's top-of-book. Submitted orders and cancels are logged for
//! assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Asset, Fill, Leg, LegOrder, OrderId, QuoteView, Side, Triangle};
use crate::engine::edge::FeeSchedule;
use crate::error::{ExecutionError, Result};
use crate::exchange::traits::VenueAdapter;

/// Scripted behavior for one `place_order` call.
#[derive(Debug, Clone)]
pub enum PlaceScript {
    /// Fill the full requested quantity at the current top-of-book.
    Fill,
    /// Fill the given fraction of the requested quantity.
    Partial(Decimal),
    /// IOC cancels with nothing executed.
    NoFill,
    /// Transport-level failure (eligible for the pre-position retry).
    Transport(String),
    /// Venue rejection (never retried).
    Rejected(String),
    /// Never responds; exercises the submission timeout path.
    Hang,
}

/// A mock venue with scripted quote views and per-order fill behavior.
pub struct ScriptedVenue {
    name: String,
    views: Mutex<VecDeque<QuoteView>>,
    current: Mutex<QuoteView>,
    scripts: Mutex<VecDeque<PlaceScript>>,
    orders: Mutex<Vec<LegOrder>>,
    cancels: Mutex<Vec<OrderId>>,
    balances: Mutex<HashMap<Asset, Decimal>>,
    fees: FeeSchedule,
    min_notional: Decimal,
}

impl ScriptedVenue {
    /// Create a venue that always serves `view` and fully fills orders.
    #[must_use]
    pub fn new(view: QuoteView) -> Self {
        Self {
            name: "scripted".to_string(),
            views: Mutex::new(VecDeque::new()),
            current: Mutex::new(view),
            scripts: Mutex::new(VecDeque::new()),
            orders: Mutex::new(Vec::new()),
            cancels: Mutex::new(Vec::new()),
            balances: Mutex::new(HashMap::new()),
            fees: FeeSchedule::flat(Decimal::ZERO),
            min_notional: Decimal::ZERO,
        }
    }

    /// Queue quote views served before falling back to the last one.
    #[must_use]
    pub fn with_views(self, views: Vec<QuoteView>) -> Self {
        *self.views.lock().unwrap() = views.into();
        self
    }

    /// Queue per-order scripts, consumed in submission order.
    #[must_use]
    pub fn with_scripts(self, scripts: Vec<PlaceScript>) -> Self {
        *self.scripts.lock().unwrap() = scripts.into();
        self
    }

    #[must_use]
    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    #[must_use]
    pub fn with_min_notional(mut self, min: Decimal) -> Self {
        self.min_notional = min;
        self
    }

    #[must_use]
    pub fn with_balances(self, balances: HashMap<Asset, Decimal>) -> Self {
        *self.balances.lock().unwrap() = balances;
        self
    }

    /// Orders submitted so far, in order.
    #[must_use]
    pub fn submitted_orders(&self) -> Vec<LegOrder> {
        self.orders.lock().unwrap().clone()
    }

    /// Cancel requests received so far.
    #[must_use]
    pub fn cancel_requests(&self) -> Vec<OrderId> {
        self.cancels.lock().unwrap().clone()
    }

    fn exec_price(&self, leg: Leg, side: Side) -> Decimal {
        let view = *self.current.lock().unwrap();
        let quote = view.leg(leg);
        match side {
            Side::Buy => quote.ask(),
            Side::Sell => quote.bid(),
        }
    }

    fn fee_for(&self, order: &LegOrder, qty: Decimal, price: Decimal) -> Decimal {
        let view = *self.current.lock().unwrap();
        let notional_quote = match order.leg {
            Leg::Ab | Leg::Ac => qty * price,
            Leg::Bc => qty * price * view.leg(Leg::Ac).bid(),
        };
        notional_quote * self.fees.leg_rate(order.leg)
    }
}

#[async_trait]
impl VenueAdapter for ScriptedVenue {
    async fn quotes(&self, _triangle: &Triangle) -> Result<QuoteView> {
        let mut views = self.views.lock().unwrap();
        if let Some(next) = views.pop_front() {
            *self.current.lock().unwrap() = next;
        }
        Ok(*self.current.lock().unwrap())
    }

    async fn place_order(&self, order: &LegOrder) -> std::result::Result<Fill, ExecutionError> {
        self.orders.lock().unwrap().push(order.clone());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PlaceScript::Fill);

        let seq = self.orders.lock().unwrap().len();
        let filled_qty = match &script {
            PlaceScript::Fill => order.qty,
            PlaceScript::Partial(fraction) => order.qty * *fraction,
            PlaceScript::NoFill => Decimal::ZERO,
            PlaceScript::Transport(msg) => return Err(ExecutionError::Transport(msg.clone())),
            PlaceScript::Rejected(msg) => return Err(ExecutionError::Rejected(msg.clone())),
            PlaceScript::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("hung order resolved");
            }
        };

        if filled_qty.is_zero() {
            return Ok(Fill::none(order.leg, order.side, order.attempt_id));
        }
        let price = self.exec_price(order.leg, order.side);
        Ok(Fill {
            leg: order.leg,
            side: order.side,
            order_id: OrderId::new(format!("scripted-{seq}")),
            qty: filled_qty,
            price,
            fee: self.fee_for(order, filled_qty, price),
            attempt_id: order.attempt_id,
        })
    }

    async fn cancel_order(&self, id: &OrderId) -> Result<()> {
        self.cancels.lock().unwrap().push(id.clone());
        Ok(())
    }

    async fn balances(&self) -> Result<HashMap<Asset, Decimal>> {
        Ok(self.balances.lock().unwrap().clone())
    }

    fn fees(&self) -> FeeSchedule {
        self.fees
    }

    fn min_notional(&self, _symbol: &str) -> Decimal {
        self.min_notional
    }

    fn venue_name(&self) -> &str {
        &self.name
    }
}
