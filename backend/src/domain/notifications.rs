//! Change notifications for front ends.
//!
//! Services publish a [`DomainNotification`] after each completed transaction.
//! Delivery uses a broadcast channel, so any number of views can subscribe and
//! a slow subscriber only loses its own backlog.

use log::debug;
use shared::Celebration;
use tokio::sync::broadcast;

use crate::domain::models::behavior::BehaviorType;
use crate::domain::models::child::Child;
use crate::domain::models::event::BehaviorEvent;
use crate::domain::models::reward::Reward;
use crate::domain::models::reward_history::RewardHistoryEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum DomainNotification {
    ChildChanged(Child),
    ChildDeleted { child_id: String },
    BehaviorTypeChanged(BehaviorType),
    EventLogged(BehaviorEvent),
    EventDeleted(BehaviorEvent),
    RewardChanged(Reward),
    RewardHistoryRecorded(RewardHistoryEvent),
    Celebration(Celebration),
}

#[derive(Debug, Clone)]
pub struct NotificationHub {
    tx: broadcast::Sender<DomainNotification>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainNotification> {
        self.tx.subscribe()
    }

    pub fn publish(&self, notification: DomainNotification) {
        // No receivers is fine: notifications are advisory
        if self.tx.send(notification).is_err() {
            debug!("Notification dropped, no subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
