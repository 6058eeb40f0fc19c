use chrono::{DateTime, Utc};
use serde::Serialize;

use super::EmailAddress;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    Active,
}

/// Row inserted into the `subscribers` table. `email` is the table's unique key.
#[derive(Debug, Serialize, Clone)]
pub struct NewSubscriber {
    pub email: EmailAddress,
    pub subscribed_at: DateTime<Utc>,
    pub status: SubscriberStatus,
}

impl NewSubscriber {
    pub fn new(email: EmailAddress) -> Self {
        Self {
            email,
            subscribed_at: Utc::now(),
            status: SubscriberStatus::Active,
        }
    }
}
