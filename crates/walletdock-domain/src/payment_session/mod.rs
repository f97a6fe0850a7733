use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::{OrderId, SessionId};

/// Display status of the QR payment dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Loading,
    Active,
    Paid,
    Expired,
    Closed,
}

/// Timing rules for order polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between status checks; the first check happens one interval after start
    pub interval: Duration,
    /// Polling stops once elapsed time exceeds this
    pub timeout: Duration,
    /// Delay between the success notice and timer cleanup
    pub success_grace: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(6),
            timeout: Duration::from_secs(5 * 60),
            success_grace: Duration::from_secs(3),
        }
    }
}

/// What a single poll tick should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    CheckOrder,
    TimedOut,
}

impl PollPolicy {
    pub fn decide(&self, elapsed: Duration) -> TickDecision {
        if elapsed > self.timeout {
            TickDecision::TimedOut
        } else {
            TickDecision::CheckOrder
        }
    }
}

/// Why a poll was stopped before an outcome was known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    DialogClosed,
    CountdownFinished,
    Superseded,
}

/// Order poller lifecycle: `Idle -> Active -> {Succeeded, TimedOut, Cancelled}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Active {
        session_id: SessionId,
        order_id: OrderId,
    },
    Succeeded {
        session_id: SessionId,
        order_id: OrderId,
    },
    TimedOut {
        session_id: SessionId,
        order_id: OrderId,
    },
    Cancelled {
        session_id: SessionId,
        order_id: OrderId,
        reason: CancelReason,
    },
}

impl PollState {
    pub fn is_active(&self) -> bool {
        matches!(self, PollState::Active { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Succeeded { .. } | PollState::TimedOut { .. } | PollState::Cancelled { .. }
        )
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            PollState::Idle => None,
            PollState::Active { session_id, .. }
            | PollState::Succeeded { session_id, .. }
            | PollState::TimedOut { session_id, .. }
            | PollState::Cancelled { session_id, .. } => Some(session_id),
        }
    }
}

/// One QR payment dialog and its countdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    id: SessionId,
    order_id: OrderId,
    qr_url: String,
    status: SessionStatus,
    dialog_open: bool,
    started_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
}

impl PaymentSession {
    /// Open the dialog for a freshly created order
    pub fn open(order_id: OrderId, qr_url: impl Into<String>, timeout: Duration) -> Self {
        let started_at = Utc::now();
        let timeout = chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::minutes(5));

        Self {
            id: SessionId::new(),
            order_id,
            qr_url: qr_url.into(),
            status: SessionStatus::Active,
            dialog_open: true,
            started_at,
            deadline: started_at + timeout,
        }
    }

    pub fn mark_paid(&mut self) {
        self.status = SessionStatus::Paid;
    }

    /// Close after the grace delay; the status keeps the final outcome
    pub fn finish(&mut self) {
        self.dialog_open = false;
    }

    pub fn expire(&mut self) {
        self.status = SessionStatus::Expired;
        self.dialog_open = false;
    }

    pub fn close(&mut self) {
        if self.status == SessionStatus::Active || self.status == SessionStatus::Loading {
            self.status = SessionStatus::Closed;
        }
        self.dialog_open = false;
    }

    /// Time left on the countdown, zero once the deadline has passed
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.deadline - now).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn qr_url(&self) -> &str {
        &self.qr_url
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog_open
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }
}
