use serde::{Deserialize, Serialize};

use crate::checkout::RedirectForm;
use crate::shared::{DomainError, OrderId};

/// Payment channel chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "zfb")]
    Alipay,
    #[serde(rename = "wx")]
    WeChat,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Alipay => "zfb",
            PaymentMethod::WeChat => "wx",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "zfb" | "alipay" => Ok(PaymentMethod::Alipay),
            "wx" | "wechat" => Ok(PaymentMethod::WeChat),
            other => Err(DomainError::PaymentMethodUnavailable(other.to_string())),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment provider mode configured on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayType {
    /// Redirect flow: form POST to an external processor
    #[default]
    Easy,
    /// In-page flow: QR code plus order polling
    Wx,
}

impl PayType {
    /// Backend path that creates the payment
    pub fn payment_path(&self) -> &'static str {
        match self {
            PayType::Easy => "/api/user/pay",
            PayType::Wx => "/api/user/wxpay",
        }
    }

    /// Alipay is only offered through the redirect processor
    pub fn supports(&self, method: PaymentMethod) -> bool {
        match method {
            PaymentMethod::WeChat => true,
            PaymentMethod::Alipay => *self == PayType::Easy,
        }
    }

    pub fn available_methods(&self) -> Vec<PaymentMethod> {
        [PaymentMethod::Alipay, PaymentMethod::WeChat]
            .into_iter()
            .filter(|m| self.supports(*m))
            .collect()
    }
}

/// Counts below one are raised to one before quoting
pub fn normalize_count(count: i64) -> i64 {
    count.max(1)
}

/// Rejects a count below the configured minimum
pub fn ensure_minimum(count: i64, min_topup: i64) -> Result<(), DomainError> {
    if count < min_topup {
        return Err(DomainError::BelowMinimumTopUp { minimum: min_topup });
    }
    Ok(())
}

/// A request to buy `count` quota units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopUpRequest {
    count: i64,
    top_up_code: String,
    method: PaymentMethod,
}

impl TopUpRequest {
    pub fn new(count: i64, top_up_code: impl Into<String>, method: PaymentMethod) -> Self {
        Self {
            count,
            top_up_code: top_up_code.into(),
            method,
        }
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn top_up_code(&self) -> &str {
        &self.top_up_code
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }
}

/// Server-computed price for a top-up count
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AmountQuote {
    pub count: i64,
    pub amount: f64,
}

impl AmountQuote {
    pub fn zero(count: i64) -> Self {
        Self { count, amount: 0.0 }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0.0
    }

    pub fn render(&self) -> String {
        render_amount(self.amount)
    }
}

/// `10.0` renders as `10元`, `10.5` as `10.5元`
pub fn render_amount(amount: f64) -> String {
    format!("{}元", amount)
}

/// What the backend returned for a payment-creation request
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentIntent {
    Redirect(RedirectForm),
    Qr { qr_url: String, order_id: OrderId },
}
