use anyhow::{Context, Result};
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use walletdock_domain::checkout::RedirectForm;
use walletdock_domain::gateway::OrderStatus;
use walletdock_domain::shared::OrderId;
use walletdock_domain::top_up::{PayType, PaymentIntent, TopUpRequest};

use super::types::{truncate, value_to_field, MessageEnvelope};

impl super::HttpClient {
    /// Convert a top-up count into the payable amount
    pub async fn quote_amount(&self, count: i64, top_up_code: &str) -> Result<f64> {
        let url = self.endpoint("/api/user/amount")?;
        let response = self
            .request(Method::POST, url)?
            .json(&json!({ "amount": count, "top_up_code": top_up_code }))
            .send()
            .await
            .context("Failed to send amount request")?;

        let text = Self::read_body("Amount", response).await?;
        let envelope = parse_message_envelope("amount", &text)?.into_success()?;

        parse_amount(&envelope.data)
    }

    /// Create a payment for `request` on the endpoint matching `pay_type`
    pub async fn create_payment(
        &self,
        pay_type: PayType,
        request: &TopUpRequest,
    ) -> Result<PaymentIntent> {
        log::info!(
            "Creating {:?} payment: count={}, method={}",
            pay_type,
            request.count(),
            request.method()
        );

        let url = self.endpoint(pay_type.payment_path())?;
        let response = self
            .request(Method::POST, url)?
            .json(&json!({
                "amount": request.count(),
                "top_up_code": request.top_up_code(),
                "payment_method": request.method().as_str(),
            }))
            .send()
            .await
            .context("Failed to send payment request")?;

        let text = Self::read_body("Pay", response).await?;
        let envelope = parse_message_envelope("payment", &text)?.into_success()?;

        parse_payment_intent(pay_type, envelope)
    }

    /// Query an order once; the poller owns the retry cadence
    pub async fn check_order(&self, order_id: &OrderId) -> Result<OrderStatus> {
        let mut url = self.endpoint("/api/user/checkOrder")?;
        url.query_pairs_mut().append_pair("orderId", order_id.as_str());

        let response = self
            .request(Method::GET, url)?
            .send()
            .await
            .context("Failed to send check order request")?;

        let text = Self::read_body("Check order", response).await?;
        Ok(parse_order_status(&text))
    }
}

fn parse_message_envelope(what: &str, text: &str) -> Result<MessageEnvelope> {
    serde_json::from_str(text)
        .with_context(|| format!("Failed to parse {} response: {}", what, truncate(text, 200)))
}

/// The amount arrives as `"10.00"` or as a bare number
pub(super) fn parse_amount(data: &Value) -> Result<f64> {
    match data {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("Amount out of range: {}", n)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .with_context(|| format!("Invalid amount: {}", s)),
        other => anyhow::bail!("Unexpected amount payload: {}", other),
    }
}

pub(super) fn parse_payment_intent(
    pay_type: PayType,
    envelope: MessageEnvelope,
) -> Result<PaymentIntent> {
    let url = envelope
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Payment response missing 'url' field"))?;

    match pay_type {
        PayType::Easy => {
            let params = envelope
                .data
                .as_object()
                .ok_or_else(|| anyhow::anyhow!("Redirect payment response missing form params"))?;
            let fields: BTreeMap<String, String> = params
                .iter()
                .map(|(k, v)| (k.clone(), value_to_field(v)))
                .collect();
            Ok(PaymentIntent::Redirect(RedirectForm::new(url, fields)))
        }
        PayType::Wx => {
            let order_id = match &envelope.data {
                Value::String(s) if !s.is_empty() => s.clone(),
                Value::Number(n) => n.to_string(),
                other => anyhow::bail!("QR payment response missing order id: {}", other),
            };
            Ok(PaymentIntent::Qr {
                qr_url: url,
                order_id: OrderId::from_string(&order_id),
            })
        }
    }
}

/// Lenient: anything that is not a success marker counts as not yet paid
pub(super) fn parse_order_status(body: &str) -> OrderStatus {
    let body = body.trim();
    if body == "success" {
        return OrderStatus::Paid;
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(s)) if s == "success" => OrderStatus::Paid,
        Ok(Value::Object(map)) => match (map.get("message"), map.get("data")) {
            (Some(Value::String(m)), Some(Value::String(d))) if m == "success" && d == "success" => {
                OrderStatus::Paid
            }
            _ => OrderStatus::Pending,
        },
        _ => OrderStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: &str) -> MessageEnvelope {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_amount_string_and_number() {
        assert_eq!(parse_amount(&json!("10.00")).unwrap(), 10.0);
        assert_eq!(parse_amount(&json!(7.5)).unwrap(), 7.5);
        assert!(parse_amount(&json!(null)).is_err());
        assert!(parse_amount(&json!("ten")).is_err());
    }

    #[test]
    fn test_parse_redirect_intent() {
        let env = envelope(
            r#"{"message":"success","url":"https://pay.example.com/submit.php",
                "data":{"pid":"1001","money":"10.00","sign":"abc","type":"alipay"}}"#,
        );
        match parse_payment_intent(PayType::Easy, env).unwrap() {
            PaymentIntent::Redirect(form) => {
                assert_eq!(form.action, "https://pay.example.com/submit.php");
                assert_eq!(form.fields.get("money").map(String::as_str), Some("10.00"));
                assert_eq!(form.fields.len(), 4);
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_qr_intent() {
        let env = envelope(
            r#"{"message":"success","url":"weixin://wxpay/bizpayurl?pr=xyz","data":"USR1NOab12cd1700000000"}"#,
        );
        match parse_payment_intent(PayType::Wx, env).unwrap() {
            PaymentIntent::Qr { qr_url, order_id } => {
                assert_eq!(qr_url, "weixin://wxpay/bizpayurl?pr=xyz");
                assert_eq!(order_id.as_str(), "USR1NOab12cd1700000000");
            }
            other => panic!("expected qr, got {:?}", other),
        }
    }

    #[test]
    fn test_qr_intent_without_url_is_error() {
        let env = envelope(r#"{"message":"success","data":"USR1"}"#);
        assert!(parse_payment_intent(PayType::Wx, env).is_err());
    }

    #[test]
    fn test_parse_order_status_variants() {
        assert_eq!(parse_order_status("success"), OrderStatus::Paid);
        assert_eq!(parse_order_status("\"success\""), OrderStatus::Paid);
        assert_eq!(
            parse_order_status(r#"{"message":"success","data":"success"}"#),
            OrderStatus::Paid
        );
        assert_eq!(
            parse_order_status(r#"{"message":"success","data":"pending"}"#),
            OrderStatus::Pending
        );
        assert_eq!(parse_order_status(r#"{"message":"failed"}"#), OrderStatus::Pending);
        assert_eq!(parse_order_status(""), OrderStatus::Pending);
        assert_eq!(parse_order_status("pending"), OrderStatus::Pending);
    }
}
