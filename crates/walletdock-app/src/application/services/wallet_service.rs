use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument, warn};

use walletdock_domain::checkout::{FormSubmitter, SubmittedForm};
use walletdock_domain::gateway::WalletGateway;
use walletdock_domain::notification::{Notice, Notifier};
use walletdock_domain::payment_session::{CancelReason, PaymentSession, PollPolicy};
use walletdock_domain::settings::TopUpSettings;
use walletdock_domain::shared::DomainError;
use walletdock_domain::top_up::{
    ensure_minimum, normalize_count, AmountQuote, PaymentIntent, PaymentMethod, TopUpRequest,
};
use walletdock_domain::wallet::{render_quota, Wallet};

use super::OrderPoller;

/// Everything the wallet page shows, owned by one session
#[derive(Debug, Clone)]
pub struct WalletState {
    pub wallet: Wallet,
    pub redemption_code: String,
    pub top_up_code: String,
    pub top_up_count: i64,
    pub quote: AmountQuote,
    pub pay_way: Option<PaymentMethod>,
    pub confirm_open: bool,
    pub payment: Option<PaymentSession>,
}

impl Default for WalletState {
    fn default() -> Self {
        Self {
            wallet: Wallet::default(),
            redemption_code: String::new(),
            top_up_code: String::new(),
            top_up_count: 1,
            quote: AmountQuote::zero(1),
            pay_way: None,
            confirm_open: false,
            payment: None,
        }
    }
}

pub type SharedWalletState = Arc<Mutex<WalletState>>;

/// How a confirmed top-up left the client
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    /// Redirect mode: the processor form was handed to the browser side
    Redirected(SubmittedForm),
    /// QR mode: a payment dialog is open and its order is being polled
    AwaitingScan(PaymentSession),
}

/// Clears an in-flight flag when the request finishes, whatever the outcome
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Wallet service: balance, redemption and top-up payments
pub struct WalletService {
    gateway: Arc<dyn WalletGateway>,
    notifier: Arc<dyn Notifier>,
    submitter: Arc<dyn FormSubmitter>,
    settings: RwLock<TopUpSettings>,
    state: SharedWalletState,
    redeeming: AtomicBool,
    paying: AtomicBool,
    poller: OrderPoller,
}

impl WalletService {
    pub fn new(
        gateway: Arc<dyn WalletGateway>,
        notifier: Arc<dyn Notifier>,
        submitter: Arc<dyn FormSubmitter>,
        settings: TopUpSettings,
        policy: PollPolicy,
    ) -> Self {
        let count = normalize_count(settings.min_topup);
        let state = Arc::new(Mutex::new(WalletState {
            top_up_count: count,
            quote: AmountQuote::zero(count),
            ..WalletState::default()
        }));
        let poller = OrderPoller::new(gateway.clone(), notifier.clone(), state.clone(), policy);

        Self {
            gateway,
            notifier,
            submitter,
            settings: RwLock::new(settings),
            state,
            redeeming: AtomicBool::new(false),
            paying: AtomicBool::new(false),
            poller,
        }
    }

    pub fn poller(&self) -> &OrderPoller {
        &self.poller
    }

    pub async fn snapshot(&self) -> WalletState {
        self.state.lock().await.clone()
    }

    pub async fn balance(&self) -> i64 {
        self.state.lock().await.wallet.quota()
    }

    pub async fn settings(&self) -> TopUpSettings {
        self.settings.read().await.clone()
    }

    /// Load the current quota from the server
    #[instrument(skip(self))]
    pub async fn load_balance(&self) -> Result<i64, DomainError> {
        match self.gateway.fetch_profile().await {
            Ok(profile) => {
                self.state.lock().await.wallet.load(profile.quota);
                info!("Balance loaded: {}", profile.quota);
                Ok(profile.quota)
            }
            Err(e) => {
                self.report("Loading the balance", &e);
                Err(e)
            }
        }
    }

    /// Refresh the top-up settings from `/api/status`
    #[instrument(skip(self))]
    pub async fn sync_status(&self) -> Result<TopUpSettings, DomainError> {
        match self.gateway.fetch_status().await {
            Ok(settings) => {
                info!(
                    "Top-up settings synced: online={}, pay_type={:?}, min_topup={}",
                    settings.enable_online_topup, settings.pay_type, settings.min_topup
                );
                *self.settings.write().await = settings.clone();
                Ok(settings)
            }
            Err(e) => {
                self.report("Syncing top-up settings", &e);
                Err(e)
            }
        }
    }

    pub async fn set_redemption_code(&self, code: impl Into<String>) {
        self.state.lock().await.redemption_code = code.into();
    }

    /// Exchange the entered redemption code for quota
    ///
    /// Returns the quota that was added to the balance.
    #[instrument(skip(self))]
    pub async fn redeem(&self) -> Result<i64, DomainError> {
        let code = self.state.lock().await.redemption_code.trim().to_string();
        if code.is_empty() {
            let err = DomainError::EmptyRedemptionCode;
            self.report("Redemption", &err);
            return Err(err);
        }

        let Some(_guard) = InFlight::acquire(&self.redeeming) else {
            warn!("Redemption already in progress, ignoring");
            return Err(DomainError::InvalidState(
                "A redemption is already in progress".to_string(),
            ));
        };

        let delta = match self.gateway.redeem(&code).await {
            Ok(delta) => delta,
            Err(e) => {
                self.report("Redemption", &e);
                return Err(e);
            }
        };

        let applied = {
            let mut state = self.state.lock().await;
            let applied = state.wallet.apply_redemption(delta);
            if applied.is_ok() {
                state.redemption_code.clear();
            }
            applied
        };
        if let Err(e) = applied {
            self.report("Redemption", &e);
            return Err(e);
        }

        info!("Redemption succeeded, quota +{}", delta);
        self.notifier.notify(
            Notice::success("Redemption succeeded")
                .with_content(format!("Added {}", render_quota(delta))),
        );
        Ok(delta)
    }

    /// Link where redemption codes can be bought
    pub async fn open_top_up_link(&self) -> Result<String, DomainError> {
        let settings = self.settings.read().await;
        match settings.top_up_link() {
            Ok(link) => Ok(link.to_string()),
            Err(e) => {
                self.report("Opening the top-up link", &e);
                Err(e)
            }
        }
    }

    pub async fn set_top_up_code(&self, code: impl Into<String>) {
        self.state.lock().await.top_up_code = code.into();
    }

    /// Set the desired unit count and re-quote it
    ///
    /// Counts below one are clamped to one.
    pub async fn set_top_up_count(&self, count: i64) -> Result<AmountQuote, DomainError> {
        self.state.lock().await.top_up_count = normalize_count(count);
        self.quote().await
    }

    /// Ask the server what the current count costs
    ///
    /// Nothing reaches the server while online top-up is disabled or the
    /// count is below the configured minimum. Any failure resets the
    /// displayed amount to zero.
    #[instrument(skip(self))]
    pub async fn quote(&self) -> Result<AmountQuote, DomainError> {
        let (count, top_up_code) = {
            let state = self.state.lock().await;
            (state.top_up_count, state.top_up_code.clone())
        };
        let allowed = {
            let settings = self.settings.read().await;
            settings
                .ensure_online_enabled()
                .and_then(|_| ensure_minimum(count, settings.min_topup))
        };

        let result = match allowed {
            Ok(()) => self.gateway.quote_amount(count, &top_up_code).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(amount) => {
                let quote = AmountQuote { count, amount };
                self.state.lock().await.quote = quote;
                info!("Quoted {} units at {}", count, quote.render());
                Ok(quote)
            }
            Err(e) => {
                self.state.lock().await.quote = AmountQuote::zero(count);
                self.report("Quoting the amount", &e);
                Err(e)
            }
        }
    }

    /// Validate and price a top-up, then open the confirmation
    #[instrument(skip(self))]
    pub async fn pre_top_up(&self, method: PaymentMethod) -> Result<AmountQuote, DomainError> {
        let pay_type = {
            let settings = self.settings.read().await;
            let checked = settings.ensure_online_enabled().and_then(|_| {
                if settings.pay_type.supports(method) {
                    Ok(())
                } else {
                    Err(DomainError::PaymentMethodUnavailable(method.to_string()))
                }
            });
            if let Err(e) = checked {
                drop(settings);
                self.report("Top-up", &e);
                return Err(e);
            }
            settings.pay_type
        };

        let quote = self.quote().await?;

        let mut state = self.state.lock().await;
        state.pay_way = Some(method);
        state.confirm_open = true;
        info!(
            "Confirmation opened: {} units, {} via {} ({:?} mode)",
            quote.count,
            quote.render(),
            method,
            pay_type
        );
        Ok(quote)
    }

    pub async fn cancel_confirmation(&self) {
        let mut state = self.state.lock().await;
        state.confirm_open = false;
        state.pay_way = None;
    }

    /// Dispatch the confirmed top-up to the payment processor
    #[instrument(skip(self))]
    pub async fn confirm_top_up(&self) -> Result<PaymentOutcome, DomainError> {
        let Some(_guard) = InFlight::acquire(&self.paying) else {
            warn!("Payment request already in progress, ignoring");
            return Err(DomainError::InvalidState(
                "A payment request is already in progress".to_string(),
            ));
        };

        let (method, count, top_up_code, quote) = {
            let state = self.state.lock().await;
            (
                state.pay_way,
                state.top_up_count,
                state.top_up_code.clone(),
                state.quote,
            )
        };
        let Some(method) = method else {
            return Err(DomainError::InvalidState(
                "No payment method selected".to_string(),
            ));
        };

        if quote.is_zero() || quote.count != count {
            self.quote().await?;
        }

        let (pay_type, min_topup) = {
            let settings = self.settings.read().await;
            (settings.pay_type, settings.min_topup)
        };
        if let Err(e) = ensure_minimum(count, min_topup) {
            self.report("Top-up", &e);
            return Err(e);
        }

        self.state.lock().await.confirm_open = false;

        let request = TopUpRequest::new(count, top_up_code, method);
        let intent = match self.gateway.create_payment(pay_type, &request).await {
            Ok(intent) => intent,
            Err(e) => {
                self.report("Creating the payment", &e);
                return Err(e);
            }
        };

        match intent {
            PaymentIntent::Redirect(form) => match self.submitter.submit(&form).await {
                Ok(submitted) => {
                    info!("Payment form for {} submitted", form.action);
                    self.notifier.notify(Notice::info("Redirecting to payment"));
                    Ok(PaymentOutcome::Redirected(submitted))
                }
                Err(e) => {
                    self.report("Opening the payment page", &e);
                    Err(e)
                }
            },
            PaymentIntent::Qr { qr_url, order_id } => {
                let session = self.poller.start(order_id, qr_url).await;
                Ok(PaymentOutcome::AwaitingScan(session))
            }
        }
    }

    /// The user dismissed the payment dialog
    pub async fn close_payment_dialog(&self) -> bool {
        let cancelled = self.poller.cancel(CancelReason::DialogClosed).await;

        let mut state = self.state.lock().await;
        if let Some(session) = state.payment.as_mut() {
            if session.is_dialog_open() {
                session.close();
            }
        }
        cancelled
    }

    /// The dialog's own countdown reached zero
    pub async fn countdown_finished(&self) -> bool {
        self.poller.cancel(CancelReason::CountdownFinished).await
    }

    // Server text verbatim for business and validation failures, generic text for transport ones
    fn report(&self, action: &str, err: &DomainError) {
        match err {
            DomainError::Network(_) | DomainError::Deserialization(_) => {
                error!("{} failed: {}", action, err.format_with_code());
                self.notifier
                    .notify(Notice::error("Request failed").with_content(format!("{} failed", action)));
            }
            _ => {
                if err.is_client_side() {
                    info!("{} blocked: {}", action, err.format_with_code());
                } else {
                    warn!("{} failed: {}", action, err.format_with_code());
                }
                self.notifier.notify(Notice::from(err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use std::collections::BTreeMap;
    use walletdock_domain::checkout::{FormTarget, RedirectForm};
    use walletdock_domain::gateway::{OrderStatus, UserProfile};
    use walletdock_domain::notification::NoticeLevel;
    use walletdock_domain::payment_session::SessionStatus;
    use walletdock_domain::shared::OrderId;
    use walletdock_domain::top_up::PayType;
    use walletdock_infrastructure::notification::RecordingNotifier;

    mock! {
        Gateway {}
        #[async_trait]
        impl WalletGateway for Gateway {
            async fn fetch_profile(&self) -> Result<UserProfile, DomainError>;
            async fn redeem(&self, code: &str) -> Result<i64, DomainError>;
            async fn quote_amount(&self, count: i64, top_up_code: &str) -> Result<f64, DomainError>;
            async fn create_payment(
                &self,
                pay_type: PayType,
                request: &TopUpRequest,
            ) -> Result<PaymentIntent, DomainError>;
            async fn check_order(&self, order_id: &OrderId) -> Result<OrderStatus, DomainError>;
            async fn fetch_status(&self) -> Result<TopUpSettings, DomainError>;
        }
    }

    mock! {
        Submitter {}
        #[async_trait]
        impl FormSubmitter for Submitter {
            async fn submit(&self, form: &RedirectForm) -> Result<SubmittedForm, DomainError>;
        }
    }

    fn online(pay_type: PayType) -> TopUpSettings {
        TopUpSettings {
            top_up_link: "https://shop.example.com".to_string(),
            min_topup: 1,
            enable_online_topup: true,
            pay_type,
        }
    }

    fn service(
        gateway: MockGateway,
        submitter: MockSubmitter,
        settings: TopUpSettings,
    ) -> (WalletService, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let service = WalletService::new(
            Arc::new(gateway),
            notifier.clone(),
            Arc::new(submitter),
            settings,
            PollPolicy::default(),
        );
        (service, notifier)
    }

    #[tokio::test]
    async fn test_load_balance_sets_quota() {
        let mut gateway = MockGateway::new();
        gateway.expect_fetch_profile().times(1).returning(|| {
            Ok(UserProfile {
                quota: 1_000_000,
                used_quota: 0,
                username: None,
            })
        });
        let (service, _) = service(gateway, MockSubmitter::new(), TopUpSettings::default());

        assert_eq!(service.load_balance().await.unwrap(), 1_000_000);
        let state = service.snapshot().await;
        assert!(state.wallet.is_loaded());
        assert_eq!(state.wallet.render(), "$2.00");
    }

    #[tokio::test]
    async fn test_redeem_adds_quota_and_clears_code() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_redeem()
            .withf(|code| code.to_string() == "ABC123")
            .times(1)
            .returning(|_| Ok(500));
        let (service, notifier) = service(gateway, MockSubmitter::new(), TopUpSettings::default());
        service.state.lock().await.wallet.load(1_000);

        service.set_redemption_code("ABC123").await;
        assert_eq!(service.redeem().await.unwrap(), 500);

        let state = service.snapshot().await;
        assert_eq!(state.wallet.quota(), 1_500);
        assert!(state.redemption_code.is_empty());
        assert_eq!(notifier.count(NoticeLevel::Success), 1);
    }

    #[tokio::test]
    async fn test_redeem_rejection_leaves_balance_and_shows_message() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_redeem()
            .returning(|_| Err(DomainError::Rejected("该兑换码已被使用".to_string())));
        let (service, notifier) = service(gateway, MockSubmitter::new(), TopUpSettings::default());
        service.state.lock().await.wallet.load(1_000);

        service.set_redemption_code("USED").await;
        assert!(service.redeem().await.is_err());

        let state = service.snapshot().await;
        assert_eq!(state.wallet.quota(), 1_000);
        assert_eq!(state.redemption_code, "USED");
        assert_eq!(notifier.last().unwrap().title, "该兑换码已被使用");
    }

    #[tokio::test]
    async fn test_redeem_network_failure_is_generic() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_redeem()
            .returning(|_| Err(DomainError::Network("connection reset".to_string())));
        let (service, notifier) = service(gateway, MockSubmitter::new(), TopUpSettings::default());

        service.set_redemption_code("ABC123").await;
        assert!(service.redeem().await.is_err());

        let notice = notifier.last().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.title, "Request failed");
        // The guard is released on failure
        assert!(!service.redeeming.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_empty_code_never_reaches_server() {
        let mut gateway = MockGateway::new();
        gateway.expect_redeem().never();
        let (service, notifier) = service(gateway, MockSubmitter::new(), TopUpSettings::default());

        service.set_redemption_code("   ").await;
        assert_eq!(
            service.redeem().await.unwrap_err(),
            DomainError::EmptyRedemptionCode
        );
        assert_eq!(notifier.count(NoticeLevel::Info), 1);
    }

    #[tokio::test]
    async fn test_redeem_rejected_while_in_flight() {
        let mut gateway = MockGateway::new();
        gateway.expect_redeem().never();
        let (service, _) = service(gateway, MockSubmitter::new(), TopUpSettings::default());
        service.set_redemption_code("ABC123").await;

        let _held = InFlight::acquire(&service.redeeming).unwrap();
        assert!(matches!(
            service.redeem().await,
            Err(DomainError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_quote_count_five_renders_ten_yuan() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_quote_amount()
            .withf(|count, code| *count == 5 && code.is_empty())
            .times(1)
            .returning(|_, _| Ok(10.0));
        let (service, _) = service(gateway, MockSubmitter::new(), online(PayType::Wx));

        let quote = service.set_top_up_count(5).await.unwrap();
        assert_eq!(quote.render(), "10元");
        assert_eq!(service.snapshot().await.quote.render(), "10元");
    }

    #[tokio::test]
    async fn test_quote_below_minimum_skips_server() {
        let mut gateway = MockGateway::new();
        gateway.expect_quote_amount().never();
        let mut settings = online(PayType::Wx);
        settings.min_topup = 10;
        let (service, _) = service(gateway, MockSubmitter::new(), settings);

        service.state.lock().await.top_up_count = 5;
        assert_eq!(
            service.quote().await.unwrap_err(),
            DomainError::BelowMinimumTopUp { minimum: 10 }
        );
        assert!(service.snapshot().await.quote.is_zero());
    }

    #[tokio::test]
    async fn test_quote_skips_server_when_online_disabled() {
        let mut gateway = MockGateway::new();
        gateway.expect_quote_amount().never();
        let (service, notifier) = service(gateway, MockSubmitter::new(), TopUpSettings::default());

        assert_eq!(
            service.set_top_up_count(5).await.unwrap_err(),
            DomainError::OnlineTopUpDisabled
        );
        let state = service.snapshot().await;
        assert_eq!(state.top_up_count, 5);
        assert!(state.quote.is_zero());
        assert_eq!(notifier.count(NoticeLevel::Warning), 1);
    }

    #[tokio::test]
    async fn test_quote_failure_resets_amount() {
        let mut gateway = MockGateway::new();
        let mut calls = 0;
        gateway.expect_quote_amount().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Ok(10.0)
            } else {
                Err(DomainError::Rejected("充值数量不能小于 10".to_string()))
            }
        });
        let (service, notifier) = service(gateway, MockSubmitter::new(), online(PayType::Wx));

        service.set_top_up_count(5).await.unwrap();
        assert!(service.set_top_up_count(6).await.is_err());

        assert!(service.snapshot().await.quote.is_zero());
        assert_eq!(notifier.last().unwrap().title, "充值数量不能小于 10");
    }

    #[tokio::test]
    async fn test_count_below_one_is_clamped() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_quote_amount()
            .withf(|count, code| *count == 1 && code.is_empty())
            .returning(|_, _| Ok(2.0));
        let (service, _) = service(gateway, MockSubmitter::new(), online(PayType::Wx));

        service.set_top_up_count(-3).await.unwrap();
        assert_eq!(service.snapshot().await.top_up_count, 1);
    }

    #[tokio::test]
    async fn test_pre_top_up_requires_online_top_up() {
        let mut gateway = MockGateway::new();
        gateway.expect_quote_amount().never();
        let (service, _) = service(gateway, MockSubmitter::new(), TopUpSettings::default());

        assert_eq!(
            service.pre_top_up(PaymentMethod::WeChat).await.unwrap_err(),
            DomainError::OnlineTopUpDisabled
        );
        assert!(!service.snapshot().await.confirm_open);
    }

    #[tokio::test]
    async fn test_alipay_unavailable_in_qr_mode() {
        let mut gateway = MockGateway::new();
        gateway.expect_quote_amount().never();
        let (service, _) = service(gateway, MockSubmitter::new(), online(PayType::Wx));

        assert!(matches!(
            service.pre_top_up(PaymentMethod::Alipay).await,
            Err(DomainError::PaymentMethodUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_pre_top_up_opens_confirmation_and_cancel_closes_it() {
        let mut gateway = MockGateway::new();
        gateway.expect_quote_amount().returning(|_, _| Ok(2.0));
        let (service, _) = service(gateway, MockSubmitter::new(), online(PayType::Easy));

        service.pre_top_up(PaymentMethod::Alipay).await.unwrap();
        let state = service.snapshot().await;
        assert!(state.confirm_open);
        assert_eq!(state.pay_way, Some(PaymentMethod::Alipay));

        service.cancel_confirmation().await;
        let state = service.snapshot().await;
        assert!(!state.confirm_open);
        assert_eq!(state.pay_way, None);
    }

    #[tokio::test]
    async fn test_confirm_redirect_hands_form_to_submitter() {
        let mut gateway = MockGateway::new();
        gateway.expect_quote_amount().returning(|_, _| Ok(2.0));
        gateway
            .expect_create_payment()
            .withf(|pay_type, request| {
                *pay_type == PayType::Easy
                    && request.count() == 1
                    && request.method() == PaymentMethod::Alipay
            })
            .times(1)
            .returning(|_, _| {
                let mut fields = BTreeMap::new();
                fields.insert("out_trade_no".to_string(), "USR1NOabc".to_string());
                Ok(PaymentIntent::Redirect(RedirectForm::new(
                    "https://epay.example.com/submit.php",
                    fields,
                )))
            });
        gateway.expect_check_order().never();

        let mut submitter = MockSubmitter::new();
        submitter
            .expect_submit()
            .withf(|form| form.action == "https://epay.example.com/submit.php")
            .times(1)
            .returning(|_| {
                Ok(SubmittedForm {
                    target: FormTarget::NewContext,
                    location: None,
                })
            });
        let (service, _) = service(gateway, submitter, online(PayType::Easy));

        service.pre_top_up(PaymentMethod::Alipay).await.unwrap();
        let outcome = service.confirm_top_up().await.unwrap();

        assert!(matches!(outcome, PaymentOutcome::Redirected(_)));
        assert!(!service.snapshot().await.confirm_open);
        assert!(!service.poller().is_polling().await);
    }

    #[tokio::test]
    async fn test_confirm_qr_opens_dialog_and_close_stops_polling() {
        let mut gateway = MockGateway::new();
        gateway.expect_quote_amount().returning(|_, _| Ok(2.0));
        gateway.expect_create_payment().times(1).returning(|_, _| {
            Ok(PaymentIntent::Qr {
                qr_url: "weixin://wxpay/bizpayurl?pr=Qr0".to_string(),
                order_id: OrderId::from_string("USR1NOqr"),
            })
        });
        gateway
            .expect_check_order()
            .returning(|_| Ok(OrderStatus::Pending));
        let (service, _) = service(gateway, MockSubmitter::new(), online(PayType::Wx));

        service.pre_top_up(PaymentMethod::WeChat).await.unwrap();
        let PaymentOutcome::AwaitingScan(session) = service.confirm_top_up().await.unwrap() else {
            panic!("expected a QR session");
        };
        assert_eq!(session.order_id().as_str(), "USR1NOqr");
        assert!(service.poller().is_polling().await);

        assert!(service.close_payment_dialog().await);
        assert!(!service.poller().is_polling().await);
        let payment = service.snapshot().await.payment.unwrap();
        assert_eq!(payment.status(), SessionStatus::Closed);
        assert!(!payment.is_dialog_open());
    }

    #[tokio::test]
    async fn test_confirm_without_method_is_rejected() {
        let mut gateway = MockGateway::new();
        gateway.expect_create_payment().never();
        let (service, _) = service(gateway, MockSubmitter::new(), online(PayType::Wx));

        assert!(matches!(
            service.confirm_top_up().await,
            Err(DomainError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_top_up_link_requires_configuration() {
        let (service, notifier) = service(
            MockGateway::new(),
            MockSubmitter::new(),
            TopUpSettings::default(),
        );
        assert!(matches!(
            service.open_top_up_link().await,
            Err(DomainError::Configuration(_))
        ));
        assert_eq!(notifier.count(NoticeLevel::Error), 1);

        let mut gateway = MockGateway::new();
        gateway
            .expect_fetch_status()
            .returning(|| Ok(online(PayType::Easy)));
        let (service, _) = self::service(gateway, MockSubmitter::new(), TopUpSettings::default());
        service.sync_status().await.unwrap();
        assert_eq!(
            service.open_top_up_link().await.unwrap(),
            "https://shop.example.com"
        );
    }
}
