use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trade_core::{ApiError, ApiResult, DashboardModel, Stock, TradeSide, TradingApi};

use crate::command::Command;
use crate::draft::TradeDraft;
use crate::render::{BusyGuard, Renderer, Toast};
use crate::router::{Route, Section, Ticket, ViewRouter};
use crate::session::SessionStore;

/// Fixed demo account balance. The backend exposes no balance endpoint;
/// the dashboard's balance load resolves locally to this constant.
const DEMO_BALANCE: Decimal = dec!(100000);

const NO_TRADE_OPEN: &str = "No trade is open. Use trade <symbol> first.";

/// Coordinates session, routing, drafts and data loading. All state the
/// handlers touch lives here; there are no ambient globals.
pub struct App {
    session: SessionStore,
    router: ViewRouter,
    draft: Option<TradeDraft>,
    /// Price snapshot backing trade drafts, refreshed whenever the stock
    /// catalog renders. May lag the backend's execution price.
    stocks: Vec<Stock>,
    api: Arc<dyn TradingApi>,
    renderer: Arc<dyn Renderer>,
}

impl App {
    pub fn new(session: SessionStore, api: Arc<dyn TradingApi>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            session,
            router: ViewRouter::new(),
            draft: None,
            stocks: Vec::new(),
            api,
            renderer,
        }
    }

    /// Initial paint: dashboard for a persisted session, login otherwise.
    pub async fn start(&mut self) {
        if self.session.is_authenticated() {
            self.activate(Section::Dashboard).await;
        } else {
            self.renderer.show_login();
        }
    }

    pub async fn handle(&mut self, command: Command) {
        match command {
            Command::Login { username, password } => self.sign_in(&username, &password, false).await,
            Command::Register { username, password } => self.sign_in(&username, &password, true).await,
            Command::Navigate(section) => self.activate(section).await,
            Command::OpenTrade { symbol, side } => self.open_trade(&symbol, side),
            Command::Side(side) => self.edit_draft(|draft| draft.set_side(side)),
            Command::Quantity(raw) => self.edit_draft(|draft| draft.set_quantity_input(&raw)),
            Command::Submit => self.submit_trade().await,
            Command::Cancel => self.cancel_trade(),
            Command::Logout => self.logout(),
            Command::Refresh => self.activate(self.router.active()).await,
            // Handled by the input loop before commands reach the app.
            Command::Help | Command::Quit => {}
        }
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    async fn sign_in(&mut self, username: &str, password: &str, register: bool) {
        let result = {
            let _busy = BusyGuard::begin(&self.renderer);
            if register {
                self.api.register(username, password).await
            } else {
                self.api.login(username, password).await
            }
        };

        match result {
            Ok(token) => {
                self.session.set_token(&token);
                let message = if register {
                    "Account created. Welcome!"
                } else {
                    "Welcome back!"
                };
                self.renderer.toast(Toast::Success, message);
                self.activate(Section::Dashboard).await;
            }
            Err(err) => {
                tracing::warn!("Sign-in failed: {}", err);
                self.renderer.toast(Toast::Error, &err.user_message());
            }
        }
    }

    fn logout(&mut self) {
        self.session.clear();
        self.draft = None;
        self.renderer.toast(Toast::Info, "Logged out");
        self.renderer.show_login();
    }

    /// The backend refused the bearer token: the persisted session is dead
    /// and the user has to sign in again.
    fn expire_session(&mut self) {
        self.session.clear();
        self.draft = None;
        self.renderer
            .toast(Toast::Error, &ApiError::Unauthorized.user_message());
        self.renderer.show_login();
    }

    fn bearer(&self) -> Option<String> {
        let token = self.session.token().map(str::to_string);
        if token.is_none() {
            self.renderer.show_login();
        }
        token
    }

    // -----------------------------------------------------------------------
    // Navigation and loading
    // -----------------------------------------------------------------------

    async fn activate(&mut self, section: Section) {
        match self.router.activate(section, self.session.is_authenticated()) {
            Route::Login => self.renderer.show_login(),
            Route::Activated(ticket) => {
                self.renderer.show_section(section);
                let _busy = BusyGuard::begin(&self.renderer);
                match section {
                    Section::Dashboard => self.load_dashboard(ticket).await,
                    Section::Stocks => self.load_stocks(ticket).await,
                    Section::Portfolio => self.load_portfolio(ticket).await,
                    Section::History => self.load_history(ticket).await,
                }
            }
        }
    }

    async fn load_stocks(&mut self, ticket: Ticket) {
        match self.api.list_stocks().await {
            Ok(stocks) => {
                if !self.router.is_current(ticket) {
                    tracing::debug!("Discarding stale stock list");
                    return;
                }
                self.stocks = stocks;
                self.renderer.render_stocks(&self.stocks);
            }
            Err(err) => {
                tracing::warn!("Stock list load failed: {}", err);
                self.renderer.toast(Toast::Error, &err.user_message());
                if self.router.is_current(ticket) {
                    self.renderer.render_stocks(&[]);
                }
            }
        }
    }

    async fn load_portfolio(&mut self, ticket: Ticket) {
        let Some(token) = self.bearer() else { return };
        match self.api.portfolio(&token).await {
            Ok(positions) => {
                if self.router.is_current(ticket) {
                    self.renderer.render_portfolio(&positions);
                }
            }
            Err(err) => self.fail("Portfolio load failed", &err),
        }
    }

    async fn load_history(&mut self, ticket: Ticket) {
        let Some(token) = self.bearer() else { return };
        match self.api.history(&token).await {
            Ok(trades) => {
                if self.router.is_current(ticket) {
                    self.renderer.render_history(&trades);
                }
            }
            Err(err) => self.fail("History load failed", &err),
        }
    }

    async fn load_dashboard(&mut self, ticket: Ticket) {
        let Some(token) = self.bearer() else { return };

        // Three independent loads; one failing must not block the others,
        // so join rather than short-circuit.
        let (portfolio, history, balance) = tokio::join!(
            self.api.portfolio(&token),
            self.api.history(&token),
            demo_balance(),
        );

        let mut expired = false;
        let portfolio = self.unpack("Portfolio load failed", portfolio, &mut expired);
        let history = self.unpack("History load failed", history, &mut expired);
        let balance = self.unpack("Balance load failed", balance, &mut expired);

        if expired {
            self.expire_session();
            return;
        }
        if !self.router.is_current(ticket) {
            tracing::debug!("Discarding stale dashboard data");
            return;
        }

        let model = DashboardModel::compute(balance, portfolio.as_deref(), history.as_deref());
        self.renderer.render_dashboard(&model);
    }

    /// Per-load guard for the dashboard fan-out: a failure toasts and
    /// yields `None` for its card only. Auth expiry is deferred so a 401
    /// on two loads at once still tears the session down exactly once.
    fn unpack<T>(&self, context: &str, result: ApiResult<T>, expired: &mut bool) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("{}: {}", context, err);
                if err.is_auth_expiry() {
                    *expired = true;
                } else {
                    self.renderer.toast(Toast::Error, &err.user_message());
                }
                None
            }
        }
    }

    fn fail(&mut self, context: &str, err: &ApiError) {
        tracing::warn!("{}: {}", context, err);
        if err.is_auth_expiry() {
            self.expire_session();
        } else {
            self.renderer.toast(Toast::Error, &err.user_message());
        }
    }

    // -----------------------------------------------------------------------
    // Trading
    // -----------------------------------------------------------------------

    fn open_trade(&mut self, symbol: &str, side: TradeSide) {
        let found = self
            .stocks
            .iter()
            .find(|stock| stock.symbol.eq_ignore_ascii_case(symbol));
        let Some(stock) = found else {
            self.renderer.toast(
                Toast::Error,
                &format!("Unknown symbol {symbol}. Open the stocks view to see what trades."),
            );
            return;
        };

        let draft = TradeDraft::open(stock.clone(), side);
        self.renderer.render_draft(&draft);
        self.draft = Some(draft);
    }

    fn edit_draft(&mut self, edit: impl FnOnce(&mut TradeDraft)) {
        match self.draft.as_mut() {
            Some(draft) => {
                edit(draft);
                self.renderer.render_draft(draft);
            }
            None => self.renderer.toast(Toast::Info, NO_TRADE_OPEN),
        }
    }

    async fn submit_trade(&mut self) {
        let Some(draft) = self.draft.as_ref() else {
            self.renderer.toast(Toast::Info, NO_TRADE_OPEN);
            return;
        };
        // Zero-quantity drafts are refused here, before any network call.
        let order = match draft.order() {
            Ok(order) => order,
            Err(err) => {
                self.renderer.toast(Toast::Error, &err.user_message());
                return;
            }
        };
        let Some(token) = self.bearer() else { return };

        let result = {
            let _busy = BusyGuard::begin(&self.renderer);
            self.api.submit_trade(&token, &order).await
        };

        match result {
            Ok(confirmation) => {
                let verb = match order.side {
                    TradeSide::Buy => "Bought",
                    TradeSide::Sell => "Sold",
                };
                self.renderer.toast(
                    Toast::Success,
                    &format!(
                        "{verb} {} shares of {}",
                        confirmation.quantity, confirmation.symbol
                    ),
                );
                self.draft = None;
                self.activate(self.router.active()).await;
            }
            Err(err) => self.fail("Trade submission failed", &err),
        }
    }

    fn cancel_trade(&mut self) {
        if self.draft.take().is_some() {
            self.renderer.toast(Toast::Info, "Trade cancelled");
        }
    }
}

async fn demo_balance() -> ApiResult<Decimal> {
    Ok(DEMO_BALANCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use trade_core::{PortfolioPosition, TradeConfirmation, TradeOrder, TradeRecord};

    // -------------------------------------------------------------------
    // Doubles
    // -------------------------------------------------------------------

    #[derive(Default)]
    struct StubApi {
        stocks_error: Option<ApiError>,
        portfolio_error: Option<ApiError>,
        history_error: Option<ApiError>,
        /// Gateway method names, in call order.
        calls: Mutex<Vec<&'static str>>,
        /// Bearer tokens handed to authenticated calls.
        tokens_seen: Mutex<Vec<String>>,
    }

    impl StubApi {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn record_token(&self, token: &str) {
            self.tokens_seen.lock().unwrap().push(token.to_string());
        }

        fn count(&self, call: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
        }
    }

    #[async_trait]
    impl TradingApi for StubApi {
        async fn login(&self, _username: &str, _password: &str) -> ApiResult<String> {
            self.record("login");
            Ok("tok-alice".to_string())
        }

        async fn register(&self, _username: &str, _password: &str) -> ApiResult<String> {
            self.record("register");
            Ok("tok-new".to_string())
        }

        async fn list_stocks(&self) -> ApiResult<Vec<Stock>> {
            self.record("list_stocks");
            match &self.stocks_error {
                Some(err) => Err(err.clone()),
                None => Ok(vec![apple()]),
            }
        }

        async fn portfolio(&self, token: &str) -> ApiResult<Vec<PortfolioPosition>> {
            self.record("portfolio");
            self.record_token(token);
            match &self.portfolio_error {
                Some(err) => Err(err.clone()),
                None => Ok(vec![PortfolioPosition {
                    symbol: "AAPL".to_string(),
                    quantity: 3,
                    avg_price: dec!(150.00),
                }]),
            }
        }

        async fn history(&self, token: &str) -> ApiResult<Vec<TradeRecord>> {
            self.record("history");
            self.record_token(token);
            match &self.history_error {
                Some(err) => Err(err.clone()),
                None => Ok(vec![TradeRecord {
                    id: 1,
                    symbol: "AAPL".to_string(),
                    side: TradeSide::Buy,
                    quantity: 3,
                    price: dec!(150.00),
                    timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap(),
                }]),
            }
        }

        async fn submit_trade(&self, token: &str, order: &TradeOrder) -> ApiResult<TradeConfirmation> {
            self.record("submit_trade");
            self.record_token(token);
            Ok(TradeConfirmation {
                id: 7,
                symbol: order.symbol.clone(),
                quantity: order.quantity,
                price: order.price,
                timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap(),
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Painted {
        Login,
        Section(Section),
        Stocks(usize),
        Portfolio(usize),
        History(usize),
        Dashboard {
            balance: bool,
            portfolio: bool,
            history: bool,
        },
        Draft {
            quantity: u32,
            cost: Decimal,
        },
        Toast(Toast, String),
        Busy(bool),
    }

    #[derive(Default)]
    struct RecordingRenderer {
        painted: Mutex<Vec<Painted>>,
    }

    impl RecordingRenderer {
        fn painted(&self) -> Vec<Painted> {
            self.painted.lock().unwrap().clone()
        }

        fn push(&self, event: Painted) {
            self.painted.lock().unwrap().push(event);
        }

        fn error_toasts(&self) -> usize {
            self.painted()
                .iter()
                .filter(|e| matches!(e, Painted::Toast(Toast::Error, _)))
                .count()
        }
    }

    impl Renderer for RecordingRenderer {
        fn show_login(&self) {
            self.push(Painted::Login);
        }

        fn show_section(&self, section: Section) {
            self.push(Painted::Section(section));
        }

        fn render_stocks(&self, stocks: &[Stock]) {
            self.push(Painted::Stocks(stocks.len()));
        }

        fn render_portfolio(&self, positions: &[PortfolioPosition]) {
            self.push(Painted::Portfolio(positions.len()));
        }

        fn render_history(&self, trades: &[TradeRecord]) {
            self.push(Painted::History(trades.len()));
        }

        fn render_dashboard(&self, model: &DashboardModel) {
            self.push(Painted::Dashboard {
                balance: model.balance.is_some(),
                portfolio: model.portfolio_value.is_some(),
                history: model.total_trades.is_some(),
            });
        }

        fn render_draft(&self, draft: &TradeDraft) {
            self.push(Painted::Draft {
                quantity: draft.quantity(),
                cost: draft.cost(),
            });
        }

        fn toast(&self, kind: Toast, message: &str) {
            self.push(Painted::Toast(kind, message.to_string()));
        }

        fn set_busy(&self, busy: bool) {
            self.push(Painted::Busy(busy));
        }
    }

    // -------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------

    fn apple() -> Stock {
        Stock {
            symbol: "AAPL".to_string(),
            name: "Apple Inc.".to_string(),
            price: dec!(150.00),
        }
    }

    fn temp_session_path() -> PathBuf {
        std::env::temp_dir().join(format!("tradesim-app-{}", uuid::Uuid::new_v4()))
    }

    fn app_with(api: Arc<StubApi>, renderer: Arc<RecordingRenderer>, token: Option<&str>) -> App {
        let mut session = SessionStore::load(temp_session_path());
        if let Some(token) = token {
            session.set_token(token);
        }
        App::new(session, api as Arc<dyn TradingApi>, renderer as Arc<dyn Renderer>)
    }

    async fn open_apple_draft(app: &mut App) {
        app.handle(Command::Navigate(Section::Stocks)).await;
        app.handle(Command::OpenTrade {
            symbol: "AAPL".to_string(),
            side: TradeSide::Buy,
        })
        .await;
    }

    // -------------------------------------------------------------------
    // Flows
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn startup_with_a_persisted_session_lands_on_the_dashboard() {
        let api = Arc::new(StubApi::default());
        let renderer = Arc::new(RecordingRenderer::default());
        let mut app = app_with(api.clone(), renderer.clone(), Some("tok-1"));

        app.start().await;

        assert!(renderer
            .painted()
            .contains(&Painted::Section(Section::Dashboard)));
        assert_eq!(api.count("portfolio"), 1);
        assert_eq!(api.count("history"), 1);
    }

    #[tokio::test]
    async fn startup_without_a_session_shows_login_and_calls_nothing() {
        let api = Arc::new(StubApi::default());
        let renderer = Arc::new(RecordingRenderer::default());
        let mut app = app_with(api.clone(), renderer.clone(), None);

        app.start().await;

        assert_eq!(renderer.painted(), vec![Painted::Login]);
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dashboard_fans_out_three_loads() {
        let api = Arc::new(StubApi::default());
        let renderer = Arc::new(RecordingRenderer::default());
        let mut app = app_with(api.clone(), renderer.clone(), Some("tok-1"));

        app.handle(Command::Navigate(Section::Dashboard)).await;

        assert_eq!(api.count("portfolio"), 1);
        assert_eq!(api.count("history"), 1);
        assert!(renderer.painted().contains(&Painted::Dashboard {
            balance: true,
            portfolio: true,
            history: true,
        }));
    }

    #[tokio::test]
    async fn one_dashboard_failure_does_not_contaminate_the_others() {
        let api = Arc::new(StubApi {
            portfolio_error: Some(ApiError::Network("connection refused".to_string())),
            ..Default::default()
        });
        let renderer = Arc::new(RecordingRenderer::default());
        let mut app = app_with(api.clone(), renderer.clone(), Some("tok-1"));

        app.handle(Command::Navigate(Section::Dashboard)).await;

        assert!(renderer.painted().contains(&Painted::Dashboard {
            balance: true,
            portfolio: false,
            history: true,
        }));
        assert_eq!(renderer.error_toasts(), 1);
    }

    #[tokio::test]
    async fn login_token_flows_into_authenticated_calls() {
        let api = Arc::new(StubApi::default());
        let renderer = Arc::new(RecordingRenderer::default());
        let mut app = app_with(api.clone(), renderer.clone(), None);

        app.handle(Command::Login {
            username: "alice".to_string(),
            password: "s3cret".to_string(),
        })
        .await;

        // Login lands on the dashboard, whose loads carry the fresh token.
        let tokens = api.tokens_seen.lock().unwrap().clone();
        assert!(!tokens.is_empty());
        assert!(tokens.iter().all(|t| t == "tok-alice"));
    }

    #[tokio::test]
    async fn unauthenticated_navigation_routes_to_login() {
        let api = Arc::new(StubApi::default());
        let renderer = Arc::new(RecordingRenderer::default());
        let mut app = app_with(api.clone(), renderer.clone(), None);

        app.handle(Command::Navigate(Section::Portfolio)).await;

        assert_eq!(renderer.painted(), vec![Painted::Login]);
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_response_expires_the_session() {
        let api = Arc::new(StubApi {
            portfolio_error: Some(ApiError::Unauthorized),
            ..Default::default()
        });
        let renderer = Arc::new(RecordingRenderer::default());
        let mut app = app_with(api.clone(), renderer.clone(), Some("tok-stale"));

        app.handle(Command::Navigate(Section::Portfolio)).await;
        assert!(renderer.painted().contains(&Painted::Login));

        // The session is gone: navigating again never reaches the gateway.
        app.handle(Command::Navigate(Section::Portfolio)).await;
        assert_eq!(api.count("portfolio"), 1);
    }

    #[tokio::test]
    async fn stocks_network_failure_renders_an_empty_list() {
        let api = Arc::new(StubApi {
            stocks_error: Some(ApiError::Network("connection refused".to_string())),
            ..Default::default()
        });
        let renderer = Arc::new(RecordingRenderer::default());
        let mut app = app_with(api.clone(), renderer.clone(), Some("tok-1"));

        app.handle(Command::Navigate(Section::Stocks)).await;

        let painted = renderer.painted();
        assert!(painted.contains(&Painted::Stocks(0)));
        assert_eq!(renderer.error_toasts(), 1);
    }

    #[tokio::test]
    async fn busy_indicator_clears_on_failure_too() {
        let api = Arc::new(StubApi {
            stocks_error: Some(ApiError::Network("timeout".to_string())),
            ..Default::default()
        });
        let renderer = Arc::new(RecordingRenderer::default());
        let mut app = app_with(api.clone(), renderer.clone(), Some("tok-1"));

        app.handle(Command::Navigate(Section::Stocks)).await;

        let painted = renderer.painted();
        let on = painted.iter().position(|e| *e == Painted::Busy(true));
        let off = painted.iter().position(|e| *e == Painted::Busy(false));
        assert!(on.is_some());
        assert!(off > on);
    }

    #[tokio::test]
    async fn draft_edits_rerender_the_cost_preview() {
        let api = Arc::new(StubApi::default());
        let renderer = Arc::new(RecordingRenderer::default());
        let mut app = app_with(api.clone(), renderer.clone(), Some("tok-1"));

        open_apple_draft(&mut app).await;
        app.handle(Command::Quantity("3".to_string())).await;

        assert!(renderer.painted().contains(&Painted::Draft {
            quantity: 3,
            cost: dec!(450.00),
        }));
    }

    #[tokio::test]
    async fn zero_quantity_submit_never_reaches_the_gateway() {
        let api = Arc::new(StubApi::default());
        let renderer = Arc::new(RecordingRenderer::default());
        let mut app = app_with(api.clone(), renderer.clone(), Some("tok-1"));

        open_apple_draft(&mut app).await;
        app.handle(Command::Submit).await;

        assert_eq!(api.count("submit_trade"), 0);
        assert_eq!(renderer.error_toasts(), 1);
    }

    #[tokio::test]
    async fn successful_submit_discards_the_draft_and_reloads_the_view() {
        let api = Arc::new(StubApi::default());
        let renderer = Arc::new(RecordingRenderer::default());
        let mut app = app_with(api.clone(), renderer.clone(), Some("tok-1"));

        open_apple_draft(&mut app).await;
        app.handle(Command::Quantity("3".to_string())).await;
        app.handle(Command::Submit).await;

        assert_eq!(api.count("submit_trade"), 1);
        // The active stocks view reloads after the trade lands.
        assert_eq!(api.count("list_stocks"), 2);

        // The draft is gone; a second submit has nothing to send.
        app.handle(Command::Submit).await;
        assert_eq!(api.count("submit_trade"), 1);
    }

    #[tokio::test]
    async fn opening_a_trade_requires_a_listed_symbol() {
        let api = Arc::new(StubApi::default());
        let renderer = Arc::new(RecordingRenderer::default());
        let mut app = app_with(api.clone(), renderer.clone(), Some("tok-1"));

        // No stock list loaded yet, so nothing is tradable.
        app.handle(Command::OpenTrade {
            symbol: "AAPL".to_string(),
            side: TradeSide::Buy,
        })
        .await;

        assert_eq!(renderer.error_toasts(), 1);
        assert!(!renderer
            .painted()
            .iter()
            .any(|e| matches!(e, Painted::Draft { .. })));
    }

    #[tokio::test]
    async fn logout_clears_the_session_and_shows_login() {
        let api = Arc::new(StubApi::default());
        let renderer = Arc::new(RecordingRenderer::default());
        let mut app = app_with(api.clone(), renderer.clone(), Some("tok-1"));

        app.handle(Command::Logout).await;
        assert!(renderer.painted().contains(&Painted::Login));

        app.handle(Command::Navigate(Section::Dashboard)).await;
        assert_eq!(api.count("portfolio"), 0);
    }
}
