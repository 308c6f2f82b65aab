//! Server API tests

use super::*;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
};
use chrono::{Datelike, Duration as ChronoDuration, Local, Utc};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use spendwise_core::ai::MockBackend;
use spendwise_core::auth::hash_password;
use spendwise_core::models::{Category, NewExpense, PeriodKind};
use spendwise_core::test_utils::{MockOllamaServer, MOCK_INSIGHT};
use std::net::SocketAddr;
use tower::ServiceExt;

const PASSWORD: &str = "secret123";

fn test_config() -> ServerConfig {
    ServerConfig {
        access_token_secret: "test-access-secret".into(),
        refresh_token_secret: "test-refresh-secret".into(),
        secure_cookies: false,
        ..Default::default()
    }
}

struct TestApp {
    app: Router,
    db: Database,
    state: Arc<AppState>,
}

impl TestApp {
    fn new() -> Self {
        Self::with(test_config(), AIClient::mock())
    }

    fn with(config: ServerConfig, ai: AIClient) -> Self {
        let db = Database::in_memory().unwrap();
        let state = build_state(db.clone(), config, ai);
        Self {
            app: router_from_state(state.clone()),
            db,
            state,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Create a user directly and return (id, access token)
    fn user(&self, email: &str) -> (i64, String) {
        let hash = hash_password(PASSWORD).unwrap();
        let user = self.db.create_user("Test User", email, &hash).unwrap();
        let token = self.state.tokens.sign(TokenKind::Access, user.id).unwrap();
        (user.id, token)
    }

    fn expense(&self, user_id: i64, amount: i64, category: Category) -> i64 {
        self.db
            .create_expense(
                user_id,
                &NewExpense {
                    amount: Decimal::from(amount),
                    category,
                    description: None,
                    date: Some(Local::now().date_naive()),
                },
            )
            .unwrap()
            .id
    }
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn send_json(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn from_ip(mut request: Request<Body>, ip: [u8; 4]) -> Request<Body> {
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((ip, 40000))));
    request
}

async fn get_body_json(response: Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

fn set_cookie(response: &Response) -> String {
    response
        .headers()
        .get("set-cookie")
        .expect("set-cookie header")
        .to_str()
        .unwrap()
        .to_string()
}

/// `name=value` part of a Set-Cookie header
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

// ========== Auth API Tests ==========

#[tokio::test]
async fn test_register_returns_tokens() {
    let t = TestApp::new();

    let response = t
        .send(send_json(
            "POST",
            "/api/auth/register",
            None,
            serde_json::json!({"name": "Asha", "email": "Asha@Example.com", "password": PASSWORD}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("refreshToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));

    let json = get_body_json(response).await;
    assert_eq!(json["message"], "User registered successfully");
    assert_eq!(json["user"]["email"], "asha@example.com");
    assert!(json["accessToken"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(json["user"].get("password").is_none());
}

#[tokio::test]
async fn test_signup_alias() {
    let t = TestApp::new();
    let response = t
        .send(send_json(
            "POST",
            "/api/auth/signup",
            None,
            serde_json::json!({"name": "A", "email": "a@example.com", "password": PASSWORD}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_register_validation() {
    let t = TestApp::new();

    let response = t
        .send(send_json(
            "POST",
            "/api/auth/register",
            None,
            serde_json::json!({"name": "A", "email": "a@example.com"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(get_body_json(response).await["message"], "All fields are required");

    let response = t
        .send(send_json(
            "POST",
            "/api/auth/register",
            None,
            serde_json::json!({"name": "A", "email": "a@example.com", "password": "123"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(t.db.get_user_by_email("a@example.com").unwrap().map(|u| u.id), None);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let t = TestApp::new();
    t.user("taken@example.com");

    let response = t
        .send(send_json(
            "POST",
            "/api/auth/register",
            None,
            serde_json::json!({"name": "B", "email": "TAKEN@example.com", "password": PASSWORD}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(get_body_json(response).await["message"], "User already exists");
}

#[tokio::test]
async fn test_register_default_budget_drives_alert_and_insights() {
    let t = TestApp::new();

    let response = t
        .send(send_json(
            "POST",
            "/api/auth/register",
            None,
            serde_json::json!({
                "name": "Asha",
                "email": "asha@example.com",
                "password": PASSWORD,
                "budget": 500
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let token = get_body_json(response).await["accessToken"]
        .as_str()
        .unwrap()
        .to_string();

    let user = t.db.get_user_by_email("asha@example.com").unwrap().unwrap();
    assert_eq!(user.default_budget, Some(Decimal::from(500)));
    t.expense(user.id, 600, Category::Shopping);

    let json = get_body_json(t.send(get("/api/budget/alert", Some(&token))).await).await;
    assert_eq!(json["overBudget"], true);
    assert_eq!(json["message"], "Budget Exceeded!");

    let json = get_body_json(t.send(get("/api/insights", Some(&token))).await).await;
    assert_eq!(json["spentAmount"].as_f64(), Some(600.0));
    assert_eq!(json["remainingBudget"].as_f64(), Some(-100.0));

    let response = t
        .send(send_json(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({"email": "asha@example.com", "password": PASSWORD}),
        ))
        .await;
    assert_eq!(get_body_json(response).await["user"]["budget"].as_f64(), Some(500.0));
}

#[tokio::test]
async fn test_register_rejects_invalid_budget() {
    let t = TestApp::new();

    for budget in [serde_json::json!(-10), serde_json::json!(5_000_000_000_i64)] {
        let response = t
            .send(send_json(
                "POST",
                "/api/auth/register",
                None,
                serde_json::json!({
                    "name": "Ravi",
                    "email": "ravi@example.com",
                    "password": PASSWORD,
                    "budget": budget
                }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert!(t.db.get_user_by_email("ravi@example.com").unwrap().is_none());
}

#[tokio::test]
async fn test_login() {
    let t = TestApp::new();
    let (id, _) = t.user("login@example.com");
    t.db.set_budget(id, Decimal::from(5000), PeriodKind::Monthly)
        .unwrap();

    let response = t
        .send(send_json(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({"email": "login@example.com", "password": PASSWORD}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).starts_with("refreshToken="));

    let json = get_body_json(response).await;
    assert_eq!(json["message"], "Login successful");
    assert_eq!(json["user"]["_id"], id);
    assert_eq!(json["user"]["budget"].as_f64(), Some(5000.0));
}

#[tokio::test]
async fn test_login_bad_credentials() {
    let t = TestApp::new();
    t.user("login@example.com");

    for body in [
        serde_json::json!({"email": "login@example.com", "password": "wrong-password"}),
        serde_json::json!({"email": "nobody@example.com", "password": PASSWORD}),
    ] {
        let response = t.send(send_json("POST", "/api/auth/login", None, body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(get_body_json(response).await["message"], "Invalid credentials");
    }
}

#[tokio::test]
async fn test_refresh_token_flow() {
    let t = TestApp::new();
    t.user("refresh@example.com");

    let login = t
        .send(send_json(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({"email": "refresh@example.com", "password": PASSWORD}),
        ))
        .await;
    let cookie = cookie_pair(&set_cookie(&login));

    let response = t
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/auth/refresh-token")
                .header("cookie", cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let token = get_body_json(response).await["accessToken"]
        .as_str()
        .unwrap()
        .to_string();

    let response = t.send(get("/api/protected", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        get_body_json(response).await["message"],
        "You have accessed a protected route!"
    );
}

#[tokio::test]
async fn test_refresh_token_rejections() {
    let t = TestApp::new();
    let (_, access) = t.user("r@example.com");

    let response = t
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/auth/refresh-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(get_body_json(response).await["message"], "No refresh token provided");

    // An access token is signed with a different secret
    for value in ["garbage".to_string(), access] {
        let response = t
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/refresh-token")
                    .header("cookie", format!("refreshToken={}", value))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(get_body_json(response).await["message"], "Invalid refresh token");
    }
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let t = TestApp::new();
    let response = t
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).contains("Max-Age=0"));
    assert_eq!(get_body_json(response).await["message"], "Logged out successfully");
}

#[tokio::test]
async fn test_current_user() {
    let t = TestApp::new();
    let (id, token) = t.user("me@example.com");

    let response = t.send(get("/api/auth/user", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["id"], id);
    assert_eq!(json["email"], "me@example.com");
}

// ========== Auth Middleware Tests ==========

#[tokio::test]
async fn test_missing_token() {
    let t = TestApp::new();
    let response = t.send(get("/api/expense", None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        get_body_json(response).await["message"],
        "Access denied. No token provided."
    );
}

#[tokio::test]
async fn test_null_token() {
    let t = TestApp::new();
    let response = t.send(get("/api/expense", Some("null"))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(get_body_json(response).await["message"], "Invalid token.");
}

#[tokio::test]
async fn test_invalid_and_expired_tokens() {
    let t = TestApp::new();
    let (id, _) = t.user("x@example.com");
    let expired = t
        .state
        .tokens
        .sign_at(TokenKind::Access, id, Utc::now() - ChronoDuration::hours(1))
        .unwrap();

    for token in ["not-a-jwt".to_string(), expired] {
        let response = t.send(get("/api/expense", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            get_body_json(response).await["message"],
            "Invalid or expired token."
        );
    }
}

#[tokio::test]
async fn test_token_for_unknown_user() {
    let t = TestApp::new();
    let token = t.state.tokens.sign(TokenKind::Access, 999).unwrap();

    let response = t.send(get("/api/expense", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(get_body_json(response).await["message"], "User not found.");
}

// ========== Expense API Tests ==========

#[tokio::test]
async fn test_add_expense() {
    let t = TestApp::new();
    let (id, token) = t.user("e@example.com");

    let response = t
        .send(send_json(
            "POST",
            "/api/expense/add",
            Some(&token),
            serde_json::json!({
                "amount": 250.5,
                "category": "Food",
                "description": "Groceries",
                "date": "2024-03-05"
            }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    assert_eq!(json["amount"].as_f64(), Some(250.5));
    assert_eq!(json["category"], "Food");
    assert_eq!(json["date"], "2024-03-05");
    assert_eq!(json["user_id"], id);
}

#[tokio::test]
async fn test_add_expense_defaults_to_today() {
    let t = TestApp::new();
    let (_, token) = t.user("e@example.com");

    let response = t
        .send(send_json(
            "POST",
            "/api/expense/add",
            Some(&token),
            serde_json::json!({"amount": 10, "category": "transport"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Transport");
    assert_eq!(json["date"], Local::now().date_naive().to_string());
}

#[tokio::test]
async fn test_add_expense_validation() {
    let t = TestApp::new();
    let (id, token) = t.user("e@example.com");

    let cases = [
        (
            serde_json::json!({"amount": 10}),
            "Amount and category are required",
        ),
        (
            serde_json::json!({"amount": 10, "category": "Groceries"}),
            "Invalid category",
        ),
        (
            serde_json::json!({"amount": -5, "category": "Food"}),
            "Amount must not be negative",
        ),
        (
            serde_json::json!({"amount": 50_000_000_000_000_000_i64, "category": "Rent"}),
            "Amount must be at most 1000000000",
        ),
    ];

    for (body, message) in cases {
        let response = t
            .send(send_json("POST", "/api/expense/add", Some(&token), body))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(get_body_json(response).await["message"], message);
    }

    assert!(t.db.list_expenses(id).unwrap().is_empty());
}

#[tokio::test]
async fn test_list_expenses_scoped_to_caller() {
    let t = TestApp::new();
    let (alice, alice_token) = t.user("alice@example.com");
    let (bob, _) = t.user("bob@example.com");
    t.expense(alice, 10, Category::Food);
    t.expense(alice, 20, Category::Bills);
    t.expense(bob, 30, Category::Rent);

    let response = t.send(get("/api/expense", Some(&alice_token))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let expenses = json.as_array().unwrap();
    assert_eq!(expenses.len(), 2);
    assert!(expenses.iter().all(|e| e["user_id"] == alice));
}

#[tokio::test]
async fn test_update_expense() {
    let t = TestApp::new();
    let (id, token) = t.user("e@example.com");
    let expense_id = t.expense(id, 10, Category::Food);

    let response = t
        .send(send_json(
            "PUT",
            &format!("/api/expense/update/{}", expense_id),
            Some(&token),
            serde_json::json!({"amount": 12.75, "category": "Shopping"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["amount"].as_f64(), Some(12.75));
    assert_eq!(json["category"], "Shopping");
}

#[tokio::test]
async fn test_update_expense_not_owner() {
    let t = TestApp::new();
    let (alice, _) = t.user("alice@example.com");
    let (_, mallory_token) = t.user("mallory@example.com");
    let expense_id = t.expense(alice, 10, Category::Food);

    let response = t
        .send(send_json(
            "PUT",
            &format!("/api/expense/update/{}", expense_id),
            Some(&mallory_token),
            serde_json::json!({"amount": 1}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(get_body_json(response).await["message"], "Unauthorized");

    let stored = t.db.get_expense(expense_id).unwrap().unwrap();
    assert_eq!(stored.amount, Decimal::from(10));
}

#[tokio::test]
async fn test_update_missing_expense() {
    let t = TestApp::new();
    let (_, token) = t.user("e@example.com");

    let response = t
        .send(send_json(
            "PUT",
            "/api/expense/update/4242",
            Some(&token),
            serde_json::json!({"amount": 1}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(get_body_json(response).await["message"], "Expense not found");
}

#[tokio::test]
async fn test_delete_expense() {
    let t = TestApp::new();
    let (alice, alice_token) = t.user("alice@example.com");
    let (_, bob_token) = t.user("bob@example.com");
    let expense_id = t.expense(alice, 10, Category::Food);
    let uri = format!("/api/expense/delete/{}", expense_id);

    let request = |token: &str| {
        Request::builder()
            .method("DELETE")
            .uri(&uri)
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    };

    let response = t.send(request(&bob_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(t.db.get_expense(expense_id).unwrap().is_some());

    let response = t.send(request(&alice_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        get_body_json(response).await["message"],
        "Expense deleted successfully"
    );
    assert!(t.db.get_expense(expense_id).unwrap().is_none());

    let response = t.send(request(&alice_token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Budget API Tests ==========

#[tokio::test]
async fn test_set_budget_upserts() {
    let t = TestApp::new();
    let (id, token) = t.user("b@example.com");

    for amount in [1000, 1500] {
        let response = t
            .send(send_json(
                "POST",
                "/api/budget/set",
                Some(&token),
                serde_json::json!({"amount": amount, "period": "monthly"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = get_body_json(response).await;
        assert_eq!(json["message"], "Budget updated successfully!");
        assert_eq!(json["budget"]["period"], "monthly");
        assert_eq!(json["budget"]["amount"].as_f64(), Some(amount as f64));
    }

    let budgets = t.db.list_budgets(id).unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].amount, Decimal::from(1500));
}

#[tokio::test]
async fn test_set_budget_defaults_to_monthly() {
    let t = TestApp::new();
    let (_, token) = t.user("b@example.com");

    let response = t
        .send(send_json(
            "POST",
            "/api/budget/set",
            Some(&token),
            serde_json::json!({"amount": 300}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_json(response).await["budget"]["period"], "monthly");
}

#[tokio::test]
async fn test_set_budget_validation() {
    let t = TestApp::new();
    let (_, token) = t.user("b@example.com");

    for body in [
        serde_json::json!({"period": "monthly"}),
        serde_json::json!({"amount": 100, "period": "yearly"}),
        serde_json::json!({"amount": -100}),
    ] {
        let response = t
            .send(send_json("POST", "/api/budget/set", Some(&token), body))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_get_budget_for_period() {
    let t = TestApp::new();
    let (id, token) = t.user("b@example.com");
    t.db.set_budget(id, Decimal::from(700), PeriodKind::Weekly)
        .unwrap();
    t.expense(id, 120, Category::Food);
    t.expense(id, 80, Category::Transport);

    let response = t.send(get("/api/budget/weekly", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["budget"].as_f64(), Some(700.0));
    assert_eq!(json["totalExpenses"].as_f64(), Some(200.0));
}

#[tokio::test]
async fn test_get_budget_not_found() {
    let t = TestApp::new();
    let (_, token) = t.user("b@example.com");

    for uri in ["/api/budget/monthly", "/api/budget/yearly"] {
        let response = t.send(get(uri, Some(&token))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            get_body_json(response).await["message"],
            "No budget found for this period"
        );
    }
}

#[tokio::test]
async fn test_budget_alert() {
    let t = TestApp::new();
    let (id, token) = t.user("b@example.com");

    let response = t.send(get("/api/budget/alert", Some(&token))).await;
    let json = get_body_json(response).await;
    assert_eq!(json["overBudget"], false);
    assert_eq!(json["message"], "No budget set.");

    t.db.set_budget(id, Decimal::from(100), PeriodKind::Monthly)
        .unwrap();
    t.expense(id, 100, Category::Food);

    // Spending exactly the budget is still within it
    let json = get_body_json(t.send(get("/api/budget/alert", Some(&token))).await).await;
    assert_eq!(json["overBudget"], false);
    assert_eq!(json["message"], "Within Budget");

    t.expense(id, 1, Category::Food);
    let json = get_body_json(t.send(get("/api/budget/alert", Some(&token))).await).await;
    assert_eq!(json["overBudget"], true);
    assert_eq!(json["message"], "Budget Exceeded!");
}

// ========== Analytics API Tests ==========

#[tokio::test]
async fn test_monthly_summary() {
    let t = TestApp::new();
    let (id, token) = t.user("a@example.com");
    t.expense(id, 40, Category::Food);
    t.expense(id, 60, Category::Bills);

    let response = t
        .send(get("/api/analytics/monthly-summary", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let days = json.as_array().unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0]["_id"], Local::now().day());
    assert_eq!(days[0]["total"].as_f64(), Some(100.0));
}

#[tokio::test]
async fn test_category_breakdown() {
    let t = TestApp::new();
    let (id, token) = t.user("a@example.com");
    t.expense(id, 40, Category::Food);
    t.expense(id, 25, Category::Food);
    t.expense(id, 500, Category::Rent);

    let response = t
        .send(get("/api/analytics/category-breakdown", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let slices = json.as_array().unwrap();
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0]["id"], "Rent");
    assert_eq!(slices[0]["name"], "Rent");
    assert_eq!(slices[0]["total"].as_f64(), Some(500.0));
    assert_eq!(slices[1]["name"], "Food");
    assert_eq!(slices[1]["total"].as_f64(), Some(65.0));
}

// ========== Insight API Tests ==========

#[tokio::test]
async fn test_rule_based_insights() {
    let t = TestApp::new();
    let (id, token) = t.user("i@example.com");
    t.db.set_budget(id, Decimal::from(1000), PeriodKind::Monthly)
        .unwrap();
    t.expense(id, 900, Category::Rent);

    let response = t.send(get("/api/insights", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["spentAmount"].as_f64(), Some(900.0));
    assert_eq!(json["remainingBudget"].as_f64(), Some(100.0));
    assert_eq!(
        json["recommendation"],
        spendwise_core::budget::NEAR_LIMIT_MESSAGE
    );
    assert_eq!(
        json["investmentTip"],
        spendwise_core::budget::MONITOR_TIP
    );
    assert_eq!(json["categoryWiseSpending"][0]["category"], "Rent");
}

#[tokio::test]
async fn test_ai_insights_cached() {
    let mock = MockBackend::with_response("Spend less on rent.");
    let t = TestApp::with(test_config(), AIClient::Mock(mock.clone()));
    let (id, token) = t.user("ai@example.com");
    t.expense(id, 400, Category::Rent);

    for _ in 0..2 {
        let response = t.send(get("/api/ai-insights", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            get_body_json(response).await["insights"],
            "Spend less on rent."
        );
    }

    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_ai_insights_through_ollama_api() {
    let server = MockOllamaServer::start().await;
    let t = TestApp::with(test_config(), AIClient::ollama(&server.url(), "tinyllama"));
    let (id, token) = t.user("ai@example.com");
    t.db.set_budget(id, Decimal::from(2000), PeriodKind::Monthly)
        .unwrap();
    t.expense(id, 150, Category::Entertainment);

    let response = t.send(get("/api/ai-insights", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_json(response).await["insights"], MOCK_INSIGHT);

    let prompt = server.last_prompt().unwrap();
    assert!(prompt.contains("Entertainment: ₹150"));
    assert_eq!(server.generate_calls(), 1);
}

#[tokio::test]
async fn test_ai_insights_upstream_status() {
    let server = MockOllamaServer::start_failing(503, "model is loading").await;
    let t = TestApp::with(test_config(), AIClient::ollama(&server.url(), "tinyllama"));
    let (_, token) = t.user("ai@example.com");

    let response = t.send(get("/api/ai-insights", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(get_body_json(response).await["message"], "model is loading");

    // Failures are not cached
    assert!(t.state.composer.cache().is_empty());
}

#[tokio::test]
async fn test_ai_insights_unreachable_generator() {
    let mock = MockBackend::failing(None, "");
    let t = TestApp::with(test_config(), AIClient::Mock(mock));
    let (_, token) = t.user("ai@example.com");

    let response = t.send(get("/api/ai-insights", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        get_body_json(response).await["message"],
        INSIGHT_FAILURE_MESSAGE
    );
}

#[tokio::test]
async fn test_ai_insights_rate_limited() {
    let config = ServerConfig {
        ai_rate_limit: 2,
        ..test_config()
    };
    let t = TestApp::with(config, AIClient::mock());
    let (_, token) = t.user("ai@example.com");
    let client = [10, 0, 0, 1];

    let response = t
        .send(from_ip(get("/api/ai-insights", Some(&token)), client))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Unauthenticated requests still use up the allowance
    let response = t.send(from_ip(get("/api/ai-insights", None), client)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = t
        .send(from_ip(get("/api/ai-insights", Some(&token)), client))
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
    assert_eq!(
        get_body_json(response).await["message"],
        rate_limit::RATE_LIMIT_MESSAGE
    );

    // Other clients have their own window
    let response = t
        .send(from_ip(get("/api/ai-insights", Some(&token)), [10, 0, 0, 2]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Other routes are not limited
    let response = t
        .send(from_ip(get("/api/insights", Some(&token)), client))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ========== Report API Tests ==========

#[tokio::test]
async fn test_export_csv() {
    let t = TestApp::new();
    let (id, token) = t.user("r@example.com");
    t.expense(id, 99, Category::Health);

    let response = t.send(get("/api/reports/csv", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("financial_report.csv"));

    let body = String::from_utf8(get_body_bytes(response).await).unwrap();
    let mut lines = body.lines();
    assert_eq!(lines.next(), Some("Category,Amount (₹),Date"));
    assert!(lines.next().unwrap().starts_with("Health,99.00,"));
}

#[tokio::test]
async fn test_export_pdf() {
    let t = TestApp::new();
    let (id, token) = t.user("r@example.com");
    t.expense(id, 99, Category::Health);

    let response = t.send(get("/api/reports/pdf", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    assert!(get_body_bytes(response).await.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_reports_require_auth() {
    let t = TestApp::new();
    let response = t.send(get("/api/reports/pdf", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ========== Router Layer Tests ==========

#[tokio::test]
async fn test_security_headers() {
    let t = TestApp::new();
    let response = t.send(get("/api/auth/user", None)).await;

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.contains_key("content-security-policy"));
}

#[tokio::test]
async fn test_cors_preflight_allows_frontend() {
    let t = TestApp::new();
    let response = t
        .send(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/expense")
                .header("origin", DEFAULT_ALLOWED_ORIGIN)
                .header("access-control-request-method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        DEFAULT_ALLOWED_ORIGIN
    );
    assert_eq!(
        headers.get("access-control-allow-credentials").unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_unknown_route() {
    let t = TestApp::new();
    let response = t.send(get("/api/nope", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Config and Error Tests ==========

#[test]
fn test_config_from_lookup() {
    let vars: std::collections::HashMap<&str, &str> = [
        ("ACCESS_TOKEN_SECRET", "a"),
        ("REFRESH_TOKEN_SECRET", "r"),
        ("SPENDWISE_ALLOWED_ORIGINS", "https://app.example.com, http://localhost:5173"),
        ("SPENDWISE_SECURE_COOKIES", "false"),
        ("SPENDWISE_AI_RATE_LIMIT", "25"),
    ]
    .into_iter()
    .collect();

    let config = ServerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
    assert_eq!(
        config.allowed_origins,
        vec!["https://app.example.com", "http://localhost:5173"]
    );
    assert!(!config.secure_cookies);
    assert_eq!(config.ai_rate_limit, 25);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_defaults() {
    let config = ServerConfig::from_lookup(|_| None);
    assert_eq!(config.allowed_origins, vec![DEFAULT_ALLOWED_ORIGIN]);
    assert!(config.secure_cookies);
    assert_eq!(config.ai_rate_limit, DEFAULT_AI_RATE_LIMIT);
    assert_eq!(config.ai_rate_window, DEFAULT_AI_RATE_WINDOW);
    assert!(config.validate().is_err());
}

#[tokio::test]
async fn test_config_rejects_wildcard_origin() {
    let config = ServerConfig::from_lookup(|k| match k {
        "ACCESS_TOKEN_SECRET" => Some("a".to_string()),
        "REFRESH_TOKEN_SECRET" => Some("r".to_string()),
        "SPENDWISE_ALLOWED_ORIGINS" => Some("https://app.example.com, *".to_string()),
        _ => None,
    });
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("'*'"));

    // Building the router with such a config never panics; the wildcard is ignored
    let t = TestApp::with(config, AIClient::mock());
    let response = t
        .send(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/expense")
                .header("origin", "https://evil.example.com")
                .header("access-control-request-method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}

#[test]
fn test_config_ignores_bad_rate_limit() {
    let config = ServerConfig::from_lookup(|k| {
        (k == "SPENDWISE_AI_RATE_LIMIT").then(|| "lots".to_string())
    });
    assert_eq!(config.ai_rate_limit, DEFAULT_AI_RATE_LIMIT);
}

#[test]
fn test_error_mapping() {
    use spendwise_core::Error;

    let cases = [
        (Error::validation("bad"), StatusCode::BAD_REQUEST),
        (Error::Conflict("dup".into()), StatusCode::BAD_REQUEST),
        (Error::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
        (Error::Forbidden("Unauthorized".into()), StatusCode::FORBIDDEN),
        (Error::not_found("gone"), StatusCode::NOT_FOUND),
        (
            Error::Upstream {
                status: Some(429),
                message: "slow down".into(),
            },
            StatusCode::TOO_MANY_REQUESTS,
        ),
        (
            Error::Upstream {
                status: Some(200),
                message: "odd".into(),
            },
            StatusCode::BAD_GATEWAY,
        ),
        (Error::Pdf("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (err, status) in cases {
        assert_eq!(AppError::from(err).status(), status);
    }

    let internal = AppError::from(Error::InvalidRow("secret detail".into()));
    assert_eq!(internal.message(), "An internal error occurred");
}

#[tokio::test]
async fn test_housekeeping_purges_expired_insights() {
    let config = ServerConfig {
        insight_ttl: std::time::Duration::ZERO,
        ..test_config()
    };
    let t = TestApp::with(config, AIClient::mock());
    t.state.composer.cache().insert(1, "stale".into());
    t.state.ai_limiter.check("10.0.0.1");

    assert_eq!(run_housekeeping(&t.state), (1, 0));
    assert!(t.state.composer.cache().is_empty());
    assert_eq!(t.state.ai_limiter.tracked_clients(), 1);
}
