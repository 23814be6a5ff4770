mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt; // for .oneshot()

use billing_backend::service::invoice_service::InvoiceService;
use common::{test_app, test_context};

struct Client {
    app: Router,
    cookie: Option<String>,
}

impl Client {
    fn new(app: Router) -> Self {
        Client { app, cookie: None }
    }

    async fn send(&mut self, builder: axum::http::request::Builder, body: Body) -> Response {
        let builder = match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        };
        let response = self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap().to_string();
            self.cookie = Some(pair);
        }
        response
    }

    async fn get(&mut self, uri: &str) -> Response {
        self.send(Request::builder().method("GET").uri(uri), Body::empty()).await
    }

    async fn form(&mut self, uri: &str, body: &str) -> Response {
        let builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(builder, Body::from(body.to_string())).await
    }

    async fn json(&mut self, method: &str, uri: &str, body: &str) -> Response {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        self.send(builder, Body::from(body.to_string())).await
    }

    async fn login(&mut self) {
        self.form("/register", "mobile=0555123456&password=pw1").await;
        let response = self.form("/login", "mobile=0555123456&password=pw1").await;
        assert_eq!(location(&response), "/billing");
    }
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let context = test_context();
    let mut client = Client::new(test_app(&context));
    let response = client.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn test_protected_routes_redirect_to_login() {
    let context = test_context();
    let mut client = Client::new(test_app(&context));

    for uri in ["/", "/billing", "/saved_invoices", "/monthly_report", "/api/invoices", "/api/invoice-number", "/logout"] {
        let response = client.get(uri).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), "/login?required=1", "{}", uri);
    }

    let page = body_text(client.get("/login?required=1").await).await;
    assert!(page.contains("Please log in to access this page."));
    let page = body_text(client.get("/login").await).await;
    assert!(!page.contains("Please log in to access this page."));
}

#[tokio::test]
async fn test_anonymous_redirects_leave_no_session() {
    let context = test_context();
    let app = test_app(&context);

    for _ in 0..50 {
        for uri in ["/billing", "/api/invoices", "/api/invoice-number", "/logout"] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
            assert!(response.headers().get(header::SET_COOKIE).is_none(), "{}", uri);
        }
    }

    let request = Request::builder().uri("/login?required=1").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_session_cookie_carries_expiry() {
    let context = test_context();
    let mut client = Client::new(test_app(&context));
    client.form("/register", "mobile=0555123456&password=pw1").await;
    let response = client.form("/login", "mobile=0555123456&password=pw1").await;

    let set_cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("billing_session="));
    assert!(set_cookie.contains("Max-Age="));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_guard_does_not_consume_counter() {
    let context = test_context();
    let mut client = Client::new(test_app(&context));
    client.get("/api/invoice-number").await;

    assert_eq!(context.services.invoice_service.next_number().await.unwrap(), "G2FEE001");
}

#[tokio::test]
async fn test_register_and_login_flow() {
    let context = test_context();
    let mut client = Client::new(test_app(&context));

    let response = client.form("/register", "mobile=0555123456&password=pw1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let page = body_text(client.get("/login").await).await;
    assert!(page.contains("Registration successful! Please log in."));

    let response = client.form("/register", "mobile=0555123456&password=other").await;
    assert_eq!(location(&response), "/register");
    let page = body_text(client.get("/register").await).await;
    assert!(page.contains("Mobile number already registered."));

    let response = client.form("/login", "mobile=0555123456&password=wrong").await;
    assert_eq!(location(&response), "/login");
    let page = body_text(client.get("/login").await).await;
    assert!(page.contains("Invalid mobile number or password."));

    let response = client.form("/login", "mobile=0555123456&password=pw1").await;
    assert_eq!(location(&response), "/billing");

    let response = client.get("/billing").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Login successful!"));
    assert!(page.contains("0.00"));

    let response = client.get("/").await;
    assert_eq!(location(&response), "/billing");
}

#[tokio::test]
async fn test_empty_form_fields_fail_login() {
    let context = test_context();
    let mut client = Client::new(test_app(&context));
    let response = client.form("/login", "mobile=&password=").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = client.form("/register", "mobile=0555123456").await;
    assert_eq!(location(&response), "/register");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let context = test_context();
    let mut client = Client::new(test_app(&context));
    client.login().await;

    let response = client.get("/logout").await;
    assert_eq!(location(&response), "/login");
    let page = body_text(client.get("/login").await).await;
    assert!(page.contains("Logged out successfully!"));

    let response = client.get("/api/invoices").await;
    assert_eq!(location(&response), "/login?required=1");
}

#[tokio::test]
async fn test_invoice_api_crud() {
    let context = test_context();
    let mut client = Client::new(test_app(&context));
    client.login().await;

    let number = body_json(client.get("/api/invoice-number").await).await;
    assert_eq!(number, json!({ "number": "G2FEE001" }));
    let number = body_json(client.get("/api/invoice-number").await).await;
    assert_eq!(number, json!({ "number": "G2FEE002" }));

    let response = client
        .json("POST", "/api/invoices", r#"{"name":"John","address":"12 Main St","total":100,"amountPaid":40}"#)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["success"], json!(true));
    let id = created["id"].as_str().unwrap().to_string();

    let invoice = body_json(client.get(&format!("/api/invoices/{}", id)).await).await;
    assert_eq!(invoice["_id"], json!(id));
    assert_eq!(invoice["name"], json!("John"));
    assert!(invoice["created_at"].as_str().unwrap().ends_with('Z'));

    let response = client
        .json("PUT", &format!("/api/invoices/{}", id), r#"{"amountPaid":100}"#)
        .await;
    assert_eq!(body_json(response).await, json!({ "success": true }));
    let invoice = body_json(client.get(&format!("/api/invoices/{}", id)).await).await;
    assert_eq!(invoice["amountPaid"], json!(100));
    assert_eq!(invoice["name"], json!("John"));

    let listed = body_json(client.get("/api/invoices").await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let found = body_json(client.get("/api/invoices/search?name=jo").await).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    let found = body_json(client.get("/api/invoices/search?address=nowhere").await).await;
    assert!(found.as_array().unwrap().is_empty());

    let stats = body_json(client.get("/api/stats/monthly").await).await;
    assert_eq!(stats["monthly_count"], json!(1));
    assert_eq!(stats["total_paid"], json!(100.0));

    let response = client.send(Request::builder().method("DELETE").uri(format!("/api/invoices/{}", id)), Body::empty()).await;
    assert_eq!(body_json(response).await, json!({ "success": true }));
    let response = client.get(&format!("/api/invoices/{}", id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invoice_api_errors() {
    let context = test_context();
    let mut client = Client::new(test_app(&context));
    client.login().await;

    let response = client.get("/api/invoices/abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("BadRequest"));
    assert_eq!(body["message"], json!("Invalid invoice ID"));

    let missing = bson::oid::ObjectId::new().to_hex();
    let response = client.get(&format!("/api/invoices/{}", missing)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], json!("Invoice not found"));

    let response = client.json("PUT", &format!("/api/invoices/{}", missing), r#"{"total":1}"#).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.json("POST", "/api/invoices", "[1, 2, 3]").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.get("/api/invoices?start_date=soon&end_date=2024-01-31").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
