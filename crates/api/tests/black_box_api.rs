use std::net::SocketAddr;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use nova_auth::JwtClaims;
use nova_core::UserId;
use nova_infra::Config;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::json;

struct TestServer {
    base_url: String,
    jwt_secret: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory stores, ephemeral port.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let mut config = Config::ephemeral(addr.to_string());
        config.public_base_url = base_url.clone();
        let jwt_secret = config.jwt_secret.clone();
        let app = nova_api::app::build_app(config)
            .await
            .expect("failed to build app");

        let handle = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        Self {
            base_url,
            jwt_secret,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let res = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_product(&self, token: &str, name: &str, model_id: &str) -> serde_json::Value {
        let form = Form::new()
            .text("name", name.to_string())
            .text("model", "GW")
            .text("modelId", model_id.to_string())
            .text("type", "pro_type_01")
            .part("logo", Part::bytes(b"png".to_vec()).file_name("logo.png"));
        let res = self
            .client
            .post(self.url("/products"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        res.json().await.unwrap()
    }

    async fn upload_package(
        &self,
        token: &str,
        product_id: &str,
        version: &str,
        content: &[u8],
    ) -> reqwest::Response {
        let form = Form::new()
            .text("productId", product_id.to_string())
            .text("version", version.to_string())
            .text("versionLog", "fixes")
            .part("package", Part::bytes(content.to_vec()).file_name("fw.bin"));
        self.client
            .post(self.url("/packages"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, sub: UserId) -> String {
    let now = Utc::now();
    let claims = JwtClaims::new(sub, now, now + ChronoDuration::minutes(10));

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let server = TestServer::spawn().await;

    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.client.get(server.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let res = server
        .client
        .get(server.url("/products"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_issues_token_and_cookie() {
    let server = TestServer::spawn().await;

    let res = server
        .client
        .post(server.url("/login"))
        .json(&json!({ "username": "admin", "password": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .expect("login sets a cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["username"], "admin");
    let token = body["token"].as_str().unwrap();

    let res = server
        .client
        .get(server.url("/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let me: serde_json::Value = res.json().await.unwrap();
    assert_eq!(me["username"], "admin");
    assert_eq!(me["permissions"], json!(["*"]));

    // The cookie alone authenticates too.
    let res = server
        .client
        .get(server.url("/whoami"))
        .header(reqwest::header::COOKIE, format!("token={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let server = TestServer::spawn().await;

    let res = server
        .client
        .post(server.url("/login"))
        .json(&json!({ "username": "admin", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");
}

#[tokio::test]
async fn token_for_unknown_user_is_rejected() {
    let server = TestServer::spawn().await;
    let token = mint_jwt(&server.jwt_secret, UserId::new());

    let res = server
        .client
        .get(server.url("/whoami"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn publish_applies_once_then_conflicts() {
    let server = TestServer::spawn().await;
    let token = server.login("admin", "admin").await;

    let product = server.create_product(&token, "Gateway", "GW-01").await;
    assert_eq!(product["publishStatus"], "pro_status_01");
    assert!(product["logo"].as_str().unwrap().starts_with(&server.base_url));
    let id = product["id"].as_str().unwrap();

    let res = server
        .client
        .post(server.url(&format!("/products/{id}/publish")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["changed"], 1);

    let res = server
        .client
        .post(server.url(&format!("/products/{id}/publish")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found_or_invalid_state");

    let res = server
        .client
        .get(server.url(&format!("/products/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let fetched: serde_json::Value = res.json().await.unwrap();
    assert_eq!(fetched["publishStatus"], "pro_status_03");
    assert!(fetched["publishBy"].is_string());

    let res = server
        .client
        .post(server.url(&format!("/products/{id}/launch")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_model_id_conflicts() {
    let server = TestServer::spawn().await;
    let token = server.login("admin", "admin").await;
    server.create_product(&token, "Gateway", "GW-01").await;

    let form = Form::new()
        .text("name", "Gateway 2")
        .text("modelId", "GW-01");
    let res = server
        .client
        .post(server.url("/products"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "duplicate");
}

#[tokio::test]
async fn active_package_blocks_product_delete() {
    let server = TestServer::spawn().await;
    let token = server.login("admin", "admin").await;

    let product = server.create_product(&token, "Sensor", "SN-01").await;
    let product_id = product["id"].as_str().unwrap();

    let res = server.upload_package(&token, product_id, "1.0.1", b"firmware").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let package: serde_json::Value = res.json().await.unwrap();
    assert_eq!(package["productName"], "Sensor");
    assert_eq!(package["size"], 8);
    let package_id = package["id"].as_str().unwrap();

    let res = server.upload_package(&token, product_id, "1.0.1", b"again").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = server
        .client
        .delete(server.url(&format!("/products/{product_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "has_active_children");
    assert!(body["msg"].as_str().unwrap().contains("1.0.1"));

    let res = server
        .client
        .delete(server.url(&format!("/packages/{package_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .delete(server.url(&format!("/products/{product_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .delete(server.url(&format!("/products/{product_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "already_retired");
}

#[tokio::test]
async fn package_for_missing_product_is_unprocessable() {
    let server = TestServer::spawn().await;
    let token = server.login("admin", "admin").await;

    let missing = nova_core::ProductId::new().to_string();
    let res = server.upload_package(&token, &missing, "1.0.0", b"fw").await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn devices_report_and_fetch_upgrades() {
    let server = TestServer::spawn().await;
    let token = server.login("admin", "admin").await;

    let product = server.create_product(&token, "Camera", "CAM-01").await;
    let product_id = product["id"].as_str().unwrap();
    let res = server.upload_package(&token, product_id, "2.0.0", b"cam-fw").await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = server
        .client
        .get(server.url("/devices/upgrades?modelId=CAM-01&version=1.0.0"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let offers: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0]["version"], "2.0.0");

    // The offered URL serves the uploaded bytes without a token.
    let url = offers[0]["url"].as_str().unwrap();
    let res = server.client.get(url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"cam-fw");

    let res = server
        .client
        .get(server.url("/devices/upgrades?modelId=UNKNOWN"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let offers: Vec<serde_json::Value> = res.json().await.unwrap();
    assert!(offers.is_empty());

    let res = server
        .client
        .post(server.url("/devices/report"))
        .header("x-forwarded-for", "10.0.0.7")
        .json(&json!({
            "modelId": "CAM-01",
            "deviceId": "cam-0001",
            "version": "1.0.0",
            "deviceInfo": { "uptime": 42 },
            "deviceStatus": "online"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let log: serde_json::Value = res.json().await.unwrap();
    assert_eq!(log["deviceName"], "Camera");
    assert_eq!(log["softwareIp"], "10.0.0.7");

    let res = server
        .client
        .post(server.url("/devices/report"))
        .json(&json!({ "modelId": "UNKNOWN", "deviceId": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .get(server.url("/devices/logs?deviceId=cam-0001"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let page: serde_json::Value = res.json().await.unwrap();
    assert_eq!(page["count"], 1);
    assert_eq!(page["rows"][0]["deviceId"], "cam-0001");
}

#[tokio::test]
async fn user_without_grants_is_forbidden() {
    let server = TestServer::spawn().await;
    let admin = server.login("admin", "admin").await;

    let res = server
        .client
        .post(server.url("/users"))
        .bearer_auth(&admin)
        .json(&json!({ "username": "viewer", "password": "viewer-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let viewer = server.login("viewer", "viewer-pass").await;

    let res = server
        .client
        .get(server.url("/whoami"))
        .bearer_auth(&viewer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .get(server.url("/products"))
        .bearer_auth(&viewer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn granting_an_acl_through_a_role_opens_the_route() {
    let server = TestServer::spawn().await;
    let admin = server.login("admin", "admin").await;

    let res = server
        .client
        .post(server.url("/acls"))
        .bearer_auth(&admin)
        .json(&json!({ "code": "products.read", "name": "Read products" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let acl: serde_json::Value = res.json().await.unwrap();

    let res = server
        .client
        .post(server.url("/roles"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "viewers" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let role: serde_json::Value = res.json().await.unwrap();
    let role_id = role["id"].as_str().unwrap();

    let res = server
        .client
        .put(server.url(&format!("/roles/{role_id}/acls")))
        .bearer_auth(&admin)
        .json(&json!({ "aclIds": [acl["id"]] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server
        .client
        .post(server.url("/users"))
        .bearer_auth(&admin)
        .json(&json!({
            "username": "reader",
            "password": "reader-pass",
            "roleIds": [role_id]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let reader = server.login("reader", "reader-pass").await;
    let res = server
        .client
        .get(server.url("/products"))
        .bearer_auth(&reader)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // The role grants nothing beyond products.read.
    let res = server
        .client
        .get(server.url("/users"))
        .bearer_auth(&reader)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn disabled_user_loses_access_with_a_live_token() {
    let server = TestServer::spawn().await;
    let admin = server.login("admin", "admin").await;

    let res = server
        .client
        .post(server.url("/users"))
        .bearer_auth(&admin)
        .json(&json!({ "username": "temp", "password": "temp-pass" }))
        .send()
        .await
        .unwrap();
    let user: serde_json::Value = res.json().await.unwrap();
    let user_id = user["id"].as_str().unwrap();
    let token = server.login("temp", "temp-pass").await;

    let res = server
        .client
        .put(server.url(&format!("/users/{user_id}/status")))
        .bearer_auth(&admin)
        .json(&json!({ "status": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .get(server.url("/whoami"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .post(server.url("/login"))
        .json(&json!({ "username": "temp", "password": "temp-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
