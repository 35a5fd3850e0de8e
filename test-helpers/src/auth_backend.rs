//! A minimal StarFrete auth backend served over HTTP.
//!
//! Login hands out an access token the backend already considers expired,
//! so the first authorized request is answered 401 and the client has to go
//! through `auth/refresh`. What happens next depends on [`RefreshMode`].

use std::net::TcpListener;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, get, post, web};
use payloads::requests::RefreshToken;
use payloads::{Role, UserId};
use serde_json::{Value, json};
use uuid::Uuid;

pub const EXPIRED_ACCESS_TOKEN: &str = "expired-access-token";
pub const FRESH_ACCESS_TOKEN: &str = "fresh-access-token";
pub const INITIAL_REFRESH_TOKEN: &str = "initial-refresh-token";
pub const ROTATED_REFRESH_TOKEN: &str = "rotated-refresh-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Refresh succeeds and the new access token is accepted.
    Rotate,
    /// Refresh succeeds but every authorized request is still rejected.
    StillUnauthorized,
    /// The refresh token is rejected.
    Reject,
}

struct AuthState {
    mode: RefreshMode,
    valid_token: Mutex<Option<String>>,
    refresh_calls: AtomicUsize,
    profile_calls: AtomicUsize,
}

pub struct AuthBackend {
    pub address: String,
    state: web::Data<AuthState>,
}

impl AuthBackend {
    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    /// Calls to `auth/me`, retries included.
    pub fn profile_calls(&self) -> usize {
        self.state.profile_calls.load(Ordering::SeqCst)
    }
}

/// Start the backend on an OS-assigned port.
pub fn spawn_auth_backend(mode: RefreshMode) -> AuthBackend {
    let state = web::Data::new(AuthState {
        mode,
        valid_token: Mutex::new(None),
        refresh_calls: AtomicUsize::new(0),
        profile_calls: AtomicUsize::new(0),
    });

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = HttpServer::new({
        let state = state.clone();
        move || {
            App::new().app_data(state.clone()).service(
                web::scope("/api")
                    .service(login)
                    .service(refresh)
                    .service(user_profile),
            )
        }
    })
    .workers(1)
    .listen(listener)
    .unwrap()
    .run();
    tokio::spawn(server);

    AuthBackend {
        address: format!("http://127.0.0.1:{port}"),
        state,
    }
}

fn profile() -> Value {
    json!({
        "user_id": UserId(Uuid::nil()),
        "name": "João Motorista",
        "email": "joao@example.com",
        "role": Role::Driver,
    })
}

fn unauthorized(message: &str) -> HttpResponse {
    HttpResponse::Unauthorized()
        .json(json!({ "success": false, "message": message }))
}

#[post("/auth/login")]
async fn login() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "access_token": EXPIRED_ACCESS_TOKEN,
        "refresh_token": INITIAL_REFRESH_TOKEN,
        "user": profile(),
    }))
}

#[post("/auth/refresh")]
async fn refresh(
    state: web::Data<AuthState>,
    body: web::Json<RefreshToken>,
) -> HttpResponse {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if state.mode == RefreshMode::Reject
        || body.refresh_token != INITIAL_REFRESH_TOKEN
    {
        return unauthorized("Refresh token expired");
    }

    *state.valid_token.lock().unwrap() = Some(FRESH_ACCESS_TOKEN.into());
    HttpResponse::Ok().json(json!({
        "access_token": FRESH_ACCESS_TOKEN,
        "refresh_token": ROTATED_REFRESH_TOKEN,
    }))
}

#[get("/auth/me")]
async fn user_profile(
    state: web::Data<AuthState>,
    request: HttpRequest,
) -> HttpResponse {
    state.profile_calls.fetch_add(1, Ordering::SeqCst);
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    let valid = state.valid_token.lock().unwrap().clone();

    let accepted = state.mode != RefreshMode::StillUnauthorized
        && bearer.is_some()
        && bearer == valid.as_deref();
    if accepted {
        HttpResponse::Ok().json(json!({ "success": true, "data": profile() }))
    } else {
        unauthorized("Token expired")
    }
}
