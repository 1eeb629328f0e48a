use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};

pub const PASSWORD: &str = "secret";
const TOKEN: &str = "valid-token";

/// One request as the stub saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Default)]
pub struct StubState {
    books: Mutex<Vec<Value>>,
    next_id: Mutex<i64>,
    token_valid: Mutex<bool>,
    requests: Mutex<Vec<Recorded>>,
}

/// An in-process stand-in for the bookstore REST service.
pub struct CatalogStub {
    pub base_url: String,
    state: Arc<StubState>,
    handle: tokio::task::JoinHandle<()>,
}

impl CatalogStub {
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind catalog stub");
        let addr = listener.local_addr().expect("stub address");

        let state = Arc::new(StubState::seeded());
        let app = Router::new().fallback(handle).with_state(state.clone());
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
            handle,
        }
    }

    /// Every token issued so far stops being accepted.
    pub fn expire_tokens(&self) {
        *self.state.token_valid.lock().unwrap() = false;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().last().cloned().expect("no request recorded")
    }

    pub fn book(&self, id: i64) -> Option<Value> {
        self.state
            .books
            .lock()
            .unwrap()
            .iter()
            .find(|b| b["id"] == id)
            .cloned()
    }
}

impl Drop for CatalogStub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl StubState {
    fn seeded() -> Self {
        let mut books: Vec<Value> = (1..=11)
            .map(|i| {
                json!({
                    "id": i,
                    "title": format!("Volume {i:02}"),
                    "author": "Anon",
                    "category": "reference",
                    "price": i as f64,
                    "rating": 3.0,
                    "publishedDate": "2020-01-01",
                })
            })
            .collect();
        for (id, title, price) in [(12, "Dune", 30.0), (13, "Dune Messiah", 31.0), (14, "Children of Dune", 32.0)] {
            books.push(json!({
                "id": id,
                "title": title,
                "author": "Frank Herbert",
                "category": "scifi",
                "price": price,
                "rating": 4.5,
                "publishedDate": null,
            }));
        }
        Self {
            books: Mutex::new(books),
            next_id: Mutex::new(100),
            ..Default::default()
        }
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn sort_value(book: &Value, key: &str) -> (f64, String) {
    let field = &book[key];
    (
        field.as_f64().unwrap_or(0.0),
        field.as_str().unwrap_or("").to_string(),
    )
}

async fn handle(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: String,
) -> Response {
    let path = uri.path().to_string();
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
        authorization: authorization.clone(),
        body: body.clone(),
    });

    let param = |name: &str| {
        query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };

    // --- Auth ---
    match (&method, path.as_str()) {
        (&Method::POST, "/api/auth/login") => {
            let credentials: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            if credentials["password"] != PASSWORD {
                return error(StatusCode::UNAUTHORIZED, "Invalid email or password");
            }
            *state.token_valid.lock().unwrap() = true;
            return Json(json!({ "token": TOKEN })).into_response();
        }
        (&Method::POST, "/api/auth/signup") => {
            return (StatusCode::CREATED, "User registered successfully").into_response();
        }
        _ => {}
    }

    let authorized = *state.token_valid.lock().unwrap()
        && authorization.as_deref() == Some(&format!("Bearer {TOKEN}"));
    if !authorized {
        return error(StatusCode::UNAUTHORIZED, "Full authentication is required");
    }

    // --- Books ---
    let rest = path.strip_prefix("/api/books").unwrap_or("");
    let mut books = state.books.lock().unwrap();
    match (method, rest) {
        (Method::GET, "") => Json(books.clone()).into_response(),
        (Method::GET, "/paginated") => {
            let page: usize = param("page").and_then(|p| p.parse().ok()).unwrap_or(0);
            let size: usize = param("size").and_then(|s| s.parse().ok()).unwrap_or(5).max(1);
            let sort_by = param("sortBy").unwrap_or_else(|| "price".into());
            let mut sorted = books.clone();
            sorted.sort_by(|a, b| {
                let (an, as_) = sort_value(a, &sort_by);
                let (bn, bs) = sort_value(b, &sort_by);
                an.total_cmp(&bn).then(as_.cmp(&bs))
            });
            let total_pages = sorted.len().div_ceil(size);
            let content: Vec<Value> = sorted.into_iter().skip(page * size).take(size).collect();
            Json(json!({ "content": content, "totalPages": total_pages })).into_response()
        }
        (Method::GET, "/search") => {
            let keyword = param("keyword").unwrap_or_default().to_lowercase();
            let found: Vec<Value> = books
                .iter()
                .filter(|b| {
                    b["title"]
                        .as_str()
                        .unwrap_or("")
                        .to_lowercase()
                        .contains(&keyword)
                })
                .cloned()
                .collect();
            Json(found).into_response()
        }
        (Method::GET, "/filter") => {
            let author = param("author");
            let category = param("category");
            let rating = param("rating").and_then(|r| r.parse::<f64>().ok());
            let found: Vec<Value> = books
                .iter()
                .filter(|b| author.as_ref().map_or(true, |a| b["author"] == a.as_str()))
                .filter(|b| category.as_ref().map_or(true, |c| b["category"] == c.as_str()))
                .filter(|b| rating.map_or(true, |r| b["rating"].as_f64().unwrap_or(0.0) >= r))
                .cloned()
                .collect();
            Json(found).into_response()
        }
        (Method::POST, "") => {
            let mut book: Value = match serde_json::from_str(&body) {
                Ok(book) => book,
                Err(_) => return error(StatusCode::BAD_REQUEST, "Malformed book"),
            };
            let mut next_id = state.next_id.lock().unwrap();
            *next_id += 1;
            book["id"] = json!(*next_id);
            books.push(book.clone());
            (StatusCode::CREATED, Json(book)).into_response()
        }
        (method, id) => {
            let Some(id) = id.strip_prefix('/').and_then(|id| id.parse::<i64>().ok()) else {
                return error(StatusCode::NOT_FOUND, "No such route");
            };
            let Some(index) = books.iter().position(|b| b["id"] == id) else {
                return error(StatusCode::NOT_FOUND, &format!("Book not found with id {id}"));
            };
            match method {
                Method::GET => Json(books[index].clone()).into_response(),
                Method::PUT => match serde_json::from_str::<Value>(&body) {
                    Ok(mut book) => {
                        book["id"] = json!(id);
                        books[index] = book.clone();
                        Json(book).into_response()
                    }
                    Err(_) => error(StatusCode::BAD_REQUEST, "Malformed book"),
                },
                Method::DELETE => {
                    books.remove(index);
                    StatusCode::NO_CONTENT.into_response()
                }
                _ => error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
            }
        }
    }
}
