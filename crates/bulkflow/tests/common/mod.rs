//! Fake Cloudflare API served from a background runtime for binary tests

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

pub const TOKEN: &str = "cli-token";
pub const ZONE: &str = "cli-zone";

#[derive(Clone, Default)]
pub struct Zone {
    records: Arc<Mutex<Vec<Value>>>,
    rejected: Arc<Vec<String>>,
}

impl Zone {
    pub fn remaining(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

pub struct FakeCloudflare {
    pub url: String,
    pub zone: Zone,
    // Keeps the server alive for the test's duration
    _runtime: Runtime,
}

#[derive(Deserialize)]
struct ListQuery {
    page: Option<usize>,
    per_page: Option<usize>,
}

fn failure(status: StatusCode, code: i64, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({"success": false, "errors": [{"code": code, "message": message}], "result": null})),
    )
}

async fn list(
    State(zone): State<Zone>,
    Query(query): Query<ListQuery>,
) -> (StatusCode, Json<Value>) {
    let records = zone.records.lock().unwrap().clone();
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(100).max(1);
    let result: Vec<Value> = records
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "errors": [],
            "result": result,
            "result_info": {"page": page, "total_pages": records.len().div_ceil(per_page)}
        })),
    )
}

async fn remove(
    State(zone): State<Zone>,
    Path((_zone, id)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    if zone.rejected.contains(&id) {
        return failure(StatusCode::BAD_REQUEST, 1004, "DNS Validation Error");
    }
    let mut records = zone.records.lock().unwrap();
    match records.iter().position(|r| r["id"] == id.as_str()) {
        Some(pos) => {
            records.remove(pos);
            (
                StatusCode::OK,
                Json(json!({"success": true, "errors": [], "result": {"id": id}})),
            )
        }
        None => failure(StatusCode::NOT_FOUND, 81044, "Record does not exist."),
    }
}

/// Serve `count` A records named `r{n}`, rejecting deletion of `rejected`
pub fn start(count: usize, rejected: &[&str]) -> FakeCloudflare {
    let records = (1..=count)
        .map(|n| {
            json!({
                "id": format!("r{n}"),
                "name": format!("host{n}.example.com"),
                "type": "A",
                "content": "203.0.113.1",
                "ttl": 1,
                "proxied": false
            })
        })
        .collect();
    let zone = Zone {
        records: Arc::new(Mutex::new(records)),
        rejected: Arc::new(rejected.iter().map(|s| s.to_string()).collect()),
    };

    let app = Router::new()
        .route("/zones/{zone_id}/dns_records", get(list))
        .route("/zones/{zone_id}/dns_records/{id}", delete(remove))
        .with_state(zone.clone());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let listener = runtime
        .block_on(TcpListener::bind("127.0.0.1:0"))
        .unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    runtime.spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeCloudflare {
        url,
        zone,
        _runtime: runtime,
    }
}
