use actix_web::{HttpResponse, Responder, post, web};
use futures_util::future::join_all;
use log::{debug, warn};

use super::models::{AppState, ConnectPeersRequest, PeersResponse, ReconcileResponse};
use crate::sync;

/// Register peer locations. Accepts `host:port` with or without a scheme;
/// the peer set deduplicates.
#[post("/peers/")]
pub async fn connect_peers(
    state: web::Data<AppState>,
    body: web::Json<ConnectPeersRequest>,
) -> impl Responder {
    if body.peers.is_empty() {
        return HttpResponse::BadRequest().body("no peers supplied");
    }

    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    for raw in &body.peers {
        let location = strip_scheme(raw);
        if location.is_empty() {
            continue;
        }
        ledger.add_peer(location.to_string());
    }

    let mut peers: Vec<String> = ledger.peers.iter().cloned().collect();
    peers.sort();
    HttpResponse::Created().json(PeersResponse { peers })
}

/// Compare the local chain against every registered peer and adopt the
/// longest valid one.
///
/// Peer queries run concurrently with each other and an unreachable peer is
/// skipped with a log, never fatal. Before the ledger lock is taken, any
/// in-flight mining search is asked to abort so a stale candidate cannot be
/// appended after adoption.
#[post("/reconcile/")]
pub async fn reconcile(state: web::Data<AppState>) -> impl Responder {
    let peers: Vec<String> = {
        let ledger = state.ledger.lock().expect("mutex poisoned");
        ledger.peers.iter().cloned().collect()
    };
    debug!("reconciling against {} peer(s)", peers.len());

    let fetches = peers.iter().map(|peer| sync::fetch_report(&state.http, peer));
    let mut reports = Vec::new();
    for result in join_all(fetches).await {
        match result {
            Ok(report) => reports.push(report),
            Err(err) => warn!("{err}"),
        }
    }

    state.mining_abort.request();
    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    state.mining_abort.clear();

    let outcome = sync::adopt_longest(&mut ledger, reports);
    HttpResponse::Ok().json(ReconcileResponse {
        replaced: outcome.replaced(),
        length: ledger.len(),
        chain: ledger.chain.clone(),
    })
}

fn strip_scheme(raw: &str) -> &str {
    let raw = raw.trim();
    let location = match raw.find("://") {
        Some(at) => &raw[at + 3..],
        None => raw,
    };
    location.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test, web};

    use super::strip_scheme;
    use crate::api::init_routes;
    use crate::api::models::AppState;

    // `use actix_web::test` shadows the built-in `#[test]` attribute, so
    // name the std one explicitly for this synchronous test.
    #[::core::prelude::v1::test]
    fn scheme_and_trailing_slash_are_stripped() {
        assert_eq!(strip_scheme("http://127.0.0.1:5000/"), "127.0.0.1:5000");
        assert_eq!(strip_scheme("https://node.local:8080"), "node.local:8080");
        assert_eq!(strip_scheme(" 127.0.0.1:5000 "), "127.0.0.1:5000");
    }

    #[actix_web::test]
    async fn connecting_peers_deduplicates_across_schemes() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(0)))
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/peers/")
            .set_json(serde_json::json!({
                "peers": [
                    "http://127.0.0.1:5000",
                    "127.0.0.1:5000/",
                    "127.0.0.1:5001"
                ]
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body["peers"],
            serde_json::json!(["127.0.0.1:5000", "127.0.0.1:5001"])
        );
    }

    #[actix_web::test]
    async fn reconcile_with_no_peers_keeps_the_chain() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(0)))
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/reconcile/")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["replaced"], false);
        assert_eq!(body["length"], 1);
    }
}
