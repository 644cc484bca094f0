use actix_web::{HttpResponse, Responder, get, post, web};
use log::debug;

use super::models::{AppState, MessageResponse, NewTxRequest, PendingResponse};
use crate::blockchain::Transaction;

/// Queue a transaction for the next mined block. Field presence is checked
/// here at the boundary; the core accepts whatever it is handed.
#[post("/transactions/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTxRequest>,
) -> impl Responder {
    let NewTxRequest {
        sender,
        receiver,
        amount,
    } = body.into_inner();

    let mut missing = Vec::new();
    if sender.is_none() {
        missing.push("sender");
    }
    if receiver.is_none() {
        missing.push("receiver");
    }
    if amount.is_none() {
        missing.push("amount");
    }

    if let (Some(sender), Some(receiver), Some(amount)) = (sender, receiver, amount) {
        let tx = Transaction {
            sender,
            receiver,
            amount,
        };
        let mut ledger = state.ledger.lock().expect("mutex poisoned");
        ledger.add_transaction(tx);
        debug!("queued transaction ({} pending)", ledger.pending_transactions.len());
        HttpResponse::Created().json(MessageResponse {
            message: "transaction queued for the next mined block".into(),
        })
    } else {
        HttpResponse::BadRequest().json(MessageResponse {
            message: format!("missing transaction field(s): {}", missing.join(", ")),
        })
    }
}

/// List the pending queue.
#[get("/transactions/pending/")]
pub async fn get_pending(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(PendingResponse {
        size: ledger.pending_transactions.len(),
        transactions: ledger.pending_transactions.clone(),
    })
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test, web};

    use crate::api::init_routes;
    use crate::api::models::AppState;

    #[actix_web::test]
    async fn missing_fields_are_named_in_the_rejection() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(0)))
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions/")
            .set_json(serde_json::json!({ "sender": "alice" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = test::read_body_json(resp).await;
        let message = body["message"].as_str().unwrap();
        assert!(message.contains("receiver"));
        assert!(message.contains("amount"));
        assert!(!message.contains("sender"));
    }

    #[actix_web::test]
    async fn queued_transaction_shows_up_as_pending() {
        let state = web::Data::new(AppState::new(0));
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(init_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions/")
            .set_json(serde_json::json!({
                "sender": "alice",
                "receiver": "bob",
                "amount": 10
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let req = test::TestRequest::get()
            .uri("/api/v1/transactions/pending/")
            .to_request();
        let body: serde_json::Value =
            test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["size"], 1);
        assert_eq!(body["transactions"][0]["sender"], "alice");
    }
}
