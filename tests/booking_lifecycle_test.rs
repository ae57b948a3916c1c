//! Booking lifecycle: the full transition table, end-to-end scenarios and
//! concurrent transitions on one booking.

mod common;

use axum::http::StatusCode;
use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};
use common::{create_booking, get, post_json, test_app};
use marketplace_backend::bookings::{
    next_status, ActorRole, BookingAction, BookingError, BookingService, BookingStatus,
    InMemoryBookingRepository, NewBooking, Schedule,
};
use serde_json::json;
use std::sync::Arc;

fn expected(
    status: BookingStatus,
    role: ActorRole,
    action: BookingAction,
) -> Option<BookingStatus> {
    use ActorRole::*;
    use BookingAction::*;
    use BookingStatus::*;
    match (status, role, action) {
        (Pending, Provider, Accept) => Some(Accepted),
        (Pending, Provider, Reject) => Some(Rejected),
        (Pending, Client, Cancel) => Some(CancelledByClient),
        (Accepted, Client, Cancel) => Some(CancelledByClient),
        (Accepted, Provider, Start) => Some(InProgress),
        (Accepted, Provider, Cancel) => Some(CancelledByProvider),
        (InProgress, Provider, Complete) => Some(Completed),
        _ => None,
    }
}

#[test]
fn transition_table_covers_every_triple() {
    let mut allowed = 0;
    for status in BookingStatus::ALL {
        for role in ActorRole::ALL {
            for action in BookingAction::ALL {
                let result = next_status(status, role, action);
                match expected(status, role, action) {
                    Some(next) => {
                        allowed += 1;
                        assert_eq!(result.unwrap(), next, "{status} {role} {action}");
                    }
                    None => assert!(
                        matches!(result, Err(BookingError::IllegalTransition { .. })),
                        "{status} {role} {action} should be illegal"
                    ),
                }
            }
        }
    }
    assert_eq!(allowed, 7);
}

#[test]
fn terminal_states_accept_nothing() {
    for status in BookingStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
        for role in ActorRole::ALL {
            for action in BookingAction::ALL {
                assert!(next_status(status, role, action).is_err());
            }
        }
    }
}

async fn update(router: &axum::Router, id: &str, role: &str, action: &str) -> (StatusCode, serde_json::Value) {
    post_json(
        router,
        &format!("/bookings/{id}/status"),
        json!({ "actorRole": role, "action": action }),
    )
    .await
}

#[tokio::test]
async fn provider_drives_booking_to_completion() {
    let app = test_app();
    let id = create_booking(&app.router).await;

    let (_, booking) = get(&app.router, &format!("/bookings/{id}")).await;
    assert_eq!(booking["status"], "PENDING");

    for (action, status) in [
        ("accept", "ACCEPTED"),
        ("start", "IN_PROGRESS"),
        ("complete", "COMPLETED"),
    ] {
        let (code, body) = update(&app.router, &id, "provider", action).await;
        assert_eq!(code, StatusCode::OK, "{body}");
        assert_eq!(body["status"], status);
    }

    for (role, action) in [("provider", "cancel"), ("client", "cancel"), ("provider", "start")] {
        let (code, body) = update(&app.router, &id, role, action).await;
        assert_eq!(code, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ILLEGAL_TRANSITION");
        assert!(body["error"].as_str().unwrap().contains("COMPLETED"));
    }
}

#[tokio::test]
async fn client_cancel_blocks_provider_accept() {
    let app = test_app();
    let id = create_booking(&app.router).await;

    let (code, body) = update(&app.router, &id, "client", "cancel").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED_BY_CLIENT");

    let (code, body) = update(&app.router, &id, "provider", "accept").await;
    assert_eq!(code, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ILLEGAL_TRANSITION");
    assert!(body["requestId"].is_string());
}

#[tokio::test]
async fn client_cannot_accept_own_booking() {
    let app = test_app();
    let id = create_booking(&app.router).await;
    let (code, _) = update(&app.router, &id, "client", "accept").await;
    assert_eq!(code, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_and_malformed_booking_ids() {
    let app = test_app();
    let (code, body) = get(&app.router, &format!("/bookings/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (code, _) = get(&app.router, "/bookings/not-a-uuid").await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_booking_input_is_rejected() {
    let app = test_app();
    let mut body = common::booking_body();
    body["priceTotal"] = json!(0);
    let (code, response) = post_json(&app.router, "/bookings", body).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "INVALID_INPUT");

    let (code, _) = update(&app.router, &uuid::Uuid::new_v4().to_string(), "admin", "accept").await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

fn new_booking() -> NewBooking {
    let start = Utc::now() + Duration::days(1);
    NewBooking {
        client_id: "client_c".to_string(),
        provider_id: "provider_c".to_string(),
        service_id: "svc_c".to_string(),
        schedule: Schedule {
            start,
            end: start + Duration::hours(1),
        },
        price_total: BigDecimal::from(90),
        location: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accept_and_reject_never_both_succeed() {
    let service = Arc::new(BookingService::new(Arc::new(InMemoryBookingRepository::new())));

    for _ in 0..50 {
        let booking = service.create_booking(new_booking()).await.unwrap();
        let accept = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .update_booking_status(booking.id, ActorRole::Provider, BookingAction::Accept)
                    .await
            })
        };
        let reject = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .update_booking_status(booking.id, ActorRole::Provider, BookingAction::Reject)
                    .await
            })
        };

        let (accept, reject) = (accept.await.unwrap(), reject.await.unwrap());
        assert!(accept.is_ok() != reject.is_ok(), "exactly one transition applies");

        let stored = service.get_booking(booking.id).await.unwrap();
        match (accept, reject) {
            (Ok(status), Err(_)) | (Err(_), Ok(status)) => assert_eq!(stored.status, status),
            _ => unreachable!(),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn valid_and_invalid_transition_race() {
    let service = Arc::new(BookingService::new(Arc::new(InMemoryBookingRepository::new())));

    for _ in 0..50 {
        let booking = service.create_booking(new_booking()).await.unwrap();
        // start is only valid after accept; it must never apply from PENDING
        let (cancel, start) = tokio::join!(
            {
                let service = service.clone();
                async move {
                    service
                        .update_booking_status(booking.id, ActorRole::Client, BookingAction::Cancel)
                        .await
                }
            },
            {
                let service = service.clone();
                async move {
                    service
                        .update_booking_status(booking.id, ActorRole::Provider, BookingAction::Start)
                        .await
                }
            }
        );

        assert_eq!(cancel.unwrap(), BookingStatus::CancelledByClient);
        assert!(matches!(start, Err(BookingError::IllegalTransition { .. })));
    }
}
