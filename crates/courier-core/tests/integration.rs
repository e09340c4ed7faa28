//! Integration tests for the assembled messaging core.
//!
//! Every test builds its own [`Courier`], so they share no state.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};

use courier_core::{
    AccountId, Courier, CourierConfig, Error, ErrorKind, FolderKind, Message, QueryParams,
    SortKey, SortOrder, spawn_release_loop,
};

fn courier() -> Courier {
    Courier::new(CourierConfig::default()).unwrap()
}

fn register(courier: &Courier, email: &str) -> AccountId {
    let registration = courier.accounts().register(email).unwrap();
    assert!(registration.is_clean(), "{:?}", registration.failures);
    registration.account.id
}

fn total(courier: &Courier, account: AccountId, folder: FolderKind) -> usize {
    courier
        .folders()
        .query(account, &QueryParams::new(folder))
        .unwrap()
        .num_total
}

#[test]
fn message_ids_strictly_increase() {
    let courier = courier();
    register(&courier, "a@x.com");
    register(&courier, "b@x.com");

    let ids: Vec<_> = (0..20)
        .map(|i| {
            courier
                .dispatcher()
                .dispatch(Message::new("a@x.com", ["b@x.com"], format!("#{i}")))
                .unwrap()
        })
        .collect();

    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn retrieve_is_idempotent() {
    let courier = courier();
    register(&courier, "a@x.com");
    let id = courier
        .dispatcher()
        .dispatch(Message::new("a@x.com", ["b@x.com"], "hello").with_body("body"))
        .unwrap();

    let first = courier.dispatcher().retrieve_message(id).unwrap();
    let second = courier.dispatcher().retrieve_message(id).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.message.body, b"body");
}

#[test]
fn two_registered_recipients_round_trip() {
    let courier = courier();
    let sender = register(&courier, "s@x.com");
    let a = register(&courier, "a@x.com");
    let b = register(&courier, "b@x.com");

    let id = courier
        .dispatcher()
        .dispatch(Message::new("s@x.com", ["a@x.com", "b@x.com"], "hi"))
        .unwrap();

    assert_eq!(total(&courier, sender, FolderKind::Sent), 1);
    assert_eq!(total(&courier, a, FolderKind::Inbox), 1);
    assert_eq!(total(&courier, b, FolderKind::Inbox), 1);
    for account in [sender, a, b] {
        assert_eq!(courier.folders().get_one(account, id).unwrap().message_id, id);
    }
    assert!(courier.pending().list_all().unwrap().is_empty());
}

#[test]
fn pending_resolves_on_registration() {
    let courier = courier();
    register(&courier, "s@x.com");
    let id = courier
        .dispatcher()
        .dispatch(Message::new("s@x.com", ["C@x.com"], "before you joined"))
        .unwrap();
    assert_eq!(courier.pending().list_all().unwrap().len(), 1);

    let c = register(&courier, "C@x.com");

    let inbox = courier
        .folders()
        .query(c, &QueryParams::new(FolderKind::Inbox))
        .unwrap();
    assert_eq!(inbox.num_total, 1);
    assert_eq!(inbox.elems[0].message_id, id);
    assert!(
        courier
            .pending()
            .list_all()
            .unwrap()
            .iter()
            .all(|p| !(p.entry.message_id == id && p.recipient == "c@x.com"))
    );
}

#[test]
fn pending_keeps_every_unresolved_recipient() {
    let courier = courier();
    register(&courier, "s@x.com");
    courier
        .dispatcher()
        .dispatch(Message::new("s@x.com", ["c@x.com", "d@x.com"], "two strangers"))
        .unwrap();

    let c = register(&courier, "c@x.com");
    let d = register(&courier, "d@x.com");
    assert_eq!(total(&courier, c, FolderKind::Inbox), 1);
    assert_eq!(total(&courier, d, FolderKind::Inbox), 1);
}

#[test]
fn pagination_over_twenty_five_entries() {
    let courier = courier();
    register(&courier, "s@x.com");
    let r = register(&courier, "r@x.com");
    for i in 0..25 {
        courier
            .dispatcher()
            .dispatch(Message::new("s@x.com", ["r@x.com"], format!("m{i:02}")))
            .unwrap();
    }

    let page = |n| {
        courier
            .folders()
            .query(r, &QueryParams::new(FolderKind::Inbox).page(10, n))
            .unwrap()
    };
    let first = page(0);
    assert_eq!(first.num_total, 25);
    assert_eq!(first.num_elems, 10);
    assert_eq!(page(2).num_elems, 5);
    assert_eq!(page(3).num_elems, 0);
}

#[test]
fn subject_sort_in_both_directions() {
    let courier = courier();
    register(&courier, "s@x.com");
    let r = register(&courier, "r@x.com");
    for subject in ["pear", "apple", "fig", "banana", "apple"] {
        courier
            .dispatcher()
            .dispatch(Message::new("s@x.com", ["r@x.com"], subject))
            .unwrap();
    }

    let subjects = |order| {
        courier
            .folders()
            .query(
                r,
                &QueryParams::new(FolderKind::Inbox).sorted(SortKey::Subject, order),
            )
            .unwrap()
            .elems
            .iter()
            .map(|e| e.message.subject().to_string())
            .collect::<Vec<_>>()
    };
    let up = subjects(SortOrder::Ascending);
    let down = subjects(SortOrder::Descending);
    assert!(up.windows(2).all(|w| w[0] <= w[1]));
    assert!(down.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn viewed_toggle_is_per_recipient() {
    let courier = courier();
    register(&courier, "s@x.com");
    let a = register(&courier, "a@x.com");
    let b = register(&courier, "b@x.com");
    let id = courier
        .dispatcher()
        .dispatch(Message::new("s@x.com", ["a@x.com", "b@x.com"], "read me"))
        .unwrap();

    let viewed = courier.folders().update_viewed(a, id, true).unwrap();
    assert!(viewed.is_viewed);
    assert!(viewed.viewed_at.is_some());
    assert!(!courier.folders().get_one(b, id).unwrap().is_viewed);

    let cleared = courier.folders().update_viewed(a, id, false).unwrap();
    assert!(!cleared.is_viewed);
    assert!(cleared.viewed_at.is_none());
}

#[test]
fn archive_moves_between_folders() {
    let courier = courier();
    register(&courier, "s@x.com");
    let r = register(&courier, "r@x.com");
    let id = courier
        .dispatcher()
        .dispatch(Message::new("s@x.com", ["r@x.com"], "keep"))
        .unwrap();

    courier.folders().archive(r, id).unwrap();
    assert_eq!(total(&courier, r, FolderKind::Inbox), 0);
    assert_eq!(total(&courier, r, FolderKind::Archive), 1);

    courier.folders().unarchive(r, id).unwrap();
    assert_eq!(total(&courier, r, FolderKind::Inbox), 1);
}

#[test]
fn concurrent_dispatches_to_one_inbox() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let courier = courier();
    register(&courier, "s@x.com");
    let r = register(&courier, "r@x.com");

    let ids: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let courier = &courier;
                scope.spawn(move || {
                    (0..PER_THREAD)
                        .map(|i| {
                            courier
                                .dispatcher()
                                .dispatch(Message::new("s@x.com", ["r@x.com"], format!("{t}/{i}")))
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), THREADS * PER_THREAD);
    assert_eq!(total(&courier, r, FolderKind::Inbox), THREADS * PER_THREAD);
    for id in ids {
        assert!(courier.folders().get_one(r, id).is_ok());
    }
}

#[test]
fn concurrent_registration_and_dispatch_lose_nothing() {
    let courier = courier();
    register(&courier, "s@x.com");

    let late = std::thread::scope(|scope| {
        let sender = scope.spawn(|| {
            for i in 0..50 {
                courier
                    .dispatcher()
                    .dispatch(Message::new("s@x.com", ["late@x.com"], format!("{i}")))
                    .unwrap();
            }
        });
        let registrar = scope.spawn(|| register(&courier, "late@x.com"));
        sender.join().unwrap();
        registrar.join().unwrap()
    });

    assert_eq!(total(&courier, late, FolderKind::Inbox), 50);
    assert!(courier.pending().list_all().unwrap().is_empty());
}

#[test]
fn rejected_messages_consume_no_ids() {
    let courier = courier();
    register(&courier, "s@x.com");

    let first = courier
        .dispatcher()
        .dispatch(Message::new("s@x.com", ["r@x.com"], "one"))
        .unwrap();
    let err = courier
        .dispatcher()
        .dispatch(Message::new("s@x.com", Vec::<String>::new(), "none"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let second = courier
        .dispatcher()
        .dispatch(Message::new("s@x.com", ["r@x.com"], "two"))
        .unwrap();

    assert_eq!(second.get(), first.get() + 1);
}

#[test]
fn out_of_range_query_parameters_are_rejected() {
    let courier = courier();
    let r = register(&courier, "r@x.com");

    assert!(QueryParams::from_wire(4, 0, 1, 10, 0).is_err());
    assert!(QueryParams::from_wire(0, 3, 1, 10, 0).is_err());
    let too_big = QueryParams::new(FolderKind::Inbox).page(101, 0);
    assert!(matches!(
        courier.folders().query(r, &too_big),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn scheduled_message_waits_for_release() {
    let courier = courier();
    let s = register(&courier, "s@x.com");
    let r = register(&courier, "r@x.com");
    let now = Utc::now();
    let at = now + Duration::hours(1);

    let id = courier
        .dispatcher()
        .dispatch_at(Message::new("s@x.com", ["r@x.com"], "later").scheduled_for(at), now)
        .unwrap();
    assert_eq!(total(&courier, s, FolderKind::Scheduled), 1);
    assert_eq!(total(&courier, r, FolderKind::Inbox), 0);

    let released = courier.dispatcher().release_due(at).unwrap();
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].message_id, id);
    assert_eq!(total(&courier, s, FolderKind::Scheduled), 0);
    assert_eq!(total(&courier, s, FolderKind::Sent), 1);
    assert_eq!(total(&courier, r, FolderKind::Inbox), 1);
}

#[tokio::test]
async fn release_loop_delivers_due_messages() {
    let config = CourierConfig {
        schedule_grace_secs: 0,
        release_interval_ms: 10,
        ..CourierConfig::default()
    };
    let courier = Courier::new(config).unwrap();
    register(&courier, "s@x.com");
    let r = register(&courier, "r@x.com");

    let at = Utc::now() + Duration::milliseconds(100);
    courier
        .dispatcher()
        .dispatch(Message::new("s@x.com", ["r@x.com"], "tick").scheduled_for(at))
        .unwrap();
    assert_eq!(courier.dispatcher().scheduled_count().unwrap(), 1);

    let handle = spawn_release_loop(
        Arc::clone(courier.dispatcher()),
        courier.config().release_interval(),
    );
    for _ in 0..200 {
        if total(&courier, r, FolderKind::Inbox) == 1 {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    handle.abort();

    assert_eq!(total(&courier, r, FolderKind::Inbox), 1);
    assert_eq!(courier.dispatcher().scheduled_count().unwrap(), 0);
}
