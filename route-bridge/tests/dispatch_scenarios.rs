/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod support;

use futures::future::join_all;
use route_bridge::{
    DispatchError, EndpointUri, EngineErrorKind, RouteEngine, RouteLifecycleManager,
    RouteLogLevel, RouteSettings,
};
use std::time::Duration;
use support::{init_logging, local_manager};

#[tokio::test]
async fn mock_destination_receives_exactly_the_sent_body() {
    let (manager, _engine, mocks) = local_manager("scenario-1");
    manager
        .activate(
            &RouteSettings::default()
                .with_to_uri("mock:out")
                .with_maximum_redeliveries(0),
        )
        .await
        .expect("activation");

    manager.dispatcher().send("hello").await.expect("delivered");

    assert_eq!(mocks.endpoint("out").received_bodies(), vec!["hello"]);
    manager.deactivate().await;
}

#[tokio::test]
async fn unreachable_destination_is_retried_with_spacing_then_fails() {
    let (manager, _engine, mocks) = local_manager("scenario-2");
    let unreachable = mocks.unreachable("unreachable");
    manager
        .activate(
            &RouteSettings::default()
                .with_to_uri("mock:unreachable")
                .with_maximum_redeliveries(2)
                .with_redelivery_delay_ms(100),
        )
        .await
        .expect("activation");

    let err = manager
        .dispatcher()
        .send("x")
        .await
        .expect_err("every attempt fails");

    let DispatchError::Delivery(delivery) = err else {
        panic!("expected delivery failure, got {err:?}");
    };
    assert_eq!(delivery.attempts(), 3);
    assert_eq!(delivery.cause().kind(), EngineErrorKind::Unreachable);

    let instants = unreachable.attempt_instants();
    assert_eq!(instants.len(), 3);
    for pair in instants.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= Duration::from_millis(100));
    }
    manager.deactivate().await;
}

#[tokio::test]
async fn exhausted_record_is_diverted_to_configured_error_endpoint() {
    let (manager, _engine, mocks) = local_manager("error-sink");
    mocks.unreachable("down");
    manager
        .activate(
            &RouteSettings::default()
                .with_to_uri("mock:down")
                .with_error_uri("mock:dead-letters")
                .with_maximum_redeliveries(1)
                .with_redelivery_delay_ms(1),
        )
        .await
        .expect("activation");

    assert!(manager.dispatcher().send("lost").await.is_err());

    assert_eq!(mocks.endpoint("dead-letters").received_bodies(), vec!["lost"]);
    manager.deactivate().await;
}

#[tokio::test]
async fn empty_destination_and_error_uri_still_activate() {
    let (manager, _engine, _mocks) = local_manager("scenario-3");
    let identity = manager
        .activate(&RouteSettings::default().with_to_uri("").with_error_uri(""))
        .await
        .expect("activation");

    let configuration = manager.route_configuration().await.expect("active");
    for uri in [configuration.from_uri(), configuration.error_uri()] {
        assert!(!uri.is_empty());
        assert!(uri.contains(identity.as_str()));
        uri.parse::<EndpointUri>().expect("well-formed uri");
    }
    assert!(manager.dispatcher().send("nowhere").await.is_ok());
    manager.deactivate().await;
}

#[tokio::test]
async fn reactivation_produces_a_new_identity() {
    let (manager, _engine, _mocks) = local_manager("scenario-4");

    let first = manager
        .activate(&RouteSettings::default())
        .await
        .expect("first activation");
    manager.deactivate().await;
    let second = manager
        .activate(&RouteSettings::default())
        .await
        .expect("second activation");

    assert_ne!(first, second);
    manager.deactivate().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sends_all_complete() {
    let (manager, _engine, mocks) = local_manager("concurrent");
    manager
        .activate(
            &RouteSettings::default()
                .with_to_uri("mock:out")
                .with_log_level(RouteLogLevel::Debug),
        )
        .await
        .expect("activation");

    let callers = (0..10).map(|caller| {
        let dispatcher = manager.dispatcher();
        tokio::spawn(async move {
            let mut results = Vec::new();
            for record in 0..10 {
                results.push(dispatcher.send(&format!("{caller}-{record}")).await);
            }
            results
        })
    });
    let results: Vec<_> = join_all(callers)
        .await
        .into_iter()
        .flat_map(|joined| joined.expect("caller task joins"))
        .collect();

    assert_eq!(results.len(), 100);
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(mocks.endpoint("out").received_count(), 100);
    manager.deactivate().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deactivation_during_in_flight_send_fails_it_cleanly() {
    let (manager, engine, mocks) = local_manager("in-flight");
    let slow = mocks.unreachable("slow");
    manager
        .activate(
            &RouteSettings::default()
                .with_to_uri("mock:slow")
                .with_maximum_redeliveries(5)
                .with_redelivery_delay_ms(30_000),
        )
        .await
        .expect("activation");

    let dispatcher = manager.dispatcher();
    let in_flight = tokio::spawn(async move { dispatcher.send("pending").await });
    while slow.attempt_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let report = manager.deactivate().await;
    assert!(report.is_clean());

    let result = tokio::time::timeout(Duration::from_secs(5), in_flight)
        .await
        .expect("in-flight send is released by teardown")
        .expect("send task joins");
    let Err(DispatchError::Delivery(delivery)) = result else {
        panic!("expected a delivery failure, got {result:?}");
    };
    assert_eq!(delivery.cause().kind(), EngineErrorKind::RouteStopped);
    assert_eq!(
        manager.dispatcher().send("after").await,
        Err(DispatchError::NotActive)
    );
    assert!(!engine.is_running());
}

#[tokio::test]
async fn file_destination_appends_each_record() {
    let directory = tempfile::tempdir().expect("tempdir");
    let path = directory.path().join("records.txt");
    let (manager, _engine, _mocks) = local_manager("file");
    manager
        .activate(&RouteSettings::default().with_to_uri(format!("file:{}", path.display())))
        .await
        .expect("activation");

    let dispatcher = manager.dispatcher();
    dispatcher.send("one").await.expect("written");
    dispatcher.send_record(b"two").await.expect("written");
    manager.deactivate().await;

    assert_eq!(std::fs::read_to_string(&path).expect("read back"), "one\ntwo\n");
}

#[tokio::test]
async fn deactivating_one_manager_keeps_a_shared_engine_serving_the_other() {
    init_logging();
    let (_, engine, mocks) = local_manager("shared");
    let left = RouteLifecycleManager::new("left", engine.clone());
    let right = RouteLifecycleManager::new("right", engine.clone());
    left
        .activate(&RouteSettings::default().with_to_uri("mock:left"))
        .await
        .expect("left activation");
    right
        .activate(&RouteSettings::default().with_to_uri("mock:right"))
        .await
        .expect("right activation");

    assert!(left.deactivate().await.is_clean());

    assert!(engine.is_running());
    assert_eq!(engine.route_count().await, 1);
    right.dispatcher().send("still here").await.expect("delivered");
    assert_eq!(mocks.endpoint("right").received_bodies(), vec!["still here"]);

    assert!(right.deactivate().await.is_clean());
    assert_eq!(engine.route_count().await, 0);
    assert!(!engine.is_running());
}
