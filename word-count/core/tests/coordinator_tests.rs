// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::time::{Duration, Instant};
use word_count_core::control_channel::{expect_range, expect_signal, send_signal};
use word_count_core::{
    ClusterError, ControlChannel, ControlMessage, Coordinator, MemoryChannel, Range,
    SynchronizationSignal, BARRIERS,
};

/// Simulated worker that answers every barrier correctly, optionally late
async fn obedient_worker(
    mut channel: MemoryChannel,
    local: Option<Range>,
    delay: Duration,
) -> word_count_core::Result<Option<Range>> {
    let mut global = None;
    for barrier in BARRIERS {
        expect_signal(&mut channel, barrier.start).await?;
        tokio::time::sleep(delay).await;
        if barrier.start == SynchronizationSignal::Coordinate {
            channel.send(ControlMessage::Range(local)).await?;
            global = expect_range(&mut channel).await?;
        }
        send_signal(&mut channel, barrier.ready).await?;
    }
    Ok(global)
}

fn cluster(size: usize) -> (Vec<MemoryChannel>, Vec<MemoryChannel>) {
    (0..size)
        .map(|i| MemoryChannel::pair(format!("worker {}", i)))
        .unzip()
}

// ============================================================
// full run
// ============================================================

#[tokio::test]
async fn test_run_walks_every_barrier_and_merges_ranges() {
    // Arrange
    let (coordinator_side, worker_side) = cluster(3);
    let locals = [Some(Range::new(2, 2)), None, Some(Range::new(1, 5))];
    let workers: Vec<_> = worker_side
        .into_iter()
        .zip(locals)
        .map(|(channel, local)| tokio::spawn(obedient_worker(channel, local, Duration::ZERO)))
        .collect();
    let mut coordinator = Coordinator::new(coordinator_side, None);

    // Act
    let report = coordinator.run().await.unwrap();

    // Assert
    assert_eq!(report.global_range, Some(Range::new(1, 5)));
    assert_eq!(report.timings.entries().len(), BARRIERS.len());
    for worker in workers {
        assert_eq!(worker.await.unwrap().unwrap(), Some(Range::new(1, 5)));
    }
}

#[tokio::test]
async fn test_all_empty_ranges_merge_to_none() {
    // Arrange
    let (coordinator_side, worker_side) = cluster(2);
    let workers: Vec<_> = worker_side
        .into_iter()
        .map(|channel| tokio::spawn(obedient_worker(channel, None, Duration::ZERO)))
        .collect();
    let mut coordinator = Coordinator::new(coordinator_side, None);

    // Act
    let report = coordinator.run().await.unwrap();

    // Assert
    assert_eq!(report.global_range, None);
    for worker in workers {
        assert_eq!(worker.await.unwrap().unwrap(), None);
    }
}

// ============================================================
// barrier semantics
// ============================================================

#[tokio::test]
async fn test_barrier_waits_for_slowest_worker() {
    // Arrange
    let (coordinator_side, worker_side) = cluster(3);
    let mut workers = worker_side.into_iter();
    let slow = workers.next().unwrap();
    tokio::spawn(async move {
        let mut channel = slow;
        expect_signal(&mut channel, SynchronizationSignal::Awake).await?;
        tokio::time::sleep(Duration::from_millis(200)).await;
        send_signal(&mut channel, SynchronizationSignal::ReadyToMap).await?;
        // keep the channel open until the test ends
        channel.recv().await
    });
    for mut channel in workers {
        tokio::spawn(async move {
            expect_signal(&mut channel, SynchronizationSignal::Awake).await?;
            send_signal(&mut channel, SynchronizationSignal::ReadyToMap).await?;
            channel.recv().await
        });
    }
    let mut coordinator = Coordinator::new(coordinator_side, None);

    // Act
    let started = Instant::now();
    let elapsed = coordinator
        .run_phase(SynchronizationSignal::Awake, SynchronizationSignal::ReadyToMap)
        .await
        .unwrap();

    // Assert
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(elapsed >= Duration::from_millis(200));
    assert_eq!(coordinator.num_workers(), 3);
}

#[tokio::test]
async fn test_wrong_ready_signal_is_protocol_violation() {
    // Arrange
    let (coordinator_side, worker_side) = cluster(2);
    let mut workers = worker_side.into_iter();
    let mut good = workers.next().unwrap();
    let mut bad = workers.next().unwrap();
    tokio::spawn(async move {
        expect_signal(&mut good, SynchronizationSignal::Awake).await?;
        send_signal(&mut good, SynchronizationSignal::ReadyToMap).await?;
        good.recv().await
    });
    tokio::spawn(async move {
        expect_signal(&mut bad, SynchronizationSignal::Awake).await?;
        send_signal(&mut bad, SynchronizationSignal::ReadyToShuffle).await?;
        bad.recv().await
    });
    let mut coordinator = Coordinator::new(coordinator_side, None);

    // Act
    let result = coordinator
        .run_phase(SynchronizationSignal::Awake, SynchronizationSignal::ReadyToMap)
        .await;

    // Assert
    match result {
        Err(ClusterError::Worker { index, source }) => {
            assert_eq!(index, 1);
            match *source {
                ClusterError::ProtocolViolation { expected, received } => {
                    assert_eq!(expected, "READY_TO_MAP");
                    assert_eq!(received, "READY_TO_SHUFFLE");
                }
                other => panic!("expected protocol violation, got {:?}", other),
            }
        }
        other => panic!("expected worker error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_ready_signal_times_out() {
    // Arrange
    let (coordinator_side, worker_side) = cluster(2);
    for mut channel in worker_side {
        tokio::spawn(async move {
            // receives AWAKE, never answers
            channel.recv().await?;
            channel.recv().await
        });
    }
    let mut coordinator = Coordinator::new(coordinator_side, Some(Duration::from_millis(100)));

    // Act
    let result = coordinator
        .run_phase(SynchronizationSignal::Awake, SynchronizationSignal::ReadyToMap)
        .await;

    // Assert
    match result {
        Err(ClusterError::BarrierTimeout { phase, elapsed }) => {
            assert_eq!(phase, SynchronizationSignal::Awake);
            assert!(elapsed >= Duration::from_millis(100));
        }
        other => panic!("expected barrier timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_ready_signal_blocks_without_timeout() {
    // Arrange
    let (coordinator_side, worker_side) = cluster(1);
    let mut held = worker_side;
    let mut coordinator = Coordinator::new(coordinator_side, None);

    // Act
    let result = tokio::time::timeout(
        Duration::from_millis(200),
        coordinator.run_phase(SynchronizationSignal::Awake, SynchronizationSignal::ReadyToMap),
    )
    .await;

    // Assert
    assert!(result.is_err(), "barrier completed without a ready signal");
    assert_eq!(
        held[0].recv().await.unwrap(),
        ControlMessage::Signal(SynchronizationSignal::Awake)
    );
}

#[tokio::test]
async fn test_disconnected_worker_fails_the_barrier() {
    // Arrange
    let (coordinator_side, worker_side) = cluster(2);
    drop(worker_side);
    let mut coordinator = Coordinator::new(coordinator_side, None);

    // Act
    let result = coordinator
        .run_phase(SynchronizationSignal::Awake, SynchronizationSignal::ReadyToMap)
        .await;

    // Assert
    let error = result.unwrap_err();
    assert!(matches!(error.root(), ClusterError::ChannelClosed(_)));
}

#[tokio::test]
async fn test_signal_in_place_of_range_is_rejected() {
    // Arrange
    let (coordinator_side, worker_side) = cluster(1);
    let mut worker = worker_side.into_iter().next().unwrap();
    tokio::spawn(async move {
        expect_signal(&mut worker, SynchronizationSignal::Coordinate).await?;
        send_signal(&mut worker, SynchronizationSignal::ReadyToReduce2).await?;
        worker.recv().await
    });
    let mut coordinator = Coordinator::new(coordinator_side, None);

    // Act
    let result = coordinator.coordinate_ranges().await;

    // Assert
    assert!(matches!(
        result.unwrap_err().root(),
        ClusterError::ProtocolViolation { .. }
    ));
}

#[tokio::test]
async fn test_range_exchange_shares_one_deadline() {
    // Arrange: each half alone fits in the timeout, both together do not
    let (coordinator_side, worker_side) = cluster(1);
    let mut worker = worker_side.into_iter().next().unwrap();
    tokio::spawn(async move {
        expect_signal(&mut worker, SynchronizationSignal::Coordinate).await?;
        tokio::time::sleep(Duration::from_millis(70)).await;
        worker.send(ControlMessage::Range(Some(Range::new(1, 2)))).await?;
        expect_range(&mut worker).await?;
        tokio::time::sleep(Duration::from_millis(70)).await;
        send_signal(&mut worker, SynchronizationSignal::ReadyToReduce2).await?;
        worker.recv().await
    });
    let mut coordinator = Coordinator::new(coordinator_side, Some(Duration::from_millis(100)));

    // Act
    let result = coordinator.coordinate_ranges().await;

    // Assert
    match result {
        Err(ClusterError::BarrierTimeout { phase, elapsed }) => {
            assert_eq!(phase, SynchronizationSignal::Coordinate);
            assert!(elapsed >= Duration::from_millis(100));
        }
        other => panic!("expected barrier timeout, got {:?}", other),
    }
}
