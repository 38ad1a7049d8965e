/// End-to-end poll cycles against the RWS simulator and a throwaway SQLite file.
use std::sync::Arc;
use std::time::Duration;

use rws_monitor::normalize::UNAVAILABLE;
use rws_monitor::{
    Endpoint, ErrorKind, IssueSubject, MeasurementStore, Poller, RwsClient, RwsClientConfig,
};
use sim::{ControllerState, ExecState, Resource, SharedState};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

struct Harness {
    sim: SharedState,
    poller: Arc<Poller>,
    port: u16,
    db_path: std::path::PathBuf,
    _dir: TempDir,
}

async fn start_sim() -> (SharedState, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let state = Arc::new(RwLock::new(ControllerState::default()));
    tokio::spawn(sim::serve(listener, Arc::clone(&state)));
    (state, port)
}

async fn harness_with_timeout(timeout: Duration) -> Harness {
    let (sim, port) = start_sim().await;
    {
        let mut s = sim.write().await;
        s.position = [100.0, 200.5, -30.25];
        s.tcp_speed = 0.75;
        s.gripper_closed = true;
    }
    let config = RwsClientConfig {
        port,
        timeout,
        ..Default::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("measurements.db");
    let store = MeasurementStore::open(&db_path).unwrap();
    let poller = Poller::with_parts(RwsClient::new(config).unwrap(), store, 40, 5);
    Harness {
        sim,
        poller: Arc::new(poller),
        port,
        db_path,
        _dir: dir,
    }
}

async fn harness() -> Harness {
    harness_with_timeout(Duration::from_secs(5)).await
}

#[tokio::test]
async fn test_healthy_cycle_updates_display_history_and_store() {
    let h = harness().await;

    let report = h.poller.poll_once().await.expect("no cycle in flight");
    assert!(report.issues.is_empty(), "{:?}", report.issues);

    assert_eq!(report.readout.motors, "Päällä (käyttövalmis)");
    assert_eq!(report.readout.program, "Käynnissä");
    assert_eq!(report.readout.gripper, "Kiinni");
    assert_eq!(report.readout.speed, "0,75");
    assert_eq!(report.readout.pos_x, "X: 100");
    assert_eq!(report.readout.pos_y, "Y: 200,5");
    assert_eq!(report.readout.pos_z, "Z: -30,25");
    assert!(report.stored_id.is_some());

    let state = h.poller.snapshot().await;
    assert_eq!(state.speed_history.len(), 1);
    assert_eq!(state.speed_history.latest().unwrap().value, 0.75);
    assert_eq!(state.gripper_history.latest().unwrap().value, 1.0);
    let pos = state.position_history.latest().unwrap();
    assert_eq!((pos.x, pos.y, pos.z), (100.0, 200.5, -30.25));
    assert!(state.last_update_text().unwrap().starts_with("Päivitetty: "));
    assert_eq!(state.status, None);

    assert_eq!(state.latest_measurements.len(), 1);
    let row = &state.latest_measurements[0];
    assert_eq!(row.gripper, Some(true));
    assert_eq!(row.tcp_speed, Some(0.75));
    assert_eq!((row.pos_x, row.pos_y, row.pos_z), (Some(100.0), Some(200.5), Some(-30.25)));
}

#[tokio::test]
async fn test_failed_endpoints_are_unavailable_and_not_plotted() {
    let h = harness().await;
    {
        let mut s = h.sim.write().await;
        s.fail(Resource::RobTarget);
        s.fail(Resource::TcpSpeed);
    }

    let report = h.poller.poll_once().await.unwrap();
    assert_eq!(report.readout.speed, UNAVAILABLE);
    assert_eq!(report.readout.pos_x, UNAVAILABLE);
    assert_eq!(report.readout.pos_y, UNAVAILABLE);
    assert_eq!(report.readout.pos_z, UNAVAILABLE);
    // The others are unaffected.
    assert_eq!(report.readout.gripper, "Kiinni");
    assert_eq!(report.readout.motors, "Päällä (käyttövalmis)");

    let network: Vec<_> = report.issues_of(ErrorKind::Network).collect();
    assert_eq!(network.len(), 2);
    assert!(network.iter().all(|i| i.message.contains("HTTP 503")));

    let state = h.poller.snapshot().await;
    assert!(state.speed_history.is_empty());
    assert!(state.position_history.is_empty());
    assert_eq!(state.gripper_history.len(), 1);

    let row = &state.latest_measurements[0];
    assert_eq!(row.tcp_speed, None);
    assert_eq!((row.pos_x, row.pos_y, row.pos_z), (None, None, None));
    assert_eq!(row.gripper, Some(true));

    // Recovery on the next cycle.
    h.sim.write().await.recover(Resource::TcpSpeed);
    let report = h.poller.poll_once().await.unwrap();
    assert_eq!(report.readout.speed, "0,75");
    assert_eq!(h.poller.snapshot().await.speed_history.len(), 1);
}

#[tokio::test]
async fn test_program_state_from_execstate_span() {
    let h = harness().await;
    {
        let mut s = h.sim.write().await;
        s.exec_state_class = "execstate".to_string();
        s.exec_state = ExecState::Stopped;
        s.motors_on = false;
    }
    let report = h.poller.poll_once().await.unwrap();
    assert_eq!(report.readout.program, "Pysäytetty");
    assert_eq!(report.readout.motors, "Pois päältä");
}

#[tokio::test]
async fn test_unknown_gripper_value_is_stored_null() {
    let h = harness().await;
    h.sim.write().await.gripper_raw = Some("2".to_string());

    let report = h.poller.poll_once().await.unwrap();
    assert_eq!(report.readout.gripper, "2");
    assert_eq!(report.sample.gripper, None);
    let state = h.poller.snapshot().await;
    assert_eq!(state.latest_measurements[0].gripper, None);
}

#[tokio::test]
async fn test_credentials_are_sent_with_every_request() {
    let h = harness().await;
    let client = RwsClient::new(RwsClientConfig {
        port: h.port,
        ..Default::default()
    })
    .unwrap();

    // Without credentials the simulator refuses.
    let anonymous = reqwest::get(client.url(Endpoint::ControllerState)).await.unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    let body = client.fetch(Endpoint::ControllerState).await.unwrap();
    assert!(body.contains("motoron"));
}

#[tokio::test]
async fn test_history_is_capped_at_forty() {
    let h = harness().await;
    for i in 0..41 {
        h.sim.write().await.tcp_speed = i as f64;
        h.poller.poll_once().await.unwrap();
    }

    let state = h.poller.snapshot().await;
    assert_eq!(state.speed_history.len(), 40);
    assert_eq!(state.speed_history.latest().unwrap().value, 40.0);
    assert_eq!(state.speed_history.get(39).unwrap().value, 1.0);
    assert!(!state.speed_history.iter().any(|e| e.value == 0.0));
    assert_eq!(state.latest_measurements.len(), 5);
    assert_eq!(state.latest_measurements[0].tcp_speed, Some(40.0));
    assert_eq!(state.cycles, 41);
}

#[tokio::test]
async fn test_write_failure_still_reads_back() {
    let h = harness().await;
    h.poller.poll_once().await.unwrap();

    rusqlite::Connection::open(&h.db_path)
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER reject_inserts BEFORE INSERT ON measurements
             BEGIN SELECT RAISE(ABORT, 'read-only'); END;",
        )
        .unwrap();

    h.sim.write().await.tcp_speed = 1.5;
    let report = h.poller.poll_once().await.unwrap();

    assert_eq!(report.stored_id, None);
    let persistence: Vec<_> = report.issues_of(ErrorKind::Persistence).collect();
    assert_eq!(persistence.len(), 1);
    assert_eq!(persistence[0].subject, IssueSubject::StoreWrite);

    let state = h.poller.snapshot().await;
    assert!(state.status.as_deref().unwrap().starts_with("DB-virhe: "));
    // In-memory history still reflects the cycle.
    assert_eq!(state.speed_history.latest().unwrap().value, 1.5);
    // The read-back ran and shows the only stored row.
    assert_eq!(state.latest_measurements.len(), 1);
    assert_eq!(state.latest_measurements[0].tcp_speed, Some(0.75));
}

#[tokio::test]
async fn test_read_failure_keeps_previous_rows() {
    let h = harness().await;
    h.poller.poll_once().await.unwrap();

    rusqlite::Connection::open(&h.db_path)
        .unwrap()
        .execute_batch("DROP TABLE measurements;")
        .unwrap();

    let report = h.poller.poll_once().await.unwrap();
    let subjects: Vec<_> = report
        .issues_of(ErrorKind::Persistence)
        .map(|i| i.subject)
        .collect();
    assert_eq!(subjects, vec![IssueSubject::StoreWrite, IssueSubject::StoreRead]);

    let state = h.poller.snapshot().await;
    assert!(state.status.as_deref().unwrap().starts_with("DB-lukuvirhe: "));
    assert_eq!(state.latest_measurements.len(), 1);
    assert_eq!(state.cycles, 2);
    assert_eq!(state.speed_history.len(), 2);
}

#[tokio::test]
async fn test_overlapping_cycle_is_skipped() {
    let h = harness().await;
    h.sim.write().await.delayed = Some((Resource::CtrlState, Duration::from_millis(400)));

    let poller = Arc::clone(&h.poller);
    let first = tokio::spawn(async move { poller.poll_once().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.poller.is_polling());
    assert!(h.poller.poll_once().await.is_none());
    assert!(!h.poller.trigger());

    assert!(first.await.unwrap().is_some());
    assert!(!h.poller.is_polling());
    assert_eq!(h.poller.snapshot().await.cycles, 1);
}

#[tokio::test]
async fn test_timeout_counts_as_failure() {
    let h = harness_with_timeout(Duration::from_millis(200)).await;
    h.sim.write().await.delayed = Some((Resource::Gripper, Duration::from_secs(2)));

    let report = h.poller.poll_once().await.unwrap();
    assert_eq!(report.readout.gripper, UNAVAILABLE);
    let network: Vec<_> = report.issues_of(ErrorKind::Network).collect();
    assert_eq!(network.len(), 1);
    assert_eq!(network[0].subject, IssueSubject::Endpoint(Endpoint::Gripper));
    assert!(network[0].message.contains("timed out"));
    assert_eq!(report.readout.speed, "0,75");
}

#[tokio::test]
async fn test_unreachable_controller() {
    let dir = tempfile::tempdir().unwrap();
    // Bind then drop to get a port nobody listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = RwsClient::new(RwsClientConfig {
        port,
        ..Default::default()
    })
    .unwrap();
    let store = MeasurementStore::open(dir.path().join("m.db")).unwrap();
    let poller = Poller::with_parts(client, store, 40, 5);

    let report = poller.poll_once().await.unwrap();
    assert_eq!(report.issues_of(ErrorKind::Network).count(), 5);
    assert_eq!(report.readout.motors, UNAVAILABLE);
    // An all-NULL row is still written.
    assert!(report.stored_id.is_some());
}

#[tokio::test]
async fn test_timer_publishes_reports() {
    let h = harness().await;
    let mut reports = h.poller.subscribe();
    let timer = h.poller.spawn(Duration::from_millis(50));

    for _ in 0..3 {
        let report = tokio::time::timeout(Duration::from_secs(5), reports.recv())
            .await
            .expect("timer stalled")
            .unwrap();
        assert_eq!(report.readout.speed, "0,75");
    }
    timer.abort();
    assert!(h.poller.snapshot().await.cycles >= 3);
}

#[tokio::test]
async fn test_refresh_latest_loads_existing_rows() {
    let h = harness().await;
    h.poller.poll_once().await.unwrap();
    h.poller.poll_once().await.unwrap();

    let store = MeasurementStore::open(&h.db_path).unwrap();
    let fresh = Poller::with_parts(
        RwsClient::new(RwsClientConfig::default()).unwrap(),
        store,
        40,
        5,
    );
    fresh.refresh_latest().await.unwrap();
    let state = fresh.snapshot().await;
    assert_eq!(state.latest_measurements.len(), 2);
    assert_eq!(state.cycles, 0);
    assert_eq!(state.readout.motors, rws_monitor::normalize::FETCHING);
}
