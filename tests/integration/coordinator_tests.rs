use crate::common::*;
use listing_harvest::crawler::{wait_until, Command, CoordinatorEvent, Reply};
use listing_harvest::state::{CoordinatorState, RunPhase};
use listing_harvest::storage::{RunStatus, Store};
use listing_harvest::HarvestError;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_known_items_are_never_visited() {
    let db = TestDb::new();
    db.seed(&[stored("Acme", "acme"), stored("Cyberdyne", "cyberdyne")]);

    let navigator = Arc::new(FakeNavigator::new(vec![vec![
        link("acme", "Acme"),
        link("beta", "Beta"),
        link("cyberdyne", "Cyberdyne"),
    ]]));
    let (details, mut visits) = FakeDetails::new();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);
    let mut events = coordinator.subscribe();

    coordinator.start(1).await.unwrap();
    let seen = events_until_terminal(&mut events).await;

    assert!(seen.contains(&CoordinatorEvent::ItemsFoundOnPage {
        count: 3,
        page_number: 1
    }));
    let Some(CoordinatorEvent::Completed { stats }) = seen.last() else {
        panic!("expected completion, got {:?}", seen.last());
    };
    assert_eq!(stats.items_found, 3);
    assert_eq!(stats.items_processed, 1);
    assert_eq!(stats.error_count, 0);

    assert_eq!(
        visits.try_recv().unwrap(),
        "https://www.linkedin.com/company/beta/about/"
    );
    assert!(visits.try_recv().is_err());

    let records = coordinator.get_records().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2].name, "beta Robotics");
    assert_eq!(records[2].url, company_url("beta"));
    assert_eq!(records[2].phone, "N/A");
}

#[tokio::test]
async fn test_run_stops_at_page_budget() {
    let db = TestDb::new();
    let pages = (1..=5)
        .map(|page| {
            vec![
                link(&format!("first-{}", page), "First"),
                link(&format!("second-{}", page), "Second"),
            ]
        })
        .collect();
    let navigator = Arc::new(FakeNavigator::new(pages));
    let (details, _visits) = FakeDetails::new();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);

    coordinator.start(3).await.unwrap();
    let stats = coordinator.wait().await;

    assert_eq!(stats.pages_reached, 3);
    assert_eq!(stats.items_found, 6);
    assert_eq!(navigator.advances(), 2);
    assert!(navigator.url().ends_with("page=3"));

    let state = coordinator.get_state();
    assert_eq!(state.phase, RunPhase::Idle);
    assert!(!state.is_running);
}

#[tokio::test]
async fn test_last_page_completes_the_run_early() {
    let db = TestDb::new();
    let navigator = Arc::new(FakeNavigator::new(vec![
        vec![link("alpha", "Alpha")],
        vec![link("beta", "Beta")],
    ]));
    let (details, _visits) = FakeDetails::new();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);
    let mut events = coordinator.subscribe();

    coordinator.start(5).await.unwrap();
    let seen = events_until_terminal(&mut events).await;

    let Some(CoordinatorEvent::Completed { stats }) = seen.last() else {
        panic!("expected completion, got {:?}", seen.last());
    };
    assert_eq!(stats.pages_reached, 2);
    assert_eq!(stats.items_processed, 2);
    assert_eq!(stats.error_count, 0);

    let run = db.open().recent_runs(1).unwrap().remove(0);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.stats.items_processed, 2);
    assert_eq!(run.config_hash, "test-config");
}

#[tokio::test]
async fn test_empty_listing_is_reported_as_an_error() {
    let db = TestDb::new();
    let navigator = Arc::new(FakeNavigator::new(vec![Vec::new()]));
    let (details, _visits) = FakeDetails::new();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);

    coordinator.start(3).await.unwrap();
    let stats = coordinator.wait().await;

    assert_eq!(stats.items_found, 0);
    assert_eq!(stats.error_count, 1);
    assert!(coordinator.get_state().errors[0].contains("No items found"));
}

#[tokio::test]
async fn test_start_page_comes_from_listing_url() {
    let db = TestDb::new();
    let navigator = Arc::new(FakeNavigator::at(
        &format!("{}&page=4", LISTING),
        vec![vec![link("alpha", "Alpha")]],
    ));
    let (details, _visits) = FakeDetails::new();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);

    coordinator.start(1).await.unwrap();
    coordinator.wait().await;

    let state = coordinator.get_state();
    assert_eq!(state.start_page, 4);
    assert_eq!(state.current_page, 4);
}

#[tokio::test]
async fn test_failed_item_does_not_halt_the_queue() {
    let db = TestDb::new();
    let navigator = Arc::new(FakeNavigator::new(vec![vec![
        link("alpha", "Alpha"),
        link("beta", "Beta"),
        link("gamma", "Gamma"),
    ]]));
    let (details, _visits) = FakeDetails::new();
    let details = Arc::new(details.failing("beta"));
    let coordinator = coordinator(&db, &navigator, &details);

    coordinator.start(1).await.unwrap();
    let stats = coordinator.wait().await;

    assert_eq!(stats.items_processed, 2);
    assert_eq!(stats.error_count, 1);
    assert_eq!(details.closed_tabs(), 3);
    assert_eq!(details.open_tabs(), 0);

    let names: Vec<String> = coordinator
        .get_records()
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["alpha Robotics", "gamma Robotics"]);
}

#[tokio::test]
async fn test_extracted_name_is_checked_again() {
    let db = TestDb::new();
    db.seed(&[stored("Globex Corporation", "globex")]);

    let navigator = Arc::new(FakeNavigator::new(vec![vec![link(
        "globex-intl",
        "Globex Intl",
    )]]));
    let (details, mut visits) = FakeDetails::new();
    let details = Arc::new(details.named("globex-intl", "Globex Corporation"));
    let coordinator = coordinator(&db, &navigator, &details);
    let mut events = coordinator.subscribe();

    coordinator.start(1).await.unwrap();
    let seen = events_until_terminal(&mut events).await;

    assert!(visits.try_recv().is_ok());
    assert!(seen.iter().any(|event| matches!(
        event,
        CoordinatorEvent::ItemProcessed { skipped: true, .. }
    )));
    assert_eq!(coordinator.get_records().unwrap().len(), 1);
}

#[tokio::test]
async fn test_pause_holds_the_queue_cursor() {
    let db = TestDb::new();
    let navigator = Arc::new(FakeNavigator::new(vec![vec![
        link("alpha", "Alpha"),
        link("beta", "Beta"),
        link("gamma", "Gamma"),
    ]]));
    let (details, mut visits) = FakeDetails::new();
    let (details, gate) = details.gated();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);

    coordinator.start(1).await.unwrap();
    visits.recv().await.unwrap();

    coordinator.pause().unwrap();
    assert_eq!(coordinator.phase(), RunPhase::Paused);
    assert!(coordinator.get_state().is_paused);

    // The in-flight item still finishes.
    gate.add_permits(1);
    let finished = {
        let coordinator = Arc::clone(&coordinator);
        wait_until(
            move || {
                let coordinator = Arc::clone(&coordinator);
                async move { coordinator.get_state().processed_count == 1 }
            },
            Duration::from_secs(2),
            Duration::from_millis(10),
        )
        .await
    };
    assert!(finished);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let state = coordinator.get_state();
    assert_eq!(state.processed_count, 1);
    assert_eq!(state.queue_cursor, 1);
    assert!(visits.try_recv().is_err());

    // A paused run rejects a second pause.
    assert!(matches!(
        coordinator.pause(),
        Err(HarvestError::InvalidCommand { command: "pause", .. })
    ));

    gate.add_permits(10);
    coordinator.resume().unwrap();
    let stats = coordinator.wait().await;

    assert_eq!(stats.items_processed, 3);
    assert_eq!(
        visits.recv().await.unwrap(),
        "https://www.linkedin.com/company/beta/about/"
    );
}

#[tokio::test]
async fn test_stop_closes_the_open_tab() {
    let db = TestDb::new();
    let navigator = Arc::new(FakeNavigator::new(vec![vec![
        link("alpha", "Alpha"),
        link("beta", "Beta"),
    ]]));
    let (details, mut visits) = FakeDetails::new();
    let (details, _gate) = details.gated();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);
    let mut events = coordinator.subscribe();

    coordinator.start(2).await.unwrap();
    visits.recv().await.unwrap();
    assert_eq!(details.open_tabs(), 1);

    let stats = coordinator.stop().await.unwrap();
    assert_eq!(stats.items_processed, 0);
    assert_eq!(details.open_tabs(), 0);
    assert_eq!(details.closed_tabs(), 1);

    let seen = events_until_terminal(&mut events).await;
    assert!(matches!(seen.last(), Some(CoordinatorEvent::Stopped { .. })));
    assert_eq!(coordinator.phase(), RunPhase::Idle);
    assert!(coordinator.get_records().unwrap().is_empty());

    let run = db.open().recent_runs(1).unwrap().remove(0);
    assert_eq!(run.status, RunStatus::Stopped);
}

#[tokio::test]
async fn test_commands_rejected_while_running() {
    let db = TestDb::new();
    let navigator = Arc::new(FakeNavigator::new(vec![vec![link("alpha", "Alpha")]]));
    let (details, mut visits) = FakeDetails::new();
    let (details, _gate) = details.gated();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);

    coordinator.start(1).await.unwrap();
    visits.recv().await.unwrap();

    assert!(matches!(
        coordinator.start(1).await,
        Err(HarvestError::InvalidCommand { command: "start", .. })
    ));
    assert!(matches!(
        coordinator.clear_all(),
        Err(HarvestError::InvalidCommand { command: "clearAll", .. })
    ));
    assert!(matches!(
        coordinator.resume(),
        Err(HarvestError::InvalidCommand { command: "resume", .. })
    ));

    coordinator.stop().await.unwrap();
    assert!(matches!(
        coordinator.stop().await,
        Err(HarvestError::InvalidCommand { command: "stop", .. })
    ));
}

#[tokio::test]
async fn test_start_rejects_non_listing_tab() {
    let db = TestDb::new();
    let navigator = Arc::new(FakeNavigator::at(
        "https://www.linkedin.com/feed/",
        vec![vec![link("alpha", "Alpha")]],
    ));
    let (details, _visits) = FakeDetails::new();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);

    assert!(matches!(
        coordinator.start(1).await,
        Err(HarvestError::Setup(_))
    ));
    assert_eq!(coordinator.phase(), RunPhase::Idle);
    assert!(db.open().recent_runs(5).unwrap().is_empty());
}

#[tokio::test]
async fn test_start_rejects_out_of_range_budget() {
    let db = TestDb::new();
    let navigator = Arc::new(FakeNavigator::new(vec![vec![link("alpha", "Alpha")]]));
    let (details, _visits) = FakeDetails::new();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);

    assert!(matches!(
        coordinator.start(0).await,
        Err(HarvestError::Config(_))
    ));
    assert!(matches!(
        coordinator.start(21).await,
        Err(HarvestError::Config(_))
    ));
    assert_eq!(coordinator.phase(), RunPhase::Idle);
}

#[tokio::test]
async fn test_dispatch_answers_queries() {
    let db = TestDb::new();
    db.seed(&[stored("Acme", "acme")]);
    let navigator = Arc::new(FakeNavigator::new(vec![Vec::new()]));
    let (details, _visits) = FakeDetails::new();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);

    match coordinator.dispatch(Command::GetRecords).await.unwrap() {
        Reply::Records(records) => assert_eq!(records.len(), 1),
        other => panic!("unexpected reply {:?}", other),
    }
    match coordinator.dispatch(Command::GetState).await.unwrap() {
        Reply::State(state) => assert_eq!(state.phase, RunPhase::Idle),
        other => panic!("unexpected reply {:?}", other),
    }
    assert!(coordinator.dispatch(Command::Pause).await.is_err());

    coordinator.dispatch(Command::ClearAll).await.unwrap();
    assert!(coordinator.get_records().unwrap().is_empty());
    assert!(db.open().load_state().unwrap().is_none());
}

#[tokio::test]
async fn test_resume_rejected_while_idle() {
    let db = TestDb::new();
    let navigator = Arc::new(FakeNavigator::new(vec![vec![link("alpha", "Alpha")]]));
    let (details, _visits) = FakeDetails::new();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);

    assert!(matches!(
        coordinator.dispatch(Command::Resume).await,
        Err(HarvestError::InvalidCommand {
            command: "resume",
            phase: RunPhase::Idle
        })
    ));
    assert!(matches!(
        coordinator.resume(),
        Err(HarvestError::InvalidCommand { command: "resume", .. })
    ));
    assert!(matches!(
        coordinator.stop().await,
        Err(HarvestError::InvalidCommand { command: "stop", .. })
    ));
    assert_eq!(coordinator.phase(), RunPhase::Idle);
    assert!(!coordinator.get_state().is_running);

    // The machine is still usable afterwards.
    coordinator.start(1).await.unwrap();
    let stats = coordinator.wait().await;
    assert_eq!(stats.items_processed, 1);
    assert_eq!(coordinator.phase(), RunPhase::Idle);
}

#[tokio::test]
async fn test_resume_rejected_while_running() {
    let db = TestDb::new();
    let navigator = Arc::new(FakeNavigator::new(vec![vec![link("alpha", "Alpha")]]));
    let (details, mut visits) = FakeDetails::new();
    let (details, gate) = details.gated();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);

    coordinator.start(1).await.unwrap();
    visits.recv().await.unwrap();

    assert!(matches!(
        coordinator.dispatch(Command::Resume).await,
        Err(HarvestError::InvalidCommand {
            command: "resume",
            phase: RunPhase::Running
        })
    ));
    assert_eq!(coordinator.phase(), RunPhase::Running);

    gate.add_permits(1);
    assert_eq!(coordinator.wait().await.items_processed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_racing_start_is_never_lost() {
    for _ in 0..25 {
        let db = TestDb::new();
        let navigator = Arc::new(FakeNavigator::new(vec![vec![
            link("alpha", "Alpha"),
            link("beta", "Beta"),
            link("gamma", "Gamma"),
        ]]));
        let (details, _visits) = FakeDetails::new();
        let details = Arc::new(details);
        let coordinator = coordinator(&db, &navigator, &details);
        let mut events = coordinator.subscribe();

        let stopper = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.stop().await })
        };
        coordinator.start(1).await.unwrap();
        let stopped = stopper.await.unwrap();

        let seen = events_until_terminal(&mut events).await;
        match stopped {
            Ok(_) => {
                // A successful stop has already joined the run.
                assert_eq!(coordinator.phase(), RunPhase::Idle);
                assert!(matches!(
                    seen.last(),
                    Some(CoordinatorEvent::Stopped { .. })
                ));
            }
            Err(HarvestError::InvalidCommand { command: "stop", .. }) => {
                assert!(matches!(
                    seen.last(),
                    Some(CoordinatorEvent::Completed { .. })
                ));
            }
            Err(e) => panic!("unexpected stop failure: {}", e),
        }
        coordinator.wait().await;
        assert_eq!(details.open_tabs(), 0);
    }
}

#[tokio::test]
async fn test_listing_tab_leaving_results_ends_the_run() {
    for change in [
        AfterRead::Strays("https://www.example.com/".to_string()),
        AfterRead::Unreachable,
    ] {
        let db = TestDb::new();
        let navigator = Arc::new(
            FakeNavigator::new(vec![vec![link("alpha", "Alpha")], vec![link("beta", "Beta")]])
                .after_read(change),
        );
        let (details, _visits) = FakeDetails::new();
        let details = Arc::new(details);
        let coordinator = coordinator(&db, &navigator, &details);
        let mut events = coordinator.subscribe();

        coordinator.start(3).await.unwrap();
        let seen = events_until_terminal(&mut events).await;

        match seen.last() {
            Some(CoordinatorEvent::Completed { stats }) => {
                assert_eq!(stats.pages_reached, 1);
                assert_eq!(stats.items_processed, 1);
                assert_eq!(stats.error_count, 1);
            }
            other => panic!("unexpected terminal event {:?}", other),
        }
        assert_eq!(navigator.advances(), 0);
        assert_eq!(coordinator.phase(), RunPhase::Idle);

        let state = coordinator.get_state();
        assert!(state.errors[0].starts_with("Run aborted"));
        assert_eq!(db.open().load_state().unwrap().unwrap().errors, state.errors);
    }
}

#[tokio::test]
async fn test_item_collected_after_page_read_is_not_visited() {
    let db = TestDb::new();
    let navigator = Arc::new(FakeNavigator::new(vec![vec![
        link("alpha", "Alpha"),
        link("beta", "Beta"),
    ]]));
    let (details, mut visits) = FakeDetails::new();
    let (details, gate) = details.gated();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);
    let mut events = coordinator.subscribe();

    coordinator.start(1).await.unwrap();
    visits.recv().await.unwrap();

    // Beta arrives through an import while Alpha is still loading.
    let summary = coordinator
        .import_records(&format!(
            r#"[{{"name": "Beta Labs", "url": "{}"}}]"#,
            company_url("beta")
        ))
        .unwrap();
    assert_eq!(summary.added, 1);

    gate.add_permits(1);
    let seen = events_until_terminal(&mut events).await;

    assert!(seen.iter().any(|event| matches!(
        event,
        CoordinatorEvent::ItemProcessed { record, skipped: true, .. } if record.name == "Beta"
    )));
    assert!(visits.try_recv().is_err());
    assert_eq!(details.closed_tabs(), 1);

    let names: Vec<String> = coordinator
        .get_records()
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["Beta Labs", "alpha Robotics"]);
}

#[tokio::test]
async fn test_rate_limited_item_throttles_the_next_visit() {
    let db = TestDb::new();
    let navigator = Arc::new(FakeNavigator::new(vec![vec![
        link("alpha", "Alpha"),
        link("beta", "Beta"),
    ]]));
    let (details, _visits) = FakeDetails::new();
    let details = Arc::new(details.rate_limited("alpha"));
    let mut options = fast_options();
    options.limiter.throttle_ms = 150;
    let coordinator = coordinator_with(options, &db, &navigator, &details);
    let mut events = coordinator.subscribe();

    let started = Instant::now();
    coordinator.start(1).await.unwrap();
    let seen = events_until_terminal(&mut events).await;
    assert!(started.elapsed() >= Duration::from_millis(150));

    let statuses: Vec<&str> = seen
        .iter()
        .filter_map(|event| match event {
            CoordinatorEvent::StatusUpdate { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    let throttled = statuses
        .iter()
        .position(|text| text.starts_with("Rate limited"))
        .expect("no throttle notice");
    let beta = statuses
        .iter()
        .position(|text| *text == "Visiting Beta")
        .expect("beta never visited");
    assert!(throttled < beta);

    let stats = coordinator.stats();
    assert_eq!(stats.items_processed, 1);
    assert_eq!(stats.error_count, 1);
    assert!(coordinator.get_state().errors[0].contains("rate limiting"));
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let db = TestDb::new();
    let navigator = Arc::new(
        FakeNavigator::new(vec![vec![link("alpha", "Alpha"), link("beta", "Beta")]]).flaky(1),
    );
    let (details, _visits) = FakeDetails::new();
    let details = Arc::new(details.flaky("beta"));
    let coordinator = coordinator(&db, &navigator, &details);

    coordinator.start(1).await.unwrap();
    let stats = coordinator.wait().await;

    assert_eq!(stats.items_found, 2);
    assert_eq!(stats.items_processed, 2);
    assert_eq!(stats.error_count, 0);

    let names: Vec<String> = coordinator
        .get_records()
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["alpha Robotics", "beta Robotics"]);
}

#[tokio::test]
async fn test_failed_advance_is_treated_as_last_page() {
    let db = TestDb::new();
    let navigator = Arc::new(
        FakeNavigator::new(vec![vec![link("alpha", "Alpha")], vec![link("beta", "Beta")]])
            .advance_fails("navigation interrupted"),
    );
    let (details, mut visits) = FakeDetails::new();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);
    let mut events = coordinator.subscribe();

    coordinator.start(3).await.unwrap();
    let seen = events_until_terminal(&mut events).await;

    match seen.last() {
        Some(CoordinatorEvent::Completed { stats }) => {
            assert_eq!(stats.pages_reached, 1);
            assert_eq!(stats.items_processed, 1);
            assert_eq!(stats.error_count, 1);
        }
        other => panic!("unexpected terminal event {:?}", other),
    }
    assert_eq!(navigator.advances(), 1);
    assert!(coordinator.get_state().errors[0].starts_with("Could not advance to page 2"));

    visits.recv().await.unwrap();
    assert!(visits.try_recv().is_err());
}

#[tokio::test]
async fn test_unfinished_checkpoint_is_marked_interrupted() {
    let db = TestDb::new();
    let run_id = {
        let mut store = db.open();
        let run_id = store.begin_run(2, 5, "test-config").unwrap();
        let mut state = CoordinatorState::new();
        state.begin_run(2, 5).unwrap();
        state.run_id = Some(run_id);
        state.processed_count = 7;
        store.save_state(&state).unwrap();
        run_id
    };

    let navigator = Arc::new(FakeNavigator::new(vec![Vec::new()]));
    let (details, _visits) = FakeDetails::new();
    let details = Arc::new(details);
    let coordinator = coordinator(&db, &navigator, &details);

    let state = coordinator.get_state();
    assert_eq!(state.phase, RunPhase::Idle);
    assert!(!state.is_running);
    assert_eq!(state.processed_count, 7);
    assert!(state.errors.last().unwrap().contains("interrupted"));

    let store = db.open();
    assert_eq!(store.get_run(run_id).unwrap().status, RunStatus::Interrupted);
    assert_eq!(store.load_state().unwrap().unwrap().phase, RunPhase::Idle);
}
