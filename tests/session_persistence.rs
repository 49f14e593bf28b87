use chrono::Local;
use fxwatch::session::SessionLogger;
use fxwatch::variation::Variation;
use fxwatch::RateSample;

#[tokio::test]
async fn reload_restores_counters_and_continues_numbering() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("session-state.json");

    let mut logger = SessionLogger::new(&state_path, dir.path());
    logger.init().await;
    let session = logger.start_session().await;
    for rate in [5.20, 5.25, 5.30] {
        let sample = RateSample::new(rate, "AwesomeAPI", Variation::stable());
        logger.log_update(session, &sample).await;
    }
    logger.stop_session(session).await;
    let before = logger.state().clone();

    let mut reloaded = SessionLogger::new(&state_path, dir.path());
    reloaded.init().await;

    assert_eq!(reloaded.state(), &before);
    assert_eq!(reloaded.state().total_updates, 3);
    assert_eq!(reloaded.state().sessions[0].update_count, 3);
    assert_eq!(reloaded.state().sessions[0].updates[2].sample.rate, 5.30);
    assert_eq!(reloaded.start_session().await, 2);
}

#[tokio::test]
async fn daily_log_receives_one_block_per_update() {
    let dir = tempfile::tempdir().unwrap();
    let mut logger = SessionLogger::new(dir.path().join("session-state.json"), dir.path());
    logger.init().await;

    let session = logger.start_session().await;
    let sample = RateSample::new(5.25, "AwesomeAPI", Variation::between(5.235, 5.25));
    logger.log_update(session, &sample).await;
    logger.log_update(session, &sample).await;

    let log_path = logger
        .daily_log()
        .path_for(sample.captured_at.with_timezone(&Local).date_naive());
    let contents = std::fs::read_to_string(log_path).unwrap();
    assert_eq!(contents.matches("AwesomeAPI").count(), 2);
}
