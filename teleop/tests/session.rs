use std::{sync::Arc, time::Duration};

use teleop::{
    ControlConfig, ControlLoop, Directive, ExitReason, KeyId, KeyStateTracker, Listening,
    PilotingCommand, RecordingSink, SpecialKey,
};
use tokio::sync::watch;

fn start(
    keys: &Arc<KeyStateTracker>,
) -> (
    RecordingSink,
    watch::Sender<bool>,
    tokio::task::JoinHandle<teleop::SessionReport>,
) {
    let sink = RecordingSink::new();
    let control = ControlLoop::new(keys.clone(), sink.clone(), ControlConfig::default()).unwrap();
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let handle = tokio::spawn(control.run(cancel_rx));
    (sink, cancel_tx, handle)
}

#[tokio::test(start_paused = true)]
async fn quit_key_ends_session_at_next_tick() {
    let keys = Arc::new(KeyStateTracker::default());
    let (sink, _cancel_tx, handle) = start(&keys);

    // ticks at 0, 50 and 100 ms are emitted; the one at 150 ms sees the quit key
    tokio::time::sleep(Duration::from_millis(125)).await;
    assert_eq!(keys.on_press(Some(SpecialKey::Esc.into())), Listening::Stop);

    let report = handle.await.unwrap();
    assert_eq!(report.exit, ExitReason::QuitKey);
    assert_eq!(report.ticks, 3);
    assert_eq!(sink.ticks().len(), 3);
    assert!(sink
        .ticks()
        .iter()
        .all(|tick| tick.command == PilotingCommand::neutral()));
}

#[tokio::test(start_paused = true)]
async fn cancellation_takes_effect_at_tick_boundary() {
    let keys = Arc::new(KeyStateTracker::default());
    let (sink, cancel_tx, handle) = start(&keys);

    tokio::time::sleep(Duration::from_millis(75)).await;
    cancel_tx.send(true).unwrap();

    let report = handle.await.unwrap();
    assert_eq!(report.exit, ExitReason::Cancelled);
    assert_eq!(report.ticks, 2);
    assert_eq!(sink.ticks().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn held_takeoff_and_roll_over_a_session() {
    let keys = Arc::new(KeyStateTracker::default());
    keys.on_press(Some(KeyId::Char('t')));
    keys.on_press(Some(KeyId::Char('d')));
    let (sink, cancel_tx, handle) = start(&keys);

    tokio::time::sleep(Duration::from_millis(225)).await;
    cancel_tx.send(true).unwrap();
    let report = handle.await.unwrap();

    let ticks = sink.ticks();
    assert_eq!(ticks.len(), 5);
    assert_eq!(report.directives, 1);
    assert_eq!(sink.directives(), vec![Directive::TakeOff]);
    assert_eq!(ticks[0].directive, Some(Directive::TakeOff));
    assert!(ticks.iter().all(|tick| tick.command.roll() == 100));
}

#[tokio::test(start_paused = true)]
async fn held_takeoff_refires_after_interval_on_session_clock() {
    let keys = Arc::new(KeyStateTracker::default());
    keys.on_press(Some(KeyId::Char('t')));
    let (sink, cancel_tx, handle) = start(&keys);

    // ticks at 0, 50, ..., 2100 ms; take-off fires at 0 and again at 2000
    tokio::time::sleep(Duration::from_millis(2125)).await;
    cancel_tx.send(true).unwrap();
    let report = handle.await.unwrap();

    let ticks = sink.ticks();
    assert_eq!(ticks.len(), 43);
    assert_eq!(report.directives, 2);
    assert_eq!(sink.directives(), vec![Directive::TakeOff, Directive::TakeOff]);
    assert_eq!(ticks[0].directive, Some(Directive::TakeOff));
    assert_eq!(ticks[40].directive, Some(Directive::TakeOff));
}

#[tokio::test(start_paused = true)]
async fn quit_tap_between_ticks_ends_session() {
    let keys = Arc::new(KeyStateTracker::default());
    let (sink, _cancel_tx, handle) = start(&keys);

    tokio::time::sleep(Duration::from_millis(60)).await;
    keys.on_press(Some(SpecialKey::Esc.into()));
    keys.on_release(Some(SpecialKey::Esc.into()));

    let report = handle.await.unwrap();
    assert_eq!(report.exit, ExitReason::QuitKey);
    assert_eq!(sink.ticks().len(), 2);
}
