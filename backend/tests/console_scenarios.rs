//! End-to-end cue scenarios driven through the console command surface.

use cuelight::console::Console;
use cuelight::transmitter::NullTransmitter;
use cuelight_types::{
    decode_command, ConsoleCommand, ConsoleEvent, CueNumber, LevelEntry, LevelsPayload, Status,
};
use std::time::Duration;

fn console() -> Console {
    Console::new(512, Box::new(NullTransmitter))
}

/// Apply a raw JSON message the way a WebSocket session would.
fn send(console: &mut Console, json: &str) -> Vec<ConsoleEvent> {
    let command = decode_command(json).unwrap();
    console.apply(command).unwrap()
}

fn levels(events: &[ConsoleEvent]) -> LevelsPayload {
    events
        .iter()
        .find_map(|event| match event {
            ConsoleEvent::GetLevels(levels) => Some(levels.clone()),
            _ => None,
        })
        .expect("levels payload")
}

fn channel(levels: &LevelsPayload, channel: u32) -> LevelEntry {
    levels
        .values
        .iter()
        .copied()
        .find(|entry| entry.channel == channel)
        .expect("channel in snapshot")
}

fn cue(n: f64) -> CueNumber {
    CueNumber::new(n).unwrap()
}

#[test]
fn test_record_and_play_back_two_cues() {
    let mut console = console();
    send(&mut console, r#"{"type":"set-levels","list_id":1,"values":[{"channel":5,"value":100}]}"#);
    send(&mut console, r#"{"type":"save-cue","list_id":1,"cue":1,"time":2}"#);
    send(&mut console, r#"{"type":"set-levels","list_id":1,"values":[{"channel":5,"value":0}]}"#);
    send(&mut console, r#"{"type":"save-cue","list_id":1,"cue":2,"time":1}"#);

    let snapshot = levels(&send(&mut console, r#"{"type":"go-cue","list_id":1}"#));
    assert_eq!(snapshot.cue.current, Some(cue(1.0)));
    assert_eq!(snapshot.cue.next, Some(cue(2.0)));
    assert_eq!(snapshot.cue.previous, None);
    assert_eq!(snapshot.cue.last, Some(cue(2.0)));
    assert_eq!(channel(&snapshot, 5).value, 0);

    let snapshot = levels(&console.tick(Duration::from_millis(1000)));
    assert_eq!(snapshot.cue.fade_progress, 0.5);
    assert_eq!(channel(&snapshot, 5).value, 50);
    assert_eq!(channel(&snapshot, 5).status, Status::Raised);

    let snapshot = levels(&console.tick(Duration::from_millis(1000)));
    assert!(!snapshot.cue.fading);
    assert_eq!(channel(&snapshot, 5).value, 100);
    assert_eq!(channel(&snapshot, 5).status, Status::Raised);

    send(&mut console, r#"{"type":"go-cue","list_id":1}"#);
    let snapshot = levels(&console.tick(Duration::from_millis(1000)));
    assert_eq!(channel(&snapshot, 5).value, 0);
    assert_eq!(channel(&snapshot, 5).status, Status::Lowered);
    assert_eq!(snapshot.cue.previous, Some(cue(1.0)));
    assert_eq!(snapshot.cue.next, None);
}

#[test]
fn test_manual_override_then_reset() {
    let mut console = console();
    send(&mut console, r#"{"type":"set-levels","list_id":1,"values":[{"channel":5,"value":100}]}"#);
    send(&mut console, r#"{"type":"save-cue","list_id":1,"cue":1,"time":0}"#);
    send(&mut console, r#"{"type":"restore-cue","list_id":1,"cue":1}"#);
    console.tick(Duration::from_millis(25));

    let snapshot = levels(&send(
        &mut console,
        r#"{"type":"set-levels","list_id":1,"values":[{"channel":5,"value":80}]}"#,
    ));
    assert_eq!(channel(&snapshot, 5).value, 80);
    assert_eq!(channel(&snapshot, 5).status, Status::Manual);

    let snapshot = levels(&send(&mut console, r#"{"type":"reset-channel","list_id":1,"channel":5}"#));
    assert_eq!(channel(&snapshot, 5).value, 100);
    assert_ne!(channel(&snapshot, 5).status, Status::Manual);
}

#[test]
fn test_delete_current_cue_then_go() {
    let mut console = console();
    for (n, value) in [(1, 10), (2, 20), (3, 30)] {
        send(
            &mut console,
            &format!(r#"{{"type":"set-levels","list_id":1,"values":[{{"channel":1,"value":{}}}]}}"#, value),
        );
        send(
            &mut console,
            &format!(r#"{{"type":"save-cue","list_id":1,"cue":{},"time":0}}"#, n),
        );
    }
    send(&mut console, r#"{"type":"restore-cue","list_id":1,"cue":1}"#);
    console.tick(Duration::from_millis(25));

    let events = send(&mut console, r#"{"type":"delete-cue","list_id":1,"cue":1}"#);
    assert_eq!(levels(&events).cue.current, None);
    let ConsoleEvent::ListCues(cues) = &events[1] else {
        panic!("expected cue listing");
    };
    assert_eq!(cues.cues.len(), 2);

    let snapshot = levels(&send(&mut console, r#"{"type":"go-cue","list_id":1}"#));
    assert_eq!(snapshot.cue.current, Some(cue(2.0)));
    let snapshot = levels(&console.tick(Duration::from_millis(25)));
    assert_eq!(channel(&snapshot, 1).value, 20);
}

#[test]
fn test_track_and_block_through_history() {
    let mut console = console();
    send(&mut console, r#"{"type":"set-levels","list_id":1,"values":[{"channel":1,"value":50},{"channel":2,"value":10}]}"#);
    send(&mut console, r#"{"type":"save-cue","list_id":1,"cue":1,"time":0}"#);
    send(&mut console, r#"{"type":"restore-cue","list_id":1,"cue":1}"#);
    console.tick(Duration::ZERO);

    // Cue 2 changes channel 2 only; channel 1 tracks from cue 1
    send(&mut console, r#"{"type":"set-levels","list_id":1,"values":[{"channel":2,"value":90}]}"#);
    send(&mut console, r#"{"type":"save-cue","list_id":1,"cue":2,"time":0}"#);
    let snapshot = levels(&send(&mut console, r#"{"type":"track-channel","list_id":1,"channel":1}"#));
    assert_eq!(channel(&snapshot, 1).status, Status::Tracked);
    assert_eq!(channel(&snapshot, 1).value, 50);

    send(&mut console, r#"{"type":"save-cue","list_id":1,"cue":3,"time":0}"#);
    send(&mut console, r#"{"type":"restore-cue","list_id":1,"cue":3}"#);
    let snapshot = levels(&console.tick(Duration::ZERO));
    assert_eq!(channel(&snapshot, 1).value, 50);
    assert_eq!(channel(&snapshot, 1).status, Status::Tracked);

    // Block channel 1 in cue 3, then change it in cue 1
    let snapshot = levels(&send(&mut console, r#"{"type":"block-channel","list_id":1,"channel":1}"#));
    assert_eq!(channel(&snapshot, 1).status, Status::Blocked);

    send(&mut console, r#"{"type":"restore-cue","list_id":1,"cue":1}"#);
    console.tick(Duration::ZERO);
    send(&mut console, r#"{"type":"set-levels","list_id":1,"values":[{"channel":1,"value":200}]}"#);
    send(&mut console, r#"{"type":"save-cue","list_id":1,"cue":1,"time":0}"#);

    send(&mut console, r#"{"type":"restore-cue","list_id":1,"cue":2}"#);
    let snapshot = levels(&console.tick(Duration::ZERO));
    assert_eq!(channel(&snapshot, 1).value, 200);

    // The fade down to the blocked value reports its direction first
    send(&mut console, r#"{"type":"restore-cue","list_id":1,"cue":3}"#);
    let snapshot = levels(&console.tick(Duration::ZERO));
    assert_eq!(channel(&snapshot, 1).value, 50);
    assert_eq!(channel(&snapshot, 1).status, Status::Lowered);

    send(&mut console, r#"{"type":"restore-cue","list_id":1,"cue":3}"#);
    let snapshot = levels(&console.tick(Duration::ZERO));
    assert_eq!(channel(&snapshot, 1).value, 50);
    assert_eq!(channel(&snapshot, 1).status, Status::Blocked);
}

#[test]
fn test_lists_are_independent() {
    let mut console = console();
    send(&mut console, r#"{"type":"set-levels","list_id":1,"values":[{"channel":1,"value":10}]}"#);
    send(&mut console, r#"{"type":"set-levels","list_id":2,"values":[{"channel":1,"value":90}]}"#);
    send(&mut console, r#"{"type":"save-cue","list_id":2,"cue":1,"time":0}"#);

    assert!(console.list(1).unwrap().cues().is_empty());
    assert_eq!(console.list(2).unwrap().cues().len(), 1);
    assert_eq!(console.universe().get(1), Some(90));

    let events = console.apply(ConsoleCommand::GetLists).unwrap();
    let ConsoleEvent::GetLists(lists) = &events[0] else {
        panic!("expected lists");
    };
    assert_eq!(lists.lists.len(), 2);
}

#[test]
fn test_bad_set_levels_entries_do_not_block_batch() {
    let mut console = console();
    let snapshot = levels(&send(
        &mut console,
        r#"{"type":"set-levels","list_id":1,"values":[{"channel":0,"value":9},{"channel":"x"},{"channel":4,"value":400}]}"#,
    ));
    assert_eq!(snapshot.values.len(), 1);
    assert_eq!(channel(&snapshot, 4).value, 255);
}
