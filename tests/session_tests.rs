use mozhi::session::event::{EpisodeEvent, SessionEvent};
use mozhi::transcript::HistoryRecord;
use mozhi::{ClientConfig, SessionManager};

fn manager() -> SessionManager {
    let (manager, _rx) = SessionManager::new(ClientConfig::new("test-key"));
    manager
}

fn current(manager: &SessionManager, event: SessionEvent) -> EpisodeEvent {
    EpisodeEvent::new(manager.current_episode(), event)
}

#[tokio::test]
async fn test_stop_without_start_is_a_noop() {
    let mut m = manager();
    m.stop();
    assert!(m.is_idle(), "all handles at their empty sentinel");
    assert!(m.history().is_empty());
    assert_eq!(m.view().error, None);
}

#[tokio::test]
async fn test_stop_twice_is_idempotent() {
    let mut m = manager();
    m.stop();
    m.stop();
    assert!(m.is_idle());
    assert!(!m.view().recording);
    assert!(!m.view().connecting);
}

#[tokio::test]
async fn test_turn_complete_commits_nonblank_input() {
    let mut m = manager();
    let ev = current(&m, SessionEvent::InputDelta("hello".into()));
    m.handle_event(ev);
    assert_eq!(m.view().current_input, "hello");

    let ev = current(&m, SessionEvent::TurnComplete);
    m.handle_event(ev);

    assert_eq!(
        m.history(),
        &[HistoryRecord {
            user: "hello".to_string(),
            translation: String::new(),
        }]
    );
    // Mirrors reset after the turn boundary.
    assert_eq!(m.view().current_input, "");
    assert_eq!(m.view().current_output, "");
}

#[tokio::test]
async fn test_turn_complete_with_blank_buffers_commits_nothing() {
    let mut m = manager();
    let ev = current(&m, SessionEvent::InputDelta("   ".into()));
    m.handle_event(ev);
    let ev = current(&m, SessionEvent::TurnComplete);
    m.handle_event(ev);

    assert!(m.history().is_empty(), "whitespace-only turn is dropped");
    assert_eq!(m.view().current_input, "");
}

#[tokio::test]
async fn test_deltas_accumulate_across_events() {
    let mut m = manager();
    for delta in ["one ", "two ", "three"] {
        let ev = current(&m, SessionEvent::InputDelta(delta.into()));
        m.handle_event(ev);
    }
    let ev = current(&m, SessionEvent::OutputDelta("ഒന്ന് രണ്ട് മൂന്ന്".into()));
    m.handle_event(ev);

    assert_eq!(m.view().current_input, "one two three");
    assert_eq!(m.view().current_output, "ഒന്ന് രണ്ട് മൂന്ന്");

    let ev = current(&m, SessionEvent::TurnComplete);
    m.handle_event(ev);
    assert_eq!(m.history().len(), 1);
    assert_eq!(m.history()[0].user, "one two three");
    assert_eq!(m.history()[0].translation, "ഒന്ന് രണ്ട് മൂന്ന്");
}

#[tokio::test]
async fn test_manual_stop_salvages_partial_transcript() {
    let mut m = manager();
    let ev = current(&m, SessionEvent::InputDelta("partial text".into()));
    m.handle_event(ev);

    // No turn-complete ever arrives; the user just stops.
    m.stop();

    assert_eq!(
        m.history(),
        &[HistoryRecord {
            user: "partial text".to_string(),
            translation: String::new(),
        }]
    );
    assert_eq!(m.view().current_input, "");
    assert!(m.is_idle());
}

#[tokio::test]
async fn test_stale_episode_events_are_discarded() {
    let mut m = manager();
    let stale = current(&m, SessionEvent::InputDelta("late frame result".into()));

    // Stop bumps the episode; the captured event is now stale.
    m.stop();
    let history_before = m.history().len();
    m.handle_event(stale);

    assert_eq!(m.view().current_input, "", "stale delta must not mutate state");
    assert_eq!(m.history().len(), history_before);

    // A stale turn-complete must not double-commit either.
    let stale_turn = EpisodeEvent::new(m.current_episode().wrapping_sub(1), SessionEvent::TurnComplete);
    m.handle_event(stale_turn);
    assert_eq!(m.history().len(), history_before);
}

#[tokio::test]
async fn test_error_event_surfaces_and_tears_down() {
    let mut m = manager();
    let ev = current(&m, SessionEvent::InputDelta("cut off".into()));
    m.handle_event(ev);

    let ev = current(&m, SessionEvent::Error("socket reset".into()));
    m.handle_event(ev);

    assert_eq!(m.view().error.as_deref(), Some("socket reset"));
    assert!(m.is_idle(), "error runs the full teardown");
    // The pending partial was salvaged on the way down.
    assert_eq!(m.history().len(), 1);
    assert_eq!(m.history()[0].user, "cut off");
}

#[tokio::test]
async fn test_latest_error_replaces_prior() {
    let mut m = manager();
    let ev = current(&m, SessionEvent::Error("first".into()));
    m.handle_event(ev);
    assert_eq!(m.view().error.as_deref(), Some("first"));

    // A later episode's error replaces the surfaced message.
    let ev = current(&m, SessionEvent::Error("second".into()));
    m.handle_event(ev);
    assert_eq!(m.view().error.as_deref(), Some("second"));
}

#[tokio::test]
async fn test_closed_event_is_a_noop() {
    let mut m = manager();
    let ev = current(&m, SessionEvent::Closed);
    m.handle_event(ev);
    assert!(m.is_idle());
    assert!(m.view().error.is_none());
}

#[tokio::test]
async fn test_file_record_mirrors_and_appends() {
    let mut m = manager();
    m.apply_file_record(HistoryRecord {
        user: "hi".to_string(),
        translation: "navi".to_string(),
    });

    assert_eq!(m.view().current_input, "hi");
    assert_eq!(m.view().current_output, "navi");
    assert_eq!(m.history().len(), 1);
    assert_eq!(m.history()[0].user, "hi");
    assert_eq!(m.history()[0].translation, "navi");
}
