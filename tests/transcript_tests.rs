use mozhi::transcript::{HistoryRecord, TranscriptAccumulator};

#[test]
fn test_appends_are_monotonic() {
    let mut acc = TranscriptAccumulator::new();
    acc.append_input("hel");
    acc.append_input("lo");
    acc.append_output("നമ");
    acc.append_output("സ്കാരം");
    assert_eq!(acc.input(), "hello");
    assert_eq!(acc.output(), "നമസ്കാരം");
}

#[test]
fn test_commit_with_one_nonblank_field() {
    let mut acc = TranscriptAccumulator::new();
    acc.append_input("hello");

    let record = acc.commit_if_non_blank();
    assert_eq!(
        record,
        Some(HistoryRecord {
            user: "hello".to_string(),
            translation: String::new(),
        })
    );
    // Buffers always clear on commit.
    assert_eq!(acc.input(), "");
    assert_eq!(acc.output(), "");
}

#[test]
fn test_commit_on_blank_buffers_yields_nothing() {
    let mut acc = TranscriptAccumulator::new();
    assert_eq!(acc.commit_if_non_blank(), None);

    // Whitespace-only counts as blank, and still clears.
    acc.append_input("   ");
    acc.append_output("\n\t");
    assert_eq!(acc.commit_if_non_blank(), None);
    assert_eq!(acc.input(), "");
    assert_eq!(acc.output(), "");
}

#[test]
fn test_translation_only_turn_commits() {
    let mut acc = TranscriptAccumulator::new();
    acc.append_output("വാക്ക്");
    let record = acc.commit_if_non_blank().expect("non-blank output");
    assert_eq!(record.user, "");
    assert_eq!(record.translation, "വാക്ക്");
}

#[test]
fn test_state_is_a_function_of_the_append_sequence() {
    let deltas = ["a", "b", "c"];
    let mut first = TranscriptAccumulator::new();
    let mut second = TranscriptAccumulator::new();
    for d in deltas {
        first.append_input(d);
        second.append_input(d);
    }
    assert_eq!(first.input(), second.input());
    assert_eq!(first.commit_if_non_blank(), second.commit_if_non_blank());
}
