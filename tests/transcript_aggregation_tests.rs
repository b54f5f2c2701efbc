use colloquy::events::TranscriptEvent;
use colloquy::transcript::{Role, TranscriptAggregator};
use pretty_assertions::assert_eq;

fn user_delta(delta: &str) -> TranscriptEvent {
    TranscriptEvent::UserDelta {
        delta: delta.to_string(),
        timestamp: "10:00:00".to_string(),
    }
}

fn user_completed() -> TranscriptEvent {
    TranscriptEvent::UserCompleted {
        timestamp: "10:00:05".to_string(),
    }
}

fn assistant_delta(response_id: &str, delta: &str) -> TranscriptEvent {
    TranscriptEvent::AssistantDelta {
        delta: delta.to_string(),
        response_id: Some(response_id.to_string()),
        timestamp: "10:00:01".to_string(),
    }
}

fn assistant_completed(response_id: &str) -> TranscriptEvent {
    TranscriptEvent::AssistantCompleted {
        response_id: Some(response_id.to_string()),
        timestamp: "10:00:06".to_string(),
    }
}

fn apply_all(aggregator: &mut TranscriptAggregator, events: &[TranscriptEvent]) {
    for event in events {
        aggregator.apply(event);
    }
}

#[test]
fn user_deltas_concatenate_into_one_live_utterance() {
    let mut aggregator = TranscriptAggregator::new();
    apply_all(
        &mut aggregator,
        &[user_delta("The "), user_delta("quick "), user_delta("fox")],
    );

    let utterances = aggregator.utterances();
    assert_eq!(utterances.len(), 1);
    assert_eq!(utterances[0].role, Role::User);
    assert_eq!(utterances[0].text, "The quick fox");
    assert!(utterances[0].is_live);
}

#[test]
fn user_delta_then_completion_finalizes_in_place() {
    let mut aggregator = TranscriptAggregator::new();
    apply_all(
        &mut aggregator,
        &[user_delta("Hel"), user_delta("lo."), user_completed()],
    );

    let utterances = aggregator.utterances();
    assert_eq!(utterances.len(), 1);
    assert_eq!(utterances[0].text, "Hello.");
    assert!(!utterances[0].is_live);
    assert_eq!(utterances[0].timestamp, "10:00:05");
}

#[test]
fn interleaved_response_ids_never_mix_text() {
    let mut aggregator = TranscriptAggregator::new();
    apply_all(
        &mut aggregator,
        &[
            assistant_delta("resp_a", "alpha"),
            assistant_delta("resp_b", "bravo"),
            assistant_delta("resp_a", " one"),
            assistant_delta("resp_b", " two"),
        ],
    );

    let utterances = aggregator.utterances();
    assert_eq!(utterances.len(), 2);
    assert_eq!(utterances[0].text, "alpha one");
    assert_eq!(utterances[0].response_id.as_deref(), Some("resp_a"));
    assert_eq!(utterances[1].text, "bravo two");
    assert_eq!(utterances[1].response_id.as_deref(), Some("resp_b"));
}

#[test]
fn completing_one_response_leaves_the_other_live() {
    let mut aggregator = TranscriptAggregator::new();
    apply_all(
        &mut aggregator,
        &[
            assistant_delta("resp_1", "first"),
            assistant_delta("resp_2", "second"),
            assistant_completed("resp_2"),
        ],
    );

    let utterances = aggregator.utterances();
    assert_eq!(utterances.len(), 2);
    assert!(utterances[0].is_live, "resp_1 must stay live");
    assert!(!utterances[1].is_live, "resp_2 must be finalized");
}

#[test]
fn completion_without_live_target_is_a_no_op() {
    let mut aggregator = TranscriptAggregator::new();
    aggregator.apply(&assistant_completed("resp_ghost"));
    assert!(aggregator.utterances().is_empty());

    aggregator.apply(&user_completed());
    assert!(aggregator.utterances().is_empty());

    // already-finalized target: second completion changes nothing
    apply_all(
        &mut aggregator,
        &[
            assistant_delta("resp_1", "done"),
            assistant_completed("resp_1"),
        ],
    );
    let before = aggregator.utterances().to_vec();
    aggregator.apply(&assistant_completed("resp_1"));
    assert_eq!(aggregator.utterances(), before.as_slice());
}

#[test]
fn finalized_utterance_is_never_reopened() {
    let mut aggregator = TranscriptAggregator::new();
    apply_all(
        &mut aggregator,
        &[
            assistant_delta("resp_1", "all done"),
            assistant_completed("resp_1"),
            // stale reference: same response id after completion
            assistant_delta("resp_1", "straggler"),
        ],
    );

    let utterances = aggregator.utterances();
    assert_eq!(utterances.len(), 2);
    assert_eq!(utterances[0].text, "all done");
    assert!(!utterances[0].is_live);
    assert_eq!(utterances[1].text, "straggler");
    assert!(utterances[1].is_live);
    assert_eq!(utterances[1].response_id.as_deref(), Some("resp_1"));
}

#[test]
fn assistant_delta_without_response_id_gets_a_generated_one() {
    let mut aggregator = TranscriptAggregator::new();
    aggregator.apply(&TranscriptEvent::AssistantDelta {
        delta: "untagged".to_string(),
        response_id: None,
        timestamp: "10:00:01".to_string(),
    });

    let utterances = aggregator.utterances();
    assert_eq!(utterances.len(), 1);
    assert!(utterances[0].response_id.is_some());
    assert!(!utterances[0].response_id.as_deref().unwrap().is_empty());
}

#[test]
fn user_delta_after_live_assistant_opens_a_new_utterance() {
    let mut aggregator = TranscriptAggregator::new();
    apply_all(
        &mut aggregator,
        &[
            assistant_delta("resp_1", "Hi"),
            user_delta("Hey"),
            assistant_delta("resp_1", " there"),
            assistant_completed("resp_1"),
        ],
    );

    let utterances = aggregator.utterances();
    assert_eq!(utterances.len(), 2);
    assert_eq!(utterances[0].role, Role::Assistant);
    assert_eq!(utterances[0].text, "Hi there");
    assert!(!utterances[0].is_live);
    assert_eq!(utterances[1].role, Role::User);
    assert_eq!(utterances[1].text, "Hey");
    assert!(utterances[1].is_live);
}

#[test]
fn assistant_deltas_do_not_split_an_open_user_utterance() {
    let mut aggregator = TranscriptAggregator::new();
    apply_all(
        &mut aggregator,
        &[
            user_delta("Hel"),
            assistant_delta("resp_1", "Hi"),
            user_delta("lo"),
            user_completed(),
        ],
    );

    let utterances = aggregator.utterances();
    assert_eq!(utterances.len(), 2);
    assert_eq!(utterances[0].role, Role::User);
    assert_eq!(utterances[0].text, "Hello");
    assert!(!utterances[0].is_live);
    assert_eq!(utterances[1].role, Role::Assistant);
    assert!(utterances[1].is_live);
}

#[test]
fn unknown_events_are_not_accumulated() {
    let mut aggregator = TranscriptAggregator::new();
    aggregator.apply(&TranscriptEvent::Unknown {
        event_type: "session.created".to_string(),
    });
    assert!(aggregator.utterances().is_empty());
}

#[test]
fn reset_clears_history_and_sequence() {
    let mut aggregator = TranscriptAggregator::new();
    apply_all(&mut aggregator, &[user_delta("old session")]);
    aggregator.reset();
    assert!(aggregator.utterances().is_empty());

    apply_all(&mut aggregator, &[user_delta("new session")]);
    assert_eq!(aggregator.utterances()[0].seq, 0);
}

#[test]
fn finalization_trims_accumulated_whitespace() {
    let mut aggregator = TranscriptAggregator::new();
    apply_all(
        &mut aggregator,
        &[user_delta("  padded answer "), user_completed()],
    );
    assert_eq!(aggregator.utterances()[0].text, "padded answer");
}

#[test]
fn sentence_segmentation_closes_user_utterance_on_terminal_punctuation() {
    let mut aggregator = TranscriptAggregator::new().with_sentence_segmentation(true);
    apply_all(
        &mut aggregator,
        &[
            user_delta("First "),
            user_delta("sentence. "),
            user_delta("Second"),
        ],
    );

    let utterances = aggregator.utterances();
    assert_eq!(utterances.len(), 2);
    assert_eq!(utterances[0].text, "First sentence.");
    assert!(!utterances[0].is_live);
    assert_eq!(utterances[1].text, "Second");
    assert!(utterances[1].is_live);
}

#[test]
fn sentence_segmentation_off_by_default() {
    let mut aggregator = TranscriptAggregator::new();
    apply_all(&mut aggregator, &[user_delta("Done."), user_delta(" More")]);
    assert_eq!(aggregator.utterances().len(), 1);
    assert_eq!(aggregator.utterances()[0].text, "Done. More");
}
