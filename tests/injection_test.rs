//! End-to-end injection tests: bootstrap, scanning, claiming, activation.

use std::time::Duration;

use mdcopy::dialect::{Dialect, Platform};
use mdcopy::dom::{Document, NodeId, parse_html};
use mdcopy::markdown::MAX_DEPTH;
use mdcopy::inject::{
    Activation, CLAIM_ATTR, Clipboard, ClipboardError, Controller, Face, MemoryClipboard,
    is_control,
};
use mdcopy::telemetry::{LogTelemetry, RecordingTelemetry};
use mdcopy::{Bootstrap, Phase, Settings};
use proptest::prelude::*;

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("{}/{}", FIXTURES_DIR, name)).expect("Failed to read fixture")
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn chatgpt_controller() -> Controller<MemoryClipboard, RecordingTelemetry> {
    Controller::new(
        Dialect::builtin(Platform::ChatGpt),
        &Settings::default(),
        MemoryClipboard::new(),
        RecordingTelemetry::new(),
    )
}

fn controls_in(doc: &Document, scope: NodeId) -> usize {
    doc.descendants(scope).filter(|&d| is_control(doc, d)).count()
}

/// Append an assistant turn the way a streaming page does: content first,
/// then the action bar.
fn append_turn(doc: &mut Document, n: usize) -> NodeId {
    let main = doc.find_by_tag("main").unwrap();
    let turn = format!("conversation-turn-{n}");
    let article = doc.create_element("article", &[("data-testid", turn.as_str())]);
    let content = doc.create_element("div", &[("class", "markdown prose")]);
    let p = doc.create_element("p", &[]);
    let text = doc.create_text(format!("answer {n}"));
    doc.append_child(p, text).unwrap();
    doc.append_child(content, p).unwrap();
    doc.append_child(article, content).unwrap();
    doc.append_child(main, article).unwrap();
    replace_bar(doc, article);
    article
}

/// Swap in a fresh action bar, dropping the old one and any control in it.
fn replace_bar(doc: &mut Document, article: NodeId) {
    let old: Vec<_> = doc
        .element_children(article)
        .filter(|&c| doc.has_class(c, "items-center"))
        .collect();
    for bar in old {
        doc.detach(bar).unwrap();
    }
    let bar = doc.create_element("div", &[("class", "flex flex-wrap items-center")]);
    let copy = doc.create_element("button", &[("aria-label", "Copy")]);
    doc.append_child(bar, copy).unwrap();
    doc.append_child(article, bar).unwrap();
}

// ============================================================================
// Saved pages through the bootstrap
// ============================================================================

#[test]
fn test_chatgpt_page_end_to_end() {
    let mut doc = parse_html(&fixture("chatgpt_conversation.html"));
    let mut boot = Bootstrap::new(
        "chatgpt.com",
        &Settings::default(),
        MemoryClipboard::new(),
        Box::new(LogTelemetry),
    );

    boot.tick(&mut doc, ms(0));
    boot.tick(&mut doc, ms(10_000));
    assert_eq!(boot.phase(), Phase::Running);

    let buttons = boot.controller().unwrap().controls(&doc);
    assert_eq!(buttons.len(), 2, "one control per turn, none in the composer");

    // The user turn has no rendered Markdown; the assistant turn still copies.
    assert_eq!(boot.activate(&mut doc, buttons[0], ms(11_000)), Activation::ContentNotFound);
    assert!(matches!(
        boot.activate(&mut doc, buttons[1], ms(11_000)),
        Activation::Copied { .. }
    ));

    let copied = boot.controller().unwrap().clipboard().contents().unwrap();
    assert!(copied.starts_with("## Summing\n\n"));
    assert!(copied.contains("```python\n"));
}

#[test]
fn test_gemini_control_sits_after_copy_button() {
    let mut doc = parse_html(&fixture("gemini_conversation.html"));
    let mut boot = Bootstrap::new(
        "gemini.google.com",
        &Settings::default(),
        MemoryClipboard::new(),
        Box::new(LogTelemetry),
    );

    boot.tick(&mut doc, ms(0));
    boot.tick(&mut doc, ms(10_000));

    let buttons = boot.controller().unwrap().controls(&doc);
    assert_eq!(buttons.len(), 1);
    let prev = doc.prev_element_sibling(buttons[0]).unwrap();
    assert_eq!(doc.tag_name(prev), Some("copy-button"));
    assert!(doc.has_attr(buttons[0], "mat-button"));

    // A later scan sees the adjacent control and leaves the container alone.
    boot.tick(&mut doc, ms(20_000));
    let controller = boot.controller_mut().unwrap();
    assert_eq!(controller.scan(&mut doc, ms(20_000)), 0);

    assert!(matches!(
        boot.activate(&mut doc, buttons[0], ms(21_000)),
        Activation::Copied { .. }
    ));
    let icon = doc
        .descendants(buttons[0])
        .find(|&d| doc.tag_name(d) == Some("mat-icon"))
        .unwrap();
    assert_eq!(doc.text_content(icon), "check");

    boot.tick(&mut doc, ms(22_000));
    assert_eq!(doc.text_content(icon), "description");
}

// ============================================================================
// Claiming
// ============================================================================

#[test]
fn test_back_to_back_scans_insert_once() {
    let mut doc = parse_html("<main></main>");
    append_turn(&mut doc, 1);
    let mut ctl = chatgpt_controller();

    assert_eq!(ctl.scan(&mut doc, ms(0)), 1);
    assert_eq!(ctl.scan(&mut doc, ms(0)), 0);
    assert_eq!(ctl.scan(&mut doc, ms(50)), 0);
    assert_eq!(ctl.controls(&doc).len(), 1);
}

#[test]
fn test_tagged_container_stays_tagged_across_scans() {
    let mut doc = parse_html("<main></main>");
    let article = append_turn(&mut doc, 1);
    let mut ctl = chatgpt_controller();
    ctl.scan(&mut doc, ms(0));

    let bar = doc
        .element_children(article)
        .find(|&c| doc.has_class(c, "items-center"))
        .unwrap();
    let token = doc.attr(bar, CLAIM_ATTR).unwrap().to_string();

    ctl.scan(&mut doc, ms(500));
    assert_eq!(doc.attr(bar, CLAIM_ATTR), Some(token.as_str()));
}

#[test]
fn test_container_without_anchor_does_not_block_others() {
    let mut doc = parse_html("<main></main>");
    let broken = append_turn(&mut doc, 1);
    append_turn(&mut doc, 2);
    let copy = doc
        .descendants(broken)
        .find(|&d| doc.tag_name(d) == Some("button"))
        .unwrap();
    doc.detach(copy).unwrap();

    let mut ctl = chatgpt_controller();
    assert_eq!(ctl.scan(&mut doc, ms(0)), 1);
    assert_eq!(controls_in(&doc, broken), 0);
}

// ============================================================================
// Activation
// ============================================================================

struct FlakyClipboard {
    fail_next: bool,
    inner: MemoryClipboard,
}

impl Clipboard for FlakyClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if std::mem::take(&mut self.fail_next) {
            return Err(ClipboardError("document is not focused".into()));
        }
        self.inner.write_text(text)
    }
}

#[test]
fn test_clipboard_failure_leaves_control_usable() {
    let mut doc = parse_html("<main></main>");
    append_turn(&mut doc, 1);
    let mut ctl = Controller::new(
        Dialect::builtin(Platform::ChatGpt),
        &Settings::default(),
        FlakyClipboard {
            fail_next: true,
            inner: MemoryClipboard::new(),
        },
        RecordingTelemetry::new(),
    );
    ctl.scan(&mut doc, ms(0));
    let button = ctl.controls(&doc)[0];

    assert_eq!(ctl.activate(&mut doc, button, ms(100)), Activation::ClipboardFailed);
    assert_eq!(ctl.control(button).unwrap().face(), Face::Idle);

    assert_eq!(
        ctl.activate(&mut doc, button, ms(200)),
        Activation::Copied { length: 8 }
    );
    assert_eq!(ctl.clipboard().inner.contents(), Some("answer 1"));
    assert_eq!(ctl.telemetry().errors().count(), 1);
}

#[test]
fn test_conversion_failure_is_isolated_to_one_message() {
    let mut doc = parse_html("<main></main>");
    let deep = append_turn(&mut doc, 1);
    append_turn(&mut doc, 2);

    let mut parent = doc
        .descendants(deep)
        .find(|&d| doc.has_class(d, "markdown"))
        .unwrap();
    for _ in 0..(MAX_DEPTH + 10) {
        let div = doc.create_element("div", &[]);
        doc.append_child(parent, div).unwrap();
        parent = div;
    }

    let mut ctl = chatgpt_controller();
    assert_eq!(ctl.scan(&mut doc, ms(0)), 2);
    let buttons = ctl.controls(&doc);

    assert_eq!(
        ctl.activate(&mut doc, buttons[0], ms(100)),
        Activation::ConversionFailed
    );
    let report = ctl.telemetry().errors().next().unwrap();
    assert_eq!(report.context.operation, "markdown_conversion");
    assert_eq!(ctl.control(buttons[0]).unwrap().face(), Face::Idle);

    assert_eq!(
        ctl.activate(&mut doc, buttons[1], ms(200)),
        Activation::Copied { length: 8 }
    );
    assert_eq!(ctl.clipboard().contents(), Some("answer 2"));
    assert_eq!(ctl.control(buttons[1]).unwrap().face(), Face::Success);
    assert_eq!(ctl.telemetry().errors().count(), 1);
}

#[test]
fn test_feedback_timing_follows_settings() {
    let settings = Settings::from_json(r#"{"timing":{"feedbackMs":250,"debounceMs":10}}"#).unwrap();
    let mut doc = parse_html("<main></main>");
    append_turn(&mut doc, 1);
    let mut ctl = Controller::new(
        Dialect::builtin(Platform::ChatGpt),
        &settings,
        MemoryClipboard::new(),
        RecordingTelemetry::new(),
    );
    ctl.start(&mut doc, ms(0));
    ctl.tick(&mut doc, ms(10));
    let button = ctl.controls(&doc)[0];

    ctl.activate(&mut doc, button, ms(100));
    ctl.tick(&mut doc, ms(349));
    assert_eq!(ctl.control(button).unwrap().face(), Face::Success);
    ctl.tick(&mut doc, ms(350));
    assert_eq!(ctl.control(button).unwrap().face(), Face::Idle);
}

// ============================================================================
// Idempotent insertion under arbitrary mutation batching
// ============================================================================

#[derive(Debug, Clone)]
enum Step {
    AddTurn,
    Rerender(usize),
    Wait(u64),
    ScanNow,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::AddTurn),
        1 => (0usize..16).prop_map(Step::Rerender),
        3 => (0u64..700).prop_map(Step::Wait),
        1 => Just(Step::ScanNow),
    ]
}

proptest! {
    #[test]
    fn prop_exactly_one_control_per_container(steps in prop::collection::vec(step(), 1..40)) {
        let mut doc = parse_html("<main></main>");
        let mut ctl = chatgpt_controller();
        let mut now = ms(0);
        let mut turns = Vec::new();
        ctl.start(&mut doc, now);

        for step in steps {
            match step {
                Step::AddTurn => turns.push(append_turn(&mut doc, turns.len() + 1)),
                Step::Rerender(i) if !turns.is_empty() => {
                    let article = turns[i % turns.len()];
                    replace_bar(&mut doc, article);
                }
                Step::Rerender(_) => {}
                Step::Wait(gap) => {
                    now += ms(gap);
                    ctl.tick(&mut doc, now);
                }
                Step::ScanNow => {
                    ctl.scan(&mut doc, now);
                }
            }
            for &article in &turns {
                prop_assert!(controls_in(&doc, article) <= 1);
            }
        }

        // Let every pending debounce and grace timer run out.
        now += ms(5_000);
        ctl.tick(&mut doc, now);
        now += ms(5_000);
        ctl.tick(&mut doc, now);
        // A bar swapped inside an existing turn is not a relevant addition
        // on its own; a later scan picks it up.
        ctl.scan(&mut doc, now);

        for &article in &turns {
            prop_assert_eq!(controls_in(&doc, article), 1);
        }
        prop_assert_eq!(ctl.controls(&doc).len(), turns.len());
    }
}
