//! Trial invariants checked over randomly generated replay scripts.

use moving_window::script::{Action, Script, Step, replay};
use moving_window::surface::Viewport;
use moving_window::trial::{EventKind, RevealState, TrialParams};
use proptest::prelude::*;

const WORDS: &[&str] = &["The", "cat", "sat", "on", "the", "mat.", "Yesterday", "a"];

fn action(word_count: usize) -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::HoverFixation),
        (0..word_count).prop_map(|index| Action::HoverWord { index }),
        Just(Action::HoverOutside),
        (0.0..1280.0_f64, 0.0..720.0_f64).prop_map(|(x, y)| Action::Move { x, y }),
        Just(Action::Continue),
    ]
}

fn script() -> impl Strategy<Value = Script> {
    (1..=WORDS.len())
        .prop_flat_map(|n| {
            (
                Just(n),
                prop::collection::vec((0.0..5000.0_f64, action(n)), 0..30),
            )
        })
        .prop_map(|(n, mut raw)| {
            raw.sort_by(|a, b| a.0.total_cmp(&b.0));
            Script {
                sentence: WORDS[..n].join(" "),
                viewport: Viewport::default(),
                steps: raw
                    .into_iter()
                    .map(|(at_ms, action)| Step { at_ms, action })
                    .collect(),
            }
        })
}

fn params(min_duration_ms: f64) -> TrialParams {
    TrialParams {
        min_duration_ms,
        ..TrialParams::default()
    }
}

proptest! {
    #[test]
    fn completed_trials_satisfy_result_invariants(
        script in script(),
        min_duration_ms in 0.0..4000.0_f64,
    ) {
        let report = replay(&script, params(min_duration_ms), None).unwrap();
        let words = script.sentence.split_whitespace().count();

        if let Some(result) = &report.result {
            let indices: Vec<usize> = result.word_geometry().iter().map(|g| g.index).collect();
            prop_assert_eq!(indices, (0..words).collect::<Vec<_>>());

            let events = result.word_events();
            prop_assert!(events.first().is_none_or(|e| e.elapsed_ms >= 0.0));
            prop_assert!(events.windows(2).all(|w| w[0].elapsed_ms <= w[1].elapsed_ms));

            // Enters and leaves alternate per word.
            for index in 0..words {
                let kinds: Vec<EventKind> = events
                    .iter()
                    .filter(|e| e.index == index)
                    .map(|e| e.kind)
                    .collect();
                for (i, kind) in kinds.iter().enumerate() {
                    let expected = if i % 2 == 0 { EventKind::Enter } else { EventKind::Leave };
                    prop_assert_eq!(*kind, expected);
                }
            }
        }
    }

    #[test]
    fn completion_requires_both_gates(
        script in script(),
        min_duration_ms in 0.0..4000.0_f64,
    ) {
        let report = replay(&script, params(min_duration_ms), None).unwrap();
        let continues: Vec<f64> = script
            .steps
            .iter()
            .filter(|s| s.action == Action::Continue)
            .map(|s| s.at_ms)
            .collect();

        match &report.result {
            Some(_) => {
                prop_assert_eq!(report.reveal_state, RevealState::Visible);
                prop_assert!(continues.iter().any(|&t| t >= min_duration_ms));
            }
            None => {
                prop_assert_eq!(report.refusals.len(), continues.len());
                prop_assert_eq!(report.skipped_steps, 0);
            }
        }
    }
}
