mod common;

use common::{card, FixedDeck, FlakyDeck, RecordingSink};
use lexideck_core::{grade_label, DialogueController, Grade, InboundEvent, Phase, ADVANCE_LABEL, REVEAL_LABEL};
use proptest::prelude::*;
use std::sync::Arc;

fn input_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(ADVANCE_LABEL.to_string()),
        Just(REVEAL_LABEL.to_string()),
        prop::sample::select(Grade::ALL.to_vec()).prop_map(|g| grade_label(g).to_string()),
        "[a-z ]{0,8}",
    ]
}

proptest! {
    #[test]
    fn phase_and_card_stay_consistent(
        inputs in prop::collection::vec(input_text(), 1..40),
        deck_size in 0usize..4,
        sink_fails in any::<bool>(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let deck = (0..deck_size).map(|i| card(&format!("w{i}"))).collect();
            let sink = Arc::new(if sink_fails { RecordingSink::failing() } else { RecordingSink::default() });
            let ctl = DialogueController::new(Arc::new(FixedDeck(deck)), sink.clone());

            for text in inputs {
                let before = ctl.phase("p").await;
                let recorded = sink.count();
                let reply = ctl.handle(&InboundEvent::new("p", text.clone())).await;
                let after = ctl.phase("p").await;

                let is_grade = Grade::ALL.iter().any(|g| grade_label(*g) == text);
                if is_grade && before != Phase::Revealed {
                    prop_assert!(reply.is_none());
                    prop_assert_eq!(after, before);
                    prop_assert_eq!(sink.count(), recorded);
                }
                if text == REVEAL_LABEL && before != Phase::Shown {
                    prop_assert!(reply.is_none());
                    prop_assert_eq!(after, before);
                }
                if text == ADVANCE_LABEL {
                    prop_assert!(reply.is_some());
                }

                let current = ctl.current_card("p").await;
                prop_assert_eq!(current.is_none(), after == Phase::Idle);
            }
            Ok(())
        })?;
    }
}

proptest! {
    #[test]
    fn failed_fetches_keep_phase_and_card(
        inputs in prop::collection::vec(input_text(), 1..40),
        deck_size in 0usize..4,
        schedule in prop::collection::vec(any::<bool>(), 1..6),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let deck = (0..deck_size).map(|i| card(&format!("w{i}"))).collect();
            let source = Arc::new(FlakyDeck::new(deck, schedule));
            let ctl = DialogueController::new(source.clone(), Arc::new(RecordingSink::default()));

            for text in inputs {
                let before = ctl.phase("p").await;
                let before_card = ctl.current_card("p").await;
                let failures = source.failures();
                let reply = ctl.handle(&InboundEvent::new("p", text.clone())).await;
                let after = ctl.phase("p").await;
                let current = ctl.current_card("p").await;

                if source.failures() > failures {
                    prop_assert!(reply.is_some());
                    prop_assert_eq!(after, before);
                    prop_assert_eq!(
                        current.as_ref().map(|c| c.id.clone()),
                        before_card.map(|c| c.id)
                    );
                }
                prop_assert_eq!(current.is_none(), after == Phase::Idle);
            }
            Ok(())
        })?;
    }
}
