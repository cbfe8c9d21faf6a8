//! End-to-end decision-pipeline scenarios driven entirely through the
//! session orchestrator's public API.

use headsup_engine::session::Engine;
use headsup_engine::EngineConfig;

#[test]
fn folding_immediately_ends_the_hand() {
    let mut engine = Engine::new(EngineConfig::default());
    let (session_id, mut result) = engine.new_hand(0);

    // Drive hands until the human is actually asked to act (the bot may
    // already have folded/closed the hand first).
    let mut guard = 0;
    while result.terminal.is_some() && guard < 20 {
        guard += 1;
        result = engine.next_hand(session_id).unwrap();
    }
    if result.terminal.is_some() {
        return;
    }

    let fold_index = result
        .snapshot
        .legal_actions
        .iter()
        .position(|a| *a == headsup_engine::game::Action::Fold)
        .expect("fold is always legal when facing a bet or as a voluntary action");

    let after = engine.apply_human_action(session_id, fold_index).unwrap();
    assert!(after.terminal.is_some());
    let chips = after.snapshot.stack[0] + after.snapshot.stack[1] + after.snapshot.pot;
    assert!((chips - 2.0 * EngineConfig::default().start_stack as f64).abs() < 1e-6);
}

#[test]
fn bad_session_id_is_reported_as_an_error_not_a_panic() {
    let mut engine = Engine::new(EngineConfig::default());
    let err = engine.apply_human_action(123_456, 0);
    assert!(err.is_err());
}

#[test]
fn diagnostics_accumulate_prior_misses_without_a_blueprint() {
    let mut engine = Engine::new(EngineConfig::default());
    let (session_id, mut result) = engine.new_hand(0);
    let mut guard = 0;
    while result.terminal.is_none() && guard < 50 {
        guard += 1;
        let action_index = result.snapshot.legal_actions.len() / 2;
        result = engine.apply_human_action(session_id, action_index).unwrap();
    }
    let diag = engine.diag();
    assert!(diag.prior_hits == 0);
}
