//! Scoring at reveal time: judge output reconciliation and fallbacks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cagematch::config::RevealPolicy;
use cagematch::domain::SessionStatus;
use cagematch::errors::domain::DomainError;
use cagematch::images::PLACEHOLDER_IMAGE_URL;
use cagematch::judge::JudgedCaption;
use cagematch::StateBuilder;

use crate::support::doubles::{
    judged, BrokenImageSource, FailingJudge, InterposedStorage, RecordingBroadcaster,
    ScriptedJudge, SlowJudge,
};
use crate::support::game_setup::{lobby, TestGameBuilder};

#[tokio::test]
async fn judge_failure_falls_back_for_every_caption() -> Result<(), DomainError> {
    let game = TestGameBuilder::new().judge(Arc::new(FailingJudge)).build();
    let (host, guests) = lobby(&game, 2, &["Alice"]).await?;
    let code = host.session.code.clone();
    let round = game.state.rounds.start_round(&code, &host.token).await?;
    for token in [&host.token, &guests[0].token] {
        game.state
            .rounds
            .submit_caption(&code, &round.id, token, "a cat on a keyboard")
            .await?;
    }

    let outcome = game
        .state
        .rounds
        .reveal_round(&code, &round.id, &host.token)
        .await?;
    assert_eq!(outcome.fallback_count, 2);
    assert_eq!(outcome.session.status, SessionStatus::Revealing);
    for caption in &outcome.captions {
        let score = caption.score.as_ref().expect("scored");
        assert!(score.humour <= 10 && score.relevance <= 10);
        assert_eq!(score.total, score.humour + score.relevance);
    }
    // Same text, same deterministic fallback score.
    assert_eq!(outcome.captions[0].score, outcome.captions[1].score);
    Ok(())
}

#[tokio::test]
async fn judge_timeout_falls_back_promptly() -> Result<(), DomainError> {
    let game = TestGameBuilder::new()
        .judge(Arc::new(SlowJudge {
            delay: Duration::from_secs(30),
        }))
        .rules(|rules| rules.judge_timeout = Duration::from_millis(50))
        .build();
    let (host, _) = lobby(&game, 1, &[]).await?;
    let code = host.session.code.clone();
    let round = game.state.rounds.start_round(&code, &host.token).await?;
    game.state
        .rounds
        .submit_caption(&code, &round.id, &host.token, "waiting forever")
        .await?;

    let started = Instant::now();
    let outcome = game
        .state
        .rounds
        .reveal_round(&code, &round.id, &host.token)
        .await?;
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(outcome.fallback_count, 1);
    assert_eq!(outcome.session.status, SessionStatus::Finished);
    Ok(())
}

#[tokio::test]
async fn reordered_and_duplicated_judge_output_scores_each_player_once() -> Result<(), DomainError>
{
    // Reverse the order, then repeat the first entry with a different score.
    let judge = ScriptedJudge::new(|captions| {
        let mut out: Vec<JudgedCaption> = captions
            .iter()
            .rev()
            .map(|c| judged(c, c.text.len() as i64 % 10))
            .collect();
        if let Some(first) = captions.first() {
            out.push(judged(first, 0));
        }
        out
    });
    let game = TestGameBuilder::new().judge(judge).build();
    let (host, guests) = lobby(&game, 1, &["Alice", "Bob"]).await?;
    let code = host.session.code.clone();
    let round = game.state.rounds.start_round(&code, &host.token).await?;

    let texts = ["abc", "abcdef", "abcdefgh"];
    let tokens = [&host.token, &guests[0].token, &guests[1].token];
    for (token, text) in tokens.iter().zip(texts) {
        game.state
            .rounds
            .submit_caption(&code, &round.id, token, text)
            .await?;
    }

    let outcome = game
        .state
        .rounds
        .reveal_round(&code, &round.id, &host.token)
        .await?;
    assert_eq!(outcome.fallback_count, 0);
    assert_eq!(outcome.captions.len(), 3);
    for caption in &outcome.captions {
        let expected = (caption.text.len() % 10) as u8;
        let score = caption.score.as_ref().expect("scored");
        assert_eq!(score.humour, expected, "{}", caption.display_name);
        assert_eq!(score.total, expected * 2);
    }
    Ok(())
}

#[tokio::test]
async fn judge_that_drops_entries_leaves_the_rest_to_fallback() -> Result<(), DomainError> {
    let judge = ScriptedJudge::new(|captions| captions.iter().take(1).map(|c| judged(c, 9)).collect());
    let game = TestGameBuilder::new().judge(judge).build();
    let (host, guests) = lobby(&game, 1, &["Alice"]).await?;
    let code = host.session.code.clone();
    let round = game.state.rounds.start_round(&code, &host.token).await?;
    game.state
        .rounds
        .submit_caption(&code, &round.id, &host.token, "first")
        .await?;
    game.state
        .rounds
        .submit_caption(&code, &round.id, &guests[0].token, "second")
        .await?;

    let outcome = game
        .state
        .rounds
        .reveal_round(&code, &round.id, &host.token)
        .await?;
    assert_eq!(outcome.fallback_count, 1);
    assert!(outcome.captions.iter().all(|c| c.score.is_some()));
    Ok(())
}

#[tokio::test]
async fn empty_round_reveals_with_zero_scores() -> Result<(), DomainError> {
    let game = TestGameBuilder::new().build();
    let (host, _) = lobby(&game, 2, &["Alice"]).await?;
    let code = host.session.code.clone();
    let round = game.state.rounds.start_round(&code, &host.token).await?;

    let outcome = game
        .state
        .rounds
        .reveal_round(&code, &round.id, &host.token)
        .await?;
    assert!(outcome.captions.is_empty());
    assert!(outcome.leaderboard.iter().all(|e| e.total_score == 0));
    assert_eq!(
        outcome.leaderboard.iter().map(|e| e.rank).collect::<Vec<_>>(),
        vec![1, 2]
    );
    Ok(())
}

#[tokio::test]
async fn broken_image_source_uses_placeholder() -> Result<(), DomainError> {
    let notices = RecordingBroadcaster::new();
    let state = StateBuilder::new()
        .with_images(Arc::new(BrokenImageSource))
        .with_broadcaster(notices)
        .build();
    let host = state.registry.create_session("Host", Some(1)).await?;
    let round = state
        .rounds
        .start_round(&host.session.code, &host.token)
        .await?;
    assert_eq!(round.image_url, PLACEHOLDER_IMAGE_URL);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn auto_reveal_fires_once_everyone_submitted() -> Result<(), DomainError> {
    let game = TestGameBuilder::new()
        .rules(|rules| rules.reveal_policy = RevealPolicy::AutoWhenAllSubmitted)
        .build();
    let (host, guests) = lobby(&game, 2, &["Alice"]).await?;
    let code = host.session.code.clone();
    let round = game.state.rounds.start_round(&code, &host.token).await?;

    game.state
        .rounds
        .submit_caption(&code, &round.id, &host.token, "one")
        .await?;
    assert_eq!(
        game.state.registry.get_state(&code).await?.session.status,
        SessionStatus::InRound
    );
    game.state
        .rounds
        .submit_caption(&code, &round.id, &guests[0].token, "two")
        .await?;

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let state = game.state.registry.get_state(&code).await?;
        if state.session.status == SessionStatus::Revealing {
            assert_eq!(state.revealed_captions.len(), 2);
            break;
        }
        assert!(Instant::now() < deadline, "auto-reveal never happened");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // The host arriving late is a conflict, not a second reveal.
    let err = game
        .state
        .rounds
        .reveal_round(&code, &round.id, &host.token)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(
        game.notices
            .names_for(&code)
            .iter()
            .filter(|n| **n == "round_revealed")
            .count(),
        1
    );
    Ok(())
}

#[tokio::test]
async fn failed_reveal_write_leaves_the_round_retryable() -> Result<(), DomainError> {
    let storage = InterposedStorage::new();
    let game = TestGameBuilder::new().storage(storage.clone()).build();
    let (host, guests) = lobby(&game, 2, &["Alice"]).await?;
    let code = host.session.code.clone();
    let rounds = &game.state.rounds;
    let round = rounds.start_round(&code, &host.token).await?;
    rounds
        .submit_caption(&code, &round.id, &guests[0].token, "cat in a box")
        .await?;

    storage.fail_next_finalize();
    let err = rounds
        .reveal_round(&code, &round.id, &host.token)
        .await
        .unwrap_err();
    assert!(!err.is_conflict(), "{err:?}");

    let state = game.state.registry.get_state(&code).await?;
    assert_eq!(state.session.status, SessionStatus::InRound);
    assert_eq!(
        state.active_round.as_ref().map(|r| r.id.as_str()),
        Some(round.id.as_str())
    );
    assert!(state.revealed_captions.is_empty());
    assert!(!game.notices.names_for(&code).contains(&"round_revealed"));

    let outcome = rounds.reveal_round(&code, &round.id, &host.token).await?;
    assert_eq!(outcome.session.status, SessionStatus::Revealing);
    assert_eq!(outcome.captions.len(), 1);
    assert!(outcome.captions[0].score.is_some());

    let next = rounds.start_round(&code, &host.token).await?;
    assert_eq!(next.number, 2);
    Ok(())
}
