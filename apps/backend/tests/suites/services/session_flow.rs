use cagematch::domain::{RoundStatus, SessionStatus};
use cagematch::errors::domain::{
    ConflictKind, DomainError, NotFoundKind, UnauthorizedKind, ValidationKind,
};
use cagematch::realtime::SessionNotice;

use crate::support::doubles::{InterposedStorage, Parked};
use crate::support::game_setup::{lobby, TestGameBuilder, TEST_IMAGE};

#[tokio::test]
async fn three_round_game_runs_to_finished() -> Result<(), DomainError> {
    let game = TestGameBuilder::new().build();
    let (host, guests) = lobby(&game, 3, &["Alice", "Bob"]).await?;
    let code = host.session.code.clone();
    let rounds = &game.state.rounds;

    let lines = [
        ["one", "one two", "one two three"],
        ["a b c d", "a", "a b"],
        ["x", "x y", "x"],
    ];

    for (index, round_lines) in lines.iter().enumerate() {
        let round = rounds.start_round(&code, &host.token).await?;
        assert_eq!(round.number, index as u32 + 1);
        assert_eq!(round.image_url, TEST_IMAGE);

        let tokens = [&host.token, &guests[0].token, &guests[1].token];
        for (token, text) in tokens.iter().zip(round_lines) {
            rounds.submit_caption(&code, &round.id, token, text).await?;
        }

        let outcome = rounds.reveal_round(&code, &round.id, &host.token).await?;
        assert_eq!(outcome.round.status, RoundStatus::Revealed);
        assert_eq!(outcome.captions.len(), 3);
        assert_eq!(outcome.fallback_count, 0);
        assert!(outcome.captions.iter().all(|c| c.score.is_some()));

        let expected = if index == 2 {
            SessionStatus::Finished
        } else {
            SessionStatus::Revealing
        };
        assert_eq!(outcome.session.status, expected);
    }

    // The word counter judge makes each caption worth twice its word count.
    let state = game.state.registry.get_state(&code).await?;
    let totals: Vec<(String, u32)> = state
        .leaderboard
        .iter()
        .map(|e| (e.display_name.clone(), e.total_score))
        .collect();
    let host_total = totals.iter().find(|(n, _)| n == "Host").map(|(_, t)| *t);
    let alice_total = totals.iter().find(|(n, _)| n == "Alice").map(|(_, t)| *t);
    let bob_total = totals.iter().find(|(n, _)| n == "Bob").map(|(_, t)| *t);
    assert_eq!(host_total, Some(2 * (1 + 4 + 1)));
    assert_eq!(alice_total, Some(2 * (2 + 1 + 2)));
    assert_eq!(bob_total, Some(2 * (3 + 2 + 1)));
    // Host and Bob tie on 12; the host joined first.
    let ranks: Vec<(&str, u32)> = state
        .leaderboard
        .iter()
        .map(|e| (e.display_name.as_str(), e.rank))
        .collect();
    assert_eq!(ranks, vec![("Host", 1), ("Bob", 2), ("Alice", 3)]);
    assert_eq!(state.revealed_captions.len(), 9);
    assert!(state.active_round.is_none());

    let err = rounds.start_round(&code, &host.token).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::IllegalTransition, _)
    ));

    let names = game.notices.names_for(&code);
    assert_eq!(names.iter().filter(|n| **n == "player_joined").count(), 2);
    assert_eq!(names.iter().filter(|n| **n == "round_started").count(), 3);
    assert_eq!(names.iter().filter(|n| **n == "caption_submitted").count(), 9);
    assert_eq!(names.iter().filter(|n| **n == "round_revealed").count(), 3);
    assert_eq!(names.last(), Some(&"session_finished"));
    Ok(())
}

#[tokio::test]
async fn only_host_can_drive_the_game() -> Result<(), DomainError> {
    let game = TestGameBuilder::new().build();
    let (host, guests) = lobby(&game, 2, &["Alice"]).await?;
    let code = host.session.code.clone();

    let err = game
        .state
        .rounds
        .start_round(&code, &guests[0].token)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Unauthorized(UnauthorizedKind::NotHost, _)
    ));

    let err = game
        .state
        .rounds
        .start_round(&code, "not-a-token")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Unauthorized(UnauthorizedKind::InvalidToken, _)
    ));

    let round = game.state.rounds.start_round(&code, &host.token).await?;
    let err = game
        .state
        .rounds
        .reveal_round(&code, &round.id, &guests[0].token)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Unauthorized(UnauthorizedKind::NotHost, _)
    ));

    let err = game
        .state
        .registry
        .end_session(&code, &guests[0].token)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Unauthorized(UnauthorizedKind::NotHost, _)
    ));
    Ok(())
}

#[tokio::test]
async fn tokens_do_not_cross_sessions() -> Result<(), DomainError> {
    let game = TestGameBuilder::new().build();
    let (first, _) = lobby(&game, 1, &[]).await?;
    let (second, _) = lobby(&game, 1, &[]).await?;

    let round = game
        .state
        .rounds
        .start_round(&second.session.code, &second.token)
        .await?;
    let err = game
        .state
        .rounds
        .submit_caption(&second.session.code, &round.id, &first.token, "sneaky")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Unauthorized(UnauthorizedKind::InvalidToken, _)
    ));
    Ok(())
}

#[tokio::test]
async fn caption_rules_are_enforced() -> Result<(), DomainError> {
    let game = TestGameBuilder::new()
        .rules(|rules| rules.max_caption_words = 5)
        .build();
    let (host, _) = lobby(&game, 2, &[]).await?;
    let code = host.session.code.clone();
    let rounds = &game.state.rounds;
    let round = rounds.start_round(&code, &host.token).await?;

    let err = rounds
        .submit_caption(&code, &round.id, &host.token, "   ")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::EmptyCaption, _)
    ));

    let err = rounds
        .submit_caption(&code, &round.id, &host.token, "one two three four five six")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::CaptionTooLong, _)
    ));

    rounds
        .submit_caption(&code, &round.id, &host.token, "one two three four five")
        .await?;
    let err = rounds
        .submit_caption(&code, &round.id, &host.token, "again")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::DuplicateSubmission, _)
    ));
    Ok(())
}

#[tokio::test]
async fn captions_only_land_in_the_active_round() -> Result<(), DomainError> {
    let game = TestGameBuilder::new().build();
    let (host, _) = lobby(&game, 3, &[]).await?;
    let code = host.session.code.clone();
    let rounds = &game.state.rounds;

    let err = rounds
        .submit_caption(&code, "round_missing", &host.token, "too early")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::IllegalTransition, _)
    ));

    let first = rounds.start_round(&code, &host.token).await?;
    rounds.reveal_round(&code, &first.id, &host.token).await?;
    let second = rounds.start_round(&code, &host.token).await?;

    let err = rounds
        .submit_caption(&code, &first.id, &host.token, "late")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::RoundMismatch, _)
    ));

    let err = rounds
        .submit_caption(&code, "round_missing", &host.token, "lost")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Round, _)));

    rounds
        .submit_caption(&code, &second.id, &host.token, "on time")
        .await?;
    Ok(())
}

#[tokio::test]
async fn state_hides_captions_until_reveal() -> Result<(), DomainError> {
    let game = TestGameBuilder::new().build();
    let (host, guests) = lobby(&game, 2, &["Alice"]).await?;
    let code = host.session.code.clone();
    let rounds = &game.state.rounds;
    let round = rounds.start_round(&code, &host.token).await?;

    let submitted = rounds
        .submit_caption(&code, &round.id, &guests[0].token, "secret punchline")
        .await?;
    assert_eq!(submitted.submitted, 1);
    assert_eq!(submitted.player_count, 2);

    let state = game.state.registry.get_state(&code).await?;
    assert_eq!(state.session.status, SessionStatus::InRound);
    assert_eq!(state.active_round.as_ref().map(|r| r.id.as_str()), Some(round.id.as_str()));
    assert_eq!(state.submitted_count, 1);
    assert!(state.revealed_captions.is_empty());
    let serialized = serde_json::to_string(&state).unwrap();
    assert!(!serialized.contains("secret punchline"));

    rounds.reveal_round(&code, &round.id, &host.token).await?;
    let state = game.state.registry.get_state(&code).await?;
    assert_eq!(state.submitted_count, 0);
    assert_eq!(state.revealed_captions.len(), 1);
    assert_eq!(state.revealed_captions[0].text, "secret punchline");
    Ok(())
}

#[tokio::test]
async fn state_read_racing_a_new_round_keeps_captions_hidden() -> Result<(), DomainError> {
    let storage = InterposedStorage::new();
    let game = TestGameBuilder::new().storage(storage.clone()).build();
    let (host, guests) = lobby(&game, 2, &["Alice"]).await?;
    let code = host.session.code.clone();

    // The read sees no active round, then a round opens and takes a caption.
    let Parked { reached, release } = storage.park_next_active_round();
    let read = {
        let registry = game.state.registry.clone();
        let code = code.clone();
        tokio::spawn(async move { registry.get_state(&code).await })
    };
    reached.await.expect("state read reached storage");

    let rounds = &game.state.rounds;
    let round = rounds.start_round(&code, &host.token).await?;
    rounds
        .submit_caption(&code, &round.id, &guests[0].token, "secret punchline")
        .await?;
    let _ = release.send(());

    let state = read.await.expect("task panicked")?;
    assert!(state.active_round.is_none());
    assert!(state.revealed_captions.is_empty());
    let serialized = serde_json::to_string(&state).unwrap();
    assert!(!serialized.contains("secret punchline"));
    Ok(())
}

#[tokio::test]
async fn submission_notice_never_carries_caption_text() -> Result<(), DomainError> {
    let game = TestGameBuilder::new().build();
    let (host, _) = lobby(&game, 1, &[]).await?;
    let code = host.session.code.clone();
    let round = game.state.rounds.start_round(&code, &host.token).await?;
    game.state
        .rounds
        .submit_caption(&code, &round.id, &host.token, "do not leak me")
        .await?;

    let notices = game.notices.notices();
    let (_, notice) = notices
        .iter()
        .find(|(_, n)| matches!(n, SessionNotice::CaptionSubmitted { .. }))
        .expect("caption_submitted notice");
    let json = serde_json::to_string(notice).unwrap();
    assert!(!json.contains("do not leak me"));
    assert!(!json.contains(&host.player.id));
    Ok(())
}

#[tokio::test]
async fn join_and_end_follow_the_state_machine() -> Result<(), DomainError> {
    let game = TestGameBuilder::new().build();
    let (host, _) = lobby(&game, 2, &[]).await?;
    let code = host.session.code.clone();
    let registry = &game.state.registry;

    // Joining mid-round is allowed.
    game.state.rounds.start_round(&code, &host.token).await?;
    let late = registry.join_session(&code.to_lowercase(), "Latecomer").await?;
    assert_eq!(late.player.join_order, 1);
    assert!(!late.player.is_host);

    let ended = registry.end_session(&code, &host.token).await?;
    assert_eq!(ended.status, SessionStatus::Finished);
    assert_eq!(game.notices.names_for(&code).last(), Some(&"session_finished"));

    let err = registry.join_session(&code, "Too Late").await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::IllegalTransition, _)
    ));
    let err = registry.end_session(&code, &host.token).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::IllegalTransition, _)
    ));
    Ok(())
}

#[tokio::test]
async fn bad_inputs_are_rejected_before_lookup() -> Result<(), DomainError> {
    let game = TestGameBuilder::new().build();
    let registry = &game.state.registry;

    let err = registry.create_session("   ", None).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidDisplayName, _)
    ));
    let err = registry.create_session("Host", Some(0)).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidSettings, _)
    ));
    let err = registry.get_state("no!").await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidSessionCode, _)
    ));
    let err = registry.get_state("ZZZZZZ").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Session, _)));
    Ok(())
}
