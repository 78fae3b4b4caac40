use std::time::Duration;

use cagematch::errors::domain::{DomainError, NotFoundKind};
use tokio_util::sync::CancellationToken;

use crate::support::game_setup::{lobby, TestGameBuilder};

const SHORT_TTL: Duration = Duration::from_millis(150);

#[tokio::test]
async fn expired_sessions_vanish_and_are_reaped_once() -> Result<(), DomainError> {
    let game = TestGameBuilder::new()
        .rules(|rules| rules.session_ttl = SHORT_TTL)
        .build();
    let (host, _) = lobby(&game, 1, &["Alice"]).await?;
    let code = host.session.code.clone();
    game.state.registry.get_state(&code).await?;

    tokio::time::sleep(SHORT_TTL * 2).await;

    // Gone for callers before the reaper ever runs.
    let err = game.state.registry.get_state(&code).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Session, _)));
    let err = game
        .state
        .rounds
        .start_round(&code, &host.token)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let reaper = game.state.reaper(Duration::from_secs(60));
    assert_eq!(reaper.reap_now().await?, 1);
    assert_eq!(reaper.reap_now().await?, 0);
    assert!(game.state.storage.find_session(&code).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn live_sessions_survive_a_sweep() -> Result<(), DomainError> {
    let game = TestGameBuilder::new().build();
    let (host, _) = lobby(&game, 1, &[]).await?;

    let reaper = game.state.reaper(Duration::from_secs(60));
    assert_eq!(reaper.reap_now().await?, 0);
    game.state.registry.get_state(&host.session.code).await?;
    Ok(())
}

#[tokio::test]
async fn reap_session_only_removes_finished_sessions() -> Result<(), DomainError> {
    let game = TestGameBuilder::new().build();
    let (host, _) = lobby(&game, 1, &[]).await?;
    let code = host.session.code.clone();
    let reaper = game.state.reaper(Duration::from_secs(60));

    assert!(!reaper.reap_session(&code).await?);

    game.state.registry.end_session(&code, &host.token).await?;
    assert!(reaper.reap_session(&code).await?);
    assert!(!reaper.reap_session(&code).await?);

    let err = game.state.registry.get_state(&code).await.unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn background_reaper_sweeps_until_cancelled() -> Result<(), DomainError> {
    let game = TestGameBuilder::new()
        .rules(|rules| rules.session_ttl = SHORT_TTL)
        .build();
    let (host, _) = lobby(&game, 1, &[]).await?;
    let code = host.session.code.clone();

    let shutdown = CancellationToken::new();
    let handle = game
        .state
        .reaper(Duration::from_millis(25))
        .spawn(shutdown.clone());

    let mut gone = false;
    for _ in 0..100 {
        if game.state.storage.find_session(&code).await?.is_none() {
            gone = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(gone, "reaper never removed the expired session");

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("reaper stops on cancel")
        .expect("reaper task did not panic");
    Ok(())
}
