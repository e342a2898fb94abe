//! Full two-player match driven through the room + coordinator surface,
//! without sockets. Uses paused tokio time so the act script's pauses and
//! the timer tick loop run on virtual time.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use uuid::Uuid;

use defusal_backend::protocol::ServerToClient;
use defusal_backend::room::manager::{Room, RoomManager};
use defusal_backend::session::content::Campaign;
use defusal_backend::session::coordinator::{self, GameOutcome};
use defusal_backend::session::puzzles::{Answer, PuzzleName};
use defusal_backend::session::roles::Role;
use defusal_backend::session::story::Ending;

struct Player {
    id: Uuid,
    rx: UnboundedReceiver<ServerToClient>,
}

fn setup(campaign: Campaign) -> (Arc<Room>, Player, Player) {
    let rooms = RoomManager::new();
    let room = rooms.create(Arc::new(campaign));
    let office_id = room.add_player("amara".into()).unwrap();
    let bomb_id = room.add_player("sizwe".into()).unwrap();
    let (office_tx, office_rx) = mpsc::unbounded_channel();
    let (bomb_tx, bomb_rx) = mpsc::unbounded_channel();
    room.connect(office_id, office_tx);
    room.connect(bomb_id, bomb_tx);
    (
        room,
        Player { id: office_id, rx: office_rx },
        Player { id: bomb_id, rx: bomb_rx },
    )
}

fn begin_match(room: &Arc<Room>, office: &Player, bomb: &Player) {
    coordinator::press_start(room, office.id);
    coordinator::press_start(room, bomb.id);
    coordinator::select_role(room, office.id, Role::Office);
    coordinator::select_role(room, bomb.id, Role::Bomb);
}

async fn wait_for(
    rx: &mut UnboundedReceiver<ServerToClient>,
    pred: impl Fn(&ServerToClient) -> bool,
) -> ServerToClient {
    loop {
        let msg = rx.recv().await.expect("event channel closed");
        if pred(&msg) {
            return msg;
        }
    }
}

async fn wait_for_activation(rx: &mut UnboundedReceiver<ServerToClient>, puzzle: PuzzleName) {
    wait_for(rx, |m| {
        matches!(m, ServerToClient::ActivatePuzzle { puzzle: p, .. } if *p == puzzle)
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn full_match_ends_in_redemption() {
    let (room, mut office, mut bomb) = setup(Campaign::standard());
    begin_match(&room, &office, &bomb);

    wait_for(&mut office.rx, |m| matches!(m, ServerToClient::EnterStory)).await;

    // Act 1
    wait_for_activation(&mut bomb.rx, PuzzleName::LightSwitch).await;
    coordinator::submit_puzzle(
        &room,
        bomb.id,
        PuzzleName::LightSwitch,
        &Answer::Sequence(vec![2, 4, 1, 3]),
    );
    wait_for_activation(&mut office.rx, PuzzleName::AnagramAct1).await;
    coordinator::submit_puzzle(
        &room,
        office.id,
        PuzzleName::AnagramAct1,
        &Answer::Text("not smart enough".into()),
    );

    // Act 2
    wait_for_activation(&mut office.rx, PuzzleName::PeriodicTable).await;
    coordinator::submit_puzzle(
        &room,
        office.id,
        PuzzleName::PeriodicTable,
        &Answer::Text("GeNiUS".into()),
    );

    // Act 3
    wait_for_activation(&mut bomb.rx, PuzzleName::WireCut).await;
    coordinator::submit_puzzle(&room, bomb.id, PuzzleName::WireCut, &Answer::Text("red".into()));
    wait_for_activation(&mut bomb.rx, PuzzleName::ChalkCode).await;
    coordinator::submit_puzzle(&room, bomb.id, PuzzleName::ChalkCode, &Answer::Text("Zipho".into()));
    wait_for_activation(&mut bomb.rx, PuzzleName::BombRiddle).await;
    coordinator::submit_puzzle(
        &room,
        bomb.id,
        PuzzleName::BombRiddle,
        &Answer::Sequence(vec![3, 1, 4, 2]),
    );

    // Act 4: agree on the compassionate choice
    wait_for_activation(&mut office.rx, PuzzleName::MoralChoice).await;
    coordinator::make_moral_choice(&room, office.id, 0);
    coordinator::make_moral_choice(&room, bomb.id, 0);

    let ending = wait_for(&mut office.rx, |m| matches!(m, ServerToClient::Ending { .. })).await;
    match ending {
        ServerToClient::Ending { kind, .. } => assert_eq!(kind, Ending::Redemption),
        _ => unreachable!(),
    }
    let over = wait_for(&mut bomb.rx, |m| matches!(m, ServerToClient::GameOver { .. })).await;
    match over {
        ServerToClient::GameOver { success, .. } => assert!(success),
        _ => unreachable!(),
    }

    let session = room.session.lock();
    // six puzzle rewards plus the agreed choice weight
    assert_eq!(session.story_points, 11);
    assert!(session.flags.moral_choice_complete);
    assert_eq!(session.outcome, Some(GameOutcome::Win(Ending::Redemption)));
}

#[tokio::test(start_paused = true)]
async fn moral_conflict_is_reported_then_agreement_completes() {
    let (room, mut office, mut bomb) = setup(Campaign::standard());
    begin_match(&room, &office, &bomb);

    wait_for_activation(&mut bomb.rx, PuzzleName::LightSwitch).await;
    coordinator::submit_puzzle(
        &room,
        bomb.id,
        PuzzleName::LightSwitch,
        &Answer::Sequence(vec![2, 4, 1, 3]),
    );
    wait_for_activation(&mut office.rx, PuzzleName::AnagramAct1).await;
    coordinator::submit_puzzle(
        &room,
        office.id,
        PuzzleName::AnagramAct1,
        &Answer::Text("NOTSMARTENOUGH".into()),
    );
    wait_for_activation(&mut office.rx, PuzzleName::PeriodicTable).await;
    coordinator::submit_puzzle(
        &room,
        office.id,
        PuzzleName::PeriodicTable,
        &Answer::Text("genius".into()),
    );
    wait_for_activation(&mut bomb.rx, PuzzleName::WireCut).await;
    coordinator::submit_puzzle(&room, bomb.id, PuzzleName::WireCut, &Answer::Text("RED".into()));
    wait_for_activation(&mut bomb.rx, PuzzleName::ChalkCode).await;
    coordinator::submit_puzzle(&room, bomb.id, PuzzleName::ChalkCode, &Answer::Text("zipho".into()));
    wait_for_activation(&mut bomb.rx, PuzzleName::BombRiddle).await;
    coordinator::submit_puzzle(
        &room,
        bomb.id,
        PuzzleName::BombRiddle,
        &Answer::Sequence(vec![3, 1, 4, 2]),
    );

    wait_for_activation(&mut office.rx, PuzzleName::MoralChoice).await;
    coordinator::make_moral_choice(&room, office.id, 0);
    coordinator::make_moral_choice(&room, bomb.id, 1);
    wait_for(&mut office.rx, |m| matches!(m, ServerToClient::MoralConflict)).await;
    assert!(!room.session.lock().puzzles.is_complete(PuzzleName::MoralChoice));

    // both settle on the symbolic message
    coordinator::make_moral_choice(&room, office.id, 1);
    coordinator::make_moral_choice(&room, bomb.id, 1);
    let ending = wait_for(&mut bomb.rx, |m| matches!(m, ServerToClient::Ending { .. })).await;
    match ending {
        // 6 puzzle points - 15 = -9, below the revenge threshold
        ServerToClient::Ending { kind, .. } => assert_eq!(kind, Ending::Revenge),
        _ => unreachable!(),
    }
}

#[tokio::test(start_paused = true)]
async fn timer_expiry_while_awaiting_a_puzzle_loses_the_match() {
    let mut campaign = Campaign::standard();
    campaign.timer_secs = 30.0;
    let (room, mut office, bomb) = setup(campaign);
    begin_match(&room, &office, &bomb);

    // the sequencer suspends on light_switch; nobody ever submits
    let over = wait_for(&mut office.rx, |m| matches!(m, ServerToClient::GameOver { .. })).await;
    match over {
        ServerToClient::GameOver { success, timer_secs } => {
            assert!(!success);
            assert_eq!(timer_secs, 0);
        }
        _ => unreachable!(),
    }

    {
        let session = room.session.lock();
        assert_eq!(session.outcome, Some(GameOutcome::Loss));
        assert_eq!(session.current_act.number(), 1);
    }

    // post-loss submissions are no-ops
    coordinator::submit_puzzle(
        &room,
        bomb.id,
        PuzzleName::LightSwitch,
        &Answer::Sequence(vec![2, 4, 1, 3]),
    );
    assert!(!room.session.lock().puzzles.is_complete(PuzzleName::LightSwitch));
}

#[tokio::test(start_paused = true)]
async fn wrong_wire_penalizes_timer_and_is_retryable() {
    let (room, mut office, mut bomb) = setup(Campaign::standard());
    begin_match(&room, &office, &bomb);

    wait_for_activation(&mut bomb.rx, PuzzleName::LightSwitch).await;
    coordinator::submit_puzzle(
        &room,
        bomb.id,
        PuzzleName::LightSwitch,
        &Answer::Sequence(vec![2, 4, 1, 3]),
    );
    wait_for_activation(&mut office.rx, PuzzleName::AnagramAct1).await;
    coordinator::submit_puzzle(
        &room,
        office.id,
        PuzzleName::AnagramAct1,
        &Answer::Text("notsmartenough".into()),
    );
    wait_for_activation(&mut office.rx, PuzzleName::PeriodicTable).await;
    coordinator::submit_puzzle(
        &room,
        office.id,
        PuzzleName::PeriodicTable,
        &Answer::Text("GENIUS".into()),
    );
    wait_for_activation(&mut bomb.rx, PuzzleName::WireCut).await;

    let before = room.session.lock().timer.remaining();
    coordinator::submit_puzzle(&room, bomb.id, PuzzleName::WireCut, &Answer::Text("Blue".into()));
    let failed = wait_for(&mut bomb.rx, |m| matches!(m, ServerToClient::PuzzleFailed { .. })).await;
    match failed {
        ServerToClient::PuzzleFailed { puzzle, penalty_secs } => {
            assert_eq!(puzzle, PuzzleName::WireCut);
            assert_eq!(penalty_secs, 20.0);
        }
        _ => unreachable!(),
    }
    {
        let session = room.session.lock();
        assert!(session.timer.remaining() <= before - 20.0);
        assert!(!session.puzzles.is_complete(PuzzleName::WireCut));
    }

    coordinator::submit_puzzle(&room, bomb.id, PuzzleName::WireCut, &Answer::Text("red".into()));
    wait_for(&mut bomb.rx, |m| {
        matches!(m, ServerToClient::PuzzleSolved { puzzle: PuzzleName::WireCut })
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn chat_relays_while_sequencer_is_suspended() {
    let (room, office, mut bomb) = setup(Campaign::standard());
    begin_match(&room, &office, &bomb);

    wait_for_activation(&mut bomb.rx, PuzzleName::LightSwitch).await;
    coordinator::relay_chat(&room, office.id, "order is 2 4 1 3".into());
    let chat = wait_for(&mut bomb.rx, |m| matches!(m, ServerToClient::Chat { .. })).await;
    match chat {
        ServerToClient::Chat { from, text } => {
            assert_eq!(from, "amara");
            assert_eq!(text, "order is 2 4 1 3");
        }
        _ => unreachable!(),
    }
}

#[tokio::test(start_paused = true)]
async fn reconnect_rebinds_the_same_participant() {
    let (room, office, bomb) = setup(Campaign::standard());
    begin_match(&room, &office, &bomb);

    room.disconnect(bomb.id);
    let (tx, mut rx) = mpsc::unbounded_channel();
    assert!(room.connect(bomb.id, tx));
    assert_eq!(room.session.lock().ledger.role_of(bomb.id), Some(Role::Bomb));

    // pushes flow to the fresh channel
    wait_for_activation(&mut rx, PuzzleName::LightSwitch).await;
}
