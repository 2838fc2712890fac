//! Integration tests for the dispatcher: pairing, relaying, game end and
//! disconnect teardown, driven through raw JSON frames.

use mess_protocol::{
    ClientMessage, Color, GameEndReason, Move, ServerMessage, Square,
};
use mess_rules::{Outcome, RulesEngine, RulesError, StandardChess};
use mess_session::{
    ConnectionHandle, DisconnectOutcome, Dispatcher, Outbox, SessionError,
};
use mess_transport::ConnectionId;
use serde_json::{json, Value};

// =========================================================================
// Scripted rules: a move onto e8 mates, onto d8 stalemates, and a move
// that goes nowhere is illegal. Everything else is accepted.
// =========================================================================

struct ScriptedRules;

#[derive(Debug)]
struct ScriptedBoard {
    turn: Color,
    outcome: Option<Outcome>,
    moves: Vec<Move>,
}

impl RulesEngine for ScriptedRules {
    type Board = ScriptedBoard;

    fn new_board() -> ScriptedBoard {
        ScriptedBoard {
            turn: Color::White,
            outcome: None,
            moves: Vec::new(),
        }
    }

    fn apply_move(board: &mut ScriptedBoard, mv: &Move) -> Result<(), RulesError> {
        if board.outcome.is_some() {
            return Err(RulesError::GameOver);
        }
        if mv.from == mv.to {
            return Err(RulesError::IllegalMove(mv.to_string()));
        }
        board.moves.push(*mv);
        board.turn = board.turn.opposite();
        board.outcome = match mv.to.to_string().as_str() {
            "e8" => Some(Outcome::Checkmate),
            "d8" => Some(Outcome::Stalemate),
            _ => None,
        };
        Ok(())
    }

    fn outcome(board: &ScriptedBoard) -> Option<Outcome> {
        board.outcome
    }

    fn side_to_move(board: &ScriptedBoard) -> Color {
        board.turn
    }
}

// =========================================================================
// Helpers
// =========================================================================

struct Client {
    handle: ConnectionHandle,
    outbox: Outbox,
}

impl Client {
    fn new(id: u64) -> Self {
        let (handle, outbox) = ConnectionHandle::channel(ConnectionId::new(id));
        Self { handle, outbox }
    }

    fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    /// Everything delivered since the last call, as JSON values.
    fn received(&mut self) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(msg) = self.outbox.try_recv() {
            out.push(serde_json::to_value(&msg).unwrap());
        }
        out
    }
}

fn frame(value: Value) -> Vec<u8> {
    serde_json::to_vec(&value).unwrap()
}

fn join_frame() -> Vec<u8> {
    frame(json!({"type": "init_game"}))
}

fn move_frame(from: &str, to: &str) -> Vec<u8> {
    frame(json!({"type": "move", "payload": {"from": from, "to": to}}))
}

fn relay(from: &str, to: &str) -> Value {
    json!({"type": "move", "payload": {"from": from, "to": to}})
}

fn join<R: RulesEngine>(dispatcher: &mut Dispatcher<R>, client: &Client) {
    dispatcher.on_message(&client.handle, &join_frame());
}

/// Pairs two fresh clients and discards their color assignments.
fn paired<R: RulesEngine>() -> (Dispatcher<R>, Client, Client) {
    let mut dispatcher = Dispatcher::default();
    let mut white = Client::new(1);
    let mut black = Client::new(2);
    join(&mut dispatcher, &white);
    join(&mut dispatcher, &black);
    white.received();
    black.received();
    (dispatcher, white, black)
}

// =========================================================================
// Matchmaking
// =========================================================================

#[test]
fn test_pairing_assigns_colors_by_arrival() {
    let mut dispatcher = Dispatcher::<ScriptedRules>::default();
    let mut a = Client::new(1);
    let mut b = Client::new(2);

    join(&mut dispatcher, &a);
    assert_eq!(dispatcher.waiting(), Some(a.id()));
    assert!(a.received().is_empty());
    assert_eq!(dispatcher.session_count(), 0);

    join(&mut dispatcher, &b);
    assert_eq!(dispatcher.waiting(), None);
    assert_eq!(dispatcher.session_count(), 1);
    assert_eq!(
        a.received(),
        vec![json!({"type": "init_game", "payload": {"color": "white"}})]
    );
    assert_eq!(
        b.received(),
        vec![json!({"type": "init_game", "payload": {"color": "black"}})]
    );
    assert_eq!(dispatcher.session_of(a.id()), dispatcher.session_of(b.id()));
}

#[test]
fn test_third_connection_waits_alone() {
    let (mut dispatcher, _white, _black) = paired::<ScriptedRules>();
    let mut c = Client::new(3);

    join(&mut dispatcher, &c);
    assert_eq!(dispatcher.waiting(), Some(c.id()));
    assert_eq!(dispatcher.session_count(), 1);
    assert_eq!(dispatcher.session_of(c.id()), None);
    assert!(c.received().is_empty());
}

#[test]
fn test_repeat_join_is_refused() {
    let mut dispatcher = Dispatcher::<ScriptedRules>::default();
    let a = Client::new(1);
    join(&mut dispatcher, &a);

    let again = dispatcher.dispatch(&a.handle, ClientMessage::InitGame);
    assert!(matches!(again, Err(SessionError::AlreadyWaiting(_))));
    assert_eq!(dispatcher.waiting(), Some(a.id()));
}

#[test]
fn test_join_while_playing_is_refused() {
    let (mut dispatcher, white, _black) = paired::<ScriptedRules>();
    let result = dispatcher.dispatch(&white.handle, ClientMessage::InitGame);
    assert!(matches!(result, Err(SessionError::AlreadyInSession(..))));
    assert_eq!(dispatcher.waiting(), None);
}

#[test]
fn test_many_pairs_form_independent_sessions() {
    let mut dispatcher = Dispatcher::<ScriptedRules>::default();
    let clients: Vec<Client> = (1..=6).map(Client::new).collect();
    for client in &clients {
        join(&mut dispatcher, client);
    }
    assert_eq!(dispatcher.session_count(), 3);
    assert_eq!(dispatcher.waiting(), None);
    assert_ne!(
        dispatcher.session_of(clients[0].id()),
        dispatcher.session_of(clients[2].id())
    );
}

// =========================================================================
// Moves
// =========================================================================

#[test]
fn test_moves_are_relayed_to_both() {
    let (mut dispatcher, mut white, mut black) = paired::<StandardChess>();

    dispatcher.on_message(&white.handle, &move_frame("e2", "e4"));
    assert_eq!(white.received(), vec![relay("e2", "e4")]);
    assert_eq!(black.received(), vec![relay("e2", "e4")]);

    dispatcher.on_message(&black.handle, &move_frame("e7", "e5"));
    assert_eq!(white.received(), vec![relay("e7", "e5")]);
    assert_eq!(black.received(), vec![relay("e7", "e5")]);
}

#[test]
fn test_out_of_turn_move_has_no_effect() {
    let (mut dispatcher, mut white, mut black) = paired::<StandardChess>();

    dispatcher.on_message(&black.handle, &move_frame("g8", "f6"));
    assert!(white.received().is_empty());
    assert!(black.received().is_empty());

    // White's turn is untouched.
    dispatcher.on_message(&white.handle, &move_frame("e2", "e4"));
    assert_eq!(black.received(), vec![relay("e2", "e4")]);
}

#[test]
fn test_illegal_move_has_no_effect() {
    let (mut dispatcher, mut white, mut black) = paired::<ScriptedRules>();
    let session_id = dispatcher.session_of(white.id()).unwrap();

    let same = Move::new(Square::new(4, 1).unwrap(), Square::new(4, 1).unwrap());
    let result = dispatcher.dispatch(&white.handle, ClientMessage::Move { mv: same });
    assert!(matches!(result, Err(SessionError::IllegalMove(_))));
    assert!(white.received().is_empty());
    assert!(black.received().is_empty());

    let session = dispatcher.session(session_id).unwrap();
    assert_eq!(session.side_to_move(), Color::White);
}

#[test]
fn test_move_without_session_is_dropped() {
    let mut dispatcher = Dispatcher::<ScriptedRules>::default();
    let mut lone = Client::new(1);

    let result = dispatcher.dispatch(
        &lone.handle,
        ClientMessage::Move { mv: Move::parse("e2", "e4").unwrap() },
    );
    assert!(matches!(result, Err(SessionError::NotInSession(_))));

    join(&mut dispatcher, &lone);
    dispatcher.on_message(&lone.handle, &move_frame("e2", "e4"));
    assert!(lone.received().is_empty());
    assert_eq!(dispatcher.waiting(), Some(lone.id()));
}

#[test]
fn test_malformed_frames_are_dropped() {
    let (mut dispatcher, mut white, mut black) = paired::<StandardChess>();

    for bad in [
        b"not json".to_vec(),
        frame(json!({"type": "resign"})),
        frame(json!({"type": "move"})),
        frame(json!({"type": "move", "payload": {"from": "e2", "to": "z9"}})),
        frame(json!({"payload": {"from": "e2", "to": "e4"}})),
    ] {
        dispatcher.on_message(&white.handle, &bad);
    }
    assert!(white.received().is_empty());
    assert!(black.received().is_empty());
    assert_eq!(dispatcher.session_count(), 1);

    dispatcher.on_message(&white.handle, &move_frame("d2", "d4"));
    assert_eq!(black.received(), vec![relay("d2", "d4")]);
}

#[test]
fn test_legacy_move_key_is_accepted() {
    let (mut dispatcher, mut white, mut black) = paired::<StandardChess>();
    dispatcher.on_message(
        &white.handle,
        &frame(json!({"type": "move", "move": {"from": "e2", "to": "e4"}})),
    );
    assert_eq!(white.received(), vec![relay("e2", "e4")]);
    assert_eq!(black.received(), vec![relay("e2", "e4")]);
}

// =========================================================================
// Game end
// =========================================================================

#[test]
fn test_checkmate_announces_mover_as_winner() {
    let (mut dispatcher, mut white, mut black) = paired::<ScriptedRules>();

    dispatcher.on_message(&white.handle, &move_frame("e7", "e8"));
    let expected = vec![
        relay("e7", "e8"),
        json!({"type": "game_over", "payload": {"winner": "white", "reason": "checkmate"}}),
    ];
    assert_eq!(white.received(), expected);
    assert_eq!(black.received(), expected);
    assert_eq!(dispatcher.session_count(), 0);
}

#[test]
fn test_stalemate_is_a_draw() {
    let (mut dispatcher, mut white, mut black) = paired::<ScriptedRules>();

    dispatcher.on_message(&white.handle, &move_frame("a2", "a3"));
    dispatcher.on_message(&black.handle, &move_frame("d7", "d8"));
    let over = json!({"type": "game_over", "payload": {"winner": null, "reason": "stalemate"}});
    assert_eq!(white.received().last(), Some(&over));
    assert_eq!(black.received().last(), Some(&over));
}

#[test]
fn test_fools_mate_end_to_end() {
    let (mut dispatcher, mut white, mut black) = paired::<StandardChess>();

    dispatcher.on_message(&white.handle, &move_frame("f2", "f3"));
    dispatcher.on_message(&black.handle, &move_frame("e7", "e5"));
    dispatcher.on_message(&white.handle, &move_frame("g2", "g4"));
    white.received();
    black.received();

    dispatcher.on_message(&black.handle, &move_frame("d8", "h4"));
    let expected = vec![
        relay("d8", "h4"),
        json!({"type": "game_over", "payload": {"winner": "black", "reason": "checkmate"}}),
    ];
    assert_eq!(white.received(), expected);
    assert_eq!(black.received(), expected);
}

#[test]
fn test_moves_after_game_over_are_ignored() {
    let (mut dispatcher, mut white, mut black) = paired::<ScriptedRules>();
    dispatcher.on_message(&white.handle, &move_frame("e7", "e8"));
    white.received();
    black.received();

    let result = dispatcher.dispatch(
        &black.handle,
        ClientMessage::Move { mv: Move::parse("a7", "a6").unwrap() },
    );
    assert!(matches!(result, Err(SessionError::NotInSession(_))));
    assert!(white.received().is_empty());
    assert!(black.received().is_empty());
}

#[test]
fn test_players_can_rejoin_after_game_over() {
    let (mut dispatcher, mut white, mut black) = paired::<ScriptedRules>();
    dispatcher.on_message(&white.handle, &move_frame("e7", "e8"));
    white.received();
    black.received();

    join(&mut dispatcher, &black);
    join(&mut dispatcher, &white);
    assert_eq!(
        black.received(),
        vec![json!({"type": "init_game", "payload": {"color": "white"}})]
    );
    assert_eq!(
        white.received(),
        vec![json!({"type": "init_game", "payload": {"color": "black"}})]
    );
}

#[test]
fn test_game_over_reason_maps_from_outcome() {
    assert_eq!(
        GameEndReason::from(Outcome::ThreefoldRepetition),
        GameEndReason::ThreefoldRepetition
    );
}

// =========================================================================
// Disconnects
// =========================================================================

#[test]
fn test_disconnect_mid_game_notifies_opponent_once() {
    let (mut dispatcher, white, mut black) = paired::<StandardChess>();
    let session_id = dispatcher.session_of(white.id()).unwrap();

    let outcome = dispatcher.on_close(white.id());
    assert_eq!(outcome, DisconnectOutcome::LeftSession(session_id));
    assert_eq!(
        black.received(),
        vec![json!({
            "type": "opponent_disconnected",
            "payload": {"message": "Your opponent has disconnected"}
        })]
    );
    assert_eq!(dispatcher.session_of(white.id()), None);
    assert_eq!(dispatcher.session_of(black.id()), None);
    assert_eq!(dispatcher.session_count(), 0);

    // Close and error both firing must not notify twice.
    let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
    assert_eq!(dispatcher.on_error(white.id(), &io), DisconnectOutcome::Unknown);
    assert!(black.received().is_empty());

    // The survivor's moves now have nowhere to go.
    dispatcher.on_message(&black.handle, &move_frame("e7", "e5"));
    assert!(black.received().is_empty());
}

#[test]
fn test_disconnect_while_waiting_clears_slot() {
    let mut dispatcher = Dispatcher::<ScriptedRules>::default();
    let mut a = Client::new(1);
    let mut b = Client::new(2);
    join(&mut dispatcher, &a);

    assert_eq!(dispatcher.on_close(a.id()), DisconnectOutcome::LeftQueue);
    assert_eq!(dispatcher.waiting(), None);
    assert!(a.received().is_empty());

    join(&mut dispatcher, &b);
    assert_eq!(dispatcher.waiting(), Some(b.id()));
    assert!(b.received().is_empty());
}

#[test]
fn test_disconnect_of_unknown_connection_is_noop() {
    let (mut dispatcher, mut white, mut black) = paired::<ScriptedRules>();
    assert_eq!(
        dispatcher.handle_disconnect(ConnectionId::new(99)),
        DisconnectOutcome::Unknown
    );
    assert_eq!(dispatcher.session_count(), 1);
    assert!(white.received().is_empty());
    assert!(black.received().is_empty());
}

#[test]
fn test_disconnect_survives_dead_opponent() {
    let (mut dispatcher, white, black) = paired::<ScriptedRules>();
    drop(black.outbox);

    let outcome = dispatcher.on_close(white.id());
    assert!(matches!(outcome, DisconnectOutcome::LeftSession(_)));
    assert_eq!(dispatcher.session_count(), 0);
}

#[test]
fn test_disconnect_after_game_over_only_cleans_up() {
    let (mut dispatcher, mut white, mut black) = paired::<ScriptedRules>();
    dispatcher.on_message(&white.handle, &move_frame("e7", "e8"));
    white.received();
    black.received();

    assert_eq!(dispatcher.on_close(white.id()), DisconnectOutcome::Unknown);
    assert!(black.received().is_empty());
}

#[test]
fn test_server_message_kinds_cover_disconnect() {
    assert_eq!(
        ServerMessage::opponent_disconnected().kind(),
        "opponent_disconnected"
    );
}
