//! End-to-end match scenarios driven through the public `World` API.

use std::time::Duration;

use dodge_protocol::{ClientCommand, Phase, PlayerId, ServerMessage};
use dodge_session::Outbound;
use dodge_sim::{GameConfig, Obstacle, ObstacleKind, World};
use tokio::sync::mpsc::{self, UnboundedReceiver};

// =========================================================================
// Helpers
// =========================================================================

const DT: Duration = Duration::from_nanos(16_666_667);

struct Client {
    id: PlayerId,
    rx: UnboundedReceiver<Outbound>,
}

impl Client {
    fn drain(&mut self) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(bytes) = self.rx.try_recv() {
            out.push(serde_json::from_slice(&bytes).unwrap());
        }
        out
    }
}

fn connect(world: &mut World) -> Client {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = world.connect(tx).unwrap();
    Client { id, rx }
}

fn table(n: usize) -> (World, Vec<Client>) {
    let mut world = World::new(GameConfig::default(), 1234);
    let clients = (0..n).map(|_| connect(&mut world)).collect();
    (world, clients)
}

/// Readies everyone and steps through the countdown.
fn start_playing(world: &mut World, clients: &[Client]) {
    for c in clients {
        world.apply(c.id, ClientCommand::Ready { ready: true }).unwrap();
    }
    assert_eq!(world.phase(), Phase::Countdown);
    for _ in 0..400 {
        if world.phase() == Phase::Playing {
            return;
        }
        world.step(DT).unwrap();
    }
    panic!("countdown never finished");
}

/// A blade sitting on top of the player's hit box.
fn blade_on(world: &World, id: PlayerId) -> Obstacle {
    let p = world.session(&id).unwrap();
    let mut blade = Obstacle::falling(ObstacleKind::Blade, p.x + 8.0);
    blade.rect.y = p.y + 8.0;
    blade
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_two_ready_players_count_down_then_play() {
    let (mut world, mut clients) = table(2);
    for c in &mut clients {
        c.drain();
    }

    for c in &clients {
        world.apply(c.id, ClientCommand::Ready { ready: true }).unwrap();
    }

    // Both received a countdown snapshot immediately.
    for c in &mut clients {
        let msgs = c.drain();
        let snap = msgs.iter().find_map(|m| match m {
            ServerMessage::Snapshot(s) => Some(s),
            _ => None,
        });
        let snap = snap.expect("countdown snapshot");
        assert_eq!(snap.phase, Phase::Countdown);
        assert_eq!(snap.countdown_ms, 3000);
        assert_eq!(snap.players.len(), 2);
    }

    let mut last = world.snapshot().countdown_ms;
    while world.phase() == Phase::Countdown {
        world.step(DT).unwrap();
        let now = world.snapshot().countdown_ms;
        assert!(now <= last);
        last = now;
    }
    assert_eq!(last, 0);
    assert_eq!(world.phase(), Phase::Playing);

    for c in &mut clients {
        let msgs = c.drain();
        assert!(msgs.iter().any(|m| matches!(m, ServerMessage::Snapshot(s) if s.phase == Phase::Playing)));
    }
}

#[test]
fn test_obstacle_exit_rewards_survivor() {
    let (mut world, clients) = table(1);
    start_playing(&mut world, &clients);
    let id = clients[0].id;

    let mut leaving = Obstacle::falling(ObstacleKind::Blade, 40.0);
    leaving.rect.y = 608.0;
    let mut bystander = Obstacle::falling(ObstacleKind::Flame, 800.0);
    bystander.rect.y = 100.0;
    world.insert_obstacle(leaving);
    world.insert_obstacle(bystander);

    world.step(DT).unwrap();

    assert_eq!(world.session(&id).unwrap().score, 5);
    assert_eq!(world.obstacles().len(), 1);
    let left = world.obstacles()[0];
    assert_eq!(left.kind, ObstacleKind::Flame);
    assert_eq!(left.rect.x, 800.0);
    assert!(left.rect.y > 100.0);
}

#[test]
fn test_bomb_landing_becomes_one_explosion() {
    let (mut world, clients) = table(1);
    start_playing(&mut world, &clients);

    let ground = world.config().ground_y();
    let mut bomb = Obstacle::falling(ObstacleKind::Bomb, 60.0);
    bomb.rect.y = ground - bomb.rect.h - 1.0;
    world.insert_obstacle(bomb);

    world.step(DT).unwrap();

    let explosions: Vec<_> = world
        .obstacles()
        .iter()
        .filter(|o| o.kind == ObstacleKind::Explosion)
        .collect();
    assert_eq!(explosions.len(), 1);
    assert!(world.obstacles().iter().all(|o| o.kind != ObstacleKind::Bomb));

    let ex = explosions[0];
    assert_eq!((ex.rect.w, ex.rect.h), (96.0, 96.0));
    assert_eq!(ex.rect.center_x(), 75.0);
    assert_eq!(ex.rect.center_y(), ground);
    assert_eq!(ex.life_ms, 380.0);
}

#[test]
fn test_all_dead_then_three_votes_restart() {
    let (mut world, clients) = table(3);
    start_playing(&mut world, &clients);

    // All three stand on the start line, so one blade catches everyone.
    let blade = blade_on(&world, clients[0].id);
    world.insert_obstacle(blade);
    world.step(DT).unwrap();
    assert_eq!(world.phase(), Phase::AwaitingRestart);
    assert_eq!(world.round(), 1);

    let snap = world.snapshot();
    assert_eq!(snap.vote_count, Some(0));
    assert_eq!(snap.match_round, Some(1));
    assert_eq!(snap.match_total, Some(3));
    assert_eq!(snap.totals.map(|t| t.len()), Some(3));

    world.apply(clients[0].id, ClientCommand::Respawn).unwrap();
    world.apply(clients[1].id, ClientCommand::Respawn).unwrap();
    // A repeated vote does not count twice.
    world.apply(clients[1].id, ClientCommand::Respawn).unwrap();
    assert_eq!(world.phase(), Phase::AwaitingRestart);
    assert_eq!(world.vote_count(), 2);

    world.apply(clients[2].id, ClientCommand::Respawn).unwrap();
    assert_eq!(world.phase(), Phase::Countdown);
    assert_eq!(world.round(), 2);
    assert!(world.obstacles().is_empty());
    assert!(world.sessions().iter().all(|s| s.alive && s.score == 0));
}

#[test]
fn test_last_active_disconnect_forces_lobby() {
    let (mut world, mut clients) = table(2);
    start_playing(&mut world, &clients);
    let watcher = clients.remove(1);

    // One participant steps out to the solo lobby; the other disconnects.
    world.apply(watcher.id, ClientCommand::LeaveToLobby).unwrap();
    assert_eq!(world.phase(), Phase::Playing);
    world.disconnect(clients[0].id).unwrap();

    assert_eq!(world.phase(), Phase::Lobby);
    assert_eq!(world.round(), 0);
    assert!(world.session(&watcher.id).unwrap().is_active());
}

#[test]
fn test_disconnect_completes_pending_vote() {
    let (mut world, clients) = table(2);
    start_playing(&mut world, &clients);
    let blade = blade_on(&world, clients[0].id);
    world.insert_obstacle(blade);
    world.step(DT).unwrap();
    assert_eq!(world.phase(), Phase::AwaitingRestart);

    let round = world.round();

    world.apply(clients[0].id, ClientCommand::Respawn).unwrap();
    world.disconnect(clients[1].id).unwrap();
    assert_eq!(world.phase(), Phase::Countdown);
    assert_eq!(world.round(), round);
}

#[test]
fn test_disconnect_twice_reports_not_found() {
    let (mut world, clients) = table(1);
    world.disconnect(clients[0].id).unwrap();
    assert!(world.disconnect(clients[0].id).is_err());
}

// =========================================================================
// Properties
// =========================================================================

#[test]
fn test_knockback_stays_on_leash() {
    let (mut world, clients) = table(1);
    start_playing(&mut world, &clients);
    let id = clients[0].id;

    // Bomb landing just left of the player, who runs right the whole time.
    world
        .apply(id, ClientCommand::Input { left: false, right: true, up: false })
        .unwrap();
    let px = world.session(&id).unwrap().x;
    let ground = world.config().ground_y();
    let mut bomb = Obstacle::falling(ObstacleKind::Bomb, px - 30.0);
    bomb.rect.y = ground - bomb.rect.h - 1.0;
    world.insert_obstacle(bomb);

    world.step(DT).unwrap();
    let kb = world.session(&id).unwrap().knockback;
    assert!(kb.is_active(world.now_ms()));

    let width = world.config().player_width;
    while kb.is_active(world.now_ms()) {
        let p = world.session(&id).unwrap();
        let center = p.x + width / 2.0;
        assert!((center - kb.origin_x).abs() <= kb.max_from_center + 1e-3);
        world.step(DT).unwrap();
    }
}

#[test]
fn test_positions_stay_in_bounds() {
    let (mut world, clients) = table(1);
    start_playing(&mut world, &clients);
    let id = clients[0].id;
    world
        .apply(id, ClientCommand::Input { left: true, right: false, up: true })
        .unwrap();

    let cfg = world.config().clone();
    let (min_x, max_x) = cfg.player_x_bounds();
    for _ in 0..300 {
        world.step(DT).unwrap();
        let Some(p) = world.session(&id) else { break };
        assert!(p.x >= min_x && p.x <= max_x);
        assert!(p.y <= cfg.player_ground_y());
        assert!(p.vx.is_finite() && p.vy.is_finite());
        if world.phase() != Phase::Playing {
            break;
        }
    }
}

#[test]
fn test_same_seed_same_obstacles() {
    fn obstacle_xs() -> Vec<f32> {
        let (mut world, clients) = table(1);
        start_playing(&mut world, &clients);
        let mut xs = Vec::new();
        for _ in 0..120 {
            world.step(DT).unwrap();
            for o in world.obstacles() {
                if o.rect.y <= -o.rect.h + 10.0 && !xs.contains(&o.rect.x) {
                    xs.push(o.rect.x);
                }
            }
        }
        xs
    }
    let a = obstacle_xs();
    assert!(!a.is_empty());
    assert_eq!(a, obstacle_xs());
}

#[test]
fn test_mid_match_join_goes_to_solo_lobby() {
    let (mut world, clients) = table(1);
    start_playing(&mut world, &clients);

    let mut late = connect(&mut world);
    let msgs = late.drain();
    assert!(matches!(msgs[0], ServerMessage::Welcome { seed: 1234, tick_hz: 60, snapshot_hz: 20, .. }));
    assert!(matches!(msgs[1], ServerMessage::Lobby(_)));
    assert_eq!(msgs.len(), 2);
    assert!(!world.session(&late.id).unwrap().is_active());

    // Ready from the solo lobby only refreshes the sender.
    world.apply(late.id, ClientCommand::Ready { ready: true }).unwrap();
    assert!(matches!(late.drain().as_slice(), [ServerMessage::Lobby(_)]));
    assert_eq!(world.phase(), Phase::Playing);
}
