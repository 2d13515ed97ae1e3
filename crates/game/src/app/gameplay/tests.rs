use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::thread;

use engine::{EntityId, InputAction, InputSnapshot, SnapshotHandle, Vec3};

use super::*;

const DT: f32 = 1.0 / 60.0;

enum Step {
    Contacts(Vec<Contact>),
    Unsupported,
    Fail,
}

type Script = Rc<RefCell<VecDeque<Step>>>;

/// Physics double: the body stays supported on the origin platform unless
/// the script says otherwise, and scripted contacts are reported verbatim.
struct ScriptedPhysics {
    script: Script,
}

impl PhysicsWorld for ScriptedPhysics {
    fn step(
        &mut self,
        body: &BodyState,
        _world: &WorldState,
        dt: f32,
    ) -> Result<StepOutcome, PhysicsError> {
        let mut contacts = vec![Contact::with(EntityId(0), ContactTag::Platform)];
        let mut supported = true;
        match self.script.borrow_mut().pop_front() {
            Some(Step::Fail) => return Err(PhysicsError::Unavailable("scripted".to_string())),
            Some(Step::Unsupported) => {
                contacts.clear();
                supported = false;
            }
            Some(Step::Contacts(extra)) => contacts.extend(extra),
            None => {}
        }
        let mut velocity = body.velocity;
        let mut position =
            body.position + Vec3::new(velocity.x, 0.0, velocity.z) * dt;
        if supported {
            velocity.y = 0.0;
        } else {
            position.y += velocity.y * dt;
        }
        Ok(StepOutcome {
            body: BodyState { position, velocity },
            contacts,
        })
    }
}

#[derive(Clone, Default)]
struct SharedScores(Rc<RefCell<MemoryHighScores>>);

impl HighScoreStore for SharedScores {
    fn load(&mut self) -> Result<u32, HighScoreError> {
        self.0.borrow_mut().load()
    }

    fn save(&mut self, score: u32) -> Result<(), HighScoreError> {
        self.0.borrow_mut().save(score)
    }
}

fn scripted_session(config: SessionConfig, scores: SharedScores) -> (GameSession, Script) {
    let script: Script = Rc::default();
    let physics = Box::new(ScriptedPhysics {
        script: Rc::clone(&script),
    });
    let session =
        GameSession::start_with_physics(config, physics, Box::new(scores)).expect("session");
    (session, script)
}

fn normal_config(seed: u64) -> SessionConfig {
    SessionConfig::new(seed, DifficultyProfile::normal())
}

fn idle() -> InputSnapshot {
    InputSnapshot::empty()
}

fn count_kind(events: &[GameEvent], kind: GameEventKind) -> usize {
    events.iter().filter(|event| event.kind() == kind).count()
}

fn first_enemy(session: &GameSession) -> Enemy {
    session
        .state()
        .world
        .enemies()
        .next()
        .expect("world has an enemy")
        .clone()
}

fn first_gem(session: &GameSession) -> Collectible {
    session
        .state()
        .world
        .collectibles()
        .next()
        .expect("world has a collectible")
        .clone()
}

/// Sets the enemy's health to `health` through the store.
fn wound_enemy(session: &mut GameSession, enemy: &Enemy, health: u32) {
    assert!(session.submit(Action::DamageEnemy {
        id: enemy.id,
        amount: enemy.max_health - health,
    }));
}

#[test]
fn generation_is_deterministic_across_sessions() {
    let a = GameSession::start(normal_config(314), Box::new(MemoryHighScores::default()))
        .expect("a");
    let b = GameSession::start(normal_config(314), Box::new(MemoryHighScores::default()))
        .expect("b");
    assert_eq!(a.state().world, b.state().world);
    assert_eq!(a.state().world.fingerprint(), b.state().world.fingerprint());
}

#[test]
fn identical_inputs_replay_identically() {
    let inputs: Vec<InputSnapshot> = (0..400)
        .map(|tick| {
            let mut actions = vec![InputAction::Forward];
            if tick % 40 < 3 {
                actions.push(InputAction::Jump);
            }
            if tick % 90 > 60 {
                actions.push(InputAction::Right);
            }
            InputSnapshot::from_actions(&actions)
        })
        .collect();

    let run = || {
        let mut session =
            GameSession::start(normal_config(2024), Box::new(MemoryHighScores::default()))
                .expect("session");
        for input in &inputs {
            session.tick(input, DT);
        }
        (session.snapshot(), session.drain_events())
    };
    let (snapshot_a, events_a) = run();
    let (snapshot_b, events_b) = run();
    assert_eq!(snapshot_a, snapshot_b);
    assert_eq!(events_a, events_b);
}

#[test]
fn attack_scenario_defeats_enemy_and_wins_once() {
    let (mut session, script) = scripted_session(normal_config(7), SharedScores::default());
    assert_eq!(session.state().profile.enemies_to_kill, 12);
    let enemy = first_enemy(&session);
    assert!(session.submit(Action::UpdateObjectives(ObjectivesUpdate {
        enemies_killed: Some(11),
        ..ObjectivesUpdate::default()
    })));
    wound_enemy(&mut session, &enemy, 25);
    let score_before = session.state().stats.score;

    script.borrow_mut().push_back(Step::Contacts(vec![Contact::with(
        enemy.id,
        ContactTag::EnemyAttack,
    )]));
    let report = session.tick(&idle(), DT);

    let defeated = session.state().world.enemy(enemy.id).expect("enemy");
    assert_eq!(defeated.health, 0);
    assert!(!defeated.alive);
    assert_eq!(session.state().stats.enemies_killed, 12);
    assert_eq!(session.state().stats.score, score_before + 100);
    assert_eq!(count_kind(&report.events, GameEventKind::Victory), 1);
    assert_eq!(session.state().phase, RunPhase::Victory);
    assert!(session.state().victory_fired);

    script.borrow_mut().push_back(Step::Contacts(vec![Contact::with(
        enemy.id,
        ContactTag::EnemyAttack,
    )]));
    let later = session.tick(&idle(), DT);
    assert!(!later.simulated);
    let all_events = session.drain_events();
    let victories = all_events
        .iter()
        .filter(|event| event.event.kind() == GameEventKind::Victory)
        .count();
    assert_eq!(victories, 1);
}

#[test]
fn dead_enemy_contact_never_refires_victory() {
    let profile = DifficultyProfile::normal();
    let world = generate(7, &profile).expect("world");
    let mut state = GameState::new_run(profile, world, Settings::default(), 0);
    let enemy = state.world.enemies().next().expect("enemy").id;
    state.stats.enemies_killed = state.stats.enemies_target;
    state.victory_fired = true;

    let contact = Contact::with(enemy, ContactTag::EnemyAttack);
    let config = CombatConfig::default();
    let mut events = Vec::new();
    for _ in 0..10 {
        let resolution = resolve(&contact, &state, &config);
        for action in &resolution.actions {
            state = reduce(&state, action).expect("apply");
        }
        events.extend(resolution.events);
    }
    assert_eq!(count_kind(&events, GameEventKind::EnemyDefeated), 1);
    assert_eq!(count_kind(&events, GameEventKind::Victory), 0);
}

#[test]
fn collecting_the_same_gem_twice_counts_once() {
    let (mut session, script) = scripted_session(normal_config(12), SharedScores::default());
    let gem = first_gem(&session);
    let contact = Contact::with(gem.id, ContactTag::Collectible);
    script
        .borrow_mut()
        .extend([Step::Contacts(vec![contact]), Step::Contacts(vec![contact])]);

    let first = session.tick(&idle(), DT);
    let second = session.tick(&idle(), DT);
    assert_eq!(count_kind(&first.events, GameEventKind::Collected), 1);
    assert!(second.events.is_empty());
    assert_eq!(session.state().stats.score, gem.value);
    assert_eq!(session.state().stats.gems_collected, 1);
    assert_eq!(session.rejected_actions(), 0);
}

#[test]
fn falling_off_the_world_respawns_exactly_once() {
    let mut session = GameSession::start(normal_config(5), Box::new(MemoryHighScores::default()))
        .expect("session");
    assert!(session.submit(Action::UpdatePlayerPosition {
        position: Vec3::new(100.0, 3.0, -100.0),
        velocity: Vec3::ZERO,
        grounded: false,
    }));

    let mut events = Vec::new();
    for _ in 0..300 {
        events.extend(session.tick(&idle(), DT).events);
    }
    let fall_damage = events
        .iter()
        .filter(|event| {
            matches!(
                event,
                GameEvent::PlayerDamaged {
                    source: DamageSource::Fall,
                    ..
                }
            )
        })
        .count();
    assert_eq!(fall_damage, 1);
    assert_eq!(count_kind(&events, GameEventKind::Respawned), 1);
    assert_eq!(count_kind(&events, GameEventKind::CameraShake), 1);
    assert_eq!(session.state().player.health, PLAYER_MAX_HEALTH - FALL_DAMAGE);
    assert!(session.state().player.position.y > FALL_FLOOR_Y);
    assert_eq!(session.locomotion_state(), LocomotionState::Grounded);
}

#[test]
fn player_settles_on_the_origin_platform() {
    let mut session = GameSession::start(normal_config(5), Box::new(MemoryHighScores::default()))
        .expect("session");
    for _ in 0..120 {
        session.tick(&idle(), DT);
    }
    let player = session.state().player;
    assert!(player.grounded);
    assert_eq!(player.position.y, 0.5 + PLAYER_HALF_HEIGHT);
    assert_eq!(player.velocity, Vec3::ZERO);
}

#[test]
fn edge_triggered_jump_counts_one_per_press() {
    let (mut session, _script) = scripted_session(normal_config(1), SharedScores::default());
    let jump = InputSnapshot::from_actions(&[InputAction::Jump]);
    for _ in 0..5 {
        session.tick(&jump, DT);
    }
    assert_eq!(session.state().stats.jumps, 1);

    session.tick(&idle(), DT);
    session.tick(&jump, DT);
    assert_eq!(session.state().stats.jumps, 2);
}

#[test]
fn held_jump_repeats_on_every_grounded_tick() {
    let mut config = normal_config(1);
    config.locomotion.jump_policy = JumpPolicy::Held;
    let (mut session, _script) = scripted_session(config, SharedScores::default());
    let jump = InputSnapshot::from_actions(&[InputAction::Jump]);
    for _ in 0..5 {
        session.tick(&jump, DT);
    }
    assert_eq!(session.state().stats.jumps, 5);
}

#[test]
fn paused_ticks_freeze_the_run() {
    let mut session = GameSession::start(normal_config(9), Box::new(MemoryHighScores::default()))
        .expect("session");
    let forward = InputSnapshot::from_actions(&[InputAction::Forward]);
    for _ in 0..30 {
        session.tick(&forward, DT);
    }
    session.pause();
    let frozen = session.snapshot();
    for _ in 0..30 {
        let report = session.tick(&forward, DT);
        assert!(!report.simulated);
    }
    let still = session.snapshot();
    assert_eq!(frozen, still);
    assert!(still.paused);

    session.resume();
    session.tick(&forward, DT);
    assert!(session.state().stats.play_time_seconds > frozen.stats.play_time_seconds);
    assert_eq!(session.tick_count(), frozen.tick + 1);
}

#[test]
fn degraded_physics_keeps_position_and_does_not_retry() {
    let (mut session, script) = scripted_session(normal_config(3), SharedScores::default());
    let forward = InputSnapshot::from_actions(&[InputAction::Forward]);
    session.tick(&forward, DT);
    let before = session.state().player.position;

    script.borrow_mut().extend([Step::Fail, Step::Fail]);
    let first = session.tick(&forward, DT);
    let second = session.tick(&forward, DT);
    assert!(first.degraded && second.degraded);
    assert_eq!(session.state().player.position, before);
    assert_eq!(session.degraded_steps(), 2);
    assert!(script.borrow().is_empty());

    session.tick(&forward, DT);
    assert!(session.state().player.position.z < before.z);
}

#[test]
fn walking_off_an_edge_goes_airborne() {
    let (mut session, script) = scripted_session(normal_config(3), SharedScores::default());
    script.borrow_mut().push_back(Step::Unsupported);
    session.tick(&idle(), DT);
    assert_eq!(session.locomotion_state(), LocomotionState::Airborne);
    assert!(!session.state().player.grounded);
    session.tick(&idle(), DT);
    assert_eq!(session.locomotion_state(), LocomotionState::Grounded);
}

#[test]
fn dash_turns_enemy_touch_into_attack() {
    let (mut session, script) = scripted_session(normal_config(7), SharedScores::default());
    let enemy = first_enemy(&session);
    let touch = Contact::with(enemy.id, ContactTag::EnemyTouch);

    script.borrow_mut().push_back(Step::Contacts(vec![touch]));
    let calm = session.tick(&idle(), DT);
    assert!(calm.events.is_empty());

    script.borrow_mut().push_back(Step::Contacts(vec![touch]));
    let dash = InputSnapshot::from_actions(&[InputAction::Dash]);
    let dashing = session.tick(&dash, DT);
    assert_eq!(count_kind(&dashing.events, GameEventKind::EnemyHit), 1);
    let hit = session.state().world.enemy(enemy.id).expect("enemy");
    assert_eq!(hit.health, enemy.max_health - ENEMY_ATTACK_DAMAGE);
}

#[test]
fn enemy_contact_damage_can_end_the_run() {
    let mut config = SessionConfig::new(7, DifficultyProfile::hard());
    config.combat.enemy_contact_damage = Some(PLAYER_MAX_HEALTH);
    let scores = SharedScores::default();
    let (mut session, script) = scripted_session(config, scores.clone());
    let enemy = first_enemy(&session);
    let touch = Contact::with(enemy.id, ContactTag::EnemyTouch);

    script.borrow_mut().push_back(Step::Contacts(vec![touch]));
    let first = session.tick(&idle(), DT);
    assert_eq!(count_kind(&first.events, GameEventKind::LifeLost), 1);
    assert_eq!(count_kind(&first.events, GameEventKind::Respawned), 1);
    assert_eq!(session.state().player.lives, 1);
    assert_eq!(session.state().player.health, PLAYER_MAX_HEALTH);

    script.borrow_mut().push_back(Step::Contacts(vec![touch]));
    let second = session.tick(&idle(), DT);
    assert_eq!(count_kind(&second.events, GameEventKind::GameOver), 1);
    assert_eq!(session.state().phase, RunPhase::GameOver);
    assert_eq!(session.state().player.lives, 0);
    assert_eq!(scores.0.borrow().save_count(), 0);
}

#[test]
fn level_ups_follow_kills() {
    let mut profile = DifficultyProfile::normal();
    profile.exp_per_kill = 240;
    let (mut session, script) =
        scripted_session(SessionConfig::new(7, profile), SharedScores::default());
    let enemy = first_enemy(&session);
    wound_enemy(&mut session, &enemy, 10);

    script.borrow_mut().push_back(Step::Contacts(vec![Contact::with(
        enemy.id,
        ContactTag::EnemyAttack,
    )]));
    let report = session.tick(&idle(), DT);
    // 240 exp: 100 for level 2, 140 < 150 so no level 3.
    assert_eq!(count_kind(&report.events, GameEventKind::LevelUp), 1);
    assert_eq!(session.state().stats.level, 2);
    assert_eq!(session.state().stats.experience, 140);
}

#[test]
fn notifications_follow_events_and_expire() {
    let (mut session, script) = scripted_session(normal_config(12), SharedScores::default());
    let gem = first_gem(&session);
    script.borrow_mut().push_back(Step::Contacts(vec![Contact::with(
        gem.id,
        ContactTag::Collectible,
    )]));
    session.tick(&idle(), DT);
    assert_eq!(session.state().notifications.len(), 1);
    let id = session.state().notifications.items()[0].id;

    let ticks_to_expire = (SHORT_NOTIFICATION_MS as f32 / 1000.0 / DT).ceil() as usize + 1;
    for _ in 0..ticks_to_expire {
        session.tick(&idle(), DT);
    }
    assert!(session.state().notifications.get(id).is_none());
}

#[test]
fn dismissed_notification_is_not_expired_twice() {
    let (mut session, script) = scripted_session(normal_config(12), SharedScores::default());
    let gem = first_gem(&session);
    script.borrow_mut().push_back(Step::Contacts(vec![Contact::with(
        gem.id,
        ContactTag::Collectible,
    )]));
    session.tick(&idle(), DT);
    let id = session.state().notifications.items()[0].id;

    session.dismiss_notification(id);
    session.dismiss_notification(id);
    assert!(session.state().notifications.is_empty());
    assert_eq!(session.state().notifications.scheduled_count(), 0);
    for _ in 0..200 {
        session.tick(&idle(), DT);
    }
    assert_eq!(session.rejected_actions(), 0);
}

#[test]
fn beaten_high_score_is_saved_when_the_run_ends() {
    let scores = SharedScores(Rc::new(RefCell::new(MemoryHighScores::with_value(50))));
    let (mut session, script) = scripted_session(normal_config(7), scores.clone());
    assert_eq!(session.state().stats.high_score, 50);

    let enemy = first_enemy(&session);
    assert!(session.submit(Action::UpdateObjectives(ObjectivesUpdate {
        enemies_killed: Some(11),
        ..ObjectivesUpdate::default()
    })));
    wound_enemy(&mut session, &enemy, 25);
    script.borrow_mut().push_back(Step::Contacts(vec![Contact::with(
        enemy.id,
        ContactTag::EnemyAttack,
    )]));
    let report = session.tick(&idle(), DT);

    assert!(report.events.contains(&GameEvent::HighScoreBeaten {
        previous: 50,
        score: 100
    }));
    assert_eq!(scores.0.borrow().value(), 100);
    assert_eq!(scores.0.borrow().save_count(), 1);
    assert_eq!(session.state().stats.high_score, 100);
}

/// Drives the run to victory from 11 kills with one 25-health enemy left.
fn win_current_run(session: &mut GameSession, script: &Script) -> TickReport {
    let enemy = first_enemy(session);
    assert!(session.submit(Action::UpdateObjectives(ObjectivesUpdate {
        enemies_killed: Some(11),
        ..ObjectivesUpdate::default()
    })));
    wound_enemy(session, &enemy, 25);
    script.borrow_mut().push_back(Step::Contacts(vec![Contact::with(
        enemy.id,
        ContactTag::EnemyAttack,
    )]));
    session.tick(&idle(), DT)
}

#[test]
fn submitted_reset_starts_a_run_whose_high_score_is_saved() {
    let scores = SharedScores::default();
    let (mut session, script) = scripted_session(normal_config(7), scores.clone());
    win_current_run(&mut session, &script);
    assert_eq!(session.state().phase, RunPhase::Victory);
    assert_eq!(scores.0.borrow().save_count(), 1);

    let profile = DifficultyProfile::normal();
    let world = generate(21, &profile).expect("world");
    assert!(session.submit(Action::ResetRun { profile, world }));
    assert_eq!(session.state().phase, RunPhase::Playing);
    assert_eq!(session.state().stats.high_score, 100);
    assert_eq!(session.config().seed, 21);

    assert!(session.submit(Action::AddScore { amount: 500 }));
    let report = win_current_run(&mut session, &script);
    assert_eq!(session.state().stats.score, 600);
    assert!(report.events.contains(&GameEvent::HighScoreBeaten {
        previous: 100,
        score: 600
    }));
    assert_eq!(scores.0.borrow().save_count(), 2);
    assert_eq!(scores.0.borrow().value(), 600);
}

#[test]
fn submitted_reset_with_invalid_profile_is_rejected() {
    let (mut session, _script) = scripted_session(normal_config(7), SharedScores::default());
    let mut profile = DifficultyProfile::normal();
    profile.player_lives = 0;
    let world = generate(2, &DifficultyProfile::normal()).expect("world");
    assert!(!session.submit(Action::ResetRun { profile, world }));
    assert_eq!(session.config().seed, 7);
    assert_eq!(session.config().profile, DifficultyProfile::normal());
}

#[test]
fn jump_held_through_a_degraded_tick_still_fires_once() {
    let (mut session, script) = scripted_session(normal_config(5), SharedScores::default());
    script.borrow_mut().push_back(Step::Fail);
    let jump = InputSnapshot::from_actions(&[InputAction::Jump]);
    for _ in 0..6 {
        session.tick(&jump, DT);
    }
    assert_eq!(session.degraded_steps(), 1);
    assert_eq!(session.state().stats.jumps, 1);
}

#[test]
fn restart_builds_a_fresh_run_and_keeps_settings() {
    let scores = SharedScores::default();
    let (mut session, script) = scripted_session(normal_config(7), scores.clone());
    let mut settings = Settings::default();
    settings.graphics.quality = GraphicsQuality::High;
    session.update_settings(settings);

    let gem = first_gem(&session);
    script.borrow_mut().push_back(Step::Contacts(vec![Contact::with(
        gem.id,
        ContactTag::Collectible,
    )]));
    session.tick(&idle(), DT);
    let old_fingerprint = session.state().world.fingerprint();
    let outgoing = session.state().stats.score;

    session.restart(8).expect("restart");
    let state = session.state();
    assert_ne!(state.world.fingerprint(), old_fingerprint);
    assert_eq!(state.world, generate(8, &DifficultyProfile::normal()).expect("world"));
    assert_eq!(state.stats.score, 0);
    assert_eq!(state.stats.high_score, outgoing);
    assert_eq!(state.settings.graphics.quality, GraphicsQuality::High);
    assert_eq!(state.phase, RunPhase::Playing);
    assert_eq!(scores.0.borrow().value(), outgoing);
    assert_eq!(session.config().seed, 8);
}

#[test]
fn snapshots_are_readable_from_other_threads() {
    let mut session = GameSession::start(normal_config(4), Box::new(MemoryHighScores::default()))
        .expect("session");
    let initial = session.snapshot();
    let handle = SnapshotHandle::new(initial);
    session.attach_snapshot_handle(handle.clone());
    for _ in 0..10 {
        session.tick(&idle(), DT);
    }

    let reader = handle.clone();
    let observed = thread::spawn(move || reader.snapshot())
        .join()
        .expect("reader thread");
    assert_eq!(observed.tick, 10);
    assert_eq!(observed, session.snapshot());
}

#[test]
fn invalid_configuration_fails_fast() {
    let mut profile = DifficultyProfile::normal();
    profile.enemies_to_kill = 0;
    let result = GameSession::start(
        SessionConfig::new(1, profile),
        Box::new(MemoryHighScores::default()),
    );
    assert!(matches!(
        result,
        Err(ConfigurationError::ZeroEnemyTarget { .. })
    ));
}
