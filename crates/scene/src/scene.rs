use flipstage_actor::{DeathParticles, Enemy, PhysicsState, Player};
use flipstage_camera::{CameraController, DebugCamera, FollowTarget};
use flipstage_common::Transform;
use flipstage_input::{Action, InputSource};
use flipstage_map::{IndexSet, InvertMode, MapChipField, MapError};
use flipstage_render::{Renderer, ViewProjection};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::blocks::BlockTransforms;
use crate::config::{ConfigError, SceneConfig};
use crate::phase::{Phase, PhaseSignals};

/// Errors from building a [`GameScene`].
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("map error: {0}")]
    Map(#[from] MapError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("{what} spawn ({x}, {y}) lies outside the {width}x{height} map")]
    SpawnOutOfRange {
        what: &'static str,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// Coarse state changes, appended in the order they happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SceneEvent {
    PhaseChanged { frame: u64, from: Phase, to: Phase },
    PlayerDied { frame: u64, position: Vec3 },
    MapInverted { frame: u64, mode: InvertMode, gravity_sign: f32 },
    DebugCameraToggled { frame: u64, active: bool },
}

/// The playable stage: map, actors, cameras and the phase machine.
///
/// Drive it with one [`update`](Self::update) then one [`draw`](Self::draw) per frame.
pub struct GameScene {
    config: SceneConfig,
    map: MapChipField,
    physics: PhysicsState,
    player: Player,
    enemies: Vec<Enemy>,
    particles: DeathParticles,
    camera: CameraController,
    debug_camera: DebugCamera,
    debug_camera_active: bool,
    blocks: BlockTransforms,
    skydome: Transform,
    phase: Phase,
    view_projection: ViewProjection,
    frame: u64,
    events: Vec<SceneEvent>,
}

impl GameScene {
    pub fn new(map: MapChipField, config: SceneConfig) -> Result<Self, SceneError> {
        config.validate()?;
        let map = map.with_geometry(config.map.cell_size, config.map.origin);

        let spawn_position = |what: &'static str, index: IndexSet| {
            if index.x >= map.width() || index.y >= map.height() {
                return Err(SceneError::SpawnOutOfRange {
                    what,
                    x: index.x,
                    y: index.y,
                    width: map.width(),
                    height: map.height(),
                });
            }
            Ok(map.world_position_of(index.x, index.y))
        };

        let player_position = spawn_position("player", config.player.spawn)?;
        let player = Player::new(config.player.settings, player_position);
        let mut enemies = Vec::with_capacity(config.enemies.spawns.len());
        for &index in &config.enemies.spawns {
            enemies.push(Enemy::new(config.enemies.settings, spawn_position("enemy", index)?));
        }

        let mut camera = CameraController::new(config.camera.settings_for(&map));
        camera.reset(&player);

        let mut scene = Self {
            physics: PhysicsState::new(config.physics),
            particles: DeathParticles::new(config.particles, player_position),
            debug_camera: config.debug_camera.camera,
            debug_camera_active: config.debug_camera.enabled,
            blocks: BlockTransforms::from_map(&map),
            skydome: Transform::default(),
            phase: Phase::Playing,
            view_projection: ViewProjection::default(),
            frame: 0,
            events: Vec::new(),
            player,
            enemies,
            camera,
            map,
            config,
        };
        scene.select_view();
        tracing::info!(
            width = scene.map.width(),
            height = scene.map.height(),
            enemies = scene.enemies.len(),
            "scene initialized"
        );
        Ok(scene)
    }

    /// Advance one frame. A no-op once the scene has finished.
    pub fn update(&mut self, input: &impl InputSource) {
        if self.phase.is_terminal() {
            return;
        }
        let _span = tracing::info_span!("scene_update", frame = self.frame).entered();

        self.advance_phase();
        if self.phase.is_terminal() {
            self.frame += 1;
            return;
        }

        let bindings = &self.config.bindings;
        self.player.update(input, bindings, &self.map, &self.physics);
        if self.phase == Phase::Dying {
            self.particles.update();
        } else if self.player.is_alive() {
            for enemy in &mut self.enemies {
                enemy.update(&self.map, &self.physics);
            }
            self.camera.update(&self.player);
        }

        self.blocks.refresh();
        self.check_collisions();

        if self.config.bindings.triggered(input, Action::ToggleDebugCamera) {
            self.debug_camera_active = !self.debug_camera_active;
            tracing::debug!(active = self.debug_camera_active, "debug camera toggled");
            self.events.push(SceneEvent::DebugCameraToggled {
                frame: self.frame,
                active: self.debug_camera_active,
            });
        }
        self.select_view();

        if self.config.bindings.triggered(input, Action::Invert) && self.player.is_alive() {
            self.invert();
        }

        self.frame += 1;
    }

    fn advance_phase(&mut self) {
        let signals = PhaseSignals {
            player_alive: self.player.is_alive(),
            particles_finished: self.particles.is_finished(),
        };
        let next = self.phase.next(signals);
        if next == self.phase {
            return;
        }

        if next == Phase::Dying {
            let position = self.player.world_position();
            self.particles.spawn(position);
            self.events.push(SceneEvent::PlayerDied {
                frame: self.frame,
                position,
            });
        }
        tracing::debug!(from = ?self.phase, to = ?next, "phase changed");
        self.events.push(SceneEvent::PhaseChanged {
            frame: self.frame,
            from: self.phase,
            to: next,
        });
        self.phase = next;
    }

    fn check_collisions(&mut self) {
        if !self.player.is_alive() {
            return;
        }
        let player_box = self.player.aabb();
        for enemy in &self.enemies {
            if player_box.intersects(&enemy.aabb()) {
                self.player.on_collision(enemy);
                enemy.on_collision(&self.player);
            }
        }
    }

    fn select_view(&mut self) {
        self.view_projection = if self.debug_camera_active {
            self.debug_camera.view_projection()
        } else {
            *self.camera.view_projection()
        };
    }

    /// Invert the map, flip gravity and carry the actors over.
    ///
    /// In mirroring modes every actor moves to the centre of its mirrored cell
    /// first. Then each is nudged one unit along Y by the new gravity sign,
    /// away from its new floor.
    ///
    /// The mirror keeps an actor's distance to its floor, so in mirroring modes
    /// two inversions leave it two units further out; it falls back once
    /// updated. `SwapInPlace` returns it to where it stood.
    pub fn invert(&mut self) {
        let mode = self.config.map.invert_mode;
        let player_cell = self.map.clamped_index_of(self.player.world_position());
        let enemy_cells: Vec<IndexSet> = self
            .enemies
            .iter()
            .map(|e| self.map.clamped_index_of(e.world_position()))
            .collect();

        self.map.invert(mode);
        let gravity_sign = self.physics.flip_gravity();

        if mode.mirrors() {
            let cell = self.map.mirrored_index(player_cell);
            self.player.relocate(self.map.world_position_of(cell.x, cell.y));
            for (enemy, cell) in self.enemies.iter_mut().zip(enemy_cells) {
                let cell = self.map.mirrored_index(cell);
                enemy.relocate(self.map.world_position_of(cell.x, cell.y));
            }
        }
        self.player.on_gravity_inverted(gravity_sign);
        for enemy in &mut self.enemies {
            enemy.on_gravity_inverted(gravity_sign);
        }

        self.blocks.sync(&self.map);
        self.camera.start_rotation(&self.player);

        tracing::debug!(?mode, gravity_sign, "scene inverted");
        self.events.push(SceneEvent::MapInverted {
            frame: self.frame,
            mode,
            gravity_sign,
        });
    }

    /// Submit the frame. Reads state only.
    pub fn draw(&self, renderer: &mut impl Renderer) {
        let models = &self.config.models;
        let vp = &self.view_projection;

        renderer.draw(&self.skydome, vp, models.skydome);
        self.blocks
            .draw(&self.map, renderer, vp, models.block, models.block2);
        self.player.draw(renderer, vp, models.player);
        for enemy in &self.enemies {
            enemy.draw(renderer, vp, models.enemy);
        }
        // The burst is respawned where the player died when Dying begins.
        if self.phase == Phase::Dying {
            self.particles.draw(renderer, vp, models.particle);
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn map(&self) -> &MapChipField {
        &self.map
    }

    pub fn physics(&self) -> &PhysicsState {
        &self.physics
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Mutable access for scripted setups such as tests and the CLI.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn particles(&self) -> &DeathParticles {
        &self.particles
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn blocks(&self) -> &BlockTransforms {
        &self.blocks
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn is_debug_camera_active(&self) -> bool {
        self.debug_camera_active
    }

    /// View used by the last update.
    pub fn view_projection(&self) -> &ViewProjection {
        &self.view_projection
    }

    /// Frames updated so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use flipstage_input::{Key, KeyboardState};
    use flipstage_map::MapChipType;
    use flipstage_render::{DrawLog, ModelHandle};

    use super::*;

    // 20 x 8: floor along the bottom, ceiling along the top, one block2 pillar.
    fn stage() -> MapChipField {
        let mut rows = Vec::new();
        rows.push(vec!["1"; 20].join(","));
        for _ in 0..6 {
            let mut row = vec!["0"; 20];
            row[15] = "2";
            rows.push(row.join(","));
        }
        rows.push(vec!["1"; 20].join(","));
        MapChipField::parse(&rows.join("\n")).unwrap()
    }

    fn config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.player.spawn = IndexSet::new(3, 6);
        config.enemies.spawns = vec![IndexSet::new(10, 6)];
        config
    }

    fn run(scene: &mut GameScene, input: &mut KeyboardState, frames: usize) {
        for _ in 0..frames {
            scene.update(input);
            input.begin_frame();
        }
    }

    #[test]
    fn spawn_outside_map_is_rejected() {
        let mut config = config();
        config.player.spawn = IndexSet::new(40, 2);
        let err = GameScene::new(stage(), config).err().unwrap();
        assert!(matches!(err, SceneError::SpawnOutOfRange { what: "player", x: 40, .. }));

        let mut config = self::config();
        config.enemies.spawns.push(IndexSet::new(0, 99));
        assert!(matches!(
            GameScene::new(stage(), config),
            Err(SceneError::SpawnOutOfRange { what: "enemy", .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = config();
        config.particles.duration = -1.0;
        assert!(matches!(GameScene::new(stage(), config), Err(SceneError::Config(_))));
    }

    #[test]
    fn player_settles_and_camera_follows() {
        let mut scene = GameScene::new(stage(), config()).unwrap();
        let mut input = KeyboardState::new();
        run(&mut scene, &mut input, 60);
        assert!(scene.player().is_on_ground());
        assert_eq!(scene.phase(), Phase::Playing);
        let area = scene.camera().settings().movable_area;
        let cx = scene.camera().translation().x;
        assert!(cx >= area.left && cx <= area.right);
    }

    #[test]
    fn enemy_contact_runs_the_death_sequence() {
        let mut scene = GameScene::new(stage(), config()).unwrap();
        let mut input = KeyboardState::new();
        input.press(Key::Right);

        let mut frames = 0;
        while scene.player().is_alive() {
            scene.update(&input);
            input.begin_frame();
            frames += 1;
            assert!(frames < 600, "player never reached the enemy");
        }
        let died_at = scene.player().world_position();
        assert_eq!(scene.phase(), Phase::Playing);

        scene.update(&input);
        assert_eq!(scene.phase(), Phase::Dying);
        assert_eq!(scene.player().world_position(), died_at);

        let events = scene.drain_events();
        assert!(events.iter().any(|e| matches!(e, SceneEvent::PlayerDied { .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            SceneEvent::PhaseChanged { from: Phase::Playing, to: Phase::Dying, .. }
        )));

        // Dead: no player draw, particles instead.
        let mut log = DrawLog::new();
        scene.draw(&mut log);
        let models = scene.config().models;
        assert_eq!(log.count(models.player), 0);
        assert_eq!(log.count(models.particle), 8);

        let camera_before = scene.camera().translation();
        while !scene.is_finished() {
            scene.update(&input);
            assert!(scene.frame() < 10_000);
        }
        assert_eq!(scene.camera().translation(), camera_before);
        assert!(scene.particles().is_finished());

        let frame = scene.frame();
        scene.update(&input);
        assert_eq!(scene.frame(), frame, "finished scene must not advance");
    }

    #[test]
    fn death_frame_draws_no_stale_burst() {
        let mut scene = GameScene::new(stage(), config()).unwrap();
        let spawn = scene.player().world_position();
        let mut input = KeyboardState::new();
        input.press(Key::Right);
        while scene.player().is_alive() {
            scene.update(&input);
            input.begin_frame();
            assert!(scene.frame() < 600, "player never reached the enemy");
        }
        let died_at = scene.player().world_position();
        assert!(died_at.distance(spawn) > 1.0);

        let models = scene.config().models;
        let mut log = DrawLog::new();
        scene.draw(&mut log);
        assert_eq!(log.count(models.particle), 0);

        scene.update(&input);
        log.clear();
        scene.draw(&mut log);
        let speed = scene.config().particles.speed;
        let drawn: Vec<_> = log.calls().iter().filter(|c| c.model == models.particle).collect();
        assert_eq!(drawn.len(), 8);
        for call in drawn {
            assert!(call.position().distance(died_at) <= speed + 1e-4);
        }
    }

    #[test]
    fn enemies_hold_still_once_the_player_is_dead() {
        let mut scene = GameScene::new(stage(), config()).unwrap();
        let mut input = KeyboardState::new();
        input.press(Key::Right);
        while scene.player().is_alive() {
            scene.update(&input);
            input.begin_frame();
            assert!(scene.frame() < 600, "player never reached the enemy");
        }
        let positions: Vec<Vec3> = scene.enemies().iter().map(|e| e.world_position()).collect();
        run(&mut scene, &mut input, 30);
        assert_eq!(scene.phase(), Phase::Dying);
        let after: Vec<Vec3> = scene.enemies().iter().map(|e| e.world_position()).collect();
        assert_eq!(after, positions);
    }

    #[test]
    fn double_invert_restores_the_stage() {
        for mode in [InvertMode::MirrorSwap, InvertMode::Mirror, InvertMode::SwapInPlace] {
            let mut config = config();
            config.map.invert_mode = mode;
            let mut scene = GameScene::new(stage(), config).unwrap();
            let mut input = KeyboardState::new();
            run(&mut scene, &mut input, 30);
            let before = scene.player().world_position();

            scene.invert();
            scene.invert();
            let layout = &scene.config().map;
            let expected = stage().with_geometry(layout.cell_size, layout.origin);
            assert_eq!(scene.map(), &expected);
            assert_eq!(scene.physics().gravity_sign(), 1.0);
            assert!(!scene.player().is_upside_down());

            let after = scene.player().world_position();
            assert_eq!(after.x, before.x, "{mode:?}");
            if mode.mirrors() {
                // Both nudges point away from the floor and the mirror keeps
                // that distance: two units up from the cell centre.
                let centre = scene.map().world_position_of(3, 6);
                assert!((after.y - (centre.y + 2.0)).abs() < 1e-5, "{mode:?}");
            } else {
                assert!((after.y - before.y).abs() < 1e-5, "{mode:?}");
            }

            run(&mut scene, &mut input, 60);
            assert!(scene.player().is_on_ground(), "{mode:?}");
            assert!(scene.player().world_position().abs_diff_eq(before, 1e-4), "{mode:?}");
        }
    }

    #[test]
    fn invert_flips_map_gravity_and_player() {
        let mut scene = GameScene::new(stage(), config()).unwrap();
        let mut input = KeyboardState::new();
        run(&mut scene, &mut input, 30);
        let blocks_before = scene.map().solid_count();
        let cell = scene.map().clamped_index_of(scene.player().world_position());

        input.press(Key::Down);
        scene.update(&input);

        assert_eq!(scene.physics().gravity_sign(), -1.0);
        assert!(scene.player().is_upside_down());
        assert!(scene.camera().is_rotating());
        let total = (scene.map().width() * scene.map().height()) as usize;
        // Block2 cells are fixed, everything else swaps.
        assert_eq!(scene.map().solid_count(), total - blocks_before + 6);

        let mirrored = scene.map().mirrored_index(cell);
        let expected = scene.map().world_position_of(mirrored.x, mirrored.y) + Vec3::new(0.0, -1.0, 0.0);
        assert!(scene.player().world_position().abs_diff_eq(expected, 1e-5));

        assert_eq!(scene.blocks().len(), scene.map().solid_count());
        assert!(scene.events().iter().any(|e| matches!(
            e,
            SceneEvent::MapInverted { gravity_sign, .. } if *gravity_sign == -1.0
        )));
    }

    #[test]
    fn swap_in_place_keeps_player_column() {
        let mut config = config();
        config.map.invert_mode = InvertMode::SwapInPlace;
        let mut scene = GameScene::new(stage(), config).unwrap();
        let mut input = KeyboardState::new();
        run(&mut scene, &mut input, 30);
        let before = scene.player().world_position();

        input.press(Key::Down);
        scene.update(&input);
        let after = scene.player().world_position();
        assert_eq!(after.x, before.x);
        assert!((after.y - (before.y - 1.0)).abs() < 1e-5);
        assert_eq!(scene.map().tile_at(0, 0).unwrap(), MapChipType::Blank);
    }

    #[test]
    fn debug_camera_toggle_swaps_view() {
        let mut scene = GameScene::new(stage(), config()).unwrap();
        let mut input = KeyboardState::new();
        run(&mut scene, &mut input, 5);
        let follow_eye = scene.view_projection().eye();

        input.press(Key::C);
        scene.update(&input);
        assert!(scene.is_debug_camera_active());
        let debug_eye = DebugCamera::default().eye;
        assert!(scene.view_projection().eye().abs_diff_eq(debug_eye, 1e-2));
        assert!(!scene.view_projection().eye().abs_diff_eq(follow_eye, 1e-2));

        input.release(Key::C);
        input.begin_frame();
        input.press(Key::C);
        scene.update(&input);
        assert!(!scene.is_debug_camera_active());
        assert_eq!(
            scene
                .events()
                .iter()
                .filter(|e| matches!(e, SceneEvent::DebugCameraToggled { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn draw_submits_skydome_blocks_and_actors() {
        let mut scene = GameScene::new(stage(), config()).unwrap();
        let mut input = KeyboardState::new();
        run(&mut scene, &mut input, 1);

        let mut log = DrawLog::new();
        scene.draw(&mut log);
        let models = scene.config().models;
        assert_eq!(log.count(models.skydome), 1);
        assert_eq!(log.count(models.block2), 6);
        assert_eq!(log.count(models.block), 40);
        assert_eq!(log.count(models.player), 1);
        assert_eq!(log.count(models.enemy), 1);
        assert_eq!(log.count(models.particle), 0);
        assert_eq!(log.count(ModelHandle(99)), 0);
    }

    #[test]
    fn shipped_stage_runs() {
        let map = MapChipField::parse(include_str!("../../../assets/maps/stage1.csv")).unwrap();
        let config = SceneConfig::from_yaml_str(include_str!("../../../assets/scene.yaml")).unwrap();
        assert_eq!((map.width(), map.height()), (100, 20));

        let mut scene = GameScene::new(map, config).unwrap();
        let mut input = KeyboardState::new();
        run(&mut scene, &mut input, 120);
        assert!(scene.player().is_on_ground());
        assert_eq!(scene.enemies().len(), 3);
    }
}
