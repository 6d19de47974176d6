use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use flipstage_camera::FollowTarget;
use flipstage_input::{Action, Key, KeyboardState};
use flipstage_map::{InvertMode, MapChipField};
use flipstage_render::DrawLog;
use flipstage_scene::{GameScene, SceneConfig, SceneEvent};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flipstage", about = "Headless tools for the flipstage platformer core")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default tuning
    Info,
    /// Load a map (and optionally a scene config) and report problems
    Validate {
        #[arg(short, long)]
        map: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Invert a map and print the result as CSV
    Invert {
        #[arg(short, long)]
        map: PathBuf,
        #[arg(long, value_enum, default_value_t = ModeArg::MirrorSwap)]
        mode: ModeArg,
        /// Invert this many times
        #[arg(short, long, default_value = "1")]
        times: u32,
    },
    /// Run the scene headlessly and print what happened
    Simulate {
        #[arg(short, long)]
        map: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of frames to run
        #[arg(short, long, default_value = "600")]
        frames: u64,
        /// Keys held for the whole run, comma separated (e.g. "right,up")
        #[arg(long, value_delimiter = ',')]
        hold: Vec<Key>,
        /// Frames on which the invert key is tapped, comma separated
        #[arg(long, value_delimiter = ',')]
        invert_at: Vec<u64>,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    MirrorSwap,
    Mirror,
    SwapInPlace,
}

impl From<ModeArg> for InvertMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::MirrorSwap => InvertMode::MirrorSwap,
            ModeArg::Mirror => InvertMode::Mirror,
            ModeArg::SwapInPlace => InvertMode::SwapInPlace,
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn load_map(path: &Path) -> anyhow::Result<MapChipField> {
    MapChipField::load(path).with_context(|| format!("loading map {}", path.display()))
}

fn print_event(event: &SceneEvent, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
    } else {
        println!("{event:?}");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let config = SceneConfig::default();
            println!("flipstage v{}", env!("CARGO_PKG_VERSION"));
            println!("default invert mode: {:?}", config.map.invert_mode);
            println!("physics: {:?}", config.physics);
            println!("bindings:");
            for action in [
                Action::MoveLeft,
                Action::MoveRight,
                Action::Jump,
                Action::Invert,
                Action::ToggleDebugCamera,
            ] {
                let key = config.bindings.key_for(action).map_or("-", Key::name);
                println!("  {action:?}: {key}");
            }
        }
        Commands::Validate { map, config } => {
            let field = load_map(&map)?;
            println!(
                "map {}: {}x{} cells, {} solid",
                map.display(),
                field.width(),
                field.height(),
                field.solid_count()
            );
            let config = load_config(config.as_deref())?;
            let scene = GameScene::new(field, config).context("building scene")?;
            println!(
                "scene OK: player at {:?}, {} enemies",
                scene.player().world_position(),
                scene.enemies().len()
            );
        }
        Commands::Invert { map, mode, times } => {
            let mut field = load_map(&map)?;
            for _ in 0..times {
                field.invert(mode.into());
            }
            print!("{field}");
        }
        Commands::Simulate {
            map,
            config,
            frames,
            hold,
            invert_at,
            json,
        } => {
            let field = load_map(&map)?;
            let config = load_config(config.as_deref())?;
            let invert_key = config
                .bindings
                .key_for(Action::Invert)
                .context("no key bound to invert")?;
            let invert_at: BTreeSet<u64> = invert_at.into_iter().collect();
            let mut scene = GameScene::new(field, config).context("building scene")?;

            let mut keyboard = KeyboardState::new();
            for &key in &hold {
                keyboard.press(key);
            }

            let mut log = DrawLog::new();
            for frame in 0..frames {
                if invert_at.contains(&frame) {
                    keyboard.press(invert_key);
                }
                scene.update(&keyboard);
                for event in scene.drain_events() {
                    print_event(&event, json)?;
                }
                log.clear();
                scene.draw(&mut log);

                keyboard.begin_frame();
                if invert_at.contains(&frame) && !hold.contains(&invert_key) {
                    keyboard.release(invert_key);
                }
                if scene.is_finished() {
                    tracing::info!(frame, "scene finished");
                    break;
                }
            }

            println!(
                "after {} frames: phase {:?}, player at {:?}, gravity sign {}",
                scene.frame(),
                scene.phase(),
                scene.player().world_position(),
                scene.physics().gravity_sign()
            );
            print!("{}", log.summary());
        }
    }

    Ok(())
}
