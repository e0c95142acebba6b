//! # Anim Replay
//!
//! 视口动画回放工具 - 按 JSON 场景驱动动画系统并逐帧输出相机状态。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p anim-replay -- run scenarios/pan_zoom.json
//! cargo run -p anim-replay -- run scenarios/perspective.json --frame-rate 30 --json
//! cargo run -p anim-replay -- check scenarios/pretty_move.json
//! RUST_LOG=viewport_anim=debug cargo run -p anim-replay -- run scenarios/pan_zoom.json
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use anim_replay::{FrameReport, ReplayConfig, Replayer, Scenario};

#[derive(Parser)]
#[command(name = "anim-replay")]
#[command(about = "视口动画回放工具 - 按 JSON 场景逐帧输出相机状态")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 日志级别（RUST_LOG 优先）
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 回放场景
    Run {
        /// 场景文件
        scenario: PathBuf,

        /// 配置文件（默认：replay.json，不存在时使用默认配置）
        #[arg(short, long, default_value = "replay.json")]
        config: PathBuf,

        /// 覆盖帧率
        #[arg(long)]
        frame_rate: Option<f64>,

        /// 覆盖视口宽度
        #[arg(long)]
        width: Option<f64>,

        /// 覆盖视口高度
        #[arg(long)]
        height: Option<f64>,

        /// 每帧输出一行 JSON
        #[arg(long)]
        json: bool,
    },

    /// 只解析并校验场景
    Check {
        /// 场景文件
        scenario: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match real_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn real_main(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run {
            scenario,
            config,
            frame_rate,
            width,
            height,
            json,
        } => {
            let mut config = ReplayConfig::load(&config);
            if let Some(frame_rate) = frame_rate {
                config.frame_rate = frame_rate;
            }
            if let Some(width) = width {
                config.viewport.width = width;
            }
            if let Some(height) = height {
                config.viewport.height = height;
            }
            config.validate().context("配置无效")?;

            let scenario = load_scenario(&scenario)?;
            let outcome = Replayer::new(config).run(&scenario);

            for frame in &outcome.frames {
                if json {
                    println!("{}", serde_json::to_string(frame)?);
                } else {
                    print_frame(frame);
                }
            }

            let screen = &outcome.final_screen;
            eprintln!(
                "frames: {}  final center: ({:.3}, {:.3})  scale: {:.6}  angle: {:.4}{}",
                outcome.frames.len(),
                screen.org().x,
                screen.org().y,
                screen.scale(),
                screen.angle(),
                if outcome.truncated { "  (truncated)" } else { "" }
            );
            Ok(())
        }
        Commands::Check { scenario } => {
            let loaded = load_scenario(&scenario)?;
            println!(
                "ok: {} ({} steps, {:.3}s)",
                scenario.display(),
                loaded.steps.len(),
                loaded.total_seconds()
            );
            Ok(())
        }
    }
}

fn load_scenario(path: &Path) -> anyhow::Result<Scenario> {
    let scenario = Scenario::load(path)?;
    scenario
        .validate()
        .with_context(|| format!("场景校验失败: {}", path.display()))?;
    Ok(scenario)
}

fn print_frame(frame: &FrameReport) {
    let mut line = format!(
        "{:>5}  t={:>7.3}  center=({:>10.3}, {:>10.3})  scale={:<10.6}  angle={:>7.4}",
        frame.frame, frame.time, frame.center.x, frame.center.y, frame.scale, frame.angle
    );
    if let Some(tilt) = frame.perspective {
        line.push_str(&format!("  tilt={tilt:.4}"));
    }
    if let Some(switch) = frame.switch {
        let action = if switch.enable { "enter 3d" } else { "leave 3d" };
        line.push_str(&format!(
            "  [{action} {:.3} -> {:.3}, fov {:.3}]",
            switch.from_angle, switch.to_angle, switch.fov_angle
        ));
    }
    println!("{line}");
}
