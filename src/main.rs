//! DistScene - 场景层演示程序
//!
//! 从 `scene.toml` 加载场景（不存在时使用只含一个正交相机的默认场景），
//! 激活全部对象后按固定节奏驱动帧循环。
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件
//! cargo run
//!
//! # 只运行 300 帧，固定步长 10ms
//! cargo run -- --frames 300 --fixed-step-ms 10
//! ```
//!
//! # 命令行参数
//!
//! - `--max-dt <seconds>`: 单帧最大时间步长
//! - `--fixed-step-ms <ms>`: fixed_update 的固定步长
//! - `--frames <n>`: 运行的帧数，0 表示一直运行

use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use dist_scene::component::Camera;
use dist_scene::core::{log, Config, SceneConfig};
use dist_scene::resource::{Buffer, BufferBackend, BufferType, HeadlessBackend};
use dist_scene::runtime::{MonotonicClock, Scene};
use tracing::{debug, info, warn};

/// 每隔多少帧输出一次统计
const STATS_INTERVAL: u64 = 120;

fn main() -> anyhow::Result<()> {
    // 1. 加载配置（在初始化日志之前）
    let mut config = Config::from_file_or_default("config.toml");
    config.apply_args(std::env::args());
    config.validate().context("Invalid configuration")?;

    // 2. 初始化日志系统
    let log_file = if config.logging.file_output {
        Some(config.logging.log_file.as_str())
    } else {
        None
    };
    log::init_logger(config.logging.level, config.logging.file_output, log_file);
    info!("DistScene starting...");
    info!(version = env!("CARGO_PKG_VERSION"), "Application initialized");
    info!(
        max_delta = config.time.max_delta,
        fixed_timestep_ms = config.time.fixed_timestep_ms,
        max_fixed_steps = config.time.max_fixed_steps,
        frame_limit = config.time.frame_limit,
        "Time configuration"
    );

    // 3. 构建场景
    let description = SceneConfig::from_file_or_default("scene.toml");
    let mut scene = Scene::from_config(&description, &config.time, MonotonicClock::new());

    // 4. 为相机绑定 uniform 缓冲区
    let backend: Rc<dyn BufferBackend> = Rc::new(HeadlessBackend::new());
    for object in scene.objects() {
        if let Some(camera) = object.get_component::<Camera>() {
            camera
                .borrow_mut()
                .bind_uniform_buffer(Buffer::new(backend.clone(), BufferType::Uniform));
            debug!(object = %object.id(), "Bound camera uniform buffer");
        }
    }

    // 5. 激活
    let report = scene.activate();
    for (id, err) in &report.failed {
        warn!(object = %id, "Object will stay inert: {}", err);
    }
    if scene.active_count() == 0 {
        anyhow::bail!("no object in scene '{}' could be activated", scene.name());
    }
    info!(
        scene = %scene.name(),
        active = scene.active_count(),
        failed = report.failed.len(),
        backend = backend.backend_name(),
        "Entering frame loop..."
    );

    // 6. 帧循环
    let frame_budget = Duration::from_millis(config.time.fixed_timestep_ms);
    let started = Instant::now();
    loop {
        let frame_start = Instant::now();
        let stats = scene.frame();

        if stats.frame % STATS_INTERVAL == 0 {
            info!(
                frame = stats.frame,
                delta_ms = stats.delta_time * 1000.0,
                fixed_steps = stats.fixed_steps,
                objects = stats.active_objects,
                components = stats.components,
                "Frame stats"
            );
        }

        if config.time.frame_limit != 0 && scene.frame_count() >= config.time.frame_limit {
            break;
        }

        if let Some(remaining) = frame_budget.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    let wall = started.elapsed().as_secs_f32();
    info!(
        frames = scene.frame_count(),
        simulated_s = scene.elapsed().as_secs_f32(),
        wall_s = wall,
        fps = if wall > 0.0 { scene.frame_count() as f32 / wall } else { 0.0 },
        "DistScene finished"
    );

    Ok(())
}
