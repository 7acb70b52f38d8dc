//! frame_ring 演示程序
//!
//! 在 headless 模拟设备上渲染数据驱动的场景若干帧，并通过日志输出帧资源环的统计。
//!
//! # 使用方法
//!
//! ```bash
//! # 使用默认配置（config.toml / scene.toml）
//! cargo run
//!
//! # 两个帧资源、GPU 延迟 20ms、渲染 300 帧
//! cargo run -- --ring-depth 2 --latency-ms 20 --frames 300
//! ```
//!
//! # 命令行参数
//!
//! - `--config <path>`: 引擎配置文件
//! - `--scene <path>`: 场景配置文件
//! - `--frames <n>`: 渲染帧数
//! - `--ring-depth <n>`: 帧资源数量
//! - `--latency-ms <n>`: 模拟的 GPU 延迟
//! - `--timeout-ms <n>`: Fence 等待超时（0 表示无限等待）

use anyhow::Context;
use tracing::{debug, info};

use frame_ring::core::config::path_arg;
use frame_ring::core::{log, Config, FrameTimer, SceneConfig};
use frame_ring::gfx::{HeadlessDevice, RecordingSubmitter};
use frame_ring::renderer::dirty::DirtyPropagation;
use frame_ring::renderer::draw::RenderLayer;
use frame_ring::renderer::FrameRenderer;
use frame_ring::scene::{OrbitCamera, Scene};

/// 相机每秒绕场景旋转的角度（弧度）
const ORBIT_SPEED: f32 = 0.25;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // 1. 加载配置（在初始化日志之前）
    let config_path = path_arg(&args, "--config").unwrap_or("config.toml");
    let mut config = Config::from_file_or_default(config_path)
        .with_context(|| format!("Failed to load {config_path}"))?;

    // 2. 应用命令行参数并验证
    config.apply_args(&args);
    config.validate().context("Invalid configuration")?;

    // 3. 初始化日志系统
    let log_file = config
        .logging
        .file_output
        .then_some(config.logging.log_file.as_str());
    log::init_logger(config.logging.level, config.logging.file_output, log_file)?;
    info!(version = env!("CARGO_PKG_VERSION"), "frame_ring starting");

    // 4. 构建场景
    let scene_path = path_arg(&args, "--scene").unwrap_or("scene.toml");
    let scene_config = SceneConfig::from_file_or_default(scene_path);
    let mut scene = Scene::build(&scene_config, DirtyPropagation::new(config.frame.ring_depth))
        .context("Failed to build scene")?;

    info!(
        ring_depth = config.frame.ring_depth,
        latency_ms = config.device.latency_ms,
        frames = config.frame.frames_to_render,
        objects = scene.object_count(),
        materials = scene.material_count(),
        "Configuration loaded"
    );

    // 5. 创建设备和帧渲染器
    let device = HeadlessDevice::try_with_latency(config.device.latency())
        .context("Failed to create headless device")?;
    let mut renderer = FrameRenderer::new(device, &scene, &config.frame)
        .context("Failed to create frame renderer")?;
    let mut submitter = RecordingSubmitter::new();

    let (width, height) = (config.window.width, config.window.height);
    let mut camera = OrbitCamera::from_config(&scene_config.camera, width, height);
    let render_target_size = [width as f32, height as f32];
    let mut timer = FrameTimer::new();

    // 6. 渲染循环
    for _ in 0..config.frame.frames_to_render {
        let delta_time = timer.tick();
        camera.orbit(ORBIT_SPEED * delta_time, 0.0);
        scene.animate_materials(delta_time);

        let pass = camera.pass_constants(render_target_size, timer.total_time(), delta_time);
        let report = renderer.render_frame(&mut scene, &pass, &mut submitter)?;

        if report.waited {
            debug!(
                frame = report.frame_number,
                slot = report.slot_index,
                "CPU waited for GPU"
            );
        }
    }

    // 7. 关闭前等待所有在飞的帧
    renderer.shutdown()?;

    let stats = renderer.stats();
    info!(
        frames = stats.frames,
        waits = stats.waits,
        wait_ratio = stats.wait_ratio(),
        object_refreshes = stats.object_refreshes,
        material_refreshes = stats.material_refreshes,
        "Rendering finished"
    );
    for layer in RenderLayer::ALL {
        info!(layer = layer.pipeline_name(), draws = submitter.draws(layer), "Layer draws");
    }

    Ok(())
}
