use anyhow::{anyhow, bail, Context, Result};
use camsession::storage::{JsonFileStore, KeyValueStore};
use camsession::testing::{settle, SimulatedDevice, SimulatedVideoStorage};
use camsession::{
    init_logging, CamSessionConfig, CameraEvent, CameraId, CameraMode, CameraSession, HdrMode,
    PictureOptions, SetOptions, Size,
};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: camsession-cli <capabilities|capture|record|boot-config> [args]");
        std::process::exit(1);
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
    let command = &args[1];
    match command.as_str() {
        "capabilities" => runtime.block_on(cmd_capabilities(&args)),
        "capture" => runtime.block_on(cmd_capture(&args)),
        "record" => runtime.block_on(cmd_record(&args)),
        "boot-config" => runtime.block_on(cmd_boot_config(&args)),
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

/// Flags shared by every command
struct CommonArgs {
    camera: CameraId,
    json: bool,
    config: CamSessionConfig,
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} needs a value", flag))
}

fn parse_common(args: &[String]) -> Result<CommonArgs> {
    let mut common = CommonArgs {
        camera: CameraId::Back,
        json: false,
        config: CamSessionConfig::load_or_default(),
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--camera" => {
                common.camera = flag_value(args, i, "--camera")?
                    .parse::<CameraId>()
                    .map_err(anyhow::Error::msg)?;
                i += 1;
            }
            "--config" => {
                let path = flag_value(args, i, "--config")?;
                common.config = CamSessionConfig::load_from_file(path)?;
                i += 1;
            }
            "--json" => common.json = true,
            _ => {}
        }
        i += 1;
    }
    common.config.validate()?;
    Ok(common)
}

fn parse_size(s: &str) -> Result<Size> {
    let (width, height) = s
        .split_once('x')
        .ok_or_else(|| anyhow!("size must look like 1600x1200"))?;
    Ok(Size::new(width.parse()?, height.parse()?))
}

async fn open_session(common: &CommonArgs, free_space: u64) -> Result<CameraSession> {
    let session = CameraSession::builder(
        Arc::new(SimulatedDevice::new()),
        Arc::new(SimulatedVideoStorage::new(free_space)),
    )
    .config(common.config.clone())
    .build();
    session.select_camera(common.camera);
    session.load().await?;
    Ok(session)
}

fn sizes(list: &[Size]) -> String {
    list.iter()
        .map(Size::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

async fn cmd_capabilities(args: &[String]) -> Result<()> {
    let common = parse_common(args)?;
    let session = open_session(&common, 0).await?;
    let capabilities = session
        .capabilities()
        .ok_or_else(|| anyhow!("camera reported no capabilities"))?;

    if common.json {
        println!("{}", serde_json::to_string_pretty(&capabilities)?);
    } else {
        println!("camera:     {}", common.camera);
        println!("pictures:   {}", sizes(&capabilities.picture_sizes));
        println!("previews:   {}", sizes(&capabilities.preview_sizes));
        println!("thumbnails: {}", sizes(&capabilities.thumbnail_sizes));
        for (name, profile) in &capabilities.recorder_profiles {
            println!("profile:    {} ({})", name, profile.video);
        }
        println!("iso:        {}", capabilities.iso_modes.join(" "));
        println!("wb:         {}", capabilities.white_balance_modes.join(" "));
        println!("scene:      {}", capabilities.scene_modes.join(" "));
        println!("flash:      {}", capabilities.flash_modes.join(" "));
    }

    session.teardown().await;
    Ok(())
}

async fn cmd_capture(args: &[String]) -> Result<()> {
    // capture [--size WxH] [--out <file>] [--hdr on|off] [--camera back|front] [--json]
    let common = parse_common(args)?;
    let mut size = None;
    let mut out = None;
    let mut hdr: Option<HdrMode> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--size" => {
                size = Some(parse_size(flag_value(args, i, "--size")?)?);
                i += 1;
            }
            "--out" => {
                out = Some(PathBuf::from(flag_value(args, i, "--out")?));
                i += 1;
            }
            "--hdr" => {
                hdr = Some(
                    flag_value(args, i, "--hdr")?
                        .parse::<HdrMode>()
                        .map_err(anyhow::Error::msg)?,
                );
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }

    let session = open_session(&common, 0).await?;
    if let Some(hdr) = hdr {
        session.set_hdr(hdr);
    }
    session.set_picture_size(size, SetOptions::default());
    settle().await;

    let blob = session.take_picture(PictureOptions::default()).await?;
    if let Some(out) = &out {
        tokio::fs::write(out, &blob)
            .await
            .with_context(|| format!("failed to write {}", out.display()))?;
    }

    if common.json {
        let report = serde_json::json!({
            "bytes": blob.len(),
            "pictureSize": session.picture_size(),
            "output": out,
        });
        println!("{}", serde_json::to_string(&report)?);
    } else {
        match session.picture_size() {
            Some(size) => println!("Captured {} bytes at {}", blob.len(), size),
            None => println!("Captured {} bytes", blob.len()),
        }
    }

    session.teardown().await;
    Ok(())
}

async fn cmd_record(args: &[String]) -> Result<()> {
    // record [--seconds <n>] [--free <bytes>] [--profile <name>] [--json]
    let common = parse_common(args)?;
    let mut seconds = 3u64;
    let mut free = 64 * 1024 * 1024u64;
    let mut profile = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--seconds" => {
                seconds = flag_value(args, i, "--seconds")?.parse()?;
                i += 1;
            }
            "--free" => {
                free = flag_value(args, i, "--free")?.parse()?;
                i += 1;
            }
            "--profile" => {
                profile = Some(flag_value(args, i, "--profile")?.to_string());
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }

    let session = open_session(&common, free).await?;
    let mut events = session.subscribe();
    session.set_mode(CameraMode::Video);
    session.set_recorder_profile(profile.as_deref(), SetOptions::default());
    settle().await;

    session.start_recording().await?;
    tokio::time::sleep(Duration::from_secs(seconds)).await;
    session.stop_recording().await?;

    for event in events.drain() {
        match event {
            CameraEvent::VideoTime(elapsed) if !common.json => {
                println!("recording {}s", elapsed.as_secs());
            }
            CameraEvent::NewVideo { filepath, duration } => {
                if common.json {
                    let report = serde_json::json!({
                        "filepath": filepath,
                        "durationMs": duration.as_millis() as u64,
                    });
                    println!("{}", serde_json::to_string(&report)?);
                } else {
                    println!(
                        "Recorded {} ({:.1}s)",
                        filepath.display(),
                        duration.as_secs_f64()
                    );
                }
            }
            _ => {}
        }
    }

    session.teardown().await;
    Ok(())
}

async fn cmd_boot_config(args: &[String]) -> Result<()> {
    // boot-config <store.json> [--size WxH]
    let common = parse_common(args)?;
    let path = args
        .get(2)
        .filter(|a| !a.starts_with("--"))
        .ok_or_else(|| anyhow!("Usage: camsession-cli boot-config <store.json> [--size WxH]"))?;
    let mut size = None;
    let mut i = 3;
    while i < args.len() {
        if args[i] == "--size" {
            size = Some(parse_size(flag_value(args, i, "--size")?)?);
            i += 1;
        }
        i += 1;
    }

    if common.camera != CameraId::Back {
        bail!("boot configuration is only cached for the back camera");
    }

    let store = Arc::new(JsonFileStore::new(path));
    let session = CameraSession::builder(
        Arc::new(SimulatedDevice::new()),
        Arc::new(SimulatedVideoStorage::new(0)),
    )
    .config(common.config.clone())
    .cache_config(true)
    .store(store.clone())
    .build();

    if let Some(boot) = session.fetch_boot_config() {
        println!("restoring: {}", serde_json::to_string(&boot)?);
    }
    session.load().await?;
    session.set_picture_size(size, SetOptions::default());
    settle().await;

    let key = &session.config().session.boot_config_key;
    match store.get_item(key) {
        Some(json) => println!("stored:    {}", json),
        None => println!("nothing stored"),
    }

    session.teardown().await;
    Ok(())
}
