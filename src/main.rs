use anyhow::{Context, bail};
use winit::event_loop::{ControlFlow, EventLoop};

mod animation;
mod app;
mod asset;
mod clock;
mod error;
mod renderer;
mod scene;
mod settings;
mod ui;

use animation::{ClipInfo, ControllerMode};
use asset::AssetLoader;
use settings::Settings;

pub const CONFY_APP_NAME: &str = "rigview-rs";

const USAGE: &str = "usage: rigview [MODEL] [--auto|--manual] [--list-clips]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    model: Option<String>,
    mode: Option<ControllerMode>,
    list_clips: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    for arg in args {
        match arg.as_str() {
            "--auto" => parsed.mode = Some(ControllerMode::AutoAlternate),
            "--manual" => parsed.mode = Some(ControllerMode::Manual),
            "--list-clips" => parsed.list_clips = true,
            flag if flag.starts_with("--") => bail!("unknown option `{}`\n{}", flag, USAGE),
            path if parsed.model.is_none() => parsed.model = Some(path.to_string()),
            extra => bail!("unexpected argument `{}`\n{}", extra, USAGE),
        }
    }
    Ok(parsed)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = parse_args(std::env::args().skip(1))?;
    let mut settings = Settings::load();
    if let Some(mode) = args.mode {
        settings.animation.mode = mode;
    }
    let model_path = args
        .model
        .unwrap_or_else(|| settings.display.model_path.clone());

    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;

    if args.list_clips {
        let loader = AssetLoader::new(runtime.handle().clone());
        let model = runtime.block_on(loader.load(&model_path).wait())?;
        let clips: Vec<ClipInfo> = model.clips.iter().map(ClipInfo::from).collect();
        println!("{}", serde_json::to_string_pretty(&clips)?);
        return Ok(());
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut handler = app::AppHandler::new(settings, model_path, runtime);
    event_loop.run_app(&mut handler)?;

    if let Some(e) = handler.take_error() {
        return Err(e).context("viewer could not start");
    }
    Ok(())
}
