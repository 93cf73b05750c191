use std::any::Any;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::Key;
use winit::platform::run_on_demand::EventLoopExtRunOnDemand;
use winit::window::WindowBuilder;

use glyphlight::{
    parse_key_sequence, App, FontSource, FsFontLoader, KeyCode, NamedKey, Preset, Renderer,
    SceneDescription,
};

const USAGE: &str = "Usage: glyphlight [--scene <file.xml>] [--preset <flat|diffuse|specular|metallic>] \
[--font <path|builtin>] [--keys <sequence>] [--frames <n>] [--summary-only]";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Some(options) = CliOptions::parse(env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };

    let mut description = match (&options.scene, options.preset) {
        (Some(path), _) => SceneDescription::from_file(path)?,
        (None, Some(preset)) => preset.description(),
        (None, None) => SceneDescription::default(),
    };
    if let Some(font) = &options.font {
        description.font = font.clone();
    }
    description.validate()?;

    let mut app = App::from_description(&description, &FsFontLoader)?;
    println!(
        "Loaded {} scene with {} glyph(s) using font {}",
        description.preset,
        app.state().glyphs.len(),
        description.font
    );

    for key in &options.keys {
        app.handle_key(*key);
    }

    if options.summary_only {
        return run_headless(&mut app, options.frames.unwrap_or(1));
    }
    match run_interactive(&mut app, options.frames) {
        Ok(()) => {
            print!("{}", app.summary());
            Ok(())
        }
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
            eprintln!(
                "{err}. Falling back to --summary-only mode (set DISPLAY or install a GPU driver to enable rendering)."
            );
            run_headless(&mut app, options.frames.unwrap_or(1))
        }
        Err(err) => Err(err),
    }
}

fn run_headless(app: &mut App, frames: u64) -> Result<()> {
    for _ in 0..frames {
        app.frame();
    }
    print!("{}", app.summary());
    Ok(())
}

fn run_interactive(app: &mut App, frame_limit: Option<u64>) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let mut event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("glyphlight")
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let renderer = block_on(Renderer::new(Arc::clone(&window), app.state()))
        .map_err(|err| WindowInitError::from_error("renderer", format!("{err:#}")))?;
    let size = renderer.size();
    app.set_viewport(size.width, size.height);

    let mut session = Session {
        app,
        renderer,
        frame_limit,
        last_error: None,
    };
    event_loop
        .run_on_demand(|event, target| {
            target.set_control_flow(ControlFlow::Poll);
            if let Err(err) = session.process_event(&event, target) {
                session.last_error = Some(err);
                target.exit();
            }
        })
        .map_err(|err| anyhow!("event loop failed: {err}"))?;

    match session.last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct Session<'a> {
    app: &'a mut App,
    renderer: Renderer,
    frame_limit: Option<u64>,
    last_error: Option<anyhow::Error>,
}

impl Session<'_> {
    fn process_event(&mut self, event: &Event<()>, target: &EventLoopWindowTarget<()>) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => target.exit(),
                    WindowEvent::Resized(size) => {
                        self.renderer.resize(*size);
                        self.app.set_viewport(size.width, size.height);
                    }
                    WindowEvent::KeyboardInput { event, .. } => self.handle_keyboard(event, target),
                    WindowEvent::RedrawRequested => self.redraw(target)?,
                    _ => {}
                }
            }
            Event::AboutToWait => self.renderer.window().request_redraw(),
            _ => {}
        }
        Ok(())
    }

    fn handle_keyboard(&mut self, event: &KeyEvent, target: &EventLoopWindowTarget<()>) {
        if event.state != ElementState::Pressed {
            return;
        }
        match map_key(&event.logical_key) {
            Some(KeyCode::Named(NamedKey::Escape)) => target.exit(),
            Some(key) => {
                self.app.handle_key(key);
            }
            None => debug!("ignoring unmapped key {:?}", event.logical_key),
        }
    }

    fn redraw(&mut self, target: &EventLoopWindowTarget<()>) -> Result<()> {
        let frame = self.app.frame();
        if let Err(err) = self.renderer.render(&frame) {
            match err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    let size = self.renderer.window().inner_size();
                    self.renderer.resize(size);
                }
                wgpu::SurfaceError::OutOfMemory => bail!("GPU is out of memory"),
                wgpu::SurfaceError::Timeout => info!("surface timeout; retrying next frame"),
            }
        }
        if self
            .frame_limit
            .is_some_and(|limit| self.app.frames() >= limit)
        {
            target.exit();
        }
        Ok(())
    }
}

fn map_key(key: &Key) -> Option<KeyCode> {
    use winit::keyboard::NamedKey as Named;
    match key {
        Key::Character(text) => KeyCode::from_name(text.as_str()),
        Key::Named(named) => {
            let key = match named {
                Named::Space => NamedKey::Space,
                Named::Enter => NamedKey::Enter,
                Named::Tab => NamedKey::Tab,
                Named::ArrowLeft => NamedKey::Left,
                Named::ArrowRight => NamedKey::Right,
                Named::ArrowUp => NamedKey::Up,
                Named::ArrowDown => NamedKey::Down,
                Named::Escape => NamedKey::Escape,
                Named::Backspace => NamedKey::Backspace,
                Named::PageUp => NamedKey::PageUp,
                Named::PageDown => NamedKey::PageDown,
                _ => return None,
            };
            Some(KeyCode::Named(key))
        }
        _ => None,
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

#[derive(Debug, Default)]
struct CliOptions {
    scene: Option<PathBuf>,
    preset: Option<Preset>,
    font: Option<FontSource>,
    keys: Vec<KeyCode>,
    frames: Option<u64>,
    summary_only: bool,
}

impl CliOptions {
    /// Returns `None` when help was requested.
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Option<Self>> {
        let mut options = Self::default();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} expects a value. {USAGE}"))
            };
            match arg.as_str() {
                "--scene" => options.scene = Some(PathBuf::from(value("--scene")?)),
                "--preset" => {
                    let name = value("--preset")?;
                    let preset = Preset::from_name(&name)
                        .ok_or_else(|| anyhow!("unknown preset {name:?}. {USAGE}"))?;
                    options.preset = Some(preset);
                }
                "--font" => options.font = Some(FontSource::parse(&value("--font")?)),
                "--keys" => {
                    let sequence = value("--keys")?;
                    for key in parse_key_sequence(&sequence) {
                        match key {
                            Some(key) => options.keys.push(key),
                            None => warn!("skipping unknown key in {sequence:?}"),
                        }
                    }
                }
                "--frames" => {
                    let frames = value("--frames")?;
                    let frames = frames
                        .parse::<u64>()
                        .with_context(|| format!("invalid frame count {frames:?}"))?;
                    options.frames = Some(frames);
                }
                "--summary-only" => options.summary_only = true,
                "--help" | "-h" => return Ok(None),
                other => bail!("Unknown argument: {other}. {USAGE}"),
            }
        }
        if options.scene.is_some() && options.preset.is_some() {
            bail!("--scene and --preset cannot be combined; set the preset attribute in the scene file");
        }
        Ok(Some(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::NamedKey as Named;

    #[test]
    fn keys_without_a_binding_name_map_to_none() {
        assert_eq!(map_key(&Key::Named(Named::F1)), None);
        assert_eq!(map_key(&Key::Named(Named::Shift)), None);
        assert_eq!(map_key(&Key::Character("ab".into())), None);
    }

    #[test]
    fn bindable_keys_are_mapped() {
        assert_eq!(
            map_key(&Key::Character("w".into())),
            Some(KeyCode::Character('W'))
        );
        assert_eq!(
            map_key(&Key::Named(Named::ArrowUp)),
            Some(KeyCode::Named(NamedKey::Up))
        );
    }
}
