use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use juxtapose::image_loader::{load_pair_from_paths, ImagePair};
use juxtapose::label::{find_system_font, load_font_file, GlyphPainter, LabelStyle};
use juxtapose::remote::{ApiClient, Parameters, DEFAULT_API_URL};
use juxtapose::style::StyleSheet;
use juxtapose::{CanvasRenderer, DomRenderer, Orientation, Viewport, Widget, WidgetEvent};
use log::{debug, error, info, warn};
use winit::{
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};
mod app;

use crate::app::{AppState, ComparisonWidget};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("{e}");
        for cause in e.chain().skip(1) {
            debug!("caused by: {cause}");
        }
        std::process::exit(1);
    }
}

fn cli() -> Command {
    Command::new("juxtapose")
        .version("1.0")
        .about("Shows two images as a before/after comparison")
        .arg(
            Arg::new("before")
                .short('b')
                .long("before")
                .action(ArgAction::Set)
                .value_name("FILE")
                .help("Image shown on the leading side of the split")
                .requires("after")
                .conflicts_with("query"),
        )
        .arg(
            Arg::new("after")
                .short('a')
                .long("after")
                .action(ArgAction::Set)
                .value_name("FILE")
                .help("Image shown on the trailing side of the split")
                .requires("before"),
        )
        .arg(
            Arg::new("before_label")
                .long("before-label")
                .action(ArgAction::Set)
                .value_name("TEXT")
                .help("Label baked into the before image"),
        )
        .arg(
            Arg::new("after_label")
                .long("after-label")
                .action(ArgAction::Set)
                .value_name("TEXT")
                .help("Label baked into the after image"),
        )
        .arg(
            Arg::new("orientation")
                .short('o')
                .long("orientation")
                .action(ArgAction::Set)
                .value_name("h|v")
                .help("Split orientation for local images")
                .default_value("h"),
        )
        .arg(
            Arg::new("query")
                .short('q')
                .long("query")
                .action(ArgAction::Set)
                .value_name("URL")
                .help("Comparison page URL or query string carrying d, m and o")
                .required_unless_present("before"),
        )
        .arg(
            Arg::new("api")
                .long("api")
                .action(ArgAction::Set)
                .value_name("URL")
                .help("Comparison API endpoint")
                .default_value(DEFAULT_API_URL),
        )
        .arg(
            Arg::new("window_size")
                .short('w')
                .long("window-size")
                .action(ArgAction::Set)
                .value_name("WIDTHxHEIGHT")
                .help("Window size in format WIDTHxHEIGHT (e.g. 1920x1080)")
                .default_value("1280x720"),
        )
        .arg(
            Arg::new("font")
                .long("font")
                .action(ArgAction::Set)
                .value_name("FILE")
                .help("TrueType/OpenType font for labels (defaults to a bold system sans-serif)"),
        )
        .arg(
            Arg::new("reveal")
                .long("reveal")
                .action(ArgAction::Set)
                .value_name("0-100")
                .help("Initial slider value"),
        )
        .arg(
            Arg::new("snapshot")
                .long("snapshot")
                .action(ArgAction::Set)
                .value_name("FILE")
                .help("Render one canvas frame to an image file instead of opening a window"),
        )
        .arg(
            Arg::new("css")
                .long("css")
                .action(ArgAction::SetTrue)
                .help("Print the style declarations for the comparison markup and exit"),
        )
}

fn run() -> Result<()> {
    let matches = cli().get_matches();

    let window_size = matches.get_one::<String>("window_size").unwrap();
    let (width, height) = parse_window_size(window_size).map_err(anyhow::Error::msg)?;
    let reveal = match matches.get_one::<String>("reveal") {
        Some(value) => Some(
            value
                .parse::<f64>()
                .with_context(|| format!("Invalid reveal value '{}'", value))?,
        ),
        None => None,
    };

    let (orientation, images) = load_images(&matches)?;

    if matches.get_flag("css") {
        let viewport = Viewport::new(width as f64, height as f64, 1.0);
        let mut widget = Widget::new(DomRenderer::new(StyleSheet::new()), orientation, viewport);
        widget.initialize(images)?;
        if let Some(value) = reveal {
            widget.handle(WidgetEvent::Input { value, range: 100.0 })?;
        }
        print!("{}", widget.renderer().target());
        return Ok(());
    }

    let font_path = matches.get_one::<String>("font").map(PathBuf::from);

    if let Some(path) = matches.get_one::<String>("snapshot") {
        let viewport = Viewport::new(width as f64, height as f64, 1.0);
        let mut widget = canvas_widget(orientation, viewport, font_path.as_deref())?;
        widget.initialize(images)?;
        if let Some(value) = reveal {
            widget.handle(WidgetEvent::Input { value, range: 100.0 })?;
        }
        widget
            .renderer()
            .frame()
            .save(path)
            .with_context(|| format!("Failed to write comparison frame to {}", path))?;
        info!("Wrote comparison frame to {}", path);
        return Ok(());
    }

    info!(
        "Starting comparison viewer ({} orientation), window size: {}x{}",
        orientation, width, height
    );

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("Image Comparison")
        .with_inner_size(winit::dpi::LogicalSize::new(width, height))
        .build(&event_loop)?;

    let scale_factor = window.scale_factor();
    let physical = window.inner_size();
    let viewport = Viewport::new(
        physical.width as f64 / scale_factor,
        physical.height as f64 / scale_factor,
        scale_factor,
    );
    let mut widget = canvas_widget(orientation, viewport, font_path.as_deref())?;
    widget.initialize(images)?;
    if let Some(value) = reveal {
        widget.handle(WidgetEvent::Input { value, range: 100.0 })?;
    }

    let mut app_state = pollster::block_on(AppState::new(&window, widget))?;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        if app_state.handle_event(&window, &event) {
            window.request_redraw();
        }

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(VirtualKeyCode::Escape),
                            ..
                        },
                    ..
                } => *control_flow = ControlFlow::Exit,
                _ => {}
            },
            Event::RedrawRequested(_) => {
                app_state.update();
                match app_state.render() {
                    Ok(_) => {}
                    Err(e) => error!("Render error: {}", e),
                }
            }
            _ => {}
        }
    });
}

/// Resolves the orientation and decodes both images, from disk or from the API.
fn load_images(matches: &ArgMatches) -> Result<(Orientation, juxtapose::Result<ImagePair>)> {
    if let Some(query) = matches.get_one::<String>("query") {
        let params = Parameters::from_query(query)?;
        let orientation = params.orientation()?;
        let api = matches.get_one::<String>("api").unwrap();
        let client = ApiClient::new(api)?;
        let payload = client.fetch_payload(&params)?;
        return Ok((orientation, client.fetch_pair(payload)));
    }

    let orientation = matches
        .get_one::<String>("orientation")
        .unwrap()
        .parse::<Orientation>()?;
    let before = matches.get_one::<String>("before").unwrap();
    let after = matches.get_one::<String>("after").unwrap();
    let images = load_pair_from_paths(
        Path::new(before),
        Path::new(after),
        matches.get_one::<String>("before_label").cloned(),
        matches.get_one::<String>("after_label").cloned(),
    );
    Ok((orientation, images))
}

fn canvas_widget(
    orientation: Orientation,
    viewport: Viewport,
    font_path: Option<&Path>,
) -> Result<ComparisonWidget> {
    let font = match font_path {
        Some(path) => Some(load_font_file(path)?),
        None => find_system_font(),
    };
    if font.is_none() {
        warn!("No usable font found; labels will not be drawn");
    }

    let style = LabelStyle::default().scaled(viewport.scale_factor);
    let painter = font.map(|font| GlyphPainter::new(font, style.font_px));
    Ok(Widget::new(
        CanvasRenderer::new(painter, style),
        orientation,
        viewport,
    ))
}

fn parse_window_size(size: &str) -> Result<(f32, f32), String> {
    let parts: Vec<&str> = size.split('x').collect();
    if parts.len() != 2 {
        return Err("Invalid window size format. Use WIDTHxHEIGHT".to_string());
    }
    let width = parts[0].parse::<f32>().map_err(|_| "Invalid width")?;
    let height = parts[1].parse::<f32>().map_err(|_| "Invalid height")?;
    Ok((width, height))
}
