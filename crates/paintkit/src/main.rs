// Copyright 2018 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::path::PathBuf;
use std::sync::Arc;

use paintkit::glyphpath::{self, fontdb, AttributedString, Attributes, Color, Font, GlyphPath};
use paintkit::{ContextOptions, Utility};

const HELP: &str = "\
paintkit converts text into glyph outlines.

USAGE:
  paintkit [OPTIONS] <TEXT> <OUT.svg|OUT.png>

OPTIONS:
  -h, --help                Prints help information
  -V, --version             Prints version information

  --font-size SIZE          Sets the font size in pixels [default: 24]
  --font-family NAME        Adds a font family to the font list.
                            Can be set multiple times [default: sans-serif]
  --color COLOR             Sets the text color [default: black]
  --max-width WIDTH         Wraps lines longer than WIDTH pixels
  --max-height HEIGHT       Drops lines below HEIGHT pixels
  --use-fonts-dir PATH      Loads all fonts from the specified directory.
                            Can be set multiple times
  --skip-system-fonts       Does not load system fonts
  --dpi DPI                 Sets the resolution stored in PNG files [default: 96]
  -v, --verbose             Prints layout details

ARGS:
  <TEXT>                    Text to convert. `\\n` starts a new line
  <OUT>                     Output file. The format is picked by extension
";

#[derive(Clone, Copy, PartialEq, Debug)]
enum OutputFormat {
    Svg,
    Png,
}

#[derive(Debug)]
struct Args {
    font_size: f32,
    font_families: Vec<String>,
    color: Color,
    max_width: Option<f32>,
    max_height: Option<f32>,
    font_dirs: Vec<PathBuf>,
    skip_system_fonts: bool,
    dpi: u32,
    verbose: bool,
    text: String,
    output: PathBuf,
    format: OutputFormat,
}

fn main() {
    if let Err(e) = process() {
        eprintln!("Error: {}.", e);
        std::process::exit(1);
    }
}

fn process() -> Result<(), String> {
    let args = match parse_args()? {
        Some(args) => args,
        None => return Ok(()),
    };

    if let Ok(()) = log::set_logger(&LOGGER) {
        let level = if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        };
        log::set_max_level(level);
    }

    let utility = Utility::with_fontdb(Arc::new(load_fonts(&args)));
    let path = convert(&utility, &args).map_err(|e| e.to_string())?;
    if path.is_truncated() {
        log::warn!("Text does not fit and was truncated.");
    }
    log::debug!(
        "{} lines, {} contours, layout {:?}.",
        path.line_count(),
        path.contour_count(),
        path.layout_rect()
    );

    let data = match args.format {
        OutputFormat::Svg => to_svg(&path, args.color).into_bytes(),
        OutputFormat::Png => to_png(&path, args.color, args.dpi)?,
    };

    std::fs::write(&args.output, data)
        .map_err(|e| format!("failed to write '{}' cause {}", args.output.display(), e))
}

fn parse_args() -> Result<Option<Args>, String> {
    let mut input = pico_args::Arguments::from_env();

    if input.contains(["-h", "--help"]) {
        print!("{}", HELP);
        return Ok(None);
    }

    if input.contains(["-V", "--version"]) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(None);
    }

    let font_size = input
        .opt_value_from_str("--font-size")
        .map_err(|e| e.to_string())?
        .unwrap_or(24.0);
    let mut font_families: Vec<String> = input
        .values_from_str("--font-family")
        .map_err(|e| e.to_string())?;
    if font_families.is_empty() {
        font_families.push("sans-serif".to_string());
    }

    let color = input
        .opt_value_from_fn("--color", |s| s.parse::<Color>())
        .map_err(|e| e.to_string())?
        .unwrap_or_default();
    let max_width = input
        .opt_value_from_str("--max-width")
        .map_err(|e| e.to_string())?;
    let max_height = input
        .opt_value_from_str("--max-height")
        .map_err(|e| e.to_string())?;
    let font_dirs = input
        .values_from_str("--use-fonts-dir")
        .map_err(|e| e.to_string())?;
    let skip_system_fonts = input.contains("--skip-system-fonts");
    let dpi = input
        .opt_value_from_str("--dpi")
        .map_err(|e| e.to_string())?
        .unwrap_or(96);
    let verbose = input.contains(["-v", "--verbose"]);

    let text: String = input
        .free_from_str()
        .map_err(|_| "<TEXT> is not set".to_string())?;
    let output: PathBuf = input
        .free_from_str()
        .map_err(|_| "<OUT> is not set".to_string())?;

    let remaining = input.finish();
    if !remaining.is_empty() {
        return Err(format!("unknown arguments {:?}", remaining));
    }

    let extension = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    let format = match extension {
        Some(ref ext) if ext == "svg" => OutputFormat::Svg,
        Some(ref ext) if ext == "png" => OutputFormat::Png,
        _ => return Err("<OUT> must have an .svg or .png extension".to_string()),
    };

    if !(1..=4000).contains(&dpi) {
        return Err("DPI out of bounds".to_string());
    }

    Ok(Some(Args {
        font_size,
        font_families,
        color,
        max_width,
        max_height,
        font_dirs,
        skip_system_fonts,
        dpi,
        verbose,
        // Shells rarely pass real newlines, so accept escaped ones.
        text: text.replace("\\n", "\n"),
        output,
        format,
    }))
}

fn load_fonts(args: &Args) -> fontdb::Database {
    let mut fontdb = fontdb::Database::new();
    if !args.skip_system_fonts {
        fontdb.load_system_fonts();
    }

    for path in &args.font_dirs {
        if path.is_file() {
            if let Err(e) = fontdb.load_font_file(path) {
                log::warn!("Failed to load '{}' cause {}.", path.display(), e);
            }
        } else {
            fontdb.load_fonts_dir(path);
        }
    }

    log::debug!("{} font faces loaded.", fontdb.len());
    fontdb
}

fn convert(utility: &Utility, args: &Args) -> Result<GlyphPath, glyphpath::Error> {
    let font = Font {
        families: args.font_families.clone(),
        size: args.font_size,
        ..Font::default()
    };
    let attributes = Attributes {
        color: args.color,
        ..Attributes::with_font(font)
    };
    let text = AttributedString::new(args.text.clone(), attributes);

    if args.max_width.is_none() && args.max_height.is_none() {
        return utility.path(&text);
    }

    let max_size = glyphpath::Size::from_wh(
        args.max_width.unwrap_or(f32::MAX),
        args.max_height.unwrap_or(f32::MAX),
    )
    .ok_or_else(|| glyphpath::Error::InvalidParameter {
        name: "max size",
        reason: "must be positive and finite".to_string(),
    })?;
    utility.path_with_max_size(&text, max_size)
}

fn to_svg(path: &GlyphPath, color: Color) -> String {
    let rect = path.layout_rect();
    let mut xml = xmlwriter::XmlWriter::new(xmlwriter::Options::default());
    xml.start_element("svg");
    xml.write_attribute("xmlns", "http://www.w3.org/2000/svg");
    xml.write_attribute("width", &rect.width());
    xml.write_attribute("height", &rect.height());
    xml.write_attribute_fmt(
        "viewBox",
        format_args!("{} {} {} {}", rect.x(), rect.y(), rect.width(), rect.height()),
    );

    if !path.is_empty() {
        xml.start_element("path");
        xml.write_attribute_fmt(
            "fill",
            format_args!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue),
        );
        if color.alpha != 255 {
            xml.write_attribute("fill-opacity", &(color.alpha as f32 / 255.0));
        }
        xml.write_attribute("d", &path.to_svg_data());
        xml.end_element();
    }

    xml.end_document()
}

fn to_png(path: &GlyphPath, color: Color, dpi: u32) -> Result<Vec<u8>, String> {
    let options = ContextOptions {
        name: Some("paintkit".to_string()),
        ..ContextOptions::default()
    };
    let mut ctx = Utility::image_context(options).map_err(|e| e.to_string())?;
    let image = ctx.render_glyph_path(path, color, 1.0).map_err(|e| e.to_string())?;
    ctx.encode_png(&image, dpi).map_err(|e| e.to_string())
}

/// A simple stderr logger.
static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };

            let line = record.line().unwrap_or(0);
            let args = record.args();

            match record.level() {
                log::Level::Error => eprintln!("Error (in {}:{}): {}", target, line, args),
                log::Level::Warn => eprintln!("Warning (in {}:{}): {}", target, line, args),
                log::Level::Info => eprintln!("Info (in {}:{}): {}", target, line, args),
                log::Level::Debug => eprintln!("Debug (in {}:{}): {}", target, line, args),
                log::Level::Trace => eprintln!("Trace (in {}:{}): {}", target, line, args),
            }
        }
    }

    fn flush(&self) {}
}
