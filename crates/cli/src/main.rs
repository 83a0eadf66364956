use anyhow::{anyhow, bail, Context};
use config::{Config, File};
use log::{info, warn, LevelFilter};
use serde::Serialize;
use simple_logger::SimpleLogger;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    process,
};
use structopt::StructOpt;
use strum::{Display, EnumString};
use tessera::{
    timed, Atlas, CellTiles, Grid, MapConfig, MapRenderer, RenderConfig,
    TileMap,
};

/// CLI for generating tile maps via the Tessera generation kit.
#[derive(Debug, StructOpt)]
#[structopt(name = "tessera")]
struct Opt {
    /// Path to a config file that defines the map to be generated. Supported
    /// formats: JSON, TOML
    #[structopt(short, long)]
    config: Option<PathBuf>,

    /// Path to an existing .bin map file to load
    #[structopt(short, long)]
    bin: Option<PathBuf>,

    /// Directory of tile sheet images. Only the file names are used, to
    /// figure out which biomes and overlays have art. If not given, the
    /// sheet set that matches the default config is assumed.
    #[structopt(short, long)]
    sheets: Option<PathBuf>,

    /// If given, the generated map will be saved to this directory. The
    /// exact files that appear in the directory are defined by the output
    /// formats. See `--output-formats` for more info
    #[structopt(short, long)]
    output: Option<PathBuf>,

    /// The format(s) to output the map in. Supported formats:
    ///
    /// bin - Binary representation that can be reloaded by this CLI and
    ///   other tools later. Use this for persisting & sharing maps
    ///
    /// cfg - The full config object used for the map, in TOML format
    ///
    /// json - JSON representation. Similar to the binary format, but slower
    ///   and much less compact
    ///
    /// report - Summary of what happened during generation, in JSON
    ///
    /// svg - 2D preview of the map, drawn with biome colors
    ///
    /// tiles - The tile sheet and tile index of every cell, in JSON. This is
    ///   what a rasterizer needs to draw the map
    #[structopt(short = "f", long)]
    output_formats: Vec<OutputFormat>,

    /// Edge length of one cell in rendered output. Only relevant for
    /// rendered output formats, such as SVG.
    #[structopt(long, default_value = "8")]
    cell_size: f64,

    /// Hide overlays such as roads and rivers? Only relevant for rendered
    /// output formats, such as SVG.
    #[structopt(long)]
    hide_overlays: bool,

    /// Draw the raw route of every carved path? Only relevant for rendered
    /// output formats, such as SVG.
    #[structopt(long)]
    show_routes: bool,

    /// The logging level to use during map generation. See
    /// https://docs.rs/log/0.4.11/log/enum.LevelFilter.html for options
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

/// Different output formats.
#[derive(Copy, Clone, Debug, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
enum OutputFormat {
    // If you change this, make sure to update the help text for
    // `--output-formats`!
    /// Export the map in a serialized binary format, which can be
    /// deserialized later to recover the map
    Bin,
    /// Export the map's full config in a human-readable file
    Cfg,
    /// Export the map in a serialized JSON format, which can be deserialized
    /// later to recover the map. This is similar to the bin format, but is
    /// human readable at the cost of being slower and much less compact
    Json,
    /// Export the generation report
    Report,
    /// Render the map as a 2D SVG
    Svg,
    /// Export the tile reference of every cell
    Tiles,
}

impl OutputFormat {
    fn file_name(self) -> &'static str {
        match self {
            Self::Bin => "map.bin",
            Self::Cfg => "map.toml",
            Self::Json => "map.json",
            Self::Report => "report.json",
            Self::Svg => "map.svg",
            Self::Tiles => "tiles.json",
        }
    }
}

/// Everything a rasterizer needs to draw a map: which tile goes in which
/// cell, and which file each sheet ID refers to
#[derive(Debug, Serialize)]
struct TileManifest<'a> {
    tile_size: u32,
    sheets: Vec<&'a str>,
    cells: Grid<CellTiles>,
}

fn load_config(config_path: &Path) -> anyhow::Result<MapConfig> {
    // Load config
    let mut settings = Config::new();
    let config_path = config_path.to_str().ok_or_else(|| {
        anyhow!("invalid character in path {:?}", config_path)
    })?;
    settings
        .merge(File::with_name(config_path))
        .context("error reading config file")?;
    settings.try_into().context("error reading config")
}

/// Build an atlas from the names of the image files in a directory. Sheets
/// are sorted by name so that sheet IDs are stable.
fn load_atlas(sheet_dir: &Path) -> anyhow::Result<Atlas> {
    let mut names = Vec::new();
    for entry in fs::read_dir(sheet_dir).with_context(|| {
        format!("error reading sheet directory {:?}", sheet_dir)
    })? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("png") {
            continue;
        }
        match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => names.push(name.to_owned()),
            None => warn!("Skipping sheet with invalid name {:?}", path),
        }
    }
    names.sort_unstable();
    info!("Found {} tile sheets in {:?}", names.len(), sheet_dir);
    Atlas::from_sheet_names(&names)
}

/// Generate an output form of the map in the given format.
fn gen_output(
    output_dir: &Path,
    output_format: OutputFormat,
    map: &TileMap,
    atlas: &Atlas,
    renderer: &MapRenderer,
) -> anyhow::Result<()> {
    fn generate_bytes(
        output_format: OutputFormat,
        map: &TileMap,
        atlas: &Atlas,
        renderer: &MapRenderer,
    ) -> anyhow::Result<Vec<u8>> {
        Ok(match output_format {
            OutputFormat::Bin => {
                // Serialize the entire map via CBOR
                map.to_bin()
            }
            OutputFormat::Cfg => {
                // Serialize just the map config via toml. TOML needs plain
                // values ahead of tables, which toml::Value takes care of.
                let value = toml::Value::try_from(map.config())
                    .context("error serializing config")?;
                toml::to_string_pretty(&value)
                    .context("error serializing config")?
                    .into_bytes()
            }
            OutputFormat::Json => {
                // Serialize the entire map via JSON
                map.to_json().into()
            }
            OutputFormat::Report => {
                serde_json::to_vec_pretty(map.report())?
            }
            OutputFormat::Svg => {
                // Render the map in 2D
                renderer.render_as_svg(map)?.into_bytes()
            }
            OutputFormat::Tiles => serde_json::to_vec(&TileManifest {
                tile_size: map.config().tile_size,
                sheets: atlas.sheet_names().collect(),
                cells: map.cell_tiles(),
            })?,
        })
    }

    let output_file_path = output_dir.join(output_format.file_name());

    timed!(
        format!(
            "Generating {} output and writing to {:?}",
            output_format, &output_file_path
        ),
        log::Level::Info,
        {
            let bytes = generate_bytes(output_format, map, atlas, renderer)
                .with_context(|| {
                    format!("error generating {} output", output_format)
                })?;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&output_file_path)
                .with_context(|| {
                    format!("error opening output file {:?}", &output_file_path)
                })?;
            file.write_all(&bytes).with_context(|| {
                format!("error writing to file {:?}", &output_file_path)
            })?;
        }
    );

    Ok(())
}

/// Run the CLI with some options
fn run(opt: Opt) -> anyhow::Result<()> {
    SimpleLogger::new().with_level(opt.log_level).init()?;

    let atlas = match &opt.sheets {
        Some(sheet_dir) => load_atlas(sheet_dir)?,
        None => Atlas::default(),
    };

    let map = match &opt {
        Opt {
            config: Some(config_path),
            bin: None,
            ..
        } => {
            // Load map config and use it to generate a new map
            let config = load_config(config_path)?;
            TileMap::generate(config, &atlas)?
        }
        Opt {
            config: None,
            bin: Some(input_path),
            ..
        } => {
            // Load existing map from a file
            let file = OpenOptions::new()
                .read(true)
                .open(input_path)
                .with_context(|| {
                    format!("error opening map file {:?}", input_path)
                })?;
            let map = TileMap::from_bin(file)?;
            info!("Loaded map from {:?}", input_path);
            map
        }
        _ => bail!(
            "must pass exactly one of --config (to generate a new map) \
            or --bin (to load an existing map)"
        ),
    };

    let report = map.report();
    if report.residual_illegal_edges > 0 || report.fallback_cells > 0 {
        warn!(
            "Map is degraded: {} illegal edges, {} fallback cells",
            report.residual_illegal_edges, report.fallback_cells
        );
    }
    if report.unreachable_paths > 0 {
        warn!("{} path(s) could not be carved", report.unreachable_paths);
    }

    // If an output dir was specified, write out output format(s) there
    if let Some(output_dir) = &opt.output {
        if opt.output_formats.is_empty() {
            bail!("output dir was specified, but no output formats were given")
        }
        fs::create_dir_all(output_dir)?;

        let renderer = MapRenderer::new(RenderConfig {
            cell_size: opt.cell_size,
            show_overlays: !opt.hide_overlays,
            show_routes: opt.show_routes,
            ..Default::default()
        })
        .context("invalid render config")?;
        for output_format in &opt.output_formats {
            gen_output(output_dir, *output_format, &map, &atlas, &renderer)?;
        }
    }

    Ok(())
}

fn main() {
    let exit_code = match run(Opt::from_args()) {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    };
    process::exit(exit_code);
}
