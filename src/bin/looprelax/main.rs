//! looprelax CLI - edge-loop relaxation command-line tool.
//!
//! Usage: looprelax <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `looprelax --help` for available commands. Set `RUST_LOG=debug` for
//! pipeline details.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};

use looprelax::algo::plane::best_fit_plane;
use looprelax::algo::{
    find_loops, relax_with_progress, InputMode, Interpolation, Iterations, Progress,
    RelaxOptions, TopologyCache,
};
use looprelax::error::MeshError;
use looprelax::io;
use looprelax::mesh::{
    DerivedMesh, EdgeKey, MeshObject, MirrorAxes, MirrorModifier, Modifier, PolyMesh, VertexId,
};

#[derive(Parser)]
#[command(name = "looprelax")]
#[command(author, version, about = "Edge-loop relaxation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the loops formed by a selection
    Loops {
        /// Input mesh file
        input: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Which loops to report
        #[arg(long = "input", value_enum, default_value = "selected")]
        input_mode: InputArg,

        /// Mirror modifier axes, e.g. "x" or "x,z"
        #[arg(long, value_parser = parse_axes)]
        mirror_modifier: Option<MirrorAxes>,
    },

    /// Relax the loops formed by a selection
    Relax {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Which loops to relax
        #[arg(long = "input", value_enum, default_value = "selected")]
        input_mode: InputArg,

        /// Spline fitted through the knots
        #[arg(long, value_enum, default_value = "cubic")]
        interpolation: InterpolationArg,

        /// Number of passes (1, 3, 5, 10 or 25)
        #[arg(short, long, default_value = "1", value_parser = parse_iterations)]
        iterations: Iterations,

        /// Keep the relative spacing of points instead of spacing them evenly
        #[arg(long)]
        irregular: bool,

        /// Mirror modifier axes, e.g. "x" or "x,z"
        #[arg(long, value_parser = parse_axes)]
        mirror_modifier: Option<MirrorAxes>,

        /// Mesh symmetry axes kept in sync while writing, e.g. "x"
        #[arg(long, value_parser = parse_axes)]
        symmetry: Option<MirrorAxes>,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SelectionArgs {
    /// Selected edges as vertex pairs, e.g. "0-1,1-2,2-3"
    #[arg(long, value_parser = parse_edges)]
    edges: Option<EdgeList>,

    /// Selected vertices, e.g. "0,1,2,3"; edges between them are selected too
    #[arg(long, value_delimiter = ',')]
    vertices: Option<Vec<usize>>,
}

/// Vertex pairs given on the command line.
#[derive(Clone, Debug)]
struct EdgeList(Vec<(usize, usize)>);

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum InputArg {
    /// Only the selected loops
    Selected,
    /// The selected loops and all loops parallel to them
    All,
}

impl From<InputArg> for InputMode {
    fn from(arg: InputArg) -> Self {
        match arg {
            InputArg::Selected => InputMode::Selected,
            InputArg::All => InputMode::All,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum InterpolationArg {
    /// Natural cubic spline
    Cubic,
    /// Piecewise linear
    Linear,
}

impl From<InterpolationArg> for Interpolation {
    fn from(arg: InterpolationArg) -> Self {
        match arg {
            InterpolationArg::Cubic => Interpolation::Cubic,
            InterpolationArg::Linear => Interpolation::Linear,
        }
    }
}

fn parse_edges(s: &str) -> Result<EdgeList, String> {
    s.split(',')
        .map(|pair| {
            let (a, b) = pair
                .split_once('-')
                .ok_or_else(|| format!("expected 'a-b', got '{}'", pair))?;
            let a = a.trim().parse::<usize>().map_err(|e| e.to_string())?;
            let b = b.trim().parse::<usize>().map_err(|e| e.to_string())?;
            Ok((a, b))
        })
        .collect::<Result<Vec<_>, String>>()
        .map(EdgeList)
}

fn parse_axes(s: &str) -> Result<MirrorAxes, String> {
    let mut axes = MirrorAxes::NONE;
    for axis in s.split(',') {
        match axis.trim().to_lowercase().as_str() {
            "x" => axes.x = true,
            "y" => axes.y = true,
            "z" => axes.z = true,
            other => return Err(format!("unknown axis '{}'", other)),
        }
    }
    Ok(axes)
}

fn parse_iterations(s: &str) -> Result<Iterations, String> {
    let n = s.parse::<usize>().map_err(|e| e.to_string())?;
    Iterations::try_from(n).map_err(|e| e.to_string())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Loops {
            input,
            selection,
            input_mode,
            mirror_modifier,
        } => {
            cmd_loops(&input, &selection, input_mode.into(), mirror_modifier)?;
        }

        Commands::Relax {
            input,
            output,
            selection,
            input_mode,
            interpolation,
            iterations,
            irregular,
            mirror_modifier,
            symmetry,
        } => {
            let options = RelaxOptions::default()
                .with_input(input_mode.into())
                .with_interpolation(interpolation.into())
                .with_iterations(iterations)
                .with_regular(!irregular);
            cmd_relax(&input, &output, &selection, &options, mirror_modifier, symmetry)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0)); // Highest percent seen so far

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        let percent = previous.max(raw_percent);
        if percent == previous && percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

/// Load a mesh, apply the selection, and wrap it in an object.
fn load_object(
    input: &PathBuf,
    selection: &SelectionArgs,
    mirror_modifier: Option<MirrorAxes>,
) -> Result<MeshObject, Box<dyn std::error::Error>> {
    let mut mesh: PolyMesh = io::load(input)?;
    println!(
        "Loaded: {} vertices, {} edges, {} faces",
        mesh.num_vertices(),
        mesh.num_edges(),
        mesh.num_faces()
    );

    mesh.deselect_all();
    if let Some(EdgeList(edges)) = &selection.edges {
        for &(a, b) in edges {
            let (va, vb) = (VertexId::new(a), VertexId::new(b));
            if a == b || !mesh.select_edge(EdgeKey::new(va, vb)) {
                return Err(MeshError::InvalidEdge { v0: a, v1: b }.into());
            }
        }
    }
    if let Some(vertices) = &selection.vertices {
        if let Some(&bad) = vertices.iter().find(|&&v| v >= mesh.num_vertices()) {
            return Err(MeshError::invalid_param("vertices", bad, "vertex index out of range").into());
        }
        mesh.select_vertices(vertices.iter().map(|&v| VertexId::new(v)));
    }

    let name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh")
        .to_string();
    let mut object = MeshObject::new(name, mesh);
    if let Some(axes) = mirror_modifier {
        let settings = MirrorModifier {
            axes,
            ..MirrorModifier::default()
        };
        object = object.with_modifier(Modifier::mirror("Mirror", settings));
    }
    Ok(object)
}

fn cmd_loops(
    input: &PathBuf,
    selection: &SelectionArgs,
    input_mode: InputMode,
    mirror_modifier: Option<MirrorAxes>,
) -> Result<(), Box<dyn std::error::Error>> {
    let object = load_object(input, selection, mirror_modifier)?;

    let derived = DerivedMesh::evaluate(&object.mesh, &object.modifiers)?;
    let working = derived.as_ref().map_or(&object.mesh, DerivedMesh::mesh);
    let entry = find_loops(&object.mesh, derived.as_ref(), input_mode);

    if entry.loops.is_empty() {
        println!("No usable loops");
        return Ok(());
    }

    println!("Loops: {}", entry.loops.len());
    for (i, lp) in entry.loops.iter().enumerate() {
        let points: Vec<_> = lp.vertices.iter().map(|&v| *working.position(v)).collect();
        let deviation = best_fit_plane(&points)
            .map(|plane| points.iter().map(|p| plane.distance(p)).fold(0.0, f64::max))
            .unwrap_or(0.0);
        let ids: Vec<String> = lp.vertices.iter().map(|v| v.index().to_string()).collect();

        println!(
            "  #{}: {} vertices, {}, max plane deviation {:.6}",
            i,
            lp.len(),
            if lp.circular { "circular" } else { "open" },
            deviation
        );
        println!("      [{}]", ids.join(" "));
    }

    Ok(())
}

fn cmd_relax(
    input: &PathBuf,
    output: &PathBuf,
    selection: &SelectionArgs,
    options: &RelaxOptions,
    mirror_modifier: Option<MirrorAxes>,
    symmetry: Option<MirrorAxes>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut object = load_object(input, selection, mirror_modifier)?;
    if let Some(axes) = symmetry {
        object = object.with_symmetry(axes);
    }

    println!(
        "Relaxing ({:?}, {} iteration(s), {})...",
        options.interpolation,
        options.iterations,
        if options.regular { "regular" } else { "irregular" }
    );

    let progress = create_progress();
    let mut cache = TopologyCache::new();

    let start = Instant::now();
    match relax_with_progress(&mut object, options, &mut cache, &progress) {
        Ok(summary) => {
            println!(
                "Result: {} loop(s), {} phase(s), {} vertices moved",
                summary.loops, summary.phases, summary.moved_vertices
            );
        }
        Err(MeshError::NoUsableLoops) => {
            log::warn!("no usable loops in selection; mesh left unchanged");
            eprintln!("Warning: no usable loops in selection; mesh left unchanged");
        }
        Err(e) => return Err(e.into()),
    }
    let elapsed = start.elapsed();

    io::save(&object.mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}
