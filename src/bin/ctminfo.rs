//! `ctminfo` - inspect an OpenCTM mesh file: header fields, per-map
//! summaries, and basic structural verification.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::*;
use openctm::{codec, CompressionMethod, Mesh};

#[derive(Parser)]
#[command(name = "ctminfo")]
#[command(about = "OpenCTM mesh inspector", long_about = None)]
#[command(version)]
struct Cli {
    /// CTM file to inspect
    #[arg(value_name = "FILE")]
    file: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show mesh and header information (default)
    Info,

    /// Verify structural invariants hold for the decoded mesh
    Verify,

    /// Show a tree of maps and their sizes
    Tree,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let (method, mesh) = match load(&cli.file) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Info) | None => show_info(&cli.file, method, &mesh),
        Some(Commands::Verify) => verify(&mesh),
        Some(Commands::Tree) => show_tree(&mesh),
    }
}

fn load(path: &PathBuf) -> Result<(CompressionMethod, Mesh), String> {
    let file = File::open(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
    let mut reader = BufReader::new(file);
    codec::decode_mesh_with_method(&mut reader).map_err(|e| format!("decoding {}: {e}", path.display()))
}

fn method_name(method: CompressionMethod) -> &'static str {
    match method {
        CompressionMethod::Raw => "RAW",
        CompressionMethod::Mg1 => "MG1",
        CompressionMethod::Mg2 => "MG2",
    }
}

fn show_info(path: &PathBuf, method: CompressionMethod, mesh: &Mesh) {
    println!("{}", path.display().to_string().cyan().bold());
    println!("  {} {}", "method".cyan(), method_name(method).yellow().bold());
    println!(
        "  {} {}  {} {}",
        "vertices".cyan(),
        mesh.vertex_count().to_string().yellow(),
        "triangles".cyan(),
        mesh.triangle_count().to_string().yellow(),
    );
    println!("  {} {}", "normals".cyan(), if mesh.has_normals() { "yes".green() } else { "no".white() });
    println!("  {} {}", "uv maps".cyan(), mesh.tex_maps.len().to_string().yellow());
    println!("  {} {}", "attribute maps".cyan(), mesh.attrib_maps.len().to_string().yellow());
    if let Some(comment) = &mesh.comment {
        println!("  {} {}", "comment".cyan(), comment.white());
    }
}

fn verify(mesh: &Mesh) {
    match mesh.validate() {
        Ok(()) => println!("{}", "mesh is structurally valid".green().bold()),
        Err(e) => {
            println!("{} {e}", "invalid mesh:".red().bold());
            std::process::exit(1);
        }
    }
}

fn show_tree(mesh: &Mesh) {
    println!("{}", "mesh".cyan().bold());
    println!("├── vertices [{}]", mesh.vertex_count());
    println!("├── indices [{}]", mesh.triangle_count());
    if mesh.has_normals() {
        println!("├── normals [{}]", mesh.vertex_count());
    }
    for (i, map) in mesh.tex_maps.iter().enumerate() {
        let last = i + 1 == mesh.tex_maps.len() && mesh.attrib_maps.is_empty();
        println!("{} uv:{} [{}]", if last { "└──" } else { "├──" }, map.name.yellow(), map.coords.len());
    }
    for (i, map) in mesh.attrib_maps.iter().enumerate() {
        let last = i + 1 == mesh.attrib_maps.len();
        println!("{} attrib:{} [{}]", if last { "└──" } else { "├──" }, map.name.yellow(), map.values.len());
    }
}

