use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inkmark_annot::{Annotation, AnnotationStore, PageNumber};
use inkmark_pdf::{export_document, export_file_name, LopdfRasterizer, PageRasterizer};
use inkmark_render::Renderer;
use inkmark_view::CancellationToken;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "inkmark")]
#[command(about = "Inkmark PDF markup CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Bake an annotation sidecar into a new PDF.
    Annotate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// JSON file mapping page numbers to annotation lists.
        #[arg(long, value_name = "JSON")]
        annotations: PathBuf,
        /// Output path; defaults to edited_<name>.pdf next to the input.
        #[arg(long)]
        output: Option<PathBuf>,
        /// TTF font used to render text annotations.
        #[arg(long)]
        font: Option<PathBuf>,
        /// Raster oversampling factor for page images.
        #[arg(long, default_value_t = 2.0)]
        scale: f32,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    first_page_size_pt: PageSizeOutput,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Annotate { file, annotations, output, font, scale } => {
            run_annotate(&file, &annotations, output.as_deref(), font.as_deref(), scale)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_info(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    let rasterizer = LopdfRasterizer::from_file(file).context("failed to open PDF")?;
    let first = rasterizer.page_size(1)?;

    let payload = InfoOutput {
        path: file.display().to_string(),
        page_count: rasterizer.page_count(),
        first_page_size_pt: PageSizeOutput { width: first.width_pt, height: first.height_pt },
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    Ok(())
}

fn run_annotate(
    file: &Path,
    annotations: &Path,
    output: Option<&Path>,
    font: Option<&Path>,
    scale: f32,
) -> Result<()> {
    ensure_pdf_exists(file)?;

    if !(0.1..=8.0).contains(&scale) {
        anyhow::bail!("--scale must be between 0.1 and 8.0");
    }

    let rasterizer = LopdfRasterizer::from_file(file).context("failed to open PDF")?;
    let store = load_sidecar(annotations)?;

    let renderer = match font {
        Some(path) => {
            let data = fs::read(path)
                .with_context(|| format!("failed to read font {}", path.display()))?;
            Renderer::with_font(data).context("failed to parse font")?
        }
        None => Renderer::new(),
    };

    let bytes = export_document(&rasterizer, &store, &renderer, scale, &CancellationToken::new())
        .context("export failed")?;

    let output = output
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| file.with_file_name(export_file_name(file)));

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&output, bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("{}", output.display());

    Ok(())
}

/// Parse a `{ "<page>": [annotation, ...] }` sidecar into a store.
fn load_sidecar(path: &Path) -> Result<AnnotationStore> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read annotations {}", path.display()))?;
    let pages: BTreeMap<PageNumber, Vec<Annotation>> =
        serde_json::from_str(&data).context("invalid annotation JSON")?;

    let mut store = AnnotationStore::new();
    for (page, annotations) in pages {
        if page == 0 {
            anyhow::bail!("annotation pages are 1-based, got page 0");
        }
        for annotation in annotations {
            store.append(page, annotation);
        }
    }
    Ok(store)
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
