//! # Carnet CLI
//!
//! Command-line interface for the ID-card designer.
//!
//! ## Usage
//!
//! ```bash
//! # Run the designer API
//! carnet serve --listen 0.0.0.0:8080 --roster-file roster.json
//!
//! # Export a school's cards as PDF into ./out
//! carnet export --school s1 --design design.json --out out
//!
//! # Render the card preview and a page preview
//! carnet preview --design design.json card.png
//! carnet preview --layout --grid layout.png
//!
//! # Start a design file from the built-in design
//! carnet design > design.json
//! carnet sheet --orientation landscape --cards-per-page 9 sheet.png
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use carnet::{
    CarnetError,
    config::{RosterSource, ServerConfig, load_design, load_fonts},
    export::{DirectorySink, DownloadSink, ExportError, ExportFormat, ExportSettings, Exporter},
    layout::{Orientation, PageGeometry, render_sheet},
    qr::ModuleQr,
    render::{CardRenderer, DEFAULT_LOAD_TIMEOUT, ImageLoader},
};

/// Carnet - Student ID-card designer and exporter
#[derive(Parser, Debug)]
#[command(name = "carnet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Design and font inputs shared by every command.
#[derive(Args, Debug)]
struct DesignArgs {
    /// Card design JSON (defaults to the built-in design)
    #[arg(long, value_name = "FILE")]
    design: Option<PathBuf>,

    /// Directory of TrueType/OpenType faces
    #[arg(long, env = "CARNET_FONT_DIR", value_name = "DIR")]
    font_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RosterArgs {
    /// JSON file with an array of students
    #[arg(long, env = "CARNET_ROSTER_FILE", value_name = "FILE")]
    roster_file: Option<PathBuf>,

    /// Base URL of the records service
    #[arg(long, env = "CARNET_ROSTER_URL")]
    roster_url: Option<String>,

    /// API key of the records service
    #[arg(long, env = "CARNET_ROSTER_KEY", hide_env_values = true)]
    roster_key: Option<String>,
}

impl RosterArgs {
    fn source(self) -> Result<RosterSource, CarnetError> {
        RosterSource::from_options(self.roster_file, self.roster_url, self.roster_key)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP designer API
    Serve {
        /// Address to listen on
        #[arg(long, env = "CARNET_LISTEN", default_value = "127.0.0.1:8080")]
        listen: String,

        #[command(flatten)]
        design: DesignArgs,

        #[command(flatten)]
        roster: RosterArgs,
    },

    /// Export a school's cards
    Export {
        /// School whose roster is exported
        #[arg(long)]
        school: String,

        #[arg(long, value_enum, default_value = "pdf")]
        format: ExportFormat,

        #[arg(long, value_enum, default_value = "portrait")]
        orientation: Orientation,

        /// Requested cards per page (clamped to what fits)
        #[arg(long, default_value = "4")]
        cards_per_page: usize,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,

        #[command(flatten)]
        design: DesignArgs,

        #[command(flatten)]
        roster: RosterArgs,
    },

    /// Render the card preview to PNG
    Preview {
        /// Output PNG file
        output: PathBuf,

        /// Tint and outline element boxes
        #[arg(long)]
        layout: bool,

        /// Draw the alignment grid (with --layout)
        #[arg(long, requires = "layout")]
        grid: bool,

        #[command(flatten)]
        design: DesignArgs,
    },

    /// Print the design as JSON, validated, as a starting point for edits
    Design {
        #[command(flatten)]
        design: DesignArgs,
    },

    /// Render a page preview to PNG
    Sheet {
        /// Output PNG file
        output: PathBuf,

        #[arg(long, value_enum, default_value = "portrait")]
        orientation: Orientation,

        #[arg(long, default_value = "4")]
        cards_per_page: usize,

        #[command(flatten)]
        design: DesignArgs,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Carnet(#[from] CarnetError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("carnet=info,tower_http=info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn renderer(design: &DesignArgs) -> Result<CardRenderer, CarnetError> {
    let fonts = load_fonts(design.font_dir.as_deref())?;
    let images = ImageLoader::new(DEFAULT_LOAD_TIMEOUT)?;
    Ok(CardRenderer::new(Arc::new(fonts), Arc::new(images)))
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            listen,
            design,
            roster,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                roster: roster.source()?,
                font_dir: design.font_dir,
                design_path: design.design,
                ..Default::default()
            };
            carnet::server::serve(config).await?;
        }

        Commands::Export {
            school,
            format,
            orientation,
            cards_per_page,
            out,
            design,
            roster,
        } => {
            let config = Arc::new(load_design(design.design.as_deref())?);
            let exporter = Exporter::new(
                renderer(&design)?,
                Arc::new(ModuleQr::default()),
                roster.source()?.build(DEFAULT_LOAD_TIMEOUT)?,
            );

            let mut settings = ExportSettings {
                format,
                ..Default::default()
            };
            settings.set_orientation(orientation);
            settings.set_cards_per_page(cards_per_page);

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            let artifact = exporter
                .export(&settings.job(), config, &school, cancel)
                .await?;
            let sink = DirectorySink::new(out);
            sink.deliver(&artifact).await?;
            println!(
                "Wrote {} ({} pages)",
                sink.path_for(&artifact).display(),
                artifact.pages
            );
        }

        Commands::Preview {
            output,
            layout,
            grid,
            design,
        } => {
            let config = load_design(design.design.as_deref())?;
            let renderer = renderer(&design)?;
            let qr = ModuleQr::default();
            let surface = if layout {
                renderer.render_layout_preview(&config, &qr, grid).await?
            } else {
                renderer.render_preview(&config, &qr).await?
            };
            std::fs::write(&output, surface.encode_png()?).map_err(CarnetError::from)?;
            println!("Wrote {}", output.display());
        }

        Commands::Design { design } => {
            let config = load_design(design.design.as_deref())?;
            println!("{}", config.to_json_pretty()?);
        }

        Commands::Sheet {
            output,
            orientation,
            cards_per_page,
            design,
        } => {
            let config = load_design(design.design.as_deref())?;
            let card = renderer(&design)?
                .render_preview(&config, &ModuleQr::default())
                .await?;
            let packing = PageGeometry::a4(orientation).pack(cards_per_page);
            let sheet = render_sheet(&packing, card.image());
            std::fs::write(&output, sheet.encode_png()?).map_err(CarnetError::from)?;
            println!(
                "Wrote {} ({} cards per page)",
                output.display(),
                packing.per_page
            );
        }
    }

    Ok(())
}
