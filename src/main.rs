//! # Pixxel CLI
//!
//! Command-line entry point for the editing service.
//!
//! ## Usage
//!
//! ```bash
//! # Run the HTTP service
//! pixxel serve --listen 0.0.0.0:8080 --token secret=Ada:ada@example.com
//!
//! # Keep projects across restarts
//! pixxel serve --data-file pixxel.json --media-dir ./media
//!
//! # Render a saved scene blob to an image
//! pixxel export scene.json --width 1200 --height 600 --format jpeg out.jpg
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

use pixxel::{
    GraphicsSurface, PixxelError,
    config::{
        DEFAULT_STOCK_API_URL, DEFAULT_TRANSFORM_HOST, EditorConfig, ServerConfig,
        StockPhotoConfig, TokenGrant,
    },
    geometry::{Size, ViewportFit},
    logging,
    remote::HttpImageSource,
    render::ExportFormat,
    server, store, surface,
};

/// Pixxel - image editing service
#[derive(Parser, Debug)]
#[command(name = "pixxel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to listen on
        #[arg(long, env = "PIXXEL_LISTEN", default_value = "0.0.0.0:8080")]
        listen: String,

        /// Base URL clients reach this server at
        #[arg(long, env = "PIXXEL_PUBLIC_URL", default_value = "http://localhost:8080")]
        public_url: String,

        /// Directory for uploaded images
        #[arg(long, env = "PIXXEL_MEDIA_DIR", default_value = "media")]
        media_dir: PathBuf,

        /// JSON file mirroring the project store
        #[arg(long, env = "PIXXEL_DATA_FILE")]
        data_file: Option<PathBuf>,

        /// Accepted bearer token as token=name[:email] (repeatable)
        #[arg(
            long = "token",
            env = "PIXXEL_TOKENS",
            value_delimiter = ',',
            value_parser = TokenGrant::parse
        )]
        tokens: Vec<TokenGrant>,

        /// Host whose URLs accept transformation directives
        #[arg(long, env = "PIXXEL_TRANSFORM_HOST", default_value = DEFAULT_TRANSFORM_HOST)]
        transform_host: String,

        /// Stock-photo API base URL
        #[arg(long, env = "PIXXEL_STOCK_API_URL", default_value = DEFAULT_STOCK_API_URL)]
        stock_api_url: String,

        /// Stock-photo access key (search is disabled without one)
        #[arg(long, env = "UNSPLASH_ACCESS_KEY")]
        stock_access_key: Option<String>,

        /// Autosave debounce in milliseconds
        #[arg(long, env = "PIXXEL_AUTOSAVE_MS", default_value = "2000")]
        autosave_ms: u64,
    },

    /// Render a scene blob to an image file
    Export {
        /// Scene JSON file
        scene: PathBuf,

        /// Output file
        output: PathBuf,

        /// Canvas width in logical pixels
        #[arg(long)]
        width: u32,

        /// Canvas height in logical pixels
        #[arg(long)]
        height: u32,

        /// png, jpeg, jpeg80 or webp
        #[arg(long, default_value = "png")]
        format: String,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), PixxelError> {
    let cli = Cli::parse();
    logging::init_logging();
    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Serve {
            listen,
            public_url,
            media_dir,
            data_file,
            tokens,
            transform_host,
            stock_api_url,
            stock_access_key,
            autosave_ms,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                public_url,
                media_dir,
                data_file,
                tokens,
                editor: EditorConfig {
                    autosave_debounce: Duration::from_millis(autosave_ms),
                    transform_host,
                },
                stock: StockPhotoConfig {
                    api_url: stock_api_url,
                    access_key: stock_access_key.filter(|k| !k.is_empty()),
                },
            };
            runtime.block_on(server::serve(config))
        }
        Commands::Export {
            scene,
            output,
            width,
            height,
            format,
        } => {
            let format = ExportFormat::from_name(&format).ok_or_else(|| {
                PixxelError::Validation(format!(
                    "unknown format '{}'. Use one of: {}",
                    format,
                    ExportFormat::ALL.map(|f| f.name()).join(", ")
                ))
            })?;
            store::check_dimension("width", width)?;
            store::check_dimension("height", height)?;
            let logical = Size::new(width as f64, height as f64);
            runtime.block_on(export_scene(&scene, &output, logical, format))
        }
    }
}

async fn export_scene(
    scene: &Path,
    output: &Path,
    logical: Size,
    format: ExportFormat,
) -> Result<(), PixxelError> {
    let blob: serde_json::Value = serde_json::from_slice(&tokio::fs::read(scene).await?)?;
    let images = HttpImageSource::with_default_client()?;
    let (scene, elements) = surface::load_scene(&blob, &images).await?;

    let mut canvas = GraphicsSurface::new(logical, ViewportFit::compute(logical, logical));
    canvas.install_scene(scene, elements);
    let bytes = canvas.export(format)?;
    tokio::fs::write(output, &bytes).await?;

    println!(
        "Wrote {} ({}x{}, {} bytes)",
        output.display(),
        logical.width,
        logical.height,
        bytes.len()
    );
    Ok(())
}
