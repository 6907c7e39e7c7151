//! # qrdeck CLI
//!
//! Command-line front end for building, rendering, scanning and composing QR
//! codes.
//!
//! ## Usage
//!
//! ```bash
//! # Print a Wi-Fi payload
//! qrdeck payload wifi -f ssid=Home -f password=secret
//!
//! # Render a vCard to qrcode.svg / qrcode.png in ./out
//! qrdeck render vcard -f name="Ada Lovelace" -f tel=+44123 --ecc Q --out-dir out
//!
//! # Decode a QR image, or keep watching it for changes
//! qrdeck scan photo.png
//! qrdeck scan --watch frame.png
//! qrdeck scan --copy photo.png
//!
//! # One QR per line of links.txt ("label,value" or just "value")
//! qrdeck batch links.txt --cols 3
//!
//! # Merge 2-4 QR images into one labelled grid
//! qrdeck merge pay.png wifi.png --label Tips --label Wi-Fi
//!
//! # HTTP API
//! qrdeck serve --listen 127.0.0.1:8080
//! ```
//!
//! Set `RUST_LOG=debug` for detailed logs.

use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use qrdeck::{
    QrDeckError, Session,
    compose::{BatchOptions, build_batch},
    export::{self, CommandClipboard, DirectorySaver, FileSaver},
    payload::{FieldMap, SchemeKind, looks_like_url},
    render::{ErrorLevel, HexColor, Logo, RenderOptions, engine::QrcodeEngine},
    scan::{self, FileCamera, RqrrScanner, ScanAdapter, ScanEvent},
    server::{self, ServerConfig},
};

/// qrdeck - QR payload builder, renderer, scanner and grid composer
#[derive(Parser, Debug)]
#[command(name = "qrdeck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct FieldArgs {
    /// Form field as key=value (repeatable)
    #[arg(short = 'f', long = "field", value_name = "KEY=VALUE")]
    fields: Vec<String>,
}

impl FieldArgs {
    fn to_map(&self) -> Result<FieldMap, QrDeckError> {
        FieldMap::from_pairs(&self.fields)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the payload string for a scheme
    Payload {
        /// text, wifi, tel, email, sms, geo or vcard
        kind: String,

        #[command(flatten)]
        fields: FieldArgs,

        /// Also copy the payload to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Render a QR code to SVG and PNG
    Render {
        /// text, wifi, tel, email, sms, geo or vcard
        #[arg(default_value = "text")]
        kind: String,

        #[command(flatten)]
        fields: FieldArgs,

        /// Encode this text instead of the payload built from fields
        #[arg(long)]
        payload: Option<String>,

        /// Error correction level (L, M, Q, H)
        #[arg(long, default_value = "M")]
        ecc: String,

        /// QR version 1-40, 0 for automatic
        #[arg(long, default_value_t = 0)]
        version: u8,

        /// Raster pixels per module (2-40)
        #[arg(long, default_value_t = 10)]
        scale: u32,

        /// Quiet zone in modules (0-12)
        #[arg(long, default_value_t = 4)]
        quiet: u32,

        /// Module color
        #[arg(long, default_value = "#0b1220")]
        fg: String,

        /// Background color
        #[arg(long, default_value = "#ffffff")]
        bg: String,

        /// Center logo image (PNG output only)
        #[arg(long, value_name = "FILE")]
        logo: Option<PathBuf>,

        /// Logo width as a fraction of the image (0-0.35)
        #[arg(long, default_value_t = 0.2)]
        logo_ratio: f32,

        /// Draw a white rounded pad behind the logo
        #[arg(long)]
        logo_backdrop: bool,

        /// Directory for qrcode.svg / qrcode.png
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Only write the SVG
        #[arg(long, conflicts_with = "png_only")]
        svg_only: bool,

        /// Only write the PNG
        #[arg(long)]
        png_only: bool,
    },

    /// Decode a QR code from an image
    Scan {
        image: PathBuf,

        /// Keep polling the file until Ctrl-C, printing each new result
        #[arg(long)]
        watch: bool,

        /// Poll interval for --watch, in milliseconds
        #[arg(long, default_value_t = 120)]
        interval_ms: u64,

        /// Copy the decoded text to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Render one QR per input line onto a sheet
    Batch {
        /// Input file, or - for stdin
        input: String,

        #[arg(long, default_value = "M")]
        ecc: String,

        #[arg(long, default_value_t = 4)]
        quiet: u32,

        /// Grid columns (2-8)
        #[arg(long, default_value_t = 4)]
        cols: u32,

        /// Pixels per module (2-20)
        #[arg(long, default_value_t = 6)]
        cell: u32,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Merge 2-4 QR images into one labelled grid
    Merge {
        #[arg(required = true, num_args = 1..)]
        images: Vec<PathBuf>,

        /// Label for the image at the same position (repeatable)
        #[arg(long = "label")]
        labels: Vec<String>,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Start the HTTP API server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), QrDeckError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Payload { kind, fields, copy } => {
            let kind: SchemeKind = kind.parse().map_err(QrDeckError::InvalidInput)?;
            let mut session = Session::default();
            session.generator.kind = kind;
            session.generator.fields = fields.to_map()?;

            let payload = session.generator.payload();
            println!("{}", payload);
            if copy {
                session.copy_payload(&CommandClipboard::default())?;
                eprintln!("Copied to clipboard.");
            }
            Ok(())
        }

        Commands::Render {
            kind,
            fields,
            payload,
            ecc,
            version,
            scale,
            quiet,
            fg,
            bg,
            logo,
            logo_ratio,
            logo_backdrop,
            out_dir,
            svg_only,
            png_only,
        } => {
            let mut session = Session::new(Arc::new(QrcodeEngine));
            session.generator.kind = kind.parse().map_err(QrDeckError::InvalidInput)?;
            session.generator.fields = fields.to_map()?;
            session.generator.payload_override = payload;
            session.generator.options = RenderOptions {
                ecc: ecc.parse().unwrap_or_default(),
                version,
                scale,
                quiet_zone: quiet,
                foreground: HexColor::parse_or(&fg, HexColor::INK),
                background: HexColor::parse_or(&bg, HexColor::WHITE),
                ..Default::default()
            };

            if let Some(path) = logo {
                let image = image::open(&path)
                    .map_err(|e| QrDeckError::Image(format!("{}: {}", path.display(), e)))?;
                session.set_logo(Some(Logo {
                    image: Arc::new(image),
                    ratio: logo_ratio,
                    white_backdrop: logo_backdrop,
                }));
            }

            let Some(preview) = session.regenerate()? else {
                return Err(QrDeckError::EmptyPayload(
                    "enter content to generate a QR code".to_string(),
                ));
            };
            println!("{}", preview.meta);
            if preview.looks_like_url {
                eprintln!("Payload is a link.");
            }

            let saver = DirectorySaver::new(out_dir);
            if !png_only {
                println!("Wrote {}", session.export_svg(&saver)?);
            }
            if !svg_only {
                println!("Wrote {}", session.export_png(&saver)?);
            }
            Ok(())
        }

        Commands::Scan {
            image,
            watch,
            interval_ms,
            copy,
        } => {
            let runtime = tokio::runtime::Runtime::new()?;
            if watch {
                runtime.block_on(watch_file(image, interval_ms, copy))
            } else {
                let frame = image::open(&image)
                    .map_err(|e| QrDeckError::Image(format!("{}: {}", image.display(), e)))?;
                let text = runtime.block_on(scan::decode_image(&RqrrScanner, &frame))?;
                println!("{}", text);
                if looks_like_url(&text) {
                    eprintln!("Result is a link.");
                }
                if copy {
                    let mut session = Session::default();
                    session.last_scan = Some(text);
                    session.copy_scan(&CommandClipboard::default())?;
                    eprintln!("Copied to clipboard.");
                }
                Ok(())
            }
        }

        Commands::Batch {
            input,
            ecc,
            quiet,
            cols,
            cell,
            out_dir,
        } => {
            let text = if input == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                std::fs::read_to_string(&input)?
            };

            let options = BatchOptions {
                ecc: ecc.parse::<ErrorLevel>().unwrap_or_default(),
                quiet_zone: quiet,
                columns: cols,
                cell,
            };
            let sheet = build_batch(&QrcodeEngine, &text, &options)?;
            println!("{}", sheet.meta);

            let saver = DirectorySaver::new(out_dir);
            let svg = saver.save(export::BATCH_SVG_FILENAME, export::SVG_MIME, sheet.svg.as_bytes())?;
            let png = saver.save(export::BATCH_PNG_FILENAME, export::PNG_MIME, &sheet.png()?)?;
            println!("Wrote {}", svg);
            println!("Wrote {}", png);
            Ok(())
        }

        Commands::Merge {
            images,
            labels,
            out_dir,
        } => {
            let mut session = Session::default();
            for (index, path) in images.iter().enumerate() {
                let bytes = std::fs::read(path)?;
                let label = labels.get(index).cloned().unwrap_or_default();
                session.merge.add_encoded(&bytes, label).map_err(|e| match e {
                    QrDeckError::Image(msg) => QrDeckError::Image(format!("{}: {}", path.display(), msg)),
                    other => other,
                })?;
            }

            for location in session.export_merged(&DirectorySaver::new(out_dir))? {
                println!("Wrote {}", location);
            }
            Ok(())
        }

        Commands::Serve { listen } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(ServerConfig { listen_addr: listen }))
        }
    }
}

/// Scan a file continuously until Ctrl-C, printing each new value once.
async fn watch_file(path: PathBuf, interval_ms: u64, copy: bool) -> Result<(), QrDeckError> {
    let adapter = ScanAdapter::new(Arc::new(RqrrScanner), Arc::new(FileCamera::new(path)))
        .with_interval(std::time::Duration::from_millis(interval_ms));
    let mut events = adapter.subscribe();
    adapter.start().await?;
    eprintln!("Scanning, press Ctrl-C to stop.");

    let clipboard = CommandClipboard::default();
    let mut session = Session::default();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(ScanEvent::Decoded(text)) => {
                    if session.last_scan.as_deref() != Some(text.as_str()) {
                        println!("{}", text);
                        session.last_scan = Some(text);
                        if copy {
                            if let Err(e) = session.copy_scan(&clipboard) {
                                log::warn!("copy failed: {}", e);
                            }
                        }
                    }
                }
                Ok(ScanEvent::Failed(msg)) => log::debug!("poll failed: {}", msg),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    adapter.stop().await;
    Ok(())
}
