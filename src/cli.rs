use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "scan-measure",
    version,
    about = "Run a 3-D body scan through the registered measurement models"
)]
pub struct Cli {
    /// Path to a scan directory (.../<qrcode>/<category>/<timestamp>)
    pub scan_dir: PathBuf,

    #[arg(long, help = "Path to the model registry document (JSON)")]
    pub registry: Option<PathBuf>,

    #[arg(long, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Emit single-line JSON instead of pretty-printed")]
    pub compact: bool,
}
