use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use artifact_report::{ReportOptions, render_response_to_dir};

#[derive(Parser)]
#[command(name = "artifact-report")]
#[command(about = "Render an artifact analysis into a PDF report")]
#[command(version)]
struct Cli {
    /// Analysis record: plain JSON or the raw AI response containing it
    record: PathBuf,

    /// Photos of the artifact (up to four are used)
    images: Vec<PathBuf>,

    /// Directory the report is written into
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// TrueType font family to embed instead of Helvetica
    #[arg(long)]
    font: Option<String>,

    /// Document title printed in the header band
    #[arg(long)]
    title: Option<String>,

    /// Credit line printed at the bottom of the last page
    #[arg(long)]
    footer: Option<String>,
}

fn run(cli: Cli) -> Result<PathBuf, artifact_report::Error> {
    let response = std::fs::read_to_string(&cli.record)?;
    let images = cli
        .images
        .iter()
        .map(std::fs::read)
        .collect::<Result<Vec<_>, _>>()?;

    let mut options = ReportOptions::from_env();
    if cli.font.is_some() {
        options.font_family = cli.font;
    }
    if let Some(title) = cli.title {
        options.title = title;
    }
    if let Some(footer) = cli.footer {
        options.footer = footer;
    }

    render_response_to_dir(&response, &images, &options, &cli.output)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
