use clap::{Parser, ValueEnum};
use docxside_restyle::{Config, Error, FailurePolicy, RunStyle};
use std::io;
use std::path::PathBuf;

#[derive(Clone, Copy, ValueEnum)]
enum OnMissingCode {
    /// Stop the batch at the first document without a code
    Abort,
    /// Leave the document and continue with the next one
    Skip,
}

#[derive(Parser)]
#[command(
    name = "docxside-restyle",
    about = "Restyle transcript DOCX files in place and export them to PDF"
)]
struct Args {
    /// Folder with the DOCX files to edit (files are overwritten)
    input_folder: PathBuf,
    /// Logo image inserted at the top of every document
    #[arg(long)]
    logo: PathBuf,
    /// Font for the speaker code and "Transcript" heading
    #[arg(long, default_value = "Arial")]
    font: String,
    /// Font size in points
    #[arg(long, default_value_t = 12.0, value_parser = positive)]
    font_size: f32,
    /// Logo width in inches
    #[arg(long, default_value_t = 6.5, value_parser = positive)]
    logo_width: f32,
    /// Office suite binary used for PDF export (defaults to LibreOffice)
    #[arg(long)]
    converter: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OnMissingCode::Abort)]
    on_missing_code: OnMissingCode,
}

fn positive(value: &str) -> Result<f32, String> {
    let number: f32 = value.parse().map_err(|_| format!("`{value}` is not a number"))?;
    if number.is_finite() && number > 0.0 {
        Ok(number)
    } else {
        Err(format!("`{value}` must be greater than zero"))
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    if !args.input_folder.is_dir() {
        eprintln!("Error: not a folder: {}", args.input_folder.display());
        std::process::exit(1);
    }

    let mut config = Config::new(args.input_folder, args.logo);
    config.heading_style = RunStyle {
        font_name: args.font,
        font_size: args.font_size,
        bold: true,
    };
    config.logo_width_inches = args.logo_width;
    if let Some(converter) = args.converter {
        config.converter = converter;
    }
    config.on_missing_code = match args.on_missing_code {
        OnMissingCode::Abort => FailurePolicy::Abort,
        OnMissingCode::Skip => FailurePolicy::Skip,
    };

    match docxside_restyle::confirm_overwrite(io::stdin().lock(), io::stdout()) {
        Ok(true) => {}
        Ok(false) => {
            println!("Nothing was changed.");
            return;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    println!("Beginning docx editing. This may take a while. Do not exit.");
    match docxside_restyle::run_batch(&config) {
        Ok(report) => {
            for path in &report.skipped {
                println!("Please add a speaker/file code for {}", path.display());
            }
            if !report.export_failures.is_empty() {
                eprintln!(
                    "Warning: {} document(s) could not be exported to PDF",
                    report.export_failures.len()
                );
            }
            println!("All documents in the folder have been edited");
        }
        Err(Error::MissingSpeakerCode(path)) => {
            println!("Please add a speaker/file code for {}", path.display());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let base = ["docxside-restyle", "transcripts", "--logo", "logo.png"];
        Args::try_parse_from(base.iter().chain(extra))
    }

    #[test]
    fn sizes_default_to_house_style() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.font_size, 12.0);
        assert_eq!(args.logo_width, 6.5);
    }

    #[test]
    fn fractional_sizes_are_accepted() {
        let args = parse(&["--font-size", "10.5", "--logo-width", "2"]).unwrap();
        assert_eq!(args.font_size, 10.5);
        assert_eq!(args.logo_width, 2.0);
    }

    #[test]
    fn non_positive_sizes_are_rejected() {
        for bad in ["0", "-3", "NaN", "inf", "big"] {
            assert!(parse(&["--font-size", bad]).is_err(), "font size {bad}");
            assert!(parse(&["--logo-width", bad]).is_err(), "logo width {bad}");
        }
    }
}
