use clap::{Parser, Subcommand};
use projection::{Format, RasterFilter, Specification};

#[derive(Parser, Debug)]
#[command(name = "projection")]
#[command(about = "Image conversion pipeline", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a source image into one or more targets
    Convert(ConvertArgs),
    /// List registered type identifiers
    Types,
}

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Source as <type>:<location>
    #[arg(long)]
    pub source: Specification,

    /// Target as <type>:<location>[@WIDTHxHEIGHT]; repeat for several targets
    #[arg(long = "target", required = true)]
    pub targets: Vec<Specification>,

    /// Output format (defaults to the configured one)
    #[arg(long)]
    pub format: Option<Format>,

    /// Lossy quality, 1-100
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Lossless compression level, 0-9
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub compression: Option<u8>,

    /// Raster filter to apply (grayscale, fliph, flipv); repeatable
    #[arg(long = "filter")]
    pub filters: Vec<RasterFilter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert_args() {
        let cli = Cli::try_parse_from([
            "projection",
            "convert",
            "--source",
            "raster:in.png",
            "--target",
            "raster:a.jpg@32x32",
            "--target",
            "raster:b.png",
            "--format",
            "png",
            "--filter",
            "grayscale",
        ])
        .unwrap();

        let Commands::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.source.location(), "in.png");
        assert_eq!(args.targets.len(), 2);
        assert_eq!(args.format, Some(Format::Png));
        assert_eq!(args.filters, vec![RasterFilter::Grayscale]);
    }

    #[test]
    fn test_convert_requires_target() {
        let result = Cli::try_parse_from(["projection", "convert", "--source", "raw:in.bin"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_quality_range_enforced() {
        let result = Cli::try_parse_from([
            "projection",
            "convert",
            "--source",
            "raw:in.bin",
            "--target",
            "raw:out.bin",
            "--quality",
            "150",
        ]);
        assert!(result.is_err());
    }
}
