//! Command-line front end (spec.md §6.4): an external collaborator with
//! a narrow interface onto [hprof_redact::pipeline].

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use hprof_redact::error::{HprofRedactError, Result};
use hprof_redact::gzip::{self, OutputTarget};
use hprof_redact::pipeline::{HprofFilter, PathSource};
use hprof_redact::policies::{DropStrings, Zero, ZeroStringsLengthPreserving};
use hprof_redact::transform::Transformer;
use hprof_redact::verbose::StdoutVerboseSink;

#[derive(Parser)]
#[command(name = "hprof-redact", about = "Streaming redactor for JVM hprof heap dumps")]
struct Cli {
    /// HPROF input file, optionally gzip-compressed. Stdin is not
    /// supported because the filter needs two passes over the input.
    #[arg(short, long)]
    input: PathBuf,

    /// HPROF output file, or "-" for standard output. Gzip-wrapped when
    /// the name ends in ".gz".
    #[arg(short, long)]
    output: String,

    /// Replacement policy applied to symbols and values.
    #[arg(short, long, value_enum, default_value_t = TransformerName::Zero, ignore_case = true)]
    transformer: TransformerName,

    /// Emit one line per changed symbol to stdout.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum TransformerName {
    Zero,
    #[value(alias = "zero_strings")]
    ZeroStrings,
    #[value(alias = "drop_strings")]
    DropStrings,
}

impl TransformerName {
    fn build(self) -> Box<dyn Transformer> {
        match self {
            TransformerName::Zero => Box::new(Zero),
            TransformerName::ZeroStrings => Box::new(ZeroStringsLengthPreserving),
            TransformerName::DropStrings => Box::new(DropStrings),
        }
    }
}

fn output_target(raw: &str) -> OutputTarget {
    if raw == "-" {
        OutputTarget::Stdout
    } else {
        OutputTarget::Path(PathBuf::from(raw))
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.input.as_os_str() == "-" {
        return Err(HprofRedactError::NotReopenable);
    }

    let source = PathSource::new(cli.input);
    let target = output_target(&cli.output);
    let transformer = cli.transformer.build();
    let mut output = gzip::open_output(&target)?;

    if cli.verbose {
        let mut sink = StdoutVerboseSink;
        let mut filter = HprofFilter::new(transformer.as_ref()).with_verbose_sink(&mut sink);
        filter.filter(&source, &mut output)
    } else {
        let mut filter = HprofFilter::new(transformer.as_ref());
        filter.filter(&source, &mut output)
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("hprof-redact: {err}");
            ExitCode::FAILURE
        }
    }
}
