/// dmstools: plots and annotation layout for deep-mutational-scanning data
///
/// This is the entry point for the dmstools CLI. It parses the
/// subcommand and hands the remaining arguments to the matching tool,
/// which runs in-process:
///
/// - dms-logo: per-codon logo plots with region bands, plus coverage
/// - dms-annot: region layout over paginated codon rows, as JSON
///
/// To get help on the subcommands, you can run:
///
/// ```shell
/// dmstools dms-logo -- --help
/// ```
///
use clap::{Args, Parser, Subcommand};
use dmstools::{lib, Tool};
use log::{error, info, Level};
use simple_logger::init_with_level;

#[derive(Parser)]
#[command(name = "dmstools")]
#[command(about = "dmstools: plots and annotation layout for deep-mutational-scanning data")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "dms-logo")]
    Logo(ToolArgs),
    #[command(name = "dms-annot")]
    Annot(ToolArgs),
}

#[derive(Args)]
struct ToolArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();
    let cli = Cli::parse();

    init();

    let (tool, args) = match cli.command {
        Commands::Logo(args) => (Tool::Logo, args.args),
        Commands::Annot(args) => (Tool::Annot, args.args),
    };

    lib(tool, args).unwrap_or_else(|e| {
        error!("{:?}", e);
        std::process::exit(1);
    });

    info!("Elapsed time: {:.3?}", start.elapsed());
}

fn init() {
    let message = format!(
        r#"

        dmstools: plots and annotation layout for deep-mutational-scanning data

        - dms-logo
        - dms-annot

        > version: {}

        * to get help on the subcommands, run:
            dmstools <SUBCOMMAND> -- --help

        "#,
        config::VERSION
    );

    println!("{}", message);
}
