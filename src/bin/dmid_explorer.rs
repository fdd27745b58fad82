use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use dmid_explorer::app::App;
use dmid_explorer::config::ConfigLoader;
use dmid_explorer::domain::StudyId;
use dmid_explorer::error::ExplorerError;
use dmid_explorer::navigation::Navigator;
use dmid_explorer::output::{JsonOutput, OutputMode, RecordSummary};
use dmid_explorer::staging::StagedRecord;
use dmid_explorer::tui::Tui;

#[derive(Parser)]
#[command(name = "dmid-explorer")]
#[command(about = "Browse DMID mammography studies: rasters, masks, metadata and reports")]
#[command(version, author)]
struct Cli {
    /// Dataset root directory (overrides the config file)
    #[arg(long, global = true)]
    root: Option<String>,

    /// JSON config file (defaults to ./dmid-explorer.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Open the terminal browser")]
    Browse(BrowseArgs),
    #[command(about = "List cataloged studies and which assets exist")]
    List,
    #[command(about = "Print one assembled record as JSON")]
    Show(ShowArgs),
}

#[derive(Args, Default)]
struct BrowseArgs {
    #[arg(long, conflicts_with = "study")]
    start: Option<usize>,

    #[arg(long)]
    study: Option<String>,
}

#[derive(Args)]
struct ShowArgs {
    #[arg(required_unless_present = "study", conflicts_with = "study")]
    index: Option<usize>,

    #[arg(long)]
    study: Option<String>,

    /// Write the images as PNG files and keep them until Enter is pressed
    #[arg(long)]
    stage: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<ExplorerError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ExplorerError) -> u8 {
    if error.is_startup() { 2 } else { 1 }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?.with_root(cli.root.as_deref());
    let app = App::open(&config)?;

    match cli.command {
        Some(Commands::Browse(args)) => run_browse(&app, args, output_mode),
        Some(Commands::List) => run_list(&app),
        Some(Commands::Show(args)) => run_show(&app, args),
        None => match output_mode {
            OutputMode::Interactive => run_browse(&app, BrowseArgs::default(), output_mode),
            OutputMode::NonInteractive => Err(miette::Report::msg(
                "command required (try `dmid-explorer --help`)",
            )),
        },
    }
}

fn run_browse(app: &App, args: BrowseArgs, output_mode: OutputMode) -> miette::Result<()> {
    if matches!(output_mode, OutputMode::NonInteractive) {
        return Err(miette::Report::msg(
            "browse needs a terminal; use `list` or `show` with --non-interactive",
        ));
    }

    let start = match args.study {
        Some(study) => {
            let study = study.parse::<StudyId>()?;
            app.catalog()
                .position_of(study)
                .ok_or_else(|| ExplorerError::StudyNotCataloged(study.to_string()))?
        }
        None => args.start.unwrap_or(0),
    };

    let mut tui = Tui::new(app, start)?;
    tui.run()?;
    Ok(())
}

fn run_list(app: &App) -> miette::Result<()> {
    JsonOutput::print_list(&app.list()).into_diagnostic()
}

fn run_show(app: &App, args: ShowArgs) -> miette::Result<()> {
    let mut navigator = Navigator::new(app);
    let record = match (args.study, args.index) {
        (Some(study), _) => navigator.go_to_study(study.parse::<StudyId>()?, &JsonOutput)?,
        (None, Some(index)) => {
            if index >= app.study_count() {
                return Err(ExplorerError::IndexOutOfRange {
                    index,
                    count: app.study_count(),
                }
                .into());
            }
            navigator.go_to(index, &JsonOutput)?
        }
        (None, None) => return Err(miette::Report::msg("an index or --study is required")),
    };

    if !args.stage {
        return JsonOutput::print_record(&RecordSummary::new(&record, None)).into_diagnostic();
    }

    let staged = StagedRecord::write(&record)?;
    JsonOutput::print_record(&RecordSummary::new(&record, Some(&staged))).into_diagnostic()?;
    eprint!("images staged in {}; press Enter to release them ", staged.dir().display());
    io::stderr().flush().into_diagnostic()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).into_diagnostic()?;
    drop(staged);
    Ok(())
}
