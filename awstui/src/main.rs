use std::{fs::File, io, process, sync::Mutex};

use anyhow::Result;
use awstui::{commands::ui::Ui, Cli, Commands};
use clap::Parser;
use tracing_log::AsTrace;
use tracing_subscriber::{fmt::writer::BoxMakeWriter, FmtSubscriber};

/// Pick where logs are written; the terminal UI owns stdout and stderr
fn log_writer(cli: &Cli) -> Result<BoxMakeWriter> {
  let interactive = matches!(cli.command, None | Some(Commands::Ui(_)));

  let writer = match &cli.log_file {
    Some(path) => BoxMakeWriter::new(Mutex::new(File::create(path)?)),
    None if interactive => BoxMakeWriter::new(io::sink),
    None => BoxMakeWriter::new(io::stderr),
  };

  Ok(writer)
}

#[cfg(not(tarpaulin_include))]
#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let subscriber = FmtSubscriber::builder()
    .with_max_level(cli.verbose.log_level_filter().as_trace())
    .without_time()
    .with_ansi(!cli.no_color && cli.log_file.is_none())
    .with_writer(log_writer(&cli)?)
    .finish();
  tracing::subscriber::set_global_default(subscriber).expect("Setting default subscriber failed");

  let result = match &cli.command {
    None => Ui::default().launch(&cli.global).await,
    Some(Commands::Ui(ui)) => ui.launch(&cli.global).await,
    Some(Commands::Profiles(profiles)) => profiles.print(&cli.global).await,
    Some(Commands::List(list)) => list.print(&cli.global).await,
    Some(Commands::Describe(describe)) => describe.print(&cli.global).await,
  };

  match result {
    Ok(_) => Ok(()),
    Err(err) => {
      eprintln!("{err:#}");
      process::exit(2);
    }
  }
}
