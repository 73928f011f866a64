mod app;
mod view;

use std::{io, panic, time::Duration};

use anyhow::Result;
use aws_config::SdkConfig;
use crossterm::{
  cursor,
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, info, warn};

use app::{Action, App};

use crate::{
  profile::{self, ProfileSources},
  resource, secrets,
};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Where SDK calls are made from once a profile is selected
struct Session {
  sources: ProfileSources,
  region: Option<String>,
  config: Option<SdkConfig>,
}

/// Run the terminal UI over the resolved profiles until the user quits
pub async fn run(sources: ProfileSources, profiles: Vec<profile::Profile>, region: Option<String>) -> Result<()> {
  info!("Starting terminal UI with {} profile(s)", profiles.len());
  let mut app = App::new(profiles);
  let mut session = Session {
    sources,
    region,
    config: None,
  };

  install_panic_hook();
  enable_raw_mode()?;
  let mut stdout = io::stdout();
  if let Err(err) = execute!(stdout, EnterAlternateScreen) {
    let _ = restore_terminal(&mut io::stdout());
    return Err(err.into());
  }
  let mut terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
    Ok(terminal) => terminal,
    Err(err) => {
      let _ = restore_terminal(&mut io::stdout());
      return Err(err.into());
    }
  };

  let result = run_event_loop(&mut terminal, &mut app, &mut session).await;

  restore_terminal(terminal.backend_mut())?;

  result
}

/// Leave raw mode and the alternate screen, and show the cursor again
fn restore_terminal<W: io::Write>(out: &mut W) -> io::Result<()> {
  // Raw mode may not have been entered yet
  let raw = disable_raw_mode();
  execute!(out, LeaveAlternateScreen, cursor::Show)?;
  raw
}

/// Restore the terminal before a panic message is printed
///
/// Release builds abort on panic, so nothing unwinds past the event loop to clean up
fn install_panic_hook() {
  let previous = panic::take_hook();
  panic::set_hook(Box::new(move |info| {
    if let Err(err) = restore_terminal(&mut io::stdout()) {
      warn!("Failed to restore terminal: {err}");
    }
    previous(info);
  }));
}

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
  session: &mut Session,
) -> Result<()> {
  while !app.should_quit {
    terminal.draw(|frame| view::draw(frame, app))?;

    if !event::poll(POLL_INTERVAL)? {
      continue;
    }
    let Event::Key(key) = event::read()? else {
      continue;
    };
    // Only handle presses, not releases or repeats
    if key.kind != KeyEventKind::Press {
      continue;
    }

    if let Some(action) = app.handle_key(key) {
      app.set_info(action.loading_message());
      terminal.draw(|frame| view::draw(frame, app))?;
      perform(action, app, session).await;
    }
  }

  Ok(())
}

/// Carry out an action against AWS and hand the outcome back to the app
///
/// Failures are reported in the status bar and never end the UI
async fn perform(action: Action, app: &mut App, session: &mut Session) {
  debug!("Performing {:?}", action);

  if let Action::LoadProfile(name) = &action {
    match profile::lookup_configuration(&app.profiles, name, &session.sources, session.region.clone()).await {
      Ok(config) => {
        app.profile_loaded(name, config.region().map(|r| r.to_string()));
        session.config = Some(config);
      }
      Err(err) => {
        warn!("{err}");
        app.set_error(err);
      }
    }
    return;
  }

  let Some(config) = session.config.as_ref() else {
    app.set_error("select a profile first");
    return;
  };

  let outcome = match action {
    Action::LoadProfile(_) => return,
    Action::LoadResources(kind) => resource::list_resources(kind, config)
      .await
      .map(|resources| app.show_resources(resources.table())),
    Action::Describe(kind, key) => resource::describe_resource(kind, config, &key)
      .await
      .map(|detail| app.show_detail(key, detail)),
    Action::RevealSecret(key) => secrets::get_secret_value(config, &key)
      .await
      .map(|value| app.show_detail(format!("{key} (value)"), value)),
  };

  if let Err(err) = outcome {
    warn!("{err:#}");
    app.set_error(format!("{err:#}"));
  }
}
