use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::{ListState, TableState};
use tracing::debug;

use crate::{
  profile::Profile,
  resource::{ResourceKind, ResourceTable},
};

/// Screens of the terminal UI, in navigation order
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Screen {
  Profiles,
  Home,
  Resources,
  Detail,
}

/// Work the event loop has to perform against AWS on behalf of the UI
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
  LoadProfile(String),
  LoadResources(ResourceKind),
  Describe(ResourceKind, String),
  RevealSecret(String),
}

impl Action {
  /// Message shown while the action is in flight
  pub fn loading_message(&self) -> String {
    match self {
      Action::LoadProfile(name) => format!("Loading profile {name}..."),
      Action::LoadResources(kind) => format!("Loading {}...", kind.title()),
      Action::Describe(_, key) => format!("Describing {key}..."),
      Action::RevealSecret(key) => format!("Retrieving secret value for {key}..."),
    }
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Status {
  pub message: String,
  pub is_error: bool,
}

/// Pretty printed body shown on the detail screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Detail {
  pub title: String,
  pub body: String,
  pub scroll: u16,
}

/// Profile the resources are browsed under
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveProfile {
  pub name: String,
  /// Region the SDK configuration resolved to
  pub region: Option<String>,
}

pub struct App {
  pub profiles: Vec<Profile>,
  pub profile_state: ListState,
  pub screen: Screen,
  pub active: Option<ActiveProfile>,
  pub home_state: ListState,
  pub resources: Option<ResourceTable>,
  pub resource_state: TableState,
  pub detail: Option<Detail>,
  /// Quick navigation input, `Some` while the prompt is open
  pub prompt: Option<String>,
  pub show_help: bool,
  pub status: Status,
  pub should_quit: bool,
}

impl App {
  pub fn new(profiles: Vec<Profile>) -> Self {
    let mut profile_state = ListState::default();
    if !profiles.is_empty() {
      let active = profiles.iter().position(|p| p.is_from_env).unwrap_or(0);
      profile_state.select(Some(active));
    }

    let mut home_state = ListState::default();
    home_state.select(Some(0));

    App {
      profiles,
      profile_state,
      screen: Screen::Profiles,
      active: None,
      home_state,
      resources: None,
      resource_state: TableState::default(),
      detail: None,
      prompt: None,
      show_help: false,
      status: Status::default(),
      should_quit: false,
    }
  }

  pub fn set_info(&mut self, message: impl Into<String>) {
    self.status = Status {
      message: message.into(),
      is_error: false,
    };
  }

  pub fn set_error(&mut self, err: impl fmt::Display) {
    self.status = Status {
      message: format!("Error: {err}"),
      is_error: true,
    };
  }

  pub fn selected_profile(&self) -> Option<&Profile> {
    self.profile_state.selected().and_then(|i| self.profiles.get(i))
  }

  pub fn selected_kind(&self) -> ResourceKind {
    self
      .home_state
      .selected()
      .and_then(|i| ResourceKind::ALL.get(i).copied())
      .unwrap_or(ResourceKind::Ec2)
  }

  /// Key of the highlighted row on the resource screen
  pub fn selected_row_key(&self) -> Option<&str> {
    let table = self.resources.as_ref()?;
    let row = table.rows.get(self.resource_state.selected()?)?;
    Some(row.key.as_str())
  }

  pub fn profile_loaded(&mut self, name: &str, region: Option<String>) {
    self.active = Some(ActiveProfile {
      name: name.to_owned(),
      region,
    });
    self.resources = None;
    self.detail = None;
    self.screen = Screen::Home;
    self.set_info(format!("Using profile {name}"));
  }

  pub fn show_resources(&mut self, table: ResourceTable) {
    let selected = match self.resource_state.selected() {
      // Keep the cursor when refreshing the same kind
      Some(i) if self.resources.as_ref().is_some_and(|t| t.kind == table.kind) => {
        Some(i.min(table.rows.len().saturating_sub(1)))
      }
      _ => Some(0),
    };
    self.resource_state.select(selected.filter(|_| !table.rows.is_empty()));

    self.set_info(format!("{} {}", table.rows.len(), table.kind.title()));
    self.resources = Some(table);
    self.screen = Screen::Resources;
  }

  pub fn show_detail(&mut self, title: impl Into<String>, body: String) {
    self.detail = Some(Detail {
      title: title.into(),
      body,
      scroll: 0,
    });
    self.screen = Screen::Detail;
    self.set_info("");
  }

  /// Handle a key press, returning the work the event loop has to perform for it
  pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      self.should_quit = true;
      return None;
    }

    if self.prompt.is_some() {
      return self.handle_prompt_key(key.code);
    }

    if self.show_help {
      if matches!(key.code, KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc) {
        self.show_help = false;
      }
      return None;
    }

    match key.code {
      KeyCode::Char('?') => {
        self.show_help = true;
        return None;
      }
      KeyCode::Char(':') => {
        if self.active.is_some() {
          self.prompt = Some(String::new());
        } else {
          self.set_error("select a profile first");
        }
        return None;
      }
      _ => {}
    }

    match self.screen {
      Screen::Profiles => self.handle_profiles_key(key.code),
      Screen::Home => self.handle_home_key(key.code),
      Screen::Resources => self.handle_resources_key(key.code),
      Screen::Detail => {
        self.handle_detail_key(key.code);
        None
      }
    }
  }

  fn handle_prompt_key(&mut self, code: KeyCode) -> Option<Action> {
    let input = self.prompt.as_mut()?;
    match code {
      KeyCode::Char(c) => input.push(c),
      KeyCode::Backspace => {
        input.pop();
      }
      KeyCode::Esc => self.prompt = None,
      KeyCode::Enter => {
        let input = self.prompt.take().unwrap_or_default();
        match input.parse::<ResourceKind>() {
          Ok(kind) => {
            debug!("Quick navigation to {kind}");
            return Some(Action::LoadResources(kind));
          }
          Err(err) => self.set_error(err),
        }
      }
      _ => {}
    }
    None
  }

  fn handle_profiles_key(&mut self, code: KeyCode) -> Option<Action> {
    match code {
      KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
      KeyCode::Char('j') | KeyCode::Down => select_next(&mut self.profile_state, self.profiles.len()),
      KeyCode::Char('k') | KeyCode::Up => select_previous(&mut self.profile_state),
      KeyCode::Enter => {
        return self
          .selected_profile()
          .map(|p| Action::LoadProfile(p.name.clone()))
      }
      _ => {}
    }
    None
  }

  fn handle_home_key(&mut self, code: KeyCode) -> Option<Action> {
    match code {
      KeyCode::Char('q') | KeyCode::Esc => self.screen = Screen::Profiles,
      KeyCode::Char('j') | KeyCode::Down => select_next(&mut self.home_state, ResourceKind::ALL.len()),
      KeyCode::Char('k') | KeyCode::Up => select_previous(&mut self.home_state),
      KeyCode::Enter => return Some(Action::LoadResources(self.selected_kind())),
      KeyCode::Char(c @ '1'..='9') => {
        let index = c as usize - '1' as usize;
        if let Some(kind) = ResourceKind::ALL.get(index) {
          self.home_state.select(Some(index));
          return Some(Action::LoadResources(*kind));
        }
      }
      _ => {}
    }
    None
  }

  fn handle_resources_key(&mut self, code: KeyCode) -> Option<Action> {
    let kind = self.resources.as_ref().map(|t| t.kind)?;
    let rows = self.resources.as_ref().map_or(0, |t| t.rows.len());

    match code {
      KeyCode::Char('q') | KeyCode::Esc => self.screen = Screen::Home,
      KeyCode::Char('j') | KeyCode::Down => select_next_row(&mut self.resource_state, rows),
      KeyCode::Char('k') | KeyCode::Up => select_previous_row(&mut self.resource_state),
      KeyCode::Char('r') => return Some(Action::LoadResources(kind)),
      KeyCode::Enter => {
        return self
          .selected_row_key()
          .map(|key| Action::Describe(kind, key.to_owned()))
      }
      KeyCode::Char('v') if kind == ResourceKind::Secrets => {
        return self.selected_row_key().map(|key| Action::RevealSecret(key.to_owned()))
      }
      _ => {}
    }
    None
  }

  fn handle_detail_key(&mut self, code: KeyCode) {
    let Some(detail) = self.detail.as_mut() else {
      self.screen = Screen::Resources;
      return;
    };
    let max_scroll = detail.body.lines().count().saturating_sub(1) as u16;

    match code {
      KeyCode::Char('q') | KeyCode::Esc => {
        self.detail = None;
        self.screen = Screen::Resources;
      }
      KeyCode::Char('j') | KeyCode::Down => detail.scroll = detail.scroll.saturating_add(1).min(max_scroll),
      KeyCode::Char('k') | KeyCode::Up => detail.scroll = detail.scroll.saturating_sub(1),
      KeyCode::PageDown => detail.scroll = detail.scroll.saturating_add(10).min(max_scroll),
      KeyCode::PageUp => detail.scroll = detail.scroll.saturating_sub(10),
      KeyCode::Char('g') => detail.scroll = 0,
      KeyCode::Char('G') => detail.scroll = max_scroll,
      _ => {}
    }
  }
}

fn select_next(state: &mut ListState, len: usize) {
  if len == 0 {
    return;
  }
  let next = state.selected().map_or(0, |i| (i + 1).min(len - 1));
  state.select(Some(next));
}

fn select_previous(state: &mut ListState) {
  let previous = state.selected().map_or(0, |i| i.saturating_sub(1));
  state.select(Some(previous));
}

fn select_next_row(state: &mut TableState, len: usize) {
  if len == 0 {
    return;
  }
  let next = state.selected().map_or(0, |i| (i + 1).min(len - 1));
  state.select(Some(next));
}

fn select_previous_row(state: &mut TableState) {
  if let Some(i) = state.selected() {
    state.select(Some(i.saturating_sub(1)));
  }
}

#[cfg(test)]
mod tests {
  use crossterm::event::KeyEventKind;
  use rstest::*;

  use super::*;
  use crate::resource::TableRow;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn profile(name: &str, region: Option<&str>, is_from_env: bool) -> Profile {
    Profile {
      name: name.to_owned(),
      region: region.map(str::to_owned),
      is_default: name == "default",
      is_from_env,
    }
  }

  fn profiles() -> Vec<Profile> {
    vec![
      profile("default", Some("us-east-1"), false),
      profile("dev", Some("us-west-2"), false),
      profile("staging", None, true),
    ]
  }

  fn secrets_table() -> ResourceTable {
    ResourceTable {
      kind: ResourceKind::Secrets,
      rows: vec![
        TableRow {
          key: "arn:secret:a".to_owned(),
          cells: vec!["a".to_owned(), "-".to_owned(), "-".to_owned()],
        },
        TableRow {
          key: "arn:secret:b".to_owned(),
          cells: vec!["b".to_owned(), "-".to_owned(), "3".to_owned()],
        },
      ],
    }
  }

  /// App with a loaded profile, showing the secrets table
  fn browsing() -> App {
    let mut app = App::new(profiles());
    app.profile_loaded("dev", Some("us-west-2".to_owned()));
    app.show_resources(secrets_table());
    app
  }

  #[test]
  fn it_labels_profiles() {
    let labels: Vec<String> = profiles().iter().map(Profile::label).collect();

    insta::assert_snapshot!(labels.join("\n"), @r###"
    default (region: us-east-1) [default]
    dev (region: us-west-2)
    staging [active]
    "###);
  }

  #[test]
  fn it_preselects_the_active_profile() {
    let app = App::new(profiles());
    assert_eq!(app.selected_profile().map(|p| p.name.as_str()), Some("staging"));

    let mut without_env = profiles();
    without_env[2].is_from_env = false;
    let app = App::new(without_env);
    assert_eq!(app.selected_profile().map(|p| p.name.as_str()), Some("default"));
  }

  #[test]
  fn it_selects_nothing_without_profiles() {
    let mut app = App::new(Vec::new());

    assert!(app.selected_profile().is_none());
    assert_eq!(app.handle_key(key(KeyCode::Enter)), None);
    assert_eq!(app.handle_key(key(KeyCode::Char('j'))), None);
    assert!(app.selected_profile().is_none());
  }

  #[test]
  fn it_loads_the_selected_profile() {
    let mut app = App::new(profiles());
    app.handle_key(key(KeyCode::Char('k')));
    app.handle_key(key(KeyCode::Up));

    assert_eq!(
      app.handle_key(key(KeyCode::Enter)),
      Some(Action::LoadProfile("dev".to_owned()))
    );
  }

  #[test]
  fn it_keeps_selection_within_bounds() {
    let mut app = App::new(profiles());
    for _ in 0..5 {
      app.handle_key(key(KeyCode::Down));
    }
    assert_eq!(app.profile_state.selected(), Some(2));

    for _ in 0..5 {
      app.handle_key(key(KeyCode::Char('k')));
    }
    assert_eq!(app.profile_state.selected(), Some(0));
  }

  #[rstest]
  #[case('1', ResourceKind::Ec2)]
  #[case('2', ResourceKind::Ecr)]
  #[case('3', ResourceKind::Lambda)]
  #[case('4', ResourceKind::Secrets)]
  fn it_opens_resources_by_shortcut(#[case] shortcut: char, #[case] expected: ResourceKind) {
    let mut app = App::new(profiles());
    app.profile_loaded("dev", None);

    assert_eq!(
      app.handle_key(key(KeyCode::Char(shortcut))),
      Some(Action::LoadResources(expected))
    );
  }

  #[test]
  fn it_ignores_unknown_shortcuts() {
    let mut app = App::new(profiles());
    app.profile_loaded("dev", None);

    assert_eq!(app.handle_key(key(KeyCode::Char('5'))), None);
  }

  #[test]
  fn it_navigates_quickly_by_kind() {
    let mut app = App::new(profiles());
    app.profile_loaded("dev", None);

    app.handle_key(key(KeyCode::Char(':')));
    for c in "LAMBDA".chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }

    assert_eq!(app.prompt.as_deref(), Some("LAMBDA"));
    assert_eq!(
      app.handle_key(key(KeyCode::Enter)),
      Some(Action::LoadResources(ResourceKind::Lambda))
    );
    assert!(app.prompt.is_none());
  }

  #[test]
  fn it_reports_unknown_kinds_from_quick_navigation() {
    let mut app = App::new(profiles());
    app.profile_loaded("dev", None);

    app.handle_key(key(KeyCode::Char(':')));
    for c in "s3x".chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Backspace));

    assert_eq!(app.handle_key(key(KeyCode::Enter)), None);
    assert!(app.status.is_error);
    assert_eq!(app.status.message, "Error: Unknown resource type: s3");
    assert_eq!(app.screen, Screen::Home);
  }

  #[test]
  fn it_requires_a_profile_for_quick_navigation() {
    let mut app = App::new(profiles());
    app.handle_key(key(KeyCode::Char(':')));

    assert!(app.prompt.is_none());
    assert!(app.status.is_error);
  }

  #[test]
  fn it_cancels_quick_navigation() {
    let mut app = App::new(profiles());
    app.profile_loaded("dev", None);

    app.handle_key(key(KeyCode::Char(':')));
    app.handle_key(key(KeyCode::Char('q')));
    app.handle_key(key(KeyCode::Esc));

    assert!(app.prompt.is_none());
    assert!(!app.should_quit);
    assert_eq!(app.screen, Screen::Home);
  }

  #[test]
  fn it_describes_and_reveals_selected_rows() {
    let mut app = browsing();
    app.handle_key(key(KeyCode::Char('j')));

    assert_eq!(
      app.handle_key(key(KeyCode::Enter)),
      Some(Action::Describe(ResourceKind::Secrets, "arn:secret:b".to_owned()))
    );
    assert_eq!(
      app.handle_key(key(KeyCode::Char('v'))),
      Some(Action::RevealSecret("arn:secret:b".to_owned()))
    );
    assert_eq!(
      app.handle_key(key(KeyCode::Char('r'))),
      Some(Action::LoadResources(ResourceKind::Secrets))
    );
  }

  #[test]
  fn it_only_reveals_secrets() {
    let mut app = browsing();
    app.show_resources(ResourceTable {
      kind: ResourceKind::Lambda,
      rows: vec![TableRow {
        key: "fn".to_owned(),
        cells: vec!["fn".to_owned(), "-".to_owned(), "-".to_owned(), "-".to_owned()],
      }],
    });

    assert_eq!(app.handle_key(key(KeyCode::Char('v'))), None);
  }

  #[test]
  fn it_keeps_the_cursor_on_refresh() {
    let mut app = browsing();
    app.handle_key(key(KeyCode::Down));
    app.show_resources(secrets_table());
    assert_eq!(app.resource_state.selected(), Some(1));

    app.show_resources(ResourceTable {
      kind: ResourceKind::Secrets,
      rows: Vec::new(),
    });
    assert_eq!(app.resource_state.selected(), None);
    assert_eq!(app.handle_key(key(KeyCode::Enter)), None);
  }

  #[test]
  fn it_goes_back_through_screens() {
    let mut app = browsing();
    app.show_detail("prod/db", "{\n  \"name\": \"prod/db\"\n}".to_owned());
    assert_eq!(app.screen, Screen::Detail);

    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.screen, Screen::Resources);
    app.handle_key(key(KeyCode::Char('q')));
    assert_eq!(app.screen, Screen::Home);
    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.screen, Screen::Profiles);
    assert!(!app.should_quit);

    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit);
  }

  #[test]
  fn it_scrolls_details_within_the_body() {
    let mut app = browsing();
    app.show_detail("prod/db", "{\n  \"a\": 1,\n  \"b\": 2\n}".to_owned());

    for _ in 0..10 {
      app.handle_key(key(KeyCode::Char('j')));
    }
    assert_eq!(app.detail.as_ref().map(|d| d.scroll), Some(3));

    app.handle_key(key(KeyCode::Char('g')));
    assert_eq!(app.detail.as_ref().map(|d| d.scroll), Some(0));
  }

  #[test]
  fn it_toggles_help() {
    let mut app = browsing();
    app.handle_key(key(KeyCode::Char('?')));
    assert!(app.show_help);

    // Keys other than the closing ones are swallowed while help is shown
    assert_eq!(app.handle_key(key(KeyCode::Char('r'))), None);
    app.handle_key(key(KeyCode::Esc));
    assert!(!app.show_help);
    assert_eq!(app.screen, Screen::Resources);
  }

  #[rstest]
  #[case(Screen::Profiles)]
  #[case(Screen::Resources)]
  fn it_quits_on_ctrl_c(#[case] screen: Screen) {
    let mut app = browsing();
    app.screen = screen;
    app.prompt = Some("ec".to_owned());

    let ctrl_c = KeyEvent {
      code: KeyCode::Char('c'),
      modifiers: KeyModifiers::CONTROL,
      kind: KeyEventKind::Press,
      state: crossterm::event::KeyEventState::NONE,
    };
    app.handle_key(ctrl_c);

    assert!(app.should_quit);
  }
}
