use ratatui::{
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table},
  Frame,
};

use super::app::{App, Screen};
use crate::resource::{ResourceKind, ResourceTable};

const HIGHLIGHT_SYMBOL: &str = "> ";

/// Key bindings listed in the help panel
const HELP: &[(&str, &str)] = &[
  ("j / Down", "Move down"),
  ("k / Up", "Move up"),
  ("Enter", "Select profile, open resources or describe row"),
  ("1-4", "Open a resource kind from the home screen"),
  (":", "Quick navigation (ec2, ecr, lambda, secrets)"),
  ("r", "Refresh the resource table"),
  ("v", "Reveal the selected secret's value"),
  ("g / G", "Jump to top or bottom of details"),
  ("?", "Toggle this help"),
  ("q / Esc", "Go back, quit from the profile list"),
  ("Ctrl+C", "Quit"),
];

fn highlight_style() -> Style {
  Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
}

pub fn draw(frame: &mut Frame, app: &mut App) {
  let [header, body, status] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)]).areas(frame.area());

  draw_header(frame, app, header);

  match app.screen {
    Screen::Profiles => draw_profiles(frame, app, body),
    Screen::Home => draw_home(frame, app, body),
    Screen::Resources => draw_resources(frame, app, body),
    Screen::Detail => draw_detail(frame, app, body),
  }

  draw_status(frame, app, status);

  if app.show_help {
    draw_help(frame, body);
  }
}

/// Context on the left, key hints on the right
fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
  let mut context = vec![Span::styled(" awstui", Style::default().add_modifier(Modifier::BOLD))];
  if let Some(active) = &app.active {
    context.push(Span::raw(format!(" | profile: {}", active.name)));
    context.push(Span::raw(format!(
      " | region: {}",
      active.region.as_deref().unwrap_or("-")
    )));
  }
  if matches!(app.screen, Screen::Resources | Screen::Detail) {
    if let Some(table) = &app.resources {
      context.push(Span::raw(format!(" | {}", table.kind.title())));
    }
  }

  let hints = match app.screen {
    Screen::Profiles => "Enter: select  ?: help  q: quit ",
    Screen::Home => "1-4: open  :: jump  ?: help  q: back ",
    Screen::Resources => "Enter: describe  r: refresh  :: jump  q: back ",
    Screen::Detail => "j/k: scroll  q: back ",
  };

  let [left, right] = Layout::horizontal([Constraint::Min(0), Constraint::Length(hints.len() as u16)]).areas(area);
  frame.render_widget(Paragraph::new(Line::from(context)), left);
  frame.render_widget(
    Paragraph::new(Span::styled(hints, Style::default().fg(Color::DarkGray))).alignment(Alignment::Right),
    right,
  );
}

fn draw_profiles(frame: &mut Frame, app: &mut App, area: Rect) {
  let block = Block::default().borders(Borders::ALL).title(" Profiles ");

  if app.profiles.is_empty() {
    frame.render_widget(
      Paragraph::new("No AWS profiles configured")
        .alignment(Alignment::Center)
        .block(block),
      area,
    );
    return;
  }

  let items: Vec<ListItem> = app.profiles.iter().map(|p| ListItem::new(p.label())).collect();
  let list = List::new(items)
    .block(block)
    .highlight_style(highlight_style())
    .highlight_symbol(HIGHLIGHT_SYMBOL);

  frame.render_stateful_widget(list, area, &mut app.profile_state);
}

fn draw_home(frame: &mut Frame, app: &mut App, area: Rect) {
  let [summary, kinds] = Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).areas(area);

  let (name, region) = app
    .active
    .as_ref()
    .map(|a| (a.name.as_str(), a.region.as_deref().unwrap_or("-")))
    .unwrap_or(("-", "-"));
  let text = vec![
    Line::from(vec![Span::raw("Profile: "), Span::styled(name, Style::default().fg(Color::Cyan))]),
    Line::from(vec![Span::raw("Region:  "), Span::styled(region, Style::default().fg(Color::Cyan))]),
  ];
  frame.render_widget(
    Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" Session ")),
    summary,
  );

  let items: Vec<ListItem> = ResourceKind::ALL
    .iter()
    .enumerate()
    .map(|(i, kind)| ListItem::new(format!("{}  {}", i + 1, kind.title())))
    .collect();
  let list = List::new(items)
    .block(Block::default().borders(Borders::ALL).title(" Resources "))
    .highlight_style(highlight_style())
    .highlight_symbol(HIGHLIGHT_SYMBOL);

  frame.render_stateful_widget(list, kinds, &mut app.home_state);
}

/// Color of an EC2 instance state cell
fn state_style(state: &str) -> Style {
  match state {
    "running" => Style::default().fg(Color::Green),
    "stopped" => Style::default().fg(Color::Red),
    _ => Style::default(),
  }
}

fn table_rows(table: &ResourceTable) -> Vec<Row<'_>> {
  let state_column = table.header().iter().position(|title| *title == "State");

  table
    .rows
    .iter()
    .map(|row| {
      Row::new(row.cells.iter().enumerate().map(|(i, cell)| {
        let style = match (table.kind, state_column) {
          (ResourceKind::Ec2, Some(column)) if column == i => state_style(cell),
          _ => Style::default(),
        };
        Cell::from(cell.as_str()).style(style)
      }))
    })
    .collect()
}

fn draw_resources(frame: &mut Frame, app: &mut App, area: Rect) {
  let Some(table) = app.resources.as_ref() else {
    return;
  };
  let block = Block::default()
    .borders(Borders::ALL)
    .title(format!(" {} ({}) ", table.kind.title(), table.rows.len()));

  if table.rows.is_empty() {
    frame.render_widget(
      Paragraph::new("No resources found").alignment(Alignment::Center).block(block),
      area,
    );
    return;
  }

  let header = Row::new(table.header().into_iter().map(Cell::from))
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
  let widths: Vec<Constraint> = table.kind.columns().iter().map(|c| Constraint::Max(c.width)).collect();

  let widget = Table::new(table_rows(table), widths)
    .header(header)
    .block(block)
    .row_highlight_style(highlight_style())
    .highlight_symbol(HIGHLIGHT_SYMBOL);

  frame.render_stateful_widget(widget, area, &mut app.resource_state);
}

fn draw_detail(frame: &mut Frame, app: &App, area: Rect) {
  let Some(detail) = &app.detail else {
    return;
  };

  let paragraph = Paragraph::new(detail.body.as_str())
    .block(Block::default().borders(Borders::ALL).title(format!(" {} ", detail.title)))
    .scroll((detail.scroll, 0));
  frame.render_widget(paragraph, area);
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
  let line = match &app.prompt {
    Some(input) => Line::from(vec![
      Span::styled(":", Style::default().fg(Color::Yellow)),
      Span::raw(input.as_str()),
      Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]),
    None => {
      let style = if app.status.is_error {
        Style::default().fg(Color::Red)
      } else {
        Style::default()
      };
      Line::from(Span::styled(format!(" {}", app.status.message), style))
    }
  };

  frame.render_widget(Paragraph::new(line), area);
}

/// Rectangle of at most `width` x `height` centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}

fn draw_help(frame: &mut Frame, area: Rect) {
  let lines: Vec<Line> = HELP
    .iter()
    .map(|(keys, description)| {
      Line::from(vec![
        Span::styled(format!("{keys:<10}"), Style::default().fg(Color::Cyan)),
        Span::raw(*description),
      ])
    })
    .collect();

  let popup = centered(area, 64, HELP.len() as u16 + 2);
  frame.render_widget(Clear, popup);
  frame.render_widget(
    Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Help ")),
    popup,
  );
}

#[cfg(test)]
mod tests {
  use ratatui::{backend::TestBackend, Terminal};

  use super::*;
  use crate::{
    profile::Profile,
    resource::{ResourceTable, TableRow},
  };

  fn render(app: &mut App, width: u16, height: u16) -> Vec<String> {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|frame| draw(frame, app)).unwrap();

    let buffer = terminal.backend().buffer();
    (0..height)
      .map(|y| (0..width).map(|x| buffer[(x, y)].symbol()).collect::<String>())
      .collect()
  }

  fn contains(lines: &[String], text: &str) -> bool {
    lines.iter().any(|line| line.contains(text))
  }

  fn ec2_table() -> ResourceTable {
    let row = |id: &str, state: &str| TableRow {
      key: id.to_owned(),
      cells: vec![
        id.to_owned(),
        "web".to_owned(),
        "t3.micro".to_owned(),
        state.to_owned(),
        "10.0.0.1".to_owned(),
        "-".to_owned(),
      ],
    };

    ResourceTable {
      kind: ResourceKind::Ec2,
      rows: vec![row("i-1", "running"), row("i-2", "stopped")],
    }
  }

  #[test]
  fn it_shows_an_empty_profile_list() {
    let mut app = App::new(Vec::new());
    let lines = render(&mut app, 80, 10);

    assert!(contains(&lines, "No AWS profiles configured"));
  }

  #[test]
  fn it_shows_profile_labels() {
    let mut app = App::new(vec![Profile {
      name: "dev".to_owned(),
      region: Some("us-west-2".to_owned()),
      is_default: false,
      is_from_env: true,
    }]);
    let lines = render(&mut app, 80, 10);

    assert!(contains(&lines, "> dev (region: us-west-2) [active]"));
    assert!(lines[0].contains("q: quit"));
  }

  #[test]
  fn it_shows_the_session_on_the_home_screen() {
    let mut app = App::new(Vec::new());
    app.profile_loaded("dev", Some("us-west-2".to_owned()));
    let lines = render(&mut app, 100, 14);

    assert!(lines[0].contains("profile: dev | region: us-west-2"));
    assert!(contains(&lines, "1  EC2 Instances"));
    assert!(contains(&lines, "4  Secrets Manager"));
  }

  #[test]
  fn it_colors_instance_states() {
    let mut app = App::new(Vec::new());
    app.profile_loaded("dev", None);
    app.show_resources(ec2_table());
    // The highlighted row is restyled as a whole
    app.resource_state.select(None);

    let mut terminal = Terminal::new(TestBackend::new(120, 10)).unwrap();
    terminal.draw(|frame| draw(frame, &mut app)).unwrap();
    let buffer = terminal.backend().buffer();

    let find = |text: &str| {
      (0..10u16).find_map(|y| {
        let line: String = (0..120u16).map(|x| buffer[(x, y)].symbol()).collect();
        line.find(text).map(|byte| (line[..byte].chars().count() as u16, y))
      })
    };
    let (x, y) = find("running").unwrap();
    assert_eq!(buffer[(x, y)].fg, Color::Green);
    let (x, y) = find("stopped").unwrap();
    assert_eq!(buffer[(x, y)].fg, Color::Red);
  }

  #[test]
  fn it_shows_the_prompt_and_errors() {
    let mut app = App::new(Vec::new());
    app.profile_loaded("dev", None);
    app.prompt = Some("lam".to_owned());
    let lines = render(&mut app, 60, 8);
    assert!(lines[7].starts_with(":lam_"));

    app.prompt = None;
    app.set_error("Unknown resource type: s3");
    let lines = render(&mut app, 60, 8);
    assert!(lines[7].contains("Error: Unknown resource type: s3"));
  }

  #[test]
  fn it_overlays_help() {
    let mut app = App::new(Vec::new());
    app.show_help = true;
    let lines = render(&mut app, 80, 20);

    assert!(contains(&lines, "Quick navigation"));
  }

  #[test]
  fn it_centers_within_small_areas() {
    let area = Rect::new(0, 0, 20, 5);
    assert_eq!(centered(area, 64, 13), area);
    assert_eq!(centered(Rect::new(2, 2, 20, 10), 10, 4), Rect::new(7, 5, 10, 4));
  }
}
