//! Drawing. Reads the session snapshot and UI state; never mutates either.

use std::cell::RefCell;
use std::rc::Rc;

use ratzilla::ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratzilla::ratatui::style::{Color, Modifier, Style};
use ratzilla::ratatui::text::{Line, Span};
use ratzilla::ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratzilla::ratatui::Frame;

use crate::actions::*;
use crate::app::{App, Tab};
use crate::game::catalog::{Case, Rarity};
use crate::game::inventory::InventoryItem;
use crate::game::money::format_money;
use crate::game::Snapshot;
use crate::input::{is_narrow_layout, ClickState};
use crate::widgets::{ClickableList, TabBar};

/// Width of one reel slot in cells.
const SLOT_WIDTH: u16 = 12;

/// Cells in the roll-quality bar.
const QUALITY_BAR: usize = 10;

pub fn rarity_color(rarity: Rarity) -> Color {
    match rarity {
        Rarity::Common => Color::Gray,
        Rarity::Uncommon => Color::Green,
        Rarity::Rare => Color::LightBlue,
        Rarity::Superrare => Color::Magenta,
        Rarity::Legendary => Color::Yellow,
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn quality_bar(item: &InventoryItem) -> String {
    let filled = ((item.roll_quality() * QUALITY_BAR as f64).round() as usize).clamp(1, QUALITY_BAR);
    format!("{}{}", "█".repeat(filled), "░".repeat(QUALITY_BAR - filled))
}

pub fn render(app: &App, f: &mut Frame, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
    let snap = app.session.snapshot();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(6),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(f, &snap, chunks[0]);
    render_tabs(f, app.ui.tab, chunks[1], click_state);
    match app.ui.tab {
        Tab::Cases => match app.ui.viewing.and_then(|i| snap.catalog.cases().get(i)) {
            Some(case) => render_case_page(f, app, &snap, case, chunks[2], click_state),
            None => render_case_list(f, &snap, chunks[2], click_state),
        },
        Tab::Inventory => render_inventory(f, app, &snap, chunks[2], click_state),
    }
    render_notices(f, &snap, chunks[3]);
    render_help(f, app, chunks[4]);

    if let Some(item) = &app.ui.popup {
        render_popup(f, item, area, click_state);
    }
}

fn render_header(f: &mut Frame, snap: &Snapshot, area: Rect) {
    let daily = if snap.daily.has_claimed() {
        format!(
            "Daily: {} (x{})",
            format_money(snap.daily.badge_bonus()),
            snap.daily.streak
        )
    } else {
        "Daily: —".to_string()
    };
    let mut spans = vec![
        Span::styled(
            format_money(snap.balance),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(daily, Style::default().fg(Color::Cyan)),
    ];
    if !snap.persistent {
        spans.push(Span::styled("   (not saving)", Style::default().fg(Color::Red)));
    }
    let header = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Case Opener "),
        )
        .alignment(Alignment::Center);
    f.render_widget(header, area);
}

fn render_tabs(f: &mut Frame, tab: Tab, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
    let style = |t: Tab| {
        if t == tab {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        }
    };
    let mut cs = click_state.borrow_mut();
    TabBar::new(" │ ")
        .tab("Cases", style(Tab::Cases), TAB_CASES)
        .tab("Inventory", style(Tab::Inventory), TAB_INVENTORY)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .render(f, area, &mut cs);
}

fn render_case_list(
    f: &mut Frame,
    snap: &Snapshot,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let mut cl = ClickableList::new();
    for (i, case) in snap.catalog.cases().iter().enumerate() {
        let affordable = case.price <= snap.balance;
        let price_style = if affordable {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let key = if i < 9 {
            format!(" [{}] ", i + 1)
        } else {
            "     ".to_string()
        };
        cl.push_clickable(
            Line::from(vec![
                Span::styled(key, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::styled(case.title.clone(), Style::default().fg(Color::White)),
                Span::raw("  "),
                Span::styled(format_money(case.price), price_style),
                Span::styled(
                    format!("  ({} items)", case.items.len()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]),
            VIEW_CASE_BASE + i as u16,
        );
    }

    let mut cs = click_state.borrow_mut();
    cl.register_targets(area, &mut cs, 1, 1, 0);
    let list = Paragraph::new(cl.into_lines()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Cases "),
    );
    f.render_widget(list, area);
}

fn render_case_page(
    f: &mut Frame,
    app: &App,
    snap: &Snapshot,
    case: &Case,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let (left, right) = if is_narrow_layout(area.width) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(13), Constraint::Min(3)])
            .split(area);
        (rows[0], rows[1])
    } else {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);
        (cols[0], cols[1])
    };

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(left);

    render_reel(f, app, case, parts[0]);
    render_case_controls(f, app, snap, case, parts[1], click_state);
    render_drop_table(f, app, case, right);
}

fn render_reel(f: &mut Frame, app: &App, case: &Case, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(format!(" {} ", case.title));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if case.items.is_empty() || inner.width < SLOT_WIDTH {
        return;
    }

    let (slots, center): (Vec<usize>, usize) = match &app.ui.reveal {
        Some(r) if !r.reel.is_empty() => (r.reel.slots.clone(), r.position().round() as usize),
        _ => ((0..case.items.len() * 3).map(|i| i % case.items.len()).collect(), 0),
    };

    let visible = (inner.width / SLOT_WIDTH).max(1) as usize;
    let visible = if visible % 2 == 0 { visible - 1 } else { visible };
    let half = visible / 2;
    let pad = ((inner.width - visible as u16 * SLOT_WIDTH) / 2) as usize;

    let mut pointer = " ".repeat(pad + half * SLOT_WIDTH as usize);
    pointer.push_str(&format!("{:^w$}", "▼", w = SLOT_WIDTH as usize));

    let mut spans = vec![Span::raw(" ".repeat(pad))];
    for k in 0..visible {
        let pos = center as isize + k as isize - half as isize;
        let text = match usize::try_from(pos).ok().and_then(|p| slots.get(p)) {
            Some(&t) => {
                let tpl = &case.items[t];
                let label = truncate(&tpl.name, SLOT_WIDTH as usize - 2);
                let mut style = Style::default().fg(rarity_color(tpl.rarity));
                if k == half {
                    style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
                }
                Span::styled(format!("{:^w$}", label, w = SLOT_WIDTH as usize), style)
            }
            None => Span::raw(" ".repeat(SLOT_WIDTH as usize)),
        };
        spans.push(text);
    }

    let strip = Paragraph::new(vec![
        Line::from(Span::styled(pointer, Style::default().fg(Color::Yellow))),
        Line::from(spans),
    ]);
    f.render_widget(strip, inner);
}

fn render_case_controls(
    f: &mut Frame,
    app: &App,
    snap: &Snapshot,
    case: &Case,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let can_open = !snap.busy && case.price <= snap.balance;
    let open_style = if can_open {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let open_label = if snap.busy { " [O] Opening…" } else { " [O] Open case" };

    let mut cl = ClickableList::new();
    cl.push(Line::from(vec![
        Span::styled(" Price: ", Style::default().fg(Color::Gray)),
        Span::styled(format_money(case.price), Style::default().fg(Color::Green)),
    ]));
    cl.push_clickable(Line::from(Span::styled(open_label, open_style)), OPEN_CASE);
    cl.push_clickable(Line::from(Span::styled(" [B] Back", Style::default().fg(Color::White))), BACK);
    cl.push(Line::from(""));

    // The result is hidden until the reel lands.
    let landed = app.ui.reveal.as_ref().map_or(true, |r| r.is_done());
    match snap.last_win {
        Some(win) if landed => {
            cl.push(Line::from(vec![
                Span::styled(" Last win: ", Style::default().fg(Color::Gray)),
                Span::styled(
                    win.name.clone(),
                    Style::default().fg(rarity_color(win.rarity)).add_modifier(Modifier::BOLD),
                ),
            ]));
            cl.push(Line::from(Span::styled(
                format!(" {}", format_money(win.price)),
                Style::default().fg(Color::Yellow),
            )));
        }
        _ => cl.push(Line::from(Span::styled(" Last win: —", Style::default().fg(Color::Gray)))),
    }

    let mut cs = click_state.borrow_mut();
    cl.register_targets(area, &mut cs, 1, 1, 0);
    let widget = Paragraph::new(cl.into_lines()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(widget, area);
}

fn render_drop_table(f: &mut Frame, app: &App, case: &Case, area: Rect) {
    let rates = app.session.drop_rates(&case.key);
    let lines: Vec<Line> = case
        .items
        .iter()
        .zip(rates.iter().chain(std::iter::repeat(&0.0)))
        .map(|(it, rate)| {
            Line::from(vec![
                Span::styled(
                    format!(" {:<14}", truncate(&it.name, 14)),
                    Style::default().fg(rarity_color(it.rarity)),
                ),
                Span::styled(
                    format!("{}-{} ", format_money(it.min), format_money(it.max)),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(format!("{:>5.1}%", rate * 100.0), Style::default().fg(Color::White)),
            ])
        })
        .collect();
    let table = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Contents "),
    );
    f.render_widget(table, area);
}

fn render_inventory(
    f: &mut Frame,
    app: &App,
    snap: &Snapshot,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(5)])
        .split(area);
    let list_area = chunks[0];

    let title = format!(" Inventory: {} items, {} ", snap.inventory.len(), format_money(snap.inventory_total));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(title);

    if snap.inventory.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            " Inventory empty. Open some cases.",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        f.render_widget(empty, list_area);
    } else {
        let mut cl = ClickableList::new();
        for (i, it) in snap.inventory.iter().enumerate() {
            let selected = app.ui.selected.contains(&it.id);
            let mark = if selected { "■ " } else { "□ " };
            let mut name_style = Style::default().fg(rarity_color(it.rarity));
            if i == app.ui.cursor {
                name_style = name_style.add_modifier(Modifier::REVERSED);
            }
            cl.push_clickable(
                Line::from(vec![
                    Span::styled(format!(" {mark}"), Style::default().fg(Color::Yellow)),
                    Span::styled(format!("{:<14}", truncate(&it.name, 14)), name_style),
                    Span::styled(format!(" {:>9} ", format_money(it.price)), Style::default().fg(Color::White)),
                    Span::styled(quality_bar(it), Style::default().fg(Color::Green)),
                    Span::styled(format!(" {}", it.rarity.name()), Style::default().fg(Color::DarkGray)),
                ]),
                TOGGLE_ITEM_BASE.saturating_add(i as u16),
            );
        }

        let visible = list_area.height.saturating_sub(2) as usize;
        let scroll = app.ui.cursor.saturating_sub(visible.saturating_sub(1)) as u16;
        let mut cs = click_state.borrow_mut();
        cl.register_targets(list_area, &mut cs, 1, 1, scroll);
        let list = Paragraph::new(cl.into_lines()).block(block).scroll((scroll, 0));
        f.render_widget(list, list_area);
    }

    let selected_total: f64 = snap
        .inventory
        .iter()
        .filter(|it| app.ui.selected.contains(&it.id))
        .map(|it| it.price)
        .sum();
    let mut cl = ClickableList::new();
    cl.push_clickable(
        Line::from(Span::styled(
            format!(" [S] Sell selected ({}, {})", app.ui.selected.len(), format_money(selected_total)),
            Style::default().fg(Color::Yellow),
        )),
        SELL_SELECTED,
    );
    cl.push_clickable(
        Line::from(Span::styled(
            format!(" [A] Sell all ({})", format_money(snap.inventory_total)),
            Style::default().fg(Color::Yellow),
        )),
        SELL_ALL,
    );
    cl.push_clickable(
        Line::from(Span::styled(" Clear selection", Style::default().fg(Color::Gray))),
        CLEAR_SELECTION,
    );
    let mut cs = click_state.borrow_mut();
    cl.register_targets(chunks[1], &mut cs, 1, 1, 0);
    let actions = Paragraph::new(cl.into_lines()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(actions, chunks[1]);
}

fn render_notices(f: &mut Frame, snap: &Snapshot, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let start = snap.notices.len().saturating_sub(visible);
    let lines: Vec<Line> = snap.notices[start..]
        .iter()
        .map(|n| {
            let style = if n.is_important {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(Span::styled(n.text.clone(), style))
        })
        .collect();
    let log = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue))
                .title(" Log "),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(log, area);
}

fn render_help(f: &mut Frame, app: &App, area: Rect) {
    let text = if app.ui.popup.is_some() {
        "[X] Close"
    } else {
        match (app.ui.tab, app.ui.viewing) {
            (Tab::Cases, None) => "[1-9] Case  [I] Inventory",
            (Tab::Cases, Some(_)) => "[O] Open  [B] Back  [I] Inventory",
            (Tab::Inventory, _) => "[J/K] Move  [Space] Select  [S] Sell  [A] Sell all  [C] Cases",
        }
    };
    let help = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(Color::DarkGray))))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .alignment(Alignment::Center);
    f.render_widget(help, area);
}

fn render_popup(
    f: &mut Frame,
    item: &InventoryItem,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let width = 36.min(area.width);
    let height = 7.min(area.height);
    let rect = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );
    let color = rarity_color(item.rarity);

    let mut cl = ClickableList::new();
    cl.push(Line::from(Span::styled(
        item.name.clone(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )));
    cl.push(Line::from(Span::styled(
        format_money(item.price),
        Style::default().fg(Color::Yellow),
    )));
    cl.push(Line::from(Span::styled(item.rarity.name(), Style::default().fg(color))));
    cl.push(Line::from(""));
    cl.push_clickable(Line::from(Span::styled("[X] Close", Style::default().fg(Color::White))), CLOSE_POPUP);

    let mut cs = click_state.borrow_mut();
    // Tapping anywhere on the popup closes it; registered last so it sits on top.
    cs.add_click_target(rect, CLOSE_POPUP);
    cl.register_targets(rect, &mut cs, 1, 1, 0);

    let popup = Paragraph::new(cl.into_lines())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                .title(" You got "),
        )
        .alignment(Alignment::Center);
    f.render_widget(Clear, rect);
    f.render_widget(popup, rect);
}
