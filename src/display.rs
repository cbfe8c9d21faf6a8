//! Terminal pretty-printing for the demo binaries. Not consulted by the
//! decision pipeline itself — purely presentational.

use colored::Colorize;

use crate::cards::{Card, Suit};
use crate::game::Action;
use crate::session::{Score, StateSnapshot};

pub fn card_str(card: &Card) -> String {
    let rank = card.rank.to_char();
    let symbol = card.suit.symbol();
    let text = format!("{rank}{symbol}");
    match card.suit {
        Suit::Spades => text.white().to_string(),
        Suit::Hearts => text.red().to_string(),
        Suit::Diamonds => text.blue().to_string(),
        Suit::Clubs => text.green().to_string(),
    }
}

pub fn board_display(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "(no board)".dimmed().to_string();
    }
    cards.iter().map(card_str).collect::<Vec<_>>().join(" ")
}

pub fn equity_bar(equity: f64, width: usize) -> String {
    let filled = ((equity.clamp(0.0, 1.0)) * width as f64) as usize;
    let bar: String = "\u{2588}".repeat(filled) + &"\u{2591}".repeat(width.saturating_sub(filled));
    let pct = format!("{:.1}%", equity * 100.0);
    if equity >= 0.6 {
        format!("{} {}", bar.green(), pct)
    } else if equity >= 0.4 {
        format!("{} {}", bar.yellow(), pct)
    } else {
        format!("{} {}", bar.red(), pct)
    }
}

pub fn styled_action(action: Action) -> String {
    let label = action.to_string();
    if action.is_bet_or_raise() {
        label.red().bold().to_string()
    } else if action == Action::Call {
        label.green().bold().to_string()
    } else if action == Action::Fold {
        label.dimmed().to_string()
    } else {
        label.yellow().bold().to_string()
    }
}

pub fn snapshot_line(snapshot: &StateSnapshot) -> String {
    let street = match snapshot.street_idx {
        0 => "preflop",
        1 => "flop",
        2 => "turn",
        _ => "river",
    };
    format!(
        "{}  pot=${:.0}  board: {}  stacks=[{:.0}, {:.0}]",
        street.bold(),
        snapshot.pot,
        board_display(&snapshot.board),
        snapshot.stack[0],
        snapshot.stack[1],
    )
}

pub fn legal_actions_line(actions: &[Action]) -> String {
    actions
        .iter()
        .enumerate()
        .map(|(i, &a)| format!("[{i}] {}", styled_action(a)))
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn score_line(score: &Score) -> String {
    format!(
        "W/L/T {}/{}/{}  net {}",
        score.wins,
        score.losses,
        score.ties,
        if score.net >= 0.0 {
            format!("+{:.1}", score.net).green().to_string()
        } else {
            format!("{:.1}", score.net).red().to_string()
        }
    )
}
