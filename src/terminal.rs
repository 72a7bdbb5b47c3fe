//! Text front end: draws snapshots and turns typed lines into commands.
//!
//! Cards are addressed by their 1-based position on the board, left to
//! right and top to bottom, so the player never sees card ids.

use std::fmt::Write as _;
use std::io::{IsTerminal, Write};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::debug;

use cat_pairs::{calculate_card_size, Card, GameHandle, Phase, Result, Snapshot};

const CELL_WIDTH: usize = 12;
const HELP: &str = "Type a card number to turn it over, r to restart, q to quit.";

/// Area the board is laid out in.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub spacing: f32,
}

/// One line of player input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    /// Zero-based board position.
    Tap(usize),
    Restart,
    Quit,
    Unknown,
}

impl Input {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "q" | "quit" => Input::Quit,
            "r" | "restart" => Input::Restart,
            other => match other.parse::<usize>() {
                Ok(position) if position >= 1 => Input::Tap(position - 1),
                _ => Input::Unknown,
            },
        }
    }
}

/// Play until the player quits or stdin closes.
pub async fn run(game: &GameHandle, viewport: Viewport, win_reveal_delay: Duration) -> Result<()> {
    let mut updates = game.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut current = game.snapshot();
    let mut win_at: Option<Instant> = None;

    game.restart().await?;

    loop {
        tokio::select! {
            snapshot = updates.next() => {
                let Some(snapshot) = snapshot else { break };
                if snapshot.phase.is_finished() && !current.phase.is_finished() {
                    win_at = Some(Instant::now() + win_reveal_delay);
                } else if !snapshot.phase.is_finished() {
                    win_at = None;
                }
                draw(&render(&snapshot, viewport))?;
                current = snapshot;
            }
            _ = tokio::time::sleep_until(win_at.unwrap_or_else(Instant::now)), if win_at.is_some() => {
                win_at = None;
                draw(&render_win(&current))?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Input::parse(&line) {
                    Input::Quit => break,
                    Input::Restart => game.restart().await?,
                    Input::Tap(position) => match current.cards.get(position) {
                        Some(card) => game.tap(card.id).await?,
                        None => debug!("No card at position {}", position + 1),
                    },
                    Input::Unknown => println!("{HELP}"),
                }
            }
        }
    }
    Ok(())
}

fn draw(screen: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    if stdout.is_terminal() {
        // Clear and home.
        write!(stdout, "\x1b[2J\x1b[H")?;
    }
    stdout.write_all(screen.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Full screen for one snapshot.
pub fn render(snapshot: &Snapshot, viewport: Viewport) -> String {
    let mut out = String::new();
    match &snapshot.phase {
        Phase::Idle => out.push_str("Press r to start.\n"),
        Phase::Loading => out.push_str("Loading cats...\n"),
        Phase::Failed(message) => {
            let _ = writeln!(out, "{message}. Press r to try again.");
        }
        Phase::Playing | Phase::Finished => {
            let _ = writeln!(
                out,
                "Time: {}s   Pairs: {}/{}",
                snapshot.elapsed_seconds,
                snapshot.matched_pairs(),
                snapshot.total_pairs()
            );
            out.push_str(&render_board(&snapshot.cards, viewport));
            let _ = writeln!(out, "{HELP}");
        }
    }
    out
}

/// The win screen shown a moment after the last pair is found.
pub fn render_win(snapshot: &Snapshot) -> String {
    format!(
        "You found all {} pairs in {} seconds!\nPress r to play again or q to quit.\n",
        snapshot.total_pairs(),
        snapshot.elapsed_seconds
    )
}

fn render_board<'a>(cards: impl IntoIterator<Item = &'a Card>, viewport: Viewport) -> String {
    let cards: Vec<&Card> = cards.into_iter().collect();
    let grid = calculate_card_size(cards.len(), viewport.width, viewport.height, viewport.spacing);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}x{} grid, {:.0}px cards",
        grid.columns, grid.rows, grid.card_size
    );

    for (index, card) in cards.iter().enumerate() {
        let cell = format!("{:>2} {}", index + 1, card_face(card));
        let _ = write!(out, "{cell:<CELL_WIDTH$}");
        if grid.position_of(index).is_some_and(|(_, col)| col + 1 == grid.columns) {
            out.push('\n');
        }
    }
    if grid.columns > 0 && cards.len() % grid.columns != 0 {
        out.push('\n');
    }

    // Only face-up cards reveal their picture.
    for (index, card) in cards.iter().enumerate() {
        if card.is_matched {
            continue;
        }
        if let Some(url) = card.visible_url() {
            let _ = writeln!(out, "{:>2}: {url}", index + 1);
        }
    }
    out
}

fn card_face(card: &Card) -> String {
    if card.is_matched {
        format!("={}", short(&card.image.id))
    } else if card.is_shaking {
        format!("~{}~", short(&card.image.id))
    } else if card.is_covered {
        "[??]".to_string()
    } else {
        short(&card.image.id)
    }
}

fn short(id: &str) -> String {
    id.chars().take(6).collect()
}
