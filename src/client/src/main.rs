use anyhow::{anyhow, bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use word_game_client::config::SessionConfig;
use word_game_client::error::GameError;
use word_game_client::game::{Coord, TileId};
use word_game_client::http_api::TurnAction;
use word_game_client::session::{GameSession, MountProps, SessionEvent};

#[derive(Debug, PartialEq)]
enum Command {
    Show,
    Move { id: TileId, slot: usize },
    Place { id: TileId, coord: Coord },
    Return { id: TileId },
    ReturnAll,
    OpenExchange,
    Basket { id: TileId },
    Cancel,
    Shuffle,
    Submit(TurnAction),
    Undo,
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  show                    print the board, rack and badges
  move <id> <slot>        reorder the rack
  place <id> <x> <y>      put a tile on the board
  return <id>             send a tile back to the rack
  return-all              recall every placed or exchanged tile
  exchange                open the exchange box
  basket <id>             put a tile in the exchange box
  cancel                  close the exchange box
  shuffle                 shuffle the rack
  play | pass | swap      submit the turn
  undo                    undo the previous turn
  quit";

fn parse_number<T: std::str::FromStr>(word: Option<&str>, what: &str) -> Result<T> {
    word.ok_or_else(|| anyhow!("missing {what}"))?
        .parse()
        .map_err(|_| anyhow!("invalid {what}"))
}

impl Command {
    fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(Command::Show);
        };
        let command = match name {
            "show" => Command::Show,
            "move" => Command::Move {
                id: parse_number(words.next(), "tile id")?,
                slot: parse_number(words.next(), "slot")?,
            },
            "place" => Command::Place {
                id: parse_number(words.next(), "tile id")?,
                coord: Coord::new(
                    parse_number(words.next(), "x")?,
                    parse_number(words.next(), "y")?,
                ),
            },
            "return" => Command::Return {
                id: parse_number(words.next(), "tile id")?,
            },
            "return-all" => Command::ReturnAll,
            "exchange" => Command::OpenExchange,
            "basket" => Command::Basket {
                id: parse_number(words.next(), "tile id")?,
            },
            "cancel" => Command::Cancel,
            "shuffle" => Command::Shuffle,
            "play" => Command::Submit(TurnAction::Play),
            "pass" => Command::Submit(TurnAction::Pass),
            "swap" => Command::Submit(TurnAction::Exchange),
            "undo" => Command::Undo,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command {other:?}, try help"),
        };
        Ok(command)
    }
}

fn render(session: &GameSession) {
    for row in session.board_rows() {
        let line: Vec<String> = row
            .iter()
            .map(|cell| match (&cell.tile, cell.height_indicator) {
                (Some(tile), Some(height)) if tile.provisional => format!("{}{height}*", tile.top),
                (Some(tile), Some(height)) => format!("{}{height} ", tile.top),
                (Some(tile), None) if tile.provisional => format!("{}* ", tile.top),
                (Some(tile), None) => format!("{}  ", tile.top),
                (None, _) => format!("{:<3}", cell.label.unwrap_or(".")),
            })
            .collect();
        println!("{}", line.join(""));
    }

    let rack: Vec<String> = session
        .rack_view()
        .iter()
        .map(|slot| match slot {
            Some(tile) => match tile.points(session.variant()) {
                Some(points) => format!("{}#{}({points})", tile.display_letter(), tile.id),
                None => format!("{}#{}", tile.display_letter(), tile.id),
            },
            None => "_".to_string(),
        })
        .collect();
    println!("rack: {}", rack.join(" "));

    if session.is_exchanging() {
        let basket: Vec<String> = session
            .basket_tiles()
            .iter()
            .map(|t| format!("{}#{}", t.display_letter(), t.id))
            .collect();
        println!("exchange: [{}]", basket.join(" "));
    }

    let badges = session.badges();
    if let Some(points) = badges.points {
        let muted = if badges.processing { " (updating)" } else { "" };
        println!("points: {points}{muted}");
    }
    if let Some(error) = badges.word_error {
        println!("{error}");
    }
    if let Some(error) = badges.validation_error {
        println!("error: {error}");
    }
    println!(
        "state: {:?}{}",
        session.state(),
        if session.can_play() { ", play enabled" } else { "" }
    );
}

async fn run(session: &mut GameSession, command: Command) -> Result<bool> {
    match command {
        Command::Show | Command::Help => {}
        Command::Move { id, slot } => {
            session.move_tile(id, slot)?;
        }
        Command::Place { id, coord } => {
            session.place_tile(id, coord)?;
        }
        Command::Return { id } => {
            session.return_to_rack(id);
        }
        Command::ReturnAll => {
            session.return_all_to_rack();
        }
        Command::OpenExchange => session.open_exchange(),
        Command::Basket { id } => {
            session.exchange_tile(id)?;
        }
        Command::Cancel => session.cancel_exchange(),
        Command::Shuffle => {
            if !session.shuffle() {
                println!("return your tiles to the rack before shuffling");
            }
        }
        Command::Submit(action) => {
            let redirect = session.submit(action).await?;
            println!("turn submitted, continue at {}", redirect.location);
            return Ok(false);
        }
        Command::Undo => {
            let redirect = session.undo().await?;
            println!("turn undone, continue at {}", redirect.location);
            return Ok(false);
        }
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let props_path = env::args()
        .nth(1)
        .or_else(|| env::var("MOUNT_PROPS").ok())
        .context("pass the mount props file as the first argument or set MOUNT_PROPS")?;
    let props = MountProps::from_json_file(&props_path)
        .with_context(|| format!("failed to load mount props from {props_path}"))?;
    let config = SessionConfig::from_env();

    info!(props = %props_path, "Starting tile session");
    let (mut session, mut events) = GameSession::connect(props, config)?;

    println!("{HELP}");
    render(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                let landed = matches!(event, SessionEvent::PreviewReady { .. });
                if session.handle_event(event) && landed {
                    render(&session);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = match Command::parse(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                if command == Command::Help {
                    println!("{HELP}");
                }
                match run(&mut session, command).await {
                    Ok(true) => render(&session),
                    Ok(false) => break,
                    Err(e) => {
                        warn!(error = %e, "Command failed");
                        match e.downcast_ref::<GameError>() {
                            Some(err) if !err.is_recoverable() => {
                                println!("{}", err.user_message());
                                break;
                            }
                            Some(err) => println!("{}", err.user_message()),
                            None => println!("{e}"),
                        }
                        render(&session);
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("").unwrap(), Command::Show);
        assert_eq!(
            Command::parse("place 3 7 8").unwrap(),
            Command::Place { id: 3, coord: Coord::new(7, 8) }
        );
        assert_eq!(Command::parse("move 1 0").unwrap(), Command::Move { id: 1, slot: 0 });
        assert_eq!(Command::parse("swap").unwrap(), Command::Submit(TurnAction::Exchange));
        assert_eq!(Command::parse("  return-all ").unwrap(), Command::ReturnAll);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse("place 3 7").unwrap_err().to_string(), "missing y");
        assert_eq!(Command::parse("basket x").unwrap_err().to_string(), "invalid tile id");
        assert!(Command::parse("teleport").is_err());
    }
}
