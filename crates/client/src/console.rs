//! Line-oriented judging console: one command per line, words separated by spaces.

use std::fmt::Write as _;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use wakejudge::contest::vocabulary::KickerTrick;
use wakejudge::hub::{ContestHub, Outbox};
use wakejudge::{
    Approach, BibColor, JudgingStep, Outcome, ScoreField, Section, Slot, SpinDirection,
};

pub const HELP: &str = "\
commands:
  assign <rider-id> <slot> <color>   put a rider on a carrier
  unassign <slot>                    clear a carrier
  color <slot> <color>               change a carrier's bib colour
  riders                             riders not on a carrier
  board                              carriers and who is on them
  select <rider-id>                  judge a rider on a carrier
  section <kicker|rail|air trick|pass>
  approach <name>
  kicker <flip|spin|double flip|raley>
  trick <name>
  spin <degrees> <backside|frontside>
  score <division|execution|creativity|difficulty> <0-10>
  tag <modifier>                     toggle a modifier
  landed | fell                      submit the scorecard
  skip                               move to the next rider
  status | background | foreground | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Assign {
        rider_id: String,
        slot: Slot,
        color: BibColor,
    },
    Unassign(Slot),
    Color(Slot, BibColor),
    Riders,
    Board,
    Select(String),
    Section(Section),
    Approach(Approach),
    Kicker(KickerTrick),
    Trick(String),
    Spin(u16, SpinDirection),
    Score(ScoreField, f64),
    Tag(String),
    Finish(Outcome),
    Skip,
    Status,
    Background,
    Foreground,
    Help,
    Quit,
}

fn arg<'a>(words: &[&'a str], index: usize, what: &str) -> Result<&'a str> {
    words
        .get(index)
        .copied()
        .ok_or_else(|| anyhow!("missing {}", what))
}

fn rest(words: &[&str], from: usize, what: &str) -> Result<String> {
    if words.len() <= from {
        bail!("missing {}", what);
    }
    Ok(words[from..].join(" "))
}

fn choice<T: FromStr<Err = String>>(word: &str) -> Result<T> {
    word.parse().map_err(|e: String| anyhow!(e))
}

fn slot(word: &str) -> Result<Slot> {
    word.parse()
        .with_context(|| format!("'{}' is not a carrier number", word))
}

pub fn parse(line: &str) -> Result<Command> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some(name) = words.first() else {
        bail!("empty command");
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "assign" => Command::Assign {
            rider_id: arg(&words, 1, "rider id")?.to_string(),
            slot: slot(arg(&words, 2, "carrier")?)?,
            color: choice(arg(&words, 3, "bib colour")?)?,
        },
        "unassign" => Command::Unassign(slot(arg(&words, 1, "carrier")?)?),
        "color" | "colour" => Command::Color(
            slot(arg(&words, 1, "carrier")?)?,
            choice(arg(&words, 2, "bib colour")?)?,
        ),
        "riders" => Command::Riders,
        "board" => Command::Board,
        "select" => Command::Select(arg(&words, 1, "rider id")?.to_string()),
        "section" => Command::Section(choice(&rest(&words, 1, "section")?)?),
        "approach" => Command::Approach(choice(&rest(&words, 1, "approach")?)?),
        "kicker" => Command::Kicker(choice(&rest(&words, 1, "kicker trick")?)?),
        "trick" => Command::Trick(rest(&words, 1, "trick")?),
        "spin" => {
            let degrees = arg(&words, 1, "degrees")?;
            let degrees = degrees
                .parse()
                .with_context(|| format!("'{}' is not a spin", degrees))?;
            let direction = choice(arg(&words, 2, "direction")?)?;
            Command::Spin(degrees, direction)
        }
        "score" => {
            let field = choice(arg(&words, 1, "score field")?)?;
            let value = arg(&words, 2, "value")?;
            let value = value
                .parse()
                .with_context(|| format!("'{}' is not a number", value))?;
            Command::Score(field, value)
        }
        "tag" => Command::Tag(rest(&words, 1, "modifier")?),
        "landed" => Command::Finish(Outcome::Landed),
        "fell" => Command::Finish(Outcome::Fell),
        "skip" => Command::Skip,
        "status" => Command::Status,
        "background" => Command::Background,
        "foreground" => Command::Foreground,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command '{}' (try 'help')", other),
    };
    Ok(command)
}

/// Runs a contest command against the hub and returns what to print.
pub fn execute<O: Outbox + 'static>(hub: &ContestHub<O>, command: Command) -> Result<String> {
    let judge = hub.judge();
    let reply = match command {
        Command::Assign {
            rider_id,
            slot,
            color,
        } => {
            if hub.board().rider(&rider_id).is_none() {
                log::warn!("Assigning unknown rider {}", rider_id);
            }
            let carrier = hub
                .assign(&rider_id, slot, color)
                .ok_or_else(|| anyhow!("no carrier {}", slot))?;
            format!("carrier {}: {} ({})", carrier.number, rider_id, color)
        }
        Command::Unassign(slot) => {
            hub.unassign(slot)
                .ok_or_else(|| anyhow!("no carrier {}", slot))?;
            format!("carrier {} cleared", slot)
        }
        Command::Color(slot, color) => {
            hub.set_bib_color(slot, color)
                .ok_or_else(|| anyhow!("no carrier {}", slot))?;
            format!("carrier {} is now {}", slot, color)
        }
        Command::Riders => render_riders(hub),
        Command::Board => render_board(hub),
        Command::Select(rider_id) => {
            judge.select_rider(&rider_id)?;
            render_session(hub)
        }
        Command::Section(section) => {
            judge.choose_section(section)?;
            render_session(hub)
        }
        Command::Approach(approach) => {
            judge.choose_approach(approach)?;
            render_session(hub)
        }
        Command::Kicker(trick) => {
            judge.choose_kicker(trick)?;
            render_session(hub)
        }
        Command::Trick(name) => {
            judge.choose_trick(&name)?;
            render_session(hub)
        }
        Command::Spin(degrees, direction) => {
            judge.choose_spin(degrees, direction)?;
            render_session(hub)
        }
        Command::Score(field, value) => {
            judge.set_score(field, value)?;
            render_session(hub)
        }
        Command::Tag(tag) => {
            let on = judge.toggle_modifier(&tag)?;
            format!("{} {}", tag, if on { "on" } else { "off" })
        }
        Command::Finish(outcome) => {
            let scorecard = judge.finish(outcome)?;
            format!(
                "submitted {} {}: score {:.2}\n{}",
                scorecard.section,
                scorecard.trick_type,
                scorecard.score,
                render_session(hub)
            )
        }
        Command::Skip => {
            if !judge.skip() {
                bail!("no other rider on a carrier");
            }
            render_session(hub)
        }
        Command::Status => render_session(hub),
        Command::Help => HELP.to_string(),
        Command::Background | Command::Foreground | Command::Quit => {
            bail!("not a contest command")
        }
    };
    Ok(reply)
}

pub fn render_board<O: Outbox + 'static>(hub: &ContestHub<O>) -> String {
    let board = hub.board();
    let mut out = String::new();
    for carrier in board.carriers() {
        let color = carrier
            .bib_color
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let rider = match carrier.rider_id.as_deref() {
            Some(id) => board
                .rider(id)
                .map(|r| r.full_name())
                .unwrap_or_else(|| id.to_string()),
            None => "empty".to_string(),
        };
        let _ = writeln!(out, "{:>2}  {:<7} {}", carrier.number, color, rider);
    }
    out.trim_end().to_string()
}

fn render_riders<O: Outbox + 'static>(hub: &ContestHub<O>) -> String {
    let board = hub.board();
    let waiting = board.unassigned_riders();
    if waiting.is_empty() {
        return "no riders waiting".to_string();
    }
    waiting
        .iter()
        .map(|r| {
            format!(
                "{}  {} ({})",
                r.id.as_deref().unwrap_or("?"),
                r.full_name(),
                r.division_label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_session<O: Outbox + 'static>(hub: &ContestHub<O>) -> String {
    let session = hub.judge().session();
    let mut out = String::new();

    match session.active() {
        Some(active) => {
            let color = active.bib_color.map(|c| c.to_string()).unwrap_or_default();
            let _ = writeln!(out, "rider: {} {}", active.rider.display_name(), color);
        }
        None => {
            let _ = writeln!(out, "rider: none selected");
        }
    }

    let draft = session.draft();
    let _ = write!(out, "step: {}", session.step());
    let options: Vec<String> = match session.step() {
        JudgingStep::Section => Section::ALL.iter().map(|s| s.to_string()).collect(),
        JudgingStep::Approach => session
            .approach_options()
            .iter()
            .map(|a| a.to_string())
            .collect(),
        JudgingStep::Kicker => KickerTrick::ALL
            .iter()
            .map(|k| k.as_str().to_string())
            .collect(),
        JudgingStep::Rail | JudgingStep::AirTrick | JudgingStep::Flip => session
            .trick_options()
            .iter()
            .map(|t| t.to_string())
            .collect(),
        JudgingStep::Spin | JudgingStep::SpinOn | JudgingStep::SpinOff => session
            .spin_options()
            .iter()
            .map(|d| d.to_string())
            .collect(),
        JudgingStep::Score => {
            let (red, blue) = session.modifier_options();
            red.iter().chain(blue.iter()).map(|t| t.to_string()).collect()
        }
    };
    if !options.is_empty() {
        let _ = write!(out, " [{}]", options.join(", "));
    }

    if session.step() == JudgingStep::Score {
        let _ = write!(
            out,
            "\n{} {} spin {} {} | div {} exe {} cre {} dif {}",
            draft.section.map(|s| s.to_string()).unwrap_or_default(),
            draft.trick_type,
            draft.spin,
            draft.spin_direction,
            draft.division,
            draft.execution,
            draft.creativity,
            draft.difficulty,
        );
        if !draft.modifiers.is_empty() {
            let _ = write!(out, " | {}", draft.modifiers.join(", "));
        }
    }
    out
}
