//! Command-line interface and REPL

use anyhow::{anyhow, bail, Context, Result};
use colored::*;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::blemidi::{encode_cc_packet, ControlChange};
use crate::params::{Nudge, ParamKey};
use crate::session::{ApplyOutcome, DeviceInfo, SessionActorHandle, SessionSnapshot};
use crate::transport::replay::parse_hex_line;

const HELP: &str = "\
Commands:
  packet <hex>          feed a raw BLE-MIDI notification
  cc <n> <value>        simulate controller <n> sending <value> (0-127)
  set <param> <value>   set a parameter (clamped on apply)
  up|down <param>       nudge a parameter by one step
  apply [force]         send parameters if changed (or always, with force)
  show                  print controls and parameters
  dump                  print the session as YAML
  connect | disconnect  simulate the device link
  help                  this text
  exit | quit           leave";

/// A parsed REPL line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Packet(Vec<u8>),
    Cc { controller: u8, value: u8 },
    Set { key: ParamKey, value: i32 },
    Nudge { key: ParamKey, direction: Nudge },
    Apply { force: bool },
    Show,
    Dump,
    Connect,
    Disconnect,
    Help,
    Exit,
}

/// Parse one REPL line. Returns `Ok(None)` for blank lines.
pub fn parse_command(line: &str) -> Result<Option<ReplCommand>> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();

    let param = |idx: usize| -> Result<ParamKey> {
        let name = args
            .get(idx)
            .ok_or_else(|| anyhow!("'{}' needs a parameter name", verb))?;
        Ok(name.parse::<ParamKey>()?)
    };

    let cmd = match verb.to_lowercase().as_str() {
        "packet" | "p" => {
            let bytes = parse_hex_line(&args.join(" "))?
                .ok_or_else(|| anyhow!("'packet' needs hex bytes"))?;
            ReplCommand::Packet(bytes)
        }
        "cc" => {
            if args.len() != 2 {
                bail!("usage: cc <controller> <value>");
            }
            let controller: u8 = args[0].parse().context("controller must be 0-127")?;
            let value: u8 = args[1].parse().context("value must be 0-127")?;
            if controller > 127 || value > 127 {
                bail!("controller and value must be 0-127");
            }
            ReplCommand::Cc { controller, value }
        }
        "set" => {
            let key = param(0)?;
            let value = args
                .get(1)
                .ok_or_else(|| anyhow!("usage: set <param> <value>"))?
                .parse::<i32>()
                .context("value must be an integer")?;
            ReplCommand::Set { key, value }
        }
        "up" | "+" => ReplCommand::Nudge {
            key: param(0)?,
            direction: Nudge::Up,
        },
        "down" | "-" => ReplCommand::Nudge {
            key: param(0)?,
            direction: Nudge::Down,
        },
        "apply" => ReplCommand::Apply {
            force: matches!(args.first(), Some(&"force") | Some(&"-f")),
        },
        "show" | "ls" => ReplCommand::Show,
        "dump" => ReplCommand::Dump,
        "connect" => ReplCommand::Connect,
        "disconnect" => ReplCommand::Disconnect,
        "help" | "?" => ReplCommand::Help,
        "exit" | "quit" => ReplCommand::Exit,
        other => bail!("unknown command '{}' (try 'help')", other),
    };

    Ok(Some(cmd))
}

/// Render the session for the `show` command
pub fn format_snapshot(snap: &SessionSnapshot) -> String {
    let mut out = String::new();

    let link = match &snap.device {
        Some(d) => format!("connected to {} ({} knobs)", d.model, d.knobs).green(),
        None => "disconnected".red(),
    };
    out.push_str(&format!("{} {}\n", "Device:".bold(), link));

    out.push_str(&format!("{}\n", "Controls:".bold()));
    for control in &snap.controls {
        out.push_str(&format!("  {:<8} {}\n", control.name, control.value));
    }

    out.push_str(&format!("{}\n", "Parameters:".bold()));
    for p in &snap.params {
        let sent = snap.last_sent[p.key];
        let marker = if i32::from(sent) != p.value {
            format!(" (sent {})", sent).yellow().to_string()
        } else {
            String::new()
        };
        out.push_str(&format!(
            "  {:<18} {:>4}  [{}..{} step {}]{}\n",
            p.label, p.value, p.min, p.max, p.step, marker
        ));
    }

    if snap.pending_changes {
        out.push_str(&format!("{}\n", "Unsent changes - run 'apply'".yellow()));
    }
    out
}

fn describe_outcome(outcome: &ApplyOutcome) -> ColoredString {
    match outcome {
        ApplyOutcome::Unchanged => "No changes to send".normal(),
        ApplyOutcome::CommittedLocally { values } => {
            format!("Committed locally (not connected): {}", values).yellow()
        }
        ApplyOutcome::Sent { values } => format!("Sent: {}", values).green(),
        ApplyOutcome::SendFailed { values, reason } => {
            format!("Committed {} but send failed: {}", values, reason).red()
        }
        ApplyOutcome::Rejected { reason } => format!("Rejected: {}", reason).red(),
    }
}

/// Execute one command against the session. Returns false to leave the REPL.
async fn execute(cmd: ReplCommand, session: &SessionActorHandle, device: &DeviceInfo) -> Result<bool> {
    debug!(?cmd, "REPL command");

    match cmd {
        ReplCommand::Packet(bytes) => session.notify(bytes),
        ReplCommand::Cc { controller, value } => {
            session.notify(encode_cc_packet(0, &[ControlChange::new(controller, value)]));
        }
        ReplCommand::Set { key, value } => session.set_param(key, value),
        ReplCommand::Nudge { key, direction } => session.nudge_param(key, direction),
        ReplCommand::Apply { force } => {
            let outcome = session.apply(force).await;
            println!("{}", describe_outcome(&outcome));
        }
        ReplCommand::Show => {
            let snap = session
                .snapshot()
                .await
                .ok_or_else(|| anyhow!("session closed"))?;
            print!("{}", format_snapshot(&snap));
        }
        ReplCommand::Dump => {
            let snap = session
                .snapshot()
                .await
                .ok_or_else(|| anyhow!("session closed"))?;
            print!("{}", serde_yaml::to_string(&snap)?);
        }
        ReplCommand::Connect => session.connected(device.clone()),
        ReplCommand::Disconnect => session.disconnected(),
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::Exit => return Ok(false),
    }

    Ok(true)
}

/// True if `line` ends the REPL
fn is_exit_line(line: &str) -> bool {
    matches!(
        line.split_whitespace().next().map(str::to_lowercase).as_deref(),
        Some("exit") | Some("quit")
    )
}

/// Send lines from `next_line` until input ends, the receiver goes away, or
/// an exit line has been forwarded. Returns the number of lines sent.
fn forward_lines(
    mut next_line: impl FnMut() -> Option<String>,
    tx: &mpsc::UnboundedSender<String>,
) -> usize {
    let mut sent = 0;
    while let Some(line) = next_line() {
        let exit = is_exit_line(&line);
        if tx.send(line).is_err() {
            break;
        }
        sent += 1;
        if exit {
            break;
        }
    }
    sent
}

/// Run the interactive REPL until `exit` or end of input
pub async fn run_repl(session: SessionActorHandle, device: DeviceInfo) -> Result<()> {
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();

    // rustyline blocks, so it gets its own thread
    tokio::task::spawn_blocking(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                warn!("Failed to start line editor: {}", e);
                return;
            }
        };
        forward_lines(
            || {
                let line = rl.readline("mixy> ").ok()?;
                let _ = rl.add_history_entry(line.as_str());
                Some(line)
            },
            &line_tx,
        );
    });

    println!("{}", "Type 'help' for commands".dimmed());

    while let Some(line) = line_rx.recv().await {
        match parse_command(&line) {
            Ok(Some(cmd)) => match execute(cmd, &session, &device).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => println!("{} {:#}", "error:".red(), e),
            },
            Ok(None) => {}
            Err(e) => println!("{} {:#}", "error:".red(), e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValues;
    use crate::session::{Session, SessionActor};
    use crate::transport::ConsoleTransport;
    use std::sync::Arc;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(
            parse_command("packet 80 80 B0 01 7F").unwrap(),
            Some(ReplCommand::Packet(vec![0x80, 0x80, 0xB0, 0x01, 0x7F]))
        );
        assert_eq!(
            parse_command("cc 3 64").unwrap(),
            Some(ReplCommand::Cc {
                controller: 3,
                value: 64
            })
        );
        assert_eq!(
            parse_command("set slow_interval 450").unwrap(),
            Some(ReplCommand::Set {
                key: ParamKey::SlowInterval,
                value: 450
            })
        );
        assert_eq!(
            parse_command("down FastTimeout").unwrap(),
            Some(ReplCommand::Nudge {
                key: ParamKey::FastTimeout,
                direction: Nudge::Down
            })
        );
        assert_eq!(
            parse_command("apply force").unwrap(),
            Some(ReplCommand::Apply { force: true })
        );
        assert_eq!(
            parse_command("APPLY").unwrap(),
            Some(ReplCommand::Apply { force: false })
        );
        assert_eq!(parse_command("quit").unwrap(), Some(ReplCommand::Exit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("set volume 3").is_err());
        assert!(parse_command("set SlowInterval").is_err());
        assert!(parse_command("cc 200 1").is_err());
        assert!(parse_command("cc 1").is_err());
        assert!(parse_command("packet").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn test_reader_stops_after_exit_line() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut input = vec!["show", "  Quit  ", "show"].into_iter().map(String::from);

        assert_eq!(forward_lines(|| input.next(), &tx), 2);
        // The line after quit is never read from the terminal
        assert_eq!(input.next().as_deref(), Some("show"));
        assert_eq!(rx.try_recv().unwrap(), "show");
        assert_eq!(rx.try_recv().unwrap(), "  Quit  ");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reader_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(rx);
        let mut input = vec!["show", "show"].into_iter().map(String::from);
        assert_eq!(forward_lines(|| input.next(), &tx), 0);
    }

    #[test]
    fn test_exit_lines() {
        assert!(is_exit_line("exit"));
        assert!(is_exit_line("QUIT now"));
        assert!(!is_exit_line(""));
        assert!(!is_exit_line("exiting"));
        assert!(!is_exit_line("show exit"));
    }

    #[tokio::test]
    async fn test_execute_against_session() {
        let handle = SessionActor::spawn(
            Session::new(&[1, 2, 3, 4, 5], ParamValues::DEFAULT),
            Arc::new(ConsoleTransport::new("test")),
        );
        let device = DeviceInfo {
            model: "Mixy Beta".to_string(),
            serial_number: "unknown".to_string(),
            knobs: 5,
        };

        for line in ["connect", "cc 2 127", "set ChangeThreshold 42"] {
            let cmd = parse_command(line).unwrap().unwrap();
            assert!(execute(cmd, &handle, &device).await.unwrap());
        }
        assert!(!execute(ReplCommand::Exit, &handle, &device).await.unwrap());

        let snap = handle.snapshot().await.unwrap();
        assert!(snap.connected);
        assert_eq!(snap.controls[1].value.percent(), Some(100));
        assert_eq!(snap.params[ParamKey::ChangeThreshold.index()].value, 42);

        colored::control::set_override(false);
        let text = format_snapshot(&snap);
        assert!(text.contains("CC 2"));
        assert!(text.contains("(sent 10)"));
    }
}
