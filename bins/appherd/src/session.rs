//! Interactive supervisor: commands on stdin, status on stdout.

use anyhow::Result;
use appherd_common::ManagedPath;
use appherd_process_management::{BulkReport, Settings, StatusPoller, SupervisionRegistry};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::print_entries;

const HELP: &str = "\
commands:
  list                 show entries
  start N | kill N     start or kill entry N (number or path)
  toggle N             flip entry N
  run-all | kill-all   start or kill every entry
  add PATH...          add paths
  remove N             remove entry N
  remove-all           remove every entry
  quit                 leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionCommand {
    List,
    Start(String),
    Kill(String),
    Toggle(String),
    RunAll,
    KillAll,
    Add(Vec<String>),
    Remove(String),
    RemoveAll,
    Help,
    Quit,
}

impl SessionCommand {
    /// Parse one input line. `Ok(None)` for a blank line.
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = shell_words::split(line).map_err(|e| e.to_string())?;
        if words.is_empty() {
            return Ok(None);
        }
        let verb = words.remove(0);

        let one = |words: Vec<String>| -> Result<String, String> {
            match <[String; 1]>::try_from(words) {
                Ok([entry]) => Ok(entry),
                Err(_) => Err(format!("'{}' takes exactly one entry", verb)),
            }
        };

        let command = match verb.as_str() {
            "list" | "ls" => SessionCommand::List,
            "start" => SessionCommand::Start(one(words)?),
            "kill" => SessionCommand::Kill(one(words)?),
            "toggle" => SessionCommand::Toggle(one(words)?),
            "run-all" => SessionCommand::RunAll,
            "kill-all" => SessionCommand::KillAll,
            "add" if words.is_empty() => return Err("'add' needs at least one path".to_string()),
            "add" => SessionCommand::Add(words),
            "remove" => SessionCommand::Remove(one(words)?),
            "remove-all" => SessionCommand::RemoveAll,
            "help" | "?" => SessionCommand::Help,
            "quit" | "exit" => SessionCommand::Quit,
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };
        Ok(Some(command))
    }
}

/// Map a 1-based entry number or a managed path to the entry.
fn resolve_entry(entries: &[ManagedPath], reference: &str) -> Option<ManagedPath> {
    if let Ok(n) = reference.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| entries.get(i)).cloned();
    }
    entries.iter().find(|p| p.as_str() == reference).cloned()
}

enum Flow {
    Continue,
    Quit,
}

fn execute(registry: &mut SupervisionRegistry, command: SessionCommand) -> Flow {
    let entry = |registry: &SupervisionRegistry, reference: &str| {
        let found = resolve_entry(registry.entries(), reference);
        if found.is_none() {
            println!("no entry '{}'", reference);
        }
        found
    };

    match command {
        SessionCommand::List => print_entries(&registry.list_entries()),
        SessionCommand::Start(reference) => {
            if let Some(path) = entry(registry, &reference) {
                report(&path, registry.start(&path));
            }
        }
        SessionCommand::Kill(reference) => {
            if let Some(path) = entry(registry, &reference) {
                report(&path, registry.kill(&path));
            }
        }
        SessionCommand::Toggle(reference) => {
            if let Some(path) = entry(registry, &reference) {
                report(&path, registry.toggle(&path).map(|_| ()));
            }
        }
        SessionCommand::RunAll => print_bulk(&registry.set_all_alive(true)),
        SessionCommand::KillAll => print_bulk(&registry.set_all_alive(false)),
        SessionCommand::Add(paths) => match registry.add(paths) {
            Ok(added) => println!("added {} path(s)", added.len()),
            Err(e) => println!("add failed: {}", e),
        },
        SessionCommand::Remove(reference) => {
            if let Some(path) = entry(registry, &reference) {
                match registry.remove(&path) {
                    Ok(()) => println!("removed {}", path),
                    Err(e) => println!("remove failed: {}", e),
                }
            }
        }
        SessionCommand::RemoveAll => match registry.remove_all() {
            Ok(()) => println!("removed all paths"),
            Err(e) => println!("remove-all failed: {}", e),
        },
        SessionCommand::Help => println!("{}", HELP),
        SessionCommand::Quit => return Flow::Quit,
    }
    Flow::Continue
}

/// One stdin line as text, without its line ending. Lines that are not
/// UTF-8 are logged and skipped.
fn decode_line(mut bytes: Vec<u8>) -> Option<String> {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    match String::from_utf8(bytes) {
        Ok(line) => Some(line),
        Err(e) => {
            warn!(
                "Ignoring input that is not valid UTF-8: {:?}",
                String::from_utf8_lossy(e.as_bytes())
            );
            None
        }
    }
}

fn report<E: std::fmt::Display>(path: &ManagedPath, result: Result<(), E>) {
    if let Err(e) = result {
        println!("{}: {}", path.file_name(), e);
    }
}

fn print_bulk(report: &BulkReport) {
    println!(
        "{} succeeded, {} failed",
        report.succeeded.len(),
        report.failed.len()
    );
    for (path, e) in &report.failed {
        println!("  {}: {}", path, e);
    }
}

pub async fn run(settings: &Settings, mut registry: SupervisionRegistry) -> Result<()> {
    if settings.run_all_at_startup {
        info!("Starting all entries at session start");
        print_bulk(&registry.set_all_alive(true));
    }

    print_entries(&registry.list_entries());
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).split(b'\n');
    let mut poller = StatusPoller::new(settings.poll_interval);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            segment = lines.next_segment() => {
                let bytes = match segment {
                    Ok(Some(bytes)) => bytes,
                    Ok(None) => {
                        info!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        warn!("Failed to read stdin, ending session: {}", e);
                        break;
                    }
                };
                let Some(line) = decode_line(bytes) else {
                    continue;
                };
                match SessionCommand::parse(&line) {
                    Ok(Some(command)) => {
                        if let Flow::Quit = execute(&mut registry, command) {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{}", e),
                }
            }
            _ = poller.tick() => {
                let snapshot = registry.list_entries();
                if let Some(common) = poller.observe(&snapshot) {
                    println!("Common status: {}", common);
                }
            }
        }
    }

    if settings.kill_all_on_close {
        info!("Killing all entries on close");
        let report = registry.set_all_alive(false);
        if !report.is_complete() {
            warn!("{} entries could not be killed", report.failed.len());
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!("Failed to create SIGTERM handler: {}", e);
                let _ = signal::ctrl_c().await;
                info!("Received Ctrl+C signal");
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM signal");
            }
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C signal");
            }
        }
    }

    #[cfg(windows)]
    {
        let _ = signal::ctrl_c().await;
        info!("Received Ctrl+C signal");
    }
}
