use std::fs;
use std::path::PathBuf;
use std::process::Command as Process;

use anyhow::{Context, Result, bail};
use brainfm_api::auth::StoredSession;
use brainfm_api::{Connection, Outcome, Station};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "brainfm", version, about = "Unofficial Brain.fm CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save login credentials
    Login {
        /// Account email
        #[arg(required_unless_present = "check", conflicts_with = "check")]
        email: Option<String>,
        /// Account password
        #[arg(required_unless_present = "check", conflicts_with = "check")]
        password: Option<String>,
        /// Check current session status
        #[arg(long)]
        check: bool,
    },
    /// Clear saved session
    Logout,
    /// List explore stations
    Stations {
        /// Bypass the on-disk station cache
        #[arg(long)]
        refresh: bool,
    },
    /// Show one station
    Station {
        /// Station ID
        station_id: i64,
    },
    /// Fetch a playback token
    Token {
        /// Station ID
        station_id: i64,
    },
    /// Open a station's stream in the default browser or a custom player
    Play {
        /// Station ID
        station_id: i64,
        /// Player command to launch instead of the platform opener
        #[arg(short, long, value_name = "CMD")]
        player: Option<String>,
    },
    /// Rate a playback session
    Rate {
        /// Session ID (from `token`)
        session_id: i64,
        /// Rating value
        rating: i64,
        /// Stream token the session was played with
        stream_token: String,
        /// Station ID
        station_id: i64,
        /// Free-text reason
        reason: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Login {
            email,
            password,
            check,
        } => cmd_login(email, password, check),
        Command::Logout => cmd_logout(),
        Command::Stations { refresh } => cmd_stations(refresh),
        Command::Station { station_id } => cmd_station(station_id),
        Command::Token { station_id } => cmd_token(station_id),
        Command::Play { station_id, player } => cmd_play(station_id, player.as_deref()),
        Command::Rate {
            session_id,
            rating,
            stream_token,
            station_id,
            reason,
        } => cmd_rate(session_id, rating, &stream_token, station_id, &reason),
    }
}

/// Build a connection from the saved session, preferring the cached visitor
/// identity over a fresh login.
fn connect() -> Result<Connection> {
    let session = StoredSession::load()?;
    if !session.is_usable() {
        bail!("not logged in; run `brainfm login EMAIL PASSWORD` first");
    }
    let mut builder = Connection::builder();
    if let Some(credentials) = session.credentials() {
        builder = builder.credentials(credentials);
    }
    if let Some(svu) = session.svu {
        builder = builder.identity(svu);
    }
    Ok(builder.build()?)
}

/// Write the connection's identity back to the session file so the next run
/// skips the login round-trip.
fn persist_identity(conn: &Connection) -> Result<()> {
    let Some(svu) = conn.cached_identity() else {
        return Ok(());
    };
    let mut session = StoredSession::load()?;
    if session.svu.as_deref() != Some(svu) {
        session.svu = Some(svu.to_owned());
        session.save()?;
    }
    Ok(())
}

// ── login / logout ──

fn cmd_login(email: Option<String>, password: Option<String>, check: bool) -> Result<()> {
    if check {
        let session = StoredSession::load()?;
        if !session.is_usable() {
            println!("Not logged in.");
            return Ok(());
        }
        let conn = connect()?;
        match conn.identity() {
            Ok(svu) => println!("Session established (svu {svu})"),
            Err(e) => println!("Session exists but validation failed: {e}"),
        }
        persist_identity(&conn)?;
        return Ok(());
    }

    let session = StoredSession {
        email,
        password,
        svu: None,
    };
    session.save()?;
    println!("Credentials saved.");
    Ok(())
}

fn cmd_logout() -> Result<()> {
    StoredSession::clear()?;
    println!("Session cleared.");
    Ok(())
}

// ── stations ──

fn cmd_stations(refresh: bool) -> Result<()> {
    if !refresh {
        if let Some(stations) = load_station_cache() {
            print_stations(&stations);
            return Ok(());
        }
    }

    let conn = connect()?;
    let stations = match conn.get_stations().context("failed to list stations")? {
        Outcome::Success(stations) => stations,
        Outcome::Failure(error) => bail!("{error}"),
    };
    persist_identity(&conn)?;
    save_station_cache(&stations);
    print_stations(&stations);
    Ok(())
}

fn print_stations(stations: &[Station]) {
    for s in stations {
        match s.parent_id {
            Some(parent) => println!("  [{}] {} ({}) parent={parent}", s.id, s.name, s.canonical_name),
            None => println!("  [{}] {} ({})", s.id, s.name, s.canonical_name),
        }
    }
}

fn station_cache_path() -> Option<PathBuf> {
    Some(dirs::cache_dir()?.join("brainfm").join("stations.json"))
}

fn load_station_cache() -> Option<Vec<Station>> {
    let data = fs::read_to_string(station_cache_path()?).ok()?;
    serde_json::from_str(&data).ok()
}

fn save_station_cache(stations: &[Station]) {
    let Some(path) = station_cache_path() else { return };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    if let Ok(data) = serde_json::to_string_pretty(stations) {
        // Cache failures are not worth failing the command over.
        let _ = fs::write(path, data);
    }
}

fn cmd_station(station_id: i64) -> Result<()> {
    let conn = connect()?;
    match conn.get_station(station_id)? {
        Outcome::Success(detail) => {
            println!("Station:  {} (id={})", detail.name, detail.id);
            println!("Name:     {}", detail.canonical_name);
            println!("Playable: {}", if detail.playable { "yes" } else { "no" });
        }
        Outcome::Failure(error) => bail!("{error}"),
    }
    persist_identity(&conn)?;
    Ok(())
}

// ── token / play ──

fn cmd_token(station_id: i64) -> Result<()> {
    let conn = connect()?;
    match conn.get_token(station_id, None)? {
        Outcome::Success(token) => {
            println!("Session: {} (id={})", token.name, token.session_id);
            println!("Group:   {}", token.group);
            println!("Token:   {}", token.session_token);
        }
        Outcome::Failure(error) => bail!("{error}"),
    }
    persist_identity(&conn)?;
    Ok(())
}

fn cmd_play(station_id: i64, player: Option<&str>) -> Result<()> {
    let conn = connect()?;
    let token = match conn.get_token(station_id, None)? {
        Outcome::Success(token) => token,
        Outcome::Failure(error) => bail!("{error}"),
    };
    persist_identity(&conn)?;

    let url = conn.stream_url(&token.session_token);
    println!("{url}");

    let mut command = launch_command(player, &url);
    let program = command.get_program().to_string_lossy().into_owned();
    let status = command
        .status()
        .with_context(|| format!("failed to launch {program}"))?;
    if !status.success() {
        bail!("{program} exited with {status}");
    }
    Ok(())
}

/// The command that plays a stream URL: the given player, or the platform's
/// URL opener (the web player opens streams in a browser tab).
fn launch_command(player: Option<&str>, url: &str) -> Process {
    let mut command = match player {
        Some(player) => Process::new(player),
        None => opener(),
    };
    command.arg(url);
    command
}

#[cfg(target_os = "macos")]
fn opener() -> Process {
    Process::new("open")
}

#[cfg(target_os = "windows")]
fn opener() -> Process {
    let mut command = Process::new("cmd");
    command.args(["/C", "start", ""]);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener() -> Process {
    Process::new("xdg-open")
}

// ── rate ──

fn cmd_rate(
    session_id: i64,
    rating: i64,
    stream_token: &str,
    station_id: i64,
    reason: &str,
) -> Result<()> {
    let conn = connect()?;
    match conn.set_rating(session_id, rating, stream_token, station_id, reason)? {
        Outcome::Success(()) => println!("Rating saved."),
        Outcome::Failure(error) => bail!("{error}"),
    }
    persist_identity(&conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsStr;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn login_check_conflicts_with_credentials() {
        assert!(Cli::try_parse_from(["brainfm", "login", "--check", "a@b.c", "pw"]).is_err());
        assert!(Cli::try_parse_from(["brainfm", "login", "--check"]).is_ok());
        assert!(Cli::try_parse_from(["brainfm", "login", "a@b.c", "pw"]).is_ok());
        // credentials come in pairs
        assert!(Cli::try_parse_from(["brainfm", "login", "a@b.c"]).is_err());
    }

    #[test]
    fn play_uses_the_given_player() {
        let command = launch_command(Some("mpv"), "https://stream.brain.fm/?tkn=t");
        assert_eq!(command.get_program(), "mpv");
        let args: Vec<&OsStr> = command.get_args().collect();
        assert_eq!(args.last().copied(), Some(OsStr::new("https://stream.brain.fm/?tkn=t")));
    }

    #[test]
    fn play_defaults_to_the_platform_opener() {
        let command = launch_command(None, "https://stream.brain.fm/?tkn=t");
        assert!(!command.get_program().is_empty());
        let args: Vec<&OsStr> = command.get_args().collect();
        assert_eq!(args.last().copied(), Some(OsStr::new("https://stream.brain.fm/?tkn=t")));
    }
}
