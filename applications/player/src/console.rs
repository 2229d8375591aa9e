//! Console input and rendering

use crate::session::{SessionView, UiCommand};
use refrain_core::Catalog;
use refrain_playback::{Command, TrackPhase};
use std::fmt::Write as _;

pub const HELP: &str = "\
Commands:
  select <album> <track>   select a track and play it
  cue <album> <track>      select a track without playing
  album <album>            browse an album
  toggle                   play/pause
  next | prev              move within the album
  seek <seconds>           move the playhead
  volume <0-100>           set the volume
  mute | unmute
  like                     like or unlike the current track
  likes                    reload likes from the server
  status                   show the player state
  albums                   list the catalog
  quit";

/// What a console line asks for
#[derive(Debug)]
pub enum Input {
    Session(UiCommand),
    /// Needs a `SessionView` to print
    ShowStatus,
    ShowAlbums,
    Help,
}

/// Parse one console line
pub fn parse_line(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".to_string());
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb, args.as_slice()) {
        ("select" | "play", [album, track]) => UiCommand::Select {
            album: number(album)?,
            track: number(track)?,
            play: true,
        },
        ("cue", [album, track]) => UiCommand::Select {
            album: number(album)?,
            track: number(track)?,
            play: false,
        },
        ("album", [album]) => UiCommand::Browse(number(album)?),
        ("toggle" | "p", []) => UiCommand::Playback(Command::TogglePlayPause),
        ("next" | "n", []) => UiCommand::Playback(Command::NextTrack),
        ("prev" | "b", []) => UiCommand::Playback(Command::PrevTrack),
        ("seek", [seconds]) => {
            let seconds: f64 = seconds
                .parse()
                .map_err(|_| format!("not a position: {}", seconds))?;
            UiCommand::Playback(Command::Seek(seconds))
        }
        ("volume" | "vol", [level]) => {
            let level: u8 = level
                .parse()
                .ok()
                .filter(|l| *l <= 100)
                .ok_or_else(|| format!("volume must be 0-100, got {}", level))?;
            UiCommand::Playback(Command::SetVolume(level))
        }
        ("mute", []) => UiCommand::Playback(Command::Mute),
        ("unmute", []) => UiCommand::Playback(Command::Unmute),
        ("like", []) => UiCommand::ToggleLike,
        ("likes", []) => UiCommand::RefreshLikes,
        ("status" | "s", []) => return Ok(Input::ShowStatus),
        ("albums", []) => return Ok(Input::ShowAlbums),
        ("help" | "?", []) => return Ok(Input::Help),
        ("quit" | "exit" | "q", []) => UiCommand::Quit,
        _ => return Err(format!("unknown command: {} (try 'help')", line.trim())),
    };

    Ok(Input::Session(command))
}

fn number(word: &str) -> Result<usize, String> {
    word.parse()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| format!("expected a positive number, got {}", word))
}

/// One-line player state
pub fn render_status(view: &SessionView) -> String {
    let snapshot = &view.snapshot;
    let mut out = String::new();

    match &snapshot.intent.current_track {
        Some(track) => {
            let _ = write!(out, "{}", track.title);
            if view.liked {
                out.push_str(" ♥");
            }
        }
        None => out.push_str("(no track)"),
    }

    let state = match snapshot.phase {
        TrackPhase::Playing => "playing",
        TrackPhase::Paused => "paused",
        TrackPhase::Error => "error",
        _ if snapshot.status.is_loading => "loading",
        _ => "stopped",
    };

    let _ = write!(
        out,
        " [{}] {} / {}  vol {}{}",
        state,
        clock(snapshot.status.current_time),
        clock(snapshot.status.duration),
        snapshot.volume,
        if snapshot.muted { " (muted)" } else { "" }
    );

    if let Some(error) = snapshot.status.last_error {
        let _ = write!(out, "  ! {}", error);
    }
    if !snapshot.controls_enabled() {
        out.push_str("  (restoring)");
    }

    out
}

/// Catalog listing with 1-based positions
pub fn render_albums(catalog: &Catalog) -> String {
    let mut out = format!("{}\n", catalog.artist());
    for (a, album) in catalog.albums().iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {} ({})", a + 1, album.title, album.year);
        for (t, track) in album.tracks.iter().enumerate() {
            let _ = writeln!(out, "      {:>2}. {}", t + 1, track.title);
        }
    }
    out
}

fn clock(seconds: f64) -> String {
    let total = if seconds.is_finite() { seconds.max(0.0) as u64 } else { 0 };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_select() {
        match parse_line("select 2 3") {
            Ok(Input::Session(UiCommand::Select { album, track, play })) => {
                assert_eq!((album, track, play), (2, 3, true));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_playback_commands() {
        assert!(matches!(
            parse_line("seek 42.5"),
            Ok(Input::Session(UiCommand::Playback(Command::Seek(s)))) if s == 42.5
        ));
        assert!(matches!(
            parse_line("volume 30"),
            Ok(Input::Session(UiCommand::Playback(Command::SetVolume(30))))
        ));
        assert!(matches!(
            parse_line("  next  "),
            Ok(Input::Session(UiCommand::Playback(Command::NextTrack)))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_line("").is_err());
        assert!(parse_line("volume 101").is_err());
        assert!(parse_line("select 0 1").is_err());
        assert!(parse_line("seek soon").is_err());
        assert!(parse_line("dance").is_err());
    }

    #[test]
    fn test_clock() {
        assert_eq!(clock(0.0), "0:00");
        assert_eq!(clock(42.9), "0:42");
        assert_eq!(clock(185.0), "3:05");
        assert_eq!(clock(f64::NAN), "0:00");
    }
}
