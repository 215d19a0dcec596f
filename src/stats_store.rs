use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::SessionStats;

const FILE_VERSION: u8 = 1;

/// Where cross-round player stats live between sessions.
pub trait StatsLedger {
    /// Stats stored for `name`, or zeroed stats when none exist.
    fn load(&self, name: &str) -> SessionStats;

    fn save(&mut self, name: &str, stats: &SessionStats) -> Result<(), LedgerError>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredStatsEntry {
    #[serde(default)]
    name: String,
    #[serde(flatten)]
    stats: SessionStats,
    #[serde(rename = "updatedAt", alias = "updated_at", default)]
    updated_at: String,
}

#[derive(Debug, Serialize)]
struct StatsFile<'a> {
    version: u8,
    players: &'a HashMap<String, StoredStatsEntry>,
}

#[derive(Clone, Debug, Deserialize)]
struct StatsFileRaw {
    version: u8,
    #[serde(default)]
    players: HashMap<String, serde_json::Value>,
}

struct LoadedPlayers {
    players: HashMap<String, StoredStatsEntry>,
    /// Something on disk could not be carried over as-is.
    lossy: bool,
}

/// JSON-file ledger. The whole file is read once at construction and
/// rewritten on every save.
///
/// When the load had to drop data (unreadable file, unknown version, broken
/// entries) the first save moves the old file aside to
/// `<file>.corrupt-<timestamp>` before writing. If that copy fails the save
/// fails and the old file stays untouched.
pub struct JsonStatsLedger {
    file_path: PathBuf,
    players: HashMap<String, StoredStatsEntry>,
    backup_pending: bool,
}

impl JsonStatsLedger {
    pub fn new(file_path: PathBuf) -> Self {
        let loaded = load_players(&file_path);
        Self {
            file_path,
            players: loaded.players,
            backup_pending: loaded.lossy,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    fn backup_unreadable_file(&mut self) -> Result<(), LedgerError> {
        if !self.backup_pending {
            return Ok(());
        }
        if self.file_path.exists() {
            let backup = backup_path(&self.file_path);
            fs::copy(&self.file_path, &backup)?;
            tracing::warn!(
                path = %self.file_path.display(),
                backup = %backup.display(),
                "kept a copy of the unreadable stats file"
            );
        }
        self.backup_pending = false;
        Ok(())
    }

    fn write_file(&self) -> Result<(), LedgerError> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = StatsFile {
            version: FILE_VERSION,
            players: &self.players,
        };
        let text = serde_json::to_string_pretty(&payload)?;
        fs::write(&self.file_path, text)?;
        Ok(())
    }
}

impl StatsLedger for JsonStatsLedger {
    fn load(&self, name: &str) -> SessionStats {
        self.players
            .get(&ledger_key(name))
            .map(|entry| entry.stats)
            .unwrap_or_default()
    }

    fn save(&mut self, name: &str, stats: &SessionStats) -> Result<(), LedgerError> {
        let display_name = sanitize_name(name);
        self.backup_unreadable_file()?;
        self.players.insert(
            ledger_key(&display_name),
            StoredStatsEntry {
                name: display_name,
                stats: *stats,
                updated_at: now_iso(),
            },
        );
        self.write_file()?;
        tracing::debug!(path = %self.file_path.display(), name, "stats saved");
        Ok(())
    }
}

/// Ledger that never touches disk.
#[derive(Clone, Debug, Default)]
pub struct MemoryStatsLedger {
    players: HashMap<String, SessionStats>,
}

impl MemoryStatsLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsLedger for MemoryStatsLedger {
    fn load(&self, name: &str) -> SessionStats {
        self.players
            .get(&ledger_key(name))
            .copied()
            .unwrap_or_default()
    }

    fn save(&mut self, name: &str, stats: &SessionStats) -> Result<(), LedgerError> {
        self.players.insert(ledger_key(name), *stats);
        Ok(())
    }
}

/// Display name as stored: trimmed, at most 16 characters, `Player` when
/// blank.
pub fn sanitize_name(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "Player".to_string();
    }
    trimmed.chars().take(16).collect()
}

fn ledger_key(name: &str) -> String {
    sanitize_name(name).to_lowercase()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn backup_path(path: &Path) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".corrupt-{stamp}"));
    path.with_file_name(name)
}

fn load_players(path: &Path) -> LoadedPlayers {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            let lossy = error.kind() != std::io::ErrorKind::NotFound;
            if lossy {
                tracing::warn!(path = %path.display(), %error, "failed to read stats file");
            }
            return LoadedPlayers {
                players: HashMap::new(),
                lossy,
            };
        }
    };
    let entries = match serde_json::from_str::<StatsFileRaw>(&text) {
        Ok(value) if value.version == FILE_VERSION => value.players,
        Ok(value) => {
            let error = LedgerError::UnsupportedVersion(value.version);
            tracing::warn!(path = %path.display(), %error, "ignoring stats file");
            return LoadedPlayers {
                players: HashMap::new(),
                lossy: true,
            };
        }
        // unversioned files map player names straight to their stats
        Err(error) => match serde_json::from_str::<HashMap<String, serde_json::Value>>(&text) {
            Ok(legacy) => {
                tracing::info!(
                    path = %path.display(),
                    players = legacy.len(),
                    "loading unversioned stats file"
                );
                legacy
            }
            Err(_) => {
                tracing::warn!(path = %path.display(), %error, "failed to parse stats file");
                return LoadedPlayers {
                    players: HashMap::new(),
                    lossy: true,
                };
            }
        },
    };

    let mut lossy = false;
    let mut merged = HashMap::<String, StoredStatsEntry>::new();
    for (player_key, raw_value) in entries {
        let value: StoredStatsEntry = match serde_json::from_value(raw_value) {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    player = %player_key,
                    %error,
                    "skipping malformed stats entry"
                );
                lossy = true;
                continue;
            }
        };
        let Some(normalized) = sanitize_stored_entry(value, &player_key) else {
            lossy = true;
            continue;
        };
        let key = ledger_key(&normalized.name);

        match merged.get_mut(&key) {
            Some(current) => {
                let incoming = normalized.stats;
                let stats = &mut current.stats;
                stats.games_played = stats.games_played.saturating_add(incoming.games_played);
                stats.total_score = stats.total_score.saturating_add(incoming.total_score);
                stats.best_score = stats.best_score.max(incoming.best_score);
                if normalized.updated_at > current.updated_at {
                    stats.hearts_of_dead = incoming.hearts_of_dead;
                    current.name = normalized.name;
                    current.updated_at = normalized.updated_at;
                }
            }
            None => {
                merged.insert(key, normalized);
            }
        }
    }

    LoadedPlayers {
        players: merged,
        lossy,
    }
}

fn sanitize_stored_entry(
    value: StoredStatsEntry,
    fallback_name: &str,
) -> Option<StoredStatsEntry> {
    let name = if value.name.trim().is_empty() {
        fallback_name.trim()
    } else {
        value.name.trim()
    };
    if name.is_empty() {
        return None;
    }
    Some(StoredStatsEntry {
        name: sanitize_name(name),
        stats: value.stats,
        updated_at: value.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            rand::random::<u64>()
        );
        std::env::temp_dir().join(unique).join("user_stats.json")
    }

    fn stats(games: u64, total: u64, best: u64, hearts: u64) -> SessionStats {
        SessionStats {
            games_played: games,
            total_score: total,
            best_score: best,
            hearts_of_dead: hearts,
        }
    }

    fn write_raw(path: &Path, raw: &str) {
        let parent = path.parent().expect("parent exists");
        fs::create_dir_all(parent).expect("create dir");
        fs::write(path, raw).expect("write raw stats");
    }

    #[test]
    fn missing_file_loads_zeroed_stats() {
        let path = temp_file("stats-missing");
        let ledger = JsonStatsLedger::new(path);
        assert_eq!(ledger.load("Alice"), SessionStats::default());
        assert_eq!(ledger.player_count(), 0);
    }

    #[test]
    fn save_then_reload_keeps_stats_by_case_insensitive_name() {
        let path = temp_file("stats-save");
        let mut ledger = JsonStatsLedger::new(path.clone());
        ledger
            .save(" Alice ", &stats(3, 450, 200, 2))
            .expect("save succeeds");

        let reloaded = JsonStatsLedger::new(path.clone());
        assert_eq!(reloaded.load("alice"), stats(3, 450, 200, 2));
        assert_eq!(reloaded.load("ALICE"), stats(3, 450, 200, 2));

        let text = fs::read_to_string(&path).expect("file written");
        let json: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(json["version"], 1);
        let entry = &json["players"]["alice"];
        assert_eq!(entry["name"], "Alice");
        assert_eq!(entry["gamesPlayed"], 3);
        assert_eq!(entry["heartsOfDead"], 2);
        assert!(entry["updatedAt"].as_str().is_some_and(|v| !v.is_empty()));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_accepts_snake_case_fields() {
        let path = temp_file("stats-snake");
        write_raw(
            &path,
            r#"{
  "version": 1,
  "players": {
    "bob": {
      "name": "Bob",
      "games_played": 4,
      "total_score": 5000,
      "best_score": 1800,
      "hearts_of_dead": 1
    }
  }
}"#,
        );
        let ledger = JsonStatsLedger::new(path.clone());
        assert_eq!(ledger.load("bob"), stats(4, 5000, 1800, 1));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_entry_is_skipped_and_valid_entries_survive() {
        let path = temp_file("stats-partial");
        write_raw(
            &path,
            r#"{
  "version": 1,
  "players": {
    "alice": { "name": "Alice", "gamesPlayed": 2, "totalScore": 90, "bestScore": 60, "heartsOfDead": 0 },
    "broken": { "name": "Broken", "gamesPlayed": "many" },
    "carol": { "name": "Carol", "gamesPlayed": 1, "totalScore": 30, "bestScore": 30, "heartsOfDead": 3 }
  }
}"#,
        );
        let ledger = JsonStatsLedger::new(path.clone());
        assert_eq!(ledger.player_count(), 2);
        assert_eq!(ledger.load("alice"), stats(2, 90, 60, 0));
        assert_eq!(ledger.load("carol"), stats(1, 30, 30, 3));
        assert_eq!(ledger.load("broken"), SessionStats::default());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_merges_case_insensitive_names() {
        let path = temp_file("stats-merge");
        write_raw(
            &path,
            r#"{
  "version": 1,
  "players": {
    "ALICE": { "name": "Alice", "gamesPlayed": 2, "totalScore": 100, "bestScore": 70, "heartsOfDead": 1, "updatedAt": "2024-01-01T00:00:00.000Z" },
    "alice_legacy": { "name": " alice ", "gamesPlayed": 1, "totalScore": 40, "bestScore": 40, "heartsOfDead": 4, "updatedAt": "2024-02-01T00:00:00.000Z" }
  }
}"#,
        );
        let ledger = JsonStatsLedger::new(path.clone());
        assert_eq!(ledger.player_count(), 1);
        // sums and max merge; the newer entry wins the heart snapshot
        assert_eq!(ledger.load("Alice"), stats(3, 140, 70, 4));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unsupported_version_or_garbage_yields_empty_ledger() {
        let path = temp_file("stats-version");
        write_raw(&path, r#"{ "version": 2, "players": { "a": { "name": "A" } } }"#);
        assert_eq!(JsonStatsLedger::new(path.clone()).player_count(), 0);

        write_raw(&path, "not json at all");
        assert_eq!(JsonStatsLedger::new(path.clone()).player_count(), 0);
        let _ = fs::remove_file(path);
    }

    fn backups_in(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .expect("read dir")
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("user_stats.json.corrupt-"))
            })
            .collect()
    }

    #[test]
    fn unversioned_file_loads_and_survives_next_save() {
        let path = temp_file("stats-legacy");
        write_raw(
            &path,
            r#"{
  "Bob": { "games_played": 9, "total_score": 4200, "best_score": 900, "hearts_of_dead": 2 },
  "Carol": { "games_played": 1, "total_score": 30 }
}"#,
        );
        let mut ledger = JsonStatsLedger::new(path.clone());
        assert_eq!(ledger.load("bob"), stats(9, 4200, 900, 2));
        assert_eq!(ledger.load("Carol"), stats(1, 30, 0, 0));

        ledger.save("Alice", &stats(1, 10, 10, 0)).expect("save succeeds");
        let reloaded = JsonStatsLedger::new(path.clone());
        assert_eq!(reloaded.load("Bob"), stats(9, 4200, 900, 2));
        assert_eq!(reloaded.load("Alice"), stats(1, 10, 10, 0));
        assert_eq!(reloaded.player_count(), 3);
        let parent = path.parent().expect("parent exists");
        assert!(backups_in(parent).is_empty());
        let _ = fs::remove_dir_all(parent);
    }

    #[test]
    fn save_over_unreadable_file_keeps_a_copy_first() {
        let path = temp_file("stats-clobber");
        let original = r#"{ "version": 1, "players": "#;
        write_raw(&path, original);
        let mut ledger = JsonStatsLedger::new(path.clone());
        assert_eq!(ledger.player_count(), 0);

        ledger.save("Alice", &stats(1, 10, 10, 0)).expect("save succeeds");
        let parent = path.parent().expect("parent exists");
        let backups = backups_in(parent);
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0]).expect("backup readable"), original);
        assert_eq!(
            JsonStatsLedger::new(path.clone()).load("alice"),
            stats(1, 10, 10, 0)
        );

        // only the first save after a lossy load makes a copy
        ledger.save("Alice", &stats(2, 20, 10, 0)).expect("save succeeds");
        assert_eq!(backups_in(parent).len(), 1);
        let _ = fs::remove_dir_all(parent);
    }

    #[test]
    fn unsupported_version_is_copied_aside_before_save() {
        let path = temp_file("stats-future");
        let original = r#"{ "version": 2, "players": { "bob": { "name": "Bob" } } }"#;
        write_raw(&path, original);
        let mut ledger = JsonStatsLedger::new(path.clone());
        ledger.save("Alice", &stats(1, 10, 10, 0)).expect("save succeeds");

        let parent = path.parent().expect("parent exists");
        let backups = backups_in(parent);
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0]).expect("backup readable"), original);
        let _ = fs::remove_dir_all(parent);
    }

    #[test]
    fn clean_file_is_not_copied_on_save() {
        let path = temp_file("stats-clean");
        let mut ledger = JsonStatsLedger::new(path.clone());
        ledger.save("Alice", &stats(1, 10, 10, 0)).expect("save succeeds");
        let mut ledger = JsonStatsLedger::new(path.clone());
        ledger.save("Bob", &stats(1, 20, 20, 0)).expect("save succeeds");
        let parent = path.parent().expect("parent exists");
        assert!(backups_in(parent).is_empty());
        let _ = fs::remove_dir_all(parent);
    }

    #[test]
    fn memory_ledger_round_trips_by_key() {
        let mut ledger = MemoryStatsLedger::new();
        assert_eq!(ledger.load("Dana"), SessionStats::default());
        ledger.save("Dana", &stats(1, 10, 10, 0)).expect("memory save");
        assert_eq!(ledger.load(" dana "), stats(1, 10, 10, 0));
    }

    #[test]
    fn sanitize_name_trims_and_truncates() {
        assert_eq!(sanitize_name("   "), "Player");
        assert_eq!(sanitize_name("  Eve "), "Eve");
        assert_eq!(sanitize_name("abcdefghijklmnopqrstuvwxyz"), "abcdefghijklmnop");
    }
}
