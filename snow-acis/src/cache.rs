use crate::{error::Result, season::SeasonRecord, season::SeasonWindow};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// How long a cached season stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// TTL for the season containing today; it still receives reports.
    pub active_ttl: Duration,
    /// TTL for finished seasons.
    pub past_ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy {
            active_ttl: Duration::seconds(3600),
            past_ttl: Duration::seconds(31_536_000),
        }
    }
}

impl CachePolicy {
    pub fn ttl_for(&self, start_year: i32, today: &NaiveDate) -> Duration {
        let active = SeasonWindow::for_start_year(start_year)
            .map(|window| window.contains(today))
            .unwrap_or(false);
        if active {
            self.active_ttl
        } else {
            self.past_ttl
        }
    }

    /// TTL for `start_year` under the default policy.
    pub fn for_season(start_year: i32, today: &NaiveDate) -> Duration {
        CachePolicy::default().ttl_for(start_year, today)
    }
}

/// A season plus the moment it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSeason {
    pub value: SeasonRecord,
    pub fetched_at: DateTime<Utc>,
}

impl CachedSeason {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at < ttl
    }
}

/// Read-through cache of fetched seasons keyed by start year.
///
/// Entries live in memory and, when a directory is given, in
/// `snow_<year>.json` files so later runs can reuse them. The caller decides
/// the TTL on every lookup.
#[derive(Debug, Default)]
pub struct SeasonCache {
    entries: HashMap<i32, CachedSeason>,
    dir: Option<PathBuf>,
}

impl SeasonCache {
    pub fn in_memory() -> Self {
        SeasonCache::default()
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(SeasonCache {
            entries: HashMap::new(),
            dir: Some(dir),
        })
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn path_for(&self, start_year: i32) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("snow_{}.json", start_year)))
    }

    fn load(&self, start_year: i32) -> Option<CachedSeason> {
        let path = self.path_for(start_year)?;
        let bytes = fs::read(&path).ok()?;
        match serde_json::from_slice::<CachedSeason>(&bytes) {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!("ignoring unreadable cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// The cached season, if present and younger than `ttl`.
    pub fn get(&mut self, start_year: i32, now: DateTime<Utc>, ttl: Duration) -> Option<&SeasonRecord> {
        if !self.entries.contains_key(&start_year) {
            if let Some(cached) = self.load(start_year) {
                self.entries.insert(start_year, cached);
            }
        }
        let hit = self
            .entries
            .get(&start_year)
            .filter(|cached| cached.is_fresh(now, ttl))
            .map(|cached| &cached.value);
        debug!(
            "cache {} for season {}",
            if hit.is_some() { "hit" } else { "miss" },
            start_year
        );
        hit
    }

    /// Store a freshly fetched season, writing it through to disk.
    pub fn insert(&mut self, value: SeasonRecord, fetched_at: DateTime<Utc>) -> Result<()> {
        let start_year = value.start_year;
        let cached = CachedSeason { value, fetched_at };
        if let Some(path) = self.path_for(start_year) {
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, serde_json::to_vec(&cached)?)?;
            fs::rename(&tmp, &path)?;
        }
        self.entries.insert(start_year, cached);
        Ok(())
    }

    pub fn remove(&mut self, start_year: i32) -> Result<()> {
        self.entries.remove(&start_year);
        if let Some(path) = self.path_for(start_year) {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
