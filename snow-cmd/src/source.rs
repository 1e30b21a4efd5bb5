//! Read-through access to fetched seasons.

use crate::SharedArgs;
use anyhow::anyhow;
use chrono::{Local, NaiveDate, Utc};
use futures::future::join_all;
use log::{info, warn};
use snow_acis::{
    acis::AcisClient,
    cache::{CachePolicy, SeasonCache},
    season::{SeasonRecord, SeasonWindow},
    station::Station,
};
use snow_stats::normalize::normalize_window;

/// Fetch one full season from ACIS and normalize it to one record per day.
pub async fn fetch_season(client: &AcisClient, start_year: i32) -> anyhow::Result<SeasonRecord> {
    let window = SeasonWindow::for_start_year(start_year)
        .ok_or_else(|| anyhow!("season {} is out of range", start_year))?;
    info!(
        "Fetching season {} for {}",
        start_year,
        client.station().source_label()
    );
    let response = client.fetch_rows(&window).await?;
    let daily = normalize_window(&response.rows, &window);
    let station = Station::new(
        client.station().sid.clone(),
        response
            .station_name
            .unwrap_or_else(|| client.station().name.clone()),
    );
    Ok(SeasonRecord::new(start_year, station, window, daily))
}

/// Seasons served from the cache when fresh, from ACIS otherwise.
pub struct SeasonSource {
    client: AcisClient,
    cache: SeasonCache,
    policy: CachePolicy,
    today: NaiveDate,
}

impl SeasonSource {
    pub fn new(shared: &SharedArgs) -> anyhow::Result<Self> {
        let client = AcisClient::new(shared.station())?;
        let cache = match &shared.cache_dir {
            Some(dir) => SeasonCache::with_dir(dir)?,
            None => SeasonCache::in_memory(),
        };
        Ok(SeasonSource {
            client,
            cache,
            policy: CachePolicy::default(),
            today: Local::now().date_naive(),
        })
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    fn cached(&mut self, start_year: i32) -> Option<SeasonRecord> {
        let ttl = self.policy.ttl_for(start_year, &self.today);
        self.cache.get(start_year, Utc::now(), ttl).cloned()
    }

    fn remember(&mut self, season: &SeasonRecord) {
        if let Err(e) = self.cache.insert(season.clone(), Utc::now()) {
            warn!("could not cache season {}: {}", season.label, e);
        }
    }

    /// One season; a failed fetch is an error.
    pub async fn season(&mut self, start_year: i32) -> anyhow::Result<SeasonRecord> {
        if let Some(season) = self.cached(start_year) {
            return Ok(season);
        }
        let season = fetch_season(&self.client, start_year).await?;
        self.remember(&season);
        Ok(season)
    }

    /// Several seasons fetched concurrently. Seasons that fail are logged
    /// and left out; the rest come back sorted by start year.
    pub async fn seasons(&mut self, years: &[i32]) -> Vec<SeasonRecord> {
        let mut seasons = Vec::with_capacity(years.len());
        let mut to_fetch = Vec::new();
        for &year in years {
            match self.cached(year) {
                Some(season) => seasons.push(season),
                None => to_fetch.push(year),
            }
        }

        let client = &self.client;
        let results = join_all(to_fetch.iter().map(move |&year| fetch_season(client, year))).await;
        for (year, result) in to_fetch.iter().zip(results) {
            match result {
                Ok(season) => {
                    self.remember(&season);
                    seasons.push(season);
                }
                Err(e) => warn!("Dropping season {}: {:#}", year, e),
            }
        }
        seasons.sort_by_key(|s| s.start_year);
        info!("Loaded {} of {} seasons", seasons.len(), years.len());
        seasons
    }
}
