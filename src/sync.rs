use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;

use crate::countries::{slugify, CountryList};
use crate::error::{FetchError, RunError};
use crate::fetch::Fetcher;
use crate::store;

/// Result of one loop iteration.
#[derive(Debug)]
pub enum Outcome {
    Updated {
        country: String,
        file: String,
        path: PathBuf,
    },
    Skipped {
        country: String,
        file: String,
        error: FetchError,
    },
}

impl Outcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Outcome::Updated { .. })
    }
}

#[cfg(test)]
impl Outcome {
    pub fn country(&self) -> &str {
        match self {
            Outcome::Updated { country, .. } | Outcome::Skipped { country, .. } => country,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Outcome::Updated { .. } => None,
            Outcome::Skipped { error, .. } => Some(error),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Updated { file, .. } => write!(f, "Updated {file}"),
            Outcome::Skipped { country, error, .. } => {
                write!(f, "Failed to fetch data for {country}. {error}")
            }
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// One entry per country, in list order.
    pub outcomes: Vec<Outcome>,
}

impl RunSummary {
    pub fn updated(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_updated()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.updated()
    }
}

/// The fetch-and-persist loop.
#[derive(Clone)]
pub struct Updater {
    fetcher: Fetcher,
    output_dir: PathBuf,
    workers: usize,
    fail_fast: bool,
}

impl Updater {
    pub fn new(fetcher: Fetcher, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            output_dir: output_dir.into(),
            workers: 1,
            fail_fast: false,
        }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Processes every country once. Skips are logged and recorded; with
    /// fail-fast on, the first transport, decode or write error stops the run.
    ///
    /// The output directory exists afterwards even if nothing was written.
    pub async fn run(&self, countries: &CountryList) -> Result<RunSummary, RunError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| RunError::OutputDir {
                path: self.output_dir.clone(),
                source,
            })?;
        tracing::info!(
            "updating {} countries into {} ({} worker(s))",
            countries.len(),
            self.output_dir.display(),
            self.workers
        );

        let outcomes = if self.workers == 1 {
            self.run_sequential(countries).await?
        } else {
            self.run_pooled(countries).await?
        };

        let summary = RunSummary {
            started_at,
            elapsed: clock.elapsed(),
            outcomes,
        };
        tracing::info!(
            started_at = %summary.started_at.to_rfc3339(),
            "Update process completed: {} updated, {} skipped ({}, {:.1?})",
            summary.updated(),
            summary.skipped(),
            self.output_dir.display(),
            summary.elapsed
        );

        Ok(summary)
    }

    async fn run_sequential(&self, countries: &CountryList) -> Result<Vec<Outcome>, RunError> {
        let mut outcomes = Vec::with_capacity(countries.len());
        for country in countries.iter() {
            let outcome = self.update_one(country).await;
            outcomes.push(self.check(outcome)?);
        }
        Ok(outcomes)
    }

    async fn run_pooled(&self, countries: &CountryList) -> Result<Vec<Outcome>, RunError> {
        let mut slots: Vec<Option<Outcome>> = countries.iter().map(|_| None).collect();
        let mut pending = countries.iter().enumerate();
        let mut tasks = JoinSet::new();

        loop {
            while tasks.len() < self.workers {
                let Some((idx, country)) = pending.next() else {
                    break;
                };
                let updater = self.clone();
                let country = country.to_string();
                tasks.spawn(async move { (idx, updater.update_one(&country).await) });
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            let (idx, outcome) = match joined {
                Ok(done) => done,
                Err(err) => std::panic::resume_unwind(err.into_panic()),
            };

            // Dropping `tasks` on abort cancels whatever is still in flight.
            slots[idx] = Some(self.check(outcome)?);
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Logs `outcome` and passes it through, or turns it into an abort.
    fn check(&self, outcome: Outcome) -> Result<Outcome, RunError> {
        match &outcome {
            Outcome::Updated { path, .. } => tracing::info!(path = %path.display(), "{outcome}"),
            Outcome::Skipped { file, .. } => tracing::warn!(file = %file, "{outcome}"),
        }

        match outcome {
            Outcome::Skipped { country, error, .. } if self.fail_fast && error.is_fatal() => {
                Err(RunError::Aborted {
                    country,
                    source: error,
                })
            }
            outcome => Ok(outcome),
        }
    }

    async fn update_one(&self, country: &str) -> Outcome {
        let slug = slugify(country);
        let file = format!("{slug}.json");

        let written = match self.fetcher.fetch(&slug).await {
            Ok(value) => store::write_record(&self.output_dir, &slug, &value).await,
            Err(err) => Err(err),
        };

        match written {
            Ok(path) => Outcome::Updated {
                country: country.to_string(),
                file,
                path,
            },
            Err(error) => Outcome::Skipped {
                country: country.to_string(),
                file,
                error,
            },
        }
    }
}
