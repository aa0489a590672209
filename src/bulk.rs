//! Sequential bulk checking with pacing between usernames.
//!
//! The [`Orchestrator`] walks the input in order, classifies each name once
//! via a [`Checker`], pauses between names and writes a progress stream.
//! There is no parallelism: pacing is how the remote rate limit is honored.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::check::{Checker, Outcome, User, check_username};
use crate::config::RunConfig;

/// Something that can wait between two usernames.
pub trait Pause {
    /// Block for `duration`.
    fn pause(&mut self, duration: Duration);
}

/// Waits with [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Pause for ThreadSleep {
    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A username found to be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakenEntry {
    /// Name as given on input.
    pub username: String,
    /// Account that holds it.
    pub user: User,
}

/// A username refused by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEntry {
    /// Name as given on input.
    pub username: String,
    /// Why it was refused.
    pub reason: String,
}

/// Classified usernames of one run, each bucket in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    /// Free to register.
    pub available: Vec<String>,
    /// Already registered.
    pub taken: Vec<TakenEntry>,
    /// Rejected, with reasons.
    pub invalid: Vec<InvalidEntry>,
}

impl ResultSet {
    /// File `username` under the bucket matching `outcome`.
    pub fn record(&mut self, username: String, outcome: Outcome) {
        match outcome {
            Outcome::Taken(user) => self.taken.push(TakenEntry { username, user }),
            Outcome::Available => self.available.push(username),
            Outcome::Invalid(reason) => self.invalid.push(InvalidEntry { username, reason }),
        }
    }

    /// Total number of classified usernames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.available.len() + self.taken.len() + self.invalid.len()
    }

    /// True when nothing has been classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What a finished (or interrupted) run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Exactly the usernames processed before the run ended.
    pub results: ResultSet,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Whether the run stopped early on an interrupt request.
    pub interrupted: bool,
}

/// Drives a [`Checker`] across a list of usernames.
///
/// # Example
///
/// ```no_run
/// use roblox_avail::bulk::Orchestrator;
/// use roblox_avail::check::Client;
/// use roblox_avail::config::{RunConfig, Speed};
///
/// let client = Client::new();
/// let names = vec!["builderman".to_string(), "freshname42".to_string()];
/// let report = Orchestrator::new(&client, RunConfig::new(Speed::Normal.delay()))
///     .run(&names, &mut std::io::stdout())?;
/// println!("{} available", report.results.available.len());
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct Orchestrator<'a, C: ?Sized, P = ThreadSleep> {
    checker: &'a C,
    config: RunConfig,
    pause: P,
    interrupt: Option<&'a AtomicBool>,
}

impl<'a, C: Checker + ?Sized> Orchestrator<'a, C> {
    /// Orchestrator that sleeps the thread between names.
    pub fn new(checker: &'a C, config: RunConfig) -> Self {
        Self {
            checker,
            config,
            pause: ThreadSleep,
            interrupt: None,
        }
    }
}

impl<'a, C: Checker + ?Sized, P: Pause> Orchestrator<'a, C, P> {
    /// Replace the pause between names.
    pub fn with_pause<Q: Pause>(self, pause: Q) -> Orchestrator<'a, C, Q> {
        Orchestrator {
            checker: self.checker,
            config: self.config,
            pause,
            interrupt: self.interrupt,
        }
    }

    /// Stop between names once `flag` is set.
    #[must_use]
    pub fn interrupt_on(mut self, flag: &'a AtomicBool) -> Self {
        self.interrupt = Some(flag);
        self
    }

    fn interrupted(&self) -> bool {
        self.interrupt.is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Classify every username in order, writing progress to `out`.
    ///
    /// # Errors
    ///
    /// Only failures writing to `out` are returned; lookups never fail.
    pub fn run<W: Write + ?Sized>(
        &mut self,
        usernames: &[String],
        out: &mut W,
    ) -> io::Result<RunReport> {
        let total = usernames.len();
        let delay = self.config.delay;
        let estimate = self.config.estimate(total).as_secs_f64();

        writeln!(out)?;
        writeln!(out, "Estimated time: {estimate:.1}s (~{:.1} min)", estimate / 60.0)?;
        writeln!(out, "Delay between checks: {delay}")?;
        tracing::info!(total, delay = delay.as_secs_f64(), "starting bulk run");

        let start = Instant::now();
        let mut results = ResultSet::default();
        let mut interrupted = false;

        for (idx, username) in usernames.iter().enumerate() {
            if self.interrupted() {
                interrupted = true;
                break;
            }

            let position = idx + 1;
            writeln!(out)?;
            writeln!(out, "[{position}/{total}] Checking: {username}")?;

            let outcome = check_username(self.checker, username);
            match &outcome {
                Outcome::Taken(user) => writeln!(out, "  Taken - User ID: {}", user.id)?,
                Outcome::Available => writeln!(out, "  Available!")?,
                Outcome::Invalid(reason) => writeln!(out, "  Invalid - {reason}")?,
            }
            tracing::debug!(%username, %outcome, "classified");
            results.record(username.clone(), outcome);

            if position < total {
                if self.interrupted() {
                    interrupted = true;
                    break;
                }
                let remaining = total - position;
                let time_left = delay.as_secs_f64() * remaining as f64;
                writeln!(
                    out,
                    "  Waiting {delay}... ({remaining} remaining, ~{time_left:.0}s left)"
                )?;
                out.flush()?;
                self.pause.pause(delay.as_duration());
            }
        }

        let elapsed = start.elapsed();
        let secs = elapsed.as_secs_f64();
        writeln!(out)?;
        writeln!(out, "Total time: {secs:.1}s ({:.1} min)", secs / 60.0)?;
        out.flush()?;

        if interrupted {
            tracing::info!(processed = results.len(), total, "bulk run interrupted");
        } else {
            tracing::info!(processed = results.len(), "bulk run finished");
        }

        Ok(RunReport {
            results,
            elapsed,
            interrupted,
        })
    }
}
