//! Pacing settings for a bulk run.

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;

/// Shortest allowed pause between two usernames, in seconds.
pub const MIN_DELAY_SECS: f64 = 0.1;

/// Longest allowed pause between two usernames, in seconds.
pub const MAX_DELAY_SECS: f64 = 10.0;

/// Pause between consecutive usernames, always within
/// [`MIN_DELAY_SECS`]..=[`MAX_DELAY_SECS`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Delay(f64);

impl Delay {
    /// Clamp `secs` into the allowed range.
    ///
    /// NaN and infinities fall back to the [`Speed::Normal`] delay.
    #[must_use]
    pub fn clamped(secs: f64) -> Self {
        if !secs.is_finite() {
            return Speed::Normal.delay();
        }
        Self(secs.clamp(MIN_DELAY_SECS, MAX_DELAY_SECS))
    }

    /// Delay in seconds.
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.0
    }

    /// Delay as a [`Duration`].
    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::from_secs_f64(self.0)
    }
}

impl Default for Delay {
    fn default() -> Self {
        Speed::Normal.delay()
    }
}

impl fmt::Display for Delay {
    /// Whole seconds keep one decimal (`1.0s`), fractions print as-is
    /// (`0.75s`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.1}s", self.0)
        } else {
            write!(f, "{}s", self.0)
        }
    }
}

/// Preset delays offered by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Speed {
    /// 2.0s between names.
    Slow,
    /// 1.0s between names.
    #[default]
    Normal,
    /// 0.5s between names.
    Fast,
    /// 0.3s between names.
    Turbo,
}

impl Speed {
    /// Every preset, slowest first.
    pub const ALL: [Self; 4] = [Self::Slow, Self::Normal, Self::Fast, Self::Turbo];

    /// The delay this preset stands for.
    #[must_use]
    pub fn delay(self) -> Delay {
        Delay(match self {
            Self::Slow => 2.0,
            Self::Normal => 1.0,
            Self::Fast => 0.5,
            Self::Turbo => 0.3,
        })
    }

    /// Display name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Slow => "Slow",
            Self::Normal => "Normal",
            Self::Fast => "Fast",
            Self::Turbo => "Turbo",
        }
    }

    /// One-line note on rate-limit risk, shown in the speed picker.
    #[must_use]
    pub fn note(self) -> &'static str {
        match self {
            Self::Slow => "safest, no risk of rate limit",
            Self::Normal => "recommended, balanced",
            Self::Fast => "quick but some rate limit risk",
            Self::Turbo => "fastest, high rate limit risk",
        }
    }
}

/// Settings fixed for the whole of one bulk run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunConfig {
    /// Pause between consecutive usernames.
    pub delay: Delay,
}

impl RunConfig {
    /// Run with the given pause between names.
    #[must_use]
    pub fn new(delay: Delay) -> Self {
        Self { delay }
    }

    /// Rough wall-clock estimate for `count` names, counting delays only.
    #[must_use]
    pub fn estimate(&self, count: usize) -> Duration {
        self.delay.as_duration().mul_f64(count as f64)
    }
}
