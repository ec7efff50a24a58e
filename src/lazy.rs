//! Visibility-triggered load scheduling.
//!
//! [`VisibilityLoader`] decides *when* each observed element is loaded. It is
//! the same policy the page script applies to `img.lazy-image`, expressed as a
//! deterministic state machine over an injected clock so it can run headless:
//! the build drives it to decode every referenced image.
//!
//! Per element:
//!
//! ```text
//! Unobserved ──visible──▶ Loading ──apply delay──▶ Loaded | Error
//!      │                     ▲  └─low quality──▶ LowQualityLoaded ──▶ Loaded
//!      └──visible while scrolling──▶ Queued ──batch──┘
//! ```
//!
//! A standard (single-quality) load is fetched at once but applied
//! `low_quality_delay` later; the full image that follows a low-quality
//! preview is applied as soon as it arrives.
//!
//! `Loaded` and `Error` are terminal; nothing is retried. Elements that become
//! visible while the page is scrolling are queued and released once scrolling
//! has been quiet for the debounce period, `batch_size` at a time, `stagger`
//! apart within a batch, with `batch_interval` between batches.

use crate::config::LazyConfig;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt::Display;
use std::hash::Hash;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unobserved,
    Queued,
    Loading,
    LowQualityLoaded,
    Loaded,
    Error,
}

impl LoadState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::Error)
    }
}

/// Which variant of an element a load fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Low,
    Full,
}

/// Timing and batching knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadPolicy {
    pub scroll_debounce: Duration,
    pub batch_size: usize,
    pub stagger: Duration,
    pub batch_interval: Duration,
    pub progressive: bool,
    /// Delay between a standard load finishing and the element becoming `Loaded`.
    pub low_quality_delay: Duration,
    pub high_quality_delay: Duration,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self::from(&LazyConfig::default())
    }
}

impl From<&LazyConfig> for LoadPolicy {
    fn from(config: &LazyConfig) -> Self {
        Self {
            scroll_debounce: config.scroll_debounce(),
            batch_size: config.batch_size.max(1),
            stagger: config.stagger(),
            batch_interval: config.batch_interval(),
            progressive: config.progressive,
            low_quality_delay: config.low_quality_delay(),
            high_quality_delay: config.high_quality_delay(),
        }
    }
}

/// A pending step for one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Fetch(Quality),
    /// Mark a fetched standard load as applied.
    Apply,
}

struct Element<V> {
    state: LoadState,
    has_low_quality: bool,
    value: Option<V>,
}

/// Schedules loads for observed elements keyed by `K`, keeping results `V`.
pub struct VisibilityLoader<K, V> {
    policy: LoadPolicy,
    elements: HashMap<K, Element<V>>,
    queue: VecDeque<K>,
    /// Pending loads keyed by (due time, sequence) so equal times keep order.
    scheduled: BTreeMap<(Duration, u64), (K, Task)>,
    seq: u64,
    last_scroll: Option<Duration>,
    next_batch_at: Duration,
}

impl<K, V> VisibilityLoader<K, V>
where
    K: Clone + Eq + Hash + Display,
{
    pub fn new(policy: LoadPolicy) -> Self {
        Self {
            policy,
            elements: HashMap::new(),
            queue: VecDeque::new(),
            scheduled: BTreeMap::new(),
            seq: 0,
            last_scroll: None,
            next_batch_at: Duration::ZERO,
        }
    }

    /// Start watching `key`. Re-observing a known key is a no-op.
    pub fn observe(&mut self, key: K, has_low_quality: bool) {
        self.elements.entry(key).or_insert(Element {
            state: LoadState::Unobserved,
            has_low_quality,
            value: None,
        });
    }

    pub fn state(&self, key: &K) -> Option<LoadState> {
        self.elements.get(key).map(|e| e.state)
    }

    pub fn value(&self, key: &K) -> Option<&V> {
        self.elements.get(key).and_then(|e| e.value.as_ref())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Keys currently in `state`.
    pub fn keys_in(&self, state: LoadState) -> Vec<&K> {
        self.elements
            .iter()
            .filter(|(_, e)| e.state == state)
            .map(|(k, _)| k)
            .collect()
    }

    /// Record a scroll event at `now`.
    pub fn scrolled(&mut self, now: Duration) {
        self.last_scroll = Some(now);
    }

    pub fn is_scrolling(&self, now: Duration) -> bool {
        self.last_scroll
            .is_some_and(|t| now < t + self.policy.scroll_debounce)
    }

    /// `key` entered the viewport at `now`.
    ///
    /// Loads immediately unless the page is scrolling, in which case the
    /// element is queued. Anything not `Unobserved` is left alone.
    pub fn visible<F, E>(&mut self, key: &K, now: Duration, load: &mut F)
    where
        F: FnMut(&K, Quality) -> Result<V, E>,
        E: Display,
    {
        if self.state(key) != Some(LoadState::Unobserved) {
            return;
        }
        if self.is_scrolling(now) {
            self.set_state(key, LoadState::Queued);
            self.queue.push_back(key.clone());
        } else {
            self.start(key, now, load);
        }
    }

    /// Advance the clock to `now`: release queued batches and run due loads.
    pub fn tick<F, E>(&mut self, now: Duration, load: &mut F)
    where
        F: FnMut(&K, Quality) -> Result<V, E>,
        E: Display,
    {
        if !self.queue.is_empty() && !self.is_scrolling(now) && now >= self.next_batch_at {
            let take = self.policy.batch_size.min(self.queue.len());
            let batch: Vec<K> = self.queue.drain(..take).collect();
            for (i, key) in batch.into_iter().enumerate() {
                self.set_state(&key, LoadState::Loading);
                let quality = self.first_quality(&key);
                self.schedule(now + self.policy.stagger * i as u32, key, Task::Fetch(quality));
            }
            self.next_batch_at = now + self.policy.batch_interval;
        }

        let due: Vec<(Duration, u64)> = self
            .scheduled
            .range(..=(now, u64::MAX))
            .map(|(slot, _)| *slot)
            .collect();
        for slot in due {
            match self.scheduled.remove(&slot) {
                Some((key, Task::Fetch(quality))) => self.run(&key, quality, slot.0, load),
                Some((key, Task::Apply)) => self.apply(&key),
                None => {}
            }
        }
    }

    /// When the loader next has work, if ever.
    pub fn next_wakeup(&self, now: Duration) -> Option<Duration> {
        let scheduled = self.scheduled.keys().next().map(|(t, _)| *t);
        let batch = (!self.queue.is_empty()).then(|| {
            let quiet = self
                .last_scroll
                .map(|t| t + self.policy.scroll_debounce)
                .unwrap_or(now);
            quiet.max(self.next_batch_at).max(now)
        });
        match (scheduled, batch) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Tick until no queued or scheduled work remains. Returns the final time.
    pub fn run_until_idle<F, E>(&mut self, mut now: Duration, load: &mut F) -> Duration
    where
        F: FnMut(&K, Quality) -> Result<V, E>,
        E: Display,
    {
        while let Some(at) = self.next_wakeup(now) {
            now = now.max(at);
            self.tick(now, load);
        }
        now
    }

    fn set_state(&mut self, key: &K, state: LoadState) {
        if let Some(e) = self.elements.get_mut(key) {
            e.state = state;
        }
    }

    fn first_quality(&self, key: &K) -> Quality {
        let low = self.elements.get(key).is_some_and(|e| e.has_low_quality);
        if self.policy.progressive && low {
            Quality::Low
        } else {
            Quality::Full
        }
    }

    fn schedule(&mut self, at: Duration, key: K, task: Task) {
        self.seq += 1;
        self.scheduled.insert((at, self.seq), (key, task));
    }

    fn apply(&mut self, key: &K) {
        if let Some(el) = self.elements.get_mut(key) {
            if el.state == LoadState::Loading {
                el.state = LoadState::Loaded;
            }
        }
    }

    fn start<F, E>(&mut self, key: &K, now: Duration, load: &mut F)
    where
        F: FnMut(&K, Quality) -> Result<V, E>,
        E: Display,
    {
        self.set_state(key, LoadState::Loading);
        let quality = self.first_quality(key);
        self.run(key, quality, now, load);
    }

    fn run<F, E>(&mut self, key: &K, quality: Quality, now: Duration, load: &mut F)
    where
        F: FnMut(&K, Quality) -> Result<V, E>,
        E: Display,
    {
        if self.state(key).is_none_or(LoadState::is_terminal) {
            return;
        }
        match (quality, load(key, quality)) {
            (Quality::Low, Ok(_)) => {
                self.set_state(key, LoadState::LowQualityLoaded);
                self.schedule(
                    now + self.policy.high_quality_delay,
                    key.clone(),
                    Task::Fetch(Quality::Full),
                );
            }
            (Quality::Low, Err(e)) => {
                // Low-quality variant missing: go straight to the full image
                log::debug!("{key}: low quality load failed ({e}), loading full");
                self.run(key, Quality::Full, now, load);
            }
            (Quality::Full, Ok(value)) => {
                let delay = self.policy.low_quality_delay;
                let Some(el) = self.elements.get_mut(key) else {
                    return;
                };
                el.value = Some(value);
                if el.state == LoadState::LowQualityLoaded || delay.is_zero() {
                    el.state = LoadState::Loaded;
                } else {
                    self.schedule(now + delay, key.clone(), Task::Apply);
                }
            }
            (Quality::Full, Err(e)) => {
                log::debug!("{key}: load failed: {e}");
                self.set_state(key, LoadState::Error);
            }
        }
    }
}
