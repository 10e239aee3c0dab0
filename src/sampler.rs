#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! Peak resident-memory sampling

/// Whose memory a sample is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryScope {
    /// The harness process itself
    SelfProcess,

    /// All waited-for children of the harness
    Children,
}

/// Peak resident set size, in bytes, at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemorySample(u64);

impl MemorySample {
    /// Sample returned when no facility exists
    pub const ZERO: Self = Self(0);

    /// Create a sample from a byte count
    #[must_use]
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Get the sample in bytes
    #[must_use]
    pub const fn bytes(self) -> u64 {
        self.0
    }

    /// Growth from `earlier` to `self`, never negative
    #[must_use]
    pub const fn delta_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Source of peak-RSS samples
///
/// Peak counters are monotonic within a process lifetime, so successive
/// samples of the same scope never decrease.
pub trait MemorySampler {
    /// Whether samples reflect real measurements
    ///
    /// When this is false, [`sample`](MemorySampler::sample) returns
    /// [`MemorySample::ZERO`] and deltas must be reported as unavailable.
    fn is_available(&self) -> bool;

    /// Current peak RSS for `scope`
    fn sample(&self, scope: MemoryScope) -> MemorySample;
}

/// Sampler for hosts without a peak-RSS facility; also used to switch
/// measurement off
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableSampler;

impl MemorySampler for UnavailableSampler {
    fn is_available(&self) -> bool {
        false
    }

    fn sample(&self, _scope: MemoryScope) -> MemorySample {
        MemorySample::ZERO
    }
}

/// `getrusage(2)`-backed sampler
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RusageSampler;

#[cfg(unix)]
impl RusageSampler {
    /// `ru_maxrss` unit, in bytes
    #[cfg(target_os = "macos")]
    const MAXRSS_UNIT: u64 = 1;

    /// `ru_maxrss` unit, in bytes
    #[cfg(not(target_os = "macos"))]
    const MAXRSS_UNIT: u64 = 1024;

    #[allow(unsafe_code)]
    fn max_rss(who: libc::c_int) -> Option<libc::c_long> {
        let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
        // SAFETY: `usage` is a valid, writable rusage; getrusage only writes it
        let status = unsafe { libc::getrusage(who, usage.as_mut_ptr()) };
        if status != 0 {
            return None;
        }
        // SAFETY: zero-initialised and fully written by a successful call
        let usage = unsafe { usage.assume_init() };
        Some(usage.ru_maxrss)
    }
}

#[cfg(unix)]
impl MemorySampler for RusageSampler {
    fn is_available(&self) -> bool {
        true
    }

    fn sample(&self, scope: MemoryScope) -> MemorySample {
        let who = match scope {
            MemoryScope::SelfProcess => libc::RUSAGE_SELF,
            MemoryScope::Children => libc::RUSAGE_CHILDREN,
        };

        Self::max_rss(who)
            .and_then(|raw| u64::try_from(raw).ok())
            .map_or(MemorySample::ZERO, |units| {
                MemorySample::from_bytes(units.saturating_mul(Self::MAXRSS_UNIT))
            })
    }
}

/// Best sampler the host supports
#[must_use]
pub fn platform_sampler() -> Box<dyn MemorySampler> {
    #[cfg(unix)]
    {
        Box::new(RusageSampler)
    }
    #[cfg(not(unix))]
    {
        Box::new(UnavailableSampler)
    }
}
