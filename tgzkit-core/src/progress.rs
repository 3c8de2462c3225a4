//! Progress reporting.
//!
//! Engines report progress in byte-denominated units through the
//! [`Progress`] capability: they announce a total once, then move the
//! completed count forward as data is processed, and finally snap it to the
//! total. How those bytes are displayed is up to the sink.
//!
//! ## Example
//!
//! ```rust
//! use tgzkit_core::progress::{Progress, VirtualProgress};
//!
//! let mut progress = VirtualProgress::new();
//! progress.set_total(2048);
//! progress.set_completed(512);
//! assert_eq!(progress.completed_units(), 25);
//! progress.set_completed_to_total();
//! assert_eq!(progress.completed_units(), 100);
//! ```

/// Number of virtual units a [`VirtualProgress`] spans.
pub const VIRTUAL_TOTAL_UNITS: u64 = 100;

/// A sink for progress reports.
pub trait Progress {
    /// Announce the total number of units the operation will process.
    fn set_total(&mut self, total: u64);

    /// Report the number of units processed so far.
    fn set_completed(&mut self, completed: u64);

    /// Mark the operation as finished.
    fn set_completed_to_total(&mut self);
}

impl<P: Progress + ?Sized> Progress for &mut P {
    fn set_total(&mut self, total: u64) {
        (**self).set_total(total);
    }

    fn set_completed(&mut self, completed: u64) {
        (**self).set_completed(completed);
    }

    fn set_completed_to_total(&mut self) {
        (**self).set_completed_to_total();
    }
}

impl<P: Progress + ?Sized> Progress for Box<P> {
    fn set_total(&mut self, total: u64) {
        (**self).set_total(total);
    }

    fn set_completed(&mut self, completed: u64) {
        (**self).set_completed(completed);
    }

    fn set_completed_to_total(&mut self) {
        (**self).set_completed_to_total();
    }
}

/// A sink that discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn set_total(&mut self, _total: u64) {}

    fn set_completed(&mut self, _completed: u64) {}

    fn set_completed_to_total(&mut self) {}
}

/// Maps an arbitrary byte total linearly onto `0..=100` virtual units.
#[derive(Debug, Clone, Default)]
pub struct VirtualProgress {
    fraction: f64,
    completed: u64,
}

impl VirtualProgress {
    /// Create a new tracker at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed virtual units, in `0..=VIRTUAL_TOTAL_UNITS`.
    pub fn completed_units(&self) -> u64 {
        self.completed
    }

    /// Completed fraction, in `0.0..=1.0`.
    pub fn fraction_completed(&self) -> f64 {
        self.completed as f64 / VIRTUAL_TOTAL_UNITS as f64
    }
}

impl Progress for VirtualProgress {
    fn set_total(&mut self, total: u64) {
        self.fraction = if total == 0 {
            0.0
        } else {
            VIRTUAL_TOTAL_UNITS as f64 / total as f64
        };
    }

    fn set_completed(&mut self, completed: u64) {
        let units = (self.fraction * completed as f64).round() as u64;
        self.completed = units.min(VIRTUAL_TOTAL_UNITS);
    }

    fn set_completed_to_total(&mut self) {
        self.completed = VIRTUAL_TOTAL_UNITS;
    }
}

/// Forwards raw `(completed, total)` byte counts to a closure.
pub struct FnProgress<F: FnMut(u64, u64)> {
    callback: F,
    total: u64,
}

impl<F: FnMut(u64, u64)> FnProgress<F> {
    /// Wrap a closure receiving `(completed, total)`.
    pub fn new(callback: F) -> Self {
        Self { callback, total: 0 }
    }
}

impl<F: FnMut(u64, u64)> Progress for FnProgress<F> {
    fn set_total(&mut self, total: u64) {
        self.total = total;
        (self.callback)(0, total);
    }

    fn set_completed(&mut self, completed: u64) {
        (self.callback)(completed, self.total);
    }

    fn set_completed_to_total(&mut self) {
        (self.callback)(self.total, self.total);
    }
}
