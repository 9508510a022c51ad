//! Continuity and linkability checks for archives of merged block bundles.

pub use crate::{
    checker::ArchiveChecker,
    config::{CheckConfig, PrintDetails},
    continuity::{ContinuityTracker, TrackingState, PROGRESS_FLUSH_INTERVAL},
    events::{CheckEvent, ReportSink},
    linkability::{ForkLinkabilityTracker, Linkability, LinkabilityState},
    report::{CheckSummary, TextReporter},
    segment::{BlockObserver, SegmentStats, SegmentValidator},
};

mod checker;
mod config;
mod continuity;
mod events;
mod linkability;
mod report;
mod segment;
