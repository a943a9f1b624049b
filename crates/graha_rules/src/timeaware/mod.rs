//! Time-aware layer: transit snapshots nudge static verdicts.
//!
//! Positions always arrive from outside; nothing here computes an ephemeris.

pub mod boosts;
pub mod summary;
pub mod transits;
pub mod windows;

pub use boosts::{infer_categories, summarize_timeaware, time_boosts, AdjustedRule, Boosts, Category, TimeAwareSummary, TimeBoosts};
pub use summary::{pick_top_rules, summarize, Highlights, Summary};
pub use transits::{aspects_to_natal, AspectHit, NatalAspects, TransitMoment, TransitSnapshot, DEFAULT_TRANSIT_ORB_DEG};
pub use windows::{scan_transit_windows, DayScore, WindowScan, MAX_SCAN_DAYS};
