//! Doors: alternating open/closed renewal process
//!
//! A closed door waits a gaussian time around its inter-opening duration, then
//! opens for either a short or a long uniformly drawn time. At most one toggle
//! happens per tick.
//!
//! Doors configured with `max_close_time` draw the closed time from a
//! triangular distribution on `[0, max_close_time]` instead. Its mode is placed
//! so the mean stays at the inter-opening duration, clamped into the range.

use serde::{Deserialize, Serialize};

use crate::core::config::{DoorConfig, DoorDirection, DoorType, Site};
use crate::core::random::EntityRng;
use crate::core::types::{minutes_to_ticks, Tick, Vec2};

/// Spread (ticks) of the closed-time gaussian
pub const CLOSED_TIME_SPREAD: f64 = 60.0;

/// Thickness of the door frame in site units
pub const DOOR_THICKNESS: f64 = 2.0;

/// Entry attempts seen by a door
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorStats {
    /// Attempts that found the door open
    pub successes: u32,
    /// Attempts that found the door closed
    pub failures: u32,
}

impl std::ops::AddAssign for DoorStats {
    fn add_assign(&mut self, rhs: Self) {
        self.successes += rhs.successes;
        self.failures += rhs.failures;
    }
}

#[derive(Debug, Clone)]
pub struct Door {
    id: usize,
    door_type: DoorType,
    midpoint: Vec2,
    open: bool,
    /// Ticks left until the next toggle
    state_time: Tick,
    inter_duration: f64,
    /// Upper bound of a triangular closed time, in ticks
    max_closed: Option<f64>,
    short_probability: f64,
    short_range: (f64, f64),
    long_range: (f64, f64),
    stats: DoorStats,
    short_openings: u64,
    long_openings: u64,
    rng: EntityRng,
}

impl Door {
    pub fn new(id: usize, config: &DoorConfig, site: &Site, mut rng: EntityRng) -> Self {
        let anchor = Vec2::new(config.x * site.width, config.y * site.height);
        let midpoint = coverage_midpoint(anchor, config.direction, site);

        let inter_duration = minutes_to_ticks(config.inter_opening_time);
        let max_closed = config.max_close_time.map(minutes_to_ticks);
        let state_time = closed_time(&mut rng, inter_duration, max_closed);

        tracing::debug!(
            "Door {} starts closed for {:.2} minutes",
            id,
            state_time as f64 / 60.0
        );

        Self {
            id,
            door_type: config.door_type,
            midpoint,
            open: false,
            state_time,
            inter_duration,
            max_closed,
            short_probability: config.short_opening_probability,
            short_range: (
                minutes_to_ticks(config.min_short_open_time),
                minutes_to_ticks(config.max_short_open_time),
            ),
            long_range: (
                minutes_to_ticks(config.min_open_time),
                minutes_to_ticks(config.max_open_time),
            ),
            stats: DoorStats::default(),
            short_openings: 0,
            long_openings: 0,
            rng,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Centre of the tile the attacker has to reach
    pub fn midpoint(&self) -> Vec2 {
        self.midpoint
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// True for inter-level doors, the only ones that lead out
    pub fn to_next_level(&self) -> bool {
        self.door_type == DoorType::InterLevel
    }

    pub fn state_time(&self) -> Tick {
        self.state_time
    }

    pub fn stats(&self) -> DoorStats {
        self.stats
    }

    /// `(short, long)` openings drawn so far
    pub fn opening_counts(&self) -> (u64, u64) {
        (self.short_openings, self.long_openings)
    }

    /// Force the door open for `ticks`; used by scripted scenarios
    pub fn hold_open(&mut self, ticks: Tick) {
        self.open = true;
        self.state_time = ticks;
    }

    /// Record an entry attempt; returns whether the door let the attacker through
    pub fn enter(&mut self) -> bool {
        if self.open {
            self.stats.successes += 1;
        } else {
            self.stats.failures += 1;
        }
        self.open
    }

    pub fn tick(&mut self) {
        if self.state_time > 0 {
            self.state_time -= 1;
            return;
        }

        if self.open {
            self.state_time = closed_time(&mut self.rng, self.inter_duration, self.max_closed);
            self.open = false;
            tracing::debug!(
                "Closing door {} for {:.2} minutes",
                self.id,
                self.state_time as f64 / 60.0
            );
        } else {
            let (min, max) = if self.rng.chance(self.short_probability) {
                self.short_openings += 1;
                self.short_range
            } else {
                self.long_openings += 1;
                self.long_range
            };
            self.state_time = self.rng.uniform_ticks(min, max);
            self.open = true;
            tracing::debug!(
                "Opening door {} for {:.2} minutes",
                self.id,
                self.state_time as f64 / 60.0
            );
        }
    }
}

fn closed_time(rng: &mut EntityRng, inter_duration: f64, max_closed: Option<f64>) -> Tick {
    match max_closed {
        Some(max) => rng.triangular_ticks(0.0, 3.0 * inter_duration - max, max),
        None => rng.gaussian_ticks(inter_duration, CLOSED_TIME_SPREAD),
    }
}

/// Midpoint of the one-tile area in front of a door anchored at `anchor`
fn coverage_midpoint(anchor: Vec2, direction: DoorDirection, site: &Site) -> Vec2 {
    let half = site.half_tile;
    let offset = match direction {
        DoorDirection::Up => Vec2::new(0.0, DOOR_THICKNESS + half),
        DoorDirection::Down => Vec2::new(0.0, -(DOOR_THICKNESS + half)),
        DoorDirection::Left => Vec2::new(DOOR_THICKNESS + half, 0.0),
        DoorDirection::Right => Vec2::new(-(DOOR_THICKNESS + half), 0.0),
    };
    anchor + offset
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Site {
        Site {
            tile_size: 16.0,
            half_tile: 8.0,
            width: 640.0,
            height: 480.0,
            day_ticks: 8 * 3600,
            cycles_per_frame: 1,
        }
    }

    fn door_config(short_probability: f64) -> DoorConfig {
        DoorConfig {
            x: 0.5,
            y: 1.0,
            door_type: DoorType::InterLevel,
            direction: DoorDirection::Down,
            inter_opening_time: 0.5,
            short_opening_probability: short_probability,
            max_open_time: 20.0,
            min_open_time: 10.0,
            max_short_open_time: 1.0,
            min_short_open_time: 0.5,
            max_close_time: None,
        }
    }

    #[test]
    fn test_coverage_midpoint_per_direction() {
        let site = site();
        let anchor = Vec2::new(100.0, 100.0);
        assert_eq!(
            coverage_midpoint(anchor, DoorDirection::Up, &site),
            Vec2::new(100.0, 110.0)
        );
        assert_eq!(
            coverage_midpoint(anchor, DoorDirection::Down, &site),
            Vec2::new(100.0, 90.0)
        );
        assert_eq!(
            coverage_midpoint(anchor, DoorDirection::Left, &site),
            Vec2::new(110.0, 100.0)
        );
        assert_eq!(
            coverage_midpoint(anchor, DoorDirection::Right, &site),
            Vec2::new(90.0, 100.0)
        );
    }

    #[test]
    fn test_door_starts_closed() {
        let door = Door::new(0, &door_config(0.5), &site(), EntityRng::from_seed(1));
        assert!(!door.is_open());
        assert!(door.to_next_level());
        assert_eq!(door.midpoint(), Vec2::new(320.0, 470.0));
    }

    #[test]
    fn test_intra_level_door_never_leads_out() {
        let mut config = door_config(0.5);
        config.door_type = DoorType::IntraLevel;
        let door = Door::new(3, &config, &site(), EntityRng::from_seed(1));
        assert!(!door.to_next_level());
        assert_eq!(door.id(), 3);
    }

    #[test]
    fn test_at_most_one_toggle_per_tick() {
        let mut door = Door::new(0, &door_config(0.5), &site(), EntityRng::from_seed(5));
        let mut previous = door.is_open();
        let mut toggles = 0;
        for _ in 0..200_000 {
            let before_time = door.state_time();
            door.tick();
            if door.is_open() != previous {
                // A toggle only happens once the countdown has run out
                assert_eq!(before_time, 0);
                toggles += 1;
                previous = door.is_open();
            }
        }
        assert!(toggles > 10, "door toggled only {} times", toggles);
    }

    #[test]
    fn test_short_probability_one_never_uses_long_range() {
        let mut door = Door::new(0, &door_config(1.0), &site(), EntityRng::from_seed(9));
        let mut openings = 0;
        let mut was_open = door.is_open();
        while openings < 1000 {
            door.tick();
            if door.is_open() && !was_open {
                openings += 1;
                // Short range is 30..60 ticks
                assert!(door.state_time() <= 60, "long opening {}", door.state_time());
            }
            was_open = door.is_open();
        }
        assert_eq!(door.opening_counts(), (1000, 0));
    }

    #[test]
    fn test_short_probability_zero_never_uses_short_range() {
        let mut door = Door::new(0, &door_config(0.0), &site(), EntityRng::from_seed(10));
        for _ in 0..100_000 {
            door.tick();
        }
        let (short, long) = door.opening_counts();
        assert_eq!(short, 0);
        assert!(long > 0);
    }

    #[test]
    fn test_triangular_closed_time_stays_in_range() {
        let mut config = door_config(0.5);
        config.inter_opening_time = 2.0;
        config.max_close_time = Some(3.0);
        let mut door = Door::new(0, &config, &site(), EntityRng::from_seed(11));

        let mut closings = Vec::new();
        let mut was_open = door.is_open();
        assert!(door.state_time() <= 180);
        while closings.len() < 1000 {
            door.tick();
            if was_open && !door.is_open() {
                closings.push(door.state_time());
            }
            was_open = door.is_open();
        }

        assert!(closings.iter().all(|&t| t <= 180));
        // Mode at 3 * 120 - 180 = 180 ticks keeps the mean at 120
        let mean = closings.iter().sum::<Tick>() as f64 / closings.len() as f64;
        assert!((mean - 120.0).abs() < 5.0, "mean closed time {}", mean);
    }

    #[test]
    fn test_enter_records_stats() {
        let mut door = Door::new(0, &door_config(0.5), &site(), EntityRng::from_seed(2));
        assert!(!door.enter());
        door.hold_open(10);
        assert!(door.enter());
        assert_eq!(
            door.stats(),
            DoorStats {
                successes: 1,
                failures: 1
            }
        );
    }

    #[test]
    fn test_hold_open_lasts_requested_ticks() {
        let mut door = Door::new(0, &door_config(0.5), &site(), EntityRng::from_seed(3));
        door.hold_open(3);
        for _ in 0..3 {
            door.tick();
            assert!(door.is_open());
        }
        door.tick();
        assert!(!door.is_open());
    }
}
