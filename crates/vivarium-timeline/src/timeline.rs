//! Timeline replay engine
//!
//! ```text
//! clock = min(first event time over active tracks)
//! while active tracks remain:
//!     clock += time_step
//!     consume events with t <= clock, move emptied tracks to inactive
//!     paint every track whose position t <= clock
//!     drop tracks whose death_date <= clock
//!     yield frame
//! ```

use std::io::Write;
use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vivarium_common::{LogicalTime, ReplayError};

use crate::frame::Frame;
use crate::track::Track;

/// Replay counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineStats {
    /// Frames yielded so far
    pub frames: u64,
    /// Events consumed from all tracks
    pub events_consumed: u64,
    /// Track advances that consumed more than one event
    pub catch_ups: u64,
    /// Tracks removed because their agent died
    pub pruned: u64,
}

/// Lazy, finite sequence of frames merged from every agent's path
#[derive(Debug)]
pub struct Timeline {
    time_step: LogicalTime,
    height: usize,
    width: usize,
    clock: LogicalTime,
    active: Vec<Track>,
    inactive: Vec<Track>,
    stats: TimelineStats,
}

impl Timeline {
    /// Build a timeline over owned tracks
    ///
    /// Fails if `time_step` is zero. An empty input, or one where no track
    /// has any event, produces an empty sequence.
    pub fn new(
        tracks: Vec<Track>,
        time_step: LogicalTime,
        height: usize,
        width: usize,
    ) -> Result<Self, ReplayError> {
        if time_step == 0 {
            return Err(ReplayError::InvalidTimeStep(time_step));
        }

        let (active, inactive): (Vec<Track>, Vec<Track>) =
            tracks.into_iter().partition(Track::is_active);

        let clock = active
            .iter()
            .filter_map(Track::next_time)
            .min()
            .unwrap_or_default();

        debug!(
            active = active.len(),
            inactive = inactive.len(),
            start = clock,
            time_step,
            "Timeline initialized"
        );

        Ok(Self {
            time_step,
            height,
            width,
            clock,
            active,
            inactive,
            stats: TimelineStats::default(),
        })
    }

    /// Current replay clock
    pub fn clock(&self) -> LogicalTime {
        self.clock
    }

    pub fn time_step(&self) -> LogicalTime {
        self.time_step
    }

    /// Replay counters so far
    pub fn stats(&self) -> TimelineStats {
        self.stats
    }

    /// Tracks that still have events to replay
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Tracks without remaining events that are still rendered
    pub fn inactive_count(&self) -> usize {
        self.inactive.len()
    }

    /// No more frames will be produced
    pub fn is_finished(&self) -> bool {
        self.active.is_empty()
    }

    /// Drain the remaining frames into `out`, one JSON object per line
    ///
    /// Returns the final counters. Frames written before a failure stay in
    /// `out` and are not replayed again.
    pub fn write_json_lines<W: Write>(
        &mut self,
        mut out: W,
    ) -> vivarium_common::Result<TimelineStats> {
        while let Some(frame) = self.next() {
            serde_json::to_writer(&mut out, &frame)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(self.stats)
    }

    fn advance(&mut self) -> usize {
        let clock = self.clock;
        let mut catch_ups = 0;
        let mut still_active = Vec::with_capacity(self.active.len());

        for mut track in std::mem::take(&mut self.active) {
            let consumed = track.advance_to(clock);
            self.stats.events_consumed += consumed as u64;

            // Intermediate positions are skipped, not interpolated
            if consumed > 1 {
                catch_ups += 1;
                warn!(
                    agent = %track.id.short(),
                    clock,
                    consumed,
                    "Track caught up several events in one step, time step may be too coarse"
                );
            }

            if track.is_active() {
                still_active.push(track);
            } else {
                self.inactive.push(track);
            }
        }

        self.active = still_active;
        self.stats.catch_ups += catch_ups as u64;
        catch_ups
    }

    fn render(&self) -> Frame {
        let mut frame = Frame::new(self.clock, self.height, self.width);
        for track in self.active.iter().chain(self.inactive.iter()) {
            if track.is_visible_at(self.clock) {
                frame.paint(track.position.y, track.position.x, track.color);
            }
        }
        frame
    }

    fn prune_dead(&mut self) {
        let clock = self.clock;
        let before = self.active.len() + self.inactive.len();
        self.active.retain(|t| !t.is_dead_at(clock));
        self.inactive.retain(|t| !t.is_dead_at(clock));
        self.stats.pruned += (before - self.active.len() - self.inactive.len()) as u64;
    }
}

impl Iterator for Timeline {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.active.is_empty() {
            return None;
        }

        self.clock = self.clock.saturating_add(self.time_step);
        let catch_ups = self.advance();

        let mut frame = self.render();
        frame.catch_ups = catch_ups;

        self.prune_dead();
        self.stats.frames += 1;
        Some(frame)
    }
}

impl FusedIterator for Timeline {}

#[cfg(test)]
mod tests {
    use super::*;
    use vivarium_common::{AgentId, Position, Rgb, BACKGROUND};

    const RED: Rgb = Rgb::new(255, 0, 0);
    const GREEN: Rgb = Rgb::new(0, 255, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    fn track(color: Rgb, start: Position, path: Vec<Position>) -> Track {
        Track::new(AgentId::new(), color, start, path, None)
    }

    /// Agent 1: (0,0,0) then (2,0,1); agent 2: (1,1,1); agent 3: no events
    fn three_agents() -> Vec<Track> {
        vec![
            track(
                RED,
                Position::origin(0, 0),
                vec![Position::new(0, 0, 0), Position::new(2, 0, 1)],
            ),
            track(GREEN, Position::origin(1, 1), vec![Position::new(1, 1, 1)]),
            track(BLUE, Position::origin(2, 2), vec![]),
        ]
    }

    #[test]
    fn test_zero_time_step_is_rejected() {
        let err = Timeline::new(three_agents(), 0, 3, 3).unwrap_err();
        assert_eq!(err, ReplayError::InvalidTimeStep(0));
    }

    #[test]
    fn test_three_agent_replay() {
        let mut timeline = Timeline::new(three_agents(), 1, 3, 3).unwrap();
        assert_eq!(timeline.clock(), 0);
        assert_eq!(timeline.active_count(), 2);
        assert_eq!(timeline.inactive_count(), 1);

        let first = timeline.next().unwrap();
        assert_eq!(first.clock, 1);
        assert_eq!(first.get(0, 0), Some(RED));
        assert_eq!(first.get(0, 1), Some(BACKGROUND));
        assert_eq!(first.get(1, 1), Some(GREEN));
        assert_eq!(first.get(2, 2), Some(BLUE));

        let second = timeline.next().unwrap();
        assert_eq!(second.clock, 2);
        assert_eq!(second.get(0, 0), Some(BACKGROUND));
        assert_eq!(second.get(0, 1), Some(RED));
        assert_eq!(second.get(1, 1), Some(GREEN));
        assert_eq!(second.get(2, 2), Some(BLUE));

        assert!(timeline.next().is_none());
        assert!(timeline.next().is_none());
        assert_eq!(timeline.stats().frames, 2);
        assert_eq!(timeline.stats().catch_ups, 0);
    }

    #[test]
    fn test_catch_up_detected_once_per_tick() {
        let tracks = vec![track(
            RED,
            Position::origin(0, 0),
            vec![
                Position::new(0, 0, 0),
                Position::new(3, 0, 1),
                Position::new(4, 0, 2),
                Position::new(9, 0, 3),
            ],
        )];

        let frames: Vec<Frame> = Timeline::new(tracks, 5, 1, 4).unwrap().collect();
        // clock 5 consumes t=0, t=3 and t=4, clock 10 consumes t=9
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].catch_ups, 1);
        assert_eq!(frames[0].get(0, 2), Some(RED));
        assert_eq!(frames[0].painted_count(), 1);
        assert_eq!(frames[1].catch_ups, 0);
    }

    #[test]
    fn test_catch_up_total_counts_each_track() {
        let tracks = vec![
            track(
                RED,
                Position::origin(0, 0),
                vec![Position::new(0, 0, 0), Position::new(1, 0, 1), Position::new(2, 0, 2)],
            ),
            track(
                GREEN,
                Position::origin(1, 0),
                vec![Position::new(0, 1, 0), Position::new(1, 1, 1), Position::new(2, 1, 2)],
            ),
        ];
        let mut timeline = Timeline::new(tracks, 2, 2, 3).unwrap();
        let frame = timeline.next().unwrap();
        assert_eq!(frame.catch_ups, 2);
        assert_eq!(timeline.stats().catch_ups, 2);
        assert_eq!(timeline.stats().events_consumed, 6);
    }

    #[test]
    fn test_no_tracks_yields_nothing() {
        let mut timeline = Timeline::new(vec![], 1, 3, 3).unwrap();
        assert!(timeline.is_finished());
        assert!(timeline.next().is_none());
    }

    #[test]
    fn test_only_empty_paths_yields_nothing() {
        let tracks = vec![track(RED, Position::origin(0, 0), vec![])];
        assert_eq!(Timeline::new(tracks, 1, 1, 1).unwrap().count(), 0);
    }

    #[test]
    fn test_dead_agents_vanish_after_death() {
        let mut dying = track(
            RED,
            Position::origin(0, 0),
            vec![Position::new(0, 0, 0), Position::new(1, 0, 1)],
        );
        dying.death_date = Some(2);
        let survivor = track(
            GREEN,
            Position::origin(1, 0),
            vec![Position::new(0, 1, 0), Position::new(4, 1, 1)],
        );

        let frames: Vec<Frame> = Timeline::new(vec![dying, survivor], 1, 2, 2)
            .unwrap()
            .collect();

        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].get(0, 1), Some(RED));
        // still painted on the tick it dies, gone afterwards
        assert_eq!(frames[1].get(0, 1), Some(RED));
        assert_eq!(frames[2].get(0, 1), Some(BACKGROUND));
        assert_eq!(frames[3].get(1, 1), Some(GREEN));
    }

    #[test]
    fn test_inactive_agent_pruned_when_death_postdates_last_event() {
        let mut idle = track(RED, Position::origin(0, 0), vec![]);
        idle.death_date = Some(2);
        let mover = track(
            GREEN,
            Position::origin(1, 0),
            vec![Position::new(0, 1, 0), Position::new(3, 1, 1)],
        );

        let frames: Vec<Frame> = Timeline::new(vec![idle, mover], 1, 2, 2)
            .unwrap()
            .collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].get(0, 0), Some(RED));
        assert_eq!(frames[1].get(0, 0), Some(RED));
        assert_eq!(frames[2].get(0, 0), Some(BACKGROUND));
    }

    #[test]
    fn test_future_positions_are_hidden() {
        // Second agent's first event is far after the start clock
        let tracks = vec![
            track(
                RED,
                Position::origin(0, 0),
                vec![Position::new(0, 0, 0), Position::new(3, 0, 1)],
            ),
            track(GREEN, Position::new(2, 1, 1), vec![Position::new(2, 1, 1)]),
        ];
        let frames: Vec<Frame> = Timeline::new(tracks, 1, 2, 2).unwrap().collect();
        assert_eq!(frames[0].get(1, 1), Some(BACKGROUND));
        assert_eq!(frames[1].get(1, 1), Some(GREEN));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let tracks = three_agents();
        let a: Vec<Frame> = Timeline::new(tracks.clone(), 1, 3, 3).unwrap().collect();
        let b: Vec<Frame> = Timeline::new(tracks, 1, 3, 3).unwrap().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_frame_serializes() {
        let frame = Timeline::new(three_agents(), 1, 3, 3).unwrap().next().unwrap();
        let json = serde_json::to_string(&frame).unwrap();
        let back: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(frame, back);
    }

    /// Accepts nothing
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_lines_one_frame_per_line() {
        let expected: Vec<Frame> = Timeline::new(three_agents(), 1, 3, 3).unwrap().collect();

        let mut timeline = Timeline::new(three_agents(), 1, 3, 3).unwrap();
        let mut out = Vec::new();
        let stats = timeline.write_json_lines(&mut out).unwrap();
        assert_eq!(stats.frames, 2);
        assert!(timeline.is_finished());

        let written: Vec<Frame> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(written, expected);
    }

    #[test]
    fn test_json_lines_writer_failure_is_io_error() {
        let mut timeline = Timeline::new(three_agents(), 1, 3, 3).unwrap();
        let err = timeline.write_json_lines(ClosedPipe).unwrap_err();
        assert!(matches!(err, vivarium_common::VivariumError::Io(_)));
    }
}
