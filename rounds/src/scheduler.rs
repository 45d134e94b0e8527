//! Round/epoch state machine per elevation.

use crate::error::ScheduleError;
use crate::round::{ElevationStatus, Round};
use cairn_types::{Elevation, ElevationKind, EngineParams, Hash32, Timestamp, Totem};
use cairn_utils::format_duration;
use serde::{Deserialize, Serialize};

/// Read-only view of one elevation's timing, consumed by the pool ledger.
pub trait RoundView {
    fn elevation(&self) -> Elevation;

    /// 0 until the first rollover.
    fn round_number(&self) -> u64;

    fn round_end(&self) -> Timestamp;

    fn is_unlocked(&self, now: Timestamp) -> bool;

    /// Inside the pre-rollover window where stake on either totem is frozen.
    fn in_lockout(&self, now: Timestamp) -> bool;
}

/// Timing state of a single elevation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElevationSchedule {
    pub elevation: Elevation,
    pub unlock_at: Timestamp,
    /// Applied when the next round is started.
    pub duration_mult: u64,
    pub lockout_secs: u64,
    pub current: Round,
    /// Closed rounds, oldest first.
    pub history: Vec<Round>,
}

impl ElevationSchedule {
    pub fn status(&self, now: Timestamp) -> ElevationStatus {
        if now < self.unlock_at {
            ElevationStatus::Locked
        } else if self.current.number == 0 || self.current.has_ended(now) {
            ElevationStatus::RoundEnded
        } else {
            ElevationStatus::Active
        }
    }

    /// Winning totem of a closed round.
    pub fn winning_totem(&self, round: u64) -> Option<Totem> {
        self.round(round).and_then(|r| r.winning_totem)
    }

    pub fn round(&self, number: u64) -> Option<&Round> {
        if number == self.current.number {
            return Some(&self.current);
        }
        // Round numbers are dense starting at 1.
        number
            .checked_sub(1)
            .and_then(|i| self.history.get(i as usize))
    }
}

impl RoundView for ElevationSchedule {
    fn elevation(&self) -> Elevation {
        self.elevation
    }

    fn round_number(&self) -> u64 {
        self.current.number
    }

    fn round_end(&self) -> Timestamp {
        self.current.end
    }

    fn is_unlocked(&self, now: Timestamp) -> bool {
        now >= self.unlock_at
    }

    fn in_lockout(&self, now: Timestamp) -> bool {
        self.elevation.kind() == ElevationKind::Lottery
            && self.current.number > 0
            && now >= self.current.end.saturating_sub(self.lockout_secs)
    }
}

/// Owns every elevation's rounds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundScheduler {
    base_round_duration_secs: u64,
    schedules: Vec<ElevationSchedule>,
}

impl RoundScheduler {
    /// Build schedules from the engine parameters, unlocking each elevation
    /// at `launch + unlock_delay`.
    pub fn new(params: &EngineParams, launch: Timestamp) -> Result<Self, ScheduleError> {
        let schedules = Elevation::ALL
            .iter()
            .map(|&elevation| {
                let i = elevation.index();
                if params.round_duration_mult[i] == 0 {
                    return Err(ScheduleError::RoundDurationNonZero);
                }
                let unlock_at = launch.saturating_add(params.unlock_delay_secs[i]);
                Ok(ElevationSchedule {
                    elevation,
                    unlock_at,
                    duration_mult: params.round_duration_mult[i],
                    lockout_secs: params.lockout_secs,
                    current: Round::genesis(elevation, unlock_at),
                    history: Vec::new(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            base_round_duration_secs: params.base_round_duration_secs,
            schedules,
        })
    }

    pub fn schedule(&self, elevation: Elevation) -> &ElevationSchedule {
        &self.schedules[elevation.index()]
    }

    fn schedule_mut(&mut self, elevation: Elevation) -> &mut ElevationSchedule {
        &mut self.schedules[elevation.index()]
    }

    pub fn status(&self, elevation: Elevation, now: Timestamp) -> ElevationStatus {
        self.schedule(elevation).status(now)
    }

    pub fn round_number(&self, elevation: Elevation) -> u64 {
        self.schedule(elevation).current.number
    }

    pub fn current_round(&self, elevation: Elevation) -> &Round {
        &self.schedule(elevation).current
    }

    pub fn history(&self, elevation: Elevation) -> &[Round] {
        &self.schedule(elevation).history
    }

    /// `(round, winning totem)` for every closed round of a lottery elevation.
    pub fn winning_totem_history(&self, elevation: Elevation) -> Vec<(u64, Totem)> {
        self.history(elevation)
            .iter()
            .filter_map(|r| r.winning_totem.map(|t| (r.number, t)))
            .collect()
    }

    pub fn in_lockout(&self, elevation: Elevation, now: Timestamp) -> bool {
        self.schedule(elevation).in_lockout(now)
    }

    /// Round duration the next rollover will use.
    pub fn next_round_duration(&self, elevation: Elevation) -> u64 {
        self.base_round_duration_secs
            .saturating_mul(self.schedule(elevation).duration_mult)
    }

    /// Change an elevation's round length from its next rollover onward.
    pub fn set_round_duration_multiplier(
        &mut self,
        elevation: Elevation,
        mult: u64,
    ) -> Result<(), ScheduleError> {
        if mult == 0 {
            return Err(ScheduleError::RoundDurationNonZero);
        }
        tracing::info!(%elevation, mult, "round duration multiplier updated");
        self.schedule_mut(elevation).duration_mult = mult;
        Ok(())
    }

    /// Applies to every elevation, including rounds already running.
    pub fn set_lockout_secs(&mut self, secs: u64) {
        tracing::info!(secs, "lockout updated");
        for schedule in &mut self.schedules {
            schedule.lockout_secs = secs;
        }
    }

    /// Fail unless `elevation` may roll over at `now`.
    pub fn check_rollover(
        &self,
        elevation: Elevation,
        now: Timestamp,
    ) -> Result<(), ScheduleError> {
        let schedule = self.schedule(elevation);
        if now < schedule.unlock_at {
            return Err(ScheduleError::ElevationLocked {
                elevation,
                until: schedule.unlock_at,
            });
        }
        if !schedule.current.has_ended(now) {
            return Err(ScheduleError::ElevationLocked {
                elevation,
                until: schedule.current.end,
            });
        }
        Ok(())
    }

    /// Close the ended round with its draw result and start the next one.
    ///
    /// `outcome` is `None` for fixed elevations and for the unlock rollover.
    pub fn begin_round(
        &mut self,
        elevation: Elevation,
        now: Timestamp,
        outcome: Option<(Totem, Hash32)>,
    ) -> Result<&Round, ScheduleError> {
        self.check_rollover(elevation, now)?;
        let duration = self.next_round_duration(elevation);
        let schedule = self.schedule_mut(elevation);

        let number = schedule.current.number + 1;
        let next = Round {
            elevation,
            number,
            start: now,
            end: now.saturating_add(duration),
            winning_totem: None,
            seed: None,
            closed: false,
        };
        let mut closed = std::mem::replace(&mut schedule.current, next);
        if closed.number > 0 {
            closed.winning_totem = outcome.map(|(totem, _)| totem);
            closed.seed = outcome.map(|(_, seed)| seed);
            closed.closed = true;
            schedule.history.push(closed);
        }

        tracing::info!(
            %elevation,
            round = number,
            ends_in = %format_duration(duration),
            winner = ?outcome.map(|(t, _)| t),
            "round started"
        );
        Ok(&schedule.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> RoundScheduler {
        let mut params = EngineParams::default();
        params.unlock_delay_secs = [0, 100, 200, 300];
        params.base_round_duration_secs = 1000;
        params.round_duration_mult = [1, 1, 2, 4];
        params.lockout_secs = 120;
        RoundScheduler::new(&params, Timestamp::new(1000)).unwrap()
    }

    #[test]
    fn locked_before_unlock() {
        let s = scheduler();
        assert_eq!(s.status(Elevation::Mesa, Timestamp::new(1199)), ElevationStatus::Locked);
        assert_eq!(
            s.check_rollover(Elevation::Mesa, Timestamp::new(1199)),
            Err(ScheduleError::ElevationLocked {
                elevation: Elevation::Mesa,
                until: Timestamp::new(1200),
            })
        );
    }

    #[test]
    fn unlock_rollover_starts_round_one() {
        let mut s = scheduler();
        assert_eq!(s.status(Elevation::Mesa, Timestamp::new(1200)), ElevationStatus::RoundEnded);
        let round = s.begin_round(Elevation::Mesa, Timestamp::new(1200), None).unwrap();
        assert_eq!(round.number, 1);
        assert_eq!(round.end, Timestamp::new(3200));
        assert!(s.history(Elevation::Mesa).is_empty());
        assert_eq!(s.status(Elevation::Mesa, Timestamp::new(1300)), ElevationStatus::Active);
    }

    #[test]
    fn rollover_before_round_end_rejected() {
        let mut s = scheduler();
        s.begin_round(Elevation::Plains, Timestamp::new(1100), None).unwrap();
        let err = s
            .begin_round(Elevation::Plains, Timestamp::new(2099), None)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::ElevationLocked { .. }));
        assert_eq!(s.round_number(Elevation::Plains), 1);
    }

    #[test]
    fn rollover_records_winner_and_seed() {
        let mut s = scheduler();
        s.begin_round(Elevation::Plains, Timestamp::new(1100), None).unwrap();
        let seed = Hash32::new([9; 32]);
        s.begin_round(Elevation::Plains, Timestamp::new(2100), Some((Totem::ONE, seed)))
            .unwrap();
        let closed = &s.history(Elevation::Plains)[0];
        assert_eq!(closed.number, 1);
        assert_eq!(closed.winning_totem, Some(Totem::ONE));
        assert_eq!(closed.seed, Some(seed));
        assert!(closed.closed);
        assert_eq!(s.winning_totem_history(Elevation::Plains), vec![(1, Totem::ONE)]);
        assert_eq!(s.schedule(Elevation::Plains).winning_totem(1), Some(Totem::ONE));
    }

    #[test]
    fn multiplier_change_applies_from_next_rollover() {
        let mut s = scheduler();
        s.begin_round(Elevation::Plains, Timestamp::new(1100), None).unwrap();
        s.set_round_duration_multiplier(Elevation::Plains, 3).unwrap();
        // Current round keeps its end.
        assert_eq!(s.current_round(Elevation::Plains).end, Timestamp::new(2100));
        let round = s.begin_round(Elevation::Plains, Timestamp::new(2100), None).unwrap();
        assert_eq!(round.end, Timestamp::new(5100));
    }

    #[test]
    fn zero_multiplier_rejected() {
        let mut s = scheduler();
        assert_eq!(
            s.set_round_duration_multiplier(Elevation::Summit, 0),
            Err(ScheduleError::RoundDurationNonZero)
        );
    }

    #[test]
    fn lockout_only_for_started_lottery_rounds() {
        let mut s = scheduler();
        s.begin_round(Elevation::Oasis, Timestamp::new(1000), None).unwrap();
        s.begin_round(Elevation::Plains, Timestamp::new(1100), None).unwrap();
        // Plains ends at 2100, lockout starts at 1980.
        assert!(!s.in_lockout(Elevation::Plains, Timestamp::new(1979)));
        assert!(s.in_lockout(Elevation::Plains, Timestamp::new(1980)));
        assert!(s.in_lockout(Elevation::Plains, Timestamp::new(2500)));
        // Oasis is fixed and never locks out.
        assert!(!s.in_lockout(Elevation::Oasis, Timestamp::new(1999)));
        // Mesa has not started.
        assert!(!s.in_lockout(Elevation::Mesa, Timestamp::new(1999)));
    }

    #[test]
    fn round_lookup_by_number() {
        let mut s = scheduler();
        s.begin_round(Elevation::Plains, Timestamp::new(1100), None).unwrap();
        s.begin_round(Elevation::Plains, Timestamp::new(2100), Some((Totem::ZERO, Hash32::ZERO)))
            .unwrap();
        let schedule = s.schedule(Elevation::Plains);
        assert_eq!(schedule.round(1).unwrap().number, 1);
        assert_eq!(schedule.round(2).unwrap().number, 2);
        assert!(schedule.round(3).is_none());
    }
    #[test]
    fn lockout_change_applies_to_running_round() {
        let mut s = scheduler();
        s.begin_round(Elevation::Mesa, Timestamp::new(1200), None).unwrap();
        assert!(!s.in_lockout(Elevation::Mesa, Timestamp::new(2900)));
        s.set_lockout_secs(600);
        assert!(s.in_lockout(Elevation::Mesa, Timestamp::new(2900)));
        assert!(!s.in_lockout(Elevation::Mesa, Timestamp::new(2599)));
    }
}
