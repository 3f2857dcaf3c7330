// ============================================
// Update Scheduler - Один оператор за тик
// ============================================
//
// Приоритет: Recenter > Stamp > Decay.
// Первый подходящий выигрывает, остальные ждут следующего тика.

use ultraviolet::Vec2;

use super::operators::StampEvent;
use super::surface::SurfaceParams;

/// Состояние планировщика
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Inactive,
    Active,
}

/// Выбранная на этот тик операция
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GridOperation {
    Recenter { from: Vec2, to: Vec2 },
    Stamp(StampEvent),
    Decay { time: f32 },
}

impl GridOperation {
    pub fn name(&self) -> &'static str {
        match self {
            GridOperation::Recenter { .. } => "recenter",
            GridOperation::Stamp(_) => "stamp",
            GridOperation::Decay { .. } => "decay",
        }
    }
}

/// Пороги планировщика
#[derive(Clone, Copy, Debug)]
pub struct SchedulerTimings {
    pub recenter_threshold: f32,
    pub max_stamp_wait: f32,
    pub decay_tick_interval: f32,
}

/// Машина состояний выбора оператора
pub struct UpdateScheduler {
    timings: SchedulerTimings,
    state: SchedulerState,
    last_stamp_position: Option<Vec2>,
    last_stamp_time: Option<f32>,
    last_decay_time: f32,
}

impl UpdateScheduler {
    pub fn new(timings: SchedulerTimings) -> Self {
        Self {
            timings,
            state: SchedulerState::Inactive,
            last_stamp_position: None,
            last_stamp_time: None,
            last_decay_time: 0.0,
        }
    }

    #[inline]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == SchedulerState::Active
    }

    /// Переход по предикату активации. Возвращает true при смене состояния
    pub fn set_active(&mut self, active: bool, time: f32) -> bool {
        let next = if active { SchedulerState::Active } else { SchedulerState::Inactive };
        if next == self.state {
            return false;
        }

        self.state = next;
        if next == SchedulerState::Active {
            // Первый штамп сразу после активации
            self.last_stamp_position = None;
            self.last_stamp_time = None;
            self.last_decay_time = time;
        }
        true
    }

    /// Выбрать не более одной операции на тик
    pub fn select(
        &mut self,
        reference: Vec2,
        time: f32,
        window_center: Vec2,
        params: &SurfaceParams,
    ) -> Option<GridOperation> {
        if self.state == SchedulerState::Inactive {
            return None;
        }

        // 1. Recenter
        if (reference - window_center).mag() > self.timings.recenter_threshold {
            return Some(GridOperation::Recenter { from: window_center, to: reference });
        }

        // 2. Stamp
        let moved_far = self
            .last_stamp_position
            .map_or(true, |last| (reference - last).mag() > params.stamp_interval_distance);
        let waited_long = self
            .last_stamp_time
            .map_or(true, |last| time - last > self.timings.max_stamp_wait);

        if moved_far || waited_long {
            self.last_stamp_position = Some(reference);
            self.last_stamp_time = Some(time);
            return Some(GridOperation::Stamp(StampEvent {
                position: reference,
                influence_radius: params.footprint_radius,
                max_depth: params.max_depth,
                time,
            }));
        }

        // 3. Decay
        if time - self.last_decay_time > self.timings.decay_tick_interval {
            self.last_decay_time = time;
            return Some(GridOperation::Decay { time });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> UpdateScheduler {
        let mut s = UpdateScheduler::new(SchedulerTimings {
            recenter_threshold: 50.0,
            max_stamp_wait: 0.5,
            decay_tick_interval: 0.1,
        });
        s.set_active(true, 0.0);
        s
    }

    #[test]
    fn test_inactive_selects_nothing() {
        let mut s = UpdateScheduler::new(SchedulerTimings {
            recenter_threshold: 50.0,
            max_stamp_wait: 0.5,
            decay_tick_interval: 0.1,
        });
        assert_eq!(s.state(), SchedulerState::Inactive);
        assert!(s.select(Vec2::zero(), 10.0, Vec2::new(500.0, 0.0), &SurfaceParams::SNOW).is_none());
    }

    #[test]
    fn test_recenter_wins_over_stamp() {
        let mut s = scheduler();
        let op = s.select(Vec2::new(60.0, 0.0), 1.0, Vec2::zero(), &SurfaceParams::SNOW);
        assert!(matches!(op, Some(GridOperation::Recenter { .. })));

        // Штамп отложен, а не потерян
        let op = s.select(Vec2::new(60.0, 0.0), 1.1, Vec2::new(60.0, 0.0), &SurfaceParams::SNOW);
        assert!(matches!(op, Some(GridOperation::Stamp(_))));
    }

    #[test]
    fn test_stamp_then_decay_then_wait_stamp() {
        let mut s = scheduler();
        let p = SurfaceParams::SNOW;

        let op = s.select(Vec2::zero(), 0.05, Vec2::zero(), &p);
        match op {
            Some(GridOperation::Stamp(e)) => {
                assert_eq!(e.influence_radius, 60.0);
                assert_eq!(e.max_depth, 100.0);
                assert_eq!(e.time, 0.05);
            }
            other => panic!("expected stamp, got {:?}", other),
        }

        // Стоим на месте: сначала ничего, потом decay
        assert!(s.select(Vec2::zero(), 0.08, Vec2::zero(), &p).is_none());
        assert!(matches!(s.select(Vec2::zero(), 0.2, Vec2::zero(), &p), Some(GridOperation::Decay { .. })));

        // Долго стоим: повторный штамп по таймеру
        assert!(matches!(s.select(Vec2::zero(), 0.6, Vec2::zero(), &p), Some(GridOperation::Stamp(_))));
    }

    #[test]
    fn test_stamp_on_distance() {
        let mut s = scheduler();
        let p = SurfaceParams::SNOW;
        s.select(Vec2::zero(), 0.0, Vec2::zero(), &p);

        assert!(s.select(Vec2::new(1.5, 0.0), 0.01, Vec2::zero(), &p).is_none());
        assert!(matches!(
            s.select(Vec2::new(2.5, 0.0), 0.02, Vec2::zero(), &p),
            Some(GridOperation::Stamp(_))
        ));
    }

    #[test]
    fn test_reactivation_stamps_immediately() {
        let mut s = scheduler();
        let p = SurfaceParams::SNOW;
        s.select(Vec2::zero(), 0.0, Vec2::zero(), &p);
        assert!(s.set_active(false, 0.01));
        assert!(!s.set_active(false, 0.02));
        assert!(s.set_active(true, 0.03));
        assert!(matches!(s.select(Vec2::zero(), 0.04, Vec2::zero(), &p), Some(GridOperation::Stamp(_))));
    }
}
