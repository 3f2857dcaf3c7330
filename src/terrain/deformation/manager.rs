// ============================================
// Deformation Manager - Движок продавливания
// ============================================
// Каждый тик: активация -> параметры поверхности -> один оператор.
// Наружу отдаётся только current сетка и её окно.

use ultraviolet::{Vec2, Vec3};

use super::config::DeformationConfig;
use super::grid::{grid_resolution, AccumulationGrid, DeformationBuffers};
use super::operators::{decay, recenter, stamp};
use super::scheduler::{GridOperation, SchedulerTimings, UpdateScheduler};
use super::surface::{SurfaceParams, SurfaceTable};
use super::uniforms::DeformationUniforms;

/// Предикат активации по позиции референсной точки
pub type ActivationPredicate = Box<dyn Fn(Vec3) -> bool + Send + Sync>;

/// Классификатор поверхности: позиция -> тег материала
pub type SurfaceClassifier = Box<dyn Fn(Vec3) -> String + Send + Sync>;

/// Окно деформации для рендера
#[derive(Clone, Copy, Debug)]
pub struct DeformationWindow<'a> {
    pub grid: &'a AccumulationGrid,
    pub center: Vec2,
    pub half_extent: f32,
}

impl DeformationWindow<'_> {
    /// Глубина в мировой точке (0 вне окна)
    #[inline]
    pub fn depth_at(&self, world: Vec2) -> f32 {
        self.grid.sample_depth(world)
    }
}

/// Счётчики применённых операторов
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OperatorStats {
    pub recenters: u64,
    pub stamps: u64,
    pub decays: u64,
}

pub struct DeformationManager {
    config: DeformationConfig,
    surfaces: SurfaceTable,
    classifier: SurfaceClassifier,
    activation: ActivationPredicate,
    scheduler: UpdateScheduler,
    buffers: Option<DeformationBuffers>,
    enabled: bool,
    current_time: f32,
    current_surface: Option<String>,
    params: SurfaceParams,
    stats: OperatorStats,
}

impl DeformationManager {
    pub fn new(config: DeformationConfig, surfaces: SurfaceTable) -> Self {
        let scheduler = UpdateScheduler::new(SchedulerTimings {
            recenter_threshold: config.recenter_threshold,
            max_stamp_wait: config.max_stamp_wait,
            decay_tick_interval: config.decay_tick_interval,
        });
        let params = surfaces.default_params();

        Self {
            config,
            surfaces,
            // Классификатор-заглушка: везде снег
            classifier: Box::new(|_: Vec3| "snow".to_string()),
            activation: Box::new(|_: Vec3| true),
            scheduler,
            buffers: None,
            enabled: true,
            current_time: 0.0,
            current_surface: None,
            params,
            stats: OperatorStats::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: SurfaceClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_activation(mut self, activation: ActivationPredicate) -> Self {
        self.activation = activation;
        self
    }

    /// Обновление за тик. Возвращает применённую операцию
    pub fn update(&mut self, dt: f32, reference: Vec3) -> Option<GridOperation> {
        if !self.enabled {
            return None;
        }

        self.current_time += dt.max(0.0);
        let time = self.current_time;

        let active = (self.activation)(reference);
        if self.scheduler.set_active(active, time) {
            log::info!("Deformation {}", if active { "activated" } else { "deactivated" });
        }
        if !active {
            return None;
        }

        self.refresh_surface(reference);

        let ground = self.config.ground_plane.project(reference);
        let config = &self.config;
        let buffers = self.buffers.get_or_insert_with(|| {
            let resolution = grid_resolution(config.resolution);
            log::info!(
                "Creating deformation grids {}x{} at ({:.0}, {:.0})",
                resolution, resolution, ground.x, ground.y
            );
            DeformationBuffers::new(resolution, ground, config.half_extent)
        });

        let window_center = buffers.current().center();
        let op = self.scheduler.select(ground, time, window_center, &self.params)?;

        let epsilon = self.config.epsilon;
        match op {
            GridOperation::Recenter { to, .. } => {
                let sampling = self.config.recenter_sampling;
                buffers.apply(|src, dst| recenter(to, sampling, src, dst));
                self.stats.recenters += 1;
            }
            GridOperation::Stamp(event) => {
                buffers.apply(|src, dst| stamp(&event, epsilon, src, dst));
                self.stats.stamps += 1;
            }
            GridOperation::Decay { time } => {
                let duration = self.config.decay_duration;
                buffers.apply(|src, dst| decay(time, duration, epsilon, src, dst));
                self.stats.decays += 1;
            }
        }
        log::debug!("Applied {} at t={:.2}", op.name(), time);

        Some(op)
    }

    /// Перечитать параметры только при смене тега поверхности
    fn refresh_surface(&mut self, reference: Vec3) {
        let tag = (self.classifier)(reference);
        if self.current_surface.as_deref() == Some(tag.as_str()) {
            return;
        }

        self.params = match self.surfaces.find(&tag) {
            Some(entry) => entry.params(),
            None => {
                log::info!("Unknown surface '{}', using default parameters", tag);
                self.surfaces.default_params()
            }
        };
        log::info!(
            "Surface changed to '{}' - radius={}, depth={}, interval={}",
            tag,
            self.params.footprint_radius,
            self.params.max_depth,
            self.params.stamp_interval_distance
        );
        self.current_surface = Some(tag);
    }

    /// Окно для рендера. None = деформации нет
    pub fn sample_window(&self) -> Option<DeformationWindow<'_>> {
        if !self.enabled || !self.scheduler.is_active() {
            return None;
        }
        let grid = self.buffers.as_ref()?.current();
        Some(DeformationWindow {
            grid,
            center: grid.center(),
            half_extent: grid.half_extent(),
        })
    }

    /// Uniform-блок для шейдера terrain
    pub fn uniforms(&self) -> DeformationUniforms {
        self.sample_window()
            .map(|w| DeformationUniforms::from_grid(w.grid))
            .unwrap_or_else(DeformationUniforms::disabled)
    }

    #[inline]
    pub fn surface_params(&self) -> SurfaceParams {
        self.params
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;

        if !enabled {
            self.scheduler.set_active(false, self.current_time);
            self.buffers = None;
            self.current_surface = None;
        }
        log::info!("Deformation {}", if enabled { "enabled" } else { "disabled" });
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.enabled && self.scheduler.is_active()
    }

    #[inline]
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    #[inline]
    pub fn stats(&self) -> OperatorStats {
        self.stats
    }

    pub fn config(&self) -> &DeformationConfig {
        &self.config
    }
}
