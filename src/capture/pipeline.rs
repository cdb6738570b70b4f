use crate::archive::SessionArchive;
use crate::capture::buffer::PointBuffer;
use crate::capture::context::PageContext;
use crate::capture::types::{LiveStats, PointKind, PointerEvent, TrackingPoint};
use crate::clock::Clock;
use crate::config::TrackerConfig;
use crate::engine::{GazeEngineAdapter, GazeSample, ListenerId};
use parking_lot::Mutex as ParkingMutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Log a progress line every this many gaze points
const PROGRESS_LOG_EVERY: usize = 100;

/// Distinct routes in first-visit order
#[derive(Debug, Default)]
struct PagesVisited {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl PagesVisited {
    fn insert(&mut self, page: &str) {
        if !self.seen.contains(page) {
            self.seen.insert(page.to_string());
            self.order.push(page.to_string());
        }
    }

    fn to_vec(&self) -> Vec<String> {
        self.order.clone()
    }

    fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
    }
}

struct PointerLane {
    buffer: PointBuffer,
    last_recorded_ms: Option<i64>,
}

/// State shared between the pipeline and the engine listener
///
/// Lock order is gaze → mouse → pages everywhere.
struct CaptureShared {
    is_capturing: AtomicBool,
    gaze: ParkingMutex<PointBuffer>,
    mouse: ParkingMutex<PointerLane>,
    pages: ParkingMutex<PagesVisited>,
    started_at: ParkingMutex<Option<i64>>,
    context: Arc<dyn PageContext>,
    clock: Arc<dyn Clock>,
    throttle_ms: i64,
}

impl CaptureShared {
    fn record_gaze(&self, sample: GazeSample) -> bool {
        if !sample.x.is_finite() || !sample.y.is_finite() {
            tracing::debug!("Dropping non-finite gaze sample ({}, {})", sample.x, sample.y);
            return false;
        }

        let context = self.context.snapshot();
        let mut gaze = self.gaze.lock();
        // Checked under the buffer lock so nothing lands after stop returns
        if !self.is_capturing.load(Ordering::SeqCst) {
            return false;
        }

        let point = TrackingPoint::new(sample.x, sample.y, sample.timestamp, PointKind::Gaze, &context);
        if !point.has_finite_position() {
            tracing::debug!("Dropping gaze sample with non-finite page offset");
            return false;
        }
        self.pages.lock().insert(&context.page);
        let dropped = gaze.push(point);
        if dropped > 0 {
            tracing::debug!("Gaze buffer full, evicted {} oldest points", dropped);
        }
        if gaze.len() % PROGRESS_LOG_EVERY == 0 {
            tracing::trace!("Tracking: {} gaze points", gaze.len());
        }
        true
    }

    fn record_pointer(&self, event: PointerEvent) -> bool {
        if !event.x.is_finite() || !event.y.is_finite() {
            return false;
        }

        let now = self.clock.now_ms();
        let context = self.context.snapshot();
        let mut lane = self.mouse.lock();
        if !self.is_capturing.load(Ordering::SeqCst) {
            return false;
        }

        let point = TrackingPoint::new(event.x, event.y, now, PointKind::Pointer, &context);
        if !point.has_finite_position() {
            return false;
        }
        if let Some(last) = lane.last_recorded_ms {
            if now - last < self.throttle_ms {
                return false;
            }
        }
        lane.last_recorded_ms = Some(now);

        self.pages.lock().insert(&context.page);
        let dropped = lane.buffer.push(point);
        if dropped > 0 {
            tracing::debug!("Pointer buffer full, evicted {} oldest points", dropped);
        }
        true
    }
}

/// Samples gaze and pointer positions into bounded, page-tagged buffers
///
/// Gaze points arrive through an engine listener; pointer moves are pushed by
/// the host through `record_pointer`. Both lanes write disjoint buffers and
/// are switched off together by `stop_capture`.
pub struct PointCapturePipeline {
    shared: Arc<CaptureShared>,
    listener: ParkingMutex<Option<ListenerId>>,
}

impl PointCapturePipeline {
    pub fn new(config: &TrackerConfig, context: Arc<dyn PageContext>, clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(CaptureShared {
                is_capturing: AtomicBool::new(false),
                gaze: ParkingMutex::new(PointBuffer::new(config.buffer_capacity, config.buffer_retain)),
                mouse: ParkingMutex::new(PointerLane {
                    buffer: PointBuffer::new(config.buffer_capacity, config.buffer_retain),
                    last_recorded_ms: None,
                }),
                pages: ParkingMutex::new(PagesVisited::default()),
                started_at: ParkingMutex::new(None),
                context,
                clock,
                throttle_ms: config.pointer_throttle_ms,
            }),
            listener: ParkingMutex::new(None),
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.shared.is_capturing.load(Ordering::SeqCst)
    }

    /// Start both capture lanes. Returns `false` if capture was already running.
    ///
    /// An engine that is not ready is not an error: the gaze lane simply stays
    /// empty while pointer capture proceeds.
    pub fn start_capture(&self, engine: &mut GazeEngineAdapter) -> bool {
        {
            let mut started_at = self.shared.started_at.lock();
            if started_at.is_none() {
                *started_at = Some(self.shared.clock.now_ms());
            }
        }

        if self.shared.is_capturing.swap(true, Ordering::SeqCst) {
            return false;
        }

        let shared = self.shared.clone();
        let id = engine.on_gaze_sample(Arc::new(move |sample| {
            shared.record_gaze(sample);
        }));
        *self.listener.lock() = Some(id);

        if engine.is_ready() {
            tracing::info!("Point capture started");
        } else {
            tracing::warn!(
                "Point capture started without a ready gaze engine ({:?}); only pointer samples will be recorded",
                engine.readiness()
            );
        }
        true
    }

    /// Feed one raw pointer-move event; returns whether it was recorded
    pub fn record_pointer(&self, event: PointerEvent) -> bool {
        self.shared.record_pointer(event)
    }

    /// Stop both lanes and return the final snapshot. Safe to call repeatedly.
    pub fn stop_capture(&self, engine: &mut GazeEngineAdapter) -> SessionArchive {
        let was_capturing = self.shared.is_capturing.swap(false, Ordering::SeqCst);

        if let Some(id) = self.listener.lock().take() {
            engine.remove_gaze_listener(id);
        }

        let archive = self.export();
        if was_capturing {
            tracing::info!(
                "Point capture stopped (gaze={}, mouse={}, pages={})",
                archive.session_info.total_gaze_points,
                archive.session_info.total_mouse_points,
                archive.session_info.pages_visited.len()
            );
        }
        archive
    }

    /// Point-in-time archive of the current buffers
    pub fn export(&self) -> SessionArchive {
        let end_time = self.shared.clock.now_ms();
        let start_time = self.shared.started_at.lock().unwrap_or(end_time);

        let gaze = self.shared.gaze.lock();
        let mouse = self.shared.mouse.lock();
        let pages = self.shared.pages.lock();

        SessionArchive::from_buffers(
            gaze.snapshot(),
            mouse.buffer.snapshot(),
            pages.to_vec(),
            start_time,
            end_time,
        )
    }

    /// Drop all samples and visited pages; the session clock restarts
    pub fn clear(&self) {
        let mut gaze = self.shared.gaze.lock();
        let mut mouse = self.shared.mouse.lock();
        let mut pages = self.shared.pages.lock();

        gaze.clear();
        mouse.buffer.clear();
        mouse.last_recorded_ms = None;
        pages.clear();

        *self.shared.started_at.lock() = if self.is_capturing() {
            Some(self.shared.clock.now_ms())
        } else {
            None
        };
        tracing::debug!("Capture buffers cleared");
    }

    pub fn live_stats(&self) -> LiveStats {
        let now = self.shared.clock.now_ms();
        let duration_secs = self
            .shared
            .started_at
            .lock()
            .map(|start| crate::archive::duration_secs(start, now))
            .unwrap_or(0);

        let gaze_count = self.shared.gaze.lock().len();
        let mouse_count = self.shared.mouse.lock().buffer.len();
        let pages_visited = self.shared.pages.lock().to_vec();

        LiveStats {
            gaze_count,
            mouse_count,
            pages_visited,
            duration_secs,
        }
    }

    /// Points dropped by eviction as (gaze, mouse)
    pub fn evicted_counts(&self) -> (u64, u64) {
        let gaze = self.shared.gaze.lock().evicted();
        let mouse = self.shared.mouse.lock().buffer.evicted();
        (gaze, mouse)
    }
}
