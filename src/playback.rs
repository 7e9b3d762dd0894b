//! Manages the playback state shared by the inline viewer and the
//! fullscreen view: current slide, play/pause, fullscreen and the
//! auto-advance timer.
//!
//! The timer is a tokio task owned by [`AutoAdvanceTimer`]; dropping the
//! guard aborts the task. Each schedule has an id carried by its ticks, so a
//! tick queued by a schedule that has since been replaced is ignored.

use super::model::PlaybackState;
use super::slides_controller::RepaintHook;
use log::{debug, info, trace, warn};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// A running auto-advance schedule. Aborted on drop.
#[derive(Debug)]
struct AutoAdvanceTimer {
    id: u64,
    handle: JoinHandle<()>,
}

impl AutoAdvanceTimer {
    fn start(id: u64, period: Duration, ticks: mpsc::UnboundedSender<u64>, repaint: Option<RepaintHook>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                trace!("Auto-advance tick (schedule {})", id);
                if ticks.send(id).is_err() {
                    break;
                }
                if let Some(repaint) = &repaint {
                    repaint();
                }
            }
        });
        Self { id, handle }
    }
}

impl Drop for AutoAdvanceTimer {
    fn drop(&mut self) {
        trace!("Stopping auto-advance schedule {}", self.id);
        self.handle.abort();
    }
}

pub struct PlaybackEngine {
    state: PlaybackState,
    slide_count: usize,
    interval: Duration,
    timer: Option<AutoAdvanceTimer>,
    next_schedule_id: u64,
    ticks_tx: mpsc::UnboundedSender<u64>,
    ticks_rx: mpsc::UnboundedReceiver<u64>,
    repaint: Option<RepaintHook>,
}

impl PlaybackEngine {
    pub fn new(interval: Duration) -> Self {
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();
        Self {
            state: PlaybackState::default(),
            slide_count: 0,
            interval,
            timer: None,
            next_schedule_id: 0,
            ticks_tx,
            ticks_rx,
            repaint: None,
        }
    }

    pub fn with_repaint_hook(mut self, hook: RepaintHook) -> Self {
        self.repaint = Some(hook);
        self
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn is_fullscreen(&self) -> bool {
        self.state.is_fullscreen
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    /// Whether an auto-advance schedule is live.
    pub fn is_scheduled(&self) -> bool {
        self.timer.is_some()
    }

    /// Starts over on a new slide list: first slide, playing. Fullscreen is
    /// left as it is.
    pub fn reset(&mut self, slide_count: usize) {
        debug!("Playback reset for {} slide(s)", slide_count);
        self.state.current_index = 0;
        self.state.is_playing = true;
        self.slide_count = slide_count;
        self.reschedule();
    }

    pub fn next(&mut self) {
        if self.slide_count == 0 {
            return;
        }
        self.state.current_index = (self.state.current_index + 1) % self.slide_count;
        trace!("Next slide: {}", self.state.current_index);
    }

    pub fn prev(&mut self) {
        if self.slide_count == 0 {
            return;
        }
        self.state.current_index = (self.state.current_index + self.slide_count - 1) % self.slide_count;
        trace!("Previous slide: {}", self.state.current_index);
    }

    /// Shows the slide at `index`; the caller supplies a valid index.
    pub fn jump_to(&mut self, index: usize) {
        if index >= self.slide_count {
            warn!("Jump to slide {} outside of {} slide(s)", index, self.slide_count);
        }
        self.state.current_index = index;
    }

    pub fn toggle_play(&mut self) {
        self.state.is_playing = !self.state.is_playing;
        info!("Playback {}", if self.state.is_playing { "resumed" } else { "paused" });
        self.reschedule();
    }

    /// Flips the fullscreen flag; index and play state are untouched.
    pub fn toggle_fullscreen(&mut self) {
        self.state.is_fullscreen = !self.state.is_fullscreen;
        debug!("Fullscreen view {}", if self.state.is_fullscreen { "opened" } else { "closed" });
    }

    /// Advances once for every tick of the live schedule received so far.
    /// Returns the number of advances.
    pub fn poll(&mut self) -> usize {
        let mut advanced = 0;
        while let Ok(id) = self.ticks_rx.try_recv() {
            if self.accept_tick(id) {
                self.next();
                advanced += 1;
            }
        }
        advanced
    }

    /// Waits for the next tick of the live schedule and advances. Returns
    /// immediately when nothing is scheduled.
    pub async fn wait_for_tick(&mut self) {
        while self.timer.is_some() {
            match self.ticks_rx.recv().await {
                Some(id) if self.accept_tick(id) => {
                    self.next();
                    return;
                }
                Some(_) => continue,
                None => return,
            }
        }
    }

    fn accept_tick(&self, id: u64) -> bool {
        let live = self.timer.as_ref().is_some_and(|timer| timer.id == id);
        if !live {
            trace!("Ignoring tick from stopped schedule {}", id);
        }
        live
    }

    /// Replaces the schedule to match the current play state and slide count.
    fn reschedule(&mut self) {
        self.timer = None;
        if self.state.is_playing && self.slide_count > 0 {
            self.next_schedule_id += 1;
            debug!(
                "Auto-advance every {:?} over {} slide(s) (schedule {})",
                self.interval, self.slide_count, self.next_schedule_id
            );
            self.timer = Some(AutoAdvanceTimer::start(
                self.next_schedule_id,
                self.interval,
                self.ticks_tx.clone(),
                self.repaint.clone(),
            ));
        }
    }
}

/// A surface that can be put into native fullscreen.
pub trait FullscreenSurface {
    fn is_fullscreen(&self) -> bool;
    fn request_fullscreen(&mut self) -> Result<(), String>;
    fn exit_fullscreen(&mut self) -> Result<(), String>;
}

/// Enters native fullscreen, or leaves it when already there. Platform
/// failures are logged and otherwise ignored. Returns the state requested.
pub fn toggle_native_fullscreen(surface: &mut impl FullscreenSurface) -> bool {
    let entering = !surface.is_fullscreen();
    let result = if entering { surface.request_fullscreen() } else { surface.exit_fullscreen() };
    if let Err(e) = result {
        warn!("Native fullscreen {} failed: {}", if entering { "request" } else { "exit" }, e);
    }
    entering
}

/// Brings the surface to `wanted`, leaving it alone when it is already there.
pub fn sync_native_fullscreen(surface: &mut impl FullscreenSurface, wanted: bool) {
    if surface.is_fullscreen() != wanted {
        toggle_native_fullscreen(surface);
    }
}
