//! Owns the slides of the currently selected day.
//!
//! The controller gates a selection on the current weekday, runs the fetch
//! as a background task and publishes slides, loading flag and error state.
//! Every fetch is tagged with a generation; starting a new one cancels the
//! previous task and any outcome from an older generation is discarded, so a
//! late response can never overwrite newer state.

use super::day_gate::{self, Clock};
use super::errors::FetchError;
use super::model::{ErrorKind, ErrorState, Slide, SlidesPhase, WeekDay};
use super::slide_fetcher::{SlideFetcher, SlideTransport};
use log::{debug, info, trace, warn};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const NOT_TODAY_MESSAGE: &str = "Presentations are available only for the current day.";
pub const NO_PRESENTATION_MESSAGE: &str = "No presentation available for this day.";
pub const CONNECTION_MESSAGE: &str = "Connection error. Check your internet connection.";

/// Called from background tasks when there is something for `poll` to apply.
pub type RepaintHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug)]
struct FetchOutcome {
    generation: u64,
    day: WeekDay,
    result: Result<Vec<Slide>, FetchError>,
}

pub struct SlidesController<T: SlideTransport> {
    fetcher: Arc<SlideFetcher<T>>,
    clock: Arc<dyn Clock>,
    shuffle: bool,
    selected_day: Option<WeekDay>,
    phase: SlidesPhase,
    slides: Vec<Slide>,
    loading: bool,
    error: ErrorState,
    generation: u64,
    in_flight: Option<CancellationToken>,
    outcomes_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    repaint: Option<RepaintHook>,
}

impl<T: SlideTransport> SlidesController<T> {
    pub fn new(fetcher: SlideFetcher<T>, clock: Arc<dyn Clock>, shuffle: bool) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        Self {
            fetcher: Arc::new(fetcher),
            clock,
            shuffle,
            selected_day: None,
            phase: SlidesPhase::Idle,
            slides: Vec::new(),
            loading: false,
            error: ErrorState::none(),
            generation: 0,
            in_flight: None,
            outcomes_tx,
            outcomes_rx,
            repaint: None,
        }
    }

    pub fn with_repaint_hook(mut self, hook: RepaintHook) -> Self {
        self.repaint = Some(hook);
        self
    }

    pub fn selected_day(&self) -> Option<WeekDay> {
        self.selected_day
    }

    pub fn phase(&self) -> SlidesPhase {
        self.phase
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> &ErrorState {
        &self.error
    }

    /// Selects `day` and loads its slides if it is today.
    ///
    /// Must be called from within a tokio runtime.
    pub fn select_day(&mut self, day: WeekDay) {
        info!("Day selected: '{}'", day);
        self.cancel_in_flight();
        self.selected_day = Some(day);
        self.load(day);
    }

    /// Reloads the selected day. No-op without a selection or once the day
    /// is no longer today.
    pub fn retry(&mut self) {
        let Some(day) = self.selected_day else {
            debug!("Retry ignored: no day selected");
            return;
        };
        if !day_gate::is_eligible(day, &self.clock.now()) {
            debug!("Retry ignored: '{}' is not today", day);
            return;
        }
        info!("Retrying slides for '{}'", day);
        self.load(day);
    }

    /// Clears the error without touching slides or the loading flag.
    pub fn clear_error(&mut self) {
        if self.error.has_error() {
            debug!("Clearing error: {}", self.error.message());
        }
        self.error = ErrorState::none();
    }

    /// Returns to `Idle`, dropping slides, error and any in-flight fetch.
    pub fn deselect(&mut self) {
        info!("Day deselected");
        self.cancel_in_flight();
        self.selected_day = None;
        self.slides.clear();
        self.loading = false;
        self.error = ErrorState::none();
        self.set_phase(SlidesPhase::Idle);
    }

    /// Applies every fetch outcome that has arrived. Returns true when the
    /// published state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            changed |= self.apply(outcome);
        }
        changed
    }

    /// Waits until the current fetch, if any, has been applied.
    pub async fn wait_for_update(&mut self) {
        while self.loading {
            match self.outcomes_rx.recv().await {
                Some(outcome) => {
                    self.apply(outcome);
                }
                None => break,
            }
        }
    }

    fn load(&mut self, day: WeekDay) {
        self.set_phase(SlidesPhase::Gating);
        let now = self.clock.now();
        if !day_gate::is_eligible(day, &now) {
            info!("'{}' blocked, today is '{}'", day, day_gate::weekday_of(&now));
            self.cancel_in_flight();
            self.slides.clear();
            self.loading = false;
            self.error = ErrorState::new(ErrorKind::NoContent, NOT_TODAY_MESSAGE);
            self.set_phase(SlidesPhase::Blocked);
            return;
        }

        self.cancel_in_flight();
        self.error = ErrorState::none();
        self.slides.clear();
        self.loading = true;
        self.generation += 1;
        self.set_phase(SlidesPhase::Loading);

        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());
        let generation = self.generation;
        let fetcher = Arc::clone(&self.fetcher);
        let outcomes_tx = self.outcomes_tx.clone();
        let repaint = self.repaint.clone();
        debug!("Spawning slide fetch for '{}' (generation {})", day, generation);
        tokio::spawn(async move {
            let result = fetcher.fetch(day, &token).await;
            if outcomes_tx.send(FetchOutcome { generation, day, result }).is_err() {
                trace!("Controller gone before fetch for '{}' finished", day);
                return;
            }
            if let Some(repaint) = repaint {
                repaint();
            }
        });
    }

    fn apply(&mut self, outcome: FetchOutcome) -> bool {
        if outcome.generation != self.generation || !self.loading {
            debug!(
                "Discarding stale fetch outcome for '{}' (generation {}, current {})",
                outcome.day, outcome.generation, self.generation
            );
            return false;
        }
        if matches!(outcome.result, Err(FetchError::Superseded)) {
            return false;
        }

        self.in_flight = None;
        self.loading = false;
        match outcome.result {
            Ok(mut slides) => {
                if self.shuffle {
                    slides.shuffle(&mut rand::rng());
                }
                self.error = if slides.is_empty() {
                    ErrorState::new(ErrorKind::Api, NO_PRESENTATION_MESSAGE)
                } else {
                    ErrorState::none()
                };
                info!("Published {} slide(s) for '{}'", slides.len(), outcome.day);
                self.slides = slides;
                self.set_phase(SlidesPhase::Ready);
            }
            Err(e) => {
                warn!("Slides for '{}' failed to load: {}", outcome.day, e);
                self.slides.clear();
                self.error = if e.is_connectivity() {
                    ErrorState::new(ErrorKind::Network, CONNECTION_MESSAGE)
                } else {
                    ErrorState::new(ErrorKind::General, e.to_string())
                };
                self.set_phase(SlidesPhase::Failed);
            }
        }
        true
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            debug!("Cancelling in-flight fetch (generation {})", self.generation);
            token.cancel();
        }
    }

    fn set_phase(&mut self, phase: SlidesPhase) {
        if self.phase != phase {
            debug!("Slides phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}

impl<T: SlideTransport> Drop for SlidesController<T> {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::day_gate::testing::ManualClock;
    use crate::slide_fetcher::testing::{ok_body, refused, status, ScriptedTransport, Step};
    use crate::slide_fetcher::RetryPolicy;
    use std::time::Duration;
    use url::Url;

    const TWO_SLIDES: &str = r#"[{"id":"1","title":"A","url":"http://x/a.png"},{"id":"2","title":"B","url":"http://x/b.mp4"}]"#;
    const OTHER_SLIDES: &str = r#"[{"id":"9","title":"Z","url":"http://x/z.png"}]"#;

    // 2026-10-16 is a Friday.
    fn friday_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::at(2026, 10, 16))
    }

    fn controller(transport: ScriptedTransport, clock: Arc<ManualClock>) -> SlidesController<ScriptedTransport> {
        let fetcher = SlideFetcher::new(transport, Url::parse("http://hook.test/slides").unwrap(), RetryPolicy::default());
        SlidesController::new(fetcher, clock, false)
    }

    fn ids(controller: &SlidesController<ScriptedTransport>) -> Vec<&str> {
        controller.slides().iter().map(|s| s.id.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn eligible_day_loads_slides() {
        let transport = ScriptedTransport::immediate(vec![ok_body(TWO_SLIDES)]);
        let mut controller = controller(transport.clone(), friday_clock());

        controller.select_day(WeekDay::Friday);
        assert_eq!(controller.phase(), SlidesPhase::Loading);
        assert!(controller.is_loading());

        controller.wait_for_update().await;

        assert_eq!(controller.phase(), SlidesPhase::Ready);
        assert!(!controller.is_loading());
        assert_eq!(ids(&controller), vec!["1", "2"]);
        assert!(!controller.error().has_error());
        assert_eq!(transport.call_urls()[0].as_str(), "http://hook.test/slides?day=sexta");
    }

    #[tokio::test(start_paused = true)]
    async fn other_days_are_blocked_without_fetching() {
        let transport = ScriptedTransport::immediate(vec![ok_body(TWO_SLIDES)]);
        let mut controller = controller(transport.clone(), friday_clock());

        controller.select_day(WeekDay::Monday);

        assert_eq!(controller.phase(), SlidesPhase::Blocked);
        assert!(!controller.is_loading());
        assert_eq!(controller.error().kind(), ErrorKind::NoContent);
        assert_eq!(controller.error().message(), NOT_TODAY_MESSAGE);
        assert!(controller.slides().is_empty());
        tokio::task::yield_now().await;
        assert!(transport.call_times().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_batch_is_ready_with_api_error() {
        let transport = ScriptedTransport::immediate(vec![ok_body("[]")]);
        let mut controller = controller(transport, friday_clock());

        controller.select_day(WeekDay::Friday);
        controller.wait_for_update().await;

        assert_eq!(controller.phase(), SlidesPhase::Ready);
        assert!(controller.slides().is_empty());
        assert_eq!(controller.error().kind(), ErrorKind::Api);
        assert_eq!(controller.error().message(), NO_PRESENTATION_MESSAGE);
        assert!(!controller.error().can_retry());
    }

    #[tokio::test(start_paused = true)]
    async fn connectivity_failure_after_retries_is_a_network_error() {
        let transport = ScriptedTransport::immediate(vec![refused(), refused(), refused(), refused()]);
        let mut controller = controller(transport.clone(), friday_clock());

        controller.select_day(WeekDay::Friday);
        controller.wait_for_update().await;

        assert_eq!(controller.phase(), SlidesPhase::Failed);
        assert_eq!(controller.error().kind(), ErrorKind::Network);
        assert_eq!(controller.error().message(), CONNECTION_MESSAGE);
        assert!(controller.error().can_retry());
        assert_eq!(transport.call_times().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn http_failure_is_a_general_error_with_status_message() {
        let transport = ScriptedTransport::immediate(vec![status(502, "Bad Gateway")]);
        let mut controller = controller(transport, friday_clock());

        controller.select_day(WeekDay::Friday);
        controller.wait_for_update().await;

        assert_eq!(controller.phase(), SlidesPhase::Failed);
        assert_eq!(controller.error().kind(), ErrorKind::General);
        assert_eq!(controller.error().message(), "Error 502: Bad Gateway");
        assert!(controller.slides().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_leave_no_visible_error() {
        let transport = ScriptedTransport::immediate(vec![refused(), refused(), ok_body(TWO_SLIDES)]);
        let mut controller = controller(transport.clone(), friday_clock());

        controller.select_day(WeekDay::Friday);
        controller.wait_for_update().await;

        assert_eq!(controller.phase(), SlidesPhase::Ready);
        assert!(!controller.error().has_error());
        assert_eq!(controller.slides().len(), 2);
        let times = transport.call_times();
        assert!(times[1] - times[0] >= Duration::from_millis(2000));
        assert!(times[2] - times[1] >= Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn switching_day_mid_fetch_hides_the_stale_result() {
        let transport = ScriptedTransport::new(vec![Step { delay: Duration::from_secs(5), result: ok_body(TWO_SLIDES) }]);
        let mut controller = controller(transport, friday_clock());

        controller.select_day(WeekDay::Friday);
        tokio::time::sleep(Duration::from_secs(1)).await;
        controller.select_day(WeekDay::Saturday);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(!controller.poll());
        assert_eq!(controller.selected_day(), Some(WeekDay::Saturday));
        assert_eq!(controller.phase(), SlidesPhase::Blocked);
        assert!(controller.slides().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reloading_mid_fetch_keeps_only_the_newest_result() {
        let transport = ScriptedTransport::new(vec![
            Step { delay: Duration::from_secs(5), result: ok_body(TWO_SLIDES) },
            Step { delay: Duration::from_secs(1), result: ok_body(OTHER_SLIDES) },
        ]);
        let mut controller = controller(transport, friday_clock());

        controller.select_day(WeekDay::Friday);
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.retry();
        controller.wait_for_update().await;
        assert_eq!(ids(&controller), vec!["9"]);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!controller.poll());
        assert_eq!(ids(&controller), vec!["9"]);
    }

    #[tokio::test(start_paused = true)]
    async fn outcomes_from_older_generations_are_discarded() {
        let transport = ScriptedTransport::new(vec![Step { delay: Duration::from_secs(60), result: ok_body(OTHER_SLIDES) }]);
        let mut controller = controller(transport, friday_clock());
        controller.select_day(WeekDay::Friday);

        let stale = FetchOutcome {
            generation: controller.generation - 1,
            day: WeekDay::Friday,
            result: Err(FetchError::Connectivity("late".into())),
        };
        controller.outcomes_tx.send(stale).unwrap();

        assert!(!controller.poll());
        assert_eq!(controller.phase(), SlidesPhase::Loading);
        assert!(!controller.error().has_error());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_without_selection_is_a_no_op() {
        let transport = ScriptedTransport::immediate(vec![ok_body(TWO_SLIDES)]);
        let mut controller = controller(transport.clone(), friday_clock());

        controller.retry();
        tokio::task::yield_now().await;

        assert_eq!(controller.phase(), SlidesPhase::Idle);
        assert!(!controller.is_loading());
        assert!(transport.call_times().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_is_ignored_once_the_day_has_passed() {
        let clock = friday_clock();
        let transport = ScriptedTransport::immediate(vec![refused(), refused(), refused(), refused(), ok_body(TWO_SLIDES)]);
        let mut controller = controller(transport.clone(), clock.clone());
        controller.select_day(WeekDay::Friday);
        controller.wait_for_update().await;
        assert_eq!(controller.phase(), SlidesPhase::Failed);

        clock.set(2026, 10, 17);
        controller.retry();

        assert_eq!(controller.phase(), SlidesPhase::Failed);
        assert!(!controller.is_loading());
        assert_eq!(transport.call_times().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_network_error_reloads() {
        let transport = ScriptedTransport::immediate(vec![refused(), refused(), refused(), refused(), ok_body(TWO_SLIDES)]);
        let mut controller = controller(transport, friday_clock());
        controller.select_day(WeekDay::Friday);
        controller.wait_for_update().await;
        assert!(controller.error().can_retry());

        controller.retry();
        assert_eq!(controller.phase(), SlidesPhase::Loading);
        assert!(!controller.error().has_error());
        controller.wait_for_update().await;

        assert_eq!(controller.phase(), SlidesPhase::Ready);
        assert_eq!(controller.slides().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_error_keeps_slides_and_loading() {
        let transport = ScriptedTransport::immediate(vec![ok_body("[]")]);
        let mut controller = controller(transport, friday_clock());
        controller.select_day(WeekDay::Friday);
        controller.wait_for_update().await;

        controller.clear_error();

        assert_eq!(*controller.error(), ErrorState::none());
        assert_eq!(controller.phase(), SlidesPhase::Ready);
        assert!(!controller.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn deselect_returns_to_idle_and_drops_the_fetch() {
        let transport = ScriptedTransport::new(vec![Step { delay: Duration::from_secs(5), result: ok_body(TWO_SLIDES) }]);
        let mut controller = controller(transport, friday_clock());
        controller.select_day(WeekDay::Friday);

        controller.deselect();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(!controller.poll());
        assert_eq!(controller.phase(), SlidesPhase::Idle);
        assert_eq!(controller.selected_day(), None);
        assert!(controller.slides().is_empty());
        assert!(!controller.error().has_error());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_controller_stops_retrying() {
        let transport = ScriptedTransport::immediate(vec![refused(), refused(), refused(), refused()]);
        let mut controller = controller(transport.clone(), friday_clock());
        controller.select_day(WeekDay::Friday);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(transport.call_times().len(), 1);

        drop(controller);
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(transport.call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repaint_hook_fires_when_an_outcome_arrives() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let repaints = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&repaints);
        let transport = ScriptedTransport::immediate(vec![ok_body(TWO_SLIDES)]);
        let mut controller = controller(transport, friday_clock())
            .with_repaint_hook(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));

        controller.select_day(WeekDay::Friday);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(repaints.load(Ordering::SeqCst), 1);
        assert!(controller.poll());
        assert_eq!(controller.phase(), SlidesPhase::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn shuffle_keeps_every_slide() {
        let body = r#"[{"id":"1","title":"A","url":"http://x/1.png"},{"id":"2","title":"B","url":"http://x/2.png"},
                       {"id":"3","title":"C","url":"http://x/3.png"},{"id":"4","title":"D","url":"http://x/4.png"}]"#;
        let fetcher = SlideFetcher::new(
            ScriptedTransport::immediate(vec![ok_body(body)]),
            Url::parse("http://hook.test/slides").unwrap(),
            RetryPolicy::default(),
        );
        let mut controller = SlidesController::new(fetcher, friday_clock(), true);

        controller.select_day(WeekDay::Friday);
        controller.wait_for_update().await;

        let mut seen = ids(&controller);
        seen.sort_unstable();
        assert_eq!(seen, vec!["1", "2", "3", "4"]);
    }
}
