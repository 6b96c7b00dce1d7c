use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseEvent};

/// How long the runner waits for input when no clock is scheduled
pub const IDLE_POLL: Duration = Duration::from_millis(250);

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum TapEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
}

/// Source of terminal events (keyboard, mouse, resize)
pub trait TapEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<TapEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<TapEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => Some(TapEvent::Key(key)),
                Ok(CtEvent::Mouse(mouse)) => Some(TapEvent::Mouse(mouse)),
                Ok(CtEvent::Resize(w, h)) => Some(TapEvent::Resize(w, h)),
                Ok(_) => None,
                Err(err) => {
                    log::warn!("terminal event reader stopped: {err}");
                    break;
                }
            };

            if let Some(ev) = forwarded {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TapEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TapEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<TapEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<TapEvent>) -> Self {
        Self { rx }
    }
}

impl TapEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TapEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Identifies one scheduled periodic clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Start/cancel contract for the periodic game clock.
///
/// The scheduler only decides *when* ticks happen; whoever drives the event loop delivers
/// them to the session.
pub trait Scheduler {
    fn schedule(&mut self, interval: Duration) -> TimerHandle;
    /// Cancelling a handle that is no longer active does nothing.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Tells the runner how long to wait for input before yielding a tick
pub trait Ticker: Send + Sync + 'static {
    /// `None` when nothing is scheduled
    fn interval(&self) -> Option<Duration>;
}

/// Shared schedule cell: the session schedules through one clone, the runner reads another
#[derive(Debug, Clone, Default)]
pub struct TickSchedule {
    inner: Arc<ScheduleCell>,
}

#[derive(Debug, Default)]
struct ScheduleCell {
    // 0 means no active timer for both fields
    active: AtomicU64,
    interval_us: AtomicU64,
    next_id: AtomicU64,
}

impl TickSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst) != 0
    }
}

impl Scheduler for TickSchedule {
    fn schedule(&mut self, interval: Duration) -> TimerHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let micros = u64::try_from(interval.as_micros()).unwrap_or(u64::MAX).max(1);
        self.inner.interval_us.store(micros, Ordering::SeqCst);
        self.inner.active.store(id, Ordering::SeqCst);
        TimerHandle(id)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if self
            .inner
            .active
            .compare_exchange(handle.0, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.inner.interval_us.store(0, Ordering::SeqCst);
        }
    }
}

impl Ticker for TickSchedule {
    fn interval(&self) -> Option<Duration> {
        if !self.is_active() {
            return None;
        }
        match self.inner.interval_us.load(Ordering::SeqCst) {
            0 => None,
            us => Some(Duration::from_micros(us)),
        }
    }
}

/// Monotonic time source, measured from an arbitrary fixed origin
pub trait Clock {
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, at: Duration) {
        self.now.set(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// Ticks are deadline based: a steady stream of input (mouse motion, held keys) never delays a tick
/// past its deadline.
pub struct Runner<E: TapEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Cell<Option<Instant>>,
}

impl<E: TapEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            next_tick: Cell::new(None),
        }
    }

    /// Returns the next event, or Tick once the scheduled interval (or `IDLE_POLL`) has run out
    pub fn step(&self) -> TapEvent {
        let interval = self.ticker.interval().unwrap_or(IDLE_POLL);
        let now = Instant::now();
        // a deadline further out than one interval belongs to an older, slower schedule
        let deadline = match self.next_tick.get() {
            Some(deadline) if deadline <= now + interval => deadline,
            _ => now + interval,
        };

        if deadline <= now {
            return self.tick(interval);
        }

        match self.event_source.recv_timeout(deadline - now) {
            Ok(ev) => {
                self.next_tick.set(Some(deadline));
                ev
            }
            Err(RecvTimeoutError::Timeout) => self.tick(interval),
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                self.tick(interval)
            }
        }
    }

    fn tick(&self, interval: Duration) -> TapEvent {
        self.next_tick.set(Some(Instant::now() + interval));
        TapEvent::Tick
    }
}
