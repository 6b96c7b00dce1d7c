use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{KeyModifiers, MouseEvent, MouseEventKind};

use taphappy::geometry::{Point, Size};
use taphappy::placement::RandomSource;
use taphappy::runtime::{
    ManualClock, Runner, SystemClock, TapEvent, TestEventSource, TickSchedule, Ticker,
};
use taphappy::session::{GameSession, Phase, SessionSettings, HITS_TO_FINISH};

/// Cycles through a fixed list of draws
struct Cycle {
    draws: Vec<u32>,
    next: usize,
}

impl Cycle {
    fn new(draws: &[u32]) -> Self {
        Self {
            draws: draws.to_vec(),
            next: 0,
        }
    }
}

impl RandomSource for Cycle {
    fn next_in_range(&mut self, upper: u32) -> u32 {
        let v = self.draws[self.next % self.draws.len()];
        self.next += 1;
        v % upper.max(1)
    }
}

fn inside_target(session: &GameSession<TickSchedule, Cycle, ManualClock>) -> Point {
    let origin = session.target().expect("target placed");
    Point::new(origin.x as f64 + 1.5, origin.y as f64 + 1.5)
}

// Headless round driven through Runner/TestEventSource without a TTY.
// Ticks advance a manual clock by 10ms each; taps happen every few ticks.
#[test]
fn headless_round_finishes_and_records_time() {
    let schedule = TickSchedule::new();
    let clock = ManualClock::new();
    let mut session = GameSession::new(
        schedule.clone(),
        Cycle::new(&[3, 40, 17, 9, 77, 21, 50, 2]),
        clock.clone(),
        Size::new(80, 23),
        SessionSettings::default(),
    );

    let (_tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx), schedule.clone());

    session.request_start();
    assert_eq!(schedule.interval(), Some(Duration::from_millis(10)));

    let mut ticks = 0u32;
    for _ in 0..1_000u32 {
        if let TapEvent::Tick = runner.step() {
            clock.advance(Duration::from_millis(10));
            session.on_clock_tick();
            ticks += 1;
        }
        if ticks % 5 == 0 {
            let p = inside_target(&session);
            session.tap(p);
        }
        if session.phase() == Phase::Finished {
            break;
        }
    }

    assert_eq!(session.phase(), Phase::Finished);
    assert_eq!(session.tap_hits(), HITS_TO_FINISH);
    assert_eq!(schedule.interval(), None, "clock cancelled on finish");
    // tenth hit lands on tick 50 -> 0.50s
    assert_eq!(session.elapsed_text(), "00:00:50");
    assert_eq!(session.best_label(), Some("00:00:50"));
    assert_eq!(session.best_score(), Some(50));
    assert!(session.view().new_record);
}

#[test]
fn headless_slower_round_keeps_record() {
    let schedule = TickSchedule::new();
    let clock = ManualClock::new();
    let mut session = GameSession::new(
        schedule,
        Cycle::new(&[5, 5]),
        clock.clone(),
        Size::new(40, 12),
        SessionSettings::default(),
    );

    for round_ms in [2_000u64, 3_500, 1_250] {
        session.request_start();
        for _ in 0..HITS_TO_FINISH {
            clock.advance(Duration::from_millis(round_ms / HITS_TO_FINISH as u64));
            session.on_clock_tick();
            let p = inside_target(&session);
            session.tap(p);
        }
        assert_eq!(session.phase(), Phase::Finished);
    }

    assert_eq!(session.best_label(), Some("00:01:25"));
    assert_eq!(session.best_score(), Some(125));
}

#[test]
fn headless_resize_between_rounds_keeps_target_inside() {
    let schedule = TickSchedule::new();
    let mut session = GameSession::new(
        schedule,
        Cycle::new(&[79, 22]),
        ManualClock::new(),
        Size::new(80, 23),
        SessionSettings::default(),
    );

    session.request_start();
    let first = session.target().unwrap();
    assert_eq!((first.x, first.y), (74, 20));

    session.on_viewport_change(Size::new(30, 10));
    let clamped = session.target().unwrap();
    assert_eq!((clamped.x, clamped.y), (24, 7));

    session.request_stop();
    session.request_start();
    let next = session.target().unwrap();
    assert!(next.x <= 24 && next.y <= 7);
}

// Mouse motion arrives far more often than the 10ms clock; the stopwatch must keep running.
#[test]
fn headless_clock_keeps_ticking_under_mouse_motion() {
    let schedule = TickSchedule::new();
    let mut session = GameSession::new(
        schedule.clone(),
        Cycle::new(&[10, 10]),
        SystemClock::new(),
        Size::new(80, 23),
        SessionSettings::default(),
    );

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx), schedule);

    let producer = thread::spawn(move || {
        let started = Instant::now();
        while started.elapsed() < Duration::from_millis(300) {
            let moved = TapEvent::Mouse(MouseEvent {
                kind: MouseEventKind::Moved,
                column: 5,
                row: 5,
                modifiers: KeyModifiers::NONE,
            });
            if tx.send(moved).is_err() {
                break;
            }
            thread::sleep(Duration::from_millis(3));
        }
    });

    session.request_start();
    let started = Instant::now();
    let mut ticks = 0u32;
    let mut motions = 0u32;
    while started.elapsed() < Duration::from_millis(300) {
        match runner.step() {
            TapEvent::Tick => {
                session.on_clock_tick();
                ticks += 1;
            }
            TapEvent::Mouse(_) => motions += 1,
            _ => {}
        }
    }
    producer.join().unwrap();

    assert!(motions > 0, "motion events were delivered");
    assert!(ticks >= 5, "only {ticks} ticks in 300ms of motion");
    assert_ne!(session.elapsed_text(), "00:00:00");
    assert!(session.elapsed_centiseconds() >= 10);
}
