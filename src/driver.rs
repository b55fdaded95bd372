//! State machine and the fixed-timestep game loop
//!
//! One loop iteration:
//! 1. measure the delta since the previous iteration started
//! 2. update the active state in `FIXED_STEP_MS` slices plus one remainder slice
//! 3. render once with the full delta and present the frame
//! 4. stop if the window asked to close, otherwise sleep out the frame budget

use std::collections::HashMap;

use crate::consts::{FIXED_STEP_MS, FPS_WINDOW_MS};
use crate::error::GameError;
use crate::frame_budget_ms;
use crate::platform::{Clock, Presentation, ResourceLoader};
use crate::settings::DisplaySettings;
use crate::state::{GameState, TickContext};

/// How a frame delta is sliced into updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSteps {
    /// Number of full fixed-size updates
    pub steps: u32,
    /// Leftover milliseconds, run as one final short update when non-zero
    pub remainder: u32,
    step_ms: u32,
}

impl FrameSteps {
    /// Update durations in call order
    pub fn updates(&self) -> impl Iterator<Item = u32> + use<> {
        let step = self.step_ms;
        let remainder = (self.remainder > 0).then_some(self.remainder);
        std::iter::repeat_n(step, self.steps as usize).chain(remainder)
    }
}

/// Split `delta_ms` into `step_ms` slices and a remainder
pub fn split_frame(delta_ms: u32, step_ms: u32) -> FrameSteps {
    let step_ms = step_ms.max(1);
    FrameSteps {
        steps: delta_ms / step_ms,
        remainder: delta_ms % step_ms,
        step_ms,
    }
}

/// Counts frames over windows of accumulated delta
#[derive(Debug, Default, Clone)]
pub struct FpsCounter {
    elapsed_ms: u64,
    frames: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one frame. Returns the frame count once a full window has passed.
    pub fn tick(&mut self, delta_ms: u32) -> Option<u32> {
        self.elapsed_ms += u64::from(delta_ms);
        self.frames += 1;
        if self.elapsed_ms >= u64::from(FPS_WINDOW_MS) {
            let fps = self.frames;
            self.elapsed_ms = 0;
            self.frames = 0;
            return Some(fps);
        }
        None
    }
}

/// Registered states and the active one
#[derive(Default)]
pub struct StateMachine {
    states: HashMap<String, Box<dyn GameState>>,
    /// Registration order, for deterministic init
    order: Vec<String>,
    active: Option<String>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state. The first one registered becomes active.
    pub fn add_state(&mut self, state: Box<dyn GameState>) {
        let name = state.name().to_string();
        if self.states.insert(name.clone(), state).is_some() {
            log::warn!("State '{}' registered twice, keeping the latest", name);
        } else {
            self.order.push(name.clone());
        }
        if self.active.is_none() {
            self.active = Some(name);
        }
    }

    /// Run `init` on every state in registration order
    pub fn init_all(&mut self, loader: &mut dyn ResourceLoader) -> Result<(), GameError> {
        for name in &self.order {
            if let Some(state) = self.states.get_mut(name) {
                state.init(loader)?;
                log::debug!("State '{}' initialized", name);
            }
        }
        Ok(())
    }

    /// Enter the initially active state
    pub fn start(&mut self) -> Result<(), GameError> {
        match self.active_state_mut() {
            Some(state) => {
                log::info!("Starting in state '{}'", state.name());
                state.enter()
            }
            None => {
                log::warn!("No states registered");
                Ok(())
            }
        }
    }

    /// Leave the current state and enter `name`.
    ///
    /// Unknown names are ignored; returns whether a switch happened.
    pub fn change_to_state(&mut self, name: &str) -> Result<bool, GameError> {
        if !self.states.contains_key(name) {
            log::debug!("Ignoring transition to unknown state '{}'", name);
            return Ok(false);
        }

        if let Some(current) = self.active_state_mut() {
            current.leave();
        }
        log::info!(
            "State change: {} -> {}",
            self.active.as_deref().unwrap_or("<none>"),
            name
        );
        self.active = Some(name.to_string());
        if let Some(next) = self.active_state_mut() {
            next.enter()?;
        }
        Ok(true)
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn update(&mut self, ctx: &mut TickContext<'_>, delta_ms: u32) {
        if let Some(state) = self.active_state_mut() {
            state.update(ctx, delta_ms);
        }
    }

    pub fn render(&self, out: &mut dyn Presentation, frame_delta_ms: u32) {
        if let Some(state) = self.active.as_ref().and_then(|name| self.states.get(name)) {
            state.render(out, frame_delta_ms);
        }
    }

    fn active_state_mut(&mut self) -> Option<&mut Box<dyn GameState>> {
        let name = self.active.as_ref()?;
        self.states.get_mut(name)
    }
}

/// Owns the platform, the clock and the states; runs the loop
pub struct GameDriver<P, C> {
    platform: P,
    clock: C,
    display: DisplaySettings,
    machine: StateMachine,
    fps: FpsCounter,
    last_loop: u64,
    frames: u64,
}

impl<P, C> GameDriver<P, C>
where
    P: Presentation + ResourceLoader,
    C: Clock,
{
    pub fn new(platform: P, clock: C, display: DisplaySettings) -> Self {
        Self {
            platform,
            clock,
            display,
            machine: StateMachine::new(),
            fps: FpsCounter::new(),
            last_loop: 0,
            frames: 0,
        }
    }

    pub fn add_state(&mut self, state: Box<dyn GameState>) {
        self.machine.add_state(state);
    }

    /// Open the window and initialize every state. Any failure is fatal.
    pub fn init(&mut self) -> Result<(), GameError> {
        let display = &self.display;
        self.platform
            .create_window(display.width, display.height, &display.title)?;
        log::info!(
            "Window {}x{} '{}'",
            display.width,
            display.height,
            display.title
        );
        self.machine.init_all(&mut self.platform)
    }

    /// Enter the first state and loop until close is requested.
    ///
    /// Returns the number of frames presented.
    pub fn run(&mut self) -> Result<u64, GameError> {
        self.machine.start()?;
        self.last_loop = self.clock.now_millis();
        while self.run_frame()? {}
        log::info!("Close requested after {} frames", self.frames);
        Ok(self.frames)
    }

    /// One loop iteration. Returns `false` once the window should close.
    pub fn run_frame(&mut self) -> Result<bool, GameError> {
        let now = self.clock.now_millis();
        let delta = u32::try_from(now.saturating_sub(self.last_loop)).unwrap_or(u32::MAX);
        self.last_loop = now;

        self.advance(delta)?;
        self.platform.present_frame();
        self.frames += 1;

        if self.platform.is_close_requested() {
            return Ok(false);
        }

        let spent = self.clock.now_millis().saturating_sub(self.last_loop);
        let budget = frame_budget_ms(self.display.target_fps);
        self.clock.sleep_millis(budget.saturating_sub(spent));
        Ok(true)
    }

    /// Update in fixed slices, then render once
    pub fn advance(&mut self, delta_ms: u32) -> Result<(), GameError> {
        if let Some(fps) = self.fps.tick(delta_ms) {
            let title = format!("{} (FPS: {})", self.display.title, fps);
            self.platform.set_title(&title);
        }

        for step in split_frame(delta_ms, FIXED_STEP_MS).updates() {
            self.update_active(step)?;
        }
        self.machine.render(&mut self.platform, delta_ms);
        Ok(())
    }

    fn update_active(&mut self, delta_ms: u32) -> Result<(), GameError> {
        let request = {
            let mut ctx = TickContext::new(&self.platform);
            self.machine.update(&mut ctx, delta_ms);
            ctx.take_request()
        };
        if let Some(name) = request {
            self.machine.change_to_state(&name)?;
        }
        Ok(())
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::platform::{HeadlessPlatform, Key, SimulatedClock};
    use crate::state::{IN_GAME, InGameState, MENU, MenuState};
    use crate::{HighScores, Settings};
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records lifecycle calls; optionally requests one transition
    struct Recorder {
        name: &'static str,
        log: Log,
        request: Option<&'static str>,
    }

    impl Recorder {
        fn boxed(name: &'static str, log: &Log) -> Box<dyn GameState> {
            Box::new(Self {
                name,
                log: Rc::clone(log),
                request: None,
            })
        }

        fn requesting(name: &'static str, log: &Log, target: &'static str) -> Box<dyn GameState> {
            Box::new(Self {
                name,
                log: Rc::clone(log),
                request: Some(target),
            })
        }

        fn note(&self, what: String) {
            self.log.borrow_mut().push(format!("{}:{}", self.name, what));
        }
    }

    impl GameState for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn init(&mut self, _loader: &mut dyn ResourceLoader) -> Result<(), GameError> {
            self.note("init".into());
            Ok(())
        }

        fn enter(&mut self) -> Result<(), GameError> {
            self.note("enter".into());
            Ok(())
        }

        fn leave(&mut self) {
            self.note("leave".into());
        }

        fn update(&mut self, ctx: &mut TickContext<'_>, delta_ms: u32) {
            self.note(format!("update({})", delta_ms));
            if let Some(target) = self.request.take() {
                ctx.request_state(target);
            }
        }

        fn render(&self, out: &mut dyn Presentation, frame_delta_ms: u32) {
            out.clear();
            self.note(format!("render({})", frame_delta_ms));
        }
    }

    fn new_log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.borrow().clone()
    }

    fn headless_driver(platform: HeadlessPlatform) -> GameDriver<HeadlessPlatform, SimulatedClock> {
        GameDriver::new(platform, SimulatedClock::new(), DisplaySettings::default())
    }

    #[test]
    fn test_split_frame_examples() {
        let s = split_frame(27, 10);
        assert_eq!((s.steps, s.remainder), (2, 7));
        assert_eq!(s.updates().collect::<Vec<_>>(), vec![10, 10, 7]);

        let s = split_frame(30, 10);
        assert_eq!((s.steps, s.remainder), (3, 0));
        assert_eq!(s.updates().collect::<Vec<_>>(), vec![10, 10, 10]);

        assert_eq!(split_frame(0, 10).updates().count(), 0);
        assert_eq!(split_frame(5, 10).updates().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_fps_counter_reports_once_per_window() {
        let mut fps = FpsCounter::new();
        let reports: Vec<(usize, u32)> = (0..130)
            .filter_map(|i| fps.tick(16).map(|n| (i, n)))
            .collect();
        // 63 * 16 = 1008 is the first total past one second
        assert_eq!(reports, vec![(62, 63), (125, 63)]);
    }

    #[test]
    fn test_first_state_is_active() {
        let log = new_log();
        let mut machine = StateMachine::new();
        assert_eq!(machine.active_name(), None);
        machine.add_state(Recorder::boxed("a", &log));
        machine.add_state(Recorder::boxed("b", &log));
        assert_eq!(machine.active_name(), Some("a"));
        assert_eq!(machine.len(), 2);
    }

    #[test]
    fn test_unknown_transition_is_noop() {
        let log = new_log();
        let mut machine = StateMachine::new();
        machine.add_state(Recorder::boxed("a", &log));
        machine.start().unwrap();
        log.borrow_mut().clear();

        assert!(!machine.change_to_state("nowhere").unwrap());
        assert_eq!(machine.active_name(), Some("a"));
        assert!(entries(&log).is_empty());
    }

    #[test]
    fn test_transition_leaves_then_enters() {
        let log = new_log();
        let mut machine = StateMachine::new();
        machine.add_state(Recorder::boxed("a", &log));
        machine.add_state(Recorder::boxed("b", &log));
        machine.start().unwrap();
        assert!(machine.change_to_state("b").unwrap());
        assert_eq!(entries(&log), vec!["a:enter", "a:leave", "b:enter"]);
        assert_eq!(machine.active_name(), Some("b"));
    }

    #[test]
    fn test_duplicate_state_name_replaces() {
        let first = new_log();
        let second = new_log();
        let mut machine = StateMachine::new();
        machine.add_state(Recorder::boxed("a", &first));
        machine.add_state(Recorder::boxed("a", &second));
        assert_eq!(machine.len(), 1);
        assert_eq!(machine.active_name(), Some("a"));

        machine.init_all(&mut HeadlessPlatform::new()).unwrap();
        assert!(entries(&first).is_empty());
        assert_eq!(entries(&second), vec!["a:init"]);
    }

    #[test]
    fn test_init_runs_in_registration_order() {
        let log = new_log();
        let mut machine = StateMachine::new();
        for name in ["c", "a", "b"] {
            machine.add_state(Recorder::boxed(name, &log));
        }
        machine.init_all(&mut HeadlessPlatform::new()).unwrap();
        assert_eq!(entries(&log), vec!["c:init", "a:init", "b:init"]);
    }

    #[test]
    fn test_frame_runs_fixed_steps_then_renders() {
        let log = new_log();
        let mut driver = headless_driver(HeadlessPlatform::new());
        driver.add_state(Recorder::boxed("a", &log));
        driver.init().unwrap();
        driver.machine.start().unwrap();
        log.borrow_mut().clear();

        driver.advance(27).unwrap();
        assert_eq!(
            entries(&log),
            vec!["a:update(10)", "a:update(10)", "a:update(7)", "a:render(27)"]
        );
    }

    #[test]
    fn test_requested_transition_applies_after_update() {
        let log = new_log();
        let mut driver = headless_driver(HeadlessPlatform::new());
        driver.add_state(Recorder::requesting("a", &log, "b"));
        driver.add_state(Recorder::boxed("b", &log));
        driver.init().unwrap();
        driver.machine.start().unwrap();
        log.borrow_mut().clear();

        driver.advance(20).unwrap();
        assert_eq!(
            entries(&log),
            vec![
                "a:update(10)",
                "a:leave",
                "b:enter",
                "b:update(10)",
                "b:render(20)"
            ]
        );
    }

    #[test]
    fn test_run_until_close_with_throttle() {
        let log = new_log();
        let mut driver = headless_driver(HeadlessPlatform::new().close_after(3));
        driver.add_state(Recorder::boxed("a", &log));
        driver.init().unwrap();
        assert_eq!(driver.run().unwrap(), 3);

        // First frame has no elapsed time; the throttle then sleeps 16 ms a frame
        let updates: Vec<String> = entries(&log)
            .into_iter()
            .filter(|e| e.contains("update"))
            .collect();
        assert_eq!(
            updates,
            vec!["a:update(10)", "a:update(6)", "a:update(10)", "a:update(6)"]
        );
        assert_eq!(driver.platform().frames_presented(), 3);
    }

    #[test]
    fn test_slow_frames_skip_sleep() {
        let log = new_log();
        let mut driver = GameDriver::new(
            HeadlessPlatform::new().close_after(3),
            SimulatedClock::with_read_cost(25),
            DisplaySettings::default(),
        );
        driver.add_state(Recorder::boxed("a", &log));
        driver.init().unwrap();
        driver.run().unwrap();

        let renders: Vec<String> = entries(&log)
            .into_iter()
            .filter(|e| e.contains("render"))
            .collect();
        // Each frame reads the clock twice: 25 ms of work per read, no sleep
        assert_eq!(renders, vec!["a:render(25)", "a:render(50)", "a:render(50)"]);
    }

    #[test]
    fn test_title_shows_fps_after_a_second() {
        let log = new_log();
        let mut driver = headless_driver(HeadlessPlatform::new().close_after(70));
        driver.add_state(Recorder::boxed("a", &log));
        driver.init().unwrap();
        assert_eq!(driver.platform().title(), WINDOW_TITLE);
        driver.run().unwrap();
        assert_eq!(driver.platform().title(), format!("{} (FPS: 64)", WINDOW_TITLE));
    }

    #[test]
    fn test_init_errors_are_fatal() {
        let mut display = DisplaySettings::default();
        display.width = 0;
        let mut driver = GameDriver::new(HeadlessPlatform::new(), SimulatedClock::new(), display);
        assert!(matches!(
            driver.init(),
            Err(GameError::DisplayUnavailable { .. })
        ));

        let settings = Settings::default();
        let scores = Rc::new(RefCell::new(HighScores::new()));
        let mut driver = headless_driver(HeadlessPlatform::new().with_missing_resource(TEX_BALL));
        driver.add_state(Box::new(InGameState::new(&settings, scores)));
        assert!(matches!(
            driver.init(),
            Err(GameError::ResourceLoad { path, .. }) if path == TEX_BALL
        ));
    }

    #[test]
    fn test_menu_starts_game() {
        let settings = Settings::default();
        let scores = Rc::new(RefCell::new(HighScores::new()));
        let mut driver = headless_driver(HeadlessPlatform::new());
        driver.add_state(Box::new(MenuState::new(&settings.display, Rc::clone(&scores))));
        driver.add_state(Box::new(InGameState::new(&settings, scores)));
        driver.init().unwrap();
        driver.machine.start().unwrap();
        assert_eq!(driver.machine().active_name(), Some(MENU));

        driver.platform_mut().press(Key::Enter);
        driver.advance(16).unwrap();
        assert_eq!(driver.machine().active_name(), Some(IN_GAME));
    }

    #[test]
    fn test_autopilot_soak() {
        let settings = Settings::default();
        let scores = Rc::new(RefCell::new(HighScores::new()));
        let platform = HeadlessPlatform::new().with_autopilot(7).close_after(3000);
        let mut driver = headless_driver(platform);
        driver.add_state(Box::new(MenuState::new(&settings.display, Rc::clone(&scores))));
        driver.add_state(Box::new(InGameState::new(&settings, scores)));
        driver.init().unwrap();
        assert_eq!(driver.run().unwrap(), 3000);
        assert!(driver.platform().draws_last_frame() >= 1);
    }

    proptest! {
        #[test]
        fn prop_split_sums_to_delta(delta in 0u32..100_000, step in 1u32..50) {
            let s = split_frame(delta, step);
            prop_assert!(s.remainder < step);
            prop_assert_eq!(s.steps * step + s.remainder, delta);
            prop_assert_eq!(s.updates().sum::<u32>(), delta);
            prop_assert!(s.updates().all(|u| u > 0 && u <= step));
        }
    }
}
