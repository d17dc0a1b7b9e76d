//! App: terminal init, main loop, tick and key handling.

use crate::GameConfig;
use crate::game::GameState;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, Hud, PopAnimation};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Ticks run back to back after a stall before the clock is resynced.
const MAX_CATCH_UP_TICKS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    paused: bool,
    /// Best score this session.
    best: u32,
    last_tick: Instant,
    pop: PopAnimation,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let state = GameState::new(&config);
        Self {
            config,
            theme,
            state,
            paused: false,
            best: 0,
            last_tick: Instant::now(),
            pop: PopAnimation::default(),
        }
    }

    fn reset_game(&mut self) {
        debug!(best = self.best, "restarting");
        self.state = GameState::new(&self.config);
        self.paused = false;
        self.last_tick = Instant::now();
        self.pop = PopAnimation::default();
    }

    fn handle_action(&mut self, action: Action) -> Flow {
        match action {
            Action::Quit => return Flow::Quit,
            Action::Pause if !self.state.is_game_over() => {
                self.paused = !self.paused;
                debug!(paused = self.paused, "pause toggled");
            }
            Action::Restart if self.state.is_game_over() => self.reset_game(),
            // Keys are dropped while paused, not queued for later.
            Action::Game(command) if !self.paused => self.state.push_command(command),
            _ => {}
        }
        Flow::Continue
    }

    /// One simulation tick, then hand any popped blobs to the animation.
    fn step(&mut self) {
        if self.paused || self.state.is_game_over() {
            return;
        }
        self.state.tick();
        let popped = self.state.take_popped();
        if !popped.is_empty() && !self.config.no_animation {
            self.pop.start(popped);
        }
        self.best = self.best.max(self.state.score());
        if self.state.is_game_over() {
            info!(score = self.state.score(), best = self.best, "session score");
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Lets us tell key releases apart where the terminal supports it.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let tick_interval = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let frame_interval = Duration::from_secs_f64(1.0 / self.config.frame_rate);
        self.last_tick = Instant::now();

        loop {
            let now = Instant::now();
            let snapshot = self.state.snapshot();
            let next: Vec<_> = self.state.next_pairs().copied().collect();
            let hud = Hud {
                theme: &self.theme,
                next: &next,
                best: self.best,
                paused: self.paused,
            };
            let animate = !self.config.no_animation;
            terminal.draw(|f| ui::draw(f, &snapshot, &hud, &mut self.pop, animate, now))?;
            self.pop.finish_if_done();

            let timeout = frame_interval.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    // Held keys arrive as Repeat on terminals that report event types.
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    if self.handle_action(key_to_action(key)) == Flow::Quit {
                        return Ok(());
                    }
                }
            }

            let mut ran = 0;
            while self.last_tick.elapsed() >= tick_interval {
                if ran == MAX_CATCH_UP_TICKS {
                    self.last_tick = Instant::now();
                    break;
                }
                self.last_tick += tick_interval;
                self.step();
                ran += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    fn app() -> App {
        let config = GameConfig {
            tick_rate: 60.0,
            frame_rate: 30.0,
            fall_delay: 2,
            seed: Some(11),
            no_animation: false,
        };
        App::new(config, Theme::default())
    }

    fn run_until_game_over(app: &mut App) {
        for _ in 0..20_000 {
            app.step();
            if app.state.is_game_over() {
                return;
            }
        }
        panic!("stack never overflowed");
    }

    #[test]
    fn pause_freezes_the_simulation_and_drops_keys() {
        let mut app = app();
        app.step();
        assert_eq!(app.handle_action(Action::Pause), Flow::Continue);
        let before = app.state.snapshot();
        app.handle_action(Action::Game(Command::MoveLeft));
        for _ in 0..10 {
            app.step();
        }
        assert_eq!(app.state.snapshot(), before);

        app.handle_action(Action::Pause);
        app.step();
        // The left press was not kept while paused.
        assert_eq!(app.state.snapshot().pieces[0].col, crate::falling::SPAWN_COLUMN);
    }

    #[test]
    fn restart_only_after_game_over() {
        let mut app = app();
        app.step();
        app.handle_action(Action::Restart);
        assert!(app.state.has_active_pair());

        run_until_game_over(&mut app);
        // Pause is ignored once the game is over.
        app.handle_action(Action::Pause);
        assert!(!app.paused);

        let best = app.best;
        app.handle_action(Action::Restart);
        assert!(!app.state.is_game_over());
        assert_eq!(app.state.score(), 0);
        assert_eq!(app.best, best);
    }

    #[test]
    fn quit_ends_the_loop() {
        let mut app = app();
        assert_eq!(app.handle_action(Action::Quit), Flow::Quit);
        assert_eq!(app.handle_action(Action::None), Flow::Continue);
    }

    #[test]
    fn popped_blobs_start_the_animation() {
        use crate::piece::PieceColor::Red;
        let mut app = app();
        app.state.preset_next(&[(Red, Red), (Red, Red)]);
        for _ in 0..2_000 {
            app.step();
            if app.state.score() > 0 {
                break;
            }
            if app.state.has_active_pair() {
                app.handle_action(Action::Game(Command::MoveLeft));
            }
        }
        assert!(app.state.score() > 0);
        assert!(app.pop.is_active());
        assert_eq!(app.best, app.state.score());
    }
}
