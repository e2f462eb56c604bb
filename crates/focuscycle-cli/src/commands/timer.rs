use std::io::Write;

use clap::{Subcommand, ValueEnum};
use focuscycle_core::timer::parse_minutes;
use focuscycle_core::{
    CommandNotifier, Config, Database, Event, FocusTimer, IntervalTicker, Notifier, Phase,
    SystemClock, TimerSettings,
};
use tracing::warn;

use crate::terminal::TerminalNotifier;

type CliTimer = FocusTimer<Database, Box<dyn Notifier>, IntervalTicker, SystemClock>;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the countdown; it keeps running between invocations
    Start,
    /// Pause the countdown
    Pause,
    /// Pause and rewind to the start of a focus phase
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Set the focus length in minutes
    Work {
        /// Minutes (invalid input keeps the current value)
        minutes: String,
    },
    /// Set the break length in minutes
    Break {
        /// Minutes (invalid input keeps the current value)
        minutes: String,
    },
    /// Turn phase notifications on or off
    Notify {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Check notification permission and send a test notification
    Permission,
    /// Restore default lengths and notification preference, then reset
    Defaults,
    /// Run the countdown in the foreground until Ctrl-C (which pauses)
    Run {
        /// Print the countdown on stderr every second
        #[arg(long)]
        progress: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

fn notifier(config: &Config) -> Box<dyn Notifier> {
    match config
        .notifications
        .command
        .as_deref()
        .and_then(CommandNotifier::from_command_line)
    {
        Some(command) => Box::new(command),
        None => Box::new(TerminalNotifier),
    }
}

fn open_timer(config: &Config) -> Result<CliTimer, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(FocusTimer::new(
        TimerSettings::from(config),
        db,
        notifier(config),
        IntervalTicker::new(),
        SystemClock,
    ))
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        Config::default()
    });

    // Interval tick sources need a runtime even for one-shot commands.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(execute(config, action))
}

async fn execute(config: Config, action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut timer = open_timer(&config)?;
    // Status only reads; it must not notify, write or resume anything.
    let mut events = if matches!(action, TimerAction::Status) {
        Vec::new()
    } else {
        timer.restore()
    };

    match action {
        TimerAction::Start => events.extend(timer.start()),
        TimerAction::Pause => events.extend(timer.pause()),
        TimerAction::Reset => events.push(timer.reset()),
        TimerAction::Status => events.push(timer.peek()),
        TimerAction::Work { minutes } => {
            events.push(timer.set_duration(Phase::Work, parse_minutes(&minutes)))
        }
        TimerAction::Break { minutes } => {
            events.push(timer.set_duration(Phase::Break, parse_minutes(&minutes)))
        }
        TimerAction::Notify { state } => {
            events.push(timer.set_notify(matches!(state, Toggle::On)))
        }
        TimerAction::Permission => events.push(timer.request_notification_permission()),
        TimerAction::Defaults => {
            events.push(timer.reset_settings_to_defaults());
            events.push(timer.snapshot());
        }
        TimerAction::Run { progress } => {
            for event in &events {
                print_event(event)?;
            }
            return run_foreground(&mut timer, progress).await;
        }
    }

    for event in &events {
        print_event(event)?;
    }
    Ok(())
}

enum Wake {
    Tick,
    Shutdown,
}

/// Drive live ticks until Ctrl-C, then pause.
async fn run_foreground(
    timer: &mut CliTimer,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(event) = timer.start() {
        print_event(&event)?;
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let wake = tokio::select! {
            _ = timer.ticks_mut().fired() => Wake::Tick,
            _ = &mut shutdown => Wake::Shutdown,
        };

        match wake {
            Wake::Tick => {
                if let Some(event) = timer.tick() {
                    if progress {
                        eprintln!();
                    }
                    print_event(&event)?;
                }
                if progress {
                    let state = timer.state();
                    let mut err = std::io::stderr().lock();
                    write!(
                        err,
                        "\r{:<5} {} {:>3}%  cycles: {}",
                        state.phase(),
                        state.clock(),
                        state.percent(),
                        state.completed_cycles()
                    )?;
                    err.flush()?;
                }
            }
            Wake::Shutdown => {
                if progress {
                    eprintln!();
                }
                if let Some(event) = timer.pause() {
                    print_event(&event)?;
                }
                return Ok(());
            }
        }
    }
}
