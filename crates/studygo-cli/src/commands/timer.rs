use std::io::{BufRead, Write};
use std::time::Duration;

use clap::Subcommand;
use serde_json::json;
use studygo_core::timer::{format_clock, format_zen_clock, IntervalScheduler, TimerState};
use studygo_core::{
    open_store, Config, Event, FocusController, SessionRequest, StudyStore, SystemClock,
};
use tokio::sync::mpsc;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a focus session in the foreground.
    ///
    /// Type p (pause), r (resume), f (finish early), c (cancel) or s (status)
    /// followed by Enter while it runs.
    Run {
        /// Subject id
        #[arg(long)]
        subject: String,
        /// Topic id under the subject
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        hours: Option<u32>,
        #[arg(long)]
        minutes: Option<u32>,
        /// Distraction-free display
        #[arg(long)]
        zen: bool,
    },
    /// Print the default duration and quick-pick presets
    Presets,
}

pub async fn run(action: TimerAction, config: &Config) -> CmdResult {
    match action {
        TimerAction::Run { subject, topic, hours, minutes, zen } => {
            // Either flag alone means "exactly this"; neither means the defaults.
            let (hours, minutes) = match (hours, minutes) {
                (None, None) => (config.timer.default_hours, config.timer.default_minutes),
                (h, m) => (h.unwrap_or(0), m.unwrap_or(0)),
            };
            let mut request = SessionRequest::new(subject, hours, minutes).with_zen_mode(zen);
            if let Some(topic) = topic {
                request = request.with_topic(topic);
            }
            run_session(request, config).await
        }
        TimerAction::Presets => print_json(&json!({
            "default_hours": config.timer.default_hours,
            "default_minutes": config.timer.default_minutes,
            "presets": config.timer.presets,
        })),
    }
}

/// The subject (and topic, if any) must exist in the catalog.
fn check_selection(store: &dyn StudyStore, request: &SessionRequest) -> CmdResult {
    if request.subject_id.trim().is_empty() {
        return Ok(());
    }
    let subjects = store.fetch_subjects()?;
    let subject = subjects
        .iter()
        .find(|s| s.id == request.subject_id)
        .ok_or_else(|| format!("unknown subject: {}", request.subject_id))?;
    if let Some(topic_id) = request.topic_id.as_deref().filter(|t| !t.is_empty()) {
        if subject.topic(topic_id).is_none() {
            return Err(format!("unknown topic {topic_id} under subject {}", subject.id).into());
        }
    }
    Ok(())
}

fn print_event(event: &Event, zen: bool) {
    if let Event::TimerTick { remaining_secs, .. } = event {
        let display = if zen {
            format_zen_clock(*remaining_secs)
        } else {
            format_clock(*remaining_secs)
        };
        eprint!("\r{display} ");
        let _ = std::io::stderr().flush();
    }
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "event could not be serialized"),
    }
}

/// Stdin lines from a plain thread, so a pending read never holds up
/// runtime shutdown.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn run_session(request: SessionRequest, config: &Config) -> CmdResult {
    let store = open_store(config)?;
    check_selection(store.as_ref(), &request)?;

    let (scheduler, mut ticks) = IntervalScheduler::new();
    let period = Duration::from_millis(config.timer.tick_interval_ms.max(1));
    let mut ctl = FocusController::new(store, scheduler, SystemClock).with_tick_period(period);
    let zen = request.zen_mode;
    ctl.subscribe(move |event| print_event(event, zen));

    ctl.configure(&request)?;

    let mut input = stdin_lines();
    let mut stdin_open = true;
    while ctl.is_locked() {
        tokio::select! {
            Some(handle) = ticks.recv() => {
                ctl.handle_tick(handle);
            }
            line = input.recv(), if stdin_open => match line {
                Some(line) => apply_intent(&mut ctl, line.trim())?,
                None => {
                    stdin_open = false;
                    // Nothing can resume a paused session once input is gone.
                    if ctl.timer().state() == TimerState::Paused {
                        tracing::info!("stdin closed while paused; finishing early");
                        ctl.finish_early();
                    }
                }
            },
            else => break,
        }
    }
    eprintln!();

    if !ctl.pending_sessions().is_empty() && ctl.retry_pending() == 0 {
        print_json(ctl.pending_sessions())?;
        return Err("session could not be saved; printed above for manual recovery".into());
    }
    Ok(())
}

fn apply_intent<S, K, C>(ctl: &mut FocusController<S, K, C>, intent: &str) -> CmdResult
where
    S: StudyStore,
    K: studygo_core::timer::TickScheduler,
    C: studygo_core::Clock,
{
    match intent {
        "p" | "pause" => {
            ctl.pause();
        }
        "r" | "resume" => {
            ctl.resume();
        }
        "f" | "finish" => {
            ctl.finish_early();
        }
        "c" | "cancel" => {
            ctl.cancel();
        }
        "s" | "status" => print_json(&ctl.timer().snapshot())?,
        "" => {}
        other => eprintln!("unknown command '{other}' (p, r, f, c, s)"),
    }
    Ok(())
}
