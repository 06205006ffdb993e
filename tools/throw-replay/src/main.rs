//! throw-replay: headless replay of drag/throw gestures through the card engine.
//!
//! Usage:
//!   throw-replay replay --script gesture.json --output report.json --frames
//!   throw-replay layout --width 1400 --height 800 --count 13

use std::cell::RefCell;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use cardflight_core::config::EngineConfig;
use cardflight_core::constants::REFERENCE_FRAME_RATE;
use cardflight_core::state::FrameSnapshot;
use cardflight_core::types::{CardId, ContainerFrame, InputSample, VisualHandle};
use cardflight_core::DVec2;
use cardflight_layout::{compute_layout, LayoutResult};
use cardflight_sim::{CardPhysicsEngine, LayoutContext, RecordingSink, ReleaseOutcome};

/// Upper bound on simulated time after the last step.
const MAX_SETTLE_SECS: f64 = 30.0;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "replay" => cmd_replay(&args[2..]),
        "layout" => cmd_layout(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        "throw-replay: card drag/throw replay tool\n\
         \n\
         Commands:\n\
         \n\
         replay    Run a JSON gesture script through the engine\n\
         \n\
           --script <path>    Gesture script (JSON)\n\
           --output <path>    Report file (optional, default: stdout)\n\
           --frames           Include every frame snapshot in the report\n\
         \n\
         layout    Print the hand layout for a viewport\n\
         \n\
           --width <px>       Viewport width\n\
           --height <px>      Viewport height\n\
           --count <N>        Cards in the hand\n\
         \n\
         Examples:\n\
         \n\
           throw-replay replay --script flick.json --frames\n\
           throw-replay layout --width 1400 --height 800 --count 13\n"
    );
}

fn parse_value(args: &[String], flag: &str) -> Option<String> {
    for i in 0..args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

fn parse_number<T: std::str::FromStr>(args: &[String], flag: &str) -> T {
    match parse_value(args, flag).map(|v| v.parse::<T>()) {
        Some(Ok(n)) => n,
        _ => {
            eprintln!("Error: {flag} <number> is required");
            process::exit(1);
        }
    }
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

// --- Script format ---

#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default)]
    config: EngineConfig,
    #[serde(default = "default_frame_rate")]
    frame_rate: f64,
    /// Hand the grabbed cards come from. Without it, cards return to their grab center.
    #[serde(default)]
    hand: Option<HandSetup>,
    steps: Vec<Step>,
}

fn default_frame_rate() -> f64 {
    REFERENCE_FRAME_RATE
}

#[derive(Debug, Deserialize)]
struct HandSetup {
    card_count: usize,
    #[serde(default)]
    container: ContainerFrame,
}

/// One scripted action. Drags and waits advance the clock; the rest happen
/// at the current time.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Grab {
        card: CardId,
        at: DVec2,
        visual: u64,
        center: DVec2,
        #[serde(default)]
        slot: Option<usize>,
    },
    Drag {
        card: CardId,
        at: DVec2,
    },
    Release {
        card: CardId,
        #[serde(default)]
        target: Option<DVec2>,
    },
    Wait {
        secs: f64,
    },
    Cleanup {
        card: CardId,
    },
    CancelAll,
    EmergencyReturn,
}

// --- Report format ---

#[derive(Debug, Serialize)]
struct Report {
    releases: Vec<ReleaseRecord>,
    completions: Vec<CompletionRecord>,
    released_visuals: Vec<u64>,
    end_time: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    frames: Vec<FrameSnapshot>,
}

#[derive(Debug, Serialize)]
struct ReleaseRecord {
    card: CardId,
    time: f64,
    outcome: String,
}

#[derive(Debug, Clone, Serialize)]
struct CompletionRecord {
    card: CardId,
    success: bool,
}

// --- Replay command ---

struct Replay {
    engine: CardPhysicsEngine,
    sink: RecordingSink,
    layout: Option<(LayoutResult, ContainerFrame)>,
    now: f64,
    frame_dt: f64,
    keep_frames: bool,
    frames: Vec<FrameSnapshot>,
    releases: Vec<ReleaseRecord>,
    completions: Rc<RefCell<Vec<CompletionRecord>>>,
}

impl Replay {
    fn tick(&mut self) {
        self.now += self.frame_dt;
        let snapshot = self.engine.tick(self.now);
        if self.keep_frames {
            self.frames.push(snapshot);
        }
    }

    fn run_step(&mut self, step: Step) -> Result<(), String> {
        match step {
            Step::Grab {
                card,
                at,
                visual,
                center,
                slot,
            } => {
                let context = match (&self.layout, slot) {
                    (Some((layout, container)), Some(slot)) => Some(LayoutContext {
                        layout,
                        slot,
                        container: *container,
                    }),
                    _ => None,
                };
                self.engine
                    .grab(
                        card.clone(),
                        InputSample::new(at.x, at.y, self.now),
                        VisualHandle(visual),
                        center,
                        context.as_ref(),
                    )
                    .map_err(|e| format!("grab {card}: {e}"))
            }
            Step::Drag { card, at } => {
                self.now += self.frame_dt;
                self.engine
                    .drag(&card, InputSample::new(at.x, at.y, self.now))
                    .map_err(|e| format!("drag {card}: {e}"))?;
                let snapshot = self.engine.tick(self.now);
                if self.keep_frames {
                    self.frames.push(snapshot);
                }
                Ok(())
            }
            Step::Release { card, target } => {
                let completions = Rc::clone(&self.completions);
                let done_card = card.clone();
                let outcome = self.engine.release(&card, target, move |success| {
                    completions.borrow_mut().push(CompletionRecord {
                        card: done_card,
                        success,
                    });
                });
                let outcome = match outcome {
                    ReleaseOutcome::Thrown(flight) => format!("thrown ({:?})", flight.speed_class),
                    ReleaseOutcome::Rejected(reason) => format!("rejected: {reason}"),
                    ReleaseOutcome::NotTracked => "not tracked".to_string(),
                    ReleaseOutcome::NotDragging => "not dragging".to_string(),
                };
                eprintln!("{:>8.3}s release {card}: {outcome}", self.now);
                self.releases.push(ReleaseRecord {
                    card,
                    time: self.now,
                    outcome,
                });
                Ok(())
            }
            Step::Wait { secs } => {
                if !secs.is_finite() || secs < 0.0 {
                    return Err(format!("wait: invalid duration {secs}"));
                }
                let until = self.now + secs;
                while self.now < until {
                    self.tick();
                }
                Ok(())
            }
            Step::Cleanup { card } => {
                self.engine.cleanup(&card);
                Ok(())
            }
            Step::CancelAll => {
                self.engine.cancel_all();
                Ok(())
            }
            Step::EmergencyReturn => {
                let count = self.engine.emergency_return_all();
                eprintln!("{:>8.3}s emergency return: {count} card(s)", self.now);
                Ok(())
            }
        }
    }

    fn settle(&mut self) {
        let deadline = self.now + MAX_SETTLE_SECS;
        while self.engine.active_count() > 0 && self.now < deadline {
            self.tick();
        }
        if self.engine.active_count() > 0 {
            eprintln!(
                "Warning: {} card(s) still active after {MAX_SETTLE_SECS}s",
                self.engine.active_count()
            );
        }
    }

    fn into_report(self) -> Report {
        let completions = self.completions.borrow().clone();
        Report {
            releases: self.releases,
            completions,
            released_visuals: self.sink.released().into_iter().map(|v| v.0).collect(),
            end_time: self.now,
            frames: self.frames,
        }
    }
}

fn cmd_replay(args: &[String]) {
    let script_path = match parse_value(args, "--script") {
        Some(p) => PathBuf::from(p),
        None => {
            eprintln!("Error: --script <path> is required");
            process::exit(1);
        }
    };
    let output = parse_value(args, "--output").map(PathBuf::from);

    let text = match std::fs::read_to_string(&script_path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error reading {}: {e}", script_path.display());
            process::exit(1);
        }
    };
    let script: Script = match serde_json::from_str(&text) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error parsing script: {e}");
            process::exit(1);
        }
    };
    if !script.frame_rate.is_finite() || script.frame_rate <= 0.0 {
        eprintln!("Error: frame_rate must be positive");
        process::exit(1);
    }

    let sink = RecordingSink::new();
    let engine = match CardPhysicsEngine::new(script.config.clone(), sink.clone()) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    let layout = script.hand.as_ref().map(|hand| {
        let viewport = script.config.viewport;
        (
            compute_layout(viewport.width, viewport.height, hand.card_count),
            hand.container,
        )
    });

    let mut replay = Replay {
        engine,
        sink,
        layout,
        now: 0.0,
        frame_dt: 1.0 / script.frame_rate,
        keep_frames: has_flag(args, "--frames"),
        frames: Vec::new(),
        releases: Vec::new(),
        completions: Rc::new(RefCell::new(Vec::new())),
    };

    eprintln!(
        "Replaying {} step(s) at {} fps...",
        script.steps.len(),
        script.frame_rate
    );
    for (i, step) in script.steps.into_iter().enumerate() {
        if let Err(e) = replay.run_step(step) {
            eprintln!("Error at step {i}: {e}");
            process::exit(1);
        }
    }
    replay.settle();

    let report = replay.into_report();
    eprintln!(
        "Done: {} release(s), {} completion(s), {:.3}s simulated",
        report.releases.len(),
        report.completions.len(),
        report.end_time
    );
    write_json(&report, output);
}

// --- Layout command ---

fn cmd_layout(args: &[String]) {
    let width: f64 = parse_number(args, "--width");
    let height: f64 = parse_number(args, "--height");
    let count: usize = parse_number(args, "--count");

    let layout = compute_layout(width, height, count);
    eprintln!(
        "{count} card(s) of {:.1}×{:.1}: {:?}",
        layout.card_width, layout.card_height, layout.mode
    );
    write_json(&layout, None);
}

fn write_json<T: Serialize>(value: &T, output: Option<PathBuf>) {
    let json = match serde_json::to_string_pretty(value) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error serializing report: {e}");
            process::exit(1);
        }
    };
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, json) {
                eprintln!("Error writing {}: {e}", path.display());
                process::exit(1);
            }
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
}
