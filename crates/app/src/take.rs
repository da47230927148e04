//! Interactive terminal session for one exam.

use exam_core::model::{ExamConfig, OptionLabel, SubmissionCheck, TickOutcome};
use exam_core::scoring::ExamResult;
use exam_core::time::format_countdown;
use services::{AppServices, ExamController, ExamPhase};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

const HELP: &str = concat!(
    "a-d answer | n next | p previous | g <nr> jump | ",
    "s submit | q pause | x abandon | ? help"
);

enum Input {
    Answer(OptionLabel),
    Next,
    Previous,
    GoTo(usize),
    Submit,
    Pause,
    Abandon,
    Help,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if let Ok(label) = line.parse::<OptionLabel>() {
        return Input::Answer(label);
    }
    match line.split_once(' ') {
        Some(("g", nr)) => match nr.trim().parse::<usize>() {
            Ok(nr) if nr > 0 => Input::GoTo(nr - 1),
            _ => Input::Unknown(line.to_owned()),
        },
        _ => match line {
            "n" | "" => Input::Next,
            "p" => Input::Previous,
            "s" => Input::Submit,
            "q" => Input::Pause,
            "x" => Input::Abandon,
            "?" | "h" => Input::Help,
            other => Input::Unknown(other.to_owned()),
        },
    }
}

/// Run `exam` in the terminal until it is finished, paused or abandoned.
pub async fn run(
    services: &AppServices,
    exam: ExamConfig,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshots = services.snapshots();
    let mut ctl = services.controller();

    let saved = snapshots
        .load_snapshot()
        .await?
        .filter(|s| !fresh && s.exam.id() == exam.id());
    match saved {
        Some(snapshot) => {
            ctl.resume(snapshot)?;
            println!("Resuming {}.", exam.title());
        }
        None => {
            println!("Loading {}...", exam.title());
            ctl.start(exam).await?;
        }
    }
    println!("{HELP}");
    render(&ctl);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut confirm_submit = false;

    loop {
        tokio::select! {
            tick = ctl.next_tick() => {
                match ctl.apply_tick(tick) {
                    TickOutcome::LowTime { remaining } => {
                        println!("\n!! Only {} left.", format_countdown(remaining));
                    }
                    TickOutcome::Expired => {
                        println!("\nTime is up. Submitting.");
                        break;
                    }
                    TickOutcome::Running { remaining } if remaining % 60 == 0 => {
                        println!("[{} left]", format_countdown(remaining));
                    }
                    TickOutcome::Running { .. } | TickOutcome::Ignored => {}
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed; pausing exam");
                    pause(&ctl, services).await?;
                    return Ok(());
                };
                let input = parse_input(&line);
                if !matches!(input, Input::Submit) {
                    confirm_submit = false;
                }

                match input {
                    Input::Answer(label) => {
                        ctl.answer_current(label)?;
                        ctl.next()?;
                        if let Err(err) = ctl.save_snapshot(snapshots.as_ref()).await {
                            warn!(error = %err, "could not save progress");
                        }
                    }
                    Input::Next => {
                        ctl.next()?;
                    }
                    Input::Previous => {
                        ctl.previous()?;
                    }
                    Input::GoTo(index) => {
                        ctl.go_to(index)?;
                    }
                    Input::Submit => {
                        let check = ctl.submission_check()?;
                        if let SubmissionCheck::Unanswered { unanswered, total } = check {
                            if !confirm_submit {
                                println!(
                                    "{unanswered} of {total} questions are unanswered. \
                                     Press s again to submit."
                                );
                                confirm_submit = true;
                                continue;
                            }
                        }
                        ctl.submit()?;
                        break;
                    }
                    Input::Pause => {
                        pause(&ctl, services).await?;
                        return Ok(());
                    }
                    Input::Abandon => {
                        ctl.abandon()?;
                        snapshots.clear_snapshot().await?;
                        println!("Exam abandoned. Nothing was recorded.");
                        return Ok(());
                    }
                    Input::Help => println!("{HELP}"),
                    Input::Unknown(raw) => println!("Unknown input {raw:?}. {HELP}"),
                }
                render(&ctl);
            }
        }
    }

    debug_assert_eq!(ctl.phase(), ExamPhase::Submitting);
    let result = ctl.finish()?;
    snapshots.clear_snapshot().await?;
    ctl.flush_report().await;
    print_result(&result);
    Ok(())
}

async fn pause(
    ctl: &ExamController,
    services: &AppServices,
) -> Result<(), Box<dyn std::error::Error>> {
    ctl.save_snapshot(services.snapshots().as_ref()).await?;
    println!("Progress saved. Run the same `take` command to continue.");
    Ok(())
}

fn render(ctl: &ExamController) {
    let (Some(progress), Some(question)) = (ctl.progress(), ctl.current_question()) else {
        return;
    };
    let selected = ctl
        .session()
        .and_then(|s| s.answer_for(question.id()))
        .map(|a| a.selected());

    println!();
    println!(
        "Question {}/{}  ({} answered, {} left)  [{}]",
        progress.current_index + 1,
        progress.total,
        progress.answered,
        format_countdown(progress.remaining_secs),
        question.category(),
    );
    println!("{}", question.prompt());
    for (label, text) in question.options() {
        let marker = if Some(label) == selected { '>' } else { ' ' };
        println!(" {marker} {label}) {text}");
    }
}

fn print_result(result: &ExamResult) {
    println!();
    println!(
        "Score: {}%  ({})  {}",
        result.score,
        result.grade(),
        if result.passed() { "passed" } else { "not passed" }
    );
    println!(
        "Correct {}  Wrong {}  Unanswered {}  of {}",
        result.correct, result.wrong, result.unanswered, result.total
    );
    println!("Time used: {}", format_countdown(result.time_spent));
}
