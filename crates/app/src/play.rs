use std::time::Duration;

use quiz_core::model::{QuizConfig, UserId, UserPreferences};
use quiz_core::time::format_clock;
use services::sessions::LOW_TIME_THRESHOLD_SECS;
use services::{
    Advance, AppServices, QuizRun, QuizSession, RunState, SessionError, SessionEvent,
    SessionLoopService, TurnTicker,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::report;

type Input = Lines<BufReader<Stdin>>;

const TICK_PERIOD: Duration = Duration::from_secs(1);
const OPTION_KEYS: [char; 4] = ['a', 'b', 'c', 'd'];

/// What a line of player input did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Redraw,
    Selected,
    Finished,
    Quit,
    Help,
}

/// Play one quiz from loading to the results screen.
pub async fn run_quiz(
    services: &AppServices,
    config: QuizConfig,
    preferences: UserPreferences,
    owner: &UserId,
    turn_secs: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session_loop = (*services.session_loop()).clone();
    if let Some(secs) = turn_secs {
        session_loop = session_loop.with_turn_duration(secs);
    }
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "Preparing {} questions: {} / {} ({})",
        config.question_count(),
        config.exam(),
        config.subject(),
        config.difficulty()
    );
    let mut run = session_loop.start(config, preferences).await;

    while let RunState::Failed(err) = run.state() {
        println!("Could not load questions: {err}");
        println!("Retry? [y/N]");
        match input.next_line().await? {
            Some(line) if line.trim().eq_ignore_ascii_case("y") => {
                session_loop.retry(&mut run).await?;
            }
            _ => {
                session_loop.cancel(&mut run).await?;
                println!("Quiz cancelled.");
                return Ok(());
            }
        }
    }

    if !play_turns(&session_loop, &mut run, &mut input).await? {
        println!("Quiz cancelled. Nothing was saved.");
        return Ok(());
    }

    let (result, pending) = session_loop.complete(&mut run, owner).await?;
    report::print_result(&result);
    if pending.wait().await.is_none() {
        eprintln!("warning: this result could not be saved to history");
    }
    Ok(())
}

/// Drive the active session until it finishes (`true`) or the player quits (`false`).
async fn play_turns(
    session_loop: &SessionLoopService,
    run: &mut QuizRun,
    input: &mut Input,
) -> Result<bool, Box<dyn std::error::Error>> {
    let Some(session) = run.session() else {
        return Ok(false);
    };
    render(&*session.lock().await);

    let (ticker, mut events) = TurnTicker::spawn(session.clone(), TICK_PERIOD);
    let quit = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(SessionEvent::Ticked { time_remaining }) => {
                    if time_remaining == LOW_TIME_THRESHOLD_SECS || time_remaining == 5 {
                        println!("  ... {} left", format_clock(time_remaining));
                    }
                }
                Some(SessionEvent::Advanced(step)) => {
                    println!("Time's up!");
                    let guard = session.lock().await;
                    announce(step, &guard);
                    render(&guard);
                }
                Some(SessionEvent::Finished(_)) => {
                    println!("Time's up!");
                    break false;
                }
                None => break false,
            },
            line = input.next_line() => {
                let Some(line) = line? else {
                    break true;
                };
                let mut guard = session.lock().await;
                let turn = guard.turn_number();
                let outcome = apply_key(&mut guard, &line);
                if guard.turn_number() != turn {
                    ticker.rearm();
                }
                match outcome {
                    Ok(KeyOutcome::Finished) => break false,
                    Ok(KeyOutcome::Quit) => break true,
                    Ok(KeyOutcome::Help) => print_keys(&guard),
                    Ok(KeyOutcome::Selected) => {
                        if let Some(option) = guard.current_selection() {
                            println!("  selected {}", OPTION_KEYS[usize::from(option)]);
                        }
                    }
                    Ok(KeyOutcome::Redraw) => render(&guard),
                    Err(err) => println!("  {err}"),
                }
            }
        }
    };
    ticker.stop();

    // The clock may have finished the quiz while the quit key was in flight.
    if quit && session.lock().await.is_active() {
        session_loop.cancel(run).await?;
        return Ok(false);
    }
    Ok(true)
}

fn apply_key(session: &mut QuizSession, line: &str) -> Result<KeyOutcome, SessionError> {
    let key = line.trim().to_ascii_lowercase();
    match key.as_str() {
        "q" | "quit" => Ok(KeyOutcome::Quit),
        "n" | "next" | "" => match session.advance()? {
            Advance::Finished => Ok(KeyOutcome::Finished),
            step => {
                announce(step, session);
                Ok(KeyOutcome::Redraw)
            }
        },
        "back" | "<" => {
            session.go_back()?;
            Ok(KeyOutcome::Redraw)
        }
        "?" | "h" | "help" => Ok(KeyOutcome::Help),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => match OPTION_KEYS.iter().zip(0u8..).find(|(k, _)| **k == c) {
                    Some((_, option)) => {
                        session.select_option(option)?;
                        Ok(KeyOutcome::Selected)
                    }
                    None => Ok(KeyOutcome::Help),
                },
                _ => Ok(KeyOutcome::Help),
            }
        }
    }
}

fn announce(step: Advance, session: &QuizSession) {
    if let Advance::NextParty { .. } = step {
        println!("--- pass to {} ---", session.active_party_name());
    }
}

fn render(session: &QuizSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    let progress = session.progress();
    println!();
    println!(
        "[{}/{}] {:>5.1}%  {}  {}{}",
        progress.current_index + 1,
        progress.total,
        progress.percent,
        session.active_party_name(),
        format_clock(progress.time_remaining),
        if progress.low_time { " (hurry!)" } else { "" }
    );
    println!("{}", question.text);
    let selected = session.current_selection();
    for (key, (index, option)) in OPTION_KEYS.iter().zip(question.options.iter().enumerate()) {
        let marker = if selected.is_some_and(|s| usize::from(s) == index) {
            '*'
        } else {
            ' '
        };
        println!(" {marker}{key}) {option}");
    }
    print_keys(session);
}

fn print_keys(session: &QuizSession) {
    let back = if session.can_go_back() { ", back to revisit" } else { "" };
    println!(
        "a-d select, n {}{back}, q quit",
        session.next_action().label().to_lowercase()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{
        Explanation, Question, QuestionId, QuestionSet, QuizConfigDraft, QuizMode,
    };

    fn session(mode: QuizMode) -> QuizSession {
        let questions = (0..5)
            .map(|i| Question {
                id: QuestionId::new(format!("k{i}")),
                text: format!("Question {i}"),
                options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
                correct_index: 1,
                explanation: Explanation::default(),
            })
            .collect();
        let config = QuizConfigDraft::new("SSC CGL", "English Language")
            .with_topics(["Idioms"])
            .with_mode(mode)
            .validate()
            .unwrap();
        QuizSession::new(config, QuestionSet::new(questions).unwrap())
    }

    #[test]
    fn letters_select_options() {
        let mut s = session(QuizMode::Solo);
        assert_eq!(apply_key(&mut s, " C \n").unwrap(), KeyOutcome::Selected);
        assert_eq!(s.current_selection(), Some(2));
        assert_eq!(apply_key(&mut s, "z").unwrap(), KeyOutcome::Help);
    }

    #[test]
    fn next_runs_to_completion() {
        let mut s = session(QuizMode::Solo);
        for _ in 0..4 {
            assert_eq!(apply_key(&mut s, "n").unwrap(), KeyOutcome::Redraw);
        }
        assert_eq!(apply_key(&mut s, "n").unwrap(), KeyOutcome::Finished);
        assert!(!s.is_active());
    }

    #[test]
    fn back_is_refused_in_versus() {
        let mut s = session(QuizMode::Versus);
        assert_eq!(
            apply_key(&mut s, "back").unwrap_err(),
            SessionError::BackNavigationUnavailable
        );
        assert_eq!(apply_key(&mut s, "q").unwrap(), KeyOutcome::Quit);
    }
}
