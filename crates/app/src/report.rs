use quiz_core::model::{AccuracyBand, Outcome, PlayerResult, QuizResult, UserId};
use quiz_core::time::format_clock;
use services::DashboardSnapshot;

const BAR_WIDTH: usize = 20;

pub fn print_result(result: &QuizResult) {
    println!();
    println!("=== Results ===");
    match result.outcome() {
        Outcome::Solo => {}
        Outcome::Winner(party) => {
            if let Some(winner) = result.player(party) {
                println!("{} wins!", winner.name);
            }
        }
        Outcome::Tie => println!("It's a tie!"),
    }
    print_player(&result.party_one, result.total_questions);
    if let Some(two) = &result.party_two {
        print_player(two, result.total_questions);
        print_head_to_head(result);
    }

    for &party in result.mode.parties() {
        let Some(player) = result.player(party) else {
            continue;
        };
        println!();
        println!("--- Review: {} ---", player.name);
        for (n, item) in result.review_items(party).iter().enumerate() {
            let verdict = if item.is_correct { "correct" } else { "wrong" };
            println!("{}. {} [{verdict}]", n + 1, item.question.text);
            println!(
                "   your answer: {}",
                item.selected_text.unwrap_or("(skipped)")
            );
            if !item.is_correct {
                println!("   answer: {}", item.correct_text.unwrap_or("?"));
            }
            let explanation = &item.question.explanation;
            if !explanation.concept.is_empty() {
                println!("   concept: {}", explanation.concept);
            }
            for step in &explanation.steps {
                println!("     - {step}");
            }
            for trick in &explanation.tricks {
                println!("   trick: {trick}");
            }
            if let Some(aid) = &explanation.visual_aid {
                println!("   {aid}");
            }
        }
    }
}

fn print_player(player: &PlayerResult, total: u32) {
    println!(
        "{:<16} {:>3}/{:<3} {:>5.1}%  {}  skipped {}",
        player.name,
        player.score,
        total,
        player.accuracy,
        format_clock(player.time_taken),
        player.skipped()
    );
}

fn print_head_to_head(result: &QuizResult) {
    let mark = |correct: bool| if correct { "+" } else { "-" };
    println!();
    let two = result.party_two.as_ref().map_or("", |p| p.name.as_str());
    println!("Q    {}  {two}", result.party_one.name);
    for row in result.head_to_head() {
        println!(
            "{:<4} {}  {}",
            row.index + 1,
            mark(row.party_one_correct),
            mark(row.party_two_correct)
        );
    }
}

pub fn print_dashboard(owner: &UserId, snapshot: &DashboardSnapshot) {
    let stats = &snapshot.stats;
    println!("Dashboard for {owner}");
    println!(
        "streak {} day(s)  quizzes {}  avg accuracy {:.1}%  xp {}  level {}",
        snapshot.streak, stats.total_quizzes, stats.avg_accuracy, stats.xp, stats.level
    );

    println!();
    println!("Last 7 days");
    for day in &snapshot.weekly {
        println!(
            "{} {:<width$} {:>5.1}% ({})",
            day.label,
            bar(day.avg_accuracy),
            day.avg_accuracy,
            day.quizzes,
            width = BAR_WIDTH
        );
    }

    println!();
    if snapshot.recent.is_empty() {
        println!("No quizzes yet.");
        return;
    }
    println!("Recent activity");
    for record in &snapshot.recent {
        let band = match record.band() {
            AccuracyBand::Strong => "strong",
            AccuracyBand::Fair => "fair",
            AccuracyBand::Weak => "weak",
        };
        println!(
            "{}  {:<18} {:<24} {:>3}/{:<3} {:>5.1}% {band}",
            record.recorded_at.format("%Y-%m-%d %H:%M"),
            record.exam,
            record.subject,
            record.score,
            record.total_questions,
            record.accuracy
        );
    }
}

fn bar(accuracy: f64) -> String {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    let filled = ((accuracy.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled.min(BAR_WIDTH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_scale_with_accuracy() {
        assert_eq!(bar(0.0), "");
        assert_eq!(bar(50.0).len(), BAR_WIDTH / 2);
        assert_eq!(bar(100.0).len(), BAR_WIDTH);
        assert_eq!(bar(140.0).len(), BAR_WIDTH);
    }
}
