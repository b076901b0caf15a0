// Colored terminal output for tokenization results, comparisons and topics.
//
// The main.rs command handlers delegate all formatting here.

use colored::Colorize;

use super::truncate_chars;
use crate::topics::comparator::Comparison;

/// Widest paragraph excerpt shown next to its stems.
const EXCERPT_CHARS: usize = 60;

/// Display each paragraph with the stems it produced.
pub fn display_tokenized(paragraphs: &[(String, Vec<String>)]) {
    if paragraphs.is_empty() {
        println!("No text to tokenize.");
        return;
    }

    for (i, (paragraph, stems)) in paragraphs.iter().enumerate() {
        println!(
            "  {:>3}. {}",
            i + 1,
            truncate_chars(paragraph.trim(), EXCERPT_CHARS).dimmed()
        );
        if stems.is_empty() {
            println!("       {}", "(rejected or empty)".bright_red());
        } else {
            println!("       {}", stems.join(" ").bright_green());
        }
    }

    let total: usize = paragraphs.iter().map(|(_, s)| s.len()).sum();
    let rejected = paragraphs
        .iter()
        .filter(|(p, s)| s.is_empty() && !p.trim().is_empty())
        .count();
    println!();
    println!(
        "{} stems from {} paragraphs ({} rejected)",
        total.to_string().bold(),
        paragraphs.len(),
        rejected
    );
}

/// Display the result of comparing two collections.
pub fn display_comparison(comparison: &Comparison, source_label: &str, target_label: &str) {
    println!("\n{}", "=== Topic Divergence ===".bold());
    println!();
    println!(
        "  {:<24} topic {:>3}  {}",
        format!("More in {source_label}:"),
        comparison.source.topic,
        comparison.source.word.bright_green().bold()
    );
    println!(
        "  {:<24} topic {:>3}  {}",
        format!("More in {target_label}:"),
        comparison.target.topic,
        comparison.target.word.bright_yellow().bold()
    );
    println!();
}

/// Display the most relevant words of a topic as a bar chart.
pub fn display_top_words(topic: usize, words: &[(String, f64)]) {
    println!("\n{}", format!("=== Topic {topic} ===").bold());
    println!();

    if words.is_empty() {
        println!("  No words carry weight in this topic.");
        return;
    }

    let bar_width: usize = 20;

    for (i, (word, relevance)) in words.iter().enumerate() {
        let filled = (relevance * bar_width as f64).round() as usize;
        let empty = bar_width.saturating_sub(filled);
        let bar = format!("[{}{}]", "=".repeat(filled), " ".repeat(empty));

        let colored_bar = if *relevance >= 0.5 {
            bar.bright_green()
        } else if *relevance >= 0.2 {
            bar.bright_yellow()
        } else {
            bar.bright_blue()
        };

        println!("  {:>3}. {:<24} {} {:.3}", i + 1, word.bold(), colored_bar, relevance);
    }
    println!();
}
