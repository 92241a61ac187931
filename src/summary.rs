//! Extractive summaries.
//!
//! Sentences are scored by the average corpus frequency of their content
//! words (three characters or longer, stop words removed). The top
//! sentences are returned in their original order.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::library::Library;
use crate::tokenize::tokenize;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "her", "was", "one",
    "our", "out", "has", "had", "his", "how", "its", "may", "who", "did", "get", "him", "she",
    "too", "use", "that", "with", "this", "from", "they", "have", "were", "been", "than", "then",
    "them", "these", "those", "there", "their", "which", "what", "when", "where", "will", "would",
    "could", "should", "into", "about", "also", "such", "each", "other", "some", "only", "over",
];

/// Summary of one document.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub name: String,
    pub title: String,
    pub sentences: Vec<String>,
    pub summary: String,
}

/// Pick up to `max_sentences` representative sentences from `text`.
pub fn summarize_text(text: &str, max_sentences: usize) -> Vec<String> {
    let sentences = split_sentences(text);
    if sentences.len() <= max_sentences {
        return sentences;
    }

    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let content_words = |sentence: &str| -> Vec<String> {
        tokenize(sentence)
            .into_iter()
            .filter(|t| t.chars().count() >= 3 && !stop.contains(t.as_str()))
            .collect()
    };

    let mut freq: HashMap<String, usize> = HashMap::new();
    let per_sentence: Vec<Vec<String>> = sentences
        .iter()
        .map(|s| content_words(s.as_str()))
        .collect();
    for words in &per_sentence {
        for word in words {
            *freq.entry(word.clone()).or_insert(0) += 1;
        }
    }

    let mut scored: Vec<(usize, f64)> = per_sentence
        .iter()
        .enumerate()
        .map(|(i, words)| {
            let score = if words.is_empty() {
                0.0
            } else {
                let total: usize = words.iter().map(|w| freq[w]).sum();
                total as f64 / words.len() as f64
            };
            (i, score)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    let mut picked: Vec<usize> = scored
        .into_iter()
        .take(max_sentences)
        .map(|(i, _)| i)
        .collect();
    picked.sort_unstable();

    picked.into_iter().map(|i| sentences[i].clone()).collect()
}

/// Split text into sentences on terminal punctuation and blank lines, with
/// internal whitespace collapsed.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    for block in text.split("\n\n") {
        let mut current = String::new();
        let mut chars = block.chars().peekable();
        while let Some(c) = chars.next() {
            current.push(c);
            let terminal = matches!(c, '.' | '!' | '?');
            let at_boundary = chars.peek().map_or(true, |next| next.is_whitespace());
            if terminal && at_boundary {
                push_sentence(&mut sentences, &current);
                current.clear();
            }
        }
        push_sentence(&mut sentences, &current);
    }
    sentences
}

fn push_sentence(out: &mut Vec<String>, raw: &str) {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().any(|c| c.is_alphanumeric()) {
        out.push(collapsed);
    }
}

/// CLI entry point for `summary`.
pub async fn run_summary(
    library: &Library,
    name: &str,
    sentences: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let summary = library.summarize(name, sentences).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", summary.title);
    println!();
    if summary.sentences.is_empty() {
        println!("(no extractable text)");
    }
    for sentence in &summary.sentences {
        println!("- {}", sentence);
    }
    Ok(())
}
