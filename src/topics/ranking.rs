// Numeric helpers over model output: topic word relevance, mean mixtures,
// and deterministic extrema.
//
// Relevance of a word for a topic is that topic's share of the word's total
// weight across all topics:
//
//   relevance(t, w) = components[t][w] / sum_t' components[t'][w]
//
// so each word's relevances over all topics sum to 1. Words with no weight
// in any topic have no relevance at all and are left out.

use std::collections::HashMap;

use anyhow::Result;

use super::error::TopicError;

/// Relevance of every vocabulary word for `topic`.
pub fn topic_word_ranking(
    components: &[Vec<f64>],
    vocabulary: &[String],
    topic: usize,
) -> Result<HashMap<String, f64>> {
    let row = components.get(topic).ok_or(TopicError::TopicOutOfRange {
        topic,
        number_topics: components.len(),
    })?;

    if let Some(bad) = components.iter().position(|r| r.len() != vocabulary.len()) {
        anyhow::bail!(
            "Component row {} has {} weights but the vocabulary has {} words",
            bad,
            components[bad].len(),
            vocabulary.len()
        );
    }

    let mut ranking = HashMap::with_capacity(vocabulary.len());
    for (wid, word) in vocabulary.iter().enumerate() {
        let total: f64 = components.iter().map(|r| r[wid]).sum();
        if total > 0.0 {
            ranking.insert(word.clone(), row[wid] / total);
        }
    }

    Ok(ranking)
}

/// Column-wise mean of per-document topic mixtures.
pub fn mean_mixture(rows: &[Vec<f64>], number_topics: usize) -> Result<Vec<f64>> {
    if rows.is_empty() {
        anyhow::bail!("Cannot average topic mixtures of an empty collection");
    }

    let mut mean = vec![0.0_f64; number_topics];
    for (i, row) in rows.iter().enumerate() {
        if row.len() != number_topics {
            anyhow::bail!(
                "Topic mixture of document {} has {} topics, expected {}",
                i,
                row.len(),
                number_topics
            );
        }
        for (m, v) in mean.iter_mut().zip(row) {
            *m += v;
        }
    }

    let n = rows.len() as f64;
    for m in &mut mean {
        *m /= n;
    }

    Ok(mean)
}

/// Index of the largest value; the lowest index wins ties.
pub fn argmax(values: &[f64]) -> Option<usize> {
    extremum(values, |candidate, best| candidate > best)
}

/// Index of the smallest value; the lowest index wins ties.
pub fn argmin(values: &[f64]) -> Option<usize> {
    extremum(values, |candidate, best| candidate < best)
}

fn extremum(values: &[f64], better: impl Fn(f64, f64) -> bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if !better(v, b) => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// The `n` most relevant words of a ranking, best first. Equal scores are
/// ordered alphabetically.
pub fn top_words(ranking: &HashMap<String, f64>, n: usize) -> Vec<(String, f64)> {
    let mut words: Vec<(String, f64)> = ranking.iter().map(|(w, s)| (w.clone(), *s)).collect();
    words.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    words.truncate(n);
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_ranking_is_share_of_word_weight() {
        let components = vec![vec![3.0, 1.0], vec![1.0, 1.0]];
        let ranking = topic_word_ranking(&components, &vocab(&["a", "b"]), 0).unwrap();
        assert!((ranking["a"] - 0.75).abs() < 1e-12);
        assert!((ranking["b"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ranking_skips_weightless_words() {
        let components = vec![vec![1.0, 0.0], vec![2.0, 0.0]];
        let ranking = topic_word_ranking(&components, &vocab(&["a", "b"]), 1).unwrap();
        assert!(!ranking.contains_key("b"));
        assert!((ranking["a"] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ranking_rejects_unknown_topic() {
        let components = vec![vec![1.0]];
        let err = topic_word_ranking(&components, &vocab(&["a"]), 3).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TopicError>(),
            Some(&TopicError::TopicOutOfRange {
                topic: 3,
                number_topics: 1
            })
        );
    }

    #[test]
    fn test_ranking_rejects_mismatched_vocabulary() {
        let components = vec![vec![1.0, 2.0]];
        assert!(topic_word_ranking(&components, &vocab(&["a"]), 0).is_err());
    }

    #[test]
    fn test_mean_mixture() {
        let rows = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]];
        let mean = mean_mixture(&rows, 2).unwrap();
        assert!((mean[0] - 0.5).abs() < 1e-12);
        assert!((mean[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_mean_mixture_empty_fails() {
        assert!(mean_mixture(&[], 3).is_err());
    }

    #[test]
    fn test_extrema_first_occurrence_wins() {
        let values = [0.1, 0.4, 0.4, -0.2, -0.2];
        assert_eq!(argmax(&values), Some(1));
        assert_eq!(argmin(&values), Some(3));
    }

    #[test]
    fn test_extrema_ignore_nan_and_empty() {
        assert_eq!(argmax(&[f64::NAN, 1.0, 2.0]), Some(2));
        assert_eq!(argmin(&[]), None);
    }

    #[test]
    fn test_top_words_orders_by_score_then_word() {
        let ranking: HashMap<String, f64> =
            [("b".to_string(), 0.5), ("a".to_string(), 0.5), ("c".to_string(), 0.9)].into();
        let top = top_words(&ranking, 2);
        assert_eq!(top[0].0, "c");
        assert_eq!(top[1].0, "a");
    }
}
