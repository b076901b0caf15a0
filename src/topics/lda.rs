// Trained LDA topic model and its count vectorizer.
//
// The model is trained elsewhere and loaded from JSON. It carries the
// vocabulary, the topic-word component matrix, and the inference settings.
// Document topic mixtures are inferred with the variational E-step used by
// online LDA:
//
//   gamma_d  <- ones
//   repeat:
//     E[log theta_d] = psi(gamma_d) - psi(sum gamma_d)
//     phi_norm_w     = sum_t exp(E[log theta_dt]) * exp(E[log beta_tw]) + eps
//     gamma_dt       = alpha + exp(E[log theta_dt]) * sum_w n_dw / phi_norm_w * exp(E[log beta_tw])
//   until mean |change| < tol
//
// and each row is normalized to sum to 1.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stop_words::{get, LANGUAGE};
use tracing::{debug, info};

use super::traits::{CountVector, TopicModel};

const DEFAULT_MAX_DOC_UPDATE_ITER: usize = 100;
const DEFAULT_MEAN_CHANGE_TOL: f64 = 1e-3;

fn default_max_doc_update_iter() -> usize {
    DEFAULT_MAX_DOC_UPDATE_ITER
}

fn default_mean_change_tol() -> f64 {
    DEFAULT_MEAN_CHANGE_TOL
}

/// On-disk form of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdaParams {
    pub vocabulary: Vec<String>,
    /// `number_topics x vocabulary_size` topic-word weights
    pub components: Vec<Vec<f64>>,
    /// Dirichlet prior on document topics; 1 / number_topics when absent
    #[serde(default)]
    pub doc_topic_prior: Option<f64>,
    #[serde(default = "default_max_doc_update_iter")]
    pub max_doc_update_iter: usize,
    #[serde(default = "default_mean_change_tol")]
    pub mean_change_tol: f64,
    /// Language whose stop words the vectorizer drops (e.g. "fi")
    #[serde(default)]
    pub stop_word_language: Option<String>,
}

impl LdaParams {
    pub fn new(vocabulary: Vec<String>, components: Vec<Vec<f64>>) -> Self {
        Self {
            vocabulary,
            components,
            doc_topic_prior: None,
            max_doc_update_iter: DEFAULT_MAX_DOC_UPDATE_ITER,
            mean_change_tol: DEFAULT_MEAN_CHANGE_TOL,
            stop_word_language: None,
        }
    }
}

/// A loaded LDA model ready for inference.
pub struct LdaModel {
    params: LdaParams,
    word_index: HashMap<String, usize>,
    /// exp(E[log beta]) per topic and word
    exp_topic_word: Vec<Vec<f64>>,
    stop_words: HashSet<String>,
    doc_topic_prior: f64,
}

impl LdaModel {
    pub fn from_params(params: LdaParams) -> Result<Self> {
        let number_topics = params.components.len();
        if number_topics == 0 {
            anyhow::bail!("LDA model has no topics");
        }
        if params.vocabulary.is_empty() {
            anyhow::bail!("LDA model has an empty vocabulary");
        }
        for (t, row) in params.components.iter().enumerate() {
            if row.len() != params.vocabulary.len() {
                anyhow::bail!(
                    "Topic {} has {} word weights but the vocabulary has {} words",
                    t,
                    row.len(),
                    params.vocabulary.len()
                );
            }
            if row.iter().any(|w| !w.is_finite() || *w < 0.0) {
                anyhow::bail!("Topic {} has negative or non-finite word weights", t);
            }
        }

        let word_index = params
            .vocabulary
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i))
            .collect();

        let exp_topic_word = params
            .components
            .iter()
            .map(|row| dirichlet_expectation(row).into_iter().map(f64::exp).collect())
            .collect();

        let stop_words: HashSet<String> = params
            .stop_word_language
            .as_deref()
            .and_then(stop_word_language)
            .map(|lang| get(lang).into_iter().collect())
            .unwrap_or_default();

        let doc_topic_prior = params
            .doc_topic_prior
            .unwrap_or(1.0 / number_topics as f64);

        Ok(Self {
            params,
            word_index,
            exp_topic_word,
            stop_words,
            doc_topic_prior,
        })
    }

    /// Load a trained model from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read topic model from {}", path.display()))?;
        let params: LdaParams = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse topic model {}", path.display()))?;
        let model = Self::from_params(params)?;

        info!(
            topics = model.number_topics(),
            vocabulary = model.params.vocabulary.len(),
            "Loaded topic model from {}",
            path.display()
        );

        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string(&self.params).context("Failed to serialize topic model")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write topic model to {}", path.display()))
    }

    pub fn params(&self) -> &LdaParams {
        &self.params
    }

    fn infer_document(&self, counts: &CountVector) -> Vec<f64> {
        let k = self.number_topics();
        let (ids, cnts): (Vec<usize>, Vec<f64>) = counts
            .iter()
            .filter(|&(&id, &n)| id < self.params.vocabulary.len() && n > 0)
            .map(|(&id, &n)| (id, n as f64))
            .unzip();

        if ids.is_empty() {
            return vec![1.0 / k as f64; k];
        }

        let mut gamma = vec![1.0_f64; k];
        for _ in 0..self.params.max_doc_update_iter {
            let exp_doc_topic: Vec<f64> = dirichlet_expectation(&gamma)
                .into_iter()
                .map(f64::exp)
                .collect();

            // Per-word normalizer over topics.
            let ratios: Vec<f64> = ids
                .iter()
                .zip(&cnts)
                .map(|(&w, &n)| {
                    let norm: f64 = exp_doc_topic
                        .iter()
                        .zip(&self.exp_topic_word)
                        .map(|(theta, beta)| theta * beta[w])
                        .sum::<f64>()
                        + f64::EPSILON;
                    n / norm
                })
                .collect();

            let updated: Vec<f64> = exp_doc_topic
                .iter()
                .zip(&self.exp_topic_word)
                .map(|(theta, beta)| {
                    let s: f64 = ids.iter().zip(&ratios).map(|(&w, r)| r * beta[w]).sum();
                    theta * s + self.doc_topic_prior
                })
                .collect();

            let mean_change = updated
                .iter()
                .zip(&gamma)
                .map(|(a, b)| (a - b).abs())
                .sum::<f64>()
                / k as f64;
            gamma = updated;

            if mean_change < self.params.mean_change_tol {
                break;
            }
        }

        let total: f64 = gamma.iter().sum();
        gamma.iter().map(|g| g / total).collect()
    }
}

impl TopicModel for LdaModel {
    fn vocabulary(&self) -> &[String] {
        &self.params.vocabulary
    }

    fn components(&self) -> &[Vec<f64>] {
        &self.params.components
    }

    fn vectorize(&self, documents: &[Vec<String>]) -> Result<Vec<CountVector>> {
        Ok(documents
            .iter()
            .map(|tokens| {
                let mut counts = CountVector::new();
                for token in tokens {
                    if self.stop_words.contains(token) {
                        continue;
                    }
                    if let Some(&id) = self.word_index.get(token) {
                        *counts.entry(id).or_insert(0) += 1;
                    }
                }
                counts
            })
            .collect())
    }

    fn topic_mixture(&self, counts: &[CountVector]) -> Result<Vec<Vec<f64>>> {
        let rows: Vec<Vec<f64>> = counts.iter().map(|c| self.infer_document(c)).collect();
        debug!(documents = rows.len(), "Inferred document topic mixtures");
        Ok(rows)
    }
}

fn stop_word_language(tag: &str) -> Option<LANGUAGE> {
    match tag {
        "fi" => Some(LANGUAGE::Finnish),
        "sv" => Some(LANGUAGE::Swedish),
        "en" => Some(LANGUAGE::English),
        _ => None,
    }
}

/// E[log x] for x ~ Dirichlet(alpha): psi(alpha_i) - psi(sum alpha).
fn dirichlet_expectation(alpha: &[f64]) -> Vec<f64> {
    let total = digamma(alpha.iter().sum());
    alpha.iter().map(|&a| digamma(a) - total).collect()
}

/// Digamma function for positive arguments: recurrence up to x >= 6, then
/// the asymptotic series.
fn digamma(mut x: f64) -> f64 {
    if x <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    result + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_topic_model() -> LdaModel {
        let vocabulary = vec!["koira".to_string(), "kissa".to_string(), "auto".to_string()];
        let components = vec![vec![50.0, 40.0, 0.5], vec![0.5, 1.0, 60.0]];
        LdaModel::from_params(LdaParams::new(vocabulary, components)).unwrap()
    }

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_digamma_known_values() {
        assert!((digamma(1.0) - -0.577_215_664_901_532_9).abs() < 1e-9);
        assert!((digamma(0.5) - -1.963_510_026_021_423).abs() < 1e-9);
        assert!((digamma(10.0) - 2.251_752_589_066_721).abs() < 1e-9);
    }

    #[test]
    fn test_vectorize_counts_known_words_only() {
        let model = two_topic_model();
        let counts = model
            .vectorize(&[tokens(&["koira", "koira", "vene", "auto"])])
            .unwrap();
        assert_eq!(counts[0].get(&0), Some(&2));
        assert_eq!(counts[0].get(&2), Some(&1));
        assert_eq!(counts[0].len(), 2);
    }

    #[test]
    fn test_vectorize_drops_stop_words() {
        let mut params = LdaParams::new(
            vec!["ja".to_string(), "koira".to_string()],
            vec![vec![1.0, 1.0]],
        );
        params.stop_word_language = Some("fi".to_string());
        let model = LdaModel::from_params(params).unwrap();
        let counts = model.vectorize(&[tokens(&["ja", "koira"])]).unwrap();
        assert_eq!(counts[0].get(&0), None);
        assert_eq!(counts[0].get(&1), Some(&1));
    }

    #[test]
    fn test_mixture_follows_document_words() {
        let model = two_topic_model();
        let counts = model
            .vectorize(&[tokens(&["koira", "kissa", "koira"]), tokens(&["auto", "auto"])])
            .unwrap();
        let rows = model.topic_mixture(&counts).unwrap();

        assert!(rows[0][0] > rows[0][1], "pet document should lean to topic 0: {:?}", rows[0]);
        assert!(rows[1][1] > rows[1][0], "car document should lean to topic 1: {:?}", rows[1]);
        for row in &rows {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "row sums to {sum}");
        }
    }

    #[test]
    fn test_empty_document_is_uniform() {
        let model = two_topic_model();
        let rows = model.topic_mixture(&[CountVector::new()]).unwrap();
        assert_eq!(rows[0], vec![0.5, 0.5]);
    }

    #[test]
    fn test_rejects_malformed_components() {
        let vocabulary = vec!["a".to_string(), "b".to_string()];
        assert!(LdaModel::from_params(LdaParams::new(vocabulary.clone(), vec![vec![1.0]])).is_err());
        assert!(LdaModel::from_params(LdaParams::new(vocabulary.clone(), vec![])).is_err());
        assert!(
            LdaModel::from_params(LdaParams::new(vocabulary, vec![vec![1.0, -2.0]])).is_err()
        );
    }

    #[test]
    fn test_params_json_defaults() {
        let json = r#"{ "vocabulary": ["a"], "components": [[1.0]] }"#;
        let params: LdaParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.max_doc_update_iter, DEFAULT_MAX_DOC_UPDATE_ITER);
        assert_eq!(params.mean_change_tol, DEFAULT_MEAN_CHANGE_TOL);
        assert!(params.doc_topic_prior.is_none());

        let model = LdaModel::from_params(params).unwrap();
        assert_eq!(model.number_topics(), 1);
    }
}
