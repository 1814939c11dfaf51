//! Display-name catalogs for models, datasets and metrics
//!
//! Tables are built once on first use and never change. Lookups of unknown
//! keys pass the key through unchanged.

use once_cell::sync::Lazy;
use std::collections::HashMap;

const RANKING_MODELS: [(&str, &str); 10] = [
    ("dnn", "DNN"),
    ("pnn", "PNN"),
    ("deepfm", "DeepFM"),
    ("dcn", "DCN"),
    ("dcnv2", "DCNv2"),
    ("din", "DIN"),
    ("autoint", "AutoInt"),
    ("finalmlp", "FinalMLP"),
    ("gdcn", "GDCN"),
    ("masknet", "MaskNet"),
];

const MATCHING_MODELS: [(&str, &str); 12] = [
    ("naml", "NAML"),
    ("nrms", "NRMS"),
    ("lstur", "LSTUR"),
    ("miner", "MINER"),
    ("bert-naml", "BERT-NAML"),
    ("bert-nrms", "BERT-NRMS"),
    ("bert-lstur", "BERT-LSTUR"),
    ("bert-miner", "BERT-MINER"),
    ("llama1-naml", "Llama1-NAML"),
    ("llama1-nrms", "Llama1-NRMS"),
    ("llama1-lstur", "Llama1-LSTUR"),
    ("llama1-miner", "Llama1-MINER"),
];

/// Dataset keys and display names, in catalog order.
pub const DATASETS: [(&str, &str); 12] = [
    ("automotive", "Automotive"),
    ("books", "Books"),
    ("cds", "CDs"),
    ("ebnerd", "EB-NeRD"),
    ("goodreads", "Goodreads"),
    ("hm", "H&M"),
    ("lastfm", "Last.fm"),
    ("microlens", "MicroLens"),
    ("mind", "MIND"),
    ("netflix", "Netflix"),
    ("pens", "PENS"),
    ("yelp", "Yelp"),
];

/// Metric keys and display names, in catalog order.
pub const METRICS: [(&str, &str); 4] = [
    ("gauc", "GAUC"),
    ("mrr", "MRR"),
    ("ndcg@1", "nDCG@1"),
    ("ndcg@5", "nDCG@5"),
];

static MODEL_NAMES: Lazy<HashMap<String, String>> = Lazy::new(|| {
    let mut names = HashMap::with_capacity(RANKING_MODELS.len() * 2 + MATCHING_MODELS.len());
    for (key, name) in RANKING_MODELS {
        names.insert(key.to_string(), name.to_string());
        names.insert(format!("{key}_text"), format!("{name}-TEXT"));
    }
    for (key, name) in MATCHING_MODELS {
        names.insert(key.to_string(), name.to_string());
    }
    names
});

static DATASET_NAMES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| DATASETS.into_iter().collect());

static METRIC_NAMES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| METRICS.into_iter().collect());

/// Display name of a model identifier.
#[must_use]
pub fn model_name(key: &str) -> String {
    MODEL_NAMES
        .get(key)
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

/// Display name of a dataset key.
#[must_use]
pub fn dataset_name(key: &str) -> &str {
    DATASET_NAMES.get(key).copied().unwrap_or(key)
}

/// Display name of a metric key.
#[must_use]
pub fn metric_name(key: &str) -> &str {
    METRIC_NAMES.get(key).copied().unwrap_or(key)
}

/// Default dataset filter (every catalogued dataset).
#[must_use]
pub fn default_datasets() -> Vec<String> {
    DATASETS.iter().map(|(key, _)| (*key).to_string()).collect()
}

/// Default metric filter (every catalogued metric).
#[must_use]
pub fn default_metrics() -> Vec<String> {
    METRICS.iter().map(|(key, _)| (*key).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_names() {
        assert_eq!(model_name("dcnv2"), "DCNv2");
        assert_eq!(model_name("finalmlp_text"), "FinalMLP-TEXT");
        assert_eq!(model_name("llama1-nrms"), "Llama1-NRMS");
    }

    #[test]
    fn test_text_variants_only_for_ranking_models() {
        assert_eq!(model_name("nrms_text"), "nrms_text");
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        assert_eq!(model_name("my-new-model"), "my-new-model");
        assert_eq!(dataset_name("kuairec"), "kuairec");
        assert_eq!(metric_name("hit@10"), "hit@10");
    }

    #[test]
    fn test_dataset_and_metric_names() {
        assert_eq!(dataset_name("hm"), "H&M");
        assert_eq!(dataset_name("lastfm"), "Last.fm");
        assert_eq!(metric_name("ndcg@5"), "nDCG@5");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_datasets().len(), 12);
        assert_eq!(default_metrics(), vec!["gauc", "mrr", "ndcg@1", "ndcg@5"]);
    }
}
