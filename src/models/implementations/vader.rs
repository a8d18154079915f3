//! VADER: valence-aware, rule-based scoring tuned for short social text.
//!
//! Each token's lexicon valence is adjusted by the words in front of it
//! (boosters, negations, idioms), the whole sequence is re-weighted around
//! "but", and the sum is amplified by `!`/`?` before being squashed into
//! `[-1, 1]`.
//!
//! Without a lexicon file the analyzer delegates to the `vader_sentiment`
//! crate, which carries the complete published lexicon and emoji table.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::core::{PolarityThresholds, Result};
use crate::models::lexicon::VaderLexicon;
use crate::pipelines::sentiment::{Classifier, SentimentResult};

const B_INCR: f32 = 0.293;
const B_DECR: f32 = -0.293;
const C_INCR: f32 = 0.733;
const N_SCALAR: f32 = -0.74;
const NORMALIZE_ALPHA: f32 = 15.0;

const NEGATE: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "ain't", "aren't",
    "can't", "couldn't", "daren't", "didn't", "doesn't", "dont", "hadnt", "hasnt", "havent",
    "isnt", "mightnt", "mustnt", "neither", "don't", "hadn't", "hasn't", "haven't", "isn't",
    "mightn't", "mustn't", "neednt", "needn't", "never", "none", "nope", "nor", "not", "nothing",
    "nowhere", "oughtnt", "shant", "shouldnt", "uhuh", "wasnt", "werent", "oughtn't", "shan't",
    "shouldn't", "uh-uh", "wasn't", "weren't", "without", "wont", "wouldnt", "won't", "wouldn't",
    "rarely", "seldom", "despite",
];

static BOOSTERS: Lazy<HashMap<&'static str, f32>> = Lazy::new(|| {
    let incr = [
        "absolutely", "amazingly", "awfully", "completely", "considerable", "considerably",
        "decidedly", "deeply", "enormous", "enormously", "entirely", "especially", "exceptional",
        "exceptionally", "extreme", "extremely", "fabulously", "flipping", "flippin", "fricking",
        "frickin", "fully", "greatly", "hella", "highly", "hugely", "incredible", "incredibly",
        "intensely", "major", "majorly", "more", "most", "particularly", "purely", "quite",
        "really", "remarkably", "so", "substantially", "thoroughly", "total", "totally",
        "tremendous", "tremendously", "uber", "unbelievably", "unusually", "utter", "utterly",
        "very",
    ];
    let decr = [
        "almost", "barely", "hardly", "just enough", "kind of", "kinda", "kindof", "kind-of",
        "less", "little", "marginal", "marginally", "occasional", "occasionally", "partly",
        "scarce", "scarcely", "slight", "slightly", "somewhat", "sort of", "sorta", "sortof",
        "sort-of",
    ];
    incr.into_iter()
        .map(|w| (w, B_INCR))
        .chain(decr.into_iter().map(|w| (w, B_DECR)))
        .collect()
});

static SPECIAL_CASES: Lazy<HashMap<&'static str, f32>> = Lazy::new(|| {
    HashMap::from([
        ("the shit", 3.0),
        ("the bomb", 3.0),
        ("bad ass", 1.5),
        ("badass", 1.5),
        ("bus stop", 0.0),
        ("yeah right", -2.0),
        ("kiss of death", -1.5),
        ("to die for", 3.0),
        ("beating heart", 3.1),
        ("broken heart", -2.9),
    ])
});

/// Proportions of positive, neutral and negative signal plus the normalised
/// compound score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VaderScores {
    pub neg: f32,
    pub neu: f32,
    pub pos: f32,
    pub compound: f32,
}

/// Python's `str.isupper`: at least one cased character and none lower-case.
fn is_upper(word: &str) -> bool {
    let mut cased = false;
    for c in word.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

fn is_negated(word: &str) -> bool {
    NEGATE.contains(&word) || word.contains("n't")
}

/// Whitespace tokens, with surrounding punctuation removed unless that would
/// leave two characters or fewer (which keeps emoticons like `:)` intact).
fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|token| {
            let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
            if stripped.chars().count() <= 2 {
                token
            } else {
                stripped
            }
        })
        .collect()
}

fn normalize(score: f32) -> f32 {
    (score / (score * score + NORMALIZE_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn punctuation_emphasis(text: &str) -> f32 {
    let exclamations = text.matches('!').count().min(4) as f32 * 0.292;
    let questions = match text.matches('?').count() {
        n @ 2..=3 => n as f32 * 0.18,
        n if n > 3 => 0.96,
        _ => 0.0,
    };
    exclamations + questions
}

struct Tokens<'a> {
    words: Vec<&'a str>,
    lower: Vec<String>,
    cap_differential: bool,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        let words = tokenize(text);
        let lower = words.iter().map(|w| w.to_lowercase()).collect();
        let upper = words.iter().filter(|w| is_upper(w)).count();
        let cap_differential = upper > 0 && upper < words.len();
        Self {
            words,
            lower,
            cap_differential,
        }
    }

    fn len(&self) -> usize {
        self.words.len()
    }
}

#[derive(Debug, Clone)]
enum Backend {
    Published,
    Custom(VaderLexicon),
}

/// Rule-based VADER scorer.
#[derive(Debug, Clone)]
pub struct VaderAnalyzer {
    backend: Backend,
    thresholds: PolarityThresholds,
}

impl VaderAnalyzer {
    /// Analyzer over a custom valence lexicon.
    pub fn new(lexicon: VaderLexicon, thresholds: PolarityThresholds) -> Self {
        Self {
            backend: Backend::Custom(lexicon),
            thresholds,
        }
    }

    /// Analyzer over the published VADER lexicon.
    pub fn with_thresholds(thresholds: PolarityThresholds) -> Self {
        Self {
            backend: Backend::Published,
            thresholds,
        }
    }

    /// The custom lexicon, if one was supplied.
    pub fn lexicon(&self) -> Option<&VaderLexicon> {
        match &self.backend {
            Backend::Published => None,
            Backend::Custom(lexicon) => Some(lexicon),
        }
    }

    pub fn polarity_scores(&self, text: &str) -> VaderScores {
        if text.trim().is_empty() {
            return VaderScores::default();
        }
        match &self.backend {
            Backend::Published => published_scores(text),
            Backend::Custom(lexicon) => lexicon_scores(lexicon, text),
        }
    }
}

fn published_scores(text: &str) -> VaderScores {
    let analyzer = vader_sentiment::SentimentIntensityAnalyzer::new();
    let scores = analyzer.polarity_scores(text);
    let score = |key: &str| scores.get(key).copied().unwrap_or(0.0) as f32;
    VaderScores {
        neg: score("neg"),
        neu: score("neu"),
        pos: score("pos"),
        compound: score("compound"),
    }
}

fn lexicon_scores(lexicon: &VaderLexicon, text: &str) -> VaderScores {
    LexiconScorer { lexicon }.polarity_scores(text)
}

struct LexiconScorer<'a> {
    lexicon: &'a VaderLexicon,
}

impl LexiconScorer<'_> {
    fn polarity_scores(&self, text: &str) -> VaderScores {
        let tokens = Tokens::new(text);
        let mut sentiments = Vec::with_capacity(tokens.len());

        for i in 0..tokens.len() {
            let lower = tokens.lower[i].as_str();
            let kind_of = lower == "kind" && tokens.lower.get(i + 1).is_some_and(|w| w == "of");
            if BOOSTERS.contains_key(lower) || kind_of {
                sentiments.push(0.0);
                continue;
            }
            sentiments.push(self.valence(&tokens, i));
        }

        but_check(&tokens.lower, &mut sentiments);
        score_valence(&sentiments, text)
    }

    fn valence(&self, tokens: &Tokens, i: usize) -> f32 {
        let lower = &tokens.lower;
        let Some(base) = self.lexicon.get(&lower[i]) else {
            return 0.0;
        };
        let mut valence = base;

        // "no" directly qualifying another lexicon word carries no valence itself.
        if lower[i] == "no" && lower.get(i + 1).is_some_and(|w| self.lexicon.contains(w)) {
            valence = 0.0;
        }
        let after_no = (i > 0 && lower[i - 1] == "no")
            || (i > 1 && lower[i - 2] == "no")
            || (i > 2 && lower[i - 3] == "no" && matches!(lower[i - 1].as_str(), "or" | "nor"));
        if after_no {
            valence = base * N_SCALAR;
        }

        if is_upper(tokens.words[i]) && tokens.cap_differential {
            valence += if valence > 0.0 { C_INCR } else { -C_INCR };
        }

        for start in 0..3 {
            if i <= start {
                break;
            }
            let prev = i - (start + 1);
            if self.lexicon.contains(&lower[prev]) {
                continue;
            }
            let mut scalar = scalar_inc_dec(tokens.words[prev], &lower[prev], valence, tokens.cap_differential);
            if start == 1 {
                scalar *= 0.95;
            } else if start == 2 {
                scalar *= 0.9;
            }
            valence += scalar;
            valence = negation_check(valence, lower, start, i);
            if start == 2 {
                valence = special_idioms_check(valence, lower, i);
            }
        }

        least_check(valence, lower, i, self.lexicon)
    }
}

impl Classifier for VaderAnalyzer {
    fn classify(&self, text: &str) -> Result<SentimentResult> {
        let scores = self.polarity_scores(text);
        Ok(SentimentResult::from_polarity(scores.compound, &self.thresholds))
    }
}

fn scalar_inc_dec(word: &str, lower: &str, valence: f32, cap_differential: bool) -> f32 {
    let Some(&boost) = BOOSTERS.get(lower) else {
        return 0.0;
    };
    let mut scalar = if valence < 0.0 { -boost } else { boost };
    if is_upper(word) && cap_differential {
        scalar += if valence > 0.0 { C_INCR } else { -C_INCR };
    }
    scalar
}

fn negation_check(valence: f32, lower: &[String], start: usize, i: usize) -> f32 {
    let so_or_this = |w: &str| w == "so" || w == "this";
    match start {
        0 if is_negated(&lower[i - 1]) => valence * N_SCALAR,
        1 => {
            if lower[i - 2] == "never" && so_or_this(&lower[i - 1]) {
                valence * 1.25
            } else if lower[i - 2] == "without" && lower[i - 1] == "doubt" {
                valence
            } else if is_negated(&lower[i - 2]) {
                valence * N_SCALAR
            } else {
                valence
            }
        }
        2 => {
            if lower[i - 3] == "never" && (so_or_this(&lower[i - 2]) || so_or_this(&lower[i - 1])) {
                valence * 1.25
            } else if lower[i - 3] == "without" && (lower[i - 2] == "doubt" || lower[i - 1] == "doubt")
            {
                valence
            } else if is_negated(&lower[i - 3]) {
                valence * N_SCALAR
            } else {
                valence
            }
        }
        _ => valence,
    }
}

/// Only reached with `i >= 3`.
fn special_idioms_check(mut valence: f32, lower: &[String], i: usize) -> f32 {
    let (w3, w2, w1, w0) = (&lower[i - 3], &lower[i - 2], &lower[i - 1], &lower[i]);
    let one_zero = format!("{w1} {w0}");
    let two_one_zero = format!("{w2} {w1} {w0}");
    let two_one = format!("{w2} {w1}");
    let three_two_one = format!("{w3} {w2} {w1}");
    let three_two = format!("{w3} {w2}");

    let preceding = [&one_zero, &two_one_zero, &two_one, &three_two_one, &three_two];
    if let Some(v) = preceding.iter().find_map(|seq| SPECIAL_CASES.get(seq.as_str())) {
        valence = *v;
    }
    if let Some(next) = lower.get(i + 1) {
        if let Some(v) = SPECIAL_CASES.get(format!("{w0} {next}").as_str()) {
            valence = *v;
        }
        if let Some(after) = lower.get(i + 2) {
            if let Some(v) = SPECIAL_CASES.get(format!("{w0} {next} {after}").as_str()) {
                valence = *v;
            }
        }
    }

    for n_gram in [&three_two_one, &three_two, &two_one] {
        if let Some(boost) = BOOSTERS.get(n_gram.as_str()) {
            valence += boost;
        }
    }
    valence
}

fn least_check(valence: f32, lower: &[String], i: usize, lexicon: &VaderLexicon) -> f32 {
    if i > 0 && lower[i - 1] == "least" && !lexicon.contains("least") {
        if i > 1 && matches!(lower[i - 2].as_str(), "at" | "very") {
            return valence;
        }
        return valence * N_SCALAR;
    }
    valence
}

/// Damps everything before the first "but" and stresses everything after.
fn but_check(lower: &[String], sentiments: &mut [f32]) {
    let Some(but) = lower.iter().position(|w| w == "but") else {
        return;
    };
    for (idx, sentiment) in sentiments.iter_mut().enumerate() {
        if idx < but {
            *sentiment *= 0.5;
        } else if idx > but {
            *sentiment *= 1.5;
        }
    }
}

fn score_valence(sentiments: &[f32], text: &str) -> VaderScores {
    if sentiments.is_empty() {
        return VaderScores::default();
    }

    let emphasis = punctuation_emphasis(text);
    let mut sum: f32 = sentiments.iter().sum();
    if sum > 0.0 {
        sum += emphasis;
    } else if sum < 0.0 {
        sum -= emphasis;
    }

    let (mut pos_sum, mut neg_sum, mut neu_count) = (0.0f32, 0.0f32, 0.0f32);
    for &s in sentiments {
        if s > 0.0 {
            pos_sum += s + 1.0;
        } else if s < 0.0 {
            neg_sum += s - 1.0;
        } else {
            neu_count += 1.0;
        }
    }
    if pos_sum > neg_sum.abs() {
        pos_sum += emphasis;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= emphasis;
    }

    let total = pos_sum + neg_sum.abs() + neu_count;
    VaderScores {
        neg: (neg_sum / total).abs(),
        neu: (neu_count / total).abs(),
        pos: (pos_sum / total).abs(),
        compound: normalize(sum),
    }
}
