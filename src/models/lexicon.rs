//! Word lists behind the rule-based scorers.
//!
//! Both formats are tab-separated text; blank lines and lines starting with
//! `"# "` are skipped. The pattern lexicon can also be read from pattern's
//! `en-sentiment.xml`, averaging the word senses the way TextBlob does.
//! VADER's published lexicon ships with the `vader_sentiment` crate, so only
//! replacement lexicons are parsed here.

use std::collections::HashMap;
use std::path::Path;

use crate::core::{Result, SentimentError};

const EMBEDDED_PATTERN: &str = include_str!("../../data/pattern_lexicon.tsv");

fn is_comment(line: &str) -> bool {
    line.trim().is_empty() || line == "#" || line.starts_with("# ")
}

fn parse_number(field: Option<&str>, line: usize, what: &str) -> Result<f32> {
    let field = field.ok_or_else(|| SentimentError::Lexicon {
        line,
        reason: format!("missing {what}"),
    })?;
    field.trim().parse::<f32>().map_err(|_| SentimentError::Lexicon {
        line,
        reason: format!("{what} '{field}' is not a number"),
    })
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        SentimentError::Config(format!("cannot read lexicon {}: {e}", path.display()))
    })
}

/// Token → mean valence on VADER's -4..4 scale.
#[derive(Debug, Clone, Default)]
pub struct VaderLexicon {
    valences: HashMap<String, f32>,
}

impl VaderLexicon {
    pub fn parse(content: &str) -> Result<Self> {
        let mut valences = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            if is_comment(line) {
                continue;
            }
            let mut fields = line.split('\t');
            let token = fields.next().unwrap_or_default().trim();
            if token.is_empty() {
                return Err(SentimentError::Lexicon {
                    line: idx + 1,
                    reason: "empty token".into(),
                });
            }
            let valence = parse_number(fields.next(), idx + 1, "valence")?;
            valences.insert(token.to_lowercase(), valence);
        }
        Ok(Self { valences })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(&read_file(path.as_ref())?)
    }

    /// Looks up an already lower-cased token.
    pub fn get(&self, token: &str) -> Option<f32> {
        self.valences.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.valences.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.valences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valences.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternEntry {
    pub polarity: f32,
    pub subjectivity: f32,
    /// Multiplier applied to the next scored word; `1.0` for plain words.
    pub intensity: f32,
}

impl PatternEntry {
    pub fn is_modifier(&self) -> bool {
        (self.intensity - 1.0).abs() > f32::EPSILON
    }
}

fn mean(entries: &[PatternEntry]) -> PatternEntry {
    let n = entries.len().max(1) as f32;
    let sum = |f: fn(&PatternEntry) -> f32| entries.iter().map(f).sum::<f32>() / n;
    PatternEntry {
        polarity: sum(|e| e.polarity),
        subjectivity: sum(|e| e.subjectivity),
        intensity: sum(|e| e.intensity),
    }
}

/// Word → polarity/subjectivity/intensity, TextBlob style.
#[derive(Debug, Clone, Default)]
pub struct PatternLexicon {
    entries: HashMap<String, PatternEntry>,
}

impl PatternLexicon {
    pub fn parse(content: &str) -> Result<Self> {
        let mut entries = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            if is_comment(line) {
                continue;
            }
            let line_no = idx + 1;
            let mut fields = line.split('\t');
            let word = fields.next().unwrap_or_default().trim();
            if word.is_empty() {
                return Err(SentimentError::Lexicon {
                    line: line_no,
                    reason: "empty word".into(),
                });
            }
            let polarity = parse_number(fields.next(), line_no, "polarity")?;
            let subjectivity = parse_number(fields.next(), line_no, "subjectivity")?;
            let intensity = match fields.next() {
                Some(field) if !field.trim().is_empty() => {
                    parse_number(Some(field), line_no, "intensity")?
                }
                _ => 1.0,
            };

            if !(-1.0..=1.0).contains(&polarity) || !(0.0..=1.0).contains(&subjectivity) {
                return Err(SentimentError::Lexicon {
                    line: line_no,
                    reason: format!("'{word}' has out-of-range scores"),
                });
            }

            entries.insert(
                word.to_lowercase(),
                PatternEntry {
                    polarity,
                    subjectivity,
                    intensity,
                },
            );
        }
        Ok(Self { entries })
    }

    /// Reads pattern's `en-sentiment.xml`. Senses of a word are averaged per
    /// part of speech, then across parts of speech.
    pub fn parse_xml(content: &str) -> Result<Self> {
        let document = scraper::Html::parse_fragment(content);
        let selector = scraper::Selector::parse("word")
            .map_err(|_| SentimentError::Config("invalid lexicon selector".into()))?;

        let mut senses: HashMap<String, HashMap<String, Vec<PatternEntry>>> = HashMap::new();
        for (idx, element) in document.select(&selector).enumerate() {
            let word = element.value();
            let (Some(form), Some(polarity), Some(subjectivity)) = (
                word.attr("form"),
                word.attr("polarity"),
                word.attr("subjectivity"),
            ) else {
                continue;
            };
            let position = idx + 1;
            let entry = PatternEntry {
                polarity: parse_number(Some(polarity), position, "polarity")?,
                subjectivity: parse_number(Some(subjectivity), position, "subjectivity")?,
                intensity: match word.attr("intensity") {
                    Some(intensity) => parse_number(Some(intensity), position, "intensity")?,
                    None => 1.0,
                },
            };
            senses
                .entry(form.trim().to_lowercase())
                .or_default()
                .entry(word.attr("pos").unwrap_or_default().to_string())
                .or_default()
                .push(entry);
        }

        let entries = senses
            .into_iter()
            .filter(|(form, _)| !form.is_empty())
            .map(|(form, by_pos)| {
                let per_pos: Vec<PatternEntry> = by_pos.values().map(|v| mean(v)).collect();
                (form, mean(&per_pos))
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn embedded() -> Result<Self> {
        Self::parse(EMBEDDED_PATTERN)
    }

    /// Tab-separated, or pattern XML when the file ends in `.xml`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = read_file(path)?;
        let is_xml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xml"));
        if is_xml {
            Self::parse_xml(&content)
        } else {
            Self::parse(&content)
        }
    }

    pub fn get(&self, word: &str) -> Option<&PatternEntry> {
        self.entries.get(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_pattern_lexicon_parses() {
        let pattern = PatternLexicon::embedded().unwrap();
        assert!(pattern.get("very").unwrap().is_modifier());
        assert!(!pattern.get("good").unwrap().is_modifier());
    }

    #[test]
    fn vader_format_ignores_extra_columns() {
        let lexicon = VaderLexicon::parse("$:\t-1.5\t0.80623\t[-1, -1, -1, -1, -3]\n").unwrap();
        assert_eq!(lexicon.get("$:"), Some(-1.5));
    }

    #[test]
    fn hash_emoticons_are_not_comments() {
        let lexicon = VaderLexicon::parse("# header\n#-)\t-0.6\n").unwrap();
        assert_eq!(lexicon.len(), 1);
        assert!(lexicon.contains("#-)"));
    }

    #[test]
    fn bad_numbers_report_line() {
        let err = VaderLexicon::parse("good\t1.9\nbad\tworse\n").unwrap_err();
        match err {
            SentimentError::Lexicon { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pattern_rejects_out_of_range_polarity() {
        assert!(PatternLexicon::parse("good\t1.7\t0.6\n").is_err());
    }

    #[test]
    fn pattern_xml_averages_senses() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<sentiment language="en">
<word form="good" wordnet_id="a-1" pos="JJ" polarity="0.7" subjectivity="0.6" intensity="1.0" confidence="0.9" />
<word form="good" wordnet_id="a-2" pos="JJ" polarity="0.5" subjectivity="0.4" intensity="1.0" confidence="0.9" />
<word form="good" wordnet_id="n-1" pos="NN" polarity="0.2" subjectivity="0.5" intensity="1.0" confidence="0.9" />
<word form="very" pos="RB" polarity="0.2" subjectivity="0.3" intensity="1.3" confidence="0.9" />
<word form="broken" pos="JJ" subjectivity="0.4" />
</sentiment>"#;
        let lexicon = PatternLexicon::parse_xml(xml).unwrap();
        assert_eq!(lexicon.len(), 2);

        // JJ mean (0.6, 0.5) averaged with NN (0.2, 0.5)
        let good = lexicon.get("good").unwrap();
        assert!((good.polarity - 0.4).abs() < 1e-6);
        assert!((good.subjectivity - 0.5).abs() < 1e-6);
        assert!(!good.is_modifier());
        assert!(lexicon.get("very").unwrap().is_modifier());
        assert!(lexicon.get("broken").is_none());
    }

    #[test]
    fn xml_file_is_detected_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("en-sentiment.XML");
        std::fs::write(
            &path,
            r#"<sentiment><word form="fixed" pos="JJ" polarity="0.1" subjectivity="0.1" /></sentiment>"#,
        )
        .unwrap();
        let lexicon = PatternLexicon::from_file(&path).unwrap();
        assert!((lexicon.get("fixed").unwrap().polarity - 0.1).abs() < 1e-6);
    }
}
