// src/extractors/report.rs

// --- Imports ---
use crate::utils::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

// --- Constants ---
/// Test names returned to callers unless configured otherwise.
/// Matching is case-sensitive, so both spellings of haemoglobin are listed.
pub const DEFAULT_KEYWORDS: [&str; 5] = [
    "Haemoglobin",
    "Hemoglobin",
    "Iron",
    "Vitamin D",
    "Vitamin B12",
];

// --- Value Segment Patterns (Lazy Static) ---
// Each pattern is anchored at the first character after "<name> ".

// "13.50   " - two fraction digits, trailing spaces are part of the value
static TWO_DECIMAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\d{2} +").expect("Failed to compile TWO_DECIMAL_RE")
});

// "30.1 " - one fraction digit, trailing spaces are part of the value
static ONE_DECIMAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\d +").expect("Failed to compile ONE_DECIMAL_RE")
});

// "85" - bare digits; anything after them is ignored
static INTEGER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+").expect("Failed to compile INTEGER_RE")
});

// "   " - no value recorded; the whitespace itself becomes the value.
// The information separators U+001C..U+001F count as whitespace here too.
static BLANK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\s\x1c-\x1f]+").expect("Failed to compile BLANK_RE")
});

// --- Data Structures ---

/// One extracted (test name, result) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(rename = "Test")]
    pub test_name: String,
    #[serde(rename = "Result")]
    pub result: String,
}

/// Which value alternative matched a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    TwoDecimal,
    OneDecimal,
    Integer,
    Blank,
}

impl ValueShape {
    /// Alternatives in the order they are tried. The first one that matches wins,
    /// so "13.505 " is read as `Integer` ("13"), not as a decimal.
    pub const ORDER: [ValueShape; 4] = [
        ValueShape::TwoDecimal,
        ValueShape::OneDecimal,
        ValueShape::Integer,
        ValueShape::Blank,
    ];

    fn pattern(self) -> &'static Regex {
        match self {
            ValueShape::TwoDecimal => &*TWO_DECIMAL_RE,
            ValueShape::OneDecimal => &*ONE_DECIMAL_RE,
            ValueShape::Integer => &*INTEGER_RE,
            ValueShape::Blank => &*BLANK_RE,
        }
    }

    /// Byte length of the value segment at the start of `rest`, if this alternative matches there.
    fn match_len(self, rest: &str) -> Option<usize> {
        self.pattern().find(rest).map(|m| m.end())
    }
}

/// A line that has the shape `<name> <value>...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMatch<'a> {
    /// Name segment exactly as it appears, not yet trimmed.
    pub name: &'a str,
    /// Raw value segment, including any captured trailing spaces.
    pub value: &'a str,
    pub shape: ValueShape,
}

/// Matches a single report line.
///
/// The line must start with an ASCII letter. The name is the shortest prefix
/// that is followed by one space and a value segment; each space after the
/// first letter is tried in turn. Text after the value segment is ignored.
pub fn match_line(line: &str) -> Option<LineMatch<'_>> {
    let first = line.chars().next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }

    // The first char is a one-byte letter, so every space index here is >= 1
    for (idx, _) in line.match_indices(' ') {
        let rest = &line[idx + 1..];
        for shape in ValueShape::ORDER {
            if let Some(len) = shape.match_len(rest) {
                return Some(LineMatch {
                    name: &line[..idx],
                    value: &rest[..len],
                    shape,
                });
            }
        }
    }

    None
}

/// Records keyed by test name. A repeated name replaces the earlier value but
/// keeps the position where the name was first seen.
#[derive(Debug, Default)]
pub struct RecordSet {
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, test_name: &str, result: &str) {
        match self.index.get(test_name) {
            Some(&pos) => self.records[pos].result = result.to_string(),
            None => {
                self.index.insert(test_name.to_string(), self.records.len());
                self.records.push(Record {
                    test_name: test_name.to_string(),
                    result: result.to_string(),
                });
            }
        }
    }

    /// Records in first-seen order.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Case-sensitive substring filter over test names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    /// Builds a filter from an ordered keyword list. Duplicates are dropped,
    /// keeping the first occurrence. An empty list, or an empty keyword, would
    /// match every record and is rejected.
    pub fn new<I, S>(keywords: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.into();
            if keyword.is_empty() {
                return Err(AppError::Config("Keywords must not be empty strings".to_string()));
            }
            if !unique.contains(&keyword) {
                unique.push(keyword);
            }
        }

        if unique.is_empty() {
            return Err(AppError::Config("Keyword list must not be empty".to_string()));
        }

        Ok(Self { keywords: unique })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True when `test_name` contains at least one keyword.
    pub fn matches(&self, test_name: &str) -> bool {
        self.keywords.iter().any(|k| test_name.contains(k.as_str()))
    }
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Collects every `<name> <value>` line of `text` into a [`RecordSet`], unfiltered.
pub fn collect_records(text: &str) -> RecordSet {
    let mut set = RecordSet::new();
    for line in text.split('\n') {
        if let Some(found) = match_line(line) {
            let name = found.name.trim();
            tracing::trace!("{:?} value {:?} for {}", found.shape, found.value, name);
            set.insert(name, found.value);
        }
    }
    set
}

/// Extracts the records of `text` whose test name matches `filter`, in
/// first-seen order. Malformed lines are skipped; this never fails.
pub fn extract(text: &str, filter: &KeywordFilter) -> Vec<Record> {
    collect_records(text)
        .into_records()
        .into_iter()
        .filter(|record| filter.matches(&record.test_name))
        .collect()
}

// --- Main Extractor Structure ---
#[derive(Debug, Clone, Default)]
pub struct ReportExtractor {
    filter: KeywordFilter,
}

impl ReportExtractor {
    pub fn new(filter: KeywordFilter) -> Self {
        Self { filter }
    }

    /// Extracts keyword-matching lab records from report text.
    pub fn extract(&self, text: &str) -> Vec<Record> {
        let records = extract(text, &self.filter);
        tracing::debug!(
            "{} records matched keywords in {} bytes of text",
            records.len(),
            text.len()
        );
        records
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn record(test_name: &str, result: &str) -> Record {
        Record {
            test_name: test_name.to_string(),
            result: result.to_string(),
        }
    }

    const SAMPLES: [&str; 6] = [
        "Haemoglobin 13.50   \nIron 85\n",
        "Cholesterol 190\n",
        "",
        "Vitamin B12 450\nVitamin D 30.1 \n",
        "Iron 10\nHemoglobin 12.1 \nIron 20\n\n  indented 4\n42 leading digit\nHDL\n",
        "Vitamin D3 25.00 ng/mL\nSerum Iron  \nTransferrin 2.5\n\u{00e9}tat 3\r\n",
    ];

    #[test]
    fn test_two_decimal_keeps_trailing_spaces() {
        let filter = KeywordFilter::default();
        let records = extract("Haemoglobin 13.50   \nIron 85\n", &filter);
        assert_eq!(
            records,
            vec![record("Haemoglobin", "13.50   "), record("Iron", "85")]
        );
    }

    #[test]
    fn test_no_keyword_match_is_empty() {
        let filter = KeywordFilter::default();
        assert!(extract("Cholesterol 190\n", &filter).is_empty());
    }

    #[test]
    fn test_empty_text_is_empty() {
        let filter = KeywordFilter::default();
        assert!(extract("", &filter).is_empty());
    }

    #[test]
    fn test_vitamins_in_appearance_order() {
        let filter = KeywordFilter::default();
        let records = extract("Vitamin B12 450\nVitamin D 30.1 \n", &filter);
        assert_eq!(
            records,
            vec![record("Vitamin B12", "450"), record("Vitamin D", "30.1 ")]
        );
    }

    #[test]
    fn test_record_serializes_with_report_field_names() {
        let json = serde_json::to_string(&record("Iron", "85")).unwrap();
        assert_eq!(json, r#"{"Test":"Iron","Result":"85"}"#);
    }

    #[test]
    fn test_match_line_branches() {
        let two = match_line("Haemoglobin 13.50  g/dL").unwrap();
        assert_eq!((two.name, two.value, two.shape), ("Haemoglobin", "13.50  ", ValueShape::TwoDecimal));

        let one = match_line("Vitamin D 30.1 ng/mL").unwrap();
        assert_eq!((one.name, one.value, one.shape), ("Vitamin D", "30.1 ", ValueShape::OneDecimal));

        let int = match_line("Iron 85 ug/dL").unwrap();
        assert_eq!((int.name, int.value, int.shape), ("Iron", "85", ValueShape::Integer));

        let blank = match_line("Ferritin  ").unwrap();
        assert_eq!((blank.name, blank.value, blank.shape), ("Ferritin", " ", ValueShape::Blank));
    }

    #[test]
    fn test_decimal_without_trailing_space_falls_back_to_integer() {
        let m = match_line("Haemoglobin 13.50").unwrap();
        assert_eq!(m.value, "13");
        assert_eq!(m.shape, ValueShape::Integer);

        // Three fraction digits fail both decimal branches
        let m = match_line("Haemoglobin 13.505 ").unwrap();
        assert_eq!(m.value, "13");
    }

    #[test]
    fn test_match_line_takes_shortest_name() {
        // "Vitamin" is followed by "B", so the name has to extend to "Vitamin B12"
        let m = match_line("Vitamin B12 450 pg/mL").unwrap();
        assert_eq!(m.name, "Vitamin B12");
        assert_eq!(m.value, "450");

        // A second space right after the name is itself a blank value
        let m = match_line("Serum Iron  85").unwrap();
        assert_eq!(m.name, "Serum Iron");
        assert_eq!(m.value, " ");
        assert_eq!(m.shape, ValueShape::Blank);
    }

    #[test]
    fn test_information_separators_are_blank_values() {
        let m = match_line("Iron \x1c85").unwrap();
        assert_eq!((m.name, m.value, m.shape), ("Iron", "\x1c", ValueShape::Blank));

        let m = match_line("Vitamin D \x1f\x1e ").unwrap();
        assert_eq!((m.name, m.value, m.shape), ("Vitamin D", "\x1f\x1e ", ValueShape::Blank));
    }

    #[test]
    fn test_match_line_rejects() {
        assert!(match_line("").is_none());
        assert!(match_line("42 leading digit").is_none());
        assert!(match_line("  Iron 85").is_none());
        assert!(match_line("HDL").is_none());
        assert!(match_line("Iron").is_none());
        assert!(match_line("Remarks see below").is_none());
        assert!(match_line("\u{00c9}tat 3").is_none());
    }

    #[test]
    fn test_blank_value_quirk_is_preserved() {
        // A name followed by two spaces yields a whitespace-only result
        let filter = KeywordFilter::default();
        let records = extract("Iron  85\n", &filter);
        assert_eq!(records, vec![record("Iron", " ")]);
    }

    #[test]
    fn test_later_occurrence_wins_and_keeps_first_position() {
        let filter = KeywordFilter::default();
        let records = extract("Iron 10\nHemoglobin 12.1 \nIron 20\n", &filter);
        assert_eq!(
            records,
            vec![record("Iron", "20"), record("Hemoglobin", "12.1 ")]
        );
    }

    #[test]
    fn test_name_is_trimmed_before_keying() {
        let set = collect_records("Iron\t 85\nIron 90\n");
        let records = set.into_records();
        assert_eq!(records, vec![record("Iron", "90")]);
    }

    #[test]
    fn test_substring_and_case_sensitive_matching() {
        let filter = KeywordFilter::default();
        let records = extract("Vitamin D3 25\nhemoglobin 12\nSerum Iron 80\n", &filter);
        assert_eq!(
            records,
            vec![record("Vitamin D3", "25"), record("Serum Iron", "80")]
        );
    }

    #[test]
    fn test_record_matching_several_keywords_appears_once() {
        let filter = KeywordFilter::new(["Vitamin", "Vitamin B12", "B12"]).unwrap();
        let records = extract("Vitamin B12 450\n", &filter);
        assert_eq!(records, vec![record("Vitamin B12", "450")]);
    }

    #[test]
    fn test_keyword_filter_rejects_empty_input() {
        assert!(KeywordFilter::new(Vec::<String>::new()).is_err());
        assert!(KeywordFilter::new(["Iron", ""]).is_err());
    }

    #[test]
    fn test_keyword_filter_dedupes_in_order() {
        let filter = KeywordFilter::new(["Iron", "Vitamin D", "Iron"]).unwrap();
        assert_eq!(filter.keywords(), &["Iron".to_string(), "Vitamin D".to_string()]);
    }

    #[test]
    fn test_default_filter_lists_report_keywords() {
        let filter = KeywordFilter::default();
        assert_eq!(filter.keywords().len(), DEFAULT_KEYWORDS.len());
        assert!(filter.matches("Haemoglobin"));
        assert!(filter.matches("Hemoglobin"));
        assert!(!filter.matches("Cholesterol"));
    }

    #[test]
    fn test_every_output_name_is_trimmed_and_non_empty() {
        let filter = KeywordFilter::new(["a", "e", "i", "o", "u", "D", "I", "V", "H"]).unwrap();
        for sample in SAMPLES {
            for r in extract(sample, &filter) {
                assert!(!r.test_name.is_empty());
                assert_eq!(r.test_name, r.test_name.trim());
            }
        }
    }

    #[test]
    fn test_extract_is_idempotent() {
        let extractor = ReportExtractor::default();
        for sample in SAMPLES {
            assert_eq!(extractor.extract(sample), extractor.extract(sample));
        }
    }

    #[test]
    fn test_removing_a_keyword_never_grows_the_result() {
        let full = KeywordFilter::default();
        for removed in DEFAULT_KEYWORDS {
            let reduced =
                KeywordFilter::new(DEFAULT_KEYWORDS.iter().copied().filter(|k| *k != removed)).unwrap();
            for sample in SAMPLES {
                let wide = extract(sample, &full);
                let narrow = extract(sample, &reduced);
                assert!(narrow.len() <= wide.len());
                assert!(narrow.iter().all(|r| wide.contains(r)));
            }
        }
    }

    #[test]
    fn test_extractor_uses_its_filter() {
        let extractor = ReportExtractor::new(KeywordFilter::new(["Transferrin"]).unwrap());
        let records = extractor.extract(SAMPLES[5]);
        // "2.5" has no trailing space, so only the integer part is captured
        assert_eq!(records, vec![record("Transferrin", "2")]);
    }
}
