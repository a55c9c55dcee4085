//! Regex fragments for identifiers and parameterized test titles.
//!
//! Every piece of text that ends up inside a regex goes through this module. A
//! `PatternFragment` can only be created by [`escape_literal`], the placeholder translators
//! or by combining existing fragments, so unescaped text cannot reach a pattern.
//!
//! Fragments are written in the regex dialect shared by the `regex` crate and the
//! JavaScript engine of the external runner: non-capturing groups, `\d`, anchors and
//! backslash escapes only.

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use serde::Serialize;

use crate::id::{DESCRIBE_ID_SEPARATOR, TEST_ID_SEPARATOR};
use crate::ScopeError;

// ============================================================================
// PLACEHOLDER VALUE PATTERNS
// ============================================================================

/// Characters with a meaning in either regex dialect outside a character class.
const REGEX_META: &[char] = &[
    '.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

const RGX_UINT: &str = r"(?:0|[1-9]\d*)";
const RGX_INDEX: &str = RGX_UINT;
const RGX_INT: &str = r"(?:0|-?[1-9]\d*)";
const RGX_NUM_NAMES: &str = "NaN|-?Infinity";
const RGX_FRAC: &str = r"(?:\.\d+)";
const RGX_EXP: &str = r"(?:e[+-]\d+)";
const RGX_ANYTHING: &str = ".*";

static RGX_NUM: Lazy<String> = Lazy::new(|| format!("-?{RGX_UINT}{RGX_FRAC}?{RGX_EXP}?"));

// A run of characters that stays inside one title of an encoded id.
static RGX_IN_SEGMENT: Lazy<String> =
    Lazy::new(|| format!("[^{DESCRIBE_ID_SEPARATOR}{TEST_ID_SEPARATOR}]*"));

static RGX_JSON_LOOSE: Lazy<String> = Lazy::new(|| json_loose(r#"[^"]"#));
static RGX_JSON_LOOSE_IN_SEGMENT: Lazy<String> =
    Lazy::new(|| json_loose(&format!(r#"[^"{DESCRIBE_ID_SEPARATOR}{TEST_ID_SEPARATOR}]"#)));

// Loose JSON as produced by serializing test parameters: no whitespace outside strings,
// only legitimate tokens, no brace matching.
fn json_loose(string_char: &str) -> String {
    let string = format!(r#""(?:{string_char}|\\")*""#);
    let tokens = [
        r"[\[\]{},:]",
        "true|false|null|undefined",
        RGX_NUM.as_str(),
        RGX_NUM_NAMES,
        string.as_str(),
        r"\[Circular\]",
    ];
    format!("(?:{})+", tokens.join("|"))
}

// ============================================================================
// PATTERN FRAGMENT
// ============================================================================

/// A piece of regex source that is known to be safe to embed in a larger pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct PatternFragment(String);

impl PatternFragment {
    /// The fragment that matches the empty string.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Fixed regex source written in this module.
    fn raw(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// `self` followed by `other`.
    pub fn concat(&self, other: &PatternFragment) -> PatternFragment {
        let mut out = String::with_capacity(self.0.len() + other.0.len());
        out.push_str(&self.0);
        out.push_str(&other.0);
        Self(out)
    }

    /// Appends `other` in place.
    pub fn push(&mut self, other: &PatternFragment) {
        self.0.push_str(&other.0);
    }

    /// Joins fragments with a literal separator.
    pub fn join<'a, I>(parts: I, separator: &str) -> PatternFragment
    where
        I: IntoIterator<Item = &'a PatternFragment>,
    {
        let separator = escape_literal(separator);
        let joined = parts
            .into_iter()
            .map(PatternFragment::as_str)
            .collect::<Vec<_>>()
            .join(separator.as_str());
        Self(joined)
    }

    /// Joins fragments as regex alternatives (`a|b|c`), without grouping.
    pub fn alternation<'a, I>(parts: I) -> PatternFragment
    where
        I: IntoIterator<Item = &'a PatternFragment>,
    {
        let joined = parts
            .into_iter()
            .map(PatternFragment::as_str)
            .collect::<Vec<_>>()
            .join("|");
        Self(joined)
    }

    /// `(?:self)?`
    pub fn optional(&self) -> PatternFragment {
        Self(format!("(?:{})?", self.0))
    }

    /// `^self`
    pub fn anchored_start(&self) -> PatternFragment {
        Self(format!("^{}", self.0))
    }

    /// `self$`
    pub fn anchored_end(&self) -> PatternFragment {
        Self(format!("{}$", self.0))
    }

    /// `^self$`
    pub fn anchored(&self) -> PatternFragment {
        Self(format!("^{}$", self.0))
    }

    pub fn compile(&self) -> Result<Regex, ScopeError> {
        Regex::new(&self.0).map_err(|e| ScopeError::from(e).with_context(format!("/{}/", self.0)))
    }

    /// Compiles `parts` into one set; match indices follow the iteration order.
    pub fn compile_set<'a, I>(parts: I) -> Result<RegexSet, ScopeError>
    where
        I: IntoIterator<Item = &'a PatternFragment>,
    {
        let sources: Vec<&str> = parts.into_iter().map(PatternFragment::as_str).collect();
        RegexSet::new(&sources)
            .map_err(|e| ScopeError::from(e).with_context(format!("/{}/", sources.join("/, /"))))
    }
}

impl fmt::Display for PatternFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// TRANSLATION
// ============================================================================

/// Escapes every regex metacharacter in `value` so the fragment matches only itself.
pub fn escape_literal(value: &str) -> PatternFragment {
    let mut out = String::with_capacity(value.len());
    push_escaped(&mut out, value);
    PatternFragment(out)
}

fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        if REGEX_META.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Where a translated template is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// A runner test name, where a wildcard may match anything.
    TestName,
    /// One title of an encoded id. No value may cross a describe or test delimiter.
    IdSegment,
}

/// Pattern matching either what the runner substitutes for `%token`, or the token itself.
fn placeholder_pattern(token: char, target: Target) -> Option<PatternFragment> {
    let alternative = |values: &str| PatternFragment::raw(format!("(?:{values}|%{token})"));
    let pattern = match token {
        // index of the test case
        '#' => alternative(RGX_INDEX),
        'i' => alternative(&format!("{RGX_INT}|{RGX_NUM_NAMES}")),
        'd' | 'f' => alternative(&format!("{}|{RGX_NUM_NAMES}", RGX_NUM.as_str())),
        'j' => match target {
            Target::TestName => alternative(RGX_JSON_LOOSE.as_str()),
            Target::IdSegment => alternative(RGX_JSON_LOOSE_IN_SEGMENT.as_str()),
        },
        // pretty-format, string and object output is unpredictable
        'p' | 's' | 'o' => match target {
            Target::TestName => PatternFragment::raw(RGX_ANYTHING),
            Target::IdSegment => PatternFragment::raw(RGX_IN_SEGMENT.as_str()),
        },
        // `%%` is a single percent sign and consumes no value
        '%' => PatternFragment::raw("%"),
        _ => return None,
    };
    Some(pattern)
}

fn translate(template: &str, target: Target) -> PatternFragment {
    let mut out = String::with_capacity(template.len() * 2);
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            push_escaped(&mut out, &c.to_string());
            continue;
        }
        let Some(token) = chars.next() else {
            out.push('%');
            break;
        };
        match placeholder_pattern(token, target) {
            Some(pattern) => out.push_str(pattern.as_str()),
            None => {
                out.push('%');
                push_escaped(&mut out, &token.to_string());
            }
        }
    }
    PatternFragment(out)
}

/// Translates a parameterized title template into a pattern for runner test names.
///
/// `%` followed by one character is a placeholder token; recognised tokens become
/// alternatives matching the substituted value or the literal token, unrecognised ones
/// stay literal. Everything else is escaped.
pub fn translate_placeholders(template: &str) -> PatternFragment {
    translate(template, Target::TestName)
}

/// Like [`translate_placeholders`], for a title embedded in an encoded id.
///
/// Substituted values never match `§` or `¶`, so a placeholder cannot swallow the
/// delimiters of neighbouring titles.
pub fn translate_segment_placeholders(template: &str) -> PatternFragment {
    translate(template, Target::IdSegment)
}

/// True when `title` contains a token [`translate_placeholders`] would expand.
pub fn has_placeholders(title: &str) -> bool {
    let mut chars = title.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            if let Some(token) = chars.next() {
                if token != '%' && placeholder_pattern(token, Target::TestName).is_some() {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod pattern_tests {
    use super::*;

    const SPECIAL_NUMBERS: &[&str] = &["NaN", "Infinity", "-Infinity"];
    const DECIMALS: &[&str] = &["0.123", "1123.1", "-0.0", "-1.1241", "-123.1412"];
    const JSON_OBJECTS: &[&str] = &[
        r#"{"key":"value"}"#,
        r#"{"key":{"subKey":"value"}}"#,
        r#"{"key":[0,1]}"#,
        r#"{"key":[{"subKey":"value"}]}"#,
    ];
    const JSON_ARRAYS: &[&str] = &[r#"[1,2,3]"#, r#"["a","b","c"]"#, r#"[{"key":"value"}]"#];
    const JSON_STRINGS: &[&str] = &[r#""someString""#, r#""some\"escaped""#];
    const INVALID_JSON: &[&str] = &[
        "stringWithoutQuotes",
        "string without quotes",
        "\"unclosed string",
        "'string in single-quotes'",
    ];
    const TOKENS: &[&str] = &["%#", "%i", "%d", "%f", "%j", "%p", "%s", "%o", "%c"];

    fn full_match(template: &str) -> Regex {
        translate_placeholders(template).anchored().compile().unwrap()
    }

    fn other_tokens(token: &str) -> impl Iterator<Item = &'static str> + '_ {
        TOKENS.iter().copied().filter(move |t| *t != token)
    }

    #[test]
    fn test_escape_literal_escapes_meta() {
        assert_eq!(
            escape_literal("[brackets]and(parenthesis)").as_str(),
            r"\[brackets\]and\(parenthesis\)"
        );
        assert_eq!(escape_literal("^start|end$").as_str(), r"\^start\|end\$");
        assert_eq!(escape_literal(r"+{more}\").as_str(), r"\+\{more\}\\");
        assert_eq!(escape_literal("some-file.js").as_str(), r"some-file\.js");
    }

    #[test]
    fn test_escaped_literal_matches_only_itself() {
        let re = escape_literal("a.b*(c)").anchored().compile().unwrap();
        assert!(re.is_match("a.b*(c)"));
        assert!(!re.is_match("axbbb(c)"));
    }

    #[test]
    fn test_index_placeholder() {
        let re = full_match("%#");
        assert!(re.is_match("%#"));
        for ok in ["0", "1", "123908124"] {
            assert!(re.is_match(ok), "{ok}");
        }
        for bad in ["-1", "-0", "01", "", "1.5"].iter().chain(SPECIAL_NUMBERS) {
            assert!(!re.is_match(bad), "{bad}");
        }
        for other in other_tokens("%#") {
            assert!(!re.is_match(other), "{other}");
        }
    }

    #[test]
    fn test_integer_placeholder() {
        let re = full_match("%i");
        assert!(re.is_match("%i"));
        for ok in ["1", "-5", "0", "123908124", "-123908124"].iter().chain(SPECIAL_NUMBERS) {
            assert!(re.is_match(ok), "{ok}");
        }
        for bad in ["1.5", "-0", ""].iter().chain(DECIMALS).chain(JSON_OBJECTS).chain(JSON_ARRAYS).chain(JSON_STRINGS) {
            assert!(!re.is_match(bad), "{bad}");
        }
        for other in other_tokens("%i") {
            assert!(!re.is_match(other), "{other}");
        }
    }

    #[test]
    fn test_number_placeholders() {
        for token in ["%d", "%f"] {
            let re = full_match(token);
            assert!(re.is_match(token));
            for ok in ["1", "-1", "0", "-0", "1e+10"].iter().chain(SPECIAL_NUMBERS).chain(DECIMALS) {
                assert!(re.is_match(ok), "{token} {ok}");
            }
            for bad in ["", "--5", "--0.5", "1-"].iter().chain(JSON_OBJECTS).chain(INVALID_JSON) {
                assert!(!re.is_match(bad), "{token} {bad}");
            }
            for other in other_tokens(token) {
                assert!(!re.is_match(other), "{token} {other}");
            }
        }
    }

    #[test]
    fn test_json_placeholder() {
        let re = full_match("%j");
        assert!(re.is_match("%j"));
        for ok in ["1", "-0", "NaN", "[Circular]", "null"]
            .iter()
            .chain(JSON_OBJECTS)
            .chain(JSON_ARRAYS)
            .chain(JSON_STRINGS)
        {
            assert!(re.is_match(ok), "{ok}");
        }
        for bad in [""].iter().chain(INVALID_JSON) {
            assert!(!re.is_match(bad), "{bad}");
        }
        for other in other_tokens("%j") {
            assert!(!re.is_match(other), "{other}");
        }
    }

    #[test]
    fn test_wildcard_placeholders() {
        for token in ["%p", "%s", "%o"] {
            let re = full_match(token);
            for ok in ["", "anything at all", "%j", r#"{"key":"value"}"#] {
                assert!(re.is_match(ok), "{token} {ok}");
            }
        }
    }

    #[test]
    fn test_segment_placeholders_stay_inside_one_title() {
        let re = translate_segment_placeholders("each %s")
            .concat(&escape_literal("§"))
            .anchored()
            .compile()
            .unwrap();
        assert!(re.is_match("each x§"));
        assert!(re.is_match("each §"));
        assert!(!re.is_match("each x§§inner§"));
        assert!(!re.is_match("each x¶t¶§"));

        let re = translate_segment_placeholders("with %j").anchored().compile().unwrap();
        assert!(re.is_match(r#"with {"key":"value"}"#));
        assert!(!re.is_match(r#"with "a§b""#));

        // Runner names keep the unrestricted wildcard.
        assert!(full_match("each %s").is_match("each x§§inner"));
    }

    #[test]
    fn test_percent_and_unknown_tokens() {
        let re = full_match("100%% done");
        assert!(re.is_match("100% done"));
        assert!(!re.is_match("100%% done"));

        let re = full_match("%c and %");
        assert!(re.is_match("%c and %"));
        assert!(!re.is_match("x and %"));
    }

    #[test]
    fn test_template_escapes_surrounding_text() {
        let re = full_match("adds (%i + %i)");
        assert!(re.is_match("adds (1 + -2)"));
        assert!(re.is_match("adds (%i + %i)"));
        assert!(!re.is_match("adds 1 + 2"));
    }

    #[test]
    fn test_has_placeholders() {
        assert!(has_placeholders("foo (%i)"));
        assert!(has_placeholders("%s"));
        assert!(!has_placeholders("100%% done"));
        assert!(!has_placeholders("%c"));
        assert!(!has_placeholders("plain"));
    }

    #[test]
    fn test_join_escapes_separator() {
        let parts = [escape_literal("a"), escape_literal("b")];
        assert_eq!(PatternFragment::join(&parts, ".").as_str(), r"a\.b");
        assert_eq!(PatternFragment::alternation(&parts).as_str(), "a|b");
    }
}
