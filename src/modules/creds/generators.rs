//! Password candidate generators.
//!
//! Both generators are plain iterators over `String`. They are cheap to build,
//! so "restarting" one means constructing a fresh instance.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info};

use crate::config::DEFAULT_MAX_LENGTH;
use crate::error::{ProbeError, Result};
use crate::utils::read_lines;

/// Any lazy, finite stream of password candidates.
pub type Candidates = Box<dyn Iterator<Item = String> + Send>;

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

/// Character classes selected by an alphabet spec: `a` lowercase, `A`
/// uppercase, `0` digits, `.` punctuation, or `all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    pub lowercase: bool,
    pub uppercase: bool,
    pub digits: bool,
    pub punctuation: bool,
}

impl Charset {
    pub const ALL: Charset = Charset {
        lowercase: true,
        uppercase: true,
        digits: true,
        punctuation: true,
    };

    /// Characters in generation order: lowercase, uppercase, digits, punctuation.
    pub fn alphabet(&self) -> Vec<char> {
        let mut table = Vec::new();
        if self.lowercase {
            table.extend(LOWERCASE.chars());
        }
        if self.uppercase {
            table.extend(UPPERCASE.chars());
        }
        if self.digits {
            table.extend(DIGITS.chars());
        }
        if self.punctuation {
            table.extend(PUNCTUATION.chars());
        }
        table
    }
}

impl Default for Charset {
    fn default() -> Self {
        Charset::ALL
    }
}

impl FromStr for Charset {
    type Err = ProbeError;

    fn from_str(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.eq_ignore_ascii_case("all") {
            return Ok(Charset::ALL);
        }

        let mut charset = Charset {
            lowercase: false,
            uppercase: false,
            digits: false,
            punctuation: false,
        };
        for c in spec.chars() {
            match c {
                'a' => charset.lowercase = true,
                'A' => charset.uppercase = true,
                '0' => charset.digits = true,
                '.' => charset.punctuation = true,
                _ => return Err(ProbeError::InvalidCharset(spec.to_string())),
            }
        }
        if charset.alphabet().is_empty() {
            return Err(ProbeError::InvalidCharset(spec.to_string()));
        }
        Ok(charset)
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Charset::ALL {
            return f.write_str("all");
        }
        for (on, c) in [
            (self.lowercase, 'a'),
            (self.uppercase, 'A'),
            (self.digits, '0'),
            (self.punctuation, '.'),
        ] {
            if on {
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}

/// Every string over the alphabet, shortest first.
///
/// Lengths run from the starting length up to `max_length` inclusive; within
/// a length the last position varies fastest (base-N counting).
#[derive(Debug, Clone)]
pub struct ExhaustiveGenerator {
    alphabet: Vec<char>,
    indices: Vec<usize>,
    max_length: usize,
    done: bool,
}

impl ExhaustiveGenerator {
    pub fn new(length: usize, charset: Charset) -> Self {
        info!(
            "Alphanum generator started with length {} and charset {}",
            length, charset
        );
        let alphabet = charset.alphabet();
        Self {
            done: length > DEFAULT_MAX_LENGTH || (alphabet.is_empty() && length > 0),
            alphabet,
            indices: vec![0; length],
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    /// Overrides the length cap (default 8).
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self.done = self.indices.len() > max_length
            || (self.alphabet.is_empty() && !self.indices.is_empty());
        self
    }

    fn advance(&mut self) {
        let base = self.alphabet.len();
        for i in (0..self.indices.len()).rev() {
            self.indices[i] += 1;
            if self.indices[i] < base {
                return;
            }
            self.indices[i] = 0;
        }

        // Every combination of this length has been produced.
        let next_length = self.indices.len() + 1;
        if next_length > self.max_length || base == 0 {
            self.done = true;
        } else {
            self.indices = vec![0; next_length];
        }
    }
}

impl Iterator for ExhaustiveGenerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        let candidate: String = self.indices.iter().map(|&i| self.alphabet[i]).collect();
        self.advance();
        Some(candidate)
    }
}

fn toggle_case(c: char) -> char {
    if c.is_ascii_lowercase() {
        c.to_ascii_uppercase()
    } else {
        c.to_ascii_lowercase()
    }
}

/// All upper/lower variants of one word.
///
/// Only ASCII letters are varied. Each letter is either left as written or
/// case-toggled, leftmost letter varying slowest, so a word with `k` letters
/// yields exactly `2^k` distinct variants starting with the word itself.
#[derive(Debug, Clone)]
pub struct CaseVariants {
    chars: Vec<char>,
    letters: Vec<usize>,
    toggled: Vec<bool>,
    done: bool,
}

impl CaseVariants {
    pub fn new(word: &str) -> Self {
        let chars: Vec<char> = word.chars().collect();
        let letters: Vec<usize> = chars
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_ascii_alphabetic())
            .map(|(i, _)| i)
            .collect();
        Self {
            toggled: vec![false; letters.len()],
            chars,
            letters,
            done: false,
        }
    }
}

impl Iterator for CaseVariants {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }

        let mut variant = self.chars.clone();
        for (slot, &pos) in self.letters.iter().enumerate() {
            if self.toggled[slot] {
                variant[pos] = toggle_case(variant[pos]);
            }
        }

        // Binary increment, rightmost letter first.
        self.done = true;
        for flag in self.toggled.iter_mut().rev() {
            if *flag {
                *flag = false;
            } else {
                *flag = true;
                self.done = false;
                break;
            }
        }

        Some(variant.into_iter().collect())
    }
}

/// Case permutations of every dictionary word, in source order.
#[derive(Debug, Clone)]
pub struct DictionaryGenerator {
    words: std::vec::IntoIter<String>,
    current: Option<CaseVariants>,
}

impl DictionaryGenerator {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| {
                let w: String = w.into();
                w.trim_end_matches(['\r', '\n']).to_string()
            })
            .collect();
        info!("Generating case combinations from {} word(s)", words.len());
        Self {
            words: words.into_iter(),
            current: None,
        }
    }

    /// One word per line.
    pub fn from_file(path: &Path) -> Result<Self> {
        let words = read_lines(path)?;
        info!("Loaded dictionary {}", path.display());
        Ok(Self::new(words))
    }
}

impl Iterator for DictionaryGenerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(variant) = self.current.as_mut().and_then(|variants| variants.next()) {
                return Some(variant);
            }
            let word = self.words.next()?;
            debug!("Alternating between UPPER and lower case for {}", word);
            self.current = Some(CaseVariants::new(&word));
        }
    }
}
