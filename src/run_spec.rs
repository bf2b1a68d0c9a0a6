use std::fmt;

use jtr_replay::{ErrorKind, ReplayError, ReplayResult};
use log::debug;

/// `<name-pattern> [extra args]` as given to `--run`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSpec {
    pub pattern: String,
    pub extra_args: String,
}

impl RunSpec {
    pub fn parse(spec: &str) -> ReplayResult<Self> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(ReplayError::new(ErrorKind::Selection, "empty run spec"));
        }
        let (pattern, extra) = match trimmed.split_once(char::is_whitespace) {
            Some((pattern, extra)) => (pattern, extra.trim()),
            None => (trimmed, ""),
        };
        Ok(Self {
            pattern: pattern.to_string(),
            extra_args: extra.to_string(),
        })
    }

    pub fn parse_all<S: AsRef<str>>(specs: &[S]) -> ReplayResult<Vec<Self>> {
        specs.iter().map(|spec| Self::parse(spec.as_ref())).collect()
    }
}

impl fmt::Display for RunSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.extra_args.is_empty() {
            write!(f, "{}", self.pattern)
        } else {
            write!(f, "\"{} {}\"", self.pattern, self.extra_args)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariantMode {
    /// Variant `i` uses only the `i`-th bracket value.
    Cycle,
    /// Variant `i` uses the first `i` bracket values, comma-joined.
    Sequence,
}

impl VariantMode {
    pub fn from_flags(cycle: bool, sequence: bool) -> ReplayResult<Option<Self>> {
        match (cycle, sequence) {
            (true, true) => Err(ReplayError::new(
                ErrorKind::Selection,
                "--run-arg-cycle and --run-arg-seq cannot be used together.",
            )),
            (true, false) => Ok(Some(VariantMode::Cycle)),
            (false, true) => Ok(Some(VariantMode::Sequence)),
            (false, false) => Ok(None),
        }
    }

    pub fn flag(self) -> &'static str {
        match self {
            VariantMode::Cycle => "--run-arg-cycle",
            VariantMode::Sequence => "--run-arg-seq",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VariantMode::Cycle => "Cycling",
            VariantMode::Sequence => "Sequencing",
        }
    }
}

/// `prefix[v1,v2,...]suffix` found in one of the `--run` strings.
#[derive(Clone, Debug, PartialEq, Eq)]
struct BracketGroup<'a> {
    prefix: &'a str,
    values: Vec<&'a str>,
    suffix: &'a str,
}

impl BracketGroup<'_> {
    fn render(&self, mode: VariantMode, idx: usize) -> String {
        let values = match mode {
            VariantMode::Cycle => self.values[idx].to_string(),
            VariantMode::Sequence => self.values[..=idx].join(","),
        };
        format!("{}{}{}", self.prefix, values, self.suffix)
    }
}

/// The rightmost `[` that is closed by a later `]` with something in between.
fn find_bracket(spec: &str) -> Option<BracketGroup<'_>> {
    for (open, _) in spec.rmatch_indices('[') {
        let inside = &spec[open + 1..];
        let Some(first) = inside.chars().next() else {
            continue;
        };
        let first_len = first.len_utf8();
        if let Some(close) = inside[first_len..].find(']') {
            let close = first_len + close;
            return Some(BracketGroup {
                prefix: &spec[..open],
                values: inside[..close].split(',').map(str::trim).collect(),
                suffix: &inside[close + 1..],
            });
        }
    }
    None
}

/// Expand the `--run` strings into one list per variant.
///
/// Returns `None` when no string carries a bracket group. More than one bracketed
/// string is an error.
pub fn expand_variants(specs: &[String], mode: VariantMode) -> ReplayResult<Option<Vec<Vec<String>>>> {
    let mut found: Option<(usize, BracketGroup<'_>)> = None;
    for (idx, spec) in specs.iter().enumerate() {
        if let Some(group) = find_bracket(spec) {
            if found.is_some() {
                return Err(ReplayError::new(
                    ErrorKind::Selection,
                    "Multiple command specs with [...] syntax found. Only one is supported.",
                ));
            }
            found = Some((idx, group));
        }
    }

    let Some((position, group)) = found else {
        return Ok(None);
    };
    debug!(
        "select event=variants mode={:?} count={}",
        mode,
        group.values.len()
    );

    let variants = (0..group.values.len())
        .map(|idx| {
            let mut current = specs.to_vec();
            current[position] = group.render(mode, idx);
            current
        })
        .collect();
    Ok(Some(variants))
}
