//! Text synthesis for generated pages: ids, titles, prompts and descriptions.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::slug::slugify;

use super::wordpool::DescriptionPools;

/// Placeholder replaced by the scene inside description pool lines.
pub const SCENE_PLACEHOLDER: &str = "{scene}";

/// Used when every description sentence cleans to nothing.
const FALLBACK_DESCRIPTION: &str = "Free printable coloring page.";

/// The three pool picks that make up one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parts {
    pub character: String,
    pub action: String,
    pub environment: String,
}

impl Parts {
    pub fn new(
        character: impl Into<String>,
        action: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            character: character.into(),
            action: action.into(),
            environment: environment.into(),
        }
    }

    /// Full scene text, articles kept.
    pub fn scene(&self) -> String {
        collapse_whitespace(&format!(
            "{} {} {}",
            self.character, self.action, self.environment
        ))
    }

    /// Scene text with the character's leading article removed.
    fn bare_scene(&self) -> String {
        collapse_whitespace(&format!(
            "{} {} {}",
            strip_leading_article(&self.character),
            self.action,
            self.environment
        ))
    }
}

/// Sentence slots of a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind {
    Intro,
    Usage,
    Ease,
    Benefit,
}

use SentenceKind::{Benefit, Ease, Intro, Usage};

/// Every ordering opens with the intro sentence.
pub const ORDERINGS: [[SentenceKind; 4]; 6] = [
    [Intro, Usage, Ease, Benefit],
    [Intro, Usage, Benefit, Ease],
    [Intro, Ease, Usage, Benefit],
    [Intro, Ease, Benefit, Usage],
    [Intro, Benefit, Usage, Ease],
    [Intro, Benefit, Ease, Usage],
];

/// Turn every whitespace run into one space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop a leading `a`, `an` or `the` (any case) followed by whitespace.
pub fn strip_leading_article(s: &str) -> &str {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((first, rest)) if ["a", "an", "the"].contains(&first.to_lowercase().as_str()) => {
            rest.trim()
        }
        _ => s,
    }
}

/// Lowercase, then uppercase the first letter of every word.
pub fn format_title(s: &str) -> String {
    collapse_whitespace(s)
        .split(' ')
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn build_title(parts: &Parts) -> String {
    format!(
        "Free Printable {} Coloring Page for Kids",
        format_title(&parts.bare_scene())
    )
}

pub fn build_id(parts: &Parts) -> String {
    slugify(&format!("{} coloring page", parts.bare_scene()))
}

/// Prompt sent to the image API. `style` loses its trailing dots.
pub fn build_prompt(parts: &Parts, style: &str) -> String {
    format!(
        "Coloring page on white background, {}, {}.",
        parts.scene(),
        style.trim().trim_end_matches('.')
    )
}

/// Collapse whitespace, trim spaces and commas, end with a period.
/// Blank input stays blank.
pub fn clean_sentence(s: &str) -> String {
    let collapsed = collapse_whitespace(s);
    let trimmed = collapsed.trim_matches([' ', ',']);
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.ends_with('.') {
        trimmed.to_string()
    } else {
        format!("{trimmed}.")
    }
}

/// Compose a description from one random line per pool in a random ordering.
///
/// The result always ends with `.` and never contains doubled whitespace.
pub fn build_description<R: Rng + ?Sized>(
    parts: &Parts,
    pools: &DescriptionPools,
    rng: &mut R,
) -> String {
    let scene = parts.scene();
    let ordering = ORDERINGS.choose(&mut *rng).unwrap_or(&ORDERINGS[0]);

    let sentences: Vec<String> = ordering
        .iter()
        .filter_map(|kind| pools.pool(*kind).choose(&mut *rng))
        .map(|line| clean_sentence(&line.replace(SCENE_PLACEHOLDER, &scene)))
        .filter(|s| !s.is_empty())
        .collect();

    if !sentences.is_empty() {
        return sentences.join(" ");
    }
    match clean_sentence(&scene) {
        s if s.is_empty() => FALLBACK_DESCRIPTION.to_string(),
        s => s,
    }
}
