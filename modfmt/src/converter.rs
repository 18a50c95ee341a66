//! Plain-text module to styled HTML
//!
//! Recognizes the lightweight conventions used when modules are drafted as
//! plain text:
//! - `$$ ... $$` formula blocks (may span lines)
//! - lines starting with `🎯` (main title, `<h2>`)
//! - numbered lines such as `1.2 Les marchés` (section, `<h3>`)
//! - lines ending in a colon (sub-section, `<h4>`)
//! - lines starting with `•` (bullet list items)
//!
//! Everything else becomes a paragraph. Output uses the Tailwind utility
//! classes the frontend expected before class normalization.

use crate::document::{run_rules, RewriteError, Rule};
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

/// Bullet character opening a list item
pub const BULLET: char = '•';

const FORMULA_OPEN: &str = concat!(
    r#"<div class="my-6 p-4 bg-blue-50 border-2 border-blue-200 rounded-lg overflow-x-auto">"#,
    r#"<div class="text-center font-mono text-base text-gray-800">"#
);
const FORMULA_CLOSE: &str = "</div></div>";
const MAIN_TITLE: &str = r#"<h2 class="text-3xl font-bold text-gray-900 mb-6">${1}</h2>"#;
const SECTION_TITLE: &str = r#"<h3 class="text-2xl font-bold text-gray-900 mb-4 mt-8">${1}</h3>"#;
const SUB_SECTION_TITLE: &str = r#"<h4 class="text-xl font-bold text-gray-800 mb-3 mt-6">${1}</h4>"#;
const LIST_OPEN: &str = r#"<ul class="list-disc ml-6 mb-4 space-y-2">"#;
const LIST_CLOSE: &str = "</ul>";

static FORMULA_BLOCK: LazyLock<String> =
    LazyLock::new(|| format!("{FORMULA_OPEN}${{1}}{FORMULA_CLOSE}"));

static FORMULA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\$(.*?)\$\$").expect("FORMULA regex is valid"));

// An emitted formula container, possibly spanning lines.
static FORMULA_CONTAINER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "(?s){}.*?{}",
        regex::escape(FORMULA_OPEN),
        regex::escape(FORMULA_CLOSE)
    ))
    .expect("FORMULA_CONTAINER regex is valid")
});

static MAIN_TITLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(🎯.*?)$").expect("MAIN_TITLE_LINE regex is valid"));

// Horizontal whitespace only: a section number never swallows the next line.
static NUMBERED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([\d.]+[ \t]+.+?)$").expect("NUMBERED_LINE regex is valid")
});

static COLON_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(.*?)[ \t]*:[ \t]*$").expect("COLON_LINE regex is valid")
});

/// Converter rules in application order
pub const RULES: &[Rule] = &[
    Rule {
        name: "formula-blocks",
        description: "Wrap $$...$$ formulas in a styled container",
        apply: formula_blocks,
    },
    Rule {
        name: "main-titles",
        description: "Lines starting with 🎯 become <h2>",
        apply: main_titles,
    },
    Rule {
        name: "numbered-sections",
        description: "Lines like '1.2 Title' become <h3>",
        apply: numbered_sections,
    },
    Rule {
        name: "colon-sub-sections",
        description: "Lines ending in ':' become <h4> without the colon",
        apply: colon_sub_sections,
    },
    Rule {
        name: "lists-and-paragraphs",
        description: "Group • lines into <ul>, wrap other text lines in <p>",
        apply: lists_and_paragraphs,
    },
];

/// Convert a plain-text module into HTML
pub fn convert(text: &str) -> Result<String, RewriteError> {
    log::info!("Converting {} bytes of text to HTML", text.len());
    run_rules(text, RULES)
}

fn formula_blocks(text: &str) -> Result<String, fancy_regex::Error> {
    Ok(FORMULA.replace_all(text, FORMULA_BLOCK.as_str()).into_owned())
}

fn main_titles(text: &str) -> Result<String, fancy_regex::Error> {
    Ok(rewrite_outside_formulas(text, &MAIN_TITLE_LINE, MAIN_TITLE))
}

fn numbered_sections(text: &str) -> Result<String, fancy_regex::Error> {
    Ok(rewrite_outside_formulas(text, &NUMBERED_LINE, SECTION_TITLE))
}

fn colon_sub_sections(text: &str) -> Result<String, fancy_regex::Error> {
    Ok(rewrite_outside_formulas(text, &COLON_LINE, SUB_SECTION_TITLE))
}

/// Replace matches of a line pattern, except those that start or end inside
/// a formula container. A match holding a whole container is rewritten.
fn rewrite_outside_formulas(text: &str, re: &Regex, template: &str) -> String {
    let formulas: Vec<Range<usize>> = FORMULA_CONTAINER
        .find_iter(text)
        .map(|m| m.range())
        .collect();

    re.replace_all(text, |caps: &Captures| {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        let cuts_formula = formulas.iter().any(|formula| {
            let overlaps = whole.start < formula.end && formula.start < whole.end;
            let encloses = whole.start <= formula.start && formula.end <= whole.end;
            overlaps && !encloses
        });

        let mut replacement = String::new();
        if cuts_formula {
            replacement.push_str(&caps[0]);
        } else {
            caps.expand(template, &mut replacement);
        }
        replacement
    })
    .into_owned()
}

/// Whether `line` leaves a formula container open at its end
fn opens_formula(line: &str) -> bool {
    match (line.rfind(FORMULA_OPEN), line.rfind(FORMULA_CLOSE)) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Line pass: bullet runs become one list, bare text becomes paragraphs,
/// lines that already start with markup pass through, blank lines vanish.
/// Lines inside a formula container are kept as they are.
fn lists_and_paragraphs(text: &str) -> Result<String, fancy_regex::Error> {
    let mut html_lines: Vec<String> = Vec::new();
    let mut in_list = false;
    let mut in_formula = false;

    for line in text.split('\n') {
        if in_formula {
            if line.contains(FORMULA_CLOSE) {
                html_lines.push(line.trim_end().to_string());
                in_formula = opens_formula(line);
            } else {
                html_lines.push(line.to_string());
            }
            continue;
        }

        let stripped = line.trim();

        if opens_formula(stripped) {
            if in_list {
                html_lines.push(LIST_CLOSE.to_string());
                in_list = false;
            }
            html_lines.push(line.trim_start().to_string());
            in_formula = true;
            continue;
        }

        if let Some(item) = stripped.strip_prefix(BULLET) {
            if !in_list {
                html_lines.push(LIST_OPEN.to_string());
                in_list = true;
            }
            html_lines.push(format!(
                r#"  <li class="text-base text-gray-700 leading-relaxed">{}</li>"#,
                item.trim()
            ));
            continue;
        }

        if in_list {
            html_lines.push(LIST_CLOSE.to_string());
            in_list = false;
        }

        if stripped.starts_with('<') {
            html_lines.push(stripped.to_string());
        } else if !stripped.is_empty() {
            html_lines.push(format!(
                r#"<p class="text-base mb-4 leading-relaxed text-gray-700">{}</p>"#,
                stripped
            ));
        }
    }

    if in_list {
        html_lines.push(LIST_CLOSE.to_string());
    }

    Ok(html_lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_title_and_paragraph() {
        let html = convert("🎯 Objectif du module\nCe module explique les bases.\n").unwrap();
        assert_eq!(
            html,
            "<h2 class=\"text-3xl font-bold text-gray-900 mb-6\">🎯 Objectif du module</h2>\n\
             <p class=\"text-base mb-4 leading-relaxed text-gray-700\">Ce module explique les bases.</p>"
        );
    }

    #[test]
    fn test_bullets_form_one_list() {
        let html = convert("• Premier point\n• Deuxième point\n").unwrap();
        assert_eq!(html.matches("<ul").count(), 1);
        assert_eq!(html.matches("<li").count(), 2);
        let first = html.find("Premier point").unwrap();
        let second = html.find("Deuxième point").unwrap();
        assert!(first < second);
        assert!(html.ends_with("</ul>"));
    }

    #[test]
    fn test_formula_spanning_lines_kept_verbatim() {
        let html = formula_blocks("Avant $$P = \\frac{D}{r}\n + g$$ après").unwrap();
        assert_eq!(html.matches("font-mono").count(), 1);
        assert!(html.contains(
            "<div class=\"text-center font-mono text-base text-gray-800\">P = \\frac{D}{r}\n + g</div></div>"
        ));
        assert!(!html.contains("$$"));
    }

    #[test]
    fn test_multiline_formula_survives_conversion() {
        let html = convert("$$P = \\frac{D}{r}\n + g$$\n").unwrap();
        assert_eq!(html, format!("{FORMULA_OPEN}P = \\frac{{D}}{{r}}\n + g{FORMULA_CLOSE}"));
    }

    #[test]
    fn test_formula_lines_are_not_headings_or_paragraphs() {
        let text = "Intro\n$$\n1.5 x\nsoit :\n\n  y = 2\n$$\n• point";
        let html = convert(text).unwrap();

        let inner = "\n1.5 x\nsoit :\n\n  y = 2\n";
        assert!(html.contains(&format!("{FORMULA_OPEN}{inner}{FORMULA_CLOSE}")));
        assert!(!html.contains("<h3"));
        assert!(!html.contains("<h4"));
        assert_eq!(html.matches("<p ").count(), 1);
        assert!(html.ends_with("</ul>"));
    }

    #[test]
    fn test_numbered_line_becomes_h3() {
        let html = numbered_sections("1.2 Les marchés financiers\nTexte").unwrap();
        assert_eq!(
            html,
            "<h3 class=\"text-2xl font-bold text-gray-900 mb-4 mt-8\">1.2 Les marchés financiers</h3>\nTexte"
        );
    }

    #[test]
    fn test_number_without_title_stays_text() {
        assert_eq!(numbered_sections("2024\nBonjour").unwrap(), "2024\nBonjour");
    }

    #[test]
    fn test_colon_line_becomes_h4_without_colon() {
        let html = colon_sub_sections("Les avantages :  \nsuite").unwrap();
        assert_eq!(
            html,
            "<h4 class=\"text-xl font-bold text-gray-800 mb-3 mt-6\">Les avantages</h4>\nsuite"
        );
    }

    #[test]
    fn test_colon_inside_line_is_not_a_heading() {
        assert_eq!(
            colon_sub_sections("Note : voir plus bas").unwrap(),
            "Note : voir plus bas"
        );
    }

    #[test]
    fn test_text_line_closes_open_list() {
        let html = lists_and_paragraphs("• a\nfin\n• b").unwrap();
        let lines: Vec<&str> = html.lines().collect();
        assert_eq!(lines[0], LIST_OPEN);
        assert_eq!(lines[2], LIST_CLOSE);
        assert!(lines[3].starts_with("<p "));
        assert_eq!(lines[4], LIST_OPEN);
        assert_eq!(lines[6], LIST_CLOSE);
    }

    #[test]
    fn test_markup_lines_pass_through_and_blank_lines_drop() {
        let html = lists_and_paragraphs("  <h2>Titre</h2>\n\n\nTexte").unwrap();
        assert_eq!(
            html,
            "<h2>Titre</h2>\n<p class=\"text-base mb-4 leading-relaxed text-gray-700\">Texte</p>"
        );
    }

    #[test]
    fn test_bullet_whitespace_stripped() {
        let html = lists_and_paragraphs("   •    Indice BRVM   ").unwrap();
        assert!(html.contains(">Indice BRVM</li>"));
    }

    #[test]
    fn test_title_ending_in_colon_stays_h2() {
        let html = convert("🎯 Objectif :\n").unwrap();
        assert!(html.starts_with("<h2 "));
        assert!(!html.contains("<h4"));
    }
}
