//! Heading cleanup and semantic box wrapping for generated module HTML
//!
//! Removes doubled headings and redundant section numbers, then wraps the
//! recognizable pedagogical regions (objective, analogy, example, key points)
//! into the named containers the frontend styles. Regions are found by their
//! emoji/keyword markers and end at the next `<h2>`/`<h3>`, the next
//! `<div class=...>` or the end of the buffer.
//!
//! Every wrap step leaves a match alone when it already carries the target
//! class, so running the stage twice gives the same result.

use crate::document::{backtracking_regex, run_rules, RewriteError, Rule};
use regex::Regex;
use std::sync::LazyLock;

/// Container class of the pedagogical objective
pub const OBJECTIVE_CLASS: &str = "pedagogical-objective";
/// Container class of analogies
pub const ANALOGY_CLASS: &str = "analogy-box";
/// Container class of worked examples
pub const EXAMPLE_CLASS: &str = "example-box";
/// Container class of key-point summaries
pub const KEY_POINTS_CLASS: &str = "key-points-box";

// An <h2>/<h3> element up to its first closing tag.
static HEADING_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<h[23][^>]*>.*?</h[23]>").expect("HEADING_SPAN regex is valid")
});

static DECIMAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(<h[23][^>]*>)\s*\d+\.\d+\s+").expect("DECIMAL_PREFIX regex is valid")
});

static INTEGER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(<h[23][^>]*>)\s*\d+\s+").expect("INTEGER_PREFIX regex is valid")
});

static OBJECTIVE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:<div[^>]*>)?\s*(?:<h[23][^>]*>)?\s*🎯\s*Objectif[^<]*</h[23]>")
        .expect("OBJECTIVE_HEADING regex is valid")
});

// First <h2> whose remaining line is not about the objective.
static NEXT_UNRELATED_H2: LazyLock<fancy_regex::Regex> =
    LazyLock::new(|| backtracking_regex(r"<h2[^>]*>(?!.*Objectif)"));

static OBJECTIVE_INTRO: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
    backtracking_regex(r"(?is)(?:À la fin.*?:|vous serez capable[^:]*:)(.*?)(?=<h2|$)")
});

static TRIPLE_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("TRIPLE_NEWLINES regex is valid"));

const REGION_END: &str = r"(.*?)(?=<h[23]|<div class=|$)";

/// `marker` text directly inside a `<div>`; group 1 is the trailing content
fn bare_region(marker: &str) -> fancy_regex::Regex {
    backtracking_regex(&format!(
        r"(?is)<div[^>]*>\s*{marker}[^<]*</[^>]+>{REGION_END}"
    ))
}

/// `marker` in an `<h3>`/`<h4>` opening a `<div>`; group 1 is the trailing content
fn headed_region(marker: &str) -> fancy_regex::Regex {
    backtracking_regex(&format!(
        r"(?is)<div[^>]*>\s*<h[34][^>]*>{marker}[^<]*</h[34]>{REGION_END}"
    ))
}

static ANALOGY_BARE: LazyLock<fancy_regex::Regex> =
    LazyLock::new(|| bare_region(r"💡[^<]*L'analogie"));
static ANALOGY_HEADED: LazyLock<fancy_regex::Regex> =
    LazyLock::new(|| headed_region(r"💡[^<]*L'analogie"));
static EXAMPLE_BARE: LazyLock<fancy_regex::Regex> =
    LazyLock::new(|| bare_region(r"🎯\s*Exemple"));
static EXAMPLE_HEADED: LazyLock<fancy_regex::Regex> =
    LazyLock::new(|| headed_region(r"🎯\s*Exemple"));
static KEY_POINTS_BULB: LazyLock<fancy_regex::Regex> =
    LazyLock::new(|| bare_region(r"💡\s*À retenir"));
static KEY_POINTS_GEM: LazyLock<fancy_regex::Regex> =
    LazyLock::new(|| bare_region(r"💎\s*À retenir"));

/// Box-normalizer rules in application order
pub const RULES: &[Rule] = &[
    Rule {
        name: "dedupe-headings",
        description: "Collapse an <h2>/<h3> immediately repeated",
        apply: dedupe_headings,
    },
    Rule {
        name: "strip-heading-numbers",
        description: "Drop leading 'N.N ' or 'N ' from <h2>/<h3> text",
        apply: strip_heading_numbers,
    },
    Rule {
        name: "wrap-objective",
        description: "Rebuild the 🎯 Objectif section as a pedagogical-objective box",
        apply: wrap_objective,
    },
    Rule {
        name: "wrap-analogies",
        description: "Wrap 💡 L'analogie regions in analogy-box",
        apply: wrap_analogies,
    },
    Rule {
        name: "wrap-examples",
        description: "Wrap 🎯 Exemple regions in example-box",
        apply: wrap_examples,
    },
    Rule {
        name: "wrap-key-points",
        description: "Wrap 💡/💎 À retenir regions in key-points-box",
        apply: wrap_key_points,
    },
    Rule {
        name: "collapse-blank-lines",
        description: "Collapse 3+ newlines to 2 and trim the buffer",
        apply: collapse_blank_lines,
    },
];

/// Clean generated module HTML and wrap its semantic regions
pub fn normalize(html: &str) -> Result<String, RewriteError> {
    log::info!("Normalizing boxes in {} bytes of HTML", html.len());
    run_rules(html, RULES)
}

/// Drop the copy of a heading that follows itself, whitespace apart.
///
/// Scanning resumes after a removed copy, so three identical headings in a
/// row become two, as a single left-to-right substitution pass would leave them.
fn dedupe_headings(html: &str) -> Result<String, fancy_regex::Error> {
    let mut result = String::with_capacity(html.len());
    let mut copied_up_to = 0;
    let mut search_from = 0;

    while let Some(heading) = HEADING_SPAN.find_at(html, search_from) {
        let following = html[heading.end()..].trim_start();
        if following.starts_with(heading.as_str()) {
            let copy_end = html.len() - following.len() + heading.len();
            result.push_str(&html[copied_up_to..heading.end()]);
            copied_up_to = copy_end;
            search_from = copy_end;
        } else {
            search_from = heading.end();
        }
    }

    result.push_str(&html[copied_up_to..]);
    Ok(result)
}

fn strip_heading_numbers(html: &str) -> Result<String, fancy_regex::Error> {
    let html = DECIMAL_PREFIX.replace_all(html, "${1}");
    Ok(INTEGER_PREFIX.replace_all(&html, "${1}").into_owned())
}

fn wrap_objective(html: &str) -> Result<String, fancy_regex::Error> {
    let Some(heading) = OBJECTIVE_HEADING.find(html) else {
        return Ok(html.to_string());
    };
    let start = heading.start();

    let Some(next_h2) = NEXT_UNRELATED_H2.find(&html[start..])? else {
        log::debug!("objective heading has no following section, left as is");
        return Ok(html.to_string());
    };
    let end = start + next_h2.start();

    let block = &html[start..end];
    if block.contains(OBJECTIVE_CLASS) {
        return Ok(html.to_string());
    }

    let Some(intro) = OBJECTIVE_INTRO.captures(block)? else {
        log::debug!("objective section has no lead-in sentence, left as is");
        return Ok(html.to_string());
    };
    let content = intro.get(1).map_or("", |m| m.as_str()).trim();

    let wrapped = format!(
        "<div class=\"{OBJECTIVE_CLASS}\">\n  <h2>🎯 Objectif Pédagogique</h2>\n  <p>À la fin de ce module, vous serez capable :</p>\n  {content}\n</div>\n\n"
    );

    let mut result = String::with_capacity(html.len() + wrapped.len());
    result.push_str(&html[..start]);
    result.push_str(&wrapped);
    result.push_str(&html[end..]);
    Ok(result)
}

/// Replace every match of `pattern` with a `class` container holding
/// `heading` and the match's trailing content.
///
/// Matches are spliced right to left so earlier offsets stay valid.
fn wrap_regions(
    html: &str,
    pattern: &fancy_regex::Regex,
    class: &str,
    heading: &str,
) -> Result<String, fancy_regex::Error> {
    let mut regions = Vec::new();
    for caps in pattern.captures_iter(html) {
        let caps = caps?;
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.as_str().contains(class) {
            continue;
        }
        let content = caps.get(1).map_or("", |m| m.as_str()).trim();
        regions.push((whole.start()..whole.end(), content.to_string()));
    }

    let mut result = html.to_string();
    for (range, content) in regions.into_iter().rev() {
        let block = format!("<div class=\"{class}\">\n  <h3>{heading}</h3>\n  {content}\n</div>");
        result.replace_range(range, &block);
    }
    Ok(result)
}

fn wrap_analogies(html: &str) -> Result<String, fancy_regex::Error> {
    const HEADING: &str = "💡 L'analogie à retenir";
    let html = wrap_regions(html, &ANALOGY_BARE, ANALOGY_CLASS, HEADING)?;
    wrap_regions(&html, &ANALOGY_HEADED, ANALOGY_CLASS, HEADING)
}

fn wrap_examples(html: &str) -> Result<String, fancy_regex::Error> {
    const HEADING: &str = "🎯 Exemple";
    let html = wrap_regions(html, &EXAMPLE_BARE, EXAMPLE_CLASS, HEADING)?;
    wrap_regions(&html, &EXAMPLE_HEADED, EXAMPLE_CLASS, HEADING)
}

fn wrap_key_points(html: &str) -> Result<String, fancy_regex::Error> {
    const HEADING: &str = "💎 À retenir";
    let html = wrap_regions(html, &KEY_POINTS_BULB, KEY_POINTS_CLASS, HEADING)?;
    wrap_regions(&html, &KEY_POINTS_GEM, KEY_POINTS_CLASS, HEADING)
}

fn collapse_blank_lines(html: &str) -> Result<String, fancy_regex::Error> {
    Ok(TRIPLE_NEWLINES.replace_all(html, "\n\n").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBJECTIVE_MODULE: &str = "<h2 class=\"x\">🎯 Objectif du module</h2>\n\
        <p>À la fin de ce module, vous serez capable :</p>\n\
        <ul><li>Comprendre la BRVM</li></ul>\n\
        <h2 class=\"x\">🧩 Les marchés</h2>\n\
        <p>Texte</p>\n";

    #[test]
    fn test_identical_adjacent_headings_collapse() {
        let html = "<h3 class=\"t\">Titre</h3>\n<h3 class=\"t\">Titre</h3>\n<p>x</p>";
        let cleaned = normalize(html).unwrap();
        assert_eq!(cleaned.matches("<h3 class=\"t\">Titre</h3>").count(), 1);
        assert_eq!(cleaned, "<h3 class=\"t\">Titre</h3>\n<p>x</p>");
    }

    #[test]
    fn test_different_adjacent_headings_kept() {
        let html = "<h3>Titre</h3><h3>Autre</h3>";
        assert_eq!(dedupe_headings(html).unwrap(), html);
    }

    #[test]
    fn test_repeated_heading_across_blank_lines_collapses() {
        let html = "<h2>A</h2>\n\n  <h2>A</h2><p>x</p><h2>A</h2>";
        assert_eq!(dedupe_headings(html).unwrap(), "<h2>A</h2><p>x</p><h2>A</h2>");
    }

    #[test]
    fn test_three_identical_headings_become_two() {
        let html = "<h3>T</h3><h3>T</h3><h3>T</h3>";
        assert_eq!(dedupe_headings(html).unwrap(), "<h3>T</h3><h3>T</h3>");
    }

    #[test]
    fn test_long_module_is_cleaned() {
        let paragraph = "Le cours d'une action reflète l'offre et la demande. ".repeat(3);
        let mut html = String::new();
        for i in 0..2000 {
            html.push_str(&format!(
                "<h3 class=\"text-2xl font-bold text-gray-900 mb-4 mt-8\">Section {i}</h3>\n\
                 <p class=\"text-base mb-4 leading-relaxed text-gray-700\">{paragraph}</p>\n"
            ));
        }
        html.push_str("<h3>Conclusion</h3>\n<h3>Conclusion</h3>\n<p>Fin</p>");
        assert!(html.len() > 300_000);

        let cleaned = normalize(&html).unwrap();
        assert_eq!(cleaned.matches("<h3>Conclusion</h3>").count(), 1);
        assert_eq!(cleaned.matches("\">Section ").count(), 2000);
        assert!(cleaned.ends_with("<h3>Conclusion</h3>\n<p>Fin</p>"));
    }

    #[test]
    fn test_heading_numbers_stripped() {
        let html = "<h3 class=\"t\">1.1 Les actions</h3>\n<h2> 3 Les obligations</h2>\n<h4>2.1 Reste</h4>";
        assert_eq!(
            strip_heading_numbers(html).unwrap(),
            "<h3 class=\"t\">Les actions</h3>\n<h2>Les obligations</h2>\n<h4>2.1 Reste</h4>"
        );
    }

    #[test]
    fn test_emoji_before_number_is_kept() {
        let html = "<h3>🧩 1.1 Titre</h3>";
        assert_eq!(strip_heading_numbers(html).unwrap(), html);
    }

    #[test]
    fn test_objective_wrapped() {
        let cleaned = wrap_objective(OBJECTIVE_MODULE).unwrap();
        assert!(cleaned.starts_with(
            "<div class=\"pedagogical-objective\">\n  <h2>🎯 Objectif Pédagogique</h2>\n  <p>À la fin de ce module, vous serez capable :</p>\n"
        ));
        assert!(cleaned.contains("<ul><li>Comprendre la BRVM</li></ul>\n</div>\n\n<h2 class=\"x\">🧩 Les marchés</h2>"));
        assert!(!cleaned.contains("Objectif du module"));
    }

    #[test]
    fn test_objective_without_following_section_untouched() {
        let html = "<h2>🎯 Objectif</h2>\n<p>À la fin de ce module, vous saurez :</p>\n<p>Lire</p>";
        assert_eq!(wrap_objective(html).unwrap(), html);
    }

    #[test]
    fn test_objective_without_lead_in_untouched() {
        let html = "<h2>🎯 Objectif</h2>\n<p>Rien ici</p>\n<h2>Suite</h2>";
        assert_eq!(wrap_objective(html).unwrap(), html);
    }

    #[test]
    fn test_bare_analogy_wrapped() {
        let html = "<div class=\"x\">💡 L'analogie : la bourse</div><p>Comme un marché.</p>\n<h2>Suite</h2>";
        assert_eq!(
            wrap_analogies(html).unwrap(),
            "<div class=\"analogy-box\">\n  <h3>💡 L'analogie à retenir</h3>\n  <p>Comme un marché.</p>\n</div><h2>Suite</h2>"
        );
    }

    #[test]
    fn test_headed_analogy_wrapped() {
        let html = "<div class=\"bg-amber-50\"><h4 class=\"y\">💡 L'analogie à retenir</h4><p>Comme un marché</p></div>\n<h3>Suite</h3>";
        let cleaned = wrap_analogies(html).unwrap();
        assert!(cleaned.starts_with(
            "<div class=\"analogy-box\">\n  <h3>💡 L'analogie à retenir</h3>\n  <p>Comme un marché</p>"
        ));
        assert!(cleaned.ends_with("<h3>Suite</h3>"));
    }

    #[test]
    fn test_several_examples_wrapped() {
        let html = "<div>🎯 Exemple 1</div><p>Un</p><div class=\"a\">🎯 Exemple 2</div><p>Deux</p>";
        let cleaned = wrap_examples(html).unwrap();
        assert_eq!(cleaned.matches("<div class=\"example-box\">").count(), 2);
        let one = cleaned.find("<p>Un</p>").unwrap();
        let two = cleaned.find("<p>Deux</p>").unwrap();
        assert!(one < two);
    }

    #[test]
    fn test_key_points_both_markers() {
        let html = "<div>💡 À retenir</div><p>A</p><h3>x</h3><div>💎 À retenir</div><p>B</p>";
        let cleaned = wrap_key_points(html).unwrap();
        assert_eq!(cleaned.matches("<div class=\"key-points-box\">").count(), 2);
        assert_eq!(cleaned.matches("<h3>💎 À retenir</h3>").count(), 2);
    }

    #[test]
    fn test_markers_are_case_insensitive() {
        let html = "<div>🎯 EXEMPLE concret</div><p>Un</p>";
        assert!(wrap_examples(html).unwrap().contains("example-box"));
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let html = format!(
            "{}<div class=\"x\">💡 L'analogie : la bourse</div><p>Comme un marché.</p>\n\
             <h3>1.1 Les actions</h3>\n<h3>1.1 Les actions</h3>\n\
             <div>💎 À retenir</div><p>Diversifier</p>\n<h2>Fin</h2>",
            OBJECTIVE_MODULE
        );
        let once = normalize(&html).unwrap();
        assert!(once.contains(OBJECTIVE_CLASS));
        assert!(once.contains(ANALOGY_CLASS));
        assert!(once.contains(KEY_POINTS_CLASS));
        assert_eq!(once.matches("Les actions</h3>").count(), 1);

        let twice = normalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_blank_lines_collapsed_and_trimmed() {
        let html = "\n\n<p>a</p>\n\n\n\n<p>b</p>\n\n\n";
        assert_eq!(collapse_blank_lines(html).unwrap(), "<p>a</p>\n\n<p>b</p>");
    }
}
