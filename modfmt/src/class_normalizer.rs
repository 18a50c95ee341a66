//! Tailwind utility classes to the frontend's semantic vocabulary
//!
//! Modules written before the stylesheet existed carry inline Tailwind
//! classes on every element. This stage strips them and maps the decorated
//! containers onto `pedagogical-objective`, `analogy-box`, `example-box` and
//! `key-points-box`. Several rules assume the earlier ones already ran (for
//! instance the bold pass expects bare `<h2>` tags), so order matters.

use crate::document::{backtracking_regex, replace_all_backtracking, run_rules, RewriteError, Rule};
use regex::Regex;
use std::sync::LazyLock;

/// Paragraph class left untouched: the centered opening quote of a module
pub const QUOTE_CLASS: &str = "text-xl italic mb-12 text-center text-gray-700";

/// Emoji that open a section title worth setting in bold
pub const SECTION_MARKERS: &[&str] = &[
    "🪶", "🧩", "🌍", "🗺️", "💥", "🏛️", "🔁", "🚀", "🧠", "📊", "💼", "🎯", "⚙️", "🔍", "📈",
];

static WRAPPER_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div class="space-y-8">\s*"#).expect("WRAPPER_OPEN regex is valid")
});
static TRAILING_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*</div>\s*\z").expect("TRAILING_CLOSE regex is valid"));

static OBJECTIVE_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<div class="bg-gradient-to-r from-(?:indigo|blue)-\d+ to-(?:purple|indigo)-\d+ text-white p-\d+ rounded-xl">\s*<h2[^>]*>🎯[^<]*</h2>"#,
    )
    .expect("OBJECTIVE_BANNER regex is valid")
});

static ANALOGY_BOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<div class="bg-(?:amber|orange|yellow)-50[^"]*border(?:-\d+)?\s+border-(?:amber|orange|yellow)-\d+[^"]*">"#,
    )
    .expect("ANALOGY_BOX regex is valid")
});
static EXAMPLE_BOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<div class="bg-(?:orange|purple|pink)-50[^"]*border(?:-\d+)?\s+border-(?:orange|purple|pink)-\d+[^"]*">"#,
    )
    .expect("EXAMPLE_BOX regex is valid")
});
static KEY_POINTS_BOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<div class="bg-(?:blue|green|emerald)-50[^"]*border(?:-l-)?\d+\s+border-(?:blue|green|emerald)-\d+[^"]*">"#,
    )
    .expect("KEY_POINTS_BOX regex is valid")
});

static SECTION_DIVIDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<div class="border-l-4 border-(?:blue|green|purple|orange|red)-\d+ pl-\d+ py-\d+">\s*"#,
    )
    .expect("SECTION_DIVIDER regex is valid")
});

static CLASSED_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(h[234]) class="[^"]*">"#).expect("CLASSED_HEADING regex is valid")
});

static ITALIC_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<p class="[^"]*italic[^"]*">"#).expect("ITALIC_PARAGRAPH regex is valid")
});
static EMPHASIS_CLOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</p>(\s*</(?:em|blockquote)>)").expect("EMPHASIS_CLOSE regex is valid")
});
static CLASSED_PARAGRAPH: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
    backtracking_regex(&format!(r#"<p class="(?!{QUOTE_CLASS})[^"]*">"#))
});

static CLASSED_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(ul|ol|li) class="[^"]*">"#).expect("CLASSED_LIST regex is valid")
});
static CLASSED_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(table|thead|tbody|tr|td|th) class="[^"]*">"#)
        .expect("CLASSED_TABLE regex is valid")
});

static NEXT_STEP_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<div class="bg-gradient-to-r from-(?:blue|indigo)-\d+ to-(?:blue|indigo)-\d+ text-white p-\d+ rounded-xl">\s*<h3[^>]*>🧭[^<]*</h3>"#,
    )
    .expect("NEXT_STEP_BANNER regex is valid")
});

static KEY_TERMS_PANEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<div class="bg-gray-100 rounded-xl p-\d+">\s*<h2[^>]*>🧠 Les termes à maîtriser</h2>"#,
    )
    .expect("KEY_TERMS_PANEL regex is valid")
});

static SECTION_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    let markers: Vec<String> = SECTION_MARKERS.iter().map(|m| regex::escape(m)).collect();
    Regex::new(&format!(r"(?s)<h2>((?:{}).*?)</h2>", markers.join("|")))
        .expect("SECTION_TITLE regex is valid")
});

static TABLE_SCROLL_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div class="overflow-x-auto">\s*<table"#)
        .expect("TABLE_SCROLL_OPEN regex is valid")
});
static TABLE_SCROLL_CLOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</table>\s*</div>").expect("TABLE_SCROLL_CLOSE regex is valid")
});

static BLANK_LINE_RUNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\s*\n\s*\n+").expect("BLANK_LINE_RUNS regex is valid")
});

/// Class-normalizer rules in application order
pub const RULES: &[Rule] = &[
    Rule {
        name: "strip-outer-wrapper",
        description: "Remove the space-y-8 wrapper div and its closing tag",
        apply: strip_outer_wrapper,
    },
    Rule {
        name: "objective-banner",
        description: "Gradient banner + 🎯 <h2> become the pedagogical-objective box",
        apply: objective_banner,
    },
    Rule {
        name: "colored-boxes",
        description: "Tinted bordered divs become analogy/example/key-points boxes",
        apply: colored_boxes,
    },
    Rule {
        name: "strip-section-dividers",
        description: "Drop border-l-4 section divider openings",
        apply: strip_section_dividers,
    },
    Rule {
        name: "bare-headings",
        description: "Remove class attributes from <h2>-<h4>",
        apply: bare_headings,
    },
    Rule {
        name: "paragraphs",
        description: "Italic paragraphs become <p><em>, other paragraph classes removed",
        apply: paragraphs,
    },
    Rule {
        name: "bare-lists-and-tables",
        description: "Remove class attributes from list and table elements",
        apply: bare_lists_and_tables,
    },
    Rule {
        name: "next-step-banner",
        description: "Gradient 🧭 banner becomes a plain 'Prochaine étape' <h3>",
        apply: next_step_banner,
    },
    Rule {
        name: "key-terms-panel",
        description: "Gray 🧠 key-terms panel becomes a plain <h2>",
        apply: key_terms_panel,
    },
    Rule {
        name: "bold-section-titles",
        description: "Set emoji-led <h2> titles in <strong>",
        apply: bold_section_titles,
    },
    Rule {
        name: "unwrap-table-scroll",
        description: "Remove overflow-x-auto divs around tables",
        apply: unwrap_table_scroll,
    },
    Rule {
        name: "collapse-blank-lines",
        description: "Collapse runs of blank lines to one and trim the buffer",
        apply: collapse_blank_lines,
    },
];

/// Rewrite inline utility classes into the semantic class vocabulary
pub fn normalize(html: &str) -> Result<String, RewriteError> {
    log::info!("Normalizing classes in {} bytes of HTML", html.len());
    run_rules(html, RULES)
}

/// The trailing `</div>` only belongs to the wrapper, so it goes only when
/// a wrapper opening was removed.
fn strip_outer_wrapper(html: &str) -> Result<String, fancy_regex::Error> {
    if !WRAPPER_OPEN.is_match(html) {
        return Ok(html.to_string());
    }
    let html = WRAPPER_OPEN.replace_all(html, "");
    Ok(TRAILING_CLOSE.replace(&html, "").into_owned())
}

fn objective_banner(html: &str) -> Result<String, fancy_regex::Error> {
    Ok(OBJECTIVE_BANNER
        .replace_all(
            html,
            "<div class=\"pedagogical-objective\">\n<h2>🎯 Objectif pédagogique</h2>",
        )
        .into_owned())
}

fn colored_boxes(html: &str) -> Result<String, fancy_regex::Error> {
    let html = ANALOGY_BOX.replace_all(html, r#"<div class="analogy-box">"#);
    let html = EXAMPLE_BOX.replace_all(&html, r#"<div class="example-box">"#);
    Ok(KEY_POINTS_BOX
        .replace_all(&html, r#"<div class="key-points-box">"#)
        .into_owned())
}

fn strip_section_dividers(html: &str) -> Result<String, fancy_regex::Error> {
    Ok(SECTION_DIVIDER.replace_all(html, "").into_owned())
}

fn bare_headings(html: &str) -> Result<String, fancy_regex::Error> {
    Ok(CLASSED_HEADING.replace_all(html, "<${1}>").into_owned())
}

fn paragraphs(html: &str) -> Result<String, fancy_regex::Error> {
    let html = ITALIC_PARAGRAPH.replace_all(html, "<p><em>");
    let html = EMPHASIS_CLOSE.replace_all(&html, "</em></p>${1}");
    replace_all_backtracking(&CLASSED_PARAGRAPH, &html, "<p>")
}

fn bare_lists_and_tables(html: &str) -> Result<String, fancy_regex::Error> {
    let html = CLASSED_LIST.replace_all(html, "<${1}>");
    Ok(CLASSED_TABLE.replace_all(&html, "<${1}>").into_owned())
}

fn next_step_banner(html: &str) -> Result<String, fancy_regex::Error> {
    Ok(NEXT_STEP_BANNER
        .replace_all(html, "<h3>🚀 Prochaine étape</h3>")
        .into_owned())
}

fn key_terms_panel(html: &str) -> Result<String, fancy_regex::Error> {
    Ok(KEY_TERMS_PANEL
        .replace_all(html, "<h2>🧩 Les termes à maîtriser</h2>")
        .into_owned())
}

/// Opening and closing `<strong>` are inserted around the same heading text.
fn bold_section_titles(html: &str) -> Result<String, fancy_regex::Error> {
    Ok(SECTION_TITLE
        .replace_all(html, "<h2><strong>${1}</strong></h2>")
        .into_owned())
}

fn unwrap_table_scroll(html: &str) -> Result<String, fancy_regex::Error> {
    let html = TABLE_SCROLL_OPEN.replace_all(html, "<table");
    Ok(TABLE_SCROLL_CLOSE.replace_all(&html, "</table>").into_owned())
}

fn collapse_blank_lines(html: &str) -> Result<String, fancy_regex::Error> {
    Ok(BLANK_LINE_RUNS.replace_all(html, "\n\n").trim().to_string())
}
