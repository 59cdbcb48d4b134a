use chrono::{Duration, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::RelayError;
use crate::feed::{FeedEntry, PUB_DATE_FORMAT};

const IMAGE_PLACEHOLDER: &str = "[image]";

/// Catalogs whose entries get the title prepended before the body.
const TITLED_CATALOGS: &[&str] = &["zhihu"];

enum Transform {
    Text(&'static str),
    Func(fn(&Captures) -> String),
}

struct Rule {
    pattern: Regex,
    transform: Transform,
}

impl Rule {
    fn new(pattern: &str, transform: Transform) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("invalid rewrite pattern"),
            transform,
        }
    }

    fn apply(&self, text: &str) -> String {
        match self.transform {
            Transform::Text(replacement) => {
                self.pattern.replace_all(text, replacement).into_owned()
            }
            Transform::Func(func) => self
                .pattern
                .replace_all(text, |caps: &Captures| func(caps))
                .into_owned(),
        }
    }
}

fn image_alt(caps: &Captures) -> String {
    let alt = caps[1].trim();
    if alt.is_empty() {
        IMAGE_PLACEHOLDER.to_owned()
    } else {
        alt.to_owned()
    }
}

fn blockquote(caps: &Captures) -> String {
    let quoted: Vec<String> = caps[1]
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("> {}", line.trim()))
        .collect();
    format!("\n{}", quoted.join("\n"))
}

/// The rewrite cascade. Order matters: later rules assume earlier ones
/// already collapsed certain tags (e.g. the bare `<img>` rule only sees
/// images the alt rule left behind).
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        // 1. images: alt text when present, placeholder otherwise
        Rule::new(
            r#"<img[^>]*\balt="([^"]*)"[^>]*>"#,
            Transform::Func(image_alt),
        ),
        Rule::new(r"<img[^>]*>", Transform::Text(IMAGE_PLACEHOLDER)),
        // 2. anchors keep their text, wrapped in angle brackets
        Rule::new(r"<a[^>]*>([^<]*)</a>", Transform::Text("<$1>")),
        // 3-4. inline wrappers unwrap to their inner text
        Rule::new(r"(?s)<span[^>]*>(.*?)</span>", Transform::Text("$1")),
        Rule::new(r"(?s)<div[^>]*>(.*?)</div>", Transform::Text("$1")),
        // 5. video embeds: drop sources, keep the fallback text
        Rule::new(r"<source[^>]*>", Transform::Text("")),
        Rule::new(r"(?s)<video[^>]*>(.*?)</video>", Transform::Text("$1")),
        // 6-7. line breaks and paragraphs
        Rule::new(r"<br[^>]*>", Transform::Text("\n")),
        Rule::new(r"(?s)<p(?:\s[^>]*)?>(.*?)</p>", Transform::Text("$1\n")),
        // 8. footnote markers
        Rule::new(r"(?s)<sup[^>]*>(.*?)</sup>", Transform::Text("$1")),
        // 9. bold
        Rule::new(r"(?s)<b>(.*?)</b>", Transform::Text("**$1**")),
        Rule::new(
            r"(?s)<strong[^>]*>(.*?)</strong>",
            Transform::Text("**$1**"),
        ),
        // 10. empty figure placeholder
        Rule::new(
            r#"<figure data-size="normal"></figure>"#,
            Transform::Text(IMAGE_PLACEHOLDER),
        ),
        // 11. headings
        Rule::new(r"(?s)<h1[^>]*>(.*?)</h1>", Transform::Text("# $1\n")),
        Rule::new(r"(?s)<h2[^>]*>(.*?)</h2>", Transform::Text("## $1\n")),
        Rule::new(r"(?s)<h3[^>]*>(.*?)</h3>", Transform::Text("### $1\n")),
        // 12. blockquotes
        Rule::new(
            r"(?s)<blockquote[^>]*>(.*?)</blockquote>",
            Transform::Func(blockquote),
        ),
        // 13. non-breaking spaces
        Rule::new(r"&nbsp;", Transform::Text(" ")),
    ]
});

/// Applies the rewrite cascade to a raw markup fragment.
pub fn clean_markup(raw: &str) -> String {
    let mut text = raw.to_owned();
    for rule in RULES.iter() {
        text = rule.apply(&text);
    }
    text
}

/// Reformats a feed timestamp into UTC+8 `YYYY-MM-DD HH:MM:SS`. The offset
/// is a fixed constant, not a timezone-database lookup.
pub fn convert_to_east_eight(pub_date: &str) -> Result<String, RelayError> {
    let parsed =
        NaiveDateTime::parse_from_str(pub_date, PUB_DATE_FORMAT).map_err(|source| {
            RelayError::Timestamp {
                value: pub_date.to_owned(),
                source,
            }
        })?;
    Ok((parsed + Duration::hours(8))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string())
}

/// Turns one entry into the delivery-ready message body:
/// `{normalized body}\n\n{reformatted date}\n{link}`.
pub fn normalize(catalog: &str, entry: &FeedEntry) -> Result<String, RelayError> {
    let mut text = String::new();
    if TITLED_CATALOGS.contains(&catalog) {
        text.push_str(&format!("**{}**\n", entry.title));
    }
    text.push_str(&entry.description);
    let body = clean_markup(&text);
    let date = convert_to_east_eight(&entry.pub_date)?;
    Ok(format!("{}\n\n{}\n{}", body, date, entry.link))
}
