use crate::database::models::{resolve_names, LookupEntity, Member};

const BLOCK_TAGS: [&str; 22] = [
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "tr", "table",
    "section", "article", "header", "footer", "pre", "hr", "dd",
];

/// Full lookup tables used to resolve a member's associative ids
#[derive(Debug, Clone, Default)]
pub struct LookupSnapshot {
    pub classes: Vec<LookupEntity>,
    pub races: Vec<LookupEntity>,
    pub groups: Vec<LookupEntity>,
}

/// Display names for a member's classes, races and groups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedNames {
    pub classes: Vec<String>,
    pub races: Vec<String>,
    pub groups: Vec<String>,
}

impl ResolvedNames {
    pub fn resolve(member: &Member, lookups: &LookupSnapshot) -> Self {
        Self {
            classes: resolve_names(&member.classes, &lookups.classes),
            races: resolve_names(&member.races, &lookups.races),
            groups: resolve_names(&member.groups, &lookups.groups),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Plain-text search document for a member. Empty sections are omitted.
pub fn compose_document(member: &Member, names: &ResolvedNames) -> String {
    let mut sections: Vec<String> = Vec::new();

    // Identity
    let mut identity = Vec::new();
    if !member.name.trim().is_empty() {
        identity.push(format!("Name: {}", member.name.trim()));
    }
    if !member.pseudonym.trim().is_empty() {
        identity.push(format!("Also known as: {}", member.pseudonym.trim()));
    }
    if !member.title.trim().is_empty() {
        identity.push(format!("Title: {}", member.title.trim()));
    }
    if !identity.is_empty() {
        sections.push(identity.join("\n"));
    }

    if !names.races.is_empty() {
        sections.push(format!("Race: {}", names.races.join(", ")));
    }
    if !names.classes.is_empty() {
        sections.push(format!("Class: {}", names.classes.join(", ")));
    }

    // Birth and death
    let mut life = Vec::new();
    if let Some(born) = member.born.filter(|b| *b != 0) {
        life.push(format!("Born: {}", born));
    }
    match (member.died.filter(|d| *d != 0), member.level) {
        (Some(died), Some(level)) => life.push(format!("Died: {} (level {} at death)", died, level)),
        (Some(died), None) => life.push(format!("Died: {}", died)),
        (None, Some(level)) => life.push(format!("Level: {}", level)),
        (None, None) => {}
    }
    if !life.is_empty() {
        sections.push(life.join("\n"));
    }

    // Physical attributes
    let mut physical = Vec::new();
    if let Some(height) = member.height.filter(|h| *h != 0.0) {
        physical.push(format!("Height: {}", format_number(height)));
    }
    if let Some(weight) = member.weight.filter(|w| *w != 0.0) {
        physical.push(format!("Weight: {}", format_number(weight)));
    }
    if let Some(hp) = member.hp {
        physical.push(format!("HP: {}", hp));
    }
    if !physical.is_empty() {
        sections.push(physical.join("\n"));
    }

    if !member.religion.trim().is_empty() {
        sections.push(format!("Religion: {}", member.religion.trim()));
    }
    if !names.groups.is_empty() {
        sections.push(format!("Groups: {}", names.groups.join(", ")));
    }

    let biography = strip_markup(&member.biography);
    if !biography.is_empty() {
        sections.push(format!("Biography:\n{}", biography));
    }

    sections.join("\n\n").trim().to_string()
}

/// Truncate to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Convert rich-text markup to plain paragraphs
pub fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let after = &rest[open..];
        if !starts_tag(&after[1..]) {
            text.push('<');
            rest = &after[1..];
            continue;
        }
        match after.find('>') {
            Some(close) => {
                let tag = tag_name(&after[1..close]);
                if BLOCK_TAGS.contains(&tag.as_str()) {
                    text.push_str("\n\n");
                }
                rest = &after[close + 1..];
            }
            None => {
                text.push_str(after);
                rest = "";
            }
        }
    }
    text.push_str(rest);

    normalize_whitespace(&decode_entities(&text))
}

// A tag opens with a name, a closing slash, or a comment/doctype bang
fn starts_tag(after_lt: &str) -> bool {
    after_lt
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '/' || c == '!')
}

fn tag_name(inner: &str) -> String {
    inner
        .trim_start_matches(|c: char| c == '/' || c.is_whitespace())
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let decoded = after
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_entity(&after[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in text.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(collapsed);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }
    paragraphs.join("\n\n")
}
