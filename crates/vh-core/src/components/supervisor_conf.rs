//! Line-preserving editing of supervisord INI files.
//!
//! A section owns its header, the comment lines directly above it and every
//! line up to the next section. Sections whose leading comments carry a marker
//! can be pruned without disturbing hand-written ones.

#[derive(Debug, Default)]
struct Section {
    leading: Vec<String>,
    body: Vec<String>,
}

fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with(';') || trimmed.starts_with('#')
}

fn is_header(line: &str) -> bool {
    line.trim_start().starts_with('[')
}

fn parse(text: &str) -> (Vec<String>, Vec<Section>) {
    let mut preamble = Vec::new();
    let mut sections: Vec<Section> = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for line in text.lines() {
        if is_header(line) {
            let mut leading = std::mem::take(&mut pending);
            leading.push(line.to_string());
            sections.push(Section {
                leading,
                body: Vec::new(),
            });
            continue;
        }
        if is_comment(line) {
            pending.push(line.to_string());
            continue;
        }
        let target = match sections.last_mut() {
            Some(section) => &mut section.body,
            None => &mut preamble,
        };
        target.append(&mut pending);
        target.push(line.to_string());
    }

    let target = match sections.last_mut() {
        Some(section) => &mut section.body,
        None => &mut preamble,
    };
    target.append(&mut pending);

    (preamble, sections)
}

/// Drop every section tagged with `marker`, then append `generated` sections.
/// Applying the same `generated` twice gives the same text.
pub fn replace_marked(text: &str, marker: &str, generated: &[String]) -> String {
    let (preamble, sections) = parse(text);

    let mut kept: Vec<String> = preamble;
    for section in sections {
        if section.leading.iter().any(|l| l.trim() == marker) {
            continue;
        }
        kept.extend(section.leading);
        kept.extend(section.body);
    }

    let mut out = kept.join("\n").trim_end().to_string();
    for section in generated {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(section.trim_end());
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Render one `[program:<name>]` section tagged with `marker`.
pub fn render_program(marker: &str, name: &str, options: &[(&str, &str)]) -> String {
    let mut lines = vec![marker.to_string(), format!("[program:{name}]")];
    for (key, value) in options {
        if !value.is_empty() {
            lines.push(format!("{key}={value}"));
        }
    }
    lines.join("\n")
}

/// Program names of every section tagged with `marker`.
pub fn marked_programs(text: &str, marker: &str) -> Vec<String> {
    let (_, sections) = parse(text);
    sections
        .iter()
        .filter(|s| s.leading.iter().any(|l| l.trim() == marker))
        .filter_map(|s| s.leading.last())
        .filter_map(|header| {
            header
                .trim()
                .strip_prefix("[program:")
                .and_then(|rest| rest.strip_suffix(']'))
                .map(str::to_string)
        })
        .collect()
}
