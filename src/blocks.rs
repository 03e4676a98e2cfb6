//src/blocks.rs

use ahash::AHashMap;

/// Section label -> the non-blank lines between its marker and the next one.
pub type SectionMap<'l> = AHashMap<&'l str, Vec<String>>;

/// Split report lines into labelled sections.
///
/// `boundaries` is an ordered list of `(marker, label)` pairs. A line opens
/// the next section when its trimmed text starts with the next marker in the
/// list; markers are only ever looked for in order, and once the last marker
/// is seen scanning stops. Lines before the first marker, and lines of a
/// section whose label is `None`, are discarded.
///
/// Stored lines keep their leading indentation (only trailing whitespace is
/// removed): the hmmsearch match row is positioned by it. Blank lines are
/// dropped. A labelled section with no lines still gets an (empty) entry.
pub fn split_at_boundaries<'l, S: AsRef<str>>(
    lines: &[S],
    boundaries: &[(&str, Option<&'l str>)],
) -> SectionMap<'l> {
    let mut sections = SectionMap::new();
    let mut pending = boundaries.iter();
    let mut next_marker = pending.next();
    let mut active: Option<&'l str> = None;
    let mut buffer: Vec<String> = Vec::new();

    for line in lines {
        let line = line.as_ref();
        let trimmed = line.trim();

        let Some(&(marker, label)) = next_marker else {
            break;
        };

        if trimmed.starts_with(marker) {
            if let Some(name) = active {
                sections.insert(name, std::mem::take(&mut buffer));
            }
            active = label;
            next_marker = pending.next();
            if next_marker.is_none() {
                // Last marker: nothing after it is collected.
                if let Some(name) = active.take() {
                    sections.entry(name).or_default();
                }
            }
            continue;
        }

        if active.is_some() && !trimmed.is_empty() {
            buffer.push(line.trim_end().to_string());
        }
    }

    if let Some(name) = active {
        sections.insert(name, buffer);
    }
    sections
}
