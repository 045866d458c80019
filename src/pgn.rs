use std::collections::HashMap;

use regex::Regex;

use crate::model::Color;

/// Parse PGN tag pairs into a map (Tag -> Value).
pub fn parse_headers(pgn: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in pgn.lines() {
        let line = line.trim();
        if !is_tag_line(line) {
            continue;
        }
        // format: [Tag "Value"]
        if let Some(space_idx) = line.find(' ') {
            let tag = &line[1..space_idx];
            if let (Some(fq_rel), Some(lq)) = (line[space_idx..].find('"'), line.rfind('"')) {
                let fq = space_idx + fq_rel;
                if lq > fq {
                    map.insert(tag.to_string(), line[(fq + 1)..lq].to_string());
                }
            }
        }
    }
    map
}

// `[%clk ...]` inside a move comment also starts with '[', so require a tag name.
fn is_tag_line(line: &str) -> bool {
    line.starts_with('[')
        && line.ends_with(']')
        && line[1..].chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Everything after the tag section, joined into one line.
/// Bare movetext comes back unchanged apart from line joins.
pub fn movetext(pgn: &str) -> String {
    pgn.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !is_tag_line(l))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clock annotation (`M:SS`, `M:SS.s`, `H:MM:SS`, `H:MM:SS.s`) to seconds.
pub fn parse_clock(clock: &str) -> Option<f64> {
    let parts: Vec<&str> = clock.trim().split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    let (last, whole) = parts.split_last()?;
    let seconds: f64 = last.parse().ok()?;
    if !(0.0..60.0).contains(&seconds) {
        return None;
    }
    let mut total = 0u64;
    for p in whole {
        total = total.checked_mul(60)?.checked_add(p.parse::<u64>().ok()?)?;
    }
    Some(total as f64 * 60.0 + seconds)
}

/// One ply of the main line, with the clock reading that followed it if any.
#[derive(Clone, Debug, PartialEq)]
pub struct Ply {
    pub move_number: u32,
    pub side: Color,
    pub san: String,
    pub clock: Option<f64>,
}

/// Walks movetext ply by ply: `N. san`, `N... san` or a bare `san`, each
/// optionally followed by NAGs and a `{...}` comment. Comments without a
/// clock are skipped, so their words are never read as moves.
pub struct PlyScanner {
    re: Regex,
}

impl Default for PlyScanner {
    fn default() -> Self {
        let re = Regex::new(
            r"(?x)
            (?P<comment>\{[^}]*\})
            |
            (?:(?P<num>\d+)\.(?P<dots>\.\.)?\s*)?
            (?P<san>(?:O-O(?:-O)?|[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=?[QRBN])?)[+\#]?[!?]{0,2})
            (?:\s+\$\d+)*
            (?:\s*\{[^}]*?\[%clk\s+(?P<clk>[0-9:.]+)\][^}]*\})?",
        )
        .unwrap();
        Self { re }
    }
}

impl PlyScanner {
    /// Plies in game order. A numbered ply fixes the side and number; an
    /// unnumbered one alternates from the previous ply, clocked or not.
    pub fn scan(&self, text: &str) -> Vec<Ply> {
        let mut out: Vec<Ply> = Vec::new();
        for caps in self.re.captures_iter(text) {
            let Some(san) = caps.name("san") else { continue };
            let numbered = caps.name("num").and_then(|m| m.as_str().parse::<u32>().ok());
            let (side, move_number) = match (numbered, out.last()) {
                (Some(n), _) if caps.name("dots").is_some() => (Color::Black, n),
                (Some(n), _) => (Color::White, n),
                (None, Some(prev)) => {
                    let side = prev.side.opposite();
                    let n = if side == Color::White { prev.move_number.saturating_add(1) } else { prev.move_number };
                    (side, n)
                }
                (None, None) => (Color::White, 1),
            };
            out.push(Ply {
                move_number,
                side,
                san: san.as_str().to_string(),
                clock: caps.name("clk").and_then(|m| parse_clock(m.as_str())),
            });
        }
        out
    }
}

/// Opening from the record's ECO URL, else the `ECOUrl`/`ECO` tags.
pub fn opening(eco_url: Option<&str>, pgn: Option<&str>) -> Option<String> {
    let last_segment = |url: &str| url.rsplit('/').next().filter(|s| !s.is_empty()).map(str::to_string);
    if let Some(name) = eco_url.and_then(last_segment) {
        return Some(name);
    }
    let h = parse_headers(pgn?);
    h.get("ECOUrl")
        .and_then(|u| last_segment(u))
        .or_else(|| h.get("ECO").cloned())
}

pub fn opening_name(eco_url: Option<&str>, pgn: Option<&str>) -> String {
    opening(eco_url, pgn).unwrap_or_else(|| "Unknown Opening".to_string())
}
