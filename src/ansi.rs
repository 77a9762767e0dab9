//! delta's sgr escape sequences as ratatui styles

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;
use std::sync::LazyLock;

static CSI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[([0-9;?]*)([A-Za-z])").expect("valid csi regex"));

/// styled line for a chunk of terminal output; non-sgr sequences are dropped
pub fn to_line(text: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut style = Style::default();
    let mut last = 0;

    for caps in CSI.captures_iter(text) {
        let Some(seq) = caps.get(0) else { continue };
        if seq.start() > last {
            spans.push(Span::styled(text[last..seq.start()].to_string(), style));
        }
        last = seq.end();
        if &caps[2] == "m" {
            style = apply_sgr(style, &caps[1]);
        }
    }
    if last < text.len() {
        spans.push(Span::styled(text[last..].to_string(), style));
    }

    Line::from(spans)
}

fn apply_sgr(mut style: Style, params: &str) -> Style {
    let codes: Vec<u16> = if params.is_empty() {
        vec![0]
    } else {
        params.split(';').map(|p| p.parse().unwrap_or(0)).collect()
    };

    let mut codes = codes.into_iter();
    while let Some(code) = codes.next() {
        style = match code {
            0 => Style::default(),
            1 => style.add_modifier(Modifier::BOLD),
            2 => style.add_modifier(Modifier::DIM),
            3 => style.add_modifier(Modifier::ITALIC),
            4 => style.add_modifier(Modifier::UNDERLINED),
            7 => style.add_modifier(Modifier::REVERSED),
            9 => style.add_modifier(Modifier::CROSSED_OUT),
            22 => style.remove_modifier(Modifier::BOLD | Modifier::DIM),
            23 => style.remove_modifier(Modifier::ITALIC),
            24 => style.remove_modifier(Modifier::UNDERLINED),
            27 => style.remove_modifier(Modifier::REVERSED),
            29 => style.remove_modifier(Modifier::CROSSED_OUT),
            30..=37 => style.fg(indexed(code - 30)),
            38 => extended(&mut codes).map_or(style, |c| style.fg(c)),
            39 => style.fg(Color::Reset),
            40..=47 => style.bg(indexed(code - 40)),
            48 => extended(&mut codes).map_or(style, |c| style.bg(c)),
            49 => style.bg(Color::Reset),
            90..=97 => style.fg(indexed(code - 90 + 8)),
            100..=107 => style.bg(indexed(code - 100 + 8)),
            _ => style,
        };
    }
    style
}

fn indexed(n: u16) -> Color {
    Color::Indexed(u8::try_from(n).unwrap_or(0))
}

/// `5;n` (256 colours) or `2;r;g;b` (truecolor)
fn extended(codes: &mut impl Iterator<Item = u16>) -> Option<Color> {
    let byte = |c: u16| u8::try_from(c).ok();
    match codes.next()? {
        5 => Some(Color::Indexed(byte(codes.next()?)?)),
        2 => {
            let r = byte(codes.next()?)?;
            let g = byte(codes.next()?)?;
            let b = byte(codes.next()?)?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}
