//! The G-Code line parser.

use stepstream_common::axis::{Axis, AxisMask, AXIS_COUNT};
use stepstream_common::events::{GcodeParser, MachineEvents};

const MM_PER_INCH: f64 = 25.4;

/// One parsed G-Code word: a letter plus its numeric value.
/// `tail` is the byte offset just past the word in the cleaned line,
/// used to hand the unparsed remainder to the catch-all event.
#[derive(Debug, Clone, Copy)]
struct Word {
    letter: char,
    value: f64,
    tail: usize,
}

/// Streaming G-Code parser with modal state.
///
/// Tracks units (G20/G21), positioning mode (G90/G91), G92 coordinate
/// offsets, and the last commanded position per axis — all in
/// real-world units. Every emitted move target is absolute millimeters.
#[derive(Debug, Clone)]
pub struct LineParser {
    /// Multiplier from input units to millimeters (1.0 or 25.4).
    unit_mm: f64,
    /// G91 relative positioning active.
    relative: bool,
    /// Last commanded position per axis [mm], machine coordinates.
    current_mm: [f64; AXIS_COUNT],
    /// G92 offset per axis [mm]: machine = logical + offset.
    offset_mm: [f64; AXIS_COUNT],
}

impl LineParser {
    pub fn new() -> Self {
        Self {
            unit_mm: 1.0,
            relative: false,
            current_mm: [0.0; AXIS_COUNT],
            offset_mm: [0.0; AXIS_COUNT],
        }
    }

    /// Consume axis and F words following G0/G1. Returns the absolute
    /// millimeter target, the feedrate in mm/s (0 when no F word), and
    /// the index of the first unconsumed word.
    fn collect_move(&self, words: &[Word], start: usize) -> ([f64; AXIS_COUNT], f64, usize) {
        let mut target = self.current_mm;
        let mut feed = 0.0;
        let mut i = start;
        while i < words.len() {
            let word = words[i];
            if word.letter == 'F' {
                feed = word.value * self.unit_mm / 60.0;
            } else if let Some(axis) = Axis::from_letter(word.letter) {
                let value = word.value * self.unit_mm;
                target[axis.index()] = if self.relative {
                    self.current_mm[axis.index()] + value
                } else {
                    value + self.offset_mm[axis.index()]
                };
            } else {
                break;
            }
            i += 1;
        }
        (target, feed, i)
    }

    /// Consume axis words following G92 and set the coordinate offsets
    /// so the current position reads as the given logical values. A
    /// bare G92 makes the current position logical zero on all axes.
    fn set_offsets(&mut self, words: &[Word], start: usize) -> usize {
        let mut any = false;
        let mut i = start;
        while i < words.len() {
            if let Some(axis) = Axis::from_letter(words[i].letter) {
                self.offset_mm[axis.index()] =
                    self.current_mm[axis.index()] - words[i].value * self.unit_mm;
                any = true;
                i += 1;
            } else {
                break;
            }
        }
        if !any {
            self.offset_mm = self.current_mm;
        }
        i
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl GcodeParser for LineParser {
    fn parse_line(&mut self, line: &str, handler: &mut dyn MachineEvents) {
        let code = strip_comments(line);
        let words = tokenize(&code);
        let mut i = 0;
        while i < words.len() {
            let Word {
                letter,
                value,
                tail,
            } = words[i];
            let remainder = code[tail..].trim();
            match letter {
                // Line numbers carry no meaning here.
                'N' => i += 1,
                'G' => match value as i32 {
                    0 => {
                        let (target, feed, next) = self.collect_move(&words, i + 1);
                        handler.rapid_move(feed, &target);
                        self.current_mm = target;
                        i = next;
                    }
                    1 => {
                        let (target, feed, next) = self.collect_move(&words, i + 1);
                        handler.coordinated_move(feed, &target);
                        self.current_mm = target;
                        i = next;
                    }
                    4 => {
                        let (ms, next) = collect_word(&words, i + 1, 'P');
                        handler.dwell(ms.unwrap_or(0.0));
                        i = next;
                    }
                    20 => {
                        self.unit_mm = MM_PER_INCH;
                        i += 1;
                    }
                    21 => {
                        self.unit_mm = 1.0;
                        i += 1;
                    }
                    28 => {
                        let (mask, next) = collect_axis_mask(&words, i + 1);
                        let mask = if mask.is_empty() {
                            AxisMask::all()
                        } else {
                            mask
                        };
                        handler.go_home(mask);
                        for axis in mask.axes() {
                            self.current_mm[axis.index()] = 0.0;
                            self.offset_mm[axis.index()] = 0.0;
                        }
                        i = next;
                    }
                    90 => {
                        self.relative = false;
                        i += 1;
                    }
                    91 => {
                        self.relative = true;
                        i += 1;
                    }
                    92 => {
                        i = self.set_offsets(&words, i + 1);
                    }
                    _ => {
                        handler.unhandled('G', value, remainder);
                        return;
                    }
                },
                'M' => match value as i32 {
                    84 => {
                        handler.disable_motors();
                        i += 1;
                    }
                    104 => {
                        let (s, next) = collect_word(&words, i + 1, 'S');
                        handler.set_temperature(s.unwrap_or(0.0));
                        i = next;
                    }
                    106 => {
                        let (s, next) = collect_word(&words, i + 1, 'S');
                        handler.set_fan_speed(s.unwrap_or(0.0));
                        i = next;
                    }
                    107 => {
                        handler.set_fan_speed(0.0);
                        i += 1;
                    }
                    109 => {
                        let (s, next) = collect_word(&words, i + 1, 'S');
                        handler.set_temperature(s.unwrap_or(0.0));
                        handler.wait_temperature();
                        i = next;
                    }
                    116 => {
                        handler.wait_temperature();
                        i += 1;
                    }
                    220 => {
                        let (s, next) = collect_word(&words, i + 1, 'S');
                        match s {
                            Some(percent) => {
                                handler.set_speed_factor(percent / 100.0);
                                i = next;
                            }
                            None => {
                                handler.unhandled('M', value, remainder);
                                return;
                            }
                        }
                    }
                    _ => {
                        handler.unhandled('M', value, remainder);
                        return;
                    }
                },
                _ => {
                    handler.unhandled(letter, value, remainder);
                    return;
                }
            }
        }
    }
}

/// Drop `;` line comments and `(...)` inline comments.
fn strip_comments(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut depth = 0usize;
    for ch in line.chars() {
        match ch {
            ';' if depth == 0 => break,
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Split a cleaned line into letter/value words. Parsing stops at a
/// `*` checksum marker; stray punctuation is skipped.
fn tokenize(code: &str) -> Vec<Word> {
    let mut words = Vec::new();
    let mut iter = code.char_indices().peekable();
    while let Some((_, ch)) = iter.next() {
        if ch == '*' {
            break;
        }
        if !ch.is_ascii_alphabetic() {
            continue;
        }
        let letter = ch.to_ascii_uppercase();
        while matches!(iter.peek(), Some((_, c)) if c.is_whitespace()) {
            iter.next();
        }
        let mut num = String::new();
        let mut tail = code.len();
        while let Some(&(pos, c)) = iter.peek() {
            if c.is_ascii_digit() || c == '.' || c == '-' || c == '+' {
                num.push(c);
                iter.next();
            } else {
                tail = pos;
                break;
            }
        }
        let value = num.parse::<f64>().unwrap_or(0.0);
        words.push(Word {
            letter,
            value,
            tail,
        });
    }
    words
}

/// If the word at `start` has the given letter, consume it.
fn collect_word(words: &[Word], start: usize, letter: char) -> (Option<f64>, usize) {
    match words.get(start) {
        Some(w) if w.letter == letter => (Some(w.value), start + 1),
        _ => (None, start),
    }
}

/// Consume consecutive axis words into a mask (values ignored).
fn collect_axis_mask(words: &[Word], start: usize) -> (AxisMask, usize) {
    let mut mask = AxisMask::empty();
    let mut i = start;
    while i < words.len() {
        match Axis::from_letter(words[i].letter) {
            Some(axis) => {
                mask |= AxisMask::from(axis);
                i += 1;
            }
            None => break,
        }
    }
    (mask, i)
}
