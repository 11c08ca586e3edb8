//! Arabic glyph shaping for rasterized rendering
//!
//! When a receipt is drawn into a bitmap the engine has to do its own
//! text shaping: Arabic letters change form by position (isolated,
//! final, initial, medial) and lines read right-to-left. This module
//! converts logical-order base letters into Unicode presentation forms
//! (U+FE70..U+FEFF) and reorders each line for left-to-right pixel
//! drawing.
//!
//! This is deliberately a receipt-grade shaper: positional forms,
//! lam-alef ligatures and a run-based reordering pass. It is not a full
//! bidi algorithm implementation, which receipts do not need.

use crate::classify::is_arabic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Joining {
    /// Connects to both neighbours (most letters)
    Dual,
    /// Connects only to the preceding letter (alef, dal, reh, waw, ...)
    Right,
    /// Never connects (hamza)
    Isolated,
    /// Invisible for joining purposes (harakat)
    Transparent,
}

fn joining_class(c: char) -> Option<Joining> {
    match c {
        '\u{0621}' => Some(Joining::Isolated),
        '\u{0622}' | '\u{0623}' | '\u{0624}' | '\u{0625}' | '\u{0627}' | '\u{0629}'
        | '\u{062F}' | '\u{0630}' | '\u{0631}' | '\u{0632}' | '\u{0648}' | '\u{0649}' => {
            Some(Joining::Right)
        }
        '\u{064B}'..='\u{065F}' | '\u{0670}' => Some(Joining::Transparent),
        c if forms(c).is_some() => Some(Joining::Dual),
        _ => None,
    }
}

/// Presentation forms `[isolated, final, initial, medial]`
///
/// Right-joining letters have no initial/medial form; those slots repeat
/// the isolated/final glyphs.
fn forms(c: char) -> Option<[char; 4]> {
    Some(match c {
        '\u{0621}' => ['\u{FE80}'; 4],                                     // hamza
        '\u{0622}' => ['\u{FE81}', '\u{FE82}', '\u{FE81}', '\u{FE82}'],    // alef madda
        '\u{0623}' => ['\u{FE83}', '\u{FE84}', '\u{FE83}', '\u{FE84}'],    // alef hamza above
        '\u{0624}' => ['\u{FE85}', '\u{FE86}', '\u{FE85}', '\u{FE86}'],    // waw hamza
        '\u{0625}' => ['\u{FE87}', '\u{FE88}', '\u{FE87}', '\u{FE88}'],    // alef hamza below
        '\u{0626}' => ['\u{FE89}', '\u{FE8A}', '\u{FE8B}', '\u{FE8C}'],    // yeh hamza
        '\u{0627}' => ['\u{FE8D}', '\u{FE8E}', '\u{FE8D}', '\u{FE8E}'],    // alef
        '\u{0628}' => ['\u{FE8F}', '\u{FE90}', '\u{FE91}', '\u{FE92}'],    // beh
        '\u{0629}' => ['\u{FE93}', '\u{FE94}', '\u{FE93}', '\u{FE94}'],    // teh marbuta
        '\u{062A}' => ['\u{FE95}', '\u{FE96}', '\u{FE97}', '\u{FE98}'],    // teh
        '\u{062B}' => ['\u{FE99}', '\u{FE9A}', '\u{FE9B}', '\u{FE9C}'],    // theh
        '\u{062C}' => ['\u{FE9D}', '\u{FE9E}', '\u{FE9F}', '\u{FEA0}'],    // jeem
        '\u{062D}' => ['\u{FEA1}', '\u{FEA2}', '\u{FEA3}', '\u{FEA4}'],    // hah
        '\u{062E}' => ['\u{FEA5}', '\u{FEA6}', '\u{FEA7}', '\u{FEA8}'],    // khah
        '\u{062F}' => ['\u{FEA9}', '\u{FEAA}', '\u{FEA9}', '\u{FEAA}'],    // dal
        '\u{0630}' => ['\u{FEAB}', '\u{FEAC}', '\u{FEAB}', '\u{FEAC}'],    // thal
        '\u{0631}' => ['\u{FEAD}', '\u{FEAE}', '\u{FEAD}', '\u{FEAE}'],    // reh
        '\u{0632}' => ['\u{FEAF}', '\u{FEB0}', '\u{FEAF}', '\u{FEB0}'],    // zain
        '\u{0633}' => ['\u{FEB1}', '\u{FEB2}', '\u{FEB3}', '\u{FEB4}'],    // seen
        '\u{0634}' => ['\u{FEB5}', '\u{FEB6}', '\u{FEB7}', '\u{FEB8}'],    // sheen
        '\u{0635}' => ['\u{FEB9}', '\u{FEBA}', '\u{FEBB}', '\u{FEBC}'],    // sad
        '\u{0636}' => ['\u{FEBD}', '\u{FEBE}', '\u{FEBF}', '\u{FEC0}'],    // dad
        '\u{0637}' => ['\u{FEC1}', '\u{FEC2}', '\u{FEC3}', '\u{FEC4}'],    // tah
        '\u{0638}' => ['\u{FEC5}', '\u{FEC6}', '\u{FEC7}', '\u{FEC8}'],    // zah
        '\u{0639}' => ['\u{FEC9}', '\u{FECA}', '\u{FECB}', '\u{FECC}'],    // ain
        '\u{063A}' => ['\u{FECD}', '\u{FECE}', '\u{FECF}', '\u{FED0}'],    // ghain
        '\u{0640}' => ['\u{0640}'; 4],                                     // tatweel
        '\u{0641}' => ['\u{FED1}', '\u{FED2}', '\u{FED3}', '\u{FED4}'],    // feh
        '\u{0642}' => ['\u{FED5}', '\u{FED6}', '\u{FED7}', '\u{FED8}'],    // qaf
        '\u{0643}' => ['\u{FED9}', '\u{FEDA}', '\u{FEDB}', '\u{FEDC}'],    // kaf
        '\u{0644}' => ['\u{FEDD}', '\u{FEDE}', '\u{FEDF}', '\u{FEE0}'],    // lam
        '\u{0645}' => ['\u{FEE1}', '\u{FEE2}', '\u{FEE3}', '\u{FEE4}'],    // meem
        '\u{0646}' => ['\u{FEE5}', '\u{FEE6}', '\u{FEE7}', '\u{FEE8}'],    // noon
        '\u{0647}' => ['\u{FEE9}', '\u{FEEA}', '\u{FEEB}', '\u{FEEC}'],    // heh
        '\u{0648}' => ['\u{FEED}', '\u{FEEE}', '\u{FEED}', '\u{FEEE}'],    // waw
        '\u{0649}' => ['\u{FEEF}', '\u{FEF0}', '\u{FEEF}', '\u{FEF0}'],    // alef maksura
        '\u{064A}' => ['\u{FEF1}', '\u{FEF2}', '\u{FEF3}', '\u{FEF4}'],    // yeh
        _ => return None,
    })
}

/// Lam-alef ligatures `[isolated, final]` keyed by the alef variant
fn lam_alef(alef: char) -> Option<[char; 2]> {
    Some(match alef {
        '\u{0622}' => ['\u{FEF5}', '\u{FEF6}'],
        '\u{0623}' => ['\u{FEF7}', '\u{FEF8}'],
        '\u{0625}' => ['\u{FEF9}', '\u{FEFA}'],
        '\u{0627}' => ['\u{FEFB}', '\u{FEFC}'],
        _ => return None,
    })
}

/// Does the nearest previous letter connect forward into position `i`?
fn prev_connects(chars: &[char], i: usize) -> bool {
    for &c in chars[..i].iter().rev() {
        match joining_class(c) {
            Some(Joining::Transparent) => continue,
            Some(Joining::Dual) => return true,
            _ => return false,
        }
    }
    false
}

/// Does the nearest following letter connect backward onto position `i`?
fn next_connects(chars: &[char], i: usize) -> bool {
    for &c in &chars[i + 1..] {
        match joining_class(c) {
            Some(Joining::Transparent) => continue,
            Some(Joining::Dual) | Some(Joining::Right) => return true,
            _ => return false,
        }
    }
    false
}

/// Index of the next non-transparent char after `i`, if any
fn next_base(chars: &[char], i: usize) -> Option<usize> {
    (i + 1..chars.len()).find(|&j| joining_class(chars[j]) != Some(Joining::Transparent))
}

/// Convert logical-order Arabic text to positional presentation forms
///
/// Non-Arabic characters pass through unchanged and break joining.
pub fn shape_arabic(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        let Some(f) = forms(c) else {
            out.push(c);
            i += 1;
            continue;
        };

        // Lam + alef collapses into a single ligature glyph
        if c == '\u{0644}' {
            if let Some(j) = next_base(&chars, i) {
                if let Some(lig) = lam_alef(chars[j]) {
                    let glyph = if prev_connects(&chars, i) { lig[1] } else { lig[0] };
                    out.push(glyph);
                    // Marks between lam and alef attach to the ligature
                    for &m in &chars[i + 1..j] {
                        out.push(m);
                    }
                    i = j + 1;
                    continue;
                }
            }
        }

        let class = joining_class(c);
        if class == Some(Joining::Transparent) {
            out.push(c);
            i += 1;
            continue;
        }

        let prev = prev_connects(&chars, i);
        let next = next_connects(&chars, i);

        let shaped = match class {
            Some(Joining::Dual) => match (prev, next) {
                (false, false) => f[0],
                (true, false) => f[1],
                (false, true) => f[2],
                (true, true) => f[3],
            },
            Some(Joining::Right) => {
                if prev {
                    f[1]
                } else {
                    f[0]
                }
            }
            _ => f[0],
        };
        out.push(shaped);
        i += 1;
    }

    out
}

/// Reorder one logical-order line for left-to-right pixel drawing
///
/// Lines containing Arabic take a right-to-left base direction: runs are
/// emitted in reverse order, Arabic run content is reversed char-wise,
/// and embedded numbers/Latin keep their internal order. Arabic-Indic
/// digits read left-to-right like ASCII digits.
pub fn visual_order(s: &str) -> String {
    if !s.chars().any(is_arabic) {
        return s.to_string();
    }

    #[derive(PartialEq, Clone, Copy)]
    enum Dir {
        Rtl,
        Ltr,
    }

    let dir_of = |c: char, current: Dir| -> Dir {
        if ('\u{0660}'..='\u{0669}').contains(&c) {
            Dir::Ltr
        } else if is_arabic(c) {
            Dir::Rtl
        } else if c.is_alphanumeric() {
            Dir::Ltr
        } else {
            // Neutral chars attach to the run in progress
            current
        }
    };

    let mut runs: Vec<(Dir, Vec<char>)> = Vec::new();
    let mut current = Dir::Rtl;
    for c in s.chars() {
        let d = dir_of(c, current);
        match runs.last_mut() {
            Some((run_dir, run)) if *run_dir == d => run.push(c),
            _ => runs.push((d, vec![c])),
        }
        current = d;
    }

    let mut out = String::with_capacity(s.len());
    for (dir, run) in runs.iter().rev() {
        match dir {
            Dir::Rtl => out.extend(run.iter().rev()),
            Dir::Ltr => out.extend(run.iter()),
        }
    }
    out
}

/// Shape and reorder one display line
pub fn shape_line(s: &str) -> String {
    visual_order(&shape_arabic(s))
}
