//! Best-effort repair of mojibake in exported chat text.
//!
//! Chat exports commonly store UTF-8 text whose bytes were decoded one by one
//! as Latin-1 or Windows-1252, so `café` arrives as `cafÃ©` and an emoji as
//! four stray symbols. [`fix_text`] maps each suspicious run back to bytes and
//! re-decodes it as UTF-8, repeating until nothing changes. Runs that do not
//! form valid UTF-8 are left alone, which keeps the function total and
//! idempotent.
//!
//! Valid UTF-8 alone is a weak signal for two-character runs: `É…` or `Ö°`
//! are ordinary text. Those are only re-decoded when they look like a
//! mis-decoded lowercase letter.

use std::sync::OnceLock;

use regex::Regex;

/// Windows-1252 characters for bytes `0x80..=0x9F`.
///
/// `None` marks the five undefined slots, which decoders pass through as the
/// matching C1 control code point (already covered by the Latin-1 range).
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), // 0x80 €
    None,             // 0x81
    Some('\u{201A}'), // 0x82 ‚
    Some('\u{0192}'), // 0x83 ƒ
    Some('\u{201E}'), // 0x84 „
    Some('\u{2026}'), // 0x85 …
    Some('\u{2020}'), // 0x86 †
    Some('\u{2021}'), // 0x87 ‡
    Some('\u{02C6}'), // 0x88 ˆ
    Some('\u{2030}'), // 0x89 ‰
    Some('\u{0160}'), // 0x8A Š
    Some('\u{2039}'), // 0x8B ‹
    Some('\u{0152}'), // 0x8C Œ
    None,             // 0x8D
    Some('\u{017D}'), // 0x8E Ž
    None,             // 0x8F
    None,             // 0x90
    Some('\u{2018}'), // 0x91 ‘
    Some('\u{2019}'), // 0x92 ’
    Some('\u{201C}'), // 0x93 “
    Some('\u{201D}'), // 0x94 ”
    Some('\u{2022}'), // 0x95 •
    Some('\u{2013}'), // 0x96 –
    Some('\u{2014}'), // 0x97 —
    Some('\u{02DC}'), // 0x98 ˜
    Some('\u{2122}'), // 0x99 ™
    Some('\u{0161}'), // 0x9A š
    Some('\u{203A}'), // 0x9B ›
    Some('\u{0153}'), // 0x9C œ
    None,             // 0x9D
    Some('\u{017E}'), // 0x9E ž
    Some('\u{0178}'), // 0x9F Ÿ
];

/// A UTF-8 lead byte rendered as Latin-1, followed by something that could be
/// a continuation byte rendered as Latin-1 or Windows-1252.
const MOJIBAKE_HINT: &str = concat!(
    r"[\x{C2}-\x{F4}]",
    r"[\x{80}-\x{BF}\x{152}\x{153}\x{160}\x{161}\x{178}\x{17D}\x{17E}\x{192}",
    r"\x{2C6}\x{2DC}\x{2013}\x{2014}\x{2018}-\x{201A}\x{201C}-\x{201E}",
    r"\x{2020}-\x{2022}\x{2026}\x{2030}\x{2039}\x{203A}\x{20AC}\x{2122}]",
);

fn mojibake_hint() -> &'static Regex {
    static HINT: OnceLock<Regex> = OnceLock::new();
    HINT.get_or_init(|| Regex::new(MOJIBAKE_HINT).expect("regex is valid"))
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Repair text that was mis-decoded through a Latin-1 / Windows-1252
/// round-trip.
///
/// Never fails: text without recognisable mojibake is returned unchanged, and
/// `fix_text(&fix_text(s)) == fix_text(s)` for every input.
///
/// # Examples
///
/// ```
/// use stats_core::text_repair::fix_text;
///
/// assert_eq!(fix_text("cafÃ©"), "café");
/// assert_eq!(fix_text("itâ€™s"), "it’s");
/// assert_eq!(fix_text("plain ascii"), "plain ascii");
/// ```
pub fn fix_text(text: &str) -> String {
    let mut current = text.to_string();
    // Each successful pass shortens the string, so this terminates.
    while mojibake_hint().is_match(&current) {
        match repair_pass(&current) {
            Some(fixed) => current = fixed,
            None => break,
        }
    }
    current
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Map a character back to the single byte it would have been decoded from.
fn encode_single_byte(c: char) -> Option<u8> {
    let cp = c as u32;
    if cp <= 0xFF {
        return Some(cp as u8);
    }
    CP1252_HIGH
        .iter()
        .position(|&mapped| mapped == Some(c))
        .map(|i| 0x80 + i as u8)
}

/// Re-decode every mojibake sequence in `text` once.
///
/// Returns `None` when no sequence could be decoded.
fn repair_pass(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    let mut last_decoded = false;
    let mut i = 0;

    while i < chars.len() {
        let candidate = decode_sequence(&chars[i..]).filter(|&(_, width)| {
            width > 2 || last_decoded || is_plausible_pair(&chars, i, out.chars().last())
        });
        match candidate {
            Some((decoded, consumed)) => {
                out.push(decoded);
                i += consumed;
                changed = true;
                last_decoded = true;
            }
            None => {
                out.push(chars[i]);
                i += 1;
                last_decoded = false;
            }
        }
    }

    changed.then_some(out)
}

/// Whether the two-char run at `chars[i..i + 2]` is mojibake rather than an
/// uppercase letter followed by a symbol.
///
/// `Â` and `Ã` leads are accepted outright. Any other lead needs a C1 control
/// as its second char, a lowercase letter right before or after the run, or
/// another decodable run directly after it.
fn is_plausible_pair(chars: &[char], i: usize, previous: Option<char>) -> bool {
    if matches!(chars[i], '\u{C2}' | '\u{C3}') {
        return true;
    }
    if ('\u{80}'..='\u{9F}').contains(&chars[i + 1]) {
        return true;
    }
    let rest = &chars[i + 2..];
    if decode_sequence(rest).is_some() {
        return true;
    }
    [previous, rest.first().copied()]
        .into_iter()
        .flatten()
        .any(char::is_lowercase)
}

/// Try to read one UTF-8 encoded character from the start of `chars`, treating
/// each char as a single byte.
///
/// Returns the decoded character and how many chars it consumed.
fn decode_sequence(chars: &[char]) -> Option<(char, usize)> {
    let lead = encode_single_byte(*chars.first()?)?;
    let width = match lead {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return None,
    };
    if chars.len() < width {
        return None;
    }

    let mut bytes = [0u8; 4];
    bytes[0] = lead;
    for (slot, &c) in bytes[1..width].iter_mut().zip(&chars[1..width]) {
        let b = encode_single_byte(c)?;
        if !(0x80..=0xBF).contains(&b) {
            return None;
        }
        *slot = b;
    }

    // Rejects overlong forms and surrogates.
    let decoded = std::str::from_utf8(&bytes[..width]).ok()?;
    decoded.chars().next().map(|c| (c, width))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
