//! Backslash escape decoding.
//!
//! A backslash is followed either by a mnemonic letter that maps to a control
//! character, or by the start of a numeric escape whose digits arrive one at a
//! time (possibly across chunk refills).
//!
//! `\uXXXX` escapes are UTF-16 code units: a high surrogate followed by a low
//! surrogate escape decodes to one supplementary character.

/// Character produced by an escape whose value is not a Unicode scalar value.
pub(crate) const INVALID_ESCAPE: char = char::REPLACEMENT_CHARACTER;

const HIGH_SURROGATES: std::ops::RangeInclusive<u32> = 0xD800..=0xDBFF;
const LOW_SURROGATES: std::ops::RangeInclusive<u32> = 0xDC00..=0xDFFF;

/// Numeric escape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Radix {
    /// `\uXXXX`
    Unicode,
    /// `\xXX`
    Hex,
    /// `\oOOO` or `\OOO`
    Octal,
    /// `\dDDD`
    Decimal,
}

impl Radix {
    const fn base(self) -> u32 {
        match self {
            Radix::Unicode | Radix::Hex => 16,
            Radix::Octal => 8,
            Radix::Decimal => 10,
        }
    }

    const fn width(self) -> u8 {
        match self {
            Radix::Unicode => 4,
            Radix::Hex => 2,
            Radix::Octal | Radix::Decimal => 3,
        }
    }
}

/// A numeric escape being accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ComplexEscape {
    radix: Radix,
    digits: u8,
    value: u32,
}

impl ComplexEscape {
    pub(crate) const fn new(radix: Radix) -> Self {
        Self {
            radix,
            digits: 0,
            value: 0,
        }
    }

    /// Octal escape introduced directly by its first digit (`\101`).
    pub(crate) const fn octal(first: u32) -> Self {
        Self {
            radix: Radix::Octal,
            digits: 1,
            value: first,
        }
    }

    /// Feed one digit. Returns the decoded value once all digits are in.
    ///
    /// Characters that are not digits of the radix count as zero.
    pub(crate) fn push(&mut self, ch: char) -> Option<EscapeValue> {
        let base = self.radix.base();
        let digit = ch.to_digit(base).unwrap_or(0);
        self.value = self.value.wrapping_mul(base).wrapping_add(digit);
        self.digits += 1;

        if self.digits < self.radix.width() {
            return None;
        }
        // Only four hex digits reach the surrogate range.
        Some(if HIGH_SURROGATES.contains(&self.value) {
            EscapeValue::High(self.value as u16)
        } else if LOW_SURROGATES.contains(&self.value) {
            EscapeValue::Low(self.value as u16)
        } else {
            EscapeValue::Char(char::from_u32(self.value).unwrap_or(INVALID_ESCAPE))
        })
    }
}

/// A completed numeric escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EscapeValue {
    Char(char),
    /// First half of a surrogate pair.
    High(u16),
    /// Second half of a surrogate pair.
    Low(u16),
}

/// Join a surrogate pair into one character.
pub(crate) fn combine_surrogates(high: u16, low: u16) -> char {
    char::decode_utf16([high, low])
        .next()
        .and_then(|decoded| decoded.ok())
        .unwrap_or(INVALID_ESCAPE)
}

/// Whether `ch` may still be part of a `\u` escape that completes a pending
/// high surrogate.
pub(crate) fn continues_unicode_escape(in_escape: bool, after_backslash: bool, ch: char) -> bool {
    if in_escape {
        true
    } else if after_backslash {
        matches!(ch, 'u' | 'U')
    } else {
        ch == '\\'
    }
}

/// What follows a backslash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Escaped {
    /// A mnemonic that decodes to a single character.
    Char(char),
    /// The start of a numeric escape.
    Complex(ComplexEscape),
    /// Anything else. The character is kept literally.
    Literal,
}

/// Classify the character after a backslash.
pub(crate) fn after_backslash(ch: char) -> Escaped {
    match ch {
        'n' => Escaped::Char('\n'),
        'r' => Escaped::Char('\r'),
        't' => Escaped::Char('\t'),
        'b' => Escaped::Char('\u{0008}'),
        'f' => Escaped::Char('\u{000C}'),
        'e' => Escaped::Char('\u{001B}'),
        'v' => Escaped::Char('\u{000B}'),
        'a' => Escaped::Char('\u{0007}'),
        '0'..='7' => Escaped::Complex(ComplexEscape::octal(ch as u32 - '0' as u32)),
        'u' | 'U' => Escaped::Complex(ComplexEscape::new(Radix::Unicode)),
        'x' | 'X' => Escaped::Complex(ComplexEscape::new(Radix::Hex)),
        'o' | 'O' => Escaped::Complex(ComplexEscape::new(Radix::Octal)),
        'd' | 'D' => Escaped::Complex(ComplexEscape::new(Radix::Decimal)),
        _ => Escaped::Literal,
    }
}
