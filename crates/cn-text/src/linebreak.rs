//! Line wrapping for mixed Chinese/Latin text
//!
//! Widths are counted in display columns: full-width (CJK) characters take
//! two columns, everything else one.

/// Check if a character is rendered full-width
pub fn is_wide_char(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F      // Hangul Jamo
        | 0x2E80..=0x303E    // CJK radicals, punctuation
        | 0x3041..=0x33FF    // Kana, CJK compatibility
        | 0x3400..=0x4DBF    // CJK extension A
        | 0x4E00..=0x9FFF    // CJK unified ideographs
        | 0xA000..=0xA4CF    // Yi
        | 0xAC00..=0xD7A3    // Hangul syllables
        | 0xF900..=0xFAFF    // CJK compatibility ideographs
        | 0xFE30..=0xFE4F    // CJK compatibility forms
        | 0xFF00..=0xFF60    // Fullwidth forms
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x2FFFD
        | 0x30000..=0x3FFFD
    )
}

/// Display width of a character in columns
pub fn char_width(c: char) -> usize {
    if is_wide_char(c) {
        2
    } else {
        1
    }
}

/// Display width of a string in columns
pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

/// Check if a character must not begin a line (closing punctuation)
pub fn is_line_start_forbidden(c: char) -> bool {
    matches!(
        c,
        '，' | '。' | '、' | '；' | '：' | '？' | '！' | '）' | '」' | '』' | '】' | '》' | '〉'
            | '”' | '’' | '…' | '·' | ',' | '.' | ';' | ':' | '?' | '!' | ')' | ']'
    )
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Space,
    Word(&'a str),
}

/// Split a paragraph into break opportunities: each wide character is its
/// own token, runs of narrow non-space characters stay together.
fn tokenize(paragraph: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;

    for (i, c) in paragraph.char_indices() {
        if c.is_whitespace() || is_wide_char(c) {
            if let Some(start) = word_start.take() {
                tokens.push(Token::Word(&paragraph[start..i]));
            }
            if c.is_whitespace() {
                tokens.push(Token::Space);
            } else {
                tokens.push(Token::Word(&paragraph[i..i + c.len_utf8()]));
            }
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    if let Some(start) = word_start {
        tokens.push(Token::Word(&paragraph[start..]));
    }

    tokens
}

/// Wrap text to lines of at most `max_columns` display columns
///
/// Explicit newlines always break. Latin words are kept whole unless longer
/// than a line. Closing punctuation hangs on the previous line instead of
/// starting a new one, so such a line may exceed the limit by one character.
///
/// # Examples
/// ```
/// use cn_text::wrap_text;
/// assert_eq!(wrap_text("出库单测试文本", 6), vec!["出库单", "测试文", "本"]);
/// ```
pub fn wrap_text(text: &str, max_columns: usize) -> Vec<String> {
    if max_columns == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph.trim_end_matches('\r'), max_columns, &mut lines);
    }
    lines
}

fn wrap_paragraph(paragraph: &str, max_columns: usize, lines: &mut Vec<String>) {
    let mut line = String::new();
    let mut width = 0;

    for token in tokenize(paragraph) {
        let word = match token {
            Token::Space => {
                if width > 0 && width < max_columns {
                    line.push(' ');
                    width += 1;
                }
                continue;
            }
            Token::Word(word) => word,
        };

        let word_width = display_width(word);
        let hangs = width > 0 && word.chars().next().is_some_and(is_line_start_forbidden);
        if width + word_width <= max_columns || hangs {
            line.push_str(word);
            width += word_width;
            continue;
        }

        if width > 0 {
            lines.push(line.trim_end().to_string());
            line.clear();
            width = 0;
        }

        if word_width <= max_columns {
            line.push_str(word);
            width = word_width;
            continue;
        }

        // Word longer than a whole line: break between characters
        for c in word.chars() {
            let w = char_width(c);
            if width > 0 && width + w > max_columns {
                lines.push(std::mem::take(&mut line));
                width = 0;
            }
            line.push(c);
            width += w;
        }
    }

    lines.push(line.trim_end().to_string());
}
