use std::borrow::Cow;

/// Shortens `text` to at most `max_chars` characters, ending with an ellipsis when cut.
pub fn truncate_label(text: &str, max_chars: usize) -> Cow<'_, str> {
    if text.chars().count() <= max_chars {
        return Cow::Borrowed(text);
    }
    if max_chars == 0 {
        return Cow::Borrowed("");
    }

    let mut shortened = text.chars().take(max_chars - 1).collect::<String>();
    shortened.push('…');
    Cow::Owned(shortened)
}

pub fn format_lifespan(birth_turn: u32, extinction_turn: Option<u32>) -> String {
    match extinction_turn {
        Some(extinction) => format!("turn {birth_turn} – {extinction}"),
        None => format!("since turn {birth_turn}"),
    }
}

pub fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_cut_on_char_boundaries() {
        assert_eq!(truncate_label("Velox", 8), "Velox");
        assert_eq!(truncate_label("Ærosaurus major", 6), "Ærosa…");
        assert_eq!(truncate_label("abc", 0), "");
    }

    #[test]
    fn counts_are_grouped() {
        assert_eq!(format_count(7), "7");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn lifespans_mention_extinction() {
        assert_eq!(format_lifespan(3, None), "since turn 3");
        assert_eq!(format_lifespan(3, Some(9)), "turn 3 – 9");
    }
}
