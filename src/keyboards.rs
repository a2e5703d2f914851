//! Keyboard layouts: the persistent reply menu and the inline 0-10 scale.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

/// Menu button that opens the mood scale.
pub const ADD_MOOD_LABEL: &str = "📝 Add mood";
/// Menu button that requests weekly stats.
pub const VIEW_STATS_LABEL: &str = "📊 View stats";

/// Persistent two-button reply menu sent with the welcome message.
pub fn main_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(VIEW_STATS_LABEL),
        KeyboardButton::new(ADD_MOOD_LABEL),
    ]])
    .resize_keyboard()
}

/// Inline 0-10 scale in two rows (0-4 and 5-10). Callback data is the
/// score digit itself.
pub fn mood_scale() -> InlineKeyboardMarkup {
    let row = |range: std::ops::RangeInclusive<u8>| -> Vec<InlineKeyboardButton> {
        range
            .map(|n| InlineKeyboardButton::callback(n.to_string(), n.to_string()))
            .collect()
    };
    InlineKeyboardMarkup::new(vec![row(0..=4), row(5..=10)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_main_menu_layout() {
        let menu = main_menu();
        assert_eq!(menu.keyboard.len(), 1);
        assert_eq!(menu.keyboard[0].len(), 2);
        assert_eq!(menu.keyboard[0][0].text, VIEW_STATS_LABEL);
        assert_eq!(menu.keyboard[0][1].text, ADD_MOOD_LABEL);
        assert!(menu.resize_keyboard);
    }

    #[test]
    fn test_mood_scale_rows() {
        let scale = mood_scale();
        assert_eq!(scale.inline_keyboard.len(), 2);
        assert_eq!(scale.inline_keyboard[0].len(), 5);
        assert_eq!(scale.inline_keyboard[1].len(), 6);
    }

    #[test]
    fn test_mood_scale_callback_data_matches_labels() {
        let scale = mood_scale();
        let buttons: Vec<_> = scale.inline_keyboard.iter().flatten().collect();
        assert_eq!(buttons.len(), 11);

        for (i, button) in buttons.iter().enumerate() {
            assert_eq!(button.text, i.to_string());
            match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => {
                    assert_eq!(*data, i.to_string());
                }
                other => panic!("unexpected button kind: {other:?}"),
            }
        }
    }
}
