use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::render::{Choice, Layout};

/// Buttons in the order given, stacked or side by side depending on `layout`.
pub(crate) fn choices_keyboard(choices: &[Choice], layout: Layout) -> InlineKeyboardMarkup {
    let buttons = choices.iter().map(|choice| {
        InlineKeyboardButton::callback(choice.label.clone(), choice.payload.clone())
    });

    let keyboard: Vec<Vec<InlineKeyboardButton>> = match layout {
        Layout::Column => buttons.map(|button| vec![button]).collect(),
        Layout::Row => vec![buttons.collect()],
    };

    InlineKeyboardMarkup::new(keyboard)
}
