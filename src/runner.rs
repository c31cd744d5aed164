use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::{EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{CallbackQuery, ChatId, MessageId, User},
    Bot,
};
use tracing::instrument;

use crate::{
    database::ScoreStore,
    engine::{Player, QuizEngine},
    error::QuizError,
    keyboard::choices_keyboard,
    render::{self, Delivery, Render, CATEGORY_PREFIX},
    HandlerResult,
};

pub(crate) fn player(user: &User) -> Player {
    Player::new(user.id.0 as i64, user.full_name())
}

/// Sends `render` to the chat, or edits `message_id` in place when the render asks for it.
pub(crate) async fn deliver(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    render: Render,
) -> HandlerResult {
    let keyboard =
        (!render.choices.is_empty()).then(|| choices_keyboard(&render.choices, render.layout));

    match (render.delivery, message_id) {
        (Delivery::Replace, Some(message_id)) => {
            let request = bot.edit_message_text(chat_id, message_id, render.text);
            match keyboard {
                Some(keyboard) => request.reply_markup(keyboard).await?,
                None => request.await?,
            };
        }
        _ => {
            let request = bot.send_message(chat_id, render.text);
            match keyboard {
                Some(keyboard) => request.reply_markup(keyboard).await?,
                None => request.await?,
            };
        }
    }

    Ok(())
}

/// Turns an engine error into a reply; nothing here is fatal for the bot.
pub(crate) async fn report(bot: &Bot, chat_id: ChatId, err: QuizError) -> HandlerResult {
    match &err {
        QuizError::Storage(source) => {
            tracing::error!("Chat {}: storage failure: {}", chat_id.0, source)
        }
        other => tracing::warn!("Chat {}: rejected: {}", chat_id.0, other),
    }
    bot.send_message(chat_id, err.user_message()).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, q, engine), fields(data = ?q.data))]
pub(crate) async fn handle_callback<S: ScoreStore>(
    bot: Bot,
    q: CallbackQuery,
    engine: Arc<QuizEngine<S>>,
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;

    let (Some(data), Some(chat_id)) = (q.data.as_deref(), q.chat_id()) else {
        tracing::warn!("Callback query without data or chat");
        return Ok(());
    };
    let message_id = q.message.as_ref().map(|message| message.id());

    match data.strip_prefix(CATEGORY_PREFIX) {
        Some(category) => select_category(&bot, chat_id, message_id, category, &engine).await,
        None => take_answer(&bot, chat_id, message_id, &q.from, data, &engine).await,
    }
}

async fn select_category<S: ScoreStore>(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    category: &str,
    engine: &QuizEngine<S>,
) -> HandlerResult {
    match engine.select_category(chat_id.0, category).await {
        Ok(question) => deliver(bot, chat_id, message_id, render::question(&question).replacing()).await,
        Err(err) => report(bot, chat_id, err).await,
    }
}

async fn take_answer<S: ScoreStore>(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    user: &User,
    answer: &str,
    engine: &QuizEngine<S>,
) -> HandlerResult {
    let outcome = match engine.submit_answer(&player(user), chat_id.0, answer).await {
        Ok(outcome) => outcome,
        Err(err) => return report(bot, chat_id, err).await,
    };

    deliver(
        bot,
        chat_id,
        message_id,
        render::verdict(&user.first_name, &outcome),
    )
    .await?;
    deliver(bot, chat_id, None, render::next_step(&outcome.next)).await
}
