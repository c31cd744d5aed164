use teloxide::{
    dispatching::{UpdateFilterExt, UpdateHandler},
    dptree,
    prelude::Requester,
    types::{Message, Update},
    Bot,
};
use tracing::instrument;

use crate::{
    commands::{self, Command},
    database::ScoreStore,
    runner, HandlerResult,
};

/// Dispatch tree: commands and plain messages first, then button presses.
/// Handlers expect an `Arc<QuizEngine<S>>` among the dependencies.
pub fn schema<S: ScoreStore + 'static>(
) -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(commands::help))
        .branch(case![Command::Start].endpoint(commands::start))
        .branch(case![Command::Cat].endpoint(commands::categories::<S>))
        .branch(case![Command::Next].endpoint(commands::next::<S>))
        .branch(case![Command::Score].endpoint(commands::score::<S>))
        .branch(case![Command::Highscores].endpoint(commands::highscores::<S>))
        .branch(case![Command::Leaderboard].endpoint(commands::leaderboard::<S>))
        .branch(case![Command::End].endpoint(commands::end::<S>));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .endpoint(invalid_input);

    let callback_handler =
        Update::filter_callback_query().endpoint(runner::handle_callback::<S>);

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}

#[instrument(level = "info", skip(bot, msg), fields(chat = msg.chat.id.0))]
async fn invalid_input(bot: Bot, msg: Message) -> HandlerResult {
    // Group chats are full of messages that aren't meant for the bot.
    if msg.chat.is_private() {
        bot.send_message(
            msg.chat.id,
            "Unable to handle the message. Enter /help to see usages.",
        )
        .await?;
    }
    Ok(())
}
