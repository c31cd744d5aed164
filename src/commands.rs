use std::sync::Arc;

use teloxide::{
    prelude::Requester,
    types::Message,
    utils::command::BotCommands,
    Bot,
};
use tracing::instrument;

use crate::{
    database::ScoreStore,
    engine::QuizEngine,
    render,
    runner::{deliver, player, report},
    HandlerResult,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "display this text.")]
    Help,
    #[command(description = "start the bot.")]
    Start,
    #[command(description = "choose a quiz category.")]
    Cat,
    #[command(description = "repeat the current question.")]
    Next,
    #[command(description = "show your score in this chat.")]
    Score,
    #[command(description = "show the highscores of this chat.")]
    Highscores,
    #[command(description = "show the global leaderboard.")]
    Leaderboard,
    #[command(description = "stop playing.")]
    End,
}

#[instrument(level = "info", skip(bot, msg), fields(chat = msg.chat.id.0))]
pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, msg), fields(chat = msg.chat.id.0))]
pub(crate) async fn start(bot: Bot, msg: Message) -> HandlerResult {
    deliver(&bot, msg.chat.id, None, render::greeting()).await
}

#[instrument(level = "info", skip(bot, msg, engine), fields(chat = msg.chat.id.0))]
pub(crate) async fn categories<S: ScoreStore>(
    bot: Bot,
    msg: Message,
    engine: Arc<QuizEngine<S>>,
) -> HandlerResult {
    deliver(
        &bot,
        msg.chat.id,
        None,
        render::categories(engine.catalog().names()),
    )
    .await
}

#[instrument(level = "info", skip(bot, msg, engine), fields(chat = msg.chat.id.0))]
pub(crate) async fn next<S: ScoreStore>(
    bot: Bot,
    msg: Message,
    engine: Arc<QuizEngine<S>>,
) -> HandlerResult {
    match engine.present_question(msg.chat.id.0).await {
        Ok(question) => deliver(&bot, msg.chat.id, None, render::question(&question)).await,
        Err(err) => report(&bot, msg.chat.id, err).await,
    }
}

#[instrument(level = "info", skip(bot, msg, engine), fields(chat = msg.chat.id.0))]
pub(crate) async fn score<S: ScoreStore>(
    bot: Bot,
    msg: Message,
    engine: Arc<QuizEngine<S>>,
) -> HandlerResult {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    match engine.score(player(user).id, msg.chat.id.0).await {
        Ok(score) => deliver(&bot, msg.chat.id, None, render::score(score)).await,
        Err(err) => report(&bot, msg.chat.id, err).await,
    }
}

#[instrument(level = "info", skip(bot, msg, engine), fields(chat = msg.chat.id.0))]
pub(crate) async fn highscores<S: ScoreStore>(
    bot: Bot,
    msg: Message,
    engine: Arc<QuizEngine<S>>,
) -> HandlerResult {
    match engine.chat_highscores(msg.chat.id.0).await {
        Ok(records) => deliver(&bot, msg.chat.id, None, render::chat_highscores(&records)).await,
        Err(err) => report(&bot, msg.chat.id, err).await,
    }
}

#[instrument(level = "info", skip(bot, msg, engine))]
pub(crate) async fn leaderboard<S: ScoreStore>(
    bot: Bot,
    msg: Message,
    engine: Arc<QuizEngine<S>>,
) -> HandlerResult {
    match engine.global_leaderboard().await {
        Ok(records) => deliver(&bot, msg.chat.id, None, render::leaderboard(&records)).await,
        Err(err) => report(&bot, msg.chat.id, err).await,
    }
}

#[instrument(level = "info", skip(bot, msg, engine), fields(chat = msg.chat.id.0))]
pub(crate) async fn end<S: ScoreStore>(
    bot: Bot,
    msg: Message,
    engine: Arc<QuizEngine<S>>,
) -> HandlerResult {
    if !engine.end(msg.chat.id.0).await {
        tracing::debug!("Chat {} had no quiz to end", msg.chat.id.0);
    }
    deliver(&bot, msg.chat.id, None, render::farewell()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quiz_commands() {
        assert!(matches!(
            Command::parse("/cat", "quizbot"),
            Ok(Command::Cat)
        ));
        assert!(matches!(
            Command::parse("/highscores@quizbot", "quizbot"),
            Ok(Command::Highscores)
        ));
        assert!(Command::parse("/unknown", "quizbot").is_err());
    }

    #[test]
    fn help_lists_every_command() {
        let text = Command::descriptions().to_string();
        for command in ["/cat", "/score", "/highscores", "/leaderboard", "/end", "/next"] {
            assert!(text.contains(command), "{command} missing from help");
        }
    }
}
