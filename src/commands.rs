use serde::Deserialize;
use serde_json::{Number, Value};
use teloxide::utils::{command::BotCommands, html};

pub const LAUNCH_BUTTON_TEXT: &str = "🎮 Open Nimble Roulette";
pub const DATA_RECEIVED_TEXT: &str =
    "🎉 Data received! Game result processing is coming soon.";
pub const WIN_MARKER: &str = "You won";
pub const TRY_AGAIN_MARKER: &str = "Try again";

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "open the Nimble Roulette game.")]
    Start(String),
}

impl Command {
    /// Parses `text` as a command addressed to this bot (or to no bot in particular).
    pub fn parse_for(text: &str, bot_username: &str) -> Option<Self> {
        Self::parse(text.trim(), bot_username).ok()
    }
}

/// Result posted back by the served page. Computed client-side; never validated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameResult {
    pub result: Value,
    pub win: bool,
    pub balance: Number,
}

impl GameResult {
    pub fn parse(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    fn result_text(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Welcome text for the start reply, HTML parse mode.
pub fn welcome_text(user_name: &str) -> String {
    let name = html::escape(user_name);
    format!(
        "🎰 Welcome to <b>Nimble Roulette</b>, {name}! 🎰\n\n\
         🎲 Ready to try your luck? Tap the button below to open the game!\n\n\
         🎮 <b>Nimble Roulette</b> is a game where anyone can be a winner!"
    )
}

pub fn game_result_text(game: &GameResult) -> String {
    let result = game.result_text();
    let balance = &game.balance;
    if game.win {
        format!("🎉 {WIN_MARKER}! Result: {result}\n💰 Balance: {balance}")
    } else {
        format!("😔 {TRY_AGAIN_MARKER}! Result: {result}\n💰 Balance: {balance}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_variants() {
        assert_eq!(
            Command::parse_for("/start", "nimble_bot"),
            Some(Command::Start(String::new()))
        );
        assert_eq!(
            Command::parse_for("/start@nimble_bot", "nimble_bot"),
            Some(Command::Start(String::new()))
        );
        assert_eq!(
            Command::parse_for("/start ref42", "nimble_bot"),
            Some(Command::Start("ref42".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_other_text() {
        assert_eq!(Command::parse_for("/start@other_bot", "nimble_bot"), None);
        assert_eq!(Command::parse_for("/spin", "nimble_bot"), None);
        assert_eq!(Command::parse_for("hello", "nimble_bot"), None);
    }

    #[test]
    fn test_welcome_text_contains_escaped_name() {
        let text = welcome_text("Ann");
        assert!(text.contains("Ann"));
        assert!(text.contains("Nimble Roulette"));

        let text = welcome_text("<b>Bob</b> & co");
        assert!(text.contains("&lt;b&gt;Bob&lt;/b&gt; &amp; co"));
    }

    #[test]
    fn test_game_result_parse() {
        let game = GameResult::parse(r#"{"result":"17 red","win":true,"balance":1250}"#).unwrap();
        assert!(game.win);
        assert_eq!(game.result, Value::String("17 red".to_string()));
        assert_eq!(game.balance.to_string(), "1250");

        assert!(GameResult::parse("not json").is_err());
        assert!(GameResult::parse(r#"{"result":"17","balance":10}"#).is_err());
    }

    #[test]
    fn test_game_result_text_branches_on_win() {
        let win = GameResult::parse(r#"{"result":7,"win":true,"balance":99.5}"#).unwrap();
        let text = game_result_text(&win);
        assert!(text.contains(WIN_MARKER));
        assert!(text.contains("Result: 7"));
        assert!(text.contains("Balance: 99.5"));
        assert!(!text.contains(TRY_AGAIN_MARKER));

        let loss = GameResult::parse(r#"{"result":"0 green","win":false,"balance":-20}"#).unwrap();
        let text = game_result_text(&loss);
        assert!(text.contains(TRY_AGAIN_MARKER));
        assert!(text.contains("Result: 0 green"));
        assert!(text.contains("Balance: -20"));
        assert!(!text.contains(WIN_MARKER));
    }
}
