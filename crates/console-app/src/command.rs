use trade_core::TradeSide;

use crate::router::Section;

/// A parsed input line. Each variant corresponds to one UI event the app
/// coordinator knows how to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Register { username: String, password: String },
    Navigate(Section),
    OpenTrade { symbol: String, side: TradeSide },
    Side(TradeSide),
    /// Raw quantity text; coercion to a number happens in the draft.
    Quantity(String),
    Submit,
    Cancel,
    Logout,
    Refresh,
    Help,
    Quit,
}

/// Parse one input line. Keywords are case-insensitive; usernames,
/// passwords and quantity text pass through untouched.
pub fn parse(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let keyword = match parts.next() {
        Some(word) => word.to_ascii_lowercase(),
        None => return Err("Type 'help' for the list of commands.".to_string()),
    };
    let rest: Vec<&str> = parts.collect();

    let command = match keyword.as_str() {
        "login" => {
            let [username, password] = two_args(&rest, "login <username> <password>")?;
            Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            }
        }
        "register" => {
            let [username, password] = two_args(&rest, "register <username> <password>")?;
            Command::Register {
                username: username.to_string(),
                password: password.to_string(),
            }
        }
        "dashboard" => Command::Navigate(Section::Dashboard),
        "stocks" => Command::Navigate(Section::Stocks),
        "portfolio" => Command::Navigate(Section::Portfolio),
        "history" => Command::Navigate(Section::History),
        "trade" => match rest.as_slice() {
            [symbol] => Command::OpenTrade {
                symbol: symbol.to_ascii_uppercase(),
                side: TradeSide::Buy,
            },
            [symbol, side] => Command::OpenTrade {
                symbol: symbol.to_ascii_uppercase(),
                side: parse_side(side)?,
            },
            _ => return Err("usage: trade <symbol> [buy|sell]".to_string()),
        },
        "side" => match rest.as_slice() {
            [side] => Command::Side(parse_side(side)?),
            _ => return Err("usage: side buy|sell".to_string()),
        },
        "qty" | "quantity" => match rest.as_slice() {
            [raw] => Command::Quantity((*raw).to_string()),
            _ => return Err("usage: qty <shares>".to_string()),
        },
        "submit" => Command::Submit,
        "cancel" => Command::Cancel,
        "logout" => Command::Logout,
        "refresh" => Command::Refresh,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("Unknown command '{other}'. Type 'help'.")),
    };

    Ok(command)
}

fn two_args<'a>(rest: &[&'a str], usage: &str) -> Result<[&'a str; 2], String> {
    match rest {
        &[first, second] => Ok([first, second]),
        _ => Err(format!("usage: {usage}")),
    }
}

fn parse_side(word: &str) -> Result<TradeSide, String> {
    match word.to_ascii_lowercase().as_str() {
        "buy" => Ok(TradeSide::Buy),
        "sell" => Ok(TradeSide::Sell),
        other => Err(format!("'{other}' is not a side; use buy or sell")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_auth_commands() {
        assert_eq!(
            parse("login alice s3cret"),
            Ok(Command::Login {
                username: "alice".to_string(),
                password: "s3cret".to_string(),
            })
        );
        assert_eq!(
            parse("REGISTER bob hunter2"),
            Ok(Command::Register {
                username: "bob".to_string(),
                password: "hunter2".to_string(),
            })
        );
        assert!(parse("login alice").is_err());
    }

    #[test]
    fn parses_navigation() {
        assert_eq!(parse("dashboard"), Ok(Command::Navigate(Section::Dashboard)));
        assert_eq!(parse("stocks"), Ok(Command::Navigate(Section::Stocks)));
        assert_eq!(parse("Portfolio"), Ok(Command::Navigate(Section::Portfolio)));
        assert_eq!(parse("history"), Ok(Command::Navigate(Section::History)));
    }

    #[test]
    fn trade_defaults_to_buy_and_uppercases_the_symbol() {
        assert_eq!(
            parse("trade aapl"),
            Ok(Command::OpenTrade {
                symbol: "AAPL".to_string(),
                side: TradeSide::Buy,
            })
        );
        assert_eq!(
            parse("trade TSLA sell"),
            Ok(Command::OpenTrade {
                symbol: "TSLA".to_string(),
                side: TradeSide::Sell,
            })
        );
        assert!(parse("trade AAPL hold").is_err());
    }

    #[test]
    fn quantity_text_passes_through_unparsed() {
        assert_eq!(parse("qty 3"), Ok(Command::Quantity("3".to_string())));
        assert_eq!(parse("quantity abc"), Ok(Command::Quantity("abc".to_string())));
    }

    #[test]
    fn parses_draft_and_session_commands() {
        assert_eq!(parse("side sell"), Ok(Command::Side(TradeSide::Sell)));
        assert_eq!(parse("submit"), Ok(Command::Submit));
        assert_eq!(parse("cancel"), Ok(Command::Cancel));
        assert_eq!(parse("logout"), Ok(Command::Logout));
        assert_eq!(parse("refresh"), Ok(Command::Refresh));
        assert_eq!(parse("quit"), Ok(Command::Quit));
        assert_eq!(parse("q"), Ok(Command::Quit));
        assert_eq!(parse("?"), Ok(Command::Help));
    }

    #[test]
    fn blank_and_unknown_input_get_a_hint() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
        assert!(parse("frobnicate").unwrap_err().contains("frobnicate"));
    }
}
