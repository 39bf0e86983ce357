/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    New,
    List,
    Select(usize),
    Rename(usize, String),
    Delete(usize),
    Help,
    Quit,
    Invalid(String),
}

pub const HELP: &str = "\
Type a message and press Enter to send it to the active conversation.
  /new              start a new conversation
  /list             show all conversations
  /select N         switch to conversation N
  /rename N NAME    rename conversation N
  /delete N         delete conversation N
  /help             show this help
  /quit             leave";

impl Command {
    pub fn parse(line: &str) -> Self {
        let Some(body) = line.trim_start().strip_prefix('/') else {
            return Command::Send(line.to_string());
        };
        let (verb, rest) = match body.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (body.trim_end(), ""),
        };

        match verb {
            "new" => Command::New,
            "list" | "ls" => Command::List,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "select" => Self::with_position(rest, verb, Command::Select),
            "delete" | "rm" => Self::with_position(rest, verb, Command::Delete),
            "rename" => {
                let (position, name) = match rest.split_once(char::is_whitespace) {
                    Some((position, name)) => (position, name.trim()),
                    None => (rest, ""),
                };
                Self::with_position(position, verb, |n| Command::Rename(n, name.to_string()))
            }
            other => Command::Invalid(format!("Unknown command '/{}'. Type /help for the list.", other)),
        }
    }

    fn with_position(arg: &str, verb: &str, build: impl FnOnce(usize) -> Command) -> Self {
        match arg.parse::<usize>() {
            Ok(n) if n > 0 => build(n),
            _ => Command::Invalid(format!("Usage: /{} N (N is a position from /list)", verb)),
        }
    }
}
