//! Line commands typed at the prompt.

use domain::FriendId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set the add form's name field.
    Name(String),
    /// Set the add form's age field.
    Age(String),
    /// Submit the add form, optionally filling it first.
    Add(Option<(String, String)>),
    Edit(FriendId),
    EditName(String),
    EditAge(String),
    Update,
    Cancel,
    Delete(FriendId),
    Refresh,
    Dismiss,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  name <text>          set the name field of the add form
  age <text>           set the age field of the add form
  add [<name> <age>]   add a friend from the form (or from the arguments)
  edit <id>            edit a friend
  edit-name <text>     change the name being edited
  edit-age <text>      change the age being edited
  update               save the edit
  cancel               discard the edit
  delete <id>          delete a friend
  refresh              reload the list
  dismiss              hide the current error
  help                 show this help
  quit                 exit";

/// Parse one input line. Field values keep their inner spacing.
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    match word.to_ascii_lowercase().as_str() {
        "name" => Ok(Command::Name(rest.to_string())),
        "age" => Ok(Command::Age(rest.to_string())),
        "add" => parse_add(rest),
        "edit" => parse_id(rest, "edit").map(Command::Edit),
        "edit-name" => Ok(Command::EditName(rest.to_string())),
        "edit-age" => Ok(Command::EditAge(rest.to_string())),
        "update" | "save" => Ok(Command::Update),
        "cancel" => Ok(Command::Cancel),
        "delete" | "rm" => parse_id(rest, "delete").map(Command::Delete),
        "refresh" | "list" | "ls" => Ok(Command::Refresh),
        "dismiss" => Ok(Command::Dismiss),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        "" => Err("type `help` for the list of commands".into()),
        unk => Err(format!("unknown command: {}", unk)),
    }
}

fn parse_add(rest: &str) -> Result<Command, String> {
    if rest.is_empty() {
        return Ok(Command::Add(None));
    }
    match rest.rsplit_once(char::is_whitespace) {
        Some((name, age)) => Ok(Command::Add(Some((name.trim().to_string(), age.to_string())))),
        None => Err("add expects <name> <age>, or no arguments to submit the form".into()),
    }
}

fn parse_id(rest: &str, cmd: &str) -> Result<FriendId, String> {
    rest.parse::<u64>()
        .map(FriendId::new)
        .map_err(|_| format!("{} expects a numeric id, got `{}`", cmd, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_field_commands_keep_spacing() {
        assert_eq!(parse("name  Ann  Lee ").unwrap(), Command::Name("Ann  Lee".into()));
        assert_eq!(parse("age 30").unwrap(), Command::Age("30".into()));
        assert_eq!(parse("name").unwrap(), Command::Name(String::new()));
    }

    #[test]
    fn add_with_and_without_arguments() {
        assert_eq!(parse("add").unwrap(), Command::Add(None));
        assert_eq!(
            parse("add Ann Lee 30").unwrap(),
            Command::Add(Some(("Ann Lee".into(), "30".into())))
        );
        assert!(parse("add Ann").is_err());
    }

    #[test]
    fn id_commands() {
        assert_eq!(parse("edit 3").unwrap(), Command::Edit(FriendId::new(3)));
        assert_eq!(parse("DELETE 12").unwrap(), Command::Delete(FriendId::new(12)));
        assert!(parse("edit x").unwrap_err().contains("numeric id"));
        assert!(parse("delete").is_err());
    }

    #[test]
    fn simple_commands_and_aliases() {
        assert_eq!(parse("update").unwrap(), Command::Update);
        assert_eq!(parse("save").unwrap(), Command::Update);
        assert_eq!(parse(" cancel ").unwrap(), Command::Cancel);
        assert_eq!(parse("ls").unwrap(), Command::Refresh);
        assert_eq!(parse("q").unwrap(), Command::Quit);
        assert_eq!(parse("edit-age 31").unwrap(), Command::EditAge("31".into()));
    }

    #[test]
    fn unknown_and_empty() {
        assert!(parse("frobnicate").unwrap_err().contains("unknown command"));
        assert!(parse("   ").is_err());
    }
}
