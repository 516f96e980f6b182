use nb_core::{ArticleId, FetchQuery, SectionName, SortKey};
use nb_session::SessionEvent;

pub const HELP: &str = "\
commands:
  refresh                  fetch the latest articles
  search <term>            fetch articles matching <term>
  sort <date|duration>     change the sort order
  select <id>              show an article in the detail pane
  toggle <id> <section>    expand/collapse summary, article or ai-summary
  show                     print the detail pane
  help                     this text
  quit                     leave";

#[derive(Debug, PartialEq)]
pub enum Command {
    Event(SessionEvent),
    Show,
    Help,
    Quit,
}

/// Parses one line typed in interactive mode. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (verb.to_lowercase().as_str(), rest.as_slice()) {
        ("refresh" | "r", []) => Command::Event(SessionEvent::Refresh(FetchQuery::Latest)),
        ("search" | "/", terms) if !terms.is_empty() => {
            Command::Event(SessionEvent::Refresh(FetchQuery::from_term(Some(&terms.join(" ")))))
        }
        ("sort", [key]) => Command::Event(SessionEvent::SortKeyChanged(key.parse::<SortKey>()?)),
        ("select" | "s", [id]) => Command::Event(SessionEvent::ArticleSelected(ArticleId::from(*id))),
        ("toggle" | "t", [id, section]) => Command::Event(SessionEvent::SectionToggled(
            ArticleId::from(*id),
            section.parse::<SectionName>()?,
        )),
        ("show", []) => Command::Show,
        ("help" | "?", []) => Command::Help,
        ("quit" | "exit" | "q", []) => Command::Quit,
        _ => return Err(format!("Unrecognised command: {} (try help)", line.trim())),
    };
    Ok(Some(command))
}
