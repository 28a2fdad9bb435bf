//! Line-oriented host console.
//!
//! Each stdin line is one host event. Connect events go through the
//! admission gate, `joined` reports a finished connection, and `tribe`
//! plays a player chat command:
//!
//! ```text
//! connect 76561198000000001 Kora
//! joined 76561198000000001 Kora
//! tribe 76561198000000001 -name
//! save
//! status
//! quit
//! ```

use tribal_core::Hooks;
use tribal_types::{Category, PersonId};

/// Reply to the console `help` event.
pub const CONSOLE_HELP: &str = "Console events:\n\
    connect <id> <name>   Connection attempt through the admission gate\n\
    joined <id> <name>    Connection finished\n\
    tribe <id> [args]     Player chat command, e.g. tribe 7 -name\n\
    save                  Save the game now\n\
    status                Show population and open tribe\n\
    quit                  Save and stop";

/// One host event read from the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A client is trying to connect.
    Connect {
        /// Connecting identity.
        id: PersonId,
        /// Display name reported by the host.
        name: String,
    },
    /// A client finished connecting.
    Joined {
        /// Connected identity.
        id: PersonId,
        /// Display name reported by the host.
        name: String,
    },
    /// A player ran the `tribe` chat command.
    Tribe {
        /// Player issuing the command.
        id: PersonId,
        /// Words after `tribe`, joined by single spaces.
        args: String,
    },
    /// Show console help.
    Help,
    /// Save immediately.
    Save,
    /// Show population status.
    Status,
    /// Stop the server.
    Quit,
}

/// Errors raised while parsing a console line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    /// The event word is not recognised.
    #[error("unknown event {0}, try help")]
    UnknownEvent(String),

    /// A required argument is missing.
    #[error("{event} needs {argument}")]
    MissingArgument {
        /// The event that was incomplete.
        event: &'static str,
        /// The argument that was missing.
        argument: &'static str,
    },

    /// The identity is not an unsigned integer.
    #[error("invalid identity {0}")]
    InvalidId(String),
}

/// Parse one console line. Blank lines yield `None`.
///
/// # Errors
///
/// Returns [`ConsoleError`] for unknown events, missing arguments, or
/// identities that are not unsigned integers.
pub fn parse(line: &str) -> Result<Option<HostEvent>, ConsoleError> {
    let mut words = line.split_whitespace();
    let Some(event) = words.next() else {
        return Ok(None);
    };

    let event = match event {
        "connect" => {
            let id = parse_id("connect", words.next())?;
            HostEvent::Connect {
                id,
                name: rest_as_name("connect", words)?,
            }
        }
        "joined" => {
            let id = parse_id("joined", words.next())?;
            HostEvent::Joined {
                id,
                name: rest_as_name("joined", words)?,
            }
        }
        "tribe" => HostEvent::Tribe {
            id: parse_id("tribe", words.next())?,
            args: words.collect::<Vec<_>>().join(" "),
        },
        "help" => HostEvent::Help,
        "save" => HostEvent::Save,
        "status" => HostEvent::Status,
        "quit" | "exit" => HostEvent::Quit,
        other => return Err(ConsoleError::UnknownEvent(other.to_owned())),
    };
    Ok(Some(event))
}

fn parse_id(event: &'static str, word: Option<&str>) -> Result<PersonId, ConsoleError> {
    let word = word.ok_or(ConsoleError::MissingArgument {
        event,
        argument: "an identity",
    })?;
    word.parse()
        .map_err(|_parse_error| ConsoleError::InvalidId(word.to_owned()))
}

fn rest_as_name<'a>(
    event: &'static str,
    words: impl Iterator<Item = &'a str>,
) -> Result<String, ConsoleError> {
    let name = words.collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return Err(ConsoleError::MissingArgument {
            event,
            argument: "a name",
        });
    }
    Ok(name)
}

/// Apply an event to the hooks and return the text to print, if any.
///
/// [`HostEvent::Quit`] is handled by the caller and yields nothing here.
pub fn dispatch(hooks: &Hooks, event: HostEvent) -> Option<String> {
    match event {
        HostEvent::Connect { id, name } => Some(hooks.on_connect_attempt(id, &name).map_or_else(
            || format!("{id} allowed"),
            |reason| format!("{id} refused: {reason}"),
        )),
        HostEvent::Joined { id, name } => {
            hooks.on_player_connected(id, &name);
            None
        }
        HostEvent::Tribe { id, args } => hooks.on_chat_command(id, &format!("tribe {args}")),
        HostEvent::Help => Some(CONSOLE_HELP.to_owned()),
        HostEvent::Save => Some(if hooks.on_save_requested() {
            String::from("saved")
        } else {
            String::from("save failed, see log")
        }),
        HostEvent::Status => Some(status_line(hooks)),
        HostEvent::Quit => None,
    }
}

fn status_line(hooks: &Hooks) -> String {
    hooks.game().read(|game| {
        let world = game.world();
        let open = world
            .current_open_tribe()
            .map_or_else(|| String::from("none"), free_slots);
        format!(
            "game {} population {} populating {} open tribe {open}",
            game.game_id(),
            world.population(),
            world.is_populating(),
        )
    })
}

/// `Alpha (male 1, female 2)`: the tribe name with free slots per category.
fn free_slots(tribe: &tribal_world::Tribe) -> String {
    let slots = Category::ALL
        .iter()
        .map(|&c| format!("{c} {}", tribe.remaining(c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} ({slots})", tribe.name())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tribal_core::{AdmissionGateway, GameState, MemoryStore, SharedGame};
    use tribal_world::{FixedCategory, StartingWorld};

    use super::*;

    fn hooks() -> Hooks {
        let game = GameState::new(&StartingWorld::default()).unwrap();
        let gateway = AdmissionGateway::default()
            .with_category_source(Box::new(FixedCategory(Category::Female)));
        Hooks::new(
            Arc::new(SharedGame::new(game)),
            Arc::new(gateway),
            Arc::new(MemoryStore::new()),
        )
    }

    #[test]
    fn parses_connect_with_multi_word_name() {
        assert_eq!(
            parse("connect 42 Old Kora").unwrap(),
            Some(HostEvent::Connect {
                id: PersonId(42),
                name: String::from("Old Kora"),
            })
        );
    }

    #[test]
    fn blank_line_is_no_event() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn parse_errors_are_descriptive() {
        assert_eq!(
            parse("connect").unwrap_err(),
            ConsoleError::MissingArgument {
                event: "connect",
                argument: "an identity",
            }
        );
        assert_eq!(
            parse("connect 5").unwrap_err(),
            ConsoleError::MissingArgument {
                event: "connect",
                argument: "a name",
            }
        );
        assert_eq!(
            parse("joined abc Kora").unwrap_err(),
            ConsoleError::InvalidId(String::from("abc"))
        );
        assert!(matches!(
            parse("dance").unwrap_err(),
            ConsoleError::UnknownEvent(_)
        ));
    }

    #[test]
    fn tribe_event_keeps_arguments() {
        assert_eq!(
            parse("tribe 7 -name").unwrap(),
            Some(HostEvent::Tribe {
                id: PersonId(7),
                args: String::from("-name"),
            })
        );
    }

    #[test]
    fn dispatch_runs_a_session() {
        let hooks = hooks();
        let reply = dispatch(&hooks, parse("connect 7 Kora").unwrap().unwrap());
        assert_eq!(reply.as_deref(), Some("7 allowed"));

        assert_eq!(dispatch(&hooks, parse("joined 7 Kora").unwrap().unwrap()), None);

        let reply = dispatch(&hooks, parse("tribe 7 -name").unwrap().unwrap());
        assert_eq!(reply.as_deref(), Some("Tribe Name: Alpha"));

        let reply = dispatch(&hooks, HostEvent::Status).unwrap();
        assert!(reply.contains("population 1"));
        assert!(reply.ends_with("open tribe Alpha (male 2, female 1)"));

        assert_eq!(dispatch(&hooks, HostEvent::Save).as_deref(), Some("saved"));
    }

    #[test]
    fn refused_connect_prints_reason() {
        let hooks = hooks();
        for id in 1..=2 {
            dispatch(&hooks, parse(&format!("connect {id} p")).unwrap().unwrap());
        }
        let reply = dispatch(&hooks, parse("connect 3 p").unwrap().unwrap()).unwrap();
        assert!(reply.starts_with("3 refused: Your character is female."));
    }
}
