//! Player chat commands.
//!
//! The command surface is read-only: it reports on the world but never
//! changes it. Each function returns the reply text, or `None` when the
//! command gets no reply at all.

use tribal_types::PersonId;
use tribal_world::WorldState;

/// Reply to `help`.
pub const HELP_TEXT: &str = "Available commands: \n\
    help\t\t\t Display help.\n\
    tribe\t\t\t Show tribe information.";

/// Reply to `tribe` and `tribe -help`.
pub const TRIBE_HELP_TEXT: &str = "Available commands: \n\
    tribe -help\t\t\t Displays tribe related options.\n\
    tribe -name\t\t\t Display name of your tribe.";

/// Shown in place of a tribe name for persons without one.
pub const NO_TRIBE: &str = "None";

/// Answer a chat command issued by `caller`.
///
/// `command` is the command word without arguments; `args` are the words
/// after it. Unknown commands and unknown `tribe` options get no reply.
pub fn respond(
    world: &WorldState,
    caller: PersonId,
    command: &str,
    args: &[&str],
) -> Option<String> {
    match command {
        "help" => Some(HELP_TEXT.to_owned()),
        "tribe" => tribe_command(world, caller, args),
        _ => None,
    }
}

fn tribe_command(world: &WorldState, caller: PersonId, args: &[&str]) -> Option<String> {
    match args.first().copied() {
        None | Some("-help") => Some(TRIBE_HELP_TEXT.to_owned()),
        Some("-name") => Some(tribe_name_reply(world, caller)),
        Some(_) => None,
    }
}

/// `Tribe Name: <name>`, or `Tribe Name: None` for persons without a tribe.
pub fn tribe_name_reply(world: &WorldState, caller: PersonId) -> String {
    format!(
        "Tribe Name: {}",
        world.tribe_name_of(caller).unwrap_or(NO_TRIBE)
    )
}
