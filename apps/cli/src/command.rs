use clap::{Parser, Subcommand};

/// Keystone console client.
#[derive(Debug, Parser)]
#[command(name = "keystone-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the signed-in identity
    #[command(name = "whoami")]
    WhoAmI,
    /// Evaluate the navigation guard for a location
    Guard {
        /// Location being entered
        location: String,
        /// Permission code the view requires
        permission: Option<String>,
    },
    /// List roles and permissions
    Roles,
    /// List users, optionally filtered by email or name
    Users {
        /// Case-insensitive search text
        query: Option<String>,
    },
    /// Toggle roles for a user and save the result
    Assign {
        /// Id of the user being edited
        user_id: i64,
        /// Role names to toggle, in order
        #[arg(required = true)]
        role_names: Vec<String>,
    },
    /// End the server session
    Logout,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("keystone-cli").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    #[test]
    fn parses_guard_with_optional_permission() {
        assert_eq!(
            parse(&["guard", "/admin/rbac", "rbac:read"]).ok(),
            Some(Command::Guard {
                location: "/admin/rbac".to_owned(),
                permission: Some("rbac:read".to_owned()),
            })
        );
        assert_eq!(
            parse(&["guard", "/profile"]).ok(),
            Some(Command::Guard {
                location: "/profile".to_owned(),
                permission: None,
            })
        );
    }

    #[test]
    fn parses_assign_with_role_list() {
        assert_eq!(
            parse(&["assign", "7", "viewer", "auditor"]).ok(),
            Some(Command::Assign {
                user_id: 7,
                role_names: vec!["viewer".to_owned(), "auditor".to_owned()],
            })
        );
    }

    #[test]
    fn users_query_is_optional() {
        assert_eq!(
            parse(&["users"]).ok(),
            Some(Command::Users { query: None })
        );
        assert_eq!(parse(&["whoami"]).ok(), Some(Command::WhoAmI));
    }

    #[test]
    fn rejects_malformed_invocations() {
        for args in [
            &[][..],
            &["assign", "7"][..],
            &["assign", "seven", "viewer"][..],
            &["whoami", "extra"][..],
            &["deploy"][..],
        ] {
            assert!(parse(args).is_err(), "{args:?} should be rejected");
        }
    }
}
