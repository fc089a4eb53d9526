use anyhow::{Context, Result, bail};

use calshare::{
    Calendar, CalendarApi, CalendarStore, Navigation, Router,
    api::{Session, SessionStorage},
    storage::LocalStorage,
    store::{Notification, NotificationLevel},
};

pub const USAGE: &str = "Usage: calshare <command>

Commands:
  list               List local calendars
  remote             List calendars stored in your account
  create <name>      Create a calendar (in your account when logged in)
  show <uuid>        Show a local or remote calendar
  delete <uuid>      Delete a local calendar and its remote copy
  toggle <uuid>      Toggle whether a remote calendar is public
  duplicate <uuid>   Save a copy of a shared calendar
  migrate            Give legacy local calendars a uuid
  route <path>       Resolve a path to a view
  login <token>      Store an API token
  logout             Forget the API token";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Remote,
    Create(String),
    Show(String),
    Delete(String),
    Toggle(String),
    Duplicate(String),
    Migrate,
    Route(String),
    Login(String),
    Logout,
    Help,
}

pub fn parse_command(args: impl IntoIterator<Item = String>) -> Result<Command, String> {
    let mut args = args.into_iter();
    let Some(name) = args.next() else {
        return Ok(Command::Help);
    };

    let mut operand = |what: &str| {
        let value = args.next().ok_or_else(|| format!("'{}' expects <{}>", name, what))?;
        Ok::<_, String>(value)
    };

    let command = match name.as_str() {
        "list" => Command::List,
        "remote" => Command::Remote,
        "create" => Command::Create(operand("name")?),
        "show" => Command::Show(operand("uuid")?),
        "delete" => Command::Delete(operand("uuid")?),
        "toggle" => Command::Toggle(operand("uuid")?),
        "duplicate" => Command::Duplicate(operand("uuid")?),
        "migrate" => Command::Migrate,
        "route" => Command::Route(operand("path")?),
        "login" => Command::Login(operand("token")?),
        "logout" => Command::Logout,
        "--help" | "-h" | "help" => Command::Help,
        other => return Err(format!("Unknown command: {}", other)),
    };

    if let Some(extra) = args.next() {
        return Err(format!("Unexpected argument: {}", extra));
    }
    Ok(command)
}

fn format_calendar(calendar: &Calendar) -> String {
    let mut line = format!(
        "{:<36}  {}",
        calendar.uuid.as_deref().unwrap_or("-"),
        calendar.display_name()
    );
    if calendar.is_public() {
        line.push_str("  [public]");
    }
    if !calendar.sections.is_empty() {
        line.push_str(&format!("  ({} sections)", calendar.sections.len()));
    }
    line
}

fn print_notifications(notifications: Vec<Notification>) {
    for notification in notifications {
        let prefix = match notification.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        println!("{}: {}", prefix, notification.message);
    }
}

pub async fn run_command<A, S>(
    command: Command,
    store: &mut CalendarStore<A, S>,
    sessions: &SessionStorage,
) -> Result<()>
where
    A: CalendarApi,
    S: LocalStorage,
{
    match command {
        Command::Help => println!("{}", USAGE),
        Command::List => {
            for calendar in &store.state().local_calendars {
                println!("{}", format_calendar(calendar));
            }
        }
        Command::Remote => {
            let Some(calendars) = store.get_api_calendars().await else {
                bail!("Could not fetch calendars from the API");
            };
            for calendar in &calendars {
                println!("{}", format_calendar(calendar));
            }
        }
        Command::Create(name) => {
            let created = store.create_calendar(Calendar::new(name)).await?;
            println!("{}", format_calendar(&created));
        }
        Command::Show(uuid) => {
            let calendar = match store.get_local_calendar_by_uuid(&uuid) {
                Some(calendar) => Some(calendar),
                None => store.get_api_calendar_by_uuid(&uuid).await,
            };
            let calendar = calendar.with_context(|| format!("No calendar with uuid {}", uuid))?;
            println!("{}", serde_json::to_string_pretty(&calendar)?);
        }
        Command::Delete(uuid) => {
            let calendar = store
                .state()
                .find_local(&uuid)
                .cloned()
                .unwrap_or_else(|| Calendar::default().with_uuid(uuid));
            store.delete_calendar(&calendar).await?;
        }
        Command::Toggle(uuid) => {
            if store.get_api_calendars().await.is_none() {
                bail!("Could not fetch calendars from the API");
            }
            let updated = store.toggle_privacy(&uuid).await?;
            println!("{}", format_calendar(&updated));
        }
        Command::Duplicate(uuid) => {
            let result = store.save_and_duplicate_shared_calendar(&uuid).await;
            print_notifications(store.drain_notifications());
            let copy = result?;
            println!("{}", format_calendar(&copy));
        }
        Command::Migrate => {
            let assigned = store.add_uuid_to_calendars();
            store.save_local_calendars()?;
            println!("{} calendars migrated", assigned);
        }
        Command::Route(path) => {
            let router = Router::standard()?;
            match router.resolve(&path, store.session()) {
                Navigation::Render(matched) => {
                    println!("{} {:?} ({})", matched.view.status_code(), matched.view, matched.name);
                    for (key, value) in &matched.params {
                        println!("  {} = {}", key, value);
                    }
                }
                Navigation::Redirect(target) => println!("redirect {}", target),
            }
        }
        Command::Login(token) => {
            let session = Session::authenticated(token);
            sessions.save(&session)?;
            store.set_session(session);
            println!("Logged in");
        }
        Command::Logout => {
            sessions.clear()?;
            store.set_session(Session::guest());
            println!("Logged out");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calshare::{HttpCalendarClient, storage::SqliteStorage};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_prints_help() {
        assert_eq!(parse_command(args(&[])), Ok(Command::Help));
    }

    #[test]
    fn parses_command_with_operand() {
        assert_eq!(
            parse_command(args(&["toggle", "abc"])),
            Ok(Command::Toggle("abc".to_string()))
        );
    }

    #[test]
    fn missing_operand_is_an_error() {
        assert!(parse_command(args(&["create"])).is_err());
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!(parse_command(args(&["frobnicate"])).is_err());
    }

    #[test]
    fn trailing_argument_is_an_error() {
        assert!(parse_command(args(&["list", "extra"])).is_err());
    }

    #[test]
    fn calendar_line_shows_visibility_and_sections() {
        let mut calendar = Calendar::new("Fall").with_uuid("u");
        calendar.is_public = Some(true);
        calendar.sections = vec![calshare::Section::new("A")];

        let line = format_calendar(&calendar);

        assert!(line.contains("Fall"));
        assert!(line.contains("[public]"));
        assert!(line.contains("(1 sections)"));
    }

    #[tokio::test]
    async fn toggle_reports_fetch_failure_instead_of_missing_calendar() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let sessions = SessionStorage::new(dir.path().join("session.json"));
        let mut store = CalendarStore::new(
            HttpCalendarClient::new(server.uri()),
            SqliteStorage::in_memory().unwrap(),
            Session::authenticated("token"),
        );

        let err = run_command(Command::Toggle("x".to_string()), &mut store, &sessions)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Could not fetch calendars"));
    }
}
