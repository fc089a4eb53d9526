//! Page-to-URL mapping for the application views.
//!
//! Routes are matched in registration order, so the catch-all must come
//! last. Resolution is a pure function of the path and the session.

use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

use crate::api::Session;

pub const HOME_PATH: &str = "/";
const CATCH_ALL: &str = "*";

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Catch-all route '{0}' must be registered last")]
    CatchAllNotLast(String),
    #[error("Invalid route pattern '{path}': {source}")]
    InvalidPattern {
        path: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    FileIndex,
    CalendarIndex,
    CalendarShow,
    CalendarEdit,
    Login,
    Register,
    PasswordRecovery,
    NotFound,
}

impl View {
    pub fn status_code(&self) -> u16 {
        match self {
            View::NotFound => 404,
            _ => 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    OnlyGuests,
}

impl Guard {
    /// Returns the redirect target when navigation must not proceed.
    pub fn check(&self, session: &Session) -> Option<String> {
        match self {
            Guard::OnlyGuests if session.is_authenticated() => Some(HOME_PATH.to_string()),
            Guard::OnlyGuests => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteDef {
    pub name: &'static str,
    pub path: &'static str,
    pub view: View,
    pub guard: Option<Guard>,
}

impl RouteDef {
    const fn open(name: &'static str, path: &'static str, view: View) -> Self {
        Self {
            name,
            path,
            view,
            guard: None,
        }
    }

    const fn guests_only(name: &'static str, path: &'static str, view: View) -> Self {
        Self {
            name,
            path,
            view,
            guard: Some(Guard::OnlyGuests),
        }
    }
}

pub fn default_routes() -> Vec<RouteDef> {
    vec![
        RouteDef::open("home", "/", View::Home),
        RouteDef::open("files.index", "/files", View::FileIndex),
        RouteDef::open("calendars.index", "/calendars", View::CalendarIndex),
        RouteDef::open("calendars.show", "/calendars/:uuid", View::CalendarShow),
        RouteDef::open("calendars.edit", "/calendars/:uuid/edit", View::CalendarEdit),
        RouteDef::guests_only("login", "/login", View::Login),
        RouteDef::guests_only("register", "/register", View::Register),
        RouteDef::guests_only("password.recovery", "/password-recovery", View::PasswordRecovery),
        RouteDef::open("not-found", CATCH_ALL, View::NotFound),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub name: &'static str,
    pub view: View,
    pub params: HashMap<String, String>,
}

impl RouteMatch {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    fn not_found() -> Self {
        Self {
            name: "not-found",
            view: View::NotFound,
            params: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    Render(RouteMatch),
    Redirect(String),
}

struct CompiledRoute {
    def: RouteDef,
    pattern: Regex,
    params: Vec<String>,
}

fn compile(def: RouteDef) -> Result<CompiledRoute, RouteError> {
    let mut params = Vec::new();
    let source = if def.path == CATCH_ALL {
        "^.*$".to_string()
    } else {
        let segments: Vec<String> = def
            .path
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => {
                    params.push(name.to_string());
                    format!("(?P<{}>[^/]+)", name)
                }
                None => regex::escape(segment),
            })
            .collect();
        format!("^{}$", segments.join("/"))
    };

    let pattern = Regex::new(&source).map_err(|source| RouteError::InvalidPattern {
        path: def.path.to_string(),
        source,
    })?;

    Ok(CompiledRoute {
        def,
        pattern,
        params,
    })
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.trim_end_matches('/') {
        "" => HOME_PATH,
        trimmed => trimmed,
    }
}

pub struct Router {
    routes: Vec<CompiledRoute>,
}

impl Router {
    pub fn standard() -> Result<Self, RouteError> {
        Self::with_routes(default_routes())
    }

    pub fn with_routes(routes: Vec<RouteDef>) -> Result<Self, RouteError> {
        let last = routes.len().saturating_sub(1);
        if let Some(misplaced) = routes
            .iter()
            .enumerate()
            .find(|(i, r)| r.path == CATCH_ALL && *i != last)
        {
            return Err(RouteError::CatchAllNotLast(misplaced.1.name.to_string()));
        }

        let routes = routes
            .into_iter()
            .map(compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { routes })
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteDef> {
        self.routes.iter().map(|r| &r.def)
    }

    pub fn resolve(&self, path: &str, session: &Session) -> Navigation {
        let path = normalize(path);

        for route in &self.routes {
            let Some(captures) = route.pattern.captures(path) else {
                continue;
            };

            if let Some(target) = route.def.guard.and_then(|g| g.check(session)) {
                tracing::debug!("Guard on {} redirected to {}", route.def.name, target);
                return Navigation::Redirect(target);
            }

            let params = route
                .params
                .iter()
                .filter_map(|name| {
                    let raw = captures.name(name)?.as_str();
                    let value = urlencoding::decode(raw)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| raw.to_string());
                    Some((name.clone(), value))
                })
                .collect();

            return Navigation::Render(RouteMatch {
                name: route.def.name,
                view: route.def.view,
                params,
            });
        }

        Navigation::Render(RouteMatch::not_found())
    }
}
