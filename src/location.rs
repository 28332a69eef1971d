use thiserror::Error;
use url::Url;

use crate::models::{Category, Timeframe};

const BASE: &str = "http://dashboard.local/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("could not parse location {0:?}")]
    Malformed(String),
    #[error("no page at {0}")]
    UnknownPath(String),
    #[error("unknown {param} value {value:?}")]
    BadParam { param: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Stats {
        timeframe: Option<Timeframe>,
    },
    Reports {
        index: Option<usize>,
    },
    Suggestions {
        tab: Option<Category>,
        id: Option<String>,
    },
    ResetPassword {
        token: Option<String>,
    },
}

/// Accepts either a path with query (`/suggestions?id=3`) or a full URL.
pub fn parse_location(location: &str) -> Result<Route, LocationError> {
    let base = Url::parse(BASE).map_err(|_| LocationError::Malformed(BASE.to_string()))?;
    let url = base
        .join(location.trim())
        .map_err(|_| LocationError::Malformed(location.to_string()))?;

    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    let path = url.path().trim_end_matches('/');
    match path {
        "" | "/stats" | "/dashboard" => {
            let timeframe = param("timeframe")
                .map(|value| {
                    Timeframe::from_key(&value).ok_or(LocationError::BadParam {
                        param: "timeframe",
                        value,
                    })
                })
                .transpose()?;
            Ok(Route::Stats { timeframe })
        }
        "/reports" | "/weekly-report" => {
            let index = param("report")
                .map(|value| {
                    value.parse::<usize>().map_err(|_| LocationError::BadParam {
                        param: "report",
                        value,
                    })
                })
                .transpose()?;
            Ok(Route::Reports { index })
        }
        "/suggestions" => {
            let tab = param("tab")
                .map(|value| {
                    Category::from_key(&value).ok_or(LocationError::BadParam { param: "tab", value })
                })
                .transpose()?;
            Ok(Route::Suggestions {
                tab,
                id: param("id"),
            })
        }
        "/reset-password" => Ok(Route::ResetPassword {
            token: param("token"),
        }),
        other => Err(LocationError::UnknownPath(other.to_string())),
    }
}
