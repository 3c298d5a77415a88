use serde::Serialize;

use crate::config::Config;

/// What is reported when a quiz run starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub script: String,
    pub include_travellers: bool,
    pub character_count: usize,
}

pub trait AnalyticsSink {
    /// Fire and forget. Must never block or fail the quiz.
    fn log_session(&self, info: &SessionInfo);
}

pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn log_session(&self, info: &SessionInfo) {
        log::debug!("analytics disabled, not reporting session for {}", info.script);
    }
}

#[cfg(feature = "network")]
pub use http::HttpAnalytics;

#[cfg(feature = "network")]
mod http {
    use std::thread;
    use std::time::Duration;

    use serde::Serialize;

    use super::{AnalyticsSink, SessionInfo};

    const APP_NAME: &str = "roles-revision";
    const SESSION_TYPE: &str = "flashcard-quiz";
    const TIMEOUT: Duration = Duration::from_secs(10);

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct SessionEvent<'a> {
        app: &'static str,
        session_type: &'static str,
        #[serde(flatten)]
        info: &'a SessionInfo,
    }

    /// Posts a JSON event to a collector on a detached thread.
    pub struct HttpAnalytics {
        endpoint: String,
    }

    impl HttpAnalytics {
        pub fn new(endpoint: impl Into<String>) -> Self {
            Self {
                endpoint: endpoint.into(),
            }
        }
    }

    impl AnalyticsSink for HttpAnalytics {
        fn log_session(&self, info: &SessionInfo) {
            let info = info.clone();
            let endpoint = self.endpoint.clone();
            thread::spawn(move || {
                let client = match reqwest::blocking::Client::builder()
                    .timeout(TIMEOUT)
                    .build()
                {
                    Ok(client) => client,
                    Err(e) => {
                        log::debug!("analytics client unavailable: {e}");
                        return;
                    }
                };
                let event = SessionEvent {
                    app: APP_NAME,
                    session_type: SESSION_TYPE,
                    info: &info,
                };
                let result = client
                    .post(&endpoint)
                    .json(&event)
                    .send()
                    .and_then(|r| r.error_for_status());
                if let Err(e) = result {
                    log::debug!("analytics ping failed: {e}");
                }
            });
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn event_body_flattens_session_info() {
            let info = SessionInfo {
                script: "Bad Moon Rising".to_string(),
                include_travellers: false,
                character_count: 25,
            };
            let event = SessionEvent {
                app: APP_NAME,
                session_type: SESSION_TYPE,
                info: &info,
            };
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["app"], "roles-revision");
            assert_eq!(json["sessionType"], "flashcard-quiz");
            assert_eq!(json["script"], "Bad Moon Rising");
            assert_eq!(json["characterCount"], 25);
            assert!(json.get("info").is_none());
        }
    }
}

/// The sink for this build and config. Debug builds never report.
pub fn from_config(config: &Config) -> Box<dyn AnalyticsSink> {
    let endpoint = config
        .analytics_endpoint
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    match endpoint {
        #[cfg(feature = "network")]
        Some(endpoint) if !cfg!(debug_assertions) => Box::new(HttpAnalytics::new(endpoint)),
        _ => Box::new(NoopAnalytics),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_info_is_camel_case() {
        let info = SessionInfo {
            script: "Trouble Brewing".to_string(),
            include_travellers: true,
            character_count: 22,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["includeTravellers"], true);
        assert_eq!(json["characterCount"], 22);
    }

    #[test]
    fn no_endpoint_means_noop() {
        let config = Config::default();
        let sink = from_config(&config);
        // Must return immediately without network access.
        sink.log_session(&SessionInfo {
            script: "All".to_string(),
            include_travellers: false,
            character_count: 0,
        });
    }
}
