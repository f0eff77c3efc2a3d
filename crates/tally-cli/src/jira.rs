//! Blocking Jira REST client for the search API.

use tally_core::config::{ConfigError, JiraConfig};
use tally_core::model::item::RawItem;
use tally_core::source::jira::{SearchPage, convert_issues, decode_issues};
use tally_core::source::{IssueSource, SourceError};
use tracing::{debug, info, instrument};

/// Fetches every issue matching a JQL query, changelog expanded.
///
/// Pages are requested concurrently, at most `max_workers` at a time.
#[derive(Debug, Clone)]
pub struct JiraClient {
    server: String,
    token: String,
    jql: String,
    page_size: usize,
    max_workers: usize,
}

impl JiraClient {
    /// Build a client from merged Jira settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the settings fail validation.
    pub fn from_config(config: &JiraConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (Some(server), Some(token), Some(jql)) = (&config.server, &config.token, &config.jql)
        else {
            return Err(ConfigError::Invalid {
                problems: vec!["Jira server, token and JQL are required.".to_string()],
            });
        };
        Ok(Self {
            server: server.trim_end_matches('/').to_string(),
            token: token.clone(),
            jql: jql.clone(),
            page_size: config.page_size,
            max_workers: config.max_workers,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/rest/api/2/search", self.server)
    }

    fn get_page(&self, start_at: usize, max_results: usize) -> Result<SearchPage, SourceError> {
        let url = self.search_url();
        let response = ureq::get(&url)
            .set("Accept", "application/json")
            .set("Authorization", &format!("Bearer {}", self.token))
            .query("jql", &self.jql)
            .query("startAt", &start_at.to_string())
            .query("maxResults", &max_results.to_string())
            .query("expand", "changelog")
            .call()
            .map_err(|err| {
                SourceError::Unreachable(format!("Jira search failed for {url} at {start_at}: {err}"))
            })?;

        response.into_json::<SearchPage>().map_err(|err| {
            SourceError::Unreachable(format!("undecodable Jira search page at {start_at}: {err}"))
        })
    }
}

/// Offsets `0, page_size, ...` up to `total / page_size` pages inclusive.
fn page_offsets(total: usize, page_size: usize) -> Vec<usize> {
    let page_size = page_size.max(1);
    (0..=total / page_size).map(|page| page * page_size).collect()
}

impl IssueSource for JiraClient {
    #[instrument(skip(self), fields(server = %self.server))]
    fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let total = self.get_page(0, 0)?.total;
        let offsets = page_offsets(total, self.page_size);
        info!(total, pages = offsets.len(), "fetching Jira issues");

        let mut issues = Vec::with_capacity(total);
        for group in offsets.chunks(self.max_workers.max(1)) {
            let pages = std::thread::scope(|scope| {
                let handles: Vec<_> = group
                    .iter()
                    .map(|&start_at| scope.spawn(move || self.get_page(start_at, self.page_size)))
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|_| {
                            Err(SourceError::Unreachable("Jira page worker panicked".into()))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })?;

            for page in pages {
                debug!(start_at = page.start_at, issues = page.issues.len(), "page fetched");
                issues.extend(page.issues);
            }
        }

        Ok(convert_issues(&decode_issues(issues)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JiraConfig {
        JiraConfig {
            server: Some("https://jira.example.com/".into()),
            token: Some("secret".into()),
            jql: Some("project = OPS".into()),
            ..JiraConfig::default()
        }
    }

    #[test]
    fn offsets_cover_total_inclusively() {
        assert_eq!(page_offsets(0, 50), vec![0]);
        assert_eq!(page_offsets(49, 50), vec![0]);
        assert_eq!(page_offsets(120, 50), vec![0, 50, 100]);
        assert_eq!(page_offsets(100, 50), vec![0, 50, 100]);
    }

    #[test]
    fn search_url_strips_trailing_slash() {
        let client = JiraClient::from_config(&config()).unwrap();
        assert_eq!(client.search_url(), "https://jira.example.com/rest/api/2/search");
    }

    #[test]
    fn incomplete_config_is_rejected() {
        let err = JiraClient::from_config(&JiraConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn unreachable_server_is_a_source_error() {
        let client = JiraClient::from_config(&JiraConfig {
            server: Some("http://127.0.0.1:9".into()),
            ..config()
        })
        .unwrap();
        let err = client.fetch().unwrap_err();
        assert!(matches!(err, SourceError::Unreachable(_)));
    }
}
